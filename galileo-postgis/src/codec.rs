//! Conversion of [`Geometry`] values into SQL constructor expressions and back from the GeoJSON
//! text returned by the backend.
//!
//! Geometries are embedded inline as arguments of `ST_GeomFromGeoJSON`, because they have to be
//! composed with other spatial function calls in the same expression. The driver's parameter
//! binding is not used for them, so every text produced from a geometry goes through
//! [`escape_literal`] before it becomes part of a statement.

use geojson::{Geometry, Value as GeoJsonValue};

use crate::error::PostgisError;
use crate::value::Expression;

/// Backend function that constructs a geometry from GeoJSON text.
pub const GEOM_FROM_GEOJSON: &str = "ST_GeomFromGeoJSON";

/// Backend function that serializes a geometry into GeoJSON text.
pub const AS_GEOJSON: &str = "ST_AsGeoJSON";

/// Serializes the geometry into GeoJSON text.
pub fn to_geojson(geometry: &Geometry) -> Result<String, PostgisError> {
    serde_json::to_string(geometry).map_err(|err| PostgisError::Encode(err.to_string()))
}

/// Escapes the text so it can be placed between single quotes of an SQL string literal.
pub fn escape_literal(text: &str) -> String {
    text.replace('\'', "''")
}

/// Encodes the geometry into an `ST_GeomFromGeoJSON('<geojson>')` expression.
///
/// ```
/// use galileo_postgis::codec::encode_for_storage;
/// use geojson::{Geometry, Value};
///
/// let point = Geometry::new(Value::Point(vec![1.0, 2.0]));
/// let expression = encode_for_storage(&point)?;
/// assert!(expression.as_str().starts_with("ST_GeomFromGeoJSON('{"));
/// # Ok::<(), galileo_postgis::error::PostgisError>(())
/// ```
pub fn encode_for_storage(geometry: &Geometry) -> Result<Expression, PostgisError> {
    let json = to_geojson(geometry)?;
    Ok(Expression::new(format!(
        "{GEOM_FROM_GEOJSON}('{}')",
        escape_literal(&json)
    )))
}

/// Parses GeoJSON text returned by `ST_AsGeoJSON` into a geometry.
pub fn decode_from_wire(text: &str) -> Result<Geometry, PostgisError> {
    if text.trim().is_empty() {
        return Err(PostgisError::Decode("empty GeoJSON text".into()));
    }

    serde_json::from_str(text).map_err(|err| PostgisError::Decode(err.to_string()))
}

/// Name of the GeoJSON type of the geometry.
pub fn geometry_type_name(geometry: &Geometry) -> &'static str {
    match geometry.value {
        GeoJsonValue::Point(_) => "Point",
        GeoJsonValue::MultiPoint(_) => "MultiPoint",
        GeoJsonValue::LineString(_) => "LineString",
        GeoJsonValue::MultiLineString(_) => "MultiLineString",
        GeoJsonValue::Polygon(_) => "Polygon",
        GeoJsonValue::MultiPolygon(_) => "MultiPolygon",
        GeoJsonValue::GeometryCollection(_) => "GeometryCollection",
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_matches::assert_matches;
    use geojson::JsonObject;

    use super::*;

    pub(crate) fn point() -> Geometry {
        Geometry::new(GeoJsonValue::Point(vec![30.5, 50.25]))
    }

    pub(crate) fn line_string() -> Geometry {
        Geometry::new(GeoJsonValue::LineString(vec![
            vec![0.0, 0.0],
            vec![1.0, 1.0],
            vec![2.0, 0.5],
        ]))
    }

    pub(crate) fn square(size: f64) -> Geometry {
        Geometry::new(GeoJsonValue::Polygon(vec![vec![
            vec![0.0, 0.0],
            vec![size, 0.0],
            vec![size, size],
            vec![0.0, size],
            vec![0.0, 0.0],
        ]]))
    }

    /// Extracts the GeoJSON text the backend would receive from a constructor expression.
    pub(crate) fn literal_content(expression: &Expression) -> String {
        let sql = expression.as_str();
        let inner = sql
            .strip_prefix("ST_GeomFromGeoJSON('")
            .and_then(|s| s.strip_suffix("')"))
            .expect("not a constructor expression");
        assert!(
            !inner.replace("''", "").contains('\''),
            "unescaped quote in {sql}"
        );
        inner.replace("''", "'")
    }

    #[test]
    fn encodes_into_constructor_call() {
        let expression = encode_for_storage(&point()).expect("encode");
        assert!(expression.as_str().starts_with("ST_GeomFromGeoJSON('"));
        assert!(expression.as_str().ends_with("')"));
        assert!(expression.as_str().contains("\"Point\""));
    }

    #[test]
    fn round_trip_preserves_geometry() {
        for geometry in [point(), line_string(), square(2.0)] {
            let expression = encode_for_storage(&geometry).expect("encode");
            let decoded = decode_from_wire(&literal_content(&expression)).expect("decode");
            assert_eq!(decoded, geometry);
        }
    }

    #[test]
    fn escapes_quotes_in_foreign_members() {
        let mut members = JsonObject::new();
        members.insert(
            "name".to_string(),
            serde_json::Value::String("x'); drop table places; --".to_string()),
        );
        let mut geometry = point();
        geometry.foreign_members = Some(members);

        let expression = encode_for_storage(&geometry).expect("encode");
        assert!(expression.as_str().contains("x''); drop table places; --"));
        assert!(!expression.as_str().contains("x');"));

        let decoded = decode_from_wire(&literal_content(&expression)).expect("decode");
        assert_eq!(decoded, geometry);
    }

    #[test]
    fn escape_literal_doubles_every_quote() {
        assert_eq!(escape_literal("a'b''c"), "a''b''''c");
        assert_eq!(escape_literal("plain"), "plain");
    }

    #[test]
    fn decodes_backend_output() {
        let geometry =
            decode_from_wire(r#"{"type":"Point","coordinates":[30.5,50.25]}"#).expect("decode");
        assert_eq!(geometry, point());
        assert_eq!(geometry_type_name(&geometry), "Point");
    }

    #[test]
    fn decode_fails_on_malformed_text() {
        assert_matches!(decode_from_wire(""), Err(PostgisError::Decode(_)));
        assert_matches!(decode_from_wire("   "), Err(PostgisError::Decode(_)));
        assert_matches!(decode_from_wire("{\"type\":"), Err(PostgisError::Decode(_)));
        assert_matches!(
            decode_from_wire(r#"{"type":"Unicorn","coordinates":[1,2]}"#),
            Err(PostgisError::Decode(_))
        );
    }
}
