//! Record mapping for types with spatial attributes.
//!
//! A record type implements [`Model`] to expose its attributes and [`HasSpatialAttributes`] to
//! declare which of them hold geometries. Records are loaded with [`ModelQuery`], which selects
//! spatial columns as GeoJSON and decodes them into [`Geometry`](geojson::Geometry) values, and
//! written with [`save`], which turns geometries back into `ST_GeomFromGeoJSON` expressions.
//!
//! ```
//! use galileo_postgis::model::{Attributes, HasSpatialAttributes, Model};
//!
//! struct Place {
//!     attributes: Attributes,
//! }
//!
//! impl Model for Place {
//!     const TABLE: &'static str = "places";
//!
//!     fn from_attributes(attributes: Attributes) -> Self {
//!         Self { attributes }
//!     }
//!
//!     fn attributes(&self) -> &Attributes {
//!         &self.attributes
//!     }
//!
//!     fn attributes_mut(&mut self) -> &mut Attributes {
//!         &mut self.attributes
//!     }
//! }
//!
//! impl HasSpatialAttributes for Place {
//!     const SPATIAL_ATTRIBUTES: &'static [&'static str] = &["location"];
//! }
//! ```

use crate::codec;
use crate::connection::Connection;
use crate::error::PostgisError;
use crate::value::Value;

mod attributes;
mod query;

pub use attributes::Attributes;
pub use query::ModelQuery;

/// Record stored in a table.
pub trait Model: Sized {
    /// Table of the records.
    const TABLE: &'static str;
    /// Primary key attribute.
    const KEY: &'static str = "id";

    /// Creates a record from a loaded row.
    fn from_attributes(attributes: Attributes) -> Self;

    /// Attributes of the record.
    fn attributes(&self) -> &Attributes;

    /// Mutable attributes of the record.
    fn attributes_mut(&mut self) -> &mut Attributes;
}

/// Record with attributes holding geometries.
pub trait HasSpatialAttributes: Model {
    /// Names of the attributes holding geometries.
    const SPATIAL_ATTRIBUTES: &'static [&'static str];

    /// Replaces GeoJSON text of the spatial attributes with decoded geometries.
    ///
    /// Called after a record is loaded.
    fn decode_spatial_attributes(&mut self) -> Result<(), PostgisError> {
        decode_spatial_attributes(self.attributes_mut(), Self::SPATIAL_ATTRIBUTES)
    }

    /// Returns the attributes to persist, with spatial attributes encoded as constructor
    /// expressions and empty ones set to `NULL`.
    ///
    /// Called before a record is saved.
    fn encode_spatial_attributes_for_save(&self) -> Result<Attributes, PostgisError> {
        let mut attributes = self.attributes().clone();
        encode_spatial_attributes(&mut attributes, Self::SPATIAL_ATTRIBUTES)?;
        Ok(attributes)
    }

    /// Starts a query for records of this type.
    fn query() -> ModelQuery<Self> {
        ModelQuery::new()
    }
}

/// Decodes the given attributes from GeoJSON text into geometries.
///
/// Attributes that are absent, `NULL` or already decoded are left as they are.
pub fn decode_spatial_attributes(
    attributes: &mut Attributes,
    names: &[&str],
) -> Result<(), PostgisError> {
    for name in names {
        let geometry = match attributes.get(name) {
            Some(Value::Text(text)) => codec::decode_from_wire(text)?,
            None | Some(Value::Null) | Some(Value::Geometry(_)) => continue,
            Some(other) => {
                return Err(PostgisError::Decode(format!(
                    "attribute '{name}' contains {other:?} instead of GeoJSON text"
                )))
            }
        };

        attributes.set(*name, geometry);
    }

    Ok(())
}

/// Encodes the given attributes into `ST_GeomFromGeoJSON` expressions.
///
/// Text values are parsed as GeoJSON first. Empty values become an explicit `NULL`. Absent
/// attributes are not added.
pub fn encode_spatial_attributes(
    attributes: &mut Attributes,
    names: &[&str],
) -> Result<(), PostgisError> {
    for name in names {
        let Some(value) = attributes.get(name) else {
            continue;
        };

        let encoded = if value.is_empty() {
            Value::Null
        } else {
            match value {
                Value::Geometry(geometry) => codec::encode_for_storage(geometry)?.into(),
                Value::Text(text) => {
                    codec::encode_for_storage(&codec::decode_from_wire(text)?)?.into()
                }
                Value::Expression(_) => continue,
                other => {
                    return Err(PostgisError::Encode(format!(
                        "attribute '{name}' contains {other:?} instead of a geometry"
                    )))
                }
            }
        };

        attributes.set(*name, encoded);
    }

    Ok(())
}

/// Inserts or updates the record.
///
/// A record without a key (or with a `NULL` key) is inserted and receives the key generated by
/// the backend. Otherwise the row with the record's key is updated. Returns the number of
/// affected rows.
pub fn save<M: HasSpatialAttributes>(
    connection: &Connection,
    model: &mut M,
) -> Result<u64, PostgisError> {
    let attributes = model.encode_spatial_attributes_for_save()?;
    let key = attributes
        .get(M::KEY)
        .filter(|value| **value != Value::Null)
        .cloned();
    let values: Vec<_> = attributes
        .iter()
        .filter(|(name, _)| *name != M::KEY)
        .collect();
    let grammar = connection.grammar();

    match key {
        Some(key) => {
            log::debug!("Updating record in {}", M::TABLE);
            let statement = grammar.compile_update(M::TABLE, &values, (M::KEY, &key))?;
            connection.execute(&statement)
        }
        None => {
            log::debug!("Inserting record into {}", M::TABLE);
            let statement = grammar.compile_insert(M::TABLE, &values, Some(M::KEY))?;
            let rows = connection.select(&statement)?;
            if let Some(key) = rows.first().and_then(|row| row.get(M::KEY)) {
                model.attributes_mut().set(M::KEY, key.clone());
            }

            Ok(rows.len() as u64)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::codec::tests::{literal_content, point, square};
    use crate::codec::to_geojson;
    use crate::tests::{spatial_connection, RecordingDriver};
    use crate::value::Expression;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) struct Place {
        attributes: Attributes,
    }

    impl Model for Place {
        const TABLE: &'static str = "places";

        fn from_attributes(attributes: Attributes) -> Self {
            Self { attributes }
        }

        fn attributes(&self) -> &Attributes {
            &self.attributes
        }

        fn attributes_mut(&mut self) -> &mut Attributes {
            &mut self.attributes
        }
    }

    impl HasSpatialAttributes for Place {
        const SPATIAL_ATTRIBUTES: &'static [&'static str] = &["location", "area"];
    }

    #[test]
    fn decodes_present_spatial_attributes() {
        let mut place = Place::from_attributes(
            Attributes::new()
                .with("id", 1)
                .with("location", to_geojson(&point()).expect("encoded"))
                .with("name", r#"{"type":"Point","coordinates":[0,0]}"#),
        );

        place.decode_spatial_attributes().expect("decoded");

        assert_eq!(
            place.attributes().get("location"),
            Some(&Value::Geometry(point()))
        );
        assert!(place.attributes().get("name").and_then(Value::as_str).is_some());
        assert!(!place.attributes().contains("area"));
    }

    #[test]
    fn decode_keeps_null_attributes() {
        let mut place = Place::from_attributes(Attributes::new().with("area", Value::Null));
        place.decode_spatial_attributes().expect("decoded");
        assert_eq!(place.attributes().get("area"), Some(&Value::Null));
    }

    #[test]
    fn decode_propagates_malformed_text() {
        let mut place = Place::from_attributes(Attributes::new().with("location", "0101000000"));
        assert_matches!(
            place.decode_spatial_attributes(),
            Err(PostgisError::Decode(_))
        );
    }

    #[test]
    fn encode_sets_explicit_null_for_empty_values() {
        let place = Place::from_attributes(
            Attributes::new()
                .with("location", Value::Null)
                .with("area", ""),
        );

        let attributes = place.encode_spatial_attributes_for_save().expect("encoded");
        assert_eq!(attributes.get("location"), Some(&Value::Null));
        assert_eq!(attributes.get("area"), Some(&Value::Null));
        assert_eq!(attributes.len(), 2);
    }

    #[test]
    fn encode_normalizes_text_into_geometry() {
        let text = to_geojson(&square(3.0)).expect("encoded");
        let place = Place::from_attributes(
            Attributes::new()
                .with("area", text)
                .with("location", point()),
        );

        let attributes = place.encode_spatial_attributes_for_save().expect("encoded");
        let area = attributes
            .get("area")
            .and_then(Value::as_expression)
            .expect("area is encoded");
        let location = attributes
            .get("location")
            .and_then(Value::as_expression)
            .expect("location is encoded");

        assert_eq!(
            codec::decode_from_wire(&literal_content(area)).expect("decoded"),
            square(3.0)
        );
        assert_eq!(
            codec::decode_from_wire(&literal_content(location)).expect("decoded"),
            point()
        );
        assert_eq!(place.attributes().get("location"), Some(&Value::Geometry(point())));
    }

    #[test]
    fn encode_rejects_non_geometry_values() {
        let place = Place::from_attributes(Attributes::new().with("area", 5));
        assert_matches!(
            place.encode_spatial_attributes_for_save(),
            Err(PostgisError::Encode(_))
        );

        let place = Place::from_attributes(Attributes::new().with("area", "not json"));
        assert_matches!(
            place.encode_spatial_attributes_for_save(),
            Err(PostgisError::Decode(_))
        );
    }

    #[test]
    fn encode_keeps_existing_expressions() {
        let expression = Expression::new("ST_MakePoint(1, 2)");
        let place =
            Place::from_attributes(Attributes::new().with("location", expression.clone()));
        let attributes = place.encode_spatial_attributes_for_save().expect("encoded");
        assert_eq!(
            attributes.get("location"),
            Some(&Value::Expression(expression))
        );
    }

    #[test]
    fn save_inserts_new_record() {
        let driver = RecordingDriver::new(|_| vec![Attributes::new().with("id", 42)]);
        let log = driver.log();
        let connection = spatial_connection(driver);

        let mut place = Place::from_attributes(
            Attributes::new()
                .with("name", "park")
                .with("location", point())
                .with("area", Value::Null),
        );
        let affected = save(&connection, &mut place).expect("saved");

        assert_eq!(affected, 1);
        assert_eq!(place.attributes().get("id"), Some(&Value::Int(42)));

        let statements = log.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0]
            .sql
            .starts_with(r#"insert into "places" ("name", "location", "area") values ($1, ST_GeomFromGeoJSON('"#));
        assert!(statements[0].sql.ends_with(r#"'), $2) returning "id""#));
        assert_eq!(statements[0].bindings, vec![Value::from("park"), Value::Null]);
    }

    #[test]
    fn save_updates_existing_record() {
        let driver = RecordingDriver::new(|_| vec![]);
        let log = driver.log();
        let connection = spatial_connection(driver);

        let mut place = Place::from_attributes(
            Attributes::new()
                .with("id", 7)
                .with("area", square(1.0)),
        );
        save(&connection, &mut place).expect("saved");

        let statements = log.statements();
        assert!(statements[0]
            .sql
            .starts_with(r#"update "places" set "area" = ST_GeomFromGeoJSON('"#));
        assert!(statements[0].sql.ends_with(r#"') where "id" = $1"#));
        assert_eq!(statements[0].bindings, vec![Value::Int(7)]);
    }
}
