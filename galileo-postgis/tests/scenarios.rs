use std::sync::Arc;

use galileo_postgis::codec::encode_for_storage;
use galileo_postgis::connection::{ConnectionConfig, ConnectionFactory, Driver, Row};
use galileo_postgis::geojson::{Geometry, Value as GeoJsonValue};
use galileo_postgis::model::{self, Attributes, HasSpatialAttributes, Model};
use galileo_postgis::query::{QueryBuilder, SpatialQueryExt};
use galileo_postgis::{Connection, PostgisError, Value};
use insta::assert_snapshot;
use parking_lot::Mutex;

type Log = Arc<Mutex<Vec<(String, Vec<Value>)>>>;

struct StubDriver {
    log: Log,
    rows: Vec<Row>,
}

impl Driver for StubDriver {
    fn select(&self, sql: &str, bindings: &[Value]) -> Result<Vec<Row>, PostgisError> {
        self.log
            .lock()
            .push((sql.to_string(), bindings.to_vec()));
        Ok(self.rows.clone())
    }

    fn execute(&self, sql: &str, bindings: &[Value]) -> Result<u64, PostgisError> {
        self.log
            .lock()
            .push((sql.to_string(), bindings.to_vec()));
        Ok(1)
    }
}

fn connection(rows: Vec<Row>) -> (Connection, Log) {
    let _ = env_logger::builder().is_test(true).try_init();

    let log = Log::default();
    let driver = StubDriver {
        log: log.clone(),
        rows,
    };
    let connection = ConnectionFactory::new()
        .create_connection(Box::new(driver), &ConnectionConfig::new("pgsql", "gis"))
        .expect("connection is created");

    (connection, log)
}

fn square(min: f64, size: f64) -> Geometry {
    Geometry::new(GeoJsonValue::Polygon(vec![vec![
        vec![min, min],
        vec![min + size, min],
        vec![min + size, min + size],
        vec![min, min + size],
        vec![min, min],
    ]]))
}

fn geometry_sql(geometry: &Geometry) -> String {
    encode_for_storage(geometry).expect("encoded").to_string()
}

#[test]
fn intersects_or_touches() {
    let (connection, _) = connection(vec![]);
    let first = square(0.0, 1.0);
    let second = square(5.0, 2.0);

    let compiled = QueryBuilder::table("parcels")
        .where_intersects("geom", first.clone())
        .or_where_touches("geom", second.clone())
        .to_sql(connection.grammar())
        .expect("compiled");

    let sql = compiled
        .sql
        .replace(&geometry_sql(&first), "<first>")
        .replace(&geometry_sql(&second), "<second>");
    assert_snapshot!(sql, @r#"select * from "parcels" where ST_Intersects("geom", <first>) or ST_Touches("geom", <second>)"#);
    assert!(compiled.bindings.is_empty());
}

#[test]
fn distance_sphere_column_keeps_table_columns() {
    let (connection, _) = connection(vec![]);
    let point = Geometry::new(GeoJsonValue::Point(vec![13.4, 52.5]));

    let query = QueryBuilder::table("stations").with_distance_sphere(
        "location",
        point.clone(),
        Some("dist_km"),
    );
    let compiled = query.to_sql(connection.grammar()).expect("compiled");

    assert_eq!(
        compiled.sql,
        format!(
            r#"select "stations".*, ST_Distance(location, {}, true) as dist_km from "stations""#,
            geometry_sql(&point)
        )
    );
}

struct Parcel {
    attributes: Attributes,
}

impl Model for Parcel {
    const TABLE: &'static str = "parcels";

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

impl HasSpatialAttributes for Parcel {
    const SPATIAL_ATTRIBUTES: &'static [&'static str] = &["geom"];
}

#[test]
fn save_normalizes_geojson_text() {
    let (connection, log) = connection(vec![Attributes::new().with("id", 10)]);
    let text = r#"{"type": "Polygon", "coordinates": [[[0, 0], [4, 0], [4, 4], [0, 0]]], "name": "O'Brien"}"#;

    let mut parcel = Parcel::from_attributes(
        Attributes::new()
            .with("owner", "city")
            .with("geom", text),
    );
    model::save(&connection, &mut parcel).expect("saved");
    assert_eq!(parcel.attributes().get("id"), Some(&Value::Int(10)));

    let parsed: Geometry = serde_json::from_str(text).expect("valid GeoJSON");
    let statements = log.lock().clone();
    assert_eq!(statements.len(), 1);

    let (sql, bindings) = &statements[0];
    assert_eq!(
        sql,
        &format!(
            r#"insert into "parcels" ("owner", "geom") values ($1, {}) returning "id""#,
            geometry_sql(&parsed)
        )
    );
    assert!(sql.contains("O''Brien"));
    assert_eq!(bindings, &vec![Value::from("city")]);
}

#[test]
fn loaded_records_have_geometries() {
    let stored = square(1.0, 3.0);
    let (connection, log) = connection(vec![Attributes::new()
        .with("id", 1)
        .with("geom", serde_json::to_string(&stored).expect("serialized"))]);

    let parcels = Parcel::query()
        .where_contains("geom", square(2.0, 0.5))
        .get(&connection)
        .expect("loaded");

    assert_eq!(parcels.len(), 1);
    assert_eq!(parcels[0].attributes().get("geom"), Some(&Value::Geometry(stored)));

    let (sql, _) = log.lock()[0].clone();
    assert!(sql.starts_with(r#"select "parcels".*, ST_AsGeoJSON("parcels"."geom") as "geom" from "parcels" where ST_Contains("geom", "#));
}
