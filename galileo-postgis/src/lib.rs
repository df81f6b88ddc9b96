//! Galileo PostGIS is a spatial extension of a small query builder and record mapper for
//! PostgreSQL databases with the PostGIS extension.
//!
//! It adds where clauses testing spatial relationships (`ST_Equals`, `ST_Contains`,
//! `ST_Intersects`, `ST_Touches`, `ST_Overlaps`) and distances (`ST_Distance`) to queries,
//! computed distance columns, and transparent conversion of record attributes between
//! [`geojson::Geometry`] values and the GeoJSON representation of the database.
//!
//! # Example
//!
//! ```
//! use galileo_postgis::grammar::{PostgresGrammar, SpatialGrammar};
//! use galileo_postgis::query::{Operator, QueryBuilder, SpatialQueryExt};
//! use geojson::{Geometry, Value};
//!
//! let center = Geometry::new(Value::Point(vec![37.6, 55.75]));
//! let query = QueryBuilder::table("cafes")
//!     .with_distance_sphere("location", center.clone(), Some("distance"))
//!     .where_distance_sphere("location", center, Operator::Lt, 1000.0);
//!
//! let compiled = query.to_sql(&SpatialGrammar::new(PostgresGrammar::default()))?;
//! assert!(compiled.sql.starts_with(r#"select "cafes".*, ST_Distance(location, ST_GeomFromGeoJSON('"#));
//! assert!(compiled.sql.ends_with(", true) < $1"));
//! # Ok::<(), galileo_postgis::error::PostgisError>(())
//! ```
//!
//! Connections that can execute such queries are created by
//! [`ConnectionFactory`](connection::ConnectionFactory), records are loaded and saved through the
//! [`model`] module.

pub mod codec;
pub mod connection;
pub mod error;
pub mod grammar;
pub mod manager;
pub mod model;
pub mod query;
pub mod value;


pub use connection::{Connection, ConnectionConfig, ConnectionFactory};
pub use error::PostgisError;
pub use geojson;
pub use grammar::{CompiledQuery, Grammar, SpatialGrammar};
pub use manager::DatabaseManager;
pub use model::{HasSpatialAttributes, Model, ModelQuery};
pub use query::{QueryBuilder, SpatialQueryExt};
pub use value::{Expression, Value};
