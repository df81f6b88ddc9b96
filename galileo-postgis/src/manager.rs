//! Named connections and raw geometry computations.

use std::collections::HashMap;

use geojson::{Geometry, Value as GeoJsonValue};

use crate::codec::{self, AS_GEOJSON};
use crate::connection::{Connection, ConnectionConfig, ConnectionFactory, Driver};
use crate::error::PostgisError;
use crate::query::QueryBuilder;
use crate::value::{Expression, Value};

/// Tolerance of the light simplification applied to the original polygon before it is united
/// with an expanded simplification.
pub const PRE_SIMPLIFY_TOLERANCE: f64 = 0.00001;

const DEFAULT_CONNECTION: &str = "default";

/// Registry of named database connections.
///
/// Connections are created by the [`ConnectionFactory`], so connections to PostgreSQL support
/// spatial queries.
#[derive(Debug)]
pub struct DatabaseManager {
    factory: ConnectionFactory,
    connections: HashMap<String, Connection>,
    default_connection: String,
}

impl Default for DatabaseManager {
    fn default() -> Self {
        Self::new(ConnectionFactory::new())
    }
}

impl DatabaseManager {
    /// Creates a manager without connections. The default connection is named `default`.
    pub fn new(factory: ConnectionFactory) -> Self {
        Self {
            factory,
            connections: HashMap::new(),
            default_connection: DEFAULT_CONNECTION.to_string(),
        }
    }

    /// Creates a connection with the factory and registers it under the name, replacing a
    /// connection with the same name.
    pub fn add_connection(
        &mut self,
        name: impl Into<String>,
        driver: Box<dyn Driver>,
        config: &ConnectionConfig,
    ) -> Result<&Connection, PostgisError> {
        let name = name.into();
        let connection = self.factory.create_connection(driver, config)?;
        log::debug!("Adding connection {name} with driver {}", config.driver);

        self.connections.insert(name.clone(), connection);
        self.connection(&name)
    }

    /// Sets the name of the connection used by [`DatabaseManager::default_connection`].
    pub fn set_default_connection(&mut self, name: impl Into<String>) {
        self.default_connection = name.into();
    }

    /// Connection with the given name.
    pub fn connection(&self, name: &str) -> Result<&Connection, PostgisError> {
        self.connections
            .get(name)
            .ok_or_else(|| PostgisError::UnknownConnection(name.to_string()))
    }

    /// Default connection.
    pub fn default_connection(&self) -> Result<&Connection, PostgisError> {
        self.connection(&self.default_connection)
    }

    /// Evaluates a geometry expression on the default connection.
    ///
    /// Runs `select ST_AsGeoJSON(<expression>) as response` and decodes the result. Returns
    /// `None` if the backend returns no row or a `NULL` geometry.
    pub fn geometry_raw(&self, expression: &Expression) -> Result<Option<Geometry>, PostgisError> {
        let query = QueryBuilder::new()
            .select_raw(format!("{AS_GEOJSON}({expression}) as response"))
            .limit(1);
        let Some(row) = self.default_connection()?.get(&query)?.into_iter().next() else {
            return Ok(None);
        };

        match row.get("response") {
            Some(Value::Text(text)) => Ok(Some(codec::decode_from_wire(text)?)),
            Some(Value::Geometry(geometry)) => Ok(Some(geometry.clone())),
            None | Some(Value::Null) => Ok(None),
            Some(other) => Err(PostgisError::Decode(format!(
                "response contains {other:?} instead of GeoJSON text"
            ))),
        }
    }

    /// Builds a simplified version of the polygon with fewer nodes.
    ///
    /// The polygon is buffered by `expand`, snapped to a grid of `grid_size` and simplified
    /// within `tolerance`. Then:
    /// * `expand > 0` gives a polygon that contains the original one,
    /// * `expand == 0` gives a polygon similar to the original one,
    /// * `expand < 0` gives a polygon contained in the original one.
    ///
    /// A non-finite tuning value results in `None` without querying the backend.
    pub fn simplified_polygon(
        &self,
        polygon: &Geometry,
        expand: f64,
        grid_size: f64,
        tolerance: f64,
    ) -> Result<Option<Geometry>, PostgisError> {
        let GeoJsonValue::Polygon(_) = polygon.value else {
            return Err(PostgisError::UnexpectedGeometry {
                expected: "Polygon",
                found: codec::geometry_type_name(polygon),
            });
        };

        for (name, value) in [
            ("expand", expand),
            ("grid size", grid_size),
            ("tolerance", tolerance),
        ] {
            if !value.is_finite() {
                log::warn!("Polygon simplification skipped: {name} value {value} is not finite");
                return Ok(None);
            }
        }

        let polygon = codec::encode_for_storage(polygon)?;
        let buffer = format!("ST_Buffer({polygon}, {expand})");
        let snap_to_grid = format!("ST_SnapToGrid({buffer}, {grid_size})");
        let simplify = format!("ST_SimplifyPreserveTopology({snap_to_grid}, {tolerance})");
        let simplified = format!("ST_Buffer({simplify}, 0)");

        let expression = if expand > 0.0 {
            format!(
                "ST_Union(ST_MakeValid(ST_SimplifyPreserveTopology({polygon}, {PRE_SIMPLIFY_TOLERANCE})), {simplified})"
            )
        } else if expand < 0.0 {
            format!("ST_Intersection({polygon}, {simplified})")
        } else {
            simplified
        };

        self.geometry_raw(&Expression::new(expression))
    }
}
