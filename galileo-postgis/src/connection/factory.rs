use super::{Connection, ConnectionConfig, Driver};
use crate::error::PostgisError;
use crate::grammar::{Grammar, PostgresGrammar, SpatialGrammar, SqliteGrammar};

/// Driver name of connections that get the spatial grammar.
pub const SPATIAL_DRIVER: &str = "pgsql";

/// Creates connections with the standard grammars of the supported drivers.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericConnectionFactory;

impl GenericConnectionFactory {
    /// Creates a connection for `config.driver`.
    ///
    /// A registered resolver is used if there is one. Otherwise `pgsql` and `sqlite` drivers get
    /// their standard grammars, and other drivers are rejected with
    /// [`PostgisError::UnsupportedDriver`].
    pub fn create_connection(
        &self,
        driver: Box<dyn Driver>,
        config: &ConnectionConfig,
    ) -> Result<Connection, PostgisError> {
        if let Some(resolver) = Connection::resolver(&config.driver) {
            log::debug!("Creating {} connection with registered resolver", config.driver);
            return Ok(resolver(driver, config));
        }

        let grammar: Box<dyn Grammar> = match config.driver.as_str() {
            "pgsql" => Box::new(PostgresGrammar::with_table_prefix(&config.prefix)),
            "sqlite" => Box::new(SqliteGrammar::with_table_prefix(&config.prefix)),
            other => return Err(PostgisError::UnsupportedDriver(other.to_string())),
        };

        log::debug!("Creating generic {} connection", config.driver);
        Ok(Connection::new(driver, grammar, config.clone()))
    }
}

/// Connection factory that enables spatial queries on PostgreSQL connections.
///
/// ```
/// use galileo_postgis::connection::{ConnectionConfig, ConnectionFactory, Driver, Row};
/// use galileo_postgis::error::PostgisError;
/// use galileo_postgis::value::Value;
///
/// struct Offline;
///
/// impl Driver for Offline {
///     fn select(&self, _: &str, _: &[Value]) -> Result<Vec<Row>, PostgisError> {
///         Ok(vec![])
///     }
///
///     fn execute(&self, _: &str, _: &[Value]) -> Result<u64, PostgisError> {
///         Ok(0)
///     }
/// }
///
/// let factory = ConnectionFactory::new();
/// let connection = factory.create_connection(Box::new(Offline), &ConnectionConfig::new("pgsql", "gis"))?;
/// assert_eq!(connection.driver_name(), "pgsql");
///
/// let unsupported = factory.create_connection(Box::new(Offline), &ConnectionConfig::new("oracle", "gis"));
/// assert!(matches!(unsupported, Err(PostgisError::UnsupportedDriver(_))));
/// # Ok::<(), PostgisError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionFactory {
    generic: GenericConnectionFactory,
}

impl ConnectionFactory {
    /// Creates a new factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connection for `config.driver`.
    ///
    /// Lookup order: a registered resolver, then the spatial grammar for [`SPATIAL_DRIVER`],
    /// then the [`GenericConnectionFactory`].
    pub fn create_connection(
        &self,
        driver: Box<dyn Driver>,
        config: &ConnectionConfig,
    ) -> Result<Connection, PostgisError> {
        if let Some(resolver) = Connection::resolver(&config.driver) {
            log::debug!("Creating {} connection with registered resolver", config.driver);
            return Ok(resolver(driver, config));
        }

        match config.driver.as_str() {
            SPATIAL_DRIVER => {
                log::debug!("Creating spatial {} connection", config.driver);
                let grammar = SpatialGrammar::new(PostgresGrammar::with_table_prefix(&config.prefix));
                Ok(Connection::new(driver, Box::new(grammar), config.clone()))
            }
            _ => self.generic.create_connection(driver, config),
        }
    }
}
