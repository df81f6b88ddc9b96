//! Database connections and their creation.
//!
//! A [`Connection`] pairs a [`Driver`], which transports statements to the database, with a
//! [`Grammar`] that renders queries for that database. Connections are created by the
//! [`ConnectionFactory`], which gives PostgreSQL connections the spatial grammar.

use std::collections::HashMap;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;

use crate::error::PostgisError;
use crate::grammar::{CompiledQuery, Grammar};
use crate::model::Attributes;
use crate::query::QueryBuilder;
use crate::value::Value;

mod config;
mod factory;

pub use config::ConnectionConfig;
pub use factory::{ConnectionFactory, GenericConnectionFactory, SPATIAL_DRIVER};

/// Row returned by a driver.
pub type Row = Attributes;

/// Transport executing statements on a database.
pub trait Driver {
    /// Executes a statement returning rows.
    fn select(&self, sql: &str, bindings: &[Value]) -> Result<Vec<Row>, PostgisError>;

    /// Executes a statement and returns the number of affected rows.
    fn execute(&self, sql: &str, bindings: &[Value]) -> Result<u64, PostgisError>;
}

/// Function creating a connection for a driver name, see [`Connection::register_resolver`].
pub type Resolver =
    Arc<dyn Fn(Box<dyn Driver>, &ConnectionConfig) -> Connection + Send + Sync + 'static>;

lazy_static! {
    static ref RESOLVERS: RwLock<HashMap<String, Resolver>> = RwLock::new(HashMap::new());
}

/// Database connection.
pub struct Connection {
    driver: Box<dyn Driver>,
    grammar: Box<dyn Grammar>,
    config: ConnectionConfig,
}

impl Connection {
    /// Creates a new connection.
    pub fn new(
        driver: Box<dyn Driver>,
        grammar: Box<dyn Grammar>,
        config: ConnectionConfig,
    ) -> Self {
        Self {
            driver,
            grammar,
            config,
        }
    }

    /// Grammar rendering the queries of the connection.
    pub fn grammar(&self) -> &dyn Grammar {
        self.grammar.as_ref()
    }

    /// Configuration the connection was created with.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Name of the driver.
    pub fn driver_name(&self) -> &str {
        &self.config.driver
    }

    /// Name of the database.
    pub fn database_name(&self) -> &str {
        &self.config.database
    }

    /// Starts a query on the given table.
    pub fn table(&self, table: impl Into<String>) -> QueryBuilder {
        QueryBuilder::table(table)
    }

    /// Compiles the query with the grammar of the connection and loads the rows.
    pub fn get(&self, query: &QueryBuilder) -> Result<Vec<Row>, PostgisError> {
        let statement = query.to_sql(self.grammar())?;
        self.select(&statement)
    }

    /// Runs a statement returning rows.
    pub fn select(&self, statement: &CompiledQuery) -> Result<Vec<Row>, PostgisError> {
        log::debug!("[{}] {}", self.config.driver, statement.sql);
        self.driver.select(&statement.sql, &statement.bindings)
    }

    /// Runs a statement returning rows and returns the first of them.
    pub fn select_one(&self, statement: &CompiledQuery) -> Result<Option<Row>, PostgisError> {
        Ok(self.select(statement)?.into_iter().next())
    }

    /// Runs a statement and returns the number of affected rows.
    pub fn execute(&self, statement: &CompiledQuery) -> Result<u64, PostgisError> {
        log::debug!("[{}] {}", self.config.driver, statement.sql);
        self.driver.execute(&statement.sql, &statement.bindings)
    }

    /// Registers a function creating connections for the driver.
    ///
    /// The registry is shared by the whole process. A registered resolver takes precedence over
    /// the built-in grammars of the factories, and registering a resolver for the same driver
    /// again replaces the previous one.
    pub fn register_resolver(
        driver: impl Into<String>,
        resolver: impl Fn(Box<dyn Driver>, &ConnectionConfig) -> Connection + Send + Sync + 'static,
    ) {
        let driver = driver.into();
        log::debug!("Registering connection resolver for driver {driver}");
        RESOLVERS.write().insert(driver, Arc::new(resolver));
    }

    /// Resolver registered for the driver.
    pub fn resolver(driver: &str) -> Option<Resolver> {
        RESOLVERS.read().get(driver).cloned()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
