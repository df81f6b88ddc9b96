//! Error type used by the crate.

use thiserror::Error;

/// Galileo PostGIS error type.
#[derive(Debug, Error)]
pub enum PostgisError {
    /// GeoJSON text returned by the backend is empty or malformed.
    #[error("failed to decode geometry: {0}")]
    Decode(String),
    /// Geometry value could not be serialized into GeoJSON.
    #[error("failed to encode geometry: {0}")]
    Encode(String),
    /// No connection can be created for the driver.
    #[error("unsupported driver [{0}]")]
    UnsupportedDriver(String),
    /// The grammar of the connection cannot render a spatial clause.
    #[error("grammar does not support {0}")]
    UnsupportedPredicate(&'static str),
    /// Geometry of a wrong type was given to an operation.
    #[error("expected {expected} geometry, got {found}")]
    UnexpectedGeometry {
        /// Geometry type the operation works with.
        expected: &'static str,
        /// Geometry type that was given.
        found: &'static str,
    },
    /// No connection with the given name is registered.
    #[error("unknown connection [{0}]")]
    UnknownConnection(String),
    /// Error reported by the underlying database driver.
    #[error("driver error: {0}")]
    Driver(String),
    /// Configuration could not be parsed.
    #[error("invalid configuration")]
    Json(#[from] serde_json::Error),
}
