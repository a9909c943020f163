//! Error types for lifecycle operations.

use thiserror::Error;

use crate::adapter::driver::DriverError;

/// Result type for lifecycle operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Error types that can occur while driving the adapter.
///
/// Every variant leaves the controller in its previous well-defined
/// state; nothing here is fatal to the process and nothing retries.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// An operation that needs a live adapter found none
    #[error("no adapter created")]
    NoAdapter,

    /// The driver rejected a call
    #[error(transparent)]
    Driver(#[from] DriverError),
}
