//! Construction errors.
use crate::ConfigError;
use std::io;

/// Errors returned when creating an [`EipState`](crate::EipState).
///
/// Nothing after construction returns an error: block processing either succeeds or
/// panics on a broken call order.
#[derive(Debug, thiserror::Error)]
pub enum FeeMarketError {
    /// The parameters failed validation.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The runtime for the background writer could not be built.
    #[error("base fee writer runtime: {0}")]
    Runtime(#[from] io::Error),
}
