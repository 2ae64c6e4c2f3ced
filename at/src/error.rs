//! Error taxonomy shared across the store and provider

use thiserror::Error;

use crate::alert::Fingerprint;

/// Errors from alert storage and provider operations.
///
/// `NotFound` is an ordinary lookup miss, not a storage fault; callers that
/// need to distinguish the two can match on the variant.
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("no alert found for fingerprint {0}")]
    NotFound(Fingerprint),

    #[error("invalid alert: {0}")]
    Validation(String),

    #[error("store rejected write: {0}")]
    Store(String),

    #[error("configuration error: {0}")]
    Config(String),
}
