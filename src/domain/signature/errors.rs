//! Signature codec error types.

use thiserror::Error;

/// Caller errors raised while building a signature.
///
/// A failed comparison is not an error: `verify` returns `Ok(false)`.
/// These variants mean the field set itself was unusable, so they must
/// never be reported to a provider as "signature invalid".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    /// A required field was absent or empty.
    #[error("Missing required signature field: {0}")]
    MissingField(String),

    /// The secret could not be used as a key for the digest.
    #[error("Signing key rejected: {0}")]
    InvalidKey(String),

    /// The scheme name in configuration is not a known algorithm.
    #[error("Unknown digest algorithm: {0}")]
    UnknownAlgorithm(String),
}
