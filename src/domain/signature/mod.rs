//! Signature codec.
//!
//! Pure, provider-agnostic computation and verification of message
//! authentication tokens over ordered field sets. Each payment provider
//! describes its format as a [`SignatureScheme`] value; no call site
//! hard-codes a digest.

mod codec;
mod errors;

pub use codec::{DigestAlgorithm, SignatureField, SignatureScheme, TokenCase};
pub use errors::SignatureError;
