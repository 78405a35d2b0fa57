//! Domain layer.
//!
//! Pure types and rules. Nothing here performs I/O.

pub mod discount;
pub mod foundation;
pub mod order;
pub mod signature;
pub mod subscription;
