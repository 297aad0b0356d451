//! Error handling for xof operations
//!
//! This module re-exports the error type used throughout the reader. It uses
//! thiserror and carries byte/bit offsets so callers can match on the
//! failure kind instead of parsing messages.

pub use crate::common::Result;
pub use crate::common::XofError;
