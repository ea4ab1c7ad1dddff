//! Error types for data decoding in mitherm-types.

use thiserror::Error;

/// Errors that can occur when decoding sensor payloads.
///
/// This error type is platform-agnostic and does not include
/// BLE-specific errors (those belong in mitherm-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// The payload is shorter than the wire format requires.
    #[error("truncated payload: expected at least {expected} bytes, got {actual}")]
    TruncatedPayload {
        /// Minimum number of bytes the format requires.
        expected: usize,
        /// Number of bytes actually available.
        actual: usize,
    },
}

/// Result type alias using mitherm-types' DecodeError type.
pub type DecodeResult<T> = std::result::Result<T, DecodeError>;
