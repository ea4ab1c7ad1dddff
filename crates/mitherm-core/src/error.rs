//! Error types for mitherm-core.
//!
//! Errors fall into the taxonomy the session enforces:
//!
//! | Class | Variants | Handling |
//! |-------|----------|----------|
//! | Fatal setup | [`Error::DeviceNotFound`], [`Error::CharacteristicNotFound`], [`Error::Bluetooth`] during setup | abort the session, process exits non-zero |
//! | Transient per-frame | [`Error::Decode`] | logged, frame dropped, session continues |
//! | Expected termination | never an error; cancellation returns `Ok` |
//! | Unplanned termination | [`Error::PeerDisconnected`] | reported, no unsubscribe attempted |

use std::time::Duration;

use thiserror::Error;

use mitherm_types::DecodeError;

/// Errors that can occur when driving a sensor session.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error from the platform stack.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// Device not found during scan or connection.
    #[error("Device not found: {0}")]
    DeviceNotFound(DeviceNotFoundReason),

    /// No characteristic with the notify capability and the expected CCC
    /// descriptor handle was discovered on the peripheral.
    #[error(
        "characteristic with CCC handle 0x{handle:02X} not found (searched {characteristic_count} characteristics)"
    )]
    CharacteristicNotFound {
        /// The descriptor handle that was searched for.
        handle: u16,
        /// Number of characteristics that were searched.
        characteristic_count: usize,
    },

    /// Failed to decode a sensor payload.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Operation timed out.
    #[error("operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// The peer closed the link while the session was subscribed.
    #[error("peer [{address}] disconnected unexpectedly")]
    PeerDisconnected {
        /// Address of the disconnected peer.
        address: String,
    },

    /// Operation attempted on a link that is no longer up.
    #[error("not connected to device")]
    NotConnected,

    /// Operation was cancelled by the external stop signal.
    #[error("operation cancelled")]
    Cancelled,

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reason why a device was not found.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new reasons
/// in future versions without breaking downstream code.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum DeviceNotFoundReason {
    /// Device matching the filter not found.
    NoMatch {
        /// The name or address the filter was looking for.
        target: String,
    },
    /// Scan duration elapsed before the filter matched.
    ScanTimeout {
        /// The configured scan duration.
        duration: Duration,
    },
    /// No Bluetooth adapter available.
    NoAdapter,
}

impl std::fmt::Display for DeviceNotFoundReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoMatch { target } => write!(f, "no device matching '{}'", target),
            Self::ScanTimeout { duration } => write!(f, "scan timed out after {:?}", duration),
            Self::NoAdapter => write!(f, "no Bluetooth adapter available"),
        }
    }
}

impl Error {
    /// Create a device not found error for a specific filter target.
    pub fn device_not_found(target: impl Into<String>) -> Self {
        Self::DeviceNotFound(DeviceNotFoundReason::NoMatch {
            target: target.into(),
        })
    }

    /// Create a scan timeout error.
    pub fn scan_timeout(duration: Duration) -> Self {
        Self::DeviceNotFound(DeviceNotFoundReason::ScanTimeout { duration })
    }

    /// Create a characteristic not found error.
    pub fn characteristic_not_found(handle: u16, characteristic_count: usize) -> Self {
        Self::CharacteristicNotFound {
            handle,
            characteristic_count,
        }
    }

    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a peer disconnect error.
    pub fn peer_disconnected(address: impl Into<String>) -> Self {
        Self::PeerDisconnected {
            address: address.into(),
        }
    }
}

/// Result type alias using mitherm-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
