//! Core types for ATC thermometer sensor data.

use core::fmt;

use bytes::Buf;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{DecodeError, DecodeResult};

/// Minimum number of bytes in a connected-mode notification frame.
pub const MIN_NOTIFICATION_FRAME_BYTES: usize = 3;

/// Minimum number of bytes in an Environmental Sensing service-data blob.
pub const MIN_ADVERTISEMENT_FRAME_BYTES: usize = 13;

/// How the session talks to the sensor. Chosen once at session start;
/// a session runs exactly one mode for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SessionMode {
    /// Connect to the peripheral and subscribe to GATT notifications.
    ConnectedNotify,
    /// Never connect; passively decode 0x181A service-data advertisements.
    AdvertisementMonitor,
    /// Scan and log every discovered device, then exit.
    DiscoveryOnly,
}

impl fmt::Display for SessionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionMode::ConnectedNotify => write!(f, "connected-notify"),
            SessionMode::AdvertisementMonitor => write!(f, "advertisement-monitor"),
            SessionMode::DiscoveryOnly => write!(f, "discovery-only"),
        }
    }
}

/// Connection status of the sensor session.
///
/// `Monitoring` is exclusive to advertisement-monitor mode; the connected
/// and monitoring state machines never interleave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ConnectionStatus {
    /// Session created, nothing started yet.
    Idle,
    /// Scanning for a device matching the filter.
    Scanning,
    /// Filter matched, connection attempt in progress.
    Connecting,
    /// Link established.
    Connected,
    /// Notification callback registered.
    Subscribed,
    /// Orderly teardown in progress.
    Disconnecting,
    /// Terminal: link closed or monitoring stopped.
    Disconnected,
    /// Passive advertisement monitoring active.
    Monitoring,
}

impl ConnectionStatus {
    /// Whether a live GATT link exists (connected-notify mode only).
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionStatus::Connected | ConnectionStatus::Subscribed)
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Idle => write!(f, "idle"),
            ConnectionStatus::Scanning => write!(f, "scanning"),
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Subscribed => write!(f, "subscribed"),
            ConnectionStatus::Disconnecting => write!(f, "disconnecting"),
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
            ConnectionStatus::Monitoring => write!(f, "monitoring"),
        }
    }
}

/// A decoded temperature/humidity reading.
///
/// Notification frames populate temperature and humidity only;
/// advertisement frames additionally carry battery and a frame counter.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Reading {
    /// Temperature in degrees Celsius.
    pub temperature: f64,
    /// Relative humidity percentage (0-100).
    pub humidity: u8,
    /// Battery level percentage (advertisement frames only).
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub battery: Option<u8>,
    /// Advertisement frame counter, used for duplicate suppression.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub frame_counter: Option<u8>,
    /// When the reading was received. `None` until the session stamps it;
    /// a store that has never been updated also carries `None`.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339::option"))]
    pub observed_at: Option<OffsetDateTime>,
}

impl Default for Reading {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            humidity: 0,
            battery: None,
            frame_counter: None,
            observed_at: None,
        }
    }
}

impl Reading {
    /// Decode a connected-mode notification frame.
    ///
    /// The byte format, little-endian:
    /// - bytes 0-1: temperature raw (i16 LE, divide by 100 for Celsius)
    /// - byte 2: humidity (u8)
    ///
    /// Extra trailing bytes are ignored. The decoder is pure: it performs
    /// no I/O and does not stamp `observed_at`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TruncatedPayload`] if `data` contains fewer
    /// than [`MIN_NOTIFICATION_FRAME_BYTES`] (3) bytes.
    #[must_use = "decoding returns a Result that should be handled"]
    pub fn from_notification(data: &[u8]) -> DecodeResult<Self> {
        if data.len() < MIN_NOTIFICATION_FRAME_BYTES {
            return Err(DecodeError::TruncatedPayload {
                expected: MIN_NOTIFICATION_FRAME_BYTES,
                actual: data.len(),
            });
        }

        let mut buf = data;
        let temp_raw = buf.get_i16_le();
        let humidity = buf.get_u8();

        Ok(Self {
            temperature: f64::from(temp_raw) / 100.0,
            humidity,
            battery: None,
            frame_counter: None,
            observed_at: None,
        })
    }

    /// Decode an ATC advertisement frame from an Environmental Sensing
    /// (0x181A) service-data blob.
    ///
    /// The byte format:
    /// - bytes 0-5: device MAC (skipped)
    /// - bytes 6-7: temperature raw (i16 **big-endian**, divide by 10)
    /// - byte 8: humidity (u8)
    /// - byte 9: battery percentage (u8)
    /// - bytes 10-11: reserved (battery voltage in the ATC firmware, skipped)
    /// - byte 12: frame counter (u8)
    ///
    /// The caller is responsible for checking the service-data UUID tag;
    /// this function only sees the blob.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TruncatedPayload`] if `data` contains fewer
    /// than [`MIN_ADVERTISEMENT_FRAME_BYTES`] (13) bytes.
    #[must_use = "decoding returns a Result that should be handled"]
    pub fn from_advertisement(data: &[u8]) -> DecodeResult<Self> {
        if data.len() < MIN_ADVERTISEMENT_FRAME_BYTES {
            return Err(DecodeError::TruncatedPayload {
                expected: MIN_ADVERTISEMENT_FRAME_BYTES,
                actual: data.len(),
            });
        }

        let mut buf = &data[6..];
        let temp_raw = buf.get_i16();
        let humidity = buf.get_u8();
        let battery = buf.get_u8();
        buf.advance(2); // reserved
        let frame_counter = buf.get_u8();

        Ok(Self {
            temperature: f64::from(temp_raw) / 10.0,
            humidity,
            battery: Some(battery),
            frame_counter: Some(frame_counter),
            observed_at: None,
        })
    }

    /// Return a copy of this reading stamped with an observation time.
    #[must_use]
    pub fn observed_at(mut self, at: OffsetDateTime) -> Self {
        self.observed_at = Some(at);
        self
    }
}
