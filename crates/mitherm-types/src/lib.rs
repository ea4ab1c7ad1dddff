//! Platform-agnostic types for ATC BLE thermometers.
//!
//! This crate provides the shared data model for the mitherm workspace:
//! sensor readings, the session status enum, the two wire-format decoders,
//! and the BLE UUID/handle constants of the target sensor.
//!
//! The two wire formats compete for the same physical quantity and do not
//! agree on anything: connected-mode notification frames carry the
//! temperature as a little-endian i16 scaled by 100, while broadcast
//! advertisement frames carry it big-endian scaled by 10. The scale factor
//! is a property of the wire format, not of the sensor.
//!
//! # Example
//!
//! ```
//! use mitherm_types::Reading;
//!
//! // temp raw = 1000 LE -> 10.0 C, humidity 44%
//! let reading = Reading::from_notification(&[0xE8, 0x03, 0x2C]).unwrap();
//! assert_eq!(reading.temperature, 10.0);
//! assert_eq!(reading.humidity, 44);
//! ```

pub mod error;
pub mod types;
pub mod uuid;

pub use error::{DecodeError, DecodeResult};
pub use types::{
    ConnectionStatus, MIN_ADVERTISEMENT_FRAME_BYTES, MIN_NOTIFICATION_FRAME_BYTES, Reading,
    SessionMode,
};

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a well-formed 13-byte advertisement blob.
    fn adv_blob(temp_raw: i16, humidity: u8, battery: u8, frame: u8) -> Vec<u8> {
        let mut blob = vec![0xA4, 0xC1, 0x38, 0xAA, 0xBB, 0xCC]; // MAC
        blob.extend_from_slice(&temp_raw.to_be_bytes());
        blob.push(humidity);
        blob.push(battery);
        blob.extend_from_slice(&[0x0B, 0xB8]); // reserved (voltage)
        blob.push(frame);
        blob
    }

    // --- Notification frame decoding ---

    #[test]
    fn test_notification_decode_basic() {
        // temp raw = 1000 (0x03E8 LE), humidity = 44
        let reading = Reading::from_notification(&[0xE8, 0x03, 0x2C]).unwrap();
        assert_eq!(reading.temperature, 10.0);
        assert_eq!(reading.humidity, 44);
        assert_eq!(reading.battery, None);
        assert_eq!(reading.frame_counter, None);
        assert_eq!(reading.observed_at, None);
    }

    #[test]
    fn test_notification_decode_negative_temperature() {
        // -5.25 C = raw -525 (0xFDF3 LE -> [0xF3, 0xFD])
        let raw = (-525i16).to_le_bytes();
        let reading = Reading::from_notification(&[raw[0], raw[1], 60]).unwrap();
        assert_eq!(reading.temperature, -5.25);
        assert_eq!(reading.humidity, 60);
    }

    #[test]
    fn test_notification_decode_truncated() {
        for len in 0..3 {
            let data = vec![0u8; len];
            let err = Reading::from_notification(&data).unwrap_err();
            assert_eq!(
                err,
                DecodeError::TruncatedPayload {
                    expected: 3,
                    actual: len
                }
            );
        }
    }

    #[test]
    fn test_notification_decode_extra_bytes_ignored() {
        let reading = Reading::from_notification(&[0xE8, 0x03, 0x2C, 0xDE, 0xAD]).unwrap();
        assert_eq!(reading.temperature, 10.0);
        assert_eq!(reading.humidity, 44);
    }

    // --- Advertisement frame decoding ---

    #[test]
    fn test_advertisement_decode_basic() {
        // 21.5 C = raw 215 BE, humidity 48, battery 93, frame 7
        let blob = adv_blob(215, 48, 93, 7);
        let reading = Reading::from_advertisement(&blob).unwrap();
        assert_eq!(reading.temperature, 21.5);
        assert_eq!(reading.humidity, 48);
        assert_eq!(reading.battery, Some(93));
        assert_eq!(reading.frame_counter, Some(7));
    }

    #[test]
    fn test_advertisement_decode_negative_temperature() {
        let blob = adv_blob(-123, 50, 80, 1);
        let reading = Reading::from_advertisement(&blob).unwrap();
        assert_eq!(reading.temperature, -12.3);
    }

    #[test]
    fn test_advertisement_decode_truncated() {
        let blob = adv_blob(215, 48, 93, 7);
        for len in 0..13 {
            let err = Reading::from_advertisement(&blob[..len]).unwrap_err();
            assert_eq!(
                err,
                DecodeError::TruncatedPayload {
                    expected: 13,
                    actual: len
                }
            );
        }
    }

    #[test]
    fn test_advertisement_reserved_bytes_not_decoded() {
        // Two blobs differing only in the reserved voltage field decode
        // to the same reading.
        let mut a = adv_blob(200, 40, 90, 3);
        let mut b = adv_blob(200, 40, 90, 3);
        a[10] = 0x00;
        a[11] = 0x00;
        b[10] = 0xFF;
        b[11] = 0xFF;
        assert_eq!(
            Reading::from_advertisement(&a).unwrap(),
            Reading::from_advertisement(&b).unwrap()
        );
    }

    // --- Reading ---

    #[test]
    fn test_reading_default_is_zero_sentinel() {
        let reading = Reading::default();
        assert_eq!(reading.temperature, 0.0);
        assert_eq!(reading.humidity, 0);
        assert_eq!(reading.battery, None);
        assert_eq!(reading.frame_counter, None);
        assert_eq!(reading.observed_at, None);
    }

    #[test]
    fn test_reading_observed_at_stamp() {
        let at = time::OffsetDateTime::UNIX_EPOCH;
        let reading = Reading::from_notification(&[0xE8, 0x03, 0x2C])
            .unwrap()
            .observed_at(at);
        assert_eq!(reading.observed_at, Some(at));
    }

    // --- ConnectionStatus ---

    #[test]
    fn test_status_is_connected() {
        assert!(ConnectionStatus::Connected.is_connected());
        assert!(ConnectionStatus::Subscribed.is_connected());
        assert!(!ConnectionStatus::Idle.is_connected());
        assert!(!ConnectionStatus::Scanning.is_connected());
        assert!(!ConnectionStatus::Monitoring.is_connected());
        assert!(!ConnectionStatus::Disconnected.is_connected());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(ConnectionStatus::Monitoring.to_string(), "monitoring");
        assert_eq!(ConnectionStatus::Subscribed.to_string(), "subscribed");
    }

    #[test]
    fn test_session_mode_display() {
        assert_eq!(SessionMode::ConnectedNotify.to_string(), "connected-notify");
        assert_eq!(
            SessionMode::AdvertisementMonitor.to_string(),
            "advertisement-monitor"
        );
        assert_eq!(SessionMode::DiscoveryOnly.to_string(), "discovery-only");
    }

    // --- DecodeError ---

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::TruncatedPayload {
            expected: 13,
            actual: 7,
        };
        assert!(err.to_string().contains("13"));
        assert!(err.to_string().contains("7"));
    }

    // --- Serialization ---

    #[test]
    fn test_reading_serialization() {
        let reading = Reading {
            temperature: 21.5,
            humidity: 48,
            battery: Some(93),
            frame_counter: Some(7),
            observed_at: Some(time::OffsetDateTime::UNIX_EPOCH),
        };

        let json = serde_json::to_string(&reading).unwrap();
        assert!(json.contains("\"temperature\":21.5"));
        assert!(json.contains("\"humidity\":48"));
        assert!(json.contains("1970-01-01T00:00:00Z"));
    }

    #[test]
    fn test_reading_serialization_absent_fields_skipped() {
        let json = serde_json::to_string(&Reading::default()).unwrap();
        assert!(!json.contains("battery"));
        assert!(!json.contains("frame_counter"));
        assert!(json.contains("\"observed_at\":null"));
    }

    // --- Decoder totality properties ---

    mod properties {
        use super::super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn notification_decode_succeeds_on_3_plus_bytes(
                data in proptest::collection::vec(any::<u8>(), 3..32)
            ) {
                let reading = Reading::from_notification(&data).unwrap();
                let raw = i16::from_le_bytes([data[0], data[1]]);
                prop_assert_eq!(reading.temperature, f64::from(raw) / 100.0);
                prop_assert_eq!(reading.humidity, data[2]);
            }

            #[test]
            fn notification_decode_fails_on_short_input(
                data in proptest::collection::vec(any::<u8>(), 0..3)
            ) {
                prop_assert!(Reading::from_notification(&data).is_err());
            }

            #[test]
            fn advertisement_decode_succeeds_on_13_plus_bytes(
                data in proptest::collection::vec(any::<u8>(), 13..40)
            ) {
                let reading = Reading::from_advertisement(&data).unwrap();
                let raw = i16::from_be_bytes([data[6], data[7]]);
                prop_assert_eq!(reading.temperature, f64::from(raw) / 10.0);
                prop_assert_eq!(reading.humidity, data[8]);
                prop_assert_eq!(reading.battery, Some(data[9]));
                prop_assert_eq!(reading.frame_counter, Some(data[12]));
            }

            #[test]
            fn advertisement_decode_fails_on_short_input(
                data in proptest::collection::vec(any::<u8>(), 0..13)
            ) {
                prop_assert!(Reading::from_advertisement(&data).is_err());
            }
        }
    }
}
