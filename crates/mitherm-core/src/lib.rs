//! Core BLE library for ATC-flashed Xiaomi LYWSD03MMC thermometers.
//!
//! This crate drives one sensor per process and publishes the latest
//! reading into a shared store:
//!
//! - **Connected mode**: connect to the peripheral and subscribe to GATT
//!   temperature/humidity notifications
//! - **Advertisement monitoring**: passively decode Environmental Sensing
//!   (0x181A) service data, with frame-counter deduplication
//! - **Discovery**: scan and log nearby devices
//!
//! # Platform Differences
//!
//! Device identification varies by platform due to differences in BLE
//! implementations:
//!
//! - **macOS**: Devices are identified by a UUID assigned by CoreBluetooth,
//!   stable for a given device on a given Mac but not across Macs.
//! - **Linux/Windows**: Devices are identified by their Bluetooth MAC
//!   address (e.g., `A4:C1:38:AA:BB:CC`), consistent across machines.
//!
//! The `--addr` configuration surface accepts whichever form the platform
//! reports.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mitherm_core::{BtleRadio, DeviceFilter, ReadingStore, SensorSession, SessionOptions};
//! use mitherm_types::SessionMode;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let radio = Arc::new(BtleRadio::new().await?);
//!     let store = Arc::new(ReadingStore::new());
//!
//!     let session = SensorSession::new(
//!         radio,
//!         Arc::clone(&store),
//!         SessionOptions {
//!             mode: SessionMode::ConnectedNotify,
//!             filter: DeviceFilter::by_name("ATC"),
//!             scan_timeout: Some(std::time::Duration::from_secs(15)),
//!             run_duration: None,
//!         },
//!     );
//!     session.run(CancellationToken::new()).await?;
//!
//!     let snapshot = store.snapshot();
//!     println!("{:.2} C, {}%", snapshot.reading.temperature, snapshot.reading.humidity);
//!     Ok(())
//! }
//! ```

pub mod btle;
pub mod dedup;
pub mod error;
pub mod filter;
pub mod mock;
pub mod radio;
pub mod session;
pub mod store;

pub use btle::BtleRadio;
pub use dedup::FrameDeduplicator;
pub use error::{DeviceNotFoundReason, Error, Result};
pub use filter::DeviceFilter;
pub use mock::MockRadio;
pub use radio::{
    Advertisement, AdvertisementHandler, DiscoveredDevice, GattCharacteristic, GattDescriptor,
    NotificationHandler, Radio, RadioLink,
};
pub use session::{SensorSession, SessionOptions};
pub use store::{ReadingStore, Snapshot};

// Re-export the wire types so downstream crates need only one dependency.
pub use mitherm_types::{ConnectionStatus, Reading, SessionMode};
