//! Trait abstractions for the BLE radio.
//!
//! The session core consumes the radio through these traits rather than
//! talking to btleplug directly, so the state machine can be exercised
//! against [`MockRadio`](crate::mock::MockRadio) in tests and against
//! [`BtleRadio`](crate::btle::BtleRadio) in production.

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::Result;
use crate::filter::DeviceFilter;

/// A BLE advertisement as delivered by the radio.
#[derive(Debug, Clone, Default)]
pub struct Advertisement {
    /// Advertised local name, empty if absent.
    pub name: String,
    /// Peripheral address (MAC on Linux/Windows, UUID on macOS).
    pub address: String,
    /// RSSI signal strength, if reported.
    pub rssi: Option<i16>,
    /// Service-data entries keyed by service UUID.
    pub service_data: Vec<(Uuid, Vec<u8>)>,
}

/// A device matched during a scan, ready to be connected.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    /// Local name, empty if the advertisement carried none.
    pub name: String,
    /// Peripheral address or identifier.
    pub address: String,
    /// RSSI at discovery time.
    pub rssi: Option<i16>,
}

/// A descriptor on a discovered characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GattDescriptor {
    /// Descriptor UUID.
    pub uuid: Uuid,
    /// Attribute handle of the descriptor, when the platform stack
    /// exposes or the device's fixed layout determines it.
    pub handle: Option<u16>,
}

/// A characteristic discovered on a connected peripheral.
#[derive(Debug, Clone)]
pub struct GattCharacteristic {
    /// Characteristic UUID.
    pub uuid: Uuid,
    /// Whether the characteristic advertises the notify capability bit.
    pub can_notify: bool,
    /// Descriptors attached to this characteristic.
    pub descriptors: Vec<GattDescriptor>,
}

/// Callback invoked for each advertisement seen during a scan.
pub type AdvertisementHandler = Box<dyn Fn(Advertisement) + Send + Sync>;

/// Callback invoked for each notification received on a subscription.
pub type NotificationHandler = Box<dyn Fn(&[u8]) + Send + Sync>;

/// The radio capability: scanning and connecting.
///
/// Implementations own the platform BLE stack; retry and backoff for the
/// underlying transport are their concern, not the session's.
#[async_trait]
pub trait Radio: Send + Sync {
    /// Scan for advertisements, invoking `on_advertisement` for each one
    /// that passes the filter (or for all of them when `filter` is `None`).
    ///
    /// With `continuous` set, repeated advertisements from the same device
    /// keep being reported; otherwise each device is reported once per
    /// scan. Returns `Ok(())` when `cancel` fires — cancellation is the
    /// normal way a scan ends, not an error.
    async fn scan(
        &self,
        filter: Option<&DeviceFilter>,
        continuous: bool,
        on_advertisement: AdvertisementHandler,
        cancel: CancellationToken,
    ) -> Result<()>;

    /// Scan until a device matching `filter` appears.
    ///
    /// `timeout` of `None` means scan indefinitely until `cancel` fires.
    async fn find_device(
        &self,
        filter: &DeviceFilter,
        timeout: Option<Duration>,
        cancel: CancellationToken,
    ) -> Result<DiscoveredDevice>;

    /// Connect to a previously discovered device.
    async fn connect(&self, device: &DiscoveredDevice) -> Result<Box<dyn RadioLink>>;
}

/// An established GATT link to a peripheral.
#[async_trait]
pub trait RadioLink: Send + Sync {
    /// Address of the connected peer.
    fn address(&self) -> &str;

    /// Discover all characteristics across the peripheral's services.
    async fn discover_characteristics(&self) -> Result<Vec<GattCharacteristic>>;

    /// Subscribe to notifications on a characteristic.
    async fn subscribe(
        &self,
        characteristic: &GattCharacteristic,
        on_notification: NotificationHandler,
    ) -> Result<()>;

    /// Unsubscribe from notifications on a characteristic.
    async fn unsubscribe(&self, characteristic: &GattCharacteristic) -> Result<()>;

    /// Disconnect the link.
    async fn disconnect(&self) -> Result<()>;

    /// A token cancelled when the peer closes the link asynchronously.
    ///
    /// The session's disconnect-observer awaits this; it fires at most
    /// once for the lifetime of the link.
    fn disconnected(&self) -> CancellationToken;
}
