//! Scripted in-memory radio for exercising the session state machine
//! without Bluetooth hardware.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::filter::DeviceFilter;
use crate::radio::{
    Advertisement, AdvertisementHandler, DiscoveredDevice, GattCharacteristic, GattDescriptor,
    NotificationHandler, Radio, RadioLink,
};
use mitherm_types::uuid::{CCC_DESCRIPTOR, CCC_DESCRIPTOR_HANDLE, TEMP_HUMIDITY_CHARACTERISTIC};

/// A [`Radio`] whose behavior is scripted up front.
///
/// Scans replay the configured advertisements and then park until the
/// cancellation token fires, mirroring a real scan that has gone quiet.
/// Every operation performed on the connected link is appended to a shared
/// call log so tests can assert ordering.
pub struct MockRadio {
    advertisements: Vec<Advertisement>,
    device: Option<DiscoveredDevice>,
    characteristics: Vec<GattCharacteristic>,
    notifications: Vec<Vec<u8>>,
    fail_connect: bool,
    calls: Arc<Mutex<Vec<String>>>,
    peer_disconnect: CancellationToken,
}

impl MockRadio {
    /// A radio with no devices, no advertisements, and the sensor's
    /// standard notify characteristic ready for any future link.
    pub fn new() -> Self {
        Self {
            advertisements: Vec::new(),
            device: None,
            characteristics: vec![GattCharacteristic {
                uuid: TEMP_HUMIDITY_CHARACTERISTIC,
                can_notify: true,
                descriptors: vec![GattDescriptor {
                    uuid: CCC_DESCRIPTOR,
                    handle: Some(CCC_DESCRIPTOR_HANDLE),
                }],
            }],
            notifications: Vec::new(),
            fail_connect: false,
            calls: Arc::new(Mutex::new(Vec::new())),
            peer_disconnect: CancellationToken::new(),
        }
    }

    /// Script the advertisements every scan replays, in order.
    pub fn with_advertisements(mut self, advertisements: Vec<Advertisement>) -> Self {
        self.advertisements = advertisements;
        self
    }

    /// Script the device `find_device` discovers.
    pub fn with_device(mut self, device: DiscoveredDevice) -> Self {
        self.device = Some(device);
        self
    }

    /// Replace the characteristics a connected link reports.
    pub fn with_characteristics(mut self, characteristics: Vec<GattCharacteristic>) -> Self {
        self.characteristics = characteristics;
        self
    }

    /// Script the notification payloads delivered on subscribe, in order.
    pub fn with_notifications(mut self, notifications: Vec<Vec<u8>>) -> Self {
        self.notifications = notifications;
        self
    }

    /// Make `connect` fail.
    pub fn failing_connect(mut self) -> Self {
        self.fail_connect = true;
        self
    }

    /// The link operations performed so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Token that simulates the peer dropping the link when cancelled.
    pub fn peer_disconnect_token(&self) -> CancellationToken {
        self.peer_disconnect.clone()
    }
}

impl Default for MockRadio {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Radio for MockRadio {
    async fn scan(
        &self,
        filter: Option<&DeviceFilter>,
        continuous: bool,
        on_advertisement: AdvertisementHandler,
        cancel: CancellationToken,
    ) -> Result<()> {
        self.calls.lock().unwrap().push("scan".into());

        let mut seen: HashSet<String> = HashSet::new();
        for adv in &self.advertisements {
            if let Some(filter) = filter
                && !filter.matches(&adv.name, &adv.address)
            {
                continue;
            }
            if !continuous && !seen.insert(adv.address.clone()) {
                continue;
            }
            on_advertisement(adv.clone());
        }

        cancel.cancelled().await;
        Ok(())
    }

    async fn find_device(
        &self,
        filter: &DeviceFilter,
        timeout: Option<Duration>,
        cancel: CancellationToken,
    ) -> Result<DiscoveredDevice> {
        self.calls.lock().unwrap().push("find_device".into());

        if let Some(device) = &self.device {
            return Ok(device.clone());
        }
        match timeout {
            Some(duration) => {
                tokio::select! {
                    _ = tokio::time::sleep(duration) => Err(Error::scan_timeout(duration)),
                    _ = cancel.cancelled() => Err(Error::Cancelled),
                }
            }
            None => {
                cancel.cancelled().await;
                Err(Error::Cancelled)
            }
        }
    }

    async fn connect(&self, device: &DiscoveredDevice) -> Result<Box<dyn RadioLink>> {
        self.calls.lock().unwrap().push("connect".into());
        if self.fail_connect {
            return Err(Error::NotConnected);
        }
        Ok(Box::new(MockLink {
            address: device.address.clone(),
            characteristics: self.characteristics.clone(),
            notifications: self.notifications.clone(),
            calls: Arc::clone(&self.calls),
            peer_disconnect: self.peer_disconnect.clone(),
        }))
    }
}

/// The link side of [`MockRadio`]. Delivers scripted notifications
/// synchronously inside `subscribe`.
struct MockLink {
    address: String,
    characteristics: Vec<GattCharacteristic>,
    notifications: Vec<Vec<u8>>,
    calls: Arc<Mutex<Vec<String>>>,
    peer_disconnect: CancellationToken,
}

#[async_trait]
impl RadioLink for MockLink {
    fn address(&self) -> &str {
        &self.address
    }

    async fn discover_characteristics(&self) -> Result<Vec<GattCharacteristic>> {
        self.calls.lock().unwrap().push("discover".into());
        Ok(self.characteristics.clone())
    }

    async fn subscribe(
        &self,
        characteristic: &GattCharacteristic,
        on_notification: NotificationHandler,
    ) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("subscribe {}", short_uuid(characteristic.uuid)));
        for payload in &self.notifications {
            on_notification(payload);
        }
        Ok(())
    }

    async fn unsubscribe(&self, characteristic: &GattCharacteristic) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("unsubscribe {}", short_uuid(characteristic.uuid)));
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.calls.lock().unwrap().push("disconnect".into());
        Ok(())
    }

    fn disconnected(&self) -> CancellationToken {
        self.peer_disconnect.clone()
    }
}

fn short_uuid(uuid: Uuid) -> String {
    uuid.to_string()[4..8].to_string()
}
