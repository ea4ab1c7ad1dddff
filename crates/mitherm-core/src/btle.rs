//! btleplug-backed implementation of the [`Radio`] capability.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _,
    ScanFilter,
};
use btleplug::platform::{Adapter, Manager, Peripheral, PeripheralId};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DeviceNotFoundReason, Error, Result};
use crate::filter::DeviceFilter;
use crate::radio::{
    Advertisement, AdvertisementHandler, DiscoveredDevice, GattCharacteristic, GattDescriptor,
    NotificationHandler, Radio, RadioLink,
};
use mitherm_types::uuid::{CCC_DESCRIPTOR, CCC_DESCRIPTOR_HANDLE};

/// Timeout for establishing a BLE connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout for service discovery after connection.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Real BLE radio built on the first available platform adapter.
pub struct BtleRadio {
    adapter: Adapter,
}

impl BtleRadio {
    /// Acquire the first available Bluetooth adapter.
    pub async fn new() -> Result<Self> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(Error::DeviceNotFound(DeviceNotFoundReason::NoAdapter))?;
        Ok(Self { adapter })
    }

    /// Build an [`Advertisement`] for a peripheral, merging in service data
    /// from the triggering event when present.
    async fn advertisement_for(
        &self,
        id: &PeripheralId,
        service_data: Vec<(Uuid, Vec<u8>)>,
    ) -> Option<Advertisement> {
        let peripheral = self.adapter.peripheral(id).await.ok()?;
        let props = peripheral.properties().await.ok()??;
        Some(Advertisement {
            name: props.local_name.unwrap_or_default(),
            address: props.address.to_string(),
            rssi: props.rssi,
            service_data,
        })
    }

    /// Check a peripheral against the filter, returning it as a
    /// [`DiscoveredDevice`] on a match.
    async fn match_device(
        &self,
        id: &PeripheralId,
        filter: &DeviceFilter,
    ) -> Option<DiscoveredDevice> {
        let peripheral = self.adapter.peripheral(id).await.ok()?;
        let props = peripheral.properties().await.ok()??;
        let name = props.local_name.unwrap_or_default();
        let address = props.address.to_string();
        if filter.matches(&name, &address) {
            debug!(%name, %address, "filter matched");
            Some(DiscoveredDevice {
                name,
                address,
                rssi: props.rssi,
            })
        } else {
            None
        }
    }

    /// Search the adapter's peripheral cache for a discovered device.
    async fn peripheral_by_address(&self, address: &str) -> Result<Peripheral> {
        for peripheral in self.adapter.peripherals().await? {
            if let Ok(Some(props)) = peripheral.properties().await
                && props.address.to_string().eq_ignore_ascii_case(address)
            {
                return Ok(peripheral);
            }
        }
        Err(Error::device_not_found(address))
    }
}

#[async_trait]
impl Radio for BtleRadio {
    async fn scan(
        &self,
        filter: Option<&DeviceFilter>,
        continuous: bool,
        on_advertisement: AdvertisementHandler,
        cancel: CancellationToken,
    ) -> Result<()> {
        let mut events = self.adapter.events().await?;
        self.adapter.start_scan(ScanFilter::default()).await?;
        info!(continuous, "BLE scan started");

        // Addresses already reported, for non-continuous scans.
        let mut seen: HashSet<String> = HashSet::new();

        let result = loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("scan cancelled");
                    break Ok(());
                }
                event = events.next() => {
                    let Some(event) = event else { break Ok(()) };
                    let (id, service_data) = match event {
                        // Continuous scans report every advertising event
                        // carrying service data, duplicates included.
                        CentralEvent::ServiceDataAdvertisement { id, service_data }
                            if continuous =>
                        {
                            (id, service_data.into_iter().collect())
                        }
                        CentralEvent::DeviceDiscovered(id) if !continuous => (id, Vec::new()),
                        _ => continue,
                    };
                    let Some(adv) = self.advertisement_for(&id, service_data).await else {
                        continue;
                    };
                    if let Some(filter) = filter
                        && !filter.matches(&adv.name, &adv.address)
                    {
                        continue;
                    }
                    if !continuous && !seen.insert(adv.address.clone()) {
                        continue;
                    }
                    on_advertisement(adv);
                }
            }
        };

        let _ = self.adapter.stop_scan().await;
        result
    }

    async fn find_device(
        &self,
        filter: &DeviceFilter,
        scan_timeout: Option<Duration>,
        cancel: CancellationToken,
    ) -> Result<DiscoveredDevice> {
        let mut events = self.adapter.events().await?;
        self.adapter.start_scan(ScanFilter::default()).await?;
        info!(target = filter.target(), "scanning for device");

        let search = async {
            while let Some(event) = events.next().await {
                if let CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) = event
                    && let Some(device) = self.match_device(&id, filter).await
                {
                    return Ok(device);
                }
            }
            Err(Error::device_not_found(filter.target()))
        };

        let result = match scan_timeout {
            Some(duration) => tokio::select! {
                found = search => found,
                _ = sleep(duration) => Err(Error::scan_timeout(duration)),
                _ = cancel.cancelled() => Err(Error::Cancelled),
            },
            None => tokio::select! {
                found = search => found,
                _ = cancel.cancelled() => Err(Error::Cancelled),
            },
        };

        let _ = self.adapter.stop_scan().await;
        result
    }

    async fn connect(&self, device: &DiscoveredDevice) -> Result<Box<dyn RadioLink>> {
        let peripheral = self.peripheral_by_address(&device.address).await?;

        info!(address = %device.address, "connecting");
        timeout(CONNECT_TIMEOUT, peripheral.connect())
            .await
            .map_err(|_| Error::timeout("connect to device", CONNECT_TIMEOUT))??;
        info!(address = %device.address, "connected");

        // Dedicated observer for asynchronous peer disconnects. Fires the
        // token the session's disconnect-observer awaits.
        let disconnect_token = CancellationToken::new();
        let observer = {
            let mut events = self.adapter.events().await?;
            let peripheral_id = peripheral.id();
            let token = disconnect_token.clone();
            let address = device.address.clone();
            tokio::spawn(async move {
                while let Some(event) = events.next().await {
                    if let CentralEvent::DeviceDisconnected(id) = event
                        && id == peripheral_id
                    {
                        warn!(%address, "peer disconnected");
                        token.cancel();
                        break;
                    }
                }
            })
        };

        Ok(Box::new(BtleLink {
            peripheral,
            address: device.address.clone(),
            characteristics: Mutex::new(HashMap::new()),
            notification_tasks: Mutex::new(Vec::new()),
            observer: Arc::new(observer),
            disconnect_token,
        }))
    }
}

/// An established btleplug GATT link.
pub struct BtleLink {
    peripheral: Peripheral,
    address: String,
    /// Discovered btleplug characteristics by UUID, for subscribe lookups.
    characteristics: Mutex<HashMap<Uuid, Characteristic>>,
    /// Handles for spawned notification tasks (for cleanup).
    notification_tasks: Mutex<Vec<tokio::task::JoinHandle<()>>>,
    /// The disconnect-observer task.
    observer: Arc<tokio::task::JoinHandle<()>>,
    disconnect_token: CancellationToken,
}

impl BtleLink {
    async fn find_characteristic(&self, uuid: Uuid) -> Result<Characteristic> {
        let cache = self.characteristics.lock().await;
        cache.get(&uuid).cloned().ok_or(Error::NotConnected)
    }
}

#[async_trait]
impl RadioLink for BtleLink {
    fn address(&self) -> &str {
        &self.address
    }

    async fn discover_characteristics(&self) -> Result<Vec<GattCharacteristic>> {
        info!("discovering services");
        timeout(DISCOVERY_TIMEOUT, self.peripheral.discover_services())
            .await
            .map_err(|_| Error::timeout("discover services", DISCOVERY_TIMEOUT))??;

        let services = self.peripheral.services();
        debug!("found {} services", services.len());

        let mut discovered = Vec::new();
        let mut cache = self.characteristics.lock().await;
        for service in &services {
            for characteristic in &service.characteristics {
                cache.insert(characteristic.uuid, characteristic.clone());
                discovered.push(GattCharacteristic {
                    uuid: characteristic.uuid,
                    can_notify: characteristic.properties.contains(CharPropFlags::NOTIFY),
                    descriptors: characteristic
                        .descriptors
                        .iter()
                        .map(|descriptor| GattDescriptor {
                            uuid: descriptor.uuid,
                            // btleplug does not expose ATT handles. The
                            // sensor's GATT layout is fixed: its CCC
                            // descriptor sits at handle 0x38.
                            handle: (descriptor.uuid == CCC_DESCRIPTOR)
                                .then_some(CCC_DESCRIPTOR_HANDLE),
                        })
                        .collect(),
                });
            }
        }
        debug!("cached {} characteristics", cache.len());
        Ok(discovered)
    }

    async fn subscribe(
        &self,
        characteristic: &GattCharacteristic,
        on_notification: NotificationHandler,
    ) -> Result<()> {
        let target = self.find_characteristic(characteristic.uuid).await?;
        self.peripheral.subscribe(&target).await?;

        let mut stream = self.peripheral.notifications().await?;
        let target_uuid = target.uuid;
        let task = tokio::spawn(async move {
            while let Some(notification) = stream.next().await {
                if notification.uuid == target_uuid {
                    on_notification(&notification.value);
                }
            }
        });
        self.notification_tasks.lock().await.push(task);

        info!(characteristic = %characteristic.uuid, "subscribed to notifications");
        Ok(())
    }

    async fn unsubscribe(&self, characteristic: &GattCharacteristic) -> Result<()> {
        let target = self.find_characteristic(characteristic.uuid).await?;
        self.peripheral.unsubscribe(&target).await?;
        info!(characteristic = %characteristic.uuid, "unsubscribed from notifications");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        {
            let mut tasks = self.notification_tasks.lock().await;
            for task in tasks.drain(..) {
                task.abort();
            }
        }
        self.observer.abort();
        self.peripheral.disconnect().await?;
        info!(address = %self.address, "disconnected");
        Ok(())
    }

    fn disconnected(&self) -> CancellationToken {
        self.disconnect_token.clone()
    }
}

impl Drop for BtleLink {
    fn drop(&mut self) {
        // Best-effort: stop the observer if disconnect() was never called.
        self.observer.abort();
    }
}
