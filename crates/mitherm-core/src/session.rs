//! The sensor session state machine.
//!
//! A session owns one mode for its lifetime and publishes everything it
//! learns into a shared [`ReadingStore`]. The three modes:
//!
//! - **connected-notify**: scan, connect, subscribe to the temperature
//!   characteristic, and stream notifications until stopped.
//! - **advertisement-monitor**: never connect; decode Environmental
//!   Sensing service data out of broadcast packets, deduplicated by the
//!   payload's frame counter.
//! - **discovery-only**: log every device seen, publish nothing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use time::OffsetDateTime;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mitherm_types::uuid::{CCC_DESCRIPTOR_HANDLE, ENVIRONMENTAL_SENSING_SERVICE};
use mitherm_types::{ConnectionStatus, Reading, SessionMode};

use crate::dedup::FrameDeduplicator;
use crate::error::{Error, Result};
use crate::filter::DeviceFilter;
use crate::radio::{GattCharacteristic, Radio};
use crate::store::ReadingStore;

/// Configuration for a [`SensorSession`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// How the session talks to the sensor.
    pub mode: SessionMode,
    /// Which device to look for.
    pub filter: DeviceFilter,
    /// How long to scan before giving up. `None` scans until cancelled.
    pub scan_timeout: Option<Duration>,
    /// How long to keep streaming or monitoring once data flows.
    /// `None` runs until cancelled.
    pub run_duration: Option<Duration>,
}

/// Drives one sensor for the lifetime of the process.
pub struct SensorSession {
    radio: Arc<dyn Radio>,
    store: Arc<ReadingStore>,
    options: SessionOptions,
}

impl SensorSession {
    /// Create a session. Nothing happens until [`run`](Self::run).
    pub fn new(radio: Arc<dyn Radio>, store: Arc<ReadingStore>, options: SessionOptions) -> Self {
        Self {
            radio,
            store,
            options,
        }
    }

    /// Run the session to completion.
    ///
    /// Cancelling `cancel` at any point is an orderly stop and yields
    /// `Ok(())`. An unplanned peer disconnect yields
    /// [`Error::PeerDisconnected`]; setup failures propagate as-is.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        info!(mode = %self.options.mode, "session starting");
        let result = match self.options.mode {
            SessionMode::ConnectedNotify => self.run_connected(&cancel).await,
            SessionMode::AdvertisementMonitor => self.run_monitor(&cancel).await,
            SessionMode::DiscoveryOnly => self.run_discovery(&cancel).await,
        };
        match result {
            Err(Error::Cancelled) => {
                debug!("session cancelled during setup");
                self.store.set_status(ConnectionStatus::Disconnected);
                Ok(())
            }
            other => other,
        }
    }

    async fn run_connected(&self, cancel: &CancellationToken) -> Result<()> {
        self.store.set_status(ConnectionStatus::Scanning);
        let device = self
            .radio
            .find_device(&self.options.filter, self.options.scan_timeout, cancel.clone())
            .await?;
        info!(name = %device.name, address = %device.address, "device found");

        self.store.set_status(ConnectionStatus::Connecting);
        let link = self.radio.connect(&device).await?;
        self.store.set_status(ConnectionStatus::Connected);

        let characteristics = link.discover_characteristics().await?;
        let characteristic = select_notify_characteristic(&characteristics)
            .ok_or_else(|| {
                Error::characteristic_not_found(CCC_DESCRIPTOR_HANDLE, characteristics.len())
            })?
            .clone();

        let store = Arc::clone(&self.store);
        link.subscribe(
            &characteristic,
            Box::new(move |data| match Reading::from_notification(data) {
                Ok(reading) => {
                    let reading = reading.observed_at(OffsetDateTime::now_utc());
                    info!(
                        temperature = reading.temperature,
                        humidity = reading.humidity,
                        "reading"
                    );
                    store.update(reading, ConnectionStatus::Connected);
                }
                Err(err) => warn!(%err, "dropping malformed notification"),
            }),
        )
        .await?;
        self.store.set_status(ConnectionStatus::Subscribed);

        let peer_lost = link.disconnected();
        let stop = async {
            match self.options.run_duration {
                Some(duration) => {
                    tokio::select! {
                        _ = cancel.cancelled() => {}
                        _ = tokio::time::sleep(duration) => {}
                    }
                }
                None => cancel.cancelled().await,
            }
        };

        tokio::select! {
            _ = stop => {
                self.store.set_status(ConnectionStatus::Disconnecting);
                link.unsubscribe(&characteristic).await?;
                link.disconnect().await?;
                self.store.set_status(ConnectionStatus::Disconnected);
                Ok(())
            }
            _ = peer_lost.cancelled() => {
                // No unsubscribe: the link is already gone.
                self.store.set_status(ConnectionStatus::Disconnected);
                Err(Error::peer_disconnected(link.address()))
            }
        }
    }

    async fn run_monitor(&self, cancel: &CancellationToken) -> Result<()> {
        self.store.set_status(ConnectionStatus::Monitoring);

        let store = Arc::clone(&self.store);
        let dedup = Mutex::new(FrameDeduplicator::new());
        let handler = Box::new(move |adv: crate::radio::Advertisement| {
            let Some(data) = adv
                .service_data
                .iter()
                .find(|(uuid, _)| *uuid == ENVIRONMENTAL_SENSING_SERVICE)
                .map(|(_, data)| data)
            else {
                return;
            };
            let reading = match Reading::from_advertisement(data) {
                Ok(reading) => reading,
                Err(err) => {
                    warn!(%err, address = %adv.address, "dropping malformed advertisement");
                    return;
                }
            };
            if let Some(frame) = reading.frame_counter {
                let mut dedup = dedup.lock().unwrap_or_else(|e| e.into_inner());
                if !dedup.accept(frame) {
                    debug!(frame, "duplicate frame");
                    return;
                }
            }
            let reading = reading.observed_at(OffsetDateTime::now_utc());
            info!(
                temperature = reading.temperature,
                humidity = reading.humidity,
                battery = reading.battery,
                frame = reading.frame_counter,
                "reading"
            );
            store.update(reading, ConnectionStatus::Monitoring);
        });

        let scan_token = cancel.child_token();
        if let Some(duration) = self.options.run_duration {
            let token = scan_token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                token.cancel();
            });
        }

        self.radio
            .scan(Some(&self.options.filter), true, handler, scan_token)
            .await?;
        self.store.set_status(ConnectionStatus::Disconnected);
        Ok(())
    }

    async fn run_discovery(&self, cancel: &CancellationToken) -> Result<()> {
        let handler = Box::new(|adv: crate::radio::Advertisement| {
            info!(name = %adv.name, address = %adv.address, rssi = ?adv.rssi, "discovered device");
        });

        let scan_token = cancel.child_token();
        if let Some(duration) = self.options.scan_timeout {
            let token = scan_token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                token.cancel();
            });
        }

        self.radio.scan(None, false, handler, scan_token).await
    }
}

/// Select the characteristic to subscribe to: it must advertise the
/// notify capability and carry the CCC descriptor at the expected handle.
fn select_notify_characteristic(
    characteristics: &[GattCharacteristic],
) -> Option<&GattCharacteristic> {
    characteristics.iter().find(|characteristic| {
        characteristic.can_notify
            && characteristic
                .descriptors
                .iter()
                .any(|descriptor| descriptor.handle == Some(CCC_DESCRIPTOR_HANDLE))
    })
}
