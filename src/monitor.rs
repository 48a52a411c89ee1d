//! Camera availability monitoring.
//!
//! Polls a [`CameraService`] for its device list and turns id-set changes
//! into connect/disconnect events.

use crate::errors::CameraError;
use crate::service::CameraService;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

/// Device availability event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Connected(String),
    Disconnected(String),
}

/// Watches a camera service for device arrivals and removals.
pub struct AvailabilityMonitor {
    service: Arc<dyn CameraService>,
    known_ids: Arc<RwLock<HashSet<String>>>,
    event_sender: mpsc::UnboundedSender<DeviceEvent>,
    event_receiver: Arc<RwLock<mpsc::UnboundedReceiver<DeviceEvent>>>,
    is_monitoring: Arc<RwLock<bool>>,
    poll_interval: Duration,
}

impl AvailabilityMonitor {
    pub fn new(service: Arc<dyn CameraService>) -> Self {
        Self::with_interval(service, Duration::from_secs(2))
    }

    pub fn with_interval(service: Arc<dyn CameraService>, poll_interval: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            service,
            known_ids: Arc::new(RwLock::new(HashSet::new())),
            event_sender: tx,
            event_receiver: Arc::new(RwLock::new(rx)),
            is_monitoring: Arc::new(RwLock::new(false)),
            poll_interval,
        }
    }

    /// Start watching for device changes. Idempotent.
    pub async fn start_monitoring(&self) -> Result<(), CameraError> {
        let mut is_monitoring = self.is_monitoring.write().await;
        if *is_monitoring {
            return Ok(());
        }

        log::info!("Starting camera availability monitoring");

        let initial = self
            .service
            .list_devices()
            .map_err(|e| CameraError::access("can't query device set", e))?;
        {
            let mut known = self.known_ids.write().await;
            *known = initial.into_iter().collect();
        }

        let service = self.service.clone();
        let known_ids = self.known_ids.clone();
        let event_sender = self.event_sender.clone();
        let monitoring_flag = self.is_monitoring.clone();
        let interval = self.poll_interval;

        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                if !*monitoring_flag.read().await {
                    break;
                }

                let current: HashSet<String> = match service.list_devices() {
                    Ok(ids) => ids.into_iter().collect(),
                    Err(err) => {
                        log::debug!("availability poll failed: {err}");
                        continue;
                    }
                };

                let mut known = known_ids.write().await;
                for id in known.iter() {
                    if !current.contains(id) {
                        log::info!("Camera disconnected: {id}");
                        let _ = event_sender.send(DeviceEvent::Disconnected(id.clone()));
                    }
                }
                for id in current.iter() {
                    if !known.contains(id) {
                        log::info!("Camera connected: {id}");
                        let _ = event_sender.send(DeviceEvent::Connected(id.clone()));
                    }
                }
                *known = current;
            }
        });

        *is_monitoring = true;
        Ok(())
    }

    /// Stop watching for device changes. Idempotent.
    pub async fn stop_monitoring(&self) {
        let mut is_monitoring = self.is_monitoring.write().await;
        if !*is_monitoring {
            return;
        }
        log::info!("Stopping camera availability monitoring");
        *is_monitoring = false;
    }

    /// Next pending event, without waiting.
    pub async fn poll_event(&self) -> Option<DeviceEvent> {
        let mut rx = self.event_receiver.write().await;
        rx.try_recv().ok()
    }

    /// Next event, waiting for one to arrive.
    pub async fn wait_for_event(&self) -> Option<DeviceEvent> {
        let mut rx = self.event_receiver.write().await;
        rx.recv().await
    }

    /// Ids seen on the most recent scan.
    pub async fn known_devices(&self) -> Vec<String> {
        let known = self.known_ids.read().await;
        let mut ids: Vec<String> = known.iter().cloned().collect();
        ids.sort();
        ids
    }
}
