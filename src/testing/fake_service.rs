//! Scripted in-memory camera service.
//!
//! Devices, their properties, supported profiles and injected failures
//! are all configured up front; every service and device call is recorded
//! so tests can assert exactly what the rig did (or did not) touch.

use crate::capture::CaptureEventSender;
use crate::service::{CameraDevice, CameraService, ServiceError, ServiceResult};
use crate::testing::synthetic_data::synthetic_encoded_image;
use crate::types::{
    CaptureProfile, CaptureRequest, DeviceProperties, OutputSurface, ProfileQuality, Size,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded service or device call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    ListDevices,
    DeviceProperties(String),
    OpenDevice(String),
    Profile(String, ProfileQuality),
    StopRepeating(String),
    WaitUntilIdle(String),
    ConfigureOutputs(String),
    SetRepeatingRequest(String),
    SubmitCapture(String),
    CloseDevice(String),
}

#[derive(Debug)]
struct FakeDeviceEntry {
    properties: DeviceProperties,
    profiles: Vec<CaptureProfile>,
    open: bool,
    open_count: u32,
    outputs: Vec<OutputSurface>,
    repeating: Option<CaptureRequest>,
    capture_count: u32,
    open_error: Option<ServiceError>,
    idle_error: Option<ServiceError>,
    repeating_error: Option<ServiceError>,
    close_error: Option<ServiceError>,
}

impl FakeDeviceEntry {
    fn new(properties: DeviceProperties) -> Self {
        Self {
            properties,
            profiles: Vec::new(),
            open: false,
            open_count: 0,
            outputs: Vec::new(),
            repeating: None,
            capture_count: 0,
            open_error: None,
            idle_error: None,
            repeating_error: None,
            close_error: None,
        }
    }
}

/// Observable state of a fake device.
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    pub is_open: bool,
    pub open_count: u32,
    pub configured_outputs: Vec<OutputSurface>,
    pub repeating_request: Option<CaptureRequest>,
    pub capture_count: u32,
}

struct Shared {
    devices: Mutex<BTreeMap<String, FakeDeviceEntry>>,
    calls: Mutex<Vec<ServiceCall>>,
}

impl Shared {
    fn record(&self, call: ServiceCall) {
        self.calls.lock().expect("lock poisoned").push(call);
    }

    fn with_entry<R>(
        &self,
        id: &str,
        f: impl FnOnce(&mut FakeDeviceEntry) -> ServiceResult<R>,
    ) -> ServiceResult<R> {
        let mut devices = self.devices.lock().expect("lock poisoned");
        match devices.get_mut(id) {
            Some(entry) => f(entry),
            None => Err(ServiceError::Disconnected(id.to_string())),
        }
    }
}

/// In-memory [`CameraService`] with scripted devices and failures.
pub struct FakeCameraService {
    shared: Arc<Shared>,
}

impl FakeCameraService {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                devices: Mutex::new(BTreeMap::new()),
                calls: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn with_device(self, properties: DeviceProperties) -> Self {
        self.add_device(properties);
        self
    }

    pub fn with_profiles(self, id: &str, profiles: Vec<CaptureProfile>) -> Self {
        self.script(id, |entry| entry.profiles = profiles);
        self
    }

    pub fn with_open_error(self, id: &str, error: ServiceError) -> Self {
        self.script(id, |entry| entry.open_error = Some(error));
        self
    }

    pub fn with_idle_error(self, id: &str, error: ServiceError) -> Self {
        self.script(id, |entry| entry.idle_error = Some(error));
        self
    }

    pub fn with_repeating_error(self, id: &str, error: ServiceError) -> Self {
        self.script(id, |entry| entry.repeating_error = Some(error));
        self
    }

    pub fn with_close_error(self, id: &str, error: ServiceError) -> Self {
        self.script(id, |entry| entry.close_error = Some(error));
        self
    }

    /// Hot-plugs a device, as seen by later `list_devices` calls.
    pub fn add_device(&self, properties: DeviceProperties) {
        let mut devices = self.shared.devices.lock().expect("lock poisoned");
        devices.insert(properties.id.clone(), FakeDeviceEntry::new(properties));
    }

    /// Unplugs a device; open handles start failing as disconnected.
    pub fn remove_device(&self, id: &str) {
        let mut devices = self.shared.devices.lock().expect("lock poisoned");
        devices.remove(id);
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.shared.calls.lock().expect("lock poisoned").clone()
    }

    pub fn call_count(&self) -> usize {
        self.shared.calls.lock().expect("lock poisoned").len()
    }

    pub fn clear_calls(&self) {
        self.shared.calls.lock().expect("lock poisoned").clear();
    }

    pub fn device_snapshot(&self, id: &str) -> Option<DeviceSnapshot> {
        let devices = self.shared.devices.lock().expect("lock poisoned");
        devices.get(id).map(|entry| DeviceSnapshot {
            is_open: entry.open,
            open_count: entry.open_count,
            configured_outputs: entry.outputs.clone(),
            repeating_request: entry.repeating.clone(),
            capture_count: entry.capture_count,
        })
    }

    fn script(&self, id: &str, f: impl FnOnce(&mut FakeDeviceEntry)) {
        let mut devices = self.shared.devices.lock().expect("lock poisoned");
        let entry = devices
            .get_mut(id)
            .unwrap_or_else(|| panic!("no scripted device {id}"));
        f(entry);
    }
}

impl Default for FakeCameraService {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraService for FakeCameraService {
    fn list_devices(&self) -> ServiceResult<Vec<String>> {
        self.shared.record(ServiceCall::ListDevices);
        let devices = self.shared.devices.lock().expect("lock poisoned");
        Ok(devices.keys().cloned().collect())
    }

    fn device_properties(&self, id: &str) -> ServiceResult<DeviceProperties> {
        self.shared.record(ServiceCall::DeviceProperties(id.to_string()));
        let devices = self.shared.devices.lock().expect("lock poisoned");
        devices
            .get(id)
            .map(|entry| entry.properties.clone())
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }

    fn open_device(&self, id: &str) -> ServiceResult<Box<dyn CameraDevice>> {
        self.shared.record(ServiceCall::OpenDevice(id.to_string()));
        let mut devices = self.shared.devices.lock().expect("lock poisoned");
        let entry = devices
            .get_mut(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        if let Some(error) = entry.open_error.clone() {
            return Err(error);
        }
        if entry.open {
            return Err(ServiceError::Busy(id.to_string()));
        }
        entry.open = true;
        entry.open_count += 1;
        Ok(Box::new(FakeDevice {
            id: id.to_string(),
            shared: self.shared.clone(),
        }))
    }

    fn profile(&self, id: &str, quality: ProfileQuality) -> ServiceResult<Option<CaptureProfile>> {
        self.shared.record(ServiceCall::Profile(id.to_string(), quality));
        let devices = self.shared.devices.lock().expect("lock poisoned");
        let entry = devices
            .get(id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;
        Ok(entry
            .profiles
            .iter()
            .find(|profile| profile.quality == quality)
            .cloned())
    }
}

struct FakeDevice {
    id: String,
    shared: Arc<Shared>,
}

impl CameraDevice for FakeDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn properties(&self) -> ServiceResult<DeviceProperties> {
        self.shared
            .with_entry(&self.id, |entry| Ok(entry.properties.clone()))
    }

    fn stop_repeating(&mut self) -> ServiceResult<()> {
        self.shared
            .record(ServiceCall::StopRepeating(self.id.clone()));
        self.shared.with_entry(&self.id, |entry| {
            entry.repeating = None;
            Ok(())
        })
    }

    fn wait_until_idle(&mut self, _timeout: Duration) -> ServiceResult<()> {
        self.shared
            .record(ServiceCall::WaitUntilIdle(self.id.clone()));
        self.shared.with_entry(&self.id, |entry| {
            match entry.idle_error.clone() {
                Some(error) => Err(error),
                None => Ok(()),
            }
        })
    }

    fn configure_outputs(&mut self, outputs: Vec<OutputSurface>) -> ServiceResult<()> {
        self.shared
            .record(ServiceCall::ConfigureOutputs(self.id.clone()));
        self.shared.with_entry(&self.id, |entry| {
            entry.outputs = outputs;
            Ok(())
        })
    }

    fn set_repeating_request(&mut self, request: CaptureRequest) -> ServiceResult<()> {
        self.shared
            .record(ServiceCall::SetRepeatingRequest(self.id.clone()));
        self.shared.with_entry(&self.id, |entry| {
            if let Some(error) = entry.repeating_error.clone() {
                return Err(error);
            }
            entry.repeating = Some(request);
            Ok(())
        })
    }

    fn submit_capture(
        &mut self,
        request: CaptureRequest,
        events: CaptureEventSender,
    ) -> ServiceResult<()> {
        self.shared
            .record(ServiceCall::SubmitCapture(self.id.clone()));
        let size = request
            .targets
            .first()
            .map(|target| target.size)
            .unwrap_or(Size::DEFAULT_PREVIEW);
        self.shared.with_entry(&self.id, |entry| {
            entry.capture_count += 1;
            Ok(())
        })?;

        events.shutter();
        events.raw(None);
        events.postview(None);
        events.encoded(synthetic_encoded_image(size.width, size.height));
        Ok(())
    }

    fn close(&mut self) -> ServiceResult<()> {
        self.shared.record(ServiceCall::CloseDevice(self.id.clone()));
        self.shared.with_entry(&self.id, |entry| {
            if let Some(error) = entry.close_error.clone() {
                return Err(error);
            }
            entry.open = false;
            entry.outputs.clear();
            entry.repeating = None;
            Ok(())
        })
    }
}
