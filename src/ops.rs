//! Thread-confined camera controller.
//!
//! [`CameraOps`] owns one dedicated worker thread and proxies every
//! device-mutating call onto it through a task queue, so the device
//! handle is only ever touched from that thread. Callers get a
//! synchronous-looking API: each call posts a closure and blocks on a
//! one-shot reply channel. The worker parks on the queue while idle.

use crate::capture::{capture_channel, PendingCapture};
use crate::config::OpsSettings;
use crate::errors::CameraError;
use crate::service::{CameraDevice, CameraService, ServiceError};
use crate::types::{
    CaptureRequest, DeviceProperties, OutputSurface, PreviewSurface, RequestTemplate, Size, Status,
};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

type OpsTask = Box<dyn FnOnce(&mut OpsState) + Send + 'static>;

/// Worker-thread state. The open device handle never leaves this struct.
struct OpsState {
    service: Arc<dyn CameraService>,
    device: Option<Box<dyn CameraDevice>>,
}

/// Serialized façade over a [`CameraService`].
pub struct CameraOps {
    tasks: Option<Sender<OpsTask>>,
    worker: Option<JoinHandle<()>>,
    status: Mutex<Status>,
    idle_timeout: Duration,
    event_capacity: usize,
}

impl CameraOps {
    /// Builds a controller over `service` with default settings and
    /// spawns its worker thread.
    pub fn create(service: Arc<dyn CameraService>) -> Result<Self, CameraError> {
        Self::with_settings(service, &OpsSettings::default())
    }

    pub fn with_settings(
        service: Arc<dyn CameraService>,
        settings: &OpsSettings,
    ) -> Result<Self, CameraError> {
        let (task_tx, task_rx) = unbounded::<OpsTask>();
        let state = OpsState {
            service,
            device: None,
        };

        let worker = thread::Builder::new()
            .name("camera-ops".to_string())
            .spawn(move || ops_loop(state, task_rx))
            .map_err(|e| {
                CameraError::InitializationError(format!("can't spawn camera ops thread: {e}"))
            })?;

        log::debug!("camera ops worker started");

        Ok(Self {
            tasks: Some(task_tx),
            worker: Some(worker),
            status: Mutex::new(Status::Ok),
            idle_timeout: Duration::from_millis(settings.idle_wait_timeout_ms),
            event_capacity: settings.capture_event_capacity,
        })
    }

    pub fn status(&self) -> Status {
        *self.status.lock().expect("lock poisoned")
    }

    /// The camera identifiers currently reported by the service.
    pub fn devices(&self) -> Result<Vec<String>, CameraError> {
        self.dispatch(|state| {
            state
                .service
                .list_devices()
                .map_err(|e| CameraError::access("can't query device set", e))
        })?
    }

    pub fn device_properties(&self, id: &str) -> Result<DeviceProperties, CameraError> {
        let id = id.to_string();
        self.dispatch(move |state| {
            state
                .service
                .device_properties(&id)
                .map_err(|e| CameraError::access(format!("can't query properties of {id}"), e))
        })?
    }

    /// Opens the named device. Fails if one is already open.
    pub fn open_device(&self, id: &str) -> Result<(), CameraError> {
        let id = id.to_string();
        self.dispatch(move |state| {
            if state.device.is_some() {
                return Err(CameraError::usage("already have open camera device"));
            }
            let device = state
                .service
                .open_device(&id)
                .map_err(|e| CameraError::access(format!("can't open camera {id}"), e))?;
            log::info!("opened camera {id}");
            state.device = Some(device);
            Ok(())
        })?
    }

    /// Closes the open device. No-op when nothing is open; a failing
    /// close is reported and leaves the handle in place.
    pub fn close_device(&self) -> Result<(), CameraError> {
        self.dispatch(|state| {
            let Some(device) = state.device.as_mut() else {
                return Ok(());
            };
            let id = device.id().to_string();
            device
                .close()
                .map_err(|e| CameraError::access("can't close device", e))?;
            state.device = None;
            log::info!("closed camera {id}");
            Ok(())
        })?
    }

    /// Runs a bare preview to `surface`: opens the first device when none
    /// is open, quiesces the device, binds the surface at the first
    /// reported size (640x480 when the device reports none) and starts a
    /// repeating preview request. Configure-or-fail: a failure after
    /// partial configuration is rolled back before returning.
    pub fn minimal_preview(&self, surface: &Arc<PreviewSurface>) -> Result<(), CameraError> {
        let surface = Arc::clone(surface);
        let idle_timeout = self.idle_timeout;
        self.dispatch(move |state| run_minimal_preview(state, &surface, idle_timeout))?
    }

    /// Submits one still capture to `target` on the open device and
    /// returns the pending event stream.
    pub fn capture_still(&self, target: OutputSurface) -> Result<PendingCapture, CameraError> {
        let (sender, pending) = capture_channel(self.event_capacity);
        self.dispatch(move |state| {
            let Some(device) = state.device.as_mut() else {
                return Err(CameraError::usage("no open camera device"));
            };
            let request = CaptureRequest::new(RequestTemplate::StillCapture).add_target(target);
            device
                .submit_capture(request, sender)
                .map_err(|e| CameraError::access("can't submit still capture", e))
        })??;
        Ok(pending)
    }

    fn check_ok(&self) -> Result<(), CameraError> {
        let status = self.status();
        if status < Status::Ok {
            return Err(CameraError::usage(format!("device not ok: {status}")));
        }
        Ok(())
    }

    /// Posts `f` to the worker and blocks for its result. A dead worker
    /// drives status to `Error`; later calls fail the status guard.
    fn dispatch<R, F>(&self, f: F) -> Result<R, CameraError>
    where
        R: Send + 'static,
        F: FnOnce(&mut OpsState) -> R + Send + 'static,
    {
        self.check_ok()?;

        let tasks = self
            .tasks
            .as_ref()
            .expect("task queue lives until drop");
        let (reply_tx, reply_rx) = bounded(1);
        let task: OpsTask = Box::new(move |state| {
            let _ = reply_tx.send(f(state));
        });

        if tasks.send(task).is_err() {
            return Err(self.fail("camera ops worker is gone"));
        }
        match reply_rx.recv() {
            Ok(result) => Ok(result),
            Err(_) => Err(self.fail("camera ops worker died mid-operation")),
        }
    }

    fn fail(&self, message: &str) -> CameraError {
        *self.status.lock().expect("lock poisoned") = Status::Error;
        log::error!("{message}");
        CameraError::access_plain(message)
    }
}

impl Drop for CameraOps {
    fn drop(&mut self) {
        // Closing the queue unparks the worker and ends its loop.
        self.tasks.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("camera ops worker panicked during shutdown");
            }
        }
    }
}

fn ops_loop(mut state: OpsState, tasks: Receiver<OpsTask>) {
    while let Ok(task) = tasks.recv() {
        task(&mut state);
    }
    if let Some(device) = state.device.as_mut() {
        if let Err(err) = device.close() {
            log::warn!("error closing device during worker shutdown: {err}");
        }
    }
    log::debug!("camera ops worker stopped");
}

fn run_minimal_preview(
    state: &mut OpsState,
    surface: &PreviewSurface,
    idle_timeout: Duration,
) -> Result<(), CameraError> {
    if state.device.is_none() {
        let devices = state
            .service
            .list_devices()
            .map_err(|e| CameraError::access("open failure", e))?;
        let Some(first) = devices.first() else {
            return Err(CameraError::access_plain("no devices"));
        };
        let device = state
            .service
            .open_device(first)
            .map_err(|e| CameraError::access("open failure", e))?;
        log::info!("minimal preview opened camera {first}");
        state.device = Some(device);
    }
    let device = state.device.as_mut().expect("device opened above");

    device
        .stop_repeating()
        .map_err(preview_error)?;
    device
        .wait_until_idle(idle_timeout)
        .map_err(preview_error)?;

    let properties = device.properties().map_err(preview_error)?;
    let preview_size = properties
        .processed_sizes
        .first()
        .copied()
        .unwrap_or(Size::DEFAULT_PREVIEW);
    surface.set_fixed_size(preview_size);
    let target = surface.output().expect("size bound above");
    log::debug!("minimal preview binding surface at {preview_size}");

    if let Err(err) = start_repeating(device.as_mut(), target) {
        // Leave no partial configuration behind.
        if let Err(rollback_err) = device.stop_repeating() {
            log::warn!("preview rollback: stop repeating failed: {rollback_err}");
        }
        if let Err(rollback_err) = device.configure_outputs(Vec::new()) {
            log::warn!("preview rollback: clearing outputs failed: {rollback_err}");
        }
        return Err(err);
    }
    Ok(())
}

fn start_repeating(device: &mut dyn CameraDevice, target: OutputSurface) -> Result<(), CameraError> {
    device
        .configure_outputs(vec![target.clone()])
        .map_err(preview_error)?;
    let request = CaptureRequest::new(RequestTemplate::Preview).add_target(target);
    device
        .set_repeating_request(request)
        .map_err(preview_error)?;
    Ok(())
}

fn preview_error(source: ServiceError) -> CameraError {
    CameraError::access("error setting up minimal preview", source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCameraService;

    fn rig_with_one_camera() -> (Arc<FakeCameraService>, CameraOps) {
        let service = Arc::new(
            FakeCameraService::new().with_device(
                DeviceProperties::new("0".into(), "Front".into())
                    .with_processed_sizes(vec![Size::new(1280, 720)]),
            ),
        );
        let ops = CameraOps::create(service.clone()).unwrap();
        (service, ops)
    }

    #[test]
    fn operations_fail_fast_below_ok() {
        let (_, ops) = rig_with_one_camera();
        *ops.status.lock().unwrap() = Status::Uninitialized;

        let err = ops.devices().unwrap_err();
        assert!(err.is_usage_fault());

        *ops.status.lock().unwrap() = Status::Error;
        let err = ops.open_device("0").unwrap_err();
        assert!(err.is_usage_fault());
    }

    #[test]
    fn guard_rejects_before_touching_the_service() {
        let (service, ops) = rig_with_one_camera();
        *ops.status.lock().unwrap() = Status::Uninitialized;

        let _ = ops.devices();
        assert_eq!(service.call_count(), 0);
    }

    #[test]
    fn double_open_is_a_usage_fault() {
        let (_, ops) = rig_with_one_camera();
        ops.open_device("0").unwrap();
        let err = ops.open_device("0").unwrap_err();
        assert!(err.is_usage_fault());
    }

    #[test]
    fn close_without_open_is_a_noop() {
        let (_, ops) = rig_with_one_camera();
        ops.close_device().unwrap();
        assert_eq!(ops.status(), Status::Ok);
    }
}
