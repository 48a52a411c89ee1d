//! The camera service boundary.
//!
//! Everything the rig does to a camera goes through these two traits:
//! [`CameraService`] for enumeration, property queries and opening, and
//! [`CameraDevice`] for the per-device stream and capture calls. The
//! native backend lives in [`native`]; tests run against the fake service
//! in `crate::testing`.

pub mod native;

use crate::capture::CaptureEventSender;
use crate::types::{CaptureProfile, CaptureRequest, DeviceProperties, OutputSurface, ProfileQuality};
use std::time::Duration;
use thiserror::Error;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failures originating in the camera service or device backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("device busy: {0}")]
    Busy(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("device disconnected: {0}")]
    Disconnected(String),
    #[error("no such device: {0}")]
    NotFound(String),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    #[error("backend error: {0}")]
    Backend(String),
}

/// Camera enumeration and open entry point.
///
/// Implementations must be callable from any thread; the rig confines
/// device handles, not the service handle.
pub trait CameraService: Send + Sync {
    /// Identifiers of the cameras currently reported by the service.
    fn list_devices(&self) -> ServiceResult<Vec<String>>;

    fn device_properties(&self, id: &str) -> ServiceResult<DeviceProperties>;

    /// Opens the named device. The returned handle owns the underlying
    /// camera until [`CameraDevice::close`] or drop.
    fn open_device(&self, id: &str) -> ServiceResult<Box<dyn CameraDevice>>;

    /// The capture profile for `quality` on camera `id`, or `None` when
    /// the combination is unsupported.
    fn profile(&self, id: &str, quality: ProfileQuality) -> ServiceResult<Option<CaptureProfile>>;
}

/// An open camera device.
///
/// Handles are `Send` but not `Sync`: exactly one thread drives a device
/// at a time.
pub trait CameraDevice: Send {
    fn id(&self) -> &str;

    fn properties(&self) -> ServiceResult<DeviceProperties>;

    /// Cancels any in-flight repeating request. No-op when none is set.
    fn stop_repeating(&mut self) -> ServiceResult<()>;

    /// Blocks until no in-flight capture requests remain, or the timeout
    /// expires (`ServiceError::Busy`).
    fn wait_until_idle(&mut self, timeout: Duration) -> ServiceResult<()>;

    /// Replaces the device's output configuration. An empty list clears
    /// all outputs.
    fn configure_outputs(&mut self, outputs: Vec<OutputSurface>) -> ServiceResult<()>;

    /// Starts resubmitting `request` continuously until stopped.
    fn set_repeating_request(&mut self, request: CaptureRequest) -> ServiceResult<()>;

    /// Submits a single still capture. The device reports progress on
    /// `events` in order: shutter, raw, postview, encoded image.
    fn submit_capture(
        &mut self,
        request: CaptureRequest,
        events: CaptureEventSender,
    ) -> ServiceResult<()>;

    fn close(&mut self) -> ServiceResult<()>;
}
