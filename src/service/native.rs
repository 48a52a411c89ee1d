//! Camera service over the host's native capture backend.

use crate::capture::{CaptureEventSender, EncodedImage};
use crate::service::{CameraDevice, CameraService, ServiceError, ServiceResult};
use crate::types::{
    CaptureProfile, CaptureRequest, DeviceProperties, OutputSurface, ProfileQuality, Size,
};
use nokhwa::{
    pixel_format::RgbFormat,
    query,
    utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType},
    CallbackCamera,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// [`CameraService`] implementation backed by the platform camera stack.
pub struct NativeCameraService {
    _private: (),
}

impl NativeCameraService {
    /// Connects to the native backend. Fails when device enumeration is
    /// unusable on this host, so a controller is never built over a dead
    /// service.
    pub fn connect() -> ServiceResult<Self> {
        query(ApiBackend::Auto)
            .map_err(|e| ServiceError::Backend(format!("camera backend unavailable: {}", e)))?;
        Ok(Self { _private: () })
    }
}

impl CameraService for NativeCameraService {
    fn list_devices(&self) -> ServiceResult<Vec<String>> {
        let cameras = query(ApiBackend::Auto)
            .map_err(|e| ServiceError::Backend(format!("Failed to query cameras: {}", e)))?;
        Ok(cameras
            .into_iter()
            .map(|info| info.index().to_string())
            .collect())
    }

    fn device_properties(&self, id: &str) -> ServiceResult<DeviceProperties> {
        let cameras = query(ApiBackend::Auto)
            .map_err(|e| ServiceError::Backend(format!("Failed to query cameras: {}", e)))?;
        let info = cameras
            .into_iter()
            .find(|info| info.index().to_string() == id)
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))?;

        // Common sizes; most backends do not report a canonical list.
        Ok(
            DeviceProperties::new(id.to_string(), info.human_name())
                .with_processed_sizes(common_processed_sizes())
                .with_jpeg_sizes(common_jpeg_sizes()),
        )
    }

    fn open_device(&self, id: &str) -> ServiceResult<Box<dyn CameraDevice>> {
        let index = id
            .parse::<u32>()
            .map_err(|_| ServiceError::NotFound(format!("invalid device id {id}")))?;

        let requested_format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::None);
        let camera = CallbackCamera::new(CameraIndex::Index(index), requested_format, |_| {})
            .map_err(|e| ServiceError::Backend(format!("Failed to open camera {id}: {}", e)))?;

        log::debug!("native backend opened camera {id}");
        Ok(Box::new(NativeDevice {
            id: id.to_string(),
            camera: Arc::new(Mutex::new(camera)),
            repeating: None,
        }))
    }

    fn profile(&self, id: &str, quality: ProfileQuality) -> ServiceResult<Option<CaptureProfile>> {
        let properties = self.device_properties(id)?;
        let max = properties
            .processed_sizes
            .first()
            .copied()
            .unwrap_or(Size::DEFAULT_PREVIEW);
        let (resolution, frame_rate) = profile_parameters(quality);
        if resolution.width > max.width || resolution.height > max.height {
            return Ok(None);
        }
        Ok(Some(CaptureProfile::new(quality, resolution, frame_rate)))
    }
}

fn common_processed_sizes() -> Vec<Size> {
    vec![
        Size::new(1920, 1080),
        Size::new(1280, 720),
        Size::new(640, 480),
    ]
}

fn common_jpeg_sizes() -> Vec<Size> {
    vec![
        Size::new(1920, 1080),
        Size::new(1280, 720),
        Size::new(640, 480),
        Size::new(320, 240),
    ]
}

fn profile_parameters(quality: ProfileQuality) -> (Size, u32) {
    match quality {
        ProfileQuality::Q1080P | ProfileQuality::TimeLapse1080P | ProfileQuality::High
        | ProfileQuality::TimeLapseHigh => (Size::new(1920, 1080), 30),
        ProfileQuality::Q720P | ProfileQuality::TimeLapse720P => (Size::new(1280, 720), 30),
        ProfileQuality::Q480P | ProfileQuality::TimeLapse480P => (Size::new(720, 480), 30),
        ProfileQuality::Cif | ProfileQuality::TimeLapseCif => (Size::new(352, 288), 30),
        ProfileQuality::Qvga | ProfileQuality::TimeLapseQvga => (Size::new(320, 240), 30),
        ProfileQuality::Qcif | ProfileQuality::TimeLapseQcif | ProfileQuality::Low
        | ProfileQuality::TimeLapseLow => (Size::new(176, 144), 30),
    }
}

/// An open native camera.
struct NativeDevice {
    id: String,
    camera: Arc<Mutex<CallbackCamera>>,
    repeating: Option<CaptureRequest>,
}

impl CameraDevice for NativeDevice {
    fn id(&self) -> &str {
        &self.id
    }

    fn properties(&self) -> ServiceResult<DeviceProperties> {
        Ok(
            DeviceProperties::new(self.id.clone(), format!("Camera {}", self.id))
                .with_processed_sizes(common_processed_sizes())
                .with_jpeg_sizes(common_jpeg_sizes()),
        )
    }

    fn stop_repeating(&mut self) -> ServiceResult<()> {
        if self.repeating.take().is_none() {
            return Ok(());
        }
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| ServiceError::Backend("Failed to lock camera".to_string()))?;
        camera
            .stop_stream()
            .map_err(|e| ServiceError::Backend(format!("Failed to stop stream: {}", e)))?;
        Ok(())
    }

    fn wait_until_idle(&mut self, _timeout: Duration) -> ServiceResult<()> {
        // The native backend completes requests synchronously; once
        // stop_stream returns there is nothing in flight.
        Ok(())
    }

    fn configure_outputs(&mut self, _outputs: Vec<OutputSurface>) -> ServiceResult<()> {
        // Output routing is caller-side here; the backend streams to
        // whatever consumes poll_frame.
        Ok(())
    }

    fn set_repeating_request(&mut self, request: CaptureRequest) -> ServiceResult<()> {
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| ServiceError::Backend("Failed to lock camera".to_string()))?;
        camera
            .open_stream()
            .map_err(|e| ServiceError::Backend(format!("Failed to start stream: {}", e)))?;
        self.repeating = Some(request);
        Ok(())
    }

    fn submit_capture(
        &mut self,
        _request: CaptureRequest,
        events: CaptureEventSender,
    ) -> ServiceResult<()> {
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| ServiceError::Backend("Failed to lock camera".to_string()))?;

        if !camera.is_stream_open() {
            camera
                .open_stream()
                .map_err(|e| ServiceError::Backend(format!("Failed to start stream: {}", e)))?;
        }

        events.shutter();
        let frame = camera
            .poll_frame()
            .map_err(|e| ServiceError::Backend(format!("Failed to capture frame: {}", e)))?;
        events.raw(None);
        events.postview(None);

        let image = EncodedImage::new(
            frame.resolution().width_x,
            frame.resolution().height_y,
            frame.buffer_bytes().to_vec(),
        );
        events.encoded(image);
        Ok(())
    }

    fn close(&mut self) -> ServiceResult<()> {
        self.repeating = None;
        let mut camera = self
            .camera
            .lock()
            .map_err(|_| ServiceError::Backend("Failed to lock camera".to_string()))?;
        if camera.is_stream_open() {
            camera
                .stop_stream()
                .map_err(|e| ServiceError::Backend(format!("Failed to stop stream: {}", e)))?;
        }
        Ok(())
    }
}

// The backend handle is confined to the controller's worker thread.
unsafe impl Send for NativeDevice {}

impl Drop for NativeDevice {
    fn drop(&mut self) {
        if let Ok(mut camera) = self.camera.lock() {
            let _ = camera.stop_stream();
        }
    }
}
