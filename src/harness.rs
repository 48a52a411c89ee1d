//! Single-camera exercise harness.
//!
//! [`CaptureHarness`] drives one camera through the select → preview →
//! take-picture cycle behind an explicit state machine. Every transition
//! is guarded; a rejected call is a usage fault raised before the camera
//! service is touched. Size and profile selections are rebuilt whenever
//! the active camera changes.

use crate::capture::{capture_channel, PendingCapture, DEFAULT_EVENT_CAPACITY};
use crate::config::RigConfig;
use crate::errors::CameraError;
use crate::service::{CameraDevice, CameraService};
use crate::types::{
    CaptureProfile, CaptureRequest, OutputSurface, PreviewSurface, ProfileQuality,
    RequestTemplate, Size,
};
use std::sync::Arc;

/// Harness lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HarnessState {
    Uninitialized,
    Open,
    Preview,
    TakingPicture,
}

pub struct CaptureHarness {
    service: Arc<dyn CameraService>,
    surface: Arc<PreviewSurface>,
    state: HarnessState,
    camera_id: Option<String>,
    device: Option<Box<dyn CameraDevice>>,
    preview_sizes: Vec<Size>,
    preview_index: usize,
    snapshot_sizes: Vec<Size>,
    snapshot_index: usize,
    profiles: Vec<CaptureProfile>,
    profile_index: usize,
    fallback_size: Size,
    restart_on_size_change: bool,
    event_capacity: usize,
}

impl CaptureHarness {
    pub fn new(service: Arc<dyn CameraService>, surface: Arc<PreviewSurface>) -> Self {
        Self::with_config(service, surface, &RigConfig::default())
    }

    pub fn with_config(
        service: Arc<dyn CameraService>,
        surface: Arc<PreviewSurface>,
        config: &RigConfig,
    ) -> Self {
        Self {
            service,
            surface,
            state: HarnessState::Uninitialized,
            camera_id: None,
            device: None,
            preview_sizes: Vec::new(),
            preview_index: 0,
            snapshot_sizes: Vec::new(),
            snapshot_index: 0,
            profiles: Vec::new(),
            profile_index: 0,
            fallback_size: config.fallback_preview_size(),
            restart_on_size_change: config.preview.restart_on_size_change,
            event_capacity: DEFAULT_EVENT_CAPACITY.max(config.ops.capture_event_capacity),
        }
    }

    pub fn state(&self) -> HarnessState {
        self.state
    }

    pub fn camera_id(&self) -> Option<&str> {
        self.camera_id.as_deref()
    }

    pub fn preview_sizes(&self) -> &[Size] {
        &self.preview_sizes
    }

    pub fn preview_index(&self) -> usize {
        self.preview_index
    }

    pub fn selected_preview_size(&self) -> Option<Size> {
        self.preview_sizes.get(self.preview_index).copied()
    }

    pub fn snapshot_sizes(&self) -> &[Size] {
        &self.snapshot_sizes
    }

    pub fn snapshot_index(&self) -> usize {
        self.snapshot_index
    }

    pub fn selected_snapshot_size(&self) -> Option<Size> {
        self.snapshot_sizes.get(self.snapshot_index).copied()
    }

    pub fn profiles(&self) -> &[CaptureProfile] {
        &self.profiles
    }

    pub fn profile_index(&self) -> usize {
        self.profile_index
    }

    /// Switches the harness to camera `id`: closes any open device, opens
    /// the new one, resets both size selections to the first entry and
    /// rebuilds the profile list to the subset the service supports.
    pub fn select_camera(&mut self, id: &str) -> Result<(), CameraError> {
        log::debug!("setting up camera {id}");
        if self.state >= HarnessState::Open {
            log::debug!("closing old camera");
            self.release()?;
        }

        let device = self
            .service
            .open_device(id)
            .map_err(|e| CameraError::access(format!("can't open camera {id}"), e))?;
        let properties = device
            .properties()
            .map_err(|e| CameraError::access(format!("can't query properties of {id}"), e))?;

        self.device = Some(device);
        self.camera_id = Some(id.to_string());
        self.state = HarnessState::Open;

        self.preview_sizes = properties.processed_sizes;
        self.preview_index = 0;
        self.snapshot_sizes = properties.jpeg_sizes;
        self.snapshot_index = 0;
        self.profiles = self.load_profiles(id)?;
        self.profile_index = 0;

        let size = self
            .preview_sizes
            .first()
            .copied()
            .unwrap_or(self.fallback_size);
        self.surface.set_fixed_size(size);
        Ok(())
    }

    /// Closes the open device and returns to `Uninitialized`.
    pub fn release(&mut self) -> Result<(), CameraError> {
        let was_previewing = self.state == HarnessState::Preview;
        self.state = HarnessState::Uninitialized;
        self.camera_id = None;

        let Some(mut device) = self.device.take() else {
            return Ok(());
        };
        if was_previewing {
            if let Err(err) = device.stop_repeating() {
                log::warn!("stopping preview during release failed: {err}");
            }
        }
        device
            .close()
            .map_err(|e| CameraError::access("can't close device", e))
    }

    pub fn start_preview(&mut self) -> Result<(), CameraError> {
        match self.state {
            HarnessState::Uninitialized => {
                return Err(CameraError::usage("no camera selected"));
            }
            HarnessState::Preview => {
                return Err(CameraError::usage("preview already running"));
            }
            HarnessState::TakingPicture => {
                return Err(CameraError::usage(
                    "can't change preview state while taking picture",
                ));
            }
            HarnessState::Open => {}
        }

        let size = self.selected_preview_size().unwrap_or(self.fallback_size);
        self.surface.set_fixed_size(size);
        let target = self.surface.output().expect("size bound above");

        let device = self.device.as_mut().expect("open state implies device");
        device
            .configure_outputs(vec![target.clone()])
            .map_err(|e| CameraError::access("can't configure preview output", e))?;
        device
            .set_repeating_request(CaptureRequest::new(RequestTemplate::Preview).add_target(target))
            .map_err(|e| CameraError::access("can't start preview", e))?;

        log::debug!("starting preview at {size}");
        self.state = HarnessState::Preview;
        Ok(())
    }

    pub fn stop_preview(&mut self) -> Result<(), CameraError> {
        match self.state {
            HarnessState::Preview => {}
            HarnessState::TakingPicture => {
                return Err(CameraError::usage(
                    "can't change preview state while taking picture",
                ));
            }
            _ => return Err(CameraError::usage("preview not running")),
        }

        let device = self.device.as_mut().expect("preview state implies device");
        device
            .stop_repeating()
            .map_err(|e| CameraError::access("can't stop preview", e))?;

        log::debug!("stopping preview");
        self.state = HarnessState::Open;
        Ok(())
    }

    /// Applies preview size `index`, restarting an active preview.
    pub fn select_preview_size(&mut self, index: usize) -> Result<(), CameraError> {
        if self.state == HarnessState::TakingPicture {
            return Err(CameraError::usage(
                "can't change preview size while taking picture",
            ));
        }
        if index >= self.preview_sizes.len() {
            return Err(CameraError::usage(format!(
                "preview size index {index} out of range"
            )));
        }
        if index == self.preview_index {
            return Ok(());
        }
        log::debug!("switching preview sizes");

        let was_previewing = self.state == HarnessState::Preview;
        if was_previewing {
            self.stop_preview()?;
        }

        self.preview_index = index;
        self.surface.set_fixed_size(self.preview_sizes[index]);

        if was_previewing && self.restart_on_size_change {
            self.start_preview()?;
        }
        Ok(())
    }

    pub fn select_snapshot_size(&mut self, index: usize) -> Result<(), CameraError> {
        if self.state == HarnessState::TakingPicture {
            return Err(CameraError::usage(
                "can't change snapshot size while taking picture",
            ));
        }
        if index >= self.snapshot_sizes.len() {
            return Err(CameraError::usage(format!(
                "snapshot size index {index} out of range"
            )));
        }
        if index != self.snapshot_index {
            log::debug!("switching snapshot sizes");
            self.snapshot_index = index;
        }
        Ok(())
    }

    pub fn select_profile(&mut self, index: usize) -> Result<(), CameraError> {
        if index >= self.profiles.len() {
            return Err(CameraError::usage(format!(
                "capture profile index {index} out of range"
            )));
        }
        self.profile_index = index;
        Ok(())
    }

    /// Submits a still capture at the selected snapshot size. Only legal
    /// while previewing; any other state is rejected before the service
    /// is involved.
    pub fn take_picture(&mut self) -> Result<PendingCapture, CameraError> {
        if self.state != HarnessState::Preview {
            return Err(CameraError::usage(
                "can't take picture while not running preview",
            ));
        }
        log::debug!("taking picture");

        let size = self.selected_snapshot_size().unwrap_or(self.fallback_size);
        let target = OutputSurface::new(size);
        let (sender, pending) = capture_channel(self.event_capacity);

        let device = self.device.as_mut().expect("preview state implies device");
        device
            .submit_capture(
                CaptureRequest::new(RequestTemplate::StillCapture).add_target(target),
                sender,
            )
            .map_err(|e| CameraError::access("can't take picture", e))?;

        self.state = HarnessState::TakingPicture;
        Ok(pending)
    }

    /// Acknowledges a finished capture and returns the harness to `Open`.
    pub fn finish_capture(&mut self) -> Result<(), CameraError> {
        if self.state != HarnessState::TakingPicture {
            return Err(CameraError::usage("no picture in flight"));
        }
        self.state = HarnessState::Open;
        Ok(())
    }

    fn load_profiles(&self, id: &str) -> Result<Vec<CaptureProfile>, CameraError> {
        let mut profiles = Vec::new();
        for quality in ProfileQuality::ALL {
            let supported = self
                .service
                .profile(id, quality)
                .map_err(|e| CameraError::access(format!("can't query profiles of {id}"), e))?;
            if let Some(profile) = supported {
                profiles.push(profile);
            }
        }
        Ok(profiles)
    }
}
