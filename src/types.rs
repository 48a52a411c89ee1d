//! Core types shared across the camrig modules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use uuid::Uuid;

/// A pixel dimension pair, as reported by a camera backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    /// Fallback preview size when a device reports no supported sizes.
    pub const DEFAULT_PREVIEW: Size = Size {
        width: 640,
        height: 480,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Controller health. All device operations require `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    Error,
    Uninitialized,
    Ok,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Error => "error",
            Status::Uninitialized => "uninitialized",
            Status::Ok => "ok",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static properties of a camera device, as reported by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProperties {
    pub id: String,
    pub name: String,
    /// Sizes usable for the processed (preview) stream, preferred first.
    pub processed_sizes: Vec<Size>,
    /// Sizes usable for encoded still captures, preferred first.
    pub jpeg_sizes: Vec<Size>,
    pub is_available: bool,
}

impl DeviceProperties {
    pub fn new(id: String, name: String) -> Self {
        Self {
            id,
            name,
            processed_sizes: Vec::new(),
            jpeg_sizes: Vec::new(),
            is_available: true,
        }
    }

    pub fn with_processed_sizes(mut self, sizes: Vec<Size>) -> Self {
        self.processed_sizes = sizes;
        self
    }

    pub fn with_jpeg_sizes(mut self, sizes: Vec<Size>) -> Self {
        self.jpeg_sizes = sizes;
        self
    }

    pub fn with_availability(mut self, is_available: bool) -> Self {
        self.is_available = is_available;
        self
    }
}

/// A bound output target handed to a device when configuring streams.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSurface {
    pub surface_id: String,
    pub size: Size,
}

impl OutputSurface {
    /// A free-standing target, e.g. a snapshot sink.
    pub fn new(size: Size) -> Self {
        Self {
            surface_id: Uuid::new_v4().to_string(),
            size,
        }
    }
}

/// Caller-owned preview target. The rig binds it to a fixed size before
/// streaming; shared with the worker thread via `Arc`.
#[derive(Debug)]
pub struct PreviewSurface {
    id: String,
    fixed_size: Mutex<Option<Size>>,
}

impl PreviewSurface {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            fixed_size: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_fixed_size(&self, size: Size) {
        *self.fixed_size.lock().expect("lock poisoned") = Some(size);
    }

    pub fn fixed_size(&self) -> Option<Size> {
        *self.fixed_size.lock().expect("lock poisoned")
    }

    /// The surface as an output target. Requires a bound size.
    pub fn output(&self) -> Option<OutputSurface> {
        self.fixed_size().map(|size| OutputSurface {
            surface_id: self.id.clone(),
            size,
        })
    }
}

impl Default for PreviewSurface {
    fn default() -> Self {
        Self::new()
    }
}

/// Capture request template, selecting the device-side tuning bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestTemplate {
    Preview,
    StillCapture,
}

/// A capture request: a template plus the output targets it feeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRequest {
    pub template: RequestTemplate,
    pub targets: Vec<OutputSurface>,
}

impl CaptureRequest {
    pub fn new(template: RequestTemplate) -> Self {
        Self {
            template,
            targets: Vec::new(),
        }
    }

    pub fn add_target(mut self, target: OutputSurface) -> Self {
        self.targets.push(target);
        self
    }
}

/// Recording quality levels a service may support per camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProfileQuality {
    Q1080P,
    Q480P,
    Q720P,
    Cif,
    High,
    Low,
    Qcif,
    Qvga,
    TimeLapse1080P,
    TimeLapse480P,
    TimeLapse720P,
    TimeLapseCif,
    TimeLapseHigh,
    TimeLapseLow,
    TimeLapseQcif,
    TimeLapseQvga,
}

impl ProfileQuality {
    /// Every quality level, in probe order.
    pub const ALL: [ProfileQuality; 16] = [
        ProfileQuality::Q1080P,
        ProfileQuality::Q480P,
        ProfileQuality::Q720P,
        ProfileQuality::Cif,
        ProfileQuality::High,
        ProfileQuality::Low,
        ProfileQuality::Qcif,
        ProfileQuality::Qvga,
        ProfileQuality::TimeLapse1080P,
        ProfileQuality::TimeLapse480P,
        ProfileQuality::TimeLapse720P,
        ProfileQuality::TimeLapseCif,
        ProfileQuality::TimeLapseHigh,
        ProfileQuality::TimeLapseLow,
        ProfileQuality::TimeLapseQcif,
        ProfileQuality::TimeLapseQvga,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileQuality::Q1080P => "1080P",
            ProfileQuality::Q480P => "480P",
            ProfileQuality::Q720P => "720P",
            ProfileQuality::Cif => "CIF",
            ProfileQuality::High => "HIGH",
            ProfileQuality::Low => "LOW",
            ProfileQuality::Qcif => "QCIF",
            ProfileQuality::Qvga => "QVGA",
            ProfileQuality::TimeLapse1080P => "TIME_LAPSE_1080P",
            ProfileQuality::TimeLapse480P => "TIME_LAPSE_480P",
            ProfileQuality::TimeLapse720P => "TIME_LAPSE_720P",
            ProfileQuality::TimeLapseCif => "TIME_LAPSE_CIF",
            ProfileQuality::TimeLapseHigh => "TIME_LAPSE_HIGH",
            ProfileQuality::TimeLapseLow => "TIME_LAPSE_LOW",
            ProfileQuality::TimeLapseQcif => "TIME_LAPSE_QCIF",
            ProfileQuality::TimeLapseQvga => "TIME_LAPSE_QVGA",
        }
    }
}

impl fmt::Display for ProfileQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named bundle of recording parameters, queried per camera id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureProfile {
    pub quality: ProfileQuality,
    pub resolution: Size,
    pub frame_rate: u32,
    /// Video bitrate in bits per second.
    pub video_bitrate: u32,
}

impl CaptureProfile {
    pub fn new(quality: ProfileQuality, resolution: Size, frame_rate: u32) -> Self {
        Self {
            quality,
            resolution,
            frame_rate,
            video_bitrate: default_bitrate(resolution, frame_rate),
        }
    }

    pub fn with_bitrate(mut self, video_bitrate: u32) -> Self {
        self.video_bitrate = video_bitrate;
        self
    }
}

// Rough H.264-class budget: 0.1 bit per pixel per frame.
fn default_bitrate(resolution: Size, frame_rate: u32) -> u32 {
    let pixels = resolution.width as u64 * resolution.height as u64;
    let bits = pixels * frame_rate as u64 / 10;
    bits.min(u32::MAX as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_display() {
        assert_eq!(Size::new(1920, 1080).to_string(), "1920x1080");
        assert_eq!(Size::DEFAULT_PREVIEW.to_string(), "640x480");
    }

    #[test]
    fn status_ordering() {
        assert!(Status::Error < Status::Uninitialized);
        assert!(Status::Uninitialized < Status::Ok);
        assert!(Status::Ok >= Status::Ok);
    }

    #[test]
    fn preview_surface_binds_once_set() {
        let surface = PreviewSurface::new();
        assert!(surface.output().is_none());

        surface.set_fixed_size(Size::new(1280, 720));
        let output = surface.output().unwrap();
        assert_eq!(output.size, Size::new(1280, 720));
        assert_eq!(output.surface_id, surface.id());
    }

    #[test]
    fn profile_probe_order_is_stable() {
        assert_eq!(ProfileQuality::ALL.len(), 16);
        assert_eq!(ProfileQuality::ALL[0], ProfileQuality::Q1080P);
        assert_eq!(ProfileQuality::ALL[15], ProfileQuality::TimeLapseQvga);
    }

    #[test]
    fn profile_default_bitrate_scales_with_resolution() {
        let hd = CaptureProfile::new(ProfileQuality::Q1080P, Size::new(1920, 1080), 30);
        let sd = CaptureProfile::new(ProfileQuality::Q480P, Size::new(640, 480), 30);
        assert!(hd.video_bitrate > sd.video_bitrate);
    }
}
