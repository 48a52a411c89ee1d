//! camrig: cross-platform camera hardware test rig
//!
//! This crate exercises a camera stack end to end: enumerate devices,
//! open and close them, run a live preview, and take still pictures,
//! with every device call confined to one dedicated worker thread.
//!
//! # Features
//! - Thread-confined camera controller with a synchronous-style API
//! - Explicit, guarded state machine for the select/preview/capture cycle
//! - Ordered still-capture event stream (shutter, raw, postview, encoded)
//! - Device availability monitoring
//! - Scripted in-memory service for hardware-free testing
//!
//! # Usage
//! ```rust,no_run
//! use camrig::{CameraOps, NativeCameraService, PreviewSurface};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     camrig::init_logging();
//!
//!     let service = Arc::new(NativeCameraService::connect()?);
//!     let ops = CameraOps::create(service)?;
//!
//!     println!("cameras: {:?}", ops.devices()?);
//!
//!     let surface = Arc::new(PreviewSurface::new());
//!     ops.minimal_preview(&surface)?;
//!     Ok(())
//! }
//! ```
pub mod capture;
pub mod config;
pub mod errors;
pub mod harness;
pub mod monitor;
pub mod ops;
pub mod service;
pub mod types;

// Testing utilities - scripted service and synthetic data for offline testing
pub mod testing;

// Re-exports for convenience
pub use capture::{CaptureEvent, CaptureOutcome, EncodedImage, PendingCapture};
pub use config::RigConfig;
pub use errors::CameraError;
pub use harness::{CaptureHarness, HarnessState};
pub use monitor::{AvailabilityMonitor, DeviceEvent};
pub use ops::CameraOps;
pub use service::{native::NativeCameraService, CameraDevice, CameraService, ServiceError};
pub use types::{
    CaptureProfile, CaptureRequest, DeviceProperties, OutputSurface, PreviewSurface,
    ProfileQuality, RequestTemplate, Size, Status,
};

/// Initialize logging for the rig
pub fn init_logging() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "camrig=info");
    }
    let _ = env_logger::try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Get crate information
pub fn get_info() -> CrateInfo {
    CrateInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
    }
}

/// Crate information structure
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CrateInfo {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    #[test]
    fn test_crate_info() {
        let info = get_info();
        assert_eq!(info.name, "camrig");
        assert!(!info.version.is_empty());
        assert!(!info.description.is_empty());
    }

    #[test]
    fn test_crate_info_serializes() {
        let json = serde_json::to_string(&get_info()).unwrap();
        assert!(json.contains("camrig"));
    }
}
