//! Offline test doubles.
//!
//! A scripted in-memory camera service plus synthetic frame data, so the
//! rig can be exercised end to end without camera hardware.

pub mod fake_service;
pub mod synthetic_data;

pub use fake_service::{DeviceSnapshot, FakeCameraService, ServiceCall};
pub use synthetic_data::{synthetic_encoded_image, synthetic_still_frame};
