//! Tests for camrig core types.
//!
//! Ensures type safety and correct behavior of fundamental data structures.

use camrig::{
    CaptureProfile, CaptureRequest, DeviceProperties, OutputSurface, PreviewSurface,
    ProfileQuality, RequestTemplate, Size, Status,
};

#[cfg(test)]
mod size_tests {
    use super::*;

    #[test]
    fn test_size_display() {
        assert_eq!(Size::new(1920, 1080).to_string(), "1920x1080");
    }

    #[test]
    fn test_default_preview_constant() {
        assert_eq!(Size::DEFAULT_PREVIEW, Size::new(640, 480));
    }

    #[test]
    fn test_size_serialization() {
        let size = Size::new(1280, 720);
        let json = serde_json::to_string(&size).unwrap();
        let deserialized: Size = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, size);
    }
}

#[cfg(test)]
mod status_tests {
    use super::*;

    #[test]
    fn test_status_ordering_gates_operations() {
        assert!(Status::Error < Status::Ok);
        assert!(Status::Uninitialized < Status::Ok);
        assert!(Status::Ok >= Status::Ok);
    }

    #[test]
    fn test_status_as_str() {
        assert_eq!(Status::Error.as_str(), "error");
        assert_eq!(Status::Uninitialized.as_str(), "uninitialized");
        assert_eq!(Status::Ok.as_str(), "ok");
    }
}

#[cfg(test)]
mod device_properties_tests {
    use super::*;

    #[test]
    fn test_properties_creation() {
        let properties = DeviceProperties::new("cam0".to_string(), "Test Camera".to_string());
        assert_eq!(properties.id, "cam0");
        assert_eq!(properties.name, "Test Camera");
        assert!(properties.is_available);
        assert!(properties.processed_sizes.is_empty());
    }

    #[test]
    fn test_properties_builder_pattern() {
        let properties = DeviceProperties::new("cam1".to_string(), "Pro Camera".to_string())
            .with_processed_sizes(vec![Size::new(1920, 1080), Size::new(640, 480)])
            .with_jpeg_sizes(vec![Size::new(3264, 2448)])
            .with_availability(false);

        assert_eq!(properties.processed_sizes.len(), 2);
        assert_eq!(properties.jpeg_sizes.len(), 1);
        assert!(!properties.is_available);
    }

    #[test]
    fn test_properties_serialization() {
        let properties = DeviceProperties::new("cam0".to_string(), "Cam".to_string())
            .with_processed_sizes(vec![Size::new(640, 480)]);
        let json = serde_json::to_string(&properties).unwrap();
        let deserialized: DeviceProperties = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, properties);
    }
}

#[cfg(test)]
mod surface_tests {
    use super::*;

    #[test]
    fn test_surfaces_get_unique_ids() {
        let a = PreviewSurface::new();
        let b = PreviewSurface::new();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_output_requires_bound_size() {
        let surface = PreviewSurface::new();
        assert!(surface.output().is_none());
        surface.set_fixed_size(Size::new(640, 480));
        assert_eq!(surface.output().unwrap().size, Size::new(640, 480));
    }

    #[test]
    fn test_rebinding_replaces_size() {
        let surface = PreviewSurface::new();
        surface.set_fixed_size(Size::new(640, 480));
        surface.set_fixed_size(Size::new(1920, 1080));
        assert_eq!(surface.fixed_size(), Some(Size::new(1920, 1080)));
    }

    #[test]
    fn test_standalone_output_surface() {
        let target = OutputSurface::new(Size::new(1280, 720));
        assert_eq!(target.size, Size::new(1280, 720));
        assert!(!target.surface_id.is_empty());
    }
}

#[cfg(test)]
mod capture_request_tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = CaptureRequest::new(RequestTemplate::Preview)
            .add_target(OutputSurface::new(Size::new(640, 480)))
            .add_target(OutputSurface::new(Size::new(1920, 1080)));

        assert_eq!(request.template, RequestTemplate::Preview);
        assert_eq!(request.targets.len(), 2);
    }

    #[test]
    fn test_request_serialization() {
        let request = CaptureRequest::new(RequestTemplate::StillCapture)
            .add_target(OutputSurface::new(Size::new(640, 480)));
        let json = serde_json::to_string(&request).unwrap();
        let deserialized: CaptureRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, request);
    }
}

#[cfg(test)]
mod profile_tests {
    use super::*;

    #[test]
    fn test_all_qualities_listed_once() {
        let mut seen = std::collections::HashSet::new();
        for quality in ProfileQuality::ALL {
            assert!(seen.insert(quality), "duplicate quality {quality}");
        }
        assert_eq!(seen.len(), 16);
    }

    #[test]
    fn test_quality_names_match_convention() {
        assert_eq!(ProfileQuality::Q1080P.as_str(), "1080P");
        assert_eq!(ProfileQuality::TimeLapseQvga.as_str(), "TIME_LAPSE_QVGA");
    }

    #[test]
    fn test_profile_carries_bitrate() {
        let profile = CaptureProfile::new(ProfileQuality::Q720P, Size::new(1280, 720), 30)
            .with_bitrate(4_000_000);
        assert_eq!(profile.video_bitrate, 4_000_000);
    }

    #[test]
    fn test_profile_serialization() {
        let profile = CaptureProfile::new(ProfileQuality::High, Size::new(1920, 1080), 30);
        let json = serde_json::to_string(&profile).unwrap();
        let deserialized: CaptureProfile = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, profile);
    }
}
