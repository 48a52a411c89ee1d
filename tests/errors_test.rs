#[cfg(test)]
mod error_tests {
    use camrig::{CameraError, ServiceError};
    use std::error::Error;

    #[test]
    fn test_usage_fault_display() {
        let error = CameraError::usage("already have open camera device");
        assert!(error.to_string().contains("usage fault"));
        assert!(error.to_string().contains("already have open camera device"));
    }

    #[test]
    fn test_access_error_display() {
        let error = CameraError::access(
            "can't query device set",
            ServiceError::Disconnected("0".to_string()),
        );
        assert!(error.to_string().contains("camera access failure"));
        assert!(error.to_string().contains("can't query device set"));
    }

    #[test]
    fn test_access_error_source_chain() {
        let error = CameraError::access(
            "can't open camera 0",
            ServiceError::PermissionDenied("0".to_string()),
        );
        let source = error.source().expect("wrapped cause");
        assert!(source.to_string().contains("permission denied"));
    }

    #[test]
    fn test_plain_access_error_has_no_source() {
        let error = CameraError::access_plain("no devices");
        assert!(error.source().is_none());
        assert!(error.to_string().contains("no devices"));
    }

    #[test]
    fn test_initialization_error_display() {
        let error = CameraError::InitializationError("can't connect to camera service".into());
        assert!(error.to_string().contains("initialization error"));
    }

    #[test]
    fn test_config_error_display() {
        let error = CameraError::ConfigError("bad fallback resolution".into());
        assert!(error.to_string().contains("configuration error"));
    }

    #[test]
    fn test_is_usage_fault_classification() {
        assert!(CameraError::usage("x").is_usage_fault());
        assert!(!CameraError::access_plain("x").is_usage_fault());
        assert!(!CameraError::InitializationError("x".into()).is_usage_fault());
    }

    #[test]
    fn test_service_error_variants_display() {
        let cases = vec![
            (ServiceError::Busy("0".into()), "device busy"),
            (ServiceError::PermissionDenied("0".into()), "permission denied"),
            (ServiceError::Disconnected("0".into()), "device disconnected"),
            (ServiceError::NotFound("9".into()), "no such device"),
            (ServiceError::Unsupported("raw".into()), "unsupported operation"),
            (ServiceError::Backend("boom".into()), "backend error"),
        ];

        for (error, expected_prefix) in cases {
            let display = error.to_string();
            assert!(
                display.contains(expected_prefix),
                "Error '{}' should contain prefix '{}'",
                display,
                expected_prefix
            );
        }
    }

    #[test]
    fn test_errors_are_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<CameraError>();
        assert_sync::<CameraError>();
        assert_send::<ServiceError>();
        assert_sync::<ServiceError>();
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn open() -> Result<(), CameraError> {
            Err(CameraError::access(
                "can't open camera 0",
                ServiceError::Busy("0".into()),
            ))
        }

        fn preview() -> Result<(), CameraError> {
            open()?;
            Ok(())
        }

        match preview() {
            Err(CameraError::AccessError { message, source }) => {
                assert_eq!(message, "can't open camera 0");
                assert_eq!(source, Some(ServiceError::Busy("0".into())));
            }
            other => panic!("expected access error, got {other:?}"),
        }
    }

    #[test]
    fn test_errors_box_as_trait_objects() {
        let _boxed: Box<dyn Error> = Box::new(CameraError::usage("boxed"));
        let _boxed: Box<dyn Error> = Box::new(ServiceError::Backend("boxed".into()));
    }
}
