//! Property-based tests for controller and harness invariants.
//!
//! These verify that arbitrary operation sequences keep the rig's state
//! machine and the service's view of the device in lockstep.

use camrig::testing::FakeCameraService;
use camrig::{
    CameraOps, CaptureHarness, CaptureProfile, DeviceProperties, OutputSurface, PreviewSurface,
    ProfileQuality, Size,
};
use proptest::prelude::*;
use std::sync::Arc;

fn one_camera_service() -> Arc<FakeCameraService> {
    Arc::new(
        FakeCameraService::new().with_device(
            DeviceProperties::new("0".into(), "Camera 0".into())
                .with_processed_sizes(vec![Size::new(1280, 720), Size::new(640, 480)])
                .with_jpeg_sizes(vec![Size::new(1920, 1080)]),
        ),
    )
}

fn two_camera_service() -> Arc<FakeCameraService> {
    Arc::new(
        FakeCameraService::new()
            .with_device(
                DeviceProperties::new("0".into(), "Camera 0".into())
                    .with_processed_sizes(vec![Size::new(1920, 1080), Size::new(640, 480)])
                    .with_jpeg_sizes(vec![Size::new(1920, 1080), Size::new(640, 480)]),
            )
            .with_profiles(
                "0",
                vec![CaptureProfile::new(
                    ProfileQuality::Q1080P,
                    Size::new(1920, 1080),
                    30,
                )],
            )
            .with_device(
                DeviceProperties::new("1".into(), "Camera 1".into())
                    .with_processed_sizes(vec![Size::new(1280, 720)])
                    .with_jpeg_sizes(vec![Size::new(1280, 720)]),
            )
            .with_profiles(
                "1",
                vec![
                    CaptureProfile::new(ProfileQuality::Q720P, Size::new(1280, 720), 30),
                    CaptureProfile::new(ProfileQuality::Qvga, Size::new(320, 240), 30),
                ],
            ),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// INVARIANT: any open/close/preview/capture sequence leaves the
    /// controller and the service agreeing on whether a device is open,
    /// and a close followed by an open always succeeds.
    #[test]
    fn controller_survives_arbitrary_op_sequences(
        ops_seq in prop::collection::vec(0u8..4, 1..24),
    ) {
        let service = one_camera_service();
        let ops = CameraOps::create(service.clone()).unwrap();
        let surface = Arc::new(PreviewSurface::new());
        let mut open = false;

        for op in ops_seq {
            match op {
                0 => {
                    let result = ops.open_device("0");
                    if open {
                        prop_assert!(result.unwrap_err().is_usage_fault());
                    } else {
                        prop_assert!(result.is_ok());
                        open = true;
                    }
                }
                1 => {
                    prop_assert!(ops.close_device().is_ok());
                    open = false;
                }
                2 => {
                    prop_assert!(ops.minimal_preview(&surface).is_ok());
                    open = true;
                }
                _ => {
                    let result = ops.capture_still(OutputSurface::new(Size::new(640, 480)));
                    if open {
                        prop_assert!(result.is_ok());
                    } else {
                        prop_assert!(result.unwrap_err().is_usage_fault());
                    }
                }
            }
        }

        prop_assert_eq!(service.device_snapshot("0").unwrap().is_open, open);

        // No lingering handle after a close; reopening must work.
        ops.close_device().unwrap();
        ops.open_device("0").unwrap();
    }

    /// INVARIANT: after any sequence of camera switches and selections,
    /// the current camera's selections start at index 0 and its profile
    /// list is exactly the supported subset.
    #[test]
    fn camera_switch_always_resets_selections(
        switches in prop::collection::vec(0u8..2, 1..8),
        preview_pick in 0usize..2,
    ) {
        let service = two_camera_service();
        let mut harness = CaptureHarness::new(service, Arc::new(PreviewSurface::new()));

        for id in switches {
            let id = id.to_string();
            // Disturb the selection, then switch; the switch must reset.
            if !harness.preview_sizes().is_empty() {
                let index = preview_pick.min(harness.preview_sizes().len() - 1);
                harness.select_preview_size(index).unwrap();
            }
            harness.select_camera(&id).unwrap();

            prop_assert_eq!(harness.preview_index(), 0);
            prop_assert_eq!(harness.snapshot_index(), 0);
            prop_assert_eq!(harness.profile_index(), 0);

            let qualities: Vec<ProfileQuality> =
                harness.profiles().iter().map(|p| p.quality).collect();
            let expected = if id == "0" {
                vec![ProfileQuality::Q1080P]
            } else {
                vec![ProfileQuality::Q720P, ProfileQuality::Qvga]
            };
            prop_assert_eq!(qualities, expected);
        }
    }
}
