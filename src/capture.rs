//! Still-capture progress reporting.
//!
//! A still capture moves through four ordered phases: shutter fired, raw
//! buffer ready, postview buffer ready, encoded image ready. The device
//! pushes them onto one channel; callers hold the [`PendingCapture`] end
//! and either step through events or wait for the final
//! [`CaptureOutcome`].

use crate::errors::CameraError;
use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Default bound for the event channel; a capture emits four events.
pub const DEFAULT_EVENT_CAPACITY: usize = 8;

/// The final encoded picture of a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub id: String,
    pub captured_at: DateTime<Utc>,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl EncodedImage {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            captured_at: Utc::now(),
            width,
            height,
            data,
        }
    }
}

/// One phase of an in-flight still capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    Shutter,
    /// Raw sensor buffer, when the device produces one.
    Raw(Option<Vec<u8>>),
    /// Reduced-size review buffer, when the device produces one.
    Postview(Option<Vec<u8>>),
    Encoded(EncodedImage),
    Failed(String),
}

impl CaptureEvent {
    fn rank(&self) -> u8 {
        match self {
            CaptureEvent::Shutter => 0,
            CaptureEvent::Raw(_) => 1,
            CaptureEvent::Postview(_) => 2,
            CaptureEvent::Encoded(_) => 3,
            CaptureEvent::Failed(_) => 4,
        }
    }
}

/// Device-facing half of a capture event stream.
#[derive(Debug, Clone)]
pub struct CaptureEventSender {
    tx: Sender<CaptureEvent>,
}

impl CaptureEventSender {
    /// Sends are best-effort: a caller that dropped its `PendingCapture`
    /// no longer cares about progress.
    pub fn send(&self, event: CaptureEvent) {
        let _ = self.tx.send(event);
    }

    pub fn shutter(&self) {
        self.send(CaptureEvent::Shutter);
    }

    pub fn raw(&self, buffer: Option<Vec<u8>>) {
        self.send(CaptureEvent::Raw(buffer));
    }

    pub fn postview(&self, buffer: Option<Vec<u8>>) {
        self.send(CaptureEvent::Postview(buffer));
    }

    pub fn encoded(&self, image: EncodedImage) {
        self.send(CaptureEvent::Encoded(image));
    }

    pub fn failed(&self, message: impl Into<String>) {
        self.send(CaptureEvent::Failed(message.into()));
    }
}

/// Caller-facing half of a capture event stream.
#[derive(Debug)]
pub struct PendingCapture {
    id: String,
    events: Receiver<CaptureEvent>,
}

/// Everything a completed capture produced.
#[derive(Debug, Clone)]
pub struct CaptureOutcome {
    pub image: EncodedImage,
    pub raw: Option<Vec<u8>>,
    pub postview: Option<Vec<u8>>,
    pub shutter_fired: bool,
}

pub fn capture_channel(capacity: usize) -> (CaptureEventSender, PendingCapture) {
    let (tx, rx) = bounded(capacity.max(1));
    (
        CaptureEventSender { tx },
        PendingCapture {
            id: Uuid::new_v4().to_string(),
            events: rx,
        },
    )
}

impl PendingCapture {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The next phase event, or an access failure on timeout or when the
    /// device dropped the stream mid-capture.
    pub fn next_event(&self, timeout: Duration) -> Result<CaptureEvent, CameraError> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Ok(event),
            Err(RecvTimeoutError::Timeout) => Err(CameraError::access_plain(format!(
                "capture {}: timed out waiting for next event",
                self.id
            ))),
            Err(RecvTimeoutError::Disconnected) => Err(CameraError::access_plain(format!(
                "capture {}: event stream ended before completion",
                self.id
            ))),
        }
    }

    /// Drains the event stream until the encoded image arrives, enforcing
    /// phase order, and returns the assembled outcome.
    pub fn wait(self, timeout: Duration) -> Result<CaptureOutcome, CameraError> {
        let deadline = Instant::now() + timeout;
        let mut last_rank: Option<u8> = None;
        let mut shutter_fired = false;
        let mut raw = None;
        let mut postview = None;

        loop {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .unwrap_or(Duration::ZERO);
            let event = self.next_event(remaining)?;

            if let CaptureEvent::Failed(message) = event {
                return Err(CameraError::access_plain(format!(
                    "capture {}: {}",
                    self.id, message
                )));
            }

            let rank = event.rank();
            if last_rank.is_some_and(|prev| rank <= prev) {
                return Err(CameraError::access_plain(format!(
                    "capture {}: events out of order",
                    self.id
                )));
            }
            last_rank = Some(rank);

            match event {
                CaptureEvent::Shutter => shutter_fired = true,
                CaptureEvent::Raw(buffer) => raw = buffer,
                CaptureEvent::Postview(buffer) => postview = buffer,
                CaptureEvent::Encoded(image) => {
                    if !shutter_fired {
                        return Err(CameraError::access_plain(format!(
                            "capture {}: encoded image arrived before shutter",
                            self.id
                        )));
                    }
                    return Ok(CaptureOutcome {
                        image,
                        raw,
                        postview,
                        shutter_fired,
                    });
                }
                CaptureEvent::Failed(_) => unreachable!("handled above"),
            }
        }
    }
}
