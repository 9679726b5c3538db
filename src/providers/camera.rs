//! Camera access and the simulated camera used by the kiosk binary and tests.

use crate::error::{Result, SafraError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;

/// Which way the requested camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacingMode {
    /// Rear camera, pointed at the charger
    Environment,
    User,
}

/// Capability request passed to the camera provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraRequest {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

/// Raw image data of one video frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl Frame {
    /// A one-row frame whose bytes are `text`, understood by
    /// [`TextFrameDecoder`](super::TextFrameDecoder)
    pub fn from_text(text: &str) -> Self {
        let pixels = text.as_bytes().to_vec();
        Self {
            width: u32::try_from(pixels.len()).unwrap_or(u32::MAX),
            height: 1,
            pixels,
        }
    }
}

/// A live video stream
#[async_trait]
pub trait CameraStream: Send {
    /// Next available frame, or `None` once the source has ended
    async fn next_frame(&mut self) -> Option<Frame>;

    /// Stop every track of the stream; must be idempotent
    fn stop(&mut self);
}

/// Source of camera streams
#[async_trait]
pub trait CameraProvider: Send + Sync {
    async fn acquire(&self, request: &CameraRequest) -> Result<Box<dyn CameraStream>>;
}

/// Owns an acquired stream and stops it when dropped, so every exit path
/// (success, screen change, task abort) releases the camera
pub struct CameraLease {
    stream: Box<dyn CameraStream>,
}

impl CameraLease {
    pub fn new(stream: Box<dyn CameraStream>) -> Self {
        Self { stream }
    }

    pub async fn next_frame(&mut self) -> Option<Frame> {
        self.stream.next_frame().await
    }
}

impl Drop for CameraLease {
    fn drop(&mut self) {
        self.stream.stop();
    }
}

/// Acquire/release counters of the simulated camera
#[derive(Debug, Default)]
pub struct CameraStats {
    acquired: AtomicUsize,
    released: AtomicUsize,
}

impl CameraStats {
    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Streams acquired and not yet stopped
    pub fn active(&self) -> usize {
        self.acquired().saturating_sub(self.released())
    }
}

/// Pushes frames into whatever simulated stream is currently open
#[derive(Clone)]
pub struct FrameFeed {
    tx: broadcast::Sender<Frame>,
}

impl FrameFeed {
    /// Deliver a frame; returns false when no stream is open to see it
    pub fn show(&self, frame: Frame) -> bool {
        self.tx.send(frame).is_ok()
    }

    /// Deliver a frame that decodes to `payload`
    pub fn show_text(&self, payload: &str) -> bool {
        self.show(Frame::from_text(payload))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CameraMode {
    Available,
    Denied,
    Missing,
}

/// Camera whose frames come from a [`FrameFeed`]
pub struct SimulatedCamera {
    tx: broadcast::Sender<Frame>,
    mode: CameraMode,
    stats: Arc<CameraStats>,
}

impl SimulatedCamera {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(16);
        Self {
            tx,
            mode: CameraMode::Available,
            stats: Arc::new(CameraStats::default()),
        }
    }

    /// Every acquisition fails as if the user refused the permission prompt
    #[must_use]
    pub const fn denied(mut self) -> Self {
        self.mode = CameraMode::Denied;
        self
    }

    /// Every acquisition fails as if there were no camera
    #[must_use]
    pub const fn missing(mut self) -> Self {
        self.mode = CameraMode::Missing;
        self
    }

    pub fn feed(&self) -> FrameFeed {
        FrameFeed {
            tx: self.tx.clone(),
        }
    }

    pub fn stats(&self) -> Arc<CameraStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for SimulatedCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraProvider for SimulatedCamera {
    async fn acquire(&self, request: &CameraRequest) -> Result<Box<dyn CameraStream>> {
        match self.mode {
            CameraMode::Denied => Err(SafraError::permission_denied(
                "camera",
                "camera permission was refused",
            )),
            CameraMode::Missing => Err(SafraError::device_unavailable(
                "camera",
                "no camera matches the request",
            )),
            CameraMode::Available => {
                tracing::debug!(
                    "Opening simulated {:?} camera at {}x{}",
                    request.facing,
                    request.ideal_width,
                    request.ideal_height
                );
                self.stats.acquired.fetch_add(1, Ordering::SeqCst);
                Ok(Box::new(SimulatedStream {
                    rx: self.tx.subscribe(),
                    stats: Arc::clone(&self.stats),
                    live: true,
                }))
            }
        }
    }
}

struct SimulatedStream {
    rx: broadcast::Receiver<Frame>,
    stats: Arc<CameraStats>,
    live: bool,
}

#[async_trait]
impl CameraStream for SimulatedStream {
    async fn next_frame(&mut self) -> Option<Frame> {
        while self.live {
            match self.rx.recv().await {
                Ok(frame) => return Some(frame),
                // Frames we fell behind on are simply missed, like a real camera
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
        None
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.stats.released.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl Drop for SimulatedStream {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CameraRequest {
        CameraRequest {
            facing: FacingMode::Environment,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }

    #[tokio::test]
    async fn lease_releases_on_drop() {
        let camera = SimulatedCamera::new();
        let stats = camera.stats();
        let feed = camera.feed();

        let mut lease = CameraLease::new(camera.acquire(&request()).await.unwrap());
        assert_eq!(stats.active(), 1);
        assert!(feed.show_text("hello"));
        assert_eq!(lease.next_frame().await, Some(Frame::from_text("hello")));

        drop(lease);
        assert_eq!(stats.active(), 0);
        assert_eq!(stats.released(), 1);
    }

    #[tokio::test]
    async fn denied_and_missing_cameras_fail() {
        let err = SimulatedCamera::new()
            .denied()
            .acquire(&request())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SafraError::PermissionDenied { .. }));

        let err = SimulatedCamera::new()
            .missing()
            .acquire(&request())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, SafraError::DeviceUnavailable { .. }));
    }
}
