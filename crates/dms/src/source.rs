//! Landmark sources and frame gating
//!
//! A detector produces frames faster than, or independently of, the monitor.
//! At most one frame is in flight: while a frame holds the [`FramePermit`],
//! new frames are dropped rather than queued, so the monitor always works on
//! recent data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tracing::debug;

use crate::analysis::DmsAnalysis;
use crate::landmarks::LandmarkFrame;
use crate::session::{MonitorSession, SessionSink};

/// One detector output: landmarks for the first face, or none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorResult {
    pub timestamp_ms: u64,
    pub landmarks: Option<LandmarkFrame>,
}

impl DetectorResult {
    pub fn face(timestamp_ms: u64, landmarks: LandmarkFrame) -> Self {
        Self {
            timestamp_ms,
            landmarks: Some(landmarks),
        }
    }

    pub fn no_face(timestamp_ms: u64) -> Self {
        Self {
            timestamp_ms,
            landmarks: None,
        }
    }
}

/// Pull-based face-landmark detector
pub trait LandmarkSource {
    /// Next result, or `None` once the source is exhausted
    fn next_result(&mut self) -> Option<DetectorResult>;
}

impl<I> LandmarkSource for I
where
    I: Iterator<Item = DetectorResult>,
{
    fn next_result(&mut self) -> Option<DetectorResult> {
        self.next()
    }
}

/// Single-slot admission gate
#[derive(Debug, Clone)]
pub struct FrameGate {
    slot: Arc<Semaphore>,
}

impl FrameGate {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Semaphore::new(1)),
        }
    }

    /// Claim the slot, or `None` if a frame is still in flight
    pub fn try_acquire(&self) -> Option<FramePermit> {
        self.slot
            .clone()
            .try_acquire_owned()
            .ok()
            .map(|permit| FramePermit { _permit: permit })
    }

    /// Wait for the slot. `None` only if the gate was closed.
    pub async fn acquire(&self) -> Option<FramePermit> {
        self.slot
            .clone()
            .acquire_owned()
            .await
            .ok()
            .map(|permit| FramePermit { _permit: permit })
    }

    pub fn is_busy(&self) -> bool {
        self.slot.available_permits() == 0
    }
}

impl Default for FrameGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Held while a frame is being processed; releases the gate on drop
#[derive(Debug)]
pub struct FramePermit {
    _permit: OwnedSemaphorePermit,
}

/// Frame travelling from feeder to consumer together with its permit
#[derive(Debug)]
pub struct GatedFrame {
    pub result: DetectorResult,
    permit: FramePermit,
}

impl GatedFrame {
    /// Split off the result and the permit that keeps the gate closed
    pub fn into_parts(self) -> (DetectorResult, FramePermit) {
        (self.result, self.permit)
    }
}

/// Producer side of the frame loop
#[derive(Debug, Clone)]
pub struct FrameFeeder {
    tx: mpsc::Sender<GatedFrame>,
    gate: FrameGate,
    dropped: Arc<AtomicU64>,
}

impl FrameFeeder {
    pub fn channel() -> (Self, mpsc::Receiver<GatedFrame>) {
        let (tx, rx) = mpsc::channel(1);
        let feeder = Self {
            tx,
            gate: FrameGate::new(),
            dropped: Arc::new(AtomicU64::new(0)),
        };
        (feeder, rx)
    }

    /// Hand a frame to the consumer if the gate is free. Returns whether it was accepted.
    pub fn offer(&self, result: DetectorResult) -> bool {
        let Some(permit) = self.gate.try_acquire() else {
            self.record_drop(result.timestamp_ms);
            return false;
        };

        match self.tx.try_send(GatedFrame { result, permit }) {
            Ok(()) => true,
            Err(e) => {
                let frame = e.into_inner();
                self.record_drop(frame.result.timestamp_ms);
                false
            }
        }
    }

    /// Wait for the gate instead of dropping; for offline replays that must not lose frames.
    ///
    /// Returns `false` once the consumer is gone.
    pub async fn send(&self, result: DetectorResult) -> bool {
        let Some(permit) = self.gate.acquire().await else {
            return false;
        };
        self.tx.send(GatedFrame { result, permit }).await.is_ok()
    }

    fn record_drop(&self, timestamp_ms: u64) {
        debug!("Monitor busy, dropping frame at {}ms", timestamp_ms);
        self.dropped.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("dms_frames_dropped_total").increment(1);
    }

    /// Frames dropped since creation
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn gate(&self) -> &FrameGate {
        &self.gate
    }
}

/// Feed gated frames into `session` until every feeder is dropped, passing
/// each analysis to `on_analysis` before the gate reopens.
///
/// Returns the number of frames processed.
pub async fn run_frame_loop<S, F>(
    mut rx: mpsc::Receiver<GatedFrame>,
    session: &mut MonitorSession<S>,
    mut on_analysis: F,
) -> usize
where
    S: SessionSink,
    F: FnMut(&DmsAnalysis),
{
    let mut processed = 0;
    while let Some(frame) = rx.recv().await {
        let (result, permit) = frame.into_parts();
        if let Some(analysis) = session.on_frame(result.landmarks.as_ref(), result.timestamp_ms) {
            on_analysis(&analysis);
        }
        drop(permit);
        processed += 1;
    }
    debug!("Frame loop finished after {} frames", processed);
    processed
}
