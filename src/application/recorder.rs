//! Segment recorder
//!
//! Produces finalized segments for one session on a fixed cadence with
//! intentional overlap: a new recorder starts every interval and each one
//! records for the full window, so several recorders are usually live on the
//! same stream at once.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::Utc;
use tokio::sync::{broadcast, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time;

use super::engine::{self, EngineShared};
use super::ports::{AudioChunk, PcmEncoder, CAPTURE_SAMPLE_RATE};
use crate::domain::session::{Segment, SourceId};
use crate::domain::transcription::AudioData;

/// Per-session context shared by every recorder the session spawns.
pub(crate) struct SessionShared {
    pub(crate) engine: Arc<EngineShared>,
    pub(crate) source: SourceId,
    pub(crate) label: String,
    pub(crate) encoder: Arc<dyn PcmEncoder>,
    pub(crate) window: StdDuration,
}

/// Start periodic segment production: one segment immediately, then a new
/// overlapping one every `interval`. The returned task finishes only after a
/// stop signal has arrived and every in-flight recorder has handed off its
/// data, so awaiting it flushes the session.
pub(crate) fn spawn_periodic(
    shared: Arc<SessionShared>,
    fanout: broadcast::Sender<AudioChunk>,
    interval: StdDuration,
    stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut segments = JoinSet::new();
        let mut ticks = time::interval(interval);
        let mut stop_ticks = stop.clone();

        loop {
            tokio::select! {
                _ = ticks.tick() => {
                    let chunks = fanout.subscribe();
                    segments.spawn(run_segment(Arc::clone(&shared), chunks, stop.clone()));
                }
                changed = stop_ticks.changed() => {
                    if changed.is_err() || *stop_ticks.borrow() {
                        break;
                    }
                }
            }
        }

        // Force-stopped recorders still finalize what they captured.
        while segments.join_next().await.is_some() {}
    })
}

/// Record one segment window, finalize it, and submit it for transcription.
async fn run_segment(
    shared: Arc<SessionShared>,
    chunks: broadcast::Receiver<AudioChunk>,
    stop: watch::Receiver<bool>,
) {
    let samples = collect_window(chunks, stop, shared.window).await;
    if samples.is_empty() {
        tracing::debug!(source = %shared.source, "segment captured no audio, discarding");
        return;
    }

    let captured_at = Utc::now();
    let payload = match shared.encoder.encode(&samples, CAPTURE_SAMPLE_RATE) {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::warn!(source = %shared.source, %error, "segment encoding failed");
            return;
        }
    };

    let segment = Segment::new(
        shared.source.clone(),
        shared.label.clone(),
        AudioData::new(payload, shared.encoder.mime_type()),
        captured_at,
    );
    engine::submit(&shared.engine, segment).await;
}

/// Buffer chunks until the window elapses, the session is force-stopped, or
/// the stream closes. Whatever was captured up to that point is returned.
async fn collect_window(
    mut chunks: broadcast::Receiver<AudioChunk>,
    mut stop: watch::Receiver<bool>,
    window: StdDuration,
) -> Vec<i16> {
    let mut samples: Vec<i16> = Vec::new();
    let deadline = time::sleep(window);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            received = chunks.recv() => match received {
                Ok(chunk) => samples.extend_from_slice(&chunk.samples),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "capture chunks dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    samples
}
