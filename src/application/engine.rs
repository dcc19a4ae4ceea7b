//! Recording engine
//!
//! Owns every piece of recording state explicitly: the session registry, the
//! pending queue, and the transcript log. Sessions are addressable by source
//! id, may be added and removed while recording, and at most one session
//! exists per id at any time.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;

use super::ports::{AudioCapture, CaptureError, EncoderNegotiator, SourceStream, Transcriber};
use super::queue::PendingQueue;
use super::recorder::{self, SessionShared};
use super::retry::{transcribe_with_retry, RetryPolicy, TranscribeOutcome};
use crate::domain::recording::SegmentSchedule;
use crate::domain::session::{Segment, SourceId, TranscriptEntry, TranscriptLog};
use crate::domain::transcription::Instruction;

/// A source the engine can be asked to record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSpec {
    /// The default microphone
    Mic,
    /// A capture device by enumeration index
    Device(usize),
}

impl SourceSpec {
    /// The session id this source maps to
    pub fn source_id(&self) -> SourceId {
        match self {
            Self::Mic => SourceId::mic(),
            Self::Device(index) => SourceId::Device(*index as u32),
        }
    }
}

/// Engine lifecycle and result notifications, in arrival order
#[derive(Debug, Clone)]
pub enum EngineEvent {
    SessionStarted { source: SourceId, label: String },
    SessionStopped { source: SourceId },
    SourceFailed { label: String, error: String },
    Transcribed(TranscriptEntry),
    SegmentQueued { source: SourceId, queued: usize },
    TranscriptionFailed { source: SourceId, error: String },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Nothing started (no sources could be captured)")]
    NothingStarted,
}

/// Engine construction parameters
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub schedule: SegmentSchedule,
    pub retry: RetryPolicy,
    pub instruction: Instruction,
}

/// State shared with spawned recorder tasks.
pub(crate) struct EngineShared {
    pub(crate) transcriber: Arc<dyn Transcriber>,
    pub(crate) retry: RetryPolicy,
    pub(crate) instruction: Instruction,
    pub(crate) queue: Mutex<PendingQueue>,
    pub(crate) transcript: Mutex<TranscriptLog>,
    pub(crate) events: mpsc::UnboundedSender<EngineEvent>,
}

/// One live session: a capture stream plus its recorder lifecycle handles.
struct Session {
    label: String,
    stream: SourceStream,
    stop: watch::Sender<bool>,
    ticker: JoinHandle<()>,
}

/// The recording engine: session registry, pending queue, and transcript,
/// wired to the capture and transcription ports.
pub struct RecordingEngine {
    capture: Arc<dyn AudioCapture>,
    encoders: Arc<dyn EncoderNegotiator>,
    schedule: SegmentSchedule,
    shared: Arc<EngineShared>,
    sessions: HashMap<SourceId, Session>,
    finishing: Vec<JoinHandle<()>>,
    recording: bool,
}

impl RecordingEngine {
    pub fn new(
        capture: Arc<dyn AudioCapture>,
        transcriber: Arc<dyn Transcriber>,
        encoders: Arc<dyn EncoderNegotiator>,
        config: EngineConfig,
    ) -> (Self, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let shared = Arc::new(EngineShared {
            transcriber,
            retry: config.retry,
            instruction: config.instruction,
            queue: Mutex::new(PendingQueue::new()),
            transcript: Mutex::new(TranscriptLog::new()),
            events,
        });
        let engine = Self {
            capture,
            encoders,
            schedule: config.schedule,
            shared,
            sessions: HashMap::new(),
            finishing: Vec::new(),
            recording: false,
        };
        (engine, events_rx)
    }

    /// Start recording the given sources after a clean reset.
    ///
    /// A source that fails to capture is reported and skipped without
    /// disturbing the others; at least one must start.
    pub async fn start(&mut self, specs: &[SourceSpec]) -> Result<usize, EngineError> {
        self.stop_all();

        let mut started = 0;
        for spec in specs {
            match self.start_source(spec).await {
                Ok(()) => started += 1,
                Err(error) => {
                    let label = match spec {
                        SourceSpec::Mic => "Microphone".to_string(),
                        SourceSpec::Device(index) => self.device_label(*index),
                    };
                    tracing::warn!(%label, %error, "source failed to start");
                    let _ = self.shared.events.send(EngineEvent::SourceFailed {
                        label,
                        error: error.to_string(),
                    });
                }
            }
        }

        if started == 0 {
            return Err(EngineError::NothingStarted);
        }
        self.recording = true;
        Ok(started)
    }

    /// Add a source mid-recording. Ignored when no recording is active;
    /// no-op when the source is already live. Returns whether a session
    /// was created.
    pub async fn add_source(&mut self, spec: &SourceSpec) -> Result<bool, CaptureError> {
        if !self.recording {
            tracing::debug!("add request ignored, no active recording");
            return Ok(false);
        }
        if self.sessions.contains_key(&spec.source_id()) {
            return Ok(false);
        }
        self.start_source(spec).await?;
        Ok(true)
    }

    /// Remove a source mid-recording. Ignored when no recording is active;
    /// no-op for absent sources. Returns whether a session was stopped.
    pub fn remove_source(&mut self, source: &SourceId) -> bool {
        if !self.recording {
            tracing::debug!("remove request ignored, no active recording");
            return false;
        }
        if !self.sessions.contains_key(source) {
            return false;
        }
        self.stop(source);
        true
    }

    /// Stop one session: cancel its timer, force-stop every active recorder,
    /// and release the capture stream. Safe to call on unknown ids.
    ///
    /// In-flight segment windows finalize with the data captured so far and
    /// are still submitted; their transcription calls are never cancelled.
    pub fn stop(&mut self, source: &SourceId) {
        let Some(session) = self.sessions.remove(source) else {
            return;
        };
        let Session {
            label: _,
            stream,
            stop,
            ticker,
        } = session;

        let _ = stop.send(true);
        drop(stream);
        self.finishing.push(ticker);

        tracing::info!(%source, "session stopped");
        let _ = self.shared.events.send(EngineEvent::SessionStopped {
            source: source.clone(),
        });
    }

    /// Stop every session and clear the recording flag, so add/remove
    /// requests are ignored until a new recording starts.
    pub fn stop_all(&mut self) {
        self.recording = false;
        let ids: Vec<SourceId> = self.sessions.keys().cloned().collect();
        for id in ids {
            self.stop(&id);
        }
    }

    /// Replay the pending queue: one pass over a snapshot of the current
    /// contents. Successes land in the transcript, transient failures
    /// re-queue at the tail, fatal failures are surfaced and dropped.
    pub async fn drain_pending(&self) {
        let batch = self.shared.queue.lock().await.take_all();
        if batch.is_empty() {
            return;
        }
        tracing::info!(count = batch.len(), "replaying queued segments");
        for segment in batch {
            submit(&self.shared, segment).await;
        }
    }

    /// Wait for stopped sessions' in-flight segments to finish submitting.
    pub async fn join_in_flight(&mut self) {
        for handle in self.finishing.drain(..) {
            let _ = handle.await;
        }
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn has_session(&self, source: &SourceId) -> bool {
        self.sessions.contains_key(source)
    }

    /// Currently live sessions as (id, label) pairs
    pub fn active_sources(&self) -> Vec<(SourceId, String)> {
        self.sessions
            .iter()
            .map(|(id, session)| (id.clone(), session.label.clone()))
            .collect()
    }

    pub async fn pending_len(&self) -> usize {
        self.shared.queue.lock().await.len()
    }

    /// Snapshot of the assembled transcript, in arrival order
    pub async fn transcript(&self) -> Vec<TranscriptEntry> {
        self.shared.transcript.lock().await.entries().to_vec()
    }

    /// Human-readable rendering of the assembled transcript
    pub async fn transcript_text(&self) -> String {
        self.shared.transcript.lock().await.to_plain_text()
    }

    async fn start_source(&mut self, spec: &SourceSpec) -> Result<(), CaptureError> {
        let id = spec.source_id();
        if self.sessions.contains_key(&id) {
            return Ok(());
        }

        let (label, stream) = match spec {
            SourceSpec::Mic => {
                let stream = self.capture.acquire_mic(self.schedule.chunk()).await?;
                ("Microphone".to_string(), stream)
            }
            SourceSpec::Device(index) => {
                let label = self.device_label(*index);
                let stream = self
                    .capture
                    .acquire_device(*index, self.schedule.chunk())
                    .await?;
                (label, stream)
            }
        };

        let encoder = self.encoders.negotiate();
        let (stop, stop_rx) = watch::channel(false);
        let session_shared = Arc::new(SessionShared {
            engine: Arc::clone(&self.shared),
            source: id.clone(),
            label: label.clone(),
            encoder,
            window: self.schedule.window().as_std(),
        });
        let ticker = recorder::spawn_periodic(
            session_shared,
            stream.fanout(),
            self.schedule.interval().as_std(),
            stop_rx,
        );

        self.sessions.insert(
            id.clone(),
            Session {
                label: label.clone(),
                stream,
                stop,
                ticker,
            },
        );

        tracing::info!(source = %id, %label, "session started");
        let _ = self
            .shared
            .events
            .send(EngineEvent::SessionStarted { source: id, label });
        Ok(())
    }

    fn device_label(&self, index: usize) -> String {
        self.capture
            .list_devices()
            .ok()
            .and_then(|devices| devices.into_iter().find(|d| d.index == index))
            .map(|d| format!("Device: {}", d.name))
            .unwrap_or_else(|| format!("Device {}", index))
    }
}

/// Route one finalized segment through the transcription client and apply
/// its terminal outcome. Used by both the live path and queue replays.
pub(crate) async fn submit(shared: &EngineShared, segment: Segment) {
    let outcome = transcribe_with_retry(
        shared.transcriber.as_ref(),
        segment.audio(),
        &shared.instruction,
        &shared.retry,
    )
    .await;

    match outcome {
        TranscribeOutcome::Success(text) => {
            let entry = TranscriptEntry {
                timestamp: segment.captured_at(),
                text,
                source: segment.source().clone(),
                label: segment.label().to_string(),
            };
            shared.transcript.lock().await.push(entry.clone());
            let _ = shared.events.send(EngineEvent::Transcribed(entry));
        }
        TranscribeOutcome::Transient(error) => {
            tracing::warn!(source = %segment.source(), %error, "segment deferred to pending queue");
            let source = segment.source().clone();
            let queued = {
                let mut queue = shared.queue.lock().await;
                queue.push(segment);
                queue.len()
            };
            let _ = shared
                .events
                .send(EngineEvent::SegmentQueued { source, queued });
        }
        TranscribeOutcome::Fatal(error) => {
            tracing::error!(source = %segment.source(), %error, "segment transcription failed");
            let _ = shared.events.send(EngineEvent::TranscriptionFailed {
                source: segment.source().clone(),
                error: error.to_string(),
            });
        }
    }
}
