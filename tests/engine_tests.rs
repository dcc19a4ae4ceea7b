//! Recording engine integration tests
//!
//! These run on a paused tokio clock, so the segment timers are exercised
//! deterministically without real waiting.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::time::{sleep, Duration as TokioDuration};

use multi_scribe::application::ports::{
    AudioCapture, AudioChunk, CaptureError, DeviceInfo, EncodeError, EncoderNegotiator,
    PcmEncoder, SourceStream, StreamGuard, Transcriber, TranscriptionError,
};
use multi_scribe::application::{
    EngineConfig, EngineEvent, RecordingEngine, SourceSpec,
};
use multi_scribe::domain::recording::Duration;
use multi_scribe::domain::session::SourceId;
use multi_scribe::domain::transcription::{AudioData, AudioMimeType, Instruction};

/// Capture mock: each acquired source gets its own fan-out. When `feed` is
/// set, a task pushes one second of silence every virtual second.
struct MockCapture {
    feed: bool,
    fanouts: Mutex<Vec<broadcast::Sender<AudioChunk>>>,
}

impl MockCapture {
    fn new(feed: bool) -> Self {
        Self {
            feed,
            fanouts: Mutex::new(Vec::new()),
        }
    }

    /// Active recorder subscriptions on the nth acquired stream
    fn receiver_count(&self, stream: usize) -> usize {
        self.fanouts.lock().unwrap()[stream].receiver_count()
    }

    fn open(&self) -> SourceStream {
        let (fanout, _) = broadcast::channel(256);
        self.fanouts.lock().unwrap().push(fanout.clone());

        let released = Arc::new(AtomicBool::new(false));
        if self.feed {
            let feeder = fanout.clone();
            let stop = Arc::clone(&released);
            tokio::spawn(async move {
                while !stop.load(Ordering::SeqCst) {
                    sleep(TokioDuration::from_secs(1)).await;
                    let _ = feeder.send(AudioChunk::from_samples(vec![0i16; 16_000]));
                }
            });
        }

        SourceStream::new(
            fanout,
            StreamGuard::new(move || released.store(true, Ordering::SeqCst)),
        )
    }
}

#[async_trait]
impl AudioCapture for MockCapture {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, CaptureError> {
        Ok(vec![
            DeviceInfo {
                index: 0,
                name: "Monitor".to_string(),
            },
            DeviceInfo {
                index: 1,
                name: "Loopback".to_string(),
            },
        ])
    }

    async fn acquire_mic(&self, _chunk: Duration) -> Result<SourceStream, CaptureError> {
        Ok(self.open())
    }

    async fn acquire_device(
        &self,
        index: usize,
        _chunk: Duration,
    ) -> Result<SourceStream, CaptureError> {
        if index > 1 {
            return Err(CaptureError::UnknownDevice(index));
        }
        Ok(self.open())
    }
}

struct CountingTranscriber {
    calls: AtomicU32,
}

impl CountingTranscriber {
    fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcriber for CountingTranscriber {
    async fn transcribe(
        &self,
        _audio: &AudioData,
        _instruction: &Instruction,
    ) -> Result<String, TranscriptionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok("ok".to_string())
    }
}

struct RawEncoder;

impl PcmEncoder for RawEncoder {
    fn mime_type(&self) -> AudioMimeType {
        AudioMimeType::Wav
    }

    fn encode(&self, samples: &[i16], _sample_rate: u32) -> Result<Vec<u8>, EncodeError> {
        Ok(samples.iter().flat_map(|s| s.to_le_bytes()).collect())
    }
}

struct RawNegotiator;

impl EncoderNegotiator for RawNegotiator {
    fn negotiate(&self) -> Arc<dyn PcmEncoder> {
        Arc::new(RawEncoder)
    }
}

#[allow(clippy::type_complexity)]
fn engine_with(
    feed: bool,
) -> (
    RecordingEngine,
    tokio::sync::mpsc::UnboundedReceiver<EngineEvent>,
    Arc<MockCapture>,
    Arc<CountingTranscriber>,
) {
    let capture = Arc::new(MockCapture::new(feed));
    let transcriber = Arc::new(CountingTranscriber::new());
    let (engine, events) = RecordingEngine::new(
        capture.clone(),
        transcriber.clone(),
        Arc::new(RawNegotiator),
        EngineConfig::default(),
    );
    (engine, events, capture, transcriber)
}

#[tokio::test(start_paused = true)]
async fn default_schedule_starts_three_segments_in_the_first_minute() {
    let (mut engine, _events, capture, transcriber) = engine_with(true);

    engine.start(&[SourceSpec::Mic]).await.unwrap();

    // Just before the second tick only the t=0 recorder is live
    sleep(TokioDuration::from_millis(29_999)).await;
    assert_eq!(capture.receiver_count(0), 1);
    assert_eq!(transcriber.calls(), 0);

    // At t=60001ms segments have started at t=0, 30s, and 60s; the first
    // finalized at t=33s and is the only one transcribed so far.
    sleep(TokioDuration::from_millis(30_002)).await;
    assert_eq!(capture.receiver_count(0), 2);
    assert_eq!(transcriber.calls(), 1);
    assert_eq!(engine.transcript().await.len(), 1);

    engine.stop_all();
}

#[tokio::test(start_paused = true)]
async fn stop_twice_is_a_noop() {
    let (mut engine, mut events, _capture, _transcriber) = engine_with(true);

    engine.start(&[SourceSpec::Mic]).await.unwrap();
    assert_eq!(engine.session_count(), 1);
    assert!(engine.has_session(&SourceId::mic()));

    engine.stop(&SourceId::mic());
    assert_eq!(engine.session_count(), 0);

    engine.stop(&SourceId::mic());
    engine.stop_all();
    assert_eq!(engine.session_count(), 0);

    let mut stopped = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, EngineEvent::SessionStopped { .. }) {
            stopped += 1;
        }
    }
    assert_eq!(stopped, 1);
}

#[tokio::test(start_paused = true)]
async fn segments_with_no_captured_audio_are_discarded_silently() {
    let (mut engine, mut events, _capture, transcriber) = engine_with(false);

    engine.start(&[SourceSpec::Mic]).await.unwrap();
    sleep(TokioDuration::from_secs(70)).await;
    engine.stop_all();
    engine.join_in_flight().await;

    assert_eq!(transcriber.calls(), 0);
    assert!(engine.transcript().await.is_empty());
    assert_eq!(engine.pending_len().await, 0);

    while let Ok(event) = events.try_recv() {
        assert!(!matches!(
            event,
            EngineEvent::Transcribed(_)
                | EngineEvent::SegmentQueued { .. }
                | EngineEvent::TranscriptionFailed { .. }
        ));
    }
}

#[tokio::test(start_paused = true)]
async fn sources_can_be_added_and_removed_mid_recording() {
    let (mut engine, _events, _capture, _transcriber) = engine_with(true);

    engine.start(&[SourceSpec::Mic]).await.unwrap();
    assert!(engine.is_recording());

    assert!(engine.add_source(&SourceSpec::Device(0)).await.unwrap());
    assert_eq!(engine.session_count(), 2);
    assert!(engine.has_session(&SourceId::Device(0)));

    // Adding a live source again is a no-op
    assert!(!engine.add_source(&SourceSpec::Device(0)).await.unwrap());
    assert_eq!(engine.session_count(), 2);

    assert!(engine.remove_source(&SourceId::Device(0)));
    assert_eq!(engine.session_count(), 1);

    // Removing an absent source is a no-op
    assert!(!engine.remove_source(&SourceId::Device(0)));

    // Other sessions were not disturbed
    assert!(engine.has_session(&SourceId::mic()));

    engine.stop_all();
    assert!(!engine.is_recording());
    assert_eq!(engine.session_count(), 0);

    // After stop_all, membership commands are ignored entirely
    assert!(!engine.add_source(&SourceSpec::Mic).await.unwrap());
    assert_eq!(engine.session_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_source_does_not_abort_the_others() {
    let (mut engine, mut events, _capture, _transcriber) = engine_with(true);

    // Device 5 does not exist in the mock
    let started = engine
        .start(&[SourceSpec::Mic, SourceSpec::Device(5)])
        .await
        .unwrap();

    assert_eq!(started, 1);
    assert!(engine.has_session(&SourceId::mic()));
    assert!(!engine.has_session(&SourceId::Device(5)));

    let mut failed = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, EngineEvent::SourceFailed { .. }) {
            failed += 1;
        }
    }
    assert_eq!(failed, 1);

    engine.stop_all();
}

#[tokio::test(start_paused = true)]
async fn stopping_mid_window_still_submits_captured_audio() {
    let (mut engine, _events, _capture, transcriber) = engine_with(true);

    engine.start(&[SourceSpec::Mic]).await.unwrap();

    // Stop well before the 33s window closes
    sleep(TokioDuration::from_secs(5)).await;
    engine.stop_all();
    engine.join_in_flight().await;

    assert_eq!(transcriber.calls(), 1);
    let transcript = engine.transcript().await;
    assert_eq!(transcript.len(), 1);
    assert_eq!(transcript[0].source, SourceId::mic());
    assert_eq!(transcript[0].label, "Microphone");
}

#[tokio::test(start_paused = true)]
async fn device_sessions_use_the_enumerated_name_as_label() {
    let (mut engine, mut events, _capture, _transcriber) = engine_with(true);

    engine.start(&[SourceSpec::Device(0)]).await.unwrap();

    let mut label = None;
    while let Ok(event) = events.try_recv() {
        if let EngineEvent::SessionStarted { label: l, .. } = event {
            label = Some(l);
        }
    }
    assert_eq!(label.as_deref(), Some("Device: Monitor"));

    engine.stop_all();
}
