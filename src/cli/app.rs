//! Recording app runner

use std::env;
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::{interval, timeout, Duration as TokioDuration};

use crate::application::ports::{ApiKeySource, Clipboard, ConfigStore};
use crate::application::{EngineConfig, EngineEvent, RecordingEngine, RetryPolicy, SourceSpec};
use crate::domain::config::AppConfig;
use crate::domain::recording::SegmentSchedule;
use crate::domain::session::SourceId;
use crate::domain::transcription::Instruction;
use crate::infrastructure::{
    ArboardClipboard, CpalCapture, DefaultNegotiator, GeminiTranscriber, OnlineWatcher,
    StoredKeySource, TranscriptWriter, XdgConfigStore,
};

use super::args::RecordOptions;
use super::presenter::{format_elapsed, Presenter};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_USAGE_ERROR: u8 = 2;

/// How long shutdown waits for in-flight segments to finish transcribing
const SHUTDOWN_FLUSH: TokioDuration = TokioDuration::from_secs(30);

/// Run a recording until ctrl-c or a `stop` command
pub async fn run_record(options: RecordOptions) -> ExitCode {
    let mut presenter = Presenter::new();

    let schedule = match SegmentSchedule::new(options.interval, options.window, options.chunk) {
        Ok(schedule) => schedule,
        Err(error) => {
            presenter.error(&error.to_string());
            return ExitCode::from(EXIT_USAGE_ERROR);
        }
    };

    let mut specs = Vec::new();
    if options.mic {
        specs.push(SourceSpec::Mic);
    }
    for index in &options.devices {
        specs.push(SourceSpec::Device(*index));
    }
    if specs.is_empty() {
        presenter.error(
            "No sources selected. Pass --mic and/or --device <INDEX> (see `multi-scribe devices`).",
        );
        return ExitCode::from(EXIT_USAGE_ERROR);
    }

    // The key is re-read before every transcription attempt; checking it up
    // front just fails fast instead of recording unusable segments.
    let keys = Arc::new(StoredKeySource::new(XdgConfigStore::new()));
    if keys.current().await.is_none() {
        presenter.error(
            "Missing API key. Set GEMINI_API_KEY or run 'multi-scribe config set api_key <key>'",
        );
        return ExitCode::from(EXIT_ERROR);
    }

    let mut transcriber = GeminiTranscriber::new(keys);
    if let Some(ref model) = options.model {
        transcriber = transcriber.with_model(model.as_str());
    }

    let config = EngineConfig {
        schedule,
        retry: RetryPolicy::default(),
        instruction: Instruction::default(),
    };
    let (mut engine, mut events) = RecordingEngine::new(
        Arc::new(CpalCapture::new()),
        Arc::new(transcriber),
        Arc::new(DefaultNegotiator::new()),
        config,
    );

    presenter.start_spinner("Requesting audio…");
    let started = match engine.start(&specs).await {
        Ok(started) => started,
        Err(error) => {
            presenter.spinner_fail(&error.to_string());
            while let Ok(event) = events.try_recv() {
                render_event(&presenter, &event);
            }
            return ExitCode::from(EXIT_ERROR);
        }
    };
    presenter.spinner_success(&format!(
        "Recording {} source{}",
        started,
        if started == 1 { "" } else { "s" }
    ));
    presenter.info("Commands: add mic | add <index> | remove <id|index> | sources | stop");

    let mut online = OnlineWatcher::new().spawn();
    let mut stdin_lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let started_at = tokio::time::Instant::now();
    let mut timer = interval(TokioDuration::from_secs(1));

    presenter.start_spinner("Recording… 00:00:00");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            _ = timer.tick() => {
                presenter.update_spinner(&format!(
                    "Recording… {}",
                    format_elapsed(started_at.elapsed())
                ));
            }
            Some(()) = online.recv() => {
                presenter.feed("Connectivity restored, replaying queued segments…");
                engine.drain_pending().await;
            }
            event = events.recv() => match event {
                Some(event) => render_event(&presenter, &event),
                None => break,
            },
            line = stdin_lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if handle_command(&mut engine, &presenter, line.trim()).await {
                        break;
                    }
                }
                Ok(None) | Err(_) => stdin_open = false,
            },
        }
    }

    presenter.stop_spinner();
    presenter.info("Stopping…");
    engine.stop_all();
    let _ = timeout(SHUTDOWN_FLUSH, engine.join_in_flight()).await;
    while let Ok(event) = events.try_recv() {
        render_event(&presenter, &event);
    }

    finish(&presenter, &engine, &options).await
}

/// Print the assembled transcript and run the export/clipboard collaborators
async fn finish(
    presenter: &Presenter,
    engine: &RecordingEngine,
    options: &RecordOptions,
) -> ExitCode {
    let entries = engine.transcript().await;
    let text = engine.transcript_text().await;
    let mut exit = ExitCode::from(EXIT_SUCCESS);

    if entries.is_empty() {
        presenter.info("No transcript captured.");
    } else {
        presenter.output(&text);
    }

    let pending = engine.pending_len().await;
    if pending > 0 {
        presenter.warn(&format!(
            "{} segment(s) were still queued when recording stopped and were not transcribed.",
            pending
        ));
    }

    if options.clipboard && !entries.is_empty() {
        match ArboardClipboard::new().copy(&text).await {
            Ok(()) => presenter.info("Copied to clipboard"),
            Err(error) => presenter.warn(&format!("Clipboard copy failed: {}", error)),
        }
    }

    if let Some(ref dir) = options.export_dir {
        let writer = TranscriptWriter::new(dir);
        match writer.write_text(&text).await {
            Ok(path) => presenter.success(&format!("Wrote {}", path.display())),
            Err(error) => {
                presenter.error(&error.to_string());
                exit = ExitCode::from(EXIT_ERROR);
            }
        }
        match writer.write_json(&entries).await {
            Ok(path) => presenter.success(&format!("Wrote {}", path.display())),
            Err(error) => {
                presenter.error(&error.to_string());
                exit = ExitCode::from(EXIT_ERROR);
            }
        }
    }

    exit
}

/// Apply one live command. Returns true when the recording should stop.
async fn handle_command(
    engine: &mut RecordingEngine,
    presenter: &Presenter,
    line: &str,
) -> bool {
    let mut words = line.split_whitespace();
    match words.next() {
        None => false,
        Some("stop") | Some("quit") | Some("exit") => true,
        Some("sources") => {
            let mut active = engine.active_sources();
            active.sort_by(|a, b| a.0.to_string().cmp(&b.0.to_string()));
            for (id, label) in active {
                presenter.feed(&format!("  {} - {}", id, label));
            }
            presenter.feed(&format!("  {} segment(s) pending", engine.pending_len().await));
            false
        }
        Some("add") => {
            match words.next() {
                Some("mic") => add_source(engine, presenter, SourceSpec::Mic).await,
                Some(arg) => match arg.parse::<usize>() {
                    Ok(index) => add_source(engine, presenter, SourceSpec::Device(index)).await,
                    Err(_) => presenter.warn("Usage: add mic | add <index>"),
                },
                None => presenter.warn("Usage: add mic | add <index>"),
            }
            false
        }
        Some("remove") => {
            match parse_remove_target(words.next()) {
                Some(id) => {
                    if !engine.remove_source(&id) {
                        presenter.warn(&format!("No active session for {}", id));
                    }
                }
                None => presenter.warn("Usage: remove mic | remove <index> | remove <id>"),
            }
            false
        }
        Some(other) => {
            presenter.warn(&format!(
                "Unknown command: {} (add / remove / sources / stop)",
                other
            ));
            false
        }
    }
}

async fn add_source(engine: &mut RecordingEngine, presenter: &Presenter, spec: SourceSpec) {
    match engine.add_source(&spec).await {
        Ok(true) => {} // the SessionStarted event renders in the feed
        Ok(false) => presenter.info("Source already recording (or no recording active)"),
        Err(error) => presenter.warn(&format!("Couldn't add source: {}", error)),
    }
}

fn parse_remove_target(arg: Option<&str>) -> Option<SourceId> {
    let arg = arg?;
    if arg == "mic" {
        return Some(SourceId::mic());
    }
    if let Ok(index) = arg.parse::<usize>() {
        return Some(SourceId::Device(index as u32));
    }
    arg.parse().ok()
}

fn render_event(presenter: &Presenter, event: &EngineEvent) {
    let now = Utc::now().format("%H:%M:%S");
    match event {
        EngineEvent::SessionStarted { label, .. } => {
            presenter.feed(&format!("[{}] {} started", now, label));
        }
        EngineEvent::SessionStopped { source } => {
            presenter.feed(&format!("[{}] {} stopped", now, source));
        }
        EngineEvent::SourceFailed { label, error } => {
            presenter.warn(&format!("Couldn't start {}: {}", label, error));
        }
        EngineEvent::Transcribed(entry) => {
            presenter.feed(&format!(
                "[{}] {}: {}",
                entry.timestamp.format("%H:%M:%S"),
                entry.label,
                entry.text
            ));
        }
        EngineEvent::SegmentQueued { queued, .. } => {
            presenter.feed(&format!(
                "Queued segment (offline or error). {} pending.",
                queued
            ));
        }
        EngineEvent::TranscriptionFailed { error, .. } => {
            presenter.error(&format!("Transcription error: {}", error));
        }
    }
}

/// Load and merge configuration from file, env, and CLI
pub async fn load_merged_config(cli_config: AppConfig) -> AppConfig {
    let store = XdgConfigStore::new();
    let file_config = store.load().await.unwrap_or_else(|_| AppConfig::empty());

    let env_config = AppConfig {
        api_key: env::var("GEMINI_API_KEY").ok().filter(|s| !s.is_empty()),
        ..Default::default()
    };

    // Merge: defaults < file < env < cli
    AppConfig::defaults()
        .merge(file_config)
        .merge(env_config)
        .merge(cli_config)
}
