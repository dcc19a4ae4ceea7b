//! MultiScribe CLI entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use multi_scribe::application::ports::AudioCapture;
use multi_scribe::cli::{
    app::{load_merged_config, run_record, EXIT_ERROR, EXIT_USAGE_ERROR},
    args::{Cli, Commands, RecordOptions},
    config_cmd::handle_config_command,
    presenter::Presenter,
};
use multi_scribe::domain::config::AppConfig;
use multi_scribe::domain::recording::Duration;
use multi_scribe::infrastructure::{CpalCapture, XdgConfigStore};

#[tokio::main(flavor = "multi_thread", worker_threads = 2)]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let presenter = Presenter::new();

    // Handle subcommands
    match cli.command {
        Some(Commands::Config { action }) => {
            let store = XdgConfigStore::new();
            if let Err(e) = handle_config_command(action, &store, &presenter).await {
                presenter.error(&e.to_string());
                return ExitCode::from(EXIT_ERROR);
            }
            return ExitCode::SUCCESS;
        }
        Some(Commands::Devices) => {
            let capture = CpalCapture::new();
            match capture.list_devices() {
                Ok(devices) if devices.is_empty() => {
                    presenter.info("No capture devices found.");
                }
                Ok(devices) => {
                    for device in devices {
                        presenter.key_value(&device.index.to_string(), &device.name);
                    }
                }
                Err(e) => {
                    presenter.error(&e.to_string());
                    return ExitCode::from(EXIT_ERROR);
                }
            }
            return ExitCode::SUCCESS;
        }
        None => {}
    }

    // Build CLI config from args
    let cli_config = AppConfig {
        api_key: None, // API key comes from env/file only
        model: cli.model.clone(),
        interval: cli.interval.clone(),
        window: cli.window.clone(),
        chunk: None,
        clipboard: if cli.clipboard { Some(true) } else { None },
        export_dir: cli.export_dir.clone(),
    };

    // Merge config
    let config = load_merged_config(cli_config).await;

    // Parse the schedule timings; the overlap invariant is checked at start
    let interval = match parse_duration(&config.interval, "interval", &presenter) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let window = match parse_duration(&config.window, "window", &presenter) {
        Ok(d) => d,
        Err(code) => return code,
    };
    let chunk = match parse_duration(&config.chunk, "chunk", &presenter) {
        Ok(d) => d,
        Err(code) => return code,
    };

    let options = RecordOptions {
        mic: cli.mic,
        devices: cli.devices.clone(),
        interval,
        window,
        chunk,
        model: config.model.clone(),
        clipboard: config.clipboard_or_default(),
        export_dir: config.export_dir.clone(),
    };

    run_record(options).await
}

fn parse_duration(
    value: &Option<String>,
    key: &str,
    presenter: &Presenter,
) -> Result<Duration, ExitCode> {
    // Merged config always carries defaults, but guard anyway
    let Some(value) = value.as_ref() else {
        presenter.error(&format!("Missing {} setting", key));
        return Err(ExitCode::from(EXIT_USAGE_ERROR));
    };
    value.parse::<Duration>().map_err(|e| {
        presenter.error(&format!("Invalid {}: {}", key, e));
        ExitCode::from(EXIT_USAGE_ERROR)
    })
}
