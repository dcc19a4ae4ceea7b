//! MultiScribe - multi-source segmented audio transcription
//!
//! Records audio from several capture sources at once, slices every source
//! into overlapping fixed-length segments, transcribes each segment through
//! Google Gemini, and assembles the results into one exportable transcript.
//!
//! # Architecture
//!
//! The crate follows hexagonal (ports & adapters) architecture:
//!
//! - **Domain**: value objects and entities (schedules, segments, transcript)
//! - **Application**: the recording engine, retry/queue logic, and port traits
//! - **Infrastructure**: adapter implementations (cpal, Gemini, config, export)
//! - **CLI**: command-line interface and live feed rendering

pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
