//! # Chroma - Terminal Chromatic Tuner
//!
//! A thin terminal frontend over `chroma-core`. It wires microphone
//! capture to the pitch session on a dedicated worker thread and renders
//! each result as a note name, frequency, and deviation bar.
//!
//! ## Architecture
//! - **Capture callback**: cpal audio thread, forwards sample blocks
//! - **Worker thread**: runs the pitch session loop
//! - **Main thread**: renders results as they arrive
//! - **Communication**: crossbeam channels for thread-safe data exchange

use std::thread;

use anyhow::{Context, Result};
use chroma_core::PitchResult;
use chroma_core::audio::{self, ChannelSource};
use chroma_core::config::TunerConfig;
use chroma_core::session::PitchSession;
use cpal::traits::StreamTrait;

fn main() -> Result<()> {
    let config = load_config()?;
    config.validate()?;

    eprintln!(
        "[MAIN] Starting chroma tuner (target {} Hz, window {} samples)",
        config.sample_rate,
        config.window_len()
    );

    let (raw_tx, raw_rx) = crossbeam_channel::unbounded::<Vec<i16>>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<PitchResult>();
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);

    let (stream, actual_rate) =
        audio::start_audio_capture(raw_tx, config.sample_rate, config.block_size)?;

    // The estimator must use the rate the device actually opened with.
    let mut session_config = config;
    session_config.sample_rate = actual_rate;

    let worker = thread::spawn(move || {
        let session = PitchSession::new(
            session_config,
            ChannelSource::new(raw_rx),
            result_tx,
            shutdown_rx,
        );
        if let Err(e) = session.run() {
            eprintln!("[WORKER] Session ended with error: {}", e);
        }
    });

    // Enter stops the tuner.
    eprintln!("[MAIN] Listening... press Enter to stop");
    thread::spawn(move || {
        let mut line = String::new();
        let _ = std::io::stdin().read_line(&mut line);
        let _ = shutdown_tx.send(());
    });

    // Ends when the worker drops its sender on shutdown or source end.
    for result in result_rx {
        render(&result);
    }

    eprintln!("[MAIN] Shutting down...");
    if worker.join().is_err() {
        eprintln!("[MAIN] Worker thread panicked");
    }
    if let Err(e) = stream.pause() {
        eprintln!("[MAIN] Error pausing stream: {}", e);
    }
    drop(stream);
    eprintln!("[MAIN] Done");
    Ok(())
}

/// Loads the tuner configuration, from a JSON file when a path is given.
fn load_config() -> Result<TunerConfig> {
    match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path))?;
            let config = serde_json::from_str(&text)
                .with_context(|| format!("parsing config file {}", path))?;
            eprintln!("[MAIN] Loaded config from {}", path);
            Ok(config)
        }
        None => Ok(TunerConfig::default()),
    }
}

fn render(result: &PitchResult) {
    match &result.note_name {
        Some(name) => {
            let marker = if result.in_tune { "in tune" } else { "" };
            println!(
                "Freq: {:7.1} Hz  Note: {:<3} {} {}",
                result.frequency_hz,
                name,
                deviation_bar(result.bar_value),
                marker
            );
        }
        None => println!("Freq:     0.0 Hz  Note: --"),
    }
}

/// Renders the [0, 100] bar value as a fixed-width gauge with a center
/// mark; the cursor sits on the center cell when the pitch is dead on.
fn deviation_bar(value: u8) -> String {
    const CELLS: usize = 21;
    let pos = (value as usize * (CELLS - 1) + 50) / 100;
    (0..CELLS)
        .map(|i| {
            if i == pos {
                '|'
            } else if i == CELLS / 2 {
                '+'
            } else {
                '-'
            }
        })
        .collect()
}
