// chroma-core/src/lib.rs

//! The core logic for the chromatic tuner.
//! This crate is responsible for audio capture, frequency estimation,
//! and nearest-note resolution. It is completely headless
//! and contains no UI code.

pub mod audio;
pub mod config;
pub mod pitch;
pub mod session;
pub mod tuning;
pub mod window;

/// Represents the result of a single analysis pass over the sample window.
///
/// This is the only value that crosses the worker/consumer boundary.
/// It is immutable once emitted; the consumer never shares state with
/// the session loop.
#[derive(Debug, Clone, PartialEq)]
pub struct PitchResult {
    /// The estimated fundamental frequency in Hz (0.0 when no pitch).
    pub frequency_hz: f64,
    /// The name of the nearest note, or `None` when no pitch was found.
    pub note_name: Option<String>,
    /// Deviation bar in [0, 100]; 50 means dead on the note.
    pub bar_value: u8,
    /// Whether the bar value landed inside the in-tune band (45..=55).
    pub in_tune: bool,
}

impl PitchResult {
    /// The sentinel emitted once when the session goes silent.
    pub fn silent() -> Self {
        Self {
            frequency_hz: 0.0,
            note_name: None,
            bar_value: 0,
            in_tune: false,
        }
    }

    /// True when this result carries a detected pitch.
    pub fn has_pitch(&self) -> bool {
        self.note_name.is_some()
    }
}
