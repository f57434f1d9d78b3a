//! # Musical Tuning Module
//!
//! This module provides the note table and nearest-note resolution for the
//! chromatic tuner. It maps a detected frequency onto the closest note of the
//! equal-tempered scale and produces a normalized deviation bar for display.
//!
//! ## Features
//! - 71-note table covering A0 (27.5 Hz) to G6 (1567.9 Hz)
//! - Nearest-note lookup between adjacent table entries
//! - Deviation bar calculation in [0, 100] with 50 meaning exact match
//! - Inclusive in-tune band check (45..=55)

use once_cell::sync::Lazy;

/// Represents a single musical note with its name and frequency.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Note {
    /// Note name (e.g., "A4", "Bb2", "Db5")
    pub name: String,
    /// Frequency in Hz
    pub frequency: f64,
}

/// The result of resolving a frequency against the note table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNote {
    /// Name of the nearest note.
    pub name: String,
    /// Deviation bar in [0, 100]; 50 is dead on the note.
    pub bar_value: u8,
    /// Whether `bar_value` landed inside the in-tune band.
    pub in_tune: bool,
}

// Flat-named equal-temperament table, strictly ascending by frequency.
// The resolver's neighbor lookup depends on that ordering.
const NOTE_DATA: [(&str, f64); 71] = [
    ("A0", 27.5), ("Bb0", 29.1), ("B0", 30.8), ("C1", 32.7), ("Db1", 34.6),
    ("D1", 36.7), ("Eb1", 38.8), ("E1", 41.2), ("F1", 43.6), ("Gb1", 46.2),
    ("G1", 49.0), ("Ab1", 51.9), ("A1", 55.0), ("Bb1", 58.2), ("B1", 61.7),
    ("C2", 65.4), ("Db2", 69.3), ("D2", 73.4), ("Eb2", 77.7), ("E2", 82.4),
    ("F2", 87.3), ("Gb2", 92.5), ("G2", 98.0), ("Ab2", 103.8), ("A2", 110.0),
    ("Bb2", 116.5), ("B2", 123.4), ("C3", 130.8), ("Db3", 138.5), ("D3", 146.8),
    ("Eb3", 155.5), ("E3", 164.8), ("F3", 174.6), ("Gb3", 185.0), ("G3", 196.0),
    ("Ab3", 207.6), ("A3", 220.0), ("Bb3", 233.0), ("B3", 246.9), ("C4", 261.6),
    ("Db4", 277.1), ("D4", 293.6), ("Eb4", 311.1), ("E4", 329.6), ("F4", 349.2),
    ("Gb4", 369.9), ("G4", 392.0), ("Ab4", 415.3), ("A4", 440.0), ("Bb4", 466.1),
    ("B4", 493.8), ("C5", 523.2), ("Db5", 554.3), ("D5", 587.3), ("Eb5", 622.2),
    ("E5", 659.2), ("F5", 698.4), ("Gb5", 739.9), ("G5", 783.9), ("Ab5", 830.6),
    ("A5", 880.0), ("Bb5", 932.3), ("B5", 987.7), ("C6", 1046.5), ("Db6", 1108.7),
    ("D6", 1174.6), ("Eb6", 1244.5), ("E6", 1318.5), ("F6", 1396.9), ("Gb6", 1479.9),
    ("G6", 1567.9),
];

/// Statically computed default note table.
///
/// Built once at first use; callers that want a custom tuning supply their
/// own `Vec<Note>` through the configuration instead.
static NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    NOTE_DATA
        .iter()
        .map(|&(name, frequency)| Note {
            name: name.to_string(),
            frequency,
        })
        .collect()
});

/// Returns a copy of the default note table (A0 through G6).
pub fn default_note_table() -> Vec<Note> {
    NOTES.clone()
}

/// Resolves a frequency to the nearest note and a deviation bar value.
///
/// The table is scanned for the first entry whose frequency exceeds the
/// input; that entry and its predecessor bracket the input, and the nearer
/// of the two wins. The bar value expresses where the input sits between
/// the neighbors: exactly 50 on the note, pushed above 50 when the pitch
/// is below but leaning toward the upper neighbor, below 50 when it is
/// above but leaning toward the lower one. The result is clamped to
/// [0, 100].
///
/// # Arguments
/// * `freq` - Input frequency in Hz
/// * `table` - Note table, strictly ascending by frequency
///
/// # Returns
/// * `Some(ResolvedNote)` - Nearest note, bar value, and in-tune flag
/// * `None` - Frequency outside the table's range (no pitch)
pub fn resolve_note(freq: f64, table: &[Note]) -> Option<ResolvedNote> {
    if !freq.is_finite() {
        return None;
    }
    let first = table.first()?;
    let last = table.last()?;
    if freq < first.frequency || freq > last.frequency {
        return None;
    }

    let hi_idx = match table.iter().position(|n| n.frequency > freq) {
        Some(idx) => idx,
        // No entry above the input: it sits exactly on the top note.
        None => {
            return Some(ResolvedNote {
                name: last.name.clone(),
                bar_value: 50,
                in_tune: true,
            });
        }
    };

    // Domain check guarantees at least one entry at or below the input,
    // so the upper neighbor is never the first entry.
    let hi = &table[hi_idx];
    let lo = &table[hi_idx - 1];
    let dist_hi = hi.frequency - freq;
    let dist_lo = freq - lo.frequency;

    let (name, raw_bar) = if dist_lo < dist_hi {
        // Nearer the lower neighbor; higher on the bar, hence add.
        let bar = if dist_hi != 0.0 {
            50.0 + (dist_lo / dist_hi * 100.0).round()
        } else {
            50.0
        };
        (lo.name.clone(), bar)
    } else {
        // Nearer the upper neighbor; lower on the bar, hence subtract.
        let bar = if dist_lo != 0.0 {
            50.0 - (dist_hi / dist_lo * 100.0).round()
        } else {
            50.0
        };
        (hi.name.clone(), bar)
    };

    let bar_value = raw_bar.clamp(0.0, 100.0) as u8;
    let in_tune = (45..=55).contains(&bar_value);

    Some(ResolvedNote {
        name,
        bar_value,
        in_tune,
    })
}
