//! # Pitch Estimation Module
//!
//! This module implements the streaming frequency estimator at the heart of
//! the tuner: a hysteresis zero-crossing cycle counter over a window of
//! 16-bit PCM samples. It deliberately avoids FFT/autocorrelation analysis;
//! counting threshold crossings is cheap enough to run on every captured
//! block and accurate enough for a single monophonic instrument.
//!
//! ## Features
//! - Hysteresis thresholds (±volume threshold) to avoid chattering on noise
//! - Digital-silence runs skipped so leading zeros never count as crossings
//! - Span anchored at the first clean cycle boundary, not the window start
//! - Backward "rewind" correction trimming the span to the last crossing

/// Transient state of one analysis pass over the sample window.
///
/// Created fresh per pass and discarded once the frequency is derived;
/// nothing persists between passes except the window's retained samples.
#[derive(Debug, Clone)]
pub struct CycleScan {
    /// Running maximum sample magnitude, seeded at the volume threshold.
    /// Diagnostic only; exposed for calibration and testing.
    pub peak: i16,
    /// Completed cycles observed after the anchoring crossing.
    pub cycle_count: u32,
    /// Samples spanned by the counted cycles, after tail correction.
    pub sample_span: usize,
    rising: bool,
    cycle_started: bool,
}

impl CycleScan {
    fn new(volume_threshold: i16) -> Self {
        Self {
            peak: volume_threshold,
            cycle_count: 0,
            sample_span: 0,
            rising: false,
            cycle_started: false,
        }
    }

    /// Derives the frequency estimate from the counted cycles.
    ///
    /// # Returns
    /// * `Some(frequency)` - Estimated fundamental in Hz
    /// * `None` - No qualifying signal (zero cycles or zero span)
    pub fn frequency(&self, sample_rate: u32) -> Option<f64> {
        if self.cycle_count == 0 || self.sample_span == 0 {
            return None;
        }
        Some(sample_rate as f64 * self.cycle_count as f64 / self.sample_span as f64)
    }
}

/// Scans one analysis window and counts hysteresis-qualified cycles.
///
/// The scan walks the window once, keeping a rising/falling state:
/// - a sample below `-volume_threshold` arms the rising state;
/// - a sample above `+volume_threshold` while rising completes a crossing.
///
/// The first crossing anchors the span so measurement starts at a clean
/// cycle boundary instead of an arbitrary window offset; only crossings
/// after the anchor count as cycles. Runs of three exact zeros are
/// skipped entirely, so stretches of digital silence neither count as
/// crossings nor inflate the span.
///
/// Because the window end is just as arbitrary as its start, a backward
/// scan then trims the span toward the last threshold crossing
/// (see `rewind_correction`).
///
/// # Arguments
/// * `samples` - Analysis window, oldest sample first (at least 3 samples)
/// * `volume_threshold` - Sensitivity threshold on the ±32767 range
pub fn scan_window(samples: &[i16], volume_threshold: i16) -> CycleScan {
    let mut scan = CycleScan::new(volume_threshold);
    if samples.len() < 3 {
        return scan;
    }

    // Seed the state from the direction of the first sample pair.
    scan.rising = samples[1] > samples[0];

    // One-sample lookahead for the silence check bounds the scan at len-2.
    for x in 1..samples.len() - 1 {
        if samples[x - 1] == 0 && samples[x] == 0 && samples[x + 1] == 0 {
            continue;
        }

        if samples[x] < -volume_threshold && !scan.rising {
            scan.rising = true;
        }

        if samples[x] > volume_threshold && scan.rising {
            scan.rising = false;
            if scan.cycle_started {
                scan.cycle_count += 1;
            } else {
                // First crossing: start the span here rather than at the
                // window start, and count no cycle for it.
                scan.cycle_started = true;
                scan.sample_span = 0;
            }
        }

        let magnitude = samples[x].saturating_abs();
        if magnitude > scan.peak {
            scan.peak = magnitude;
        }

        if scan.cycle_started {
            scan.sample_span += 1;
        }
    }

    rewind_correction(&mut scan, samples, volume_threshold);
    scan
}

/// Trims the raw span so it ends near an actual upward threshold crossing.
///
/// The raw span runs to the scan end, which rarely lines up with a cycle
/// boundary. Depending on where the waveform sits at the window end, the
/// last qualifying sample is searched backward and the offset subtracted
/// from the span. When no qualifying sample exists in the backward scan,
/// or the offset exceeds the counted span (a burst followed by skipped
/// silence), the span is left uncorrected.
fn rewind_correction(scan: &mut CycleScan, samples: &[i16], volume_threshold: i16) {
    let len = samples.len();
    let last = samples[len - 1];

    let offset = if scan.rising || last <= volume_threshold {
        (1..len).find(|&x| samples[len - x] > volume_threshold)
    } else {
        (1..len).find(|&x| samples[len - x] < volume_threshold)
    };

    if let Some(offset) = offset {
        if let Some(corrected) = scan.sample_span.checked_sub(offset) {
            scan.sample_span = corrected;
        }
    }
}

/// Estimates the fundamental frequency of one analysis window.
///
/// Convenience wrapper over [`scan_window`] for callers that only need
/// the frequency value.
pub fn estimate_frequency(samples: &[i16], sample_rate: u32, volume_threshold: i16) -> Option<f64> {
    scan_window(samples, volume_threshold).frequency(sample_rate)
}
