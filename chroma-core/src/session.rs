//! # Pitch Session Loop
//!
//! Orchestrates continuous block ingestion: read a block from the audio
//! source, refresh the sliding window, estimate the frequency, resolve the
//! nearest note, and emit the result to the consumer channel. The loop is
//! meant to run on a dedicated worker thread; it blocks only on the
//! source's acquire-next-block call and checks for shutdown once per
//! iteration.

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, TryRecvError};

use crate::PitchResult;
use crate::config::TunerConfig;
use crate::window::SampleWindow;
use crate::{pitch, tuning};

/// Synchronous supplier of fixed-size capture blocks.
///
/// Implementations deliver signed 16-bit mono PCM at the configured
/// sample rate.
pub trait BlockSource {
    /// Reads the next block into `buf`.
    ///
    /// # Returns
    /// * `Ok(Some(n))` - `n` samples were read; `n < buf.len()` is a short
    ///   read and means "no new analysis this cycle", not an error
    /// * `Ok(None)` - the source ended; the session finishes cleanly
    /// * `Err(e)` - the source failed permanently; ends the session
    fn read_block(&mut self, buf: &mut [i16]) -> Result<Option<usize>>;
}

/// Continuous pitch estimation session over a block source.
///
/// The session owns the sliding window exclusively; results cross to the
/// consumer as immutable values over an ordered channel. Between a
/// detected pitch and silence the session debounces: the silent sentinel
/// is emitted once on the transition into silence, never repeatedly.
pub struct PitchSession<S: BlockSource> {
    config: TunerConfig,
    source: S,
    results: Sender<PitchResult>,
    shutdown: Receiver<()>,
    window: SampleWindow,
    listening: bool,
}

impl<S: BlockSource> PitchSession<S> {
    pub fn new(
        config: TunerConfig,
        source: S,
        results: Sender<PitchResult>,
        shutdown: Receiver<()>,
    ) -> Self {
        let window = SampleWindow::new(config.window_len());
        Self {
            config,
            source,
            results,
            shutdown,
            window,
            // Matches the startup state of the display: silent until a
            // qualifying signal arrives, so leading quiet emits nothing.
            listening: false,
        }
    }

    /// Runs the session until the source ends, the consumer hangs up, or
    /// a stop is signalled.
    ///
    /// A shutdown message or a closed shutdown channel both stop the
    /// loop; a source error propagates to the caller.
    pub fn run(mut self) -> Result<()> {
        let mut block = vec![0i16; self.config.block_size];

        loop {
            match self.shutdown.try_recv() {
                Ok(()) | Err(TryRecvError::Disconnected) => return Ok(()),
                Err(TryRecvError::Empty) => {}
            }

            let read = match self.source.read_block(&mut block)? {
                Some(read) => read,
                None => return Ok(()),
            };
            if read < block.len() {
                // Short read: skip this cycle's window update, retry.
                continue;
            }

            self.window.push(&block);
            let estimate = pitch::estimate_frequency(
                self.window.samples(),
                self.config.sample_rate,
                self.config.volume_threshold,
            );

            let resolved = estimate
                .and_then(|freq| tuning::resolve_note(freq, &self.config.notes).map(|r| (freq, r)));

            let emitted = match resolved {
                Some((freq, resolved)) => {
                    self.listening = true;
                    self.results.send(PitchResult {
                        frequency_hz: freq,
                        note_name: Some(resolved.name),
                        bar_value: resolved.bar_value,
                        in_tune: resolved.in_tune,
                    })
                }
                None if self.listening => {
                    self.listening = false;
                    self.results.send(PitchResult::silent())
                }
                None => Ok(()),
            };

            // The consumer hanging up ends the session cleanly.
            if emitted.is_err() {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::VecDeque;

    const SAMPLE_RATE: u32 = 44100;
    const BLOCK: usize = 1024;

    struct VecSource {
        blocks: VecDeque<Vec<i16>>,
    }

    impl VecSource {
        fn new(blocks: Vec<Vec<i16>>) -> Self {
            Self { blocks: blocks.into() }
        }
    }

    impl BlockSource for VecSource {
        fn read_block(&mut self, buf: &mut [i16]) -> Result<Option<usize>> {
            match self.blocks.pop_front() {
                Some(block) => {
                    let n = block.len().min(buf.len());
                    buf[..n].copy_from_slice(&block[..n]);
                    Ok(Some(n))
                }
                None => Ok(None),
            }
        }
    }

    struct FailingSource;

    impl BlockSource for FailingSource {
        fn read_block(&mut self, _buf: &mut [i16]) -> Result<Option<usize>> {
            Err(anyhow!("device went away"))
        }
    }

    fn test_config() -> TunerConfig {
        TunerConfig {
            sample_rate: SAMPLE_RATE,
            block_size: BLOCK,
            window_multiplier: 4,
            ..Default::default()
        }
    }

    fn sine_blocks(freq: f64, amplitude: f64, count: usize) -> Vec<Vec<i16>> {
        let samples: Vec<i16> = (0..count * BLOCK)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * freq * i as f64 / SAMPLE_RATE as f64;
                (amplitude * phase.sin()) as i16
            })
            .collect();
        samples.chunks(BLOCK).map(|c| c.to_vec()).collect()
    }

    fn quiet_blocks(count: usize) -> Vec<Vec<i16>> {
        // Sub-threshold but non-zero, like a quiet room.
        (0..count)
            .map(|_| (0..BLOCK).map(|i| if i % 2 == 0 { 150 } else { -150 }).collect())
            .collect()
    }

    fn run_session(blocks: Vec<Vec<i16>>) -> (Result<()>, Vec<PitchResult>) {
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let (_shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let session = PitchSession::new(
            test_config(),
            VecSource::new(blocks),
            result_tx,
            shutdown_rx,
        );
        let outcome = session.run();
        (outcome, result_rx.try_iter().collect())
    }

    #[test]
    fn detects_a440_and_debounces_silence() {
        let mut blocks = sine_blocks(440.0, 12000.0, 4);
        blocks.extend(quiet_blocks(6));
        let (outcome, results) = run_session(blocks);
        assert!(outcome.is_ok());

        // Every window with signal emits a pitch; silence emits exactly
        // one sentinel when the tone has fully left the window.
        assert_eq!(results.len(), 8);
        assert!(results[..7].iter().all(|r| r.has_pitch()));
        assert_eq!(results[7], PitchResult::silent());

        // The fourth pass sees a full window of pure tone.
        let full = &results[3];
        assert_eq!(full.note_name.as_deref(), Some("A4"));
        assert!((full.frequency_hz - 440.0).abs() / 440.0 < 0.03);
    }

    #[test]
    fn quiet_input_emits_nothing() {
        // Never listening, so no silent sentinel either.
        let (outcome, results) = run_session(quiet_blocks(8));
        assert!(outcome.is_ok());
        assert!(results.is_empty());
    }

    #[test]
    fn short_reads_skip_the_cycle() {
        // Loud short blocks must not reach the window at all.
        let blocks = vec![vec![12000i16; BLOCK / 2]; 10];
        let (outcome, results) = run_session(blocks);
        assert!(outcome.is_ok());
        assert!(results.is_empty());
    }

    #[test]
    fn shutdown_signal_stops_the_session() {
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        shutdown_tx.send(()).unwrap();

        let session = PitchSession::new(
            test_config(),
            VecSource::new(sine_blocks(440.0, 12000.0, 8)),
            result_tx,
            shutdown_rx,
        );
        assert!(session.run().is_ok());
        assert_eq!(result_rx.try_iter().count(), 0);
    }

    #[test]
    fn closed_shutdown_channel_stops_the_session() {
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        drop(shutdown_tx);

        let session = PitchSession::new(
            test_config(),
            VecSource::new(sine_blocks(440.0, 12000.0, 8)),
            result_tx,
            shutdown_rx,
        );
        assert!(session.run().is_ok());
        assert_eq!(result_rx.try_iter().count(), 0);
    }

    #[test]
    fn source_failure_propagates() {
        let (result_tx, _result_rx) = crossbeam_channel::unbounded();
        let (_shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let session = PitchSession::new(test_config(), FailingSource, result_tx, shutdown_rx);
        assert!(session.run().is_err());
    }

    #[test]
    fn consumer_hangup_ends_the_session_cleanly() {
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let (_shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        drop(result_rx);

        let session = PitchSession::new(
            test_config(),
            VecSource::new(sine_blocks(440.0, 12000.0, 8)),
            result_tx,
            shutdown_rx,
        );
        assert!(session.run().is_ok());
    }
}
