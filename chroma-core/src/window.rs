//! # Sliding Sample Window
//!
//! A fixed-capacity buffer over the most recent audio samples. Each capture
//! block pushed into the window evicts the same number of oldest samples, so
//! the estimator always sees a wider span of history than a single block
//! while still reacting every time new audio arrives.

/// Fixed-length window over the most recent PCM samples.
///
/// The window starts zero-filled; early analysis passes over the leading
/// zeros are harmless because the estimator skips silent runs. The window
/// is owned and mutated exclusively by the session loop and exposed
/// read-only to the estimator.
#[derive(Debug, Clone)]
pub struct SampleWindow {
    samples: Vec<i16>,
}

impl SampleWindow {
    /// Creates a zero-filled window of the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: vec![0; capacity],
        }
    }

    /// Appends a captured block, evicting the same number of oldest samples.
    ///
    /// The window length never changes. Blocks are expected to be at most
    /// the window capacity; an oversized block keeps only its newest
    /// `capacity` samples.
    pub fn push(&mut self, block: &[i16]) {
        let capacity = self.samples.len();
        debug_assert!(block.len() <= capacity, "block larger than window");

        if block.len() >= capacity {
            self.samples
                .copy_from_slice(&block[block.len() - capacity..]);
            return;
        }

        let keep = capacity - block.len();
        self.samples.copy_within(block.len().., 0);
        self.samples[keep..].copy_from_slice(block);
    }

    /// Read-only view of the window contents, oldest sample first.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// The fixed window length W.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_zero_filled() {
        let window = SampleWindow::new(8);
        assert_eq!(window.len(), 8);
        assert!(window.samples().iter().all(|&s| s == 0));
    }

    #[test]
    fn push_keeps_length_and_evicts_oldest() {
        let mut window = SampleWindow::new(6);
        window.push(&[1, 2, 3]);
        assert_eq!(window.samples(), &[0, 0, 0, 1, 2, 3]);

        window.push(&[4, 5, 6]);
        assert_eq!(window.samples(), &[1, 2, 3, 4, 5, 6]);

        window.push(&[7, 8]);
        assert_eq!(window.samples(), &[3, 4, 5, 6, 7, 8]);
        assert_eq!(window.len(), 6);
    }

    #[test]
    fn full_size_block_replaces_contents() {
        let mut window = SampleWindow::new(4);
        window.push(&[9, 9, 9, 9]);
        assert_eq!(window.samples(), &[9, 9, 9, 9]);
    }
}
