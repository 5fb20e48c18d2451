//! Anti-replay sliding window for record sequence numbers.

use crate::error::{Error, Result};

/// Default replay window size (64 sequence numbers).
pub const REPLAY_WINDOW_SIZE: u32 = 64;

/// Sliding-window replay detector.
///
/// Tracks the highest accepted sequence number and a bitmap of the
/// `window_size` most recent sequence numbers, where bit `i` records whether
/// `highest - i` has been seen. Sequence numbers older than the window are
/// treated as replays; numbers ahead of the window slide it forward.
#[derive(Debug, Clone)]
pub struct ReplayWindow {
    /// Highest sequence number marked so far (`None` until the first mark)
    highest: Option<u64>,

    /// Bitmap of received records; bit 0 is `highest` itself
    bitmap: u64,

    /// Window size in bits (at most 64)
    window_size: u32,
}

impl ReplayWindow {
    /// Create a replay window with the default size.
    pub fn new() -> Self {
        Self {
            highest: None,
            bitmap: 0,
            window_size: REPLAY_WINDOW_SIZE,
        }
    }

    /// Create a replay window with a custom size.
    ///
    /// The bitmap is a single 64-bit word, so sizes above 64 are refused.
    pub fn with_window_size(window_size: u32) -> Result<Self> {
        if window_size == 0 || window_size > 64 {
            return Err(Error::InvalidParameter(format!(
                "replay window size {} out of range 1..=64",
                window_size
            )));
        }
        Ok(Self {
            highest: None,
            bitmap: 0,
            window_size,
        })
    }

    /// Check whether `seq` is a replay, without updating the window.
    pub fn is_replay(&self, seq: u64) -> bool {
        let highest = match self.highest {
            None => return false,
            Some(h) => h,
        };
        if seq > highest {
            return false;
        }
        let offset = highest - seq;
        if offset >= u64::from(self.window_size) {
            // Too old to judge precisely; reject.
            return true;
        }
        self.bitmap & (1u64 << offset) != 0
    }

    /// Record `seq` as processed, sliding the window forward if needed.
    pub fn mark_as_processed(&mut self, seq: u64) {
        let highest = match self.highest {
            None => {
                self.highest = Some(seq);
                self.bitmap = 1;
                return;
            },
            Some(h) => h,
        };

        if seq > highest {
            let shift = seq - highest;
            if shift >= u64::from(self.window_size) {
                // The whole window slid past; nothing old survives.
                self.bitmap = 0;
            } else {
                self.bitmap <<= shift;
            }
            self.bitmap |= 1;
            self.bitmap &= self.mask();
            self.highest = Some(seq);
            return;
        }

        let offset = highest - seq;
        if offset < u64::from(self.window_size) {
            self.bitmap |= 1u64 << offset;
        }
    }

    /// Atomic check-and-mark: returns whether `seq` is a replay, and marks
    /// it as processed if it is not.
    pub fn check_and_mark(&mut self, seq: u64) -> bool {
        if self.is_replay(seq) {
            return true;
        }
        self.mark_as_processed(seq);
        false
    }

    /// Reset the window to its initial state.
    pub fn reset(&mut self) {
        self.highest = None;
        self.bitmap = 0;
    }

    /// Get the highest sequence number marked so far.
    pub fn highest_sequence_number(&self) -> Option<u64> {
        self.highest
    }

    /// Get the number of sequence numbers currently marked in the window.
    pub fn received_count(&self) -> u32 {
        self.bitmap.count_ones()
    }

    fn mask(&self) -> u64 {
        if self.window_size == 64 {
            u64::MAX
        } else {
            (1u64 << self.window_size) - 1
        }
    }
}

impl Default for ReplayWindow {
    fn default() -> Self {
        Self::new()
    }
}
