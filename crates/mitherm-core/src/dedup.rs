//! Advertisement frame deduplication.
//!
//! The radio may re-deliver the same broadcast packet several times within
//! its advertising interval. The ATC payload carries a one-byte frame
//! counter; suppressing consecutive repeats of the same counter gives
//! downstream consumers each physical reading exactly once.

/// Tracks the last-seen advertisement frame counter and rejects repeats.
///
/// Only meaningful in advertisement-monitor mode; notification frames have
/// no counter and bypass deduplication entirely.
#[derive(Debug, Default)]
pub struct FrameDeduplicator {
    last_frame: Option<u8>,
}

impl FrameDeduplicator {
    /// Create a deduplicator that has seen no frames yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame counter. Returns `false` if it equals the previous
    /// counter (duplicate, reject); otherwise stores it and returns `true`.
    pub fn accept(&mut self, frame_counter: u8) -> bool {
        if self.last_frame == Some(frame_counter) {
            return false;
        }
        self.last_frame = Some(frame_counter);
        true
    }
}
