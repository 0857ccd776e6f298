use super::state::{ResourceState, TransitionError};

/// Number of presentable images in the swap chain.
///
/// Double buffering is fixed; nothing in the engine supports triple
/// buffering or a configurable count.
pub const BUFFER_COUNT: usize = 2;

/// Host-side model of the double-buffered presentation surface.
///
/// Owns the back-buffer cursor and the per-image usage-state tags as one
/// fixed-size array indexed by the value
/// [`current_index`](SwapTracker::current_index) returns. wgpu
/// hides the native back-buffer index behind `get_current_texture`; with a
/// 2-image FIFO chain and a fully blocking frame loop the acquisition order
/// is strict alternation, which is what this tracker mirrors.
///
/// The cursor is advanced only by [`present`](SwapTracker::present).
#[derive(Debug, Clone)]
pub struct SwapTracker {
    index: usize,
    states: [ResourceState; BUFFER_COUNT],
}

impl SwapTracker {
    /// New tracker: cursor at image 0, both images owned by the display.
    pub fn new() -> Self {
        Self {
            index: 0,
            states: [ResourceState::Present; BUFFER_COUNT],
        }
    }

    /// Index of the image that is writable next.
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Current usage state of image `index`.
    pub fn state(&self, index: usize) -> ResourceState {
        self.states[index]
    }

    /// Applies a declared transition to image `index`.
    ///
    /// Fails when the declared `from` state does not match the tracked
    /// state, or when the pair itself is not legal.
    pub fn apply_transition(
        &mut self,
        index: usize,
        from: ResourceState,
        to: ResourceState,
    ) -> Result<(), TransitionError> {
        let tracked = self.states[index];
        if tracked != from {
            return Err(TransitionError { from: tracked, to });
        }
        self.states[index] = tracked.transition(to)?;
        Ok(())
    }

    /// Hands the current image to the display and advances the cursor.
    pub fn present(&mut self) {
        self.index = (self.index + 1) % BUFFER_COUNT;
    }
}

impl Default for SwapTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_zero_with_presentable_images() {
        let tracker = SwapTracker::new();
        assert_eq!(tracker.current_index(), 0);
        assert_eq!(tracker.state(0), ResourceState::Present);
        assert_eq!(tracker.state(1), ResourceState::Present);
    }

    #[test]
    fn index_alternates_with_period_two() {
        let mut tracker = SwapTracker::new();
        let mut seen = Vec::new();
        for _ in 0..5 {
            tracker.present();
            seen.push(tracker.current_index());
        }
        assert_eq!(seen, vec![1, 0, 1, 0, 1]);
    }

    #[test]
    fn transitions_update_the_tracked_state() {
        let mut tracker = SwapTracker::new();
        tracker
            .apply_transition(0, ResourceState::Present, ResourceState::RenderTarget)
            .unwrap();
        assert_eq!(tracker.state(0), ResourceState::RenderTarget);
        assert_eq!(tracker.state(1), ResourceState::Present);

        tracker
            .apply_transition(0, ResourceState::RenderTarget, ResourceState::Present)
            .unwrap();
        assert_eq!(tracker.state(0), ResourceState::Present);
    }

    #[test]
    fn mismatched_from_state_is_rejected() {
        let mut tracker = SwapTracker::new();
        let err = tracker
            .apply_transition(1, ResourceState::RenderTarget, ResourceState::Present)
            .unwrap_err();
        assert_eq!(err.from, ResourceState::Present);
    }
}
