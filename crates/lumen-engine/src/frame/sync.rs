use anyhow::Result;

use super::frame_loop::FrameBackend;

/// CPU/GPU pacing counter.
///
/// Holds the monotonically increasing fence value the next frame will
/// signal (starting at 1) and drives the per-frame throttle: signal, then
/// block until the device reports the value complete. One frame of latency,
/// fully blocking — the host never overlaps recording of frame N+1 with
/// execution of frame N.
#[derive(Debug)]
pub struct FrameSynchronizer {
    next_value: u64,
}

impl FrameSynchronizer {
    pub fn new() -> Self {
        Self { next_value: 1 }
    }

    /// Fence value the next frame will signal. Starts at 1 and grows by 1
    /// per completed iteration.
    pub fn next_value(&self) -> u64 {
        self.next_value
    }

    /// Runs the post-present pacing step and returns the completed value.
    ///
    /// Enqueues a device-side signal of the captured target behind all
    /// submitted work, advances the counter, then blocks (without timeout)
    /// unless the device has already reported the target complete. A hung
    /// device hangs the caller; there is deliberately no cancellation path.
    pub fn advance<B: FrameBackend>(&mut self, backend: &mut B) -> Result<u64> {
        let target = self.next_value;
        backend.signal(target);
        self.next_value += 1;

        if backend.completed() < target {
            backend.wait(target)?;
        }

        Ok(target)
    }
}

impl Default for FrameSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::RecordedFrame;

    /// Fence-only backend: completion is advanced by `wait` (or preloaded).
    struct FakeFence {
        completed: u64,
        signaled: Vec<u64>,
        waited: Vec<u64>,
    }

    impl FakeFence {
        fn new(completed: u64) -> Self {
            Self {
                completed,
                signaled: Vec::new(),
                waited: Vec::new(),
            }
        }
    }

    impl FrameBackend for FakeFence {
        fn submit(&mut self, _frame: &RecordedFrame) -> Result<()> {
            Ok(())
        }

        fn present(&mut self) -> Result<()> {
            Ok(())
        }

        fn signal(&mut self, value: u64) {
            self.signaled.push(value);
        }

        fn completed(&self) -> u64 {
            self.completed
        }

        fn wait(&mut self, value: u64) -> Result<()> {
            self.waited.push(value);
            self.completed = self.completed.max(value);
            Ok(())
        }
    }

    #[test]
    fn values_start_at_one_and_increment() {
        let mut sync = FrameSynchronizer::new();
        let mut fence = FakeFence::new(0);

        assert_eq!(sync.next_value(), 1);
        for expect in 1..=3 {
            let target = sync.advance(&mut fence).unwrap();
            assert_eq!(target, expect);
        }
        assert_eq!(sync.next_value(), 4);
        assert_eq!(fence.signaled, vec![1, 2, 3]);
    }

    #[test]
    fn blocks_only_when_the_device_is_behind() {
        let mut sync = FrameSynchronizer::new();

        // Device already past the target: no wait.
        let mut fast = FakeFence::new(u64::MAX);
        sync.advance(&mut fast).unwrap();
        assert!(fast.waited.is_empty());

        // Device behind: wait on exactly the captured target.
        let mut slow = FakeFence::new(0);
        let target = sync.advance(&mut slow).unwrap();
        assert_eq!(slow.waited, vec![target]);
    }

    #[test]
    fn completion_is_monotonic_across_frames() {
        let mut sync = FrameSynchronizer::new();
        let mut fence = FakeFence::new(0);

        let mut last = 0;
        for _ in 0..4 {
            let target = sync.advance(&mut fence).unwrap();
            assert!(fence.completed() >= target);
            assert!(target > last);
            last = target;
        }
    }
}
