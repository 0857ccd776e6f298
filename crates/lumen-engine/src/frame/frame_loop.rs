use anyhow::Result;

use super::recorder::{FrameRecorder, RecordedFrame};
use super::sync::FrameSynchronizer;
use super::targets::SwapTracker;

/// Event subset the frame loop reacts to.
///
/// The window layer translates platform events into these; anything that is
/// not a key press is `Other` and only participates in the drain.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopEvent {
    KeyDown,
    Other,
}

/// Loop status after an iteration.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopControl {
    Running,
    /// Terminal: no further frames are submitted.
    Stopped,
}

/// Execution seam between the frame loop and the device.
///
/// The production implementation is `render::WgpuBackend`; tests drive the
/// loop with an in-memory fake.
pub trait FrameBackend {
    /// Executes a closed command stream and submits it to the queue.
    fn submit(&mut self, frame: &RecordedFrame) -> Result<()>;

    /// Hands the submitted image to the display.
    fn present(&mut self) -> Result<()>;

    /// Enqueues a device-side write of `value` behind all submitted work.
    fn signal(&mut self, value: u64);

    /// Highest fence value the device has completed.
    fn completed(&self) -> u64;

    /// Blocks until `value` completes. No timeout.
    fn wait(&mut self, value: u64) -> Result<()>;
}

/// The control loop tying recorder, submission, present and pacing
/// together.
///
/// One instance drives one window. Per iteration: drain pending events; on
/// a key press move to `Stopped` without rendering; otherwise record the
/// frame, submit it, present (which advances the back-buffer cursor), and
/// block on the fence. The blocking wait is what makes resetting the
/// recorder storage at the start of the next iteration safe.
#[derive(Debug)]
pub struct FrameLoop {
    recorder: FrameRecorder,
    tracker: SwapTracker,
    sync: FrameSynchronizer,
    extent: (u32, u32),
    stopped: bool,
}

impl FrameLoop {
    /// `extent` is the drawable size in physical pixels; the window is not
    /// resizable, so it is fixed for the loop's lifetime.
    pub fn new(extent: (u32, u32)) -> Self {
        Self {
            recorder: FrameRecorder::new(),
            tracker: SwapTracker::new(),
            sync: FrameSynchronizer::new(),
            extent,
            stopped: false,
        }
    }

    pub fn tracker(&self) -> &SwapTracker {
        &self.tracker
    }

    pub fn synchronizer(&self) -> &FrameSynchronizer {
        &self.sync
    }

    /// Runs one iteration.
    ///
    /// `events` is drained completely before the stop decision takes
    /// effect, so trailing events in the same batch are still observed.
    /// Once `Stopped` is returned the loop stays stopped.
    pub fn run_iteration<B, I>(&mut self, events: I, backend: &mut B) -> Result<LoopControl>
    where
        B: FrameBackend,
        I: IntoIterator<Item = LoopEvent>,
    {
        for event in events {
            if event == LoopEvent::KeyDown {
                self.stopped = true;
            }
        }
        if self.stopped {
            return Ok(LoopControl::Stopped);
        }

        self.recorder.record(&mut self.tracker, self.extent)?;
        let frame = self.recorder.finish()?;
        debug_assert!(frame.validate().is_ok(), "recorded frame failed validation");

        backend.submit(&frame)?;
        backend.present()?;
        self.tracker.present();

        let target = self.sync.advance(backend)?;
        log::trace!(
            "frame complete: fence value {target}, next image {}",
            self.tracker.current_index()
        );

        Ok(LoopControl::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ResourceState;

    /// Backend fake that logs every call and completes fence values only
    /// when waited on.
    #[derive(Default)]
    struct LoggingBackend {
        log: Vec<String>,
        completed: u64,
        frames: Vec<RecordedFrame>,
    }

    impl FrameBackend for LoggingBackend {
        fn submit(&mut self, frame: &RecordedFrame) -> Result<()> {
            self.log.push(format!("submit image {}", frame.target()));
            self.frames.push(frame.clone());
            Ok(())
        }

        fn present(&mut self) -> Result<()> {
            self.log.push("present".to_string());
            Ok(())
        }

        fn signal(&mut self, value: u64) {
            self.log.push(format!("signal {value}"));
        }

        fn completed(&self) -> u64 {
            self.completed
        }

        fn wait(&mut self, value: u64) -> Result<()> {
            self.log.push(format!("wait {value}"));
            self.completed = self.completed.max(value);
            Ok(())
        }
    }

    fn no_events() -> std::iter::Empty<LoopEvent> {
        std::iter::empty()
    }

    fn run_frames(frame_loop: &mut FrameLoop, backend: &mut LoggingBackend, n: usize) {
        for _ in 0..n {
            let control = frame_loop.run_iteration(no_events(), backend).unwrap();
            assert_eq!(control, LoopControl::Running);
        }
    }

    #[test]
    fn three_iterations_advance_fence_and_index() {
        let mut frame_loop = FrameLoop::new((800, 600));
        let mut backend = LoggingBackend::default();

        run_frames(&mut frame_loop, &mut backend, 3);

        assert_eq!(frame_loop.synchronizer().next_value(), 4);
        assert_eq!(frame_loop.tracker().current_index(), 1);
        assert_eq!(backend.frames.len(), 3);
        for frame in &backend.frames {
            frame.validate().unwrap();
        }
        // Frames alternate between the two images.
        let targets: Vec<_> = backend.frames.iter().map(|f| f.target()).collect();
        assert_eq!(targets, vec![0, 1, 0]);
    }

    #[test]
    fn storage_is_never_reset_before_the_prior_wait() {
        let mut frame_loop = FrameLoop::new((800, 600));
        let mut backend = LoggingBackend::default();

        run_frames(&mut frame_loop, &mut backend, 2);

        // The second submit (which implies the recorder reset) must come
        // strictly after the first frame's wait.
        assert_eq!(
            backend.log,
            vec![
                "submit image 0",
                "present",
                "signal 1",
                "wait 1",
                "submit image 1",
                "present",
                "signal 2",
                "wait 2",
            ]
        );
    }

    #[test]
    fn completion_observed_next_iteration_covers_prior_target() {
        let mut frame_loop = FrameLoop::new((320, 240));
        let mut backend = LoggingBackend::default();

        for expected_target in 1..=4u64 {
            frame_loop.run_iteration(no_events(), &mut backend).unwrap();
            assert!(backend.completed() >= expected_target);
        }
    }

    #[test]
    fn key_down_stops_without_another_submission() {
        let mut frame_loop = FrameLoop::new((800, 600));
        let mut backend = LoggingBackend::default();

        run_frames(&mut frame_loop, &mut backend, 3);

        let control = frame_loop
            .run_iteration([LoopEvent::KeyDown], &mut backend)
            .unwrap();
        assert_eq!(control, LoopControl::Stopped);
        assert_eq!(backend.frames.len(), 3);

        // Terminal: later iterations do not render either.
        let control = frame_loop.run_iteration(no_events(), &mut backend).unwrap();
        assert_eq!(control, LoopControl::Stopped);
        assert_eq!(backend.frames.len(), 3);
    }

    #[test]
    fn the_full_event_batch_is_drained() {
        let mut frame_loop = FrameLoop::new((800, 600));
        let mut backend = LoggingBackend::default();

        // A key press anywhere in the batch stops the loop; surrounding
        // events are still consumed.
        let events = [LoopEvent::Other, LoopEvent::KeyDown, LoopEvent::Other];
        let control = frame_loop.run_iteration(events, &mut backend).unwrap();
        assert_eq!(control, LoopControl::Stopped);
        assert!(backend.frames.is_empty());
    }

    #[test]
    fn other_events_do_not_stop_the_loop() {
        let mut frame_loop = FrameLoop::new((800, 600));
        let mut backend = LoggingBackend::default();

        let control = frame_loop
            .run_iteration([LoopEvent::Other, LoopEvent::Other], &mut backend)
            .unwrap();
        assert_eq!(control, LoopControl::Running);
        assert_eq!(backend.frames.len(), 1);
        assert_eq!(
            frame_loop.tracker().state(0),
            ResourceState::Present
        );
    }
}
