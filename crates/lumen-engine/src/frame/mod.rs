//! Frame-lifecycle core.
//!
//! Host-side model of the per-frame protocol: usage-state tags for the
//! presentable images, the command recorder state machine, back-buffer
//! index tracking, and the fence counters that pace the CPU against the
//! GPU. Nothing in this module touches wgpu; the execution layer lives in
//! `render` and the whole protocol is testable without a device.

mod frame_loop;
mod recorder;
mod state;
mod sync;
mod targets;

pub use frame_loop::{FrameBackend, FrameLoop, LoopControl, LoopEvent};
pub use recorder::{
    CLEAR_COLOR, FrameCommand, FrameRecorder, FrameValidationError, RecordedFrame, RecorderError,
    validate_stream,
};
pub use state::{ResourceState, TransitionError};
pub use sync::FrameSynchronizer;
pub use targets::{BUFFER_COUNT, SwapTracker};
