use thiserror::Error;

use super::state::{ResourceState, TransitionError};
use super::targets::SwapTracker;

/// Clear color applied to the target before the draw.
pub const CLEAR_COLOR: [f64; 4] = [0.0, 0.2, 0.4, 1.0];

/// Vertex count of the one draw the engine issues.
const DRAW_VERTEX_COUNT: u32 = 3;

/// One entry in a recorded frame's command stream.
///
/// The stream is an inspectable description of the GPU work for a frame;
/// `render::TriangleRenderer` replays it onto a wgpu encoder.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum FrameCommand {
    /// Declared usage-state change for swap image `target`.
    Transition {
        target: usize,
        from: ResourceState,
        to: ResourceState,
    },
    /// Begin the render pass: bind the view of swap image `target` and
    /// clear it.
    BeginPass { target: usize, clear: [f64; 4] },
    /// Bind the one pipeline (carries topology, raster and blend state).
    BindPipeline,
    /// Full-window viewport.
    SetViewport { width: f32, height: f32 },
    /// Full-window scissor rectangle.
    SetScissor { width: u32, height: u32 },
    /// Bind the static triangle vertex buffer to slot 0.
    BindVertexBuffer,
    /// Non-indexed draw.
    Draw {
        vertex_count: u32,
        instance_count: u32,
    },
    /// End the render pass.
    EndPass,
}

/// Recorder misuse or an illegal transition met while recording.
#[derive(Debug, Error, PartialEq)]
pub enum RecorderError {
    #[error("a recording is already in progress")]
    AlreadyRecording,
    #[error("no recording in progress")]
    NotRecording,
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Phase {
    Idle,
    Recording,
    Submitted,
}

/// Per-frame command recorder.
///
/// Strictly sequential state machine: Idle -> Recording -> Submitted, then
/// back to Recording on the next [`record`](FrameRecorder::record). The
/// command storage is reset on that edge, so the caller must not start a
/// new recording while GPU work from the previous stream is still in
/// flight; [`FrameLoop`](super::FrameLoop) guarantees that by blocking on
/// the fence before the next iteration.
#[derive(Debug)]
pub struct FrameRecorder {
    phase: Phase,
    target: usize,
    commands: Vec<FrameCommand>,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            target: 0,
            commands: Vec::new(),
        }
    }

    /// Records the fixed command sequence against the tracker's current
    /// image.
    ///
    /// Emits, in order: transition to `RenderTarget`, pass begin with
    /// clear, pipeline bind, full-window viewport and scissor, vertex
    /// buffer bind, one draw of 3 vertices, pass end, transition back to
    /// `Present`. Both transitions are validated against the tracked image
    /// states as they are emitted.
    pub fn record(
        &mut self,
        tracker: &mut SwapTracker,
        extent: (u32, u32),
    ) -> Result<(), RecorderError> {
        if self.phase == Phase::Recording {
            return Err(RecorderError::AlreadyRecording);
        }

        // Idle -> Recording: reset the backing storage and re-record.
        self.commands.clear();
        self.phase = Phase::Recording;
        self.target = tracker.current_index();

        let target = self.target;
        let (width, height) = extent;

        tracker.apply_transition(target, ResourceState::Present, ResourceState::RenderTarget)?;
        self.commands.push(FrameCommand::Transition {
            target,
            from: ResourceState::Present,
            to: ResourceState::RenderTarget,
        });

        self.commands.push(FrameCommand::BeginPass {
            target,
            clear: CLEAR_COLOR,
        });
        self.commands.push(FrameCommand::BindPipeline);
        self.commands.push(FrameCommand::SetViewport {
            width: width as f32,
            height: height as f32,
        });
        self.commands.push(FrameCommand::SetScissor { width, height });
        self.commands.push(FrameCommand::BindVertexBuffer);
        self.commands.push(FrameCommand::Draw {
            vertex_count: DRAW_VERTEX_COUNT,
            instance_count: 1,
        });
        self.commands.push(FrameCommand::EndPass);

        tracker.apply_transition(target, ResourceState::RenderTarget, ResourceState::Present)?;
        self.commands.push(FrameCommand::Transition {
            target,
            from: ResourceState::RenderTarget,
            to: ResourceState::Present,
        });

        Ok(())
    }

    /// Closes the stream (Recording -> Submitted) and hands it out.
    ///
    /// No further commands can be recorded into the returned frame.
    pub fn finish(&mut self) -> Result<RecordedFrame, RecorderError> {
        if self.phase != Phase::Recording {
            return Err(RecorderError::NotRecording);
        }
        self.phase = Phase::Submitted;
        Ok(RecordedFrame {
            target: self.target,
            commands: std::mem::take(&mut self.commands),
        })
    }
}

impl Default for FrameRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// A closed command stream for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFrame {
    target: usize,
    commands: Vec<FrameCommand>,
}

impl RecordedFrame {
    /// Swap image this frame renders into.
    pub fn target(&self) -> usize {
        self.target
    }

    /// The recorded commands, in submission order.
    pub fn commands(&self) -> &[FrameCommand] {
        &self.commands
    }

    /// Checks the stream against the frame protocol. See [`validate_stream`].
    pub fn validate(&self) -> Result<(), FrameValidationError> {
        validate_stream(self.target, &self.commands)
    }
}

/// A command stream that violates the frame protocol.
#[derive(Debug, Error, PartialEq)]
pub enum FrameValidationError {
    #[error("image used as a render target while in state {0:?}")]
    UseWithoutTransition(ResourceState),
    #[error("transition declares {declared:?} but image is in {actual:?}")]
    StateMismatch {
        declared: ResourceState,
        actual: ResourceState,
    },
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("draw recorded outside a render pass")]
    DrawOutsidePass,
    #[error("image left in state {0:?} at end of frame")]
    NotPresentable(ResourceState),
    #[error("expected exactly one draw, found {0}")]
    DrawCount(usize),
    #[error("draw must cover 3 vertices / 1 instance, got {vertices}/{instances}")]
    DrawShape { vertices: u32, instances: u32 },
}

/// Validation harness for a frame's command stream.
///
/// Simulates the usage state of swap image `target` (starting from
/// `Present`) and checks:
/// - every clear/draw use happens while the image is in `RenderTarget`,
///   reached through a declared transition (transition-before-use);
/// - the image is back in `Present` when the stream ends;
/// - the stream contains exactly one draw, of 3 vertices and 1 instance.
pub fn validate_stream(
    target: usize,
    commands: &[FrameCommand],
) -> Result<(), FrameValidationError> {
    let mut state = ResourceState::Present;
    let mut in_pass = false;
    let mut draws = Vec::new();

    for cmd in commands {
        match *cmd {
            FrameCommand::Transition {
                target: t,
                from,
                to,
            } => {
                if t != target {
                    continue;
                }
                if state != from {
                    return Err(FrameValidationError::StateMismatch {
                        declared: from,
                        actual: state,
                    });
                }
                state = state.transition(to)?;
            }
            FrameCommand::BeginPass { target: t, .. } => {
                if t == target && state != ResourceState::RenderTarget {
                    return Err(FrameValidationError::UseWithoutTransition(state));
                }
                in_pass = true;
            }
            FrameCommand::EndPass => {
                in_pass = false;
            }
            FrameCommand::Draw {
                vertex_count,
                instance_count,
            } => {
                if !in_pass {
                    return Err(FrameValidationError::DrawOutsidePass);
                }
                if state != ResourceState::RenderTarget {
                    return Err(FrameValidationError::UseWithoutTransition(state));
                }
                draws.push((vertex_count, instance_count));
            }
            FrameCommand::BindPipeline
            | FrameCommand::SetViewport { .. }
            | FrameCommand::SetScissor { .. }
            | FrameCommand::BindVertexBuffer => {}
        }
    }

    if state != ResourceState::Present {
        return Err(FrameValidationError::NotPresentable(state));
    }

    match draws.as_slice() {
        [(DRAW_VERTEX_COUNT, 1)] => Ok(()),
        [(vertices, instances)] => Err(FrameValidationError::DrawShape {
            vertices: *vertices,
            instances: *instances,
        }),
        other => Err(FrameValidationError::DrawCount(other.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorded() -> (RecordedFrame, SwapTracker) {
        let mut tracker = SwapTracker::new();
        let mut recorder = FrameRecorder::new();
        recorder.record(&mut tracker, (640, 480)).unwrap();
        (recorder.finish().unwrap(), tracker)
    }

    #[test]
    fn emits_the_fixed_sequence() {
        let (frame, _) = recorded();
        assert_eq!(frame.target(), 0);
        assert_eq!(
            frame.commands(),
            &[
                FrameCommand::Transition {
                    target: 0,
                    from: ResourceState::Present,
                    to: ResourceState::RenderTarget,
                },
                FrameCommand::BeginPass {
                    target: 0,
                    clear: CLEAR_COLOR,
                },
                FrameCommand::BindPipeline,
                FrameCommand::SetViewport {
                    width: 640.0,
                    height: 480.0,
                },
                FrameCommand::SetScissor {
                    width: 640,
                    height: 480,
                },
                FrameCommand::BindVertexBuffer,
                FrameCommand::Draw {
                    vertex_count: 3,
                    instance_count: 1,
                },
                FrameCommand::EndPass,
                FrameCommand::Transition {
                    target: 0,
                    from: ResourceState::RenderTarget,
                    to: ResourceState::Present,
                },
            ]
        );
    }

    #[test]
    fn exactly_one_draw_of_three_vertices() {
        let (frame, _) = recorded();
        let draws: Vec<_> = frame
            .commands()
            .iter()
            .filter(|c| matches!(c, FrameCommand::Draw { .. }))
            .collect();
        assert_eq!(
            draws,
            vec![&FrameCommand::Draw {
                vertex_count: 3,
                instance_count: 1,
            }]
        );
    }

    #[test]
    fn leaves_the_image_presentable() {
        let (frame, tracker) = recorded();
        assert_eq!(tracker.state(frame.target()), ResourceState::Present);
        frame.validate().unwrap();
    }

    #[test]
    fn recording_twice_is_an_error() {
        let mut tracker = SwapTracker::new();
        let mut recorder = FrameRecorder::new();
        recorder.record(&mut tracker, (64, 64)).unwrap();
        assert_eq!(
            recorder.record(&mut tracker, (64, 64)),
            Err(RecorderError::AlreadyRecording)
        );
    }

    #[test]
    fn finishing_without_recording_is_an_error() {
        let mut recorder = FrameRecorder::new();
        assert_eq!(recorder.finish().unwrap_err(), RecorderError::NotRecording);
    }

    #[test]
    fn recorder_is_reusable_after_finish() {
        let mut tracker = SwapTracker::new();
        let mut recorder = FrameRecorder::new();

        recorder.record(&mut tracker, (64, 64)).unwrap();
        let first = recorder.finish().unwrap();
        tracker.present();

        recorder.record(&mut tracker, (64, 64)).unwrap();
        let second = recorder.finish().unwrap();

        assert_eq!(first.target(), 0);
        assert_eq!(second.target(), 1);
        second.validate().unwrap();
    }

    #[test]
    fn validation_rejects_use_before_transition() {
        let stream = [
            FrameCommand::BeginPass {
                target: 0,
                clear: CLEAR_COLOR,
            },
            FrameCommand::Draw {
                vertex_count: 3,
                instance_count: 1,
            },
            FrameCommand::EndPass,
        ];
        assert_eq!(
            validate_stream(0, &stream),
            Err(FrameValidationError::UseWithoutTransition(
                ResourceState::Present
            ))
        );
    }

    #[test]
    fn validation_rejects_missing_return_transition() {
        let (frame, _) = recorded();
        let mut stream = frame.commands().to_vec();
        stream.pop(); // drop the RenderTarget -> Present transition
        assert_eq!(
            validate_stream(0, &stream),
            Err(FrameValidationError::NotPresentable(
                ResourceState::RenderTarget
            ))
        );
    }

    #[test]
    fn validation_rejects_extra_draws() {
        let (frame, _) = recorded();
        let mut stream = frame.commands().to_vec();
        let draw = FrameCommand::Draw {
            vertex_count: 3,
            instance_count: 1,
        };
        // Duplicate the draw inside the pass.
        stream.insert(7, draw);
        assert_eq!(
            validate_stream(0, &stream),
            Err(FrameValidationError::DrawCount(2))
        );
    }
}
