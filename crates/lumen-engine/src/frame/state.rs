use thiserror::Error;

/// Usage role of a presentable image.
///
/// Every swap-chain image carries one of these tags. An image must be moved
/// into the role it is about to be used in with an explicit
/// [`transition`](ResourceState::transition) before the use is recorded;
/// skipping the declaration is a protocol violation the driver would not
/// report, so it is checked host-side instead.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ResourceState {
    /// Owned by the display; not writable by draw work.
    Present,
    /// Bound as a color attachment; writable by draw work.
    RenderTarget,
}

/// A transition between states that is not on the declared-legal list.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Error)]
#[error("illegal resource transition {from:?} -> {to:?}")]
pub struct TransitionError {
    pub from: ResourceState,
    pub to: ResourceState,
}

impl ResourceState {
    /// Validated state transition.
    ///
    /// Only the two declared pairs are legal: `Present -> RenderTarget` and
    /// `RenderTarget -> Present`. Identity transitions are rejected; a
    /// redundant declaration in the command stream is a recording bug.
    pub fn transition(self, to: ResourceState) -> Result<ResourceState, TransitionError> {
        match (self, to) {
            (ResourceState::Present, ResourceState::RenderTarget)
            | (ResourceState::RenderTarget, ResourceState::Present) => Ok(to),
            (from, to) => Err(TransitionError { from, to }),
        }
    }
}
