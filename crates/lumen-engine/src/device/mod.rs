//! GPU device + surface management.
//!
//! This module is responsible for:
//! - creating the wgpu Instance/Adapter/Device/Queue
//! - creating & configuring the Surface (swap chain)
//! - acquiring presentable images and providing encoders/views
//! - the fence-style completion counter the frame loop blocks on

mod context;
mod fence;
mod init;
mod surface;

pub use context::{AcquiredFrame, Gpu};
pub use fence::GpuFence;
pub use init::GpuInit;
