//! Lumen engine crate.
//!
//! This crate owns everything needed to put one triangle on screen: the
//! wgpu device/surface layer, the per-frame lifecycle core (command
//! recording, back-buffer tracking, fence pacing), the triangle pipeline,
//! and the winit window runtime that drives the loop.

pub mod device;
pub mod frame;
pub mod logging;
pub mod render;
pub mod window;
