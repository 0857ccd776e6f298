//! GPU execution layer.
//!
//! Owns the one pipeline and the static vertex buffer, replays recorded
//! frame streams onto wgpu encoders, and implements the frame loop's
//! backend seam on top of the device layer.

mod backend;
mod triangle;
mod vertex;

pub use backend::WgpuBackend;
pub use triangle::TriangleRenderer;
pub use vertex::{TRIANGLE_VERTICES, Vertex};
