use anyhow::{Context, Result};

use crate::device::{Gpu, GpuFence};
use crate::frame::{FrameBackend, RecordedFrame};

use super::triangle::TriangleRenderer;

/// wgpu realization of the frame loop's backend seam.
///
/// Constructed per iteration around the long-lived device, renderer and
/// fence. `submit` acquires the image, replays the stream and submits the
/// encoder; the acquired texture is held until `present` hands it to the
/// display.
pub struct WgpuBackend<'a, 'w> {
    gpu: &'a Gpu<'w>,
    renderer: &'a TriangleRenderer,
    fence: &'a GpuFence,
    pending: Option<wgpu::SurfaceTexture>,
}

impl<'a, 'w> WgpuBackend<'a, 'w> {
    pub fn new(gpu: &'a Gpu<'w>, renderer: &'a TriangleRenderer, fence: &'a GpuFence) -> Self {
        Self {
            gpu,
            renderer,
            fence,
            pending: None,
        }
    }
}

impl FrameBackend for WgpuBackend<'_, '_> {
    fn submit(&mut self, frame: &RecordedFrame) -> Result<()> {
        let mut acquired = self.gpu.acquire()?;

        self.renderer
            .execute(frame, &mut acquired.encoder, &acquired.view);

        self.gpu
            .queue()
            .submit(std::iter::once(acquired.encoder.finish()));

        self.pending = Some(acquired.surface_texture);
        Ok(())
    }

    fn present(&mut self) -> Result<()> {
        let texture = self
            .pending
            .take()
            .context("present called without a submitted frame")?;
        texture.present();
        Ok(())
    }

    fn signal(&mut self, value: u64) {
        self.fence.signal(value);
    }

    fn completed(&self) -> u64 {
        self.fence.completed()
    }

    fn wait(&mut self, value: u64) -> Result<()> {
        self.fence.wait(value)
    }
}
