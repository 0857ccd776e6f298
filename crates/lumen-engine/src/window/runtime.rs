use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::device::{Gpu, GpuFence, GpuInit};
use crate::frame::{FrameLoop, LoopControl, LoopEvent};
use crate::render::{TriangleRenderer, WgpuBackend};

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "lumen".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        }
    }
}

/// Entry point for the runtime.
///
/// Creates the window and device, then drives the frame loop until a key
/// press (or window close) stops it. Returns `Ok(())` on a normal stop;
/// any setup failure is returned as the error that caused it.
pub struct Runtime;

impl Runtime {
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        if let Some(err) = state.failure.take() {
            return Err(err);
        }
        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,

    entry: Option<WindowEntry>,
    renderer: Option<TriangleRenderer>,
    fence: Option<GpuFence>,
    frame_loop: Option<FrameLoop>,

    /// Events translated from winit, drained by the next frame iteration.
    pending_events: Vec<LoopEvent>,

    failure: Option<anyhow::Error>,
    exit_requested: bool,
}

impl AppState {
    fn new(config: RuntimeConfig, gpu_init: GpuInit) -> Self {
        Self {
            config,
            gpu_init,
            entry: None,
            renderer: None,
            fence: None,
            frame_loop: None,
            pending_events: Vec::new(),
            failure: None,
            exit_requested: false,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("fatal: {err:#}");
        self.failure = Some(err);
        self.exit_requested = true;
        event_loop.exit();
    }

    fn create_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        // The swap chain is never resized; keep the window fixed-size so
        // the surface configuration stays valid for the process lifetime.
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size)
            .with_resizable(false);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let entry = WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()?;

        let (device, queue, format, size) = {
            let gpu = entry.borrow_gpu();
            (
                gpu.device().clone(),
                gpu.queue().clone(),
                gpu.surface_format(),
                gpu.size(),
            )
        };

        self.renderer = Some(TriangleRenderer::new(&device, format));
        self.fence = Some(GpuFence::new(device, queue));
        self.frame_loop = Some(FrameLoop::new((size.width, size.height)));

        entry.borrow_window().request_redraw();
        self.entry = Some(entry);

        log::info!("window ready ({}x{} px)", size.width, size.height);
        Ok(())
    }

    /// Drives one frame-loop iteration against the live device.
    fn drive_frame(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            return;
        }

        let (Some(entry), Some(renderer), Some(fence), Some(frame_loop)) = (
            self.entry.as_ref(),
            self.renderer.as_ref(),
            self.fence.as_ref(),
            self.frame_loop.as_mut(),
        ) else {
            return;
        };

        let events: Vec<LoopEvent> = self.pending_events.drain(..).collect();

        let gpu = entry.borrow_gpu();
        let mut backend = WgpuBackend::new(gpu, renderer, fence);

        match frame_loop.run_iteration(events, &mut backend) {
            Ok(LoopControl::Running) => {}
            Ok(LoopControl::Stopped) => {
                log::info!("key pressed; stopping the frame loop");
                self.exit_requested = true;
                event_loop.exit();
            }
            Err(err) => self.fail(event_loop, err),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }
        if let Err(err) = self.create_entry(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw: the loop renders every iteration until stopped.
        if let Some(entry) = self.entry.as_ref() {
            entry.borrow_window().request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.exit_requested = true;
                event_loop.exit();
            }

            // Only key presses matter to the loop; releases join the drain
            // as inert events. Everything else is left to winit.
            WindowEvent::KeyboardInput { event, .. } => {
                let ev = match event.state {
                    ElementState::Pressed => LoopEvent::KeyDown,
                    ElementState::Released => LoopEvent::Other,
                };
                self.pending_events.push(ev);
            }

            WindowEvent::RedrawRequested => {
                self.drive_frame(event_loop);
            }

            _ => {}
        }
    }
}
