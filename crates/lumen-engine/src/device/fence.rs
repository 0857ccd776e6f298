use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result};

/// Monotonic completion counter backed by queue callbacks.
///
/// `signal(value)` registers a queue callback that stores `value` once all
/// work submitted so far has finished; `completed()` reads the highest
/// value stored. `wait` blocks the calling thread, polling the device
/// until the target is reached — there is no timeout, so a hung driver
/// hangs the caller.
///
/// Values must be signaled in increasing order; the store uses a
/// fetch-max so a late callback can never move the counter backwards.
pub struct GpuFence {
    device: wgpu::Device,
    queue: wgpu::Queue,
    completed: Arc<AtomicU64>,
}

impl GpuFence {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            device,
            queue,
            completed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enqueues a completion write of `value` behind all submitted work.
    pub fn signal(&self, value: u64) {
        let completed = Arc::clone(&self.completed);
        self.queue.on_submitted_work_done(move || {
            completed.fetch_max(value, Ordering::Release);
        });
    }

    /// Highest value the device has completed.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Blocks until `value` completes.
    ///
    /// Each poll drives the device's callback queue; the loop exits only
    /// once the signal callback for `value` (or a later one) has fired.
    pub fn wait(&self, value: u64) -> Result<()> {
        while self.completed() < value {
            self.device
                .poll(wgpu::PollType::wait_indefinitely())
                .context("device poll failed while waiting on the fence")?;
        }
        Ok(())
    }
}
