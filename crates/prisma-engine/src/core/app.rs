use anyhow::Result;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;

use crate::device::Gpu;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by the scene layer.
pub trait App {
    /// Called once, after the window and GPU device exist and before the
    /// first frame is drawn.
    ///
    /// This is where blocking startup work belongs (asset loads, pipeline and
    /// render-target construction). Returning an error aborts startup; the
    /// runtime logs it and exits without drawing a frame.
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> Result<()>;

    /// Called for window events the runtime does not consume itself.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called after the surface has been reconfigured for a new size.
    ///
    /// Implementations must recompute camera aspect ratios and resize their
    /// offscreen render targets here, before the next frame's passes execute.
    fn on_resize(&mut self, gpu: &Gpu<'_>, new_size: PhysicalSize<u32>) {
        let _ = (gpu, new_size);
    }

    /// Called once per rendered frame.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
