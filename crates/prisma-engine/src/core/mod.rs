//! Application contract.
//!
//! The scene layer implements [`App`]; the window runtime drives it. GPU
//! resource construction happens in `on_gpu_ready`, once, before the first
//! frame; per-frame work happens in `on_frame` through a [`FrameCtx`].

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::FrameCtx;
