//! GPU device + surface lifecycle for the one window the scene draws to.
//!
//! The pipeline is a fixed set of passes with ordinary requirements, so
//! there is nothing to configure here: [`Gpu::new`] makes the choices (FIFO
//! presentation, an sRGB surface when available, default limits) and the
//! frame loop drives [`Gpu::acquire`] / [`Gpu::present`]. Acquisition folds
//! surface-error handling into its result: a frame is either ready, skipped
//! this tick, or the device is gone and the run ends.

mod gpu;

pub use gpu::{Frame, FrameAcquire, Gpu};
