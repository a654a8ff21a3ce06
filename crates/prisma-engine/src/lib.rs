//! Prisma engine crate.
//!
//! This crate owns the platform + GPU runtime pieces used by the scene layer:
//! device/surface management, the window runtime, frame timing, offscreen
//! render targets, scene primitives (camera, light, procedural geometry), and
//! the CPU text raster canvas.

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
pub mod render;
pub mod scene;
pub mod text;
