//! Window runtime.
//!
//! Owns the winit event loop and the single window + GPU entry, and drives
//! the application's frame loop.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig};
