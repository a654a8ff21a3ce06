//! CPU text rasterization.
//!
//! The scrolling backdrop is drawn on a CPU raster surface and uploaded as a
//! texture each frame, the way a 2D canvas backs a texture. Glyphs rasterize
//! through fontdue once per (glyph, size) and blit from cache afterwards.

mod raster;

pub use raster::{RasterCanvas, TextFont};
