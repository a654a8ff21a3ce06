//! GPU rendering support.
//!
//! Passes consume a [`RenderCtx`] (device/queue/format/size) and record into a
//! [`RenderTarget`] (encoder + color view). Offscreen passes own an
//! [`OffscreenTarget`] whose color texture is sampled by later passes in the
//! same frame; the strictly sequential encoder ordering is what guarantees a
//! target is rendered before it is sampled.

mod ctx;
mod target;
mod texture;

pub use ctx::{RenderCtx, RenderTarget};
pub use target::{OffscreenTarget, COLOR_FORMAT, DEPTH_FORMAT};
pub use texture::Texture;
