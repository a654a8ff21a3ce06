//! Logger setup.
//!
//! Everything logs through the `log` facade; `env_logger` is the backend.
//! The default filter keeps the scene crates at info while silencing the GPU
//! stack's per-frame chatter, which otherwise drowns the lines that matter.

use std::sync::Once;

/// Filter applied when neither an explicit override nor `RUST_LOG` is set.
const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are no-ops.
///
/// Filter precedence: `override_filter`, then `RUST_LOG`, then
/// [`DEFAULT_FILTER`]. Intended usage is first thing in `main`.
pub fn init(override_filter: Option<&str>) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = override_filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.parse_filters(DEFAULT_FILTER);
        }

        // Frame-loop debugging needs sub-second timestamps.
        builder.format_timestamp_millis();
        builder.init();

        log::debug!("logging initialized");
    });
}
