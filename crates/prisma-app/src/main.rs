use anyhow::Result;
use winit::dpi::LogicalSize;

use prisma_engine::logging;
use prisma_engine::window::{Runtime, RuntimeConfig};

mod composite;
mod crystal;
mod particles;
mod text_scroll;
mod view;

use view::{SceneApp, SceneConfig};

fn main() -> Result<()> {
    logging::init(None);

    let mut config = SceneConfig::default();
    if let Some(path) = std::env::args().nth(1) {
        config.logo_path = path.into();
    }

    log::info!("prisma starting; logo: {}", config.logo_path.display());

    Runtime::run(
        RuntimeConfig {
            title: "prisma".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
        },
        SceneApp::new(config),
    )
}
