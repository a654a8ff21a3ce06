//! Frame orchestrator.
//!
//! Owns every scene component and sequences the per-frame update/draw order:
//! advance all state, render the particle target, the crystal edge target,
//! the crystal normal target, then composite everything onto the surface.
//! The ordering is the only mechanism enforcing that a target is rendered
//! before the pass that samples it — keep it strictly sequential.

use std::path::PathBuf;

use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use prisma_engine::core::{App, AppControl, FrameCtx};
use prisma_engine::device::Gpu;
use prisma_engine::render::{RenderCtx, RenderTarget, Texture};
use prisma_engine::text::TextFont;

use crate::composite::{CompositeInputs, CompositePass};
use crate::crystal::Crystal;
use crate::particles::ParticleField;
use crate::text_scroll::{ScrollConfig, TextScroll};

/// Step applied per arrow-key press, stands in for the external panel's
/// slider granularity.
const EDGE_THICKNESS_STEP: f32 = 0.25;

/// Startup configuration for the scene.
#[derive(Debug, Clone)]
pub struct SceneConfig {
    pub particle_count: usize,
    pub edge_thickness: f32,
    pub scroll: ScrollConfig,
    /// Logo image path; loaded before the first frame, failure is fatal.
    pub logo_path: PathBuf,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            particle_count: 100,
            edge_thickness: 3.0,
            scroll: ScrollConfig::default(),
            logo_path: PathBuf::from("assets/logo.png"),
        }
    }
}

/// All constructed scene state. Exists only after `on_gpu_ready` succeeded.
struct SceneView {
    particles: ParticleField,
    crystal: Crystal,
    text: TextScroll,
    composite: CompositePass,
    logo: Texture,
}

impl SceneView {
    fn advance(&mut self, dt: f32) {
        self.crystal.advance(dt);
        self.particles.advance(dt);
        self.text.advance(dt);
    }

    fn draw(&mut self, rctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, elapsed: f32) {
        // The text surface has no upstream target dependency; it uploads
        // before the GPU work is submitted and is consumed by the composite.
        self.text.draw(rctx.queue);

        // Offscreen passes, in dependency order, on the shared encoder.
        self.particles.render(rctx.queue, target.encoder);
        self.crystal.render_edges(rctx.queue, target.encoder);
        self.crystal.render_normals(rctx.queue, target.encoder);

        // Scalar inputs refresh once per frame, then the composite samples
        // everything rendered above.
        self.composite.update(
            rctx.queue,
            [rctx.size.width as f32, rctx.size.height as f32],
            elapsed,
        );
        self.composite.render(target.encoder, target.color_view);
    }

    fn resize(&mut self, device: &wgpu::Device, new_size: PhysicalSize<u32>) {
        self.particles.resize(device, new_size);
        self.crystal.resize(device, new_size);
        self.text.resize(device, new_size);

        // The targets were recreated; the composite must sample the new ones.
        self.composite.rebind(
            device,
            CompositeInputs {
                particles: self.particles.color_view(),
                edges: self.crystal.edges_view(),
                normals: self.crystal.normals_view(),
                backdrop: self.text.view(),
                logo: self.logo.view(),
            },
        );
    }
}

/// The application: configuration plus the (post-startup) scene view.
pub struct SceneApp {
    config: SceneConfig,
    view: Option<SceneView>,
}

impl SceneApp {
    pub fn new(config: SceneConfig) -> Self {
        Self { config, view: None }
    }

    /// External parameter interface: pushes a new edge thickness into the
    /// crystal's edge material. Values are clamped to [0, 10]; the uniform is
    /// rewritten before the next edge pass draws.
    pub fn set_edge_thickness(&mut self, value: f32) {
        if let Some(view) = self.view.as_mut() {
            view.crystal.set_edge_thickness(value);
        }
    }

    fn nudge_edge_thickness(&mut self, delta: f32) {
        let Some(current) = self.view.as_ref().map(|v| v.crystal.edge_thickness()) else {
            return;
        };
        self.set_edge_thickness(current + delta);
        if let Some(view) = self.view.as_ref() {
            log::debug!("edge thickness: {:.2}", view.crystal.edge_thickness());
        }
    }
}

impl App for SceneApp {
    fn on_gpu_ready(&mut self, gpu: &Gpu<'_>) -> Result<()> {
        let device = gpu.device();
        let queue = gpu.queue();
        let size = gpu.size();

        // The logo load resolves first: the composite depends on it, and a
        // failure here must abort startup before any dependent construction.
        let logo = Texture::from_path(device, queue, &self.config.logo_path)
            .context("logo texture did not load; refusing to start")?;

        let font = TextFont::from_system().context("scrolling backdrop needs a font")?;

        let mut rng = rand::thread_rng();
        let particles = ParticleField::new(device, size, self.config.particle_count, &mut rng);
        let crystal = Crystal::new(device, size, self.config.edge_thickness, &mut rng);
        let text = TextScroll::new(device, font, size, self.config.scroll.clone());

        let composite = CompositePass::new(
            device,
            gpu.surface_format(),
            CompositeInputs {
                particles: particles.color_view(),
                edges: crystal.edges_view(),
                normals: crystal.normals_view(),
                backdrop: text.view(),
                logo: logo.view(),
            },
        );

        log::info!(
            "scene ready: {} particles, {} text lines, {}x{}",
            particles.particle_count(),
            text.line_count(),
            size.width,
            size.height
        );

        self.view = Some(SceneView {
            particles,
            crystal,
            text,
            composite,
            logo,
        });
        Ok(())
    }

    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if event.state == ElementState::Pressed {
                match event.physical_key {
                    PhysicalKey::Code(KeyCode::ArrowUp) => {
                        self.nudge_edge_thickness(EDGE_THICKNESS_STEP)
                    }
                    PhysicalKey::Code(KeyCode::ArrowDown) => {
                        self.nudge_edge_thickness(-EDGE_THICKNESS_STEP)
                    }
                    PhysicalKey::Code(KeyCode::Escape) => return AppControl::Exit,
                    _ => {}
                }
            }
        }
        AppControl::Continue
    }

    fn on_resize(&mut self, gpu: &Gpu<'_>, new_size: PhysicalSize<u32>) {
        if let Some(view) = self.view.as_mut() {
            view.resize(gpu.device(), new_size);
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let Some(view) = self.view.as_mut() else {
            return AppControl::Continue;
        };

        let time = ctx.time;
        view.advance(time.dt);

        ctx.render(wgpu::Color::BLACK, |rctx, target| {
            view.draw(rctx, target, time.elapsed);
        })
    }
}
