use anyhow::{Context, Result};
use winit::dpi::PhysicalSize;
use winit::window::Window;

/// Owns the wgpu device, queue, and the window surface.
///
/// The surface borrows the window (`'w`); the runtime keeps the window alive
/// for as long as this exists. Unlike a general-purpose renderer there is no
/// init configuration: every requirement of the pipeline is fixed, so the
/// constructor simply encodes them.
pub struct Gpu<'w> {
    surface: wgpu::Surface<'w>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,

    /// False while the window reports a zero dimension (minimized). The
    /// surface is left unconfigured and frames are skipped until a real
    /// size arrives.
    drawable: bool,
}

/// One acquired frame: the surface view plus the encoder every pass of the
/// frame records into. Short-lived; hand it back via [`Gpu::present`].
pub struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}

/// Outcome of [`Gpu::acquire`].
///
/// There is no partial-frame path: a frame either runs to completion or is
/// never started.
pub enum FrameAcquire {
    /// A frame is ready to record.
    Ready(Frame),
    /// Nothing to draw this tick (minimized, stale swapchain just rebuilt,
    /// or a transient acquisition failure). Try again next tick.
    Skip,
    /// The device is unusable (out of memory). Shut down.
    Fatal,
}

impl<'w> Gpu<'w> {
    /// Creates the device and binds the surface to `window`.
    ///
    /// Adapter/device acquisition is asynchronous under wgpu; the runtime
    /// blocks on this once at startup.
    pub async fn new(window: &'w Window) -> Result<Self> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance
            .create_surface(window)
            .context("failed to create wgpu surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to find a suitable GPU adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("prisma device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create wgpu device/queue")?;

        let caps = surface.get_capabilities(&adapter);
        // sRGB keeps the composite's output colors correct; fall back to
        // whatever the surface offers first.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .context("surface reports no formats")?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let drawable = size.width > 0 && size.height > 0;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            // FIFO ties the frame loop to display refresh: one logical tick
            // per presented frame.
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        if drawable {
            surface.configure(&device, &config);
        }

        Ok(Self {
            surface,
            device,
            queue,
            config,
            drawable,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// The last drawable size, in physical pixels. While minimized this
    /// keeps reporting the previous real size, which is what offscreen
    /// target allocation wants.
    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }

    /// Applies a viewport resize.
    ///
    /// A zero dimension cannot be configured; the surface goes dormant and
    /// frames are skipped until a real size arrives.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            self.drawable = false;
            return;
        }

        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.drawable = true;
    }

    /// Acquires the next frame, mapping surface errors to what the frame
    /// loop should do about them.
    pub fn acquire(&mut self) -> FrameAcquire {
        if !self.drawable {
            return FrameAcquire::Skip;
        }

        let surface_texture = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // Stale swapchain; rebuild it and draw on the next tick.
                self.surface.configure(&self.device, &self.config);
                return FrameAcquire::Skip;
            }
            Err(wgpu::SurfaceError::Timeout | wgpu::SurfaceError::Other) => {
                return FrameAcquire::Skip;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return FrameAcquire::Fatal,
        };

        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("prisma frame encoder"),
            });

        FrameAcquire::Ready(Frame {
            surface_texture,
            view,
            encoder,
        })
    }

    /// Submits the frame's commands and presents it.
    pub fn present(&self, frame: Frame) {
        let Frame {
            surface_texture,
            view,
            encoder,
        } = frame;

        self.queue.submit(std::iter::once(encoder.finish()));
        drop(view);
        surface_texture.present();
    }
}
