//! Particle field: a fixed-count column of rising, rotating tetrahedra
//! rendered into its own offscreen target.

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Vec3};
use rand::Rng;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use prisma_engine::render::{OffscreenTarget, COLOR_FORMAT, DEPTH_FORMAT};
use prisma_engine::scene::{Camera, Geometry, PointLight};

/// Vertical wrap bounds: a particle crossing the upper bound restarts at the
/// lower bound — a one-directional looping column, not a bounce.
pub const LOWER_BOUND: f32 = -15.0;
pub const UPPER_BOUND: f32 = 15.0;

const SPAWN_X: std::ops::RangeInclusive<f32> = -30.0..=30.0;
const SPAWN_Z: std::ops::RangeInclusive<f32> = -20.0..=10.0;

// Per-second rates (the classic per-frame constants at 60 fps).
const ROTATION_RATE_MAX: f32 = 0.6;
const VERTICAL_RATE_MIN: f32 = 0.6;
const VERTICAL_RATE_MAX: f32 = 2.4;

const CAMERA_FOV_DEGREES: f32 = 50.0;
const CAMERA_Z: f32 = 30.0;

/// One particle. Identity is the array index; particles are created once and
/// wrapped, never destroyed.
#[derive(Debug, Clone)]
pub struct Particle {
    pub position: Vec3,
    pub rotation: Vec3,
    pub rotation_speed: f32,
    pub vertical_speed: f32,
}

impl Particle {
    fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_euler(
                EulerRot::XYZ,
                self.rotation.x,
                self.rotation.y,
                self.rotation.z,
            )
    }
}

fn spawn_field<R: Rng>(rng: &mut R, count: usize) -> Vec<Particle> {
    use std::f32::consts::TAU;

    (0..count)
        .map(|_| Particle {
            position: Vec3::new(
                rng.gen_range(SPAWN_X),
                rng.gen_range(LOWER_BOUND..=UPPER_BOUND),
                rng.gen_range(SPAWN_Z),
            ),
            rotation: Vec3::new(
                rng.gen_range(0.0..TAU),
                rng.gen_range(0.0..TAU),
                rng.gen_range(0.0..TAU),
            ),
            // Strictly non-negative speeds: apparent motion is always rising.
            rotation_speed: rng.gen_range(0.0..ROTATION_RATE_MAX),
            vertical_speed: rng.gen_range(VERTICAL_RATE_MIN..VERTICAL_RATE_MAX),
        })
        .collect()
}

fn advance_field(particles: &mut [Particle], dt: f32) {
    for p in particles {
        p.position.y += p.vertical_speed * dt;
        p.rotation.x += p.rotation_speed * dt;
        p.rotation.z += p.rotation_speed * dt;

        if p.position.y > UPPER_BOUND {
            p.position.y = LOWER_BOUND;
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct MeshVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3  // normal
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct ParticleInstance {
    model: [[f32; 4]; 4],
}

impl ParticleInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<ParticleInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SceneUniform {
    view_proj: [[f32; 4]; 4],
    light_pos: [f32; 3],
    light_intensity: f32,
    light_color: [f32; 3],
    _pad: f32,
}

/// The particle field pass: fixed particle array, one camera, one point
/// light, one offscreen target.
pub struct ParticleField {
    particles: Vec<Particle>,
    camera: Camera,
    light: PointLight,

    target: OffscreenTarget,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    scene_ubo: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
    instance_buffer: wgpu::Buffer,
}

impl ParticleField {
    pub fn new<R: Rng>(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        count: usize,
        rng: &mut R,
    ) -> Self {
        let particles = spawn_field(rng, count);

        let mut camera = Camera::perspective(
            CAMERA_FOV_DEGREES,
            size.width.max(1) as f32 / size.height.max(1) as f32,
            0.01,
            100.0,
        );
        camera.position = Vec3::new(0.0, 0.0, CAMERA_Z);

        let light = PointLight::default();

        let target = OffscreenTarget::new(device, "prisma particles target", size, true);

        let solid = Geometry::tetrahedron(1.0);
        let vertices: Vec<MeshVertex> = solid
            .positions
            .iter()
            .zip(&solid.normals)
            .map(|(p, n)| MeshVertex {
                position: p.to_array(),
                normal: n.to_array(),
            })
            .collect();

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("prisma particles vbo"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("prisma particles instance vbo"),
            size: (count.max(1) * std::mem::size_of::<ParticleInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let scene_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("prisma particles scene ubo"),
            size: std::mem::size_of::<SceneUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("prisma particles shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/particles.wgsl").into()),
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prisma particles bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: Some(
                        std::num::NonZeroU64::new(std::mem::size_of::<SceneUniform>() as u64)
                            .expect("SceneUniform has non-zero size by construction"),
                    ),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("prisma particles bind group"),
            layout: &bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: scene_ubo.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("prisma particles pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("prisma particles pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[MeshVertex::layout(), ParticleInstance::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: COLOR_FORMAT,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        Self {
            particles,
            camera,
            light,
            target,
            pipeline,
            bind_group,
            scene_ubo,
            vertex_buffer,
            vertex_count: vertices.len() as u32,
            instance_buffer,
        }
    }

    /// Advances every particle by `dt` seconds, then applies the edge wrap.
    pub fn advance(&mut self, dt: f32) {
        advance_field(&mut self.particles, dt);
    }

    /// Renders the field into its offscreen target.
    pub fn render(&self, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder) {
        let instances: Vec<ParticleInstance> = self
            .particles
            .iter()
            .map(|p| ParticleInstance {
                model: p.model_matrix().to_cols_array_2d(),
            })
            .collect();
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let uniform = SceneUniform {
            view_proj: self.camera.view_projection_matrix().to_cols_array_2d(),
            light_pos: self.light.position.to_array(),
            light_intensity: self.light.intensity,
            light_color: self.light.color,
            _pad: 0.0,
        };
        queue.write_buffer(&self.scene_ubo, 0, bytemuck::bytes_of(&uniform));

        let depth_view = self
            .target
            .depth_view()
            .expect("particle target is created with a depth buffer");

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("prisma particles pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: self.target.color_view(),
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: depth_view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        if instances.is_empty() {
            return;
        }

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        rpass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        rpass.draw(0..self.vertex_count, 0..instances.len() as u32);
    }

    /// Recreates the target and camera aspect for a new viewport.
    pub fn resize(&mut self, device: &wgpu::Device, new_size: PhysicalSize<u32>) {
        self.target.resize(device, new_size);
        self.camera
            .set_aspect(new_size.width.max(1) as f32 / new_size.height.max(1) as f32);
    }

    pub fn color_view(&self) -> &wgpu::TextureView {
        self.target.color_view()
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn spawned_particles_start_within_bounds() {
        let mut rng = StdRng::seed_from_u64(11);
        let field = spawn_field(&mut rng, 100);
        assert_eq!(field.len(), 100);

        for p in &field {
            assert!((-30.0..=30.0).contains(&p.position.x));
            assert!((LOWER_BOUND..=UPPER_BOUND).contains(&p.position.y));
            assert!((-20.0..=10.0).contains(&p.position.z));
            assert!(p.rotation_speed >= 0.0);
            assert!(p.vertical_speed > 0.0);
        }
    }

    #[test]
    fn vertical_position_never_escapes_bounds() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut field = spawn_field(&mut rng, 50);

        // Many ticks at a chunky dt: every post-advance position must sit
        // inside the wrap band.
        for _ in 0..2_000 {
            advance_field(&mut field, 1.0 / 30.0);
            for p in &field {
                assert!(p.position.y >= LOWER_BOUND && p.position.y <= UPPER_BOUND);
            }
        }
    }

    #[test]
    fn crossing_the_upper_bound_resets_to_the_lower_bound_once() {
        let mut field = vec![Particle {
            position: Vec3::new(0.0, UPPER_BOUND - 0.01, 0.0),
            rotation: Vec3::ZERO,
            rotation_speed: 0.0,
            vertical_speed: 1.0,
        }];

        advance_field(&mut field, 0.1);
        assert_eq!(field[0].position.y, LOWER_BOUND);

        // The next tick rises normally from the lower bound; no double reset.
        advance_field(&mut field, 0.1);
        assert!((field[0].position.y - (LOWER_BOUND + 0.1)).abs() < 1e-6);
    }

    #[test]
    fn advance_rotates_x_and_z_only() {
        let mut field = vec![Particle {
            position: Vec3::ZERO,
            rotation: Vec3::new(1.0, 2.0, 3.0),
            rotation_speed: 0.5,
            vertical_speed: 1.0,
        }];

        advance_field(&mut field, 1.0);
        let r = field[0].rotation;
        assert!((r.x - 1.5).abs() < 1e-6);
        assert_eq!(r.y, 2.0);
        assert!((r.z - 3.5).abs() < 1e-6);
    }
}
