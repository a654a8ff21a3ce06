//! Dual-pass crystal: one perturbed plane rendered twice, into two separate
//! targets, with two materials — barycentric edge highlighting and surface
//! normal visualization — for later combination by the composite pass.

use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Vec3};
use rand::Rng;
use winit::dpi::PhysicalSize;

use prisma_engine::render::{OffscreenTarget, COLOR_FORMAT, DEPTH_FORMAT};
use prisma_engine::scene::{Camera, Geometry, PlaneGrid};
use wgpu::util::DeviceExt;

const PLANE_WIDTH: f32 = 15.0;
const PLANE_HEIGHT: f32 = 10.0;
const PLANE_SEGMENTS: u32 = 4;
const PERTURB_AMOUNT: f32 = 1.5;

const MESH_Z_OFFSET: f32 = 8.0;
const ROTATION_RATE: f32 = 0.3; // rad/s on both y and z

const CAMERA_FOV_DEGREES: f32 = 50.0;
const CAMERA_Z: f32 = 30.0;

pub const EDGE_THICKNESS_MIN: f32 = 0.0;
pub const EDGE_THICKNESS_MAX: f32 = 10.0;

/// Pure animation/material state, kept apart from the GPU resources so the
/// advance/clamp behavior is directly testable.
#[derive(Debug, Clone)]
struct CrystalState {
    rotation_edges: Vec3,
    rotation_normals: Vec3,
    edge_thickness: f32,
}

impl CrystalState {
    fn new(edge_thickness: f32) -> Self {
        Self {
            rotation_edges: Vec3::ZERO,
            rotation_normals: Vec3::ZERO,
            edge_thickness: edge_thickness.clamp(EDGE_THICKNESS_MIN, EDGE_THICKNESS_MAX),
        }
    }

    /// Rotates both meshes' y/z by the same delta. The two rotations are
    /// retained independently but never diverge.
    fn advance(&mut self, dt: f32) {
        let delta = ROTATION_RATE * dt;
        self.rotation_edges.y += delta;
        self.rotation_edges.z += delta;
        self.rotation_normals.y += delta;
        self.rotation_normals.z += delta;
    }

    fn set_edge_thickness(&mut self, value: f32) {
        self.edge_thickness = value.clamp(EDGE_THICKNESS_MIN, EDGE_THICKNESS_MAX);
    }
}

fn model_matrix(rotation: Vec3) -> Mat4 {
    Mat4::from_translation(Vec3::new(0.0, 0.0, MESH_Z_OFFSET))
        * Mat4::from_euler(EulerRot::XYZ, rotation.x, rotation.y, rotation.z)
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct EdgeVertex {
    position: [f32; 3],
    barycentric: [f32; 3],
}

impl EdgeVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3  // barycentric
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<EdgeVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct NormalVertex {
    position: [f32; 3],
    normal: [f32; 3],
}

impl NormalVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3  // normal
    ];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<NormalVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct EdgeUniform {
    mvp: [[f32; 4]; 4],
    edge_thickness: f32,
    _pad: [f32; 3],
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct NormalsUniform {
    mvp: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
}

/// One material pass worth of GPU resources.
struct CrystalPass {
    target: OffscreenTarget,
    camera: Camera,
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    ubo: wgpu::Buffer,
    vbo: wgpu::Buffer,
    vertex_count: u32,
}

impl CrystalPass {
    #[allow(clippy::too_many_arguments)]
    fn new(
        device: &wgpu::Device,
        label: &'static str,
        size: PhysicalSize<u32>,
        shader_src: &str,
        vertex_layout: wgpu::VertexBufferLayout<'static>,
        vertex_data: &[u8],
        vertex_count: u32,
        ubo_size: u64,
    ) -> Self {
        let target = OffscreenTarget::new(device, label, size, true);

        let mut camera = Camera::perspective(
            CAMERA_FOV_DEGREES,
            size.width.max(1) as f32 / size.height.max(1) as f32,
            0.01,
            100.0,
        );
        camera.position = Vec3::new(0.0, 0.0, CAMERA_Z);

        let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: vertex_data,
            usage: wgpu::BufferUsages::VERTEX,
        });

        let ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: ubo_size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(label),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(label),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: std::num::NonZeroU64::new(ubo_size),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[vertex_layout],
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
                // Both crystal materials are double-sided; the perturbed
                // plane shows its back faces while rotating.
                cull_mode: None,
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
            target,
            camera,
            pipeline,
            bind_group,
            ubo,
            vbo,
            vertex_count,
        }
    }

    fn encode(&self, encoder: &mut wgpu::CommandEncoder, label: &'static str) {
        let depth_view = self
            .target
            .depth_view()
            .expect("crystal targets are created with a depth buffer");

        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(label),
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

        if self.vertex_count == 0 {
            return;
        }

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vbo.slice(..));
        rpass.draw(0..self.vertex_count, 0..1);
    }

    fn resize(&mut self, device: &wgpu::Device, new_size: PhysicalSize<u32>) {
        self.target.resize(device, new_size);
        self.camera
            .set_aspect(new_size.width.max(1) as f32 / new_size.height.max(1) as f32);
    }
}

/// The dual-pass object.
pub struct Crystal {
    state: CrystalState,
    edges: CrystalPass,
    normals: CrystalPass,
}

impl Crystal {
    /// Builds the perturbed geometry once and derives both meshes' vertex
    /// buffers from it before any per-pass state diverges; afterwards each
    /// pass owns its buffers outright — nothing is aliased between them.
    pub fn new<R: Rng>(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        edge_thickness: f32,
        rng: &mut R,
    ) -> Self {
        let mut grid = PlaneGrid::new(PLANE_WIDTH, PLANE_HEIGHT, PLANE_SEGMENTS, PLANE_SEGMENTS);
        grid.perturb(rng, PERTURB_AMOUNT);
        let geometry = grid.triangulate();
        let markers = Geometry::barycentric_markers(geometry.vertex_count());

        let edge_vertices: Vec<EdgeVertex> = geometry
            .positions
            .iter()
            .zip(&markers)
            .map(|(p, m)| EdgeVertex {
                position: p.to_array(),
                barycentric: *m,
            })
            .collect();

        let normal_vertices: Vec<NormalVertex> = geometry
            .positions
            .iter()
            .zip(&geometry.normals)
            .map(|(p, n)| NormalVertex {
                position: p.to_array(),
                normal: n.to_array(),
            })
            .collect();

        let vertex_count = geometry.vertex_count() as u32;

        let edges = CrystalPass::new(
            device,
            "prisma crystal edges",
            size,
            include_str!("shaders/crystal_edges.wgsl"),
            EdgeVertex::layout(),
            bytemuck::cast_slice(&edge_vertices),
            vertex_count,
            std::mem::size_of::<EdgeUniform>() as u64,
        );

        let normals = CrystalPass::new(
            device,
            "prisma crystal normals",
            size,
            include_str!("shaders/crystal_normals.wgsl"),
            NormalVertex::layout(),
            bytemuck::cast_slice(&normal_vertices),
            vertex_count,
            std::mem::size_of::<NormalsUniform>() as u64,
        );

        Self {
            state: CrystalState::new(edge_thickness),
            edges,
            normals,
        }
    }

    /// Rotates both meshes by the same y/z delta. Orchestrator-only.
    pub fn advance(&mut self, dt: f32) {
        self.state.advance(dt);
    }

    /// Updates the edge material's thickness uniform, clamped to [0, 10].
    /// The new value is written before the next edge pass draws.
    pub fn set_edge_thickness(&mut self, value: f32) {
        self.state.set_edge_thickness(value);
    }

    pub fn edge_thickness(&self) -> f32 {
        self.state.edge_thickness
    }

    /// Renders the edge-highlight mesh into its own target.
    pub fn render_edges(&self, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder) {
        let mvp = self.edges.camera.view_projection_matrix() * model_matrix(self.state.rotation_edges);
        let uniform = EdgeUniform {
            mvp: mvp.to_cols_array_2d(),
            edge_thickness: self.state.edge_thickness,
            _pad: [0.0; 3],
        };
        queue.write_buffer(&self.edges.ubo, 0, bytemuck::bytes_of(&uniform));

        self.edges.encode(encoder, "prisma crystal edges pass");
    }

    /// Renders the normal-visualization mesh into its own target.
    pub fn render_normals(&self, queue: &wgpu::Queue, encoder: &mut wgpu::CommandEncoder) {
        let model = model_matrix(self.state.rotation_normals);
        let uniform = NormalsUniform {
            mvp: (self.normals.camera.view_projection_matrix() * model).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
        };
        queue.write_buffer(&self.normals.ubo, 0, bytemuck::bytes_of(&uniform));

        self.normals.encode(encoder, "prisma crystal normals pass");
    }

    pub fn resize(&mut self, device: &wgpu::Device, new_size: PhysicalSize<u32>) {
        self.edges.resize(device, new_size);
        self.normals.resize(device, new_size);
    }

    pub fn edges_view(&self) -> &wgpu::TextureView {
        self.edges.target.color_view()
    }

    pub fn normals_view(&self) -> &wgpu::TextureView {
        self.normals.target.color_view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_meshes_rotate_by_the_same_delta() {
        let mut state = CrystalState::new(3.0);
        for _ in 0..100 {
            state.advance(1.0 / 60.0);
        }
        assert_eq!(state.rotation_edges, state.rotation_normals);
        assert!(state.rotation_edges.y > 0.0);
        assert_eq!(state.rotation_edges.y, state.rotation_edges.z);
        assert_eq!(state.rotation_edges.x, 0.0);
    }

    #[test]
    fn edge_thickness_is_clamped_to_range() {
        let mut state = CrystalState::new(3.0);

        state.set_edge_thickness(5.5);
        assert_eq!(state.edge_thickness, 5.5);

        state.set_edge_thickness(-1.0);
        assert_eq!(state.edge_thickness, EDGE_THICKNESS_MIN);

        state.set_edge_thickness(42.0);
        assert_eq!(state.edge_thickness, EDGE_THICKNESS_MAX);
    }

    #[test]
    fn initial_thickness_is_clamped_too() {
        assert_eq!(CrystalState::new(99.0).edge_thickness, EDGE_THICKNESS_MAX);
    }

    #[test]
    fn uniform_structs_match_wgsl_layout() {
        // std140: mat4 (64) + f32 + 12 pad; mat4 + mat4.
        assert_eq!(std::mem::size_of::<EdgeUniform>(), 80);
        assert_eq!(std::mem::size_of::<NormalsUniform>(), 128);
    }

    #[test]
    fn model_matrix_applies_depth_offset() {
        let m = model_matrix(Vec3::ZERO);
        let p = m.transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(0.0, 0.0, MESH_Z_OFFSET));
    }
}
