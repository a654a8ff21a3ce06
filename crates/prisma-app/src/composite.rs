//! Final composite pass.
//!
//! A single clip-space triangle (no quad, so no diagonal seam) whose fragment
//! shader combines the text backdrop, both crystal targets, and the particle
//! target, then applies a logo-driven per-channel refraction distortion
//! confined to the logo's alpha coverage.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

/// Per-frame scalar inputs of the composite shader.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct CompositeParams {
    resolution: [f32; 2],
    time: f32,
    _pad: f32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct TriVertex {
    position: [f32; 2],
}

impl TriVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<TriVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// Triangle in clip-space coordinates, overhanging the viewport.
const TRI_VERTICES: [TriVertex; 3] = [
    TriVertex { position: [-1.0, -1.0] },
    TriVertex { position: [3.0, -1.0] },
    TriVertex { position: [-1.0, 3.0] },
];

/// Texture inputs the composite samples. All of them must have been rendered
/// (or uploaded) earlier in the same frame.
pub struct CompositeInputs<'a> {
    pub particles: &'a wgpu::TextureView,
    pub edges: &'a wgpu::TextureView,
    pub normals: &'a wgpu::TextureView,
    pub backdrop: &'a wgpu::TextureView,
    pub logo: &'a wgpu::TextureView,
}

pub struct CompositePass {
    pipeline: wgpu::RenderPipeline,
    bgl: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    params_ubo: wgpu::Buffer,
    vbo: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl CompositePass {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        inputs: CompositeInputs<'_>,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("prisma composite shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/composite.wgsl").into()),
        });

        let texture_entry = |binding: u32| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        };

        let bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("prisma composite bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: Some(
                            std::num::NonZeroU64::new(
                                std::mem::size_of::<CompositeParams>() as u64
                            )
                            .expect("CompositeParams has non-zero size by construction"),
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
                texture_entry(2),
                texture_entry(3),
                texture_entry(4),
                texture_entry(5),
                texture_entry(6),
            ],
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("prisma composite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let params_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("prisma composite params ubo"),
            size: std::mem::size_of::<CompositeParams>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let vbo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("prisma composite tri vbo"),
            contents: bytemuck::cast_slice(&TRI_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("prisma composite pipeline layout"),
            bind_group_layouts: &[&bgl],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("prisma composite pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[TriVertex::layout()],
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });

        let bind_group = create_bind_group(device, &bgl, &sampler, &params_ubo, &inputs);

        Self {
            pipeline,
            bgl,
            sampler,
            params_ubo,
            vbo,
            bind_group,
        }
    }

    /// Rebuilds the texture bindings after the offscreen targets were
    /// recreated (viewport resize).
    pub fn rebind(&mut self, device: &wgpu::Device, inputs: CompositeInputs<'_>) {
        self.bind_group =
            create_bind_group(device, &self.bgl, &self.sampler, &self.params_ubo, &inputs);
    }

    /// Writes the per-frame scalar uniforms (resolution + elapsed time).
    pub fn update(&self, queue: &wgpu::Queue, resolution: [f32; 2], time: f32) {
        let params = CompositeParams {
            resolution: [resolution[0].max(1.0), resolution[1].max(1.0)],
            time,
            _pad: 0.0,
        };
        queue.write_buffer(&self.params_ubo, 0, bytemuck::bytes_of(&params));
    }

    /// Draws the composite onto `color_view` (the surface).
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder, color_view: &wgpu::TextureView) {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("prisma composite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(0, self.vbo.slice(..));
        rpass.draw(0..TRI_VERTICES.len() as u32, 0..1);
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    bgl: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    params_ubo: &wgpu::Buffer,
    inputs: &CompositeInputs<'_>,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("prisma composite bind group"),
        layout: bgl,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: params_ubo.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::TextureView(inputs.particles),
            },
            wgpu::BindGroupEntry {
                binding: 3,
                resource: wgpu::BindingResource::TextureView(inputs.edges),
            },
            wgpu::BindGroupEntry {
                binding: 4,
                resource: wgpu::BindingResource::TextureView(inputs.normals),
            },
            wgpu::BindGroupEntry {
                binding: 5,
                resource: wgpu::BindingResource::TextureView(inputs.backdrop),
            },
            wgpu::BindGroupEntry {
                binding: 6,
                resource: wgpu::BindingResource::TextureView(inputs.logo),
            },
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_struct_matches_wgsl_layout() {
        // vec2 + f32 + pad = 16 bytes, the uniform block size naga expects.
        assert_eq!(std::mem::size_of::<CompositeParams>(), 16);
    }

    #[test]
    fn triangle_covers_clip_space() {
        // The three corners span [-1, 3] on both axes: every point of the
        // [-1, 1] viewport lies strictly inside the triangle.
        let [a, b, c] = TRI_VERTICES.map(|v| v.position);
        assert_eq!(a, [-1.0, -1.0]);
        assert_eq!(b, [3.0, -1.0]);
        assert_eq!(c, [-1.0, 3.0]);
    }
}
