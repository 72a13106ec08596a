//! Geometry pass filling the G-buffer.
//!
//! Renders every renderable chunk into four screen-sized targets: shaded
//! albedo, view-space position, view-space normal and depth. The position and
//! normal targets feed the occlusion estimate; the normal target's alpha
//! channel doubles as the background flag (0 where no geometry was drawn).

use crate::data_structures::mesh::Mesh;
use crate::data_structures::texture::{Texture, TextureSlot};
use crate::data_structures::world::World;
use crate::render_data::RenderData;

pub const COLOR_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;
pub const GEOMETRY_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// The screen-sized targets of the geometry pass, recreated on resize.
#[derive(Debug)]
pub struct GBufferTargets {
    pub color: Texture,
    pub position: Texture,
    pub normal: Texture,
    pub depth: Texture,
}

impl GBufferTargets {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            color: Texture::render_buffer(device, width, height, COLOR_FORMAT, "GBuffer Color"),
            position: Texture::render_buffer(
                device,
                width,
                height,
                GEOMETRY_FORMAT,
                "GBuffer Position",
            ),
            normal: Texture::render_buffer(
                device,
                width,
                height,
                GEOMETRY_FORMAT,
                "GBuffer Normal",
            ),
            depth: Texture::depth_buffer(device, width, height, "GBuffer Depth"),
        }
    }

    fn destroy(&self) {
        self.color.destroy();
        self.position.destroy();
        self.normal.destroy();
        self.depth.destroy();
    }
}

pub struct GBufferPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    targets: Option<GBufferTargets>,
    // One cached bind group per model pool slot, cleared on resize.
    bind_groups: Vec<wgpu::BindGroup>,
}

impl GBufferPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = mk_bind_group_layout(device);
        let pipeline = mk_pipeline(device, &bind_group_layout);
        Self {
            pipeline,
            bind_group_layout,
            targets: None,
            bind_groups: Vec::new(),
        }
    }

    pub fn targets(&self) -> Option<&GBufferTargets> {
        self.targets.as_ref()
    }

    /// Recreate all four targets at the new size, destroying the old ones
    /// first, and drop every cached bind group.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> &GBufferTargets {
        if let Some(old) = self.targets.take() {
            old.destroy();
        }
        self.bind_groups.clear();
        self.targets.insert(GBufferTargets::new(device, width, height))
    }

    fn ensure_bind_group(
        &mut self,
        device: &wgpu::Device,
        render_data: &mut RenderData,
        sampler: &wgpu::Sampler,
        atlas: &Texture,
        slot: usize,
    ) {
        while self.bind_groups.len() <= slot {
            let index = self.bind_groups.len();
            let model_buffer = render_data.model_buffer(index).clone();
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("GBuffer Bind Group {index}")),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: render_data.view_uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: model_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::TextureView(&atlas.view),
                    },
                ],
            });
            self.bind_groups.push(bind_group);
        }
    }

    /// Record the geometry pass. All targets are cleared even when the atlas
    /// is still pending or the world is empty, so downstream passes always
    /// read a defined background.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        render_data: &mut RenderData,
        sampler: &wgpu::Sampler,
        atlas: &TextureSlot,
        world: &World,
    ) {
        if self.targets.is_none() {
            log::warn!("gbuffer pass rendered before first resize");
            return;
        }
        if let Some(atlas) = atlas.ready() {
            for (slot, _) in world.renderable() {
                self.ensure_bind_group(device, render_data, sampler, atlas, slot);
            }
        }
        let Some(targets) = self.targets.as_ref() else {
            return;
        };

        let clear = |view| {
            Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })
        };
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("GBuffer Pass"),
            color_attachments: &[
                clear(&targets.color.view),
                clear(&targets.position.view),
                clear(&targets.normal.view),
            ],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &targets.depth.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        if !atlas.is_ready() {
            log::debug!("atlas still loading, gbuffer draws skipped");
            return;
        }
        pass.set_pipeline(&self.pipeline);
        for (slot, chunk) in world.renderable() {
            let Some(mesh) = chunk.mesh.as_ref() else {
                continue;
            };
            pass.set_bind_group(0, &self.bind_groups[slot], &[]);
            mesh.bind(&mut pass);
            pass.draw_indexed(0..mesh.index_count, 0, 0..1);
        }
    }
}

fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("GBuffer Bind Group Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
        ],
    })
}

fn mk_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("GBuffer Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("gbuffer.wgsl").into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("GBuffer Pipeline Layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    let target = |format| {
        Some(wgpu::ColorTargetState {
            format,
            blend: None,
            write_mask: wgpu::ColorWrites::ALL,
        })
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("GBuffer Pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &Mesh::vertex_layouts(),
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[
                target(COLOR_FORMAT),
                target(GEOMETRY_FORMAT),
                target(GEOMETRY_FORMAT),
            ],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: Texture::DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
