//! Forward shading pass.
//!
//! Re-renders the chunk geometry with its own depth buffer and lights each
//! fragment from the atlas colour, the global ambient shade, the scene light
//! and the blurred occlusion estimate. Writes the lit image into an
//! intermediate target the sky and present passes composite from.

use crate::data_structures::mesh::Mesh;
use crate::data_structures::texture::{Texture, TextureSlot};
use crate::data_structures::world::World;
use crate::pipelines::gbuffer::COLOR_FORMAT;
use crate::render_data::RenderData;

/// The lit intermediate image and its depth buffer, recreated on resize.
#[derive(Debug)]
pub struct ForwardTargets {
    pub output: Texture,
    pub depth: Texture,
}

impl ForwardTargets {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            output: Texture::render_buffer(device, width, height, COLOR_FORMAT, "Forward Output"),
            depth: Texture::depth_buffer(device, width, height, "Forward Depth"),
        }
    }

    fn destroy(&self) {
        self.output.destroy();
        self.depth.destroy();
    }
}

pub struct ForwardPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    targets: Option<ForwardTargets>,
    // The blurred occlusion view of the current size, refreshed on resize.
    occlusion_view: Option<wgpu::TextureView>,
    // One cached bind group per model pool slot, cleared on resize.
    bind_groups: Vec<wgpu::BindGroup>,
}

impl ForwardPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = mk_bind_group_layout(device);
        let pipeline = mk_pipeline(device, &bind_group_layout);
        Self {
            pipeline,
            bind_group_layout,
            targets: None,
            occlusion_view: None,
            bind_groups: Vec::new(),
        }
    }

    pub fn targets(&self) -> Option<&ForwardTargets> {
        self.targets.as_ref()
    }

    /// Recreate the targets, adopt the freshly sized occlusion view and drop
    /// every cached bind group so nothing references the old views.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        width: u32,
        height: u32,
        occlusion_view: &wgpu::TextureView,
    ) -> &ForwardTargets {
        if let Some(old) = self.targets.take() {
            old.destroy();
        }
        self.occlusion_view = Some(occlusion_view.clone());
        self.bind_groups.clear();
        self.targets.insert(ForwardTargets::new(device, width, height))
    }

    fn ensure_bind_group(
        &mut self,
        device: &wgpu::Device,
        render_data: &mut RenderData,
        sampler: &wgpu::Sampler,
        atlas: &Texture,
        occlusion_view: &wgpu::TextureView,
        slot: usize,
    ) {
        while self.bind_groups.len() <= slot {
            let index = self.bind_groups.len();
            let model_buffer = render_data.model_buffer(index).clone();
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("Forward Bind Group {index}")),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: render_data.view_uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: render_data.light_uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: model_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 3,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 4,
                        resource: wgpu::BindingResource::TextureView(&atlas.view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 5,
                        resource: wgpu::BindingResource::TextureView(occlusion_view),
                    },
                ],
            });
            self.bind_groups.push(bind_group);
        }
    }

    /// Record the shading pass. Clears to the fog colour so unwritten pixels
    /// carry a defined background until the sky pass replaces them.
    pub fn render(
        &mut self,
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        render_data: &mut RenderData,
        sampler: &wgpu::Sampler,
        atlas: &TextureSlot,
        world: &World,
    ) {
        if self.targets.is_none() || self.occlusion_view.is_none() {
            log::warn!("forward pass rendered before first resize");
            return;
        }
        if let (Some(atlas), Some(occlusion_view)) =
            (atlas.ready(), self.occlusion_view.clone())
        {
            for (slot, _) in world.renderable() {
                self.ensure_bind_group(device, render_data, sampler, atlas, &occlusion_view, slot);
            }
        }
        let Some(targets) = self.targets.as_ref() else {
            return;
        };

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Forward Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &targets.output.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color {
                        r: 0.1,
                        g: 0.1,
                        b: 0.2,
                        a: 1.0,
                    }),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
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
            log::debug!("atlas still loading, forward draws skipped");
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
    let uniform = |binding, visibility| wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Forward Bind Group Layout"),
        entries: &[
            uniform(0, wgpu::ShaderStages::VERTEX),
            uniform(1, wgpu::ShaderStages::VERTEX_FRAGMENT),
            uniform(2, wgpu::ShaderStages::VERTEX),
            wgpu::BindGroupLayoutEntry {
                binding: 3,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 4,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 5,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: false },
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
        label: Some("Forward Shader"),
        source: wgpu::ShaderSource::Wgsl(include_str!("forward.wgsl").into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("Forward Pipeline Layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("Forward Pipeline"),
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
            targets: &[Some(wgpu::ColorTargetState {
                format: COLOR_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
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
