//! Ambient occlusion estimate and blur.
//!
//! Two fullscreen sub-passes over the G-buffer: `ssao.wgsl` scores each pixel
//! against a fixed 16-sample hemisphere kernel, `ssao_blur.wgsl` smooths the
//! result with a depth-aware box filter. Both write `r32float` targets, which
//! are not filterable, so consumers read them with `textureLoad`.
//!
//! The parameter uniform (projection matrix plus intensity/radius/bias) is
//! written only when the parameters or the projection actually change, never
//! per frame.

use crate::camera::Camera;
use crate::data_structures::texture::Texture;
use crate::pipelines::gbuffer::GBufferTargets;

pub const AO_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::R32Float;

/// Tunable occlusion parameters.
#[derive(Clone, Copy, Debug)]
pub struct SsaoParams {
    /// Scales how strongly occlusion darkens, 0 disables the effect.
    pub intensity: f32,
    /// Hemisphere radius in view-space units.
    pub radius: f32,
    /// Depth offset rejecting self-occlusion on flat surfaces.
    pub bias: f32,
}

impl Default for SsaoParams {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            radius: 0.5,
            bias: 0.025,
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
struct SsaoUniforms {
    projection: [[f32; 4]; 4],
    intensity: f32,
    radius: f32,
    bias: f32,
    _padding: f32,
}

/// The occlusion targets, recreated on resize.
#[derive(Debug)]
pub struct SsaoTargets {
    pub raw: Texture,
    pub blurred: Texture,
}

impl SsaoTargets {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        Self {
            raw: Texture::render_buffer(device, width, height, AO_FORMAT, "SSAO Raw"),
            blurred: Texture::render_buffer(device, width, height, AO_FORMAT, "SSAO Blurred"),
        }
    }

    fn destroy(&self) {
        self.raw.destroy();
        self.blurred.destroy();
    }
}

pub struct SsaoPass {
    estimate_pipeline: wgpu::RenderPipeline,
    blur_pipeline: wgpu::RenderPipeline,
    estimate_layout: wgpu::BindGroupLayout,
    blur_layout: wgpu::BindGroupLayout,
    params_buffer: wgpu::Buffer,
    params: SsaoParams,
    targets: Option<SsaoTargets>,
    estimate_bind_group: Option<wgpu::BindGroup>,
    blur_bind_group: Option<wgpu::BindGroup>,
}

impl SsaoPass {
    pub fn new(device: &wgpu::Device) -> Self {
        let estimate_layout = mk_estimate_layout(device);
        let blur_layout = mk_blur_layout(device);
        let estimate_pipeline = mk_fullscreen_pipeline(
            device,
            &estimate_layout,
            include_str!("ssao.wgsl"),
            "SSAO Estimate",
        );
        let blur_pipeline = mk_fullscreen_pipeline(
            device,
            &blur_layout,
            include_str!("ssao_blur.wgsl"),
            "SSAO Blur",
        );
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("SSAO Params"),
            size: std::mem::size_of::<SsaoUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            estimate_pipeline,
            blur_pipeline,
            estimate_layout,
            blur_layout,
            params_buffer,
            params: SsaoParams::default(),
            targets: None,
            estimate_bind_group: None,
            blur_bind_group: None,
        }
    }

    pub fn params(&self) -> SsaoParams {
        self.params
    }

    /// Replace the tunable parameters and push the uniform.
    pub fn set_params(&mut self, queue: &wgpu::Queue, camera: &Camera, params: SsaoParams) {
        self.params = params;
        self.write_params(queue, camera);
    }

    fn write_params(&self, queue: &wgpu::Queue, camera: &Camera) {
        let uniforms = SsaoUniforms {
            projection: camera.projection().into(),
            intensity: self.params.intensity,
            radius: self.params.radius,
            bias: self.params.bias,
            _padding: 0.0,
        };
        queue.write_buffer(&self.params_buffer, 0, bytemuck::cast_slice(&[uniforms]));
    }

    /// Recreate both targets and rebuild the bind groups against the fresh
    /// G-buffer views. Also refreshes the projection in the parameter
    /// uniform, which depends on the new aspect ratio.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        width: u32,
        height: u32,
        camera: &Camera,
        gbuffer: &GBufferTargets,
        point_sampler: &wgpu::Sampler,
    ) -> &SsaoTargets {
        if let Some(old) = self.targets.take() {
            old.destroy();
        }
        let targets = SsaoTargets::new(device, width, height);

        self.estimate_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SSAO Estimate Bind Group"),
            layout: &self.estimate_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: self.params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(point_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.position.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.normal.view),
                },
            ],
        }));
        self.blur_bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SSAO Blur Bind Group"),
            layout: &self.blur_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&targets.raw.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&gbuffer.position.view),
                },
            ],
        }));
        self.write_params(queue, camera);

        self.targets.insert(targets)
    }

    /// Record the estimate and blur sub-passes back to back.
    pub fn render(&self, encoder: &mut wgpu::CommandEncoder) {
        let (Some(targets), Some(estimate_bind_group), Some(blur_bind_group)) = (
            self.targets.as_ref(),
            self.estimate_bind_group.as_ref(),
            self.blur_bind_group.as_ref(),
        ) else {
            log::warn!("ssao pass rendered before first resize");
            return;
        };

        let mut estimate = fullscreen_pass(encoder, &targets.raw.view, "SSAO Estimate Pass");
        estimate.set_pipeline(&self.estimate_pipeline);
        estimate.set_bind_group(0, estimate_bind_group, &[]);
        estimate.draw(0..3, 0..1);
        drop(estimate);

        let mut blur = fullscreen_pass(encoder, &targets.blurred.view, "SSAO Blur Pass");
        blur.set_pipeline(&self.blur_pipeline);
        blur.set_bind_group(0, blur_bind_group, &[]);
        blur.draw(0..3, 0..1);
    }

    pub fn targets(&self) -> Option<&SsaoTargets> {
        self.targets.as_ref()
    }
}

fn fullscreen_pass<'encoder>(
    encoder: &'encoder mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    label: &str,
) -> wgpu::RenderPass<'encoder> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load: wgpu::LoadOp::Clear(wgpu::Color::WHITE),
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        occlusion_query_set: None,
        timestamp_writes: None,
    })
}

fn mk_estimate_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("SSAO Estimate Bind Group Layout"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
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

fn mk_blur_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let texture = |binding| wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: false },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    };
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("SSAO Blur Bind Group Layout"),
        entries: &[texture(0), texture(1)],
    })
}

fn mk_fullscreen_pipeline(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    source: &str,
    label: &str,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: &[],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: AO_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
