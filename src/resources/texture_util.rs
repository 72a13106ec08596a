//! Per-device texture utilities: shared samplers and mipmap generation.
//!
//! [`TextureUtil`] is created once per graphics device and owns the samplers
//! every pass shares plus the blit pipeline that builds mip chains. Instances
//! live in an explicit [`TextureUtilRegistry`] owned by the context — device
//! identity is the engine-issued [`DeviceId`] handed out at registration, not
//! a hidden static map.

use anyhow::{Result, ensure};

/// Engine-issued identity for a registered graphics device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DeviceId(u32);

/// `floor(log2(max(w, h))) + 1` mip levels for a `w`×`h` image.
///
/// A 1×1 image yields exactly one level.
pub fn num_mip_levels(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// The working-size sequence for a full mip chain, level 0 first.
///
/// Each level halves with ceiling division and never drops below 1×1.
pub fn mip_extents(width: u32, height: u32) -> Vec<(u32, u32)> {
    let levels = num_mip_levels(width, height);
    let mut extents = Vec::with_capacity(levels as usize);
    let (mut w, mut h) = (width.max(1), height.max(1));
    for _ in 0..levels {
        extents.push((w, h));
        w = w.div_ceil(2).max(1);
        h = h.div_ceil(2).max(1);
    }
    extents
}

/// Device-scoped sampler cache and mipmap blit pipeline.
///
/// Cloning clones the resource handles, not the GPU objects; every clone
/// still refers to the one set of samplers created at registration.
#[derive(Clone, Debug)]
pub struct TextureUtil {
    pub linear_sampler: wgpu::Sampler,
    pub point_sampler: wgpu::Sampler,
    mipmap_pipeline: wgpu::RenderPipeline,
}

impl TextureUtil {
    fn new(device: &wgpu::Device) -> Self {
        let linear_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Linear Sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let point_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Point Sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Mipmap Blit Shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("mipmap_blit.wgsl").into()),
        });
        let mipmap_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Mipmap Generation Pipeline"),
            layout: None,
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
                    format: wgpu::TextureFormat::Rgba8Unorm,
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
        });

        Self {
            linear_sampler,
            point_sampler,
            mipmap_pipeline,
        }
    }

    /// Upload `pixels` (tightly packed rgba8) as level 0 and render the rest
    /// of the mip chain, level `i` sampling level `i - 1` through the linear
    /// sampler with a full-screen triangle.
    ///
    /// All levels are encoded into one submission before returning; actual
    /// GPU execution stays asynchronous relative to the caller.
    pub fn generate_mipmap(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[u8],
        width: u32,
        height: u32,
        label: &str,
    ) -> Result<wgpu::Texture> {
        ensure!(
            pixels.len() as u64 == width as u64 * height as u64 * 4,
            "mipmap source for {label} is {} bytes, expected {}x{}x4",
            pixels.len(),
            width,
            height
        );

        let extents = mip_extents(width, height);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: extents.len() as u32,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Mipmap Encoder"),
        });
        let layout = self.mipmap_pipeline.get_bind_group_layout(0);
        for level in 1..extents.len() as u32 {
            let source = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level - 1,
                mip_level_count: Some(1),
                ..Default::default()
            });
            let target = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level,
                mip_level_count: Some(1),
                ..Default::default()
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Mipmap Bind Group"),
                layout: &layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::Sampler(&self.linear_sampler),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&source),
                    },
                ],
            });
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Mipmap Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &target,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.mipmap_pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }
        queue.submit(std::iter::once(encoder.finish()));

        Ok(texture)
    }
}

/// Explicit device→util registry, owned by the context.
///
/// A device registers exactly once and gets a [`DeviceId`] back; every later
/// lookup with that id returns the same instance. Never two instances for one
/// registered device.
#[derive(Debug, Default)]
pub struct TextureUtilRegistry {
    entries: Vec<TextureUtil>,
}

impl TextureUtilRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, device: &wgpu::Device) -> DeviceId {
        let id = DeviceId(self.entries.len() as u32);
        self.entries.push(TextureUtil::new(device));
        id
    }

    pub fn get(&self, id: DeviceId) -> &TextureUtil {
        &self.entries[id.0 as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_level_counts() {
        assert_eq!(num_mip_levels(1, 1), 1);
        assert_eq!(num_mip_levels(2, 2), 2);
        assert_eq!(num_mip_levels(256, 256), 9);
        assert_eq!(num_mip_levels(300, 100), 9);
        assert_eq!(num_mip_levels(1024, 1), 11);
    }

    #[test]
    fn mip_extents_halve_with_ceiling() {
        let extents = mip_extents(300, 100);
        assert_eq!(extents.len(), 9);
        assert_eq!(extents[0], (300, 100));
        assert_eq!(extents[1], (150, 50));
        assert_eq!(extents[2], (75, 25));
        assert_eq!(extents[3], (38, 13));
        assert_eq!(extents[8], (2, 1));
    }

    #[test]
    fn mip_extents_are_deterministic() {
        // Regenerating the chain for the same source gives the same sequence.
        assert_eq!(mip_extents(640, 480), mip_extents(640, 480));
        assert_eq!(mip_extents(1, 1), vec![(1, 1)]);
    }
}
