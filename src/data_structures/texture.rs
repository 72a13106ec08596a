//! GPU textures and texture creation utilities.
//!
//! [`Texture`] wraps a wgpu texture with its default view. Two lifecycles
//! exist: image textures uploaded once (optionally with a full mip chain via
//! [`TextureUtil`](crate::resources::texture_util::TextureUtil)) and
//! render-target textures recreated on every resize. Render targets must be
//! destroyed before replacement so resizes don't accumulate GPU memory.

use anyhow::Result;
use image::GenericImageView;

use crate::resources::texture_util::TextureUtil;

/// A GPU texture with its default full-resource view.
#[derive(Debug)]
pub struct Texture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl Texture {
    /// Standard depth buffer format used by the geometry passes.
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

    /// Create a single-mip render target sized to the current output
    /// resolution.
    ///
    /// The owner is responsible for calling [`destroy`](Self::destroy) before
    /// replacing it on resize.
    pub fn render_buffer(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Create a depth buffer matching the current output resolution.
    ///
    /// Depth formats forbid copies, so unlike [`render_buffer`](Self::render_buffer)
    /// the usage carries no `COPY_SRC`.
    pub fn depth_buffer(device: &wgpu::Device, width: u32, height: u32, label: &str) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    /// Upload a decoded image as an rgba8unorm texture with a full mip chain.
    pub fn from_image(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        util: &TextureUtil,
        img: &image::DynamicImage,
        label: &str,
    ) -> Result<Self> {
        let (width, height) = img.dimensions();
        let rgba = img.to_rgba8();
        let texture = util.generate_mipmap(device, queue, &rgba, width, height, label)?;
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self { texture, view })
    }

    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    pub fn height(&self) -> u32 {
        self.texture.height()
    }

    /// Release the GPU allocation eagerly instead of waiting for all
    /// references to drop.
    pub fn destroy(&self) {
        self.texture.destroy();
    }
}

/// Load state for an asynchronously created texture.
///
/// Passes consult this every frame and skip their draws while the slot is
/// [`Pending`](TextureSlot::Pending); a load that never resolves keeps the
/// draws skipped without failing the frame.
#[derive(Debug, Default)]
pub enum TextureSlot {
    #[default]
    Pending,
    Ready(Texture),
}

impl TextureSlot {
    pub fn ready(&self) -> Option<&Texture> {
        match self {
            TextureSlot::Pending => None,
            TextureSlot::Ready(texture) => Some(texture),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, TextureSlot::Ready(_))
    }
}
