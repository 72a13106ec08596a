//! Frame orchestration.
//!
//! [`Renderer`] owns every pass and the shared [`RenderData`], and walks the
//! declared [`PIPELINE`] order for both rendering and resizing. It is
//! deliberately independent of any window: construction takes a device,
//! queue and output format, and [`render`](Renderer::render) takes the
//! output view for the frame, so the same code drives a surface texture in
//! the app and an offscreen texture in tests.

use crate::camera::Camera;
use crate::data_structures::texture::TextureSlot;
use crate::data_structures::world::World;
use crate::light::Light;
use crate::pipelines::forward::ForwardPass;
use crate::pipelines::gbuffer::GBufferPass;
use crate::pipelines::present::PresentPass;
use crate::pipelines::sky::SkyPass;
use crate::pipelines::ssao::{SsaoParams, SsaoPass};
use crate::render_data::RenderData;
use crate::resources::texture_util::TextureUtil;

/// One stage of the frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassKind {
    GBuffer,
    Ssao,
    Forward,
    Sky,
    Present,
}

/// The declared frame order. Both [`Renderer::render`] and
/// [`Renderer::resize`] walk this list, so pass dependencies are stated in
/// exactly one place.
pub const PIPELINE: [PassKind; 5] = [
    PassKind::GBuffer,
    PassKind::Ssao,
    PassKind::Forward,
    PassKind::Sky,
    PassKind::Present,
];

pub struct Renderer {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub render_data: RenderData,
    point_sampler: wgpu::Sampler,
    pub gbuffer: GBufferPass,
    pub ssao: SsaoPass,
    pub forward: ForwardPass,
    pub sky: SkyPass,
    pub present: PresentPass,
    width: u32,
    height: u32,
}

impl Renderer {
    /// Build every pipeline and size all targets for `width`×`height`.
    /// `output_format` is the format of the views later passed to
    /// [`render`](Self::render), typically the surface format.
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        util: &TextureUtil,
        output_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        camera: &Camera,
    ) -> Self {
        let render_data = RenderData::new(device, queue, width, height);
        let mut renderer = Self {
            device: device.clone(),
            queue: queue.clone(),
            render_data,
            point_sampler: util.point_sampler.clone(),
            gbuffer: GBufferPass::new(device),
            ssao: SsaoPass::new(device),
            forward: ForwardPass::new(device),
            sky: SkyPass::new(device),
            present: PresentPass::new(device, output_format),
            width,
            height,
        };
        renderer.resize(width, height, camera);
        renderer
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn set_ssao_params(&mut self, camera: &Camera, params: SsaoParams) {
        self.ssao.set_params(&self.queue, camera, params);
    }

    /// Recreate every screen-sized target and rebuild all dependent bind
    /// groups, walking the passes in [`PIPELINE`] order so each pass sees
    /// its producers' fresh views. Zero dimensions are clamped to 1.
    pub fn resize(&mut self, width: u32, height: u32, camera: &Camera) {
        let (width, height) = (width.max(1), height.max(1));
        log::info!("renderer resize to {width}x{height}");
        self.width = width;
        self.height = height;
        self.render_data.resize(width, height);

        for pass in PIPELINE {
            match pass {
                PassKind::GBuffer => {
                    self.gbuffer.resize(&self.device, width, height);
                }
                PassKind::Ssao => {
                    if let Some(gbuffer) = self.gbuffer.targets() {
                        self.ssao.resize(
                            &self.device,
                            &self.queue,
                            width,
                            height,
                            camera,
                            gbuffer,
                            &self.point_sampler,
                        );
                    }
                }
                PassKind::Forward => {
                    if let Some(ssao) = self.ssao.targets() {
                        self.forward
                            .resize(&self.device, width, height, &ssao.blurred.view);
                    }
                }
                PassKind::Sky => {}
                PassKind::Present => {
                    if let Some(forward) = self.forward.targets() {
                        self.present
                            .rebuild(&self.device, &self.point_sampler, forward);
                    }
                }
            }
        }
    }

    /// Record and submit one frame into `output`.
    ///
    /// All passes go into a single command encoder and one submission; the
    /// caller presents the surface texture afterwards (or maps a readback
    /// buffer when rendering offscreen).
    pub fn render(
        &mut self,
        camera: &Camera,
        light: &Light,
        atlas: &TextureSlot,
        world: &World,
        output: &wgpu::TextureView,
    ) {
        self.render_data.update_view_uniforms(camera, light);
        self.render_data.update_world_chunks(world);

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });
        for pass in PIPELINE {
            match pass {
                PassKind::GBuffer => self.gbuffer.render(
                    &self.device,
                    &mut encoder,
                    &mut self.render_data,
                    &self.point_sampler,
                    atlas,
                    world,
                ),
                PassKind::Ssao => self.ssao.render(&mut encoder),
                PassKind::Forward => self.forward.render(
                    &self.device,
                    &mut encoder,
                    &mut self.render_data,
                    &self.point_sampler,
                    atlas,
                    world,
                ),
                PassKind::Sky => {
                    if let Some(forward) = self.forward.targets() {
                        self.sky.render(&mut encoder, forward);
                    }
                }
                PassKind::Present => self.present.render(&mut encoder, output),
            }
        }
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_order_is_declared_once() {
        assert_eq!(PIPELINE.len(), 5);
        assert_eq!(PIPELINE[0], PassKind::GBuffer);
        assert!(
            PIPELINE.iter().position(|p| *p == PassKind::Ssao)
                < PIPELINE.iter().position(|p| *p == PassKind::Forward)
        );
        assert_eq!(PIPELINE[4], PassKind::Present);
    }
}
