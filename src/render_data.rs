//! Per-frame uniform staging.
//!
//! [`RenderData`] owns the view and light uniform buffers shared by every
//! pass, the temporal jitter state and the growable pool of per-chunk model
//! uniform buffers. The pool is rewritten from scratch each frame before any
//! pass reads it: slot `i` always means the `i`-th renderable chunk in that
//! frame's traversal order, never a stable chunk identity.

use cgmath::Matrix4;

use crate::camera::Camera;
use crate::data_structures::world::World;
use crate::light::Light;

/// View-dependent uniforms, uploaded once per frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ViewUniforms {
    pub view_projection: [[f32; 4]; 4],
    pub view: [[f32; 4]; 4],
    /// xy = sub-pixel jitter in clip space, zw unused.
    pub jitter: [f32; 4],
}

/// Light uniforms, uploaded once per frame.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniforms {
    pub view_projection: [[f32; 4]; 4],
    pub position: [f32; 4],
    pub direction: [f32; 4],
    /// rgb pre-multiplied by intensity.
    pub color: [f32; 4],
}

/// Number of jitter samples before the sequence wraps.
const JITTER_SAMPLES: u32 = 8;

/// Radical-inverse (Halton) sequence member for `index` in the given base.
pub fn halton(index: u32, base: u32) -> f32 {
    let mut result = 0.0;
    let mut f = 1.0 / base as f32;
    let mut i = index;
    while i > 0 {
        result += f * (i % base) as f32;
        i /= base;
        f /= base as f32;
    }
    result
}

/// Sub-pixel jitter offset for `frame`, scaled to the current resolution.
///
/// Bases 2 and 3, index `frame % 8`; the sequence wraps so
/// `jitter(8, ..) == jitter(0, ..)`.
pub fn jitter(frame: u32, width: u32, height: u32) -> (f32, f32) {
    let index = frame % JITTER_SAMPLES;
    (
        ((halton(index, 2) - 0.5) / width.max(1) as f32) * 0.1,
        ((halton(index, 3) - 0.5) / height.max(1) as f32) * 0.1,
    )
}

#[derive(Debug)]
pub struct RenderData {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub view_uniform_buffer: wgpu::Buffer,
    pub light_uniform_buffer: wgpu::Buffer,
    model_buffers: Vec<wgpu::Buffer>,
    frame: u32,
    width: u32,
    height: u32,
}

impl RenderData {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, width: u32, height: u32) -> Self {
        let view_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("View Uniform"),
            size: std::mem::size_of::<ViewUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let light_uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Light Uniform"),
            size: std::mem::size_of::<LightUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            device: device.clone(),
            queue: queue.clone(),
            view_uniform_buffer,
            light_uniform_buffer,
            model_buffers: Vec::new(),
            frame: 0,
            width,
            height,
        }
    }

    /// The jitter scale follows the output resolution.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    /// Write view/projection matrices, the frame's jitter offset and the
    /// light parameters. Advances the jitter frame counter.
    pub fn update_view_uniforms(&mut self, camera: &Camera, light: &Light) {
        let (jitter_x, jitter_y) = jitter(self.frame, self.width, self.height);
        let view_uniforms = ViewUniforms {
            view_projection: camera.view_projection().into(),
            view: camera.view().into(),
            jitter: [jitter_x, jitter_y, 0.0, 0.0],
        };
        self.queue.write_buffer(
            &self.view_uniform_buffer,
            0,
            bytemuck::cast_slice(&[view_uniforms]),
        );

        let position = light.world_position();
        let direction = light.world_forward();
        let light_uniforms = LightUniforms {
            view_projection: light.view_projection().into(),
            position: [position.x, position.y, position.z, 1.0],
            direction: [direction.x, direction.y, direction.z, 0.0],
            color: light.scaled_color(),
        };
        self.queue.write_buffer(
            &self.light_uniform_buffer,
            0,
            bytemuck::cast_slice(&[light_uniforms]),
        );

        self.frame = self.frame.wrapping_add(1);
    }

    /// The pooled model uniform buffer for `index`, allocating up to and
    /// including that slot on first use. The pool never shrinks.
    pub fn model_buffer(&mut self, index: usize) -> &wgpu::Buffer {
        while index >= self.model_buffers.len() {
            let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("Model Uniform {}", self.model_buffers.len())),
                size: std::mem::size_of::<Matrix4<f32>>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.model_buffers.push(buffer);
        }
        &self.model_buffers[index]
    }

    pub fn pool_len(&self) -> usize {
        self.model_buffers.len()
    }

    /// Write each renderable chunk's world transform into the next dense pool
    /// slot, in traversal order. Returns the number of slots written; that
    /// count is the only valid slot range for this frame's bind groups.
    pub fn update_world_chunks(&mut self, world: &World) -> usize {
        let mut count = 0;
        for (slot, chunk) in world.renderable() {
            let transform: [[f32; 4]; 4] = chunk.world_transform.into();
            self.model_buffer(slot);
            self.queue.write_buffer(
                &self.model_buffers[slot],
                0,
                bytemuck::cast_slice(&[transform]),
            );
            count = slot + 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn halton_base_two_canonical_sequence() {
        let expected = [0.0, 0.5, 0.25, 0.75, 0.125, 0.625, 0.375, 0.875];
        for (index, want) in expected.into_iter().enumerate() {
            assert_eq!(halton(index as u32, 2), want);
        }
    }

    #[test]
    fn halton_base_three_prefix() {
        assert_eq!(halton(0, 3), 0.0);
        assert!((halton(1, 3) - 1.0 / 3.0).abs() < 1e-6);
        assert!((halton(2, 3) - 2.0 / 3.0).abs() < 1e-6);
        assert!((halton(3, 3) - 1.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn jitter_wraps_every_eight_frames() {
        assert_eq!(jitter(8, 800, 600), jitter(0, 800, 600));
        assert_eq!(jitter(17, 800, 600), jitter(1, 800, 600));
    }

    #[test]
    fn jitter_scales_with_resolution() {
        let (x_small, _) = jitter(1, 100, 100);
        let (x_large, _) = jitter(1, 200, 100);
        assert!((x_small - 2.0 * x_large).abs() < 1e-9);
    }
}
