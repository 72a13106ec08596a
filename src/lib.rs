//! voxcraft
//!
//! A real-time voxel-world renderer built on wgpu. The crate's core is a
//! multi-pass deferred pipeline: chunk geometry is rendered into a G-buffer
//! (albedo, view-space position, view-space normal, depth), screen-space
//! ambient occlusion is estimated and blurred from it, a forward pass shades
//! the geometry with the atlas texture, a spotlight and the occlusion term,
//! a sky gradient fills the untouched background and a present pass blits the
//! result to the surface.
//!
//! High-level modules
//! - `camera`: camera type and view/projection math
//! - `light`: light parameters with a tagged directional/spot kind
//! - `context`: central GPU and window context that owns device/queue/surface
//! - `data_structures`: engine data models (meshes, textures, world/chunks)
//! - `resources`: asset loading and the per-device texture utility registry
//! - `render_data`: per-frame uniform staging (view/light/model buffers, jitter)
//! - `pipelines`: the individual render passes and their WGSL shaders
//! - `renderer`: pass orchestration, per-frame encoding and resize handling
//! - `app`: thin native/WASM bootstrap that drives the frame loop
//!

pub mod app;
pub mod camera;
pub mod context;
pub mod data_structures;
pub mod light;
pub mod pipelines;
pub mod render_data;
pub mod renderer;
pub mod resources;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use wgpu::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
