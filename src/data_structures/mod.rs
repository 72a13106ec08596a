//! Engine data structures: meshes, textures and the world model.
//!
//! - `mesh` contains the CPU-side chunk geometry and its GPU buffers
//! - `texture` contains the GPU texture wrapper and render-target factory
//! - `world` is the chunk collection the renderer traverses each frame

pub mod mesh;
pub mod texture;
pub mod world;
