//! The world model the renderer traverses.
//!
//! Chunk generation and meshing are the host's concern; the renderer only
//! needs an ordered chunk list with a transform and an optional GPU mesh per
//! chunk. The `children` order is the frame's traversal order and defines
//! which model-uniform pool slot each renderable chunk writes to, so it must
//! stay stable within a frame.

use cgmath::{Matrix4, SquareMatrix};

use crate::data_structures::mesh::Mesh;

/// A spatial partition of the voxel world.
#[derive(Debug)]
pub struct Chunk {
    pub active: bool,
    pub mesh: Option<Mesh>,
    pub world_transform: Matrix4<f32>,
}

impl Chunk {
    pub fn new(world_transform: Matrix4<f32>) -> Self {
        Self {
            active: true,
            mesh: None,
            world_transform,
        }
    }

    /// A chunk reaches the GPU iff it is active and meshed.
    pub fn is_renderable(&self) -> bool {
        self.active && self.mesh.is_some()
    }
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new(Matrix4::identity())
    }
}

#[derive(Debug, Default)]
pub struct World {
    pub children: Vec<Chunk>,
}

impl World {
    /// Renderable chunks in traversal order, paired with their dense pool
    /// slot (0..count, not the child index).
    pub fn renderable(&self) -> impl Iterator<Item = (usize, &Chunk)> {
        self.children
            .iter()
            .filter(|chunk| chunk.is_renderable())
            .enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_and_unmeshed_chunks_are_not_renderable() {
        let mut world = World::default();
        world.children.push(Chunk::default());
        world.children.push(Chunk {
            active: false,
            ..Chunk::default()
        });
        // Neither chunk carries a mesh, so nothing is renderable yet.
        assert_eq!(world.renderable().count(), 0);
    }
}
