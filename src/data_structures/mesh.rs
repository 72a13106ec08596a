//! Chunk geometry and its GPU buffers.
//!
//! A chunk's mesher produces [`MeshData`] (plain CPU arrays); uploading it
//! once yields a [`Mesh`] owning one vertex buffer per attribute stream plus
//! a `u16` triangle index buffer. The split streams match the original
//! asset layout: position, normal, colour and uv are meshed independently.

use wgpu::util::DeviceExt;

/// CPU-side chunk geometry, built by the mesher.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 4]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u16>,
}

impl MeshData {
    /// An axis-aligned unit cube centred on the origin, one uv tile per face.
    ///
    /// Mainly used by tests and demo worlds; real chunks come from a mesher.
    pub fn unit_cube() -> Self {
        // (face normal, four corners in CCW order seen from outside)
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            (
                [0.0, 0.0, 1.0],
                [
                    [-0.5, -0.5, 0.5],
                    [0.5, -0.5, 0.5],
                    [0.5, 0.5, 0.5],
                    [-0.5, 0.5, 0.5],
                ],
            ),
            (
                [0.0, 0.0, -1.0],
                [
                    [0.5, -0.5, -0.5],
                    [-0.5, -0.5, -0.5],
                    [-0.5, 0.5, -0.5],
                    [0.5, 0.5, -0.5],
                ],
            ),
            (
                [1.0, 0.0, 0.0],
                [
                    [0.5, -0.5, 0.5],
                    [0.5, -0.5, -0.5],
                    [0.5, 0.5, -0.5],
                    [0.5, 0.5, 0.5],
                ],
            ),
            (
                [-1.0, 0.0, 0.0],
                [
                    [-0.5, -0.5, -0.5],
                    [-0.5, -0.5, 0.5],
                    [-0.5, 0.5, 0.5],
                    [-0.5, 0.5, -0.5],
                ],
            ),
            (
                [0.0, 1.0, 0.0],
                [
                    [-0.5, 0.5, 0.5],
                    [0.5, 0.5, 0.5],
                    [0.5, 0.5, -0.5],
                    [-0.5, 0.5, -0.5],
                ],
            ),
            (
                [0.0, -1.0, 0.0],
                [
                    [-0.5, -0.5, -0.5],
                    [0.5, -0.5, -0.5],
                    [0.5, -0.5, 0.5],
                    [-0.5, -0.5, 0.5],
                ],
            ),
        ];

        let mut data = MeshData::default();
        for (normal, corners) in faces {
            let base = data.positions.len() as u16;
            for (i, corner) in corners.into_iter().enumerate() {
                data.positions.push(corner);
                data.normals.push(normal);
                data.colors.push([1.0, 1.0, 1.0, 1.0]);
                data.uvs
                    .push([[0.0, 1.0, 1.0, 0.0][i], [1.0, 1.0, 0.0, 0.0][i]]);
            }
            data.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        data
    }
}

/// GPU geometry for one chunk: four vertex streams plus a triangle index
/// buffer. Exclusively owned by its chunk; dropping the mesh releases the
/// buffers.
#[derive(Debug)]
pub struct Mesh {
    pub positions: wgpu::Buffer,
    pub normals: wgpu::Buffer,
    pub colors: wgpu::Buffer,
    pub uvs: wgpu::Buffer,
    pub indices: wgpu::Buffer,
    pub index_count: u32,
}

impl Mesh {
    pub fn new(device: &wgpu::Device, data: &MeshData, label: &str) -> Self {
        let vertex = |contents: &[u8], stream: &str| {
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} {stream}")),
                contents,
                usage: wgpu::BufferUsages::VERTEX,
            })
        };
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label} index")),
            contents: bytemuck::cast_slice(&data.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            positions: vertex(bytemuck::cast_slice(&data.positions), "positions"),
            normals: vertex(bytemuck::cast_slice(&data.normals), "normals"),
            colors: vertex(bytemuck::cast_slice(&data.colors), "colors"),
            uvs: vertex(bytemuck::cast_slice(&data.uvs), "uvs"),
            indices,
            index_count: data.indices.len() as u32,
        }
    }

    /// The vertex buffer layouts shared by the G-buffer and forward
    /// pipelines: position, normal, colour, uv at shader locations 0..=3.
    pub fn vertex_layouts() -> [wgpu::VertexBufferLayout<'static>; 4] {
        [
            wgpu::VertexBufferLayout {
                array_stride: 3 * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                }],
            },
            wgpu::VertexBufferLayout {
                array_stride: 3 * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                }],
            },
            wgpu::VertexBufferLayout {
                array_stride: 4 * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                }],
            },
            wgpu::VertexBufferLayout {
                array_stride: 2 * 4,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &[wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x2,
                }],
            },
        ]
    }

    /// Binds all four streams and the index buffer on `pass`.
    pub fn bind<'pass>(&self, pass: &mut wgpu::RenderPass<'pass>) {
        pass.set_vertex_buffer(0, self.positions.slice(..));
        pass.set_vertex_buffer(1, self.normals.slice(..));
        pass.set_vertex_buffer(2, self.colors.slice(..));
        pass.set_vertex_buffer(3, self.uvs.slice(..));
        pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_cube_streams_are_consistent() {
        let cube = MeshData::unit_cube();
        assert_eq!(cube.positions.len(), 24);
        assert_eq!(cube.normals.len(), 24);
        assert_eq!(cube.colors.len(), 24);
        assert_eq!(cube.uvs.len(), 24);
        assert_eq!(cube.indices.len(), 36);
        let max = *cube.indices.iter().max().unwrap() as usize;
        assert!(max < cube.positions.len());
    }

    #[test]
    fn vertex_layouts_match_stream_strides() {
        let layouts = Mesh::vertex_layouts();
        assert_eq!(layouts[0].array_stride, 12);
        assert_eq!(layouts[1].array_stride, 12);
        assert_eq!(layouts[2].array_stride, 16);
        assert_eq!(layouts[3].array_stride, 8);
        for (location, layout) in layouts.iter().enumerate() {
            assert_eq!(layout.attributes[0].shader_location, location as u32);
        }
    }
}
