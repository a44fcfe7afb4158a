//! CPU-side meshes for [`GeometryDesc`].

use bytemuck::{Pod, Zeroable};

use super::types::GeometryDesc;

/// Vertex shared by every program.
///
/// `cell` is the grid cell the vertex belongs to; quads use `[0, 0]`.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(crate) struct MeshVertex {
    pub pos: [f32; 2],
    pub cell: [u32; 2],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 2] = wgpu::vertex_attr_array![
        0 => Float32x2, // pos
        1 => Uint32x2   // cell
    ];

    pub(crate) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(crate) struct Mesh {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

/// Builds the mesh for `desc`. Cells get their own four vertices so each can
/// carry its cell coordinate without sharing across tile boundaries.
pub(crate) fn build_mesh(desc: GeometryDesc) -> Mesh {
    match desc {
        GeometryDesc::Quad => Mesh {
            vertices: vec![
                MeshVertex { pos: [-1.0, -1.0], cell: [0, 0] },
                MeshVertex { pos: [1.0, -1.0], cell: [0, 0] },
                MeshVertex { pos: [1.0, 1.0], cell: [0, 0] },
                MeshVertex { pos: [-1.0, 1.0], cell: [0, 0] },
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        },
        GeometryDesc::Grid { cols, rows } => {
            let cells = cols as usize * rows as usize;
            let mut vertices = Vec::with_capacity(cells * 4);
            let mut indices = Vec::with_capacity(cells * 6);
            let step_x = 1.0 / cols.max(1) as f32;
            let step_y = 1.0 / rows.max(1) as f32;

            for j in 0..rows {
                for i in 0..cols {
                    let x0 = -0.5 + i as f32 * step_x;
                    let y0 = -0.5 + j as f32 * step_y;
                    let x1 = x0 + step_x;
                    let y1 = y0 + step_y;
                    let base = vertices.len() as u32;
                    let cell = [i, j];
                    vertices.extend_from_slice(&[
                        MeshVertex { pos: [x0, y0], cell },
                        MeshVertex { pos: [x1, y0], cell },
                        MeshVertex { pos: [x1, y1], cell },
                        MeshVertex { pos: [x0, y1], cell },
                    ]);
                    indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
                }
            }

            Mesh { vertices, indices }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_has_four_vertices_per_cell() {
        let mesh = build_mesh(GeometryDesc::Grid { cols: 4, rows: 2 });
        assert_eq!(mesh.vertices.len(), 32);
        assert_eq!(mesh.indices.len(), 48);
        assert_eq!(mesh.indices.iter().copied().max(), Some(31));
    }

    #[test]
    fn grid_spans_unit_square() {
        let mesh = build_mesh(GeometryDesc::Grid { cols: 6, rows: 4 });
        let (lo, hi) = mesh.vertices.iter().fold(([f32::MAX; 2], [f32::MIN; 2]), |(lo, hi), v| {
            (
                [lo[0].min(v.pos[0]), lo[1].min(v.pos[1])],
                [hi[0].max(v.pos[0]), hi[1].max(v.pos[1])],
            )
        });
        assert_eq!(lo, [-0.5, -0.5]);
        approx::assert_relative_eq!(hi[0], 0.5, epsilon = 1e-6);
        approx::assert_relative_eq!(hi[1], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn last_cell_carries_its_coordinate() {
        let mesh = build_mesh(GeometryDesc::Grid { cols: 3, rows: 2 });
        assert_eq!(mesh.vertices.last().map(|v| v.cell), Some([2, 1]));
    }
}
