//! 网格数据
//!
//! 静态顶点格式、GPU 网格句柄和程序化盒体几何。

use std::sync::Arc;

use bytemuck::Pod;
use glam::{Vec2, Vec3};

use super::upload::upload_buffer;
use crate::core::error::RenderResult;

/// 静态网格顶点
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StaticVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl StaticVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3, 2 => Float32x2];

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<StaticVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// 已上传到 GPU 的网格
#[derive(Clone, Debug)]
pub struct GpuMesh {
    pub vertex_buffer: Arc<wgpu::Buffer>,
    pub index_buffer: Arc<wgpu::Buffer>,
    pub index_count: u32,
}

impl GpuMesh {
    /// 同步上传顶点和索引
    pub fn upload<V: Pod>(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        vertices: &[V],
        indices: &[u32],
        label: &str,
    ) -> RenderResult<Self> {
        let vertex_buffer = upload_buffer(
            device,
            queue,
            bytemuck::cast_slice(vertices),
            wgpu::BufferUsages::VERTEX,
            &format!("{label} Vertex Buffer"),
        )?;
        let index_buffer = upload_buffer(
            device,
            queue,
            bytemuck::cast_slice(indices),
            wgpu::BufferUsages::INDEX,
            &format!("{label} Index Buffer"),
        )?;

        Ok(Self {
            vertex_buffer: Arc::new(vertex_buffer),
            index_buffer: Arc::new(index_buffer),
            index_count: indices.len() as u32,
        })
    }
}

// ============================================================================
// 程序化几何
// ============================================================================

/// 盒体的一个顶点
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxVertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub uv: Vec2,
}

/// (法线, 切线)，副切线为 `normal × tangent`
const BOX_FACES: [(Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::NEG_Z),
    (Vec3::NEG_X, Vec3::Z),
    (Vec3::Y, Vec3::X),
    (Vec3::NEG_Y, Vec3::X),
    (Vec3::Z, Vec3::X),
    (Vec3::NEG_Z, Vec3::NEG_X),
];

/// 轴对齐盒体：24 个顶点、36 个索引，正面逆时针
pub fn box_geometry(center: Vec3, half_extents: Vec3) -> (Vec<BoxVertex>, Vec<u32>) {
    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, tangent) in BOX_FACES {
        let bitangent = normal.cross(tangent);
        let base = vertices.len() as u32;
        let corners = [
            (-1.0, -1.0, Vec2::new(0.0, 1.0)),
            (1.0, -1.0, Vec2::new(1.0, 1.0)),
            (1.0, 1.0, Vec2::new(1.0, 0.0)),
            (-1.0, 1.0, Vec2::new(0.0, 0.0)),
        ];
        for (u, v, uv) in corners {
            let offset = normal + tangent * u + bitangent * v;
            vertices.push(BoxVertex {
                position: center + offset * half_extents,
                normal,
                tangent,
                uv,
            });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    (vertices, indices)
}

/// 以原点为中心的单位立方体
pub fn unit_cube() -> (Vec<StaticVertex>, Vec<u32>) {
    let (vertices, indices) = box_geometry(Vec3::ZERO, Vec3::splat(0.5));
    let vertices = vertices
        .into_iter()
        .map(|v| StaticVertex {
            position: v.position.to_array(),
            normal: v.normal.to_array(),
            uv: v.uv.to_array(),
        })
        .collect();
    (vertices, indices)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_vertex_size() {
        assert_eq!(std::mem::size_of::<StaticVertex>(), 32);
    }

    #[test]
    fn test_box_counts() {
        let (vertices, indices) = box_geometry(Vec3::ZERO, Vec3::ONE);
        assert_eq!(vertices.len(), 24);
        assert_eq!(indices.len(), 36);
        assert!(indices.iter().all(|i| (*i as usize) < vertices.len()));
    }

    #[test]
    fn test_box_triangles_face_outward() {
        let (vertices, indices) = box_geometry(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.5, 1.0, 2.0));
        for tri in indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| vertices[i as usize]);
            let geometric = (b.position - a.position).cross(c.position - a.position);
            assert!(geometric.dot(a.normal) > 0.0);
        }
    }

    #[test]
    fn test_unit_cube_bounds() {
        let (vertices, _) = unit_cube();
        for v in vertices {
            for c in v.position {
                assert!((c.abs() - 0.5).abs() < 1e-6);
            }
        }
    }
}
