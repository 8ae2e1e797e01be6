//! 绘制记录与提交
//!
//! 可绘制物体是纯数据记录，没有继承层级；暂存常量和发出绘制调用都是自由函数。

use glam::{Mat4, Vec4};

use super::constant_buffer::ConstantBufferRing;
use super::mesh::GpuMesh;
use crate::core::error::RenderResult;

/// 网格句柄（渲染器网格表的下标）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshId(pub u32);

/// 使用的管线
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Skinned,
    Static,
}

/// 一次绘制所需的全部数据
#[derive(Debug, Clone, Copy)]
pub struct Drawable<'a> {
    pub mesh: MeshId,
    pub world: Mat4,
    pub tint: Vec4,
    pub pipeline: PipelineKind,
    /// 骨骼矩阵来源（蒙皮管线）
    pub palette: Option<&'a [Mat4]>,
}

impl<'a> Drawable<'a> {
    pub fn skinned(mesh: MeshId, world: Mat4, tint: Vec4, palette: &'a [Mat4]) -> Self {
        Self {
            mesh,
            world,
            tint,
            pipeline: PipelineKind::Skinned,
            palette: Some(palette),
        }
    }

    pub fn static_mesh(mesh: MeshId, world: Mat4, tint: Vec4) -> Self {
        Self {
            mesh,
            world,
            tint,
            pipeline: PipelineKind::Static,
            palette: None,
        }
    }
}

/// 已暂存常量、等待录制的绘制
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagedDraw {
    pub mesh: MeshId,
    pub pipeline: PipelineKind,
    /// 常量缓冲环中的动态偏移
    pub offset: u32,
}

/// 写入蒙皮绘制常量并返回动态偏移
///
/// `palette` 只需包含实际骨骼数的矩阵，其余槽位内容不被着色器读取。
pub fn stage_skinned(
    ring: &mut ConstantBufferRing,
    world: Mat4,
    view_proj: Mat4,
    tint: Vec4,
    palette: &[Mat4],
) -> RenderResult<u32> {
    ring.update_value("W", &world)?;
    ring.update_value("VP", &view_proj)?;
    ring.update_value("tint", &tint)?;
    ring.update_slice("bones", palette)?;
    ring.next()
}

/// 写入静态绘制常量并返回动态偏移
pub fn stage_static(
    ring: &mut ConstantBufferRing,
    world: Mat4,
    view_proj: Mat4,
    tint: Vec4,
) -> RenderResult<u32> {
    ring.update_value("W", &world)?;
    ring.update_value("VP", &view_proj)?;
    ring.update_value("tint", &tint)?;
    ring.next()
}

/// 以动态偏移绑定常量并绘制网格
pub fn draw_mesh<'a>(
    pass: &mut wgpu::RenderPass<'a>,
    bind_group: &'a wgpu::BindGroup,
    offset: u32,
    mesh: &'a GpuMesh,
) {
    pass.set_bind_group(0, bind_group, &[offset]);
    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
    pass.set_index_buffer(mesh.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
}
