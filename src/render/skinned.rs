//! 蒙皮网格数据
//!
//! 定义蒙皮顶点格式、每次绘制的常量结构体及其偏移表，以及 WGSL 着色器。
//!
//! 着色器常量按绘制调用写入常量缓冲环的一个槽位：
//!
//! ```text
//! SkinnedConstants (16528 字节 -> 槽位 16640 字节)
//! ┌──────────┬──────────┬──────────┬───────────────────────────┐
//! │ W (64)   │ VP (64)  │ tint(16) │ bones[256] (256 × 64)     │
//! └──────────┴──────────┴──────────┴───────────────────────────┘
//! ```
//!
//! 矩阵为列主序，与 glam 和 WGSL 的约定一致。

use glam::{Mat4, Vec3, Vec4};

use super::constant_buffer::ConstantLayout;
use super::mesh::box_geometry;
use crate::animation::{Skeleton, MAX_BONES};

/// 每个顶点受影响的最大骨骼数
pub const MAX_BONE_INFLUENCES: usize = 4;

// ============================================================================
// 蒙皮顶点数据
// ============================================================================

/// 蒙皮顶点（包含骨骼权重）
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkinnedVertex {
    /// 位置（绑定姿态，模型空间）
    pub position: [f32; 3],
    /// 法线
    pub normal: [f32; 3],
    /// 切线
    pub tangent: [f32; 3],
    /// 纹理坐标
    pub uv: [f32; 2],
    /// 骨骼索引
    pub bone_ids: [u32; MAX_BONE_INFLUENCES],
    /// 骨骼权重（总和为 1.0）
    pub bone_weights: [f32; MAX_BONE_INFLUENCES],
}

impl SkinnedVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 6] = wgpu::vertex_attr_array![
        0 => Float32x3,
        1 => Float32x3,
        2 => Float32x3,
        3 => Float32x2,
        4 => Uint32x4,
        5 => Float32x4,
    ];

    /// 完全绑定到单根骨骼的顶点
    pub fn rigid(position: Vec3, normal: Vec3, tangent: Vec3, uv: [f32; 2], bone: u32) -> Self {
        Self {
            position: position.to_array(),
            normal: normal.to_array(),
            tangent: tangent.to_array(),
            uv,
            bone_ids: [bone, 0, 0, 0],
            bone_weights: [1.0, 0.0, 0.0, 0.0],
        }
    }

    /// 顶点缓冲区布局描述
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SkinnedVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    /// 归一化骨骼权重
    ///
    /// 权重全为零时整体绑定到第一根骨骼。
    pub fn normalize_weights(&mut self) {
        let sum: f32 = self.bone_weights.iter().sum();
        if sum > 0.0001 {
            let inv_sum = 1.0 / sum;
            for w in &mut self.bone_weights {
                *w *= inv_sum;
            }
        } else {
            self.bone_weights = [1.0, 0.0, 0.0, 0.0];
        }
    }
}

// ============================================================================
// 着色器常量
// ============================================================================

/// 蒙皮绘制常量
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SkinnedConstants {
    /// 物体世界矩阵
    pub w: Mat4,
    /// 视图投影矩阵
    pub vp: Mat4,
    /// 颜色
    pub tint: Vec4,
    /// 最终骨骼矩阵
    pub bones: [Mat4; MAX_BONES],
}

impl SkinnedConstants {
    pub fn layout() -> ConstantLayout {
        ConstantLayout::builder(std::mem::size_of::<Self>())
            .variable("W", std::mem::offset_of!(Self, w), std::mem::size_of::<Mat4>())
            .variable("VP", std::mem::offset_of!(Self, vp), std::mem::size_of::<Mat4>())
            .variable("tint", std::mem::offset_of!(Self, tint), std::mem::size_of::<Vec4>())
            .variable(
                "bones",
                std::mem::offset_of!(Self, bones),
                std::mem::size_of::<[Mat4; MAX_BONES]>(),
            )
            .build()
    }
}

/// 静态网格绘制常量
#[repr(C)]
#[derive(Clone, Copy, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StaticConstants {
    pub w: Mat4,
    pub vp: Mat4,
    pub tint: Vec4,
}

impl StaticConstants {
    pub fn layout() -> ConstantLayout {
        ConstantLayout::builder(std::mem::size_of::<Self>())
            .variable("W", std::mem::offset_of!(Self, w), std::mem::size_of::<Mat4>())
            .variable("VP", std::mem::offset_of!(Self, vp), std::mem::size_of::<Mat4>())
            .variable("tint", std::mem::offset_of!(Self, tint), std::mem::size_of::<Vec4>())
            .build()
    }
}

// ============================================================================
// 着色器
// ============================================================================

/// 蒙皮着色器（每顶点 4 个权重）
pub const SKINNED_SHADER: &str = r#"
struct Constants {
    w: mat4x4<f32>,
    vp: mat4x4<f32>,
    tint: vec4<f32>,
    bones: array<mat4x4<f32>, 256>,
};

@group(0) @binding(0) var<uniform> constants: Constants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) tangent: vec3<f32>,
    @location(3) uv: vec2<f32>,
    @location(4) bone_ids: vec4<u32>,
    @location(5) bone_weights: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let skin = constants.bones[in.bone_ids.x] * in.bone_weights.x
        + constants.bones[in.bone_ids.y] * in.bone_weights.y
        + constants.bones[in.bone_ids.z] * in.bone_weights.z
        + constants.bones[in.bone_ids.w] * in.bone_weights.w;
    let world = constants.w * skin;

    var out: VertexOutput;
    out.clip_position = constants.vp * world * vec4<f32>(in.position, 1.0);
    out.normal = (world * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light = normalize(vec3<f32>(0.4, 1.0, 0.3));
    let diffuse = max(dot(normalize(in.normal), light), 0.0);
    return vec4<f32>(constants.tint.rgb * (0.3 + 0.7 * diffuse), constants.tint.a);
}
"#;

/// 静态网格着色器
pub const STATIC_SHADER: &str = r#"
struct Constants {
    w: mat4x4<f32>,
    vp: mat4x4<f32>,
    tint: vec4<f32>,
};

@group(0) @binding(0) var<uniform> constants: Constants;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    out.clip_position = constants.vp * constants.w * vec4<f32>(in.position, 1.0);
    out.normal = (constants.w * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let light = normalize(vec3<f32>(0.4, 1.0, 0.3));
    let diffuse = max(dot(normalize(in.normal), light), 0.0);
    let edge = step(0.95, max(abs(in.uv.x - 0.5), abs(in.uv.y - 0.5)) * 2.0);
    let base = mix(constants.tint.rgb, constants.tint.rgb * 0.6, edge);
    return vec4<f32>(base * (0.3 + 0.7 * diffuse), constants.tint.a);
}
"#;

// ============================================================================
// 程序化蒙皮网格
// ============================================================================

/// 以骨骼绑定姿态生成盒体拼成的蒙皮网格
///
/// 每根骨骼在其绑定位置放一个盒体，刚性绑定到该骨骼。
/// 根骨骼的半边长为 `root_half_extent`，子骨骼为其 0.6 倍。
pub fn rig_box_mesh(skeleton: &Skeleton, root_half_extent: f32) -> (Vec<SkinnedVertex>, Vec<u32>) {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for (bone, bind) in skeleton.bind_pose_matrices().iter().enumerate() {
        let center = bind.transform_point3(Vec3::ZERO);
        let half = if skeleton.parent_of(bone).is_none() {
            root_half_extent
        } else {
            root_half_extent * 0.6
        };
        let (box_vertices, box_indices) = box_geometry(center, Vec3::splat(half));

        let base = vertices.len() as u32;
        vertices.extend(box_vertices.into_iter().map(|v| {
            SkinnedVertex::rigid(v.position, v.normal, v.tangent, v.uv.to_array(), bone as u32)
        }));
        indices.extend(box_indices.into_iter().map(|i| base + i));
    }

    (vertices, indices)
}
