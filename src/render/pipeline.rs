//! 场景渲染器
//!
//! 每种着色器一条管线、一个常量缓冲环和一个动态偏移绑定组：
//!
//! ```text
//! @group(0) @binding(0)  uniform, has_dynamic_offset = true
//!     蒙皮管线 -> skinned_ring (SkinnedConstants)
//!     静态管线 -> static_ring  (StaticConstants)
//! ```
//!
//! 每帧流程：`begin_frame` -> `stage` × N -> `flush` -> `record`。

use glam::Mat4;

use super::constant_buffer::ConstantBufferRing;
use super::context::DEPTH_FORMAT;
use super::draw::{
    draw_mesh, stage_skinned, stage_static, Drawable, MeshId, PipelineKind, StagedDraw,
};
use super::mesh::{GpuMesh, StaticVertex};
use super::shader_cache::{load_wgsl, ShaderCache};
use super::skinned::{
    SkinnedConstants, SkinnedVertex, StaticConstants, SKINNED_SHADER, STATIC_SHADER,
};
use crate::core::error::{RenderError, RenderResult};

/// 蒙皮 + 静态网格渲染器
pub struct SkinnedRenderer {
    skinned_pipeline: wgpu::RenderPipeline,
    static_pipeline: wgpu::RenderPipeline,
    skinned_ring: ConstantBufferRing,
    static_ring: ConstantBufferRing,
    skinned_bind_group: wgpu::BindGroup,
    static_bind_group: wgpu::BindGroup,
    meshes: Vec<GpuMesh>,
}

impl SkinnedRenderer {
    /// 创建管线、常量缓冲环和绑定组
    pub fn new(
        device: &wgpu::Device,
        format: wgpu::TextureFormat,
        shaders: &mut ShaderCache,
        max_draw_calls: u32,
    ) -> RenderResult<Self> {
        let skinned_ring = ConstantBufferRing::new(
            device,
            "Skinned Constant Ring",
            SkinnedConstants::layout(),
            max_draw_calls,
        );
        let static_ring = ConstantBufferRing::new(
            device,
            "Static Constant Ring",
            StaticConstants::layout(),
            max_draw_calls,
        );

        let skinned_layout =
            constant_bind_group_layout(device, "Skinned Constants Layout", &skinned_ring);
        let static_layout =
            constant_bind_group_layout(device, "Static Constants Layout", &static_ring);
        let skinned_bind_group =
            constant_bind_group(device, "Skinned Constants", &skinned_layout, &skinned_ring)?;
        let static_bind_group =
            constant_bind_group(device, "Static Constants", &static_layout, &static_ring)?;

        let skinned_shader = load_wgsl(shaders, device, "skinned.wgsl", SKINNED_SHADER);
        let skinned_pipeline = build_pipeline(
            device,
            "Skinned Mesh Pipeline",
            skinned_shader,
            &skinned_layout,
            SkinnedVertex::desc(),
            format,
        );
        let static_shader = load_wgsl(shaders, device, "static.wgsl", STATIC_SHADER);
        let static_pipeline = build_pipeline(
            device,
            "Static Mesh Pipeline",
            static_shader,
            &static_layout,
            StaticVertex::desc(),
            format,
        );

        tracing::info!(target: "render", max_draw_calls, "Skinned renderer ready");

        Ok(Self {
            skinned_pipeline,
            static_pipeline,
            skinned_ring,
            static_ring,
            skinned_bind_group,
            static_bind_group,
            meshes: Vec::new(),
        })
    }

    /// 注册网格
    pub fn add_mesh(&mut self, mesh: GpuMesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() as u32 - 1)
    }

    /// 开始新的一帧（帧栅栏已等待）
    pub fn begin_frame(&mut self, frame_index: usize) -> RenderResult<()> {
        self.skinned_ring.begin_frame(frame_index)?;
        self.static_ring.begin_frame(frame_index)
    }

    /// 把一个可绘制物体的常量写入对应的常量缓冲环
    pub fn stage(&mut self, drawable: &Drawable<'_>, view_proj: Mat4) -> RenderResult<StagedDraw> {
        let offset = match (drawable.pipeline, drawable.palette) {
            (PipelineKind::Skinned, Some(palette)) => stage_skinned(
                &mut self.skinned_ring,
                drawable.world,
                view_proj,
                drawable.tint,
                palette,
            )?,
            (PipelineKind::Skinned, None) => {
                return Err(RenderError::UnknownConstant {
                    name: "bones".to_string(),
                })
            }
            (PipelineKind::Static, _) => {
                stage_static(&mut self.static_ring, drawable.world, view_proj, drawable.tint)?
            }
        };
        Ok(StagedDraw {
            mesh: drawable.mesh,
            pipeline: drawable.pipeline,
            offset,
        })
    }

    /// 上传本帧写入的常量
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        self.skinned_ring.flush(queue);
        self.static_ring.flush(queue);
    }

    /// 在渲染通道中录制已暂存的绘制
    pub fn record<'a>(&'a self, pass: &mut wgpu::RenderPass<'a>, draws: &[StagedDraw]) {
        let mut bound: Option<PipelineKind> = None;
        for draw in draws {
            let Some(mesh) = self.meshes.get(draw.mesh.0 as usize) else {
                tracing::warn!(target: "render", mesh = draw.mesh.0, "Unknown mesh, draw skipped");
                continue;
            };
            let bind_group = match draw.pipeline {
                PipelineKind::Skinned => &self.skinned_bind_group,
                PipelineKind::Static => &self.static_bind_group,
            };
            if bound != Some(draw.pipeline) {
                pass.set_pipeline(match draw.pipeline {
                    PipelineKind::Skinned => &self.skinned_pipeline,
                    PipelineKind::Static => &self.static_pipeline,
                });
                bound = Some(draw.pipeline);
            }
            draw_mesh(pass, bind_group, draw.offset, mesh);
        }
    }

    pub fn skinned_ring(&self) -> &ConstantBufferRing {
        &self.skinned_ring
    }

    pub fn static_ring(&self) -> &ConstantBufferRing {
        &self.static_ring
    }
}

// ============================================================================
// 管线构建
// ============================================================================

fn constant_bind_group_layout(
    device: &wgpu::Device,
    label: &str,
    ring: &ConstantBufferRing,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: true,
                min_binding_size: ring.binding_size(),
            },
            count: None,
        }],
    })
}

fn constant_bind_group(
    device: &wgpu::Device,
    label: &str,
    layout: &wgpu::BindGroupLayout,
    ring: &ConstantBufferRing,
) -> RenderResult<wgpu::BindGroup> {
    let buffer = ring
        .buffer()
        .ok_or_else(|| RenderError::Upload(format!("{} has no GPU buffer", ring.label())))?;
    Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(label),
        layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                buffer,
                offset: 0,
                size: ring.binding_size(),
            }),
        }],
    }))
}

fn build_pipeline(
    device: &wgpu::Device,
    label: &str,
    shader: &wgpu::ShaderModule,
    bind_group_layout: &wgpu::BindGroupLayout,
    vertex_layout: wgpu::VertexBufferLayout<'_>,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&pipeline_layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: "vs_main",
            buffers: &[vertex_layout],
            compilation_options: Default::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
    })
}
