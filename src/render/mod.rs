//! 渲染模块
//!
//! - `frame_ring` - 双帧命令录制环（栅栏等待复用）
//! - `constant_buffer` - 按绘制调用分配槽位的常量缓冲环
//! - `upload` - 加载期同步上传
//! - `skinned` / `mesh` - 顶点格式、常量结构体和着色器
//! - `draw` / `pipeline` - 可绘制记录、常量暂存和渲染器
//! - `context` - 表面与设备

pub mod constant_buffer;
pub mod context;
pub mod draw;
pub mod frame_ring;
pub mod mesh;
pub mod pipeline;
pub mod shader_cache;
pub mod skinned;
pub mod upload;

pub use constant_buffer::{ConstantBufferRing, ConstantLayout, ConstantVariable};
pub use context::GpuContext;
pub use draw::{draw_mesh, stage_skinned, stage_static, Drawable, MeshId, PipelineKind, StagedDraw};
pub use frame_ring::{FrameResourceRing, SubmissionBackend, WgpuSubmission, FRAMES_IN_FLIGHT};
pub use mesh::{GpuMesh, StaticVertex};
pub use pipeline::SkinnedRenderer;
pub use shader_cache::{AssetCache, AssetId, ShaderCache};
pub use skinned::{SkinnedConstants, SkinnedVertex, StaticConstants};
pub use upload::upload_buffer;
