//! 动画系统模块
//!
//! 提供骨骼层级、关键帧动画片段和逐角色的动画实例。
//!
//! ## 功能特性
//!
//! - 骨骼层级（父骨骼总在子骨骼之前，最多 256 根骨骼）
//! - 每帧按骨骼平行存放的平移/旋转/缩放通道
//! - 线性插值 + 最短弧球面插值
//! - 最终蒙皮矩阵 `global_inverse × world × inverse_bind_pose`
//! - JSON 骨骼资源和程序化演示骨骼
//!
//! ## 使用示例
//!
//! ```rust
//! use cube_duck::animation::{demo_rig, AnimationInstance};
//! use std::sync::Arc;
//!
//! let rig = Arc::new(demo_rig().unwrap());
//! let mut duck = AnimationInstance::init(rig, 0);
//!
//! duck.update("walk", 0.016).unwrap();
//! if duck.animation_finished() {
//!     duck.reset_animation_time();
//! }
//! let bones = duck.bone_matrices();
//! assert_eq!(bones.len(), 3);
//! ```

pub mod asset;
pub mod clip;
pub mod instance;
pub mod interpolation;
pub mod service;
pub mod set;
pub mod skeleton;

pub use asset::{demo_rig, RigAsset};
pub use clip::{AnimationClip, AnimationFrame};
pub use instance::{AnimationInstance, BonePalette};
pub use interpolation::{compose_trs, lerp_vec3, slerp_shortest};
pub use service::{AnimationService, EndOfClip};
pub use set::AnimationSet;
pub use skeleton::{Bone, BoneTransform, Skeleton, MAX_BONES};
