//! # Cube Duck
//!
//! 骨骼动画角色的实时渲染与帧资源管理。
//!
//! ## Features
//!
//! - **Skeletal animation**: 骨骼层级、关键帧插值（最短弧球面插值）、256 根骨骼的蒙皮矩阵
//! - **Frame ring**: 双帧命令录制，栅栏只在帧资源复用时等待
//! - **Constant buffer ring**: 每次绘制一个 256 字节对齐的常量槽位，按名称写入
//! - **Game layer**: 鸭子角色、巡逻敌人、金币和方块关卡
//!
//! ## Data flow
//!
//! ```text
//! AnimationClip -> AnimationInstance::update(dt) -> 最终骨骼矩阵
//!     -> ConstantBufferRing::update("bones", ..) -> next() 动态偏移
//!     -> FrameResourceRing 录制并提交 -> GPU 绘制
//! ```
//!
//! ### Example
//!
//! ```rust
//! use cube_duck::animation::{demo_rig, AnimationInstance};
//! use cube_duck::render::{ConstantBufferRing, SkinnedConstants, stage_skinned};
//! use glam::{Mat4, Vec4};
//! use std::sync::Arc;
//!
//! let mut duck = AnimationInstance::init(Arc::new(demo_rig().unwrap()), 0);
//! duck.update("walk", 0.016).unwrap();
//!
//! let mut ring = ConstantBufferRing::cpu_only("skinned", SkinnedConstants::layout(), 16);
//! ring.begin_frame(0).unwrap();
//! let offset = stage_skinned(&mut ring, Mat4::IDENTITY, Mat4::IDENTITY, Vec4::ONE, duck.bone_matrices()).unwrap();
//! assert_eq!(offset, 0);
//! ```
//!
//! ## Modules
//!
//! - [`core`]: 引擎入口、错误类型
//! - [`config`]: 配置加载
//! - [`animation`]: 骨骼动画
//! - [`render`]: 帧资源环、常量缓冲环、蒙皮渲染
//! - [`game`]: 游戏逻辑

/// Core engine functionality: entry point, errors and macros
#[macro_use]
pub mod core;
/// Configuration loading (TOML/JSON + environment overrides)
pub mod config;
/// Skeletal animation
pub mod animation;
/// Frame resources, constant buffers and skinned rendering
pub mod render;
/// Gameplay: character, enemies, level and camera
pub mod game;
