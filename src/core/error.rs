//! 统一错误处理模块
//!
//! 每个子系统一个错误枚举，`EngineError` 在最外层汇总。
//!
//! ## 错误分类
//!
//! - **资源/内容错误** (`AssetError`, `AnimationError` 的加载期变体): 加载时立即失败
//! - **逻辑错误** (未知动画片段、未知常量名): 调用方的编程错误，直接返回给调用点
//! - **资源耗尽** (`RenderError::RingExhausted`): 常量缓冲环在飞行帧内被写满
//! - **设备错误** (适配器/设备/表面创建失败): 致命错误

use thiserror::Error;

use crate::config::ConfigError;

/// 引擎核心错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Initialization error: {0}")]
    Init(String),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Animation error: {0}")]
    Animation(#[from] AnimationError),

    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Window creation failed: {0}")]
    Window(String),

    #[error("Event loop error: {0}")]
    EventLoop(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 渲染系统错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Failed to create surface: {0}")]
    SurfaceCreation(String),

    #[error("Failed to request adapter: no compatible GPU found")]
    NoAdapter,

    #[error("Failed to request device: {0}")]
    DeviceRequest(String),

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Unknown shader constant: {name}")]
    UnknownConstant { name: String },

    #[error("Constant {name} holds {expected} bytes, got {found}")]
    ConstantSizeMismatch {
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Constant buffer ring exhausted: {capacity} slots, {in_flight} still in flight")]
    RingExhausted { capacity: u32, in_flight: u32 },

    #[error("Frame index {index} out of range for {frames} frames in flight")]
    InvalidFrameIndex { index: usize, frames: usize },

    #[error("No frame is being recorded")]
    FrameNotOpen,

    #[error("A frame is already being recorded")]
    FrameAlreadyOpen,

    #[error("Upload failed: {0}")]
    Upload(String),
}

/// 动画系统错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    #[error("Animation clip not found: {0}")]
    ClipNotFound(String),

    #[error(
        "Clip {clip}, frame {frame}: {channel} channel has {found} entries, skeleton has {expected} bones"
    )]
    ChannelMismatch {
        clip: String,
        frame: usize,
        channel: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Animation clip has no frames: {0}")]
    EmptyClip(String),

    #[error("Clip {clip} has invalid ticks per second: {value}")]
    InvalidTickRate { clip: String, value: f32 },

    #[error("Skeleton has {count} bones, limit is {max}")]
    TooManyBones { count: usize, max: usize },

    #[error("Bone {bone} (index {index}) references parent {parent}, parents must come first")]
    InvalidParent {
        bone: String,
        index: usize,
        parent: usize,
    },
}

/// 资源管理错误
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {path}")]
    NotFound { path: String },

    #[error("Failed to load asset: {path}, reason: {reason}")]
    LoadFailed { path: String, reason: String },

    #[error("Invalid asset format: {path}, expected: {expected}")]
    InvalidFormat { path: String, expected: String },

    #[error("Asset decode error: {0}")]
    Decode(String),

    #[error("Invalid animation data: {0}")]
    Animation(#[from] AnimationError),
}

/// 引擎结果类型别名
pub type EngineResult<T> = Result<T, EngineError>;
pub type RenderResult<T> = Result<T, RenderError>;
pub type AnimationResult<T> = Result<T, AnimationError>;
pub type AssetResult<T> = Result<T, AssetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let render_err = RenderError::NoAdapter;
        let engine_err: EngineError = render_err.into();
        assert!(matches!(engine_err, EngineError::Render(_)));

        let anim_err = AnimationError::ClipNotFound("walk".to_string());
        let engine_err: EngineError = anim_err.into();
        assert!(matches!(engine_err, EngineError::Animation(_)));
    }

    #[test]
    fn test_animation_error_wraps_into_asset_error() {
        let err: AssetError = AnimationError::EmptyClip("idle".to_string()).into();
        assert!(matches!(err, AssetError::Animation(AnimationError::EmptyClip(_))));
        assert_eq!(
            err.to_string(),
            "Invalid animation data: Animation clip has no frames: idle"
        );
    }

    #[test]
    fn test_error_display() {
        let err = RenderError::UnknownConstant {
            name: "bones".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown shader constant: bones");

        let err = AnimationError::ChannelMismatch {
            clip: "walk".to_string(),
            frame: 3,
            channel: "rotations",
            expected: 12,
            found: 11,
        };
        assert!(err.to_string().contains("rotations channel has 11 entries"));
    }
}
