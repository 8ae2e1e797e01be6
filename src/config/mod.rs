/// 统一配置系统
///
/// 提供TOML/JSON配置文件和环境变量覆盖
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub mod animation;
pub mod graphics;

pub use animation::AnimationConfig;
pub use graphics::GraphicsConfig;

/// 引擎配置错误
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 文件读取错误
    #[error("Config file error: {0}")]
    FileError(#[from] std::io::Error),
    /// 解析错误
    #[error("Config parse error: {0}")]
    ParseError(String),
    /// 验证错误
    #[error("Config validation error: {0}")]
    ValidationError(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// 引擎主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 动画配置
    #[serde(default)]
    pub animation: AnimationConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// 创建默认配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 从TOML文件加载配置
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_toml_str(&content)
    }

    /// 从TOML字符串解析配置
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 从JSON文件加载配置
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(ConfigError::FileError)?;
        Self::from_json_str(&content)
    }

    /// 从JSON字符串解析配置
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// 保存为TOML文件
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 保存为JSON文件
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        fs::write(path, content).map_err(ConfigError::FileError)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_overrides(&mut self) {
        // 图形配置
        if let Ok(val) = env::var("CUBE_DUCK_GRAPHICS_WIDTH") {
            if let Ok(width) = val.parse() {
                self.graphics.resolution.width = width;
            }
        }
        if let Ok(val) = env::var("CUBE_DUCK_GRAPHICS_HEIGHT") {
            if let Ok(height) = val.parse() {
                self.graphics.resolution.height = height;
            }
        }
        if let Ok(val) = env::var("CUBE_DUCK_GRAPHICS_VSYNC") {
            self.graphics.vsync = val.parse().unwrap_or(self.graphics.vsync);
        }
        if let Ok(val) = env::var("CUBE_DUCK_GRAPHICS_MAX_DRAW_CALLS") {
            if let Ok(max) = val.parse() {
                self.graphics.max_draw_calls = max;
            }
        }

        // 动画配置
        if let Ok(val) = env::var("CUBE_DUCK_ANIMATION_RIG") {
            self.animation.rig_path = Some(PathBuf::from(val));
        }
        if let Ok(val) = env::var("CUBE_DUCK_ANIMATION_SPEED") {
            if let Ok(speed) = val.parse() {
                self.animation.playback_speed = speed;
            }
        }

        // 日志配置
        if let Ok(val) = env::var("CUBE_DUCK_LOG_LEVEL") {
            if let Some(level) = LogLevel::parse(&val) {
                self.logging.level = level;
            }
        }
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        self.graphics.validate()?;
        self.animation.validate()?;
        Ok(())
    }

    /// 自动查找并加载配置文件
    ///
    /// 按以下顺序查找：
    /// 1. ./config.toml
    /// 2. ./config.json
    /// 3. ~/.config/cube_duck/config.toml
    /// 4. 使用默认配置
    ///
    /// 文件存在但无法解析时返回错误，返回值附带实际使用的文件路径。
    /// 环境变量覆盖在加载后应用。
    pub fn load_or_default() -> ConfigResult<(Self, Option<PathBuf>)> {
        let mut candidates = vec![PathBuf::from("config.toml"), PathBuf::from("config.json")];
        if let Some(home) = env::var_os("HOME") {
            candidates.push(
                PathBuf::from(home)
                    .join(".config")
                    .join("cube_duck")
                    .join("config.toml"),
            );
        }

        for path in candidates {
            if !path.is_file() {
                continue;
            }
            let mut config = match path.extension().and_then(|e| e.to_str()) {
                Some("json") => Self::from_json_file(&path)?,
                _ => Self::from_toml_file(&path)?,
            };
            config.apply_env_overrides();
            config.validate()?;
            return Ok((config, Some(path)));
        }

        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok((config, None))
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（`RUST_LOG` 未设置时使用）
    pub level: LogLevel,

    /// 是否输出帧级别的 span
    pub frame_spans: bool,
}

crate::impl_default!(LoggingConfig {
    level: LogLevel::Info,
    frame_spans: false,
});

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    /// 跟踪
    Trace,
    /// 调试
    Debug,
    /// 信息
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
}

impl LogLevel {
    /// 解析日志级别（不区分大小写）
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// `EnvFilter` 可识别的指令字符串
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.graphics.max_draw_calls, 1024);
    }

    #[test]
    fn test_toml_serialization() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: EngineConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(
            config.graphics.resolution.width,
            parsed.graphics.resolution.width
        );
        assert_eq!(config.animation.idle_clip, parsed.animation.idle_clip);
    }

    #[test]
    fn test_json_serialization() {
        let config = EngineConfig::default();
        let json_str = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json_str).unwrap();
        assert_eq!(config.logging.level, parsed.logging.level);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            [graphics]
            max_draw_calls = 64
            "#,
        )
        .unwrap();
        assert_eq!(config.graphics.max_draw_calls, 64);
        assert_eq!(config.graphics.resolution.width, 1024);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let err = EngineConfig::from_toml_str("graphics = 3").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn test_save_and_reload_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = EngineConfig::default();
        config.graphics.vsync = false;
        config.save_toml(&path).unwrap();

        let loaded = EngineConfig::from_toml_file(&path).unwrap();
        assert!(!loaded.graphics.vsync);
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("WARNING"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse(" debug "), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
        assert_eq!(LogLevel::Trace.as_directive(), "trace");
    }
}
