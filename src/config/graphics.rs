use super::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};

/// 常量缓冲环默认槽位数（每帧最多的绘制调用数）
pub const DEFAULT_MAX_DRAW_CALLS: u32 = 1024;

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// 分辨率
    pub resolution: Resolution,

    /// 垂直同步
    pub vsync: bool,

    /// 每个着色器常量缓冲环的槽位数
    pub max_draw_calls: u32,

    /// 清屏颜色 (RGBA)
    pub clear_color: [f32; 4],

    /// 垂直视场角（度）
    pub fov_degrees: f32,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            vsync: true,
            max_draw_calls: DEFAULT_MAX_DRAW_CALLS,
            clear_color: [0.0, 0.0, 1.0, 1.0],
            fov_degrees: 60.0,
        }
    }
}

impl GraphicsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            return Err(ConfigError::ValidationError(
                "Invalid resolution".to_string(),
            ));
        }
        if self.max_draw_calls == 0 {
            return Err(ConfigError::ValidationError(
                "max_draw_calls must be at least 1".to_string(),
            ));
        }
        if !(1.0..179.0).contains(&self.fov_degrees) {
            return Err(ConfigError::ValidationError(format!(
                "fov_degrees out of range: {}",
                self.fov_degrees
            )));
        }
        Ok(())
    }

    /// 宽高比
    pub fn aspect_ratio(&self) -> f32 {
        self.resolution.width as f32 / self.resolution.height.max(1) as f32
    }

    /// 对应的 wgpu 呈现模式
    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}

/// 分辨率
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// 宽度（像素）
    pub width: u32,
    /// 高度（像素）
    pub height: u32,
}

crate::impl_default!(Resolution {
    width: 1024,
    height: 768,
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_zero_resolution() {
        let mut config = GraphicsConfig::new();
        config.resolution.height = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_ring() {
        let mut config = GraphicsConfig::new();
        config.max_draw_calls = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_aspect_ratio_and_present_mode() {
        let mut config = GraphicsConfig::new();
        assert!((config.aspect_ratio() - 1024.0 / 768.0).abs() < 1e-6);
        assert_eq!(config.present_mode(), wgpu::PresentMode::AutoVsync);
        config.vsync = false;
        assert_eq!(config.present_mode(), wgpu::PresentMode::AutoNoVsync);
    }
}
