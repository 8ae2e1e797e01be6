use super::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 动画配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// 骨骼动画资源路径（JSON），为空时使用内置的程序化骨骼
    pub rig_path: Option<PathBuf>,

    /// 角色待机动画片段
    pub idle_clip: String,

    /// 角色行走动画片段
    pub walk_clip: String,

    /// 敌人巡逻动画片段
    pub enemy_clip: String,

    /// 播放速度倍率
    pub playback_speed: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            rig_path: None,
            idle_clip: "idle variation".to_string(),
            walk_clip: "walk".to_string(),
            enemy_clip: "walk forward".to_string(),
            playback_speed: 1.0,
        }
    }
}

impl AnimationConfig {
    /// 验证配置
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.playback_speed.is_finite() || self.playback_speed < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "playback_speed must be a non-negative number, got {}",
                self.playback_speed
            )));
        }
        if self.idle_clip.is_empty() || self.walk_clip.is_empty() || self.enemy_clip.is_empty() {
            return Err(ConfigError::ValidationError(
                "clip names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_clips() {
        let config = AnimationConfig::default();
        assert_eq!(config.idle_clip, "idle variation");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_negative_speed_rejected() {
        let config = AnimationConfig {
            playback_speed: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
