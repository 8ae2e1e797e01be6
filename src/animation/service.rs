//! 动画服务层
//!
//! 动画实例本身不回绕，片段结束后的处理策略集中在这里，
//! 供角色与敌人逻辑复用。

use serde::{Deserialize, Serialize};

use super::instance::AnimationInstance;
use crate::core::error::AnimationResult;

/// 片段播放结束后的处理策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EndOfClip {
    /// 重置时间重新播放（待机、行走）
    #[default]
    Loop,
    /// 停在最后一帧（死亡）
    Freeze,
}

/// 动画服务 - 封装播放策略
pub struct AnimationService;

impl AnimationService {
    /// 推进动画并按策略处理片段结束
    ///
    /// 返回本次更新后片段是否已播放结束（应用 `Loop` 策略前的状态）。
    pub fn advance(
        instance: &mut AnimationInstance,
        clip: &str,
        dt: f32,
        policy: EndOfClip,
    ) -> AnimationResult<bool> {
        instance.update(clip, dt)?;
        let finished = instance.animation_finished();
        if finished && policy == EndOfClip::Loop {
            instance.reset_animation_time();
        }
        Ok(finished)
    }

    /// 切换片段并从头开始播放
    pub fn play(instance: &mut AnimationInstance, clip: &str) -> AnimationResult<()> {
        instance.update(clip, 0.0)?;
        instance.reset_animation_time();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{AnimationClip, AnimationFrame, AnimationSet, Bone, Skeleton};
    use glam::{Mat4, Vec3};
    use std::sync::Arc;

    fn instance() -> AnimationInstance {
        let skeleton = Skeleton::new(vec![Bone::new("root", None)], Mat4::IDENTITY).unwrap();
        let mut last = AnimationFrame::identity(1);
        last.positions[0] = Vec3::new(0.0, 2.0, 0.0);
        let clips = vec![
            AnimationClip::new("walk", 4.0, vec![AnimationFrame::identity(1), last.clone()]),
            AnimationClip::new("death", 4.0, vec![AnimationFrame::identity(1), last]),
        ];
        AnimationInstance::init(Arc::new(AnimationSet::new(skeleton, clips).unwrap()), 1)
    }

    #[test]
    fn test_loop_policy_resets_after_finish() {
        let mut instance = instance();
        assert!(!AnimationService::advance(&mut instance, "walk", 0.125, EndOfClip::Loop).unwrap());
        assert!(AnimationService::advance(&mut instance, "walk", 0.125, EndOfClip::Loop).unwrap());
        assert_eq!(instance.current_time(), 0.0);
        // 结束那一帧的姿态仍然是最后一帧
        assert!((instance.bone_matrices()[0].w_axis.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_freeze_policy_holds_last_pose() {
        let mut instance = instance();
        for _ in 0..10 {
            AnimationService::advance(&mut instance, "death", 0.1, EndOfClip::Freeze).unwrap();
        }
        assert!(instance.animation_finished());
        assert!((instance.bone_matrices()[0].w_axis.y - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_play_restarts_clip() {
        let mut instance = instance();
        instance.update("death", 0.2).unwrap();
        AnimationService::play(&mut instance, "walk").unwrap();
        assert_eq!(instance.current_clip(), Some("walk"));
        assert_eq!(instance.current_time(), 0.0);
        assert!(AnimationService::play(&mut instance, "swim").is_err());
    }
}
