//! 动画片段
//!
//! 关键帧按骨骼平行存放平移、旋转、缩放三个通道，1 tick 对应 1 帧。

use glam::{Quat, Vec3};

use super::skeleton::BoneTransform;
use crate::core::error::{AnimationError, AnimationResult};

/// 关键帧：每根骨骼一组平移/旋转/缩放，三个通道按骨骼顺序平行存放
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationFrame {
    pub positions: Vec<Vec3>,
    pub rotations: Vec<Quat>,
    pub scales: Vec<Vec3>,
}

impl AnimationFrame {
    pub fn new(positions: Vec<Vec3>, rotations: Vec<Quat>, scales: Vec<Vec3>) -> Self {
        Self {
            positions,
            rotations,
            scales,
        }
    }

    /// 所有骨骼均为单位变换的关键帧
    pub fn identity(bone_count: usize) -> Self {
        Self {
            positions: vec![Vec3::ZERO; bone_count],
            rotations: vec![Quat::IDENTITY; bone_count],
            scales: vec![Vec3::ONE; bone_count],
        }
    }

    /// 由每根骨骼的变换构造关键帧
    pub fn from_transforms(transforms: &[BoneTransform]) -> Self {
        Self {
            positions: transforms.iter().map(|t| t.translation).collect(),
            rotations: transforms.iter().map(|t| t.rotation).collect(),
            scales: transforms.iter().map(|t| t.scale).collect(),
        }
    }

    /// 第 `bone` 根骨骼在该帧的局部变换
    pub fn bone_transform(&self, bone: usize) -> BoneTransform {
        BoneTransform::new(self.positions[bone], self.rotations[bone], self.scales[bone])
    }

    fn check_channels(&self, clip: &str, frame: usize, bone_count: usize) -> AnimationResult<()> {
        let channels = [
            ("positions", self.positions.len()),
            ("rotations", self.rotations.len()),
            ("scales", self.scales.len()),
        ];
        for (channel, found) in channels {
            if found != bone_count {
                return Err(AnimationError::ChannelMismatch {
                    clip: clip.to_string(),
                    frame,
                    channel,
                    expected: bone_count,
                    found,
                });
            }
        }
        Ok(())
    }
}

/// 动画片段
///
/// 1 tick 对应 1 个关键帧，播放速度由 `ticks_per_second` 决定。
#[derive(Debug, Clone)]
pub struct AnimationClip {
    /// 动画名称
    pub name: String,
    /// 每秒 tick 数
    pub ticks_per_second: f32,
    /// 关键帧
    pub frames: Vec<AnimationFrame>,
}

impl AnimationClip {
    pub fn new(
        name: impl Into<String>,
        ticks_per_second: f32,
        frames: Vec<AnimationFrame>,
    ) -> Self {
        Self {
            name: name.into(),
            ticks_per_second,
            frames,
        }
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// 最后一个关键帧的索引
    pub fn last_frame_index(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }

    /// 片段时长（tick），等于最后一个关键帧的索引
    pub fn duration_ticks(&self) -> f32 {
        self.last_frame_index() as f32
    }

    /// 片段时长（秒）
    pub fn duration_seconds(&self) -> f32 {
        self.duration_ticks() / self.ticks_per_second
    }

    /// 校验片段与骨骼层级匹配
    ///
    /// 每个关键帧的三个通道长度都必须等于骨骼数，播放速度必须为正数。
    pub fn validate(&self, bone_count: usize) -> AnimationResult<()> {
        if self.frames.is_empty() {
            return Err(AnimationError::EmptyClip(self.name.clone()));
        }
        if !self.ticks_per_second.is_finite() || self.ticks_per_second <= 0.0 {
            return Err(AnimationError::InvalidTickRate {
                clip: self.name.clone(),
                value: self.ticks_per_second,
            });
        }
        for (index, frame) in self.frames.iter().enumerate() {
            frame.check_channels(&self.name, index, bone_count)?;
        }
        Ok(())
    }

    /// 查找包围 `time` 的两个关键帧
    ///
    /// 返回 `(frame_a, frame_b, t)`。超过最后一帧时两个索引都钳制到最后一帧且
    /// `t = 0`，不会越界读取。负数时间视为 0。
    pub fn bracket(&self, time: f32) -> (usize, usize, f32) {
        let last = self.last_frame_index();
        let time = if time.is_nan() { 0.0 } else { time.max(0.0) };
        let whole = time.floor();
        // f32 -> usize 的转换在溢出时饱和
        let frame_a = whole as usize;
        if frame_a >= last {
            return (last, last, 0.0);
        }
        (frame_a, frame_a + 1, time - whole)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip_with_frames(count: usize) -> AnimationClip {
        AnimationClip::new("walk", 30.0, vec![AnimationFrame::identity(2); count])
    }

    #[test]
    fn test_animation_clip_duration() {
        let clip = clip_with_frames(31);
        assert_eq!(clip.frame_count(), 31);
        assert_eq!(clip.duration_ticks(), 30.0);
        assert!((clip.duration_seconds() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_validate_channel_mismatch() {
        let mut clip = clip_with_frames(3);
        clip.frames[2].rotations.pop();

        let err = clip.validate(2).unwrap_err();
        assert_eq!(
            err,
            AnimationError::ChannelMismatch {
                clip: "walk".to_string(),
                frame: 2,
                channel: "rotations",
                expected: 2,
                found: 1,
            }
        );
    }

    #[test]
    fn test_validate_bone_count_mismatch() {
        let clip = clip_with_frames(2);
        assert!(matches!(
            clip.validate(3),
            Err(AnimationError::ChannelMismatch { channel: "positions", .. })
        ));
    }

    #[test]
    fn test_validate_empty_and_tick_rate() {
        let empty = AnimationClip::new("empty", 24.0, Vec::new());
        assert_eq!(
            empty.validate(0),
            Err(AnimationError::EmptyClip("empty".to_string()))
        );

        let mut clip = clip_with_frames(2);
        clip.ticks_per_second = 0.0;
        assert!(matches!(
            clip.validate(2),
            Err(AnimationError::InvalidTickRate { .. })
        ));
    }

    #[test]
    fn test_bracket_interpolates_between_frames() {
        let clip = clip_with_frames(4);
        let (a, b, t) = clip.bracket(1.25);
        assert_eq!((a, b), (1, 2));
        assert!((t - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_bracket_clamps_at_last_frame() {
        let clip = clip_with_frames(4);
        assert_eq!(clip.bracket(3.0), (3, 3, 0.0));
        assert_eq!(clip.bracket(3.7), (3, 3, 0.0));
        assert_eq!(clip.bracket(1.0e9), (3, 3, 0.0));
        assert_eq!(clip.bracket(-2.0), (0, 1, 0.0));
    }

    #[test]
    fn test_bracket_single_frame_clip() {
        let clip = clip_with_frames(1);
        assert_eq!(clip.bracket(0.0), (0, 0, 0.0));
        assert_eq!(clip.bracket(5.5), (0, 0, 0.0));
    }

    #[test]
    fn test_frame_from_transforms() {
        let transforms = [
            BoneTransform::identity(),
            BoneTransform::new(Vec3::X, Quat::IDENTITY, Vec3::ONE),
        ];
        let frame = AnimationFrame::from_transforms(&transforms);
        assert_eq!(frame.bone_transform(1).translation, Vec3::X);
        assert!(frame.check_channels("x", 0, 2).is_ok());
    }
}
