//! 动画实例
//!
//! 每个角色一个实例：当前片段、已播放时间（tick）和最终骨骼矩阵数组。
//!
//! ## 状态
//!
//! - **播放中**: `current_time < 最后一帧索引`
//! - **已结束**: `current_time >= 最后一帧索引`，实例不会自动循环，
//!   由调用方决定重置、冻结或切换片段
//!
//! 没有暂停状态，不调用 `update` 即为暂停。
//!
//! ## 输出约定
//!
//! `update` 原地改写最终骨骼矩阵数组（不是纯函数），每帧不产生堆分配。
//! `update_into` 将同样的结果写入调用方提供的数组。

use glam::Mat4;
use std::sync::Arc;

use super::clip::AnimationClip;
use super::set::AnimationSet;
use super::skeleton::{BoneTransform, Skeleton, MAX_BONES};
use crate::core::error::{AnimationError, AnimationResult};

/// 固定大小的骨骼矩阵数组，与着色器端骨骼数组容量一致
pub type BonePalette = [Mat4; MAX_BONES];

/// 动画实例
#[derive(Debug, Clone)]
pub struct AnimationInstance {
    /// 共享的动画集
    animation: Arc<AnimationSet>,
    /// 当前片段名称
    current_clip: Option<String>,
    /// 当前时间（tick）
    current_time: f32,
    /// 最终骨骼矩阵：global_inverse × world × inverse_bind_pose
    final_bone_matrices: Box<BonePalette>,
    /// 上一次更新得到的骨骼世界矩阵
    world_transforms: Vec<Mat4>,
}

impl AnimationInstance {
    /// 绑定动画集并初始化
    ///
    /// `start_clip_index` 按片段名称字典序选择初始片段；越界时不选择片段。
    pub fn init(animation: Arc<AnimationSet>, start_clip_index: usize) -> Self {
        let current_clip = animation
            .clip_names()
            .get(start_clip_index)
            .map(|name| name.to_string());
        let bone_count = animation.skeleton().bone_count();

        Self {
            animation,
            current_clip,
            current_time: 0.0,
            final_bone_matrices: Box::new([Mat4::IDENTITY; MAX_BONES]),
            world_transforms: vec![Mat4::IDENTITY; bone_count],
        }
    }

    /// 推进指定片段并重新计算最终骨骼矩阵
    ///
    /// 1. 查找片段，不存在时返回 `ClipNotFound`，实例状态保持不变
    /// 2. 片段与当前片段不同时时间归零
    /// 3. `current_time += dt * ticks_per_second`
    /// 4. 超过最后一帧时不回绕，通过 [`animation_finished`](Self::animation_finished) 暴露
    pub fn update(&mut self, clip_name: &str, dt: f32) -> AnimationResult<()> {
        let animation = Arc::clone(&self.animation);
        let clip = self.advance(&animation, clip_name, dt)?;
        compute_pose(
            animation.skeleton(),
            clip,
            self.current_time,
            &mut self.world_transforms,
            &mut self.final_bone_matrices[..],
        );
        Ok(())
    }

    /// 与 [`update`](Self::update) 相同，但结果写入调用方提供的数组
    ///
    /// 实例自身的最终骨骼矩阵不会被修改；播放时间照常推进。
    pub fn update_into(
        &mut self,
        clip_name: &str,
        dt: f32,
        destination: &mut BonePalette,
    ) -> AnimationResult<()> {
        let animation = Arc::clone(&self.animation);
        let clip = self.advance(&animation, clip_name, dt)?;
        compute_pose(
            animation.skeleton(),
            clip,
            self.current_time,
            &mut self.world_transforms,
            &mut destination[..],
        );
        Ok(())
    }

    /// 当前片段是否播放结束：`current_time >= 帧数 - 1`
    pub fn animation_finished(&self) -> bool {
        self.current_clip
            .as_deref()
            .and_then(|name| self.animation.clip(name))
            .map_or(false, |clip| self.current_time >= clip.duration_ticks())
    }

    /// 时间归零
    pub fn reset_animation_time(&mut self) {
        self.current_time = 0.0;
    }

    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    pub fn current_clip(&self) -> Option<&str> {
        self.current_clip.as_deref()
    }

    pub fn animation(&self) -> &Arc<AnimationSet> {
        &self.animation
    }

    pub fn bone_count(&self) -> usize {
        self.animation.skeleton().bone_count()
    }

    /// 有效骨骼的最终矩阵 `[0, bone_count)`
    pub fn bone_matrices(&self) -> &[Mat4] {
        &self.final_bone_matrices[..self.bone_count()]
    }

    /// 完整的 256 骨骼矩阵数组（多余部分保持单位矩阵）
    pub fn palette(&self) -> &BonePalette {
        &self.final_bone_matrices
    }

    /// 上一次更新得到的骨骼世界矩阵
    pub fn world_transforms(&self) -> &[Mat4] {
        &self.world_transforms
    }

    fn advance<'a>(
        &mut self,
        animation: &'a AnimationSet,
        clip_name: &str,
        dt: f32,
    ) -> AnimationResult<&'a AnimationClip> {
        let clip = animation
            .clip(clip_name)
            .ok_or_else(|| AnimationError::ClipNotFound(clip_name.to_string()))?;

        if self.current_clip.as_deref() != Some(clip_name) {
            tracing::debug!(
                target: "animation",
                from = self.current_clip.as_deref().unwrap_or("<none>"),
                to = clip_name,
                "Switching animation clip"
            );
            self.current_clip = Some(clip_name.to_string());
            self.current_time = 0.0;
        }

        self.current_time += dt * clip.ticks_per_second;
        Ok(clip)
    }
}

/// 采样片段并沿骨骼层级计算最终矩阵
///
/// 骨骼按索引顺序处理，父骨骼的世界矩阵总是先于子骨骼计算。
fn compute_pose(
    skeleton: &Skeleton,
    clip: &AnimationClip,
    time: f32,
    world_transforms: &mut [Mat4],
    destination: &mut [Mat4],
) {
    let (a, b, t) = clip.bracket(time);
    let frame_a = &clip.frames[a];
    let frame_b = &clip.frames[b];
    let global_inverse = skeleton.global_inverse();

    for (i, bone) in skeleton.bones().iter().enumerate() {
        let local = BoneTransform::sample(frame_a, frame_b, i, t).to_matrix();
        let world = match bone.parent_index {
            Some(parent) => world_transforms[parent] * local,
            None => local,
        };
        world_transforms[i] = world;
        destination[i] = global_inverse * world * bone.inverse_bind_pose;
    }
}
