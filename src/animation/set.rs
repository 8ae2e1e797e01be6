//! 模型动画集
//!
//! 一个骨骼层级加上按名称索引的动画片段，对应一个动画模型加载出的全部动画数据。

use std::collections::HashMap;

use super::clip::AnimationClip;
use super::skeleton::Skeleton;
use crate::core::error::AnimationResult;

/// 模型动画集（只读，通过 `Arc` 在动画实例之间共享）
#[derive(Debug, Clone)]
pub struct AnimationSet {
    skeleton: Skeleton,
    clips: HashMap<String, AnimationClip>,
}

impl AnimationSet {
    /// 创建动画集，并用骨骼层级校验每个片段
    ///
    /// 同名片段以后出现的为准。
    pub fn new(skeleton: Skeleton, clips: Vec<AnimationClip>) -> AnimationResult<Self> {
        let mut by_name = HashMap::with_capacity(clips.len());
        for clip in clips {
            clip.validate(skeleton.bone_count())?;
            if let Some(previous) = by_name.insert(clip.name.clone(), clip) {
                tracing::warn!(
                    target: "animation",
                    clip = %previous.name,
                    "Duplicate animation clip replaced"
                );
            }
        }

        tracing::debug!(
            target: "animation",
            bones = skeleton.bone_count(),
            clips = by_name.len(),
            "Animation set loaded"
        );

        Ok(Self {
            skeleton,
            clips: by_name,
        })
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// 按名称查找片段
    pub fn clip(&self, name: &str) -> Option<&AnimationClip> {
        self.clips.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.clips.contains_key(name)
    }

    /// 按字典序排列的片段名称
    pub fn clip_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.clips.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }
}
