//! 骨骼数据结构
//!
//! 定义骨骼层级和骨骼节点。骨骼层级在构造时校验：
//! 父骨骼索引必须小于自身索引，骨骼总数不超过 [`MAX_BONES`]。
//! 因此按索引顺序单次遍历即可自顶向下计算所有世界矩阵。

use glam::{Mat4, Quat, Vec3};
use std::collections::HashMap;

use super::clip::AnimationFrame;
use super::interpolation::{compose_trs, lerp_vec3, slerp_shortest};
use crate::core::error::{AnimationError, AnimationResult};

/// 着色器骨骼数组容量，也是单个骨骼层级的骨骼数上限
pub const MAX_BONES: usize = 256;

// ============================================================================
// 骨骼节点
// ============================================================================

/// 骨骼节点
#[derive(Clone, Debug, PartialEq)]
pub struct Bone {
    /// 骨骼名称
    pub name: String,
    /// 父骨骼索引（None 表示根骨骼）
    pub parent_index: Option<usize>,
    /// 逆绑定矩阵（将顶点从模型空间变换到骨骼空间）
    pub inverse_bind_pose: Mat4,
}

impl Bone {
    pub fn new(name: impl Into<String>, parent_index: Option<usize>) -> Self {
        Self {
            name: name.into(),
            parent_index,
            inverse_bind_pose: Mat4::IDENTITY,
        }
    }

    /// 设置逆绑定矩阵
    pub fn with_inverse_bind_pose(mut self, inverse_bind_pose: Mat4) -> Self {
        self.inverse_bind_pose = inverse_bind_pose;
        self
    }

    pub fn is_root(&self) -> bool {
        self.parent_index.is_none()
    }
}

/// 骨骼变换
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoneTransform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for BoneTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl BoneTransform {
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
        }
    }

    pub fn identity() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// 转换为 4x4 矩阵（T × R × S）
    pub fn to_matrix(&self) -> Mat4 {
        compose_trs(self.translation, self.rotation, self.scale)
    }

    /// 插值：平移、缩放线性插值，旋转最短弧球面插值
    pub fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            translation: lerp_vec3(self.translation, other.translation, t),
            rotation: slerp_shortest(self.rotation, other.rotation, t),
            scale: lerp_vec3(self.scale, other.scale, t),
        }
    }

    /// 在两个关键帧之间采样第 `bone` 根骨骼的局部变换
    ///
    /// 调用方保证两个关键帧已通过通道长度校验。
    pub fn sample(a: &AnimationFrame, b: &AnimationFrame, bone: usize, t: f32) -> Self {
        a.bone_transform(bone).lerp(&b.bone_transform(bone), t)
    }
}

// ============================================================================
// 骨骼层级（Skeleton）
// ============================================================================

/// 骨骼层级
///
/// 加载后只读，由同一模型的所有动画实例共享。
#[derive(Clone, Debug)]
pub struct Skeleton {
    /// 所有骨骼（父骨骼总在子骨骼之前）
    bones: Vec<Bone>,
    /// 骨骼名称到索引的映射
    bone_name_to_index: HashMap<String, usize>,
    /// 根修正矩阵
    global_inverse: Mat4,
}

impl Skeleton {
    /// 创建新的骨骼层级
    ///
    /// # 错误
    ///
    /// - 骨骼数超过 [`MAX_BONES`] 时返回 `TooManyBones`
    /// - 父骨骼索引不小于自身索引时返回 `InvalidParent`
    pub fn new(bones: Vec<Bone>, global_inverse: Mat4) -> AnimationResult<Self> {
        if bones.len() > MAX_BONES {
            return Err(AnimationError::TooManyBones {
                count: bones.len(),
                max: MAX_BONES,
            });
        }

        for (index, bone) in bones.iter().enumerate() {
            if let Some(parent) = bone.parent_index {
                if parent >= index {
                    return Err(AnimationError::InvalidParent {
                        bone: bone.name.clone(),
                        index,
                        parent,
                    });
                }
            }
        }

        let bone_name_to_index = bones
            .iter()
            .enumerate()
            .map(|(i, b)| (b.name.clone(), i))
            .collect();

        tracing::debug!(target: "animation", bones = bones.len(), "Skeleton created");

        Ok(Self {
            bones,
            bone_name_to_index,
            global_inverse,
        })
    }

    /// 获取骨骼数量
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    /// 所有骨骼
    pub fn bones(&self) -> &[Bone] {
        &self.bones
    }

    /// 获取骨骼
    pub fn bone(&self, index: usize) -> Option<&Bone> {
        self.bones.get(index)
    }

    /// 通过名称获取骨骼索引
    pub fn bone_index(&self, name: &str) -> Option<usize> {
        self.bone_name_to_index.get(name).copied()
    }

    /// 父骨骼索引
    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.bones.get(index).and_then(|b| b.parent_index)
    }

    /// 根修正矩阵
    pub fn global_inverse(&self) -> Mat4 {
        self.global_inverse
    }

    /// 绑定姿态下每根骨骼的模型空间矩阵（逆绑定矩阵的逆）
    pub fn bind_pose_matrices(&self) -> Vec<Mat4> {
        self.bones
            .iter()
            .map(|b| b.inverse_bind_pose.inverse())
            .collect()
    }
}

// ============================================================================
// 测试
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bone_transform_identity() {
        let t = BoneTransform::identity();
        assert_eq!(t.translation, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
        assert_eq!(t.to_matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn test_bone_transform_to_matrix() {
        let t = BoneTransform::new(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY, Vec3::ONE);
        let m = t.to_matrix();
        assert_eq!(m.w_axis.truncate(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_bone_transform_lerp() {
        let a = BoneTransform::identity();
        let b = BoneTransform::new(Vec3::new(10.0, 0.0, 0.0), Quat::IDENTITY, Vec3::splat(3.0));
        let mid = a.lerp(&b, 0.5);
        assert!((mid.translation.x - 5.0).abs() < 0.001);
        assert!((mid.scale.y - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_skeleton_bone_hierarchy() {
        let bones = vec![
            Bone::new("root", None),
            Bone::new("spine", Some(0)),
            Bone::new("head", Some(1)),
        ];

        let skeleton = Skeleton::new(bones, Mat4::IDENTITY).unwrap();

        assert_eq!(skeleton.bone_count(), 3);
        assert_eq!(skeleton.bone_index("root"), Some(0));
        assert_eq!(skeleton.bone_index("spine"), Some(1));
        assert_eq!(skeleton.bone_index("head"), Some(2));
        assert_eq!(skeleton.parent_of(2), Some(1));
        assert_eq!(skeleton.parent_of(0), None);
        assert!(skeleton.bone(0).unwrap().is_root());
    }

    #[test]
    fn test_skeleton_rejects_forward_parent() {
        let bones = vec![
            Bone::new("root", None),
            Bone::new("arm", Some(2)),
            Bone::new("hand", Some(1)),
        ];
        let err = Skeleton::new(bones, Mat4::IDENTITY).unwrap_err();
        assert_eq!(
            err,
            AnimationError::InvalidParent {
                bone: "arm".to_string(),
                index: 1,
                parent: 2,
            }
        );
    }

    #[test]
    fn test_skeleton_rejects_self_parent() {
        let bones = vec![Bone::new("loop", Some(0))];
        assert!(matches!(
            Skeleton::new(bones, Mat4::IDENTITY),
            Err(AnimationError::InvalidParent { .. })
        ));
    }

    #[test]
    fn test_skeleton_bone_limit() {
        let mut bones = vec![Bone::new("root", None)];
        for i in 1..=MAX_BONES {
            bones.push(Bone::new(format!("bone_{i}"), Some(i - 1)));
        }
        assert!(matches!(
            Skeleton::new(bones.clone(), Mat4::IDENTITY),
            Err(AnimationError::TooManyBones { count: 257, max: 256 })
        ));

        bones.pop();
        assert_eq!(
            Skeleton::new(bones, Mat4::IDENTITY).unwrap().bone_count(),
            MAX_BONES
        );
    }

    #[test]
    fn test_bind_pose_matrices_invert_inverse_bind_pose() {
        let bind = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        let skeleton = Skeleton::new(
            vec![Bone::new("root", None).with_inverse_bind_pose(bind.inverse())],
            Mat4::IDENTITY,
        )
        .unwrap();
        assert!(skeleton.bind_pose_matrices()[0].abs_diff_eq(bind, 1e-6));
    }
}
