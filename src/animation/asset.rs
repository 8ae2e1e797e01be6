//! 骨骼动画资源
//!
//! JSON 格式的骨骼与动画描述，以及演示用的程序化骨骼。
//!
//! ```json
//! {
//!   "bones": [{ "name": "body", "parent": -1, "inverse_bind_pose": [16 floats] }],
//!   "global_inverse": [16 floats],
//!   "clips": [{
//!     "name": "walk",
//!     "ticks_per_second": 8.0,
//!     "frames": [{ "positions": [[x,y,z]], "rotations": [[x,y,z,w]], "scales": [[x,y,z]] }]
//!   }]
//! }
//! ```
//!
//! 矩阵按列主序存放。加载时立即校验，任何不一致都返回错误。

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::clip::{AnimationClip, AnimationFrame};
use super::set::AnimationSet;
use super::skeleton::{Bone, BoneTransform, Skeleton};
use crate::core::error::{AnimationResult, AssetError, AssetResult};

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

fn identity_matrix() -> [f32; 16] {
    IDENTITY
}

fn root_parent() -> i32 {
    -1
}

/// 骨骼动画资源
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigAsset {
    pub bones: Vec<BoneAsset>,
    #[serde(default = "identity_matrix")]
    pub global_inverse: [f32; 16],
    #[serde(default)]
    pub clips: Vec<ClipAsset>,
}

/// 骨骼描述（`parent = -1` 表示根骨骼）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoneAsset {
    pub name: String,
    #[serde(default = "root_parent")]
    pub parent: i32,
    #[serde(default = "identity_matrix")]
    pub inverse_bind_pose: [f32; 16],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipAsset {
    pub name: String,
    pub ticks_per_second: f32,
    pub frames: Vec<FrameAsset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameAsset {
    pub positions: Vec<[f32; 3]>,
    pub rotations: Vec<[f32; 4]>,
    pub scales: Vec<[f32; 3]>,
}

impl RigAsset {
    /// 从文件加载并构建动画集
    pub fn load<P: AsRef<Path>>(path: P) -> AssetResult<AnimationSet> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        if !path.exists() {
            return Err(AssetError::NotFound { path: shown });
        }
        let content = fs::read_to_string(path).map_err(|e| AssetError::LoadFailed {
            path: shown.clone(),
            reason: e.to_string(),
        })?;
        let asset = Self::from_json_str(&content).map_err(|e| match e {
            AssetError::Decode(reason) => AssetError::InvalidFormat {
                path: shown.clone(),
                expected: format!("rig JSON ({reason})"),
            },
            other => other,
        })?;
        let set = asset.into_animation_set()?;
        tracing::info!(
            target: "animation",
            path = %shown,
            bones = set.skeleton().bone_count(),
            clips = set.clip_count(),
            "Rig loaded"
        );
        Ok(set)
    }

    /// 解析 JSON
    pub fn from_json_str(content: &str) -> AssetResult<Self> {
        serde_json::from_str(content).map_err(|e| AssetError::Decode(e.to_string()))
    }

    /// 序列化为 JSON
    pub fn to_json_string(&self) -> AssetResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AssetError::Decode(e.to_string()))
    }

    /// 构建并校验动画集
    pub fn into_animation_set(self) -> AssetResult<AnimationSet> {
        let mut bones = Vec::with_capacity(self.bones.len());
        for bone in self.bones {
            let parent_index = match bone.parent {
                -1 => None,
                p if p >= 0 => Some(p as usize),
                p => {
                    return Err(AssetError::Decode(format!(
                        "bone {} has invalid parent index {}",
                        bone.name, p
                    )))
                }
            };
            bones.push(
                Bone::new(bone.name, parent_index)
                    .with_inverse_bind_pose(Mat4::from_cols_array(&bone.inverse_bind_pose)),
            );
        }
        let skeleton = Skeleton::new(bones, Mat4::from_cols_array(&self.global_inverse))?;

        let clips = self
            .clips
            .into_iter()
            .map(|clip| {
                let frames = clip
                    .frames
                    .into_iter()
                    .map(|f| {
                        AnimationFrame::new(
                            f.positions.into_iter().map(Vec3::from).collect(),
                            f.rotations.into_iter().map(Quat::from_array).collect(),
                            f.scales.into_iter().map(Vec3::from).collect(),
                        )
                    })
                    .collect();
                AnimationClip::new(clip.name, clip.ticks_per_second, frames)
            })
            .collect();

        Ok(AnimationSet::new(skeleton, clips)?)
    }

    /// 由动画集生成资源描述
    pub fn from_animation_set(set: &AnimationSet) -> Self {
        let skeleton = set.skeleton();
        let bones = skeleton
            .bones()
            .iter()
            .map(|b| BoneAsset {
                name: b.name.clone(),
                parent: b.parent_index.map_or(-1, |p| p as i32),
                inverse_bind_pose: b.inverse_bind_pose.to_cols_array(),
            })
            .collect();
        let clips = set
            .clip_names()
            .into_iter()
            .filter_map(|name| set.clip(name))
            .map(|clip| ClipAsset {
                name: clip.name.clone(),
                ticks_per_second: clip.ticks_per_second,
                frames: clip
                    .frames
                    .iter()
                    .map(|f| FrameAsset {
                        positions: f.positions.iter().map(|v| v.to_array()).collect(),
                        rotations: f.rotations.iter().map(|q| q.to_array()).collect(),
                        scales: f.scales.iter().map(|v| v.to_array()).collect(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            bones,
            global_inverse: skeleton.global_inverse().to_cols_array(),
            clips,
        }
    }
}

// ============================================================================
// 程序化演示骨骼
// ============================================================================

/// 演示骨骼每根骨骼相对父骨骼的绑定偏移：身体、脖子、头
const DEMO_BIND_OFFSETS: [Vec3; 3] = [
    Vec3::new(0.0, 0.5, 0.0),
    Vec3::new(0.0, 0.5, 0.3),
    Vec3::new(0.0, 0.45, 0.25),
];

fn demo_pose(body: BoneTransform, neck: Quat, head: Quat) -> AnimationFrame {
    AnimationFrame::from_transforms(&[
        BoneTransform::new(DEMO_BIND_OFFSETS[0] + body.translation, body.rotation, body.scale),
        BoneTransform::new(DEMO_BIND_OFFSETS[1], neck, Vec3::ONE),
        BoneTransform::new(DEMO_BIND_OFFSETS[2], head, Vec3::ONE),
    ])
}

/// 演示用的三骨骼鸭子骨骼
///
/// 片段："idle variation"（上下起伏、点头）、"walk"（左右摇摆）、"walk forward"（敌人巡逻）。
pub fn demo_rig() -> AnimationResult<AnimationSet> {
    let names = ["body", "neck", "head"];
    let mut bind_world = Mat4::IDENTITY;
    let mut bones = Vec::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        bind_world *= Mat4::from_translation(DEMO_BIND_OFFSETS[i]);
        let parent = if i == 0 { None } else { Some(i - 1) };
        bones.push(Bone::new(*name, parent).with_inverse_bind_pose(bind_world.inverse()));
    }
    let skeleton = Skeleton::new(bones, Mat4::IDENTITY)?;

    let rest = BoneTransform::identity();
    let nod = |deg: f32| Quat::from_rotation_x(deg.to_radians());
    let sway = |deg: f32| Quat::from_rotation_z(deg.to_radians());
    let lift = |y: f32| BoneTransform::new(Vec3::new(0.0, y, 0.0), Quat::IDENTITY, Vec3::ONE);

    let idle = AnimationClip::new(
        "idle variation",
        2.0,
        vec![
            demo_pose(rest, Quat::IDENTITY, Quat::IDENTITY),
            demo_pose(lift(0.05), nod(5.0), nod(10.0)),
            demo_pose(rest, Quat::IDENTITY, Quat::IDENTITY),
        ],
    );

    let walk_frames = [0.0_f32, 10.0, 0.0, -10.0, 0.0]
        .iter()
        .map(|&deg| {
            let body = BoneTransform::new(
                Vec3::new(0.0, deg.abs() * 0.004, 0.0),
                sway(deg),
                Vec3::ONE,
            );
            demo_pose(body, nod(15.0), sway(-deg * 0.5))
        })
        .collect();
    let walk = AnimationClip::new("walk", 8.0, walk_frames);

    let patrol_frames = [0.0_f32, 15.0, 0.0, -15.0, 0.0]
        .iter()
        .map(|&deg| {
            let turn = Quat::from_rotation_y(deg.to_radians() * 0.3);
            let body = BoneTransform::new(Vec3::ZERO, turn, Vec3::ONE);
            demo_pose(body, nod(deg * 0.5), Quat::IDENTITY)
        })
        .collect();
    let patrol = AnimationClip::new("walk forward", 6.0, patrol_frames);

    AnimationSet::new(skeleton, vec![idle, walk, patrol])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AnimationError;

    const TWO_BONE_RIG: &str = r#"{
        "bones": [
            { "name": "root" },
            { "name": "child", "parent": 0 }
        ],
        "clips": [{
            "name": "clip",
            "ticks_per_second": 1.0,
            "frames": [
                {
                    "positions": [[0,0,0],[0,0,0]],
                    "rotations": [[0,0,0,1],[0,0,0,1]],
                    "scales": [[1,1,1],[1,1,1]]
                },
                {
                    "positions": [[1,0,0],[0,0,0]],
                    "rotations": [[0,0,0,1],[0,0.70710677,0,0.70710677]],
                    "scales": [[1,1,1],[1,1,1]]
                }
            ]
        }]
    }"#;

    #[test]
    fn test_parse_two_bone_rig() {
        let set = RigAsset::from_json_str(TWO_BONE_RIG)
            .unwrap()
            .into_animation_set()
            .unwrap();
        assert_eq!(set.skeleton().bone_count(), 2);
        assert_eq!(set.skeleton().parent_of(1), Some(0));
        assert_eq!(set.skeleton().global_inverse(), Mat4::IDENTITY);
        assert_eq!(set.clip("clip").unwrap().frame_count(), 2);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rig.json");
        std::fs::write(&path, TWO_BONE_RIG).unwrap();

        let set = RigAsset::load(&path).unwrap();
        assert_eq!(set.skeleton().bone_count(), 2);
        assert!(set.contains("clip"));

        std::fs::write(&path, "{ not json").unwrap();
        let err = RigAsset::load(&path).unwrap_err();
        assert!(matches!(err, AssetError::InvalidFormat { .. }));
    }

    #[test]
    fn test_channel_mismatch_fails_at_load() {
        // 第 0 帧的缩放通道少一根骨骼
        let broken = TWO_BONE_RIG.replacen("[[1,1,1],[1,1,1]]", "[[1,1,1]]", 1);
        let err = RigAsset::from_json_str(&broken)
            .unwrap()
            .into_animation_set()
            .unwrap_err();
        assert!(matches!(
            err,
            AssetError::Animation(AnimationError::ChannelMismatch {
                channel: "scales",
                frame: 0,
                ..
            })
        ));
    }

    #[test]
    fn test_negative_parent_rejected() {
        let json = r#"{ "bones": [{ "name": "root", "parent": -3 }] }"#;
        let err = RigAsset::from_json_str(json)
            .unwrap()
            .into_animation_set()
            .unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
    }

    #[test]
    fn test_malformed_json_is_decode_error() {
        assert!(matches!(
            RigAsset::from_json_str("{ \"bones\": 5 }"),
            Err(AssetError::Decode(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = RigAsset::load("does/not/exist.json").unwrap_err();
        assert!(matches!(err, AssetError::NotFound { .. }));
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("duck.json");
        let json = RigAsset::from_animation_set(&demo_rig().unwrap())
            .to_json_string()
            .unwrap();
        fs::write(&path, json).unwrap();

        let set = RigAsset::load(&path).unwrap();
        assert_eq!(set.clip_names(), vec!["idle variation", "walk", "walk forward"]);
        assert_eq!(set.skeleton().bone_index("head"), Some(2));
    }

    #[test]
    fn test_demo_rig_bind_pose() {
        let set = demo_rig().unwrap();
        let skeleton = set.skeleton();
        assert_eq!(skeleton.bone_count(), 3);

        // 头部绑定位置为三段偏移之和
        let head = skeleton.bind_pose_matrices()[2].w_axis.truncate();
        let expected = DEMO_BIND_OFFSETS.iter().copied().sum::<Vec3>();
        assert!((head - expected).length() < 1e-5);
    }
}
