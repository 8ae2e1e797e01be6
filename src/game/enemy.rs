//! 巡逻敌人
//!
//! 敌人沿 X 或 Z 轴在起点和终点之间往返。移动每 4 次更新才发生一次；
//! 到达终点后交换起点和终点并转身 180°。

use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};

use super::collision::Aabb;
use crate::animation::{AnimationInstance, AnimationService, AnimationSet, EndOfClip};
use crate::core::error::AnimationResult;

/// 默认巡逻速度（每次移动的距离）
pub const WALK_VELOCITY: f32 = 0.09;
/// 两次移动之间跳过的更新次数
pub const LOADING_FRAMES: u32 = 3;
/// 默认碰撞盒边长
pub const ENEMY_BOX_SIZE: f32 = 2.0;

const ARRIVAL_EPSILON: f32 = 0.001;

/// 巡逻方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatrolAxis {
    X,
    Z,
}

impl PatrolAxis {
    fn component_mut(self, v: &mut Vec3) -> &mut f32 {
        match self {
            PatrolAxis::X => &mut v.x,
            PatrolAxis::Z => &mut v.z,
        }
    }

    fn component(self, v: Vec3) -> f32 {
        match self {
            PatrolAxis::X => v.x,
            PatrolAxis::Z => v.z,
        }
    }
}

/// 巡逻敌人
pub struct Enemy {
    pub position: Vec3,
    pub start: Vec3,
    pub end: Vec3,
    pub axis: PatrolAxis,
    /// 绕 Y 轴的朝向（度）
    pub rotation_degrees: f32,
    pub velocity: f32,
    pub size: Vec3,
    pub scale: f32,
    loading_frame: u32,
    clip: String,
    animation: AnimationInstance,
}

impl Enemy {
    pub fn new(
        animation: Arc<AnimationSet>,
        clip: impl Into<String>,
        start: Vec3,
        end: Vec3,
        axis: PatrolAxis,
        rotation_degrees: f32,
    ) -> Self {
        Self {
            position: start,
            start,
            end,
            axis,
            rotation_degrees,
            velocity: WALK_VELOCITY,
            size: Vec3::splat(ENEMY_BOX_SIZE),
            scale: 1.0,
            loading_frame: 0,
            clip: clip.into(),
            animation: AnimationInstance::init(animation, 0),
        }
    }

    pub fn with_velocity(mut self, velocity: f32) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_size(mut self, size: Vec3) -> Self {
        self.size = size;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// 巡逻一步
    ///
    /// 前 `LOADING_FRAMES` 次调用只计数，第 4 次才真正移动。
    pub fn patrol(&mut self) {
        if self.loading_frame < LOADING_FRAMES {
            self.loading_frame += 1;
            return;
        }
        self.loading_frame = 0;

        let target = self.axis.component(self.end);
        let current = self.axis.component(self.position);
        if (target - current).abs() <= ARRIVAL_EPSILON {
            return;
        }

        let step = self.velocity.copysign(target - current);
        let next = current + step;
        let reached = (step > 0.0 && next >= target) || (step < 0.0 && next <= target);
        *self.axis.component_mut(&mut self.position) = if reached { target } else { next };

        if reached {
            std::mem::swap(&mut self.start, &mut self.end);
            self.rotation_degrees = (self.rotation_degrees + 180.0) % 360.0;
            tracing::trace!(target: "game", position = ?self.position, "Enemy turned around");
        }
    }

    /// 巡逻并推进循环动画
    pub fn update(&mut self, dt: f32) -> AnimationResult<()> {
        self.patrol();
        AnimationService::advance(&mut self.animation, &self.clip, dt, EndOfClip::Loop)?;
        Ok(())
    }

    pub fn reset_position(&mut self) {
        self.position = self.start;
        self.loading_frame = 0;
    }

    /// `T × R_y × S`
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_quat(Quat::from_rotation_y(self.rotation_degrees.to_radians()))
            * Mat4::from_scale(Vec3::splat(self.scale))
    }

    /// 碰撞盒（位置为脚底中心）
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_size(self.position + Vec3::Y * (self.size.y * 0.5), self.size)
    }

    pub fn animation(&self) -> &AnimationInstance {
        &self.animation
    }

    pub fn clip(&self) -> &str {
        &self.clip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::demo_rig;

    fn enemy(start: Vec3, end: Vec3, axis: PatrolAxis) -> Enemy {
        let rig = Arc::new(demo_rig().unwrap());
        Enemy::new(rig, "walk forward", start, end, axis, 90.0)
    }

    #[test]
    fn test_moves_every_fourth_update() {
        let mut e = enemy(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), PatrolAxis::X);
        for _ in 0..3 {
            e.patrol();
            assert_eq!(e.position.x, 0.0);
        }
        e.patrol();
        assert!((e.position.x - WALK_VELOCITY).abs() < 1e-6);

        for _ in 0..4 {
            e.patrol();
        }
        assert!((e.position.x - 2.0 * WALK_VELOCITY).abs() < 1e-6);
    }

    #[test]
    fn test_swaps_endpoints_and_turns() {
        let start = Vec3::new(0.0, 0.0, 0.0);
        let end = Vec3::new(0.0, 0.0, -0.2);
        let mut e = enemy(start, end, PatrolAxis::Z).with_velocity(0.15);
        for _ in 0..8 {
            e.patrol();
        }
        assert_eq!(e.position.z, -0.2);
        assert_eq!(e.start, end);
        assert_eq!(e.end, start);
        assert_eq!(e.rotation_degrees, 270.0);

        // 往回走
        for _ in 0..4 {
            e.patrol();
        }
        assert!((e.position.z - (-0.05)).abs() < 1e-6);
    }

    #[test]
    fn test_stationary_when_endpoints_match() {
        let p = Vec3::new(-10.0, 6.0, -2.0);
        let mut e = enemy(p, p, PatrolAxis::Z);
        for _ in 0..12 {
            e.patrol();
        }
        assert_eq!(e.position, p);
        assert_eq!(e.rotation_degrees, 90.0);
    }

    #[test]
    fn test_world_matrix_is_trs() {
        let e = enemy(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, PatrolAxis::X).with_scale(0.5);
        let m = e.world_matrix();
        assert!(m.w_axis.truncate().abs_diff_eq(Vec3::new(1.0, 2.0, 3.0), 1e-6));
        // 90° 绕 Y：+X 轴转到 -Z
        let x = m.transform_vector3(Vec3::X);
        assert!(x.abs_diff_eq(Vec3::new(0.0, 0.0, -0.5), 1e-6));
    }

    #[test]
    fn test_update_loops_animation() {
        let mut e = enemy(Vec3::ZERO, Vec3::X, PatrolAxis::X);
        for _ in 0..200 {
            e.update(0.05).unwrap();
        }
        assert_eq!(e.animation().current_clip(), Some("walk forward"));
        assert!(!e.animation().animation_finished());
    }
}
