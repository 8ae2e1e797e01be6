//! 玩家角色（鸭子）
//!
//! 移动按轴分别解算：X、Z 方向撞到方块时该轴不动；
//! Y 方向落到方块上时结束跳跃并视为着地。

use std::sync::Arc;

use glam::{Mat4, Quat, Vec2, Vec3};

use super::collision::Aabb;
use crate::animation::{AnimationInstance, AnimationService, AnimationSet, EndOfClip};
use crate::config::AnimationConfig;
use crate::core::error::AnimationResult;

/// 水平移动速度（单位/秒）
pub const MOVE_SPEED: f32 = 4.0;
/// 最大跳跃高度
pub const JUMP_HEIGHT: f32 = 2.0;
/// 上升速度（单位/秒）
pub const JUMP_SPEED: f32 = 6.0;
/// 下落速度（单位/秒）
pub const FALL_SPEED: f32 = 6.0;
/// 碰撞盒边长
pub const DUCK_BOX_SIZE: f32 = 1.0;

/// 每帧的移动意图
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveIntent {
    /// 水平方向（x, z），长度大于 1 时会被归一化
    pub direction: Vec2,
    pub jump: bool,
}

/// 玩家角色
pub struct Character {
    pub position: Vec3,
    pub spawn: Vec3,
    /// 绕 Y 轴的朝向（度）
    pub facing_degrees: f32,
    pub scale: f32,
    pub size: Vec3,
    is_jumping: bool,
    jump_height: f32,
    on_ground: bool,
    is_dead: bool,
    coins: u32,
    idle_clip: String,
    walk_clip: String,
    current_clip: String,
    playback_speed: f32,
    animation: AnimationInstance,
}

impl Character {
    pub fn new(animation: Arc<AnimationSet>, config: &AnimationConfig, spawn: Vec3) -> Self {
        Self {
            position: spawn,
            spawn,
            facing_degrees: 0.0,
            scale: 1.0,
            size: Vec3::splat(DUCK_BOX_SIZE),
            is_jumping: false,
            jump_height: 0.0,
            on_ground: false,
            is_dead: false,
            coins: 0,
            idle_clip: config.idle_clip.clone(),
            walk_clip: config.walk_clip.clone(),
            current_clip: config.idle_clip.clone(),
            playback_speed: config.playback_speed,
            animation: AnimationInstance::init(animation, 0),
        }
    }

    /// 推进一帧：移动、跳跃/重力、方块碰撞、动画
    pub fn update(&mut self, dt: f32, intent: MoveIntent, blocks: &[Aabb]) -> AnimationResult<()> {
        let mut moving = false;
        if !self.is_dead {
            let direction = intent.direction.clamp_length_max(1.0);
            if direction.length_squared() > 0.0 {
                moving = true;
                self.facing_degrees = direction.x.atan2(direction.y).to_degrees();
                let step = direction * MOVE_SPEED * dt;
                self.try_move(Vec3::new(step.x, 0.0, 0.0), blocks);
                self.try_move(Vec3::new(0.0, 0.0, step.y), blocks);
            }

            if intent.jump && self.on_ground && !self.is_jumping {
                self.is_jumping = true;
                self.jump_height = 0.0;
            }
            self.apply_vertical(dt, blocks);
        }

        self.current_clip = if moving {
            self.walk_clip.clone()
        } else {
            self.idle_clip.clone()
        };
        AnimationService::advance(
            &mut self.animation,
            &self.current_clip,
            dt * self.playback_speed,
            EndOfClip::Loop,
        )?;
        Ok(())
    }

    fn apply_vertical(&mut self, dt: f32, blocks: &[Aabb]) {
        let dy = if self.is_jumping {
            let rise = (JUMP_SPEED * dt).min(JUMP_HEIGHT - self.jump_height);
            self.jump_height += rise;
            if self.jump_height >= JUMP_HEIGHT {
                self.is_jumping = false;
            }
            rise
        } else {
            -FALL_SPEED * dt
        };

        if self.try_move(Vec3::new(0.0, dy, 0.0), blocks) {
            self.on_ground = false;
        } else {
            self.is_jumping = false;
            self.jump_height = 0.0;
            self.on_ground = dy < 0.0;
        }
    }

    /// 尝试移动，碰撞时保持原位并返回 false
    fn try_move(&mut self, delta: Vec3, blocks: &[Aabb]) -> bool {
        let moved = self.bounds().translated(delta);
        if blocks.iter().any(|b| moved.overlaps(b)) {
            return false;
        }
        self.position += delta;
        true
    }

    /// 碰撞盒（位置为脚底中心）
    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_size(self.position + Vec3::Y * (self.size.y * 0.5), self.size)
    }

    /// `T × R_y × S`
    pub fn world_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position)
            * Mat4::from_quat(Quat::from_rotation_y(self.facing_degrees.to_radians()))
            * Mat4::from_scale(Vec3::splat(self.scale))
    }

    pub fn collect_coin(&mut self) {
        self.coins += 1;
        tracing::info!(target: "game", coins = self.coins, "Coin collected");
    }

    pub fn kill(&mut self) {
        if !self.is_dead {
            self.is_dead = true;
            tracing::info!(target: "game", position = ?self.position, "Duck died");
        }
    }

    /// 回到出生点并复活，金币数保留
    pub fn reset_position(&mut self) {
        self.position = self.spawn;
        self.is_dead = false;
        self.is_jumping = false;
        self.jump_height = 0.0;
        self.on_ground = false;
    }

    pub fn is_dead(&self) -> bool {
        self.is_dead
    }

    pub fn is_jumping(&self) -> bool {
        self.is_jumping
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn current_clip(&self) -> &str {
        &self.current_clip
    }

    pub fn animation(&self) -> &AnimationInstance {
        &self.animation
    }
}
