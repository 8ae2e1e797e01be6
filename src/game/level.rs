//! 关卡
//!
//! 方块布局、金币、巡逻敌人和玩家角色。`update` 推进所有物体并处理碰撞，
//! `drawables` 生成本帧的绘制列表。

use std::f32::consts::TAU;
use std::sync::Arc;

use glam::{Mat4, Quat, Vec3, Vec4};

use super::character::{Character, MoveIntent};
use super::collision::Aabb;
use super::enemy::{Enemy, PatrolAxis};
use crate::animation::AnimationSet;
use crate::config::AnimationConfig;
use crate::core::error::{AnimationError, AnimationResult};
use crate::render::{Drawable, MeshId};

/// 方块边长
pub const CUBE_SIZE: f32 = 2.0;
/// 相邻方块的间距（略小于边长，方块之间轻微重叠）
const CUBE_SPACING: f32 = 1.95;
const CUBE_Y_OFFSET: f32 = -0.15;

/// 金币拾取盒边长
pub const COIN_SIZE: f32 = 1.0;

const DUCK_SPAWN: Vec3 = Vec3::new(8.0, 16.0, -3.0);

/// 方块种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    DarkDirt,
    LightDirt,
    Grass,
}

impl BlockKind {
    pub fn tint(self) -> Vec4 {
        match self {
            BlockKind::DarkDirt => Vec4::new(0.36, 0.25, 0.16, 1.0),
            BlockKind::LightDirt => Vec4::new(0.66, 0.5, 0.34, 1.0),
            BlockKind::Grass => Vec4::new(0.3, 0.7, 0.25, 1.0),
        }
    }
}

/// 单个方块
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub center: Vec3,
    pub kind: BlockKind,
}

/// 关卡使用的网格
#[derive(Debug, Clone, Copy)]
pub struct LevelMeshes {
    pub cube: MeshId,
    pub duck: MeshId,
    pub enemy: MeshId,
}

/// 关卡
pub struct Level {
    blocks: Vec<Block>,
    block_bounds: Vec<Aabb>,
    coins: Vec<Vec3>,
    enemies: Vec<Enemy>,
    duck: Character,
    time_acc: f32,
}

/// 在 `start` 处堆出 ny × nx × nz 个方块
fn fill_blocks(blocks: &mut Vec<Block>, start: Vec3, ny: u32, nx: u32, nz: u32, kind: BlockKind) {
    for y in 0..ny {
        for x in 0..nx {
            for z in 0..nz {
                let center = Vec3::new(
                    start.x + x as f32 * CUBE_SPACING,
                    start.y + y as f32 * CUBE_SPACING + CUBE_Y_OFFSET,
                    start.z + z as f32 * CUBE_SPACING,
                );
                blocks.push(Block { center, kind });
            }
        }
    }
}

impl Level {
    /// 由方块、金币和敌人组装关卡
    pub fn new(blocks: Vec<Block>, coins: Vec<Vec3>, enemies: Vec<Enemy>, duck: Character) -> Self {
        let block_bounds = blocks
            .iter()
            .map(|b| Aabb::from_center_size(b.center, Vec3::splat(CUBE_SIZE)))
            .collect();
        Self {
            blocks,
            block_bounds,
            coins,
            enemies,
            duck,
            time_acc: 0.0,
        }
    }

    /// 演示关卡
    ///
    /// 角色和敌人使用的动画片段必须都存在于骨骼动画中。
    pub fn demo(rig: Arc<AnimationSet>, config: &AnimationConfig) -> AnimationResult<Self> {
        for clip in [&config.idle_clip, &config.walk_clip, &config.enemy_clip] {
            if !rig.contains(clip) {
                return Err(AnimationError::ClipNotFound(clip.clone()));
            }
        }

        use BlockKind::*;
        let layout: [(Vec3, u32, u32, u32, BlockKind); 17] = [
            // 底座 + 右侧
            (Vec3::new(-10.0, 0.0, -10.0), 1, 10, 10, DarkDirt),
            (Vec3::new(-10.0, 2.0, -10.0), 1, 10, 10, LightDirt),
            (Vec3::new(4.0, 4.0, -10.0), 1, 3, 10, Grass),
            // 柱子
            (Vec3::new(4.0, 6.0, -4.0), 3, 1, 2, LightDirt),
            (Vec3::new(8.0, 6.0, -4.0), 3, 1, 2, LightDirt),
            (Vec3::new(4.0, 12.0, -6.0), 1, 3, 4, LightDirt),
            // 桥
            (Vec3::new(-10.0, 12.0, -4.0), 1, 7, 2, LightDirt),
            // 左侧底座
            (Vec3::new(-10.0, 4.0, -10.0), 1, 4, 10, LightDirt),
            (Vec3::new(-10.0, 6.0, 8.0), 4, 4, 1, LightDirt),
            (Vec3::new(-10.0, 12.0, 0.0), 1, 4, 4, LightDirt),
            // 左侧隧道
            (Vec3::new(-8.0, 6.0, -6.0), 2, 2, 6, LightDirt),
            (Vec3::new(-4.0, 6.0, -6.0), 3, 1, 4, LightDirt),
            (Vec3::new(-4.0, 6.0, 6.0), 3, 1, 2, LightDirt),
            (Vec3::new(-10.0, 6.0, -10.0), 4, 4, 1, LightDirt),
            (Vec3::new(-10.0, 10.0, -8.0), 2, 1, 2, LightDirt),
            (Vec3::new(-4.0, 12.0, -8.0), 1, 1, 2, LightDirt),
            // 草台
            (Vec3::new(0.0, 4.0, -10.0), 1, 1, 2, Grass),
        ];
        let mut blocks = Vec::new();
        for (start, ny, nx, nz, kind) in layout {
            fill_blocks(&mut blocks, start, ny, nx, nz, kind);
        }

        let coins = vec![
            Vec3::new(8.0, 6.5, 7.5),
            Vec3::new(0.0, 14.0, -3.0),
            Vec3::new(2.0, 14.0, -3.0),
            Vec3::new(-2.0, 14.0, -3.0),
            Vec3::new(-4.0, 14.0, 8.0),
            Vec3::new(-6.0, 14.0, 8.0),
            Vec3::new(-8.0, 14.0, 8.0),
            Vec3::new(-10.0, 14.0, 8.0),
        ];

        let clip = config.enemy_clip.as_str();
        let enemies = vec![
            Enemy::new(
                rig.clone(),
                clip,
                Vec3::new(-10.0, 14.0, 6.0),
                Vec3::new(-4.0, 14.0, 6.0),
                PatrolAxis::X,
                -90.0,
            ),
            Enemy::new(
                rig.clone(),
                clip,
                Vec3::new(-4.0, 14.0, 1.0),
                Vec3::new(-10.0, 14.0, 1.0),
                PatrolAxis::X,
                90.0,
            ),
            Enemy::new(
                rig.clone(),
                clip,
                Vec3::new(-10.0, 6.0, -2.0),
                Vec3::new(-10.0, 6.0, -2.0),
                PatrolAxis::Z,
                180.0,
            )
            .with_size(Vec3::new(1.0, 1.0, 2.0))
            .with_scale(0.7),
            Enemy::new(
                rig.clone(),
                clip,
                Vec3::new(6.0, 6.2, 8.0),
                Vec3::new(6.0, 6.2, 0.0),
                PatrolAxis::Z,
                0.0,
            )
            .with_size(Vec3::new(1.0, 1.0, 2.0))
            .with_scale(0.7)
            .with_velocity(0.15),
        ];

        let duck = Character::new(rig, config, DUCK_SPAWN);

        let level = Self::new(blocks, coins, enemies, duck);
        tracing::info!(
            target: "game",
            blocks = level.blocks.len(),
            coins = level.coins.len(),
            enemies = level.enemies.len(),
            "Level loaded"
        );
        Ok(level)
    }

    /// 推进一帧并处理碰撞
    pub fn update(&mut self, dt: f32, intent: MoveIntent) -> AnimationResult<()> {
        self.time_acc = (self.time_acc + dt) % TAU;

        self.duck.update(dt, intent, &self.block_bounds)?;
        for enemy in &mut self.enemies {
            enemy.update(dt)?;
        }

        self.check_coins();
        self.check_enemies();
        Ok(())
    }

    fn check_coins(&mut self) {
        let duck = self.duck.bounds();
        if let Some(index) = self
            .coins
            .iter()
            .position(|c| duck.overlaps(&Aabb::from_center_size(*c, Vec3::splat(COIN_SIZE))))
        {
            self.coins.remove(index);
            self.duck.collect_coin();
        }
    }

    fn check_enemies(&mut self) {
        if self.duck.is_dead() {
            return;
        }
        let duck = self.duck.bounds();
        if self.enemies.iter().any(|e| duck.overlaps(&e.bounds())) {
            self.duck.kill();
        }
    }

    /// 角色和敌人回到起点
    pub fn reset(&mut self) {
        self.duck.reset_position();
        for enemy in &mut self.enemies {
            enemy.reset_position();
        }
    }

    /// 本帧的绘制列表
    pub fn drawables(&self, meshes: &LevelMeshes) -> Vec<Drawable<'_>> {
        let capacity = self.blocks.len() + self.coins.len() + self.enemies.len() + 1;
        let mut draws = Vec::with_capacity(capacity);

        for block in &self.blocks {
            let world =
                Mat4::from_translation(block.center) * Mat4::from_scale(Vec3::splat(CUBE_SIZE));
            draws.push(Drawable::static_mesh(meshes.cube, world, block.kind.tint()));
        }

        let spin = Quat::from_rotation_y(self.time_acc * 2.0);
        for coin in &self.coins {
            let world =
                Mat4::from_scale_rotation_translation(Vec3::new(0.8, 0.8, 0.2), spin, *coin);
            draws.push(Drawable::static_mesh(
                meshes.cube,
                world,
                Vec4::new(1.0, 0.8, 0.1, 1.0),
            ));
        }

        for enemy in &self.enemies {
            draws.push(Drawable::skinned(
                meshes.enemy,
                enemy.world_matrix(),
                Vec4::new(0.55, 0.35, 0.3, 1.0),
                enemy.animation().bone_matrices(),
            ));
        }

        let duck_tint = if self.duck.is_dead() {
            Vec4::new(0.4, 0.4, 0.4, 1.0)
        } else {
            Vec4::new(1.0, 0.95, 0.85, 1.0)
        };
        draws.push(Drawable::skinned(
            meshes.duck,
            self.duck.world_matrix(),
            duck_tint,
            self.duck.animation().bone_matrices(),
        ));

        draws
    }

    pub fn duck(&self) -> &Character {
        &self.duck
    }

    pub fn duck_mut(&mut self) -> &mut Character {
        &mut self.duck
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn coins(&self) -> &[Vec3] {
        &self.coins
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }
}
