//! 环绕相机
//!
//! 相机绕目标点旋转；目标点只能在 X/Y 方向的 ±10 范围内移动，越界的移动被忽略。

use glam::{Mat4, Vec3};

/// 视场角（度）
pub const FOV_DEGREES: f32 = 60.0;
pub const Z_NEAR: f32 = 0.01;
pub const Z_FAR: f32 = 1000.0;

/// 目标点 X/Y 的活动范围
pub const TARGET_LIMIT: f32 = 10.0;

/// 与目标点的最小距离
const MIN_DISTANCE: f32 = 2.0;

/// 环绕相机
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitCamera {
    pub from: Vec3,
    pub to: Vec3,
    pub up: Vec3,
    pub fov_degrees: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Vec3::new(8.0, 6.5, 8.0), Vec3::new(0.0, 1.0, 0.0), Vec3::Y)
    }
}

impl OrbitCamera {
    pub fn new(from: Vec3, to: Vec3, up: Vec3) -> Self {
        Self {
            from,
            to,
            up,
            fov_degrees: FOV_DEGREES,
        }
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov_degrees = fov_degrees;
        self
    }

    /// 目标点沿 Y 移动，超出范围时不动
    pub fn move_target_y(&mut self, value: f32) {
        let y = self.to.y + value;
        if y.abs() <= TARGET_LIMIT {
            self.to.y = y;
        }
    }

    /// 目标点沿 X 移动，超出范围时不动
    pub fn move_target_x(&mut self, value: f32) {
        let x = self.to.x + value;
        if x.abs() <= TARGET_LIMIT {
            self.to.x = x;
        }
    }

    /// 绕目标点的 Y 轴旋转（弧度），保持高度
    pub fn rotate(&mut self, angle: f32) {
        let offset = self.from - self.to;
        let (sin, cos) = angle.sin_cos();
        let x = offset.x * cos - offset.z * sin;
        let z = offset.x * sin + offset.z * cos;
        self.from = Vec3::new(x + self.to.x, self.from.y, z + self.to.z);
    }

    /// 沿视线拉近（正值）或推远
    pub fn zoom(&mut self, amount: f32) {
        let offset = self.from - self.to;
        let distance = (offset.length() - amount).max(MIN_DISTANCE);
        self.from = self.to + offset.normalize_or_zero() * distance;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.from, self.to, self.up)
    }

    pub fn projection(&self, aspect_ratio: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_degrees.to_radians(), aspect_ratio, Z_NEAR, Z_FAR)
    }

    pub fn view_proj(&self, aspect_ratio: f32) -> Mat4 {
        self.projection(aspect_ratio) * self.view()
    }
}
