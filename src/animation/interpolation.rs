//! 关键帧插值
//!
//! 平移与缩放使用线性插值，旋转使用最短弧球面线性插值。

use glam::{Mat4, Quat, Vec3, Vec4};

/// 点积超过该阈值时两个四元数几乎重合，改用归一化线性插值避免除以接近零的 sin(θ)
pub const SLERP_LINEAR_THRESHOLD: f32 = 0.9995;

/// 线性插值
#[inline]
pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
    a + (b - a) * t
}

/// 最短弧球面线性插值
///
/// 两个输入先归一化；若点积为负则取反 `b`，保证沿短弧插值。
/// 因此对任意 `dot(a, b) < 0`，`slerp_shortest(a, b, t)` 与
/// `slerp_shortest(a, -b, t)` 按位相等。
pub fn slerp_shortest(a: Quat, b: Quat, t: f32) -> Quat {
    let a = Vec4::from(a.normalize());
    let mut b = Vec4::from(b.normalize());

    let mut dot = a.dot(b);
    if dot < 0.0 {
        b = -b;
        dot = -dot;
    }

    let blended = if dot > SLERP_LINEAR_THRESHOLD {
        a + (b - a) * t
    } else {
        let theta = dot.acos();
        let sin_theta = theta.sin();
        let wa = ((1.0 - t) * theta).sin() / sin_theta;
        let wb = (t * theta).sin() / sin_theta;
        a * wa + b * wb
    };

    Quat::from_vec4(blended).normalize()
}

/// 组合局部变换：平移 × 旋转 × 缩放
#[inline]
pub fn compose_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Mat4 {
    Mat4::from_scale_rotation_translation(scale, rotation, translation)
}
