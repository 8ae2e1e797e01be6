//! 轴对齐包围盒碰撞

use glam::Vec3;

/// 坐标轴
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn component(self, v: Vec3) -> f32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
            Axis::Z => v.z,
        }
    }
}

/// 以中心和半边长表示的轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec3,
    pub half_extents: Vec3,
}

impl Aabb {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
        }
    }

    /// 由中心和完整边长构造
    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        Self::new(center, size * 0.5)
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    pub fn size(&self) -> Vec3 {
        self.half_extents * 2.0
    }

    /// 平移后的包围盒
    pub fn translated(&self, delta: Vec3) -> Self {
        Self::new(self.center + delta, self.half_extents)
    }

    /// 在单个轴上的投影是否重叠（边界相接不算）
    pub fn overlaps_axis(&self, other: &Aabb, axis: Axis) -> bool {
        let distance = (axis.component(self.center) - axis.component(other.center)).abs();
        distance < axis.component(self.half_extents) + axis.component(other.half_extents)
    }

    /// 三个轴上同时重叠
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.overlaps_axis(other, Axis::X)
            && self.overlaps_axis(other, Axis::Y)
            && self.overlaps_axis(other, Axis::Z)
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        let d = (point - self.center).abs();
        d.x <= self.half_extents.x && d.y <= self.half_extents.y && d.z <= self.half_extents.z
    }
}
