//! 游戏逻辑
//!
//! 鸭子角色、巡逻敌人、金币和方块关卡，以及环绕相机。
//! 与 GPU 无关，绘制通过 [`Level::drawables`] 输出纯数据记录。

pub mod camera;
pub mod character;
pub mod collision;
pub mod enemy;
pub mod level;

pub use camera::OrbitCamera;
pub use character::{Character, MoveIntent};
pub use collision::{Aabb, Axis};
pub use enemy::{Enemy, PatrolAxis};
pub use level::{Block, BlockKind, Level, LevelMeshes};
