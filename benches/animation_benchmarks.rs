//! 动画与常量暂存性能基准测试
//!
//! 测试骨骼姿态计算和每帧常量写入的开销

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use cube_duck::animation::{
    demo_rig, AnimationClip, AnimationFrame, AnimationInstance, AnimationSet, Bone, Skeleton,
    MAX_BONES,
};
use cube_duck::render::{stage_skinned, ConstantBufferRing, SkinnedConstants};
use glam::{Mat4, Quat, Vec3, Vec4};
use std::sync::Arc;

/// 每根骨骼挂在上一根下面的链状骨骼
fn chain_rig(bone_count: usize) -> AnimationSet {
    let bones = (0..bone_count)
        .map(|i| Bone::new(format!("bone_{i}"), i.checked_sub(1)))
        .collect();
    let skeleton = Skeleton::new(bones, Mat4::IDENTITY).unwrap();

    let frames = (0..8)
        .map(|f| {
            let angle = f as f32 * 0.1;
            AnimationFrame::new(
                vec![Vec3::new(0.0, 0.1, 0.0); bone_count],
                vec![Quat::from_rotation_z(angle); bone_count],
                vec![Vec3::ONE; bone_count],
            )
        })
        .collect();
    AnimationSet::new(skeleton, vec![AnimationClip::new("bend", 24.0, frames)]).unwrap()
}

fn bench_pose_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("pose_update");

    for bone_count in [3usize, 64, MAX_BONES].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(bone_count),
            bone_count,
            |b, &count| {
                let mut instance = AnimationInstance::init(Arc::new(chain_rig(count)), 0);
                b.iter(|| {
                    instance.update("bend", black_box(0.004)).unwrap();
                    if instance.animation_finished() {
                        instance.reset_animation_time();
                    }
                    black_box(instance.bone_matrices()[count - 1])
                });
            },
        );
    }

    group.finish();
}

fn bench_stage_skinned(c: &mut Criterion) {
    let rig = Arc::new(demo_rig().unwrap());
    let mut duck = AnimationInstance::init(rig, 0);
    duck.update("walk", 0.1).unwrap();

    c.bench_function("stage_skinned_frame", |b| {
        let mut ring = ConstantBufferRing::cpu_only("bench", SkinnedConstants::layout(), 64);
        let mut frame = 0;
        b.iter(|| {
            ring.begin_frame(frame).unwrap();
            for _ in 0..16 {
                let offset = stage_skinned(
                    &mut ring,
                    Mat4::IDENTITY,
                    Mat4::IDENTITY,
                    Vec4::ONE,
                    duck.bone_matrices(),
                )
                .unwrap();
                black_box(offset);
            }
            frame = (frame + 1) % 2;
        });
    });
}

criterion_group!(benches, bench_pose_update, bench_stage_skinned);
criterion_main!(benches);
