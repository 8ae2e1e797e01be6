//! 引擎主入口
//!
//! 定义 `Engine` 和演示程序的主运行循环。

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use glam::{Vec2, Vec3};
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, Event, KeyEvent, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop, EventLoopWindowTarget};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowBuilder};

use super::error::{EngineError, EngineResult};
use crate::animation::{demo_rig, AnimationSet, RigAsset};
use crate::config::{AnimationConfig, EngineConfig, LoggingConfig};
use crate::game::{Level, LevelMeshes, MoveIntent, OrbitCamera};
use crate::render::mesh::unit_cube;
use crate::render::skinned::rig_box_mesh;
use crate::render::{
    FrameResourceRing, GpuContext, GpuMesh, ShaderCache, SkinnedRenderer, WgpuSubmission,
};

/// 单帧时间步长上限（秒），窗口拖动等长停顿后避免穿模
const MAX_FRAME_DT: f32 = 0.1;
/// 相机旋转速度（弧度/秒）
const CAMERA_ROTATE_SPEED: f32 = 1.5;
/// 相机目标点移动速度（单位/秒）
const CAMERA_PAN_SPEED: f32 = 4.0;

/// 游戏引擎主结构
///
/// `Engine` 是演示程序的入口点，负责：
/// - 加载配置并初始化日志
/// - 创建窗口、GPU 设备和渲染器
/// - 驱动每帧的更新、常量暂存和命令提交
///
/// # 示例
///
/// ```no_run
/// use cube_duck::core::Engine;
///
/// fn main() -> Result<(), Box<dyn std::error::Error>> {
///     Engine::run()?;
///     Ok(())
/// }
/// ```
///
/// # 生命周期
///
/// 1. **初始化阶段**：配置、日志、骨骼动画、窗口、设备、网格上传
/// 2. **运行阶段**：每帧 `begin_frame` -> 更新关卡 -> 暂存常量 -> 录制 -> `end_frame` -> 呈现
/// 3. **关闭阶段**：等待所有飞行中的帧完成
pub struct Engine;

impl Engine {
    /// 运行引擎主循环
    pub fn run() -> EngineResult<()> {
        let (config, source) = EngineConfig::load_or_default()?;
        Self::initialize_logging(&config.logging);
        match &source {
            Some(path) => {
                tracing::info!(target: "engine", config = %path.display(), "Configuration loaded")
            }
            None => tracing::info!(target: "engine", "Using default configuration"),
        }

        let rig = Arc::new(Self::load_rig(&config.animation)?);

        let event_loop = EventLoop::new()
            .map_err(|e| EngineError::EventLoop(format!("Failed to create event loop: {}", e)))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let resolution = config.graphics.resolution;
        let window = WindowBuilder::new()
            .with_title("Cube Duck")
            .with_inner_size(PhysicalSize::new(resolution.width, resolution.height))
            .build(&event_loop)
            .map_err(|e| EngineError::Window(e.to_string()))?;

        let mut demo = Demo::new(Arc::new(window), &config, rig)?;
        let mut fatal: Option<EngineError> = None;

        let result = event_loop.run(|event, elwt| {
            if let Err(e) = demo.handle_event(event, elwt) {
                tracing::error!(target: "engine", error = %e, "Fatal error, exiting");
                fatal = Some(e);
                elwt.exit();
            }
        });

        demo.shutdown();
        result.map_err(|e| EngineError::EventLoop(format!("Event loop error: {}", e)))?;

        match fatal {
            Some(e) => Err(e),
            None => {
                tracing::info!(target: "engine", "Engine shutting down");
                Ok(())
            }
        }
    }

    /// 初始化日志系统
    ///
    /// `RUST_LOG` 优先，未设置时使用配置中的日志级别。
    fn initialize_logging(logging: &LoggingConfig) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(logging.level.as_directive()));
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
        tracing::info!(target: "engine", "Engine starting");
    }

    /// 加载骨骼动画：配置了路径时读取 JSON，否则使用内置骨骼
    fn load_rig(config: &AnimationConfig) -> EngineResult<AnimationSet> {
        let rig = match &config.rig_path {
            Some(path) => RigAsset::load(path)?,
            None => demo_rig()?,
        };
        tracing::info!(
            target: "animation",
            bones = rig.skeleton().bone_count(),
            clips = rig.clip_count(),
            "Rig loaded"
        );
        Ok(rig)
    }
}

// ============================================================================
// 输入
// ============================================================================

/// 按住的按键
#[derive(Default)]
struct InputState {
    held: HashSet<KeyCode>,
}

impl InputState {
    /// 记录按键，返回本次是否为新按下
    fn handle_key(&mut self, event: &KeyEvent) -> Option<KeyCode> {
        let PhysicalKey::Code(code) = event.physical_key else {
            return None;
        };
        match event.state {
            ElementState::Pressed => {
                let fresh = self.held.insert(code);
                (fresh && !event.repeat).then_some(code)
            }
            ElementState::Released => {
                self.held.remove(&code);
                None
            }
        }
    }

    fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    fn axis(&self, negative: KeyCode, positive: KeyCode) -> f32 {
        (self.is_held(positive) as i32 - self.is_held(negative) as i32) as f32
    }

    fn move_intent(&self) -> MoveIntent {
        MoveIntent {
            direction: Vec2::new(
                self.axis(KeyCode::KeyA, KeyCode::KeyD),
                self.axis(KeyCode::KeyW, KeyCode::KeyS),
            ),
            jump: self.is_held(KeyCode::Space),
        }
    }
}

// ============================================================================
// 演示程序状态
// ============================================================================

fn start_camera(fov_degrees: f32) -> OrbitCamera {
    OrbitCamera::new(Vec3::new(22.0, 24.0, 22.0), Vec3::new(0.0, 8.0, 0.0), Vec3::Y)
        .with_fov(fov_degrees)
}

struct Demo {
    window: Arc<Window>,
    gpu: GpuContext,
    frames: FrameResourceRing<WgpuSubmission>,
    renderer: SkinnedRenderer,
    meshes: LevelMeshes,
    level: Level,
    camera: OrbitCamera,
    input: InputState,
    clear_color: wgpu::Color,
    fov_degrees: f32,
    frame_spans: bool,
    last_frame: Instant,
}

impl Demo {
    fn new(
        window: Arc<Window>,
        config: &EngineConfig,
        rig: Arc<AnimationSet>,
    ) -> EngineResult<Self> {
        let gpu = GpuContext::new(window.clone(), &config.graphics)?;

        let mut shaders = ShaderCache::new();
        let mut renderer = SkinnedRenderer::new(
            &gpu.device,
            gpu.format(),
            &mut shaders,
            config.graphics.max_draw_calls,
        )?;

        let (cube_vertices, cube_indices) = unit_cube();
        let cube = GpuMesh::upload(&gpu.device, &gpu.queue, &cube_vertices, &cube_indices, "Cube")?;
        let (duck_vertices, duck_indices) = rig_box_mesh(rig.skeleton(), 0.35);
        let duck = GpuMesh::upload(&gpu.device, &gpu.queue, &duck_vertices, &duck_indices, "Duck")?;
        let (enemy_vertices, enemy_indices) = rig_box_mesh(rig.skeleton(), 0.5);
        let enemy =
            GpuMesh::upload(&gpu.device, &gpu.queue, &enemy_vertices, &enemy_indices, "Enemy")?;
        let meshes = LevelMeshes {
            cube: renderer.add_mesh(cube),
            duck: renderer.add_mesh(duck),
            enemy: renderer.add_mesh(enemy),
        };

        let level = Level::demo(rig, &config.animation)?;
        let submission = WgpuSubmission::new(gpu.device.clone(), gpu.queue.clone());
        let frames = FrameResourceRing::new(submission);

        let [r, g, b, a] = config.graphics.clear_color;
        Ok(Self {
            window,
            gpu,
            frames,
            renderer,
            meshes,
            level,
            camera: start_camera(config.graphics.fov_degrees),
            input: InputState::default(),
            clear_color: wgpu::Color {
                r: r as f64,
                g: g as f64,
                b: b as f64,
                a: a as f64,
            },
            fov_degrees: config.graphics.fov_degrees,
            frame_spans: config.logging.frame_spans,
            last_frame: Instant::now(),
        })
    }

    fn handle_event(
        &mut self,
        event: Event<()>,
        elwt: &EventLoopWindowTarget<()>,
    ) -> EngineResult<()> {
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => elwt.exit(),
                WindowEvent::Resized(size) => {
                    self.frames.flush();
                    self.gpu.resize(size.width, size.height);
                }
                WindowEvent::KeyboardInput { event, .. } => match self.input.handle_key(&event) {
                    Some(KeyCode::Escape) => elwt.exit(),
                    Some(KeyCode::KeyR) => {
                        self.level.reset();
                        self.camera = start_camera(self.fov_degrees);
                        tracing::info!(target: "game", "Level reset");
                    }
                    _ => {}
                },
                WindowEvent::MouseWheel { delta, .. } => {
                    let amount = match delta {
                        MouseScrollDelta::LineDelta(_, y) => y,
                        MouseScrollDelta::PixelDelta(p) => p.y as f32 * 0.05,
                    };
                    self.camera.zoom(amount);
                }
                WindowEvent::RedrawRequested => self.frame()?,
                _ => {}
            },
            Event::AboutToWait => self.window.request_redraw(),
            _ => {}
        }
        Ok(())
    }

    fn apply_camera_input(&mut self, dt: f32) {
        let rotate = self.input.axis(KeyCode::ArrowLeft, KeyCode::ArrowRight);
        if rotate != 0.0 {
            self.camera.rotate(rotate * CAMERA_ROTATE_SPEED * dt);
        }
        let pan_y = self.input.axis(KeyCode::ArrowDown, KeyCode::ArrowUp);
        if pan_y != 0.0 {
            self.camera.move_target_y(pan_y * CAMERA_PAN_SPEED * dt);
        }
        let pan_x = self.input.axis(KeyCode::KeyQ, KeyCode::KeyE);
        if pan_x != 0.0 {
            self.camera.move_target_x(pan_x * CAMERA_PAN_SPEED * dt);
        }
    }

    fn frame(&mut self) -> EngineResult<()> {
        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32().min(MAX_FRAME_DT);
        self.last_frame = now;

        let span = if self.frame_spans {
            tracing::info_span!("frame", number = self.frames.frames_submitted())
        } else {
            tracing::Span::none()
        };
        let _enter = span.enter();

        self.apply_camera_input(dt);
        self.level.update(dt, self.input.move_intent())?;

        let Some(surface_texture) = self.gpu.acquire()? else {
            return Ok(());
        };
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let back_buffer = self.frames.next_frame_index();
        self.frames.begin_frame(back_buffer)?;
        self.renderer.begin_frame(back_buffer)?;

        let view_proj = self.camera.view_proj(self.gpu.aspect_ratio());
        let staged = self
            .level
            .drawables(&self.meshes)
            .iter()
            .map(|drawable| self.renderer.stage(drawable, view_proj))
            .collect::<Result<Vec<_>, _>>()?;
        self.renderer.flush(&self.gpu.queue);

        {
            let encoder = self.frames.recorder()?;
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.gpu.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.renderer.record(&mut pass, &staged);
        }

        self.frames.end_frame()?;
        surface_texture.present();

        tracing::trace!(
            target: "render",
            draws = staged.len(),
            coins = self.level.duck().coins(),
            "Frame submitted"
        );
        Ok(())
    }

    fn shutdown(&mut self) {
        self.frames.flush();
        tracing::info!(
            target: "engine",
            frames = self.frames.frames_submitted(),
            fence_waits = self.frames.wait_count(),
            "Render queue drained"
        );
    }
}
