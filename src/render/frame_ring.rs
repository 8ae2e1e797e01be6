//! 双帧命令录制环
//!
//! 每个后缓冲索引持有一份独立的命令录制状态和一张提交票据（栅栏）。
//! CPU 录制第 N+1 帧时 GPU 可以仍在执行第 N 帧；
//! 复用某个帧索引前先等待它上一次的提交完成。
//!
//! ```text
//! begin_frame(i)   等待 tickets[i]（若有）-> 开始录制
//! recorder()       取得当前录制器
//! end_frame()      提交录制结果 -> tickets[i] = 新票据
//! flush()          等待所有未完成的提交（关闭前调用）
//! ```
//!
//! 提交后端抽象为 [`SubmissionBackend`]，wgpu 实现见 [`WgpuSubmission`]。

use std::sync::Arc;

use crate::core::error::{RenderError, RenderResult};

/// 同时在飞行中的帧数
pub const FRAMES_IN_FLIGHT: usize = 2;

const FRAME_LABELS: [&str; FRAMES_IN_FLIGHT] = ["Frame Encoder 0", "Frame Encoder 1"];

/// 命令提交后端
pub trait SubmissionBackend {
    /// 录制中的命令列表
    type Recorder;
    /// 提交票据，可用于等待该次提交完成
    type Ticket;

    /// 开始录制新的命令列表
    fn begin_recording(&mut self, label: &str) -> Self::Recorder;

    /// 关闭并提交命令列表
    fn submit(&mut self, recorder: Self::Recorder) -> Self::Ticket;

    /// 阻塞直到票据对应的提交在 GPU 上执行完成
    fn wait(&mut self, ticket: &Self::Ticket);
}

// ============================================================================
// wgpu 后端
// ============================================================================

/// 基于 wgpu 队列的提交后端
pub struct WgpuSubmission {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
}

impl WgpuSubmission {
    pub fn new(device: Arc<wgpu::Device>, queue: Arc<wgpu::Queue>) -> Self {
        Self { device, queue }
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

impl SubmissionBackend for WgpuSubmission {
    type Recorder = wgpu::CommandEncoder;
    type Ticket = wgpu::SubmissionIndex;

    fn begin_recording(&mut self, label: &str) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some(label) })
    }

    fn submit(&mut self, recorder: wgpu::CommandEncoder) -> wgpu::SubmissionIndex {
        self.queue.submit(std::iter::once(recorder.finish()))
    }

    fn wait(&mut self, ticket: &wgpu::SubmissionIndex) {
        let _ = self
            .device
            .poll(wgpu::Maintain::WaitForSubmissionIndex(ticket.clone()));
    }
}

// ============================================================================
// 帧资源环
// ============================================================================

/// 双帧命令录制环
pub struct FrameResourceRing<B: SubmissionBackend> {
    backend: B,
    tickets: [Option<B::Ticket>; FRAMES_IN_FLIGHT],
    recording: Option<B::Recorder>,
    frame_index: usize,
    frames_submitted: u64,
    waits: u64,
}

impl<B: SubmissionBackend> FrameResourceRing<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            tickets: std::array::from_fn(|_| None),
            recording: None,
            frame_index: 0,
            frames_submitted: 0,
            waits: 0,
        }
    }

    /// 开始录制指定后缓冲索引的帧
    ///
    /// 若该索引上一次的提交尚未完成，先阻塞等待。
    pub fn begin_frame(&mut self, back_buffer_index: usize) -> RenderResult<&mut B::Recorder> {
        if back_buffer_index >= FRAMES_IN_FLIGHT {
            return Err(RenderError::InvalidFrameIndex {
                index: back_buffer_index,
                frames: FRAMES_IN_FLIGHT,
            });
        }
        if self.recording.is_some() {
            return Err(RenderError::FrameAlreadyOpen);
        }

        if let Some(ticket) = self.tickets[back_buffer_index].take() {
            tracing::trace!(target: "render", frame = back_buffer_index, "Waiting for frame fence");
            self.backend.wait(&ticket);
            self.waits += 1;
        }

        self.frame_index = back_buffer_index;
        let recorder = self
            .backend
            .begin_recording(FRAME_LABELS[back_buffer_index]);
        Ok(self.recording.insert(recorder))
    }

    /// 当前帧的录制器
    pub fn recorder(&mut self) -> RenderResult<&mut B::Recorder> {
        self.recording.as_mut().ok_or(RenderError::FrameNotOpen)
    }

    /// 提交当前帧并记录其票据
    pub fn end_frame(&mut self) -> RenderResult<()> {
        let recorder = self.recording.take().ok_or(RenderError::FrameNotOpen)?;
        let ticket = self.backend.submit(recorder);
        self.tickets[self.frame_index] = Some(ticket);
        self.frames_submitted += 1;
        Ok(())
    }

    /// 等待所有未完成的提交
    pub fn flush(&mut self) {
        for ticket in self.tickets.iter_mut() {
            if let Some(ticket) = ticket.take() {
                self.backend.wait(&ticket);
                self.waits += 1;
            }
        }
        tracing::debug!(target: "render", frames = self.frames_submitted, "Frame ring flushed");
    }

    /// 下一帧应使用的后缓冲索引（已提交帧数取模）
    pub fn next_frame_index(&self) -> usize {
        (self.frames_submitted % FRAMES_IN_FLIGHT as u64) as usize
    }

    /// 最近一次 `begin_frame` 的帧索引
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }

    /// 栅栏等待次数
    pub fn wait_count(&self) -> u64 {
        self.waits
    }

    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    /// 指定帧索引是否有未等待的提交
    pub fn is_pending(&self, index: usize) -> bool {
        self.tickets.get(index).is_some_and(Option::is_some)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        Begin(String),
        Submit(u64),
        Wait(u64),
    }

    #[derive(Default)]
    struct MockBackend {
        events: Vec<Event>,
        next_ticket: u64,
    }

    impl SubmissionBackend for MockBackend {
        type Recorder = Vec<&'static str>;
        type Ticket = u64;

        fn begin_recording(&mut self, label: &str) -> Vec<&'static str> {
            self.events.push(Event::Begin(label.to_string()));
            Vec::new()
        }

        fn submit(&mut self, _recorder: Vec<&'static str>) -> u64 {
            self.next_ticket += 1;
            self.events.push(Event::Submit(self.next_ticket));
            self.next_ticket
        }

        fn wait(&mut self, ticket: &u64) {
            self.events.push(Event::Wait(*ticket));
        }
    }

    fn run_frame(ring: &mut FrameResourceRing<MockBackend>) {
        let index = ring.next_frame_index();
        ring.begin_frame(index).unwrap().push("draw");
        ring.end_frame().unwrap();
    }

    #[test]
    fn test_first_two_frames_do_not_wait() {
        let mut ring = FrameResourceRing::new(MockBackend::default());
        run_frame(&mut ring);
        run_frame(&mut ring);
        assert_eq!(ring.wait_count(), 0);
        assert!(ring.is_pending(0));
        assert!(ring.is_pending(1));
    }

    #[test]
    fn test_reuse_waits_on_previous_submission() {
        let mut ring = FrameResourceRing::new(MockBackend::default());
        for _ in 0..3 {
            run_frame(&mut ring);
        }
        let events = &ring.backend().events;
        let wait_pos = events.iter().position(|e| *e == Event::Wait(1)).unwrap();
        // 第三帧在开始录制前等待第一帧的票据
        assert_eq!(events[wait_pos + 1], Event::Begin("Frame Encoder 0".to_string()));
        assert_eq!(ring.wait_count(), 1);
    }

    #[test]
    fn test_frame_state_errors() {
        let mut ring = FrameResourceRing::new(MockBackend::default());
        assert_eq!(ring.end_frame().unwrap_err(), RenderError::FrameNotOpen);
        assert!(ring.recorder().is_err());

        ring.begin_frame(0).unwrap();
        assert_eq!(ring.begin_frame(1).unwrap_err(), RenderError::FrameAlreadyOpen);
        assert!(ring.is_recording());
        ring.end_frame().unwrap();

        assert!(matches!(
            ring.begin_frame(2),
            Err(RenderError::InvalidFrameIndex { index: 2, frames: 2 })
        ));
    }

    #[test]
    fn test_flush_waits_on_all_pending() {
        let mut ring = FrameResourceRing::new(MockBackend::default());
        run_frame(&mut ring);
        run_frame(&mut ring);
        ring.flush();
        assert_eq!(ring.wait_count(), 2);
        assert!(!ring.is_pending(0) && !ring.is_pending(1));

        // 刷新后复用帧索引无需再等待
        run_frame(&mut ring);
        assert_eq!(ring.wait_count(), 2);
    }

    #[test]
    fn test_recorder_collects_commands() {
        let mut ring = FrameResourceRing::new(MockBackend::default());
        ring.begin_frame(1).unwrap();
        ring.recorder().unwrap().push("clear");
        ring.recorder().unwrap().push("draw");
        assert_eq!(ring.recorder().unwrap().len(), 2);
        assert_eq!(ring.frame_index(), 1);
        ring.end_frame().unwrap();
        assert_eq!(ring.frames_submitted(), 1);
    }
}
