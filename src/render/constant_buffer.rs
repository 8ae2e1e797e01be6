//! 常量缓冲环
//!
//! 一块 GPU 可见的大缓冲区被划分为 `max_draw_calls` 个等大的槽位，
//! 每个槽位按 256 字节（以及设备的 `min_uniform_buffer_offset_alignment`）对齐，
//! 存放一次绘制调用的着色器常量。
//!
//! ## 使用流程
//!
//! ```text
//! begin_frame(frame_index)      帧栅栏等待之后调用，释放该帧上一轮占用的槽位
//! update("W", ..)               写入当前槽位
//! update("VP", ..)
//! let offset = next()?          返回当前槽位的动态偏移并前进到下一个槽位
//! set_bind_group(.., &[offset])
//! ...
//! flush(queue)                  提交前把本帧写过的槽位上传到 GPU
//! ```
//!
//! 槽位在复用前不会清零，上一轮的数据会一直保留到被覆盖，
//! 每次绘制都必须重新写入它关心的全部变量。
//!
//! 槽位按轮转方式跨帧连续分配。若仍在飞行中的帧已占满全部槽位，
//! 继续分配返回 `RingExhausted`，不会静默覆盖 GPU 可能仍在读取的槽位。

use std::collections::HashMap;
use std::ops::Range;

use super::frame_ring::FRAMES_IN_FLIGHT;
use super::upload::align_to;
use crate::core::error::{RenderError, RenderResult};

/// 常量缓冲槽位对齐
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

// ============================================================================
// 常量布局（名称 -> 偏移表）
// ============================================================================

/// 单个常量变量在槽位内的位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantVariable {
    pub offset: usize,
    pub size: usize,
}

/// 常量布局：变量名到 {偏移, 大小} 的映射
#[derive(Debug, Clone, Default)]
pub struct ConstantLayout {
    variables: HashMap<String, ConstantVariable>,
    size: usize,
}

impl ConstantLayout {
    /// 以常量结构体总大小开始构建布局
    ///
    /// ```rust
    /// use cube_duck::render::ConstantLayout;
    ///
    /// #[repr(C)]
    /// struct Constants {
    ///     w: [[f32; 4]; 4],
    ///     time: f32,
    /// }
    ///
    /// let layout = ConstantLayout::builder(std::mem::size_of::<Constants>())
    ///     .variable("W", std::mem::offset_of!(Constants, w), 64)
    ///     .variable("time", std::mem::offset_of!(Constants, time), 4)
    ///     .build();
    /// assert_eq!(layout.variable("time").unwrap().offset, 64);
    /// ```
    pub fn builder(size: usize) -> ConstantLayoutBuilder {
        ConstantLayoutBuilder {
            layout: ConstantLayout {
                variables: HashMap::new(),
                size,
            },
        }
    }

    /// 查找变量
    pub fn variable(&self, name: &str) -> Option<ConstantVariable> {
        self.variables.get(name).copied()
    }

    /// 常量结构体总大小（对齐前）
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}

/// 常量布局构建器
pub struct ConstantLayoutBuilder {
    layout: ConstantLayout,
}

impl ConstantLayoutBuilder {
    /// 添加变量
    pub fn variable(mut self, name: impl Into<String>, offset: usize, size: usize) -> Self {
        debug_assert!(
            offset + size <= self.layout.size,
            "constant variable exceeds layout size"
        );
        self.layout
            .variables
            .insert(name.into(), ConstantVariable { offset, size });
        self
    }

    pub fn build(self) -> ConstantLayout {
        self.layout
    }
}

// ============================================================================
// 常量缓冲环
// ============================================================================

/// 常量缓冲环
pub struct ConstantBufferRing {
    /// 调试标签
    label: String,
    /// 变量偏移表
    layout: ConstantLayout,
    /// 单个槽位大小（已对齐）
    slot_size: u64,
    /// 槽位数
    capacity: u32,
    /// 当前写入的槽位
    current_slot: u32,
    /// 每个飞行帧占用的槽位数
    frame_usage: [u32; FRAMES_IN_FLIGHT],
    /// 当前帧索引
    frame_index: usize,
    /// CPU 端镜像
    shadow: Vec<u8>,
    /// 待上传的字节区间
    dirty: Vec<Range<u64>>,
    /// GPU 缓冲区（纯 CPU 模式下为 None）
    buffer: Option<wgpu::Buffer>,
}

impl ConstantBufferRing {
    /// 创建常量缓冲环并分配 GPU 缓冲区
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        layout: ConstantLayout,
        max_draw_calls: u32,
    ) -> Self {
        let alignment = CONSTANT_BUFFER_ALIGNMENT
            .max(device.limits().min_uniform_buffer_offset_alignment as u64);
        let mut ring = Self::with_alignment(label, layout, max_draw_calls, alignment);
        ring.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: ring.shadow.len() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));

        tracing::debug!(
            target: "render",
            label,
            slots = max_draw_calls,
            slot_size = ring.slot_size,
            "Constant buffer ring created"
        );
        ring
    }

    /// 不分配 GPU 缓冲区的常量缓冲环，`flush` 不做任何事
    pub fn cpu_only(label: &str, layout: ConstantLayout, max_draw_calls: u32) -> Self {
        Self::with_alignment(label, layout, max_draw_calls, CONSTANT_BUFFER_ALIGNMENT)
    }

    fn with_alignment(
        label: &str,
        layout: ConstantLayout,
        max_draw_calls: u32,
        alignment: u64,
    ) -> Self {
        let capacity = max_draw_calls.max(1);
        let slot_size = align_to(layout.size().max(1) as u64, alignment);
        Self {
            label: label.to_string(),
            layout,
            slot_size,
            capacity,
            current_slot: 0,
            frame_usage: [0; FRAMES_IN_FLIGHT],
            frame_index: 0,
            shadow: vec![0; (slot_size * capacity as u64) as usize],
            dirty: Vec::new(),
            buffer: None,
        }
    }

    /// 开始新的一帧
    ///
    /// 调用方必须已经等待过该帧索引上一次提交的栅栏，
    /// 此时该帧上一轮占用的槽位可以复用。
    pub fn begin_frame(&mut self, frame_index: usize) -> RenderResult<()> {
        if frame_index >= FRAMES_IN_FLIGHT {
            return Err(RenderError::InvalidFrameIndex {
                index: frame_index,
                frames: FRAMES_IN_FLIGHT,
            });
        }
        self.frame_index = frame_index;
        self.frame_usage[frame_index] = 0;
        Ok(())
    }

    /// 向当前槽位写入命名变量
    ///
    /// 名称未知返回 `UnknownConstant`，数据超过变量大小返回 `ConstantSizeMismatch`。
    /// 数据短于变量大小时只覆盖前缀。
    pub fn update(&mut self, name: &str, data: &[u8]) -> RenderResult<()> {
        let variable = self
            .layout
            .variable(name)
            .ok_or_else(|| RenderError::UnknownConstant {
                name: name.to_string(),
            })?;
        if data.len() > variable.size {
            return Err(RenderError::ConstantSizeMismatch {
                name: name.to_string(),
                expected: variable.size,
                found: data.len(),
            });
        }
        self.ensure_free_slot()?;

        let start = (self.gpu_offset() as usize) + variable.offset;
        self.shadow[start..start + data.len()].copy_from_slice(data);
        self.mark_dirty(self.current_slot);
        Ok(())
    }

    /// 写入单个 Pod 值
    pub fn update_value<T: bytemuck::Pod>(&mut self, name: &str, value: &T) -> RenderResult<()> {
        self.update(name, bytemuck::bytes_of(value))
    }

    /// 写入 Pod 切片
    pub fn update_slice<T: bytemuck::Pod>(&mut self, name: &str, values: &[T]) -> RenderResult<()> {
        self.update(name, bytemuck::cast_slice(values))
    }

    /// 结束当前槽位
    ///
    /// 返回刚写完的槽位的动态偏移，并前进到下一个槽位（按容量取模回绕）。
    pub fn next(&mut self) -> RenderResult<u32> {
        self.ensure_free_slot()?;
        let offset = self.gpu_offset() as u32;
        self.frame_usage[self.frame_index] += 1;
        self.current_slot = (self.current_slot + 1) % self.capacity;
        Ok(offset)
    }

    /// 把本帧写过的槽位上传到 GPU
    ///
    /// `write_buffer` 在下一次 `submit` 之前生效。
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        let Some(buffer) = &self.buffer else {
            self.dirty.clear();
            return;
        };
        for range in self.dirty.drain(..) {
            let bytes = &self.shadow[range.start as usize..range.end as usize];
            queue.write_buffer(buffer, range.start, bytes);
        }
    }

    /// 当前槽位索引
    pub fn current_slot(&self) -> u32 {
        self.current_slot
    }

    /// 当前槽位在缓冲区中的偏移
    pub fn gpu_offset(&self) -> u64 {
        self.current_slot as u64 * self.slot_size
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn slot_size(&self) -> u64 {
        self.slot_size
    }

    /// 绑定组中单个槽位的绑定大小
    pub fn binding_size(&self) -> Option<wgpu::BufferSize> {
        wgpu::BufferSize::new(self.layout.size().max(1) as u64)
    }

    /// 飞行中的帧占用的槽位总数
    pub fn in_flight(&self) -> u32 {
        self.frame_usage.iter().sum()
    }

    pub fn layout(&self) -> &ConstantLayout {
        &self.layout
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    /// 指定槽位的 CPU 端数据
    pub fn slot_bytes(&self, slot: u32) -> &[u8] {
        let start = (slot % self.capacity) as usize * self.slot_size as usize;
        &self.shadow[start..start + self.slot_size as usize]
    }

    /// 待上传的字节区间
    pub fn pending_ranges(&self) -> &[Range<u64>] {
        &self.dirty
    }

    fn ensure_free_slot(&self) -> RenderResult<()> {
        let in_flight = self.in_flight();
        if in_flight >= self.capacity {
            tracing::error!(
                target: "render",
                ring = %self.label,
                capacity = self.capacity,
                "Constant buffer ring exhausted"
            );
            return Err(RenderError::RingExhausted {
                capacity: self.capacity,
                in_flight,
            });
        }
        Ok(())
    }

    fn mark_dirty(&mut self, slot: u32) {
        let start = slot as u64 * self.slot_size;
        let end = start + self.slot_size;
        match self.dirty.last_mut() {
            Some(last) if last.start <= start && end <= last.end => {}
            Some(last) if last.end == start => last.end = end,
            _ => self.dirty.push(start..end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C)]
    #[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
    struct TestConstants {
        w: [[f32; 4]; 4],
        time: f32,
        _pad: [f32; 3],
    }

    fn layout() -> ConstantLayout {
        ConstantLayout::builder(std::mem::size_of::<TestConstants>())
            .variable("W", std::mem::offset_of!(TestConstants, w), 64)
            .variable("time", std::mem::offset_of!(TestConstants, time), 4)
            .build()
    }

    #[test]
    fn test_slot_size_is_aligned() {
        let ring = ConstantBufferRing::cpu_only("test", layout(), 8);
        assert_eq!(ring.slot_size(), 256);
        assert_eq!(ring.capacity(), 8);
        assert_eq!(ring.binding_size().unwrap().get(), 80);

        let big = ConstantLayout::builder(300).build();
        assert_eq!(ConstantBufferRing::cpu_only("big", big, 2).slot_size(), 512);
    }

    #[test]
    fn test_wraps_after_capacity_calls() {
        let mut ring = ConstantBufferRing::cpu_only("test", layout(), 5);
        ring.begin_frame(0).unwrap();
        let offsets: Vec<u32> = (0..5).map(|_| ring.next().unwrap()).collect();
        assert_eq!(offsets, vec![0, 256, 512, 768, 1024]);
        assert_eq!(ring.current_slot(), 0);
    }

    #[test]
    fn test_update_writes_at_variable_offset() {
        let mut ring = ConstantBufferRing::cpu_only("test", layout(), 4);
        ring.begin_frame(0).unwrap();
        ring.next().unwrap();
        ring.update_value("time", &2.5f32).unwrap();

        let slot = ring.slot_bytes(1);
        assert_eq!(&slot[64..68], bytemuck::bytes_of(&2.5f32));
        assert!(ring.slot_bytes(0).iter().all(|b| *b == 0));
    }

    #[test]
    fn test_unknown_constant_is_error() {
        let mut ring = ConstantBufferRing::cpu_only("test", layout(), 4);
        let err = ring.update("VP", &[0u8; 64]).unwrap_err();
        assert_eq!(
            err,
            RenderError::UnknownConstant {
                name: "VP".to_string()
            }
        );
    }

    #[test]
    fn test_oversized_write_is_error() {
        let mut ring = ConstantBufferRing::cpu_only("test", layout(), 4);
        let err = ring.update("time", &[0u8; 8]).unwrap_err();
        assert!(matches!(
            err,
            RenderError::ConstantSizeMismatch { expected: 4, found: 8, .. }
        ));
    }

    #[test]
    fn test_slots_keep_stale_data() {
        let mut ring = ConstantBufferRing::cpu_only("test", layout(), 2);
        ring.begin_frame(0).unwrap();
        ring.update_value("time", &1.0f32).unwrap();
        ring.next().unwrap();
        ring.next().unwrap();

        ring.begin_frame(0).unwrap();
        assert_eq!(ring.current_slot(), 0);
        assert_eq!(&ring.slot_bytes(0)[64..68], bytemuck::bytes_of(&1.0f32));
    }

    #[test]
    fn test_exhaustion_within_frame() {
        let mut ring = ConstantBufferRing::cpu_only("test", layout(), 3);
        ring.begin_frame(0).unwrap();
        for _ in 0..3 {
            ring.next().unwrap();
        }
        assert_eq!(
            ring.next().unwrap_err(),
            RenderError::RingExhausted {
                capacity: 3,
                in_flight: 3
            }
        );
        assert!(ring.update_value("time", &0.0f32).is_err());
    }

    #[test]
    fn test_slots_of_other_frame_in_flight_are_protected() {
        let mut ring = ConstantBufferRing::cpu_only("test", layout(), 4);
        ring.begin_frame(0).unwrap();
        for _ in 0..3 {
            ring.next().unwrap();
        }

        ring.begin_frame(1).unwrap();
        ring.next().unwrap();
        assert!(matches!(
            ring.next(),
            Err(RenderError::RingExhausted { in_flight: 4, .. })
        ));

        // 帧 0 的栅栏已等待，槽位释放
        ring.begin_frame(0).unwrap();
        assert_eq!(ring.in_flight(), 1);
        assert_eq!(ring.next().unwrap(), 0);
    }

    #[test]
    fn test_invalid_frame_index() {
        let mut ring = ConstantBufferRing::cpu_only("test", layout(), 4);
        assert!(matches!(
            ring.begin_frame(FRAMES_IN_FLIGHT),
            Err(RenderError::InvalidFrameIndex { .. })
        ));
    }

    #[test]
    fn test_dirty_ranges_coalesce() {
        let mut ring = ConstantBufferRing::cpu_only("test", layout(), 4);
        ring.begin_frame(0).unwrap();
        for i in 0..3 {
            ring.update_value("time", &(i as f32)).unwrap();
            ring.update_value("W", &[[0.0f32; 4]; 4]).unwrap();
            ring.next().unwrap();
        }
        assert_eq!(ring.pending_ranges(), &[0..768]);
    }
}
