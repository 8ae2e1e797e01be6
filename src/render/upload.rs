//! 静态资源同步上传
//!
//! 顶点/索引等加载期数据经 CPU 可见的 Staging Buffer 复制到 GPU 本地缓冲区，
//! 提交后立即阻塞等待复制完成。
//!
//! ```text
//! CPU 写入 Staging Buffer (MAP_WRITE, mapped_at_creation)
//!     -> copy_buffer_to_buffer (COPY_SRC -> COPY_DST)
//!     -> submit + 等待该次提交完成
//! ```
//!
//! 整个队列在复制期间被阻塞，只能用于加载阶段；每帧变化的数据走常量缓冲环。

use crate::core::error::{RenderError, RenderResult};

/// 向上对齐到 `alignment`（必须为 2 的幂）
#[inline]
pub fn align_to(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

// ============================================================================
// Staging Buffer
// ============================================================================

/// 单个 Staging Buffer
pub struct StagingBuffer {
    /// GPU 缓冲区
    pub buffer: wgpu::Buffer,
    /// 缓冲区大小
    pub size: u64,
    /// 当前写入偏移
    pub offset: u64,
}

impl StagingBuffer {
    /// 创建新的 Staging Buffer（创建时即映射）
    pub fn new(device: &wgpu::Device, size: u64, label: Option<&str>) -> Self {
        let size = align_to(size.max(wgpu::COPY_BUFFER_ALIGNMENT), wgpu::COPY_BUFFER_ALIGNMENT);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label,
            size,
            usage: wgpu::BufferUsages::MAP_WRITE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: true,
        });

        Self {
            buffer,
            size,
            offset: 0,
        }
    }

    /// 分配空间并写入数据
    ///
    /// 返回写入的偏移量，空间不足时返回 None
    pub fn write(&mut self, data: &[u8], alignment: u64) -> Option<u64> {
        let aligned_offset = align_to(self.offset, alignment);
        let end = aligned_offset + data.len() as u64;

        if end > self.size {
            return None;
        }

        {
            let slice = self.buffer.slice(aligned_offset..end);
            let mut view = slice.get_mapped_range_mut();
            view.copy_from_slice(data);
        }

        self.offset = end;
        Some(aligned_offset)
    }

    /// 解除映射以供 GPU 使用
    pub fn unmap(&self) {
        self.buffer.unmap();
    }
}

/// 同步上传：创建 GPU 本地缓冲区并等待复制完成
///
/// `usage` 为目标缓冲区的用途（如 `VERTEX`、`INDEX`），会自动加上 `COPY_DST`。
pub fn upload_buffer(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    data: &[u8],
    usage: wgpu::BufferUsages,
    label: &str,
) -> RenderResult<wgpu::Buffer> {
    if data.is_empty() {
        return Err(RenderError::Upload(format!("{label}: nothing to upload")));
    }
    let copy_size = align_to(data.len() as u64, wgpu::COPY_BUFFER_ALIGNMENT);

    let mut staging = StagingBuffer::new(device, copy_size, Some("Upload Staging Buffer"));
    // 尾部对齐填充
    let mut padded;
    let bytes = if copy_size as usize == data.len() {
        data
    } else {
        padded = data.to_vec();
        padded.resize(copy_size as usize, 0);
        &padded[..]
    };
    staging
        .write(bytes, wgpu::COPY_BUFFER_ALIGNMENT)
        .ok_or_else(|| RenderError::Upload(format!("{label}: staging buffer too small")))?;
    staging.unmap();

    let destination = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: copy_size,
        usage: usage | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Upload Encoder"),
    });
    encoder.copy_buffer_to_buffer(&staging.buffer, 0, &destination, 0, copy_size);
    let submission = queue.submit(std::iter::once(encoder.finish()));
    let _ = device.poll(wgpu::Maintain::WaitForSubmissionIndex(submission));

    tracing::debug!(target: "render", label, bytes = data.len(), "Synchronous upload finished");
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(0, 256), 0);
        assert_eq!(align_to(1, 256), 256);
        assert_eq!(align_to(256, 256), 256);
        assert_eq!(align_to(257, 256), 512);
        assert_eq!(align_to(6, 4), 8);
    }
}
