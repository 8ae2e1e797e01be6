//! 显式资源缓存
//!
//! 着色器等 GPU 资源按稳定的 [`AssetId`] 缓存，不依赖文件路径。
//! 缓存是普通对象，由调用方创建并注入到渲染器中，没有全局单例。
//!
//! ```text
//! AssetId::from_name("skinned.wgsl")   SHA-256(name) 的前 8 字节
//!     -> cache.get_or_insert_with(id, || device.create_shader_module(..))
//! ```

use std::collections::HashMap;
use std::fmt;

use sha2::{Digest, Sha256};

/// 稳定资源标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(u64);

impl AssetId {
    /// 由资源名计算标识（SHA-256 前 8 字节，跨进程稳定）
    pub fn from_name(name: &str) -> Self {
        let digest = Sha256::digest(name.as_bytes());
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&digest[..8]);
        Self(u64::from_be_bytes(bytes))
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0.to_be_bytes()))
    }
}

/// 缓存统计
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// 命中次数
    pub hits: u64,
    /// 未命中次数（触发构建）
    pub misses: u64,
}

crate::impl_default_and_new!(CacheStats { hits: 0, misses: 0 });

impl CacheStats {
    /// 命中率
    pub fn hit_rate(&self) -> f32 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f32 / total as f32
        }
    }
}

/// 按 [`AssetId`] 索引的资源缓存
pub struct AssetCache<T> {
    entries: HashMap<AssetId, T>,
    stats: CacheStats,
}

impl<T> Default for AssetCache<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::new(),
        }
    }
}

impl<T> AssetCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得缓存项，不存在时用 `build` 构建并插入
    pub fn get_or_insert_with<F>(&mut self, id: AssetId, build: F) -> &T
    where
        F: FnOnce() -> T,
    {
        if self.entries.contains_key(&id) {
            self.stats.hits += 1;
        } else {
            self.stats.misses += 1;
            tracing::debug!(target: "render", asset = %id, "Asset cache miss, building");
        }
        self.entries.entry(id).or_insert_with(build)
    }

    /// 可失败的构建版本，构建失败时不插入
    pub fn try_get_or_insert_with<F, E>(&mut self, id: AssetId, build: F) -> Result<&T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        if !self.entries.contains_key(&id) {
            let value = build()?;
            self.stats.misses += 1;
            self.entries.insert(id, value);
        } else {
            self.stats.hits += 1;
        }
        Ok(&self.entries[&id])
    }

    pub fn get(&self, id: AssetId) -> Option<&T> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: AssetId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }
}

/// 着色器模块缓存
pub type ShaderCache = AssetCache<wgpu::ShaderModule>;

/// 编译 WGSL 着色器并缓存
pub fn load_wgsl<'a>(
    cache: &'a mut ShaderCache,
    device: &wgpu::Device,
    name: &str,
    source: &str,
) -> &'a wgpu::ShaderModule {
    cache.get_or_insert_with(AssetId::from_name(name), || {
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some(name),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_id_is_stable() {
        let a = AssetId::from_name("skinned.wgsl");
        let b = AssetId::from_name("skinned.wgsl");
        let c = AssetId::from_name("static.wgsl");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string().len(), 16);
    }

    #[test]
    fn test_builds_once() {
        let mut cache: AssetCache<String> = AssetCache::new();
        let id = AssetId::from_name("duck");
        let mut builds = 0;
        for _ in 0..3 {
            let value = cache.get_or_insert_with(id, || {
                builds += 1;
                "built".to_string()
            });
            assert_eq!(value, "built");
        }
        assert_eq!(builds, 1);
        assert_eq!(cache.stats().hits, 2);
        assert_eq!(cache.stats().misses, 1);
        assert!((cache.stats().hit_rate() - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let mut cache: AssetCache<u32> = AssetCache::new();
        let id = AssetId::from_raw(7);
        let result: Result<&u32, &str> = cache.try_get_or_insert_with(id, || Err("bad shader"));
        assert!(result.is_err());
        assert!(!cache.contains(id));

        let value = cache.try_get_or_insert_with::<_, &str>(id, || Ok(42)).unwrap();
        assert_eq!(*value, 42);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.get(id).is_none());
    }
}
