//! 核心宏定义
//!
//! 用于配置结构体和统计结构体的默认值实现

/// 为结构体实现Default trait的宏
///
/// 使用示例:
/// ```rust
/// use cube_duck::impl_default;
///
/// struct Resolution {
///     width: u32,
///     height: u32,
/// }
///
/// impl_default!(Resolution {
///     width: 1024,
///     height: 768,
/// });
/// ```
#[macro_export]
macro_rules! impl_default {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }
    };
}

/// 同时实现Default和new()的宏
///
/// 使用示例:
/// ```rust
/// use cube_duck::impl_default_and_new;
///
/// struct CacheStats {
///     hits: u64,
///     misses: u64,
/// }
///
/// impl_default_and_new!(CacheStats {
///     hits: 0,
///     misses: 0,
/// });
/// ```
#[macro_export]
macro_rules! impl_default_and_new {
    ($struct_name:ident {
        $($field:ident: $value:expr),* $(,)?
    }) => {
        impl Default for $struct_name {
            fn default() -> Self {
                Self {
                    $($field: $value),*
                }
            }
        }

        impl $struct_name {
            pub fn new() -> Self {
                Self::default()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    struct FrameCounter {
        frames: u64,
        label: String,
    }

    impl_default_and_new!(FrameCounter {
        frames: 0,
        label: String::from("main"),
    });

    #[test]
    fn test_impl_default_and_new() {
        let a = FrameCounter::default();
        let b = FrameCounter::new();

        assert_eq!(a.frames, 0);
        assert_eq!(a.label, "main");
        assert_eq!(b.frames, 0);
        assert_eq!(b.label, "main");
    }
}
