//! 能力缓存 - 业务能力层
//!
//! 按 (变体 key, 配置指纹) 记忆化能力描述符。
//! 描述符是输入的纯函数，条目没有 TTL，只在显式 clear 时失效。
//! 缓存是本核心唯一跨工作者共享的状态，读取与插入并发安全，
//! 调用方无需额外加锁

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::config::Config;
use crate::models::capabilities::CapabilitiesDescriptor;
use crate::models::variant::BrowserVariant;

type CacheKey = (String, u64);

/// 能力缓存
pub struct CapabilityCache {
    entries: RwLock<HashMap<CacheKey, Arc<CapabilitiesDescriptor>>>,
    computations: AtomicUsize,
}

impl CapabilityCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            computations: AtomicUsize::new(0),
        }
    }

    /// 取出或构建描述符
    ///
    /// 插入采用 insert-if-absent 语义：并发构建同一键时保留先到者
    pub fn get_or_build(
        &self,
        variant: &'static BrowserVariant,
        config: &Config,
    ) -> Arc<CapabilitiesDescriptor> {
        let key: CacheKey = (variant.key.to_string(), config.fingerprint());

        if let Some(hit) = self.read_entries().get(&key) {
            return Arc::clone(hit);
        }

        // 构建放在锁外，避免持锁做序列化工作
        let descriptor = Arc::new(CapabilitiesDescriptor::build(variant, config));
        self.computations.fetch_add(1, Ordering::Relaxed);

        let mut entries = self.write_entries();
        Arc::clone(entries.entry(key).or_insert(descriptor))
    }

    /// 清空全部条目
    pub fn clear(&self) {
        self.write_entries().clear();
    }

    pub fn len(&self) -> usize {
        self.read_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_entries().is_empty()
    }

    /// 已执行的构建次数（命中不计数）
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, HashMap<CacheKey, Arc<CapabilitiesDescriptor>>> {
        match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_entries(
        &self,
    ) -> RwLockWriteGuard<'_, HashMap<CacheKey, Arc<CapabilitiesDescriptor>>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for CapabilityCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::variant::resolve;

    #[test]
    fn test_cache_hit_returns_same_arc() {
        let cache = CapabilityCache::new();
        let config = Config::default();
        let variant = resolve("chrome-remote");

        let first = cache.get_or_build(variant, &config);
        let second = cache.get_or_build(variant, &config);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.computations(), 1);
    }

    #[test]
    fn test_clear_forces_recompute() {
        let cache = CapabilityCache::new();
        let config = Config::default();
        let variant = resolve("firefox-remote");

        let before = cache.get_or_build(variant, &config);
        assert_eq!(cache.computations(), 1);

        cache.clear();
        assert!(cache.is_empty());

        let after = cache.get_or_build(variant, &config);
        assert_eq!(cache.computations(), 2);
        // 重新构建的值相等但不是同一份
        assert_eq!(*before, *after);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_config_fingerprint_separates_entries() {
        let cache = CapabilityCache::new();
        let variant = resolve("chrome-remote");

        let plain = Config::default();
        let mut headless = Config::default();
        headless.headless = true;

        let first = cache.get_or_build(variant, &plain);
        let second = cache.get_or_build(variant, &headless);
        assert_eq!(cache.computations(), 2);
        assert_ne!(*first, *second);
        assert_eq!(cache.len(), 2);
    }
}
