//! 浏览器变体目录
//!
//! 变体 = 引擎 × 执行模式（无头 / 远程 / 移动 / 容器）。
//! 模式以结构化字段表达，key 仅作为目录内的唯一标识；
//! 所有派生判断都读字段，不做字符串约定匹配。

use phf::phf_map;
use tracing::warn;

use crate::models::engine::BrowserEngine;

/// 浏览器变体（不可变目录项）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrowserVariant {
    /// 目录内唯一标识
    pub key: &'static str,
    /// 展示名称
    pub display_name: &'static str,
    /// 根引擎
    pub engine: BrowserEngine,
    /// 无头模式
    pub headless: bool,
    /// 经远程网格执行
    pub remote: bool,
    /// 移动端模拟
    pub mobile: bool,
    /// Docker 容器中的网格节点
    pub docker: bool,
    /// 能力标记：支持无头
    pub supports_headless: bool,
    /// 能力标记：支持截图
    pub supports_screenshots: bool,
    /// 能力标记：支持下载
    pub supports_downloads: bool,
}

impl BrowserVariant {
    const fn new(key: &'static str, display_name: &'static str, engine: BrowserEngine) -> Self {
        Self {
            key,
            display_name,
            engine,
            headless: false,
            remote: false,
            mobile: false,
            docker: false,
            supports_headless: true,
            supports_screenshots: true,
            supports_downloads: true,
        }
    }

    const fn headless_mode(mut self) -> Self {
        self.headless = true;
        self
    }

    const fn remote_mode(mut self) -> Self {
        self.remote = true;
        self
    }

    // Docker 节点总是经由网格访问
    const fn docker_mode(mut self) -> Self {
        self.docker = true;
        self.remote = true;
        self
    }

    const fn mobile_mode(mut self) -> Self {
        self.mobile = true;
        self.supports_downloads = false;
        self
    }

    const fn no_headless_support(mut self) -> Self {
        self.supports_headless = false;
        self
    }

    const fn no_download_support(mut self) -> Self {
        self.supports_downloads = false;
        self
    }

    const fn no_screenshot_support(mut self) -> Self {
        self.supports_screenshots = false;
        self
    }

    // ========== 派生判断 ==========

    pub fn is_headless(&self) -> bool {
        self.headless
    }

    pub fn is_remote(&self) -> bool {
        self.remote
    }

    pub fn is_mobile(&self) -> bool {
        self.mobile
    }

    pub fn is_docker(&self) -> bool {
        self.docker
    }

    /// 解析到同引擎的桌面基础变体
    ///
    /// 目录中没有对应基础变体时返回自身，因此该操作幂等且不会失败
    pub fn base(&'static self) -> &'static BrowserVariant {
        CATALOG
            .iter()
            .find(|v| {
                v.engine == self.engine && !v.headless && !v.remote && !v.mobile && !v.docker
            })
            .unwrap_or(self)
    }
}

impl std::fmt::Display for BrowserVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.key, self.display_name)
    }
}

/// 静态变体目录（声明顺序即各分类的枚举顺序）
pub static CATALOG: &[BrowserVariant] = &[
    BrowserVariant::new("chrome", "Chrome 桌面版", BrowserEngine::Chrome),
    BrowserVariant::new("chrome-headless", "Chrome 无头模式", BrowserEngine::Chrome).headless_mode(),
    BrowserVariant::new("chrome-remote", "Chrome 远程网格", BrowserEngine::Chrome).remote_mode(),
    BrowserVariant::new("chrome-docker", "Chrome Docker 节点", BrowserEngine::Chrome).docker_mode(),
    BrowserVariant::new("chrome-mobile", "Chrome 移动端模拟", BrowserEngine::Chrome).mobile_mode(),
    BrowserVariant::new("firefox", "Firefox 桌面版", BrowserEngine::Firefox),
    BrowserVariant::new("firefox-headless", "Firefox 无头模式", BrowserEngine::Firefox).headless_mode(),
    BrowserVariant::new("firefox-remote", "Firefox 远程网格", BrowserEngine::Firefox).remote_mode(),
    BrowserVariant::new("firefox-docker", "Firefox Docker 节点", BrowserEngine::Firefox).docker_mode(),
    BrowserVariant::new("edge", "Edge 桌面版", BrowserEngine::Edge),
    BrowserVariant::new("edge-headless", "Edge 无头模式", BrowserEngine::Edge).headless_mode(),
    BrowserVariant::new("edge-remote", "Edge 远程网格", BrowserEngine::Edge).remote_mode(),
    BrowserVariant::new("safari", "Safari 桌面版", BrowserEngine::Safari)
        .no_headless_support()
        .no_download_support(),
    BrowserVariant::new("safari-mobile", "Safari 移动端模拟", BrowserEngine::Safari)
        .mobile_mode()
        .no_headless_support(),
    BrowserVariant::new("opera", "Opera 桌面版", BrowserEngine::Opera).no_headless_support(),
    BrowserVariant::new("ie", "Internet Explorer 遗留模式", BrowserEngine::LegacyIe)
        .no_headless_support()
        .no_download_support()
        .no_screenshot_support(),
];

/// 标识符根词 → 引擎的静态映射
static ENGINE_ROOTS: phf::Map<&'static str, BrowserEngine> = phf_map! {
    "chrome" => BrowserEngine::Chrome,
    "chromium" => BrowserEngine::Chrome,
    "googlechrome" => BrowserEngine::Chrome,
    "firefox" => BrowserEngine::Firefox,
    "ff" => BrowserEngine::Firefox,
    "gecko" => BrowserEngine::Firefox,
    "edge" => BrowserEngine::Edge,
    "msedge" => BrowserEngine::Edge,
    "microsoftedge" => BrowserEngine::Edge,
    "safari" => BrowserEngine::Safari,
    "webkit" => BrowserEngine::Safari,
    "opera" => BrowserEngine::Opera,
    "ie" => BrowserEngine::LegacyIe,
    "internetexplorer" => BrowserEngine::LegacyIe,
};

/// 变体分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantCategory {
    /// 普通桌面（无任何模式修饰）
    Desktop,
    /// 移动端模拟
    Mobile,
    /// 无头模式
    Headless,
    /// 远程网格（不含 Docker 节点）
    Remote,
    /// Docker 节点
    Docker,
}

/// 默认变体：桌面 Chrome，非无头、非远程
pub fn default_variant() -> &'static BrowserVariant {
    &CATALOG[0]
}

/// 解析浏览器标识符，无法识别时返回 None
///
/// 匹配顺序：精确 key → 根词 + 模式词（headless / remote / mobile / docker）
pub fn try_resolve(identifier: &str) -> Option<&'static BrowserVariant> {
    let normalized = identifier.trim().to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    if let Some(variant) = CATALOG.iter().find(|v| v.key == normalized) {
        return Some(variant);
    }

    // 根词 + 模式词解析，如 "msedge_headless"、"firefox grid"
    let mut tokens = normalized
        .split(|c: char| c == '-' || c == '_' || c == ' ')
        .filter(|t| !t.is_empty());
    let root = tokens.next()?;
    let engine = ENGINE_ROOTS
        .get(root)
        .copied()
        .or_else(|| BrowserEngine::find(root))?;

    let (mut headless, mut remote, mut mobile, mut docker) = (false, false, false, false);
    for token in tokens {
        match token {
            "headless" => headless = true,
            "remote" | "grid" => remote = true,
            "mobile" | "emulated" => mobile = true,
            "docker" | "container" => {
                docker = true;
                remote = true;
            }
            _ => return None,
        }
    }

    CATALOG.iter().find(|v| {
        v.engine == engine
            && v.headless == headless
            && v.remote == remote
            && v.mobile == mobile
            && v.docker == docker
    })
}

/// 解析浏览器标识符
///
/// 大小写不敏感，忽略首尾空白。空输入或无法识别的输入不报错，
/// 而是记录警告并回退到默认变体，保证配置出错时测试套件仍能跑起来
pub fn resolve(identifier: &str) -> &'static BrowserVariant {
    match try_resolve(identifier) {
        Some(variant) => variant,
        None => {
            let fallback = default_variant();
            warn!(
                "⚠️ 无法识别的浏览器标识 '{}'，回退到默认变体 {}",
                identifier.trim(),
                fallback.key
            );
            fallback
        }
    }
}

/// 按分类枚举变体
///
/// 顺序与目录声明顺序一致，多次调用结果稳定
pub fn all_of_category(category: VariantCategory) -> Vec<&'static BrowserVariant> {
    CATALOG
        .iter()
        .filter(|v| match category {
            VariantCategory::Desktop => !v.headless && !v.remote && !v.mobile && !v.docker,
            VariantCategory::Mobile => v.mobile,
            VariantCategory::Headless => v.headless,
            VariantCategory::Remote => v.remote && !v.docker,
            VariantCategory::Docker => v.docker,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_keys_unique() {
        for (i, a) in CATALOG.iter().enumerate() {
            for b in &CATALOG[i + 1..] {
                assert_ne!(a.key, b.key, "目录中出现重复 key: {}", a.key);
            }
        }
    }

    #[test]
    fn test_base_idempotent() {
        for variant in CATALOG {
            let base = variant.base();
            assert_eq!(base.base().key, base.key, "base 应幂等: {}", variant.key);
        }
    }

    #[test]
    fn test_base_strips_modes() {
        assert_eq!(resolve("chrome-headless").base().key, "chrome");
        assert_eq!(resolve("firefox-docker").base().key, "firefox");
        // opera 没有修饰变体，基础变体就是自身
        assert_eq!(resolve("opera").base().key, "opera");
    }

    #[test]
    fn test_resolve_blank_inputs_fall_back() {
        let default = default_variant();
        assert_eq!(resolve("").key, default.key);
        assert_eq!(resolve("   ").key, default.key);
        assert_eq!(resolve("netscape-navigator").key, default.key);
        assert!(try_resolve("").is_none());
        assert!(try_resolve("netscape-navigator").is_none());
    }

    #[test]
    fn test_resolve_case_insensitive() {
        assert_eq!(resolve("CHROME").key, resolve("chrome").key);
        assert_eq!(resolve(" Edge-Headless ").key, "edge-headless");
        assert_eq!(resolve("MSEDGE_HEADLESS").key, "edge-headless");
        assert_eq!(resolve("firefox grid").key, "firefox-remote");
    }

    #[test]
    fn test_categories_stable_order() {
        let first = all_of_category(VariantCategory::Remote);
        let second = all_of_category(VariantCategory::Remote);
        let first_keys: Vec<_> = first.iter().map(|v| v.key).collect();
        let second_keys: Vec<_> = second.iter().map(|v| v.key).collect();
        assert_eq!(first_keys, second_keys);

        let desktop = all_of_category(VariantCategory::Desktop);
        assert!(desktop.iter().all(|v| !v.headless && !v.remote && !v.mobile && !v.docker));
        let docker = all_of_category(VariantCategory::Docker);
        assert!(docker.iter().all(|v| v.docker && v.remote));
    }
}
