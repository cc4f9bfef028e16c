/// 浏览器引擎枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BrowserEngine {
    /// Chrome / Chromium
    Chrome,
    /// Firefox
    Firefox,
    /// Microsoft Edge
    Edge,
    /// Safari
    Safari,
    /// Opera
    Opera,
    /// Internet Explorer（兼容遗留环境）
    LegacyIe,
}

impl BrowserEngine {
    /// 获取标准名称
    pub fn name(self) -> &'static str {
        match self {
            BrowserEngine::Chrome => "chrome",
            BrowserEngine::Firefox => "firefox",
            BrowserEngine::Edge => "edge",
            BrowserEngine::Safari => "safari",
            BrowserEngine::Opera => "opera",
            BrowserEngine::LegacyIe => "legacy-ie",
        }
    }

    /// 获取 W3C 线格式的 browserName
    pub fn wire_name(self) -> &'static str {
        match self {
            BrowserEngine::Chrome => "chrome",
            BrowserEngine::Firefox => "firefox",
            BrowserEngine::Edge => "MicrosoftEdge",
            BrowserEngine::Safari => "safari",
            BrowserEngine::Opera => "opera",
            BrowserEngine::LegacyIe => "internet explorer",
        }
    }

    /// 引擎要求的宿主操作系统（仅 Safari 有此限制）
    pub fn required_os(self) -> Option<&'static str> {
        match self {
            BrowserEngine::Safari => Some("macos"),
            _ => None,
        }
    }

    /// 该引擎是否有本地构建器
    pub fn supports_local_build(self) -> bool {
        matches!(
            self,
            BrowserEngine::Chrome
                | BrowserEngine::Firefox
                | BrowserEngine::Edge
                | BrowserEngine::Safari
        )
    }

    /// 尝试从字符串解析引擎（精确匹配）
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "chrome" | "chromium" => Some(BrowserEngine::Chrome),
            "firefox" | "ff" => Some(BrowserEngine::Firefox),
            "edge" | "msedge" => Some(BrowserEngine::Edge),
            "safari" => Some(BrowserEngine::Safari),
            "opera" => Some(BrowserEngine::Opera),
            "ie" | "legacy-ie" => Some(BrowserEngine::LegacyIe),
            _ => None,
        }
    }

    /// 智能查找引擎（支持模糊匹配）
    pub fn find(s: &str) -> Option<Self> {
        // 先尝试精确匹配
        if let Some(engine) = Self::from_name(s) {
            return Some(engine);
        }

        // 模糊匹配
        let s_lower = s.to_lowercase();
        if s_lower.contains("chrome") || s_lower.contains("chromium") {
            return Some(BrowserEngine::Chrome);
        }
        if s_lower.contains("firefox") || s_lower.contains("gecko") {
            return Some(BrowserEngine::Firefox);
        }
        if s_lower.contains("edge") {
            return Some(BrowserEngine::Edge);
        }
        if s_lower.contains("safari") || s_lower.contains("webkit") {
            return Some(BrowserEngine::Safari);
        }
        if s_lower.contains("opera") {
            return Some(BrowserEngine::Opera);
        }
        if s_lower.contains("explorer") || s_lower == "ie" {
            return Some(BrowserEngine::LegacyIe);
        }

        None
    }
}

impl std::fmt::Display for BrowserEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_exact() {
        assert_eq!(BrowserEngine::from_name("chrome"), Some(BrowserEngine::Chrome));
        assert_eq!(BrowserEngine::from_name("msedge"), Some(BrowserEngine::Edge));
        assert_eq!(BrowserEngine::from_name("不存在"), None);
    }

    #[test]
    fn test_find_fuzzy() {
        assert_eq!(BrowserEngine::find("Google Chrome 120"), Some(BrowserEngine::Chrome));
        assert_eq!(BrowserEngine::find("Mobile Safari"), Some(BrowserEngine::Safari));
        assert_eq!(BrowserEngine::find("internet explorer"), Some(BrowserEngine::LegacyIe));
        assert_eq!(BrowserEngine::find("lynx"), None);
    }
}
