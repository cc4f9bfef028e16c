use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use regex::Regex;

use crate::error::{AppError, AppResult, ConfigError};

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 默认浏览器标识（无法识别的输入回退到它）
    pub default_browser: String,
    /// 全局无头开关（对所有本地变体生效）
    pub headless: bool,
    /// 窗口尺寸，形如 "1920,1080"
    pub window_size: String,
    /// 下载目录（启用下载偏好时使用）
    pub download_dir: Option<String>,
    /// 远程网格地址
    pub grid_url: Option<String>,
    /// 云服务商名称（browserstack / saucelabs / selenoid / ...）
    pub cloud_provider: Option<String>,
    /// 云服务商自定义选项（有序键值对，保证能力描述符可复现）
    pub cloud_options: Vec<(String, String)>,
    /// 当前环境标识（写入云服务商扩展块）
    pub environment: String,
    /// 期望的浏览器版本（可选，透传到能力描述符）
    pub browser_version: Option<String>,
    /// 待执行的变体列表（逗号分隔的 BROWSER_VARIANTS 解析结果）
    pub variants: Vec<String>,
    /// 矩阵计划 TOML 文件（配置后优先于 variants）
    pub matrix_file: Option<String>,
    // --- 基线超时（秒）---
    pub implicit_wait_secs: u64,
    pub page_load_timeout_secs: u64,
    pub script_timeout_secs: u64,
    // --- 浏览器可执行文件覆盖 ---
    pub chrome_executable: Option<String>,
    pub firefox_executable: Option<String>,
    pub edge_executable: Option<String>,
    pub safari_executable: Option<String>,
    /// 截图输出目录
    pub screenshot_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_browser: "chrome".to_string(),
            headless: false,
            window_size: "1920,1080".to_string(),
            download_dir: None,
            grid_url: None,
            cloud_provider: None,
            cloud_options: Vec::new(),
            environment: "local".to_string(),
            browser_version: None,
            variants: vec!["chrome".to_string()],
            matrix_file: None,
            implicit_wait_secs: 10,
            page_load_timeout_secs: 30,
            script_timeout_secs: 30,
            chrome_executable: None,
            firefox_executable: None,
            edge_executable: None,
            safari_executable: None,
            screenshot_dir: "screenshots".to_string(),
            verbose_logging: false,
            output_log_file: "compatibility.txt".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        let default_browser =
            std::env::var("DEFAULT_BROWSER").unwrap_or(default.default_browser);
        Self {
            // 未显式配置变体列表时，矩阵退化为只跑默认浏览器
            variants: std::env::var("BROWSER_VARIANTS")
                .map(|v| parse_variant_list(&v))
                .unwrap_or_else(|_| vec![default_browser.clone()]),
            default_browser,
            headless: std::env::var("HEADLESS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.headless),
            window_size: std::env::var("WINDOW_SIZE").unwrap_or(default.window_size),
            download_dir: std::env::var("DOWNLOAD_DIR").ok(),
            grid_url: std::env::var("GRID_URL").ok(),
            cloud_provider: std::env::var("CLOUD_PROVIDER").ok(),
            cloud_options: std::env::var("CLOUD_OPTIONS").map(|v| parse_option_pairs(&v)).unwrap_or(default.cloud_options),
            environment: std::env::var("TEST_ENVIRONMENT").unwrap_or(default.environment),
            browser_version: std::env::var("BROWSER_VERSION").ok(),
            matrix_file: std::env::var("MATRIX_FILE").ok(),
            implicit_wait_secs: std::env::var("IMPLICIT_WAIT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.implicit_wait_secs),
            page_load_timeout_secs: std::env::var("PAGE_LOAD_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.page_load_timeout_secs),
            script_timeout_secs: std::env::var("SCRIPT_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.script_timeout_secs),
            chrome_executable: std::env::var("CHROME_EXECUTABLE").ok(),
            firefox_executable: std::env::var("FIREFOX_EXECUTABLE").ok(),
            edge_executable: std::env::var("EDGE_EXECUTABLE").ok(),
            safari_executable: std::env::var("SAFARI_EXECUTABLE").ok(),
            screenshot_dir: std::env::var("SCREENSHOT_DIR").unwrap_or(default.screenshot_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 解析窗口尺寸配置
    ///
    /// # 返回
    /// 返回 (宽, 高)；格式非法时返回配置错误
    pub fn parsed_window_size(&self) -> AppResult<(u32, u32)> {
        let re = Regex::new(r"^(\d{2,5})\s*[,xX×]\s*(\d{2,5})$")
            .map_err(|e| AppError::Other(format!("窗口尺寸正则初始化失败: {}", e)))?;
        let invalid = || {
            AppError::Config(ConfigError::InvalidWindowSize {
                value: self.window_size.clone(),
            })
        };
        let caps = re.captures(self.window_size.trim()).ok_or_else(invalid)?;
        let width = caps[1].parse::<u32>().map_err(|_| invalid())?;
        let height = caps[2].parse::<u32>().map_err(|_| invalid())?;
        Ok((width, height))
    }

    /// 计算能力相关配置的指纹
    ///
    /// 能力缓存以 (变体 key, 指纹) 为键：配置在运行中途变化时，
    /// 旧指纹的条目不会被误用
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.headless.hash(&mut hasher);
        self.window_size.hash(&mut hasher);
        self.download_dir.hash(&mut hasher);
        self.grid_url.hash(&mut hasher);
        self.cloud_provider.hash(&mut hasher);
        self.cloud_options.hash(&mut hasher);
        self.environment.hash(&mut hasher);
        self.browser_version.hash(&mut hasher);
        hasher.finish()
    }
}

/// 解析 "key=value;key=value" 形式的云服务商选项
fn parse_option_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            let key = parts.next()?.trim();
            let value = parts.next()?.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// 解析逗号分隔的变体列表
fn parse_variant_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsed_window_size() {
        let mut config = Config::default();
        assert_eq!(config.parsed_window_size().unwrap(), (1920, 1080));

        config.window_size = "1366x768".to_string();
        assert_eq!(config.parsed_window_size().unwrap(), (1366, 768));

        config.window_size = "宽x高".to_string();
        assert!(config.parsed_window_size().is_err());
    }

    #[test]
    fn test_fingerprint_tracks_capability_fields() {
        let base = Config::default();
        let mut changed = Config::default();
        changed.headless = true;
        assert_ne!(base.fingerprint(), changed.fingerprint());

        // 与能力无关的字段不影响指纹
        let mut unrelated = Config::default();
        unrelated.verbose_logging = true;
        assert_eq!(base.fingerprint(), unrelated.fingerprint());
    }

    #[test]
    fn test_parse_option_pairs() {
        let pairs = parse_option_pairs("project=web; build=nightly ;=skip");
        assert_eq!(
            pairs,
            vec![
                ("project".to_string(), "web".to_string()),
                ("build".to_string(), "nightly".to_string()),
            ]
        );
    }
}
