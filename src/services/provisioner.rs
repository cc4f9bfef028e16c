//! 浏览器二进制解析 - 业务能力层
//!
//! 本地构建会话前，先为目标引擎定位可执行文件。
//! 解析顺序：配置覆盖 → 各平台常见安装位置 → 交由运行时自行探测

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult, SessionError};
use crate::models::engine::BrowserEngine;

/// 浏览器二进制解析器
#[async_trait]
pub trait BinaryProvisioner: Send + Sync {
    /// 为引擎解析可执行文件
    ///
    /// # 返回
    /// 返回 Some(路径) 或 None（由运行时自行探测）
    async fn provision(&self, engine: BrowserEngine) -> AppResult<Option<PathBuf>>;
}

/// 基于路径探测的解析器
pub struct PathProvisioner {
    overrides: HashMap<BrowserEngine, PathBuf>,
}

impl PathProvisioner {
    /// 从配置构建解析器
    pub fn from_config(config: &Config) -> Self {
        let mut overrides = HashMap::new();
        let pairs = [
            (BrowserEngine::Chrome, &config.chrome_executable),
            (BrowserEngine::Firefox, &config.firefox_executable),
            (BrowserEngine::Edge, &config.edge_executable),
            (BrowserEngine::Safari, &config.safari_executable),
        ];
        for (engine, path) in pairs {
            if let Some(path) = path {
                overrides.insert(engine, PathBuf::from(path));
            }
        }
        Self { overrides }
    }

    /// 各平台的常见安装位置
    fn well_known_candidates(engine: BrowserEngine, os: &str) -> &'static [&'static str] {
        match (engine, os) {
            (BrowserEngine::Chrome, "linux") => &[
                "/usr/bin/google-chrome",
                "/usr/bin/google-chrome-stable",
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
            ],
            (BrowserEngine::Chrome, "macos") => {
                &["/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"]
            }
            (BrowserEngine::Chrome, "windows") => &[
                r"C:\Program Files\Google\Chrome\Application\chrome.exe",
                r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            ],
            (BrowserEngine::Firefox, "linux") => &["/usr/bin/firefox"],
            (BrowserEngine::Firefox, "macos") => {
                &["/Applications/Firefox.app/Contents/MacOS/firefox"]
            }
            (BrowserEngine::Firefox, "windows") => {
                &[r"C:\Program Files\Mozilla Firefox\firefox.exe"]
            }
            (BrowserEngine::Edge, "linux") => &["/usr/bin/microsoft-edge"],
            (BrowserEngine::Edge, "macos") => {
                &["/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge"]
            }
            (BrowserEngine::Edge, "windows") => &[
                r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
                r"C:\Program Files\Microsoft\Edge\Application\msedge.exe",
            ],
            (BrowserEngine::Safari, "macos") => &["/Applications/Safari.app/Contents/MacOS/Safari"],
            _ => &[],
        }
    }
}

#[async_trait]
impl BinaryProvisioner for PathProvisioner {
    async fn provision(&self, engine: BrowserEngine) -> AppResult<Option<PathBuf>> {
        // 配置覆盖优先；覆盖路径不存在视为配置问题，直接报错
        if let Some(path) = self.overrides.get(&engine) {
            if path.exists() {
                debug!("引擎 {} 使用配置指定的可执行文件: {}", engine, path.display());
                return Ok(Some(path.clone()));
            }
            return Err(AppError::Session(SessionError::ProvisioningFailed {
                engine: engine.name().to_string(),
                source: Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("配置的可执行文件不存在: {}", path.display()),
                )),
            }));
        }

        for candidate in Self::well_known_candidates(engine, std::env::consts::OS) {
            if Path::new(candidate).exists() {
                debug!("引擎 {} 命中常见安装位置: {}", engine, candidate);
                return Ok(Some(PathBuf::from(candidate)));
            }
        }

        debug!("引擎 {} 未找到已安装的二进制，交由运行时自行探测", engine);
        Ok(None)
    }
}
