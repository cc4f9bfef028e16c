//! 会话工厂 - 业务能力层
//!
//! 把一个浏览器变体变成一个活的会话句柄：
//!
//! 1. 远程变体 → 从配置取网格地址，附上能力描述符，走网格路径
//! 2. 本地变体 → 按根引擎分派到 4 个本地构建器（chrome / firefox / edge / safari）
//! 3. 创建成功后统一应用三项基线超时，并尽力最大化窗口
//!
//! 没有本地构建器的引擎不报错，记录警告后回退到默认引擎，
//! 保证在部分支持的环境里测试套件仍能跑完

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, GridError};
use crate::infrastructure::runtime::{
    DriverRuntime, DriverSession, LaunchOptions, MobileProfile, SessionPlan, SessionTimeouts,
    StandardRuntime,
};
use crate::models::capabilities::{CapabilitiesDescriptor, BASELINE_STABILITY_ARGS};
use crate::models::engine::BrowserEngine;
use crate::models::variant::BrowserVariant;
use crate::services::capability_cache::CapabilityCache;
use crate::services::provisioner::{BinaryProvisioner, PathProvisioner};

/// 会话工厂
pub struct SessionFactory {
    config: Config,
    runtime: Arc<dyn DriverRuntime>,
    provisioner: Arc<dyn BinaryProvisioner>,
    cache: CapabilityCache,
}

impl SessionFactory {
    /// 用标准运行时构建工厂
    pub fn new(config: Config) -> Self {
        let provisioner = Arc::new(PathProvisioner::from_config(&config));
        Self::with_runtime(config, Arc::new(StandardRuntime::new()), provisioner)
    }

    /// 用自定义运行时 / 解析器构建工厂
    pub fn with_runtime(
        config: Config,
        runtime: Arc<dyn DriverRuntime>,
        provisioner: Arc<dyn BinaryProvisioner>,
    ) -> Self {
        Self {
            config,
            runtime,
            provisioner,
            cache: CapabilityCache::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 能力缓存（测试与诊断用）
    pub fn capability_cache(&self) -> &CapabilityCache {
        &self.cache
    }

    /// 为变体创建会话
    ///
    /// 创建成功后应用基线超时并尽力最大化窗口；
    /// 超时应用失败视为创建失败（会话会被尽力关闭），
    /// 最大化失败只记录日志
    pub async fn create_session(
        &self,
        variant: &'static BrowserVariant,
    ) -> AppResult<Box<dyn DriverSession>> {
        info!(
            "🧩 [变体 {}] 正在创建会话（引擎: {}）...",
            variant.key, variant.engine
        );

        let plan = self.build_plan(variant).await?;
        let session = self.runtime.create(variant.key, &plan).await?;

        if let Err(e) = session.configure_timeouts(self.session_timeouts()).await {
            let _ = session.close().await;
            return Err(e);
        }

        if let Err(e) = session.maximize().await {
            warn!("⚠️ [变体 {}] 窗口最大化失败（忽略）: {}", variant.key, e);
        }

        info!("✓ [变体 {}] 会话创建完成", variant.key);
        Ok(session)
    }

    /// 取变体的能力描述符（经缓存）
    pub fn capabilities(&self, variant: &'static BrowserVariant) -> Arc<CapabilitiesDescriptor> {
        self.cache.get_or_build(variant, &self.config)
    }

    /// 清空能力缓存
    pub fn clear_capability_cache(&self) {
        self.cache.clear();
    }

    // ========== 计划构建 ==========

    async fn build_plan(&self, variant: &'static BrowserVariant) -> AppResult<SessionPlan> {
        if variant.is_remote() {
            let endpoint = self.config.grid_url.clone().ok_or_else(|| {
                AppError::Grid(GridError::EndpointMissing {
                    variant: variant.key.to_string(),
                })
            })?;
            let capabilities = self.capabilities(variant);
            return Ok(SessionPlan::Remote {
                endpoint,
                capabilities: (*capabilities).clone(),
            });
        }

        let engine = self.local_build_engine(variant);

        // Safari 的平台检查必须先于任何 Safari 相关准备（包括二进制解析）
        if engine == BrowserEngine::Safari {
            ensure_safari_supported(std::env::consts::OS)?;
        }

        let executable = self.provisioner.provision(engine).await?;
        let options = match engine {
            BrowserEngine::Firefox => self.build_firefox_options(variant, executable)?,
            BrowserEngine::Safari => self.build_safari_options(variant, executable)?,
            // Chrome 与 Edge 共享 Chromium 构建器
            _ => self.build_chromium_options(variant, engine, executable)?,
        };
        Ok(SessionPlan::Local(options))
    }

    /// 本地构建使用的引擎；没有本地构建器的引擎回退到默认引擎
    fn local_build_engine(&self, variant: &BrowserVariant) -> BrowserEngine {
        if variant.engine.supports_local_build() {
            return variant.engine;
        }
        warn!(
            "⚠️ 引擎 {} 没有本地构建器，回退到默认引擎 chrome（配置回退策略）",
            variant.engine
        );
        BrowserEngine::Chrome
    }

    // ========== 本地构建器 ==========

    pub(crate) fn build_chromium_options(
        &self,
        variant: &BrowserVariant,
        engine: BrowserEngine,
        executable: Option<std::path::PathBuf>,
    ) -> AppResult<LaunchOptions> {
        let args: Vec<String> = BASELINE_STABILITY_ARGS
            .iter()
            .map(|s| s.to_string())
            .collect();
        let window_size = self.config.parsed_window_size()?;

        let mut prefs = Map::new();
        self.apply_download_prefs(variant, &mut prefs);

        Ok(LaunchOptions {
            engine,
            executable,
            args,
            headless: variant.is_headless() || self.config.headless,
            window_size,
            prefs,
            mobile_emulation: variant.is_mobile().then(|| mobile_profile_for(variant.engine)),
        })
    }

    pub(crate) fn build_firefox_options(
        &self,
        variant: &BrowserVariant,
        executable: Option<std::path::PathBuf>,
    ) -> AppResult<LaunchOptions> {
        let mut args: Vec<String> = BASELINE_STABILITY_ARGS
            .iter()
            .map(|s| s.to_string())
            .collect();
        let headless = variant.is_headless() || self.config.headless;
        if headless {
            args.push("-headless".to_string());
        }
        let window_size = self.config.parsed_window_size()?;

        let mut prefs = Map::new();
        if variant.supports_downloads {
            if let Some(dir) = &self.config.download_dir {
                prefs.insert("browser.download.folderList".to_string(), json!(2));
                prefs.insert("browser.download.dir".to_string(), json!(dir));
            }
        }

        Ok(LaunchOptions {
            engine: BrowserEngine::Firefox,
            executable,
            args,
            headless,
            window_size,
            prefs,
            mobile_emulation: None,
        })
    }

    pub(crate) fn build_safari_options(
        &self,
        variant: &BrowserVariant,
        executable: Option<std::path::PathBuf>,
    ) -> AppResult<LaunchOptions> {
        let args: Vec<String> = BASELINE_STABILITY_ARGS
            .iter()
            .map(|s| s.to_string())
            .collect();
        let window_size = self.config.parsed_window_size()?;

        Ok(LaunchOptions {
            engine: BrowserEngine::Safari,
            executable,
            args,
            // Safari 不支持无头模式
            headless: false,
            window_size,
            prefs: Map::new(),
            mobile_emulation: variant.is_mobile().then(|| mobile_profile_for(variant.engine)),
        })
    }

    fn apply_download_prefs(&self, variant: &BrowserVariant, prefs: &mut Map<String, Value>) {
        if !variant.supports_downloads {
            return;
        }
        if let Some(dir) = &self.config.download_dir {
            prefs.insert("download.default_directory".to_string(), json!(dir));
            prefs.insert("download.prompt_for_download".to_string(), json!(false));
            prefs.insert("safebrowsing.enabled".to_string(), json!(true));
        }
    }

    fn session_timeouts(&self) -> SessionTimeouts {
        SessionTimeouts {
            implicit_wait: Duration::from_secs(self.config.implicit_wait_secs),
            page_load: Duration::from_secs(self.config.page_load_timeout_secs),
            script: Duration::from_secs(self.config.script_timeout_secs),
        }
    }
}

/// Safari 平台门槛检查
pub(crate) fn ensure_safari_supported(host_os: &str) -> AppResult<()> {
    if host_os == "macos" {
        return Ok(());
    }
    Err(AppError::unsupported_platform("safari", "macos", host_os))
}

/// 移动端模拟参数表
fn mobile_profile_for(engine: BrowserEngine) -> MobileProfile {
    match engine {
        BrowserEngine::Safari => MobileProfile {
            device_name: "iPhone 14".to_string(),
            user_agent: "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) \
                         AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1"
                .to_string(),
            width: 390,
            height: 844,
            pixel_ratio: 3.0,
        },
        _ => MobileProfile {
            device_name: "Pixel 7".to_string(),
            user_agent: "Mozilla/5.0 (Linux; Android 13; Pixel 7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Mobile Safari/537.36"
                .to_string(),
            width: 412,
            height: 915,
            pixel_ratio: 2.625,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::variant::resolve;

    fn factory_with(config: Config) -> SessionFactory {
        SessionFactory::new(config)
    }

    #[test]
    fn test_safari_platform_check() {
        assert!(ensure_safari_supported("macos").is_ok());
        assert!(ensure_safari_supported("linux")
            .unwrap_err()
            .is_unsupported_platform());
        assert!(ensure_safari_supported("windows")
            .unwrap_err()
            .is_unsupported_platform());
    }

    #[test]
    fn test_chromium_builder_baseline_and_headless() {
        let factory = factory_with(Config::default());
        let options = factory
            .build_chromium_options(resolve("chrome-headless"), BrowserEngine::Chrome, None)
            .unwrap();

        for arg in BASELINE_STABILITY_ARGS {
            assert!(options.args.iter().any(|a| a == arg), "缺少基线参数 {}", arg);
        }
        assert!(options.headless);
        assert_eq!(options.window_size, (1920, 1080));
        assert!(options.prefs.is_empty());
    }

    #[test]
    fn test_global_headless_config_applies() {
        let mut config = Config::default();
        config.headless = true;
        let factory = factory_with(config);
        let options = factory
            .build_chromium_options(resolve("chrome"), BrowserEngine::Chrome, None)
            .unwrap();
        assert!(options.headless);
    }

    #[test]
    fn test_download_prefs_follow_capability_flag() {
        let mut config = Config::default();
        config.download_dir = Some("/tmp/downloads".to_string());
        let factory = factory_with(config);

        let chrome = factory
            .build_chromium_options(resolve("chrome"), BrowserEngine::Chrome, None)
            .unwrap();
        assert_eq!(
            chrome.prefs.get("download.default_directory"),
            Some(&json!("/tmp/downloads"))
        );

        // 移动端变体不支持下载，偏好不应生效
        let mobile = factory
            .build_chromium_options(resolve("chrome-mobile"), BrowserEngine::Chrome, None)
            .unwrap();
        assert!(mobile.prefs.get("download.default_directory").is_none());
        assert!(mobile.mobile_emulation.is_some());
    }

    #[test]
    fn test_firefox_headless_arg() {
        let factory = factory_with(Config::default());
        let options = factory
            .build_firefox_options(resolve("firefox-headless"), None)
            .unwrap();
        assert!(options.args.iter().any(|a| a == "-headless"));
        assert_eq!(options.engine, BrowserEngine::Firefox);
    }

    #[test]
    fn test_unsupported_engine_falls_back_to_chrome() {
        let factory = factory_with(Config::default());
        assert_eq!(
            factory.local_build_engine(resolve("opera")),
            BrowserEngine::Chrome
        );
        assert_eq!(
            factory.local_build_engine(resolve("ie")),
            BrowserEngine::Chrome
        );
        assert_eq!(
            factory.local_build_engine(resolve("edge")),
            BrowserEngine::Edge
        );
    }

    #[test]
    fn test_remote_variant_requires_grid_url() {
        let factory = factory_with(Config::default());
        let result = tokio_test::block_on(factory.create_session(resolve("chrome-remote")));
        match result {
            Err(AppError::Grid(GridError::EndpointMissing { variant })) => {
                assert_eq!(variant, "chrome-remote");
            }
            other => panic!("期望 EndpointMissing，实际: {:?}", other.map(|_| ())),
        }
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_safari_creation_rejected_off_macos() {
        let factory = factory_with(Config::default());
        let result = tokio_test::block_on(factory.create_session(resolve("safari")));
        assert!(result.err().map(|e| e.is_unsupported_platform()).unwrap_or(false));
    }
}
