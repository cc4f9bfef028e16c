//! 本地 CDP 运行时 - 基础设施层
//!
//! 按启动选项拉起本地浏览器进程，经 Chrome DevTools 协议驱动。
//! Chrome / Edge 直接支持；Firefox / Safari 取决于二进制自身的
//! CDP 兼容性，启动失败会作为会话创建错误返回给工厂

use std::sync::Mutex as StdMutex;

use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, error, info};

use crate::error::{AppError, AppResult};
use crate::infrastructure::runtime::{DriverSession, LaunchOptions, SessionTimeouts};

/// 本地 CDP 运行时
pub struct CdpRuntime;

impl CdpRuntime {
    pub fn new() -> Self {
        Self
    }

    /// 启动本地浏览器并返回会话
    pub async fn launch(&self, variant_key: &str, options: &LaunchOptions) -> AppResult<CdpSession> {
        info!("🚀 [变体 {}] 启动本地浏览器（引擎: {}）...", variant_key, options.engine);
        debug!("启动参数: {:?}", options.args);

        let mut builder = BrowserConfig::builder();
        builder = if options.headless {
            builder.new_headless_mode()
        } else {
            builder.with_head()
        };
        if let Some(executable) = &options.executable {
            builder = builder.chrome_executable(executable);
        }
        let (width, height) = options.window_size;
        let config = builder
            .window_size(width, height)
            .args(options.args.clone())
            .build()
            .map_err(|e| {
                error!("浏览器启动配置失败: {}", e);
                AppError::session_options_rejected(variant_key, e)
            })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
            error!("启动浏览器失败: {}", e);
            AppError::session_creation_failed(variant_key, e)
        })?;
        debug!("浏览器进程启动成功");

        // 在后台处理浏览器事件
        let handler_task = tokio::spawn(async move {
            while let Some(h) = handler.next().await {
                if h.is_err() {
                    break;
                }
            }
        });

        // 添加短暂延迟以等待浏览器状态同步
        sleep(Duration::from_millis(300)).await;

        let page = browser.new_page("about:blank").await.map_err(|e| {
            error!("创建页面失败: {}", e);
            handler_task.abort();
            AppError::session_creation_failed(variant_key, e)
        })?;

        let session = CdpSession {
            variant_key: variant_key.to_string(),
            browser: Mutex::new(browser),
            page,
            handler_task,
            timeouts: StdMutex::new(SessionTimeouts::default()),
        };

        if let Err(e) = session.apply_launch_overrides(options).await {
            // 覆盖项应用失败按创建失败处理，进程不能留着
            let _ = session.close().await;
            return Err(e);
        }

        info!("✓ [变体 {}] 本地浏览器就绪", variant_key);
        Ok(session)
    }
}

impl Default for CdpRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// 本地 CDP 会话句柄
pub struct CdpSession {
    variant_key: String,
    browser: Mutex<Browser>,
    page: Page,
    handler_task: JoinHandle<()>,
    timeouts: StdMutex<SessionTimeouts>,
}

impl CdpSession {
    /// 应用启动后的覆盖项：移动端模拟、下载目录
    async fn apply_launch_overrides(&self, options: &LaunchOptions) -> AppResult<()> {
        if let Some(profile) = &options.mobile_emulation {
            debug!("应用移动端模拟: {}", profile.device_name);
            let metrics = SetDeviceMetricsOverrideParams::builder()
                .width(profile.width as i64)
                .height(profile.height as i64)
                .device_scale_factor(profile.pixel_ratio)
                .mobile(true)
                .build()
                .map_err(|e| AppError::session_options_rejected(self.variant_key.as_str(), e))?;
            self.page
                .execute(metrics)
                .await
                .map_err(|e| AppError::session_creation_failed(self.variant_key.as_str(), e))?;

            let user_agent = SetUserAgentOverrideParams::builder()
                .user_agent(profile.user_agent.clone())
                .build()
                .map_err(|e| AppError::session_options_rejected(self.variant_key.as_str(), e))?;
            self.page
                .execute(user_agent)
                .await
                .map_err(|e| AppError::session_creation_failed(self.variant_key.as_str(), e))?;
        }

        if let Some(download_dir) = options
            .prefs
            .get("download.default_directory")
            .and_then(|v| v.as_str())
        {
            debug!("应用下载目录: {}", download_dir);
            let behavior = SetDownloadBehaviorParams::builder()
                .behavior(SetDownloadBehaviorBehavior::Allow)
                .download_path(download_dir)
                .build()
                .map_err(|e| AppError::session_options_rejected(self.variant_key.as_str(), e))?;
            self.page
                .execute(behavior)
                .await
                .map_err(|e| AppError::session_creation_failed(self.variant_key.as_str(), e))?;
        }

        Ok(())
    }

    fn script_timeout(&self) -> Duration {
        match self.timeouts.lock() {
            Ok(guard) => guard.script,
            Err(poisoned) => poisoned.into_inner().script,
        }
    }
}

#[async_trait::async_trait]
impl DriverSession for CdpSession {
    fn variant_key(&self) -> &str {
        &self.variant_key
    }

    async fn configure_timeouts(&self, timeouts: SessionTimeouts) -> AppResult<()> {
        // CDP 没有独立的隐式等待概念，超时记录在会话内，由各页面操作统一应用
        match self.timeouts.lock() {
            Ok(mut guard) => *guard = timeouts,
            Err(poisoned) => *poisoned.into_inner() = timeouts,
        }
        debug!(
            "[变体 {}] 超时已配置: implicit={:?}, page_load={:?}, script={:?}",
            self.variant_key, timeouts.implicit_wait, timeouts.page_load, timeouts.script
        );
        Ok(())
    }

    async fn maximize(&self) -> AppResult<()> {
        self.page
            .evaluate("window.moveTo(0, 0); window.resizeTo(screen.availWidth, screen.availHeight);")
            .await
            .map_err(|e| AppError::session_creation_failed(self.variant_key.as_str(), e))?;
        Ok(())
    }

    async fn take_screenshot(&self) -> AppResult<Vec<u8>> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(false)
            .build();
        let shot = timeout(self.script_timeout(), self.page.screenshot(params))
            .await
            .map_err(|_| {
                AppError::Other(format!("[变体 {}] 截图超时", self.variant_key))
            })?
            .map_err(|e| AppError::session_creation_failed(self.variant_key.as_str(), e))?;
        Ok(shot)
    }

    async fn current_url(&self) -> AppResult<String> {
        let url = timeout(self.script_timeout(), self.page.url())
            .await
            .map_err(|_| {
                AppError::Other(format!("[变体 {}] 读取 URL 超时", self.variant_key))
            })?
            .map_err(|e| AppError::session_creation_failed(self.variant_key.as_str(), e))?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn close(&self) -> AppResult<()> {
        let mut browser = self.browser.lock().await;
        let result = browser.close().await;
        // 无论关闭是否成功，事件循环都要停掉
        self.handler_task.abort();
        result.map_err(|e| AppError::Other(format!("关闭浏览器失败: {}", e)))?;
        Ok(())
    }
}
