//! 驱动运行时契约 - 基础设施层
//!
//! 本模块定义会话工厂与具体驱动实现之间的窄接口：
//! 工厂产出 SessionPlan，运行时把计划变成活的会话句柄。
//! 会话句柄只暴露五个能力（超时配置 / 最大化 / 截图 / 取 URL / 关闭），
//! 上层不接触任何驱动细节

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::AppResult;
use crate::infrastructure::cdp_runtime::CdpRuntime;
use crate::infrastructure::grid_client::GridClient;
use crate::models::capabilities::CapabilitiesDescriptor;
use crate::models::engine::BrowserEngine;

/// 会话基线超时
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    /// 隐式元素等待
    pub implicit_wait: Duration,
    /// 页面加载超时
    pub page_load: Duration,
    /// 脚本执行超时
    pub script: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            implicit_wait: Duration::from_secs(10),
            page_load: Duration::from_secs(30),
            script: Duration::from_secs(30),
        }
    }
}

/// 移动端模拟参数
#[derive(Debug, Clone, PartialEq)]
pub struct MobileProfile {
    pub device_name: String,
    pub user_agent: String,
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f64,
}

/// 本地会话启动选项
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub engine: BrowserEngine,
    /// 浏览器可执行文件（None 时交由运行时自行探测）
    pub executable: Option<PathBuf>,
    pub args: Vec<String>,
    pub headless: bool,
    pub window_size: (u32, u32),
    /// 下载偏好键值（download.default_directory 等）
    pub prefs: Map<String, Value>,
    pub mobile_emulation: Option<MobileProfile>,
}

/// 会话创建计划
#[derive(Debug, Clone)]
pub enum SessionPlan {
    /// 本地启动
    Local(LaunchOptions),
    /// 经远程网格创建
    Remote {
        endpoint: String,
        capabilities: CapabilitiesDescriptor,
    },
}

/// 活的驱动会话句柄
///
/// 句柄由创建它的工作者独占持有，生命周期内不跨工作者共享
#[async_trait]
pub trait DriverSession: Send + Sync {
    /// 所属变体 key
    fn variant_key(&self) -> &str;

    /// 应用三项基线超时
    async fn configure_timeouts(&self, timeouts: SessionTimeouts) -> AppResult<()>;

    /// 最大化窗口
    async fn maximize(&self) -> AppResult<()>;

    /// 截取当前页面（PNG 字节）
    async fn take_screenshot(&self) -> AppResult<Vec<u8>>;

    /// 当前页面 URL
    async fn current_url(&self) -> AppResult<String>;

    /// 关闭底层会话
    async fn close(&self) -> AppResult<()>;
}

impl std::fmt::Debug for dyn DriverSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverSession")
            .field("variant_key", &self.variant_key())
            .finish()
    }
}

/// 驱动运行时：把会话计划变成会话句柄
#[async_trait]
pub trait DriverRuntime: Send + Sync {
    async fn create(
        &self,
        variant_key: &str,
        plan: &SessionPlan,
    ) -> AppResult<Box<dyn DriverSession>>;
}

/// 标准运行时：本地计划走 CDP，远程计划走网格
pub struct StandardRuntime {
    cdp: CdpRuntime,
    grid: GridClient,
}

impl StandardRuntime {
    pub fn new() -> Self {
        Self {
            cdp: CdpRuntime::new(),
            grid: GridClient::new(),
        }
    }
}

impl Default for StandardRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DriverRuntime for StandardRuntime {
    async fn create(
        &self,
        variant_key: &str,
        plan: &SessionPlan,
    ) -> AppResult<Box<dyn DriverSession>> {
        match plan {
            SessionPlan::Local(options) => {
                let session = self.cdp.launch(variant_key, options).await?;
                Ok(Box::new(session))
            }
            SessionPlan::Remote {
                endpoint,
                capabilities,
            } => {
                let session = self
                    .grid
                    .new_session(variant_key, endpoint, capabilities)
                    .await?;
                Ok(Box::new(session))
            }
        }
    }
}
