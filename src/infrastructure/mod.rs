//! 基础设施层（Infrastructure Layer）
//!
//! ## 职责
//!
//! 本层持有稀缺资源（浏览器进程、网格会话），只向上暴露能力：
//!
//! - `runtime` - 会话运行时契约（DriverSession / DriverRuntime）与标准实现的组装
//! - `cdp_runtime` - 本地 CDP 运行时（拉起浏览器进程）
//! - `grid_client` - 远程网格客户端（W3C 线协议）
//! - `session_ctx` - 工作者会话上下文（每工作者一个会话槽位）
//!
//! 本层不认识变体目录，也不处理执行流程

pub mod cdp_runtime;
pub mod grid_client;
pub mod runtime;
pub mod session_ctx;

pub use cdp_runtime::{CdpRuntime, CdpSession};
pub use grid_client::{GridClient, GridSession};
pub use runtime::{
    DriverRuntime, DriverSession, LaunchOptions, MobileProfile, SessionPlan, SessionTimeouts,
    StandardRuntime,
};
pub use session_ctx::SessionContext;
