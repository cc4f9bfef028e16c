//! # Cross Browser Runner
//!
//! 一个用于跨浏览器兼容性执行的 Rust 框架
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（浏览器进程、网格会话），只暴露能力
//! - `runtime` - DriverSession / DriverRuntime 窄契约
//! - `cdp_runtime` / `grid_client` - 本地与远程两条创建路径
//! - `SessionContext` - 每工作者一个会话槽位
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"对单个变体我能做什么"
//! - `SessionFactory` - 变体 → 会话句柄
//! - `CapabilityCache` - 能力描述符记忆化
//! - `BinaryProvisioner` - 浏览器二进制解析
//! - `ReporterSink` - 结构化报告出口
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一个变体"的完整执行流程
//! - `run_variant` - 创建 → 注册 → 过程 → 回收 → 结果
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/` - 矩阵调度与应用生命周期
//! - `Coordinator` - 按序执行变体集，全量收集失败
//! - `App` - 初始化、计划加载、运行、统计
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult, TeardownError};
pub use infrastructure::{
    DriverRuntime, DriverSession, LaunchOptions, SessionContext, SessionPlan, SessionTimeouts,
    StandardRuntime,
};
pub use models::{
    all_of_category, default_variant, resolve, try_resolve, BrowserEngine, BrowserVariant,
    CapabilitiesDescriptor, ExecutionResult, MatrixPlan, VariantCategory, VariantOutcome, CATALOG,
};
pub use orchestrator::{App, Coordinator};
pub use services::{
    BinaryProvisioner, CapabilityCache, PathProvisioner, ReporterSink, SessionFactory,
    TracingReporter,
};
pub use workflow::{run_variant, TestProcedure};
