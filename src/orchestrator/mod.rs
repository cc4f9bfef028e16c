//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责矩阵调度和应用生命周期，是整个系统的"指挥中心"。
//!
//! ### `coordinator` - 跨变体执行协调器
//! - 按输入顺序逐个执行变体（严格串行）
//! - 全量收集失败（collect-all-failures），不提前中止
//! - 聚合 ExecutionResult 并渲染兼容性矩阵
//! - `App` 管理应用生命周期（初始化、计划加载、运行、统计）
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::Coordinator (处理 Vec<Variant>)
//!     ↓
//! workflow::run_variant (处理单个 Variant)
//!     ↓
//! services (能力层：factory / cache / provisioner / reporter)
//!     ↓
//! infrastructure (基础设施：runtime / session_ctx)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：Coordinator 管矩阵，workflow 管单个变体
//! 2. **资源隔离**：只有编排层持有 SessionFactory 和 ReporterSink
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体判断

pub mod coordinator;

pub use coordinator::{App, Coordinator};
