//! 流程层（Workflow Layer）
//!
//! 定义"一个变体"的完整执行流程：创建 → 注册 → 过程 → 回收 → 结果。
//! 不持有任何资源，只依赖业务能力（services）

pub mod variant_run;

pub use variant_run::{run_variant, TestProcedure};
