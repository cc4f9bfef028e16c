//! 单变体执行流程 - 流程层
//!
//! 核心职责：定义"一个变体"的完整执行流程
//!
//! 流程顺序：
//! 1. 创建会话 → 注册到工作者上下文
//! 2. 执行调用方提供的测试过程
//! 3. 无论成败都回收会话，产出本变体的结果
//!
//! 任何一步失败都只影响本变体的结果，不向上抛出

use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::infrastructure::session_ctx::SessionContext;
use crate::models::report::VariantOutcome;
use crate::models::variant::BrowserVariant;
use crate::services::reporter::ReporterSink;
use crate::services::session_factory::SessionFactory;

/// 调用方提供的测试过程
///
/// 过程拿到的是只读上下文：会话的生命周期由流程层负责
#[async_trait]
pub trait TestProcedure: Send + Sync {
    async fn run(
        &self,
        ctx: &SessionContext,
        variant: &'static BrowserVariant,
    ) -> anyhow::Result<()>;
}

/// 执行单个变体
pub async fn run_variant(
    factory: &SessionFactory,
    reporter: &dyn ReporterSink,
    variant: &'static BrowserVariant,
    procedure: &dyn TestProcedure,
) -> VariantOutcome {
    let started = Instant::now();
    reporter.test_started(variant.key);

    let mut ctx = SessionContext::new(variant.key);

    let outcome = match factory.create_session(variant).await {
        Ok(session) => {
            ctx.attach(session).await;

            let run_result = procedure.run(&ctx, variant).await;
            // 回收必须执行：过程成败都不能跳过
            let teardown_result = ctx.try_teardown().await;

            let elapsed = started.elapsed().as_millis() as u64;
            match (run_result, teardown_result) {
                (Ok(()), Ok(())) => {
                    reporter.log_pass(&format!("[变体 {}] 执行通过", variant.key));
                    VariantOutcome::passed(variant, elapsed)
                }
                (Ok(()), Err(teardown_err)) => {
                    reporter.log_fail(&format!(
                        "[变体 {}] 过程通过，但会话回收失败",
                        variant.key
                    ));
                    VariantOutcome::failed(variant, elapsed, teardown_err.to_string())
                }
                (Err(proc_err), teardown_result) => {
                    if let Err(teardown_err) = teardown_result {
                        warn!(
                            "⚠️ [变体 {}] 回收同时失败（结果以过程错误为准）: {}",
                            variant.key, teardown_err
                        );
                    }
                    reporter.log_fail(&format!(
                        "[变体 {}] 执行失败: {}",
                        variant.key, proc_err
                    ));
                    VariantOutcome::failed(variant, elapsed, proc_err.to_string())
                }
            }
        }
        Err(create_err) => {
            // 创建失败时上下文里没有会话，回收是幂等 no-op，照常执行以保持清理路径一致
            ctx.teardown().await;
            let elapsed = started.elapsed().as_millis() as u64;
            reporter.log_exception(
                &format!("[变体 {}] 会话创建失败", variant.key),
                &create_err,
            );
            VariantOutcome::failed(variant, elapsed, create_err.to_string())
        }
    };

    reporter.test_finished(variant.key);
    info!(
        "[变体 {}] 结果: {} ({} ms)",
        variant.key,
        if outcome.passed { "PASS" } else { "FAIL" },
        outcome.duration_ms
    );
    outcome
}
