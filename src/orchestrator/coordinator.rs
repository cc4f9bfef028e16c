//! 跨变体执行协调器 - 编排层
//!
//! ## 职责
//!
//! 1. **顺序执行**：按输入顺序逐个执行变体，一次只有一个活会话
//! 2. **全量收集**：单个变体失败不会中止后续变体，失败体现在聚合结果里
//! 3. **资源隔离**：会话工厂与报告接收器只由编排层持有
//! 4. **聚合输出**：产出按输入顺序排列的 ExecutionResult 与兼容性矩阵
//!
//! 调度模型是同步阻塞的：并行由外层测试运行器按工作者划分，
//! 本协调器内部不引入额外的并发

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::runtime::DriverSession;
use crate::infrastructure::session_ctx::SessionContext;
use crate::models::loaders::load_matrix_plan;
use crate::models::report::ExecutionResult;
use crate::models::variant::{self, BrowserVariant};
use crate::services::reporter::{ReporterSink, TracingReporter};
use crate::services::session_factory::SessionFactory;
use crate::utils::logging;
use crate::workflow::variant_run::{run_variant, TestProcedure};

/// 跨变体执行协调器
pub struct Coordinator {
    factory: SessionFactory,
    reporter: Arc<dyn ReporterSink>,
}

impl Coordinator {
    /// 用标准组件构建协调器
    pub fn new(config: Config) -> Self {
        let reporter = Arc::new(TracingReporter::new(config.screenshot_dir.clone()));
        Self {
            factory: SessionFactory::new(config),
            reporter,
        }
    }

    /// 用自定义组件构建协调器
    pub fn with_parts(factory: SessionFactory, reporter: Arc<dyn ReporterSink>) -> Self {
        Self { factory, reporter }
    }

    pub fn factory(&self) -> &SessionFactory {
        &self.factory
    }

    pub fn reporter(&self) -> Arc<dyn ReporterSink> {
        Arc::clone(&self.reporter)
    }

    /// 对变体列表逐个执行测试过程
    ///
    /// # 参数
    /// - `variants`: 按执行顺序排列的变体
    /// - `procedure`: 对每个变体执行的测试过程
    ///
    /// # 返回
    /// 返回按输入顺序排列的聚合结果；本函数自身不会失败
    pub async fn run_across_variants(
        &self,
        variants: &[&'static BrowserVariant],
        procedure: &dyn TestProcedure,
    ) -> ExecutionResult {
        let total = variants.len();
        let mut result = ExecutionResult::new();

        info!("{}", "=".repeat(60));
        info!("📦 跨变体执行开始，共 {} 个变体", total);
        info!("{}", "=".repeat(60));

        for (index, variant) in variants.iter().enumerate() {
            logging::log_variant_start(index + 1, total, variant);

            let outcome =
                run_variant(&self.factory, self.reporter.as_ref(), variant, procedure).await;

            logging::log_variant_complete(index + 1, total, &outcome);
            // 失败不提前退出：剩余变体照常执行
            result.push(outcome);
        }

        info!("\n{}", "─".repeat(60));
        info!(
            "📊 聚合完成: 通过 {}/{}，失败 {}",
            result.pass_count(),
            total,
            result.fail_count()
        );
        info!("{}", "─".repeat(60));

        result
    }
}

/// 冒烟过程：确认会话可用，取当前 URL 并留存截图
struct SmokeProcedure {
    reporter: Arc<dyn ReporterSink>,
}

#[async_trait]
impl TestProcedure for SmokeProcedure {
    async fn run(
        &self,
        ctx: &SessionContext,
        variant: &'static BrowserVariant,
    ) -> anyhow::Result<()> {
        let Some(session) = ctx.session() else {
            anyhow::bail!("会话未注册");
        };

        let url = session.current_url().await?;
        self.reporter
            .log_info(&format!("[变体 {}] 当前页面: {}", variant.key, url));

        if variant.supports_screenshots {
            let shot = session.take_screenshot().await?;
            self.reporter
                .attach_screenshot(&format!("smoke_{}", variant.key), &shot);
        }

        Ok(())
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    coordinator: Coordinator,
    variant_keys: Vec<String>,
}

impl App {
    /// 初始化应用
    ///
    /// 配置了矩阵计划文件时优先使用计划，并应用计划中的覆盖项
    pub async fn initialize(config: Config) -> Result<Self> {
        logging::init_log_file(&config.output_log_file)?;
        logging::log_startup(&config);

        let mut config = config;
        let variant_keys = match &config.matrix_file {
            Some(path) => {
                let plan = load_matrix_plan(std::path::Path::new(path)).await?;
                info!("📋 使用矩阵计划: {}", plan.display_name());
                if let Some(grid_url) = plan.grid_url.clone() {
                    config.grid_url = Some(grid_url);
                }
                if let Some(headless) = plan.headless {
                    config.headless = headless;
                }
                plan.variants
            }
            None => config.variants.clone(),
        };

        Ok(Self {
            coordinator: Coordinator::new(config.clone()),
            config,
            variant_keys,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        if self.variant_keys.is_empty() {
            warn!("⚠️ 没有配置任何变体，程序结束");
            return Ok(());
        }

        let variants: Vec<&'static BrowserVariant> = self
            .variant_keys
            .iter()
            .map(|key| variant::resolve(key))
            .collect();
        logging::log_matrix_loaded(variants.len());

        // 详细日志（如果启用）
        if self.config.verbose_logging {
            for variant in &variants {
                info!("  - {}", variant);
            }
        }

        let procedure = SmokeProcedure {
            reporter: self.coordinator.reporter(),
        };
        let result = self
            .coordinator
            .run_across_variants(&variants, &procedure)
            .await;

        let matrix = result.render_matrix();
        self.coordinator
            .reporter()
            .attach_table("兼容性矩阵", &matrix);
        logging::append_to_log_file(&self.config.output_log_file, &matrix);
        logging::print_final_stats(&result, &self.config);

        Ok(())
    }
}
