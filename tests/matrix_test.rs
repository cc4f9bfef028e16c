//! 用模拟运行时驱动的协调器 / 工厂 / 上下文测试
//!
//! 不需要真实浏览器或网格：运行时与二进制解析器都被替换为
//! 可注入故障、可计数的模拟实现

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use cross_browser_runner::error::{AppError, AppResult};
use cross_browser_runner::infrastructure::{
    DriverRuntime, DriverSession, SessionContext, SessionPlan, SessionTimeouts,
};
use cross_browser_runner::models::variant::resolve;
use cross_browser_runner::models::BrowserVariant;
use cross_browser_runner::services::{BinaryProvisioner, SessionFactory, TracingReporter};
use cross_browser_runner::workflow::TestProcedure;
use cross_browser_runner::{BrowserEngine, Config, Coordinator};

// ========== 模拟实现 ==========

/// 模拟会话：记录关闭次数，可注入关闭失败
struct MockSession {
    key: String,
    close_fails: bool,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl DriverSession for MockSession {
    fn variant_key(&self) -> &str {
        &self.key
    }

    async fn configure_timeouts(&self, _timeouts: SessionTimeouts) -> AppResult<()> {
        Ok(())
    }

    async fn maximize(&self) -> AppResult<()> {
        Ok(())
    }

    async fn take_screenshot(&self) -> AppResult<Vec<u8>> {
        Ok(vec![0x89, b'P', b'N', b'G'])
    }

    async fn current_url(&self) -> AppResult<String> {
        Ok("about:blank".to_string())
    }

    async fn close(&self) -> AppResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        if self.close_fails {
            return Err(AppError::Other("模拟关闭失败".to_string()));
        }
        Ok(())
    }
}

/// 模拟运行时：可按变体 key 注入创建 / 关闭失败
#[derive(Default)]
struct MockRuntime {
    created: AtomicUsize,
    fail_create: HashSet<String>,
    fail_close: HashSet<String>,
    closes: Arc<AtomicUsize>,
}

impl MockRuntime {
    fn failing_create(keys: &[&str]) -> Self {
        Self {
            fail_create: keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    fn failing_close(keys: &[&str]) -> Self {
        Self {
            fail_close: keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl DriverRuntime for MockRuntime {
    async fn create(
        &self,
        variant_key: &str,
        _plan: &SessionPlan,
    ) -> AppResult<Box<dyn DriverSession>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.contains(variant_key) {
            return Err(AppError::Other(format!("模拟创建失败: {}", variant_key)));
        }
        Ok(Box::new(MockSession {
            key: variant_key.to_string(),
            close_fails: self.fail_close.contains(variant_key),
            closes: Arc::clone(&self.closes),
        }))
    }
}

/// 计数的二进制解析器：永远返回 None，只记录调用次数
#[derive(Default)]
struct CountingProvisioner {
    calls: AtomicUsize,
}

#[async_trait]
impl BinaryProvisioner for CountingProvisioner {
    async fn provision(&self, _engine: BrowserEngine) -> AppResult<Option<PathBuf>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

/// 总是成功的测试过程
struct AlwaysPass;

#[async_trait]
impl TestProcedure for AlwaysPass {
    async fn run(
        &self,
        ctx: &SessionContext,
        _variant: &'static BrowserVariant,
    ) -> anyhow::Result<()> {
        assert!(ctx.has_session(), "过程执行时会话应已注册");
        Ok(())
    }
}

/// 对指定变体失败的测试过程
struct FailOn(&'static str);

#[async_trait]
impl TestProcedure for FailOn {
    async fn run(
        &self,
        _ctx: &SessionContext,
        variant: &'static BrowserVariant,
    ) -> anyhow::Result<()> {
        if variant.key == self.0 {
            anyhow::bail!("制造的过程失败: {}", variant.key);
        }
        Ok(())
    }
}

fn coordinator_with(runtime: Arc<MockRuntime>, provisioner: Arc<CountingProvisioner>) -> Coordinator {
    let factory = SessionFactory::with_runtime(Config::default(), runtime, provisioner);
    Coordinator::with_parts(
        factory,
        Arc::new(TracingReporter::new("target/test-screenshots")),
    )
}

// ========== 协调器 ==========

#[tokio::test]
async fn test_collect_all_failures_in_order() {
    // 3 个变体，第 2 个创建必然失败：期望 [PASS, FAIL, PASS]，且运行不抛错
    let runtime = Arc::new(MockRuntime::failing_create(&["firefox"]));
    let provisioner = Arc::new(CountingProvisioner::default());
    let coordinator = coordinator_with(Arc::clone(&runtime), Arc::clone(&provisioner));

    let variants = [resolve("chrome"), resolve("firefox"), resolve("edge")];
    let result = coordinator.run_across_variants(&variants, &AlwaysPass).await;

    assert_eq!(result.len(), 3);
    let flags: Vec<bool> = result.outcomes().iter().map(|o| o.passed).collect();
    assert_eq!(flags, vec![true, false, true]);
    let keys: Vec<_> = result.outcomes().iter().map(|o| o.variant.key).collect();
    assert_eq!(keys, vec!["chrome", "firefox", "edge"]);
    assert_eq!(result.pass_count(), 2);
    assert_eq!(result.fail_count(), 1);
    assert!(!result.all_passed());

    // 失败的变体也尝试过创建：3 次创建，2 次关闭
    assert_eq!(runtime.created.load(Ordering::SeqCst), 3);
    assert_eq!(runtime.closes.load(Ordering::SeqCst), 2);
    // 每个本地变体各做一次二进制解析
    assert_eq!(provisioner.calls.load(Ordering::SeqCst), 3);

    let failed = &result.outcomes()[1];
    assert!(failed.error.as_deref().unwrap_or("").contains("模拟创建失败"));
}

#[tokio::test]
async fn test_teardown_runs_even_when_procedure_fails() {
    let runtime = Arc::new(MockRuntime::default());
    let provisioner = Arc::new(CountingProvisioner::default());
    let coordinator = coordinator_with(Arc::clone(&runtime), provisioner);

    let variants = [resolve("chrome"), resolve("edge")];
    let result = coordinator
        .run_across_variants(&variants, &FailOn("edge"))
        .await;

    assert_eq!(result.len(), 2);
    assert!(result.outcomes()[0].passed);
    assert!(!result.outcomes()[1].passed);
    // 过程失败的会话同样被回收
    assert_eq!(runtime.closes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_teardown_failure_marks_variant_failed_without_aborting() {
    let runtime = Arc::new(MockRuntime::failing_close(&["chrome"]));
    let provisioner = Arc::new(CountingProvisioner::default());
    let coordinator = coordinator_with(Arc::clone(&runtime), provisioner);

    let variants = [resolve("chrome"), resolve("edge")];
    let result = coordinator.run_across_variants(&variants, &AlwaysPass).await;

    assert_eq!(result.len(), 2);
    assert!(!result.outcomes()[0].passed);
    assert!(result.outcomes()[0]
        .error
        .as_deref()
        .unwrap_or("")
        .contains("关闭会话失败"));
    // 回收失败不影响后续变体
    assert!(result.outcomes()[1].passed);
}

#[tokio::test]
async fn test_matrix_rendering_is_byte_identical() {
    let runtime = Arc::new(MockRuntime::failing_create(&["firefox"]));
    let provisioner = Arc::new(CountingProvisioner::default());
    let coordinator = coordinator_with(runtime, provisioner);

    let variants = [resolve("chrome"), resolve("firefox")];
    let result = coordinator.run_across_variants(&variants, &AlwaysPass).await;

    let first = result.render_matrix();
    let second = result.render_matrix();
    assert_eq!(first.as_bytes(), second.as_bytes());
    assert!(first.contains("chrome"));
    assert!(first.contains("FAIL"));
}

// ========== 工厂 ==========

#[cfg(not(target_os = "macos"))]
#[tokio::test]
async fn test_safari_platform_gate_precedes_provisioning() {
    let runtime = Arc::new(MockRuntime::default());
    let provisioner = Arc::new(CountingProvisioner::default());
    let factory = SessionFactory::with_runtime(
        Config::default(),
        Arc::clone(&runtime) as Arc<dyn DriverRuntime>,
        Arc::clone(&provisioner) as Arc<dyn BinaryProvisioner>,
    );

    let err = factory
        .create_session(resolve("safari"))
        .await
        .expect_err("非 macOS 平台上 Safari 创建应失败");
    assert!(err.is_unsupported_platform());

    // 平台门槛先于二进制解析和运行时创建
    assert_eq!(provisioner.calls.load(Ordering::SeqCst), 0);
    assert_eq!(runtime.created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_capability_cache_behind_factory() {
    let runtime = Arc::new(MockRuntime::default());
    let provisioner = Arc::new(CountingProvisioner::default());
    let factory = SessionFactory::with_runtime(Config::default(), runtime, provisioner);

    let variant = resolve("chrome-remote");
    let first = factory.capabilities(variant);
    let second = factory.capabilities(variant);
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(factory.capability_cache().computations(), 1);

    factory.clear_capability_cache();
    let third = factory.capabilities(variant);
    assert_eq!(factory.capability_cache().computations(), 2);
    assert_eq!(*first, *third);
}

// ========== 工作者上下文 ==========

#[test]
fn test_double_teardown_is_noop() {
    // tokio_test: 在同步测试里驱动异步回收路径
    tokio_test::block_on(async {
        let closes = Arc::new(AtomicUsize::new(0));
        let session = Box::new(MockSession {
            key: "chrome".to_string(),
            close_fails: false,
            closes: Arc::clone(&closes),
        });

        let mut ctx = SessionContext::with_session("chrome", session);
        assert!(ctx.has_session());

        ctx.teardown().await;
        assert!(!ctx.has_session());
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        // 第二次回收是 no-op，不会再次关闭，也不会出错
        ctx.teardown().await;
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert!(ctx.try_teardown().await.is_ok());
    });
}

#[tokio::test]
async fn test_failed_close_still_clears_slot() {
    let closes = Arc::new(AtomicUsize::new(0));
    let session = Box::new(MockSession {
        key: "chrome".to_string(),
        close_fails: true,
        closes: Arc::clone(&closes),
    });

    let mut ctx = SessionContext::with_session("chrome", session);
    let result = ctx.try_teardown().await;
    assert!(result.is_err());
    // 关闭失败也不会留下悬挂句柄
    assert!(!ctx.has_session());
    assert_eq!(closes.load(Ordering::SeqCst), 1);

    // 后续回收是 no-op
    assert!(ctx.try_teardown().await.is_ok());
    assert_eq!(closes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_attach_overwrites_after_closing_previous() {
    let closes = Arc::new(AtomicUsize::new(0));
    let first = Box::new(MockSession {
        key: "chrome".to_string(),
        close_fails: false,
        closes: Arc::clone(&closes),
    });
    let second = Box::new(MockSession {
        key: "chrome".to_string(),
        close_fails: false,
        closes: Arc::clone(&closes),
    });

    let mut ctx = SessionContext::new("chrome");
    ctx.attach(first).await;
    // 未回收就再次注册：旧会话被关闭后覆盖，不会泄漏两个活句柄
    ctx.attach(second).await;
    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert!(ctx.has_session());

    ctx.teardown().await;
    assert_eq!(closes.load(Ordering::SeqCst), 2);
}
