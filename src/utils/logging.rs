use anyhow::Result;
/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::models::report::{ExecutionResult, VariantOutcome};
use crate::models::variant::BrowserVariant;

/// 初始化 tracing 订阅器
///
/// 日志级别由 RUST_LOG 控制，默认 info
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
///
/// # 返回
/// 返回是否成功初始化
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n兼容性执行日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 追加内容到日志文件
///
/// 写入失败只记录警告，不影响主流程
pub fn append_to_log_file(log_file_path: &str, content: &str) {
    use std::io::Write;
    let result = fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(log_file_path)
        .and_then(|mut file| file.write_all(content.as_bytes()));
    if let Err(e) = result {
        warn!("⚠️ 写入日志文件失败 {}: {}", log_file_path, e);
    }
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 跨浏览器兼容性执行模式");
    info!("🌐 默认浏览器: {}", config.default_browser);
    info!(
        "🖥️ 网格地址: {}",
        config.grid_url.as_deref().unwrap_or("<未配置>")
    );
    info!("{}", "=".repeat(60));
}

/// 记录矩阵加载信息
pub fn log_matrix_loaded(total: usize) {
    info!("✓ 共 {} 个待执行的变体", total);
    info!("💡 变体按声明顺序严格串行执行\n");
}

/// 记录变体执行开始
///
/// # 参数
/// - `index`: 变体序号（从1开始）
/// - `total`: 变体总数
pub fn log_variant_start(index: usize, total: usize, variant: &BrowserVariant) {
    info!("\n{}", "=".repeat(60));
    info!("▶ 开始执行第 {}/{} 个变体: {}", index, total, variant);
    info!("{}", "=".repeat(60));
}

/// 记录变体执行完成
pub fn log_variant_complete(index: usize, total: usize, outcome: &VariantOutcome) {
    if outcome.passed {
        info!(
            "✓ 第 {}/{} 个变体完成: {} PASS ({} ms)",
            index, total, outcome.variant.key, outcome.duration_ms
        );
    } else {
        info!(
            "✗ 第 {}/{} 个变体完成: {} FAIL ({} ms)",
            index, total, outcome.variant.key, outcome.duration_ms
        );
    }
}

/// 打印最终统计信息
pub fn print_final_stats(result: &ExecutionResult, config: &Config) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部执行完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 通过: {}/{}", result.pass_count(), result.len());
    info!("❌ 失败: {}", result.fail_count());
    info!("{}", "=".repeat(60));
    info!("\n矩阵已保存至: {}", config.output_log_file);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
