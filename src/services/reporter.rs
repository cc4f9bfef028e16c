//! 报告接收器 - 业务能力层
//!
//! 执行过程中的结构化条目（信息 / 通过 / 失败 / 异常）、
//! 命名截图和表格数据都经由这个接口流出。
//! 持久化格式由具体实现决定，本核心不关心

use std::fs;
use std::path::PathBuf;

use tracing::{error, info, warn};

/// 报告接收器
///
/// start / finish 括住一个逻辑测试的生命周期
pub trait ReporterSink: Send + Sync {
    fn test_started(&self, name: &str);
    fn log_info(&self, message: &str);
    fn log_pass(&self, message: &str);
    fn log_fail(&self, message: &str);
    fn log_exception(&self, message: &str, error: &(dyn std::error::Error + 'static));
    /// 附加命名截图
    fn attach_screenshot(&self, label: &str, bytes: &[u8]);
    /// 附加表格数据（已渲染的文本表）
    fn attach_table(&self, title: &str, table: &str);
    fn test_finished(&self, name: &str);
}

/// 基于 tracing 的接收器
///
/// 日志条目走 tracing，截图落到配置的目录，文件名带时间戳避免覆盖
pub struct TracingReporter {
    screenshot_dir: PathBuf,
}

impl TracingReporter {
    pub fn new(screenshot_dir: impl Into<PathBuf>) -> Self {
        Self {
            screenshot_dir: screenshot_dir.into(),
        }
    }

    fn screenshot_path(&self, label: &str) -> PathBuf {
        let safe_label: String = label
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S%.3f");
        self.screenshot_dir
            .join(format!("{}_{}.png", safe_label, stamp))
    }
}

impl ReporterSink for TracingReporter {
    fn test_started(&self, name: &str) {
        info!("▶ 测试开始: {}", name);
    }

    fn log_info(&self, message: &str) {
        info!("{}", message);
    }

    fn log_pass(&self, message: &str) {
        info!("✅ {}", message);
    }

    fn log_fail(&self, message: &str) {
        warn!("❌ {}", message);
    }

    fn log_exception(&self, message: &str, error: &(dyn std::error::Error + 'static)) {
        error!("💥 {}: {}", message, error);
    }

    fn attach_screenshot(&self, label: &str, bytes: &[u8]) {
        // 接收器不允许抛错：落盘失败记录后继续
        if let Err(e) = fs::create_dir_all(&self.screenshot_dir) {
            warn!("⚠️ 创建截图目录失败 {}: {}", self.screenshot_dir.display(), e);
            return;
        }
        let path = self.screenshot_path(label);
        match fs::write(&path, bytes) {
            Ok(()) => info!("📷 截图已保存: {}", path.display()),
            Err(e) => warn!("⚠️ 截图保存失败 {}: {}", path.display(), e),
        }
    }

    fn attach_table(&self, title: &str, table: &str) {
        info!("📊 {}\n{}", title, table);
    }

    fn test_finished(&self, name: &str) {
        info!("■ 测试结束: {}", name);
    }
}
