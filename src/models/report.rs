//! 执行结果聚合
//!
//! 一次矩阵运行的逐变体结果，按输入顺序保存，
//! 并提供确定性的兼容性矩阵文本渲染

use crate::models::variant::BrowserVariant;

/// 单个变体的执行结果
#[derive(Debug, Clone, PartialEq)]
pub struct VariantOutcome {
    pub variant: &'static BrowserVariant,
    pub passed: bool,
    /// 失败原因（通过时为 None）
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl VariantOutcome {
    /// 通过结果
    pub fn passed(variant: &'static BrowserVariant, duration_ms: u64) -> Self {
        Self {
            variant,
            passed: true,
            error: None,
            duration_ms,
        }
    }

    /// 失败结果
    pub fn failed(
        variant: &'static BrowserVariant,
        duration_ms: u64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            variant,
            passed: false,
            error: Some(error.into()),
            duration_ms,
        }
    }
}

/// 跨变体执行的聚合结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    outcomes: Vec<VariantOutcome>,
}

impl ExecutionResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: VariantOutcome) {
        self.outcomes.push(outcome);
    }

    /// 按输入顺序的全部结果
    pub fn outcomes(&self) -> &[VariantOutcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn pass_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn fail_count(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed).count()
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    /// 渲染兼容性矩阵
    ///
    /// 逐变体一行，按输入顺序；不含时间戳等运行期信息，
    /// 同一结果的两次渲染逐字节一致
    pub fn render_matrix(&self) -> String {
        let mut out = String::new();
        out.push_str(&"=".repeat(92));
        out.push('\n');
        out.push_str("兼容性矩阵\n");
        out.push_str(&"=".repeat(92));
        out.push('\n');
        out.push_str(&format!(
            "{:<18} {:<10} {:<6} {:^4} {:^4} {:^4} {:<6} {:>8}  {}\n",
            "变体", "引擎", "模式", "无头", "截图", "下载", "结果", "耗时ms", "错误"
        ));
        out.push_str(&"-".repeat(92));
        out.push('\n');

        for outcome in &self.outcomes {
            let v = outcome.variant;
            let mode = if v.is_docker() {
                "容器"
            } else if v.is_remote() {
                "远程"
            } else if v.is_mobile() {
                "移动"
            } else {
                "本地"
            };
            let error = outcome
                .error
                .as_deref()
                .map(|e| truncate(e, 40))
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!(
                "{:<18} {:<10} {:<6} {:^4} {:^4} {:^4} {:<6} {:>8}  {}\n",
                v.key,
                v.engine.name(),
                mode,
                flag(v.supports_headless),
                flag(v.supports_screenshots),
                flag(v.supports_downloads),
                if outcome.passed { "PASS" } else { "FAIL" },
                outcome.duration_ms,
                error
            ));
        }

        out.push_str(&"-".repeat(92));
        out.push('\n');
        out.push_str(&format!(
            "通过 {}/{}，失败 {}\n",
            self.pass_count(),
            self.len(),
            self.fail_count()
        ));
        out.push_str(&"=".repeat(92));
        out.push('\n');
        out
    }
}

fn flag(enabled: bool) -> &'static str {
    if enabled {
        "✓"
    } else {
        "✗"
    }
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::variant::resolve;

    #[test]
    fn test_counts_and_order() {
        let mut result = ExecutionResult::new();
        result.push(VariantOutcome::passed(resolve("chrome"), 120));
        result.push(VariantOutcome::failed(resolve("firefox"), 30, "启动失败"));
        result.push(VariantOutcome::passed(resolve("edge"), 95));

        assert_eq!(result.len(), 3);
        assert_eq!(result.pass_count(), 2);
        assert_eq!(result.fail_count(), 1);
        assert!(!result.all_passed());

        let keys: Vec<_> = result.outcomes().iter().map(|o| o.variant.key).collect();
        assert_eq!(keys, vec!["chrome", "firefox", "edge"]);
    }

    #[test]
    fn test_matrix_rendering_deterministic() {
        let mut result = ExecutionResult::new();
        result.push(VariantOutcome::passed(resolve("chrome"), 120));
        result.push(VariantOutcome::failed(resolve("safari"), 5, "引擎 safari 需要 macos 平台"));

        let first = result.render_matrix();
        let second = result.render_matrix();
        assert_eq!(first, second);
        assert!(first.contains("PASS"));
        assert!(first.contains("FAIL"));
        assert!(first.contains("通过 1/2"));
    }
}
