//! 矩阵计划数据模型
//!
//! 一份计划描述一次兼容性运行：按顺序执行哪些变体，
//! 以及可选的网格地址 / 无头开关覆盖

use serde::Deserialize;

/// 矩阵计划
#[derive(Debug, Clone, Deserialize)]
pub struct MatrixPlan {
    /// 计划名称
    pub name: Option<String>,
    /// 按执行顺序排列的变体标识列表
    pub variants: Vec<String>,
    /// 覆盖配置中的网格地址
    pub grid_url: Option<String>,
    /// 覆盖配置中的全局无头开关
    pub headless: Option<bool>,
    /// 来源文件路径（加载时填充，不在 TOML 中）
    #[serde(skip)]
    pub file_path: Option<String>,
}

impl MatrixPlan {
    /// 计划展示名：优先 name 字段，其次来源文件名
    pub fn display_name(&self) -> &str {
        if let Some(name) = &self.name {
            return name;
        }
        self.file_path.as_deref().unwrap_or("<未命名计划>")
    }
}
