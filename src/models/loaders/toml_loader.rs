use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::models::matrix_plan::MatrixPlan;

/// 从 TOML 文件加载矩阵计划
pub async fn load_matrix_plan(plan_path: &Path) -> Result<MatrixPlan> {
    let content = fs::read_to_string(plan_path)
        .await
        .with_context(|| format!("无法读取TOML文件: {}", plan_path.display()))?;

    let mut plan: MatrixPlan = toml::from_str(&content)
        .with_context(|| format!("无法解析TOML文件: {}", plan_path.display()))?;

    // 记录来源路径
    plan.file_path = Some(plan_path.to_string_lossy().to_string());

    Ok(plan)
}

/// 从文件夹中加载所有 TOML 矩阵计划
pub async fn load_all_matrix_plans(folder_path: &str) -> Result<Vec<MatrixPlan>> {
    let folder = PathBuf::from(folder_path);

    if !folder.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path);
    }

    let mut plans = Vec::new();
    let mut entries = fs::read_dir(&folder)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("toml") {
            tracing::info!(
                "正在加载: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );

            match load_matrix_plan(&path).await {
                Ok(plan) => {
                    tracing::info!("成功加载 {} 个变体", plan.variants.len());
                    plans.push(plan);
                }
                Err(e) => {
                    tracing::warn!("加载文件失败 {}: {}", path.display(), e);
                }
            }
        }
    }

    Ok(plans)
}
