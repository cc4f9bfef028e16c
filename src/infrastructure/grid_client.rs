//! 远程网格客户端 - 基础设施层
//!
//! 封装 W3C WebDriver 线协议中本核心用到的几个端点：
//! 新建会话、超时配置、窗口最大化、截图、取 URL、删除会话。
//! 协议其余部分对本核心不可见。
//!
//! 注意：没有独立的取消机制，网格挂起时新建会话会一直阻塞调用方

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{AppError, AppResult, GridError};
use crate::infrastructure::runtime::{DriverSession, SessionTimeouts};
use crate::models::capabilities::CapabilitiesDescriptor;

/// 远程网格客户端
pub struct GridClient {
    http: reqwest::Client,
}

impl GridClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// 在网格上新建会话
    ///
    /// # 参数
    /// - `variant_key`: 所属变体 key
    /// - `endpoint`: 网格地址
    /// - `capabilities`: 能力描述符
    ///
    /// # 返回
    /// 返回远程会话句柄
    pub async fn new_session(
        &self,
        variant_key: &str,
        endpoint: &str,
        capabilities: &CapabilitiesDescriptor,
    ) -> AppResult<GridSession> {
        let base = endpoint.trim_end_matches('/').to_string();
        let url = format!("{}/session", base);
        let payload = json!({
            "capabilities": {
                "alwaysMatch": capabilities.to_w3c()
            }
        });
        debug!("新建远程会话 Payload: {}", payload);

        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::grid_connect_failed(url.as_str(), e))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::grid_connect_failed(url.as_str(), e))?;

        if !status.is_success() {
            return Err(AppError::Grid(GridError::BadResponse {
                endpoint: url,
                status: status.as_u16(),
                body: body.to_string(),
            }));
        }

        let session_id = body
            .pointer("/value/sessionId")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AppError::Grid(GridError::MalformedResponse {
                    endpoint: url.clone(),
                    detail: "缺少 value.sessionId 字段".to_string(),
                })
            })?
            .to_string();

        info!("✓ [变体 {}] 远程会话已建立: {}", variant_key, session_id);
        Ok(GridSession {
            variant_key: variant_key.to_string(),
            http: self.http.clone(),
            base,
            session_id,
        })
    }
}

impl Default for GridClient {
    fn default() -> Self {
        Self::new()
    }
}

/// 远程网格会话句柄
pub struct GridSession {
    variant_key: String,
    http: reqwest::Client,
    base: String,
    session_id: String,
}

impl GridSession {
    fn endpoint(&self, suffix: &str) -> String {
        format!("{}/session/{}{}", self.base, self.session_id, suffix)
    }

    async fn post(&self, suffix: &str, payload: Value) -> AppResult<Value> {
        let url = self.endpoint(suffix);
        let response = self
            .http
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::grid_connect_failed(url.as_str(), e))?;
        decode_wire_response(&url, response).await
    }

    async fn get(&self, suffix: &str) -> AppResult<Value> {
        let url = self.endpoint(suffix);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::grid_connect_failed(url.as_str(), e))?;
        decode_wire_response(&url, response).await
    }
}

async fn decode_wire_response(url: &str, response: reqwest::Response) -> AppResult<Value> {
    let status = response.status();
    let body: Value = response
        .json()
        .await
        .map_err(|e| AppError::grid_connect_failed(url, e))?;
    if !status.is_success() {
        return Err(AppError::Grid(GridError::BadResponse {
            endpoint: url.to_string(),
            status: status.as_u16(),
            body: body.to_string(),
        }));
    }
    Ok(body)
}

#[async_trait::async_trait]
impl DriverSession for GridSession {
    fn variant_key(&self) -> &str {
        &self.variant_key
    }

    async fn configure_timeouts(&self, timeouts: SessionTimeouts) -> AppResult<()> {
        self.post(
            "/timeouts",
            json!({
                "implicit": timeouts.implicit_wait.as_millis() as u64,
                "pageLoad": timeouts.page_load.as_millis() as u64,
                "script": timeouts.script.as_millis() as u64,
            }),
        )
        .await?;
        Ok(())
    }

    async fn maximize(&self) -> AppResult<()> {
        self.post("/window/maximize", json!({})).await?;
        Ok(())
    }

    async fn take_screenshot(&self) -> AppResult<Vec<u8>> {
        let body = self.get("/screenshot").await?;
        let encoded = body
            .pointer("/value")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AppError::Grid(GridError::MalformedResponse {
                    endpoint: self.endpoint("/screenshot"),
                    detail: "缺少 value 字段".to_string(),
                })
            })?;
        BASE64.decode(encoded).map_err(|e| {
            AppError::Grid(GridError::MalformedResponse {
                endpoint: self.endpoint("/screenshot"),
                detail: format!("base64 解码失败: {}", e),
            })
        })
    }

    async fn current_url(&self) -> AppResult<String> {
        let body = self.get("/url").await?;
        let url = body
            .pointer("/value")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AppError::Grid(GridError::MalformedResponse {
                    endpoint: self.endpoint("/url"),
                    detail: "缺少 value 字段".to_string(),
                })
            })?;
        Ok(url.to_string())
    }

    async fn close(&self) -> AppResult<()> {
        let url = self.endpoint("");
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|e| AppError::grid_connect_failed(url.as_str(), e))?;
        decode_wire_response(&url, response).await?;
        debug!("[变体 {}] 远程会话已删除", self.variant_key);
        Ok(())
    }
}
