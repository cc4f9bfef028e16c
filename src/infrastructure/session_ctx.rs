//! 工作者会话上下文 - 基础设施层
//!
//! 每个执行工作者持有一个显式上下文对象，其中最多存放一个活会话。
//! 不存在线程本地的隐式全局：工作者结束时上下文随之销毁，
//! 不会留下无人回收的孤儿条目

use tracing::{debug, info, warn};

use crate::error::TeardownError;
use crate::infrastructure::runtime::DriverSession;

/// 工作者会话上下文
///
/// 职责：
/// - 持有当前工作者的唯一会话槽位
/// - 暴露只读会话访问与回收能力
/// - 不认识变体目录与执行流程
pub struct SessionContext {
    variant_key: String,
    session: Option<Box<dyn DriverSession>>,
}

impl SessionContext {
    /// 创建空上下文
    pub fn new(variant_key: impl Into<String>) -> Self {
        Self {
            variant_key: variant_key.into(),
            session: None,
        }
    }

    /// 创建已持有会话的上下文
    pub fn with_session(variant_key: impl Into<String>, session: Box<dyn DriverSession>) -> Self {
        Self {
            variant_key: variant_key.into(),
            session: Some(session),
        }
    }

    /// 所属变体 key
    pub fn variant_key(&self) -> &str {
        &self.variant_key
    }

    /// 当前会话（未注册时为 None）
    pub fn session(&self) -> Option<&dyn DriverSession> {
        self.session.as_deref()
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// 注册会话
    ///
    /// 槽位已被占用属于调用方错误：记录警告并先回收旧会话再覆盖，
    /// 不会同时留下两个活句柄，也不会阻塞等待
    pub async fn attach(&mut self, session: Box<dyn DriverSession>) {
        if self.session.is_some() {
            warn!(
                "⚠️ [变体 {}] 上一个会话尚未回收，先行关闭后覆盖",
                self.variant_key
            );
            self.teardown().await;
        }
        self.session = Some(session);
    }

    /// 回收当前会话
    ///
    /// 幂等：无会话时为 no-op。关闭失败只记录日志，不向外传播
    pub async fn teardown(&mut self) {
        if let Err(e) = self.try_teardown().await {
            warn!("⚠️ [变体 {}] 会话关闭失败（已忽略）: {}", self.variant_key, e);
        }
    }

    /// 回收当前会话并返回关闭结果
    ///
    /// 槽位在调用 close 之前就被清空：即使关闭失败，
    /// 也不会有悬挂句柄留在上下文里
    pub async fn try_teardown(&mut self) -> Result<(), TeardownError> {
        let Some(session) = self.session.take() else {
            debug!("[变体 {}] 无会话可回收，跳过", self.variant_key);
            return Ok(());
        };

        match session.close().await {
            Ok(()) => {
                info!("✓ [变体 {}] 会话已关闭", self.variant_key);
                Ok(())
            }
            Err(e) => Err(TeardownError::CloseFailed {
                variant: self.variant_key.clone(),
                source: Box::new(e),
            }),
        }
    }
}
