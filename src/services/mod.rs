//! 业务能力层（Services Layer）
//!
//! 本层描述"对单个变体我能做什么"，不编排流程：
//!
//! - `session_factory` - 变体 → 会话句柄
//! - `capability_cache` - 能力描述符记忆化
//! - `provisioner` - 浏览器二进制解析
//! - `reporter` - 结构化报告出口

pub mod capability_cache;
pub mod provisioner;
pub mod reporter;
pub mod session_factory;

pub use capability_cache::CapabilityCache;
pub use provisioner::{BinaryProvisioner, PathProvisioner};
pub use reporter::{ReporterSink, TracingReporter};
pub use session_factory::SessionFactory;
