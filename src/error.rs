use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 会话创建相关错误
    Session(SessionError),
    /// 远程网格调用错误
    Grid(GridError),
    /// 会话回收错误
    Teardown(TeardownError),
    /// 文件操作错误
    File(FileError),
    /// 配置错误
    Config(ConfigError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Session(e) => write!(f, "会话错误: {}", e),
            AppError::Grid(e) => write!(f, "网格错误: {}", e),
            AppError::Teardown(e) => write!(f, "回收错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Session(e) => Some(e),
            AppError::Grid(e) => Some(e),
            AppError::Teardown(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Config(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 会话创建相关错误
#[derive(Debug)]
pub enum SessionError {
    /// 创建会话失败
    CreationFailed {
        variant: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 启动选项被拒绝
    OptionsRejected {
        variant: String,
        detail: String,
    },
    /// 驱动二进制解析失败
    ProvisioningFailed {
        engine: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 引擎与宿主操作系统不匹配
    UnsupportedPlatform {
        engine: String,
        required_os: String,
        actual_os: String,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::CreationFailed { variant, source } => {
                write!(f, "创建会话失败 (变体: {}): {}", variant, source)
            }
            SessionError::OptionsRejected { variant, detail } => {
                write!(f, "启动选项被拒绝 (变体: {}): {}", variant, detail)
            }
            SessionError::ProvisioningFailed { engine, source } => {
                write!(f, "驱动二进制解析失败 (引擎: {}): {}", engine, source)
            }
            SessionError::UnsupportedPlatform {
                engine,
                required_os,
                actual_os,
            } => {
                write!(
                    f,
                    "引擎 {} 需要 {} 平台，当前平台为 {}",
                    engine, required_os, actual_os
                )
            }
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::CreationFailed { source, .. }
            | SessionError::ProvisioningFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 远程网格调用错误
#[derive(Debug)]
pub enum GridError {
    /// 未配置网格地址
    EndpointMissing {
        variant: String,
    },
    /// 连接网格失败
    ConnectFailed {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 网格返回错误响应
    BadResponse {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 网格响应缺少必需字段
    MalformedResponse {
        endpoint: String,
        detail: String,
    },
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::EndpointMissing { variant } => {
                write!(f, "变体 {} 需要远程网格，但未配置网格地址", variant)
            }
            GridError::ConnectFailed { endpoint, source } => {
                write!(f, "连接网格失败 ({}): {}", endpoint, source)
            }
            GridError::BadResponse {
                endpoint,
                status,
                body,
            } => {
                write!(
                    f,
                    "网格返回错误响应 ({}): status={}, body={}",
                    endpoint, status, body
                )
            }
            GridError::MalformedResponse { endpoint, detail } => {
                write!(f, "网格响应格式异常 ({}): {}", endpoint, detail)
            }
        }
    }
}

impl std::error::Error for GridError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GridError::ConnectFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 会话回收错误
///
/// teardown() 会记录并吞掉该错误；try_teardown() 将其返回给调用方
#[derive(Debug)]
pub enum TeardownError {
    /// 关闭底层会话失败
    CloseFailed {
        variant: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for TeardownError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownError::CloseFailed { variant, source } => {
                write!(f, "关闭会话失败 (变体: {}): {}", variant, source)
            }
        }
    }
}

impl std::error::Error for TeardownError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TeardownError::CloseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
        }
    }
}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// TOML 解析失败
    TomlParseFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 目录不存在
    DirectoryNotFound {
        path: String,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
            FileError::TomlParseFailed { path, source } => {
                write!(f, "TOML解析失败 ({}): {}", path, source)
            }
            FileError::DirectoryNotFound { path } => write!(f, "目录不存在: {}", path),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. }
            | FileError::WriteFailed { source, .. }
            | FileError::TomlParseFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 窗口尺寸格式无效（期望形如 "1920,1080"）
    InvalidWindowSize {
        value: String,
    },
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidWindowSize { value } => {
                write!(f, "窗口尺寸格式无效: '{}'，期望形如 \"1920,1080\"", value)
            }
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::File(FileError::TomlParseFailed {
            path: String::new(),
            source: Box::new(err),
        })
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Other(format!("JSON解析失败: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建会话创建失败错误
    pub fn session_creation_failed(
        variant: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Session(SessionError::CreationFailed {
            variant: variant.into(),
            source: Box::new(source),
        })
    }

    /// 创建启动选项被拒绝错误
    pub fn session_options_rejected(
        variant: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        AppError::Session(SessionError::OptionsRejected {
            variant: variant.into(),
            detail: detail.into(),
        })
    }

    /// 创建平台不匹配错误
    pub fn unsupported_platform(
        engine: impl Into<String>,
        required_os: impl Into<String>,
        actual_os: impl Into<String>,
    ) -> Self {
        AppError::Session(SessionError::UnsupportedPlatform {
            engine: engine.into(),
            required_os: required_os.into(),
            actual_os: actual_os.into(),
        })
    }

    /// 创建网格连接失败错误
    pub fn grid_connect_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Grid(GridError::ConnectFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 是否为平台不匹配错误
    pub fn is_unsupported_platform(&self) -> bool {
        matches!(
            self,
            AppError::Session(SessionError::UnsupportedPlatform { .. })
        )
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
