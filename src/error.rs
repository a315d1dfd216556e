// src/error.rs

use thiserror::Error;

/// 传输层错误（模拟网络故障）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// 注入的瞬时故障，调用方无法与真实网络错误区分
    #[error("service temporarily unavailable: {route}")]
    Injected { route: &'static str },

    /// 在超时时间内未收到响应
    #[error("{route} timed out after {timeout_ms}ms")]
    Timeout { route: &'static str, timeout_ms: u64 },
}

impl TransportError {
    pub fn route(&self) -> &'static str {
        match self {
            TransportError::Injected { route } | TransportError::Timeout { route, .. } => route,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout { .. })
    }
}

/// 客户端门面对外暴露的错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("transient service error: {0}")]
    Transient(#[from] TransportError),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("client is not initialized")]
    NotInitialized,
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Transient(err) if err.is_timeout())
    }
}

/// 配置加载错误
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}
