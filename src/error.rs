//! 错误类型定义
//!
//! 这个模块定义了库中使用的所有错误类型，使用 thiserror 提供丰富的错误信息。

use std::path::PathBuf;

/// ETL 流程的结果类型
pub type Result<T> = std::result::Result<T, EtlError>;

/// ETL 错误类型
#[derive(Debug, thiserror::Error)]
pub enum EtlError {
    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 行解析错误
    #[error("解析错误 ({}:{line}): {message}", .path.display())]
    Parse { path: PathBuf, line: usize, message: String },

    /// 无法连接或打开存储
    #[error("存储连接错误: {0}")]
    Connection(String),

    /// 插入时主键或唯一约束冲突
    #[error("约束冲突: {0}")]
    ConstraintViolation(String),

    /// SQLite 错误
    #[cfg(feature = "store-sqlite")]
    #[error("SQLite错误: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL 错误
    #[cfg(feature = "store-postgres")]
    #[error("PostgreSQL错误: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// 目录遍历错误
    #[error("目录遍历错误: {0}")]
    Walk(#[from] walkdir::Error),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 配置文件反序列化错误
    #[error("配置解析错误: {0}")]
    Toml(#[from] toml::de::Error),

    /// 配置文件序列化错误
    #[error("配置序列化错误: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// 日志错误（仅在启用 logging feature 时可用）
    #[cfg(feature = "logging")]
    #[error("日志错误: {0}")]
    Log(#[from] crate::logging::LogError),
}

impl EtlError {
    /// 创建一个解析错误
    pub fn parse_error<P, S>(path: P, line: usize, message: S) -> Self
    where
        P: Into<PathBuf>,
        S: Into<String>,
    {
        let path = path.into();
        let message = message.into();
        #[cfg(feature = "logging")]
        tracing::error!("解析错误 {}:{}: {}", path.display(), line, message);
        Self::Parse { path, line, message }
    }

    /// 创建一个存储连接错误
    pub fn connection_error<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        tracing::error!("存储连接错误: {}", message);
        Self::Connection(message)
    }

    /// 创建一个配置错误
    pub fn config_error<S: Into<String>>(message: S) -> Self {
        let message = message.into();
        #[cfg(feature = "logging")]
        tracing::error!("配置错误: {}", message);
        Self::Config(message)
    }

    /// 检查是否为 IO 错误
    pub fn is_io_error(&self) -> bool {
        matches!(self, EtlError::Io(_))
    }

    /// 检查是否为解析错误
    pub fn is_parse_error(&self) -> bool {
        matches!(self, EtlError::Parse { .. })
    }

    /// 检查是否为约束冲突
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, EtlError::ConstraintViolation(_))
    }

    /// 检查是否为配置错误
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EtlError::Config(_) | EtlError::Toml(_) | EtlError::TomlSer(_)
        )
    }
}
