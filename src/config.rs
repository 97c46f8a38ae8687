//! 配置管理模块
//!
//! 提供统一的配置文件读取和管理功能

use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 主配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 日志配置
    pub log: LogConfig,
    /// 输入目录配置
    pub input: InputConfig,
    /// 存储配置
    pub store: StoreConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// 是否启用控制台输出
    pub enable_stdout: bool,
    /// 日志输出目录
    pub log_dir: String,
    /// 日志级别 (trace, debug, info, warn, error)
    pub level: String,
}

/// 输入配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// 歌曲元数据根目录
    pub songs_root: PathBuf,
    /// 事件日志根目录
    pub logs_root: PathBuf,
    /// 跳过无法解析的行而不是中止整个批次
    pub skip_malformed_lines: bool,
    /// 被跳过行的 JSONL 输出路径
    pub errors_out_path: PathBuf,
}

/// 存储后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Postgres,
    Sqlite,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 使用的存储后端
    pub backend: StoreBackend,
    /// 主键冲突时忽略歌曲/艺人/时间行，false 时冲突会中止运行
    pub skip_duplicate_keys: bool,
    /// 按时长匹配歌曲时允许的误差（秒），0 表示精确匹配
    pub duration_tolerance: f64,
    /// SQLite 配置
    pub sqlite: SqliteConfig,
    /// PostgreSQL 配置
    pub postgres: PostgresConfig,
}

/// SQLite 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SqliteConfig {
    /// 数据库文件路径，":memory:" 表示内存库
    pub path: String,
}

/// PostgreSQL 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostgresConfig {
    /// 主机地址
    pub host: String,
    /// 端口号
    pub port: u16,
    /// 数据库名
    pub database: String,
    /// 用户名
    pub user: String,
    /// 密码
    pub password: String,
}

impl PostgresConfig {
    /// 用于日志输出的连接描述，不含密码
    pub fn redacted(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

impl Config {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// 从字符串加载配置
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 读取配置文件，文件不存在时使用默认配置
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            #[cfg(feature = "logging")]
            tracing::debug!("配置文件 {} 不存在，使用默认配置", path.display());
            Ok(Self::default())
        }
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        match self.log.level.to_ascii_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(EtlError::config_error(format!(
                    "无效的日志级别: {}",
                    self.log.level
                )));
            }
        }

        if self.input.songs_root.as_os_str().is_empty()
            || self.input.logs_root.as_os_str().is_empty()
        {
            return Err(EtlError::config_error("输入目录不能为空"));
        }

        let tolerance = self.store.duration_tolerance;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(EtlError::config_error(format!(
                "无效的时长误差: {tolerance}"
            )));
        }

        if self.store.backend == StoreBackend::Sqlite
            && self.store.sqlite.path.is_empty()
        {
            return Err(EtlError::config_error("SQLite 路径不能为空"));
        }

        Ok(())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enable_stdout: true,
            log_dir: "logs".to_string(),
            level: "info".to_string(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            songs_root: PathBuf::from("data/song_data"),
            logs_root: PathBuf::from("data/log_data"),
            skip_malformed_lines: false,
            errors_out_path: PathBuf::from("parse_errors.jsonl"),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Postgres,
            skip_duplicate_keys: true,
            duration_tolerance: 0.001,
            sqlite: SqliteConfig::default(),
            postgres: PostgresConfig::default(),
        }
    }
}

impl Default for SqliteConfig {
    fn default() -> Self {
        Self { path: "sparkify.db".to_string() }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            database: "sparkifydb".to_string(),
            user: "student".to_string(),
            password: "student".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        // 测试无效日志级别
        config.log.level = "invalid".to_string();
        assert!(config.validate().is_err());

        // 测试负数误差
        config.log.level = "info".to_string();
        config.store.duration_tolerance = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed_config: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.log.level, parsed_config.log.level);
        assert_eq!(parsed_config.store.backend, StoreBackend::Postgres);
    }

    #[test]
    fn test_redacted_hides_password() {
        let pg = PostgresConfig::default();
        assert_eq!(pg.redacted(), "student@127.0.0.1:5432/sparkifydb");
        assert!(!pg.redacted().contains(&pg.password));
    }
}
