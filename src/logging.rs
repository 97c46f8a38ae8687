//! 日志初始化和配置模块
//!
//! 这个模块提供了统一的日志初始化功能，使用 tracing 库。
//! 输出到控制台（可关闭）和 `log_dir` 目录下按天滚动的日志文件。

use crate::config::LogConfig;
use std::io;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, time::SystemTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),
    #[error("日志配置错误: {0}")]
    Config(String),
    #[error("日志初始化错误: {0}")]
    Init(String),
}

/// 日志初始化结果
pub type LogResult<T> = Result<T, LogError>;

static INIT_LOGGER: Once = Once::new();

/// 把配置里的级别名转换成 `tracing::Level`
pub fn parse_level(level: &str) -> LogResult<Level> {
    level
        .parse::<Level>()
        .map_err(|_| LogError::Config(format!("无效的日志级别: {level}")))
}

/// 初始化日志系统
///
/// - `RUST_LOG` 环境变量优先于配置中的级别
/// - `enable_stdout` 为 true 时输出到控制台
/// - 始终写入 `log_dir` 目录，按天滚动
///
/// 重复调用不会报错，第二次起直接返回 `Ok(())`。
///
/// # Examples
///
/// ```no_run
/// use sparkify_etl::config::LogConfig;
/// use sparkify_etl::logging::init_logging;
///
/// init_logging(&LogConfig::default()).unwrap();
/// ```
pub fn init_logging(config: &LogConfig) -> LogResult<()> {
    let level = parse_level(&config.level)?;
    std::fs::create_dir_all(&config.log_dir)?;

    let mut result = Ok(());
    INIT_LOGGER.call_once(|| {
        result = install_subscriber(config, level);
    });
    result
}

fn install_subscriber(config: &LogConfig, level: Level) -> LogResult<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let console_layer = config.enable_stdout.then(|| {
        fmt::layer()
            .with_timer(SystemTime)
            .with_target(true)
            .with_ansi(true)
            .boxed()
    });

    let file_appender =
        tracing_appender::rolling::daily(&config.log_dir, "sparkify-etl");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_timer(SystemTime)
        .with_target(true)
        .with_ansi(false); // 文件中不使用颜色

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LogError::Init(e.to_string()))?;

    // guard 必须存活到进程结束，否则文件写入线程会提前退出
    std::mem::forget(guard);
    tracing::info!("日志系统初始化完成 - 输出目录: {}", config.log_dir);
    Ok(())
}
