//! 歌曲元数据与播放事件日志的批处理 ETL
//!
//! 从目录树读取 JSON Lines 文件，变换为星型模式的各表记录
//! （songs、artists、time、users、songplays），按文件提交写入数据库。

// 核心模块 - 始终可用
pub mod config;
pub mod error;
pub mod extract;
pub mod input_path;
pub mod stats;
pub mod store;

// 处理流程
pub mod app;
pub mod cli;
pub mod error_writer;
pub mod process;

// 日志模块 - 需要 logging 功能
#[cfg(feature = "logging")]
pub mod logging;

pub use error::{EtlError, Result};
