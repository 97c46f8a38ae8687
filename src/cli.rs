//! 命令行参数

use crate::config::{Config, StoreBackend};
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// 默认配置文件
pub const DEFAULT_CONFIG_PATH: &str = "sparkify-etl.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendArg {
    Postgres,
    Sqlite,
}

impl From<BackendArg> for StoreBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Postgres => StoreBackend::Postgres,
            BackendArg::Sqlite => StoreBackend::Sqlite,
        }
    }
}

/// 把歌曲元数据和播放事件日志装载进星型模式数据库
#[derive(Debug, Parser)]
#[command(name = "sparkify-etl", version, about)]
pub struct Cli {
    /// 配置文件路径，文件不存在时使用默认配置
    #[arg(
        short,
        long,
        env = "SPARKIFY_ETL_CONFIG",
        default_value = DEFAULT_CONFIG_PATH
    )]
    pub config: PathBuf,

    /// 覆盖 input.songs_root
    #[arg(long)]
    pub songs_root: Option<PathBuf>,

    /// 覆盖 input.logs_root
    #[arg(long)]
    pub logs_root: Option<PathBuf>,

    /// 覆盖 store.backend
    #[arg(long, value_enum)]
    pub backend: Option<BackendArg>,

    /// 覆盖 store.sqlite.path
    #[arg(long)]
    pub sqlite_path: Option<String>,

    /// 装载前删除并重建全部表
    #[arg(long)]
    pub reset_schema: bool,

    /// 跳过无法解析的行，写入错误文件后继续
    #[arg(long)]
    pub skip_malformed_lines: bool,
}

impl Cli {
    /// 读取配置文件并应用命令行覆盖项
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_or_default(&self.config)?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    /// 把命令行参数覆盖到配置上
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(root) = &self.songs_root {
            config.input.songs_root = root.clone();
        }
        if let Some(root) = &self.logs_root {
            config.input.logs_root = root.clone();
        }
        if let Some(backend) = self.backend {
            config.store.backend = backend.into();
        }
        if let Some(path) = &self.sqlite_path {
            config.store.sqlite.path = path.clone();
        }
        if self.skip_malformed_lines {
            config.input.skip_malformed_lines = true;
        }
    }
}
