use crate::config::Config;
use crate::error::Result;
use crate::error_writer::ErrorWriter;
use crate::extract::ParseOptions;
use crate::process::{BatchSummary, FileKind, process_kind};
use crate::stats::LoadStats;
use crate::store::{SongplayStore, open_store};

/// 一次完整运行的结果
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub songs: BatchSummary,
    pub logs: BatchSummary,
}

impl RunSummary {
    /// 歌曲和日志两个批次的合计
    pub fn total(&self) -> LoadStats {
        let mut total = self.songs.stats.clone();
        total.merge(&self.logs.stats);
        total
    }
}

/// 运行选项
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// 装载前删除并重建全部表
    pub reset_schema: bool,
}

/// 打开存储，依次装载歌曲和日志，最后关闭连接
///
/// 无论装载成功与否都会关闭连接；装载错误优先于关闭错误返回。
pub fn run(config: &Config, options: RunOptions) -> Result<RunSummary> {
    let mut store = open_store(&config.store)?;
    #[cfg(feature = "logging")]
    tracing::info!("已连接存储: {}", store.name());

    let result = load_all(store.as_mut(), config, options);
    let closed = store.close();
    let summary = result?;
    closed?;
    Ok(summary)
}

/// 在已打开的存储上执行装载
pub fn load_all(
    store: &mut dyn SongplayStore,
    config: &Config,
    options: RunOptions,
) -> Result<RunSummary> {
    if options.reset_schema {
        #[cfg(feature = "logging")]
        tracing::info!("删除并重建表结构");
        store.drop_schema()?;
    }
    store.create_schema()?;

    let parse_options = ParseOptions {
        skip_malformed_lines: config.input.skip_malformed_lines,
    };
    let mut error_writer = if config.input.skip_malformed_lines {
        Some(ErrorWriter::new(&config.input.errors_out_path)?)
    } else {
        None
    };

    let songs = process_kind(
        store,
        &config.input.songs_root,
        FileKind::Songs,
        parse_options,
        error_writer.as_mut(),
    )?;
    let logs = process_kind(
        store,
        &config.input.logs_root,
        FileKind::Logs,
        parse_options,
        error_writer.as_mut(),
    )?;

    #[cfg(feature = "logging")]
    {
        if let Some(writer) = error_writer.as_ref().filter(|w| w.written() > 0) {
            tracing::warn!(
                "共跳过 {} 行，详情见 {}",
                writer.written(),
                writer.path().display()
            );
        }
    }

    Ok(RunSummary { songs, logs })
}
