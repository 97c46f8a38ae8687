use crate::error::Result;
use crate::error_writer::ErrorWriter;
use crate::extract::{ParseOptions, process_log_file, process_song_file};
use crate::input_path::collect_json_files;
use crate::stats::{FileStats, LoadStats};
use crate::store::SongplayStore;
use std::path::{Path, PathBuf};

/// 一个批次处理的数据类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// 歌曲元数据
    Songs,
    /// 事件日志
    Logs,
}

impl FileKind {
    /// 对应的单文件处理函数
    pub fn extractor(self) -> Extractor {
        match self {
            FileKind::Songs => |store, path, options| {
                process_song_file(store, path, options)
            },
            FileKind::Logs => |store, path, options| {
                process_log_file(store, path, options)
            },
        }
    }
}

/// 单文件处理函数：解析文件并通过 store 写入
pub type Extractor =
    fn(&mut dyn SongplayStore, &Path, ParseOptions) -> Result<FileStats>;

/// 一个批次的处理结果
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// 根目录
    pub root: PathBuf,
    /// 发现的文件数
    pub files_found: usize,
    /// 已提交的文件数
    pub files_processed: usize,
    /// 累计统计
    pub stats: LoadStats,
}

/// 处理 `root` 下的全部 JSON 文件
///
/// # 行为说明
/// - 按 `collect_json_files` 的顺序逐个处理
/// - 每个文件：开启事务 → 调用 `extract` → 提交 → 输出进度
/// - 任一文件失败时回滚该文件的事务并返回错误，之前已提交的文件保留
/// - 没有找到文件时不开启任何事务，直接返回
///
/// # Errors
/// 目录遍历、解析或写入失败时返回错误，整个批次中止。
pub fn process_data<F>(
    store: &mut dyn SongplayStore,
    root: &Path,
    options: ParseOptions,
    mut error_writer: Option<&mut ErrorWriter>,
    mut extract: F,
) -> Result<BatchSummary>
where
    F: FnMut(&mut dyn SongplayStore, &Path, ParseOptions) -> Result<FileStats>,
{
    let files = collect_json_files(root)?;
    let num_files = files.len();
    println!("{} files found in {}", num_files, root.display());
    #[cfg(feature = "logging")]
    tracing::info!("在 {} 下找到 {} 个文件", root.display(), num_files);

    let mut stats = LoadStats::new();
    for (i, datafile) in files.iter().enumerate() {
        #[cfg(feature = "logging")]
        tracing::trace!("开始处理文件: {}", datafile.display());

        store.begin()?;
        let file_stats = match extract(&mut *store, datafile, options) {
            Ok(file_stats) => file_stats,
            Err(e) => {
                abort_file(store, datafile);
                return Err(e);
            }
        };
        if let Err(e) = store.commit() {
            abort_file(store, datafile);
            return Err(e);
        }

        if let Some(writer) = error_writer.as_deref_mut() {
            writer.write_errors(datafile, &file_stats.skipped)?;
        }
        stats.add_file(&file_stats);
        println!("{}/{} files processed.", i + 1, num_files);
    }

    stats.finish();
    #[cfg(feature = "logging")]
    tracing::info!("{} 处理完成: {}", root.display(), stats);

    Ok(BatchSummary {
        root: root.to_path_buf(),
        files_found: num_files,
        files_processed: stats.files,
        stats,
    })
}

/// 按数据类型处理整个目录
pub fn process_kind(
    store: &mut dyn SongplayStore,
    root: &Path,
    kind: FileKind,
    options: ParseOptions,
    error_writer: Option<&mut ErrorWriter>,
) -> Result<BatchSummary> {
    process_data(store, root, options, error_writer, kind.extractor())
}

/// 回滚失败文件的事务，回滚本身出错只记录日志，保留原始错误
fn abort_file(store: &mut dyn SongplayStore, datafile: &Path) {
    #[cfg(feature = "logging")]
    tracing::error!("处理文件失败，回滚事务: {}", datafile.display());
    #[cfg(not(feature = "logging"))]
    let _ = datafile;

    if let Err(e) = store.rollback() {
        #[cfg(feature = "logging")]
        tracing::warn!("回滚失败: {}", e);
        #[cfg(not(feature = "logging"))]
        let _ = e;
    }
}
