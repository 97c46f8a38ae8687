use crate::error::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 输入文件的扩展名
pub const JSON_EXTENSION: &str = "json";

/// 递归收集 `root` 下所有 `.json` 文件的绝对路径
///
/// # 返回
/// 按路径排序的绝对路径列表，保证每次运行的处理顺序一致。
///
/// # 行为说明
/// - 只匹配扩展名恰好为 `json` 的普通文件，符号链接按其目标判断
/// - `root` 不存在时记录警告并返回空列表
///
/// # Errors
/// 遍历已存在的目录时遇到的 IO 错误（如权限不足）会直接返回。
pub fn collect_json_files<P: AsRef<Path>>(root: P) -> Result<Vec<PathBuf>> {
    let root = root.as_ref();
    if !root.exists() {
        #[cfg(feature = "logging")]
        tracing::warn!("目录不存在: {}", root.display());
        return Ok(Vec::new());
    }

    let root = root.canonicalize()?;
    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_json = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == JSON_EXTENSION);
        if is_json {
            files.push(entry.into_path());
        }
    }

    #[cfg(feature = "logging")]
    tracing::trace!("在 {} 下找到 {} 个 JSON 文件", root.display(), files.len());
    Ok(files)
}
