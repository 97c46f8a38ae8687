//! 被跳过行的写入模块
//!
//! 打开 `skip_malformed_lines` 后，无法解析的行不会中止运行，而是由
//! `ErrorWriter` 以 JSONL 格式追加到错误文件，便于事后检查和补录。
//!
//! ## 输出格式示例
//!
//! ```json
//! {"path":"data/log_data/2018/11/2018-11-01-events.json","line":3,"error":"EOF while parsing an object at line 1 column 12","raw":"{\"ts\":15411"}
//! ```

use crate::extract::ParseError;
use serde_json::json;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// 把被跳过的行写入 JSONL 文件
pub struct ErrorWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    written: usize,
}

impl ErrorWriter {
    /// 创建错误写入器，文件以追加方式打开
    ///
    /// # Errors
    /// 当无法创建父目录或打开输出文件时返回错误
    pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { writer: BufWriter::new(file), path, written: 0 })
    }

    /// 写入一个源文件的全部跳过行，写完立即刷新
    pub fn write_errors<P: AsRef<Path>>(
        &mut self,
        file_path: P,
        errors: &[ParseError],
    ) -> std::io::Result<()> {
        if errors.is_empty() {
            return Ok(());
        }

        let file_path = file_path.as_ref().display().to_string();
        for err in errors {
            let record = json!({
                "path": file_path,
                "line": err.line,
                "error": err.error,
                "raw": err.content,
            });
            writeln!(self.writer, "{record}")?;
            self.written += 1;
        }
        self.writer.flush()?;

        #[cfg(feature = "logging")]
        tracing::debug!(
            "已写入 {} 条跳过记录到 {}",
            errors.len(),
            self.path.display()
        );
        Ok(())
    }

    /// 已写入的记录数
    pub fn written(&self) -> usize {
        self.written
    }

    /// 输出文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }
}
