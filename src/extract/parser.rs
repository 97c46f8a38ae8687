use crate::error::{EtlError, Result};
use serde::de::DeserializeOwned;
use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

/// 单个文件的解析结果
#[derive(Debug, Clone)]
pub struct ParseResult<T> {
    /// 成功解析的记录
    pub records: Vec<T>,
    /// 被跳过的行（仅在 `skip_malformed_lines` 打开时非空）
    pub errors: Vec<ParseError>,
    /// 读取的非空行数
    pub total_lines: usize,
}

/// 被跳过行的错误信息
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// 行号，从 1 开始
    pub line: usize,
    /// 原始内容
    pub content: String,
    /// 错误信息
    pub error: String,
}

/// 解析选项
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// true 时跳过无法解析的行，false 时遇到第一处错误即返回 Err
    pub skip_malformed_lines: bool,
}

impl<T> Default for ParseResult<T> {
    fn default() -> Self {
        Self { records: Vec::new(), errors: Vec::new(), total_lines: 0 }
    }
}

/// 逐行解析 JSON Lines 文件，每个非空行反序列化为一个 `T`
pub fn parse_json_lines<T, P>(
    path: P,
    options: ParseOptions,
) -> Result<ParseResult<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    parse_json_lines_with(path, options, |row: T| Ok(Some(row)))
}

/// 逐行解析并对每行调用 `map`
///
/// `map` 返回 `Ok(None)` 表示丢弃该行（例如非播放事件），返回 `Err`
/// 表示该行内容不合法，处理方式与 JSON 语法错误相同。
pub fn parse_json_lines_with<T, U, P, F>(
    path: P,
    options: ParseOptions,
    mut map: F,
) -> Result<ParseResult<U>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
    F: FnMut(T) -> std::result::Result<Option<U>, String>,
{
    let path_ref = path.as_ref();
    #[cfg(feature = "logging")]
    tracing::debug!("开始解析文件: {}", path_ref.display());

    let reader = BufReader::new(File::open(path_ref)?);
    let mut result = ParseResult::default();

    for (idx, bytes) in reader.split(b'\n').enumerate() {
        let line_num = idx + 1;
        let bytes = bytes?;
        // 非 UTF-8 的行按不合法行处理，原始内容做有损转换后保留
        let (line, decoded) = match std::str::from_utf8(&bytes) {
            Ok(text) => (text.to_string(), Ok(())),
            Err(e) => (
                String::from_utf8_lossy(&bytes).into_owned(),
                Err(format!("无效的 UTF-8: {e}")),
            ),
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        result.total_lines += 1;

        let mapped = decoded
            .and_then(|()| {
                serde_json::from_str::<T>(trimmed).map_err(|e| e.to_string())
            })
            .and_then(&mut map);

        match mapped {
            Ok(Some(row)) => result.records.push(row),
            Ok(None) => {}
            Err(message) if options.skip_malformed_lines => {
                #[cfg(feature = "logging")]
                tracing::warn!(
                    "跳过 {} 第 {} 行: {}",
                    path_ref.display(),
                    line_num,
                    message
                );
                result.errors.push(ParseError {
                    line: line_num,
                    content: trimmed.to_string(),
                    error: message,
                });
            }
            Err(message) => {
                return Err(EtlError::parse_error(path_ref, line_num, message));
            }
        }
    }

    #[cfg(feature = "logging")]
    tracing::trace!(
        "文件 {} 解析完成: {} 行, {} 条记录, {} 个错误",
        path_ref.display(),
        result.total_lines,
        result.records.len(),
        result.errors.len()
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
    }

    fn write_temp_file(dir: &tempfile::TempDir, content: &str) -> std::path::PathBuf {
        let p = dir.path().join("rows.json");
        fs::write(&p, content).unwrap();
        p
    }

    #[test]
    fn test_skips_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_file(&dir, "{\"id\":1}\n\n  \n{\"id\":2}\n");
        let res: ParseResult<Row> =
            parse_json_lines(&path, ParseOptions::default()).unwrap();
        assert_eq!(res.records, vec![Row { id: 1 }, Row { id: 2 }]);
        assert_eq!(res.total_lines, 2);
    }

    #[test]
    fn test_fail_fast_reports_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_file(&dir, "{\"id\":1}\n{\"id\":\n");
        let err = parse_json_lines::<Row, _>(&path, ParseOptions::default())
            .unwrap_err();
        match err {
            EtlError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_skip_malformed_collects_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_file(&dir, "oops\n{\"id\":3}\n");
        let options = ParseOptions { skip_malformed_lines: true };
        let res: ParseResult<Row> = parse_json_lines(&path, options).unwrap();
        assert_eq!(res.records, vec![Row { id: 3 }]);
        assert_eq!(res.errors.len(), 1);
        assert_eq!(res.errors[0].line, 1);
        assert_eq!(res.errors[0].content, "oops");
    }

    #[test]
    fn test_map_can_filter_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp_file(&dir, "{\"id\":1}\n{\"id\":2}\n{\"id\":3}\n");
        let res = parse_json_lines_with(
            &path,
            ParseOptions::default(),
            |row: Row| Ok((row.id % 2 == 1).then_some(row.id)),
        )
        .unwrap();
        assert_eq!(res.records, vec![1, 3]);
        assert_eq!(res.total_lines, 3);
    }

    #[test]
    fn test_invalid_utf8_line_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.json");
        fs::write(&path, b"{\"id\":1}\n{\"id\":\"\xff\xfe\"}\n{\"id\":2}\n").unwrap();

        let options = ParseOptions { skip_malformed_lines: true };
        let res: ParseResult<Row> = parse_json_lines(&path, options).unwrap();
        assert_eq!(res.records, vec![Row { id: 1 }, Row { id: 2 }]);
        assert_eq!(res.errors.len(), 1);
        assert_eq!(res.errors[0].line, 2);
        assert!(res.errors[0].error.contains("UTF-8"));

        let err = parse_json_lines::<Row, _>(&path, ParseOptions::default())
            .unwrap_err();
        match err {
            EtlError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = parse_json_lines::<Row, _>(
            dir.path().join("missing.json"),
            ParseOptions::default(),
        )
        .unwrap_err();
        assert!(err.is_io_error());
    }
}
