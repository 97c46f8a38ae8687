//! 装载统计信息模块

use crate::extract::{ParseError, ParseResult};

/// 单个文件的处理结果
#[derive(Debug, Default, Clone)]
pub struct FileStats {
    /// 写入 songs 的行数（冲突被忽略的不计）
    pub songs: usize,
    /// 写入 artists 的行数
    pub artists: usize,
    /// 写入 time 的行数
    pub time_entries: usize,
    /// users upsert 影响的行数
    pub users: usize,
    /// 写入 songplays 的行数
    pub songplays: usize,
    /// 没有匹配到歌曲的播放记录数
    pub unresolved_songplays: usize,
    /// 读取的非空行数
    pub lines: usize,
    /// 被跳过的行
    pub skipped: Vec<ParseError>,
}

impl FileStats {
    /// 用解析结果初始化行数和跳过的行
    pub fn from_parse<T>(parsed: &ParseResult<T>) -> Self {
        Self {
            lines: parsed.total_lines,
            skipped: parsed.errors.clone(),
            ..Default::default()
        }
    }
}

/// 一个批次（或整次运行）的累计统计
#[derive(Debug, Default, Clone)]
pub struct LoadStats {
    /// 已处理的文件数
    pub files: usize,
    pub songs: usize,
    pub artists: usize,
    pub time_entries: usize,
    pub users: usize,
    pub songplays: usize,
    pub unresolved_songplays: usize,
    /// 读取的非空行数
    pub lines: usize,
    /// 被跳过的行数
    pub skipped_lines: usize,
    /// 开始时间
    pub start_time: Option<std::time::Instant>,
    /// 完成时间
    pub end_time: Option<std::time::Instant>,
}

impl LoadStats {
    /// 创建新的统计信息，记录开始时间
    pub fn new() -> Self {
        Self {
            start_time: Some(std::time::Instant::now()),
            ..Default::default()
        }
    }

    /// 累加一个文件的结果
    pub fn add_file(&mut self, file: &FileStats) {
        self.files += 1;
        self.songs += file.songs;
        self.artists += file.artists;
        self.time_entries += file.time_entries;
        self.users += file.users;
        self.songplays += file.songplays;
        self.unresolved_songplays += file.unresolved_songplays;
        self.lines += file.lines;
        self.skipped_lines += file.skipped.len();
    }

    /// 标记完成，记录结束时间
    pub fn finish(&mut self) {
        self.end_time = Some(std::time::Instant::now());
    }

    /// 持续时间
    pub fn duration(&self) -> Option<std::time::Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end.duration_since(start)),
            _ => None,
        }
    }

    /// 写入的总行数
    pub fn rows_written(&self) -> usize {
        self.songs
            + self.artists
            + self.time_entries
            + self.users
            + self.songplays
    }

    /// 每秒写入行数
    pub fn rows_per_second(&self) -> Option<f64> {
        self.duration().map(|d| {
            if d.as_secs_f64() > 0.0 {
                self.rows_written() as f64 / d.as_secs_f64()
            } else {
                0.0
            }
        })
    }

    /// 播放记录匹配率（百分比）
    pub fn resolve_rate(&self) -> f64 {
        if self.songplays > 0 {
            let resolved =
                self.songplays.saturating_sub(self.unresolved_songplays);
            resolved as f64 / self.songplays as f64 * 100.0
        } else {
            0.0
        }
    }

    /// 合并其他统计信息
    pub fn merge(&mut self, other: &LoadStats) {
        self.files += other.files;
        self.songs += other.songs;
        self.artists += other.artists;
        self.time_entries += other.time_entries;
        self.users += other.users;
        self.songplays += other.songplays;
        self.unresolved_songplays += other.unresolved_songplays;
        self.lines += other.lines;
        self.skipped_lines += other.skipped_lines;

        // 保持最早的开始时间
        self.start_time = match (self.start_time, other.start_time) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        // 保持最晚的结束时间
        self.end_time = match (self.end_time, other.end_time) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
    }
}

impl std::fmt::Display for LoadStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "文件: {}, songs: {}, artists: {}, time: {}, users: {}, songplays: {}",
            self.files,
            self.songs,
            self.artists,
            self.time_entries,
            self.users,
            self.songplays
        )?;

        if self.songplays > 0 {
            write!(f, ", 匹配率: {:.1}%", self.resolve_rate())?;
        }

        if self.skipped_lines > 0 {
            write!(f, ", 跳过: {} 行", self.skipped_lines)?;
        }

        if let Some(duration) = self.duration() {
            write!(f, ", 耗时: {:.2}s", duration.as_secs_f64())?;

            if let Some(rps) = self.rows_per_second() {
                write!(f, ", 速度: {:.2} 行/秒", rps)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_add_file_accumulates() {
        let mut total = LoadStats::new();
        let file = FileStats {
            songplays: 3,
            unresolved_songplays: 1,
            users: 3,
            time_entries: 2,
            lines: 5,
            ..Default::default()
        };
        total.add_file(&file);
        total.add_file(&file);
        assert_eq!(total.files, 2);
        assert_eq!(total.songplays, 6);
        assert_eq!(total.rows_written(), 16);
        assert!((total.resolve_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_merge_preserve_start_and_end() {
        let later_start = std::time::Instant::now();
        let mut a = LoadStats {
            songs: 2,
            start_time: Some(later_start),
            end_time: Some(later_start + Duration::from_secs(1)),
            ..Default::default()
        };
        let earlier_start = later_start - Duration::from_secs(2);
        let b = LoadStats {
            songs: 3,
            start_time: Some(earlier_start),
            end_time: Some(later_start + Duration::from_secs(5)),
            ..Default::default()
        };

        a.merge(&b);

        assert_eq!(a.songs, 5);
        assert_eq!(a.start_time, Some(earlier_start));
        assert_eq!(a.end_time, Some(later_start + Duration::from_secs(5)));
    }

    #[test]
    fn test_display_without_finish() {
        let s = format!("{}", LoadStats::new());
        assert!(s.contains("songplays: 0"));
        assert!(!s.contains("耗时"));
    }

    #[test]
    fn test_rows_per_second_zero_duration() {
        let mut s = LoadStats::new();
        s.songs = 1;
        s.end_time = s.start_time;
        assert_eq!(s.rows_per_second().unwrap(), 0.0);
    }
}
