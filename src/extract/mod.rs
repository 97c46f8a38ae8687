//! 数据抽取模块
//!
//! 把 JSON Lines 文件解析成带类型的行，再变换为星型模式各表的记录

pub mod event_log;
pub mod parser;
pub mod song;
pub mod types;

// 重新导出核心类型和函数
pub use event_log::{LogRows, SongPlayEvent, extract_log_rows, process_log_file};
pub use parser::{
    ParseError, ParseOptions, ParseResult, parse_json_lines,
    parse_json_lines_with,
};
pub use song::{extract_song_rows, process_song_file};
pub use types::{
    Artist, LogEvent, NEXT_SONG_PAGE, Song, SongRecord, Songplay,
    SongplayDraft, TimeEntry, User,
};
