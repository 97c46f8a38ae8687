//! 歌曲元数据文件的抽取

use super::parser::{ParseOptions, ParseResult, parse_json_lines_with};
use super::types::{Artist, Song, SongRecord};
use crate::error::Result;
use crate::stats::FileStats;
use crate::store::SongplayStore;
use std::path::Path;

/// 解析歌曲文件，每行得到一对 (Song, Artist)
pub fn extract_song_rows<P: AsRef<Path>>(
    path: P,
    options: ParseOptions,
) -> Result<ParseResult<(Song, Artist)>> {
    parse_json_lines_with(path, options, |record: SongRecord| {
        Ok(Some((Song::from(&record), Artist::from(&record))))
    })
}

/// 处理一个歌曲文件：逐行先写 songs 再写 artists
pub fn process_song_file<P: AsRef<Path>>(
    store: &mut dyn SongplayStore,
    path: P,
    options: ParseOptions,
) -> Result<FileStats> {
    let path = path.as_ref();
    let parsed = extract_song_rows(path, options)?;

    let mut stats = FileStats::from_parse(&parsed);
    for (song, artist) in &parsed.records {
        stats.songs += store.insert_song(song)?;
        stats.artists += store.insert_artist(artist)?;
    }

    #[cfg(feature = "logging")]
    tracing::debug!(
        "歌曲文件 {} 写入完成: songs {} 行, artists {} 行",
        path.display(),
        stats.songs,
        stats.artists
    );
    Ok(stats)
}
