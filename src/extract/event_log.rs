//! 事件日志文件的抽取
//!
//! 只保留 `NextSong` 事件，从每条事件派生出 time、users、songplays 三张表的行。
//! 写入顺序：先全部 time，再全部 users，最后逐条解析歌曲并写 songplays。

use super::parser::{ParseOptions, ParseResult, parse_json_lines_with};
use super::types::{LogEvent, SongplayDraft, TimeEntry, User};
use crate::error::Result;
use crate::stats::FileStats;
use crate::store::SongplayStore;
use std::collections::BTreeSet;
use std::path::Path;

/// 一个日志文件变换后的结果
#[derive(Debug, Clone, Default)]
pub struct LogRows {
    /// 文件内去重后的时间行，按时间排序
    pub time_entries: Vec<TimeEntry>,
    /// 每条事件一次 upsert，保持事件顺序
    pub users: Vec<User>,
    /// 待解析 song_id/artist_id 的播放记录
    pub songplays: Vec<SongplayDraft>,
}

/// 播放事件与其时间戳
#[derive(Debug, Clone)]
pub struct SongPlayEvent {
    pub event: LogEvent,
    pub start_time: chrono::NaiveDateTime,
    pub user_id: String,
}

/// 解析日志文件，只返回 NextSong 事件
///
/// NextSong 事件缺少 userId 或时间戳越界时视为不合法行。
pub fn extract_log_rows<P: AsRef<Path>>(
    path: P,
    options: ParseOptions,
) -> Result<ParseResult<SongPlayEvent>> {
    parse_json_lines_with(path, options, |event: LogEvent| {
        if !event.is_song_play() {
            return Ok(None);
        }
        let start_time = event
            .start_time()
            .ok_or_else(|| format!("时间戳越界: {}", event.ts))?;
        let user_id = event
            .user_id
            .clone()
            .ok_or_else(|| "NextSong 事件缺少 userId".to_string())?;
        Ok(Some(SongPlayEvent { event, start_time, user_id }))
    })
}

impl LogRows {
    /// 由播放事件构造三张表的行
    pub fn from_events(events: &[SongPlayEvent]) -> Self {
        let distinct: BTreeSet<_> =
            events.iter().map(|e| e.start_time).collect();
        let time_entries =
            distinct.into_iter().map(TimeEntry::from_timestamp).collect();

        let users = events
            .iter()
            .map(|e| User {
                user_id: e.user_id.clone(),
                first_name: e.event.first_name.clone(),
                last_name: e.event.last_name.clone(),
                gender: e.event.gender.clone(),
                level: e.event.level.clone(),
            })
            .collect();

        let songplays = events
            .iter()
            .map(|e| SongplayDraft {
                start_time: e.start_time,
                user_id: e.user_id.clone(),
                level: e.event.level.clone(),
                song: e.event.song.clone(),
                artist: e.event.artist.clone(),
                length: e.event.length,
                session_id: e.event.session_id,
                location: e.event.location.clone(),
                user_agent: e.event.user_agent.clone(),
            })
            .collect();

        Self { time_entries, users, songplays }
    }
}

/// 处理一个日志文件
pub fn process_log_file<P: AsRef<Path>>(
    store: &mut dyn SongplayStore,
    path: P,
    options: ParseOptions,
) -> Result<FileStats> {
    let path = path.as_ref();
    let parsed = extract_log_rows(path, options)?;
    let mut stats = FileStats::from_parse(&parsed);
    let rows = LogRows::from_events(&parsed.records);

    for entry in &rows.time_entries {
        stats.time_entries += store.insert_time(entry)?;
    }

    for user in &rows.users {
        stats.users += store.upsert_user(user)?;
    }

    for draft in rows.songplays {
        let ids = match (&draft.song, &draft.artist, draft.length) {
            (Some(song), Some(artist), Some(length)) => {
                store.find_song_artist(song, artist, length)?
            }
            _ => None,
        };
        if ids.is_none() {
            stats.unresolved_songplays += 1;
        }
        stats.songplays += store.insert_songplay(&draft.resolve(ids))?;
    }

    #[cfg(feature = "logging")]
    tracing::debug!(
        "日志文件 {} 写入完成: songplays {} 行 (未匹配 {}), users {} 次, time {} 行",
        path.display(),
        stats.songplays,
        stats.unresolved_songplays,
        stats.users,
        stats.time_entries
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn play(ts: i64, user: &str, level: &str) -> SongPlayEvent {
        let event: LogEvent = serde_json::from_value(serde_json::json!({
            "ts": ts,
            "page": "NextSong",
            "userId": user,
            "level": level,
            "song": "T",
            "artist": "Art",
            "length": 180.5,
            "sessionId": 9,
        }))
        .unwrap();
        let start_time: NaiveDateTime = event.start_time().unwrap();
        SongPlayEvent { user_id: user.to_string(), start_time, event }
    }

    #[test]
    fn test_time_entries_are_distinct_and_sorted() {
        let events = vec![
            play(1_542_241_826_796, "7", "free"),
            play(1_541_106_106_796, "8", "paid"),
            play(1_542_241_826_796, "7", "paid"),
        ];
        let rows = LogRows::from_events(&events);
        assert_eq!(rows.time_entries.len(), 2);
        assert!(rows.time_entries[0].start_time < rows.time_entries[1].start_time);
        assert_eq!(rows.users.len(), 3);
        assert_eq!(rows.songplays.len(), 3);
    }

    #[test]
    fn test_users_keep_event_order() {
        let events =
            vec![play(1_000, "7", "free"), play(2_000, "7", "paid")];
        let rows = LogRows::from_events(&events);
        let levels: Vec<_> =
            rows.users.iter().map(|u| u.level.as_deref()).collect();
        assert_eq!(levels, vec![Some("free"), Some("paid")]);
    }

    #[test]
    fn test_songplay_draft_fields() {
        let rows = LogRows::from_events(&[play(1_000, "7", "free")]);
        let draft = &rows.songplays[0];
        assert_eq!(draft.user_id, "7");
        assert_eq!(draft.level.as_deref(), Some("free"));
        assert_eq!(draft.song.as_deref(), Some("T"));
        assert_eq!(draft.artist.as_deref(), Some("Art"));
        assert_eq!(draft.length, Some(180.5));
        assert_eq!(draft.session_id, Some(9));
    }
}
