//! 输入行与输出行的类型定义

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Deserializer};

/// 只保留 page 为该值的事件
pub const NEXT_SONG_PAGE: &str = "NextSong";

/// 歌曲元数据文件中的一行
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
    pub artist_name: String,
    #[serde(default)]
    pub artist_location: Option<String>,
    #[serde(default)]
    pub artist_latitude: Option<f64>,
    #[serde(default)]
    pub artist_longitude: Option<f64>,
}

/// 事件日志文件中的一行
///
/// 非 NextSong 事件（登录页、首页等）的大部分字段为空，因此都声明为 Option。
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEvent {
    /// 毫秒级 Unix 时间戳
    pub ts: i64,
    pub page: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub song: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub length: Option<f64>,
    #[serde(default)]
    pub session_id: Option<i64>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl LogEvent {
    /// 是否为播放事件
    pub fn is_song_play(&self) -> bool {
        self.page == NEXT_SONG_PAGE
    }

    /// 把毫秒时间戳转换为 UTC 时间，超出范围时返回 None
    pub fn start_time(&self) -> Option<NaiveDateTime> {
        chrono::DateTime::<chrono::Utc>::from_timestamp_millis(self.ts)
            .map(|dt| dt.naive_utc())
    }
}

/// userId 在不同导出批次里有时是字符串有时是数字，统一成字符串
fn string_or_number<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// songs 表的一行
#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
}

/// artists 表的一行
#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<&SongRecord> for Song {
    fn from(r: &SongRecord) -> Self {
        Self {
            song_id: r.song_id.clone(),
            title: r.title.clone(),
            artist_id: r.artist_id.clone(),
            year: r.year,
            duration: r.duration,
        }
    }
}

impl From<&SongRecord> for Artist {
    fn from(r: &SongRecord) -> Self {
        Self {
            artist_id: r.artist_id.clone(),
            name: r.artist_name.clone(),
            location: r.artist_location.clone(),
            latitude: r.artist_latitude,
            longitude: r.artist_longitude,
        }
    }
}

/// time 表的一行
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeEntry {
    pub start_time: NaiveDateTime,
    pub hour: u32,
    pub day: u32,
    /// ISO 周序号
    pub week: u32,
    pub month: u32,
    pub year: i32,
    /// 周一为 0，周日为 6
    pub weekday: u32,
}

impl TimeEntry {
    /// 从时间戳派生出各个日历字段
    pub fn from_timestamp(start_time: NaiveDateTime) -> Self {
        Self {
            start_time,
            hour: start_time.hour(),
            day: start_time.day(),
            week: start_time.iso_week().week(),
            month: start_time.month(),
            year: start_time.year(),
            weekday: start_time.weekday().num_days_from_monday(),
        }
    }
}

/// users 表的一行
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: Option<String>,
}

/// songplays 表的一行，songplay_id 由数据库生成
#[derive(Debug, Clone, PartialEq)]
pub struct Songplay {
    pub start_time: NaiveDateTime,
    pub user_id: String,
    pub level: Option<String>,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// 尚未解析 song_id/artist_id 的播放记录
#[derive(Debug, Clone, PartialEq)]
pub struct SongplayDraft {
    pub start_time: NaiveDateTime,
    pub user_id: String,
    pub level: Option<String>,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub length: Option<f64>,
    pub session_id: Option<i64>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl SongplayDraft {
    /// 填入解析结果，得到最终的 songplays 行
    pub fn resolve(self, ids: Option<(String, String)>) -> Songplay {
        let (song_id, artist_id) = match ids {
            Some((song_id, artist_id)) => (Some(song_id), Some(artist_id)),
            None => (None, None),
        };
        Songplay {
            start_time: self.start_time,
            user_id: self.user_id,
            level: self.level,
            song_id,
            artist_id,
            session_id: self.session_id,
            location: self.location,
            user_agent: self.user_agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_time_entry_fields() {
        // 2018-11-15 是周四，ISO 第 46 周
        let ts = NaiveDate::from_ymd_opt(2018, 11, 15)
            .unwrap()
            .and_hms_milli_opt(7, 30, 26, 796)
            .unwrap();
        let entry = TimeEntry::from_timestamp(ts);
        assert_eq!(entry.hour, 7);
        assert_eq!(entry.day, 15);
        assert_eq!(entry.week, 46);
        assert_eq!(entry.month, 11);
        assert_eq!(entry.year, 2018);
        assert_eq!(entry.weekday, 3);
    }

    #[test]
    fn test_user_id_string_or_number() {
        let a: LogEvent =
            serde_json::from_str(r#"{"ts":0,"page":"Home","userId":"7"}"#)
                .unwrap();
        let b: LogEvent =
            serde_json::from_str(r#"{"ts":0,"page":"Home","userId":7}"#)
                .unwrap();
        let c: LogEvent =
            serde_json::from_str(r#"{"ts":0,"page":"Home","userId":""}"#)
                .unwrap();
        assert_eq!(a.user_id.as_deref(), Some("7"));
        assert_eq!(b.user_id.as_deref(), Some("7"));
        assert_eq!(c.user_id, None);
    }

    #[test]
    fn test_start_time_from_millis() {
        let event: LogEvent = serde_json::from_str(
            r#"{"ts":1542241826796,"page":"NextSong"}"#,
        )
        .unwrap();
        let start = event.start_time().unwrap();
        assert_eq!(
            start.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            "2018-11-15 00:30:26.796"
        );
        assert!(event.is_song_play());
    }

    #[test]
    fn test_draft_resolve_miss() {
        let draft = SongplayDraft {
            start_time: NaiveDate::from_ymd_opt(2018, 11, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            user_id: "7".to_string(),
            level: Some("free".to_string()),
            song: Some("T".to_string()),
            artist: Some("Art".to_string()),
            length: Some(180.5),
            session_id: Some(1),
            location: None,
            user_agent: None,
        };
        let play = draft.resolve(None);
        assert_eq!(play.song_id, None);
        assert_eq!(play.artist_id, None);
        assert_eq!(play.user_id, "7");
    }
}
