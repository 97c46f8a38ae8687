//! 集成测试公共模块

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// 在临时目录下创建测试文件，自动创建父目录
pub fn create_test_file(dir: &TempDir, relative: &str, content: &str) -> PathBuf {
    let file_path = dir.path().join(relative);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    fs::write(&file_path, content).expect("Failed to write test file");
    file_path
}

/// 单行歌曲元数据
#[allow(dead_code)]
pub const SINGLE_SONG: &str = r#"{"song_id":"S1","title":"T","artist_id":"A1","year":2000,"duration":180.5,"artist_name":"Art","artist_location":"NYC","artist_latitude":40.7,"artist_longitude":-74.0}
"#;

/// 真实格式的歌曲元数据（含 num_songs 和空经纬度）
#[allow(dead_code)]
pub const SAMPLE_SONG: &str = r#"{"num_songs": 1, "artist_id": "ARD7TVE1187B99BFB1", "artist_latitude": null, "artist_longitude": null, "artist_location": "California - LA", "artist_name": "Casual", "song_id": "SOMZWCG12A8C13C480", "title": "I Didn't Mean To", "duration": 218.93179, "year": 0}
"#;

/// 一条 NextSong 和一条 Home 事件
#[allow(dead_code)]
pub const TWO_EVENTS: &str = r#"{"artist":"Art","auth":"Logged In","firstName":"Walter","gender":"M","itemInSession":0,"lastName":"Frye","length":180.5,"level":"free","location":"San Francisco-Oakland-Hayward, CA","method":"PUT","page":"NextSong","registration":1540919166796.0,"sessionId":38,"song":"T","status":200,"ts":1541105830796,"userAgent":"Mozilla\/5.0","userId":"7"}
{"artist":null,"auth":"Logged In","firstName":"Walter","gender":"M","itemInSession":1,"lastName":"Frye","length":null,"level":"free","location":"San Francisco-Oakland-Hayward, CA","method":"GET","page":"Home","registration":1540919166796.0,"sessionId":38,"song":null,"status":200,"ts":1541106106796,"userAgent":"Mozilla\/5.0","userId":"7"}
"#;

/// 构造一条日志事件
#[allow(dead_code)]
pub fn event_line(page: &str, user_id: &str, level: &str, ts: i64) -> String {
    serde_json::json!({
        "artist": "Art",
        "firstName": "Walter",
        "lastName": "Frye",
        "gender": "M",
        "length": 180.5,
        "level": level,
        "location": "San Francisco-Oakland-Hayward, CA",
        "page": page,
        "sessionId": 38,
        "song": "T",
        "ts": ts,
        "userAgent": "Mozilla/5.0",
        "userId": user_id,
    })
    .to_string()
}

/// 把多行拼成 JSON Lines 文本
#[allow(dead_code)]
pub fn lines<S: AsRef<str>>(rows: &[S]) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(row.as_ref());
        out.push('\n');
    }
    out
}

/// 测试用 SQLite 文件路径
#[allow(dead_code)]
pub fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("sparkify.db")
}
