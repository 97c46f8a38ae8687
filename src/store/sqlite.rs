//! SQLite 存储后端

use super::{SongplayStore, Statements, StoreOptions, Table};
use crate::error::{EtlError, Result};
use crate::extract::{Artist, Song, Songplay, TimeEntry, User};
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};

/// SQLite 中时间戳以文本保存
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// SQLite 存储
pub struct SqliteStore {
    connection: Connection,
    statements: Statements,
    options: StoreOptions,
    db_path: Option<PathBuf>,
}

/// 把约束冲突从普通 SQLite 错误中区分出来
fn map_sqlite_error(e: rusqlite::Error) -> EtlError {
    match &e {
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            EtlError::ConstraintViolation(
                msg.clone().unwrap_or_else(|| err.to_string()),
            )
        }
        _ => EtlError::Sqlite(e),
    }
}

fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

impl SqliteStore {
    /// 打开（或创建）数据库文件
    pub fn open<P: AsRef<Path>>(db_path: P, options: StoreOptions) -> Result<Self> {
        let db_path = db_path.as_ref();
        #[cfg(feature = "logging")]
        tracing::info!("打开 SQLite 数据库: {}", db_path.display());

        let connection = Connection::open(db_path).map_err(|e| {
            EtlError::connection_error(format!("{}: {e}", db_path.display()))
        })?;
        Ok(Self::with_connection(
            connection,
            options,
            Some(db_path.to_path_buf()),
        ))
    }

    /// 打开内存数据库，主要用于测试
    pub fn open_in_memory(options: StoreOptions) -> Result<Self> {
        let connection = Connection::open_in_memory()
            .map_err(|e| EtlError::connection_error(e.to_string()))?;
        Ok(Self::with_connection(connection, options, None))
    }

    fn with_connection(
        connection: Connection,
        options: StoreOptions,
        db_path: Option<PathBuf>,
    ) -> Self {
        Self {
            connection,
            statements: Statements::sqlite(options.skip_duplicate_keys),
            options,
            db_path,
        }
    }

    /// 数据库文件路径，内存库为 None
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// 当前是否有未提交的事务
    pub fn in_transaction(&self) -> bool {
        !self.connection.is_autocommit()
    }

    /// 底层连接，供查询校验使用
    pub fn connection(&self) -> &Connection {
        &self.connection
    }
}

impl SongplayStore for SqliteStore {
    fn name(&self) -> &str {
        "SQLite"
    }

    fn create_schema(&mut self) -> Result<()> {
        for sql in &self.statements.create_tables {
            self.connection.execute(sql, []).map_err(map_sqlite_error)?;
        }
        #[cfg(feature = "logging")]
        tracing::debug!("SQLite 表结构创建完成");
        Ok(())
    }

    fn drop_schema(&mut self) -> Result<()> {
        for sql in &self.statements.drop_tables {
            self.connection.execute(sql, []).map_err(map_sqlite_error)?;
        }
        #[cfg(feature = "logging")]
        tracing::debug!("SQLite 表已删除");
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.connection.execute_batch("BEGIN").map_err(map_sqlite_error)
    }

    fn commit(&mut self) -> Result<()> {
        self.connection.execute_batch("COMMIT").map_err(map_sqlite_error)
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction() {
            return Ok(());
        }
        self.connection.execute_batch("ROLLBACK").map_err(map_sqlite_error)
    }

    fn insert_song(&mut self, song: &Song) -> Result<usize> {
        let mut stmt = self
            .connection
            .prepare_cached(&self.statements.song_insert)
            .map_err(map_sqlite_error)?;
        stmt.execute(params![
            song.song_id,
            song.title,
            song.artist_id,
            song.year,
            song.duration,
        ])
        .map_err(map_sqlite_error)
    }

    fn insert_artist(&mut self, artist: &Artist) -> Result<usize> {
        let mut stmt = self
            .connection
            .prepare_cached(&self.statements.artist_insert)
            .map_err(map_sqlite_error)?;
        stmt.execute(params![
            artist.artist_id,
            artist.name,
            artist.location,
            artist.latitude,
            artist.longitude,
        ])
        .map_err(map_sqlite_error)
    }

    fn insert_time(&mut self, entry: &TimeEntry) -> Result<usize> {
        let mut stmt = self
            .connection
            .prepare_cached(&self.statements.time_insert)
            .map_err(map_sqlite_error)?;
        stmt.execute(params![
            format_ts(&entry.start_time),
            entry.hour,
            entry.day,
            entry.week,
            entry.month,
            entry.year,
            entry.weekday,
        ])
        .map_err(map_sqlite_error)
    }

    fn upsert_user(&mut self, user: &User) -> Result<usize> {
        let mut stmt = self
            .connection
            .prepare_cached(&self.statements.user_upsert)
            .map_err(map_sqlite_error)?;
        stmt.execute(params![
            user.user_id,
            user.first_name,
            user.last_name,
            user.gender,
            user.level,
        ])
        .map_err(map_sqlite_error)
    }

    fn find_song_artist(
        &self,
        title: &str,
        artist: &str,
        length: f64,
    ) -> Result<Option<(String, String)>> {
        let mut stmt = self
            .connection
            .prepare_cached(&self.statements.song_select)
            .map_err(map_sqlite_error)?;
        stmt.query_row(
            params![title, artist, length, self.options.duration_tolerance],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(map_sqlite_error)
    }

    fn insert_songplay(&mut self, play: &Songplay) -> Result<usize> {
        let mut stmt = self
            .connection
            .prepare_cached(&self.statements.songplay_insert)
            .map_err(map_sqlite_error)?;
        stmt.execute(params![
            format_ts(&play.start_time),
            play.user_id,
            play.level,
            play.song_id,
            play.artist_id,
            play.session_id,
            play.location,
            play.user_agent,
        ])
        .map_err(map_sqlite_error)
    }

    fn count_rows(&self, table: Table) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let count: i64 = self
            .connection
            .query_row(&sql, [], |row| row.get(0))
            .map_err(map_sqlite_error)?;
        Ok(count as u64)
    }

    fn close(self: Box<Self>) -> Result<()> {
        let this = *self;
        if this.in_transaction() {
            #[cfg(feature = "logging")]
            tracing::warn!("关闭 SQLite 连接时仍有未提交的事务，已回滚");
            this.connection
                .execute_batch("ROLLBACK")
                .map_err(map_sqlite_error)?;
        }
        this.connection.close().map_err(|(_, e)| map_sqlite_error(e))?;
        #[cfg(feature = "logging")]
        tracing::info!("SQLite 连接已关闭");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn store() -> SqliteStore {
        let mut store =
            SqliteStore::open_in_memory(StoreOptions::default()).unwrap();
        store.create_schema().unwrap();
        store
    }

    fn song() -> Song {
        Song {
            song_id: "S1".to_string(),
            title: "T".to_string(),
            artist_id: "A1".to_string(),
            year: 2000,
            duration: 180.5,
        }
    }

    #[test]
    fn test_constraint_violation_when_not_skipping() {
        let options = StoreOptions {
            skip_duplicate_keys: false,
            ..StoreOptions::default()
        };
        let mut store = SqliteStore::open_in_memory(options).unwrap();
        store.create_schema().unwrap();
        assert_eq!(store.insert_song(&song()).unwrap(), 1);
        let err = store.insert_song(&song()).unwrap_err();
        assert!(err.is_constraint_violation());
    }

    #[test]
    fn test_duplicate_ignored_when_skipping() {
        let mut store = store();
        assert_eq!(store.insert_song(&song()).unwrap(), 1);
        assert_eq!(store.insert_song(&song()).unwrap(), 0);
        assert_eq!(store.count_rows(Table::Songs).unwrap(), 1);
    }

    #[test]
    fn test_rollback_discards_rows() {
        let mut store = store();
        store.begin().unwrap();
        assert!(store.in_transaction());
        store.insert_song(&song()).unwrap();
        store.rollback().unwrap();
        assert!(!store.in_transaction());
        assert_eq!(store.count_rows(Table::Songs).unwrap(), 0);
        // 没有事务时回滚是空操作
        store.rollback().unwrap();
    }

    #[test]
    fn test_time_stored_as_text() {
        let mut store = store();
        let ts = NaiveDate::from_ymd_opt(2018, 11, 15)
            .unwrap()
            .and_hms_milli_opt(0, 30, 26, 796)
            .unwrap();
        store.insert_time(&TimeEntry::from_timestamp(ts)).unwrap();
        let stored: String = store
            .connection()
            .query_row("SELECT start_time FROM time", [], |r| r.get(0))
            .unwrap();
        assert_eq!(stored, "2018-11-15 00:30:26.796");
    }
}
