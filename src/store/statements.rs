//! 各存储后端使用的 SQL 语句
//!
//! 每个后端在构造时拿到一份 `Statements`，不再依赖模块级常量。

/// 星型模式的五张表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Songs,
    Artists,
    Time,
    Users,
    Songplays,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Songplays,
        Table::Users,
        Table::Songs,
        Table::Artists,
        Table::Time,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Songs => "songs",
            Table::Artists => "artists",
            Table::Time => "time",
            Table::Users => "users",
            Table::Songplays => "songplays",
        }
    }
}

/// 一种 SQL 方言下的建表、删表和参数化语句
#[derive(Debug, Clone)]
pub struct Statements {
    pub create_tables: Vec<String>,
    pub drop_tables: Vec<String>,
    pub song_insert: String,
    pub artist_insert: String,
    pub time_insert: String,
    pub user_upsert: String,
    /// 参数：title, artist name, length, tolerance
    pub song_select: String,
    pub songplay_insert: String,
}

/// 占位符风格
#[derive(Debug, Clone, Copy)]
enum Placeholder {
    /// SQLite: ?1, ?2 ...
    Question,
    /// PostgreSQL: $1, $2 ...
    Dollar,
}

impl Placeholder {
    fn at(self, i: usize) -> String {
        match self {
            Placeholder::Question => format!("?{i}"),
            Placeholder::Dollar => format!("${i}"),
        }
    }

    fn list(self, n: usize) -> String {
        (1..=n).map(|i| self.at(i)).collect::<Vec<_>>().join(", ")
    }
}

fn on_conflict_ignore(key: &str, skip_duplicates: bool) -> String {
    if skip_duplicates {
        format!(" ON CONFLICT ({key}) DO NOTHING")
    } else {
        String::new()
    }
}

impl Statements {
    /// SQLite 方言
    pub fn sqlite(skip_duplicates: bool) -> Self {
        let create_tables = vec![
            "CREATE TABLE IF NOT EXISTS songs (
                song_id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                artist_id TEXT NOT NULL,
                year INTEGER,
                duration REAL
            )",
            "CREATE TABLE IF NOT EXISTS artists (
                artist_id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                location TEXT,
                latitude REAL,
                longitude REAL
            )",
            "CREATE TABLE IF NOT EXISTS time (
                start_time TEXT PRIMARY KEY,
                hour INTEGER NOT NULL,
                day INTEGER NOT NULL,
                week INTEGER NOT NULL,
                month INTEGER NOT NULL,
                year INTEGER NOT NULL,
                weekday INTEGER NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS users (
                user_id TEXT PRIMARY KEY,
                first_name TEXT,
                last_name TEXT,
                gender TEXT,
                level TEXT
            )",
            "CREATE TABLE IF NOT EXISTS songplays (
                songplay_id INTEGER PRIMARY KEY AUTOINCREMENT,
                start_time TEXT NOT NULL,
                user_id TEXT NOT NULL,
                level TEXT,
                song_id TEXT,
                artist_id TEXT,
                session_id INTEGER,
                location TEXT,
                user_agent TEXT
            )",
        ];
        Self::build(
            create_tables.into_iter().map(String::from).collect(),
            Placeholder::Question,
            skip_duplicates,
        )
    }

    /// PostgreSQL 方言
    pub fn postgres(skip_duplicates: bool) -> Self {
        let create_tables = vec![
            "CREATE TABLE IF NOT EXISTS songs (
                song_id VARCHAR PRIMARY KEY,
                title VARCHAR NOT NULL,
                artist_id VARCHAR NOT NULL,
                year INT,
                duration DOUBLE PRECISION
            )",
            "CREATE TABLE IF NOT EXISTS artists (
                artist_id VARCHAR PRIMARY KEY,
                name VARCHAR NOT NULL,
                location VARCHAR,
                latitude DOUBLE PRECISION,
                longitude DOUBLE PRECISION
            )",
            "CREATE TABLE IF NOT EXISTS time (
                start_time TIMESTAMP PRIMARY KEY,
                hour INT NOT NULL,
                day INT NOT NULL,
                week INT NOT NULL,
                month INT NOT NULL,
                year INT NOT NULL,
                weekday INT NOT NULL
            )",
            "CREATE TABLE IF NOT EXISTS users (
                user_id VARCHAR PRIMARY KEY,
                first_name VARCHAR,
                last_name VARCHAR,
                gender VARCHAR,
                level VARCHAR
            )",
            "CREATE TABLE IF NOT EXISTS songplays (
                songplay_id SERIAL PRIMARY KEY,
                start_time TIMESTAMP NOT NULL,
                user_id VARCHAR NOT NULL,
                level VARCHAR,
                song_id VARCHAR,
                artist_id VARCHAR,
                session_id BIGINT,
                location VARCHAR,
                user_agent VARCHAR
            )",
        ];
        Self::build(
            create_tables.into_iter().map(String::from).collect(),
            Placeholder::Dollar,
            skip_duplicates,
        )
    }

    fn build(
        create_tables: Vec<String>,
        p: Placeholder,
        skip_duplicates: bool,
    ) -> Self {
        let drop_tables = Table::ALL
            .iter()
            .map(|t| format!("DROP TABLE IF EXISTS {}", t.name()))
            .collect();

        let song_insert = format!(
            "INSERT INTO songs (song_id, title, artist_id, year, duration) \
             VALUES ({}){}",
            p.list(5),
            on_conflict_ignore("song_id", skip_duplicates)
        );
        let artist_insert = format!(
            "INSERT INTO artists (artist_id, name, location, latitude, longitude) \
             VALUES ({}){}",
            p.list(5),
            on_conflict_ignore("artist_id", skip_duplicates)
        );
        let time_insert = format!(
            "INSERT INTO time (start_time, hour, day, week, month, year, weekday) \
             VALUES ({}){}",
            p.list(7),
            on_conflict_ignore("start_time", skip_duplicates)
        );
        let user_upsert = format!(
            "INSERT INTO users (user_id, first_name, last_name, gender, level) \
             VALUES ({}) \
             ON CONFLICT (user_id) DO UPDATE SET level = excluded.level",
            p.list(5)
        );
        let song_select = format!(
            "SELECT s.song_id, s.artist_id \
             FROM songs s JOIN artists a ON s.artist_id = a.artist_id \
             WHERE s.title = {} AND a.name = {} AND ABS(s.duration - {}) <= {} \
             ORDER BY s.song_id LIMIT 1",
            p.at(1),
            p.at(2),
            p.at(3),
            p.at(4)
        );
        let songplay_insert = format!(
            "INSERT INTO songplays (start_time, user_id, level, song_id, artist_id, \
             session_id, location, user_agent) VALUES ({})",
            p.list(8)
        );

        Self {
            create_tables,
            drop_tables,
            song_insert,
            artist_insert,
            time_insert,
            user_upsert,
            song_select,
            songplay_insert,
        }
    }
}
