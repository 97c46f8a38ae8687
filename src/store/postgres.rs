//! PostgreSQL 存储后端
//!
//! tokio-postgres 是异步客户端，这里用一个单线程 tokio 运行时驱动它，
//! 对外保持同步接口：每个操作都在 `block_on` 中完成，连接任务也在同一
//! 运行时上被推进。

use super::{SongplayStore, Statements, StoreOptions, Table};
use crate::config::PostgresConfig;
use crate::error::{EtlError, Result};
use crate::extract::{Artist, Song, Songplay, TimeEntry, User};
use tokio::runtime::Runtime;
use tokio_postgres::{Client, NoTls, error::SqlState, types::ToSql};

/// PostgreSQL 存储
pub struct PostgresStore {
    runtime: Runtime,
    client: Client,
    statements: Statements,
    options: StoreOptions,
    in_transaction: bool,
}

/// 把唯一约束冲突从普通驱动错误中区分出来
fn map_pg_error(e: tokio_postgres::Error) -> EtlError {
    match e.code() {
        Some(code)
            if *code == SqlState::UNIQUE_VIOLATION
                || *code == SqlState::NOT_NULL_VIOLATION =>
        {
            EtlError::ConstraintViolation(e.to_string())
        }
        _ => EtlError::Postgres(e),
    }
}

impl PostgresStore {
    /// 建立连接
    pub fn connect(config: &PostgresConfig, options: StoreOptions) -> Result<Self> {
        #[cfg(feature = "logging")]
        tracing::info!("连接 PostgreSQL: {}", config.redacted());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (client, connection) = runtime
            .block_on(Self::client_config(config).connect(NoTls))
            .map_err(|e| {
                EtlError::connection_error(format!("{}: {e}", config.redacted()))
            })?;

        runtime.spawn(async move {
            if let Err(e) = connection.await {
                #[cfg(feature = "logging")]
                tracing::error!("PostgreSQL 连接中断: {}", e);
                #[cfg(not(feature = "logging"))]
                let _ = e;
            }
        });

        Ok(Self {
            runtime,
            client,
            statements: Statements::postgres(options.skip_duplicate_keys),
            options,
            in_transaction: false,
        })
    }

    /// 把配置逐项交给 tokio-postgres，避免拼接连接串时的转义问题
    pub fn client_config(config: &PostgresConfig) -> tokio_postgres::Config {
        let mut pg = tokio_postgres::Config::new();
        pg.host(&config.host)
            .port(config.port)
            .dbname(&config.database)
            .user(&config.user)
            .password(&config.password);
        pg
    }

    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<usize> {
        let affected = self
            .runtime
            .block_on(self.client.execute(sql, params))
            .map_err(map_pg_error)?;
        Ok(affected as usize)
    }

    fn batch(&self, sql: &str) -> Result<()> {
        self.runtime
            .block_on(self.client.batch_execute(sql))
            .map_err(map_pg_error)
    }
}

impl SongplayStore for PostgresStore {
    fn name(&self) -> &str {
        "PostgreSQL"
    }

    fn create_schema(&mut self) -> Result<()> {
        for sql in &self.statements.create_tables {
            self.batch(sql)?;
        }
        #[cfg(feature = "logging")]
        tracing::debug!("PostgreSQL 表结构创建完成");
        Ok(())
    }

    fn drop_schema(&mut self) -> Result<()> {
        for sql in &self.statements.drop_tables {
            self.batch(sql)?;
        }
        #[cfg(feature = "logging")]
        tracing::debug!("PostgreSQL 表已删除");
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.batch("BEGIN")?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.batch("COMMIT")?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.batch("ROLLBACK")
    }

    fn insert_song(&mut self, song: &Song) -> Result<usize> {
        self.execute(
            &self.statements.song_insert,
            &[
                &song.song_id,
                &song.title,
                &song.artist_id,
                &song.year,
                &song.duration,
            ],
        )
    }

    fn insert_artist(&mut self, artist: &Artist) -> Result<usize> {
        self.execute(
            &self.statements.artist_insert,
            &[
                &artist.artist_id,
                &artist.name,
                &artist.location,
                &artist.latitude,
                &artist.longitude,
            ],
        )
    }

    fn insert_time(&mut self, entry: &TimeEntry) -> Result<usize> {
        // PostgreSQL 的 INT 对应 i32
        let hour = entry.hour as i32;
        let day = entry.day as i32;
        let week = entry.week as i32;
        let month = entry.month as i32;
        let weekday = entry.weekday as i32;
        self.execute(
            &self.statements.time_insert,
            &[
                &entry.start_time,
                &hour,
                &day,
                &week,
                &month,
                &entry.year,
                &weekday,
            ],
        )
    }

    fn upsert_user(&mut self, user: &User) -> Result<usize> {
        self.execute(
            &self.statements.user_upsert,
            &[
                &user.user_id,
                &user.first_name,
                &user.last_name,
                &user.gender,
                &user.level,
            ],
        )
    }

    fn find_song_artist(
        &self,
        title: &str,
        artist: &str,
        length: f64,
    ) -> Result<Option<(String, String)>> {
        let row = self
            .runtime
            .block_on(self.client.query_opt(
                &self.statements.song_select,
                &[&title, &artist, &length, &self.options.duration_tolerance],
            ))
            .map_err(map_pg_error)?;
        match row {
            Some(row) => {
                let song_id: String = row.try_get(0).map_err(map_pg_error)?;
                let artist_id: String = row.try_get(1).map_err(map_pg_error)?;
                Ok(Some((song_id, artist_id)))
            }
            None => Ok(None),
        }
    }

    fn insert_songplay(&mut self, play: &Songplay) -> Result<usize> {
        self.execute(
            &self.statements.songplay_insert,
            &[
                &play.start_time,
                &play.user_id,
                &play.level,
                &play.song_id,
                &play.artist_id,
                &play.session_id,
                &play.location,
                &play.user_agent,
            ],
        )
    }

    fn count_rows(&self, table: Table) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", table.name());
        let row = self
            .runtime
            .block_on(self.client.query_one(sql.as_str(), &[]))
            .map_err(map_pg_error)?;
        let count: i64 = row.try_get(0).map_err(map_pg_error)?;
        Ok(count as u64)
    }

    fn close(mut self: Box<Self>) -> Result<()> {
        if self.in_transaction {
            #[cfg(feature = "logging")]
            tracing::warn!("关闭 PostgreSQL 连接时仍有未提交的事务，已回滚");
            self.rollback()?;
        }
        // Client 被丢弃后连接任务结束
        let PostgresStore { runtime, client, .. } = *self;
        drop(client);
        drop(runtime);
        #[cfg(feature = "logging")]
        tracing::info!("PostgreSQL 连接已关闭");
        Ok(())
    }
}
