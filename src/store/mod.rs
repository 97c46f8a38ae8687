//! 存储模块
//!
//! 提供统一的星型模式写入接口和多种数据库后端支持

pub mod statements;
pub use statements::{Statements, Table};

#[cfg(feature = "store-postgres")]
pub mod postgres;
#[cfg(feature = "store-sqlite")]
pub mod sqlite;

#[cfg(feature = "store-postgres")]
pub use postgres::PostgresStore;
#[cfg(feature = "store-sqlite")]
pub use sqlite::SqliteStore;

use crate::config::{StoreBackend, StoreConfig};
use crate::error::{EtlError, Result};
use crate::extract::{Artist, Song, Songplay, TimeEntry, User};

/// 存储行为选项
#[derive(Debug, Clone, Copy)]
pub struct StoreOptions {
    /// 主键冲突时忽略 songs/artists/time 的插入
    pub skip_duplicate_keys: bool,
    /// 按时长匹配歌曲时允许的误差（秒）
    pub duration_tolerance: f64,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self { skip_duplicate_keys: true, duration_tolerance: 0.001 }
    }
}

impl From<&StoreConfig> for StoreOptions {
    fn from(config: &StoreConfig) -> Self {
        Self {
            skip_duplicate_keys: config.skip_duplicate_keys,
            duration_tolerance: config.duration_tolerance,
        }
    }
}

/// 星型模式存储的统一接口
///
/// 连接在构造时建立。事务由调用方通过 `begin`/`commit`/`rollback`
/// 显式控制，批处理驱动按文件提交。插入方法返回受影响的行数，
/// 冲突被忽略时返回 0。
pub trait SongplayStore {
    /// 后端名称
    fn name(&self) -> &str;

    /// 创建全部表（已存在则跳过）
    fn create_schema(&mut self) -> Result<()>;

    /// 删除全部表
    fn drop_schema(&mut self) -> Result<()>;

    /// 开启事务
    fn begin(&mut self) -> Result<()>;

    /// 提交当前事务
    fn commit(&mut self) -> Result<()>;

    /// 回滚当前事务，没有打开的事务时什么也不做
    fn rollback(&mut self) -> Result<()>;

    fn insert_song(&mut self, song: &Song) -> Result<usize>;

    fn insert_artist(&mut self, artist: &Artist) -> Result<usize>;

    fn insert_time(&mut self, entry: &TimeEntry) -> Result<usize>;

    /// 按 user_id 插入或更新用户，冲突时以新的 level 为准
    fn upsert_user(&mut self, user: &User) -> Result<usize>;

    /// 按标题、艺人名和时长查找 (song_id, artist_id)，找不到返回 None
    fn find_song_artist(
        &self,
        title: &str,
        artist: &str,
        length: f64,
    ) -> Result<Option<(String, String)>>;

    fn insert_songplay(&mut self, play: &Songplay) -> Result<usize>;

    /// 统计表中的行数
    fn count_rows(&self, table: Table) -> Result<u64>;

    /// 关闭连接
    fn close(self: Box<Self>) -> Result<()>;
}

/// 按配置打开存储
pub fn open_store(config: &StoreConfig) -> Result<Box<dyn SongplayStore>> {
    let options = StoreOptions::from(config);
    match config.backend {
        #[cfg(feature = "store-sqlite")]
        StoreBackend::Sqlite => {
            let store = if config.sqlite.path == ":memory:" {
                SqliteStore::open_in_memory(options)?
            } else {
                SqliteStore::open(&config.sqlite.path, options)?
            };
            Ok(Box::new(store))
        }
        #[cfg(feature = "store-postgres")]
        StoreBackend::Postgres => {
            Ok(Box::new(PostgresStore::connect(&config.postgres, options)?))
        }
        #[allow(unreachable_patterns)]
        other => Err(EtlError::config_error(format!(
            "存储后端 {other:?} 未启用，请打开对应的 cargo feature"
        ))),
    }
}
