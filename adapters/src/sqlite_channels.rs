use anyhow::{Context, Result};
use async_trait::async_trait;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{OptionalExtension, params};

use application::ports::out_::{ReportChannelRegistry, StoreError};
use domain::{ChannelId, GuildId};

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;
pub type DbConn = r2d2::PooledConnection<SqliteConnectionManager>;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS report_channels (
    guild_id   INTEGER PRIMARY KEY,
    channel_id INTEGER NOT NULL
);";

/// Guild to report-channel mapping in SQLite. The pool lives as long as the
/// store; each query checks a connection out only for its own duration.
#[derive(Clone)]
pub struct SqliteReportChannels {
    pool: DbPool,
}

impl SqliteReportChannels {
    pub fn open(database_path: &str) -> Result<Self> {
        let manager = SqliteConnectionManager::file(database_path);
        let pool = r2d2::Pool::builder()
            .build(manager)
            .context("Failed to create database connection pool")?;
        let store = Self { pool };
        store.setup()?;
        Ok(store)
    }

    fn setup(&self) -> Result<()> {
        self.connection()?
            .execute_batch(SCHEMA)
            .context("Failed to create report_channels table")
    }

    fn connection(&self) -> Result<DbConn> {
        self.pool.get().context("Failed to get database connection from pool")
    }

    fn load(
        &self,
        guild_id: GuildId,
    ) -> Result<Option<ChannelId>> {
        let raw: Option<i64> = self
            .connection()?
            .query_row(
                "SELECT channel_id FROM report_channels WHERE guild_id = ?1",
                params![to_sql_id(guild_id.0)?],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("Failed to read report channel for guild {guild_id}"))?;
        raw.map(|id| u64::try_from(id).map(ChannelId).context("Stored channel id is negative"))
            .transpose()
    }

    fn upsert(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<()> {
        self.connection()?
            .execute(
                "INSERT INTO report_channels (guild_id, channel_id) VALUES (?1, ?2)
                 ON CONFLICT(guild_id) DO UPDATE SET channel_id = excluded.channel_id",
                params![to_sql_id(guild_id.0)?, to_sql_id(channel_id.0)?],
            )
            .with_context(|| format!("Failed to save report channel for guild {guild_id}"))?;
        Ok(())
    }
}

fn to_sql_id(id: u64) -> Result<i64> {
    i64::try_from(id).with_context(|| format!("Id {id} does not fit in an SQLite integer"))
}

fn store_error(err: anyhow::Error) -> StoreError {
    StoreError(format!("{err:#}"))
}

#[async_trait]
impl ReportChannelRegistry for SqliteReportChannels {
    async fn report_channel(
        &self,
        guild_id: GuildId,
    ) -> Result<Option<ChannelId>, StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.load(guild_id))
            .await
            .map_err(|err| StoreError(err.to_string()))?
            .map_err(store_error)
    }

    async fn set_report_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), StoreError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.upsert(guild_id, channel_id))
            .await
            .map_err(|err| StoreError(err.to_string()))?
            .map_err(store_error)
    }
}
