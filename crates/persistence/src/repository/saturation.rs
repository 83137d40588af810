//! Saturation repository — daily strategy crowding snapshots

use crate::DbResult;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// One day's crowding measurement for one strategy
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SaturationSnapshotRecord {
    pub id: Option<i64>,
    pub strategy: String,
    /// Calendar day, `YYYY-MM-DD`
    pub day: String,
    pub wallet_count: i64,
    pub total_volume: f64,
    pub created_at: Option<i64>,
}

pub struct SaturationRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SaturationRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Record a snapshot (upsert by strategy and day; re-scans on the same
    /// day overwrite)
    pub async fn record_snapshot(
        &self,
        strategy: &str,
        day: &str,
        wallet_count: i64,
        total_volume: f64,
    ) -> DbResult<()> {
        sqlx::query(
            r#"INSERT INTO saturation_snapshots (strategy, day, wallet_count, total_volume)
               VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(strategy, day) DO UPDATE SET
                 wallet_count = excluded.wallet_count,
                 total_volume = excluded.total_volume
            "#,
        )
        .bind(strategy)
        .bind(day)
        .bind(wallet_count)
        .bind(total_volume)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// History for one strategy, oldest day first
    pub async fn get_history(
        &self,
        strategy: &str,
        limit: i64,
    ) -> DbResult<Vec<SaturationSnapshotRecord>> {
        let records = sqlx::query_as::<_, SaturationSnapshotRecord>(
            r#"SELECT * FROM (
                   SELECT * FROM saturation_snapshots
                   WHERE strategy = ?1 ORDER BY day DESC LIMIT ?2
               ) ORDER BY day ASC"#,
        )
        .bind(strategy)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Every strategy that has at least one snapshot
    pub async fn get_strategies(&self) -> DbResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT strategy FROM saturation_snapshots ORDER BY strategy")
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(|(s,)| s).collect())
    }
}
