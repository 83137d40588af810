//! Wallet report repository — persistence for scan results and the trade cache

use crate::DbResult;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

/// A persisted wallet analysis report
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WalletReportRecord {
    pub id: Option<i64>,
    pub address: String,
    pub user_name: Option<String>,
    pub total_pnl: f64,
    pub total_volume: f64,
    pub portfolio_value: Option<f64>,
    pub strategy: String,
    pub strategy_confidence: f64,
    pub win_rate: f64,
    pub sharpe_ratio: f64,
    pub risk_score: f64,
    pub replicability_score: f64,
    pub edge_estimate: f64,
    pub alpha_score: f64,
    pub is_valid: bool,
    pub confidence_tier: String,
    pub sample_size: i64,
    pub win_rate_p_value: Option<f64>,
    pub consistency_variance: Option<f64>,
    pub variance_assumed: bool,
    pub rejection_reason: Option<String>,
    pub trade_count: i64,
    pub unique_markets: i64,
    pub signals_json: Option<String>,
    pub analysis_json: Option<String>,
    pub blueprint_json: Option<String>,
    pub alerted: bool,
    pub analyzed_at: Option<i64>,
}

/// One cached fill from a wallet's trade history
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CachedTradeRecord {
    pub id: Option<i64>,
    pub address: String,
    pub trade_hash: String,
    pub market_id: String,
    pub market_title: String,
    pub outcome: String,
    pub side: String,
    pub shares: f64,
    pub price: f64,
    pub value: f64,
    pub timestamp: i64,
    pub created_at: Option<i64>,
}

/// Aggregate counters for the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct WalletDbStats {
    pub total_wallets: i64,
    pub validated_wallets: i64,
    pub cached_trades: i64,
    pub last_scan_at: Option<i64>,
}

/// Repository for wallet reports and cached trades
pub struct WalletRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> WalletRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert or update a wallet report (upsert by address). The `alerted`
    /// flag is deliberately left out of the update so it survives re-scans.
    pub async fn save_report(&self, record: &WalletReportRecord) -> DbResult<i64> {
        let result = sqlx::query(
            r#"INSERT INTO wallet_reports
                (address, user_name, total_pnl, total_volume, portfolio_value,
                 strategy, strategy_confidence, win_rate, sharpe_ratio, risk_score,
                 replicability_score, edge_estimate, alpha_score, is_valid,
                 confidence_tier, sample_size, win_rate_p_value, consistency_variance,
                 variance_assumed, rejection_reason, trade_count, unique_markets,
                 signals_json, analysis_json, blueprint_json, analyzed_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                       ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25,
                       strftime('%s', 'now'))
               ON CONFLICT(address) DO UPDATE SET
                 user_name = excluded.user_name,
                 total_pnl = excluded.total_pnl,
                 total_volume = excluded.total_volume,
                 portfolio_value = excluded.portfolio_value,
                 strategy = excluded.strategy,
                 strategy_confidence = excluded.strategy_confidence,
                 win_rate = excluded.win_rate,
                 sharpe_ratio = excluded.sharpe_ratio,
                 risk_score = excluded.risk_score,
                 replicability_score = excluded.replicability_score,
                 edge_estimate = excluded.edge_estimate,
                 alpha_score = excluded.alpha_score,
                 is_valid = excluded.is_valid,
                 confidence_tier = excluded.confidence_tier,
                 sample_size = excluded.sample_size,
                 win_rate_p_value = excluded.win_rate_p_value,
                 consistency_variance = excluded.consistency_variance,
                 variance_assumed = excluded.variance_assumed,
                 rejection_reason = excluded.rejection_reason,
                 trade_count = excluded.trade_count,
                 unique_markets = excluded.unique_markets,
                 signals_json = excluded.signals_json,
                 analysis_json = excluded.analysis_json,
                 blueprint_json = excluded.blueprint_json,
                 analyzed_at = strftime('%s', 'now')
            "#,
        )
        .bind(&record.address)
        .bind(&record.user_name)
        .bind(record.total_pnl)
        .bind(record.total_volume)
        .bind(record.portfolio_value)
        .bind(&record.strategy)
        .bind(record.strategy_confidence)
        .bind(record.win_rate)
        .bind(record.sharpe_ratio)
        .bind(record.risk_score)
        .bind(record.replicability_score)
        .bind(record.edge_estimate)
        .bind(record.alpha_score)
        .bind(record.is_valid)
        .bind(&record.confidence_tier)
        .bind(record.sample_size)
        .bind(record.win_rate_p_value)
        .bind(record.consistency_variance)
        .bind(record.variance_assumed)
        .bind(&record.rejection_reason)
        .bind(record.trade_count)
        .bind(record.unique_markets)
        .bind(&record.signals_json)
        .bind(&record.analysis_json)
        .bind(&record.blueprint_json)
        .execute(self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// All reports, best alpha first
    pub async fn get_all(&self, limit: i64) -> DbResult<Vec<WalletReportRecord>> {
        let records = sqlx::query_as::<_, WalletReportRecord>(
            "SELECT * FROM wallet_reports ORDER BY alpha_score DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    pub async fn get_by_address(&self, address: &str) -> DbResult<Option<WalletReportRecord>> {
        let record = sqlx::query_as::<_, WalletReportRecord>(
            "SELECT * FROM wallet_reports WHERE address = ?1",
        )
        .bind(address)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Reports that passed statistical validation, best alpha first
    pub async fn get_validated(&self) -> DbResult<Vec<WalletReportRecord>> {
        let records = sqlx::query_as::<_, WalletReportRecord>(
            "SELECT * FROM wallet_reports WHERE is_valid = 1 ORDER BY alpha_score DESC",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    /// Validated reports nobody has been told about yet (catch-up on restart)
    pub async fn get_unalerted_validated(&self) -> DbResult<Vec<WalletReportRecord>> {
        let records = sqlx::query_as::<_, WalletReportRecord>(
            r#"SELECT * FROM wallet_reports
               WHERE is_valid = 1 AND alerted = 0
               ORDER BY alpha_score DESC"#,
        )
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    pub async fn mark_alerted(&self, address: &str) -> DbResult<()> {
        sqlx::query("UPDATE wallet_reports SET alerted = 1 WHERE address = ?1")
            .bind(address)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Insert trades with deduplication (INSERT OR IGNORE by trade_hash).
    /// Returns the number of newly inserted trades.
    pub async fn save_trades(&self, trades: &[CachedTradeRecord]) -> DbResult<usize> {
        let mut inserted = 0usize;
        for trade in trades {
            let result = sqlx::query(
                r#"INSERT OR IGNORE INTO wallet_trades
                    (address, trade_hash, market_id, market_title, outcome, side,
                     shares, price, value, timestamp)
                   VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(&trade.address)
            .bind(&trade.trade_hash)
            .bind(&trade.market_id)
            .bind(&trade.market_title)
            .bind(&trade.outcome)
            .bind(&trade.side)
            .bind(trade.shares)
            .bind(trade.price)
            .bind(trade.value)
            .bind(trade.timestamp)
            .execute(self.pool)
            .await?;

            if result.rows_affected() > 0 {
                inserted += 1;
            }
        }
        Ok(inserted)
    }

    /// Cached trades for one wallet, oldest first
    pub async fn get_trades(&self, address: &str) -> DbResult<Vec<CachedTradeRecord>> {
        let records = sqlx::query_as::<_, CachedTradeRecord>(
            "SELECT * FROM wallet_trades WHERE address = ?1 ORDER BY timestamp ASC",
        )
        .bind(address)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }

    pub async fn get_stats(&self) -> DbResult<WalletDbStats> {
        let (total_wallets,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wallet_reports")
            .fetch_one(self.pool)
            .await?;
        let (validated_wallets,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM wallet_reports WHERE is_valid = 1")
                .fetch_one(self.pool)
                .await?;
        let (cached_trades,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM wallet_trades")
            .fetch_one(self.pool)
            .await?;
        let (last_scan_at,): (Option<i64>,) =
            sqlx::query_as("SELECT MAX(analyzed_at) FROM wallet_reports")
                .fetch_one(self.pool)
                .await?;

        Ok(WalletDbStats {
            total_wallets,
            validated_wallets,
            cached_trades,
            last_scan_at,
        })
    }

    /// Keep only the top `keep` reports by alpha score, dropping the rest and
    /// their cached trades. Returns the number of deleted reports.
    pub async fn delete_beyond_top(&self, keep: i64) -> DbResult<u64> {
        let result = sqlx::query(
            r#"DELETE FROM wallet_reports
               WHERE address NOT IN (
                   SELECT address FROM wallet_reports
                   ORDER BY alpha_score DESC LIMIT ?1
               )"#,
        )
        .bind(keep)
        .execute(self.pool)
        .await?;

        sqlx::query(
            "DELETE FROM wallet_trades WHERE address NOT IN (SELECT address FROM wallet_reports)",
        )
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Reclaim disk space after a bulk delete
    pub async fn vacuum(&self) -> DbResult<()> {
        sqlx::query("VACUUM").execute(self.pool).await?;
        Ok(())
    }
}
