//! Wallet Scanner — walk the Polymarket leaderboard and reverse-engineer
//! every wallet worth copying.
//!
//! Fetches each candidate's positions and trade history, runs the full
//! analysis pipeline (profile, classification, validation, alpha signals,
//! blueprint), and persists the results.

use crate::alpha::{alpha_score, detect_signals, Signal};
use crate::analyzer::{WalletAnalysis, WalletAnalyzer};
use crate::api::polymarket::{LeaderboardEntry, PolymarketDataClient, WalletPosition, WalletTrade};
use crate::blueprint::{build_blueprint, StrategyBlueprint};
use crate::rules::RuleExtractor;
use crate::types::{MarketKind, Position, Trade, TradeSide, WalletProfile};
use crate::validator::{validate_wallet, ValidationResult};
use futures_util::stream::{self, StreamExt};
use persistence::repository::saturation::SaturationRepository;
use persistence::repository::wallets::{CachedTradeRecord, WalletReportRecord, WalletRepository};
use persistence::SqlitePool;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::RwLock;
use tracing::{debug, error, info, warn};

/// Delay between consecutive data-api calls for one wallet
const RATE_LIMIT_MS: u64 = 200;
/// Wallets fetched in parallel
const MAX_CONCURRENT_FETCHES: usize = 5;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Scan parameters. All fields have defaults so API callers can send a
/// partial JSON body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// How deep into the leaderboard to look
    pub leaderboard_limit: u32,
    /// Minimum lifetime PnL (USD) for a wallet to be worth fetching
    pub min_profit: f64,
    /// Minimum resolved win rate for a wallet to be analyzed in depth
    pub min_win_rate: f64,
    /// Rule extraction threshold: drop rules below this confidence
    pub min_confidence: f64,
    /// Rule extraction threshold: drop rules with fewer observations
    pub min_evidence: usize,
    /// Below this many trades the classifier verdict is forced to UNKNOWN
    pub min_trades: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            leaderboard_limit: 50,
            min_profit: 5000.0,
            min_win_rate: 0.85,
            min_confidence: 0.7,
            min_evidence: 10,
            min_trades: 10,
        }
    }
}

// ---------------------------------------------------------------------------
// Progress tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanStatus {
    Idle,
    FetchingLeaderboard,
    AnalyzingWallets,
    Complete,
    Error,
}

pub struct ScanProgress {
    pub status: RwLock<ScanStatus>,
    pub total_wallets: AtomicU32,
    pub analyzed: AtomicU32,
    pub validated: AtomicU32,
    pub current_wallet: RwLock<String>,
    pub results: RwLock<Vec<WalletReport>>,
    pub error_message: RwLock<Option<String>>,
    pub cancelled: AtomicBool,
}

impl ScanProgress {
    pub fn new() -> Self {
        Self {
            status: RwLock::new(ScanStatus::Idle),
            total_wallets: AtomicU32::new(0),
            analyzed: AtomicU32::new(0),
            validated: AtomicU32::new(0),
            current_wallet: RwLock::new(String::new()),
            results: RwLock::new(Vec::new()),
            error_message: RwLock::new(None),
            cancelled: AtomicBool::new(false),
        }
    }

    pub fn reset(&self) {
        *self.status.write().unwrap() = ScanStatus::FetchingLeaderboard;
        self.total_wallets.store(0, Ordering::Relaxed);
        self.analyzed.store(0, Ordering::Relaxed);
        self.validated.store(0, Ordering::Relaxed);
        *self.current_wallet.write().unwrap() = String::new();
        *self.results.write().unwrap() = Vec::new();
        *self.error_message.write().unwrap() = None;
        self.cancelled.store(false, Ordering::Relaxed);
    }

    pub fn is_running(&self) -> bool {
        let status = self.status.read().unwrap();
        matches!(
            *status,
            ScanStatus::FetchingLeaderboard | ScanStatus::AnalyzingWallets
        )
    }

    pub fn progress_pct(&self) -> f64 {
        let total = self.total_wallets.load(Ordering::Relaxed);
        if total == 0 {
            return 0.0;
        }
        (self.analyzed.load(Ordering::Relaxed) as f64 / total as f64) * 100.0
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything the pipeline learned about one wallet
#[derive(Debug, Clone, Serialize)]
pub struct WalletReport {
    pub address: String,
    pub user_name: Option<String>,
    pub profile: WalletProfile,
    pub analysis: WalletAnalysis,
    pub validation: ValidationResult,
    pub signals: Vec<Signal>,
    pub alpha_score: f64,
    /// Present only for wallets that passed statistical validation
    pub blueprint: Option<StrategyBlueprint>,
}

// ---------------------------------------------------------------------------
// API-to-domain conversion
// ---------------------------------------------------------------------------

/// Convert a raw data-api trade into the analysis domain. Trades missing
/// any of the load-bearing fields are dropped.
pub fn convert_trade(wallet: &str, raw: &WalletTrade) -> Option<Trade> {
    let market_id = raw.condition_id.clone()?;
    let timestamp = raw.timestamp? as i64;
    let price = raw.price?;
    let shares = raw.size?;
    let side = match raw.side.as_deref() {
        Some("BUY") => TradeSide::Buy,
        Some("SELL") => TradeSide::Sell,
        _ => return None,
    };

    let outcome = raw.outcome.clone().unwrap_or_default();
    let market_kind = if outcome.eq_ignore_ascii_case("yes") || outcome.eq_ignore_ascii_case("no")
    {
        MarketKind::Binary
    } else {
        MarketKind::Multi
    };
    let is_maker = raw
        .maker_address
        .as_deref()
        .map(|m| m.eq_ignore_ascii_case(wallet))
        .unwrap_or(false);
    // First slug segment doubles as a coarse category ("nba-finals-x" -> "nba")
    let category = raw
        .event_slug
        .as_deref()
        .and_then(|slug| slug.split('-').next())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(Trade {
        timestamp,
        market_id,
        market_title: raw.title.clone().unwrap_or_default(),
        outcome,
        side,
        shares,
        price,
        value: shares * price,
        is_maker,
        market_kind,
        category,
        realized_pnl: None,
        exit_timestamp: None,
    })
}

pub fn convert_position(raw: &WalletPosition) -> Position {
    Position {
        market_id: raw.condition_id.clone(),
        cost_basis: raw.initial_value.unwrap_or(0.0),
        cash_pnl: raw.cash_pnl.unwrap_or(0.0),
        size: raw.size.unwrap_or(0.0),
        avg_price: raw.avg_price.unwrap_or(0.0),
    }
}

/// Match sells against earlier buys (FIFO per market and outcome) and stamp
/// the matched buys with their realized PnL and exit time. A buy only counts
/// as closed once later sells cover its full share count; partially-covered
/// buys stay open.
pub fn reconstruct_closed_positions(trades: Vec<Trade>) -> Vec<Trade> {
    let mut trades = trades;
    trades.sort_by_key(|t| t.timestamp);

    let mut open: HashMap<(String, String), VecDeque<usize>> = HashMap::new();
    for i in 0..trades.len() {
        let key = (trades[i].market_id.clone(), trades[i].outcome.clone());
        match trades[i].side {
            TradeSide::Buy => open.entry(key).or_default().push_back(i),
            TradeSide::Sell => {
                let sell_price = trades[i].price;
                let sell_ts = trades[i].timestamp;
                let mut remaining = trades[i].shares;
                if let Some(queue) = open.get_mut(&key) {
                    while remaining > 1e-9 {
                        let Some(&j) = queue.front() else { break };
                        let buy_shares = trades[j].shares;
                        if buy_shares > remaining + 1e-9 {
                            break;
                        }
                        trades[j].realized_pnl =
                            Some((sell_price - trades[j].price) * buy_shares);
                        trades[j].exit_timestamp = Some(sell_ts);
                        remaining -= buy_shares;
                        queue.pop_front();
                    }
                }
            }
        }
    }
    trades
}

/// Build the wallet profile from converted positions and trades
pub fn build_profile(
    address: &str,
    positions: &[Position],
    trades: &[Trade],
    portfolio_value: Option<f64>,
) -> WalletProfile {
    let first_seen = trades.iter().map(|t| t.timestamp).min();
    let last_seen = trades.iter().map(|t| t.timestamp).max();
    let active_days = match (first_seen, last_seen) {
        (Some(first), Some(last)) => ((last - first) as f64 / 86_400.0).max(1.0),
        _ => 0.0,
    };

    let wins = positions.iter().filter(|p| p.cash_pnl > 0.0).count();
    let losses = positions.iter().filter(|p| p.cash_pnl < 0.0).count();
    let resolved = wins + losses;
    let win_rate = if resolved > 0 {
        wins as f64 / resolved as f64
    } else {
        0.0
    };

    let total_pnl: f64 = positions.iter().map(|p| p.cash_pnl).sum();
    let avg_trade_size = if trades.is_empty() {
        0.0
    } else {
        trades.iter().map(|t| t.value).sum::<f64>() / trades.len() as f64
    };
    let markets_traded = trades
        .iter()
        .map(|t| t.market_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    WalletProfile {
        address: address.to_string(),
        first_seen,
        active_days,
        total_pnl,
        total_trades: trades.len(),
        win_rate,
        avg_trade_size,
        markets_traded,
        portfolio_value,
    }
}

// ---------------------------------------------------------------------------
// Report assembly
// ---------------------------------------------------------------------------

/// Run the full analysis pipeline over one wallet's converted data
pub fn build_report(
    address: &str,
    user_name: Option<String>,
    profile: WalletProfile,
    positions: &[Position],
    trades: &[Trade],
    config: &ScanConfig,
    now: i64,
) -> WalletReport {
    let analysis = WalletAnalyzer::new(config.min_trades).analyze(trades);
    let validation = validate_wallet(positions, trades);

    let signals = match detect_signals(&profile, trades, now) {
        Ok(signals) => signals,
        Err(e) => {
            warn!(address = %address, error = %e, "Signal detection failed");
            Vec::new()
        }
    };
    let alpha = alpha_score(&signals);

    // Blueprints are only worth writing for statistically real edges
    let blueprint = if validation.is_valid {
        let extractor = RuleExtractor::new(config.min_confidence, config.min_evidence);
        match build_blueprint(&profile, trades, &analysis, &extractor) {
            Ok(bp) => Some(bp),
            Err(e) => {
                warn!(address = %address, error = %e, "Blueprint assembly failed");
                None
            }
        }
    } else {
        None
    };

    WalletReport {
        address: address.to_string(),
        user_name,
        profile,
        analysis,
        validation,
        signals,
        alpha_score: alpha,
        blueprint,
    }
}

// ---------------------------------------------------------------------------
// Persistence conversion
// ---------------------------------------------------------------------------

/// Deduplication hash over the fields that identify a fill
fn compute_trade_hash(wallet: &str, trade: &Trade) -> String {
    let mut hasher = Sha256::new();
    hasher.update(wallet.as_bytes());
    hasher.update(trade.market_id.as_bytes());
    hasher.update(trade.outcome.as_bytes());
    hasher.update(trade.side.label().as_bytes());
    hasher.update(format!("{}", trade.shares).as_bytes());
    hasher.update(format!("{}", trade.price).as_bytes());
    hasher.update(format!("{}", trade.timestamp).as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn trades_to_records(wallet: &str, trades: &[Trade]) -> Vec<CachedTradeRecord> {
    trades
        .iter()
        .map(|t| CachedTradeRecord {
            id: None,
            address: wallet.to_string(),
            trade_hash: compute_trade_hash(wallet, t),
            market_id: t.market_id.clone(),
            market_title: t.market_title.clone(),
            outcome: t.outcome.clone(),
            side: t.side.label().to_string(),
            shares: t.shares,
            price: t.price,
            value: t.value,
            timestamp: t.timestamp,
            created_at: None,
        })
        .collect()
}

fn report_to_record(report: &WalletReport) -> WalletReportRecord {
    WalletReportRecord {
        id: None,
        address: report.address.clone(),
        user_name: report.user_name.clone(),
        total_pnl: report.profile.total_pnl,
        total_volume: report.analysis.total_volume,
        portfolio_value: report.profile.portfolio_value,
        strategy: report.analysis.strategy.label().to_string(),
        strategy_confidence: report.analysis.confidence,
        win_rate: report.profile.win_rate,
        sharpe_ratio: report.analysis.sharpe_ratio,
        risk_score: report.analysis.risk_score,
        replicability_score: report.analysis.replicability_score,
        edge_estimate: report.analysis.edge_estimate,
        alpha_score: report.alpha_score,
        is_valid: report.validation.is_valid,
        confidence_tier: report.validation.confidence.label().to_string(),
        sample_size: report.validation.sample_size as i64,
        win_rate_p_value: Some(report.validation.win_rate_p_value),
        consistency_variance: Some(report.validation.consistency_variance),
        variance_assumed: report.validation.variance_assumed,
        rejection_reason: report.validation.rejection_reason.clone(),
        trade_count: report.analysis.total_trades as i64,
        unique_markets: report.analysis.unique_markets as i64,
        signals_json: serde_json::to_string(&report.signals).ok(),
        analysis_json: serde_json::to_string(&report.analysis).ok(),
        blueprint_json: report
            .blueprint
            .as_ref()
            .and_then(|bp| serde_json::to_string(bp).ok()),
        alerted: false,
        analyzed_at: None,
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Scan the leaderboard and analyze every candidate wallet.
///
/// Fetches run [`MAX_CONCURRENT_FETCHES`] wallets at a time with
/// [`RATE_LIMIT_MS`] between a single wallet's calls; analysis and
/// persistence happen sequentially as results arrive.
pub async fn run_scan(
    client: &PolymarketDataClient,
    progress: &ScanProgress,
    config: &ScanConfig,
    db_pool: Option<SqlitePool>,
) {
    progress.reset();
    info!(
        limit = config.leaderboard_limit,
        min_profit = config.min_profit,
        "Starting wallet scan"
    );

    let entries = match client.get_leaderboard(config.leaderboard_limit).await {
        Ok(e) => e,
        Err(err) => {
            error!("Failed to fetch leaderboard: {}", err);
            *progress.status.write().unwrap() = ScanStatus::Error;
            *progress.error_message.write().unwrap() =
                Some(format!("Leaderboard fetch failed: {}", err));
            return;
        }
    };

    let candidates: Vec<LeaderboardEntry> = entries
        .into_iter()
        .filter(|e| e.proxy_wallet.is_some())
        .filter(|e| e.pnl.unwrap_or(0.0) >= config.min_profit)
        .collect();

    progress
        .total_wallets
        .store(candidates.len() as u32, Ordering::Relaxed);
    *progress.status.write().unwrap() = ScanStatus::AnalyzingWallets;
    info!(candidates = candidates.len(), "Leaderboard filtered");

    let mut fetches = stream::iter(candidates)
        .map(|entry| async move {
            if progress.cancelled.load(Ordering::Relaxed) {
                return (entry, Vec::new(), Vec::new(), None);
            }
            let wallet = entry.proxy_wallet.clone().unwrap_or_default();

            let positions = match client.get_positions(&wallet).await {
                Ok(p) => p,
                Err(e) => {
                    warn!(address = %wallet, error = %e, "Failed to fetch positions");
                    Vec::new()
                }
            };
            tokio::time::sleep(std::time::Duration::from_millis(RATE_LIMIT_MS)).await;

            let trades = match client.get_trades(&wallet).await {
                Ok(t) => t,
                Err(e) => {
                    warn!(address = %wallet, error = %e, "Failed to fetch trades");
                    Vec::new()
                }
            };
            tokio::time::sleep(std::time::Duration::from_millis(RATE_LIMIT_MS)).await;

            let portfolio_value = match client.get_value(&wallet).await {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(address = %wallet, error = %e, "Failed to fetch portfolio value");
                    None
                }
            };

            (entry, positions, trades, portfolio_value)
        })
        .buffer_unordered(MAX_CONCURRENT_FETCHES);

    let now = chrono::Utc::now().timestamp();

    while let Some((entry, raw_positions, raw_trades, portfolio_value)) = fetches.next().await {
        if progress.cancelled.load(Ordering::Relaxed) {
            warn!("Wallet scan cancelled");
            break;
        }

        let wallet = entry.proxy_wallet.clone().unwrap_or_default();
        let name = entry.user_name.clone();
        *progress.current_wallet.write().unwrap() = wallet.clone();

        let positions: Vec<Position> = raw_positions.iter().map(convert_position).collect();
        let trades = reconstruct_closed_positions(
            raw_trades
                .iter()
                .filter_map(|t| convert_trade(&wallet, t))
                .collect(),
        );

        let profile = build_profile(&wallet, &positions, &trades, portfolio_value);
        if profile.win_rate < config.min_win_rate {
            debug!(
                address = %wallet,
                win_rate = profile.win_rate,
                "Below win-rate floor, skipping"
            );
            progress.analyzed.fetch_add(1, Ordering::Relaxed);
            continue;
        }

        info!(
            address = %wallet,
            trades = trades.len(),
            positions = positions.len(),
            "Analyzing wallet"
        );
        let report = build_report(&wallet, name, profile, &positions, &trades, config, now);

        if let Some(ref pool) = db_pool {
            let repo = WalletRepository::new(pool);
            if let Err(e) = repo.save_report(&report_to_record(&report)).await {
                warn!(address = %wallet, error = %e, "Failed to save report");
            }
            match repo.save_trades(&trades_to_records(&wallet, &trades)).await {
                Ok(n) if n > 0 => {
                    debug!(address = %wallet, new_trades = n, "Cached trades");
                }
                Ok(_) => {}
                Err(e) => warn!(address = %wallet, error = %e, "Failed to cache trades"),
            }
        }

        if report.validation.is_valid {
            progress.validated.fetch_add(1, Ordering::Relaxed);
        }
        progress.results.write().unwrap().push(report);
        progress.analyzed.fetch_add(1, Ordering::Relaxed);
    }

    if let Some(ref pool) = db_pool {
        if !progress.cancelled.load(Ordering::Relaxed) {
            record_saturation(pool, progress).await;
        }
    }

    *progress.status.write().unwrap() = ScanStatus::Complete;
    let analyzed = progress.analyzed.load(Ordering::Relaxed);
    let validated = progress.validated.load(Ordering::Relaxed);
    info!(analyzed, validated, "Wallet scan complete");
}

/// Record today's crowding snapshot: how many validated wallets run each
/// strategy, and at what combined volume.
async fn record_saturation(pool: &SqlitePool, progress: &ScanProgress) {
    let mut per_strategy: HashMap<&'static str, (i64, f64)> = HashMap::new();
    {
        let results = progress.results.read().unwrap();
        for report in results.iter().filter(|r| r.validation.is_valid) {
            let entry = per_strategy
                .entry(report.analysis.strategy.label())
                .or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += report.analysis.total_volume;
        }
    }

    let day = chrono::Utc::now().format("%Y-%m-%d").to_string();
    let repo = SaturationRepository::new(pool);
    for (strategy, (wallets, volume)) in per_strategy {
        if let Err(e) = repo.record_snapshot(strategy, &day, wallets, volume).await {
            warn!(strategy, error = %e, "Failed to record saturation snapshot");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn make_raw_trade(side: &str, ts: f64, condition_id: &str) -> WalletTrade {
        WalletTrade {
            condition_id: Some(condition_id.to_string()),
            title: Some("Will the Chiefs win the Super Bowl?".to_string()),
            event_slug: Some("nfl-super-bowl-2026".to_string()),
            side: Some(side.to_string()),
            outcome: Some("Yes".to_string()),
            outcome_index: Some(0.0),
            size: Some(100.0),
            price: Some(0.55),
            timestamp: Some(ts),
            maker_address: Some("0xother".to_string()),
            transaction_hash: Some("0xdeadbeef".to_string()),
        }
    }

    fn make_core_trade(
        ts: i64,
        market: &str,
        outcome: &str,
        side: TradeSide,
        shares: f64,
        price: f64,
    ) -> Trade {
        Trade {
            timestamp: ts,
            market_id: market.to_string(),
            market_title: "Market".to_string(),
            outcome: outcome.to_string(),
            side,
            shares,
            price,
            value: shares * price,
            is_maker: false,
            market_kind: MarketKind::Binary,
            category: None,
            realized_pnl: None,
            exit_timestamp: None,
        }
    }

    fn make_position(cash_pnl: f64) -> Position {
        Position {
            market_id: Some("cid".to_string()),
            cost_basis: 100.0,
            cash_pnl,
            size: 200.0,
            avg_price: 0.5,
        }
    }

    #[test]
    fn test_convert_trade_maps_fields() {
        let raw = make_raw_trade("BUY", 1_700_000_000.0, "cid1");
        let trade = convert_trade("0xwallet", &raw).unwrap();

        assert_eq!(trade.side, TradeSide::Buy);
        assert_eq!(trade.timestamp, 1_700_000_000);
        assert_eq!(trade.market_id, "cid1");
        assert!((trade.value - 55.0).abs() < 1e-9);
        assert_eq!(trade.market_kind, MarketKind::Binary);
        assert!(!trade.is_maker);
        assert_eq!(trade.category.as_deref(), Some("nfl"));
    }

    #[test]
    fn test_convert_trade_requires_core_fields() {
        let mut raw = make_raw_trade("BUY", 1_700_000_000.0, "cid1");
        raw.side = None;
        assert!(convert_trade("0xwallet", &raw).is_none());

        let mut raw = make_raw_trade("SELL", 1_700_000_000.0, "cid1");
        raw.timestamp = None;
        assert!(convert_trade("0xwallet", &raw).is_none());

        let mut raw = make_raw_trade("BUY", 1_700_000_000.0, "cid1");
        raw.side = Some("MERGE".to_string());
        assert!(convert_trade("0xwallet", &raw).is_none());
    }

    #[test]
    fn test_convert_trade_detects_maker_and_multi() {
        let mut raw = make_raw_trade("BUY", 1_700_000_000.0, "cid1");
        raw.maker_address = Some("0xWALLET".to_string());
        raw.outcome = Some("Chiefs".to_string());

        let trade = convert_trade("0xwallet", &raw).unwrap();
        assert!(trade.is_maker);
        assert_eq!(trade.market_kind, MarketKind::Multi);
    }

    #[test]
    fn test_reconstruct_marks_closed_buys() {
        let trades = vec![
            make_core_trade(1_000, "m1", "Yes", TradeSide::Buy, 100.0, 0.50),
            make_core_trade(2_000, "m1", "Yes", TradeSide::Sell, 100.0, 0.70),
        ];
        let out = reconstruct_closed_positions(trades);

        let buy = &out[0];
        assert_eq!(buy.side, TradeSide::Buy);
        assert!((buy.realized_pnl.unwrap() - 20.0).abs() < 1e-9);
        assert_eq!(buy.exit_timestamp, Some(2_000));
        // The sell itself never gets a realized PnL
        assert!(out[1].realized_pnl.is_none());
    }

    #[test]
    fn test_reconstruct_closes_oldest_buy_first() {
        let trades = vec![
            make_core_trade(1_000, "m1", "Yes", TradeSide::Buy, 100.0, 0.40),
            make_core_trade(2_000, "m1", "Yes", TradeSide::Buy, 100.0, 0.60),
            make_core_trade(3_000, "m1", "Yes", TradeSide::Sell, 100.0, 0.70),
        ];
        let out = reconstruct_closed_positions(trades);

        assert!((out[0].realized_pnl.unwrap() - 30.0).abs() < 1e-9);
        assert!(out[1].realized_pnl.is_none());
    }

    #[test]
    fn test_reconstruct_partial_sell_leaves_buy_open() {
        let trades = vec![
            make_core_trade(1_000, "m1", "Yes", TradeSide::Buy, 100.0, 0.50),
            make_core_trade(2_000, "m1", "Yes", TradeSide::Sell, 40.0, 0.70),
        ];
        let out = reconstruct_closed_positions(trades);
        assert!(out[0].realized_pnl.is_none());
    }

    #[test]
    fn test_reconstruct_respects_outcome_boundaries() {
        // A NO sell must not close a YES buy in the same market
        let trades = vec![
            make_core_trade(1_000, "m1", "Yes", TradeSide::Buy, 100.0, 0.50),
            make_core_trade(2_000, "m1", "No", TradeSide::Sell, 100.0, 0.70),
        ];
        let out = reconstruct_closed_positions(trades);
        assert!(out[0].realized_pnl.is_none());
    }

    #[test]
    fn test_trade_hash_is_stable_and_distinct() {
        let a = make_core_trade(1_000, "m1", "Yes", TradeSide::Buy, 100.0, 0.50);
        let b = make_core_trade(1_000, "m1", "Yes", TradeSide::Buy, 100.0, 0.51);

        assert_eq!(
            compute_trade_hash("0xabc", &a),
            compute_trade_hash("0xabc", &a)
        );
        assert_ne!(
            compute_trade_hash("0xabc", &a),
            compute_trade_hash("0xabc", &b)
        );
        assert_ne!(
            compute_trade_hash("0xabc", &a),
            compute_trade_hash("0xdef", &a)
        );
    }

    #[test]
    fn test_build_profile_win_rate_and_span() {
        let positions = vec![
            make_position(10.0),
            make_position(20.0),
            make_position(5.0),
            make_position(-10.0),
        ];
        let trades = vec![
            make_core_trade(0, "m1", "Yes", TradeSide::Buy, 100.0, 0.50),
            make_core_trade(10 * 86_400, "m2", "Yes", TradeSide::Buy, 100.0, 0.60),
        ];

        let profile = build_profile("0xabc", &positions, &trades, Some(1_234.0));
        assert!((profile.win_rate - 0.75).abs() < 1e-9);
        assert!((profile.active_days - 10.0).abs() < 1e-9);
        assert_eq!(profile.total_trades, 2);
        assert_eq!(profile.markets_traded, 2);
        assert!((profile.total_pnl - 25.0).abs() < 1e-9);
        assert_eq!(profile.portfolio_value, Some(1_234.0));
    }

    #[test]
    fn test_build_profile_single_trade_counts_one_day() {
        let trades = vec![make_core_trade(5_000, "m1", "Yes", TradeSide::Buy, 10.0, 0.5)];
        let profile = build_profile("0xabc", &[], &trades, None);
        assert!((profile.active_days - 1.0).abs() < 1e-9);
        assert_eq!(profile.win_rate, 0.0);
    }

    #[test]
    fn test_build_report_blueprint_requires_validation() {
        // 190 of 200 resolved positions won; trades spread evenly so the
        // consistency chunks all sit near 0.95
        let positions: Vec<Position> = (0..200)
            .map(|i| make_position(if i < 190 { 10.0 } else { -10.0 }))
            .collect();
        let trades: Vec<Trade> = (0..200)
            .map(|i| {
                let mut t = make_core_trade(
                    i as i64 * 3_600,
                    &format!("m{}", i % 20),
                    "Yes",
                    TradeSide::Buy,
                    100.0,
                    0.50,
                );
                t.realized_pnl = Some(if i % 20 == 0 { -5.0 } else { 10.0 });
                t.exit_timestamp = Some(i as i64 * 3_600 + 60);
                t
            })
            .collect();

        let config = ScanConfig::default();
        let now = 200 * 3_600;
        let profile = build_profile("0xstrong", &positions, &trades, None);
        let report = build_report("0xstrong", None, profile, &positions, &trades, &config, now);

        assert!(report.validation.is_valid);
        assert!(report.blueprint.is_some());
        assert!(!report.signals.is_empty());
        assert!(report.alpha_score > 0.0);

        // A weak wallet gets analysis but no blueprint
        let weak_positions: Vec<Position> = (0..60)
            .map(|i| make_position(if i % 2 == 0 { 10.0 } else { -10.0 }))
            .collect();
        let weak_profile = build_profile("0xweak", &weak_positions, &trades, None);
        let weak = build_report(
            "0xweak",
            None,
            weak_profile,
            &weak_positions,
            &trades,
            &config,
            now,
        );
        assert!(!weak.validation.is_valid);
        assert!(weak.blueprint.is_none());
    }

    #[test]
    fn test_report_record_carries_validation_verdict() {
        let positions = vec![make_position(10.0)];
        let trades = vec![make_core_trade(1_000, "m1", "Yes", TradeSide::Buy, 100.0, 0.5)];
        let profile = build_profile("0xabc", &positions, &trades, None);
        let report = build_report(
            "0xabc",
            Some("trader".to_string()),
            profile,
            &positions,
            &trades,
            &ScanConfig::default(),
            2_000,
        );

        let record = report_to_record(&report);
        assert_eq!(record.address, "0xabc");
        assert_eq!(record.user_name.as_deref(), Some("trader"));
        assert!(!record.is_valid);
        assert_eq!(record.confidence_tier, "INSUFFICIENT");
        assert_eq!(record.sample_size, 1);
        assert!(record.signals_json.is_some());
        assert!(record.blueprint_json.is_none());
        assert!(!record.alerted);
    }
}
