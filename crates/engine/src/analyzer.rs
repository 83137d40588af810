//! Composite wallet analysis: classification plus performance, risk, and
//! replicability scoring in one pass.

use crate::classifier::{self, StrategyKind};
use crate::profile::{self, ConcentrationMetrics, SizingAnalysis, TimingAnalysis};
use crate::stats;
use crate::types::{sorted_by_time, Trade};
use serde::Serialize;

/// Annualization factor for the Sharpe ratio, treating each closed trade as
/// one daily observation
const SHARPE_ANNUALIZATION: f64 = 252.0;

/// Per-trade edge caps. Arbitrage and market-making returns above these are
/// almost always settlement artifacts, not real edge.
const ARBITRAGE_EDGE_CAP: f64 = 5.0;
const MARKET_MAKING_EDGE_CAP: f64 = 3.0;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything the scanner knows about one wallet's behavior
#[derive(Debug, Clone, Serialize)]
pub struct WalletAnalysis {
    pub strategy: StrategyKind,
    /// Classification confidence in [0, 1]; 0 for UNKNOWN
    pub confidence: f64,
    pub total_trades: usize,
    pub closed_trades: usize,
    pub win_rate: f64,
    /// Average per-trade return in percent, capped per archetype
    pub edge_estimate: f64,
    pub sharpe_ratio: f64,
    pub maker_taker_ratio: f64,
    pub total_volume: f64,
    pub total_pnl: f64,
    pub profit_acceleration: f64,
    pub unique_markets: usize,
    pub timing: TimingAnalysis,
    pub sizing: SizingAnalysis,
    pub concentration: ConcentrationMetrics,
    /// 0 (safe) to 10 (reckless)
    pub risk_score: f64,
    /// 0 (forget it) to 1 (copyable), floored at 0.1
    pub replicability_score: f64,
}

/// Analyzes trade histories. Below `min_trades` the verdict is always
/// UNKNOWN with zero confidence; the descriptive metrics are still filled in
/// from whatever data exists.
#[derive(Debug, Clone, Copy)]
pub struct WalletAnalyzer {
    min_trades: usize,
}

impl Default for WalletAnalyzer {
    fn default() -> Self {
        Self { min_trades: 10 }
    }
}

impl WalletAnalyzer {
    pub fn new(min_trades: usize) -> Self {
        Self { min_trades }
    }

    pub fn analyze(&self, trades: &[Trade]) -> WalletAnalysis {
        let sorted = sorted_by_time(trades);

        let timing = profile::analyze_timing(&sorted);
        let sizing = profile::analyze_sizing(&sorted);
        let concentration = profile::analyze_concentration(&sorted);
        let win_rate = stats::win_rate(&sorted);

        let (strategy, confidence) = if sorted.len() < self.min_trades {
            (StrategyKind::Unknown, 0.0)
        } else {
            let signals = classifier::compute_signals(&sorted);
            let kind = classifier::classify_signals(&signals);
            (kind, classifier::classification_confidence(&signals, kind))
        };

        WalletAnalysis {
            strategy,
            confidence,
            total_trades: sorted.len(),
            closed_trades: sorted.iter().filter(|t| t.is_closed()).count(),
            win_rate,
            edge_estimate: edge_estimate(&sorted, strategy),
            sharpe_ratio: sharpe_ratio(&sorted),
            maker_taker_ratio: stats::maker_ratio(&sorted),
            total_volume: sorted.iter().map(|t| t.value).sum(),
            total_pnl: sorted.iter().filter_map(|t| t.realized_pnl).sum(),
            profit_acceleration: profile::profit_acceleration(&sorted),
            unique_markets: concentration.unique_markets,
            risk_score: risk_score(strategy, win_rate, &sizing, concentration.gini),
            replicability_score: replicability_score(
                strategy,
                &sizing,
                timing.burst_score,
                concentration.unique_markets,
            ),
            timing,
            sizing,
            concentration,
        }
    }
}

// ---------------------------------------------------------------------------
// Performance metrics
// ---------------------------------------------------------------------------

/// Annualized Sharpe over per-trade returns (realized P&L relative to
/// stake). Needs two closed trades and nonzero return variance; otherwise 0.
fn sharpe_ratio(trades: &[Trade]) -> f64 {
    let returns: Vec<f64> = trades
        .iter()
        .filter(|t| t.value > 0.0)
        .filter_map(|t| t.realized_pnl.map(|pnl| pnl / t.value))
        .collect();
    if returns.len() < 2 {
        return 0.0;
    }

    let std = stats::std_dev(&returns);
    // Near-zero, not exactly zero: identical returns still leave the mean
    // off by an ulp, and dividing by that residual produces absurd ratios
    if std < 1e-12 {
        return 0.0;
    }
    stats::mean(&returns) / std * SHARPE_ANNUALIZATION.sqrt()
}

/// Average per-trade return in percent. Hedged and inventory-driven
/// archetypes are capped; their raw averages overstate repeatable edge.
fn edge_estimate(trades: &[Trade], strategy: StrategyKind) -> f64 {
    let returns: Vec<f64> = trades
        .iter()
        .filter(|t| t.value > 0.0)
        .filter_map(|t| t.realized_pnl.map(|pnl| pnl / t.value))
        .collect();
    if returns.is_empty() {
        return 0.0;
    }

    let pct = stats::mean(&returns) * 100.0;
    match strategy {
        StrategyKind::Arbitrage => pct.min(ARBITRAGE_EDGE_CAP),
        StrategyKind::MarketMaking => pct.min(MARKET_MAKING_EDGE_CAP),
        _ => pct,
    }
}

// ---------------------------------------------------------------------------
// Risk and replicability
// ---------------------------------------------------------------------------

fn risk_score(
    strategy: StrategyKind,
    win_rate: f64,
    sizing: &SizingAnalysis,
    gini: f64,
) -> f64 {
    let cv = if sizing.avg_size > 0.0 {
        sizing.size_variance.sqrt() / sizing.avg_size
    } else {
        0.0
    };

    let mut risk = (cv * 3.0).min(3.0);
    risk += (1.0 - win_rate) * 3.0;
    risk += (gini * 2.0).min(2.0);
    risk += match strategy {
        StrategyKind::Arbitrage => 0.5,
        StrategyKind::MarketMaking => 1.0,
        StrategyKind::Sniper => 1.5,
        StrategyKind::Directional => 2.0,
        StrategyKind::Unknown => 2.0,
    };
    risk.min(10.0)
}

/// How realistic it is to copy this wallet. Rule-based, stably sized,
/// diversified behavior scores high; opaque behavior scores low.
fn replicability_score(
    strategy: StrategyKind,
    sizing: &SizingAnalysis,
    burst_score: f64,
    unique_markets: usize,
) -> f64 {
    let mut score: f64 = match strategy {
        StrategyKind::Arbitrage => 0.7,
        StrategyKind::MarketMaking => 0.5,
        StrategyKind::Sniper => 0.8,
        StrategyKind::Directional => 0.6,
        StrategyKind::Unknown => 0.2,
    };

    let cv = if sizing.avg_size > 0.0 {
        sizing.size_variance.sqrt() / sizing.avg_size
    } else {
        0.0
    };
    if cv < 0.3 {
        score += 0.1;
    }
    if burst_score < 0.3 {
        score += 0.1;
    }
    if unique_markets > 20 {
        score += 0.1;
    }

    score.clamp(0.1, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketKind, TradeSide};

    fn make_trade(ts: i64, market: &str, outcome: &str, value: f64, pnl: Option<f64>) -> Trade {
        Trade {
            timestamp: ts,
            market_id: market.into(),
            market_title: format!("Market {market}"),
            outcome: outcome.into(),
            side: TradeSide::Buy,
            shares: value * 2.0,
            price: 0.5,
            value,
            is_maker: false,
            market_kind: MarketKind::Binary,
            category: None,
            realized_pnl: pnl,
            exit_timestamp: pnl.map(|_| ts + 600),
        }
    }

    fn arbitrage_history(pnl_per_leg: f64) -> Vec<Trade> {
        let mut trades = Vec::new();
        for pair in 0..50i64 {
            let market = format!("m{}", pair % 10);
            let ts = pair * 7200;
            trades.push(make_trade(ts, &market, "Yes", 90.0, Some(pnl_per_leg)));
            trades.push(make_trade(ts + 30, &market, "No", 100.0, Some(pnl_per_leg)));
        }
        trades
    }

    #[test]
    fn test_below_min_trades_is_unknown() {
        let trades: Vec<Trade> = (0..9)
            .map(|i| make_trade(i * 100, "m1", "Yes", 50.0, Some(10.0)))
            .collect();
        let analysis = WalletAnalyzer::default().analyze(&trades);

        assert_eq!(analysis.strategy, StrategyKind::Unknown);
        assert_eq!(analysis.confidence, 0.0);
        // Descriptive metrics still populated
        assert_eq!(analysis.total_trades, 9);
        assert!((analysis.win_rate - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_arbitrage_analysis_end_to_end() {
        let analysis = WalletAnalyzer::default().analyze(&arbitrage_history(2.0));

        assert_eq!(analysis.strategy, StrategyKind::Arbitrage);
        assert!((analysis.confidence - 0.8).abs() < 1e-9);
        assert_eq!(analysis.total_trades, 100);
        assert_eq!(analysis.unique_markets, 10);
        assert!((analysis.total_pnl - 200.0).abs() < 1e-9);
        assert!(analysis.risk_score < 3.0, "hedged arb should score low risk");
        assert!(analysis.replicability_score >= 0.7);
    }

    #[test]
    fn test_edge_capped_for_arbitrage() {
        // ~21% per-leg returns get capped at the arbitrage ceiling
        let analysis = WalletAnalyzer::default().analyze(&arbitrage_history(20.0));
        assert_eq!(analysis.strategy, StrategyKind::Arbitrage);
        assert!((analysis.edge_estimate - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_sharpe_zero_on_constant_returns() {
        // Same stake, same P&L every time: zero variance
        let trades: Vec<Trade> = (0..20)
            .map(|i| make_trade(i * 1000, "m1", "Yes", 100.0, Some(5.0)))
            .collect();
        let analysis = WalletAnalyzer::default().analyze(&trades);
        assert_eq!(analysis.sharpe_ratio, 0.0);
    }

    #[test]
    fn test_risk_score_bounds_and_ordering() {
        let safe = WalletAnalyzer::default().analyze(&arbitrage_history(2.0));

        // Concentrated, half-losing, erratically sized directional book
        let mut risky_trades = Vec::new();
        for i in 0..30i64 {
            let pnl = if i % 2 == 0 { -40.0 } else { 10.0 };
            let value = if i % 3 == 0 { 2000.0 } else { 50.0 };
            risky_trades.push(make_trade(i * 40_000, "whale", "Yes", value, Some(pnl)));
        }
        for i in 0..3i64 {
            risky_trades.push(make_trade(
                2_000_000 + i * 40_000,
                &format!("s{i}"),
                "Yes",
                10.0,
                Some(-5.0),
            ));
        }
        let risky = WalletAnalyzer::default().analyze(&risky_trades);

        assert!((0.0..=10.0).contains(&safe.risk_score));
        assert!((0.0..=10.0).contains(&risky.risk_score));
        assert!(risky.risk_score > safe.risk_score);
    }

    #[test]
    fn test_replicability_bounds() {
        let analysis = WalletAnalyzer::default().analyze(&arbitrage_history(2.0));
        assert!((0.1..=1.0).contains(&analysis.replicability_score));

        let sparse = WalletAnalyzer::default().analyze(&[]);
        assert_eq!(sparse.strategy, StrategyKind::Unknown);
        assert!(sparse.replicability_score >= 0.1);
    }
}
