//! Strategy archetype classification.
//!
//! A wallet's trade history is reduced to a small set of signals, then run
//! through an ordered cascade of threshold predicates. The first predicate
//! that fires wins; nothing below it is consulted. Classification is pure and
//! deterministic: same trades in, same archetype out, regardless of input
//! order.

use crate::profile;
use crate::stats;
use crate::types::{sorted_by_time, Trade};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Minimum closed trades before classification is attempted at all
pub const MIN_CLOSED_TRADES: usize = 5;

/// Width of the time bucket used to pair YES/NO legs, in seconds
pub const PAIR_WINDOW_SECS: i64 = 300;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Arbitrage,
    MarketMaking,
    Sniper,
    Directional,
    Unknown,
}

impl StrategyKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Arbitrage => "Arbitrage",
            Self::MarketMaking => "Market Making",
            Self::Sniper => "Sniper",
            Self::Directional => "Directional",
            Self::Unknown => "Unknown",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Arbitrage => "#22c55e",
            Self::MarketMaking => "#3b82f6",
            Self::Sniper => "#ef4444",
            Self::Directional => "#f59e0b",
            Self::Unknown => "#6b7280",
        }
    }
}

/// Signals the cascade predicates consume, computed once per classification
#[derive(Debug, Clone, Serialize)]
pub struct CascadeSignals {
    pub total_trades: usize,
    pub closed_trades: usize,
    pub win_rate: f64,
    pub paired_ratio: f64,
    pub avg_hold_secs: f64,
    pub maker_ratio: f64,
    pub two_sided_ratio: f64,
    pub burst_score: f64,
    pub unique_markets: usize,
    pub gini: f64,
}

// ---------------------------------------------------------------------------
// The cascade
// ---------------------------------------------------------------------------

/// Ordered decision table. Earlier rows shadow later ones, so the more
/// specific archetypes must stay on top: a high-win-rate paired-trade wallet
/// is an arbitrageur even if it would also pass the directional test.
const CASCADE: &[(fn(&CascadeSignals) -> bool, StrategyKind)] = &[
    (is_arbitrage, StrategyKind::Arbitrage),
    (is_market_making, StrategyKind::MarketMaking),
    (is_sniper, StrategyKind::Sniper),
    (is_directional, StrategyKind::Directional),
];

fn is_arbitrage(s: &CascadeSignals) -> bool {
    s.win_rate > 0.95 && s.paired_ratio > 0.6 && s.avg_hold_secs < 3600.0
}

fn is_market_making(s: &CascadeSignals) -> bool {
    s.maker_ratio > 0.7 && s.two_sided_ratio > 0.5
}

fn is_sniper(s: &CascadeSignals) -> bool {
    s.burst_score > 0.7 && s.unique_markets > 10
}

fn is_directional(s: &CascadeSignals) -> bool {
    s.gini > 0.5
}

/// Classify a trade history into a strategy archetype
pub fn classify(trades: &[Trade]) -> StrategyKind {
    classify_signals(&compute_signals(trades))
}

/// Run the cascade over precomputed signals
pub fn classify_signals(signals: &CascadeSignals) -> StrategyKind {
    if signals.closed_trades < MIN_CLOSED_TRADES {
        return StrategyKind::Unknown;
    }
    for (predicate, kind) in CASCADE {
        if predicate(signals) {
            return *kind;
        }
    }
    StrategyKind::Unknown
}

/// Compute every signal the cascade consults
pub fn compute_signals(trades: &[Trade]) -> CascadeSignals {
    let sorted = sorted_by_time(trades);
    let timing = profile::analyze_timing(&sorted);
    let concentration = profile::analyze_concentration(&sorted);

    CascadeSignals {
        total_trades: sorted.len(),
        closed_trades: sorted.iter().filter(|t| t.is_closed()).count(),
        win_rate: stats::win_rate(&sorted),
        paired_ratio: paired_trade_ratio(&sorted),
        avg_hold_secs: timing.avg_hold_secs,
        maker_ratio: stats::maker_ratio(&sorted),
        two_sided_ratio: two_sided_ratio(&sorted),
        burst_score: timing.burst_score,
        unique_markets: concentration.unique_markets,
        gini: concentration.gini,
    }
}

// ---------------------------------------------------------------------------
// Pairing signals
// ---------------------------------------------------------------------------

/// Fraction of trades that sit in a (market, 5-minute-bucket) group holding
/// both a YES and a NO leg. Hedged arbitrage legs land in the same bucket;
/// everything else rarely does.
pub fn paired_trade_ratio(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }

    let mut buckets: HashMap<(&str, i64), Vec<&Trade>> = HashMap::new();
    for trade in trades {
        let key = (
            trade.market_id.as_str(),
            trade.timestamp.div_euclid(PAIR_WINDOW_SECS),
        );
        buckets.entry(key).or_default().push(trade);
    }

    let mut paired = 0usize;
    for bucket in buckets.values() {
        if bucket.len() >= 2 {
            let has_yes = bucket.iter().any(|t| t.is_yes());
            let has_no = bucket.iter().any(|t| t.is_no());
            if has_yes && has_no {
                paired += bucket.len();
            }
        }
    }

    paired as f64 / trades.len() as f64
}

/// Fraction of distinct markets where the wallet traded both the YES and the
/// NO outcome at some point
pub fn two_sided_ratio(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }

    let mut sides: HashMap<&str, (bool, bool)> = HashMap::new();
    for trade in trades {
        let entry = sides.entry(trade.market_id.as_str()).or_insert((false, false));
        if trade.is_yes() {
            entry.0 = true;
        }
        if trade.is_no() {
            entry.1 = true;
        }
    }

    let two_sided = sides.values().filter(|(yes, no)| *yes && *no).count();
    two_sided as f64 / sides.len() as f64
}

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

/// How much to trust a classification, in [0, 1].
///
/// Starts from a 0.5 base, rewards sample size, and rewards the
/// archetype-specific signal being far past its threshold. UNKNOWN is always
/// 0: there is nothing to be confident about.
pub fn classification_confidence(signals: &CascadeSignals, kind: StrategyKind) -> f64 {
    if kind == StrategyKind::Unknown {
        return 0.0;
    }

    let mut confidence: f64 = 0.5;

    if signals.total_trades > 100 {
        confidence += 0.2;
    } else if signals.total_trades > 50 {
        confidence += 0.1;
    }

    let strong_signal = match kind {
        StrategyKind::Arbitrage => signals.win_rate > 0.95,
        StrategyKind::MarketMaking => signals.maker_ratio > 0.8,
        _ => false,
    };
    if strong_signal {
        confidence += 0.2;
    }

    confidence.min(1.0)
}
