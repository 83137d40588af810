//! Statistical validation of wallet performance.
//!
//! Three gates run in order and short-circuit: sample size, win-rate
//! significance, temporal consistency. A wallet that fails a gate is never a
//! candidate for alerting or replication, no matter how good its headline
//! numbers look. Failing is a data outcome, not an error.

use crate::stats;
use crate::types::{Position, Trade};
use serde::Serialize;

/// Fewest resolved positions worth testing at all
pub const MIN_SAMPLE: usize = 50;

/// Win-rate p-value must come in under this
pub const SIGNIFICANCE_LEVEL: f64 = 0.01;

/// Chunk-to-chunk win-rate variance above this means the edge comes and goes
pub const MAX_CONSISTENCY_VARIANCE: f64 = 0.03;

/// Raw trade records needed before the consistency test has teeth
pub const CONSISTENCY_MIN_RECORDS: usize = 100;

/// Stand-in variance when the consistency test cannot run
pub const ASSUMED_VARIANCE: f64 = 0.05;

const CONSISTENCY_CHUNKS: usize = 4;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
    Insufficient,
}

impl ConfidenceTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
            Self::Insufficient => "INSUFFICIENT",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub win_rate: f64,
    pub win_rate_p_value: f64,
    pub consistency_variance: f64,
    /// True when the consistency test could not run and the variance above is
    /// the assumed stand-in, not a measurement
    pub variance_assumed: bool,
    /// Resolved positions the verdict is based on
    pub sample_size: usize,
    pub confidence: ConfidenceTier,
    pub rejection_reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a wallet's edge from its resolved positions and raw trade
/// history.
///
/// Positions drive the win-rate gates; the trade records drive the
/// consistency gate, which chunks them in the order they arrive.
pub fn validate_wallet(positions: &[Position], trades: &[Trade]) -> ValidationResult {
    let wins = positions.iter().filter(|p| p.cash_pnl > 0.0).count();
    let losses = positions.iter().filter(|p| p.cash_pnl < 0.0).count();
    let total = wins + losses;

    let win_rate = if total > 0 {
        wins as f64 / total as f64
    } else {
        0.0
    };

    // Gate 1: enough resolved positions to say anything
    if total < MIN_SAMPLE {
        return ValidationResult {
            is_valid: false,
            win_rate,
            win_rate_p_value: 1.0,
            consistency_variance: 1.0,
            variance_assumed: false,
            sample_size: total,
            confidence: ConfidenceTier::Insufficient,
            rejection_reason: Some(format!(
                "Only {total} resolved trades, need {MIN_SAMPLE}+"
            )),
        };
    }

    // Gate 2: the win rate has to beat a coin flip convincingly
    let p_value = stats::binomial_p_value(wins, total, 0.5);
    if p_value >= SIGNIFICANCE_LEVEL {
        return ValidationResult {
            is_valid: false,
            win_rate,
            win_rate_p_value: p_value,
            consistency_variance: 0.0,
            variance_assumed: false,
            sample_size: total,
            confidence: ConfidenceTier::Low,
            rejection_reason: Some(format!("Win rate not significant (p={p_value:.4})")),
        };
    }

    // Gate 3: the edge has to persist across time chunks. With too few raw
    // records the test cannot run; the assumed variance is recorded and
    // flagged so downstream consumers know it was never measured.
    let (consistency_variance, variance_assumed) = if trades.len() >= CONSISTENCY_MIN_RECORDS {
        let variance = chunked_win_rate_variance(trades);
        if variance > MAX_CONSISTENCY_VARIANCE {
            return ValidationResult {
                is_valid: false,
                win_rate,
                win_rate_p_value: p_value,
                consistency_variance: variance,
                variance_assumed: false,
                sample_size: total,
                confidence: ConfidenceTier::Low,
                rejection_reason: Some(format!(
                    "Inconsistent performance (var={variance:.4})"
                )),
            };
        }
        (variance, false)
    } else {
        (ASSUMED_VARIANCE, true)
    };

    ValidationResult {
        is_valid: true,
        win_rate,
        win_rate_p_value: p_value,
        consistency_variance,
        variance_assumed,
        sample_size: total,
        confidence: assign_tier(win_rate, p_value, consistency_variance),
        rejection_reason: None,
    }
}

/// Population variance of per-chunk win rates over four equal contiguous
/// chunks, taken in record order as delivered. The remainder after dividing
/// by four is dropped from the tail.
fn chunked_win_rate_variance(trades: &[Trade]) -> f64 {
    let chunk_size = trades.len() / CONSISTENCY_CHUNKS;
    if chunk_size == 0 {
        return 0.0;
    }

    let mut chunk_rates = Vec::with_capacity(CONSISTENCY_CHUNKS);
    for i in 0..CONSISTENCY_CHUNKS {
        let chunk = &trades[i * chunk_size..(i + 1) * chunk_size];
        let wins = chunk
            .iter()
            .filter(|t| t.realized_pnl.map(|pnl| pnl > 0.0).unwrap_or(false))
            .count();
        chunk_rates.push(wins as f64 / chunk.len() as f64);
    }

    stats::variance(&chunk_rates)
}

fn assign_tier(win_rate: f64, p_value: f64, variance: f64) -> ConfidenceTier {
    if win_rate > 0.90 && p_value < 0.001 && variance < 0.01 {
        ConfidenceTier::High
    } else if win_rate > 0.85 && p_value < 0.01 && variance < 0.02 {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketKind, TradeSide};

    fn make_position(cash_pnl: f64) -> Position {
        Position {
            market_id: Some("cid".into()),
            cost_basis: 100.0,
            cash_pnl,
            size: 200.0,
            avg_price: 0.5,
        }
    }

    fn make_closed_trade(ts: i64, pnl: f64) -> Trade {
        Trade {
            timestamp: ts,
            market_id: "cid".into(),
            market_title: "Market".into(),
            outcome: "Yes".into(),
            side: TradeSide::Buy,
            shares: 100.0,
            price: 0.5,
            value: 50.0,
            is_maker: false,
            market_kind: MarketKind::Binary,
            category: None,
            realized_pnl: Some(pnl),
            exit_timestamp: Some(ts + 60),
        }
    }

    /// `wins` out of `total` positions profitable
    fn positions(wins: usize, total: usize) -> Vec<Position> {
        (0..total)
            .map(|i| make_position(if i < wins { 10.0 } else { -10.0 }))
            .collect()
    }

    #[test]
    fn test_rejects_small_sample() {
        let result = validate_wallet(&positions(28, 30), &[]);

        assert!(!result.is_valid);
        assert_eq!(result.confidence, ConfidenceTier::Insufficient);
        assert_eq!(result.sample_size, 30);
        assert_eq!(
            result.rejection_reason.as_deref(),
            Some("Only 30 resolved trades, need 50+")
        );
    }

    #[test]
    fn test_breakeven_positions_do_not_count() {
        let mut pos = positions(40, 45);
        for _ in 0..20 {
            pos.push(make_position(0.0));
        }
        let result = validate_wallet(&pos, &[]);

        // 45 resolved, 20 breakeven ignored
        assert_eq!(result.sample_size, 45);
        assert_eq!(result.confidence, ConfidenceTier::Insufficient);
    }

    #[test]
    fn test_rejects_insignificant_win_rate() {
        // 55% over 60 trades is noise
        let result = validate_wallet(&positions(33, 60), &[]);

        assert!(!result.is_valid);
        assert_eq!(result.confidence, ConfidenceTier::Low);
        assert!(result
            .rejection_reason
            .as_deref()
            .unwrap()
            .starts_with("Win rate not significant"));
    }

    #[test]
    fn test_accepts_strong_consistent_wallet() {
        // 190/200 winners, wins spread evenly so each chunk sits near 0.95
        let pos = positions(190, 200);
        let trades: Vec<Trade> = (0..200)
            .map(|i| {
                let pnl = if i % 20 == 0 { -5.0 } else { 10.0 };
                make_closed_trade(i as i64 * 3600, pnl)
            })
            .collect();
        let result = validate_wallet(&pos, &trades);

        assert!(result.is_valid);
        assert_eq!(result.confidence, ConfidenceTier::High);
        assert!(result.win_rate_p_value < 1e-6);
        assert!(!result.variance_assumed);
        assert!(result.consistency_variance < 0.01);
        assert!(result.rejection_reason.is_none());
    }

    #[test]
    fn test_rejects_inconsistent_performance() {
        // Hot first half, cold second half: chunk variance blows past 0.03
        let pos = positions(70, 100);
        let trades: Vec<Trade> = (0..200)
            .map(|i| {
                let pnl = if i < 100 { 10.0 } else { -5.0 };
                make_closed_trade(i as i64 * 3600, pnl)
            })
            .collect();
        let result = validate_wallet(&pos, &trades);

        assert!(!result.is_valid);
        assert_eq!(result.confidence, ConfidenceTier::Low);
        assert!(!result.variance_assumed);
        assert!(result
            .rejection_reason
            .as_deref()
            .unwrap()
            .starts_with("Inconsistent performance"));
    }

    #[test]
    fn test_assumed_variance_is_flagged_and_passes() {
        // Enough positions to gate on, too few trade records to chunk
        let pos = positions(55, 60);
        let trades: Vec<Trade> = (0..80)
            .map(|i| make_closed_trade(i as i64 * 3600, 10.0))
            .collect();
        let result = validate_wallet(&pos, &trades);

        assert!(result.is_valid);
        assert!(result.variance_assumed);
        assert_eq!(result.consistency_variance, ASSUMED_VARIANCE);
        // Assumed variance can never reach HIGH or MEDIUM
        assert_eq!(result.confidence, ConfidenceTier::Low);
    }

    #[test]
    fn test_consistency_gate_keeps_delivered_order() {
        // Every record-order chunk sits at 0.9; the losses carry the latest
        // timestamps, so chunking a time-sorted copy would cluster them into
        // the final chunk and fail the gate
        let pos = positions(180, 200);
        let trades: Vec<Trade> = (0..200)
            .map(|i| {
                let win = i % 10 != 0;
                let ts = if win { i as i64 * 60 } else { 1_000_000 + i as i64 };
                make_closed_trade(ts, if win { 10.0 } else { -5.0 })
            })
            .collect();
        let result = validate_wallet(&pos, &trades);

        assert!(result.is_valid);
        assert!(result.consistency_variance < 1e-9);
    }

    #[test]
    fn test_chunk_variance_uses_record_order_not_timestamps() {
        // Wins and losses alternate in record order, so every chunk sits at
        // exactly 0.5. The timestamps group all wins before all losses; a
        // time-sorted chunking would report 0.25 instead.
        let trades: Vec<Trade> = (0..200)
            .map(|i| {
                let win = i % 2 == 0;
                let ts = if win { i as i64 } else { 1_000_000 + i as i64 };
                make_closed_trade(ts, if win { 10.0 } else { -5.0 })
            })
            .collect();
        assert_eq!(chunked_win_rate_variance(&trades), 0.0);
    }

    #[test]
    fn test_chunk_variance_drops_remainder() {
        // 102 trades: chunks of 25, last two trades ignored
        let trades: Vec<Trade> = (0..102)
            .map(|i| make_closed_trade(i as i64 * 3600, 10.0))
            .collect();
        assert_eq!(chunked_win_rate_variance(&trades), 0.0);
    }
}
