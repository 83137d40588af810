//! Alpha signal detection.
//!
//! Six independent detectors look for anomalies in a wallet's recent record.
//! Each either fires with a strength in [0, 1] or stays silent; a weighted
//! combination of whatever fired becomes the wallet's composite alpha score.
//! Detectors take an explicit `now` so results are reproducible.

use crate::stats;
use crate::types::{sorted_by_time, Trade, WalletProfile};
use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

const SEVEN_DAYS: i64 = 7 * 86_400;
const THIRTY_DAYS: i64 = 30 * 86_400;

/// Recent profit must exceed this multiple of the trailing baseline
pub const PROFIT_SPIKE_MULTIPLIER: f64 = 3.0;
pub const WIN_RATE_THRESHOLD: f64 = 0.90;
pub const WIN_RATE_MIN_TRADES: usize = 100;
pub const NEW_WALLET_MAX_AGE_DAYS: f64 = 60.0;
pub const NEW_WALLET_MIN_PROFIT: f64 = 10_000.0;
pub const SPECIALIST_THRESHOLD: f64 = 0.80;
pub const FREQUENCY_MULTIPLIER: f64 = 5.0;
pub const CONSISTENT_MIN_DAYS: usize = 7;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The closed set of detectable signals. Adding a variant forces a decision
/// on its weight below; the compiler will not let one exist without the
/// other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalKind {
    ProfitSpike,
    WinRateAnomaly,
    RapidGrowth,
    MarketSpecialist,
    FrequencySpike,
    ConsistentEdge,
}

impl SignalKind {
    /// Reliability weight used in the composite score. Statistically
    /// validated anomalies count for more than velocity heuristics.
    pub fn weight(&self) -> f64 {
        match self {
            Self::WinRateAnomaly => 0.25,
            Self::ConsistentEdge => 0.20,
            Self::ProfitSpike => 0.20,
            Self::RapidGrowth => 0.15,
            Self::FrequencySpike => 0.10,
            Self::MarketSpecialist => 0.10,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ProfitSpike => "PROFIT_SPIKE",
            Self::WinRateAnomaly => "WIN_RATE_ANOMALY",
            Self::RapidGrowth => "RAPID_GROWTH",
            Self::MarketSpecialist => "MARKET_SPECIALIST",
            Self::FrequencySpike => "FREQUENCY_SPIKE",
            Self::ConsistentEdge => "CONSISTENT_EDGE",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum SignalError {
    #[error("signal strength must be a finite value in [0, 1], got {0}")]
    InvalidStrength(f64),
}

/// A detected anomaly with supporting evidence
#[derive(Debug, Clone, Serialize)]
pub struct Signal {
    pub kind: SignalKind,
    pub strength: f64,
    pub description: String,
    pub evidence: Value,
    pub detected_at: i64,
}

impl Signal {
    pub fn new(
        kind: SignalKind,
        strength: f64,
        description: impl Into<String>,
        evidence: Value,
        detected_at: i64,
    ) -> Result<Self, SignalError> {
        if !strength.is_finite() || !(0.0..=1.0).contains(&strength) {
            return Err(SignalError::InvalidStrength(strength));
        }
        Ok(Self {
            kind,
            strength,
            description: description.into(),
            evidence,
            detected_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Run every detector over a wallet, strongest signals first
pub fn detect_signals(
    profile: &WalletProfile,
    trades: &[Trade],
    now: i64,
) -> Result<Vec<Signal>, SignalError> {
    let sorted = sorted_by_time(trades);

    let mut signals = Vec::new();
    if let Some(s) = profit_spike(&sorted, now)? {
        signals.push(s);
    }
    if let Some(s) = win_rate_anomaly(profile.win_rate, profile.total_trades, now)? {
        signals.push(s);
    }
    if let Some(s) = rapid_growth(profile, now)? {
        signals.push(s);
    }
    if let Some(s) = market_specialist(&sorted, now)? {
        signals.push(s);
    }
    if let Some(s) = frequency_spike(&sorted, now)? {
        signals.push(s);
    }
    if let Some(s) = consistent_edge(&sorted, now)? {
        signals.push(s);
    }

    signals.sort_by(|a, b| {
        b.strength
            .partial_cmp(&a.strength)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(signals)
}

/// Recent 7-day profit against the trailing 23-day baseline
pub fn profit_spike(trades: &[Trade], now: i64) -> Result<Option<Signal>, SignalError> {
    if trades.len() < 10 {
        return Ok(None);
    }

    let week_ago = now - SEVEN_DAYS;
    let month_ago = now - THIRTY_DAYS;

    let recent: f64 = trades
        .iter()
        .filter(|t| t.timestamp >= week_ago)
        .filter_map(|t| t.realized_pnl)
        .sum();
    let baseline: Vec<f64> = trades
        .iter()
        .filter(|t| t.timestamp >= month_ago && t.timestamp < week_ago)
        .filter_map(|t| t.realized_pnl)
        .collect();
    if baseline.is_empty() {
        return Ok(None);
    }

    let baseline_total: f64 = baseline.iter().sum();
    let expected = baseline_total / 23.0 * 7.0;
    let ratio = if expected > 0.0 { recent / expected } else { 1.0 };
    if ratio < PROFIT_SPIKE_MULTIPLIER {
        return Ok(None);
    }

    let strength = ((ratio - PROFIT_SPIKE_MULTIPLIER) / 6.0 + 0.7).min(1.0);
    Ok(Some(Signal::new(
        SignalKind::ProfitSpike,
        strength,
        format!("7-day profit ${recent:.2} is {ratio:.1}x the trailing average"),
        json!({
            "recent_7d_profit": recent,
            "expected_7d_profit": expected,
            "spike_ratio": ratio,
            "threshold": PROFIT_SPIKE_MULTIPLIER,
        }),
        now,
    )?))
}

/// Win rate too good to be luck, by binomial test against a coin flip
pub fn win_rate_anomaly(
    win_rate: f64,
    trade_count: usize,
    now: i64,
) -> Result<Option<Signal>, SignalError> {
    if trade_count < WIN_RATE_MIN_TRADES || win_rate < WIN_RATE_THRESHOLD {
        return Ok(None);
    }

    let wins = (win_rate * trade_count as f64) as usize;
    let p_value = stats::binomial_p_value(wins, trade_count, 0.5);
    if p_value >= 0.01 {
        return Ok(None);
    }

    let strength = (0.5 - p_value.log10() / 10.0).min(1.0);
    Ok(Some(Signal::new(
        SignalKind::WinRateAnomaly,
        strength,
        format!(
            "{:.1}% win rate over {} trades (p={:.2e})",
            win_rate * 100.0,
            trade_count,
            p_value
        ),
        json!({ "win_rate": win_rate, "trade_count": trade_count, "p_value": p_value }),
        now,
    )?))
}

/// Young wallet, outsized profit
pub fn rapid_growth(
    profile: &WalletProfile,
    now: i64,
) -> Result<Option<Signal>, SignalError> {
    let first_seen = match profile.first_seen {
        Some(ts) => ts,
        None => return Ok(None),
    };

    let age_days = ((now - first_seen) / 86_400).max(0) as f64;
    if age_days >= NEW_WALLET_MAX_AGE_DAYS || profile.total_pnl < NEW_WALLET_MIN_PROFIT {
        return Ok(None);
    }

    let daily = profile.total_pnl / age_days.max(1.0);
    let profit_score = (profile.total_pnl / (NEW_WALLET_MIN_PROFIT * 5.0)).min(1.0);
    let recency_score = 1.0 - age_days / NEW_WALLET_MAX_AGE_DAYS;
    let strength = (profit_score + recency_score) / 2.0;

    Ok(Some(Signal::new(
        SignalKind::RapidGrowth,
        strength,
        format!(
            "${:.2} profit in {} days (${:.2}/day)",
            profile.total_pnl, age_days as i64, daily
        ),
        json!({
            "total_pnl": profile.total_pnl,
            "age_days": age_days,
            "daily_rate": daily,
        }),
        now,
    )?))
}

/// Most volume concentrated in one market category
pub fn market_specialist(trades: &[Trade], now: i64) -> Result<Option<Signal>, SignalError> {
    if trades.is_empty() {
        return Ok(None);
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for trade in trades {
        let category = trade.category.as_deref().unwrap_or("unknown");
        *counts.entry(category).or_insert(0) += 1;
    }

    let (category, count) = counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(c, n)| (*c, *n))
        .unwrap_or(("unknown", 0));
    let concentration = count as f64 / trades.len() as f64;
    if concentration < SPECIALIST_THRESHOLD {
        return Ok(None);
    }

    let strength = (0.5 + (concentration - SPECIALIST_THRESHOLD) * 2.5).min(1.0);
    Ok(Some(Signal::new(
        SignalKind::MarketSpecialist,
        strength,
        format!(
            "{:.1}% of trades in '{}' markets",
            concentration * 100.0,
            category
        ),
        json!({ "category": category, "concentration": concentration }),
        now,
    )?))
}

/// Trading velocity jumped against the trailing baseline
pub fn frequency_spike(trades: &[Trade], now: i64) -> Result<Option<Signal>, SignalError> {
    if trades.len() < 20 {
        return Ok(None);
    }

    let week_ago = now - SEVEN_DAYS;
    let month_ago = now - THIRTY_DAYS;

    let recent = trades.iter().filter(|t| t.timestamp >= week_ago).count();
    let baseline = trades
        .iter()
        .filter(|t| t.timestamp >= month_ago && t.timestamp < week_ago)
        .count();
    if baseline == 0 {
        return Ok(None);
    }

    let recent_rate = recent as f64 / 7.0;
    let baseline_rate = baseline as f64 / 23.0;
    let ratio = recent_rate / baseline_rate;
    if ratio < FREQUENCY_MULTIPLIER {
        return Ok(None);
    }

    let strength = (0.5 + (ratio - FREQUENCY_MULTIPLIER) / 10.0).min(1.0);
    Ok(Some(Signal::new(
        SignalKind::FrequencySpike,
        strength,
        format!("Trading velocity up {ratio:.1}x ({recent_rate:.1} trades/day)"),
        json!({
            "recent_per_day": recent_rate,
            "baseline_per_day": baseline_rate,
            "ratio": ratio,
        }),
        now,
    )?))
}

/// A long unbroken run of profitable days
pub fn consistent_edge(trades: &[Trade], now: i64) -> Result<Option<Signal>, SignalError> {
    let mut daily: HashMap<NaiveDate, f64> = HashMap::new();
    for trade in trades {
        if let (Some(dt), Some(pnl)) = (DateTime::from_timestamp(trade.timestamp, 0), trade.realized_pnl)
        {
            *daily.entry(dt.date_naive()).or_insert(0.0) += pnl;
        }
    }
    if daily.len() < CONSISTENT_MIN_DAYS {
        return Ok(None);
    }

    let mut days: Vec<(NaiveDate, f64)> = daily.into_iter().collect();
    days.sort_by_key(|(date, _)| *date);

    let mut best_len = 0usize;
    let mut best_profit = 0.0f64;
    let mut run_len = 0usize;
    let mut run_profit = 0.0f64;
    for (_, profit) in &days {
        if *profit > 0.0 {
            run_len += 1;
            run_profit += profit;
            if run_len > best_len {
                best_len = run_len;
                best_profit = run_profit;
            }
        } else {
            run_len = 0;
            run_profit = 0.0;
        }
    }

    if best_len < CONSISTENT_MIN_DAYS {
        return Ok(None);
    }

    let strength = (0.5 + (best_len as f64 - CONSISTENT_MIN_DAYS as f64) / 14.0).min(1.0);
    Ok(Some(Signal::new(
        SignalKind::ConsistentEdge,
        strength,
        format!("{best_len} consecutive profitable days (${best_profit:.2} total)"),
        json!({ "streak_days": best_len, "streak_profit": best_profit }),
        now,
    )?))
}

// ---------------------------------------------------------------------------
// Composite score
// ---------------------------------------------------------------------------

/// Weighted blend of detected signal strengths plus a diversity bonus,
/// capped at 1.0. No signals means no alpha.
pub fn alpha_score(signals: &[Signal]) -> f64 {
    if signals.is_empty() {
        return 0.0;
    }

    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for signal in signals {
        let w = signal.kind.weight();
        weighted += signal.strength * w;
        total_weight += w;
    }
    let base = weighted / total_weight;

    let unique: HashSet<SignalKind> = signals.iter().map(|s| s.kind).collect();
    let diversity_bonus = ((unique.len() as f64 - 1.0) * 0.05).min(0.15);

    (base + diversity_bonus).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketKind, TradeSide};

    const NOW: i64 = 40 * 86_400;

    fn make_trade(ts: i64, category: &str, pnl: Option<f64>) -> Trade {
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
            category: Some(category.into()),
            realized_pnl: pnl,
            exit_timestamp: pnl.map(|_| ts + 60),
        }
    }

    fn make_signal(kind: SignalKind, strength: f64) -> Signal {
        Signal::new(kind, strength, "test", json!({}), NOW).unwrap()
    }

    #[test]
    fn test_signal_rejects_bad_strength() {
        let err = Signal::new(SignalKind::ProfitSpike, 1.2, "x", json!({}), NOW);
        assert_eq!(err.unwrap_err(), SignalError::InvalidStrength(1.2));
        assert!(Signal::new(SignalKind::ProfitSpike, f64::NAN, "x", json!({}), NOW).is_err());
        assert!(Signal::new(SignalKind::ProfitSpike, 0.0, "x", json!({}), NOW).is_ok());
    }

    #[test]
    fn test_weights_cover_all_kinds() {
        let kinds = [
            SignalKind::ProfitSpike,
            SignalKind::WinRateAnomaly,
            SignalKind::RapidGrowth,
            SignalKind::MarketSpecialist,
            SignalKind::FrequencySpike,
            SignalKind::ConsistentEdge,
        ];
        let total: f64 = kinds.iter().map(|k| k.weight()).sum();
        assert!((total - 1.0).abs() < 1e-9);
        assert!((SignalKind::WinRateAnomaly.weight() - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_alpha_empty_is_zero() {
        assert_eq!(alpha_score(&[]), 0.0);
    }

    #[test]
    fn test_alpha_diversity_bonus() {
        let one_kind = vec![make_signal(SignalKind::ProfitSpike, 0.8)];
        let four_kinds = vec![
            make_signal(SignalKind::ProfitSpike, 0.8),
            make_signal(SignalKind::WinRateAnomaly, 0.8),
            make_signal(SignalKind::RapidGrowth, 0.8),
            make_signal(SignalKind::ConsistentEdge, 0.8),
        ];

        let single = alpha_score(&one_kind);
        let diverse = alpha_score(&four_kinds);
        assert!((single - 0.8).abs() < 1e-9);
        assert!((diverse - 0.95).abs() < 1e-9);
        assert!(diverse > single);
    }

    #[test]
    fn test_alpha_caps_at_one() {
        let signals: Vec<Signal> = [
            SignalKind::ProfitSpike,
            SignalKind::WinRateAnomaly,
            SignalKind::RapidGrowth,
            SignalKind::MarketSpecialist,
            SignalKind::FrequencySpike,
            SignalKind::ConsistentEdge,
        ]
        .into_iter()
        .map(|k| make_signal(k, 1.0))
        .collect();
        assert_eq!(alpha_score(&signals), 1.0);
    }

    #[test]
    fn test_win_rate_anomaly_gates() {
        // Under the trade floor: silent no matter how good the rate
        assert!(win_rate_anomaly(0.95, 50, NOW).unwrap().is_none());
        // Under the rate floor
        assert!(win_rate_anomaly(0.85, 200, NOW).unwrap().is_none());

        let signal = win_rate_anomaly(0.95, 200, NOW).unwrap().unwrap();
        assert_eq!(signal.kind, SignalKind::WinRateAnomaly);
        assert!(signal.strength >= 0.7);
    }

    #[test]
    fn test_profit_spike_detection() {
        let mut trades = Vec::new();
        // Baseline: $10/trade spread over days 8-27
        for day in 8..28 {
            trades.push(make_trade(NOW - day * 86_400, "nfl", Some(10.0)));
        }
        // Recent week: five $100 wins
        for i in 0..5 {
            trades.push(make_trade(NOW - i * 86_400, "nfl", Some(100.0)));
        }

        let signal = profit_spike(&trades, NOW).unwrap().unwrap();
        assert_eq!(signal.kind, SignalKind::ProfitSpike);
        assert_eq!(signal.strength, 1.0);
    }

    #[test]
    fn test_profit_spike_silent_without_baseline() {
        let trades: Vec<Trade> = (0..12)
            .map(|i| make_trade(NOW - i * 3600, "nfl", Some(50.0)))
            .collect();
        assert!(profit_spike(&trades, NOW).unwrap().is_none());
    }

    #[test]
    fn test_frequency_spike_detection() {
        let mut trades = Vec::new();
        // One trade a day through the baseline window
        for day in 8..31 {
            trades.push(make_trade(NOW - day * 86_400, "nfl", None));
        }
        // Fifty trades in the recent week
        for i in 0..50 {
            trades.push(make_trade(NOW - 86_400 - i * 600, "nfl", None));
        }

        let signal = frequency_spike(&trades, NOW).unwrap().unwrap();
        assert_eq!(signal.kind, SignalKind::FrequencySpike);
        assert!(signal.strength >= 0.5);
    }

    #[test]
    fn test_market_specialist_detection() {
        let mut trades: Vec<Trade> = (0..9)
            .map(|i| make_trade(NOW - i * 3600, "nfl", None))
            .collect();
        trades.push(make_trade(NOW - 10 * 3600, "politics", None));

        let signal = market_specialist(&trades, NOW).unwrap().unwrap();
        assert!((signal.strength - 0.75).abs() < 1e-9);
        assert!(signal.description.contains("nfl"));

        // 50/50 split stays silent
        let mixed: Vec<Trade> = (0..10)
            .map(|i| make_trade(NOW - i * 3600, if i % 2 == 0 { "nfl" } else { "nba" }, None))
            .collect();
        assert!(market_specialist(&mixed, NOW).unwrap().is_none());
    }

    #[test]
    fn test_consistent_edge_detection() {
        // Ten straight profitable days
        let trades: Vec<Trade> = (0..10)
            .map(|day| make_trade(NOW - day * 86_400, "nfl", Some(25.0)))
            .collect();

        let signal = consistent_edge(&trades, NOW).unwrap().unwrap();
        assert_eq!(signal.kind, SignalKind::ConsistentEdge);
        assert!((signal.strength - (0.5 + 3.0 / 14.0)).abs() < 1e-9);
    }

    #[test]
    fn test_consistent_edge_breaks_on_losing_day() {
        let mut trades = Vec::new();
        for day in 0..12 {
            let pnl = if day == 6 { -50.0 } else { 25.0 };
            trades.push(make_trade(NOW - day * 86_400, "nfl", Some(pnl)));
        }
        // Longest clean run is 6 days, below the floor
        assert!(consistent_edge(&trades, NOW).unwrap().is_none());
    }

    #[test]
    fn test_rapid_growth_gates() {
        let mut profile = WalletProfile {
            address: "0xabc".into(),
            first_seen: Some(NOW - 30 * 86_400),
            active_days: 30.0,
            total_pnl: 20_000.0,
            total_trades: 100,
            win_rate: 0.8,
            avg_trade_size: 100.0,
            markets_traded: 5,
            portfolio_value: None,
        };

        let signal = rapid_growth(&profile, NOW).unwrap().unwrap();
        assert!((signal.strength - 0.45).abs() < 1e-9);

        profile.first_seen = Some(NOW - 90 * 86_400);
        assert!(rapid_growth(&profile, NOW).unwrap().is_none());

        profile.first_seen = Some(NOW - 30 * 86_400);
        profile.total_pnl = 500.0;
        assert!(rapid_growth(&profile, NOW).unwrap().is_none());
    }

    #[test]
    fn test_detect_signals_sorted_by_strength() {
        let profile = WalletProfile {
            address: "0xabc".into(),
            first_seen: Some(NOW - 30 * 86_400),
            active_days: 30.0,
            total_pnl: 20_000.0,
            total_trades: 200,
            win_rate: 0.95,
            avg_trade_size: 100.0,
            markets_traded: 5,
            portfolio_value: None,
        };
        let trades: Vec<Trade> = (0..10)
            .map(|day| make_trade(NOW - day * 86_400, "nfl", Some(25.0)))
            .collect();

        let signals = detect_signals(&profile, &trades, NOW).unwrap();
        assert!(signals.len() >= 2);
        for pair in signals.windows(2) {
            assert!(pair[0].strength >= pair[1].strength);
        }
    }
}
