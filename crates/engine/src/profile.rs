//! Per-wallet behavior profiles: when a wallet trades, how it sizes positions,
//! and how concentrated its volume is.
//!
//! All profile functions accept trades in any order and sort a copy where
//! order matters.

use crate::stats;
use crate::types::{sorted_by_time, Trade};
use chrono::{DateTime, Datelike, Timelike};
use serde::Serialize;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// When and how often a wallet trades
#[derive(Debug, Clone, Serialize)]
pub struct TimingAnalysis {
    /// Average seconds between entry and exit over closed positions
    pub avg_hold_secs: f64,
    pub trades_per_day: f64,
    /// Share of trades in each UTC hour, sums to 1 when trades exist
    pub hour_histogram: [f64; 24],
    /// Share of trades on each weekday, Monday first
    pub weekday_histogram: [f64; 7],
    pub burst_score: f64,
}

impl Default for TimingAnalysis {
    fn default() -> Self {
        Self {
            avg_hold_secs: 0.0,
            trades_per_day: 0.0,
            hour_histogram: [0.0; 24],
            weekday_histogram: [0.0; 7],
            burst_score: 0.0,
        }
    }
}

/// Detected position-sizing discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizingPattern {
    Fixed,
    Kelly,
    Martingale,
    Progressive,
    Variable,
}

impl SizingPattern {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Fixed => "fixed",
            Self::Kelly => "kelly",
            Self::Martingale => "martingale",
            Self::Progressive => "progressive",
            Self::Variable => "variable",
        }
    }
}

/// Position-sizing profile over a wallet's trade values (USD)
#[derive(Debug, Clone, Serialize)]
pub struct SizingAnalysis {
    pub avg_size: f64,
    pub max_size: f64,
    pub size_variance: f64,
    pub pattern: SizingPattern,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

impl Default for SizingAnalysis {
    fn default() -> Self {
        Self {
            avg_size: 0.0,
            max_size: 0.0,
            size_variance: 0.0,
            pattern: SizingPattern::Variable,
            p25: 0.0,
            p50: 0.0,
            p75: 0.0,
            p95: 0.0,
        }
    }
}

/// How concentrated a wallet's volume is across markets
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConcentrationMetrics {
    pub unique_markets: usize,
    /// Top five markets by volume, largest first
    pub top_markets: Vec<(String, f64)>,
    pub gini: f64,
    pub hhi: f64,
}

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

pub fn analyze_timing(trades: &[Trade]) -> TimingAnalysis {
    if trades.is_empty() {
        return TimingAnalysis::default();
    }

    let sorted = sorted_by_time(trades);

    let hold_times: Vec<f64> = sorted
        .iter()
        .filter_map(|t| t.exit_timestamp.map(|exit| (exit - t.timestamp) as f64))
        .collect();
    let avg_hold_secs = stats::mean(&hold_times);

    let span = (sorted.last().map(|t| t.timestamp).unwrap_or(0)
        - sorted.first().map(|t| t.timestamp).unwrap_or(0)) as f64;
    let trades_per_day = if span > 0.0 {
        sorted.len() as f64 / (span / 86_400.0)
    } else {
        0.0
    };

    let mut hour_histogram = [0.0; 24];
    let mut weekday_histogram = [0.0; 7];
    let mut dated = 0usize;
    for trade in &sorted {
        if let Some(dt) = DateTime::from_timestamp(trade.timestamp, 0) {
            hour_histogram[dt.hour() as usize] += 1.0;
            weekday_histogram[dt.weekday().num_days_from_monday() as usize] += 1.0;
            dated += 1;
        }
    }
    if dated > 0 {
        let n = dated as f64;
        for bucket in hour_histogram.iter_mut() {
            *bucket /= n;
        }
        for bucket in weekday_histogram.iter_mut() {
            *bucket /= n;
        }
    }

    let timestamps: Vec<i64> = sorted.iter().map(|t| t.timestamp).collect();

    TimingAnalysis {
        avg_hold_secs,
        trades_per_day,
        hour_histogram,
        weekday_histogram,
        burst_score: stats::burst_score(&timestamps),
    }
}

// ---------------------------------------------------------------------------
// Sizing
// ---------------------------------------------------------------------------

pub fn analyze_sizing(trades: &[Trade]) -> SizingAnalysis {
    if trades.is_empty() {
        return SizingAnalysis::default();
    }

    let sizes: Vec<f64> = trades.iter().map(|t| t.value).collect();

    SizingAnalysis {
        avg_size: stats::mean(&sizes),
        max_size: sizes.iter().cloned().fold(0.0, f64::max),
        size_variance: stats::variance(&sizes),
        pattern: detect_sizing_pattern(trades, &sizes),
        p25: stats::percentile(&sizes, 25.0),
        p50: stats::percentile(&sizes, 50.0),
        p75: stats::percentile(&sizes, 75.0),
        p95: stats::percentile(&sizes, 95.0),
    }
}

fn detect_sizing_pattern(trades: &[Trade], sizes: &[f64]) -> SizingPattern {
    if sizes.len() < 10 {
        return SizingPattern::Variable;
    }

    let avg = stats::mean(sizes);
    if avg > 0.0 {
        let cv = stats::std_dev(sizes) / avg;
        if cv < 0.2 {
            return SizingPattern::Fixed;
        }
    }

    let closed: Vec<&Trade> = trades.iter().filter(|t| t.is_closed()).collect();
    if closed.len() >= 5 && martingale_score(&closed) > 0.6 {
        return SizingPattern::Martingale;
    }

    if kelly_score(&closed) > 0.6 {
        return SizingPattern::Kelly;
    }

    let indices: Vec<f64> = (0..sizes.len()).map(|i| i as f64).collect();
    if stats::correlation(&indices, sizes) > 0.5 {
        return SizingPattern::Progressive;
    }

    SizingPattern::Variable
}

/// Fraction of loss-followed trades where the next position roughly doubled.
/// Classic martingale doubles after every loss, so ratios near 2 count.
fn martingale_score(closed: &[&Trade]) -> f64 {
    if closed.len() < 3 {
        return 0.0;
    }

    let mut doubled = 0usize;
    for window in closed.windows(2) {
        let (prev, next) = (window[0], window[1]);
        let lost = prev.realized_pnl.map(|pnl| pnl < 0.0).unwrap_or(false);
        if lost && prev.value > 0.0 {
            let ratio = next.value / prev.value;
            if (1.8..=2.2).contains(&ratio) {
                doubled += 1;
            }
        }
    }

    doubled as f64 / (closed.len() - 1) as f64
}

/// Correlation strength between a rolling win rate and the next position
/// size. Kelly-style bettors size up when recent results are good.
fn kelly_score(closed: &[&Trade]) -> f64 {
    const WINDOW: usize = 10;
    if closed.len() < WINDOW {
        return 0.0;
    }

    let mut recent_rates = Vec::new();
    let mut next_sizes = Vec::new();
    for i in WINDOW..closed.len() {
        let window = &closed[i - WINDOW..i];
        let wins = window
            .iter()
            .filter(|t| t.realized_pnl.map(|pnl| pnl > 0.0).unwrap_or(false))
            .count();
        recent_rates.push(wins as f64 / WINDOW as f64);
        next_sizes.push(closed[i].value);
    }

    if recent_rates.len() < 5 {
        return 0.0;
    }

    stats::correlation(&recent_rates, &next_sizes).abs()
}

// ---------------------------------------------------------------------------
// Concentration
// ---------------------------------------------------------------------------

pub fn analyze_concentration(trades: &[Trade]) -> ConcentrationMetrics {
    if trades.is_empty() {
        return ConcentrationMetrics::default();
    }

    let mut by_market: HashMap<&str, f64> = HashMap::new();
    for trade in trades {
        *by_market.entry(trade.market_id.as_str()).or_insert(0.0) += trade.value;
    }

    let mut ranked: Vec<(String, f64)> = by_market
        .iter()
        .map(|(id, vol)| (id.to_string(), *vol))
        .collect();
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let volumes: Vec<f64> = by_market.values().cloned().collect();

    ConcentrationMetrics {
        unique_markets: by_market.len(),
        top_markets: ranked.into_iter().take(5).collect(),
        gini: stats::gini(&volumes),
        hhi: stats::hhi(&volumes),
    }
}

// ---------------------------------------------------------------------------
// Profit trajectory
// ---------------------------------------------------------------------------

/// Multiplicative growth rate of cumulative profit per trade.
///
/// Fits a least-squares line to the log of the (shifted-positive) cumulative
/// P&L curve and exponentiates the slope. 1.0 is the neutral sentinel: flat
/// growth, fewer than 10 closed trades, or a degenerate fit all map to it.
/// Values above ~1.02 mean profits are compounding.
pub fn profit_acceleration(trades: &[Trade]) -> f64 {
    let sorted = sorted_by_time(trades);
    let pnls: Vec<f64> = sorted.iter().filter_map(|t| t.realized_pnl).collect();
    if pnls.len() < 10 {
        return 1.0;
    }

    let mut cumulative = Vec::with_capacity(pnls.len());
    let mut running = 0.0;
    for pnl in &pnls {
        running += pnl;
        cumulative.push(running);
    }

    // Shift the whole curve positive so the log is defined everywhere
    let min = cumulative.iter().cloned().fold(f64::INFINITY, f64::min);
    let logged: Vec<f64> = cumulative
        .iter()
        .map(|c| (c - min + 1.0).ln())
        .collect();

    let xs: Vec<f64> = (0..logged.len()).map(|i| i as f64).collect();
    let mx = stats::mean(&xs);
    let my = stats::mean(&logged);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    for (x, y) in xs.iter().zip(logged.iter()) {
        cov += (x - mx) * (y - my);
        var_x += (x - mx) * (x - mx);
    }
    if var_x == 0.0 {
        return 1.0;
    }

    let acceleration = (cov / var_x).exp();
    if acceleration.is_finite() {
        acceleration
    } else {
        1.0
    }
}
