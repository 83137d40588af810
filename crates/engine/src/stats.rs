//! Statistical primitives shared by the classifier, validator, and signal
//! detector.
//!
//! Every function here is pure and total: insufficient or degenerate input maps
//! to a neutral value rather than an error or NaN. Callers treat "not enough
//! data" as data, never as a failure.

use crate::types::Trade;

/// Below this many trials a win streak proves nothing, so the binomial test
/// reports no significance at all.
pub const MIN_TRIALS_FOR_SIGNIFICANCE: usize = 30;

// ---------------------------------------------------------------------------
// Significance testing
// ---------------------------------------------------------------------------

/// One-tailed binomial test: probability of observing at least `successes`
/// wins in `trials` attempts under a null success rate of `null_p`.
///
/// Uses a normal approximation with continuity correction, which is accurate
/// enough at the trial counts we gate on. Returns 1.0 (no significance) when
/// trials < [`MIN_TRIALS_FOR_SIGNIFICANCE`] or when the observed rate does not
/// exceed the null.
pub fn binomial_p_value(successes: usize, trials: usize, null_p: f64) -> f64 {
    if trials < MIN_TRIALS_FOR_SIGNIFICANCE {
        return 1.0;
    }

    let n = trials as f64;
    let mean = n * null_p;
    let std = (n * null_p * (1.0 - null_p)).sqrt();
    if std == 0.0 {
        return 1.0;
    }

    let z = (successes as f64 - 0.5 - mean) / std;
    if z <= 0.0 {
        return 1.0;
    }

    normal_survival(z).clamp(0.0, 1.0)
}

/// Upper-tail probability of the standard normal, P(Z > z) for z >= 0.
///
/// Abramowitz & Stegun 26.2.17 polynomial approximation; absolute error is
/// below 7.5e-8, far tighter than any threshold we compare against.
fn normal_survival(z: f64) -> f64 {
    let t = 1.0 / (1.0 + 0.2316419 * z);
    let d = 0.3989423 * (-z * z / 2.0).exp();
    d * t
        * (0.3193815
            + t * (-0.3565638 + t * (1.781478 + t * (-1.821256 + t * 1.330274))))
}

// ---------------------------------------------------------------------------
// Trade-level ratios
// ---------------------------------------------------------------------------

/// Fraction of closed trades with positive realized P&L. Open trades are
/// excluded entirely; a closed trade at exactly zero counts as a loss.
pub fn win_rate(trades: &[Trade]) -> f64 {
    let closed: Vec<f64> = trades.iter().filter_map(|t| t.realized_pnl).collect();
    if closed.is_empty() {
        return 0.0;
    }
    let wins = closed.iter().filter(|pnl| **pnl > 0.0).count();
    wins as f64 / closed.len() as f64
}

/// Fraction of trades placed as maker orders
pub fn maker_ratio(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let makers = trades.iter().filter(|t| t.is_maker).count();
    makers as f64 / trades.len() as f64
}

/// Burst score in [0, 1]: half the coefficient of variation of inter-trade
/// gaps, clamped. Evenly spaced trading scores near 0; trading that arrives
/// in clusters separated by long silences scores near 1.
///
/// Needs at least 3 trades to have 2 gaps to compare; otherwise 0.
pub fn burst_score(timestamps: &[i64]) -> f64 {
    if timestamps.len() < 3 {
        return 0.0;
    }

    let mut sorted = timestamps.to_vec();
    sorted.sort_unstable();

    let gaps: Vec<f64> = sorted.windows(2).map(|w| (w[1] - w[0]) as f64).collect();
    let mean_gap = mean(&gaps);
    if mean_gap <= 0.0 {
        return 0.0;
    }

    let cv = std_dev(&gaps) / mean_gap;
    (cv / 2.0).min(1.0)
}

// ---------------------------------------------------------------------------
// Concentration
// ---------------------------------------------------------------------------

/// Gini coefficient of a volume distribution, in [0, 1). 0 means volume is
/// spread evenly; values near 1 mean nearly all volume sits in one bucket.
pub fn gini(volumes: &[f64]) -> f64 {
    if volumes.is_empty() {
        return 0.0;
    }

    let mut sorted = volumes.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let n = sorted.len() as f64;
    let total: f64 = sorted.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let weighted: f64 = sorted
        .iter()
        .enumerate()
        .map(|(i, v)| (i as f64 + 1.0) * v)
        .sum();

    (2.0 * weighted) / (n * total) - (n + 1.0) / n
}

/// Herfindahl-Hirschman index on the conventional 0-10000 scale. A single
/// bucket holding all volume scores exactly 10000.
pub fn hhi(volumes: &[f64]) -> f64 {
    let total: f64 = volumes.iter().sum();
    if total <= 0.0 {
        return 0.0;
    }
    volumes
        .iter()
        .map(|v| {
            let share = v / total;
            share * share
        })
        .sum::<f64>()
        * 10_000.0
}

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance (divides by n, not n-1)
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64
}

pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Percentile with linear interpolation between ranks. `pct` is 0-100.
pub fn percentile(values: &[f64], pct: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    if sorted.len() == 1 {
        return sorted[0];
    }

    let rank = (pct / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }
    let frac = rank - lower as f64;
    sorted[lower] + frac * (sorted[upper] - sorted[lower])
}

/// Pearson correlation. Returns 0.0 on length mismatch, fewer than two
/// points, or a degenerate (zero-variance) series.
pub fn correlation(xs: &[f64], ys: &[f64]) -> f64 {
    if xs.len() != ys.len() || xs.len() < 2 {
        return 0.0;
    }

    let mx = mean(xs);
    let my = mean(ys);
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        cov += (x - mx) * (y - my);
        var_x += (x - mx) * (x - mx);
        var_y += (y - my) * (y - my);
    }

    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    cov / denom
}
