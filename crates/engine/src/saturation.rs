//! Strategy saturation tracking: how crowded each archetype is becoming.
//!
//! A strategy every scanner has already found stops paying. Daily snapshots
//! of how many validated wallets run each archetype feed a simple
//! recent-versus-earlier trend test.

use serde::{Deserialize, Serialize};

/// Ratio band treated as flat. Outside it the wallet count is moving.
const TREND_BAND: f64 = 0.2;

/// One day's observation of a strategy's crowd
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaturationSnapshot {
    pub strategy: String,
    /// Calendar day, YYYY-MM-DD
    pub day: String,
    pub wallet_count: u32,
    pub total_volume: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SaturationTrend {
    Increasing,
    Stable,
    Decreasing,
    Unknown,
}

impl SaturationTrend {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Stable => "stable",
            Self::Decreasing => "decreasing",
            Self::Unknown => "unknown",
        }
    }
}

/// Trend over a day-ordered series of wallet counts: the mean of the recent
/// half against the mean of the earlier half, with a ±20% flat band. Fewer
/// than two observations is Unknown.
pub fn saturation_trend(wallet_counts: &[u32]) -> SaturationTrend {
    if wallet_counts.len() < 2 {
        return SaturationTrend::Unknown;
    }

    let mid = wallet_counts.len() / 2;
    let earlier = mean(&wallet_counts[..mid]);
    let recent = mean(&wallet_counts[mid..]);

    if earlier <= 0.0 {
        return if recent > 0.0 {
            SaturationTrend::Increasing
        } else {
            SaturationTrend::Stable
        };
    }

    let ratio = recent / earlier;
    if ratio > 1.0 + TREND_BAND {
        SaturationTrend::Increasing
    } else if ratio < 1.0 - TREND_BAND {
        SaturationTrend::Decreasing
    } else {
        SaturationTrend::Stable
    }
}

fn mean(counts: &[u32]) -> f64 {
    if counts.is_empty() {
        return 0.0;
    }
    counts.iter().map(|c| *c as f64).sum::<f64>() / counts.len() as f64
}
