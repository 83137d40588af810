//! Core types for wallet-strategy analysis

use serde::{Deserialize, Serialize};

/// Side of a fill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Buy,
    Sell,
}

impl TradeSide {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

/// Market structure: binary YES/NO or multi-outcome (candidates, brackets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    Binary,
    Multi,
}

impl MarketKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Binary => "binary",
            Self::Multi => "multi",
        }
    }
}

/// A single fill from a wallet's trade history.
///
/// Immutable once constructed. Analysis functions never mutate input slices;
/// anything that needs a sorted view sorts a copy (see [`sorted_by_time`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    /// Unix seconds
    pub timestamp: i64,
    pub market_id: String,
    pub market_title: String,
    /// Outcome label as reported by the venue ("Yes", "No", or a candidate name)
    pub outcome: String,
    pub side: TradeSide,
    pub shares: f64,
    /// Probability-space price in (0, 1)
    pub price: f64,
    /// USD notional (shares × price)
    pub value: f64,
    pub is_maker: bool,
    pub market_kind: MarketKind,
    /// Market category derived from the event slug ("nfl", "politics", ...)
    pub category: Option<String>,
    /// Realized P&L once the position closed; None while open
    pub realized_pnl: Option<f64>,
    /// When the position was closed; None while open
    pub exit_timestamp: Option<i64>,
}

impl Trade {
    pub fn is_yes(&self) -> bool {
        self.outcome.eq_ignore_ascii_case("yes")
    }

    pub fn is_no(&self) -> bool {
        self.outcome.eq_ignore_ascii_case("no")
    }

    pub fn is_closed(&self) -> bool {
        self.realized_pnl.is_some()
    }
}

/// Sorted copy of a trade slice, ascending by timestamp.
///
/// Every analysis entry point goes through this so results are independent of
/// the order trades arrived in.
pub fn sorted_by_time(trades: &[Trade]) -> Vec<Trade> {
    let mut sorted = trades.to_vec();
    sorted.sort_by_key(|t| t.timestamp);
    sorted
}

/// A settled or open position, as reported by the venue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub market_id: Option<String>,
    pub cost_basis: f64,
    pub cash_pnl: f64,
    pub size: f64,
    pub avg_price: f64,
}

/// Aggregate profile for a scanned wallet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletProfile {
    pub address: String,
    /// Unix seconds of the earliest observed trade
    pub first_seen: Option<i64>,
    pub active_days: f64,
    pub total_pnl: f64,
    pub total_trades: usize,
    pub win_rate: f64,
    pub avg_trade_size: f64,
    pub markets_traded: usize,
    pub portfolio_value: Option<f64>,
}

impl WalletProfile {
    /// Wallet age in days relative to `now`, if first_seen is known
    pub fn age_days(&self, now: i64) -> Option<f64> {
        self.first_seen
            .map(|first| ((now - first) as f64 / 86_400.0).max(0.0))
    }
}
