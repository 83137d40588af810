//! Polymarket data-api client: leaderboard, per-wallet positions, trades,
//! and portfolio value.
//!
//! Public endpoints, no auth. Every numeric field arrives as an optional:
//! the API omits fields freely and we treat a missing value as missing, not
//! zero.

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const BASE_URL: &str = "https://data-api.polymarket.com";

/// Wallets fetched per leaderboard page
pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 50;

/// Trades fetched per wallet history request
pub const TRADE_FETCH_LIMIT: u32 = 500;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LeaderboardEntry {
    pub rank: Option<String>,
    #[serde(rename = "proxyWallet")]
    pub proxy_wallet: Option<String>,
    #[serde(rename = "userName")]
    pub user_name: Option<String>,
    pub vol: Option<f64>,
    pub pnl: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct LeaderboardResponse {
    leaderboard: Vec<LeaderboardEntry>,
}

/// A wallet's position in one market
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletPosition {
    pub condition_id: Option<String>,
    pub title: Option<String>,
    pub outcome: Option<String>,
    pub size: Option<f64>,
    pub avg_price: Option<f64>,
    pub initial_value: Option<f64>,
    pub current_value: Option<f64>,
    pub cash_pnl: Option<f64>,
    pub percent_pnl: Option<f64>,
    pub redeemable: Option<bool>,
}

/// One fill from a wallet's trade history
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletTrade {
    pub condition_id: Option<String>,
    pub title: Option<String>,
    pub event_slug: Option<String>,
    pub side: Option<String>,
    pub outcome: Option<String>,
    pub outcome_index: Option<f64>,
    pub size: Option<f64>,
    pub price: Option<f64>,
    pub timestamp: Option<f64>,
    pub maker_address: Option<String>,
    pub transaction_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PortfolioValue {
    value: Option<f64>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct PolymarketDataClient {
    client: Client,
}

impl Default for PolymarketDataClient {
    fn default() -> Self {
        Self::new()
    }
}

impl PolymarketDataClient {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");
        Self { client }
    }

    /// Top wallets by all-time profit
    pub async fn get_leaderboard(&self, limit: u32) -> Result<Vec<LeaderboardEntry>> {
        let url = format!(
            "{}/v1/leaderboard?category=OVERALL&timePeriod=ALL&orderBy=PNL&limit={}",
            BASE_URL, limit
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Polymarket leaderboard error {}: {}", status, body);
        }

        let parsed: LeaderboardResponse = response.json().await?;
        debug!(count = parsed.leaderboard.len(), "fetched leaderboard");
        Ok(parsed.leaderboard)
    }

    /// A wallet's positions, biggest realized P&L first
    pub async fn get_positions(&self, address: &str) -> Result<Vec<WalletPosition>> {
        let url = format!(
            "{}/positions?user={}&sortBy=CASHPNL&sortDirection=DESC&limit=500&sizeThreshold=0",
            BASE_URL, address
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Polymarket positions error {}: {}", status, body);
        }

        let positions: Vec<WalletPosition> = response.json().await?;
        debug!(address = %address, count = positions.len(), "fetched positions");
        Ok(positions)
    }

    /// A wallet's recent fills, maker and taker both
    pub async fn get_trades(&self, address: &str) -> Result<Vec<WalletTrade>> {
        let url = format!(
            "{}/trades?user={}&limit={}&takerOnly=false",
            BASE_URL, address, TRADE_FETCH_LIMIT
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Polymarket trades error {}: {}", status, body);
        }

        let trades: Vec<WalletTrade> = response.json().await?;
        debug!(address = %address, count = trades.len(), "fetched trades");
        Ok(trades)
    }

    /// Current portfolio value in USD
    pub async fn get_value(&self, address: &str) -> Result<f64> {
        let url = format!("{}/value?user={}", BASE_URL, address);

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Polymarket value error {}: {}", status, body);
        }

        // Returns either a bare object or a one-element array depending on
        // the endpoint version
        let values: serde_json::Value = response.json().await?;
        let value = match &values {
            serde_json::Value::Array(items) => items
                .first()
                .and_then(|v| serde_json::from_value::<PortfolioValue>(v.clone()).ok())
                .and_then(|v| v.value),
            other => serde_json::from_value::<PortfolioValue>(other.clone())
                .ok()
                .and_then(|v| v.value),
        };

        Ok(value.unwrap_or(0.0))
    }
}
