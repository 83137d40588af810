//! Rule extraction: turning a classified trade history into typed entry,
//! exit, sizing, and market-selection rules.
//!
//! Extraction is deliberately liberal. Every plausible rule is generated with
//! a confidence and an evidence count, then a single post-filter drops
//! anything below the extractor's thresholds. Raising either threshold can
//! only shrink the output.

use crate::stats;
use crate::types::{sorted_by_time, MarketKind, Trade, TradeSide};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.7;
pub const DEFAULT_MIN_EVIDENCE: usize = 10;

/// Seconds within which a YES buy and a NO buy count as one hedged pair
const PAIR_MATCH_SECS: i64 = 60;

/// Gap below which a fill counts as a reaction to a market event
const RAPID_REACTION_SECS: i64 = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Category of an extracted rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Entry,
    Exit,
    Sizing,
    MarketFilter,
}

impl RuleKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Exit => "exit",
            Self::Sizing => "sizing",
            Self::MarketFilter => "market_filter",
        }
    }
}

/// Strategy archetype at blueprint granularity. Coarser classification sees
/// one "arbitrage" bucket; replication needs to know whether the hedge is a
/// binary YES/NO pair or a full multi-outcome set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlueprintStrategy {
    ArbitrageBinary,
    ArbitrageMulti,
    MarketMaker,
    Sniper,
    Directional,
    Hybrid,
}

impl BlueprintStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ArbitrageBinary => "Binary Arbitrage",
            Self::ArbitrageMulti => "Multi-Outcome Arbitrage",
            Self::MarketMaker => "Market Maker",
            Self::Sniper => "Sniper",
            Self::Directional => "Directional",
            Self::Hybrid => "Hybrid",
        }
    }
}

/// Quantitative or descriptive payload of a rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleValue {
    Number(f64),
    Text(String),
}

impl RuleValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for RuleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n:.4}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for RuleValue {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<&str> for RuleValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for RuleValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum RuleError {
    #[error("rule confidence must be a finite value in [0, 1], got {0}")]
    InvalidConfidence(f64),
}

/// A single extracted rule. Construct through [`Rule::new`], which rejects
/// out-of-range confidence instead of clamping it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub condition: String,
    pub value: RuleValue,
    pub confidence: f64,
    pub evidence_count: usize,
    pub kind: RuleKind,
    #[serde(default)]
    pub metadata: Value,
}

impl Rule {
    pub fn new(
        condition: impl Into<String>,
        value: impl Into<RuleValue>,
        confidence: f64,
        evidence_count: usize,
        kind: RuleKind,
        metadata: Value,
    ) -> Result<Self, RuleError> {
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(RuleError::InvalidConfidence(confidence));
        }
        Ok(Self {
            condition: condition.into(),
            value: value.into(),
            confidence,
            evidence_count,
            kind,
            metadata,
        })
    }
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Extracts rules from trade histories and filters them against minimum
/// confidence and evidence thresholds fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct RuleExtractor {
    min_confidence: f64,
    min_evidence: usize,
}

impl Default for RuleExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CONFIDENCE, DEFAULT_MIN_EVIDENCE)
    }
}

impl RuleExtractor {
    pub fn new(min_confidence: f64, min_evidence: usize) -> Self {
        Self {
            min_confidence,
            min_evidence,
        }
    }

    pub fn extract_entry_rules(
        &self,
        trades: &[Trade],
        strategy: BlueprintStrategy,
    ) -> Result<Vec<Rule>, RuleError> {
        let sorted = sorted_by_time(trades);
        let mut rules = match strategy {
            BlueprintStrategy::ArbitrageBinary => binary_arbitrage_entries(&sorted)?,
            BlueprintStrategy::ArbitrageMulti => multi_arbitrage_entries(&sorted)?,
            BlueprintStrategy::MarketMaker => market_maker_entries(&sorted)?,
            BlueprintStrategy::Sniper => sniper_entries(&sorted)?,
            BlueprintStrategy::Directional | BlueprintStrategy::Hybrid => {
                directional_entries(&sorted)?
            }
        };
        if strategy == BlueprintStrategy::Sniper {
            rules.extend(directional_entries(&sorted)?);
        }
        Ok(self.apply_thresholds(rules))
    }

    pub fn extract_exit_rules(
        &self,
        trades: &[Trade],
        strategy: BlueprintStrategy,
    ) -> Result<Vec<Rule>, RuleError> {
        let sorted = sorted_by_time(trades);
        let rules = if matches!(
            strategy,
            BlueprintStrategy::ArbitrageBinary | BlueprintStrategy::ArbitrageMulti
        ) {
            arbitrage_exits(&sorted)?
        } else {
            swing_exits(&sorted)?
        };
        Ok(self.apply_thresholds(rules))
    }

    pub fn extract_sizing_rules(&self, trades: &[Trade]) -> Result<Vec<Rule>, RuleError> {
        let sorted = sorted_by_time(trades);
        let mut rules = Vec::new();

        let buy_values: Vec<f64> = sorted
            .iter()
            .filter(|t| t.side == TradeSide::Buy)
            .map(|t| t.value)
            .collect();

        if !buy_values.is_empty() {
            let avg = stats::mean(&buy_values);
            let median = stats::percentile(&buy_values, 50.0);
            let cv = if avg > 0.0 {
                stats::std_dev(&buy_values) / avg
            } else {
                0.0
            };

            if cv < 0.2 {
                rules.push(Rule::new(
                    format!("Fixed position size ~${avg:.0}"),
                    avg,
                    1.0 - cv,
                    buy_values.len(),
                    RuleKind::Sizing,
                    json!({ "rule_type": "fixed_size", "median": median }),
                )?);
            } else {
                let min = buy_values.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = buy_values.iter().cloned().fold(0.0, f64::max);
                rules.push(Rule::new(
                    format!("Dynamic sizing: ${median:.0} typical (${min:.0}-${max:.0} range)"),
                    median,
                    0.7,
                    buy_values.len(),
                    RuleKind::Sizing,
                    json!({ "rule_type": "dynamic_size", "min": min, "max": max }),
                )?);
            }
        }

        // Compounding only shows up over a long history
        if sorted.len() > 100 {
            let third = sorted.len() / 3;
            let early: Vec<f64> = sorted[..third]
                .iter()
                .filter(|t| t.side == TradeSide::Buy)
                .map(|t| t.value)
                .collect();
            let late: Vec<f64> = sorted[sorted.len() - third..]
                .iter()
                .filter(|t| t.side == TradeSide::Buy)
                .map(|t| t.value)
                .collect();
            if !early.is_empty() && !late.is_empty() {
                let early_avg = stats::mean(&early);
                let late_avg = stats::mean(&late);
                if early_avg > 0.0 && late_avg > early_avg * 1.5 {
                    rules.push(Rule::new(
                        "Compound profits (position size grows over time)",
                        late_avg / early_avg,
                        0.85,
                        sorted.len(),
                        RuleKind::Sizing,
                        json!({
                            "rule_type": "compounding",
                            "early_avg": early_avg,
                            "late_avg": late_avg,
                        }),
                    )?);
                }
            }
        }

        let exposure = max_concurrent_exposure(&sorted);
        if exposure > 0.0 {
            rules.push(Rule::new(
                format!("Maximum concurrent exposure ~${exposure:.0}"),
                exposure,
                0.8,
                sorted.len(),
                RuleKind::Sizing,
                json!({ "rule_type": "max_exposure" }),
            )?);
        }

        Ok(self.apply_thresholds(rules))
    }

    pub fn extract_market_filters(&self, trades: &[Trade]) -> Result<Vec<Rule>, RuleError> {
        let mut rules = Vec::new();
        if trades.is_empty() {
            return Ok(rules);
        }

        let mut keyword_counts: HashMap<String, usize> = HashMap::new();
        for trade in trades {
            for word in trade.market_title.to_lowercase().split_whitespace() {
                let word = word.trim_matches(|c: char| !c.is_alphanumeric());
                if word.len() > 3 {
                    *keyword_counts.entry(word.to_string()).or_insert(0) += 1;
                }
            }
        }

        let top_keyword = keyword_counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
        if let Some((keyword, count)) = top_keyword {
            let freq = *count as f64 / trades.len() as f64;
            if freq > 0.3 {
                let mut ranked: Vec<(&String, &usize)> = keyword_counts.iter().collect();
                ranked.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
                let top: HashMap<&str, usize> = ranked
                    .iter()
                    .take(5)
                    .map(|(k, c)| (k.as_str(), **c))
                    .collect();
                rules.push(Rule::new(
                    format!("Focus on '{keyword}' markets"),
                    keyword.as_str(),
                    freq.min(1.0),
                    *count,
                    RuleKind::MarketFilter,
                    json!({ "rule_type": "keyword_focus", "top_keywords": top }),
                )?);
            }
        }

        let mut kind_counts: HashMap<&'static str, usize> = HashMap::new();
        for trade in trades {
            *kind_counts.entry(trade.market_kind.label()).or_insert(0) += 1;
        }
        let top_kind = kind_counts
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.cmp(b.0)));
        if let Some((kind, count)) = top_kind {
            let freq = *count as f64 / trades.len() as f64;
            if freq > 0.7 {
                rules.push(Rule::new(
                    format!("Trade {kind} outcome markets"),
                    *kind,
                    freq.min(1.0),
                    *count,
                    RuleKind::MarketFilter,
                    json!({ "rule_type": "market_structure" }),
                )?);
            }
        }

        Ok(self.apply_thresholds(rules))
    }

    /// The one filter every extracted rule passes through
    fn apply_thresholds(&self, mut rules: Vec<Rule>) -> Vec<Rule> {
        rules.retain(|r| r.confidence >= self.min_confidence && r.evidence_count >= self.min_evidence);
        rules
    }
}

// ---------------------------------------------------------------------------
// Entry extraction
// ---------------------------------------------------------------------------

fn binary_arbitrage_entries(trades: &[Trade]) -> Result<Vec<Rule>, RuleError> {
    let mut pair_costs = Vec::new();
    for market_trades in group_by_market(trades).values() {
        let yes_buys: Vec<&&Trade> = market_trades
            .iter()
            .filter(|t| t.side == TradeSide::Buy && t.is_yes())
            .collect();
        let no_buys: Vec<&&Trade> = market_trades
            .iter()
            .filter(|t| t.side == TradeSide::Buy && t.is_no())
            .collect();
        for yes in &yes_buys {
            for no in &no_buys {
                if (yes.timestamp - no.timestamp).abs() < PAIR_MATCH_SECS {
                    pair_costs.push(yes.price + no.price);
                }
            }
        }
    }

    if pair_costs.is_empty() {
        return Ok(Vec::new());
    }

    let avg_cost = stats::mean(&pair_costs);
    let avg_edge = 1.0 - avg_cost;
    Ok(vec![
        Rule::new(
            format!("sum(best_bid_yes + best_bid_no) < {avg_cost:.3}"),
            avg_cost,
            0.9,
            pair_costs.len(),
            RuleKind::Entry,
            json!({ "rule_type": "binary_arbitrage", "avg_edge": avg_edge }),
        )?,
        Rule::new(
            "Buy equal shares of YES and NO",
            "paired_hedge",
            0.95,
            pair_costs.len(),
            RuleKind::Entry,
            json!({ "rule_type": "hedging" }),
        )?,
    ])
}

fn multi_arbitrage_entries(trades: &[Trade]) -> Result<Vec<Rule>, RuleError> {
    let mut set_costs = Vec::new();
    let mut outcome_counts = Vec::new();
    for market_trades in group_by_market(trades).values() {
        if market_trades
            .first()
            .map(|t| t.market_kind != MarketKind::Multi)
            .unwrap_or(true)
        {
            continue;
        }
        let buys: Vec<&&Trade> = market_trades
            .iter()
            .filter(|t| t.side == TradeSide::Buy)
            .collect();
        let outcomes: std::collections::HashSet<&str> =
            buys.iter().map(|t| t.outcome.as_str()).collect();
        if outcomes.len() < 3 {
            continue;
        }

        let total_value: f64 = buys.iter().map(|t| t.value).sum();
        let min_shares = buys
            .iter()
            .map(|t| t.shares)
            .fold(f64::INFINITY, f64::min);
        if min_shares > 0.0 && min_shares.is_finite() {
            set_costs.push(total_value / min_shares);
            outcome_counts.push(outcomes.len() as f64);
        }
    }

    if set_costs.is_empty() {
        return Ok(Vec::new());
    }

    let avg_cost = stats::mean(&set_costs);
    let avg_edge = if avg_cost < 1.0 { 1.0 - avg_cost } else { 0.0 };
    let avg_outcomes = stats::mean(&outcome_counts).round();
    Ok(vec![
        Rule::new(
            format!("sum(all_outcome_prices) < {avg_cost:.3}"),
            avg_cost,
            0.85,
            set_costs.len(),
            RuleKind::Entry,
            json!({ "rule_type": "multi_arbitrage", "avg_edge": avg_edge }),
        )?,
        Rule::new(
            format!("Buy equal shares of all {avg_outcomes:.0} outcomes"),
            avg_outcomes,
            0.9,
            set_costs.len(),
            RuleKind::Entry,
            json!({ "rule_type": "complete_set" }),
        )?,
    ])
}

fn market_maker_entries(trades: &[Trade]) -> Result<Vec<Rule>, RuleError> {
    let buy_prices: Vec<f64> = trades
        .iter()
        .filter(|t| t.side == TradeSide::Buy)
        .map(|t| t.price)
        .collect();
    if buy_prices.is_empty() {
        return Ok(Vec::new());
    }

    let avg_price = stats::mean(&buy_prices);
    Ok(vec![Rule::new(
        "Post limit orders at mid ± spread_target",
        avg_price,
        0.7,
        buy_prices.len(),
        RuleKind::Entry,
        json!({ "rule_type": "market_making", "avg_entry_price": avg_price }),
    )?])
}

fn directional_entries(trades: &[Trade]) -> Result<Vec<Rule>, RuleError> {
    let mut rules = Vec::new();

    let yes_prices: Vec<f64> = trades
        .iter()
        .filter(|t| t.side == TradeSide::Buy && t.is_yes())
        .map(|t| t.price)
        .collect();
    if !yes_prices.is_empty() {
        let avg = stats::mean(&yes_prices);
        rules.push(Rule::new(
            format!("Buy YES when undervalued (avg entry: {avg:.2})"),
            avg,
            0.6,
            yes_prices.len(),
            RuleKind::Entry,
            json!({ "rule_type": "directional", "direction": "bullish" }),
        )?);
    }

    let no_prices: Vec<f64> = trades
        .iter()
        .filter(|t| t.side == TradeSide::Buy && t.is_no())
        .map(|t| t.price)
        .collect();
    if !no_prices.is_empty() {
        let avg = stats::mean(&no_prices);
        rules.push(Rule::new(
            format!("Buy NO when overvalued (avg entry: {avg:.2})"),
            avg,
            0.6,
            no_prices.len(),
            RuleKind::Entry,
            json!({ "rule_type": "directional", "direction": "bearish" }),
        )?);
    }

    Ok(rules)
}

fn sniper_entries(trades: &[Trade]) -> Result<Vec<Rule>, RuleError> {
    if trades.len() < 2 {
        return Ok(Vec::new());
    }

    let gaps: Vec<i64> = trades
        .windows(2)
        .map(|w| w[1].timestamp - w[0].timestamp)
        .collect();
    let rapid = gaps.iter().filter(|g| **g < RAPID_REACTION_SECS).count();
    let ratio = rapid as f64 / gaps.len() as f64;
    if ratio <= 0.3 {
        return Ok(Vec::new());
    }

    Ok(vec![Rule::new(
        format!("Trigger on rapid market events (< {RAPID_REACTION_SECS}s response time)"),
        RAPID_REACTION_SECS as f64,
        0.75,
        rapid,
        RuleKind::Entry,
        json!({ "rule_type": "event_sniping", "rapid_trade_ratio": ratio }),
    )?])
}

// ---------------------------------------------------------------------------
// Exit extraction
// ---------------------------------------------------------------------------

fn arbitrage_exits(trades: &[Trade]) -> Result<Vec<Rule>, RuleError> {
    let by_market = group_by_market(trades);
    if by_market.is_empty() {
        return Ok(Vec::new());
    }

    let held = by_market
        .values()
        .filter(|market_trades| !market_trades.iter().any(|t| t.side == TradeSide::Sell))
        .count();
    let ratio = held as f64 / by_market.len() as f64;
    if ratio <= 0.8 {
        return Ok(Vec::new());
    }

    Ok(vec![Rule::new(
        "Hold to market resolution",
        "resolution",
        ratio,
        held,
        RuleKind::Exit,
        json!({ "rule_type": "arbitrage_hold" }),
    )?])
}

fn swing_exits(trades: &[Trade]) -> Result<Vec<Rule>, RuleError> {
    let mut hold_secs = Vec::new();
    let mut profit_targets = Vec::new();
    let mut stop_losses = Vec::new();

    for market_trades in group_by_market(trades).values() {
        let sells: Vec<&&Trade> = market_trades
            .iter()
            .filter(|t| t.side == TradeSide::Sell)
            .collect();
        for buy in market_trades.iter().filter(|t| t.side == TradeSide::Buy) {
            let next_sell = sells
                .iter()
                .filter(|s| s.timestamp > buy.timestamp)
                .min_by_key(|s| s.timestamp);
            if let Some(sell) = next_sell {
                hold_secs.push((sell.timestamp - buy.timestamp) as f64);
                if buy.price > 0.0 {
                    let pct = (sell.price - buy.price) / buy.price * 100.0;
                    if pct > 0.0 {
                        profit_targets.push(pct);
                    } else if pct < 0.0 {
                        stop_losses.push(pct.abs());
                    }
                }
            }
        }
    }

    let mut rules = Vec::new();
    if !hold_secs.is_empty() {
        let avg_secs = stats::mean(&hold_secs);
        rules.push(Rule::new(
            format!("Exit after {:.1} hours average", avg_secs / 3600.0),
            avg_secs,
            0.8,
            hold_secs.len(),
            RuleKind::Exit,
            json!({ "rule_type": "time_exit" }),
        )?);
    }
    if !profit_targets.is_empty() {
        let avg = stats::mean(&profit_targets);
        rules.push(Rule::new(
            format!("Take profit at ~{avg:.1}% gain"),
            avg,
            0.7,
            profit_targets.len(),
            RuleKind::Exit,
            json!({ "rule_type": "take_profit" }),
        )?);
    }
    if !stop_losses.is_empty() {
        let avg = stats::mean(&stop_losses);
        rules.push(Rule::new(
            format!("Stop loss at ~{avg:.1}% loss"),
            -avg,
            0.7,
            stop_losses.len(),
            RuleKind::Exit,
            json!({ "rule_type": "stop_loss" }),
        )?);
    }

    Ok(rules)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Peak signed USD exposure over a time-ordered replay: buys add, sells
/// release
pub fn max_concurrent_exposure(trades: &[Trade]) -> f64 {
    let sorted = sorted_by_time(trades);
    let mut current = 0.0f64;
    let mut peak = 0.0f64;
    for trade in &sorted {
        match trade.side {
            TradeSide::Buy => current += trade.value,
            TradeSide::Sell => current -= trade.value,
        }
        if current > peak {
            peak = current;
        }
    }
    peak
}

pub(crate) fn group_by_market(trades: &[Trade]) -> HashMap<&str, Vec<&Trade>> {
    let mut by_market: HashMap<&str, Vec<&Trade>> = HashMap::new();
    for trade in trades {
        by_market.entry(trade.market_id.as_str()).or_default().push(trade);
    }
    by_market
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_trade(
        ts: i64,
        market: &str,
        outcome: &str,
        side: TradeSide,
        price: f64,
        value: f64,
    ) -> Trade {
        Trade {
            timestamp: ts,
            market_id: market.into(),
            market_title: format!("Will the {market} thing happen"),
            outcome: outcome.into(),
            side,
            shares: if price > 0.0 { value / price } else { 0.0 },
            price,
            value,
            is_maker: false,
            market_kind: MarketKind::Binary,
            category: None,
            realized_pnl: None,
            exit_timestamp: None,
        }
    }

    fn hedged_history() -> Vec<Trade> {
        let mut trades = Vec::new();
        for i in 0..15 {
            let market = format!("m{i}");
            let ts = i * 10_000;
            trades.push(make_trade(ts, &market, "Yes", TradeSide::Buy, 0.45, 90.0));
            trades.push(make_trade(ts + 20, &market, "No", TradeSide::Buy, 0.50, 100.0));
        }
        trades
    }

    #[test]
    fn test_rule_rejects_bad_confidence() {
        let err = Rule::new("x", 1.0, 1.5, 10, RuleKind::Entry, json!({}));
        assert_eq!(err.unwrap_err(), RuleError::InvalidConfidence(1.5));

        assert!(Rule::new("x", 1.0, -0.1, 10, RuleKind::Entry, json!({})).is_err());
        assert!(Rule::new("x", 1.0, f64::NAN, 10, RuleKind::Entry, json!({})).is_err());
        assert!(Rule::new("x", 1.0, 1.0, 0, RuleKind::Entry, json!({})).is_ok());
    }

    #[test]
    fn test_binary_arbitrage_entry_rules() {
        let extractor = RuleExtractor::new(0.5, 5);
        let rules = extractor
            .extract_entry_rules(&hedged_history(), BlueprintStrategy::ArbitrageBinary)
            .unwrap();

        assert_eq!(rules.len(), 2);
        assert!(rules[0].condition.contains("sum(best_bid_yes + best_bid_no)"));
        assert!((rules[0].value.as_number().unwrap() - 0.95).abs() < 1e-9);
        assert_eq!(rules[0].evidence_count, 15);
        assert_eq!(rules[1].value, RuleValue::Text("paired_hedge".into()));
    }

    #[test]
    fn test_directional_entry_rules() {
        let trades = vec![
            make_trade(0, "m1", "Yes", TradeSide::Buy, 0.30, 30.0),
            make_trade(100, "m1", "Yes", TradeSide::Buy, 0.40, 40.0),
            make_trade(200, "m2", "No", TradeSide::Buy, 0.60, 60.0),
        ];
        let extractor = RuleExtractor::new(0.5, 1);
        let rules = extractor
            .extract_entry_rules(&trades, BlueprintStrategy::Directional)
            .unwrap();

        assert_eq!(rules.len(), 2);
        assert!(rules[0].condition.contains("Buy YES"));
        assert!((rules[0].value.as_number().unwrap() - 0.35).abs() < 1e-9);
        assert!(rules[1].condition.contains("Buy NO"));
    }

    #[test]
    fn test_arbitrage_exit_hold_to_resolution() {
        // No sells anywhere: every market is held to resolution
        let extractor = RuleExtractor::new(0.5, 5);
        let rules = extractor
            .extract_exit_rules(&hedged_history(), BlueprintStrategy::ArbitrageBinary)
            .unwrap();

        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].condition, "Hold to market resolution");
        assert!((rules[0].confidence - 1.0).abs() < 1e-9);
        assert_eq!(rules[0].evidence_count, 15);
    }

    #[test]
    fn test_swing_exit_rules() {
        let mut trades = Vec::new();
        for i in 0..12 {
            let market = format!("m{i}");
            trades.push(make_trade(i * 100_000, &market, "Yes", TradeSide::Buy, 0.50, 50.0));
            trades.push(make_trade(
                i * 100_000 + 7200,
                &market,
                "Yes",
                TradeSide::Sell,
                0.60,
                60.0,
            ));
        }
        let extractor = RuleExtractor::new(0.5, 5);
        let rules = extractor
            .extract_exit_rules(&trades, BlueprintStrategy::Directional)
            .unwrap();

        let time_exit = rules.iter().find(|r| r.condition.contains("Exit after")).unwrap();
        assert!(time_exit.condition.contains("2.0 hours"));
        assert!((time_exit.value.as_number().unwrap() - 7200.0).abs() < 1e-9);

        let take_profit = rules.iter().find(|r| r.condition.contains("Take profit")).unwrap();
        assert!(take_profit.condition.contains("20.0% gain"));
    }

    #[test]
    fn test_sizing_fixed_rule() {
        let trades: Vec<Trade> = (0..20)
            .map(|i| make_trade(i * 1000, "m1", "Yes", TradeSide::Buy, 0.5, 100.0))
            .collect();
        let extractor = RuleExtractor::new(0.5, 5);
        let rules = extractor.extract_sizing_rules(&trades).unwrap();

        let fixed = rules.iter().find(|r| r.condition.contains("Fixed position")).unwrap();
        assert!((fixed.confidence - 1.0).abs() < 1e-9);
        assert!((fixed.value.as_number().unwrap() - 100.0).abs() < 1e-9);

        // All buys, so exposure peaks at the full stake
        let exposure = rules
            .iter()
            .find(|r| r.condition.contains("Maximum concurrent exposure"))
            .unwrap();
        assert!((exposure.value.as_number().unwrap() - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn test_sizing_dynamic_rule() {
        let trades: Vec<Trade> = (0..20)
            .map(|i| {
                make_trade(
                    i * 1000,
                    "m1",
                    "Yes",
                    TradeSide::Buy,
                    0.5,
                    50.0 + (i as f64) * 40.0,
                )
            })
            .collect();
        let extractor = RuleExtractor::new(0.5, 5);
        let rules = extractor.extract_sizing_rules(&trades).unwrap();
        assert!(rules.iter().any(|r| r.condition.contains("Dynamic sizing")));
    }

    #[test]
    fn test_max_exposure_releases_on_sell() {
        let trades = vec![
            make_trade(0, "m1", "Yes", TradeSide::Buy, 0.5, 100.0),
            make_trade(10, "m2", "Yes", TradeSide::Buy, 0.5, 100.0),
            make_trade(20, "m1", "Yes", TradeSide::Sell, 0.6, 120.0),
            make_trade(30, "m3", "Yes", TradeSide::Buy, 0.5, 50.0),
        ];
        assert!((max_concurrent_exposure(&trades) - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_market_filter_keyword_focus() {
        let mut trades = Vec::new();
        for i in 0..10 {
            let mut t = make_trade(i, &format!("m{i}"), "Yes", TradeSide::Buy, 0.5, 50.0);
            t.market_title = format!("Lakers up by {i} in NBA");
            trades.push(t);
        }
        let extractor = RuleExtractor::new(0.5, 5);
        let rules = extractor.extract_market_filters(&trades).unwrap();

        let focus = rules.iter().find(|r| r.condition.contains("Focus on")).unwrap();
        assert!(focus.condition.contains("lakers"));
        assert_eq!(focus.evidence_count, 10);

        let structure = rules.iter().find(|r| r.condition.contains("outcome markets")).unwrap();
        assert!(structure.condition.contains("binary"));
    }

    #[test]
    fn test_threshold_filter_is_monotonic() {
        let trades = hedged_history();
        let loose = RuleExtractor::new(0.5, 1);
        let confident = RuleExtractor::new(0.92, 1);
        let evidenced = RuleExtractor::new(0.5, 50);

        for strategy in [
            BlueprintStrategy::ArbitrageBinary,
            BlueprintStrategy::Directional,
        ] {
            let base = loose.extract_entry_rules(&trades, strategy).unwrap().len();
            assert!(confident.extract_entry_rules(&trades, strategy).unwrap().len() <= base);
            assert!(evidenced.extract_entry_rules(&trades, strategy).unwrap().len() <= base);
        }

        let base = loose.extract_sizing_rules(&trades).unwrap().len();
        assert!(confident.extract_sizing_rules(&trades).unwrap().len() <= base);
        assert!(evidenced.extract_sizing_rules(&trades).unwrap().len() <= base);
    }

    #[test]
    fn test_thresholds_drop_weak_rules() {
        // Directional rules carry 0.6 confidence; a 0.7 floor removes them
        let trades = vec![
            make_trade(0, "m1", "Yes", TradeSide::Buy, 0.30, 30.0),
            make_trade(100, "m1", "Yes", TradeSide::Buy, 0.40, 40.0),
        ];
        let strict = RuleExtractor::new(0.7, 1);
        let rules = strict
            .extract_entry_rules(&trades, BlueprintStrategy::Directional)
            .unwrap();
        assert!(rules.is_empty());
    }
}
