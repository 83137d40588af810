//! Strategy blueprints: everything the extractor learned about one wallet,
//! assembled into a document a human (or a bot) could trade from.

use crate::analyzer::WalletAnalysis;
use crate::rules::{
    group_by_market, max_concurrent_exposure, BlueprintStrategy, Rule, RuleError, RuleExtractor,
    RuleKind,
};
use crate::types::{sorted_by_time, MarketKind, Trade, TradeSide, WalletProfile};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use thiserror::Error;

/// Buffer applied on top of the wallet's observed peak exposure.
const EXPOSURE_BUFFER: f64 = 1.5;
/// Nobody replicates a strategy with pocket change.
const MIN_CAPITAL: f64 = 1000.0;

const HEDGED_MARKET_RATIO: f64 = 0.7;
const FULL_SET_RATIO: f64 = 0.5;
const MAKER_WIN_RATE: f64 = 0.90;
const MAKER_TRADES_PER_DAY: f64 = 100.0;
const SNIPER_MAX_HOLD_SECS: f64 = 3600.0;

#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("replicability score must be a finite value in [0, 1], got {0}")]
    InvalidReplicability(f64),
    #[error(transparent)]
    Rule(#[from] RuleError),
}

// ---------------------------------------------------------------------------
// Blueprint model
// ---------------------------------------------------------------------------

/// Observed edge, split three ways. Each component is `None` when the
/// history has no basis for it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeBreakdown {
    pub daily_pnl: Option<f64>,
    pub per_trade_pnl: Option<f64>,
    /// Per-trade PnL as a percentage of the average position size.
    pub per_trade_pct: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyBlueprint {
    pub name: String,
    pub strategy: BlueprintStrategy,
    pub entry_rules: Vec<Rule>,
    pub exit_rules: Vec<Rule>,
    pub sizing_rules: Vec<Rule>,
    pub market_filters: Vec<Rule>,
    pub estimated_edge: EdgeBreakdown,
    /// Peak observed exposure times [`EXPOSURE_BUFFER`], floored at
    /// [`MIN_CAPITAL`].
    pub capital_required: f64,
    /// 0 (forget it) to 1 (mechanical).
    pub replicability_score: f64,
    pub timeframe: String,
    /// Trades per day over the observed history.
    pub trade_frequency: f64,
    pub win_rate: f64,
    pub risk_profile: String,
    pub notes: String,
}

// ---------------------------------------------------------------------------
// Classification for replication purposes
// ---------------------------------------------------------------------------

/// Decides which rule book to write. This is a coarser cut than the
/// behavioral classifier: it only cares about what a copier would have to
/// actually do, not how the wallet behaves statistically.
pub fn classify_strategy(trades: &[Trade], analysis: &WalletAnalysis) -> BlueprintStrategy {
    if trades.is_empty() {
        return BlueprintStrategy::Hybrid;
    }

    let by_market = group_by_market(trades);
    let market_count = by_market.len() as f64;

    // Hedged binary markets: both YES and NO bought in the same market.
    let hedged = by_market
        .values()
        .filter(|ts| {
            let yes = ts.iter().any(|t| t.side == TradeSide::Buy && t.is_yes());
            let no = ts.iter().any(|t| t.side == TradeSide::Buy && t.is_no());
            yes && no
        })
        .count() as f64;
    if hedged / market_count > HEDGED_MARKET_RATIO {
        return BlueprintStrategy::ArbitrageBinary;
    }

    // Full-set buying in multi-outcome markets.
    let mut multi_markets = 0usize;
    let mut full_sets = 0usize;
    for market_trades in by_market.values() {
        if market_trades
            .iter()
            .any(|t| t.market_kind == MarketKind::Multi)
        {
            multi_markets += 1;
            let bought: HashSet<&str> = market_trades
                .iter()
                .filter(|t| t.side == TradeSide::Buy)
                .map(|t| t.outcome.as_str())
                .collect();
            if bought.len() >= 3 {
                full_sets += 1;
            }
        }
    }
    if multi_markets > 0 && full_sets as f64 / multi_markets as f64 > FULL_SET_RATIO {
        return BlueprintStrategy::ArbitrageMulti;
    }

    if analysis.win_rate > MAKER_WIN_RATE && analysis.timing.trades_per_day > MAKER_TRADES_PER_DAY {
        return BlueprintStrategy::MarketMaker;
    }
    if analysis.timing.avg_hold_secs > 0.0 && analysis.timing.avg_hold_secs < SNIPER_MAX_HOLD_SECS {
        return BlueprintStrategy::Sniper;
    }
    BlueprintStrategy::Directional
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

pub fn build_blueprint(
    profile: &WalletProfile,
    trades: &[Trade],
    analysis: &WalletAnalysis,
    extractor: &RuleExtractor,
) -> Result<StrategyBlueprint, BlueprintError> {
    let sorted = sorted_by_time(trades);
    let strategy = classify_strategy(&sorted, analysis);

    let entry_rules = extractor.extract_entry_rules(&sorted, strategy)?;
    let exit_rules = extractor.extract_exit_rules(&sorted, strategy)?;
    let sizing_rules = extractor.extract_sizing_rules(&sorted)?;
    let market_filters = extractor.extract_market_filters(&sorted)?;

    let replicability_score =
        replicability(&entry_rules, &exit_rules, &sizing_rules, &market_filters);
    if !replicability_score.is_finite() || !(0.0..=1.0).contains(&replicability_score) {
        return Err(BlueprintError::InvalidReplicability(replicability_score));
    }

    let capital_required = (max_concurrent_exposure(&sorted) * EXPOSURE_BUFFER).max(MIN_CAPITAL);
    let timeframe = timeframe_label(analysis.timing.avg_hold_secs).to_string();
    let risk_profile = risk_profile_label(strategy, analysis.win_rate);
    let notes = build_notes(strategy, analysis, profile);

    Ok(StrategyBlueprint {
        name: format!("{} ({})", strategy.label(), short_address(&profile.address)),
        strategy,
        entry_rules,
        exit_rules,
        sizing_rules,
        market_filters,
        estimated_edge: estimate_edge(profile),
        capital_required,
        replicability_score,
        timeframe,
        trade_frequency: analysis.timing.trades_per_day,
        win_rate: analysis.win_rate,
        risk_profile,
        notes,
    })
}

fn estimate_edge(profile: &WalletProfile) -> EdgeBreakdown {
    let daily_pnl = (profile.active_days > 0.0).then(|| profile.total_pnl / profile.active_days);
    let per_trade_pnl =
        (profile.total_trades > 0).then(|| profile.total_pnl / profile.total_trades as f64);
    let per_trade_pct = match per_trade_pnl {
        Some(pnl) if profile.avg_trade_size > 0.0 => Some(pnl / profile.avg_trade_size * 100.0),
        _ => None,
    };
    EdgeBreakdown {
        daily_pnl,
        per_trade_pnl,
        per_trade_pct,
    }
}

/// How mechanically copyable the rule set is. Averages rule confidence,
/// coverage of the four rule categories, evidence depth, and a simplicity
/// bonus that decays as the rule count grows.
fn replicability(entry: &[Rule], exit: &[Rule], sizing: &[Rule], filters: &[Rule]) -> f64 {
    let all: Vec<&Rule> = entry
        .iter()
        .chain(exit)
        .chain(sizing)
        .chain(filters)
        .collect();
    if all.is_empty() {
        return 0.3;
    }

    let avg_confidence = all.iter().map(|r| r.confidence).sum::<f64>() / all.len() as f64;
    let kinds: HashSet<RuleKind> = all.iter().map(|r| r.kind).collect();
    let completeness = kinds.len() as f64 / 4.0;
    let total_evidence: usize = all.iter().map(|r| r.evidence_count).sum();
    let evidence_depth = (total_evidence as f64 / 1000.0).min(1.0);
    let simplicity = (1.0 - all.len() as f64 / 20.0).max(0.0) * 0.5;

    (avg_confidence + completeness + evidence_depth + simplicity) / 4.0
}

fn timeframe_label(avg_hold_secs: f64) -> &'static str {
    if avg_hold_secs <= 0.0 {
        return "unknown";
    }
    match avg_hold_secs {
        s if s < 1800.0 => "< 30 minutes",
        s if s < 7200.0 => "< 2 hours",
        s if s < 86_400.0 => "< 1 day",
        s if s < 604_800.0 => "< 1 week",
        s if s < 2_592_000.0 => "< 1 month",
        _ => "> 1 month",
    }
}

fn risk_profile_label(strategy: BlueprintStrategy, win_rate: f64) -> String {
    match strategy {
        BlueprintStrategy::ArbitrageBinary | BlueprintStrategy::ArbitrageMulti => {
            "Very Low (hedged arbitrage)".to_string()
        }
        BlueprintStrategy::MarketMaker => "Low (inventory risk only)".to_string(),
        BlueprintStrategy::Sniper => "Medium (timing dependent)".to_string(),
        BlueprintStrategy::Directional => {
            if win_rate > 0.7 {
                "Medium (directional with high win rate)".to_string()
            } else {
                "High (directional)".to_string()
            }
        }
        BlueprintStrategy::Hybrid => "Unknown".to_string(),
    }
}

fn build_notes(
    strategy: BlueprintStrategy,
    analysis: &WalletAnalysis,
    profile: &WalletProfile,
) -> String {
    let mut lines = Vec::new();
    match strategy {
        BlueprintStrategy::ArbitrageBinary | BlueprintStrategy::ArbitrageMulti => {
            lines.push(
                "Profit is locked in at entry. Execution speed and fee drag decide whether \
                 the edge survives replication."
                    .to_string(),
            );
        }
        BlueprintStrategy::MarketMaker => {
            lines.push(
                "Edge comes from spread capture. Requires continuous quoting and inventory \
                 management."
                    .to_string(),
            );
        }
        BlueprintStrategy::Sniper => {
            lines.push(
                "Edge depends on reacting to events faster than the market. Latency matters \
                 more than capital."
                    .to_string(),
            );
        }
        BlueprintStrategy::Directional => {
            lines.push(
                "Directional conviction strategy. The forecast itself is the part no rule \
                 set can capture."
                    .to_string(),
            );
        }
        BlueprintStrategy::Hybrid => {
            lines.push("No single archetype dominates this trade history.".to_string());
        }
    }
    if analysis.win_rate > 0.9 && analysis.closed_trades >= 50 {
        lines.push(format!(
            "Win rate of {:.1}% held across {} resolved trades.",
            analysis.win_rate * 100.0,
            analysis.closed_trades
        ));
    }
    if profile.active_days > 90.0 {
        lines.push(format!(
            "Track record spans {:.0} days.",
            profile.active_days
        ));
    }
    if analysis.concentration.gini > 0.5 {
        lines.push("Profits are concentrated in a few markets. Expect lumpy returns.".to_string());
    }
    lines.join("\n")
}

fn short_address(address: &str) -> String {
    if address.len() > 12 && address.is_ascii() {
        format!("{}..{}", &address[..8], &address[address.len() - 4..])
    } else {
        address.to_string()
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Pseudocode rendering, the format quants actually read.
pub fn render_pseudocode(bp: &StrategyBlueprint) -> String {
    let banner = "=".repeat(80);
    let mut out = String::new();

    out.push_str(&format!("{banner}\n"));
    out.push_str(&format!("STRATEGY BLUEPRINT: {}\n", bp.name));
    out.push_str(&format!(
        "Type: {} | Replicability: {:.0}% | Risk: {}\n",
        bp.strategy.label(),
        bp.replicability_score * 100.0,
        bp.risk_profile
    ));
    out.push_str(&format!("{banner}\n\n"));

    out.push_str("# INITIALIZATION\n");
    out.push_str(&format!("starting_capital   = ${:.0}\n", bp.capital_required));
    out.push_str(&format!(
        "expected_frequency = {:.1} trades/day\n",
        bp.trade_frequency
    ));
    out.push_str(&format!(
        "expected_win_rate  = {:.1}%\n",
        bp.win_rate * 100.0
    ));
    out.push_str(&format!("typical_hold       = {}\n\n", bp.timeframe));

    out.push_str("# MARKET SELECTION\n");
    out.push_str("for market in market_feed:\n");
    if bp.market_filters.is_empty() {
        out.push_str("    accept any market\n");
    } else {
        for rule in &bp.market_filters {
            out.push_str(&format!(
                "    require {}    {}\n",
                rule.condition,
                rule_tag(rule)
            ));
        }
    }
    out.push('\n');

    out.push_str("# ENTRY\n");
    if bp.entry_rules.is_empty() {
        out.push_str("(no entry rule cleared the evidence thresholds)\n");
    } else {
        for rule in &bp.entry_rules {
            out.push_str(&format!("when {}    {}\n", rule.condition, rule_tag(rule)));
            out.push_str("    open_position()\n");
        }
    }
    out.push('\n');

    out.push_str("# POSITION SIZING\n");
    if bp.sizing_rules.is_empty() {
        out.push_str("(no sizing rule cleared the evidence thresholds)\n");
    } else {
        for rule in &bp.sizing_rules {
            out.push_str(&format!("{}    {}\n", rule.condition, rule_tag(rule)));
        }
    }
    out.push('\n');

    out.push_str("# EXIT\n");
    if bp.exit_rules.is_empty() {
        out.push_str("(no exit rule cleared the evidence thresholds)\n");
    } else {
        for rule in &bp.exit_rules {
            out.push_str(&format!("when {}    {}\n", rule.condition, rule_tag(rule)));
            out.push_str("    close_position()\n");
        }
    }
    out.push('\n');

    out.push_str("# EXPECTED PERFORMANCE\n");
    if let Some(daily) = bp.estimated_edge.daily_pnl {
        out.push_str(&format!("daily_pnl      = ${daily:.2}\n"));
    }
    if let Some(per_trade) = bp.estimated_edge.per_trade_pnl {
        out.push_str(&format!("per_trade_pnl  = ${per_trade:.2}\n"));
    }
    if let Some(pct) = bp.estimated_edge.per_trade_pct {
        out.push_str(&format!("per_trade_edge = {pct:.2}%\n"));
    }

    if !bp.notes.is_empty() {
        out.push_str("\n# NOTES\n");
        out.push_str(&bp.notes);
        out.push('\n');
    }

    out
}

/// Markdown rendering for report pages.
pub fn render_markdown(bp: &StrategyBlueprint) -> String {
    let mut out = String::new();

    out.push_str(&format!("# {}\n\n", bp.name));
    out.push_str(&format!("**Type:** {}\n", bp.strategy.label()));
    out.push_str(&format!("**Risk profile:** {}\n", bp.risk_profile));
    out.push_str(&format!(
        "**Replicability:** {:.0}%\n",
        bp.replicability_score * 100.0
    ));
    out.push_str(&format!("**Typical hold:** {}\n", bp.timeframe));
    out.push_str(&format!(
        "**Capital required:** ${:.0}\n\n",
        bp.capital_required
    ));

    markdown_section(&mut out, "Market Filters", &bp.market_filters);
    markdown_section(&mut out, "Entry Rules", &bp.entry_rules);
    markdown_section(&mut out, "Position Sizing", &bp.sizing_rules);
    markdown_section(&mut out, "Exit Rules", &bp.exit_rules);

    out.push_str("## Expected Performance\n\n");
    out.push_str("| Metric | Value |\n|---|---|\n");
    out.push_str(&format!("| Win rate | {:.1}% |\n", bp.win_rate * 100.0));
    out.push_str(&format!("| Trades per day | {:.1} |\n", bp.trade_frequency));
    if let Some(daily) = bp.estimated_edge.daily_pnl {
        out.push_str(&format!("| Daily PnL | ${daily:.2} |\n"));
    }
    if let Some(per_trade) = bp.estimated_edge.per_trade_pnl {
        out.push_str(&format!("| Per-trade PnL | ${per_trade:.2} |\n"));
    }
    if let Some(pct) = bp.estimated_edge.per_trade_pct {
        out.push_str(&format!("| Per-trade edge | {pct:.2}% |\n"));
    }
    out.push('\n');

    if !bp.notes.is_empty() {
        out.push_str("## Notes\n\n");
        out.push_str(&bp.notes);
        out.push('\n');
    }

    out
}

fn markdown_section(out: &mut String, title: &str, rules: &[Rule]) {
    out.push_str(&format!("## {title}\n\n"));
    if rules.is_empty() {
        out.push_str("None extracted.\n\n");
        return;
    }
    for rule in rules {
        out.push_str(&format!(
            "- `{}` (confidence {:.0}%, evidence {})\n",
            rule.condition,
            rule.confidence * 100.0,
            rule.evidence_count
        ));
    }
    out.push('\n');
}

/// Machine-readable config for feeding a replication bot. Entry and exit
/// rules above 80% confidence and filters above 70% are flagged required.
pub fn render_config(bp: &StrategyBlueprint) -> serde_json::Value {
    json!({
        "name": bp.name,
        "strategy": bp.strategy,
        "capital_required": bp.capital_required,
        "replicability_score": bp.replicability_score,
        "timeframe": bp.timeframe,
        "risk_profile": bp.risk_profile,
        "market_filters": flagged_entries(&bp.market_filters, 0.7),
        "entry": flagged_entries(&bp.entry_rules, 0.8),
        "exit": flagged_entries(&bp.exit_rules, 0.8),
        "sizing": plain_entries(&bp.sizing_rules),
        "expected": {
            "win_rate": bp.win_rate,
            "trades_per_day": bp.trade_frequency,
            "daily_pnl": bp.estimated_edge.daily_pnl,
            "per_trade_pnl": bp.estimated_edge.per_trade_pnl,
            "per_trade_pct": bp.estimated_edge.per_trade_pct,
        },
        "notes": bp.notes,
    })
}

fn flagged_entries(rules: &[Rule], required_above: f64) -> Vec<serde_json::Value> {
    rules
        .iter()
        .map(|r| {
            json!({
                "condition": r.condition,
                "value": r.value,
                "confidence": r.confidence,
                "evidence": r.evidence_count,
                "required": r.confidence > required_above,
            })
        })
        .collect()
}

fn plain_entries(rules: &[Rule]) -> Vec<serde_json::Value> {
    rules
        .iter()
        .map(|r| {
            json!({
                "condition": r.condition,
                "value": r.value,
                "confidence": r.confidence,
            })
        })
        .collect()
}

fn rule_tag(rule: &Rule) -> String {
    format!(
        "(confidence {:.0}%, n={})",
        rule.confidence * 100.0,
        rule.evidence_count
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::WalletAnalyzer;

    fn make_trade(
        ts: i64,
        market: &str,
        outcome: &str,
        side: TradeSide,
        shares: f64,
        price: f64,
    ) -> Trade {
        Trade {
            timestamp: ts,
            market_id: market.to_string(),
            market_title: format!("{market} test market"),
            outcome: outcome.to_string(),
            side,
            shares,
            price,
            value: shares * price,
            is_maker: false,
            market_kind: MarketKind::Binary,
            category: None,
            realized_pnl: None,
            exit_timestamp: None,
        }
    }

    fn make_profile(address: &str, trades: &[Trade]) -> WalletProfile {
        let total_pnl: f64 = trades.iter().filter_map(|t| t.realized_pnl).sum();
        WalletProfile {
            address: address.to_string(),
            first_seen: trades.iter().map(|t| t.timestamp).min(),
            active_days: 30.0,
            total_pnl,
            total_trades: trades.len(),
            win_rate: 0.9,
            avg_trade_size: 50.0,
            markets_traded: 3,
            portfolio_value: None,
        }
    }

    fn hedged_arb_trades() -> Vec<Trade> {
        let mut trades = Vec::new();
        for (i, market) in ["m0", "m1", "m2"].iter().enumerate() {
            let base = 1_000 + i as i64 * 600;
            trades.push(make_trade(base, market, "Yes", TradeSide::Buy, 1000.0, 0.45));
            trades.push(make_trade(
                base + 30,
                market,
                "No",
                TradeSide::Buy,
                1000.0,
                0.50,
            ));
        }
        trades
    }

    #[test]
    fn classifies_hedged_binary_arbitrage() {
        let trades = hedged_arb_trades();
        let analysis = WalletAnalyzer::default().analyze(&trades);
        assert_eq!(
            classify_strategy(&trades, &analysis),
            BlueprintStrategy::ArbitrageBinary
        );
    }

    #[test]
    fn classifies_full_set_multi_arbitrage() {
        let mut trades = Vec::new();
        for (i, market) in ["m0", "m1"].iter().enumerate() {
            let base = 1_000 + i as i64 * 600;
            for (j, outcome) in ["Candidate A", "Candidate B", "Candidate C"]
                .iter()
                .enumerate()
            {
                let mut t = make_trade(
                    base + j as i64,
                    market,
                    outcome,
                    TradeSide::Buy,
                    100.0,
                    0.30,
                );
                t.market_kind = MarketKind::Multi;
                trades.push(t);
            }
        }
        let analysis = WalletAnalyzer::default().analyze(&trades);
        assert_eq!(
            classify_strategy(&trades, &analysis),
            BlueprintStrategy::ArbitrageMulti
        );
    }

    #[test]
    fn hold_time_separates_sniper_from_directional() {
        // One-sided buys across many markets, closed quickly.
        let mut fast = Vec::new();
        for i in 0..12i64 {
            let mut t = make_trade(
                i * 86_400,
                &format!("m{i}"),
                "Yes",
                TradeSide::Buy,
                100.0,
                0.50,
            );
            t.realized_pnl = Some(5.0);
            t.exit_timestamp = Some(i * 86_400 + 600);
            fast.push(t);
        }
        let analysis = WalletAnalyzer::default().analyze(&fast);
        assert_eq!(
            classify_strategy(&fast, &analysis),
            BlueprintStrategy::Sniper
        );

        let mut slow = fast.clone();
        for t in &mut slow {
            t.exit_timestamp = Some(t.timestamp + 720_000);
        }
        let analysis = WalletAnalyzer::default().analyze(&slow);
        assert_eq!(
            classify_strategy(&slow, &analysis),
            BlueprintStrategy::Directional
        );
    }

    #[test]
    fn empty_history_is_hybrid() {
        let analysis = WalletAnalyzer::default().analyze(&[]);
        assert_eq!(classify_strategy(&[], &analysis), BlueprintStrategy::Hybrid);
    }

    #[test]
    fn builds_arbitrage_blueprint_end_to_end() {
        let trades = hedged_arb_trades();
        let profile = make_profile("0x1234567890abcdef1234", &trades);
        let analysis = WalletAnalyzer::default().analyze(&trades);
        let extractor = RuleExtractor::new(0.5, 1);

        let bp = build_blueprint(&profile, &trades, &analysis, &extractor).unwrap();

        assert_eq!(bp.strategy, BlueprintStrategy::ArbitrageBinary);
        assert!(!bp.entry_rules.is_empty());
        assert!(bp.name.contains("Arbitrage"));
        assert!(bp.name.contains("0x123456"));
        // Six buys of ~$450-500 never closed: peak exposure 2850, buffered.
        assert!((bp.capital_required - 2850.0 * EXPOSURE_BUFFER).abs() < 1e-9);
        assert!((0.0..=1.0).contains(&bp.replicability_score));
        assert_eq!(bp.risk_profile, "Very Low (hedged arbitrage)");
    }

    #[test]
    fn unextractable_history_gets_floor_replicability() {
        let trades = hedged_arb_trades();
        let profile = make_profile("0xabc", &trades);
        let analysis = WalletAnalyzer::default().analyze(&trades);
        // Thresholds nothing can clear.
        let extractor = RuleExtractor::new(0.99, 1_000_000);

        let bp = build_blueprint(&profile, &trades, &analysis, &extractor).unwrap();
        assert!(bp.entry_rules.is_empty());
        assert!(bp.exit_rules.is_empty());
        assert!((bp.replicability_score - 0.3).abs() < 1e-9);
    }

    #[test]
    fn capital_is_floored_for_small_wallets() {
        let trades = vec![make_trade(1_000, "m0", "Yes", TradeSide::Buy, 10.0, 0.50)];
        let profile = make_profile("0xabc", &trades);
        let analysis = WalletAnalyzer::default().analyze(&trades);
        let bp =
            build_blueprint(&profile, &trades, &analysis, &RuleExtractor::default()).unwrap();
        assert!((bp.capital_required - MIN_CAPITAL).abs() < 1e-9);
    }

    #[test]
    fn timeframe_labels_cover_the_scale() {
        assert_eq!(timeframe_label(0.0), "unknown");
        assert_eq!(timeframe_label(900.0), "< 30 minutes");
        assert_eq!(timeframe_label(3600.0), "< 2 hours");
        assert_eq!(timeframe_label(30_000.0), "< 1 day");
        assert_eq!(timeframe_label(90_000.0), "< 1 week");
        assert_eq!(timeframe_label(1_000_000.0), "< 1 month");
        assert_eq!(timeframe_label(10_000_000.0), "> 1 month");
    }

    #[test]
    fn renders_contain_every_section() {
        let trades = hedged_arb_trades();
        let profile = make_profile("0x1234567890abcdef1234", &trades);
        let analysis = WalletAnalyzer::default().analyze(&trades);
        let extractor = RuleExtractor::new(0.5, 1);
        let bp = build_blueprint(&profile, &trades, &analysis, &extractor).unwrap();

        let pseudo = render_pseudocode(&bp);
        assert!(pseudo.contains("STRATEGY BLUEPRINT"));
        assert!(pseudo.contains("# ENTRY"));
        assert!(pseudo.contains("# EXIT"));
        assert!(pseudo.contains("open_position()"));

        let md = render_markdown(&bp);
        assert!(md.starts_with("# "));
        assert!(md.contains("## Entry Rules"));
        assert!(md.contains("## Expected Performance"));

        let config = render_config(&bp);
        assert_eq!(config["strategy"], json!("arbitrage_binary"));
        let entries = config["entry"].as_array().unwrap();
        assert!(!entries.is_empty());
        assert!(entries[0]["required"].is_boolean());
    }

    #[test]
    fn high_confidence_rules_are_flagged_required() {
        let rule = Rule::new(
            "sum(best_bid_yes + best_bid_no) < 0.97",
            0.97,
            0.9,
            50,
            RuleKind::Entry,
            json!({}),
        )
        .unwrap();
        let flagged = flagged_entries(&[rule], 0.8);
        assert_eq!(flagged[0]["required"], json!(true));
    }
}
