//! Poly Shadow Engine — wallet-strategy reverse engineering for Polymarket
//!
//! Self-contained analysis crate. Provides:
//! - Leaderboard scanner with concurrent wallet fetching
//! - Behavioral strategy classifier built on statistical signal primitives
//! - Trading-rule extraction and replicable strategy blueprints
//! - Statistical edge validation and composite alpha scoring
//! - Append-only replication ledger for paper trading

pub mod alpha;
pub mod analyzer;
pub mod api;
pub mod blueprint;
pub mod classifier;
pub mod ledger;
pub mod profile;
pub mod rules;
pub mod saturation;
pub mod scanner;
pub mod stats;
pub mod types;
pub mod validator;

// Re-exports for convenience
pub use api::PolymarketDataClient;
pub use alpha::{alpha_score, detect_signals, Signal, SignalKind};
pub use analyzer::{WalletAnalysis, WalletAnalyzer};
pub use blueprint::{
    build_blueprint, render_config, render_markdown, render_pseudocode, StrategyBlueprint,
};
pub use classifier::{classify, classification_confidence, StrategyKind};
pub use ledger::{LedgerEvent, ReplicationLedger};
pub use rules::{BlueprintStrategy, Rule, RuleExtractor, RuleKind, RuleValue};
pub use saturation::{saturation_trend, SaturationSnapshot, SaturationTrend};
pub use scanner::{run_scan, ScanConfig, ScanProgress, ScanStatus, WalletReport};
pub use types::*;
pub use validator::{validate_wallet, ConfidenceTier, ValidationResult};
