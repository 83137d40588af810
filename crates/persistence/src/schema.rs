//! Database schema definitions

/// SQL to create all tables
pub const CREATE_TABLES: &str = r#"
-- Analyzed wallet reports, one row per wallet (latest scan wins)
CREATE TABLE IF NOT EXISTS wallet_reports (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    address TEXT NOT NULL UNIQUE,
    user_name TEXT,
    total_pnl REAL NOT NULL DEFAULT 0,
    total_volume REAL NOT NULL DEFAULT 0,
    portfolio_value REAL,
    strategy TEXT NOT NULL,
    strategy_confidence REAL NOT NULL DEFAULT 0,
    win_rate REAL NOT NULL DEFAULT 0,
    sharpe_ratio REAL NOT NULL DEFAULT 0,
    risk_score REAL NOT NULL DEFAULT 0,
    replicability_score REAL NOT NULL DEFAULT 0,
    edge_estimate REAL NOT NULL DEFAULT 0,
    alpha_score REAL NOT NULL DEFAULT 0,
    is_valid INTEGER NOT NULL DEFAULT 0,
    confidence_tier TEXT NOT NULL DEFAULT 'INSUFFICIENT',
    sample_size INTEGER NOT NULL DEFAULT 0,
    win_rate_p_value REAL,
    consistency_variance REAL,
    rejection_reason TEXT,
    trade_count INTEGER NOT NULL DEFAULT 0,
    unique_markets INTEGER NOT NULL DEFAULT 0,
    signals_json TEXT,
    analysis_json TEXT,
    alerted INTEGER NOT NULL DEFAULT 0,
    analyzed_at INTEGER DEFAULT (strftime('%s', 'now'))
);

-- Raw trade cache, deduplicated by content hash
CREATE TABLE IF NOT EXISTS wallet_trades (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    address TEXT NOT NULL,
    trade_hash TEXT NOT NULL UNIQUE,
    market_id TEXT NOT NULL,
    market_title TEXT NOT NULL DEFAULT '',
    outcome TEXT NOT NULL DEFAULT '',
    side TEXT NOT NULL,
    shares REAL NOT NULL DEFAULT 0,
    price REAL NOT NULL DEFAULT 0,
    value REAL NOT NULL DEFAULT 0,
    timestamp INTEGER NOT NULL,
    created_at INTEGER DEFAULT (strftime('%s', 'now'))
);

-- Daily crowding snapshots per strategy
CREATE TABLE IF NOT EXISTS saturation_snapshots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    strategy TEXT NOT NULL,
    day TEXT NOT NULL,
    wallet_count INTEGER NOT NULL DEFAULT 0,
    total_volume REAL NOT NULL DEFAULT 0,
    created_at INTEGER DEFAULT (strftime('%s', 'now')),
    UNIQUE(strategy, day)
);

-- ========== INDEXES ==========

-- Wallet report indexes
CREATE INDEX IF NOT EXISTS idx_reports_alpha ON wallet_reports(alpha_score DESC);
CREATE INDEX IF NOT EXISTS idx_reports_valid ON wallet_reports(is_valid, alpha_score DESC);

-- Trade cache indexes
CREATE INDEX IF NOT EXISTS idx_trades_address ON wallet_trades(address, timestamp DESC);

-- Saturation indexes
CREATE INDEX IF NOT EXISTS idx_saturation_strategy ON saturation_snapshots(strategy, day)
"#;

/// ALTER TABLE migrations for databases created before a column existed.
/// The runner tolerates "duplicate column name" errors on re-runs.
pub const MIGRATIONS: &[&str] = &[
    "ALTER TABLE wallet_reports ADD COLUMN variance_assumed INTEGER NOT NULL DEFAULT 0",
    "ALTER TABLE wallet_reports ADD COLUMN blueprint_json TEXT",
];
