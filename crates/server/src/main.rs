//! Poly Shadow — reverse-engineers the strategies of top Polymarket wallets
//!
//! Usage:
//!   poly-shadow serve --port 3001            — Launch web server with UI
//!   poly-shadow scan --min-profit 10000      — Run a leaderboard scan from CLI
//!   poly-shadow blueprint 0xabc... --format markdown

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use clap::{Parser, Subcommand};
use engine::{
    render_config, render_markdown, render_pseudocode, run_scan, saturation_trend, LedgerEvent,
    MarketKind, PolymarketDataClient, ReplicationLedger, ScanConfig, ScanProgress, ScanStatus,
    StrategyBlueprint, Trade, TradeSide, WalletReport,
};
use persistence::repository::{CachedTradeRecord, SaturationRepository, WalletRepository};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info};

const APP_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "-", env!("GIT_HASH"));

#[derive(Parser)]
#[command(name = "poly-shadow")]
#[command(about = "Reverse-engineers the strategies of top Polymarket wallets", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the analysis web server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "0.0.0.0")]
        host: String,
        /// Port to listen on
        #[arg(short, long, default_value_t = 3001)]
        port: u16,
    },
    /// Scan the leaderboard from the CLI (no web server)
    Scan {
        /// How deep into the leaderboard to look
        #[arg(long, default_value_t = 50)]
        limit: u32,
        /// Minimum lifetime profit (USD) for a wallet to be fetched
        #[arg(long, default_value_t = 5000.0)]
        min_profit: f64,
        /// Minimum resolved win rate before deep analysis
        #[arg(long, default_value_t = 0.85)]
        min_win_rate: f64,
        /// Drop extracted rules below this confidence
        #[arg(long, default_value_t = 0.7)]
        min_confidence: f64,
        /// Drop extracted rules with fewer supporting observations
        #[arg(long, default_value_t = 10)]
        min_evidence: usize,
        /// Below this many trades the classifier reports UNKNOWN
        #[arg(long, default_value_t = 10)]
        min_trades: usize,
        /// Number of top reports to print
        #[arg(long, default_value_t = 10)]
        top_n: usize,
        /// Optional JSON export path
        #[arg(long)]
        export: Option<String>,
    },
    /// Print the stored analysis for one wallet
    Analyze {
        /// Wallet address (0x...)
        address: String,
    },
    /// Render a stored strategy blueprint
    Blueprint {
        /// Wallet address (0x...)
        address: String,
        /// Output format: pseudocode, markdown, config
        #[arg(long, default_value = "pseudocode")]
        format: String,
    },
    /// Replay a wallet's cached fills through a paper ledger
    Paper {
        /// Wallet address (0x...)
        address: String,
        /// Starting balance (USD)
        #[arg(long, default_value_t = 10000.0)]
        balance: f64,
    },
    /// Cleanup DB: keep the top N reports by alpha score, delete the rest
    Cleanup {
        /// Number of reports to keep (default 100)
        #[arg(long, default_value_t = 100)]
        keep: i64,
    },
}

#[derive(Clone)]
struct AppState {
    client: Arc<PolymarketDataClient>,
    db: Arc<persistence::Database>,
    scan_progress: Arc<ScanProgress>,
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("debug,engine=debug,poly_shadow=debug")
    } else {
        EnvFilter::new("info,engine=info,poly_shadow=info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(filter)
        .init();
}

async fn open_database() -> anyhow::Result<(persistence::Database, String)> {
    let db_path =
        std::env::var("POLY_SHADOW_DB_PATH").unwrap_or_else(|_| "data/poly_shadow.db".to_string());
    let db = persistence::Database::new(&db_path).await.map_err(|e| {
        error!("Failed to initialize database: {}", e);
        anyhow::anyhow!("Database initialization failed: {}", e)
    })?;
    Ok((db, db_path))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    dotenvy::dotenv().ok();

    match cli.command {
        Commands::Serve { host, port } => {
            cmd_serve(&host, port).await?;
        }
        Commands::Scan {
            limit,
            min_profit,
            min_win_rate,
            min_confidence,
            min_evidence,
            min_trades,
            top_n,
            export,
        } => {
            let config = ScanConfig {
                leaderboard_limit: limit,
                min_profit,
                min_win_rate,
                min_confidence,
                min_evidence,
                min_trades,
            };
            cmd_scan(config, top_n, export).await?;
        }
        Commands::Analyze { address } => {
            cmd_analyze(&address).await?;
        }
        Commands::Blueprint { address, format } => {
            cmd_blueprint(&address, &format).await?;
        }
        Commands::Paper { address, balance } => {
            cmd_paper(&address, balance).await?;
        }
        Commands::Cleanup { keep } => {
            cmd_cleanup(keep).await?;
        }
    }

    Ok(())
}

// ============================================================================
// Serve command — Axum web server
// ============================================================================

async fn cmd_serve(host: &str, port: u16) -> anyhow::Result<()> {
    info!("Poly Shadow v{} starting...", APP_VERSION);

    let (db, db_path) = open_database().await?;
    info!("Database initialized: {}", db_path);

    let state = AppState {
        client: Arc::new(PolymarketDataClient::new()),
        db: Arc::new(db),
        scan_progress: Arc::new(ScanProgress::new()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Determine static files directory
    let exe_path = std::env::current_exe().unwrap_or_default();
    let exe_dir = exe_path.parent().unwrap_or(std::path::Path::new("."));
    let dist_dir = exe_dir.join("dist");
    let static_dir = if dist_dir.exists() {
        dist_dir
    } else {
        std::path::PathBuf::from("dist")
    };

    let api_routes = Router::new()
        .route("/health", get(api_health))
        .route("/scan", post(api_start_scan))
        .route("/scan/status", get(api_scan_status))
        .route("/scan/cancel", post(api_cancel_scan))
        .route("/wallets", get(api_wallets))
        .route("/wallets/validated", get(api_validated_wallets))
        .route("/wallets/stats", get(api_wallet_stats))
        .route("/wallets/:address", get(api_wallet_detail))
        .route("/wallets/:address/blueprint", get(api_wallet_blueprint))
        .route("/wallets/:address/trades", get(api_wallet_trades))
        .route("/saturation", get(api_saturation))
        .route("/export", get(api_export))
        .with_state(state);

    let app = Router::new()
        .nest("/api", api_routes)
        .fallback_service(ServeDir::new(&static_dir))
        .layer(cors);

    let addr: std::net::SocketAddr = format!("{}:{}", host, port).parse()?;
    println!("\n=== Poly Shadow v{} ===", APP_VERSION);
    println!("Wallet Strategy Analysis Server");
    println!("Listening on http://{}", addr);
    println!("\nEndpoints:");
    println!("  GET  /api/health                      - Health check");
    println!("  POST /api/scan                        - Start leaderboard scan");
    println!("  GET  /api/scan/status                 - Poll scan progress");
    println!("  POST /api/scan/cancel                 - Cancel running scan");
    println!("  GET  /api/wallets                     - Stored wallet reports");
    println!("  GET  /api/wallets/validated           - Statistically validated wallets");
    println!("  GET  /api/wallets/stats               - Database stats");
    println!("  GET  /api/wallets/:address            - Full report for one wallet");
    println!("  GET  /api/wallets/:address/blueprint  - Render stored blueprint");
    println!("  GET  /api/wallets/:address/trades     - Cached trade history");
    println!("  GET  /api/saturation                  - Strategy saturation trends");
    println!("  GET  /api/export                      - Export reports as JSON");
    println!("\n  Database: {}", db_path);
    println!("\nPress Ctrl+C to stop\n");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============================================================================
// Scan command — CLI mode (no web server)
// ============================================================================

async fn cmd_scan(
    config: ScanConfig,
    top_n: usize,
    export: Option<String>,
) -> anyhow::Result<()> {
    println!("\n=== Poly Shadow v{} ===", APP_VERSION);

    let (db, db_path) = open_database().await?;

    // Check cached counts
    let repo = WalletRepository::new(db.pool());
    let cached_stats = repo.get_stats().await;
    let total_cached = cached_stats.as_ref().map(|s| s.total_wallets).unwrap_or(0);
    println!("Database: {} ({} wallets analyzed)", db_path, total_cached);
    println!(
        "Leaderboard depth: {} | Min profit: ${:.0} | Min win rate: {:.0}%",
        config.leaderboard_limit,
        config.min_profit,
        config.min_win_rate * 100.0
    );
    println!(
        "Rule thresholds: confidence {:.2}, evidence {} | Top N: {}",
        config.min_confidence, config.min_evidence, top_n
    );
    println!();

    let client = Arc::new(PolymarketDataClient::new());
    let progress = Arc::new(ScanProgress::new());
    let db_pool = Some(db.pool_clone());

    // Set up Ctrl+C handler so a half-finished scan still persists its results
    let progress_for_ctrlc = progress.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl+C received, requesting cancel...");
        progress_for_ctrlc
            .cancelled
            .store(true, std::sync::atomic::Ordering::Relaxed);
    });

    // Spawn the scan in background and monitor progress
    let progress_clone = progress.clone();
    let scan_handle = tokio::spawn(async move {
        run_scan(&client, &progress_clone, &config, db_pool).await;
    });

    // Progress display loop
    loop {
        tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
        let status = *progress.status.read().unwrap();
        let analyzed = progress
            .analyzed
            .load(std::sync::atomic::Ordering::Relaxed);
        let total = progress
            .total_wallets
            .load(std::sync::atomic::Ordering::Relaxed);
        let validated = progress
            .validated
            .load(std::sync::atomic::Ordering::Relaxed);
        let pct = progress.progress_pct();

        match status {
            ScanStatus::FetchingLeaderboard => {
                print!("\r  Fetching leaderboard...                                      ");
            }
            ScanStatus::AnalyzingWallets => {
                let current = progress.current_wallet.read().unwrap().clone();

                let bar_len = 30;
                let filled = (pct as usize * bar_len) / 100;
                let empty = bar_len - filled;
                let bar: String = "=".repeat(filled) + &" ".repeat(empty);

                print!(
                    "\r  Analyzing [{}] {:.0}% ({}/{}, {} validated) — {}   ",
                    bar,
                    pct,
                    analyzed,
                    total,
                    validated,
                    short_addr(&current)
                );
            }
            ScanStatus::Complete => {
                println!(
                    "\r  Complete! ({} analyzed, {} validated)                              ",
                    analyzed, validated
                );
                break;
            }
            ScanStatus::Error => {
                let err = progress.error_message.read().unwrap().clone();
                println!(
                    "\r  Error: {}                                      ",
                    err.unwrap_or_default()
                );
                break;
            }
            ScanStatus::Idle => {}
        }
    }

    // Wait for task to finish
    let _ = scan_handle.await;

    // Display results, best first
    let mut reports = progress.results.read().unwrap().clone();
    reports.sort_by(|a, b| {
        b.alpha_score
            .partial_cmp(&a.alpha_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    if reports.is_empty() {
        println!("\nNo wallets survived the filters.");
        return Ok(());
    }
    print_reports(&reports, top_n);

    // Export if requested
    if let Some(export_path) = export {
        let export_data = build_export_json(&reports, top_n);
        let json = serde_json::to_string_pretty(&export_data)?;
        std::fs::write(&export_path, &json)?;
        println!("\nReports exported to {}", export_path);
    }

    Ok(())
}

fn print_reports(reports: &[WalletReport], top_n: usize) {
    println!("\nTop {} wallets:", reports.len().min(top_n));
    println!(
        "  {:>3}  {:<16} {:<16} {:<12} {:>7} {:>7} {:>12}",
        "#", "Wallet", "Strategy", "Tier", "WR%", "Alpha", "PnL"
    );
    println!("  {}", "-".repeat(80));
    for (i, r) in reports.iter().take(top_n).enumerate() {
        println!(
            "  {:>3}  {:<16} {:<16} {:<12} {:>6.1}% {:>7.2} {:>+12.2}",
            i + 1,
            short_addr(&r.address),
            r.analysis.strategy.label(),
            r.validation.confidence.label(),
            r.profile.win_rate * 100.0,
            r.alpha_score,
            r.profile.total_pnl,
        );
    }
}

fn short_addr(address: &str) -> String {
    if address.len() > 12 && address.is_ascii() {
        format!("{}..{}", &address[..8], &address[address.len() - 4..])
    } else {
        address.to_string()
    }
}

// ============================================================================
// Analyze command — print one stored report
// ============================================================================

async fn cmd_analyze(address: &str) -> anyhow::Result<()> {
    let (db, _) = open_database().await?;
    let repo = WalletRepository::new(db.pool());

    let record = match repo.get_by_address(address).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            println!("No stored report for {}. Run `poly-shadow scan` first.", address);
            return Ok(());
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to load report: {}", e)),
    };

    println!("\n=== Wallet Report: {} ===", record.address);
    if let Some(name) = &record.user_name {
        println!("  User:                {}", name);
    }
    println!(
        "  Strategy:            {} (confidence {:.0}%)",
        record.strategy,
        record.strategy_confidence * 100.0
    );
    println!(
        "  Validation:          {}{}",
        record.confidence_tier,
        if record.is_valid { " (valid)" } else { "" }
    );
    if let Some(reason) = &record.rejection_reason {
        println!("  Rejection reason:    {}", reason);
    }
    println!("  Win rate:            {:.1}%", record.win_rate * 100.0);
    if let Some(p) = record.win_rate_p_value {
        println!("  Win rate p-value:    {:.2e}", p);
    }
    if let Some(v) = record.consistency_variance {
        println!(
            "  Consistency var:     {:.4}{}",
            v,
            if record.variance_assumed { " (assumed)" } else { "" }
        );
    }
    println!("  Sample size:         {}", record.sample_size);
    println!("  Trades / markets:    {} / {}", record.trade_count, record.unique_markets);
    println!("  Total PnL:           ${:+.2}", record.total_pnl);
    println!("  Total volume:        ${:.2}", record.total_volume);
    if let Some(value) = record.portfolio_value {
        println!("  Portfolio value:     ${:.2}", value);
    }
    println!("  Sharpe ratio:        {:.2}", record.sharpe_ratio);
    println!("  Risk score:          {:.1} / 10", record.risk_score);
    println!("  Replicability:       {:.2}", record.replicability_score);
    println!("  Edge estimate:       {:.2}% per trade", record.edge_estimate);
    println!("  Alpha score:         {:.2}", record.alpha_score);

    // Signals were stored as JSON at scan time
    let signals: serde_json::Value = record
        .signals_json
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or(serde_json::Value::Null);
    if let Some(list) = signals.as_array() {
        if !list.is_empty() {
            println!("\n  Signals:");
            for signal in list {
                println!(
                    "    - {} (strength {:.2}): {}",
                    signal["kind"].as_str().unwrap_or("?"),
                    signal["strength"].as_f64().unwrap_or(0.0),
                    signal["description"].as_str().unwrap_or("")
                );
            }
        }
    }

    if record.blueprint_json.is_some() {
        println!("\n  Blueprint stored. Render it with:");
        println!("    poly-shadow blueprint {} --format markdown", record.address);
    }
    println!();

    Ok(())
}

// ============================================================================
// Blueprint command — render a stored blueprint
// ============================================================================

fn render_blueprint(bp: &StrategyBlueprint, format: &str) -> anyhow::Result<String> {
    Ok(match format.to_lowercase().as_str() {
        "markdown" | "md" => render_markdown(bp),
        "config" | "json" => serde_json::to_string_pretty(&render_config(bp))?,
        _ => render_pseudocode(bp),
    })
}

async fn cmd_blueprint(address: &str, format: &str) -> anyhow::Result<()> {
    let (db, _) = open_database().await?;
    let repo = WalletRepository::new(db.pool());

    let record = match repo.get_by_address(address).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            println!("No stored report for {}. Run `poly-shadow scan` first.", address);
            return Ok(());
        }
        Err(e) => return Err(anyhow::anyhow!("Failed to load report: {}", e)),
    };

    let Some(blueprint_json) = &record.blueprint_json else {
        println!(
            "No blueprint stored for {} (wallet did not pass statistical validation).",
            address
        );
        return Ok(());
    };

    let bp: StrategyBlueprint = serde_json::from_str(blueprint_json)
        .map_err(|e| anyhow::anyhow!("Stored blueprint is unreadable: {}", e))?;

    println!("{}", render_blueprint(&bp, format)?);
    Ok(())
}

// ============================================================================
// Paper command — replay cached fills through a ledger
// ============================================================================

/// Cached rows carry no market kind or maker flag; the ledger ignores both.
fn cached_to_trade(rec: &CachedTradeRecord) -> Option<Trade> {
    let side = match rec.side.as_str() {
        "buy" => TradeSide::Buy,
        "sell" => TradeSide::Sell,
        _ => return None,
    };
    Some(Trade {
        timestamp: rec.timestamp,
        market_id: rec.market_id.clone(),
        market_title: rec.market_title.clone(),
        outcome: rec.outcome.clone(),
        side,
        shares: rec.shares,
        price: rec.price,
        value: rec.value,
        is_maker: false,
        market_kind: MarketKind::Binary,
        category: None,
        realized_pnl: None,
        exit_timestamp: None,
    })
}

async fn cmd_paper(address: &str, balance: f64) -> anyhow::Result<()> {
    let (db, _) = open_database().await?;
    let repo = WalletRepository::new(db.pool());

    let records = repo
        .get_trades(address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load cached trades: {}", e))?;
    if records.is_empty() {
        println!(
            "No cached trades for {}. Run a scan that covers this wallet first.",
            address
        );
        return Ok(());
    }

    let trades: Vec<Trade> = records.iter().filter_map(cached_to_trade).collect();
    let starting = Decimal::try_from(balance).unwrap_or_default();
    let ledger = ReplicationLedger::replay(starting, &trades);

    let opens = ledger
        .events()
        .iter()
        .filter(|e| matches!(e, LedgerEvent::Open { .. }))
        .count();
    let closes = ledger.events().len() - opens;

    println!("\n=== Paper Replay: {} ===", address);
    println!("  Fills replayed:      {} ({} opens, {} closes)", ledger.events().len(), opens, closes);
    println!("  Starting balance:    ${}", ledger.starting_balance());
    println!("  Cash balance:        ${}", ledger.balance());
    println!("  Open exposure:       ${}", ledger.open_exposure());
    println!("  Realized PnL:        ${}", ledger.realized_pnl());
    println!();

    Ok(())
}

// ============================================================================
// Cleanup command — keep top N reports by alpha, delete the rest
// ============================================================================

async fn cmd_cleanup(keep: i64) -> anyhow::Result<()> {
    info!("Poly Shadow DB cleanup — keeping top {} reports by alpha score", keep);

    let (db, db_path) = open_database().await?;
    info!("Database opened: {}", db_path);

    let repo = WalletRepository::new(db.pool());
    let deleted = repo
        .delete_beyond_top(keep)
        .await
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {}", e))?;

    info!("Running VACUUM to reclaim disk space...");
    repo.vacuum()
        .await
        .map_err(|e| anyhow::anyhow!("VACUUM failed: {}", e))?;

    let remaining = repo
        .get_stats()
        .await
        .map(|s| s.total_wallets)
        .unwrap_or(0);
    info!("Done! Deleted {} reports, {} remaining.", deleted, remaining);
    Ok(())
}

// ============================================================================
// API Handlers — Scan
// ============================================================================

/// GET /api/health
async fn api_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "poly-shadow",
        "version": APP_VERSION,
    }))
}

/// POST /api/scan — start a leaderboard scan
async fn api_start_scan(
    State(state): State<AppState>,
    Json(config): Json<ScanConfig>,
) -> Result<Json<serde_json::Value>, StatusCode> {
    if state.scan_progress.is_running() {
        let pct = state.scan_progress.progress_pct();
        return Ok(Json(serde_json::json!({
            "success": false,
            "message": format!("Scan already running ({:.0}% complete)", pct),
        })));
    }

    info!(
        limit = config.leaderboard_limit,
        min_profit = config.min_profit,
        min_win_rate = config.min_win_rate,
        "Starting wallet scan"
    );

    state.scan_progress.reset();

    let client = state.client.clone();
    let progress = state.scan_progress.clone();
    let db_pool = Some(state.db.pool_clone());

    tokio::spawn(async move {
        run_scan(&client, &progress, &config, db_pool).await;
    });

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Wallet scan started",
    })))
}

/// POST /api/scan/cancel — cancel running scan
async fn api_cancel_scan(State(state): State<AppState>) -> Json<serde_json::Value> {
    state
        .scan_progress
        .cancelled
        .store(true, std::sync::atomic::Ordering::Relaxed);
    info!("Scan cancel requested via API");
    Json(serde_json::json!({
        "success": true,
        "message": "Cancel requested"
    }))
}

/// GET /api/scan/status — poll scan progress
async fn api_scan_status(State(state): State<AppState>) -> Json<serde_json::Value> {
    let progress = &state.scan_progress;
    let status = *progress.status.read().unwrap();
    let current_wallet = progress.current_wallet.read().unwrap().clone();
    let total = progress
        .total_wallets
        .load(std::sync::atomic::Ordering::Relaxed);
    let analyzed = progress
        .analyzed
        .load(std::sync::atomic::Ordering::Relaxed);
    let validated = progress
        .validated
        .load(std::sync::atomic::Ordering::Relaxed);
    let pct = progress.progress_pct();
    let results = progress.results.read().unwrap().clone();
    let error = progress.error_message.read().unwrap().clone();

    Json(serde_json::json!({
        "status": status,
        "current_wallet": current_wallet,
        "progress_pct": pct,
        "total_wallets": total,
        "analyzed": analyzed,
        "validated": validated,
        "results": results,
        "error": error,
    }))
}

// ============================================================================
// API Handlers — Wallet reports
// ============================================================================

/// GET /api/wallets — stored reports, best alpha first
async fn api_wallets(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let limit: i64 = params
        .get("limit")
        .and_then(|s| s.parse().ok())
        .unwrap_or(50);

    let repo = WalletRepository::new(state.db.pool());
    match repo.get_all(limit).await {
        Ok(records) => Json(serde_json::json!({
            "success": true,
            "data": records,
            "total": records.len(),
            "limit": limit,
        })),
        Err(e) => Json(serde_json::json!({
            "success": false,
            "error": format!("Failed to query wallet reports: {}", e),
            "data": [],
            "total": 0,
        })),
    }
}

/// GET /api/wallets/validated — only wallets that passed statistical validation
async fn api_validated_wallets(State(state): State<AppState>) -> Json<serde_json::Value> {
    let repo = WalletRepository::new(state.db.pool());
    match repo.get_validated().await {
        Ok(records) => Json(serde_json::json!({
            "success": true,
            "data": records,
            "total": records.len(),
        })),
        Err(e) => Json(serde_json::json!({
            "success": false,
            "error": format!("Failed to query validated wallets: {}", e),
            "data": [],
            "total": 0,
        })),
    }
}

/// GET /api/wallets/stats — aggregated database statistics
async fn api_wallet_stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    let repo = WalletRepository::new(state.db.pool());
    match repo.get_stats().await {
        Ok(stats) => Json(serde_json::json!({
            "success": true,
            "stats": stats,
        })),
        Err(e) => Json(serde_json::json!({
            "success": false,
            "error": format!("Failed to get database stats: {}", e),
        })),
    }
}

/// GET /api/wallets/:address — full stored report with parsed JSON columns
async fn api_wallet_detail(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<serde_json::Value> {
    let repo = WalletRepository::new(state.db.pool());
    match repo.get_by_address(&address).await {
        Ok(Some(record)) => {
            let signals = parse_json_column(record.signals_json.as_deref());
            let analysis = parse_json_column(record.analysis_json.as_deref());
            let blueprint = parse_json_column(record.blueprint_json.as_deref());
            Json(serde_json::json!({
                "success": true,
                "wallet": record,
                "signals": signals,
                "analysis": analysis,
                "blueprint": blueprint,
            }))
        }
        Ok(None) => Json(serde_json::json!({
            "success": false,
            "error": format!("No report for {}", address),
        })),
        Err(e) => Json(serde_json::json!({
            "success": false,
            "error": format!("Failed to load report: {}", e),
        })),
    }
}

/// GET /api/wallets/:address/blueprint — render the stored blueprint
async fn api_wallet_blueprint(
    State(state): State<AppState>,
    Path(address): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let format = params
        .get("format")
        .cloned()
        .unwrap_or_else(|| "pseudocode".to_string());

    let repo = WalletRepository::new(state.db.pool());
    let record = match repo.get_by_address(&address).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            return Json(serde_json::json!({
                "success": false,
                "error": format!("No report for {}", address),
            }))
        }
        Err(e) => {
            return Json(serde_json::json!({
                "success": false,
                "error": format!("Failed to load report: {}", e),
            }))
        }
    };

    let Some(blueprint_json) = &record.blueprint_json else {
        return Json(serde_json::json!({
            "success": false,
            "error": format!("No blueprint for {} (did not pass validation)", address),
        }));
    };

    let bp: StrategyBlueprint = match serde_json::from_str(blueprint_json) {
        Ok(bp) => bp,
        Err(e) => {
            return Json(serde_json::json!({
                "success": false,
                "error": format!("Stored blueprint is unreadable: {}", e),
            }))
        }
    };

    if format == "config" {
        return Json(serde_json::json!({
            "success": true,
            "format": "config",
            "blueprint": render_config(&bp),
        }));
    }

    match render_blueprint(&bp, &format) {
        Ok(content) => Json(serde_json::json!({
            "success": true,
            "format": format,
            "content": content,
        })),
        Err(e) => Json(serde_json::json!({
            "success": false,
            "error": format!("Render failed: {}", e),
        })),
    }
}

/// GET /api/wallets/:address/trades — cached trade history, oldest first
async fn api_wallet_trades(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<serde_json::Value> {
    let repo = WalletRepository::new(state.db.pool());
    match repo.get_trades(&address).await {
        Ok(records) => Json(serde_json::json!({
            "success": true,
            "data": records,
            "total": records.len(),
        })),
        Err(e) => Json(serde_json::json!({
            "success": false,
            "error": format!("Failed to load cached trades: {}", e),
            "data": [],
            "total": 0,
        })),
    }
}

// ============================================================================
// API Handlers — Saturation
// ============================================================================

/// GET /api/saturation — per-strategy crowding trends
///
/// With ?strategy= returns the full day-by-day history for one strategy;
/// without it returns the latest snapshot and trend for every strategy.
async fn api_saturation(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<serde_json::Value> {
    let limit: i64 = params
        .get("days")
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);

    let repo = SaturationRepository::new(state.db.pool());

    if let Some(strategy) = params.get("strategy") {
        return match repo.get_history(strategy, limit).await {
            Ok(history) => {
                let counts: Vec<u32> = history.iter().map(|r| r.wallet_count as u32).collect();
                Json(serde_json::json!({
                    "success": true,
                    "strategy": strategy,
                    "trend": saturation_trend(&counts),
                    "history": history,
                }))
            }
            Err(e) => Json(serde_json::json!({
                "success": false,
                "error": format!("Failed to query saturation history: {}", e),
            })),
        };
    }

    let strategies = match repo.get_strategies().await {
        Ok(s) => s,
        Err(e) => {
            return Json(serde_json::json!({
                "success": false,
                "error": format!("Failed to list strategies: {}", e),
            }))
        }
    };

    let mut summaries = Vec::new();
    for strategy in &strategies {
        if let Ok(history) = repo.get_history(strategy, limit).await {
            let counts: Vec<u32> = history.iter().map(|r| r.wallet_count as u32).collect();
            let latest = history.last();
            summaries.push(serde_json::json!({
                "strategy": strategy,
                "trend": saturation_trend(&counts),
                "wallet_count": latest.map(|r| r.wallet_count),
                "total_volume": latest.map(|r| r.total_volume),
            }));
        }
    }

    Json(serde_json::json!({
        "success": true,
        "strategies": summaries,
    }))
}

// ============================================================================
// API Handlers — Export
// ============================================================================

/// Query params for export endpoint
#[derive(Deserialize)]
struct ExportParams {
    #[serde(default = "default_top_n")]
    top_n: usize,
    min_alpha: Option<f64>,
}

fn default_top_n() -> usize {
    20
}

/// GET /api/export — export top stored reports as structured JSON
async fn api_export(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Json<serde_json::Value> {
    let repo = WalletRepository::new(state.db.pool());

    let min_alpha = params.min_alpha;
    match repo.get_all(params.top_n as i64).await {
        Ok(records) => {
            let total_in_db = repo
                .get_stats()
                .await
                .map(|s| s.total_wallets)
                .unwrap_or(0);

            let results: Vec<serde_json::Value> = records
                .iter()
                .filter(|r| min_alpha.map_or(true, |m| r.alpha_score >= m))
                .enumerate()
                .map(|(i, r)| {
                    let recommendation = if r.is_valid && r.alpha_score > 0.7 {
                        "High confidence — validated edge with strong alpha signals"
                    } else if r.is_valid {
                        "Moderate confidence — edge is statistically real"
                    } else {
                        "Low confidence — edge not statistically proven"
                    };

                    serde_json::json!({
                        "rank": i + 1,
                        "address": r.address,
                        "user_name": r.user_name,
                        "strategy": r.strategy,
                        "strategy_confidence": r.strategy_confidence,
                        "validation": {
                            "is_valid": r.is_valid,
                            "confidence_tier": r.confidence_tier,
                            "sample_size": r.sample_size,
                            "win_rate_p_value": r.win_rate_p_value,
                            "consistency_variance": r.consistency_variance,
                            "variance_assumed": r.variance_assumed,
                            "rejection_reason": r.rejection_reason,
                        },
                        "metrics": {
                            "win_rate": r.win_rate,
                            "total_pnl": r.total_pnl,
                            "total_volume": r.total_volume,
                            "sharpe_ratio": r.sharpe_ratio,
                            "risk_score": r.risk_score,
                            "replicability_score": r.replicability_score,
                            "edge_estimate": r.edge_estimate,
                            "alpha_score": r.alpha_score,
                            "trade_count": r.trade_count,
                            "unique_markets": r.unique_markets,
                        },
                        "signals": parse_json_column(r.signals_json.as_deref()),
                        "blueprint": parse_json_column(r.blueprint_json.as_deref()),
                        "recommendation": recommendation,
                    })
                })
                .collect();

            Json(serde_json::json!({
                "generated_at": Utc::now().to_rfc3339(),
                "total_reports_in_db": total_in_db,
                "export_filters": {
                    "top_n": params.top_n,
                    "min_alpha": min_alpha,
                },
                "results": results,
            }))
        }
        Err(e) => Json(serde_json::json!({
            "success": false,
            "error": format!("Export failed: {}", e),
        })),
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_json_column(raw: Option<&str>) -> serde_json::Value {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or(serde_json::Value::Null)
}

/// Build export JSON from in-memory reports (used by CLI scan command)
fn build_export_json(reports: &[WalletReport], top_n: usize) -> serde_json::Value {
    let items: Vec<serde_json::Value> = reports
        .iter()
        .take(top_n)
        .enumerate()
        .map(|(i, r)| {
            serde_json::json!({
                "rank": i + 1,
                "address": r.address,
                "user_name": r.user_name,
                "strategy": r.analysis.strategy.label(),
                "strategy_confidence": r.analysis.confidence,
                "validation": serde_json::to_value(&r.validation).unwrap_or_default(),
                "metrics": {
                    "win_rate": r.profile.win_rate,
                    "total_pnl": r.profile.total_pnl,
                    "total_volume": r.analysis.total_volume,
                    "sharpe_ratio": r.analysis.sharpe_ratio,
                    "risk_score": r.analysis.risk_score,
                    "replicability_score": r.analysis.replicability_score,
                    "edge_estimate": r.analysis.edge_estimate,
                    "alpha_score": r.alpha_score,
                    "trade_count": r.analysis.total_trades,
                    "unique_markets": r.analysis.unique_markets,
                },
                "signals": serde_json::to_value(&r.signals).unwrap_or_default(),
                "blueprint": serde_json::to_value(&r.blueprint).unwrap_or_default(),
            })
        })
        .collect();

    serde_json::json!({
        "generated_at": Utc::now().to_rfc3339(),
        "total_wallets": reports.len(),
        "export_filters": {
            "top_n": top_n,
        },
        "results": items,
    })
}
