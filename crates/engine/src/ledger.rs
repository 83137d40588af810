//! Replication ledger: an append-only event log for paper-replaying a
//! blueprint.
//!
//! The ledger never stores derived balances. Every accessor is a pure fold
//! over the event list, so cash, exposure, and realized P&L can never drift
//! out of sync with the events that produced them.

use crate::types::{sorted_by_time, Trade, TradeSide};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One immutable entry in the replication log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    Open {
        timestamp: i64,
        market_id: String,
        outcome: String,
        shares: Decimal,
        price: Decimal,
        cost: Decimal,
    },
    Close {
        timestamp: i64,
        market_id: String,
        outcome: String,
        shares: Decimal,
        price: Decimal,
        proceeds: Decimal,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationLedger {
    starting_balance: Decimal,
    events: Vec<LedgerEvent>,
}

#[derive(Debug, Clone, Default)]
struct PositionState {
    shares: Decimal,
    cost: Decimal,
}

impl ReplicationLedger {
    pub fn new(starting_balance: Decimal) -> Self {
        Self {
            starting_balance,
            events: Vec::new(),
        }
    }

    /// Replay a wallet's own fills as if we had copied them one for one
    pub fn replay(starting_balance: Decimal, trades: &[Trade]) -> Self {
        let mut ledger = Self::new(starting_balance);
        for trade in sorted_by_time(trades) {
            let shares = decimal(trade.shares);
            let price = decimal(trade.price);
            let value = decimal(trade.value);
            match trade.side {
                TradeSide::Buy => ledger.record_open(
                    trade.timestamp,
                    &trade.market_id,
                    &trade.outcome,
                    shares,
                    price,
                    value,
                ),
                TradeSide::Sell => ledger.record_close(
                    trade.timestamp,
                    &trade.market_id,
                    &trade.outcome,
                    shares,
                    price,
                    value,
                ),
            }
        }
        ledger
    }

    pub fn record_open(
        &mut self,
        timestamp: i64,
        market_id: &str,
        outcome: &str,
        shares: Decimal,
        price: Decimal,
        cost: Decimal,
    ) {
        self.events.push(LedgerEvent::Open {
            timestamp,
            market_id: market_id.to_string(),
            outcome: outcome.to_string(),
            shares,
            price,
            cost,
        });
    }

    pub fn record_close(
        &mut self,
        timestamp: i64,
        market_id: &str,
        outcome: &str,
        shares: Decimal,
        price: Decimal,
        proceeds: Decimal,
    ) {
        self.events.push(LedgerEvent::Close {
            timestamp,
            market_id: market_id.to_string(),
            outcome: outcome.to_string(),
            shares,
            price,
            proceeds,
        });
    }

    pub fn starting_balance(&self) -> Decimal {
        self.starting_balance
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Cash on hand: starting balance minus every open cost plus every close
    /// proceeds
    pub fn balance(&self) -> Decimal {
        self.events.iter().fold(self.starting_balance, |cash, event| {
            match event {
                LedgerEvent::Open { cost, .. } => cash - *cost,
                LedgerEvent::Close { proceeds, .. } => cash + *proceeds,
            }
        })
    }

    /// Cost basis still tied up in open positions
    pub fn open_exposure(&self) -> Decimal {
        self.fold_positions()
            .values()
            .map(|p| p.cost)
            .sum()
    }

    /// Realized P&L over closed share lots, at average cost
    pub fn realized_pnl(&self) -> Decimal {
        let mut positions: HashMap<(String, String), PositionState> = HashMap::new();
        let mut realized = Decimal::ZERO;

        for event in &self.events {
            match event {
                LedgerEvent::Open {
                    market_id,
                    outcome,
                    shares,
                    cost,
                    ..
                } => {
                    let pos = positions
                        .entry((market_id.clone(), outcome.clone()))
                        .or_default();
                    pos.shares += *shares;
                    pos.cost += *cost;
                }
                LedgerEvent::Close {
                    market_id,
                    outcome,
                    shares,
                    proceeds,
                    ..
                } => {
                    let pos = positions
                        .entry((market_id.clone(), outcome.clone()))
                        .or_default();
                    if pos.shares > Decimal::ZERO {
                        let closing = (*shares).min(pos.shares);
                        let released = pos.cost * closing / pos.shares;
                        pos.shares -= closing;
                        pos.cost -= released;
                        realized += *proceeds - released;
                    } else {
                        // Close against nothing: count the full proceeds
                        realized += *proceeds;
                    }
                }
            }
        }

        realized
    }

    fn fold_positions(&self) -> HashMap<(String, String), PositionState> {
        let mut positions: HashMap<(String, String), PositionState> = HashMap::new();
        for event in &self.events {
            match event {
                LedgerEvent::Open {
                    market_id,
                    outcome,
                    shares,
                    cost,
                    ..
                } => {
                    let pos = positions
                        .entry((market_id.clone(), outcome.clone()))
                        .or_default();
                    pos.shares += *shares;
                    pos.cost += *cost;
                }
                LedgerEvent::Close {
                    market_id,
                    outcome,
                    shares,
                    ..
                } => {
                    let pos = positions
                        .entry((market_id.clone(), outcome.clone()))
                        .or_default();
                    if pos.shares > Decimal::ZERO {
                        let closing = (*shares).min(pos.shares);
                        let released = pos.cost * closing / pos.shares;
                        pos.shares -= closing;
                        pos.cost -= released;
                    }
                }
            }
        }
        positions
    }
}

/// f64 to Decimal through a fixed-precision string, avoiding binary float
/// artifacts in the ledger
fn decimal(value: f64) -> Decimal {
    Decimal::from_str_exact(&format!("{value:.6}")).unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_ledger_balance() {
        let ledger = ReplicationLedger::new(dec!(10000));
        assert_eq!(ledger.balance(), dec!(10000));
        assert_eq!(ledger.open_exposure(), Decimal::ZERO);
        assert_eq!(ledger.realized_pnl(), Decimal::ZERO);
    }

    #[test]
    fn test_open_reduces_cash_and_raises_exposure() {
        let mut ledger = ReplicationLedger::new(dec!(1000));
        ledger.record_open(100, "m1", "Yes", dec!(200), dec!(0.45), dec!(90));

        assert_eq!(ledger.balance(), dec!(910));
        assert_eq!(ledger.open_exposure(), dec!(90));
        assert_eq!(ledger.realized_pnl(), Decimal::ZERO);
    }

    #[test]
    fn test_full_round_trip() {
        let mut ledger = ReplicationLedger::new(dec!(1000));
        ledger.record_open(100, "m1", "Yes", dec!(200), dec!(0.45), dec!(90));
        ledger.record_close(200, "m1", "Yes", dec!(200), dec!(0.60), dec!(120));

        assert_eq!(ledger.balance(), dec!(1030));
        assert_eq!(ledger.open_exposure(), Decimal::ZERO);
        assert_eq!(ledger.realized_pnl(), dec!(30));
    }

    #[test]
    fn test_partial_close_releases_average_cost() {
        let mut ledger = ReplicationLedger::new(dec!(1000));
        ledger.record_open(100, "m1", "Yes", dec!(100), dec!(0.40), dec!(40));
        ledger.record_open(150, "m1", "Yes", dec!(100), dec!(0.60), dec!(60));
        // Sell half the combined lot at 0.70
        ledger.record_close(200, "m1", "Yes", dec!(100), dec!(0.70), dec!(70));

        // Average cost was 0.50/share, so half the lot released 50 of cost
        assert_eq!(ledger.open_exposure(), dec!(50));
        assert_eq!(ledger.realized_pnl(), dec!(20));
        assert_eq!(ledger.balance(), dec!(970));
    }

    #[test]
    fn test_balance_is_order_of_events_not_state() {
        // Two ledgers with the same events agree on every fold
        let mut a = ReplicationLedger::new(dec!(500));
        a.record_open(1, "m1", "Yes", dec!(10), dec!(0.5), dec!(5));
        a.record_open(2, "m2", "No", dec!(10), dec!(0.3), dec!(3));
        a.record_close(3, "m1", "Yes", dec!(10), dec!(0.9), dec!(9));

        assert_eq!(a.balance(), dec!(501));
        assert_eq!(a.open_exposure(), dec!(3));
        assert_eq!(a.realized_pnl(), dec!(4));
        assert_eq!(a.events().len(), 3);
    }

    #[test]
    fn test_replay_from_trades() {
        use crate::types::{MarketKind, Trade, TradeSide};

        let trades = vec![
            Trade {
                timestamp: 200,
                market_id: "m1".into(),
                market_title: "Market".into(),
                outcome: "Yes".into(),
                side: TradeSide::Sell,
                shares: 100.0,
                price: 0.8,
                value: 80.0,
                is_maker: false,
                market_kind: MarketKind::Binary,
                category: None,
                realized_pnl: None,
                exit_timestamp: None,
            },
            Trade {
                timestamp: 100,
                market_id: "m1".into(),
                market_title: "Market".into(),
                outcome: "Yes".into(),
                side: TradeSide::Buy,
                shares: 100.0,
                price: 0.5,
                value: 50.0,
                is_maker: false,
                market_kind: MarketKind::Binary,
                category: None,
                realized_pnl: None,
                exit_timestamp: None,
            },
        ];

        // Replay sorts by time, so the buy lands before the sell
        let ledger = ReplicationLedger::replay(dec!(100), &trades);
        assert_eq!(ledger.balance(), dec!(130));
        assert_eq!(ledger.realized_pnl(), dec!(30));
        assert_eq!(ledger.open_exposure(), Decimal::ZERO);
    }
}
