//! Account ledger
//!
//! Balance, open positions, daily P&L and halt state behind a single
//! `tokio::sync::RwLock`. Every mutation, including halt re-evaluation, the
//! matching audit entries and the gauge update, happens inside one
//! write-locked critical section, so readers never see a post-trigger balance
//! with a pre-trigger halt state. Log lines are emitted after the guard drops.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use super::limits::DrawdownMonitor;
use super::{ClosedPosition, HaltState, Position, RiskError, RiskLimits};
use crate::audit::{AuditEvent, AuditLog, BalanceUpdate, DailyReset, HaltRecord, HaltReset};
use crate::telemetry;

/// Consistent point-in-time copy of the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub balance: Decimal,
    pub initial_balance: Decimal,
    pub day_start_balance: Decimal,
    pub realized_pnl_today: Decimal,
    pub peak_balance: Decimal,
    pub trading_day: NaiveDate,
    pub halt: HaltState,
    /// Open positions ordered by symbol
    pub positions: Vec<Position>,
}

impl AccountSnapshot {
    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_open(&self, symbol: &str) -> bool {
        self.positions.iter().any(|p| p.symbol == symbol)
    }

    /// Sum of entry notionals across open positions
    pub fn total_exposure(&self) -> Decimal {
        self.positions
            .iter()
            .map(Position::notional)
            .fold(dec!(0), Decimal::saturating_add)
    }

    /// Fractional decline from the peak balance
    pub fn drawdown(&self) -> Decimal {
        if self.peak_balance <= dec!(0) {
            return dec!(0);
        }
        (self.peak_balance - self.balance) / self.peak_balance
    }

    /// Derived reporting figures
    pub fn metrics(&self, limits: &RiskLimits) -> RiskMetrics {
        let hundred = dec!(100);
        let total_exposure = self.total_exposure();
        let pct = |num: Decimal, den: Decimal| {
            if den > dec!(0) {
                ratio(num, den).saturating_mul(hundred)
            } else {
                dec!(0)
            }
        };

        RiskMetrics {
            balance: self.balance,
            daily_pnl: self.realized_pnl_today,
            daily_pnl_pct: pct(self.realized_pnl_today, self.day_start_balance),
            total_pnl_pct: pct(self.balance - self.initial_balance, self.initial_balance),
            open_positions: self.open_count(),
            position_utilization_pct: pct(
                Decimal::from(self.open_count()),
                Decimal::from(limits.max_open_positions),
            ),
            total_exposure,
            exposure_ratio: if self.balance > dec!(0) {
                ratio(total_exposure, self.balance)
            } else {
                dec!(0)
            },
            drawdown: self.drawdown(),
            halt: self.halt,
            paper_trading: limits.paper_trading,
        }
    }
}

/// `num / den` for a positive `den`, saturating when the quotient leaves the decimal range
fn ratio(num: Decimal, den: Decimal) -> Decimal {
    num.checked_div(den).unwrap_or(if num.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

/// Summary figures for dashboards and reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    pub balance: Decimal,
    pub daily_pnl: Decimal,
    pub daily_pnl_pct: Decimal,
    pub total_pnl_pct: Decimal,
    pub open_positions: usize,
    pub position_utilization_pct: Decimal,
    pub total_exposure: Decimal,
    pub exposure_ratio: Decimal,
    pub drawdown: Decimal,
    pub halt: HaltState,
    pub paper_trading: bool,
}

#[derive(Debug)]
struct Ledger {
    initial_balance: Decimal,
    monitor: DrawdownMonitor,
    trading_day: NaiveDate,
    positions: BTreeMap<String, Position>,
    closed: Vec<ClosedPosition>,
    halt: HaltState,
}

impl Ledger {
    fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            balance: self.monitor.balance,
            initial_balance: self.initial_balance,
            day_start_balance: self.monitor.day_start_balance,
            realized_pnl_today: self.monitor.realized_pnl_today,
            peak_balance: self.monitor.peak_balance,
            trading_day: self.trading_day,
            halt: self.halt,
            positions: self.positions.values().cloned().collect(),
        }
    }

    /// Start a new trading day if `now` falls after the current one
    fn roll_day(&mut self, now: DateTime<Utc>, audit: &AuditLog) -> Option<DailyReset> {
        let today = now.date_naive();
        if today <= self.trading_day {
            return None;
        }

        let previous_pnl = self.monitor.realized_pnl_today;
        self.monitor.reset_daily();
        self.trading_day = today;
        let reset = DailyReset {
            trading_day: today,
            previous_pnl,
            day_start_balance: self.monitor.day_start_balance,
        };
        audit.append(AuditEvent::DailyReset(reset.clone()));
        Some(reset)
    }

    /// Trip a halt if a threshold is crossed; halts never clear here
    fn evaluate_halt(&mut self, limits: &RiskLimits, audit: &AuditLog) -> Option<HaltRecord> {
        if self.halt.is_halted() {
            return None;
        }

        let breach = self.monitor.breach(limits);
        if !breach.is_halted() {
            return None;
        }

        self.halt = breach;
        let record = HaltRecord {
            halt: breach,
            balance: self.monitor.balance,
            peak_balance: self.monitor.peak_balance,
            drawdown: self.monitor.current_drawdown(),
            day_start_balance: self.monitor.day_start_balance,
            realized_pnl_today: self.monitor.realized_pnl_today,
        };
        audit.append(AuditEvent::HaltTriggered(record.clone()));
        telemetry::record_halt(breach);
        Some(record)
    }
}

/// Side effects of one critical section, logged once the ledger guard is released
#[derive(Debug, Default)]
struct Transition {
    day_roll: Option<DailyReset>,
    halt: Option<HaltRecord>,
}

impl Transition {
    fn log(&self) {
        if let Some(reset) = &self.day_roll {
            info!(
                today = %reset.trading_day,
                previous_pnl = %reset.previous_pnl,
                "New trading day"
            );
        }
        if let Some(record) = &self.halt {
            error!(
                halt = %record.halt,
                balance = %record.balance,
                peak_balance = %record.peak_balance,
                drawdown = %record.drawdown,
                realized_pnl_today = %record.realized_pnl_today,
                "TRADING HALTED"
            );
        }
    }
}

/// Shared, concurrency-safe account ledger
pub struct AccountState {
    limits: Arc<RiskLimits>,
    audit: Arc<AuditLog>,
    ledger: RwLock<Ledger>,
}

impl AccountState {
    /// Open a session with the given starting balance
    pub fn new(
        initial_balance: Decimal,
        limits: Arc<RiskLimits>,
        audit: Arc<AuditLog>,
    ) -> Result<Self, RiskError> {
        if initial_balance < dec!(0) {
            return Err(RiskError::InvalidBalance(initial_balance));
        }

        Ok(Self {
            limits,
            audit,
            ledger: RwLock::new(Ledger {
                initial_balance,
                monitor: DrawdownMonitor::new(initial_balance),
                trading_day: Utc::now().date_naive(),
                positions: BTreeMap::new(),
                closed: Vec::new(),
                halt: HaltState::None,
            }),
        })
    }

    pub fn limits(&self) -> &RiskLimits {
        &self.limits
    }

    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// Apply a realized balance change and re-evaluate halts
    ///
    /// The balance floors at zero; only the applied part counts toward daily P&L.
    pub async fn update_balance(&self, delta: Decimal) -> BalanceUpdate {
        let (update, transition) = {
            let mut ledger = self.ledger.write().await;
            let mut transition = Transition {
                day_roll: ledger.roll_day(Utc::now(), &self.audit),
                ..Default::default()
            };

            let applied = ledger.monitor.apply(delta);
            let update = BalanceUpdate {
                delta,
                applied,
                balance: ledger.monitor.balance,
                realized_pnl_today: ledger.monitor.realized_pnl_today,
            };
            self.audit.append(AuditEvent::BalanceUpdated(update.clone()));
            transition.halt = ledger.evaluate_halt(&self.limits, &self.audit);
            telemetry::publish_account(&ledger.snapshot(), &self.limits);
            (update, transition)
        };

        transition.log();
        if update.applied != update.delta {
            warn!(delta = %update.delta, applied = %update.applied, "Balance floored at zero");
        }
        info!(
            balance = %update.balance,
            daily_pnl = %update.realized_pnl_today,
            "Balance updated"
        );
        self.audit.report_eviction();
        update
    }

    /// Insert a new open position
    pub async fn add_position(&self, position: Position) -> Result<(), RiskError> {
        position.check()?;

        let (opened, day_roll) = {
            let mut ledger = self.ledger.write().await;
            let day_roll = ledger.roll_day(Utc::now(), &self.audit);

            let refusal = if ledger.halt.is_halted() {
                Some(RiskError::TradingHalted(ledger.halt))
            } else if ledger.positions.len() >= self.limits.max_open_positions {
                Some(RiskError::MaxPositionsReached(self.limits.max_open_positions))
            } else if ledger.positions.contains_key(&position.symbol) {
                Some(RiskError::DuplicatePosition(position.symbol.clone()))
            } else {
                None
            };

            let opened = match refusal {
                Some(err) => Err(err),
                None => {
                    self.audit.append(AuditEvent::PositionOpened(position.clone()));
                    ledger.positions.insert(position.symbol.clone(), position.clone());
                    telemetry::publish_account(&ledger.snapshot(), &self.limits);
                    Ok(position)
                }
            };
            (opened, day_roll)
        };

        Transition {
            day_roll,
            halt: None,
        }
        .log();
        let position = opened?;
        info!(
            symbol = %position.symbol,
            side = %position.side,
            size = %position.size,
            entry_price = %position.entry_price,
            "Position opened"
        );
        self.audit.report_eviction();
        Ok(())
    }

    /// Remove an open position, realizing P&L when an exit price is given
    pub async fn remove_position(
        &self,
        symbol: &str,
        exit_price: Option<Decimal>,
    ) -> Result<ClosedPosition, RiskError> {
        if let Some(price) = exit_price {
            if price <= dec!(0) {
                return Err(RiskError::InvalidPrice {
                    field: "exit_price",
                    value: price,
                });
            }
        }

        let (closed, balance, transition) = {
            let mut ledger = self.ledger.write().await;
            let now = Utc::now();
            let mut transition = Transition {
                day_roll: ledger.roll_day(now, &self.audit),
                ..Default::default()
            };

            let closed = match ledger.positions.remove(symbol) {
                Some(position) => {
                    let pnl = exit_price.map_or(dec!(0), |price| position.pnl_at(price));
                    let realized_pnl = ledger.monitor.apply(pnl);
                    let closed = ClosedPosition {
                        position,
                        exit_price,
                        closed_at: now,
                        realized_pnl,
                    };
                    self.audit.append(AuditEvent::PositionClosed(closed.clone()));
                    ledger.closed.push(closed.clone());
                    transition.halt = ledger.evaluate_halt(&self.limits, &self.audit);
                    telemetry::publish_account(&ledger.snapshot(), &self.limits);
                    Ok(closed)
                }
                None => Err(RiskError::PositionNotFound(symbol.to_string())),
            };
            (closed, ledger.monitor.balance, transition)
        };

        transition.log();
        let closed = closed?;
        info!(
            symbol,
            exit_price = ?exit_price,
            realized_pnl = %closed.realized_pnl,
            %balance,
            "Position closed"
        );
        self.audit.report_eviction();
        Ok(closed)
    }

    /// Consistent copy of the ledger
    pub async fn snapshot(&self) -> AccountSnapshot {
        self.ledger.read().await.snapshot()
    }

    pub async fn halt_state(&self) -> HaltState {
        self.ledger.read().await.halt
    }

    /// Closed position history for this session
    pub async fn closed_positions(&self) -> Vec<ClosedPosition> {
        self.ledger.read().await.closed.clone()
    }

    /// Snapshot and closed history taken under one read guard
    pub async fn snapshot_with_history(&self) -> (AccountSnapshot, Vec<ClosedPosition>) {
        let ledger = self.ledger.read().await;
        (ledger.snapshot(), ledger.closed.clone())
    }

    /// Start a new trading day if `now` is past the current one
    pub async fn roll_day(&self, now: DateTime<Utc>) -> bool {
        let day_roll = {
            let mut ledger = self.ledger.write().await;
            let day_roll = ledger.roll_day(now, &self.audit);
            if day_roll.is_some() {
                telemetry::publish_account(&ledger.snapshot(), &self.limits);
            }
            day_roll
        };

        let rolled = day_roll.is_some();
        Transition {
            day_roll,
            halt: None,
        }
        .log();
        self.audit.report_eviction();
        rolled
    }

    /// Force a daily reset using the current balance as the new baseline
    pub async fn reset_daily(&self) {
        let previous_pnl = {
            let mut ledger = self.ledger.write().await;
            let previous_pnl = ledger.monitor.realized_pnl_today;
            ledger.monitor.reset_daily();
            ledger.trading_day = Utc::now().date_naive();

            self.audit.append(AuditEvent::DailyReset(DailyReset {
                trading_day: ledger.trading_day,
                previous_pnl,
                day_start_balance: ledger.monitor.day_start_balance,
            }));
            telemetry::publish_account(&ledger.snapshot(), &self.limits);
            previous_pnl
        };

        info!(%previous_pnl, "Daily metrics reset");
        self.audit.report_eviction();
    }

    /// Operator reset of a halt
    ///
    /// Peak and day-start balances are re-baselined to the current balance so
    /// the halt does not re-trigger on the next update. Returns the state that
    /// was cleared.
    pub async fn reset_halt(&self) -> HaltState {
        let (previous, balance) = {
            let mut ledger = self.ledger.write().await;
            let previous = ledger.halt;
            if !previous.is_halted() {
                return previous;
            }

            ledger.monitor.peak_balance = ledger.monitor.balance;
            ledger.monitor.reset_daily();
            ledger.halt = HaltState::None;

            self.audit
                .append(AuditEvent::HaltReset(HaltReset { previous }));
            telemetry::publish_account(&ledger.snapshot(), &self.limits);
            (previous, ledger.monitor.balance)
        };

        warn!(%previous, %balance, "Trading halt cleared by operator");
        self.audit.report_eviction();
        previous
    }
}
