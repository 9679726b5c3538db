//! Charging session state for SafraSphere
//!
//! This module holds the per-session counters (battery, energy, cost), the
//! tariff that derives energy and cost from the battery level, and the ledger
//! of completed sessions shown by the receipts API.

use crate::error::{Result, SafraError};
use crate::logging::get_logger;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Converts a battery level into delivered energy and its price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    /// Assumed vehicle battery capacity
    pub capacity_kwh: f64,

    /// Price per kWh
    pub rate_per_kwh: f64,
}

impl Tariff {
    pub const fn new(capacity_kwh: f64, rate_per_kwh: f64) -> Self {
        Self {
            capacity_kwh,
            rate_per_kwh,
        }
    }

    /// Energy needed to reach `battery_percent` from empty
    pub fn energy_kwh(&self, battery_percent: f64) -> f64 {
        battery_percent / 100.0 * self.capacity_kwh
    }

    /// Price of reaching `battery_percent` from empty
    pub fn cost(&self, battery_percent: f64) -> f64 {
        self.energy_kwh(battery_percent) * self.rate_per_kwh
    }
}

/// Counters of the session currently on the kiosk
///
/// `energy_consumed_kwh` and `total_cost` are always recomputed from
/// `battery_percent`; they cannot be set on their own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChargingSession {
    /// Issued once per session, before charging starts
    pub session_token: Option<String>,

    /// When charging started
    pub started_at: Option<DateTime<Utc>>,

    battery_percent: f64,
    energy_consumed_kwh: f64,
    total_cost: f64,
}

impl ChargingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn battery_percent(&self) -> f64 {
        self.battery_percent
    }

    pub const fn energy_consumed_kwh(&self) -> f64 {
        self.energy_consumed_kwh
    }

    pub const fn total_cost(&self) -> f64 {
        self.total_cost
    }

    /// Attach the session token; a session accepts exactly one
    pub fn assign_token(&mut self, token: String) -> Result<()> {
        if let Some(existing) = &self.session_token {
            return Err(SafraError::generic(format!(
                "Session already has token {existing}"
            )));
        }
        self.session_token = Some(token);
        Ok(())
    }

    /// Zero the counters and stamp the start time, keeping the token
    pub fn begin(&mut self, now: DateTime<Utc>) {
        self.battery_percent = 0.0;
        self.energy_consumed_kwh = 0.0;
        self.total_cost = 0.0;
        self.started_at = Some(now);
    }

    /// Move the battery level and recompute the derived counters
    pub(crate) fn set_battery_percent(&mut self, percent: f64, tariff: &Tariff) {
        self.battery_percent = percent;
        self.energy_consumed_kwh = tariff.energy_kwh(percent);
        self.total_cost = tariff.cost(percent);
    }

    /// Forget everything, token included
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A finished and paid charging session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_token: Option<String>,
    pub transaction_id: String,
    pub started_at: Option<DateTime<Utc>>,
    pub paid_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub energy_kwh: f64,
    pub amount: f64,
    pub currency_symbol: String,
}

/// Bounded in-memory history of completed sessions
pub struct SessionLedger {
    records: VecDeque<SessionRecord>,
    max_history_size: usize,
    logger: crate::logging::StructuredLogger,
}

impl SessionLedger {
    /// Create a new ledger keeping at most `max_history_size` records
    pub fn new(max_history_size: usize) -> Self {
        Self {
            records: VecDeque::with_capacity(max_history_size.min(1024)),
            max_history_size,
            logger: get_logger("session"),
        }
    }

    /// Record a completed session, evicting the oldest beyond capacity
    pub fn record(&mut self, record: SessionRecord) {
        self.logger.info(&format!(
            "Recorded session {} ({:.1} kWh, {}{:.2})",
            record.transaction_id, record.energy_kwh, record.currency_symbol, record.amount
        ));
        self.records.push_back(record);
        while self.records.len() > self.max_history_size {
            self.records.pop_front();
        }
    }

    /// Most recent record, if any
    pub fn last(&self) -> Option<&SessionRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Newest first
    pub fn snapshot(&self) -> Vec<SessionRecord> {
        self.records.iter().rev().cloned().collect()
    }
}

impl Default for SessionLedger {
    fn default() -> Self {
        Self::new(100)
    }
}
