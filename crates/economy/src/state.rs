//! Live per-session economy state.

use std::collections::BTreeMap;

use crate::error::EconomyError;
use crate::item::ItemId;
use crate::types::{EconomyRecord, OwnedItem};

/// The mutable economy aggregate for one connected session.
///
/// Exactly one owner (the session worker) mutates this; all mutators are
/// synchronous and atomic with respect to each other. Credits accumulate
/// fractionally and are floored only at read, persist, and affordability
/// boundaries.
///
/// Invariants:
/// - the balance is all-time earned minus all-time spent and never negative
/// - `total_clicks` is monotonically non-decreasing
/// - an owned quantity only increases during a session
#[derive(Clone, Debug, PartialEq)]
pub struct SessionState {
    credits: f64,
    total_clicks: u64,
    accrual_rate: f64,
    owned: BTreeMap<ItemId, u32>,
}

impl SessionState {
    /// Build session state from a loaded record, with the offline gain
    /// already folded into `credits` and the rate derived server-side from
    /// the owned items.
    pub fn from_record(record: &EconomyRecord, owned: Vec<OwnedItem>, accrual_rate: f64) -> Self {
        Self {
            credits: record.credits as f64,
            total_clicks: record.total_clicks,
            accrual_rate,
            owned: owned
                .into_iter()
                .map(|entry| (entry.item, entry.quantity))
                .collect(),
        }
    }

    /// One manual action: +1 credit, +1 lifetime click. Infallible.
    pub fn apply_click(&mut self) {
        self.credits += 1.0;
        self.total_clicks += 1;
    }

    /// One passive tick: the accrual rate's worth of credits, fractional.
    pub fn apply_passive_tick(&mut self) {
        self.credits += self.accrual_rate;
    }

    /// Credit the offline gain computed at session start.
    pub fn apply_offline_gain(&mut self, gain: u64) {
        self.credits += gain as f64;
    }

    /// Debit `price` and take ownership of one more unit of `item`.
    ///
    /// Affordability is checked against the floored balance. On
    /// `InsufficientFunds` the state is left byte-for-byte unchanged.
    /// Returns the new owned quantity.
    pub fn apply_purchase(&mut self, item: &ItemId, price: u64) -> Result<u32, EconomyError> {
        let balance = self.credits();
        if balance < price {
            return Err(EconomyError::InsufficientFunds { price, balance });
        }

        self.credits -= price as f64;
        let quantity = self.owned.entry(item.clone()).or_insert(0);
        *quantity += 1;
        Ok(*quantity)
    }

    /// Replace the whole aggregate with the gateway's authoritative copy.
    ///
    /// No merge: any fractional remainder or in-between mutation is
    /// discarded, which is what purchase settlement requires.
    pub fn replace_with(
        &mut self,
        record: &EconomyRecord,
        owned: Vec<OwnedItem>,
        accrual_rate: f64,
    ) {
        *self = Self::from_record(record, owned, accrual_rate);
    }

    /// Spend-eligible balance: the floored credit total.
    pub fn credits(&self) -> u64 {
        self.credits.floor() as u64
    }

    /// Raw fractional balance, for display only.
    pub fn credits_raw(&self) -> f64 {
        self.credits
    }

    pub fn total_clicks(&self) -> u64 {
        self.total_clicks
    }

    pub fn accrual_rate(&self) -> f64 {
        self.accrual_rate
    }

    pub fn owned_quantity(&self, item: &ItemId) -> u32 {
        self.owned.get(item).copied().unwrap_or(0)
    }

    pub fn owned(&self) -> &BTreeMap<ItemId, u32> {
        &self.owned
    }

    /// Owned quantities as persistable entries.
    pub fn owned_entries(&self) -> Vec<OwnedItem> {
        self.owned
            .iter()
            .map(|(item, &quantity)| OwnedItem::new(item.clone(), quantity))
            .collect()
    }
}
