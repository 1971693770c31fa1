//! Offline accrual and accrual-rate derivation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::item::{Catalog, ItemEffect, ItemId};

/// Credits earned between the last persisted save and `now`.
///
/// Elapsed time is clamped at zero: clock skew or a corrupted timestamp must
/// never produce a negative or NaN gain. The result is floored; partial
/// credits are not granted retroactively.
pub fn offline_gain(last_save_at: DateTime<Utc>, now: DateTime<Utc>, rate: f64) -> u64 {
    if !rate.is_finite() || rate <= 0.0 {
        return 0;
    }

    let elapsed_secs = (now - last_save_at).num_milliseconds() as f64 / 1000.0;
    if elapsed_secs <= 0.0 {
        return 0;
    }

    (elapsed_secs * rate).floor() as u64
}

/// Derive the accrual rate (credits per second) from owned items.
///
/// Flat bonuses sum across units; multipliers compound per unit on top of the
/// flat subtotal. Items missing from the catalog contribute nothing; the
/// catalog is reference data and a stale owned-item row must not poison the
/// rate.
pub fn derive_rate(owned: &BTreeMap<ItemId, u32>, catalog: &dyn Catalog) -> f64 {
    let mut flat = 0.0;
    let mut multiplier = 1.0;

    for (id, &quantity) in owned {
        if quantity == 0 {
            continue;
        }
        let Some(def) = catalog.definition(id) else {
            continue;
        };
        match def.effect {
            ItemEffect::FlatRateBonus { credits_per_second } => {
                flat += credits_per_second * f64::from(quantity);
            }
            ItemEffect::Multiplier { factor } => {
                multiplier *= factor.powi(quantity as i32);
            }
        }
    }

    flat * multiplier
}
