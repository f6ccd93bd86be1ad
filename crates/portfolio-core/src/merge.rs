//! Lot merging for repeat purchases of the same symbol.

use serde::{Deserialize, Serialize};

/// A single purchase: share count and the price paid per share.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lot {
    pub shares: f64,
    pub price: f64,
}

impl Lot {
    pub fn new(shares: f64, price: f64) -> Self {
        Self { shares, price }
    }

    /// Total cost of the lot.
    pub fn cost(&self) -> f64 {
        self.shares * self.price
    }
}

/// Merge a new lot into an existing position by total-cost weighting.
///
/// Resulting shares are the sum of both lots; the resulting price is the
/// combined cost divided by the combined share count. Callers guarantee both
/// lots have positive shares.
pub fn merge_lots(existing: Lot, incoming: Lot) -> Lot {
    let shares = existing.shares + incoming.shares;
    let price = (existing.cost() + incoming.cost()) / shares;
    Lot { shares, price }
}
