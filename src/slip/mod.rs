//! Bet-slip store.
//!
//! In-memory ordered collection of selections plus the multibet mode
//! flag and shared stake. The slip is the only mutable shared resource
//! in the engine and is mutated exclusively through these methods,
//! never read-modify-written by callers.

pub mod mapper;
pub mod validator;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{BetMode, BetSlipItem};

/// Client-side slip state. Insertion order is display order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BetSlip {
    items: Vec<BetSlipItem>,
    pub visible: bool,
    multibet: bool,
    multibet_stake: Decimal,
}

impl BetSlip {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[BetSlipItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add a selection from an odds cell.
    ///
    /// Clicking a cell already on the slip refreshes its odds instead
    /// of duplicating it. Once the slip holds more than one item it
    /// auto-switches to multibet.
    pub fn add(&mut self, item: BetSlipItem) {
        if let Some(existing) = self.items.iter_mut().find(|i| i.id == item.id) {
            existing.odds = item.odds;
            debug!(id = %existing.id, odds = %existing.odds, "Slip selection refreshed");
        } else {
            debug!(id = %item.id, "Slip selection added");
            self.items.push(item);
        }
        if self.items.len() > 1 {
            self.multibet = true;
        }
        self.visible = true;
    }

    /// Remove a selection by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        before != self.items.len()
    }

    /// Update the stake on one item. Potential winnings follow
    /// automatically because they are computed, not stored.
    pub fn update_stake(&mut self, id: &str, stake: Decimal) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.stake = stake;
                true
            }
            None => false,
        }
    }

    pub fn set_multibet_stake(&mut self, stake: Decimal) {
        self.multibet_stake = stake;
    }

    pub fn multibet_stake(&self) -> Decimal {
        self.multibet_stake
    }

    /// Toggle between single and multibet interpretation. Slips with
    /// more than one item stay in multibet regardless.
    pub fn set_multibet(&mut self, multibet: bool) {
        if self.items.len() > 1 {
            self.multibet = true;
        } else {
            self.multibet = multibet;
        }
    }

    pub fn is_multibet(&self) -> bool {
        self.multibet
    }

    /// The mode the rest of the engine should interpret this slip in.
    pub fn mode(&self) -> BetMode {
        if self.multibet {
            BetMode::Multibet {
                stake: self.multibet_stake,
            }
        } else {
            BetMode::Single
        }
    }

    /// Product of all item odds.
    pub fn combined_odds(&self) -> Decimal {
        self.items
            .iter()
            .fold(Decimal::ONE, |acc, item| acc * item.odds)
    }

    /// Aggregate stake for the current mode: the shared stake in
    /// multibet, the sum of item stakes otherwise.
    pub fn total_stake(&self) -> Decimal {
        if self.multibet {
            self.multibet_stake
        } else {
            self.items.iter().map(|i| i.stake).sum()
        }
    }

    /// Display-level winnings projection for the current mode.
    pub fn potential_winnings(&self) -> Decimal {
        if self.multibet {
            self.multibet_stake * self.combined_odds()
        } else {
            self.items.iter().map(|i| i.potential_winnings()).sum()
        }
    }

    /// Clear the slip wholesale (explicit clear or after placement).
    pub fn clear(&mut self) {
        self.items.clear();
        self.multibet = false;
        self.multibet_stake = Decimal::ZERO;
        self.visible = false;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
