//! Odds/market mapper.
//!
//! Translates UI-level bet-type and selection labels into the wire-level
//! market-type/outcome vocabulary the remote API expects, and converts
//! decimal odds into the bundled three-convention representation.
//!
//! The mapping is deterministic and total: every input yields a market
//! type (defaulting to h2h) and an outcome (falling back to the raw
//! selection text). The remote system is the final arbiter of validity.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::OddsFormats;

// ---------------------------------------------------------------------------
// Market types
// ---------------------------------------------------------------------------

/// Wire-level category of a bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketType {
    H2h,
    Totals,
    DoubleChance,
    Btts,
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketType::H2h => write!(f, "h2h"),
            MarketType::Totals => write!(f, "totals"),
            MarketType::DoubleChance => write!(f, "double_chance"),
            MarketType::Btts => write!(f, "btts"),
        }
    }
}

/// Classify a UI bet-type label into a wire market type.
///
/// Substring checks run in precedence order, with h2h as the catch-all
/// for everything unrecognised.
pub fn classify_market(bet_type: &str) -> MarketType {
    let label = bet_type.to_lowercase();

    if label.contains("double") {
        MarketType::DoubleChance
    } else if label.contains("over") || label.contains("under") {
        MarketType::Totals
    } else if label.contains("both") || label.contains("btts") {
        MarketType::Btts
    } else {
        // "3 Way", "1X2", "Match Winner", spreads and anything unrecognised.
        MarketType::H2h
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Derive the wire outcome string for a selection within a market.
pub fn derive_outcome(market: MarketType, selection: &str, home: &str, away: &str) -> String {
    let sel = selection.to_lowercase();
    let sel = sel.trim();

    match market {
        MarketType::H2h => match sel {
            "home" => home.to_string(),
            "away" => away.to_string(),
            "draw" => "Draw".to_string(),
            _ => selection.to_string(),
        },
        MarketType::DoubleChance => match sel {
            "1 or x" | "1x" => format!("{home} or Draw"),
            "x or 2" | "x2" => format!("Draw or {away}"),
            "1 or 2" | "12" => format!("{home} or {away}"),
            _ => selection.to_string(),
        },
        MarketType::Totals => match sel {
            "over" => "Over".to_string(),
            "under" => "Under".to_string(),
            _ => selection.to_string(),
        },
        MarketType::Btts => match sel {
            "yes" => "Yes".to_string(),
            "no" => "No".to_string(),
            _ => selection.to_string(),
        },
    }
}

/// Full UI-to-wire translation for one selection.
pub fn map_selection(
    bet_type: &str,
    selection: &str,
    home: &str,
    away: &str,
) -> (MarketType, String) {
    let market = classify_market(bet_type);
    let outcome = derive_outcome(market, selection, home, away);
    (market, outcome)
}

// ---------------------------------------------------------------------------
// Odds conversion
// ---------------------------------------------------------------------------

/// Standard decimal-to-American conversion: `round((d-1)×100)` when
/// `d ≥ 2.0`, else `round(-100/(d-1))`. Degenerate odds (`d ≤ 1`)
/// carry no payout and map to 0.
pub fn american_odds(decimal: Decimal) -> i64 {
    if decimal <= Decimal::ONE {
        return 0;
    }
    let value = if decimal >= dec!(2.0) {
        (decimal - Decimal::ONE) * dec!(100)
    } else {
        dec!(-100) / (decimal - Decimal::ONE)
    };
    value.round().to_i64().unwrap_or(0)
}

impl OddsFormats {
    /// Bundle a decimal price with its American form. The multiplier
    /// field passes the decimal value through unchanged for consumers
    /// expecting that convention.
    pub fn from_decimal(decimal: Decimal) -> Self {
        Self {
            decimal,
            american: american_odds(decimal),
            multiplier: decimal,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
