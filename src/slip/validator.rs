//! Stake & selection validator.
//!
//! Pure functions over slip items, a limits configuration, and an
//! explicit [`BetMode`]. The same rules feed both the UI's synchronous
//! on-change checks and the submitter's fail-fast gate, so the two
//! layers can never disagree.

use rust_decimal::Decimal;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::types::{BetError, BetMode, BetSlipItem, BettingLimits};

/// Validate a stake value against the limits. Zero means "not entered"
/// and is reported separately by the per-item path.
fn check_stake_bounds(
    stake: Decimal,
    limits: &BettingLimits,
    currency: &str,
) -> Result<(), BetError> {
    if stake < limits.min_stake {
        return Err(BetError::StakeBelowMinimum {
            currency: currency.to_string(),
            min: limits.min_stake,
        });
    }
    if stake > limits.max_stake {
        return Err(BetError::StakeAboveMaximum {
            currency: currency.to_string(),
            max: limits.max_stake,
        });
    }
    Ok(())
}

/// Validate a slip for the given mode.
///
/// Single mode checks every item's own stake; the first violation in
/// iteration order is the reported error. Multibet mode validates only
/// the shared stake and ignores per-item stakes entirely. An empty
/// slip is always invalid.
pub fn validate_slip(
    items: &[BetSlipItem],
    mode: &BetMode,
    limits: &BettingLimits,
    currency: &str,
) -> Result<(), BetError> {
    if items.is_empty() {
        return Err(BetError::EmptySlip);
    }

    match mode {
        BetMode::Single => {
            for item in items {
                if !item.has_stake() {
                    return Err(BetError::MissingStake {
                        home: item.home_team.clone(),
                        away: item.away_team.clone(),
                    });
                }
                check_stake_bounds(item.stake, limits, currency)?;
            }
            Ok(())
        }
        BetMode::Multibet { stake } => check_stake_bounds(*stake, limits, currency),
    }
}

/// Reject slips that back mutually exclusive outcomes on one event.
///
/// Items are grouped by game id; any game carrying more than one
/// distinct selection is a conflict, reported with that game's teams.
pub fn check_conflicts(items: &[BetSlipItem]) -> Result<(), BetError> {
    let mut by_game: HashMap<&str, &BetSlipItem> = HashMap::new();

    for item in items {
        match by_game.entry(item.game_id.as_str()) {
            Entry::Occupied(first) => {
                if first.get().selection != item.selection {
                    return Err(BetError::ConflictingSelections {
                        home: item.home_team.clone(),
                        away: item.away_team.clone(),
                    });
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(item);
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
