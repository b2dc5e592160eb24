//! Shared types for the bet-slip engine.
//!
//! These types form the data model used across all modules. They are
//! designed to be stable so that the slip store, mapper, API client,
//! and submitter can depend on them without circular references.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Slip items
// ---------------------------------------------------------------------------

/// One client-side selection (event + market + outcome + odds + stake)
/// before submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetSlipItem {
    /// Derived from game + bet type + selection; stable across edits.
    pub id: String,
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    /// UI vocabulary, e.g. "3 Way", "Double Chance".
    pub bet_type: String,
    /// UI vocabulary, e.g. "Home", "1 or X".
    pub selection: String,
    /// Decimal odds for this selection.
    pub odds: Decimal,
    /// Per-item stake. Zero means the user has not entered one yet.
    pub stake: Decimal,
    /// Odds-source metadata, forwarded verbatim when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmaker: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sport_key: Option<String>,
}

impl BetSlipItem {
    pub fn new(
        game_id: &str,
        home_team: &str,
        away_team: &str,
        bet_type: &str,
        selection: &str,
        odds: Decimal,
    ) -> Self {
        Self {
            id: Self::derive_id(game_id, bet_type, selection),
            game_id: game_id.to_string(),
            home_team: home_team.to_string(),
            away_team: away_team.to_string(),
            bet_type: bet_type.to_string(),
            selection: selection.to_string(),
            odds,
            stake: Decimal::ZERO,
            bookmaker: None,
            game_time: None,
            sport_key: None,
        }
    }

    /// Attach the feed metadata the create endpoint accepts: where the
    /// odds came from and which sport/fixture they belong to.
    pub fn with_source(
        mut self,
        bookmaker: impl Into<String>,
        sport_key: impl Into<String>,
        game_time: DateTime<Utc>,
    ) -> Self {
        self.bookmaker = Some(bookmaker.into());
        self.sport_key = Some(sport_key.into());
        self.game_time = Some(game_time);
        self
    }

    /// Identifier for an odds cell: one per (game, market, outcome).
    pub fn derive_id(game_id: &str, bet_type: &str, selection: &str) -> String {
        format!("{game_id}:{bet_type}:{selection}")
            .to_lowercase()
            .replace(' ', "-")
    }

    /// Potential winnings are always a function of current stake and
    /// odds, never stored, so they can never drift out of sync.
    pub fn potential_winnings(&self) -> Decimal {
        self.stake * self.odds
    }

    /// Whether the user has entered a stake for this item.
    pub fn has_stake(&self) -> bool {
        !self.stake.is_zero()
    }

    /// Event label used in user-facing messages.
    pub fn event_label(&self) -> String {
        format!("{} vs {}", self.home_team, self.away_team)
    }
}

impl fmt::Display for BetSlipItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} / {} @ {} (stake {})",
            self.event_label(),
            self.bet_type,
            self.selection,
            self.odds,
            self.stake,
        )
    }
}

// ---------------------------------------------------------------------------
// Mode and limits
// ---------------------------------------------------------------------------

/// How a slip is interpreted at validation and submission time.
///
/// `Multibet` carries the single shared stake wagered across all
/// selections via multiplied odds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BetMode {
    Single,
    Multibet { stake: Decimal },
}

impl BetMode {
    pub fn is_multibet(&self) -> bool {
        matches!(self, BetMode::Multibet { .. })
    }
}

impl fmt::Display for BetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetMode::Single => write!(f, "single"),
            BetMode::Multibet { stake } => write!(f, "multibet (stake {stake})"),
        }
    }
}

/// Per-user stake bounds. Applied per item in single mode and to the
/// shared stake in multibet mode.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BettingLimits {
    pub min_stake: Decimal,
    pub max_stake: Decimal,
}

impl Default for BettingLimits {
    fn default() -> Self {
        Self {
            min_stake: dec!(200),
            max_stake: dec!(1_000_000),
        }
    }
}

impl BettingLimits {
    pub fn contains(&self, stake: Decimal) -> bool {
        stake >= self.min_stake && stake <= self.max_stake
    }
}

// ---------------------------------------------------------------------------
// Odds representations
// ---------------------------------------------------------------------------

/// The three odds conventions the wire format carries side by side.
/// `multiplier` is passed through unchanged for downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OddsFormats {
    pub decimal: Decimal,
    pub american: i64,
    pub multiplier: Decimal,
}

impl fmt::Display for OddsFormats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.american > 0 { "+" } else { "" };
        write!(f, "{} ({sign}{})", self.decimal, self.american)
    }
}

// ---------------------------------------------------------------------------
// Server-side slip and placed bets
// ---------------------------------------------------------------------------

/// Canonical form of the server-created slip resource. The server is
/// authoritative for tax and net winnings; the optional fields are only
/// filled when it supplied them, with local fallbacks for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedSlip {
    pub id: String,
    pub stake: Option<Decimal>,
    pub combined_odds: Option<Decimal>,
    pub potential_winnings: Option<Decimal>,
    pub tax_percentage: Option<Decimal>,
    pub tax_amount: Option<Decimal>,
    pub net_winnings: Option<Decimal>,
    pub created_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl CreatedSlip {
    /// Server potential winnings, or `stake × odds` for display before
    /// the server has confirmed.
    pub fn display_potential(&self, local_stake: Decimal, local_odds: Decimal) -> Decimal {
        self.potential_winnings
            .unwrap_or(local_stake * local_odds)
    }

    /// Server net winnings, or potential minus any known tax amount.
    pub fn display_net(&self, local_stake: Decimal, local_odds: Decimal) -> Decimal {
        self.net_winnings.unwrap_or_else(|| {
            self.display_potential(local_stake, local_odds)
                - self.tax_amount.unwrap_or(Decimal::ZERO)
        })
    }
}

/// Lifecycle status of a placed bet. Created only by the remote system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Accepted,
    Rejected,
    Settled,
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BetStatus::Pending => write!(f, "pending"),
            BetStatus::Accepted => write!(f, "accepted"),
            BetStatus::Rejected => write!(f, "rejected"),
            BetStatus::Settled => write!(f, "settled"),
        }
    }
}

impl std::str::FromStr for BetStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(BetStatus::Pending),
            "accepted" | "placed" => Ok(BetStatus::Accepted),
            "rejected" => Ok(BetStatus::Rejected),
            "settled" => Ok(BetStatus::Settled),
            _ => Err(anyhow::anyhow!("Unknown bet status: {s}")),
        }
    }
}

/// A confirmed bet as returned by the place phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacedBet {
    pub bet_id: String,
    pub slip_id: Option<String>,
    pub status: BetStatus,
    pub stake: Option<Decimal>,
    pub potential_winnings: Option<Decimal>,
    pub placed_at: Option<DateTime<Utc>>,
    pub settled_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl fmt::Display for PlacedBet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bet {} [{}]", self.bet_id, self.status)
    }
}

/// Normalised result of the place phase. Multibet placement yields a
/// single bet; the bulk path may yield several.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementOutcome {
    pub slip_id: String,
    pub bets: Vec<PlacedBet>,
}

// ---------------------------------------------------------------------------
// Advisory validation
// ---------------------------------------------------------------------------

/// Result of the best-effort server-side selection check. Informational
/// only; the UI decides whether to gate the submit control on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            errors: vec![message.into()],
        }
    }
}

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Domain errors for the bet-slip engine.
///
/// Local validation errors are detected before any network call.
/// `Network` means no response was received; `Server` carries a
/// structured rejection verbatim; `Unexpected` is everything else.
#[derive(Debug, thiserror::Error)]
pub enum BetError {
    #[error("No bets selected")]
    EmptySlip,

    #[error("Enter a stake for {home} vs {away}")]
    MissingStake { home: String, away: String },

    #[error("Minimum stake is {currency} {min:.2}")]
    StakeBelowMinimum { currency: String, min: Decimal },

    #[error("Maximum stake is {currency} {max:.2}")]
    StakeAboveMaximum { currency: String, max: Decimal },

    #[error("Conflicting selections for {home} vs {away}")]
    ConflictingSelections { home: String, away: String },

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("User ID not found")]
    UserIdNotFound,

    #[error("Failed to create bet slip")]
    SlipNotCreated,

    #[error("A bet submission is already in progress")]
    SubmissionInFlight,

    #[error("Network error - please check your connection and try again")]
    Network,

    #[error("Server error: {0}")]
    Server(String),

    #[error("{0}")]
    Unexpected(String),
}

impl BetError {
    /// Whether this error was raised before any network call was made.
    pub fn is_local(&self) -> bool {
        !matches!(
            self,
            BetError::Network | BetError::Server(_) | BetError::Unexpected(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
