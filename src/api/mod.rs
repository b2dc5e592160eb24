//! Remote betting API boundary.
//!
//! Defines the `BettingApi` trait plus the wire request types. The HTTP
//! implementation lives in [`client`]; tests substitute an in-memory
//! mock. Callers only ever see the canonical response types from
//! `crate::types`; all response-shape sniffing stays behind this seam.

pub mod client;
pub mod session;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::slip::mapper::{self, MarketType};
use crate::types::{
    BetError, BetSlipItem, CreatedSlip, OddsFormats, PlacementOutcome, ValidationReport,
};

// ---------------------------------------------------------------------------
// Wire request types
// ---------------------------------------------------------------------------

/// One selection in wire vocabulary, as sent to the create endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireSelection {
    pub game_id: String,
    pub home_team: String,
    pub away_team: String,
    pub market_type: MarketType,
    pub outcome: String,
    pub odds: OddsFormats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmaker: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport_key: Option<String>,
}

impl WireSelection {
    /// Translate a client-side item through the odds/market mapper.
    pub fn from_item(item: &BetSlipItem) -> Self {
        let (market_type, outcome) = mapper::map_selection(
            &item.bet_type,
            &item.selection,
            &item.home_team,
            &item.away_team,
        );
        Self {
            game_id: item.game_id.clone(),
            home_team: item.home_team.clone(),
            away_team: item.away_team.clone(),
            market_type,
            outcome,
            odds: OddsFormats::from_decimal(item.odds),
            bookmaker: item.bookmaker.clone(),
            game_time: item.game_time,
            sport_key: item.sport_key.clone(),
        }
    }
}

/// Body of the slip-creation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlipRequest {
    pub user_id: String,
    pub selections: Vec<WireSelection>,
    pub stake: Decimal,
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Abstraction over the remote betting service.
///
/// The submitter drives this trait; the production implementation is
/// [`client::HttpBettingClient`].
#[async_trait]
pub trait BettingApi: Send + Sync {
    /// Create a server-side slip resource. The returned slip is
    /// immutable from the client's perspective.
    async fn create_slip(&self, request: &SlipRequest) -> Result<CreatedSlip, BetError>;

    /// Confirm/accept a previously created slip.
    async fn place_slip(&self, user_id: &str, slip_id: &str)
        -> Result<PlacementOutcome, BetError>;

    /// Best-effort advisory check of the mapped selections.
    async fn validate_selections(
        &self,
        selections: &[WireSelection],
    ) -> Result<ValidationReport, BetError>;

    /// Cancel an orphaned slip after a failed place phase.
    async fn cancel_slip(&self, user_id: &str, slip_id: &str) -> Result<(), BetError>;
}
