//! HTTP implementation of the betting API.
//!
//! Owns every wire response shape the service is known to emit and
//! normalises them into the canonical types at this boundary, so no
//! caller ever branches on response shape. The create endpoint in
//! particular has returned the slip id both as `data.betSlipId` and as
//! `data.betSlip.id` across API versions; both resolve here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{BettingApi, SlipRequest, WireSelection};
use crate::types::{
    BetError, BetStatus, CreatedSlip, PlacedBet, PlacementOutcome, ValidationReport,
};

const USER_AGENT: &str = "betslip/0.1.0 (shop-client)";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Wire response types
// ---------------------------------------------------------------------------

/// Server-side slip fields, wherever they appear in a response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlipResource {
    id: Option<String>,
    stake: Option<Decimal>,
    combined_odds: Option<Decimal>,
    potential_winnings: Option<Decimal>,
    tax_percentage: Option<Decimal>,
    tax_amount: Option<Decimal>,
    net_winnings: Option<Decimal>,
    created_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateData {
    bet_slip_id: Option<String>,
    bet_slip: Option<SlipResource>,
    #[serde(flatten)]
    inline: SlipResource,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    success: Option<bool>,
    error: Option<String>,
    message: Option<String>,
    data: Option<CreateData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBet {
    #[serde(alias = "betId")]
    id: Option<String>,
    status: Option<String>,
    stake: Option<Decimal>,
    potential_winnings: Option<Decimal>,
    #[serde(alias = "createdAt")]
    placed_at: Option<DateTime<Utc>>,
    settled_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceData {
    bet_slip: Option<WireBet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceResponse {
    success: Option<bool>,
    error: Option<String>,
    message: Option<String>,
    bets: Option<Vec<WireBet>>,
    bet_id: Option<String>,
    data: Option<PlaceData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateData {
    is_valid: bool,
    #[serde(default)]
    errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateResponse {
    success: Option<bool>,
    error: Option<String>,
    message: Option<String>,
    data: Option<ValidateData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CancelResponse {
    success: Option<bool>,
    error: Option<String>,
    message: Option<String>,
}

// ---------------------------------------------------------------------------
// Normalisation
// ---------------------------------------------------------------------------

fn server_message(error: Option<String>, message: Option<String>, fallback: &str) -> String {
    error
        .filter(|s| !s.is_empty())
        .or(message.filter(|s| !s.is_empty()))
        .unwrap_or_else(|| fallback.to_string())
}

fn normalize_created(data: CreateData) -> Result<CreatedSlip, BetError> {
    let nested = data.bet_slip.unwrap_or_default();

    let id = data
        .bet_slip_id
        .or(nested.id)
        .filter(|id| !id.is_empty())
        .ok_or(BetError::SlipNotCreated)?;

    let inline = data.inline;
    Ok(CreatedSlip {
        id,
        stake: nested.stake.or(inline.stake),
        combined_odds: nested.combined_odds.or(inline.combined_odds),
        potential_winnings: nested.potential_winnings.or(inline.potential_winnings),
        tax_percentage: nested.tax_percentage.or(inline.tax_percentage),
        tax_amount: nested.tax_amount.or(inline.tax_amount),
        net_winnings: nested.net_winnings.or(inline.net_winnings),
        created_at: nested.created_at.or(inline.created_at),
        expires_at: nested.expires_at.or(inline.expires_at),
    })
}

fn normalize_bet(slip_id: &str, bet: WireBet) -> PlacedBet {
    let status = bet
        .status
        .as_deref()
        .and_then(|s| s.parse::<BetStatus>().ok())
        .unwrap_or(BetStatus::Pending);

    PlacedBet {
        bet_id: bet.id.unwrap_or_else(|| slip_id.to_string()),
        slip_id: Some(slip_id.to_string()),
        status,
        stake: bet.stake,
        potential_winnings: bet.potential_winnings,
        placed_at: bet.placed_at,
        settled_at: bet.settled_at,
        cancelled_at: bet.cancelled_at,
    }
}

fn normalize_placement(slip_id: &str, resp: PlaceResponse) -> Result<PlacementOutcome, BetError> {
    if resp.success == Some(false) {
        return Err(BetError::Server(server_message(
            resp.error,
            resp.message,
            "bet placement rejected",
        )));
    }

    let bets: Vec<PlacedBet> = if let Some(bets) = resp.bets {
        bets.into_iter().map(|b| normalize_bet(slip_id, b)).collect()
    } else if let Some(bet_id) = resp.bet_id {
        vec![PlacedBet {
            bet_id,
            slip_id: Some(slip_id.to_string()),
            status: BetStatus::Pending,
            stake: None,
            potential_winnings: None,
            placed_at: None,
            settled_at: None,
            cancelled_at: None,
        }]
    } else if let Some(slip) = resp.data.and_then(|d| d.bet_slip) {
        vec![normalize_bet(slip_id, slip)]
    } else {
        return Err(BetError::Unexpected(
            "Placement response carried no bet details".to_string(),
        ));
    };

    Ok(PlacementOutcome {
        slip_id: slip_id.to_string(),
        bets,
    })
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Production betting-service client.
pub struct HttpBettingClient {
    http: Client,
    base_url: String,
    token: SecretString,
}

impl HttpBettingClient {
    pub fn new(base_url: &str, token: SecretString) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, token, DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(
        base_url: &str,
        token: SecretString,
        timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        use anyhow::Context;

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client for betting service")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Authenticated POST with error mapping: no response at all is a
    /// connectivity error, a structured rejection surfaces verbatim,
    /// everything else is unexpected.
    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<T, BetError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Betting API request");

        let resp = self
            .http
            .post(&url)
            .bearer_auth(self.token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() || e.is_request() {
                    BetError::Network
                } else {
                    BetError::Unexpected(e.to_string())
                }
            })?;

        let status = resp.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(BetError::NotAuthenticated);
        }
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            let msg = serde_json::from_str::<serde_json::Value>(&body_text)
                .ok()
                .and_then(|v| {
                    v.get("error")
                        .or_else(|| v.get("message"))
                        .and_then(|m| m.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| format!("HTTP {status}"));
            return Err(BetError::Server(msg));
        }

        resp.json::<T>()
            .await
            .map_err(|e| BetError::Unexpected(format!("Malformed response: {e}")))
    }
}

#[async_trait]
impl BettingApi for HttpBettingClient {
    async fn create_slip(&self, request: &SlipRequest) -> Result<CreatedSlip, BetError> {
        let body = serde_json::to_value(request)
            .map_err(|e| BetError::Unexpected(e.to_string()))?;
        let resp: CreateResponse = self.post("/bets/slip", &body).await?;

        if resp.success == Some(false) {
            return Err(BetError::Server(server_message(
                resp.error,
                resp.message,
                "slip creation rejected",
            )));
        }

        let slip = normalize_created(resp.data.ok_or(BetError::SlipNotCreated)?)?;
        debug!(slip_id = %slip.id, "Bet slip created");
        Ok(slip)
    }

    async fn place_slip(
        &self,
        user_id: &str,
        slip_id: &str,
    ) -> Result<PlacementOutcome, BetError> {
        let body = serde_json::json!({
            "userId": user_id,
            "betSlipId": slip_id,
        });
        let resp: PlaceResponse = self.post("/bets/place", &body).await?;
        normalize_placement(slip_id, resp)
    }

    async fn validate_selections(
        &self,
        selections: &[WireSelection],
    ) -> Result<ValidationReport, BetError> {
        let wire: Vec<serde_json::Value> = selections
            .iter()
            .map(|s| {
                serde_json::json!({
                    "gameId": s.game_id,
                    "marketType": s.market_type,
                    "outcome": s.outcome,
                    "odds": s.odds.decimal,
                })
            })
            .collect();
        let body = serde_json::json!({ "selections": wire });

        let resp: ValidateResponse = self.post("/bets/validate", &body).await?;
        if resp.success == Some(false) {
            return Err(BetError::Server(server_message(
                resp.error,
                resp.message,
                "validation rejected",
            )));
        }

        let data = resp
            .data
            .ok_or_else(|| BetError::Unexpected("Validation response missing data".to_string()))?;
        Ok(ValidationReport {
            is_valid: data.is_valid,
            errors: data.errors,
        })
    }

    async fn cancel_slip(&self, user_id: &str, slip_id: &str) -> Result<(), BetError> {
        let body = serde_json::json!({
            "userId": user_id,
            "betSlipId": slip_id,
        });
        let resp: CancelResponse = self.post("/bets/cancel", &body).await?;

        if resp.success == Some(false) {
            let msg = server_message(resp.error, resp.message, "cancellation rejected");
            warn!(slip_id = %slip_id, error = %msg, "Slip cancellation rejected");
            return Err(BetError::Server(msg));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
