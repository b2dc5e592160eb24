//! Mock betting API for integration testing.
//!
//! A deterministic in-memory `BettingApi` implementation: it creates
//! slips with server-computed tax figures, accepts placements, records
//! cancellations, and can be forced to fail any phase from test code.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use betslip::api::{BettingApi, SlipRequest, WireSelection};
use betslip::types::{
    BetError, BetStatus, CreatedSlip, PlacedBet, PlacementOutcome, ValidationReport,
};

/// Winnings tax the mock server applies, mirroring production.
const TAX_RATE: Decimal = dec!(0.15);

/// Initialise test logging once; respects `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone)]
pub struct StoredSlip {
    pub slip: CreatedSlip,
    pub user_id: String,
    pub selections: usize,
    pub placed: bool,
    pub cancelled: bool,
}

#[derive(Default)]
struct MockState {
    slips: HashMap<String, StoredSlip>,
    calls: Vec<String>,
    fail_create: bool,
    fail_place: bool,
    fail_cancel: bool,
    fail_validate: bool,
    invalid_outcomes: Vec<String>,
}

/// In-memory betting service. All state is controllable from tests.
#[derive(Clone, Default)]
pub struct MockBettingApi {
    state: Arc<Mutex<MockState>>,
}

impl MockBettingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create(&self) {
        self.state.lock().unwrap().fail_create = true;
    }

    pub fn fail_place(&self) {
        self.state.lock().unwrap().fail_place = true;
    }

    pub fn fail_cancel(&self) {
        self.state.lock().unwrap().fail_cancel = true;
    }

    pub fn fail_validate(&self) {
        self.state.lock().unwrap().fail_validate = true;
    }

    /// Mark an outcome string as invalid for the advisory check.
    pub fn reject_outcome(&self, outcome: &str) {
        self.state
            .lock()
            .unwrap()
            .invalid_outcomes
            .push(outcome.to_string());
    }

    /// Order of API calls seen so far ("create", "place", ...).
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn slip(&self, id: &str) -> Option<StoredSlip> {
        self.state.lock().unwrap().slips.get(id).cloned()
    }

    pub fn slips(&self) -> Vec<StoredSlip> {
        self.state.lock().unwrap().slips.values().cloned().collect()
    }
}

#[async_trait]
impl BettingApi for MockBettingApi {
    async fn create_slip(&self, request: &SlipRequest) -> Result<CreatedSlip, BetError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("create".to_string());

        if state.fail_create {
            return Err(BetError::Server("slip creation refused".to_string()));
        }

        let combined: Decimal = request
            .selections
            .iter()
            .fold(Decimal::ONE, |acc, s| acc * s.odds.decimal);
        let potential = request.stake * combined;
        let tax = potential * TAX_RATE;

        let slip = CreatedSlip {
            id: format!("SLIP-{}", Uuid::new_v4()),
            stake: Some(request.stake),
            combined_odds: Some(combined),
            potential_winnings: Some(potential),
            tax_percentage: Some(TAX_RATE * dec!(100)),
            tax_amount: Some(tax),
            net_winnings: Some(potential - tax),
            created_at: Some(Utc::now()),
            expires_at: Some(Utc::now() + chrono::Duration::minutes(10)),
        };

        state.slips.insert(
            slip.id.clone(),
            StoredSlip {
                slip: slip.clone(),
                user_id: request.user_id.clone(),
                selections: request.selections.len(),
                placed: false,
                cancelled: false,
            },
        );
        Ok(slip)
    }

    async fn place_slip(
        &self,
        user_id: &str,
        slip_id: &str,
    ) -> Result<PlacementOutcome, BetError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("place".to_string());

        if state.fail_place {
            return Err(BetError::Server("insufficient balance".to_string()));
        }

        let stored = state
            .slips
            .get_mut(slip_id)
            .ok_or_else(|| BetError::Server(format!("unknown slip {slip_id}")))?;
        if stored.user_id != user_id {
            return Err(BetError::Server("slip belongs to another user".to_string()));
        }
        stored.placed = true;

        Ok(PlacementOutcome {
            slip_id: slip_id.to_string(),
            bets: vec![PlacedBet {
                bet_id: format!("BET-{}", Uuid::new_v4()),
                slip_id: Some(slip_id.to_string()),
                status: BetStatus::Accepted,
                stake: stored.slip.stake,
                potential_winnings: stored.slip.potential_winnings,
                placed_at: Some(Utc::now()),
                settled_at: None,
                cancelled_at: None,
            }],
        })
    }

    async fn validate_selections(
        &self,
        selections: &[WireSelection],
    ) -> Result<ValidationReport, BetError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("validate".to_string());

        if state.fail_validate {
            return Err(BetError::Network);
        }

        let errors: Vec<String> = selections
            .iter()
            .filter(|s| state.invalid_outcomes.contains(&s.outcome))
            .map(|s| format!("Invalid outcome '{}' for game {}", s.outcome, s.game_id))
            .collect();

        Ok(ValidationReport {
            is_valid: errors.is_empty(),
            errors,
        })
    }

    async fn cancel_slip(&self, _user_id: &str, slip_id: &str) -> Result<(), BetError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("cancel".to_string());

        if state.fail_cancel {
            return Err(BetError::Network);
        }

        if let Some(stored) = state.slips.get_mut(slip_id) {
            stored.cancelled = true;
        }
        Ok(())
    }
}
