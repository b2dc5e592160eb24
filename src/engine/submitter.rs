//! Bet submission sequencer.
//!
//! Drives the two-phase create→place flow as a small saga: local
//! validation fails fast before any network call, the place phase only
//! runs once the create phase has yielded a slip id, and a failed place
//! phase triggers a best-effort cancellation of the orphaned slip so no
//! staged resource is left behind. Nothing here retries; resubmission
//! is always an explicit caller action.

use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

use crate::api::session::SessionContext;
use crate::api::{BettingApi, SlipRequest, WireSelection};
use crate::slip::validator;
use crate::types::{
    BetError, BetMode, BetSlipItem, BettingLimits, PlacementOutcome, ValidationReport,
};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Result of the per-item fan-out path for independent single bets.
#[derive(Debug, Clone, Default)]
pub struct SubmissionReport {
    pub placed: Vec<PlacementOutcome>,
    pub failed: Vec<FailedSubmission>,
}

#[derive(Debug, Clone)]
pub struct FailedSubmission {
    pub item_id: String,
    pub event: String,
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Submitter
// ---------------------------------------------------------------------------

/// Two-phase bet submitter over any [`BettingApi`].
pub struct BetSubmitter<A: BettingApi> {
    api: A,
    limits: BettingLimits,
    currency: String,
    in_flight: AtomicBool,
}

/// Releases the in-flight flag when a submission finishes, including
/// on early error returns.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<A: BettingApi> BetSubmitter<A> {
    pub fn new(api: A, limits: BettingLimits, currency: impl Into<String>) -> Self {
        Self {
            api,
            limits,
            currency: currency.into(),
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn acquire(&self) -> Result<InFlightGuard<'_>, BetError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(BetError::SubmissionInFlight);
        }
        Ok(InFlightGuard(&self.in_flight))
    }

    /// Submit the slip as one server-side resource: single bets in bulk
    /// or a multibet, depending on `mode`. Overlapping submissions are
    /// rejected outright rather than queued.
    pub async fn place(
        &self,
        items: &[BetSlipItem],
        mode: &BetMode,
        session: &SessionContext,
    ) -> Result<PlacementOutcome, BetError> {
        let _guard = self.acquire()?;
        self.place_inner(items, mode, session).await
    }

    /// Fan out N independent single bets, each through its own full
    /// two-phase sequence, strictly one after another. Failures are
    /// collected per item instead of aborting the rest.
    pub async fn place_each(
        &self,
        items: &[BetSlipItem],
        session: &SessionContext,
    ) -> Result<SubmissionReport, BetError> {
        let _guard = self.acquire()?;

        let mut report = SubmissionReport::default();
        for item in items {
            match self
                .place_inner(std::slice::from_ref(item), &BetMode::Single, session)
                .await
            {
                Ok(outcome) => report.placed.push(outcome),
                Err(e) => {
                    warn!(item = %item.id, error = %e, "Single-bet submission failed");
                    report.failed.push(FailedSubmission {
                        item_id: item.id.clone(),
                        event: item.event_label(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            placed = report.placed.len(),
            failed = report.failed.len(),
            "Single-bet fan-out complete"
        );
        Ok(report)
    }

    async fn place_inner(
        &self,
        items: &[BetSlipItem],
        mode: &BetMode,
        session: &SessionContext,
    ) -> Result<PlacementOutcome, BetError> {
        // Fail fast locally; no network call on a bad slip.
        validator::validate_slip(items, mode, &self.limits, &self.currency)?;
        validator::check_conflicts(items)?;
        precheck_selections(items, mode)?;

        let request = build_request(items, mode, session);

        let slip = self.api.create_slip(&request).await?;
        info!(
            slip_id = %slip.id,
            selections = items.len(),
            stake = %request.stake,
            mode = %mode,
            "Bet slip created"
        );

        match self.api.place_slip(&session.user_id, &slip.id).await {
            Ok(outcome) => {
                info!(slip_id = %slip.id, bets = outcome.bets.len(), "Bet slip placed");
                Ok(outcome)
            }
            Err(err) => {
                // Compensate: the created slip would otherwise be orphaned.
                warn!(slip_id = %slip.id, error = %err, "Place phase failed, cancelling slip");
                match self.api.cancel_slip(&session.user_id, &slip.id).await {
                    Ok(()) => info!(slip_id = %slip.id, "Orphaned slip cancelled"),
                    Err(cancel_err) => {
                        warn!(
                            slip_id = %slip.id,
                            error = %cancel_err,
                            "Slip cancellation failed; orphan remains server-side"
                        );
                    }
                }
                Err(err)
            }
        }
    }

    /// Advisory server-side check of the mapped selections. Degrades to
    /// a local failure report instead of surfacing transport errors;
    /// never gates `place` directly.
    pub async fn preflight(&self, items: &[BetSlipItem]) -> ValidationReport {
        if items.is_empty() {
            return ValidationReport::failure(BetError::EmptySlip.to_string());
        }
        let selections: Vec<WireSelection> =
            items.iter().map(WireSelection::from_item).collect();

        match self.api.validate_selections(&selections).await {
            Ok(report) => report,
            Err(e) => {
                warn!(error = %e, "Advisory validation unavailable");
                ValidationReport::failure(e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Request construction
// ---------------------------------------------------------------------------

/// Reject payloads the server would refuse anyway, naming the offending
/// selection before any network call.
fn precheck_selections(items: &[BetSlipItem], mode: &BetMode) -> Result<(), BetError> {
    for item in items {
        let label = item.event_label();
        if item.game_id.trim().is_empty() {
            return Err(BetError::InvalidSelection(format!(
                "missing game id for {label}"
            )));
        }
        if item.home_team.trim().is_empty() || item.away_team.trim().is_empty() {
            return Err(BetError::InvalidSelection(format!(
                "missing team names for game {}",
                item.game_id
            )));
        }
        if item.bet_type.trim().is_empty() || item.selection.trim().is_empty() {
            return Err(BetError::InvalidSelection(format!(
                "missing market or selection for {label}"
            )));
        }
        if item.odds.is_sign_negative() || item.odds.is_zero() {
            return Err(BetError::InvalidSelection(format!(
                "invalid odds for {label}"
            )));
        }
        if !mode.is_multibet() && !item.has_stake() {
            return Err(BetError::InvalidSelection(format!(
                "missing stake for {label}"
            )));
        }
    }
    Ok(())
}

fn build_request(items: &[BetSlipItem], mode: &BetMode, session: &SessionContext) -> SlipRequest {
    let stake = match mode {
        BetMode::Multibet { stake } => *stake,
        BetMode::Single => items.iter().map(|i| i.stake).sum(),
    };
    SlipRequest {
        user_id: session.user_id.clone(),
        selections: items.iter().map(WireSelection::from_item).collect(),
        stake,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BetStatus, CreatedSlip, PlacedBet};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// Scriptable in-memory API that records the order of calls.
    #[derive(Default)]
    struct ScriptedApi {
        calls: Mutex<Vec<String>>,
        fail_create: bool,
        fail_place: bool,
        fail_cancel: bool,
        empty_slip_id: bool,
    }

    impl ScriptedApi {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BettingApi for ScriptedApi {
        async fn create_slip(&self, request: &SlipRequest) -> Result<CreatedSlip, BetError> {
            self.calls.lock().unwrap().push("create".to_string());
            if self.fail_create {
                return Err(BetError::Server("creation refused".to_string()));
            }
            if self.empty_slip_id {
                return Err(BetError::SlipNotCreated);
            }
            Ok(CreatedSlip {
                id: "SLIP-1".to_string(),
                stake: Some(request.stake),
                combined_odds: None,
                potential_winnings: None,
                tax_percentage: None,
                tax_amount: None,
                net_winnings: None,
                created_at: None,
                expires_at: None,
            })
        }

        async fn place_slip(
            &self,
            _user_id: &str,
            slip_id: &str,
        ) -> Result<PlacementOutcome, BetError> {
            self.calls.lock().unwrap().push("place".to_string());
            if self.fail_place {
                return Err(BetError::Server("placement refused".to_string()));
            }
            Ok(PlacementOutcome {
                slip_id: slip_id.to_string(),
                bets: vec![PlacedBet {
                    bet_id: "B1".to_string(),
                    slip_id: Some(slip_id.to_string()),
                    status: BetStatus::Accepted,
                    stake: None,
                    potential_winnings: None,
                    placed_at: None,
                    settled_at: None,
                    cancelled_at: None,
                }],
            })
        }

        async fn validate_selections(
            &self,
            _selections: &[WireSelection],
        ) -> Result<ValidationReport, BetError> {
            self.calls.lock().unwrap().push("validate".to_string());
            Ok(ValidationReport::ok())
        }

        async fn cancel_slip(&self, _user_id: &str, _slip_id: &str) -> Result<(), BetError> {
            self.calls.lock().unwrap().push("cancel".to_string());
            if self.fail_cancel {
                return Err(BetError::Network);
            }
            Ok(())
        }
    }

    fn submitter(api: ScriptedApi) -> BetSubmitter<ScriptedApi> {
        BetSubmitter::new(api, BettingLimits::default(), "SSP")
    }

    fn session() -> SessionContext {
        SessionContext::new("U1", "tok")
    }

    fn item(game_id: &str, stake: rust_decimal::Decimal) -> BetSlipItem {
        let mut it = BetSlipItem::new(game_id, "A", "B", "3 Way", "Home", dec!(2.0));
        it.stake = stake;
        it
    }

    #[tokio::test]
    async fn test_happy_path_orders_create_before_place() {
        let sub = submitter(ScriptedApi::default());
        let items = vec![item("G1", dec!(200))];
        let outcome = sub.place(&items, &BetMode::Single, &session()).await.unwrap();
        assert_eq!(outcome.slip_id, "SLIP-1");
        assert_eq!(outcome.bets[0].status, BetStatus::Accepted);
        assert_eq!(sub.api().calls(), ["create", "place"]);
    }

    #[tokio::test]
    async fn test_invalid_slip_makes_no_network_call() {
        let sub = submitter(ScriptedApi::default());
        let items = vec![item("G1", dec!(50))];
        let err = sub.place(&items, &BetMode::Single, &session()).await.unwrap_err();
        assert!(matches!(err, BetError::StakeBelowMinimum { .. }));
        assert!(sub.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_conflicting_selections_rejected_locally() {
        let sub = submitter(ScriptedApi::default());
        let mut other = item("G1", dec!(200));
        other.selection = "Away".to_string();
        other.id = BetSlipItem::derive_id("G1", "3 Way", "Away");
        let items = vec![item("G1", dec!(200)), other];
        let err = sub
            .place(&items, &BetMode::Multibet { stake: dec!(200) }, &session())
            .await
            .unwrap_err();
        assert!(matches!(err, BetError::ConflictingSelections { .. }));
        assert!(sub.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_create_failure_skips_place() {
        let api = ScriptedApi {
            fail_create: true,
            ..Default::default()
        };
        let sub = submitter(api);
        let items = vec![item("G1", dec!(200))];
        let err = sub.place(&items, &BetMode::Single, &session()).await.unwrap_err();
        assert!(matches!(err, BetError::Server(_)));
        assert_eq!(sub.api().calls(), ["create"]);
    }

    #[tokio::test]
    async fn test_missing_slip_id_fails_with_slip_not_created() {
        let api = ScriptedApi {
            empty_slip_id: true,
            ..Default::default()
        };
        let sub = submitter(api);
        let items = vec![item("G1", dec!(200))];
        let err = sub.place(&items, &BetMode::Single, &session()).await.unwrap_err();
        assert_eq!(format!("{err}"), "Failed to create bet slip");
        assert_eq!(sub.api().calls(), ["create"]);
    }

    #[tokio::test]
    async fn test_place_failure_triggers_compensation() {
        let api = ScriptedApi {
            fail_place: true,
            ..Default::default()
        };
        let sub = submitter(api);
        let items = vec![item("G1", dec!(200))];
        let err = sub.place(&items, &BetMode::Single, &session()).await.unwrap_err();
        assert_eq!(format!("{err}"), "Server error: placement refused");
        assert_eq!(sub.api().calls(), ["create", "place", "cancel"]);
    }

    #[tokio::test]
    async fn test_compensation_failure_preserves_original_error() {
        let api = ScriptedApi {
            fail_place: true,
            fail_cancel: true,
            ..Default::default()
        };
        let sub = submitter(api);
        let items = vec![item("G1", dec!(200))];
        let err = sub.place(&items, &BetMode::Single, &session()).await.unwrap_err();
        // The place error surfaces, not the cancellation's network error.
        assert!(matches!(err, BetError::Server(_)));
    }

    #[tokio::test]
    async fn test_multibet_uses_shared_stake() {
        let sub = submitter(ScriptedApi::default());
        let items = vec![item("G1", dec!(0)), item("G2", dec!(0))];
        let mode = BetMode::Multibet { stake: dec!(500) };
        let outcome = sub.place(&items, &mode, &session()).await.unwrap();
        assert_eq!(outcome.slip_id, "SLIP-1");
    }

    #[tokio::test]
    async fn test_in_flight_guard_rejects_overlap_and_releases() {
        let sub = submitter(ScriptedApi::default());
        let items = vec![item("G1", dec!(200))];

        let guard = sub.acquire().unwrap();
        let err = sub.place(&items, &BetMode::Single, &session()).await.unwrap_err();
        assert!(matches!(err, BetError::SubmissionInFlight));
        drop(guard);

        assert!(sub.place(&items, &BetMode::Single, &session()).await.is_ok());
    }

    #[tokio::test]
    async fn test_place_each_collects_partial_failures() {
        let sub = submitter(ScriptedApi::default());
        let mut bad = item("", dec!(200));
        bad.game_id = String::new();
        let items = vec![item("G1", dec!(200)), bad, item("G3", dec!(200))];

        let report = sub.place_each(&items, &session()).await.unwrap();
        assert_eq!(report.placed.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].reason.contains("missing game id"));
    }

    #[tokio::test]
    async fn test_precheck_rejects_zero_odds() {
        let sub = submitter(ScriptedApi::default());
        let mut bad = item("G1", dec!(200));
        bad.odds = dec!(0);
        let err = sub
            .place(&[bad], &BetMode::Single, &session())
            .await
            .unwrap_err();
        assert!(matches!(err, BetError::InvalidSelection(_)));
        assert!(sub.api().calls().is_empty());
    }

    #[tokio::test]
    async fn test_preflight_degrades_on_empty_slip() {
        let sub = submitter(ScriptedApi::default());
        let report = sub.preflight(&[]).await;
        assert!(!report.is_valid);
        assert_eq!(report.errors, ["No bets selected"]);
    }

    #[tokio::test]
    async fn test_preflight_passes_through_server_verdict() {
        let sub = submitter(ScriptedApi::default());
        let report = sub.preflight(&[item("G1", dec!(200))]).await;
        assert!(report.is_valid);
        assert_eq!(sub.api().calls(), ["validate"]);
    }
}
