//! The deal controller: validated actions over the overlay.

use ddk_overlay::{Overlay, OverlayBackend};
use ddk_schemas::{ApprovalPatch, BriefPatch, DealPatch, DealRecord};
use ddk_stagegate::{active_stage, allowed_max_stage, GatePolicy, Stage};
use serde::Serialize;

use crate::errors::{ActionError, GateViolation, ValidationError};
use crate::settlement::SettlementQueue;
use crate::validate::{is_valid_email, is_valid_link};

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Enablement of the per-stage action controls, derived from the record and
/// the active stage. This is the UI contract: a disabled control and a gate
/// refusal always agree, because both derive from the same scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Controls {
    pub sign: bool,
    pub pay: bool,
    pub upload: bool,
    pub approve: bool,
    pub request_fix: bool,
    pub payout: bool,
}

impl Controls {
    pub fn derive(record: &DealRecord, active: Stage) -> Self {
        let n = active.index();
        Self {
            sign: n >= Stage::ContractPayment.index() && !record.contract_signed,
            pay: record.contract_signed && !record.paid,
            upload: n >= Stage::Shoot.index() && !record.upload_done,
            approve: n >= Stage::Approval.index(),
            request_fix: n >= Stage::Approval.index(),
            payout: n >= Stage::Payout.index() && !record.payout_done,
        }
    }
}

// ---------------------------------------------------------------------------
// ActionOutcome
// ---------------------------------------------------------------------------

/// What every successful action hands back: the new effective record and
/// everything the presentation layer needs to refresh itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionOutcome {
    pub record: DealRecord,
    pub active_stage: Stage,
    pub allowed_max_stage: Stage,
    pub controls: Controls,
}

// ---------------------------------------------------------------------------
// DealController
// ---------------------------------------------------------------------------

type ActionResult = Result<ActionOutcome, ActionError>;

/// Orchestrates one deal's workflow: validate → patch exactly the owned
/// fields → re-derive stages.
///
/// Hard gates are enforced on the actions where a wrong-order write would
/// break an invariant (pay, upload, approve/request-fix, payout); everything
/// else is ordered by the [`Controls`] enablement alone.
pub struct DealController<B: OverlayBackend> {
    overlay: Overlay<B>,
    base: DealRecord,
    policy: GatePolicy,
    settlements: SettlementQueue,
}

impl<B: OverlayBackend> DealController<B> {
    pub fn new(overlay: Overlay<B>, base: DealRecord, policy: GatePolicy) -> Self {
        Self {
            overlay,
            base,
            policy,
            settlements: SettlementQueue::new(),
        }
    }

    pub fn deal_id(&self) -> &str {
        &self.base.id
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// Current effective record (base merged with stored progress).
    pub fn record(&self) -> DealRecord {
        self.overlay.read(&self.base)
    }

    /// Pending settlement state, for hosts that persist or inspect it.
    pub fn settlements(&self) -> &SettlementQueue {
        &self.settlements
    }

    /// Outcome for the current state without mutating anything.
    pub fn status(&self) -> ActionOutcome {
        self.outcome_for(self.record())
    }

    fn outcome_for(&self, record: DealRecord) -> ActionOutcome {
        let active = active_stage(&record, &self.policy);
        let allowed = allowed_max_stage(&record, &self.policy);
        let controls = Controls::derive(&record, active);
        ActionOutcome {
            record,
            active_stage: active,
            allowed_max_stage: allowed,
            controls,
        }
    }

    fn apply(&mut self, patch: DealPatch) -> ActionResult {
        let record = self.overlay.patch(&self.base, &patch)?;
        Ok(self.outcome_for(record))
    }

    fn ceiling(&self) -> Stage {
        allowed_max_stage(&self.record(), &self.policy)
    }

    // -----------------------------------------------------------------------
    // Stage 1 — select
    // -----------------------------------------------------------------------

    /// Persist the blogger chosen in the search list.
    pub fn select_blogger(&mut self, blogger_id: &str) -> ActionResult {
        let id = blogger_id.trim();
        if id.is_empty() {
            return Err(ValidationError::NoBloggerSelected.into());
        }
        self.apply(DealPatch {
            selected_blogger_id: Some(id.to_string()),
            ..DealPatch::default()
        })
    }

    // -----------------------------------------------------------------------
    // Stage 2 — brief
    // -----------------------------------------------------------------------

    /// Save the brief. All three fields are required at save time; the gate
    /// separately requires all three to open the next stage, so a saved
    /// brief is always a complete one.
    pub fn save_brief(
        &mut self,
        goal: &str,
        budget: Option<u64>,
        deadline: &str,
    ) -> ActionResult {
        let goal = goal.trim();
        let deadline = deadline.trim();
        if goal.is_empty() {
            return Err(ValidationError::EmptyBriefGoal.into());
        }
        let budget = match budget {
            Some(b) if b > 0 => b,
            _ => return Err(ValidationError::MissingBriefBudget.into()),
        };
        if deadline.is_empty() {
            return Err(ValidationError::EmptyBriefDeadline.into());
        }
        self.apply(DealPatch {
            brief: Some(BriefPatch {
                goal: Some(goal.to_string()),
                budget: Some(budget),
                deadline: Some(deadline.to_string()),
            }),
            ..DealPatch::default()
        })
    }

    // -----------------------------------------------------------------------
    // Stage 3 — email
    // -----------------------------------------------------------------------

    pub fn link_email(&mut self, account: &str) -> ActionResult {
        if !is_valid_email(account) {
            return Err(ValidationError::InvalidEmail.into());
        }
        self.apply(DealPatch {
            email_linked: Some(true),
            email_account: Some(account.trim().to_string()),
            ..DealPatch::default()
        })
    }

    // -----------------------------------------------------------------------
    // Stage 4 — outreach
    // -----------------------------------------------------------------------

    /// Informational only: no state change, just the refreshed outcome.
    /// The host renders the recipient list from its selection provider.
    pub fn prepare_outreach(&self) -> ActionOutcome {
        self.status()
    }

    pub fn send_outreach(&mut self) -> ActionResult {
        self.apply(DealPatch {
            outreach_sent: Some(true),
            ..DealPatch::default()
        })
    }

    /// Record replies to the mailing. Marks the mailing sent as well — a
    /// reply implies the mail went out.
    pub fn record_responses(&mut self, count: u32) -> ActionResult {
        if count == 0 {
            return Err(ValidationError::NoResponsesRecorded.into());
        }
        self.apply(DealPatch {
            outreach_sent: Some(true),
            outreach_responses: Some(count),
            ..DealPatch::default()
        })
    }

    // -----------------------------------------------------------------------
    // Stage 5 — contract + payment
    // -----------------------------------------------------------------------

    pub fn sign_contract(&mut self) -> ActionResult {
        self.apply(DealPatch {
            contract_signed: Some(true),
            ..DealPatch::default()
        })
    }

    /// Reserve/pay the campaign funds. Hard-gated on the signed contract
    /// regardless of what the UI showed.
    pub fn pay(&mut self) -> ActionResult {
        if !self.record().contract_signed {
            return Err(GateViolation::ContractNotSigned.into());
        }
        self.apply(DealPatch {
            paid: Some(true),
            ..DealPatch::default()
        })
    }

    // -----------------------------------------------------------------------
    // Stage 6 — shoot
    // -----------------------------------------------------------------------

    /// Register the uploaded draft. `file` is whatever handle the host has;
    /// only its presence matters here.
    pub fn upload_draft(&mut self, file: Option<&str>) -> ActionResult {
        match file {
            Some(name) if !name.trim().is_empty() => {}
            _ => return Err(ValidationError::NoDraftFile.into()),
        }
        if self.ceiling() < Stage::Shoot {
            return Err(GateViolation::ShootLocked.into());
        }
        self.apply(DealPatch {
            upload_done: Some(true),
            ..DealPatch::default()
        })
    }

    // -----------------------------------------------------------------------
    // Stage 7 — approval
    // -----------------------------------------------------------------------

    /// Accept the published draft and queue the automatic payout.
    pub fn approve(&mut self, link: &str, comment: &str, now_ms: u64) -> ActionResult {
        if !is_valid_link(link) {
            return Err(ValidationError::InvalidApprovalLink.into());
        }
        if self.ceiling() < Stage::Approval {
            return Err(GateViolation::ApprovalLocked.into());
        }
        let outcome = self.apply(DealPatch {
            approval: Some(ApprovalPatch {
                link: Some(link.trim().to_string()),
                comment: Some(comment.trim().to_string()),
                result: Some(ddk_schemas::ApprovalResult::Approved),
            }),
            ..DealPatch::default()
        })?;
        let id = self.base.id.clone();
        self.settlements.schedule(&id, now_ms);
        Ok(outcome)
    }

    /// Request changes. Atomically reopens the shoot stage: the verdict and
    /// the upload flag travel in one patch, so no read can observe
    /// `needs_changes` with the draft still marked uploaded.
    pub fn request_fix(&mut self, link: &str, comment: &str) -> ActionResult {
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ValidationError::EmptyFixComment.into());
        }
        if self.ceiling() < Stage::Approval {
            return Err(GateViolation::ApprovalLocked.into());
        }
        let outcome = self.apply(DealPatch {
            approval: Some(ApprovalPatch {
                link: Some(link.trim().to_string()),
                comment: Some(comment.to_string()),
                result: Some(ddk_schemas::ApprovalResult::NeedsChanges),
            }),
            upload_done: Some(false),
            ..DealPatch::default()
        })?;
        let id = self.base.id.clone();
        self.settlements.cancel(&id);
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Stage 8 — payout
    // -----------------------------------------------------------------------

    /// Manual payout. Supersedes any pending automatic settlement.
    pub fn payout(&mut self) -> ActionResult {
        if self.ceiling() < Stage::Payout {
            return Err(GateViolation::PayoutLocked.into());
        }
        let id = self.base.id.clone();
        self.settlements.cancel(&id);
        self.apply(DealPatch {
            payout_done: Some(true),
            ..DealPatch::default()
        })
    }

    /// Re-arm the deferred payout when the approval-complete state is
    /// re-entered (fresh session, or the panel rendered again). No-op when
    /// the deal is not approved, already paid out, or already queued.
    pub fn ensure_settlement_scheduled(&mut self, now_ms: u64) -> bool {
        let record = self.record();
        if !record.approval.is_approved() || record.payout_done {
            return false;
        }
        if self.settlements.is_scheduled(&self.base.id) {
            return false;
        }
        let id = self.base.id.clone();
        self.settlements.schedule(&id, now_ms);
        true
    }

    /// Fire the automatic settlement if it is due. A settlement whose
    /// preconditions no longer hold (fix requested since, or already paid
    /// out) is dropped silently — the effect is idempotent, not lost.
    pub fn settle_due(&mut self, now_ms: u64) -> Result<Option<ActionOutcome>, ActionError> {
        let fired = self.settlements.take_due(now_ms);
        if !fired.iter().any(|id| id == &self.base.id) {
            return Ok(None);
        }
        let record = self.record();
        if !record.approval.is_approved() || record.payout_done {
            return Ok(None);
        }
        let outcome = self.apply(DealPatch {
            payout_done: Some(true),
            ..DealPatch::default()
        })?;
        Ok(Some(outcome))
    }

    // -----------------------------------------------------------------------
    // Cancel
    // -----------------------------------------------------------------------

    /// Drop every stored delta for this deal, reverting it to the pristine
    /// base record. Refused without explicit confirmation.
    pub fn cancel_deal(&mut self, confirmed: bool) -> ActionResult {
        if !confirmed {
            return Err(ValidationError::CancelNotConfirmed.into());
        }
        let id = self.base.id.clone();
        self.settlements.cancel(&id);
        self.overlay.remove(&id)?;
        Ok(self.status())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
