//! Stage gate — the pure evaluation layer of the deal workflow.
//!
//! # Design
//!
//! Nine ordered positions, eight of them gated:
//!
//! ```text
//!  1 select ─ 2 brief ─ 3 email ─ 4 outreach ─ 5 contract+payment ─
//!  6 shoot ─ 7 approval ─ 8 payout ─ 9 done (terminal)
//! ```
//!
//! Every gated stage has a completion predicate over a [`DealRecord`].
//! [`allowed_max_stage`] scans 1..8 in order and returns the first stage
//! whose predicate is false (all true ⇒ stage 8). That value is both the
//! navigation ceiling and the active stage: there is exactly one scan, so
//! navigation and visual state cannot desynchronize.
//!
//! All logic here is deterministic and IO-free. Flag regression (the
//! request-fix rule that reopens the shoot stage) is applied by the
//! controller as part of its patch; the gate only ever reads.

mod stage;

pub use stage::{Stage, STAGE_COUNT};

use ddk_schemas::DealRecord;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GatePolicy
// ---------------------------------------------------------------------------

/// Tunable gating rules.
///
/// The only knob today is the outreach minimum-response rule: with
/// `min_outreach_responses > 0`, stage 4 stays incomplete until that many
/// replies are recorded even after the mailing went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatePolicy {
    pub min_outreach_responses: u32,
}

impl Default for GatePolicy {
    /// Rule off: a sent mailing completes the outreach stage by itself.
    fn default() -> Self {
        Self {
            min_outreach_responses: 0,
        }
    }
}

impl GatePolicy {
    /// Require at least `n` recorded replies before outreach completes.
    pub fn require_responses(n: u32) -> Self {
        Self {
            min_outreach_responses: n,
        }
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Completion predicate for a single gated stage.
///
/// `Stage::Done` is not a gate; it reports whether every gated stage holds.
pub fn stage_complete(record: &DealRecord, stage: Stage, policy: &GatePolicy) -> bool {
    match stage {
        Stage::Select => record
            .selected_blogger_id
            .as_deref()
            .map(|id| !id.is_empty())
            .unwrap_or(false),
        Stage::Brief => record.brief.is_complete(),
        Stage::Email => record.email_linked,
        Stage::Outreach => {
            record.outreach_sent && record.outreach_responses >= policy.min_outreach_responses
        }
        Stage::ContractPayment => record.contract_signed && record.paid,
        Stage::Shoot => record.upload_done,
        Stage::Approval => record.approval.is_approved(),
        Stage::Payout => record.payout_done,
        Stage::Done => Stage::GATED
            .iter()
            .all(|s| stage_complete(record, *s, policy)),
    }
}

// ---------------------------------------------------------------------------
// Ceiling scan
// ---------------------------------------------------------------------------

/// The navigation ceiling: first gated stage whose predicate is false,
/// or [`Stage::Payout`] when every gate holds. Always in 1..=8.
pub fn allowed_max_stage(record: &DealRecord, policy: &GatePolicy) -> Stage {
    for s in Stage::GATED {
        if !stage_complete(record, s, policy) {
            return s;
        }
    }
    Stage::Payout
}

/// The stage presented as "in progress".
///
/// Identical to [`allowed_max_stage`] by construction — one scan serves
/// both so the rendered panel and the navigation ceiling can never point
/// at different stages.
pub fn active_stage(record: &DealRecord, policy: &GatePolicy) -> Stage {
    allowed_max_stage(record, policy)
}

// ---------------------------------------------------------------------------
// Indicator states
// ---------------------------------------------------------------------------

/// Visual state of one position in the stage strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    Done,
    Active,
    Locked,
}

/// Indicator row for all nine positions, index 0 = stage 1.
///
/// Positions before the active stage render as done, the active one as
/// current, everything beyond as locked. The terminal position becomes
/// current only once every gate holds (payout included); until then it is
/// locked like any other future stage.
pub fn stage_states(record: &DealRecord, policy: &GatePolicy) -> [StageState; STAGE_COUNT] {
    let mut out = [StageState::Locked; STAGE_COUNT];

    if stage_complete(record, Stage::Done, policy) {
        for slot in out.iter_mut().take(STAGE_COUNT - 1) {
            *slot = StageState::Done;
        }
        out[STAGE_COUNT - 1] = StageState::Active;
        return out;
    }

    let active = active_stage(record, policy).index();
    for (i, slot) in out.iter_mut().enumerate() {
        let idx = (i + 1) as u8;
        *slot = if idx < active {
            StageState::Done
        } else if idx == active {
            StageState::Active
        } else {
            StageState::Locked
        };
    }
    out
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
