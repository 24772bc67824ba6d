//! Shared data shapes for the DealDesk workflow.
//!
//! Field names serialize in camelCase: the persisted overlay document and
//! the brief-analysis exchange are externally documented shapes, and every
//! consumer (store, controller, CLI) round-trips through these structs.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DealRecord
// ---------------------------------------------------------------------------

/// One workflow instance: immutable identity from the base catalog plus the
/// mutable progress flags the stage gate evaluates.
///
/// Progress fields all carry `#[serde(default)]` so a base catalog entry
/// (identity only) and a fully-progressed record deserialize from the same
/// document shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealRecord {
    pub id: String,
    pub title: String,
    pub brand: String,
    pub platform: String,
    /// Display-only; never gates a stage.
    #[serde(default)]
    pub due_date: String,

    #[serde(default)]
    pub selected_blogger_id: Option<String>,
    #[serde(default)]
    pub brief: Brief,
    #[serde(default)]
    pub email_linked: bool,
    #[serde(default)]
    pub email_account: String,
    #[serde(default)]
    pub outreach_sent: bool,
    /// Recorded replies to the outreach mailing. Only consulted when the
    /// gate policy enforces a minimum-response rule.
    #[serde(default)]
    pub outreach_responses: u32,
    #[serde(default)]
    pub contract_signed: bool,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub upload_done: bool,
    #[serde(default)]
    pub approval: Approval,
    #[serde(default)]
    pub payout_done: bool,
}

impl DealRecord {
    /// A pristine record carrying only catalog identity.
    pub fn base(
        id: impl Into<String>,
        title: impl Into<String>,
        brand: impl Into<String>,
        platform: impl Into<String>,
        due_date: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            brand: brand.into(),
            platform: platform.into(),
            due_date: due_date.into(),
            selected_blogger_id: None,
            brief: Brief::default(),
            email_linked: false,
            email_account: String::new(),
            outreach_sent: false,
            outreach_responses: 0,
            contract_signed: false,
            paid: false,
            upload_done: false,
            approval: Approval::default(),
            payout_done: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Brief
// ---------------------------------------------------------------------------

/// Campaign brief. "Started" and "complete" are distinct: a brief with any
/// field filled is started, but only a fully-filled brief opens the next
/// stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brief {
    #[serde(default)]
    pub goal: String,
    /// Whole currency units. `None` = not provided yet.
    #[serde(default)]
    pub budget: Option<u64>,
    #[serde(default)]
    pub deadline: String,
}

impl Brief {
    pub fn is_started(&self) -> bool {
        !self.goal.is_empty() || self.budget.is_some() || !self.deadline.is_empty()
    }

    /// All three fields present. A zero budget does not count as present.
    pub fn is_complete(&self) -> bool {
        !self.goal.trim().is_empty()
            && self.budget.map(|b| b > 0).unwrap_or(false)
            && !self.deadline.trim().is_empty()
    }
}

// ---------------------------------------------------------------------------
// Approval
// ---------------------------------------------------------------------------

/// Review verdict on the published draft.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalResult {
    #[default]
    Pending,
    Approved,
    NeedsChanges,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub result: ApprovalResult,
}

impl Approval {
    pub fn is_approved(&self) -> bool {
        self.result == ApprovalResult::Approved
    }
}

// ---------------------------------------------------------------------------
// Patches
// ---------------------------------------------------------------------------

/// Partial update to a [`DealRecord`]. `None` means "leave the field alone";
/// identity fields are not patchable. Top-level fields replace wholesale,
/// `brief` and `approval` merge one level deep (see the overlay crate).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DealPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_blogger_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brief: Option<BriefPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_linked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_account: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outreach_sent: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outreach_responses: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_signed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval: Option<ApprovalPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payout_done: Option<bool>,
}

impl DealPatch {
    pub fn is_empty(&self) -> bool {
        *self == DealPatch::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BriefPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApprovalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ApprovalResult>,
}

// ---------------------------------------------------------------------------
// BriefAnalysis
// ---------------------------------------------------------------------------

/// Result shape of the brief-analysis collaborator. The remote service and
/// the offline heuristic both produce exactly this; callers cannot tell
/// them apart except by `source`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BriefAnalysis {
    /// 0..=100.
    pub score: u8,
    pub issues: Vec<String>,
    pub questions: Vec<String>,
    pub suggestions: Vec<String>,
    pub ideas: Vec<String>,
    pub formats: Vec<String>,
    /// Where the result came from: "remote", "heuristic", "cache".
    pub source: String,
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brief_started_vs_complete() {
        let mut b = Brief::default();
        assert!(!b.is_started());
        assert!(!b.is_complete());

        b.goal = "Launch campaign".to_string();
        assert!(b.is_started());
        assert!(!b.is_complete());

        b.budget = Some(50_000);
        b.deadline = "2025-12-01".to_string();
        assert!(b.is_complete());
    }

    #[test]
    fn zero_budget_is_not_complete() {
        let b = Brief {
            goal: "g".to_string(),
            budget: Some(0),
            deadline: "d".to_string(),
        };
        assert!(b.is_started());
        assert!(!b.is_complete());
    }

    #[test]
    fn approval_result_snake_case_wire_names() {
        let j = serde_json::to_string(&ApprovalResult::NeedsChanges).unwrap();
        assert_eq!(j, "\"needs_changes\"");
        let r: ApprovalResult = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(r, ApprovalResult::Approved);
    }

    #[test]
    fn base_record_roundtrips_with_camel_case_keys() {
        let rec = DealRecord::base("deal_1", "Sneaker drop", "Acme", "YouTube", "2025-11-20");
        let j = serde_json::to_value(&rec).unwrap();
        assert_eq!(j["dueDate"], "2025-11-20");
        assert_eq!(j["payoutDone"], false);
        let back: DealRecord = serde_json::from_value(j).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn identity_only_document_deserializes_with_default_progress() {
        let rec: DealRecord = serde_json::from_str(
            r#"{"id":"d1","title":"T","brand":"B","platform":"TikTok"}"#,
        )
        .unwrap();
        assert!(!rec.email_linked);
        assert_eq!(rec.approval.result, ApprovalResult::Pending);
        assert!(rec.brief.goal.is_empty());
    }

    #[test]
    fn empty_patch_serializes_to_empty_object() {
        let p = DealPatch::default();
        assert!(p.is_empty());
        assert_eq!(serde_json::to_string(&p).unwrap(), "{}");
    }
}
