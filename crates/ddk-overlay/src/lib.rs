//! Persistence overlay — durable progress deltas over immutable base records.
//!
//! # Design
//!
//! The store holds one JSON document: an object mapping deal id to the
//! accumulated [`DealPatch`] for that deal. A deal's effective record is
//! always `base ⊕ delta`; identity fields never leave the base catalog.
//!
//! Merge rules:
//! - top-level fields replace wholesale;
//! - `brief` and `approval` merge one level deep — a patch touching only
//!   `brief.goal` leaves `brief.budget` and `brief.deadline` alone.
//!
//! Recovery rules: a document that is not a JSON object is treated as an
//! empty overlay, and an entry that does not decode as a patch is treated
//! as absent for that key. Reads never fail; only the write path can
//! surface backend errors.
//!
//! The store is single-writer by assumption. Two contexts patching the
//! same field race last-write-wins; sibling fields survive because merges
//! are field-level. That limitation is inherited deliberately and not
//! papered over here.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use ddk_schemas::{ApprovalPatch, BriefPatch, DealPatch, DealRecord};

mod backend;

pub use backend::{FileBackend, MemoryBackend, OverlayBackend};

// ---------------------------------------------------------------------------
// Merge primitives
// ---------------------------------------------------------------------------

/// Fold `patch` into `delta` (newer wins, untouched fields survive).
pub fn merge_patch(delta: &mut DealPatch, patch: &DealPatch) {
    if patch.selected_blogger_id.is_some() {
        delta.selected_blogger_id = patch.selected_blogger_id.clone();
    }
    if let Some(bp) = &patch.brief {
        let slot = delta.brief.get_or_insert_with(BriefPatch::default);
        merge_brief(slot, bp);
    }
    if patch.email_linked.is_some() {
        delta.email_linked = patch.email_linked;
    }
    if patch.email_account.is_some() {
        delta.email_account = patch.email_account.clone();
    }
    if patch.outreach_sent.is_some() {
        delta.outreach_sent = patch.outreach_sent;
    }
    if patch.outreach_responses.is_some() {
        delta.outreach_responses = patch.outreach_responses;
    }
    if patch.contract_signed.is_some() {
        delta.contract_signed = patch.contract_signed;
    }
    if patch.paid.is_some() {
        delta.paid = patch.paid;
    }
    if patch.upload_done.is_some() {
        delta.upload_done = patch.upload_done;
    }
    if let Some(ap) = &patch.approval {
        let slot = delta.approval.get_or_insert_with(ApprovalPatch::default);
        merge_approval(slot, ap);
    }
    if patch.payout_done.is_some() {
        delta.payout_done = patch.payout_done;
    }
}

fn merge_brief(slot: &mut BriefPatch, patch: &BriefPatch) {
    if patch.goal.is_some() {
        slot.goal = patch.goal.clone();
    }
    if patch.budget.is_some() {
        slot.budget = patch.budget;
    }
    if patch.deadline.is_some() {
        slot.deadline = patch.deadline.clone();
    }
}

fn merge_approval(slot: &mut ApprovalPatch, patch: &ApprovalPatch) {
    if patch.link.is_some() {
        slot.link = patch.link.clone();
    }
    if patch.comment.is_some() {
        slot.comment = patch.comment.clone();
    }
    if patch.result.is_some() {
        slot.result = patch.result;
    }
}

/// Project `base ⊕ delta` into an effective record.
pub fn apply_delta(base: &DealRecord, delta: &DealPatch) -> DealRecord {
    let mut rec = base.clone();
    if let Some(v) = &delta.selected_blogger_id {
        rec.selected_blogger_id = Some(v.clone());
    }
    if let Some(bp) = &delta.brief {
        if let Some(v) = &bp.goal {
            rec.brief.goal = v.clone();
        }
        if let Some(v) = bp.budget {
            rec.brief.budget = Some(v);
        }
        if let Some(v) = &bp.deadline {
            rec.brief.deadline = v.clone();
        }
    }
    if let Some(v) = delta.email_linked {
        rec.email_linked = v;
    }
    if let Some(v) = &delta.email_account {
        rec.email_account = v.clone();
    }
    if let Some(v) = delta.outreach_sent {
        rec.outreach_sent = v;
    }
    if let Some(v) = delta.outreach_responses {
        rec.outreach_responses = v;
    }
    if let Some(v) = delta.contract_signed {
        rec.contract_signed = v;
    }
    if let Some(v) = delta.paid {
        rec.paid = v;
    }
    if let Some(v) = delta.upload_done {
        rec.upload_done = v;
    }
    if let Some(ap) = &delta.approval {
        if let Some(v) = &ap.link {
            rec.approval.link = v.clone();
        }
        if let Some(v) = &ap.comment {
            rec.approval.comment = v.clone();
        }
        if let Some(v) = ap.result {
            rec.approval.result = v;
        }
    }
    if let Some(v) = delta.payout_done {
        rec.payout_done = v;
    }
    rec
}

// ---------------------------------------------------------------------------
// Document codec
// ---------------------------------------------------------------------------

type OverlayMap = BTreeMap<String, DealPatch>;

/// Decode the stored document, recovering from structural damage.
///
/// A document that fails to parse, or parses to a non-object, yields the
/// empty overlay. An individual entry that is not patch-shaped is dropped;
/// the other entries survive.
fn decode_document(raw: &str) -> OverlayMap {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => return OverlayMap::new(),
    };
    let obj = match value {
        serde_json::Value::Object(m) => m,
        _ => return OverlayMap::new(),
    };

    let mut map = OverlayMap::new();
    for (id, entry) in obj {
        if let Ok(delta) = serde_json::from_value::<DealPatch>(entry) {
            map.insert(id, delta);
        }
    }
    map
}

fn encode_document(map: &OverlayMap) -> Result<String> {
    serde_json::to_string(map).context("encode overlay document failed")
}

// ---------------------------------------------------------------------------
// Overlay
// ---------------------------------------------------------------------------

/// The overlay store: decoded document in memory, write-through to the
/// backend on every mutation.
///
/// Mutations build the next document first and commit it to memory only
/// after the backend accepted the write, so a failed write leaves the
/// observable state exactly where it was.
pub struct Overlay<B: OverlayBackend> {
    backend: B,
    map: OverlayMap,
}

impl<B: OverlayBackend> Overlay<B> {
    /// Load whatever the backend has; damage degrades to an empty overlay.
    pub fn open(backend: B) -> Self {
        let map = match backend.load() {
            Ok(Some(raw)) => decode_document(&raw),
            Ok(None) | Err(_) => OverlayMap::new(),
        };
        Self { backend, map }
    }

    /// Effective record for `base`'s deal: base merged with the stored
    /// delta, or the pristine base when nothing was ever patched.
    pub fn read(&self, base: &DealRecord) -> DealRecord {
        match self.map.get(&base.id) {
            Some(delta) => apply_delta(base, delta),
            None => base.clone(),
        }
    }

    /// `true` if the deal has any persisted progress.
    pub fn contains(&self, id: &str) -> bool {
        self.map.contains_key(id)
    }

    /// Merge `patch` into the deal's delta, persist, and return the new
    /// effective record.
    pub fn patch(&mut self, base: &DealRecord, patch: &DealPatch) -> Result<DealRecord> {
        let mut next = self.map.clone();
        let delta = next.entry(base.id.clone()).or_default();
        merge_patch(delta, patch);

        let doc = encode_document(&next)?;
        self.backend
            .store(&doc)
            .context("persist overlay document failed")?;

        self.map = next;
        Ok(self.read(base))
    }

    /// Drop the deal's delta entirely; a later read returns the pristine
    /// base. Unknown ids are a no-op.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        if !self.map.contains_key(id) {
            return Ok(());
        }
        let mut next = self.map.clone();
        next.remove(id);

        let doc = encode_document(&next)?;
        self.backend
            .store(&doc)
            .context("persist overlay document failed")?;

        self.map = next;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ddk_schemas::ApprovalResult;

    fn base() -> DealRecord {
        DealRecord::base("d1", "Deal", "Brand", "YouTube", "2025-12-31")
    }

    fn store() -> Overlay<MemoryBackend> {
        Overlay::open(MemoryBackend::default())
    }

    fn brief_patch(goal: Option<&str>, budget: Option<u64>, deadline: Option<&str>) -> DealPatch {
        DealPatch {
            brief: Some(BriefPatch {
                goal: goal.map(str::to_string),
                budget,
                deadline: deadline.map(str::to_string),
            }),
            ..DealPatch::default()
        }
    }

    #[test]
    fn read_without_delta_returns_pristine_base() {
        let ov = store();
        assert_eq!(ov.read(&base()), base());
    }

    #[test]
    fn patch_returns_merged_record_and_persists() {
        let mut ov = store();
        let rec = ov
            .patch(
                &base(),
                &DealPatch {
                    selected_blogger_id: Some("b1".to_string()),
                    ..DealPatch::default()
                },
            )
            .unwrap();
        assert_eq!(rec.selected_blogger_id.as_deref(), Some("b1"));
        // Visible through a fresh read as well.
        assert_eq!(ov.read(&base()), rec);
    }

    #[test]
    fn merge_locality_brief_siblings_survive() {
        let mut ov = store();
        ov.patch(&base(), &brief_patch(Some("Launch"), Some(50_000), Some("2025-12-01")))
            .unwrap();
        let rec = ov
            .patch(&base(), &brief_patch(Some("Launch v2"), None, None))
            .unwrap();
        assert_eq!(rec.brief.goal, "Launch v2");
        assert_eq!(rec.brief.budget, Some(50_000));
        assert_eq!(rec.brief.deadline, "2025-12-01");
    }

    #[test]
    fn approval_merges_one_level_deep() {
        let mut ov = store();
        ov.patch(
            &base(),
            &DealPatch {
                approval: Some(ApprovalPatch {
                    link: Some("https://x.test/v".to_string()),
                    comment: None,
                    result: None,
                }),
                ..DealPatch::default()
            },
        )
        .unwrap();
        let rec = ov
            .patch(
                &base(),
                &DealPatch {
                    approval: Some(ApprovalPatch {
                        link: None,
                        comment: Some("tighten the intro".to_string()),
                        result: Some(ApprovalResult::NeedsChanges),
                    }),
                    ..DealPatch::default()
                },
            )
            .unwrap();
        assert_eq!(rec.approval.link, "https://x.test/v");
        assert_eq!(rec.approval.comment, "tighten the intro");
        assert_eq!(rec.approval.result, ApprovalResult::NeedsChanges);
    }

    #[test]
    fn patch_is_idempotent() {
        let mut ov = store();
        let p = brief_patch(Some("Launch"), Some(1_000), None);
        let once = ov.patch(&base(), &p).unwrap();
        let twice = ov.patch(&base(), &p).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn sibling_top_level_fields_survive_unrelated_patch() {
        let mut ov = store();
        ov.patch(
            &base(),
            &DealPatch {
                contract_signed: Some(true),
                ..DealPatch::default()
            },
        )
        .unwrap();
        let rec = ov
            .patch(
                &base(),
                &DealPatch {
                    paid: Some(true),
                    ..DealPatch::default()
                },
            )
            .unwrap();
        assert!(rec.contract_signed);
        assert!(rec.paid);
    }

    #[test]
    fn remove_reverts_to_pristine_base() {
        let mut ov = store();
        ov.patch(
            &base(),
            &DealPatch {
                outreach_sent: Some(true),
                ..DealPatch::default()
            },
        )
        .unwrap();
        assert!(ov.contains("d1"));
        ov.remove("d1").unwrap();
        assert!(!ov.contains("d1"));
        assert_eq!(ov.read(&base()), base());
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut ov = store();
        ov.remove("nope").unwrap();
    }

    #[test]
    fn corrupted_document_recovers_as_empty_overlay() {
        for raw in ["not json at all", "[1,2,3]", "42", "\"str\""] {
            let ov = Overlay::open(MemoryBackend::with_document(raw));
            assert_eq!(ov.read(&base()), base(), "raw={raw}");
        }
    }

    #[test]
    fn malformed_entry_dropped_healthy_entries_survive() {
        let raw = r#"{"d1":{"contractSigned":true},"d2":{"contractSigned":"yes"}}"#;
        let ov = Overlay::open(MemoryBackend::with_document(raw));
        assert!(ov.read(&base()).contract_signed);

        let other = DealRecord::base("d2", "Other", "Brand", "TikTok", "");
        assert!(!ov.read(&other).contract_signed);
    }

    #[test]
    fn deltas_survive_reopen_through_backend() {
        let mut ov = store();
        ov.patch(
            &base(),
            &DealPatch {
                email_linked: Some(true),
                email_account: Some("ads@brand.example".to_string()),
                ..DealPatch::default()
            },
        )
        .unwrap();
        let doc = ov.backend.document().unwrap();

        let reopened = Overlay::open(MemoryBackend::with_document(&doc));
        let rec = reopened.read(&base());
        assert!(rec.email_linked);
        assert_eq!(rec.email_account, "ads@brand.example");
    }
}
