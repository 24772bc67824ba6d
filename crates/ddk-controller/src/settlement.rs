//! Deferred payout settlement.
//!
//! Approval triggers an automatic payout after a short settlement delay.
//! Instead of an uncancellable timer, the pending work is an explicit entry
//! keyed by deal id: the host loop asks [`SettlementQueue::due`] with its
//! own clock and fires the controller for each returned id. A torn-down
//! host simply never asks — re-entering the approval-complete state
//! re-schedules the same idempotent effect, so nothing is lost.

use std::collections::BTreeMap;

/// Simulated settlement delay between approval and automatic payout.
pub const SETTLEMENT_DELAY_MS: u64 = 300;

/// Pending settlements, one slot per deal id.
///
/// Scheduling an already-scheduled deal moves its due time (latest approval
/// wins); cancelling is explicit and total.
#[derive(Debug, Default, Clone)]
pub struct SettlementQueue {
    pending: BTreeMap<String, u64>,
}

impl SettlementQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule (or re-schedule) the deal's payout at `now_ms + delay`.
    pub fn schedule(&mut self, deal_id: &str, now_ms: u64) {
        self.pending
            .insert(deal_id.to_string(), now_ms.saturating_add(SETTLEMENT_DELAY_MS));
    }

    /// Drop the deal's pending settlement. Returns whether one existed.
    pub fn cancel(&mut self, deal_id: &str) -> bool {
        self.pending.remove(deal_id).is_some()
    }

    pub fn is_scheduled(&self, deal_id: &str) -> bool {
        self.pending.contains_key(deal_id)
    }

    /// Deal ids whose due time has arrived. Entries stay queued until
    /// [`take_due`](Self::take_due) consumes them.
    pub fn due(&self, now_ms: u64) -> Vec<String> {
        self.pending
            .iter()
            .filter(|(_, due)| **due <= now_ms)
            .map(|(id, _)| id.clone())
            .collect()
    }

    /// Remove and return everything due at `now_ms`.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<String> {
        let due = self.due(now_ms);
        for id in &due {
            self.pending.remove(id);
        }
        due
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
