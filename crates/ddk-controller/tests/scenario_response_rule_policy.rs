//! The outreach minimum-response rule is policy: off, a sent mailing is
//! enough; on, recorded replies are required before the stage completes.

use ddk_controller::{DealController, GateViolation};
use ddk_overlay::{MemoryBackend, Overlay};
use ddk_schemas::DealRecord;
use ddk_stagegate::{GatePolicy, Stage};

fn controller(policy: GatePolicy) -> DealController<MemoryBackend> {
    let mut c = DealController::new(
        Overlay::open(MemoryBackend::default()),
        DealRecord::base("deal_1", "Sneaker drop", "StrideLab", "YouTube", "2025-12-15"),
        policy,
    );
    c.select_blogger("b1").unwrap();
    c.save_brief("Launch campaign", Some(50_000), "2025-12-01")
        .unwrap();
    c.link_email("ads@stridelab.example").unwrap();
    c
}

#[test]
fn scenario_rule_off_sent_mailing_completes_outreach() {
    let mut c = controller(GatePolicy::default());
    let out = c.send_outreach().unwrap();
    assert_eq!(out.allowed_max_stage, Stage::ContractPayment);
}

#[test]
fn scenario_rule_on_outreach_waits_for_replies() {
    let mut c = controller(GatePolicy::require_responses(1));

    let out = c.send_outreach().unwrap();
    assert_eq!(out.allowed_max_stage, Stage::Outreach, "sent but no replies");

    let out = c.record_responses(2).unwrap();
    assert_eq!(out.allowed_max_stage, Stage::ContractPayment);
    assert_eq!(out.record.outreach_responses, 2);
}

#[test]
fn scenario_rule_on_keeps_downstream_actions_gated() {
    let mut c = controller(GatePolicy::require_responses(1));
    c.send_outreach().unwrap();
    c.sign_contract().unwrap();
    c.pay().unwrap();

    // Contract and payment flags are set, but the composite stage sits
    // behind the incomplete outreach gate, so the shoot stage stays shut.
    let err = c.upload_draft(Some("draft.mp4")).unwrap_err();
    assert!(matches!(
        err,
        ddk_controller::ActionError::Gate(GateViolation::ShootLocked)
    ));

    c.record_responses(1).unwrap();
    let out = c.upload_draft(Some("draft.mp4")).unwrap();
    assert_eq!(out.allowed_max_stage, Stage::Approval);
}
