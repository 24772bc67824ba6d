//! Cancelling a deal wipes its stored progress and nothing else.

use ddk_controller::{ActionError, DealController, ValidationError};
use ddk_overlay::{MemoryBackend, Overlay};
use ddk_schemas::DealRecord;
use ddk_stagegate::{GatePolicy, Stage};

fn base() -> DealRecord {
    DealRecord::base("deal_1", "Sneaker drop", "StrideLab", "YouTube", "2025-12-15")
}

#[test]
fn scenario_cancel_wipes_progress_and_restarts_at_select() {
    let mut c = DealController::new(
        Overlay::open(MemoryBackend::default()),
        base(),
        GatePolicy::default(),
    );
    c.select_blogger("b1").unwrap();
    c.save_brief("Launch campaign", Some(50_000), "2025-12-01")
        .unwrap();
    c.link_email("ads@stridelab.example").unwrap();
    c.send_outreach().unwrap();
    c.sign_contract().unwrap();

    // Unconfirmed cancel refuses and mutates nothing.
    let err = c.cancel_deal(false).unwrap_err();
    assert!(matches!(
        err,
        ActionError::Validation(ValidationError::CancelNotConfirmed)
    ));
    assert!(c.record().contract_signed);

    // Confirmed cancel reverts to the pristine base record.
    let out = c.cancel_deal(true).unwrap();
    assert_eq!(out.record, base());
    assert_eq!(out.active_stage, Stage::Select);
    assert_eq!(out.allowed_max_stage, Stage::Select);

    // The deal is usable again from scratch.
    let out = c.select_blogger("b2").unwrap();
    assert_eq!(out.allowed_max_stage, Stage::Brief);
}
