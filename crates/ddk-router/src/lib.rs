//! Route tokens and the clamping resolver.
//!
//! # Route space vs gate space
//!
//! The addressable route space has nine positions with contract and payment
//! as separate panels; the gate treats contract+payment as one composite
//! stage. The two are reconciled by a fixed mapping:
//!
//! ```text
//!  route  1 select   2 brief   3 email   4 outreach
//!         5 contract ┐
//!         6 payment  ┘ → gate 5 (contract+payment)
//!         7 shoot      → gate 6
//!         8 approval   → gate 7
//!         9 payout     → gate 8
//! ```
//!
//! Route 6 unlocks as soon as the contract is signed, even while the
//! composite stage is still incomplete — the payment panel must be
//! reachable to complete it.
//!
//! The numeric index of a token is authoritative; the slug is cosmetic and
//! ignored on parse. A request above the allowed ceiling is not an error:
//! it resolves to a silent redirect down to the ceiling.

use ddk_controller::Controls;
use ddk_schemas::DealRecord;
use ddk_stagegate::{
    active_stage, allowed_max_stage, stage_states, GatePolicy, Stage, StageState, STAGE_COUNT,
};
use serde::Serialize;

/// Addressable route positions.
pub const MAX_ROUTE: u8 = 9;

/// Cosmetic slugs, index 1..=9.
pub const ROUTE_SLUGS: [&str; MAX_ROUTE as usize] = [
    "select", "brief", "email", "outreach", "contract", "payment", "shoot", "approval", "payout",
];

// ---------------------------------------------------------------------------
// RouteToken
// ---------------------------------------------------------------------------

/// One navigable address: index plus display slug, e.g. `5-contract`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RouteToken {
    index: u8,
}

impl RouteToken {
    /// Build a token, clamping the index into 1..=9.
    pub fn new(index: u8) -> Self {
        Self {
            index: index.clamp(1, MAX_ROUTE),
        }
    }

    /// Parse a token. Only the leading number matters; a missing or
    /// unreadable number falls back to route 1, out-of-range clamps.
    pub fn parse(raw: &str) -> Self {
        let digits: String = raw
            .trim()
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        let index = digits.parse::<u8>().unwrap_or(1);
        Self::new(index.max(1))
    }

    pub fn index(self) -> u8 {
        self.index
    }

    pub fn slug(self) -> &'static str {
        ROUTE_SLUGS[(self.index - 1) as usize]
    }
}

impl std::fmt::Display for RouteToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.index, self.slug())
    }
}

// ---------------------------------------------------------------------------
// Route ↔ stage mapping
// ---------------------------------------------------------------------------

/// Gate stage addressed by a route position.
pub fn stage_for_route(route: RouteToken) -> Stage {
    match route.index() {
        1 => Stage::Select,
        2 => Stage::Brief,
        3 => Stage::Email,
        4 => Stage::Outreach,
        5 | 6 => Stage::ContractPayment,
        7 => Stage::Shoot,
        8 => Stage::Approval,
        _ => Stage::Payout,
    }
}

/// Canonical route for a gate stage (the composite stage lands on its
/// contract panel; the terminal stage has no panel of its own and maps to
/// payout).
pub fn route_for_stage(stage: Stage) -> RouteToken {
    let index = match stage {
        Stage::Select => 1,
        Stage::Brief => 2,
        Stage::Email => 3,
        Stage::Outreach => 4,
        Stage::ContractPayment => 5,
        Stage::Shoot => 7,
        Stage::Approval => 8,
        Stage::Payout | Stage::Done => 9,
    };
    RouteToken::new(index)
}

/// Highest reachable route index: the gate ceiling translated to route
/// space, with the payment panel opening once the contract is signed.
pub fn allowed_max_route(record: &DealRecord, policy: &GatePolicy) -> RouteToken {
    let ceiling = allowed_max_stage(record, policy);
    if ceiling == Stage::ContractPayment && record.contract_signed {
        return RouteToken::new(6);
    }
    route_for_stage(ceiling)
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// One tab of the route strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteTab {
    pub index: u8,
    pub slug: &'static str,
    pub active: bool,
    pub enabled: bool,
}

/// Everything the presentation layer needs to draw the resolved stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedView {
    pub route: RouteToken,
    pub stage: Stage,
    pub stage_indicators: [StageState; STAGE_COUNT],
    pub tabs: [RouteTab; MAX_ROUTE as usize],
    pub controls: Controls,
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Resolution {
    /// The requested route is reachable; render it.
    Render(ResolvedView),
    /// The request overshot the ceiling; re-issue navigation to `to`.
    /// Deliberately not an error.
    Redirect { to: RouteToken },
}

/// Resolve a navigation request against the current record.
pub fn resolve(requested: RouteToken, record: &DealRecord, policy: &GatePolicy) -> Resolution {
    let allowed = allowed_max_route(record, policy);
    if requested.index() > allowed.index() {
        return Resolution::Redirect { to: allowed };
    }
    Resolution::Render(view(requested, record, policy))
}

/// Resolve and follow at most one redirect — the ceiling itself is always
/// renderable, so one hop suffices.
pub fn navigate(requested: RouteToken, record: &DealRecord, policy: &GatePolicy) -> ResolvedView {
    match resolve(requested, record, policy) {
        Resolution::Render(v) => v,
        Resolution::Redirect { to } => view(to, record, policy),
    }
}

fn view(route: RouteToken, record: &DealRecord, policy: &GatePolicy) -> ResolvedView {
    let allowed = allowed_max_route(record, policy);
    let active = active_stage(record, policy);

    let mut tabs = [RouteTab {
        index: 0,
        slug: "",
        active: false,
        enabled: false,
    }; MAX_ROUTE as usize];
    for (i, slot) in tabs.iter_mut().enumerate() {
        let index = (i + 1) as u8;
        *slot = RouteTab {
            index,
            slug: ROUTE_SLUGS[i],
            active: index == route.index(),
            enabled: index <= allowed.index(),
        };
    }

    ResolvedView {
        route,
        stage: stage_for_route(route),
        stage_indicators: stage_states(record, policy),
        tabs,
        controls: Controls::derive(record, active),
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use ddk_schemas::{Approval, ApprovalResult, Brief};

    fn rec() -> DealRecord {
        DealRecord::base("d1", "Deal", "Brand", "YouTube", "2025-12-31")
    }

    fn policy() -> GatePolicy {
        GatePolicy::default()
    }

    fn rec_through_contract() -> DealRecord {
        let mut r = rec();
        r.selected_blogger_id = Some("b1".to_string());
        r.brief = Brief {
            goal: "Launch".to_string(),
            budget: Some(1_000),
            deadline: "2025-12-01".to_string(),
        };
        r.email_linked = true;
        r.outreach_sent = true;
        r
    }

    #[test]
    fn parse_reads_the_leading_number_and_ignores_the_slug() {
        assert_eq!(RouteToken::parse("5-contract").index(), 5);
        assert_eq!(RouteToken::parse("5-anything-else").index(), 5);
        assert_eq!(RouteToken::parse("/7-shoot").index(), 7);
        assert_eq!(RouteToken::parse("3").index(), 3);
    }

    #[test]
    fn parse_clamps_and_defaults() {
        assert_eq!(RouteToken::parse("0-select").index(), 1);
        assert_eq!(RouteToken::parse("42-payout").index(), 9);
        assert_eq!(RouteToken::parse("").index(), 1);
        assert_eq!(RouteToken::parse("garbage").index(), 1);
    }

    #[test]
    fn format_pairs_index_with_its_slug() {
        assert_eq!(RouteToken::new(5).to_string(), "5-contract");
        assert_eq!(RouteToken::new(6).to_string(), "6-payment");
        assert_eq!(RouteToken::new(9).to_string(), "9-payout");
    }

    #[test]
    fn route_stage_mapping_is_total_and_consistent() {
        for idx in 1..=MAX_ROUTE {
            let stage = stage_for_route(RouteToken::new(idx));
            // Mapping back lands on a route addressing the same stage.
            assert_eq!(stage_for_route(route_for_stage(stage)), stage);
        }
        assert_eq!(stage_for_route(RouteToken::new(5)), Stage::ContractPayment);
        assert_eq!(stage_for_route(RouteToken::new(6)), Stage::ContractPayment);
        assert_eq!(route_for_stage(Stage::Done).index(), 9);
    }

    #[test]
    fn overshoot_resolves_to_a_silent_redirect() {
        let r = rec(); // ceiling: select
        match resolve(RouteToken::new(7), &r, &policy()) {
            Resolution::Redirect { to } => assert_eq!(to.index(), 1),
            other => panic!("expected redirect, got {other:?}"),
        }
        // navigate() follows the hop and renders the ceiling.
        let v = navigate(RouteToken::new(7), &r, &policy());
        assert_eq!(v.route.index(), 1);
        assert_eq!(v.stage, Stage::Select);
    }

    #[test]
    fn reachable_requests_render_in_place() {
        let mut r = rec();
        r.selected_blogger_id = Some("b1".to_string());
        match resolve(RouteToken::new(2), &r, &policy()) {
            Resolution::Render(v) => {
                assert_eq!(v.stage, Stage::Brief);
                assert_eq!(v.route.index(), 2);
            }
            other => panic!("expected render, got {other:?}"),
        }
        // Revisiting an earlier stage is always allowed.
        let v = navigate(RouteToken::new(1), &r, &policy());
        assert_eq!(v.stage, Stage::Select);
    }

    #[test]
    fn payment_route_unlocks_once_contract_is_signed() {
        let mut r = rec_through_contract();
        assert_eq!(allowed_max_route(&r, &policy()).index(), 5);

        r.contract_signed = true;
        assert_eq!(allowed_max_route(&r, &policy()).index(), 6);
        let v = navigate(RouteToken::new(6), &r, &policy());
        assert_eq!(v.route.index(), 6);
        assert_eq!(v.stage, Stage::ContractPayment);

        r.paid = true; // composite stage complete → shoot
        assert_eq!(allowed_max_route(&r, &policy()).index(), 7);
    }

    #[test]
    fn tabs_disable_everything_beyond_the_ceiling() {
        let r = rec_through_contract();
        let v = navigate(RouteToken::new(4), &r, &policy());
        assert!(v.tabs[3].active);
        for tab in &v.tabs {
            assert_eq!(tab.enabled, tab.index <= 5, "tab {}", tab.index);
        }
        assert_eq!(v.tabs[4].slug, "contract");
    }

    #[test]
    fn fully_complete_deal_reaches_the_payout_route() {
        let mut r = rec_through_contract();
        r.contract_signed = true;
        r.paid = true;
        r.upload_done = true;
        r.approval = Approval {
            link: "https://x.test/v".to_string(),
            comment: String::new(),
            result: ApprovalResult::Approved,
        };
        assert_eq!(allowed_max_route(&r, &policy()).index(), 9);
        let v = navigate(RouteToken::new(9), &r, &policy());
        assert_eq!(v.stage, Stage::Payout);
        assert!(v.controls.payout);
    }
}
