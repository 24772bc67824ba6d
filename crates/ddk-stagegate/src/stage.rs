//! The nine workflow positions.

use serde::{Deserialize, Serialize};

/// Total positions in the strip, terminal `Done` included.
pub const STAGE_COUNT: usize = 9;

/// One position of the deal workflow, in fixed order.
///
/// Stages 1..=8 are gated by completion predicates; `Done` (9) is terminal
/// display state and has no gate of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Select,
    Brief,
    Email,
    Outreach,
    ContractPayment,
    Shoot,
    Approval,
    Payout,
    Done,
}

impl Stage {
    /// The eight gated stages, in scan order.
    pub const GATED: [Stage; 8] = [
        Stage::Select,
        Stage::Brief,
        Stage::Email,
        Stage::Outreach,
        Stage::ContractPayment,
        Stage::Shoot,
        Stage::Approval,
        Stage::Payout,
    ];

    /// 1-based position in the strip.
    pub fn index(self) -> u8 {
        match self {
            Stage::Select => 1,
            Stage::Brief => 2,
            Stage::Email => 3,
            Stage::Outreach => 4,
            Stage::ContractPayment => 5,
            Stage::Shoot => 6,
            Stage::Approval => 7,
            Stage::Payout => 8,
            Stage::Done => 9,
        }
    }

    pub fn from_index(idx: u8) -> Option<Stage> {
        match idx {
            1 => Some(Stage::Select),
            2 => Some(Stage::Brief),
            3 => Some(Stage::Email),
            4 => Some(Stage::Outreach),
            5 => Some(Stage::ContractPayment),
            6 => Some(Stage::Shoot),
            7 => Some(Stage::Approval),
            8 => Some(Stage::Payout),
            9 => Some(Stage::Done),
            _ => None,
        }
    }

    /// `true` once the workflow has nowhere further to go.
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done)
    }

    /// Short human label for status output.
    pub fn label(self) -> &'static str {
        match self {
            Stage::Select => "select",
            Stage::Brief => "brief",
            Stage::Email => "email",
            Stage::Outreach => "outreach",
            Stage::ContractPayment => "contract+payment",
            Stage::Shoot => "shoot",
            Stage::Approval => "approval",
            Stage::Payout => "payout",
            Stage::Done => "done",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
