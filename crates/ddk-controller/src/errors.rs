//! Typed action failures.
//!
//! Validation and gate failures are rejected identically: synchronously,
//! before any mutation. They are separate types because they name different
//! problems — malformed input vs. an action invoked while its prerequisite
//! stage is incomplete.

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// Malformed or missing required input for an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    NoBloggerSelected,
    EmptyBriefGoal,
    MissingBriefBudget,
    EmptyBriefDeadline,
    InvalidEmail,
    NoResponsesRecorded,
    NoDraftFile,
    InvalidApprovalLink,
    EmptyFixComment,
    CancelNotConfirmed,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ValidationError::NoBloggerSelected => "no blogger selected",
            ValidationError::EmptyBriefGoal => "brief goal is required",
            ValidationError::MissingBriefBudget => "brief budget must be a positive amount",
            ValidationError::EmptyBriefDeadline => "brief deadline is required",
            ValidationError::InvalidEmail => "email must look like local@domain.tld",
            ValidationError::NoResponsesRecorded => "record at least one outreach response",
            ValidationError::NoDraftFile => "a draft file must be provided",
            ValidationError::InvalidApprovalLink => "approval link must be an http(s) URL",
            ValidationError::EmptyFixComment => "describe what needs to change",
            ValidationError::CancelNotConfirmed => "cancel requires explicit confirmation",
        };
        write!(f, "VALIDATION: {msg}")
    }
}

impl std::error::Error for ValidationError {}

// ---------------------------------------------------------------------------
// GateViolation
// ---------------------------------------------------------------------------

/// An action invoked while its prerequisite stage is incomplete.
///
/// The UI disables the matching control, so hitting one of these means the
/// caller bypassed the enablement set; the reply still names the missing
/// precondition instead of panicking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateViolation {
    /// Pay before the contract is signed.
    ContractNotSigned,
    /// Upload before the contract+payment stage is complete.
    ShootLocked,
    /// Approve / request-fix before a draft was uploaded.
    ApprovalLocked,
    /// Payout before the approval stage is complete.
    PayoutLocked,
}

impl std::fmt::Display for GateViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            GateViolation::ContractNotSigned => "contract must be signed first",
            GateViolation::ShootLocked => "contract and payment must be completed first",
            GateViolation::ApprovalLocked => "a draft must be uploaded first",
            GateViolation::PayoutLocked => "the draft must be approved first",
        };
        write!(f, "GATE_REFUSED: {msg}")
    }
}

impl std::error::Error for GateViolation {}

// ---------------------------------------------------------------------------
// ActionError
// ---------------------------------------------------------------------------

/// Everything a controller action can fail with.
#[derive(Debug)]
pub enum ActionError {
    Validation(ValidationError),
    Gate(GateViolation),
    /// The overlay backend refused the write. The deal state is unchanged
    /// (patches commit to memory only after the backend accepts them).
    Storage(anyhow::Error),
}

impl std::fmt::Display for ActionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionError::Validation(e) => write!(f, "{e}"),
            ActionError::Gate(e) => write!(f, "{e}"),
            ActionError::Storage(e) => write!(f, "STORAGE: {e:#}"),
        }
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ActionError::Validation(e) => Some(e),
            ActionError::Gate(e) => Some(e),
            ActionError::Storage(_) => None,
        }
    }
}

impl From<ValidationError> for ActionError {
    fn from(e: ValidationError) -> Self {
        ActionError::Validation(e)
    }
}

impl From<GateViolation> for ActionError {
    fn from(e: GateViolation) -> Self {
        ActionError::Gate(e)
    }
}

impl From<anyhow::Error> for ActionError {
    fn from(e: anyhow::Error) -> Self {
        ActionError::Storage(e)
    }
}
