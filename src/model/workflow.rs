//! Status machine shared by leave applications, compensatory leave requests,
//! expense claims and travel requests.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
pub enum WorkflowStatus {
    Open,
    Approved,
    Rejected,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum WorkflowAction {
    Approve,
    Reject,
    Cancel,
}

impl WorkflowAction {
    /// Statuses this action may start from.
    pub fn sources(self) -> &'static [WorkflowStatus] {
        match self {
            WorkflowAction::Approve | WorkflowAction::Reject => &[WorkflowStatus::Open],
            WorkflowAction::Cancel => &[WorkflowStatus::Approved, WorkflowStatus::Rejected],
        }
    }

    pub fn target(self) -> WorkflowStatus {
        match self {
            WorkflowAction::Approve => WorkflowStatus::Approved,
            WorkflowAction::Reject => WorkflowStatus::Rejected,
            WorkflowAction::Cancel => WorkflowStatus::Cancelled,
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            WorkflowAction::Approve => "approved",
            WorkflowAction::Reject => "rejected",
            WorkflowAction::Cancel => "cancelled",
        }
    }
}

/// Returns the status reached by applying `action` in `from`, or `None` when
/// the transition is not allowed.
pub fn transition(from: WorkflowStatus, action: WorkflowAction) -> Option<WorkflowStatus> {
    action.sources().contains(&from).then(|| action.target())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowDoc {
    LeaveApplication,
    CompensatoryLeave,
    ExpenseClaim,
    TravelRequest,
}

impl WorkflowDoc {
    pub fn table(self) -> &'static str {
        match self {
            WorkflowDoc::LeaveApplication => "leave_applications",
            WorkflowDoc::CompensatoryLeave => "compensatory_leave_requests",
            WorkflowDoc::ExpenseClaim => "expense_claims",
            WorkflowDoc::TravelRequest => "travel_requests",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            WorkflowDoc::LeaveApplication => "Leave Application",
            WorkflowDoc::CompensatoryLeave => "Compensatory Leave Request",
            WorkflowDoc::ExpenseClaim => "Expense Claim",
            WorkflowDoc::TravelRequest => "Travel Request",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use WorkflowAction::*;
    use WorkflowStatus::*;

    #[test]
    fn only_forward_transitions_are_accepted() {
        let statuses = [Open, Approved, Rejected, Cancelled];
        let actions = [Approve, Reject, Cancel];

        let mut allowed = Vec::new();
        for from in statuses {
            for action in actions {
                if let Some(to) = transition(from, action) {
                    allowed.push((from, action, to));
                }
            }
        }

        assert_eq!(
            allowed,
            vec![
                (Open, Approve, Approved),
                (Open, Reject, Rejected),
                (Approved, Cancel, Cancelled),
                (Rejected, Cancel, Cancelled),
            ]
        );
    }

    #[test]
    fn cancelled_is_terminal() {
        for action in [Approve, Reject, Cancel] {
            assert_eq!(transition(Cancelled, action), None);
        }
    }

    #[test]
    fn open_cannot_be_cancelled() {
        assert_eq!(transition(Open, Cancel), None);
    }
}
