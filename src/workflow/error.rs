use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use super::approval::{ApproverRole, ChainStatus, Decision};
use super::leave::HrStatus;

/// Rule violations raised by the approval workflow.
///
/// Each variant maps onto an HTTP status so handlers can use `?` directly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("Leave application already {0}")]
    LeaveAlreadyDecided(HrStatus),

    #[error("A comment is required to decide a leave application")]
    CommentRequired,

    #[error("Approval by {role} is already recorded as {decision}")]
    StepAlreadyDecided {
        role: ApproverRole,
        decision: Decision,
    },

    #[error("{0} does not sign off this request")]
    NotInChain(ApproverRole),

    #[error("Approval chain is closed ({0})")]
    ChainClosed(ChainStatus),

    #[error("Overtime application has expired")]
    Expired,

    #[error("Your role cannot act as an approver")]
    NoApproverRole,

    #[error("End must be strictly later than start")]
    InvalidDuration,

    #[error("Overtime pay is out of range")]
    PayOutOfRange,
}

impl ResponseError for WorkflowError {
    fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::LeaveAlreadyDecided(_)
            | WorkflowError::StepAlreadyDecided { .. }
            | WorkflowError::ChainClosed(_)
            | WorkflowError::Expired => StatusCode::CONFLICT,
            WorkflowError::NotInChain(_) | WorkflowError::NoApproverRole => StatusCode::FORBIDDEN,
            WorkflowError::CommentRequired | WorkflowError::InvalidDuration => {
                StatusCode::BAD_REQUEST
            }
            WorkflowError::PayOutOfRange => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(
            WorkflowError::LeaveAlreadyDecided(HrStatus::Approved).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            WorkflowError::NotInChain(ApproverRole::Ceo).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            WorkflowError::NoApproverRole.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            WorkflowError::InvalidDuration.status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn messages_name_the_step() {
        let err = WorkflowError::StepAlreadyDecided {
            role: ApproverRole::DepartmentHead,
            decision: Decision::Rejected,
        };
        assert_eq!(
            err.to_string(),
            "Approval by department_head is already recorded as Rejected"
        );
    }
}
