//! Approval workflow and overtime pay rules.
//!
//! Nothing in here touches the database or the request; handlers load the
//! record, run it through these types and persist the outcome.

pub mod approval;
pub mod duration;
pub mod error;
pub mod leave;
pub mod overtime;

pub use approval::{ApprovalChain, ApprovalStep, ApproverRole, ChainStatus, Decision, Verdict};
pub use duration::{is_duration_valid, parse_datetime};
pub use error::WorkflowError;
pub use leave::{HrStatus, leave_days};
pub use overtime::{
    OvertimeStatus, compute_overtime_pay, expiry_cutoff, overtime_status, work_date,
};
