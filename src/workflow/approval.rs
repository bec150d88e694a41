//! Ordered approval chains.
//!
//! A chain is a list of `(role, decision)` steps. Steps are decided
//! independently of each other, each exactly once, and the chain as a whole
//! is `Approved` only when every step is.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use super::error::WorkflowError;

/// State of a single sign-off as stored in the record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum Decision {
    Pending,
    Approved,
    Rejected,
}

/// The action an approver takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Approve,
    Reject,
}

impl From<Verdict> for Decision {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Approve => Decision::Approved,
            Verdict::Reject => Decision::Rejected,
        }
    }
}

/// Who signs a step.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
    ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ApproverRole {
    Supervisor,
    DepartmentHead,
    Hr,
    Cfo,
    Ceo,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr, ToSchema,
)]
pub enum ChainStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ApprovalStep {
    pub role: ApproverRole,
    pub decision: Decision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ApprovalChain {
    steps: Vec<ApprovalStep>,
}

impl ApprovalChain {
    /// A fresh chain with every role pending, in the given order.
    pub fn new(roles: &[ApproverRole]) -> Self {
        Self {
            steps: roles
                .iter()
                .map(|&role| ApprovalStep {
                    role,
                    decision: Decision::Pending,
                })
                .collect(),
        }
    }

    /// Supervisor, department head, HR, CFO, CEO.
    pub fn overtime() -> Self {
        Self::new(&[
            ApproverRole::Supervisor,
            ApproverRole::DepartmentHead,
            ApproverRole::Hr,
            ApproverRole::Cfo,
            ApproverRole::Ceo,
        ])
    }

    pub fn overtime_plan() -> Self {
        Self::new(&[ApproverRole::Hr, ApproverRole::Cfo])
    }

    /// Rebuild a chain from persisted steps.
    pub fn from_steps(steps: Vec<ApprovalStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[ApprovalStep] {
        &self.steps
    }

    pub fn decision_of(&self, role: ApproverRole) -> Option<Decision> {
        self.steps
            .iter()
            .find(|s| s.role == role)
            .map(|s| s.decision)
    }

    pub fn all_approved(&self) -> bool {
        self.steps.iter().all(|s| s.decision == Decision::Approved)
    }

    pub fn any_rejected(&self) -> bool {
        self.steps.iter().any(|s| s.decision == Decision::Rejected)
    }

    pub fn status(&self) -> ChainStatus {
        if self.any_rejected() {
            ChainStatus::Rejected
        } else if self.all_approved() {
            ChainStatus::Approved
        } else {
            ChainStatus::Pending
        }
    }

    /// Record `role`'s verdict. Fails when the role has no step here, the
    /// step is already decided, or the chain has already closed.
    pub fn record(&mut self, role: ApproverRole, verdict: Verdict) -> Result<Decision, WorkflowError> {
        let status = self.status();
        let step = self
            .steps
            .iter_mut()
            .find(|s| s.role == role)
            .ok_or(WorkflowError::NotInChain(role))?;

        if step.decision != Decision::Pending {
            return Err(WorkflowError::StepAlreadyDecided {
                role,
                decision: step.decision,
            });
        }
        if status != ChainStatus::Pending {
            return Err(WorkflowError::ChainClosed(status));
        }

        step.decision = verdict.into();
        Ok(step.decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn overtime_chain_is_ordered() {
        let roles: Vec<_> = ApprovalChain::overtime().steps().iter().map(|s| s.role).collect();
        assert_eq!(roles, ApproverRole::iter().collect::<Vec<_>>());
    }

    #[test]
    fn new_chain_is_pending() {
        let chain = ApprovalChain::overtime();
        assert_eq!(chain.status(), ChainStatus::Pending);
        assert!(!chain.all_approved());
        assert!(!chain.any_rejected());
    }

    #[test]
    fn approved_only_when_every_step_approves() {
        let mut chain = ApprovalChain::overtime();
        for role in ApproverRole::iter() {
            assert_eq!(chain.status(), ChainStatus::Pending);
            chain.record(role, Verdict::Approve).unwrap();
        }
        assert!(chain.all_approved());
        assert_eq!(chain.status(), ChainStatus::Approved);
    }

    #[test]
    fn steps_decide_in_any_order() {
        let mut chain = ApprovalChain::overtime();
        chain.record(ApproverRole::Ceo, Verdict::Approve).unwrap();
        chain.record(ApproverRole::Supervisor, Verdict::Approve).unwrap();
        assert_eq!(chain.decision_of(ApproverRole::Ceo), Some(Decision::Approved));
        assert_eq!(chain.decision_of(ApproverRole::Hr), Some(Decision::Pending));
    }

    #[test]
    fn one_rejection_closes_the_chain() {
        let mut chain = ApprovalChain::overtime();
        chain.record(ApproverRole::Hr, Verdict::Reject).unwrap();
        assert_eq!(chain.status(), ChainStatus::Rejected);

        let err = chain.record(ApproverRole::Cfo, Verdict::Approve).unwrap_err();
        assert_eq!(err, WorkflowError::ChainClosed(ChainStatus::Rejected));
    }

    #[test]
    fn a_step_is_decided_once() {
        let mut chain = ApprovalChain::overtime_plan();
        chain.record(ApproverRole::Hr, Verdict::Approve).unwrap();
        let err = chain.record(ApproverRole::Hr, Verdict::Reject).unwrap_err();
        assert_eq!(
            err,
            WorkflowError::StepAlreadyDecided {
                role: ApproverRole::Hr,
                decision: Decision::Approved
            }
        );
    }

    #[test]
    fn role_outside_chain_is_refused() {
        let mut chain = ApprovalChain::overtime_plan();
        let err = chain.record(ApproverRole::Supervisor, Verdict::Approve).unwrap_err();
        assert_eq!(err, WorkflowError::NotInChain(ApproverRole::Supervisor));
    }

    #[test]
    fn role_names_parse_case_insensitively() {
        assert_eq!(
            ApproverRole::from_str("Department_Head").unwrap(),
            ApproverRole::DepartmentHead
        );
        assert_eq!(ApproverRole::Cfo.as_ref(), "cfo");
        assert_eq!(Decision::from_str("approved").unwrap(), Decision::Approved);
    }

    fn verdict() -> impl Strategy<Value = Verdict> {
        prop_oneof![Just(Verdict::Approve), Just(Verdict::Reject)]
    }

    proptest! {
        #[test]
        fn status_matches_the_steps(verdicts in proptest::collection::vec(verdict(), 0..=5)) {
            let mut chain = ApprovalChain::overtime();
            for (role, v) in ApproverRole::iter().zip(verdicts.iter()) {
                let _ = chain.record(role, *v);
            }

            let decisions: Vec<_> = chain.steps().iter().map(|s| s.decision).collect();
            let expected = if decisions.contains(&Decision::Rejected) {
                ChainStatus::Rejected
            } else if decisions.iter().all(|d| *d == Decision::Approved) {
                ChainStatus::Approved
            } else {
                ChainStatus::Pending
            };
            prop_assert_eq!(chain.status(), expected);
            prop_assert!(decisions.iter().filter(|d| **d == Decision::Rejected).count() <= 1);
        }
    }
}
