use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::workflow::{ApprovalChain, ApprovalStep, ApproverRole, Decision};

/// Overtime application as stored: one column per sign-off.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct OvertimeApplication {
    pub id: u64,
    pub applicant_id: u64,
    pub date: NaiveDate,
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
    pub description: String,
    #[sqlx(try_from = "String")]
    pub supervisor_approval: Decision,
    #[sqlx(try_from = "String")]
    pub hod_approval: Decision,
    #[sqlx(try_from = "String")]
    pub hr_approval: Decision,
    #[sqlx(try_from = "String")]
    pub cfo_approval: Decision,
    #[sqlx(try_from = "String")]
    pub ceo_approval: Decision,
}

impl OvertimeApplication {
    pub fn chain(&self) -> ApprovalChain {
        ApprovalChain::from_steps(vec![
            step(ApproverRole::Supervisor, self.supervisor_approval),
            step(ApproverRole::DepartmentHead, self.hod_approval),
            step(ApproverRole::Hr, self.hr_approval),
            step(ApproverRole::Cfo, self.cfo_approval),
            step(ApproverRole::Ceo, self.ceo_approval),
        ])
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct OvertimePlan {
    pub id: u64,
    pub applicant_id: u64,
    pub date: NaiveDate,
    #[sqlx(try_from = "String")]
    pub hr_approval: Decision,
    #[sqlx(try_from = "String")]
    pub cfo_approval: Decision,
}

impl OvertimePlan {
    pub fn chain(&self) -> ApprovalChain {
        ApprovalChain::from_steps(vec![
            step(ApproverRole::Hr, self.hr_approval),
            step(ApproverRole::Cfo, self.cfo_approval),
        ])
    }
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct OvertimeSchedule {
    pub id: u64,
    pub overtime_plan_id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = 3)]
    pub number_of_hours: u32,
    pub description: String,
}

/// Column holding `role`'s decision on an overtime record.
pub fn approval_column(role: ApproverRole) -> &'static str {
    match role {
        ApproverRole::Supervisor => "supervisor_approval",
        ApproverRole::DepartmentHead => "hod_approval",
        ApproverRole::Hr => "hr_approval",
        ApproverRole::Cfo => "cfo_approval",
        ApproverRole::Ceo => "ceo_approval",
    }
}

fn step(role: ApproverRole, decision: Decision) -> ApprovalStep {
    ApprovalStep { role, decision }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::ChainStatus;
    use chrono::NaiveDate;

    fn application(decisions: [Decision; 5]) -> OvertimeApplication {
        let day = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        OvertimeApplication {
            id: 1,
            applicant_id: 7,
            date: day,
            start_time: day.and_hms_opt(18, 0, 0).unwrap(),
            end_time: day.and_hms_opt(20, 0, 0).unwrap(),
            description: "month-end close".into(),
            supervisor_approval: decisions[0],
            hod_approval: decisions[1],
            hr_approval: decisions[2],
            cfo_approval: decisions[3],
            ceo_approval: decisions[4],
        }
    }

    #[test]
    fn columns_map_onto_chain_steps() {
        use Decision::*;
        let chain = application([Approved, Approved, Pending, Approved, Approved]).chain();
        assert_eq!(chain.decision_of(ApproverRole::Hr), Some(Pending));
        assert_eq!(chain.status(), ChainStatus::Pending);

        let chain = application([Approved; 5]).chain();
        assert!(chain.all_approved());
    }

    #[test]
    fn plan_chain_has_hr_and_cfo() {
        let day = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let plan = OvertimePlan {
            id: 1,
            applicant_id: 7,
            date: day,
            hr_approval: Decision::Approved,
            cfo_approval: Decision::Rejected,
        };
        let roles: Vec<_> = plan.chain().steps().iter().map(|s| s.role).collect();
        assert_eq!(roles, vec![ApproverRole::Hr, ApproverRole::Cfo]);
        assert_eq!(plan.chain().status(), ChainStatus::Rejected);
    }
}
