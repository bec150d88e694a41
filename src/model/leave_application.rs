use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::workflow::HrStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum LeaveType {
    Annual,
    Sick,
    Unpaid,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "employee_id": 1000,
    "name": "John Doe",
    "email": "john.doe@company.com",
    "apply_date": "2026-01-01",
    "start_date": "2026-01-05",
    "end_date": "2026-01-07",
    "no_of_days": 3,
    "leave_type": "annual",
    "hr_status": "Pending",
    "hr_comment": null,
    "reviewed_by": null
}))]
pub struct LeaveApplication {
    pub id: u64,
    pub employee_id: u64,
    pub name: String,
    pub email: String,
    #[schema(value_type = String, format = "date")]
    pub apply_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub no_of_days: u32,
    #[sqlx(try_from = "String")]
    pub leave_type: LeaveType,
    #[sqlx(try_from = "String")]
    pub hr_status: HrStatus,
    #[schema(nullable = true)]
    pub hr_comment: Option<String>,
    /// User id of the HR reviewer
    #[schema(nullable = true)]
    pub reviewed_by: Option<u64>,
}

pub const SELECT_LEAVE: &str = r#"
    SELECT id, employee_id, name, email, apply_date, start_date, end_date,
           no_of_days, leave_type, hr_status, hr_comment, reviewed_by
    FROM leave_applications
"#;
