pub mod attendance;
pub mod department;
pub mod employee;
pub mod holiday;
pub mod leave_application;
pub mod overtime;
pub mod payroll;
pub mod recruitment;
pub mod role;

use crate::workflow::{Decision, HrStatus};
use attendance::AttendanceStatus;
use employee::{Gender, Language};
use leave_application::LeaveType;

/// Lets `#[sqlx(try_from = "String")]` read enums stored as VARCHAR.
macro_rules! string_column {
    ($($ty:ty),+ $(,)?) => {$(
        impl TryFrom<String> for $ty {
            type Error = strum::ParseError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    )+};
}

string_column!(HrStatus, Decision, AttendanceStatus, Gender, Language, LeaveType);
