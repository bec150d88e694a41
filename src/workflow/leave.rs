//! HR decision on a leave application.
//!
//! `Pending` moves to exactly one of `Approved` or `Rejected` and stays
//! there; there is no re-open.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::approval::Verdict;
use super::duration::is_duration_valid;
use super::error::WorkflowError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum HrStatus {
    Pending,
    Approved,
    Rejected,
}

impl HrStatus {
    pub fn is_terminal(self) -> bool {
        self != HrStatus::Pending
    }

    pub fn decide(self, verdict: Verdict) -> Result<HrStatus, WorkflowError> {
        match (self, verdict) {
            (HrStatus::Pending, Verdict::Approve) => Ok(HrStatus::Approved),
            (HrStatus::Pending, Verdict::Reject) => Ok(HrStatus::Rejected),
            (decided, _) => Err(WorkflowError::LeaveAlreadyDecided(decided)),
        }
    }
}

/// Inclusive number of days between `start` and `end`.
///
/// The range is checked as `[start 00:00, end + 1 day 00:00)`, so a
/// single-day leave is valid and an end before the start is not.
pub fn leave_days(start: NaiveDate, end: NaiveDate) -> Result<u32, WorkflowError> {
    let from = start.and_hms_opt(0, 0, 0);
    let until = end
        .checked_add_days(Days::new(1))
        .and_then(|d| d.and_hms_opt(0, 0, 0));

    match (from, until) {
        (Some(from), Some(until)) if is_duration_valid(from, until) => {
            u32::try_from((until - from).num_days()).map_err(|_| WorkflowError::InvalidDuration)
        }
        _ => Err(WorkflowError::InvalidDuration),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn pending_goes_to_exactly_one_terminal_state() {
        assert_eq!(HrStatus::Pending.decide(Verdict::Approve), Ok(HrStatus::Approved));
        assert_eq!(HrStatus::Pending.decide(Verdict::Reject), Ok(HrStatus::Rejected));
    }

    #[test]
    fn terminal_states_never_move() {
        for status in [HrStatus::Approved, HrStatus::Rejected] {
            assert!(status.is_terminal());
            for verdict in [Verdict::Approve, Verdict::Reject] {
                assert_eq!(
                    status.decide(verdict),
                    Err(WorkflowError::LeaveAlreadyDecided(status))
                );
            }
        }
    }

    #[test]
    fn stored_status_strings() {
        assert_eq!(HrStatus::Pending.as_ref(), "Pending");
        assert_eq!("approved".parse::<HrStatus>().unwrap(), HrStatus::Approved);
    }

    #[test]
    fn single_day_leave_counts_one() {
        assert_eq!(leave_days(date(2026, 5, 4), date(2026, 5, 4)), Ok(1));
    }

    #[test]
    fn range_is_inclusive() {
        assert_eq!(leave_days(date(2026, 5, 4), date(2026, 5, 8)), Ok(5));
        assert_eq!(leave_days(date(2026, 2, 27), date(2026, 3, 2)), Ok(4));
    }

    #[test]
    fn end_before_start_is_rejected() {
        assert_eq!(
            leave_days(date(2026, 5, 8), date(2026, 5, 4)),
            Err(WorkflowError::InvalidDuration)
        );
    }
}
