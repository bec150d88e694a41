//! Overtime pay and status.
//!
//! Hours are `(end - start)` in seconds over 3600, rounded to two decimals.
//! Work on a Sunday or a registered holiday pays double, anything else time
//! and a half. The final amount is truncated toward zero.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

use super::approval::{ApprovalChain, ChainStatus};
use super::duration::is_duration_valid;
use super::error::WorkflowError;

const SECONDS_PER_HOUR: i64 = 3600;
// Keeps `Duration::days` well inside its range
const MAX_EXPIRY_DAYS: i64 = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, AsRefStr, ToSchema)]
pub enum OvertimeStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OvertimePay {
    pub hours: Decimal,
    pub multiplier: Decimal,
    pub amount: i64,
}

/// The calendar day the overtime counts against: the date of the end
/// timestamp.
pub fn work_date(end: NaiveDateTime) -> NaiveDate {
    end.date()
}

pub fn overtime_hours(start: NaiveDateTime, end: NaiveDateTime) -> Result<Decimal, WorkflowError> {
    if !is_duration_valid(start, end) {
        return Err(WorkflowError::InvalidDuration);
    }
    let seconds = (end - start).num_seconds();
    Ok((Decimal::from(seconds) / Decimal::from(SECONDS_PER_HOUR))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

pub fn overtime_multiplier(date: NaiveDate, is_holiday: bool) -> Decimal {
    if is_holiday || date.weekday() == Weekday::Sun {
        Decimal::TWO
    } else {
        Decimal::new(15, 1)
    }
}

/// Pay for one overtime stretch. `is_holiday` refers to [`work_date`].
pub fn compute_overtime_pay(
    start: NaiveDateTime,
    end: NaiveDateTime,
    is_holiday: bool,
    hourly_rate: Decimal,
) -> Result<OvertimePay, WorkflowError> {
    let hours = overtime_hours(start, end)?;
    let multiplier = overtime_multiplier(work_date(end), is_holiday);
    let amount = hours
        .checked_mul(multiplier)
        .and_then(|v| v.checked_mul(hourly_rate))
        .ok_or(WorkflowError::PayOutOfRange)?
        .trunc();

    Ok(OvertimePay {
        hours,
        multiplier,
        amount: i64::try_from(amount).map_err(|_| WorkflowError::PayOutOfRange)?,
    })
}

/// Status of an overtime application at `now`. A chain still pending once
/// `expiry_days` have passed since the end of the work is expired.
pub fn overtime_status(
    chain: &ApprovalChain,
    end: NaiveDateTime,
    now: NaiveDateTime,
    expiry_days: i64,
) -> OvertimeStatus {
    match chain.status() {
        ChainStatus::Approved => OvertimeStatus::Approved,
        ChainStatus::Rejected => OvertimeStatus::Rejected,
        ChainStatus::Pending => match expires_at(end, expiry_days) {
            Some(deadline) if now > deadline => OvertimeStatus::Expired,
            _ => OvertimeStatus::Pending,
        },
    }
}

/// Deadline for a decision, `None` when it falls past the calendar range.
/// Negative windows count as zero.
pub fn expires_at(end: NaiveDateTime, expiry_days: i64) -> Option<NaiveDateTime> {
    let days = expiry_days.clamp(0, MAX_EXPIRY_DAYS);
    end.checked_add_signed(Duration::days(days))
}

/// Latest end time that is already past its window at `now`. Floors at the
/// Unix epoch.
pub fn expiry_cutoff(now: NaiveDateTime, expiry_days: i64) -> NaiveDateTime {
    let days = expiry_days.clamp(0, MAX_EXPIRY_DAYS);
    let floor = NaiveDateTime::default();
    now.checked_sub_signed(Duration::days(days))
        .filter(|cutoff| *cutoff > floor)
        .unwrap_or(floor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::approval::{ApproverRole, Verdict};
    use strum::IntoEnumIterator;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn two_hours_on_sunday_pays_double() {
        // 2026-01-18 is a Sunday
        let pay = compute_overtime_pay(
            dt(2026, 1, 18, 10, 0),
            dt(2026, 1, 18, 12, 0),
            false,
            Decimal::from(100),
        )
        .unwrap();
        assert_eq!(pay.hours, Decimal::from(2));
        assert_eq!(pay.multiplier, Decimal::TWO);
        assert_eq!(pay.amount, 400);
    }

    #[test]
    fn two_hours_on_tuesday_pays_time_and_a_half() {
        // 2026-01-20 is a Tuesday
        let pay = compute_overtime_pay(
            dt(2026, 1, 20, 18, 0),
            dt(2026, 1, 20, 20, 0),
            false,
            Decimal::from(100),
        )
        .unwrap();
        assert_eq!(pay.amount, 300);
    }

    #[test]
    fn holiday_pays_double_on_a_weekday() {
        let pay = compute_overtime_pay(
            dt(2026, 1, 20, 18, 0),
            dt(2026, 1, 20, 20, 0),
            true,
            Decimal::from(100),
        )
        .unwrap();
        assert_eq!(pay.amount, 400);
    }

    #[test]
    fn removing_a_holiday_reverts_the_multiplier() {
        let day = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        assert_eq!(overtime_multiplier(day, true), Decimal::TWO);
        assert_eq!(overtime_multiplier(day, false), Decimal::new(15, 1));
    }

    #[test]
    fn hours_round_to_two_decimals_and_pay_truncates() {
        // 1h 10m = 1.1666.. -> 1.17h; 1.17 * 1.5 * 33 = 57.915 -> 57
        let pay = compute_overtime_pay(
            dt(2026, 1, 20, 18, 0),
            dt(2026, 1, 20, 19, 10),
            false,
            Decimal::from(33),
        )
        .unwrap();
        assert_eq!(pay.hours, Decimal::new(117, 2));
        assert_eq!(pay.amount, 57);
    }

    #[test]
    fn spans_longer_than_a_day_count_every_hour() {
        let hours = overtime_hours(dt(2026, 1, 20, 18, 0), dt(2026, 1, 21, 20, 0)).unwrap();
        assert_eq!(hours, Decimal::from(26));
    }

    #[test]
    fn work_date_is_the_end_date() {
        // Saturday night into Sunday morning counts as Sunday work.
        let end = dt(2026, 1, 18, 2, 0);
        assert_eq!(work_date(end).weekday(), Weekday::Sun);
        let pay = compute_overtime_pay(dt(2026, 1, 17, 22, 0), end, false, Decimal::from(10)).unwrap();
        assert_eq!(pay.amount, 80);
    }

    #[test]
    fn invalid_duration_has_no_pay() {
        let at = dt(2026, 1, 20, 18, 0);
        assert_eq!(
            compute_overtime_pay(at, at, false, Decimal::from(100)),
            Err(WorkflowError::InvalidDuration)
        );
    }

    #[test]
    fn pending_chain_expires_after_window() {
        let chain = ApprovalChain::overtime();
        let end = dt(2026, 1, 20, 20, 0);
        assert_eq!(
            overtime_status(&chain, end, dt(2026, 2, 1, 0, 0), 30),
            OvertimeStatus::Pending
        );
        assert_eq!(
            overtime_status(&chain, end, dt(2026, 3, 1, 0, 0), 30),
            OvertimeStatus::Expired
        );
    }

    #[test]
    fn decided_chain_never_expires() {
        let mut chain = ApprovalChain::overtime();
        for role in ApproverRole::iter() {
            chain.record(role, Verdict::Approve).unwrap();
        }
        let end = dt(2026, 1, 20, 20, 0);
        assert_eq!(
            overtime_status(&chain, end, dt(2027, 1, 1, 0, 0), 30),
            OvertimeStatus::Approved
        );
    }

    #[test]
    fn oversized_window_never_expires() {
        let chain = ApprovalChain::overtime();
        let end = dt(2026, 1, 20, 20, 0);
        assert_eq!(
            overtime_status(&chain, end, dt(2040, 1, 1, 0, 0), 1_000_000_000_000),
            OvertimeStatus::Pending
        );
        assert_eq!(
            overtime_status(&chain, end, dt(2040, 1, 1, 0, 0), i64::MAX),
            OvertimeStatus::Pending
        );
    }

    #[test]
    fn negative_window_counts_as_zero() {
        let chain = ApprovalChain::overtime();
        let end = dt(2026, 1, 20, 20, 0);
        assert_eq!(overtime_status(&chain, end, end, -1), OvertimeStatus::Pending);
        assert_eq!(
            overtime_status(&chain, end, dt(2026, 1, 20, 20, 1), -1),
            OvertimeStatus::Expired
        );
    }

    #[test]
    fn cutoff_stays_within_range() {
        let now = dt(2026, 3, 1, 0, 0);
        assert_eq!(expiry_cutoff(now, 30), dt(2026, 1, 30, 0, 0));
        assert_eq!(expiry_cutoff(now, -5), now);
        assert_eq!(expiry_cutoff(now, i64::MAX), NaiveDateTime::default());
    }
}
