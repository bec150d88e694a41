use crate::{
    auth::auth::AuthUser,
    config::Config,
    model::overtime::{OvertimeApplication, approval_column},
    utils::holiday_cache::HolidayCalendar,
    workflow::{
        ApprovalStep, ApproverRole, OvertimeStatus, Verdict, WorkflowError, compute_overtime_pay,
        expiry_cutoff, is_duration_valid, overtime_status, parse_datetime, work_date,
    },
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Local, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};

const SELECT_OVERTIME: &str = r#"
    SELECT o.id, o.applicant_id, o.date, o.start_time, o.end_time, o.description,
           o.supervisor_approval, o.hod_approval, o.hr_approval, o.cfo_approval, o.ceo_approval,
           CONCAT(e.first_name, ' ', e.last_name) AS applicant_name,
           e.overtime_hourly_rate
    FROM overtime_applications o
    JOIN employees e ON e.id = o.applicant_id
"#;

const ANY_REJECTED: &str = "(o.supervisor_approval = 'Rejected' OR o.hod_approval = 'Rejected' \
    OR o.hr_approval = 'Rejected' OR o.cfo_approval = 'Rejected' OR o.ceo_approval = 'Rejected')";

const ALL_APPROVED: &str = "(o.supervisor_approval = 'Approved' AND o.hod_approval = 'Approved' \
    AND o.hr_approval = 'Approved' AND o.cfo_approval = 'Approved' AND o.ceo_approval = 'Approved')";

#[derive(FromRow)]
struct OvertimeRow {
    #[sqlx(flatten)]
    application: OvertimeApplication,
    applicant_name: String,
    overtime_hourly_rate: Decimal,
}

#[derive(Deserialize, ToSchema)]
pub struct CreateOvertime {
    #[schema(example = "2026-01-20T18:00:00")]
    pub start_time: String,
    #[schema(example = "2026-01-20T20:00:00")]
    pub end_time: String,
    #[schema(example = "Month-end close")]
    pub description: String,
}

#[derive(Deserialize, ToSchema)]
pub struct OvertimeDecision {
    pub verdict: Verdict,
    /// Step to sign. Required for Admin, otherwise the caller's own step.
    #[schema(nullable = true)]
    pub as_role: Option<ApproverRole>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct OvertimeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    pub applicant_id: Option<u64>,
    /// Pending, Approved, Rejected or Expired
    pub status: Option<String>,
    /// Only applications still waiting on the caller's own step
    pub awaiting: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OvertimeView {
    pub id: u64,
    pub applicant_id: u64,
    #[schema(example = "Ada Obi")]
    pub applicant_name: String,
    /// Submission date
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub start_time: NaiveDateTime,
    #[schema(value_type = String, format = "date-time")]
    pub end_time: NaiveDateTime,
    pub description: String,
    pub approvals: Vec<ApprovalStep>,
    pub status: OvertimeStatus,
    pub expired: bool,
    #[schema(value_type = String, example = "2.00")]
    pub hours: Decimal,
    #[schema(value_type = String, example = "1.5")]
    pub multiplier: Decimal,
    /// What the work would pay
    #[schema(example = 300)]
    pub computed_pay: i64,
    /// Set once every step has approved
    #[schema(nullable = true, example = 300)]
    pub payable_pay: Option<i64>,
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

async fn is_holiday(
    pool: &MySqlPool,
    calendar: &HolidayCalendar,
    date: NaiveDate,
) -> actix_web::Result<bool> {
    calendar.is_holiday(pool, date).await.map_err(|e| {
        error!(error = %e, %date, "Holiday lookup failed");
        ErrorInternalServerError("Internal Server Error")
    })
}

async fn to_view(
    row: OvertimeRow,
    pool: &MySqlPool,
    calendar: &HolidayCalendar,
    expiry_days: i64,
) -> actix_web::Result<OvertimeView> {
    let app = row.application;
    let chain = app.chain();
    let status = overtime_status(&chain, app.end_time, now(), expiry_days);
    let holiday = is_holiday(pool, calendar, work_date(app.end_time)).await?;
    let pay = compute_overtime_pay(app.start_time, app.end_time, holiday, row.overtime_hourly_rate)?;

    Ok(OvertimeView {
        id: app.id,
        applicant_id: app.applicant_id,
        applicant_name: row.applicant_name,
        date: app.date,
        start_time: app.start_time,
        end_time: app.end_time,
        description: app.description,
        approvals: chain.steps().to_vec(),
        status,
        expired: status == OvertimeStatus::Expired,
        hours: pay.hours,
        multiplier: pay.multiplier,
        computed_pay: pay.amount,
        payable_pay: (status == OvertimeStatus::Approved).then_some(pay.amount),
    })
}

async fn fetch_row(pool: &MySqlPool, overtime_id: u64) -> actix_web::Result<Option<OvertimeRow>> {
    let sql = format!("{} WHERE o.id = ?", SELECT_OVERTIME);
    sqlx::query_as::<_, OvertimeRow>(&sql)
        .bind(overtime_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            error!(error = %e, overtime_id, "Failed to fetch overtime application");
            ErrorInternalServerError("Internal Server Error")
        })
}

/// Apply for overtime
#[utoipa::path(
    post,
    path = "/api/overtime",
    request_body = CreateOvertime,
    responses(
        (status = 201, description = "Overtime application submitted", body = Object, example = json!({
            "message": "Overtime application submitted",
            "id": 1
        })),
        (status = 400, description = "Unparsable datetime or end not after start"),
        (status = 403, description = "No employee profile")
    ),
    tag = "Overtime",
    security(("bearer_auth" = []))
)]
pub async fn apply_overtime(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateOvertime>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;

    let (Some(start), Some(end)) = (
        parse_datetime(&payload.start_time),
        parse_datetime(&payload.end_time),
    ) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "start_time and end_time must be datetimes like 2026-01-20T18:00:00"
        })));
    };

    if !is_duration_valid(start, end) {
        return Err(WorkflowError::InvalidDuration.into());
    }

    let res = sqlx::query(
        r#"
        INSERT INTO overtime_applications (applicant_id, date, start_time, end_time, description)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(Local::now().date_naive())
    .bind(start)
    .bind(end)
    .bind(payload.description.trim())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to submit overtime");
        ErrorInternalServerError("Internal Server Error")
    })?;

    info!(overtime_id = res.last_insert_id(), employee_id, %start, %end, "Overtime submitted");

    Ok(HttpResponse::Created().json(json!({
        "message": "Overtime application submitted",
        "id": res.last_insert_id()
    })))
}

/// SQL condition for a derived status. Pending and Expired bind the expiry
/// cutoff.
fn status_condition(status: OvertimeStatus) -> String {
    match status {
        OvertimeStatus::Approved => ALL_APPROVED.to_string(),
        OvertimeStatus::Rejected => ANY_REJECTED.to_string(),
        OvertimeStatus::Pending => {
            format!("NOT {} AND NOT {} AND o.end_time >= ?", ANY_REJECTED, ALL_APPROVED)
        }
        OvertimeStatus::Expired => {
            format!("NOT {} AND NOT {} AND o.end_time < ?", ANY_REJECTED, ALL_APPROVED)
        }
    }
}

fn parse_status(raw: &str) -> Option<OvertimeStatus> {
    [
        OvertimeStatus::Pending,
        OvertimeStatus::Approved,
        OvertimeStatus::Rejected,
        OvertimeStatus::Expired,
    ]
    .into_iter()
    .find(|s| s.as_ref().eq_ignore_ascii_case(raw.trim()))
}

/// List overtime applications
#[utoipa::path(
    get,
    path = "/api/overtime",
    params(OvertimeQuery),
    responses(
        (status = 200, description = "Overtime applications, newest first", body = [OvertimeView]),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Approvers only")
    ),
    tag = "Overtime",
    security(("bearer_auth" = []))
)]
pub async fn list_overtime(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<HolidayCalendar>,
    config: web::Data<Config>,
    query: web::Query<OvertimeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;

    let page = crate::utils::pagination::Page::new(query.page, query.per_page, 20);
    let cutoff = expiry_cutoff(now(), config.overtime_expiry_days);

    let status = match query.status.as_deref().map(|s| parse_status(s).ok_or(s)).transpose() {
        Ok(s) => s,
        Err(raw) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": format!("Unknown status {}", raw)
            })));
        }
    };

    let mut conditions: Vec<String> = Vec::new();
    if query.applicant_id.is_some() {
        conditions.push("o.applicant_id = ?".into());
    }
    if let Some(status) = status {
        conditions.push(status_condition(status));
    }
    if query.awaiting.unwrap_or(false) {
        let step = auth.role.approver_role().ok_or(WorkflowError::NoApproverRole)?;
        conditions.push(format!("o.{} = 'Pending'", approval_column(step)));
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let sql = format!(
        "{} {} ORDER BY o.date DESC, o.id DESC LIMIT ? OFFSET ?",
        SELECT_OVERTIME, where_clause
    );
    debug!(sql = %sql, ?status, "Listing overtime");

    let mut q = sqlx::query_as::<_, OvertimeRow>(&sql);
    if let Some(applicant_id) = query.applicant_id {
        q = q.bind(applicant_id);
    }
    if matches!(status, Some(OvertimeStatus::Pending | OvertimeStatus::Expired)) {
        q = q.bind(cutoff);
    }
    q = q.bind(page.per_page).bind(page.offset);

    let rows = q.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %sql, "Failed to list overtime");
        ErrorInternalServerError("Database error")
    })?;

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(to_view(row, pool.get_ref(), &calendar, config.overtime_expiry_days).await?);
    }

    Ok(HttpResponse::Ok().json(views))
}

/// Own overtime applications
#[utoipa::path(
    get,
    path = "/api/overtime/mine",
    responses(
        (status = 200, description = "Caller's overtime applications", body = [OvertimeView]),
        (status = 403, description = "No employee profile")
    ),
    tag = "Overtime",
    security(("bearer_auth" = []))
)]
pub async fn my_overtime(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<HolidayCalendar>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;

    let sql = format!("{} WHERE o.applicant_id = ? ORDER BY o.date DESC, o.id DESC", SELECT_OVERTIME);
    let rows = sqlx::query_as::<_, OvertimeRow>(&sql)
        .bind(employee_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch own overtime");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let mut views = Vec::with_capacity(rows.len());
    for row in rows {
        views.push(to_view(row, pool.get_ref(), &calendar, config.overtime_expiry_days).await?);
    }

    Ok(HttpResponse::Ok().json(views))
}

/// Overtime application with pay breakdown
#[utoipa::path(
    get,
    path = "/api/overtime/{overtime_id}",
    params(("overtime_id" = u64, Path, description = "Overtime application ID")),
    responses(
        (status = 200, description = "Overtime application", body = OvertimeView),
        (status = 403, description = "Not an approver and not the applicant"),
        (status = 404, description = "Overtime application not found")
    ),
    tag = "Overtime",
    security(("bearer_auth" = []))
)]
pub async fn get_overtime(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<HolidayCalendar>,
    config: web::Data<Config>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let overtime_id = path.into_inner();

    let Some(row) = fetch_row(pool.get_ref(), overtime_id).await? else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Overtime application not found"
        })));
    };

    if auth.require_approver().is_err() && auth.employee_id != Some(row.application.applicant_id) {
        return Err(actix_web::error::ErrorForbidden("Not your overtime application"));
    }

    let view = to_view(row, pool.get_ref(), &calendar, config.overtime_expiry_days).await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Sign one step of the approval chain
#[utoipa::path(
    put,
    path = "/api/overtime/{overtime_id}/decision",
    params(("overtime_id" = u64, Path, description = "Overtime application ID")),
    request_body = OvertimeDecision,
    responses(
        (status = 200, description = "Decision recorded", body = OvertimeView),
        (status = 403, description = "Caller does not sign this step"),
        (status = 404, description = "Overtime application not found"),
        (status = 409, description = "Step already decided, chain closed or application expired")
    ),
    tag = "Overtime",
    security(("bearer_auth" = []))
)]
pub async fn decide_overtime(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<HolidayCalendar>,
    config: web::Data<Config>,
    path: web::Path<u64>,
    body: web::Json<OvertimeDecision>,
) -> actix_web::Result<impl Responder> {
    let overtime_id = path.into_inner();
    let step = auth.approver_step(body.as_role)?;

    let Some(row) = fetch_row(pool.get_ref(), overtime_id).await? else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Overtime application not found"
        })));
    };

    let mut chain = row.application.chain();
    let status = overtime_status(&chain, row.application.end_time, now(), config.overtime_expiry_days);
    if status == OvertimeStatus::Expired {
        return Err(WorkflowError::Expired.into());
    }
    let decision = chain.record(step, body.verdict)?;

    // The step must still be pending and no other step may have rejected
    let column = approval_column(step);
    let sql = format!(
        "UPDATE overtime_applications o SET o.{col} = ? WHERE o.id = ? AND o.{col} = 'Pending' AND NOT {rejected}",
        col = column,
        rejected = ANY_REJECTED
    );

    let res = sqlx::query(&sql)
        .bind(decision.as_ref())
        .bind(overtime_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, overtime_id, %step, "Failed to record overtime decision");
            ErrorInternalServerError("Internal Server Error")
        })?;

    if res.rows_affected() == 0 {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Overtime application was decided by someone else, reload and retry"
        })));
    }

    info!(overtime_id, %step, %decision, by = auth.user_id, "Overtime step decided");

    let Some(row) = fetch_row(pool.get_ref(), overtime_id).await? else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Overtime application not found"
        })));
    };
    let view = to_view(row, pool.get_ref(), &calendar, config.overtime_expiry_days).await?;

    Ok(HttpResponse::Ok().json(view))
}

/// Pay for the employee's fully approved overtime whose work date falls in
/// `[from, until)`.
pub async fn approved_overtime_pay(
    pool: &MySqlPool,
    calendar: &HolidayCalendar,
    employee_id: u64,
    from: NaiveDate,
    until: NaiveDate,
) -> actix_web::Result<Decimal> {
    let sql = format!(
        "{} WHERE o.applicant_id = ? AND DATE(o.end_time) >= ? AND DATE(o.end_time) < ? AND {}",
        SELECT_OVERTIME, ALL_APPROVED
    );

    let rows = sqlx::query_as::<_, OvertimeRow>(&sql)
        .bind(employee_id)
        .bind(from)
        .bind(until)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, %from, "Failed to fetch approved overtime");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let mut total = Decimal::ZERO;
    for row in rows {
        let app = row.application;
        if !app.chain().all_approved() {
            continue;
        }
        let holiday = is_holiday(pool, calendar, work_date(app.end_time)).await?;
        let pay = compute_overtime_pay(app.start_time, app.end_time, holiday, row.overtime_hourly_rate)?;
        total += Decimal::from(pay.amount);
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_filter_is_case_insensitive() {
        assert_eq!(parse_status("expired"), Some(OvertimeStatus::Expired));
        assert_eq!(parse_status(" Approved "), Some(OvertimeStatus::Approved));
        assert_eq!(parse_status("closed"), None);
    }

    #[test]
    fn only_time_bound_statuses_take_the_cutoff() {
        assert!(status_condition(OvertimeStatus::Pending).ends_with("o.end_time >= ?"));
        assert!(status_condition(OvertimeStatus::Expired).ends_with("o.end_time < ?"));
        assert!(!status_condition(OvertimeStatus::Approved).contains('?'));
        assert!(!status_condition(OvertimeStatus::Rejected).contains('?'));
    }

    #[test]
    fn decision_payload_names_an_optional_step() {
        let body: OvertimeDecision = serde_json::from_value(json!({
            "verdict": "approve",
            "as_role": "department_head"
        }))
        .unwrap();
        assert_eq!(body.verdict, Verdict::Approve);
        assert_eq!(body.as_role, Some(ApproverRole::DepartmentHead));

        let body: OvertimeDecision = serde_json::from_value(json!({ "verdict": "reject" })).unwrap();
        assert!(body.as_role.is_none());
    }
}
