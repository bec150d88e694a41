use crate::{
    api::employee::EMPLOYEE_COLUMNS,
    auth::auth::AuthUser,
    model::employee::Employee,
    model::leave_application::{LeaveApplication, LeaveType, SELECT_LEAVE},
    utils::pagination::{Page, Paginated},
    workflow::{HrStatus, Verdict, WorkflowError, leave_days},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{debug, error, info, warn};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(example = "2026-01-07", value_type = String, format = "date")]
    pub end_date: NaiveDate,
    #[schema(example = "annual")]
    pub leave_type: LeaveType,
}

#[derive(Deserialize, ToSchema)]
pub struct LeaveDecision {
    #[schema(example = "Enjoy your break")]
    pub comment: String,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct LeaveQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Pending, Approved or Rejected
    pub status: Option<String>,
    pub employee_id: Option<u64>,
    pub leave_type: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct YearQuery {
    /// Defaults to the current year
    pub year: Option<i32>,
}

/// Apply for leave
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = CreateLeave,
    responses(
        (status = 201, description = "Leave request submitted", body = Object, example = json!({
            "message": "Leave request submitted",
            "id": 1,
            "no_of_days": 3
        })),
        (status = 400, description = "End date before start date"),
        (status = 403, description = "No employee profile"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn create_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateLeave>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let no_of_days = leave_days(payload.start_date, payload.end_date)?;

    let sql = format!("SELECT {} FROM employees e WHERE e.id = ?", EMPLOYEE_COLUMNS);
    let employee = sqlx::query_as::<_, Employee>(&sql)
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, employee_id, "Failed to fetch employee for leave");
            ErrorInternalServerError("Internal Server Error")
        })?;

    let Some(employee) = employee else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    };

    let res = sqlx::query(
        r#"
        INSERT INTO leave_applications
        (employee_id, name, email, apply_date, start_date, end_date, no_of_days, leave_type, hr_status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'Pending')
        "#,
    )
    .bind(employee_id)
    .bind(employee.full_name())
    .bind(&employee.email)
    .bind(Local::now().date_naive())
    .bind(payload.start_date)
    .bind(payload.end_date)
    .bind(no_of_days)
    .bind(payload.leave_type.as_ref())
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, employee_id, "Failed to create leave request");
        ErrorInternalServerError("Internal Server Error")
    })?;

    info!(leave_id = res.last_insert_id(), employee_id, no_of_days, "Leave request submitted");

    Ok(HttpResponse::Created().json(json!({
        "message": "Leave request submitted",
        "id": res.last_insert_id(),
        "no_of_days": no_of_days
    })))
}

/// Approve leave
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(("leave_id" = u64, Path, description = "Leave request ID")),
    request_body = LeaveDecision,
    responses(
        (status = 200, description = "Leave approved"),
        (status = 400, description = "Comment missing"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave already decided")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn approve_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<LeaveDecision>,
) -> actix_web::Result<HttpResponse> {
    decide_leave(auth, pool.get_ref(), path.into_inner(), Verdict::Approve, &body.comment).await
}

/// Reject leave
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(("leave_id" = u64, Path, description = "Leave request ID")),
    request_body = LeaveDecision,
    responses(
        (status = 200, description = "Leave rejected"),
        (status = 400, description = "Comment missing"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave already decided")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn reject_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<LeaveDecision>,
) -> actix_web::Result<HttpResponse> {
    decide_leave(auth, pool.get_ref(), path.into_inner(), Verdict::Reject, &body.comment).await
}

async fn decide_leave(
    auth: AuthUser,
    pool: &MySqlPool,
    leave_id: u64,
    verdict: Verdict,
    comment: &str,
) -> actix_web::Result<HttpResponse> {
    auth.require_hr_or_admin()?;

    let comment = comment.trim();
    if comment.is_empty() {
        return Err(WorkflowError::CommentRequired.into());
    }

    let Some(current) = fetch_status(pool, leave_id).await? else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Leave request not found"
        })));
    };

    let next = current.decide(verdict)?;

    // Loses to a concurrent decision instead of overwriting it
    let res = sqlx::query(
        r#"
        UPDATE leave_applications
        SET hr_status = ?, hr_comment = ?, reviewed_by = ?
        WHERE id = ? AND hr_status = 'Pending'
        "#,
    )
    .bind(next.as_ref())
    .bind(comment)
    .bind(auth.user_id)
    .bind(leave_id)
    .execute(pool)
    .await
    .map_err(|e| {
        error!(error = %e, leave_id, "Failed to record leave decision");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if res.rows_affected() == 0 {
        let decided = fetch_status(pool, leave_id)
            .await?
            .filter(|s| s.is_terminal())
            .unwrap_or(next);
        return Err(WorkflowError::LeaveAlreadyDecided(decided).into());
    }

    info!(leave_id, status = %next, by = auth.user_id, "Leave decided");

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave {}", next.as_ref().to_lowercase()),
        "hr_status": next
    })))
}

async fn fetch_status(pool: &MySqlPool, leave_id: u64) -> actix_web::Result<Option<HrStatus>> {
    let raw = sqlx::query_scalar::<_, String>("SELECT hr_status FROM leave_applications WHERE id = ?")
        .bind(leave_id)
        .fetch_optional(pool)
        .await
        .map_err(|e| {
            error!(error = %e, leave_id, "Failed to fetch leave status");
            ErrorInternalServerError("Internal Server Error")
        })?;

    raw.map(|s| {
        s.parse::<HrStatus>().map_err(|e| {
            error!(error = %e, leave_id, value = %s, "Unknown leave status in database");
            ErrorInternalServerError("Internal Server Error")
        })
    })
    .transpose()
}

/// Get leave request
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(("leave_id" = u64, Path, description = "Leave request ID")),
    responses(
        (status = 200, description = "Leave request", body = LeaveApplication),
        (status = 403, description = "Not HR and not the applicant"),
        (status = 404, description = "Leave request not found")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn get_leave(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let leave_id = path.into_inner();

    let sql = format!("{} WHERE id = ?", SELECT_LEAVE);
    let leave = sqlx::query_as::<_, LeaveApplication>(&sql)
        .bind(leave_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, leave_id, "Failed to fetch leave request");
            ErrorInternalServerError("Internal Server Error")
        })?;

    match leave {
        Some(l) if auth.is_hr_or_admin() || auth.employee_id == Some(l.employee_id) => {
            Ok(HttpResponse::Ok().json(l))
        }
        Some(_) => Err(actix_web::error::ErrorForbidden("Not your leave request")),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Leave request not found"
        }))),
    }
}

/// List leave requests
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Paginated leave requests", body = LeavePage),
        (status = 400, description = "Unknown filter value")
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn list_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<LeaveQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let page = Page::new(query.page, query.per_page, 10);

    // ---------- validate filters ----------
    let status = match query.status.as_deref().map(str::parse::<HrStatus>).transpose() {
        Ok(s) => s,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "status must be Pending, Approved or Rejected"
            })));
        }
    };
    let leave_type = match query.leave_type.as_deref().map(str::parse::<LeaveType>).transpose() {
        Ok(t) => t,
        Err(_) => {
            return Ok(HttpResponse::BadRequest().json(json!({
                "message": "leave_type must be annual, sick or unpaid"
            })));
        }
    };

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();

    if let Some(status) = status {
        conditions.push("hr_status = ?");
        bindings.push(status.to_string());
    }
    if let Some(employee_id) = query.employee_id {
        conditions.push("employee_id = ?");
        bindings.push(employee_id.to_string());
    }
    if let Some(leave_type) = leave_type {
        conditions.push("leave_type = ?");
        bindings.push(leave_type.to_string());
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM leave_applications {}", where_clause);
    debug!(sql = %count_sql, bindings = ?bindings, "Counting leave requests");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count leave requests");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "{} {} ORDER BY apply_date DESC, id DESC LIMIT ? OFFSET ?",
        SELECT_LEAVE, where_clause
    );

    let mut data_query = sqlx::query_as::<_, LeaveApplication>(&data_sql);
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(page.per_page).bind(page.offset);

    let leaves = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch leave requests");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(Paginated::new(leaves, page, total)))
}

/// Own leave requests for a year
#[utoipa::path(
    get,
    path = "/api/leave/mine",
    params(YearQuery),
    responses(
        (status = 200, description = "Leave requests of the caller", body = [LeaveApplication])
    ),
    tag = "Leave",
    security(("bearer_auth" = []))
)]
pub async fn my_leaves(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<YearQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;
    let year = query.year.unwrap_or_else(|| Local::now().year());

    Ok(HttpResponse::Ok().json(leaves_by_email(pool.get_ref(), employee_id, year).await))
}

/// Leave requests filed under the employee's email in `year`. Any failure
/// yields an empty list.
async fn leaves_by_email(pool: &MySqlPool, employee_id: u64, year: i32) -> Vec<LeaveApplication> {
    let email = match sqlx::query_scalar::<_, String>("SELECT email FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_one(pool)
        .await
    {
        Ok(email) => email,
        Err(e) => {
            warn!(error = %e, employee_id, "No email for leave lookup");
            return Vec::new();
        }
    };

    let sql = format!(
        "{} WHERE email = ? AND YEAR(apply_date) = ? ORDER BY apply_date DESC",
        SELECT_LEAVE
    );

    sqlx::query_as::<_, LeaveApplication>(&sql)
        .bind(&email)
        .bind(year)
        .fetch_all(pool)
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, employee_id, year, "Leave lookup failed");
            Vec::new()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_payload_uses_lowercase_leave_types() {
        let payload: CreateLeave = serde_json::from_value(json!({
            "start_date": "2026-01-05",
            "end_date": "2026-01-07",
            "leave_type": "sick"
        }))
        .unwrap();
        assert_eq!(payload.leave_type, LeaveType::Sick);
        assert_eq!(leave_days(payload.start_date, payload.end_date), Ok(3));
    }

    #[test]
    fn status_filter_parses_case_insensitively() {
        assert_eq!("approved".parse::<HrStatus>(), Ok(HrStatus::Approved));
        assert!("archived".parse::<HrStatus>().is_err());
    }
}
