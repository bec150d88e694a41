use crate::{
    auth::auth::AuthUser,
    model::attendance::{Attendance, AttendanceStatus},
};
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySqlPool};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = 12)]
    pub employee_id: u64,
    #[schema(example = "ABSENT")]
    pub status: AttendanceStatus,
}

/// Today's attendance row with the employee's name.
#[derive(Serialize, FromRow, ToSchema)]
pub struct PresentStaff {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub attendance: Attendance,
    #[schema(example = "Ada Obi")]
    pub employee_name: String,
}

fn today() -> (NaiveDate, NaiveTime) {
    let now = Local::now().naive_local();
    (now.date(), now.time())
}

async fn record_attendance(
    pool: &MySqlPool,
    employee_id: u64,
    status: AttendanceStatus,
) -> Result<bool, sqlx::Error> {
    let (date, time) = today();

    let result = sqlx::query(
        r#"
        INSERT INTO attendance (employee_id, date, first_in, status)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(date)
    .bind(time)
    .bind(status.as_ref())
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(true),
        // One row per employee per day
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => Ok(false),
        Err(e) => Err(e),
    }
}

async fn record_check_out(pool: &MySqlPool, employee_id: u64) -> Result<u64, sqlx::Error> {
    let (date, time) = today();

    let result = sqlx::query(
        r#"
        UPDATE attendance
        SET last_out = ?
        WHERE employee_id = ?
        AND date = ?
        AND status = 'PRESENT'
        AND last_out IS NULL
        "#,
    )
    .bind(time)
    .bind(employee_id)
    .bind(date)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 200, description = "Checked in successfully", body = Object, example = json!({
            "message": "Checked in successfully"
        })),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "message": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;

    let inserted = record_attendance(pool.get_ref(), employee_id, AttendanceStatus::Present)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Check-in failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if !inserted {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Already checked in today"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked in successfully"
    })))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully"
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "message": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let employee_id = auth.employee_id()?;

    let affected = record_check_out(pool.get_ref(), employee_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Check-out failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if affected == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No active check-in found for today"
        })));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully"
    })))
}

/// Check out a present staff member on their behalf (HR)
#[utoipa::path(
    post,
    path = "/api/attendance/{employee_id}/check-out",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Checked out successfully"),
        (status = 400, description = "No active check-in found for today"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let affected = record_check_out(pool.get_ref(), employee_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Check-out failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if affected == 0 {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "No active check-in found for today"
        })));
    }

    tracing::info!(employee_id, by = auth.user_id, "Checked out by HR");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Checked out successfully"
    })))
}

/// Record today's attendance for an employee (HR)
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 201, description = "Attendance recorded"),
        (status = 400, description = "Attendance already recorded for today"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = payload.employee_id;

    let inserted = record_attendance(pool.get_ref(), employee_id, payload.status)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to record attendance");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    if !inserted {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Attendance already recorded for today"
        })));
    }

    tracing::info!(employee_id, status = %payload.status, "Attendance recorded");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Attendance recorded"
    })))
}

/// Staff marked present today
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Present staff", body = [PresentStaff]),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn present_today(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let (date, _) = today();

    let staff = sqlx::query_as::<_, PresentStaff>(
        r#"
        SELECT a.id, a.employee_id, a.date, a.first_in, a.last_out, a.status,
               CONCAT(e.first_name, ' ', e.last_name) AS employee_name
        FROM attendance a
        JOIN employees e ON e.id = a.employee_id
        WHERE a.date = ? AND a.status = 'PRESENT'
        ORDER BY a.first_in
        "#,
    )
    .bind(date)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "Failed to fetch present staff");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(staff))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_status_uses_uppercase_names() {
        let mark: MarkAttendance =
            serde_json::from_value(serde_json::json!({ "employee_id": 3, "status": "UNAVAILABLE" }))
                .unwrap();
        assert_eq!(mark.status, AttendanceStatus::Unavailable);
        assert_eq!(mark.status.as_ref(), "UNAVAILABLE");
    }
}
