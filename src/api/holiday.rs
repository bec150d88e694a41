use crate::{auth::auth::AuthUser, model::holiday::Holiday, utils::holiday_cache::HolidayCalendar};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct HolidayPayload {
    #[schema(example = "2026-12-25", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "Christmas Day")]
    pub name: String,
}

impl HolidayPayload {
    fn validate(&self) -> Result<(), &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("name is required");
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err("name is too long");
        }
        Ok(())
    }
}

// holidays.name is VARCHAR(50)
const MAX_NAME_LEN: usize = 50;

#[derive(Debug, Deserialize, IntoParams)]
pub struct HolidayQuery {
    /// Only holidays in this year
    pub year: Option<i32>,
}

fn db_error(e: sqlx::Error) -> actix_web::Error {
    error!(error = %e, "Holiday query failed");
    ErrorInternalServerError("Internal Server Error")
}

async fn fetch_holiday(pool: &MySqlPool, holiday_id: u64) -> actix_web::Result<Option<Holiday>> {
    sqlx::query_as::<_, Holiday>("SELECT id, date, name FROM holidays WHERE id = ?")
        .bind(holiday_id)
        .fetch_optional(pool)
        .await
        .map_err(db_error)
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": "Holiday not found" }))
}

#[utoipa::path(
    post,
    path = "/api/holiday",
    request_body = HolidayPayload,
    responses(
        (status = 201, description = "Holiday created"),
        (status = 400, description = "Name missing")
    ),
    tag = "Holiday",
    security(("bearer_auth" = []))
)]
pub async fn create_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<HolidayCalendar>,
    payload: web::Json<HolidayPayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if let Err(message) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    let res = sqlx::query("INSERT INTO holidays (date, name) VALUES (?, ?)")
        .bind(payload.date)
        .bind(payload.name.trim())
        .execute(pool.get_ref())
        .await
        .map_err(db_error)?;

    // Drop any miss cached by a lookup racing the insert
    calendar.invalidate(payload.date).await;
    info!(date = %payload.date, "Holiday created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Holiday created successfully",
        "id": res.last_insert_id()
    })))
}

#[utoipa::path(
    get,
    path = "/api/holiday",
    params(HolidayQuery),
    responses(
        (status = 200, description = "Holidays by date", body = [Holiday])
    ),
    tag = "Holiday",
    security(("bearer_auth" = []))
)]
pub async fn list_holidays(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<HolidayQuery>,
) -> actix_web::Result<impl Responder> {
    let holidays = match query.year {
        Some(year) => {
            sqlx::query_as::<_, Holiday>(
                "SELECT id, date, name FROM holidays WHERE YEAR(date) = ? ORDER BY date",
            )
            .bind(year)
            .fetch_all(pool.get_ref())
            .await
        }
        None => {
            sqlx::query_as::<_, Holiday>("SELECT id, date, name FROM holidays ORDER BY date")
                .fetch_all(pool.get_ref())
                .await
        }
    }
    .map_err(db_error)?;

    Ok(HttpResponse::Ok().json(holidays))
}

#[utoipa::path(
    get,
    path = "/api/holiday/{holiday_id}",
    params(("holiday_id" = u64, Path, description = "Holiday ID")),
    responses(
        (status = 200, description = "Holiday", body = Holiday),
        (status = 404, description = "Holiday not found")
    ),
    tag = "Holiday",
    security(("bearer_auth" = []))
)]
pub async fn get_holiday(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    match fetch_holiday(pool.get_ref(), path.into_inner()).await? {
        Some(h) => Ok(HttpResponse::Ok().json(h)),
        None => Ok(not_found()),
    }
}

/// Moving a holiday invalidates both the old and the new date.
#[utoipa::path(
    put,
    path = "/api/holiday/{holiday_id}",
    params(("holiday_id" = u64, Path, description = "Holiday ID")),
    request_body = HolidayPayload,
    responses(
        (status = 200, description = "Holiday updated"),
        (status = 400, description = "Name missing"),
        (status = 404, description = "Holiday not found")
    ),
    tag = "Holiday",
    security(("bearer_auth" = []))
)]
pub async fn update_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<HolidayCalendar>,
    path: web::Path<u64>,
    payload: web::Json<HolidayPayload>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if let Err(message) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    let holiday_id = path.into_inner();

    let Some(existing) = fetch_holiday(pool.get_ref(), holiday_id).await? else {
        return Ok(not_found());
    };

    sqlx::query("UPDATE holidays SET date = ?, name = ? WHERE id = ?")
        .bind(payload.date)
        .bind(payload.name.trim())
        .bind(holiday_id)
        .execute(pool.get_ref())
        .await
        .map_err(db_error)?;

    // Another row may still hold the old date
    calendar.invalidate(existing.date).await;
    calendar.invalidate(payload.date).await;

    info!(holiday_id, from = %existing.date, to = %payload.date, "Holiday updated");

    Ok(HttpResponse::Ok().json(json!({ "message": "Holiday updated successfully" })))
}

#[utoipa::path(
    delete,
    path = "/api/holiday/{holiday_id}",
    params(("holiday_id" = u64, Path, description = "Holiday ID")),
    responses(
        (status = 200, description = "Holiday deleted"),
        (status = 404, description = "Holiday not found")
    ),
    tag = "Holiday",
    security(("bearer_auth" = []))
)]
pub async fn delete_holiday(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<HolidayCalendar>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let holiday_id = path.into_inner();

    let Some(existing) = fetch_holiday(pool.get_ref(), holiday_id).await? else {
        return Ok(not_found());
    };

    sqlx::query("DELETE FROM holidays WHERE id = ?")
        .bind(holiday_id)
        .execute(pool.get_ref())
        .await
        .map_err(db_error)?;

    calendar.invalidate(existing.date).await;
    info!(holiday_id, date = %existing.date, "Holiday deleted");

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str) -> HolidayPayload {
        HolidayPayload {
            date: NaiveDate::from_ymd_opt(2026, 12, 25).unwrap(),
            name: name.to_string(),
        }
    }

    #[test]
    fn blank_names_are_rejected() {
        assert_eq!(payload("").validate(), Err("name is required"));
        assert_eq!(payload("   ").validate(), Err("name is required"));
    }

    #[test]
    fn long_names_are_rejected() {
        assert_eq!(payload(&"x".repeat(51)).validate(), Err("name is too long"));
        assert!(payload(&"x".repeat(50)).validate().is_ok());
    }

    #[test]
    fn named_holiday_is_valid() {
        assert!(payload(" Christmas Day ").validate().is_ok());
    }
}
