use actix_web::{HttpResponse, Responder, web};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, MySqlPool};
use utoipa::{IntoParams, ToSchema};

use crate::api::overtime::approved_overtime_pay;
use crate::auth::auth::AuthUser;
use crate::model::payroll::{Payroll, net_salary};
use crate::utils::holiday_cache::HolidayCalendar;
use crate::utils::pagination::{Page, Paginated};

const SELECT_PAYROLL: &str = r#"
    SELECT id, employee_id, month, base_salary, overtime_pay, bonus, deductions, net_salary
    FROM payroll
"#;

#[derive(Deserialize, ToSchema)]
pub struct CreatePayroll {
    #[schema(example = 1001)]
    pub employee_id: u64,

    /// Any day in the month; stored as the first of the month
    #[schema(example = "2026-01-01", value_type = String, format = "date")]
    pub month: NaiveDate,

    /// Defaults to the employee's salary
    #[schema(example = "50000.00", value_type = Option<String>)]
    pub base_salary: Option<Decimal>,

    #[schema(example = "5000.00", value_type = String)]
    #[serde(default)]
    pub bonus: Decimal,

    #[schema(example = "2000.00", value_type = String)]
    #[serde(default)]
    pub deductions: Decimal,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdatePayroll {
    #[schema(example = "52000.00", value_type = Option<String>)]
    pub base_salary: Option<Decimal>,

    #[schema(example = "6000.00", value_type = Option<String>)]
    pub bonus: Option<Decimal>,

    #[schema(example = "2500.00", value_type = Option<String>)]
    pub deductions: Option<Decimal>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    #[schema(example = 1)]
    pub page: Option<u32>,

    #[schema(example = 10)]
    pub per_page: Option<u32>,

    #[schema(example = 1001)]
    pub employee_id: Option<u64>,
}

/// Pay details of one employee.
#[derive(Serialize, FromRow, ToSchema)]
pub struct StaffPay {
    pub id: u64,
    pub employee_code: String,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(nullable = true)]
    pub department: Option<String>,
    #[schema(value_type = String)]
    pub salary: Decimal,
    #[schema(value_type = String)]
    pub overtime_hourly_rate: Decimal,
    pub bank: String,
    pub account_number: String,
}

fn month_bounds(day: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let first = day.with_day(1)?;
    let next = first.checked_add_months(Months::new(1))?;
    Some((first, next))
}

fn money_ok(values: &[Decimal]) -> bool {
    values.iter().all(|v| !v.is_sign_negative())
}

fn db_error(e: sqlx::Error) -> actix_web::Error {
    tracing::error!(error = %e, "Payroll query failed");
    actix_web::error::ErrorInternalServerError("Internal Server Error")
}

#[utoipa::path(
    post,
    path = "/api/payroll",
    request_body = CreatePayroll,
    responses(
        (status = 201, description = "Payroll created", body = Payroll),
        (status = 400, description = "Negative amount"),
        (status = 401),
        (status = 403),
        (status = 404, description = "Employee not found"),
        (status = 409, description = "Payroll already exists for this month")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn create_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    calendar: web::Data<HolidayCalendar>,
    payload: web::Json<CreatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let employee_id = payload.employee_id;

    let Some((month, next_month)) = month_bounds(payload.month) else {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Invalid month"
        })));
    };

    let salary = sqlx::query_scalar::<_, Decimal>("SELECT salary FROM employees WHERE id = ?")
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(db_error)?;

    let Some(salary) = salary else {
        return Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Employee not found"
        })));
    };

    let base_salary = payload.base_salary.unwrap_or(salary);
    if !money_ok(&[base_salary, payload.bonus, payload.deductions]) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Amounts cannot be negative"
        })));
    }

    let overtime_pay =
        approved_overtime_pay(pool.get_ref(), &calendar, employee_id, month, next_month).await?;
    let net = net_salary(base_salary, overtime_pay, payload.bonus, payload.deductions);

    let result = sqlx::query(
        r#"
        INSERT INTO payroll
        (employee_id, month, base_salary, overtime_pay, bonus, deductions, net_salary)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(month)
    .bind(base_salary)
    .bind(overtime_pay)
    .bind(payload.bonus)
    .bind(payload.deductions)
    .bind(net)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            tracing::info!(employee_id, %month, %net, "Payroll created");
            Ok(HttpResponse::Created().json(Payroll {
                id: res.last_insert_id(),
                employee_id,
                month,
                base_salary,
                overtime_pay,
                bonus: payload.bonus,
                deductions: payload.deductions,
                net_salary: net,
            }))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
            Ok(HttpResponse::Conflict().json(serde_json::json!({
                "message": "Payroll already exists for this month"
            })))
        }
        Err(e) => Err(db_error(e)),
    }
}

#[utoipa::path(
    put,
    path = "/api/payroll/{payroll_id}",
    request_body = UpdatePayroll,
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, description = "Payroll updated", body = Payroll),
        (status = 400, description = "Negative amount"),
        (status = 404, description = "Payroll not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn update_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdatePayroll>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payroll_id = path.into_inner();

    let sql = format!("{} WHERE id = ?", SELECT_PAYROLL);
    let current = sqlx::query_as::<_, Payroll>(&sql)
        .bind(payroll_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, payroll_id, "Failed to fetch payroll");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    let mut payroll = match current {
        Some(c) => c,
        None => {
            return Ok(HttpResponse::NotFound().json(serde_json::json!({
                "message": "Payroll record not found"
            })));
        }
    };

    payroll.base_salary = body.base_salary.unwrap_or(payroll.base_salary);
    payroll.bonus = body.bonus.unwrap_or(payroll.bonus);
    payroll.deductions = body.deductions.unwrap_or(payroll.deductions);

    if !money_ok(&[payroll.base_salary, payroll.bonus, payroll.deductions]) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "message": "Amounts cannot be negative"
        })));
    }

    payroll.net_salary = net_salary(
        payroll.base_salary,
        payroll.overtime_pay,
        payroll.bonus,
        payroll.deductions,
    );

    sqlx::query(
        r#"
        UPDATE payroll
        SET base_salary = ?, bonus = ?, deductions = ?, net_salary = ?
        WHERE id = ?
        "#,
    )
    .bind(payroll.base_salary)
    .bind(payroll.bonus)
    .bind(payroll.deductions)
    .bind(payroll.net_salary)
    .bind(payroll_id)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        tracing::error!(error = %e, payroll_id, "Failed to update payroll");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    Ok(HttpResponse::Ok().json(payroll))
}

#[utoipa::path(
    get,
    path = "/api/payroll/{payroll_id}",
    params(
        ("payroll_id", description = "Payroll ID")
    ),
    responses(
        (status = 200, body = Payroll),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn get_payroll(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payroll_id = path.into_inner();

    let sql = format!("{} WHERE id = ?", SELECT_PAYROLL);
    let payroll = sqlx::query_as::<_, Payroll>(&sql)
        .bind(payroll_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, payroll_id, "Failed to fetch payroll");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match payroll {
        Some(p) => Ok(HttpResponse::Ok().json(p)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Payroll not found"
        }))),
    }
}

#[utoipa::path(
    get,
    path = "/api/payroll",
    params(PayrollQuery),
    responses(
        (status = 200, body = PayrollPage)
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn list_payrolls(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PayrollQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let page = Page::new(query.page, query.per_page, 10);

    let (total, data) = match query.employee_id {
        Some(employee_id) => {
            let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payroll WHERE employee_id = ?")
                .bind(employee_id)
                .fetch_one(pool.get_ref())
                .await
                .map_err(db_error)?;

            let sql = format!("{} WHERE employee_id = ? ORDER BY month DESC LIMIT ? OFFSET ?", SELECT_PAYROLL);
            let data = sqlx::query_as::<_, Payroll>(&sql)
                .bind(employee_id)
                .bind(page.per_page)
                .bind(page.offset)
                .fetch_all(pool.get_ref())
                .await
                .map_err(db_error)?;
            (total, data)
        }
        None => {
            let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payroll")
                .fetch_one(pool.get_ref())
                .await
                .map_err(db_error)?;

            let sql = format!("{} ORDER BY month DESC, id DESC LIMIT ? OFFSET ?", SELECT_PAYROLL);
            let data = sqlx::query_as::<_, Payroll>(&sql)
                .bind(page.per_page)
                .bind(page.offset)
                .fetch_all(pool.get_ref())
                .await
                .map_err(db_error)?;
            (total, data)
        }
    };

    Ok(HttpResponse::Ok().json(Paginated::new(data, page, total)))
}

/// Salary and bank details of every employee
#[utoipa::path(
    get,
    path = "/api/payroll/staff",
    responses(
        (status = 200, body = [StaffPay])
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
pub async fn staff_pay(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let staff = sqlx::query_as::<_, StaffPay>(
        r#"
        SELECT e.id, e.employee_code, CONCAT(e.first_name, ' ', e.last_name) AS name,
               d.name AS department, e.salary, e.overtime_hourly_rate, e.bank, e.account_number
        FROM employees e
        LEFT JOIN departments d ON d.id = e.department_id
        ORDER BY e.first_name, e.last_name
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(db_error)?;

    Ok(HttpResponse::Ok().json(staff))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_is_normalised_to_its_first_day() {
        let (first, next) = month_bounds(NaiveDate::from_ymd_opt(2026, 12, 17).unwrap()).unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2026, 12, 1).unwrap());
        assert_eq!(next, NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
    }

    #[test]
    fn negative_amounts_are_rejected() {
        assert!(money_ok(&[Decimal::ZERO, Decimal::from(10)]));
        assert!(!money_ok(&[Decimal::from(-1)]));
    }

    #[test]
    fn create_defaults_bonus_and_deductions() {
        let payload: CreatePayroll =
            serde_json::from_value(serde_json::json!({ "employee_id": 4, "month": "2026-02-10" }))
                .unwrap();
        assert!(payload.base_salary.is_none());
        assert_eq!(payload.bonus, Decimal::ZERO);
        assert_eq!(payload.deductions, Decimal::ZERO);
    }
}
