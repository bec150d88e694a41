use crate::{
    auth::auth::AuthUser,
    model::employee::{Employee, Gender, Language},
    utils::db_utils::{build_update_sql, execute_update},
    utils::pagination::{Page, Paginated},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{FromRow, MySqlPool};
use tracing::{debug, error, info};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub const EMPLOYEE_COLUMNS: &str = "e.id, e.employee_code, e.first_name, e.last_name, e.mobile, \
    e.email, e.address, e.emergency, e.gender, e.department_id, e.joined, e.language, e.bank, \
    e.account_number, e.salary, e.overtime_hourly_rate, e.photo";

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateEmployee {
    /// Generated when omitted
    #[schema(example = "emp482", nullable = true)]
    pub employee_code: Option<String>,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "+2348012345678")]
    pub mobile: String,
    #[schema(example = "john@email.com", format = "email")]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[schema(example = "08098765432")]
    pub emergency: String,
    pub gender: Gender,
    #[schema(example = 1, nullable = true)]
    pub department_id: Option<u64>,
    #[schema(example = "2026-01-01T09:00:00", value_type = Option<String>, format = "date-time")]
    pub joined: Option<NaiveDateTime>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub bank: String,
    #[serde(default)]
    pub account_number: String,
    #[schema(example = "250000.00", value_type = String)]
    pub salary: Decimal,
    #[schema(example = "1500.00", value_type = String)]
    pub overtime_hourly_rate: Decimal,
    #[schema(nullable = true)]
    pub photo: Option<String>,
}

/// Field checks the form layer used to do.
fn validate_employee_fields(
    first_name: Option<&str>,
    last_name: Option<&str>,
    email: Option<&str>,
    mobile: Option<&str>,
    money: &[Option<Decimal>],
) -> Result<(), &'static str> {
    if first_name.is_some_and(|v| v.trim().is_empty() || v.len() > 50) {
        return Err("first_name must be 1-50 characters");
    }
    if last_name.is_some_and(|v| v.trim().is_empty() || v.len() > 50) {
        return Err("last_name must be 1-50 characters");
    }
    if email.is_some_and(|v| !v.contains('@') || v.len() > 125) {
        return Err("email is not valid");
    }
    if mobile.is_some_and(|v| v.trim().is_empty() || v.len() > 15) {
        return Err("mobile must be 1-15 characters");
    }
    if money.iter().flatten().any(|v| v.is_sign_negative()) {
        return Err("salary and overtime rate cannot be negative");
    }
    Ok(())
}

impl CreateEmployee {
    fn validate(&self) -> Result<(), &'static str> {
        validate_employee_fields(
            Some(&self.first_name),
            Some(&self.last_name),
            Some(&self.email),
            Some(&self.mobile),
            &[Some(self.salary), Some(self.overtime_hourly_rate)],
        )
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
    /// Filter by department
    pub department_id: Option<u64>,
    /// Search by name or email
    pub search: Option<String>,
}

#[derive(Serialize, FromRow, ToSchema)]
pub struct EmployeeDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub employee: Employee,
    /// Department name
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
}

/// Only the fields present are written.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateEmployee {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<Language>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    #[schema(value_type = Option<String>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overtime_hourly_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl UpdateEmployee {
    fn validate(&self) -> Result<(), &'static str> {
        validate_employee_fields(
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.email.as_deref(),
            self.mobile.as_deref(),
            &[self.salary, self.overtime_hourly_rate],
        )
    }
}

pub fn generate_employee_code() -> String {
    format!("emp-{}", &Uuid::new_v4().to_string()[..8])
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = CreateEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Object, example = json!({
            "message": "Employee created successfully",
            "id": 1
        })),
        (status = 400, description = "Invalid field"),
        (status = 409, description = "Employee code already exists or department missing"),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "message": "Something went wrong, Contact with system admin"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if let Err(message) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    let code = payload
        .employee_code
        .clone()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(generate_employee_code);
    let joined = payload.joined.unwrap_or_else(|| Utc::now().naive_utc());

    let result = sqlx::query(
        r#"
        INSERT INTO employees
        (employee_code, first_name, last_name, mobile, email, address, emergency, gender,
         department_id, joined, language, bank, account_number, salary, overtime_hourly_rate, photo)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&code)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.mobile)
    .bind(&payload.email)
    .bind(&payload.address)
    .bind(&payload.emergency)
    .bind(payload.gender.as_ref())
    .bind(payload.department_id)
    .bind(joined)
    .bind(payload.language.as_ref())
    .bind(&payload.bank)
    .bind(&payload.account_number)
    .bind(payload.salary)
    .bind(payload.overtime_hourly_rate)
    .bind(&payload.photo)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => {
            info!(employee_id = res.last_insert_id(), %code, "Employee created");
            Ok(HttpResponse::Created().json(json!({
                "message": "Employee created successfully",
                "id": res.last_insert_id()
            })))
        }
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
            Ok(HttpResponse::Conflict().json(json!({
                "message": "Employee code already exists or department does not exist"
            })))
        }
        Err(e) => {
            error!(error = %e, "Failed to Create Employee");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message":"Something went wrong, Contact with system admin"
            })))
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Paginated employee list", body = EmployeePage)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_employees(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<EmployeeQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let page = Page::new(query.page, query.per_page, 10);

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut bindings: Vec<String> = Vec::new();
    let mut department = None;

    if let Some(department_id) = query.department_id {
        conditions.push("e.department_id = ?");
        department = Some(department_id);
    }

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        conditions.push("(e.first_name LIKE ? OR e.last_name LIKE ? OR e.email LIKE ?)");
        let like = format!("%{}%", search.trim());
        bindings.push(like.clone());
        bindings.push(like.clone());
        bindings.push(like);
    }

    let where_clause = if conditions.is_empty() {
        "".to_string()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM employees e {}", where_clause);
    debug!(sql = %count_sql, ?department, bindings = ?bindings, "Counting employees");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(d) = department {
        count_query = count_query.bind(d);
    }
    for b in &bindings {
        count_query = count_query.bind(b);
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %count_sql, "Failed to count employees");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT {} FROM employees e {} ORDER BY e.id DESC LIMIT ? OFFSET ?",
        EMPLOYEE_COLUMNS, where_clause
    );
    debug!(sql = %data_sql, page = page.page, per_page = page.per_page, "Fetching employees");

    let mut data_query = sqlx::query_as::<_, Employee>(&data_sql);
    if let Some(d) = department {
        data_query = data_query.bind(d);
    }
    for b in &bindings {
        data_query = data_query.bind(b);
    }
    data_query = data_query.bind(page.per_page).bind(page.offset);

    let employees = data_query.fetch_all(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, sql = %data_sql, "Failed to fetch employees");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(Paginated::new(employees, page, total)))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    request_body = UpdateEmployee,
    responses(
        (status = 200, description = "Employee updated successfully", body = Object, example = json!({
            "message": "Employee updated successfully"
        })),
        (status = 400, description = "No or invalid fields"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateEmployee>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    if let Err(message) = body.validate() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    let fields = serde_json::to_value(&*body).map_err(ErrorInternalServerError)?;
    let update = build_update_sql("employees", &fields, "id", employee_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, employee_id, "Failed to update employee");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Employee not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee updated successfully"
    })))
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error", body = Object)
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let employee_id = path.into_inner();

    let result = sqlx::query(r#"DELETE FROM employees WHERE id = ?"#)
        .bind(employee_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Employee not found"
                })));
            }

            info!(employee_id, by = auth.user_id, "Employee deleted");
            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }

        Err(e) => {
            error!(error = %e, employee_id, "Failed to delete employee");

            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// Get Employee by ID, with the department name
#[utoipa::path(
    get,
    path = "/api/employee/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = EmployeeDetail),
        (status = 403, description = "Not HR and not your own record"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "message": "Employee not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id: u64 = path.into_inner();

    if !auth.is_hr_or_admin() && auth.employee_id != Some(employee_id) {
        return Err(actix_web::error::ErrorForbidden("HR/Admin only"));
    }

    let sql = format!(
        r#"
        SELECT {}, d.name AS department
        FROM employees e
        LEFT JOIN departments d ON d.id = e.department_id
        WHERE e.id = ?
        "#,
        EMPLOYEE_COLUMNS
    );

    let employee = sqlx::query_as::<_, EmployeeDetail>(&sql)
        .bind(employee_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, employee_id, "Failed to fetch employee");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    match employee {
        Some(emp) => Ok(HttpResponse::Ok().json(emp)),
        None => Ok(HttpResponse::NotFound().json(serde_json::json!({
            "message": "Employee not found"
        }))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create() -> CreateEmployee {
        serde_json::from_value(json!({
            "first_name": "Ada",
            "last_name": "Obi",
            "mobile": "08012345678",
            "email": "ada@company.com",
            "emergency": "08098765432",
            "gender": "female",
            "salary": "250000.00",
            "overtime_hourly_rate": "1500"
        }))
        .unwrap()
    }

    #[test]
    fn create_defaults() {
        let payload = create();
        assert_eq!(payload.language, Language::English);
        assert_eq!(payload.address, "");
        assert!(payload.employee_code.is_none());
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn create_rejects_bad_email_and_negative_rate() {
        let mut payload = create();
        payload.email = "ada.company.com".into();
        assert_eq!(payload.validate(), Err("email is not valid"));

        let mut payload = create();
        payload.overtime_hourly_rate = Decimal::from(-1);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn update_serialises_only_present_fields() {
        let update: UpdateEmployee = serde_json::from_value(json!({
            "department_id": 4,
            "gender": "other"
        }))
        .unwrap();
        let fields = serde_json::to_value(&update).unwrap();
        assert_eq!(fields, json!({ "department_id": 4, "gender": "other" }));
    }

    #[test]
    fn update_rejects_unknown_columns() {
        let parsed = serde_json::from_value::<UpdateEmployee>(json!({ "id": 1 }));
        assert!(parsed.is_err());
    }

    #[test]
    fn generated_codes_are_prefixed() {
        let code = generate_employee_code();
        assert!(code.starts_with("emp-"));
        assert_eq!(code.len(), 12);
    }
}
