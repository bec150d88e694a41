use crate::{
    api::employee::EMPLOYEE_COLUMNS,
    auth::auth::AuthUser,
    model::{
        department::{DEFAULT_HISTORY, Department},
        employee::Employee,
    },
    utils::db_utils::{build_update_sql, execute_update},
    utils::pagination::{Page, PageQuery, Paginated},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CreateDepartment {
    #[schema(example = "Engineering")]
    pub name: String,
    /// Defaults to "No History"
    #[schema(nullable = true)]
    pub history: Option<String>,
}

#[derive(Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateDepartment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DepartmentDetail {
    #[serde(flatten)]
    pub department: Department,
    pub employees: Vec<Employee>,
}

fn valid_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && name.len() <= 100
}

#[utoipa::path(
    post,
    path = "/api/department",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created", body = Object, example = json!({
            "message": "Department created successfully",
            "id": 1
        })),
        (status = 400, description = "Name missing or too long"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn create_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateDepartment>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if !valid_name(&payload.name) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "name must be 1-100 characters"
        })));
    }

    let history = payload
        .history
        .as_deref()
        .filter(|h| !h.trim().is_empty())
        .unwrap_or(DEFAULT_HISTORY);

    let res = sqlx::query("INSERT INTO departments (name, history) VALUES (?, ?)")
        .bind(payload.name.trim())
        .bind(history)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to create department");
            ErrorInternalServerError("Internal Server Error")
        })?;

    info!(department_id = res.last_insert_id(), "Department created");

    Ok(HttpResponse::Created().json(json!({
        "message": "Department created successfully",
        "id": res.last_insert_id()
    })))
}

#[utoipa::path(
    get,
    path = "/api/department",
    params(PageQuery),
    responses(
        (status = 200, description = "Departments ordered by name", body = DepartmentPage)
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn list_departments(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<PageQuery>,
) -> actix_web::Result<impl Responder> {
    let page = Page::new(query.page, query.per_page, 20);

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM departments")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to count departments");
            ErrorInternalServerError("Database error")
        })?;

    let departments = sqlx::query_as::<_, Department>(
        "SELECT id, name, history FROM departments ORDER BY name ASC LIMIT ? OFFSET ?",
    )
    .bind(page.per_page)
    .bind(page.offset)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch departments");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(Paginated::new(departments, page, total)))
}

/// Department with the employees assigned to it.
#[utoipa::path(
    get,
    path = "/api/department/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department found", body = DepartmentDetail),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn get_department(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let department_id = path.into_inner();

    let department = sqlx::query_as::<_, Department>(
        "SELECT id, name, history FROM departments WHERE id = ?",
    )
    .bind(department_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, department_id, "Failed to fetch department");
        ErrorInternalServerError("Internal Server Error")
    })?;

    let Some(department) = department else {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Department not found"
        })));
    };

    let sql = format!(
        "SELECT {} FROM employees e WHERE e.department_id = ? ORDER BY e.first_name, e.last_name",
        EMPLOYEE_COLUMNS
    );
    let employees = sqlx::query_as::<_, Employee>(&sql)
        .bind(department_id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, department_id, "Failed to fetch department employees");
            ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(DepartmentDetail {
        department,
        employees,
    }))
}

#[utoipa::path(
    put,
    path = "/api/department/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    request_body = UpdateDepartment,
    responses(
        (status = 200, description = "Department updated"),
        (status = 400, description = "No or invalid fields"),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn update_department(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateDepartment>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let department_id = path.into_inner();

    if body.name.as_deref().is_some_and(|n| !valid_name(n)) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "name must be 1-100 characters"
        })));
    }

    let fields = serde_json::to_value(&*body).map_err(ErrorInternalServerError)?;
    let update = build_update_sql("departments", &fields, "id", department_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(|e| {
        error!(error = %e, department_id, "Failed to update department");
        ErrorInternalServerError("Internal Server Error")
    })?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().json(json!({
            "message": "Department not found"
        })));
    }

    Ok(HttpResponse::Ok().json(json!({
        "message": "Department updated successfully"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_bounded() {
        assert!(valid_name("Finance"));
        assert!(!valid_name("   "));
        assert!(!valid_name(&"x".repeat(101)));
    }

    #[test]
    fn partial_update_writes_only_given_columns() {
        let body: UpdateDepartment = serde_json::from_value(json!({ "history": "Merged" })).unwrap();
        let update = build_update_sql("departments", &serde_json::to_value(&body).unwrap(), "id", 3).unwrap();
        assert_eq!(update.sql, "UPDATE departments SET history = ? WHERE id = ?");
    }
}
