use crate::{api::employee::EMPLOYEE_COLUMNS, auth::auth::AuthUser, model::employee::Employee};
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use sqlx::MySqlPool;
use utoipa::ToSchema;

const RECENT_EMPLOYEES: u32 = 5;

#[derive(Serialize, ToSchema)]
pub struct Dashboard {
    #[schema(example = 42)]
    pub employees: i64,
    #[schema(example = 6)]
    pub departments: i64,
    #[schema(example = 30)]
    pub users: i64,
    /// Most recently added employees
    pub recent_employees: Vec<Employee>,
}

async fn count(pool: &MySqlPool, table: &str) -> actix_web::Result<i64> {
    sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, table, "Dashboard count failed");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })
}

#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses(
        (status = 200, description = "Headline counts", body = Dashboard),
        (status = 403, description = "HR/Admin only")
    ),
    tag = "Dashboard",
    security(("bearer_auth" = []))
)]
pub async fn dashboard(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let pool = pool.get_ref();

    let sql = format!(
        "SELECT {} FROM employees e ORDER BY e.id DESC LIMIT ?",
        EMPLOYEE_COLUMNS
    );
    let recent_employees = sqlx::query_as::<_, Employee>(&sql)
        .bind(RECENT_EMPLOYEES)
        .fetch_all(pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to fetch recent employees");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(Dashboard {
        employees: count(pool, "employees").await?,
        departments: count(pool, "departments").await?,
        users: count(pool, "users").await?,
        recent_employees,
    }))
}
