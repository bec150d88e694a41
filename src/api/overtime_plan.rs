use crate::{
    api::overtime::OvertimeDecision,
    auth::auth::AuthUser,
    model::overtime::{OvertimePlan, OvertimeSchedule, approval_column},
    workflow::{ApprovalStep, ChainStatus},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

const SELECT_PLAN: &str =
    "SELECT id, applicant_id, date, hr_approval, cfo_approval FROM overtime_plans";

#[derive(Debug, Deserialize, ToSchema)]
pub struct NewSchedule {
    #[schema(example = 12)]
    pub employee_id: u64,
    #[schema(example = "2026-02-07", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = 4)]
    pub number_of_hours: u32,
    #[schema(example = "Inventory count")]
    pub description: String,
}

impl NewSchedule {
    fn validate(&self) -> Result<(), &'static str> {
        if !(1..=24).contains(&self.number_of_hours) {
            return Err("number_of_hours must be between 1 and 24");
        }
        if self.description.trim().is_empty() {
            return Err("description is required");
        }
        Ok(())
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreatePlan {
    pub schedules: Vec<NewSchedule>,
}

#[derive(Serialize, ToSchema)]
pub struct PlanView {
    pub id: u64,
    pub applicant_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub approvals: Vec<ApprovalStep>,
    pub status: ChainStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedules: Option<Vec<OvertimeSchedule>>,
}

impl From<OvertimePlan> for PlanView {
    fn from(plan: OvertimePlan) -> Self {
        let chain = plan.chain();
        Self {
            id: plan.id,
            applicant_id: plan.applicant_id,
            date: plan.date,
            approvals: chain.steps().to_vec(),
            status: chain.status(),
            schedules: None,
        }
    }
}

fn db_error(e: sqlx::Error) -> actix_web::Error {
    error!(error = %e, "Overtime plan query failed");
    ErrorInternalServerError("Internal Server Error")
}

async fn fetch_plan(pool: &MySqlPool, plan_id: u64) -> actix_web::Result<Option<OvertimePlan>> {
    let sql = format!("{} WHERE id = ?", SELECT_PLAN);
    sqlx::query_as::<_, OvertimePlan>(&sql)
        .bind(plan_id)
        .fetch_optional(pool)
        .await
        .map_err(db_error)
}

async fn fetch_schedules(pool: &MySqlPool, plan_id: u64) -> actix_web::Result<Vec<OvertimeSchedule>> {
    sqlx::query_as::<_, OvertimeSchedule>(
        r#"
        SELECT id, overtime_plan_id, employee_id, date, number_of_hours, description
        FROM overtime_schedules
        WHERE overtime_plan_id = ?
        ORDER BY date, id
        "#,
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .map_err(db_error)
}

fn can_view(auth: &AuthUser, plan: &OvertimePlan) -> bool {
    auth.require_approver().is_ok() || auth.employee_id == Some(plan.applicant_id)
}

/// Submit an overtime plan
#[utoipa::path(
    post,
    path = "/api/overtime-plan",
    request_body = CreatePlan,
    responses(
        (status = 201, description = "Plan submitted", body = Object, example = json!({
            "message": "Overtime plan submitted",
            "id": 1
        })),
        (status = 400, description = "Invalid schedule entry")
    ),
    tag = "Overtime plan",
    security(("bearer_auth" = []))
)]
pub async fn create_plan(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreatePlan>,
) -> actix_web::Result<impl Responder> {
    let applicant_id = auth.employee_id()?;

    if payload.schedules.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "A plan needs at least one schedule entry"
        })));
    }
    if let Some(message) = payload.schedules.iter().find_map(|s| s.validate().err()) {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    let mut tx = pool.begin().await.map_err(db_error)?;

    let plan_id = sqlx::query("INSERT INTO overtime_plans (applicant_id, date) VALUES (?, ?)")
        .bind(applicant_id)
        .bind(Local::now().date_naive())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .last_insert_id();

    for schedule in &payload.schedules {
        sqlx::query(
            r#"
            INSERT INTO overtime_schedules
            (overtime_plan_id, employee_id, date, number_of_hours, description)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(plan_id)
        .bind(schedule.employee_id)
        .bind(schedule.date)
        .bind(schedule.number_of_hours)
        .bind(schedule.description.trim())
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;
    }

    tx.commit().await.map_err(db_error)?;

    info!(plan_id, applicant_id, entries = payload.schedules.len(), "Overtime plan submitted");

    Ok(HttpResponse::Created().json(json!({
        "message": "Overtime plan submitted",
        "id": plan_id
    })))
}

#[utoipa::path(
    get,
    path = "/api/overtime-plan",
    responses(
        (status = 200, description = "Plans visible to the caller", body = [PlanView])
    ),
    tag = "Overtime plan",
    security(("bearer_auth" = []))
)]
pub async fn list_plans(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let plans = if auth.require_approver().is_ok() {
        let sql = format!("{} ORDER BY date DESC, id DESC", SELECT_PLAN);
        sqlx::query_as::<_, OvertimePlan>(&sql)
            .fetch_all(pool.get_ref())
            .await
    } else {
        let sql = format!("{} WHERE applicant_id = ? ORDER BY date DESC, id DESC", SELECT_PLAN);
        sqlx::query_as::<_, OvertimePlan>(&sql)
            .bind(auth.employee_id()?)
            .fetch_all(pool.get_ref())
            .await
    }
    .map_err(db_error)?;

    let views: Vec<PlanView> = plans.into_iter().map(PlanView::from).collect();
    Ok(HttpResponse::Ok().json(views))
}

#[utoipa::path(
    get,
    path = "/api/overtime-plan/{plan_id}",
    params(("plan_id" = u64, Path, description = "Overtime plan ID")),
    responses(
        (status = 200, description = "Plan with its schedule", body = PlanView),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Plan not found")
    ),
    tag = "Overtime plan",
    security(("bearer_auth" = []))
)]
pub async fn get_plan(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let plan_id = path.into_inner();

    let Some(plan) = fetch_plan(pool.get_ref(), plan_id).await? else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Overtime plan not found" })));
    };
    if !can_view(&auth, &plan) {
        return Err(actix_web::error::ErrorForbidden("Not your overtime plan"));
    }

    let mut view = PlanView::from(plan);
    view.schedules = Some(fetch_schedules(pool.get_ref(), plan_id).await?);

    Ok(HttpResponse::Ok().json(view))
}

/// Add an entry to a plan that is still awaiting approval
#[utoipa::path(
    post,
    path = "/api/overtime-plan/{plan_id}/schedule",
    params(("plan_id" = u64, Path, description = "Overtime plan ID")),
    request_body = NewSchedule,
    responses(
        (status = 201, description = "Schedule entry added"),
        (status = 400, description = "Invalid entry"),
        (status = 404, description = "Plan not found"),
        (status = 409, description = "Plan already decided")
    ),
    tag = "Overtime plan",
    security(("bearer_auth" = []))
)]
pub async fn add_schedule(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<NewSchedule>,
) -> actix_web::Result<impl Responder> {
    let plan_id = path.into_inner();

    if let Err(message) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    let Some(plan) = fetch_plan(pool.get_ref(), plan_id).await? else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Overtime plan not found" })));
    };
    if !auth.is_hr_or_admin() && auth.employee_id != Some(plan.applicant_id) {
        return Err(actix_web::error::ErrorForbidden("Not your overtime plan"));
    }

    let status = plan.chain().status();
    if status != ChainStatus::Pending {
        return Err(crate::workflow::WorkflowError::ChainClosed(status).into());
    }

    let res = sqlx::query(
        r#"
        INSERT INTO overtime_schedules
        (overtime_plan_id, employee_id, date, number_of_hours, description)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(plan_id)
    .bind(payload.employee_id)
    .bind(payload.date)
    .bind(payload.number_of_hours)
    .bind(payload.description.trim())
    .execute(pool.get_ref())
    .await
    .map_err(db_error)?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Schedule entry added",
        "id": res.last_insert_id()
    })))
}

/// HR or CFO sign-off
#[utoipa::path(
    put,
    path = "/api/overtime-plan/{plan_id}/decision",
    params(("plan_id" = u64, Path, description = "Overtime plan ID")),
    request_body = OvertimeDecision,
    responses(
        (status = 200, description = "Decision recorded", body = PlanView),
        (status = 403, description = "Caller does not sign this plan"),
        (status = 404, description = "Plan not found"),
        (status = 409, description = "Already decided")
    ),
    tag = "Overtime plan",
    security(("bearer_auth" = []))
)]
pub async fn decide_plan(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<OvertimeDecision>,
) -> actix_web::Result<impl Responder> {
    let plan_id = path.into_inner();
    let step = auth.approver_step(body.as_role)?;

    let Some(plan) = fetch_plan(pool.get_ref(), plan_id).await? else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Overtime plan not found" })));
    };

    let mut chain = plan.chain();
    let decision = chain.record(step, body.verdict)?;

    let column = approval_column(step);
    let sql = format!(
        "UPDATE overtime_plans SET {col} = ? WHERE id = ? AND {col} = 'Pending' \
         AND hr_approval <> 'Rejected' AND cfo_approval <> 'Rejected'",
        col = column
    );
    let res = sqlx::query(&sql)
        .bind(decision.as_ref())
        .bind(plan_id)
        .execute(pool.get_ref())
        .await
        .map_err(db_error)?;

    if res.rows_affected() == 0 {
        return Ok(HttpResponse::Conflict().json(json!({
            "message": "Overtime plan was decided by someone else, reload and retry"
        })));
    }

    info!(plan_id, %step, %decision, by = auth.user_id, "Overtime plan step decided");

    let Some(plan) = fetch_plan(pool.get_ref(), plan_id).await? else {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Overtime plan not found" })));
    };
    Ok(HttpResponse::Ok().json(PlanView::from(plan)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::{ApproverRole, Decision};

    fn schedule(hours: u32) -> NewSchedule {
        NewSchedule {
            employee_id: 4,
            date: NaiveDate::from_ymd_opt(2026, 2, 7).unwrap(),
            number_of_hours: hours,
            description: "Stock take".into(),
        }
    }

    #[test]
    fn schedule_hours_must_be_positive_and_within_a_day() {
        assert!(schedule(1).validate().is_ok());
        assert!(schedule(24).validate().is_ok());
        assert!(schedule(0).validate().is_err());
        assert!(schedule(25).validate().is_err());
    }

    #[test]
    fn view_reflects_two_step_chain() {
        let plan = OvertimePlan {
            id: 3,
            applicant_id: 9,
            date: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
            hr_approval: Decision::Approved,
            cfo_approval: Decision::Pending,
        };
        let view = PlanView::from(plan);
        assert_eq!(view.status, ChainStatus::Pending);
        assert_eq!(view.approvals.len(), 2);
        assert_eq!(view.approvals[1].role, ApproverRole::Cfo);
        assert!(view.schedules.is_none());
    }
}
