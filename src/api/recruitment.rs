//! Walk-in candidates, job postings and applications.
//!
//! The careers handlers are public; everything else is HR only.

use crate::{
    auth::auth::AuthUser,
    model::recruitment::{JobAdvertisement, JobApplication, Recruitment, SELECT_JOB_AD},
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct CandidatePayload {
    #[schema(example = "Ada")]
    pub first_name: String,
    #[schema(example = "Obi")]
    pub last_name: String,
    #[schema(example = "Accountant")]
    pub position: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[schema(example = "08012345678")]
    pub phone: String,
    /// CV reference, job applications only
    #[schema(nullable = true)]
    pub cv: Option<String>,
}

impl CandidatePayload {
    fn validate(&self) -> Result<(), &'static str> {
        let required = [&self.first_name, &self.last_name, &self.position, &self.phone];
        if required.iter().any(|v| v.trim().is_empty()) {
            return Err("first_name, last_name, position and phone are required");
        }
        if !self.email.contains('@') {
            return Err("email is not valid");
        }
        Ok(())
    }
}

#[derive(Deserialize, ToSchema)]
pub struct CreateJobAd {
    /// Department offering the position
    #[schema(example = 2)]
    pub department_id: u64,
    #[schema(example = "BSc")]
    pub education: String,
    #[schema(example = 2)]
    pub vacancy: u32,
    #[schema(example = 3)]
    pub experience: u32,
    pub description: String,
    #[serde(default)]
    pub show_salary: bool,
    #[schema(example = "2026-03-31", value_type = String, format = "date")]
    pub deadline: NaiveDate,
}

#[derive(Deserialize, Serialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateJobAd {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacancy: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_salary: Option<bool>,
    #[schema(value_type = Option<String>, format = "date")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
}

fn db_error(e: sqlx::Error) -> actix_web::Error {
    error!(error = %e, "Recruitment query failed");
    ErrorInternalServerError("Internal Server Error")
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn fetch_job_ad(pool: &MySqlPool, job_ad_id: u64) -> actix_web::Result<Option<JobAdvertisement>> {
    let sql = format!("{} WHERE j.id = ?", SELECT_JOB_AD);
    sqlx::query_as::<_, JobAdvertisement>(&sql)
        .bind(job_ad_id)
        .fetch_optional(pool)
        .await
        .map_err(db_error)
}

fn job_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "message": "Job advertisement not found" }))
}

// ---------- public ----------

/// Walk-in recruitment form
#[utoipa::path(
    post,
    path = "/careers/walk-in",
    request_body = CandidatePayload,
    responses(
        (status = 201, description = "Candidate recorded"),
        (status = 400, description = "Missing or invalid field")
    ),
    tag = "Careers"
)]
pub async fn submit_walk_in(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CandidatePayload>,
) -> actix_web::Result<impl Responder> {
    if let Err(message) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    let res = sqlx::query(
        "INSERT INTO recruitments (first_name, last_name, position, email, phone) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(payload.position.trim())
    .bind(payload.email.trim())
    .bind(payload.phone.trim())
    .execute(pool.get_ref())
    .await
    .map_err(db_error)?;

    info!(candidate_id = res.last_insert_id(), "Walk-in candidate recorded");

    Ok(HttpResponse::Created().json(json!({
        "message": "Thank you, we will be in touch",
        "id": res.last_insert_id()
    })))
}

/// Postings still open for applications
#[utoipa::path(
    get,
    path = "/careers/jobs",
    responses(
        (status = 200, description = "Open job advertisements", body = [JobAdvertisement])
    ),
    tag = "Careers"
)]
pub async fn open_jobs(pool: web::Data<MySqlPool>) -> actix_web::Result<impl Responder> {
    let sql = format!("{} WHERE j.deadline >= ? ORDER BY j.deadline", SELECT_JOB_AD);
    let jobs = sqlx::query_as::<_, JobAdvertisement>(&sql)
        .bind(today())
        .fetch_all(pool.get_ref())
        .await
        .map_err(db_error)?;

    Ok(HttpResponse::Ok().json(jobs))
}

#[utoipa::path(
    get,
    path = "/careers/jobs/{job_ad_id}",
    params(("job_ad_id" = u64, Path, description = "Job advertisement ID")),
    responses(
        (status = 200, description = "Job advertisement", body = JobAdvertisement),
        (status = 404, description = "Not found or closed")
    ),
    tag = "Careers"
)]
pub async fn get_open_job(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    match fetch_job_ad(pool.get_ref(), path.into_inner()).await? {
        Some(job) if job.is_open(today()) => Ok(HttpResponse::Ok().json(job)),
        _ => Ok(job_not_found()),
    }
}

/// Apply for a posting before its deadline
#[utoipa::path(
    post,
    path = "/careers/jobs/{job_ad_id}/apply",
    params(("job_ad_id" = u64, Path, description = "Job advertisement ID")),
    request_body = CandidatePayload,
    responses(
        (status = 201, description = "Application received"),
        (status = 400, description = "Missing or invalid field, or deadline passed"),
        (status = 404, description = "Job advertisement not found")
    ),
    tag = "Careers"
)]
pub async fn apply_for_job(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    payload: web::Json<CandidatePayload>,
) -> actix_web::Result<impl Responder> {
    let job_ad_id = path.into_inner();

    if let Err(message) = payload.validate() {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": message })));
    }

    let Some(job) = fetch_job_ad(pool.get_ref(), job_ad_id).await? else {
        return Ok(job_not_found());
    };
    if !job.is_open(today()) {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "The application deadline has passed"
        })));
    }

    let res = sqlx::query(
        r#"
        INSERT INTO job_applications (job_ad_id, first_name, last_name, position, email, phone, cv)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(job_ad_id)
    .bind(payload.first_name.trim())
    .bind(payload.last_name.trim())
    .bind(payload.position.trim())
    .bind(payload.email.trim())
    .bind(payload.phone.trim())
    .bind(&payload.cv)
    .execute(pool.get_ref())
    .await
    .map_err(db_error)?;

    info!(job_ad_id, application_id = res.last_insert_id(), "Job application received");

    Ok(HttpResponse::Created().json(json!({
        "message": "Application received",
        "id": res.last_insert_id()
    })))
}

// ---------- HR ----------

#[utoipa::path(
    get,
    path = "/api/recruitment",
    responses((status = 200, description = "Walk-in candidates", body = [Recruitment])),
    tag = "Recruitment",
    security(("bearer_auth" = []))
)]
pub async fn list_candidates(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let candidates = sqlx::query_as::<_, Recruitment>(
        "SELECT id, first_name, last_name, position, email, phone FROM recruitments ORDER BY id DESC",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(db_error)?;

    Ok(HttpResponse::Ok().json(candidates))
}

#[utoipa::path(
    delete,
    path = "/api/recruitment/{candidate_id}",
    params(("candidate_id" = u64, Path, description = "Candidate ID")),
    responses(
        (status = 200, description = "Candidate deleted"),
        (status = 404, description = "Candidate not found")
    ),
    tag = "Recruitment",
    security(("bearer_auth" = []))
)]
pub async fn delete_candidate(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let res = sqlx::query("DELETE FROM recruitments WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await
        .map_err(db_error)?;

    if res.rows_affected() == 0 {
        return Ok(HttpResponse::NotFound().json(json!({ "message": "Candidate not found" })));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

#[utoipa::path(
    post,
    path = "/api/job-ad",
    request_body = CreateJobAd,
    responses(
        (status = 201, description = "Job advertisement created"),
        (status = 400, description = "Invalid field"),
        (status = 409, description = "Department does not exist")
    ),
    tag = "Recruitment",
    security(("bearer_auth" = []))
)]
pub async fn create_job_ad(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateJobAd>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if payload.vacancy == 0 {
        return Ok(HttpResponse::BadRequest().json(json!({ "message": "vacancy must be positive" })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO job_advertisements
        (department_id, education, vacancy, experience, post_date, description, show_salary, deadline)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.department_id)
    .bind(&payload.education)
    .bind(payload.vacancy)
    .bind(payload.experience)
    .bind(today())
    .bind(&payload.description)
    .bind(payload.show_salary)
    .bind(payload.deadline)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(res) => Ok(HttpResponse::Created().json(json!({
            "message": "Job advertisement created",
            "id": res.last_insert_id()
        }))),
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23000") => {
            Ok(HttpResponse::Conflict().json(json!({ "message": "Department does not exist" })))
        }
        Err(e) => Err(db_error(e)),
    }
}

#[utoipa::path(
    get,
    path = "/api/job-ad",
    responses((status = 200, description = "All job advertisements", body = [JobAdvertisement])),
    tag = "Recruitment",
    security(("bearer_auth" = []))
)]
pub async fn list_job_ads(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let sql = format!("{} ORDER BY j.post_date DESC, j.id DESC", SELECT_JOB_AD);
    let ads = sqlx::query_as::<_, JobAdvertisement>(&sql)
        .fetch_all(pool.get_ref())
        .await
        .map_err(db_error)?;

    Ok(HttpResponse::Ok().json(ads))
}

#[utoipa::path(
    get,
    path = "/api/job-ad/{job_ad_id}",
    params(("job_ad_id" = u64, Path, description = "Job advertisement ID")),
    responses(
        (status = 200, description = "Job advertisement", body = JobAdvertisement),
        (status = 404, description = "Job advertisement not found")
    ),
    tag = "Recruitment",
    security(("bearer_auth" = []))
)]
pub async fn get_job_ad(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    match fetch_job_ad(pool.get_ref(), path.into_inner()).await? {
        Some(job) => Ok(HttpResponse::Ok().json(job)),
        None => Ok(job_not_found()),
    }
}

#[utoipa::path(
    put,
    path = "/api/job-ad/{job_ad_id}",
    params(("job_ad_id" = u64, Path, description = "Job advertisement ID")),
    request_body = UpdateJobAd,
    responses(
        (status = 200, description = "Job advertisement updated"),
        (status = 404, description = "Job advertisement not found")
    ),
    tag = "Recruitment",
    security(("bearer_auth" = []))
)]
pub async fn update_job_ad(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateJobAd>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let job_ad_id = path.into_inner();

    let fields = serde_json::to_value(&*body).map_err(ErrorInternalServerError)?;
    let update = build_update_sql("job_advertisements", &fields, "id", job_ad_id)?;

    let affected = execute_update(pool.get_ref(), update).await.map_err(db_error)?;
    if affected == 0 {
        return Ok(job_not_found());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Job advertisement updated" })))
}

#[utoipa::path(
    delete,
    path = "/api/job-ad/{job_ad_id}",
    params(("job_ad_id" = u64, Path, description = "Job advertisement ID")),
    responses(
        (status = 200, description = "Job advertisement deleted"),
        (status = 404, description = "Job advertisement not found")
    ),
    tag = "Recruitment",
    security(("bearer_auth" = []))
)]
pub async fn delete_job_ad(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let res = sqlx::query("DELETE FROM job_advertisements WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await
        .map_err(db_error)?;

    if res.rows_affected() == 0 {
        return Ok(job_not_found());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully deleted" })))
}

#[utoipa::path(
    get,
    path = "/api/job-ad/{job_ad_id}/applications",
    params(("job_ad_id" = u64, Path, description = "Job advertisement ID")),
    responses(
        (status = 200, description = "Applications for the posting", body = [JobApplication])
    ),
    tag = "Recruitment",
    security(("bearer_auth" = []))
)]
pub async fn list_applications(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let applications = sqlx::query_as::<_, JobApplication>(
        r#"
        SELECT id, job_ad_id, first_name, last_name, position, email, phone, cv
        FROM job_applications
        WHERE job_ad_id = ?
        ORDER BY created_at DESC
        "#,
    )
    .bind(path.into_inner())
    .fetch_all(pool.get_ref())
    .await
    .map_err(db_error)?;

    Ok(HttpResponse::Ok().json(applications))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> CandidatePayload {
        CandidatePayload {
            first_name: "Ada".into(),
            last_name: "Obi".into(),
            position: "Accountant".into(),
            email: "ada@example.com".into(),
            phone: "08012345678".into(),
            cv: None,
        }
    }

    #[test]
    fn candidate_needs_contact_details() {
        assert!(candidate().validate().is_ok());

        let mut c = candidate();
        c.phone = " ".into();
        assert!(c.validate().is_err());

        let mut c = candidate();
        c.email = "ada".into();
        assert_eq!(c.validate(), Err("email is not valid"));
    }

    #[test]
    fn job_ad_update_skips_absent_fields() {
        let body: UpdateJobAd =
            serde_json::from_value(json!({ "deadline": "2026-04-30", "vacancy": 3 })).unwrap();
        let update = build_update_sql("job_advertisements", &serde_json::to_value(&body).unwrap(), "id", 2)
            .unwrap();
        assert!(update.sql.contains("deadline = ?"));
        assert!(update.sql.contains("vacancy = ?"));
        assert!(!update.sql.contains("education"));
    }
}
