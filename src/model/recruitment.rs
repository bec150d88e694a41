use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Walk-in candidate submitted through the public recruitment form.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Recruitment {
    pub id: u64,
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
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct JobAdvertisement {
    pub id: u64,
    /// Department the position belongs to
    pub department_id: u64,
    #[schema(example = "Engineering")]
    pub position: String,
    #[schema(example = "BSc")]
    pub education: String,
    #[schema(example = 2)]
    pub vacancy: u32,
    /// Years of experience required
    #[schema(example = 3)]
    pub experience: u32,
    #[schema(value_type = String, format = "date")]
    pub post_date: NaiveDate,
    pub description: String,
    pub show_salary: bool,
    #[schema(value_type = String, format = "date")]
    pub deadline: NaiveDate,
    pub number_of_applications: i64,
}

impl JobAdvertisement {
    pub fn is_open(&self, today: NaiveDate) -> bool {
        today <= self.deadline
    }
}

pub const SELECT_JOB_AD: &str = r#"
    SELECT j.id, j.department_id, d.name AS position, j.education, j.vacancy,
           j.experience, j.post_date, j.description, j.show_salary, j.deadline,
           (SELECT COUNT(*) FROM job_applications a WHERE a.job_ad_id = j.id) AS number_of_applications
    FROM job_advertisements j
    JOIN departments d ON d.id = j.department_id
"#;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct JobApplication {
    pub id: u64,
    pub job_ad_id: u64,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub email: String,
    pub phone: String,
    /// Reference to the uploaded CV
    #[schema(nullable = true)]
    pub cv: Option<String>,
}
