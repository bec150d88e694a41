use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Holiday {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "2026-12-25", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "Christmas Day")]
    pub name: String,
}
