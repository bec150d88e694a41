use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_HISTORY: &str = "No History";

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Department {
    #[schema(example = 2)]
    pub id: u64,
    #[schema(example = "Engineering")]
    pub name: String,
    #[schema(example = "No History", nullable = true)]
    pub history: Option<String>,
}
