use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    #[default]
    English,
    Yoruba,
    Hausa,
    French,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "emp482",
        "first_name": "John",
        "last_name": "Doe",
        "mobile": "+2348012345678",
        "email": "john.doe@company.com",
        "address": "12 Marina Road, Lagos",
        "emergency": "08098765432",
        "gender": "male",
        "department_id": 2,
        "joined": "2024-01-01T09:00:00",
        "language": "english",
        "bank": "Santander UK",
        "account_number": "0123456789",
        "salary": "250000.00",
        "overtime_hourly_rate": "1500.00",
        "photo": null
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "emp482")]
    pub employee_code: String,

    #[schema(example = "John")]
    pub first_name: String,

    #[schema(example = "Doe")]
    pub last_name: String,

    #[schema(example = "+2348012345678")]
    pub mobile: String,

    #[schema(example = "john.doe@company.com")]
    pub email: String,

    pub address: String,

    /// Emergency contact number
    pub emergency: String,

    #[sqlx(try_from = "String")]
    pub gender: Gender,

    #[schema(example = 2, nullable = true)]
    pub department_id: Option<u64>,

    #[schema(example = "2024-01-01T09:00:00", value_type = String, format = "date-time")]
    pub joined: NaiveDateTime,

    #[sqlx(try_from = "String")]
    pub language: Language,

    #[schema(example = "Santander UK")]
    pub bank: String,

    #[schema(example = "0123456789")]
    pub account_number: String,

    #[schema(example = "250000.00", value_type = String)]
    pub salary: Decimal,

    #[schema(example = "1500.00", value_type = String)]
    pub overtime_hourly_rate: Decimal,

    /// Reference to the stored photo, if one was uploaded
    #[schema(nullable = true)]
    pub photo: Option<String>,
}

impl Employee {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
