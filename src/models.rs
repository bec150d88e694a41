use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct UserReq {
    #[schema(example = "jdoe")]
    pub username: String,
    pub password: String,
    /// Employee record to link this account to
    #[schema(example = 1000, nullable = true)]
    pub employee_id: Option<u64>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "jdoe")]
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct RoleAssignment {
    /// 1 admin, 2 hr, 3 employee, 4 supervisor, 5 department head, 6 cfo, 7 ceo
    #[schema(example = 2)]
    pub role_id: u8,
    #[schema(nullable = true)]
    pub employee_id: Option<u64>,
}

#[derive(FromRow)]
pub struct UserSql {
    pub id: u64,        // 👈 matches BIGINT UNSIGNED,
    pub username: String,
    pub password: String,
    pub role_id: u8,
    pub employee_id: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    pub sub: String,
    pub role: u8,        // role id
    pub exp: usize,
    pub jti: String,

    pub token_type: TokenType,
    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum TokenType {
    Access,
    Refresh,
}
