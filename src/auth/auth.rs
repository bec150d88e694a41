use crate::config::Config;
use crate::workflow::{ApproverRole, WorkflowError};
use crate::{auth::jwt::verify_token, model::role::Role, models::TokenType};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data};
use futures::future::{Ready, ready};

/// The caller of a protected handler, passed in explicitly as an extractor.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already resolved by auth_middleware on protected scopes.
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match req
            .headers()
            .get("Authorization")
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
        {
            Some(t) => t,
            None => return ready(Err(ErrorUnauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ))
            }
        };

        let claims = match verify_token(token, &config.jwt_secret) {
            Ok(c) if c.token_type == TokenType::Access => c,
            _ => return ready(Err(ErrorUnauthorized("Invalid token"))),
        };

        let role = match Role::from_id(claims.role) {
            Some(r) => r,
            None => return ready(Err(ErrorUnauthorized("Invalid role"))),
        };

        ready(Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        }))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Admin only"))
        }
    }

    pub fn require_hr_or_admin(&self) -> actix_web::Result<()> {
        if self.is_hr_or_admin() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("HR/Admin only"))
        }
    }

    /// Anyone who signs some approval step, plus Admin.
    pub fn require_approver(&self) -> actix_web::Result<()> {
        if self.role == Role::Admin || self.role.approver_role().is_some() {
            Ok(())
        } else {
            Err(actix_web::error::ErrorForbidden("Approvers only"))
        }
    }

    pub fn is_hr_or_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Hr)
    }

    /// The linked employee record, required for self-service actions.
    pub fn employee_id(&self) -> actix_web::Result<u64> {
        self.employee_id
            .ok_or_else(|| actix_web::error::ErrorForbidden("No employee profile"))
    }

    /// The approval step this user signs. Admin must name the step; other
    /// roles may only name their own.
    pub fn approver_step(&self, requested: Option<ApproverRole>) -> Result<ApproverRole, WorkflowError> {
        match (self.role, requested) {
            (Role::Admin, Some(step)) => Ok(step),
            (role, requested) => match (role.approver_role(), requested) {
                (None, _) => Err(WorkflowError::NoApproverRole),
                (Some(own), None) => Ok(own),
                (Some(own), Some(step)) if step == own => Ok(own),
                (Some(_), Some(step)) => Err(WorkflowError::NotInChain(step)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::{TokenSubject, generate_access_token, generate_refresh_token};
    use actix_web::test::TestRequest;

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "someone".into(),
            role,
            employee_id: Some(10),
        }
    }

    fn config() -> Config {
        Config {
            database_url: String::new(),
            db_max_connections: 1,
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            access_token_ttl: 60,
            refresh_token_ttl: 600,
            rate_login_per_min: 60,
            rate_register_per_min: 30,
            rate_refresh_per_min: 30,
            rate_public_per_min: 120,
            rate_protected_per_min: 1000,
            api_prefix: "/api".into(),
            log_dir: "logs".into(),
            overtime_expiry_days: 30,
            holiday_cache_ttl_secs: 60,
        }
    }

    fn subject(role: Role) -> TokenSubject {
        TokenSubject {
            user_id: 5,
            username: "cfo".into(),
            role: role.id(),
            employee_id: None,
        }
    }

    #[test]
    fn role_guards() {
        assert!(user(Role::Admin).require_admin().is_ok());
        assert!(user(Role::Hr).require_admin().is_err());
        assert!(user(Role::Hr).require_hr_or_admin().is_ok());
        assert!(user(Role::Employee).require_hr_or_admin().is_err());
        assert!(user(Role::Ceo).require_approver().is_ok());
        assert!(user(Role::Employee).require_approver().is_err());
    }

    #[test]
    fn approvers_sign_their_own_step() {
        assert_eq!(user(Role::Cfo).approver_step(None), Ok(ApproverRole::Cfo));
        assert_eq!(
            user(Role::Cfo).approver_step(Some(ApproverRole::Cfo)),
            Ok(ApproverRole::Cfo)
        );
        assert_eq!(
            user(Role::Cfo).approver_step(Some(ApproverRole::Ceo)),
            Err(WorkflowError::NotInChain(ApproverRole::Ceo))
        );
    }

    #[test]
    fn admin_must_name_the_step() {
        assert_eq!(
            user(Role::Admin).approver_step(Some(ApproverRole::Supervisor)),
            Ok(ApproverRole::Supervisor)
        );
        assert_eq!(
            user(Role::Admin).approver_step(None),
            Err(WorkflowError::NoApproverRole)
        );
        assert_eq!(
            user(Role::Employee).approver_step(None),
            Err(WorkflowError::NoApproverRole)
        );
    }

    #[actix_web::test]
    async fn extracts_from_bearer_token() {
        let cfg = config();
        let token = generate_access_token(&subject(Role::Cfo), &cfg.jwt_secret, 60).unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {token}")))
            .app_data(Data::new(cfg))
            .to_http_request();

        let user = AuthUser::extract(&req).await.unwrap();
        assert_eq!(user.user_id, 5);
        assert_eq!(user.role, Role::Cfo);
    }

    #[actix_web::test]
    async fn refresh_token_is_not_an_access_token() {
        let cfg = config();
        let (token, _) = generate_refresh_token(&subject(Role::Hr), &cfg.jwt_secret, 60).unwrap();
        let req = TestRequest::default()
            .insert_header(("Authorization", format!("Bearer {token}")))
            .app_data(Data::new(cfg))
            .to_http_request();

        assert!(AuthUser::extract(&req).await.is_err());
    }

    #[actix_web::test]
    async fn missing_header_is_unauthorized() {
        let req = TestRequest::default()
            .app_data(Data::new(config()))
            .to_http_request();
        let err = AuthUser::extract(&req).await.unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            actix_web::http::StatusCode::UNAUTHORIZED
        );
    }
}
