use crate::{
    api::{
        attendance, dashboard, department, employee, holiday, leave, overtime, overtime_plan,
        payroll, recruitment,
    },
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Result, anyhow};
use std::sync::Arc;

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters, one per route group.
#[derive(Clone)]
pub struct RateLimits {
    login: Limiter,
    register: Limiter,
    refresh: Limiter,
    public: Limiter,
    protected: Limiter,
}

impl RateLimits {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: Arc::new(build_limiter(config.rate_login_per_min)?),
            register: Arc::new(build_limiter(config.rate_register_per_min)?),
            refresh: Arc::new(build_limiter(config.rate_refresh_per_min)?),
            public: Arc::new(build_limiter(config.rate_public_per_min)?),
            protected: Arc::new(build_limiter(config.rate_protected_per_min)?),
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests/min"))?;
    Ok(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limits: &RateLimits) {
    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(limits.login.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(limits.register.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(limits.refresh.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(limits.login.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    cfg.service(
        web::scope("/careers")
            .wrap(limits.public.clone())
            .service(web::resource("/walk-in").route(web::post().to(recruitment::submit_walk_in)))
            .service(web::resource("/jobs").route(web::get().to(recruitment::open_jobs)))
            .service(web::resource("/jobs/{id}").route(web::get().to(recruitment::get_open_job)))
            .service(
                web::resource("/jobs/{id}/apply").route(web::post().to(recruitment::apply_for_job)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limits.protected.clone()) // rate limiting
            .service(handlers::me)
            .service(
                web::resource("/users/{id}/role").route(web::put().to(handlers::assign_role)),
            )
            .service(web::resource("/dashboard").route(web::get().to(dashboard::dashboard)))
            .service(
                web::scope("/employee")
                    // /employee
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employee/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/department")
                    .service(
                        web::resource("")
                            .route(web::post().to(department::create_department))
                            .route(web::get().to(department::list_departments)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(department::get_department))
                            .route(web::put().to(department::update_department)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave::list_leaves))
                            .route(web::post().to(leave::create_leave)),
                    )
                    // before /{id}
                    .service(web::resource("/mine").route(web::get().to(leave::my_leaves)))
                    .service(web::resource("/{id}").route(web::get().to(leave::get_leave)))
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(leave::approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::put().to(leave::reject_leave)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(web::resource("").route(web::post().to(attendance::mark_attendance)))
                    .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
                    .service(
                        web::resource("/check-out").route(web::post().to(attendance::check_out)),
                    )
                    .service(web::resource("/today").route(web::get().to(attendance::present_today)))
                    .service(
                        web::resource("/{id}/check-out")
                            .route(web::post().to(attendance::check_out_employee)),
                    ),
            )
            .service(
                web::scope("/overtime")
                    .service(
                        web::resource("")
                            .route(web::post().to(overtime::apply_overtime))
                            .route(web::get().to(overtime::list_overtime)),
                    )
                    .service(web::resource("/mine").route(web::get().to(overtime::my_overtime)))
                    .service(web::resource("/{id}").route(web::get().to(overtime::get_overtime)))
                    .service(
                        web::resource("/{id}/decision")
                            .route(web::put().to(overtime::decide_overtime)),
                    ),
            )
            .service(
                web::scope("/overtime-plan")
                    .service(
                        web::resource("")
                            .route(web::post().to(overtime_plan::create_plan))
                            .route(web::get().to(overtime_plan::list_plans)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(overtime_plan::get_plan)))
                    .service(
                        web::resource("/{id}/schedule")
                            .route(web::post().to(overtime_plan::add_schedule)),
                    )
                    .service(
                        web::resource("/{id}/decision")
                            .route(web::put().to(overtime_plan::decide_plan)),
                    ),
            )
            .service(
                web::scope("/holiday")
                    .service(
                        web::resource("")
                            .route(web::post().to(holiday::create_holiday))
                            .route(web::get().to(holiday::list_holidays)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(holiday::get_holiday))
                            .route(web::put().to(holiday::update_holiday))
                            .route(web::delete().to(holiday::delete_holiday)),
                    ),
            )
            .service(
                web::scope("/recruitment")
                    .service(web::resource("").route(web::get().to(recruitment::list_candidates)))
                    .service(
                        web::resource("/{id}").route(web::delete().to(recruitment::delete_candidate)),
                    ),
            )
            .service(
                web::scope("/job-ad")
                    .service(
                        web::resource("")
                            .route(web::post().to(recruitment::create_job_ad))
                            .route(web::get().to(recruitment::list_job_ads)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(recruitment::get_job_ad))
                            .route(web::put().to(recruitment::update_job_ad))
                            .route(web::delete().to(recruitment::delete_job_ad)),
                    )
                    .service(
                        web::resource("/{id}/applications")
                            .route(web::get().to(recruitment::list_applications)),
                    ),
            )
            .service(
                web::scope("/payroll")
                    // /payroll
                    .service(
                        web::resource("")
                            .route(web::post().to(payroll::create_payroll))
                            .route(web::get().to(payroll::list_payrolls)),
                    )
                    .service(web::resource("/staff").route(web::get().to(payroll::staff_pay)))
                    // /payroll/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(payroll::get_payroll))
                            .route(web::put().to(payroll::update_payroll)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token + refresh_token (old one revoked)

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_still_builds_a_limiter() {
        assert!(build_limiter(0).is_ok());
        assert!(build_limiter(120_000).is_ok());
    }
}
