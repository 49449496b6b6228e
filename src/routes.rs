use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use anyhow::{Context, Result};

use crate::{
    api::{admin, leave_request},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};

type Limiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiters, built once and shared by every worker.
#[derive(Clone)]
pub struct RateLimiters {
    login: Arc<Limiter>,
    protected: Arc<Limiter>,
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: Arc::new(build_limiter(config.rate_login_per_min).context("login limiter")?),
            protected: Arc::new(
                build_limiter(config.rate_protected_per_min).context("protected limiter")?,
            ),
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Limiter> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / u64::from(requests_per_min)).max(1)
    };
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .context("invalid rate limit")?;
    Ok(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiters: &RateLimiters) {
    // Public routes
    cfg.service(
        web::scope("/auth").service(
            web::resource("/login")
                .wrap(limiters.login.clone())
                .route(web::post().to(handlers::login)),
        ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected.clone()) // rate limiting
            .service(
                web::scope("/leave-requests")
                    // /leave-requests
                    .service(
                        web::resource("")
                            .route(web::post().to(leave_request::submit_leave))
                            .route(web::delete().to(leave_request::cancel_leave)),
                    )
                    .service(web::resource("/status").route(web::get().to(leave_request::leave_status)))
                    .service(
                        web::resource("/remaining").route(web::get().to(leave_request::remaining_leave)),
                    )
                    // /leave-requests/remaining/{employee_id}
                    .service(
                        web::resource("/remaining/{employee_id}")
                            .route(web::get().to(leave_request::employee_remaining)),
                    )
                    .service(web::resource("/approve").route(web::patch().to(leave_request::approve_leave)))
                    .service(web::resource("/reject").route(web::patch().to(leave_request::reject_leave)))
                    .service(web::resource("/pending").route(web::get().to(leave_request::pending_requests)))
                    .service(
                        web::resource("/managed-users").route(web::get().to(leave_request::managed_users)),
                    )
                    .service(
                        web::resource("/reports/pending-summary")
                            .route(web::get().to(leave_request::pending_summary)),
                    )
                    .service(
                        web::resource("/reports/upcoming-leaves")
                            .route(web::get().to(leave_request::upcoming_leaves)),
                    ),
            )
            .service(
                web::scope("/admin")
                    .service(web::resource("/add-user").route(web::post().to(admin::add_user)))
                    .service(
                        web::resource("/update-role/{employee_id}").route(web::patch().to(admin::update_role)),
                    )
                    .service(
                        web::resource("/update-department/{employee_id}")
                            .route(web::patch().to(admin::update_department)),
                    )
                    .service(web::resource("/all-users").route(web::get().to(admin::all_users)))
                    .service(
                        web::resource("/all-leave-requests").route(web::get().to(admin::all_leave_requests)),
                    )
                    .service(
                        web::resource("/approve/{leave_request_id}")
                            .route(web::patch().to(admin::approve_as_admin)),
                    )
                    .service(
                        web::resource("/leave-usage-stats").route(web::get().to(admin::leave_usage_stats)),
                    )
                    .service(
                        web::resource("/update-leave-balance/{employee_id}")
                            .route(web::patch().to(admin::update_leave_balance)),
                    )
                    .service(web::resource("/assign-manager").route(web::post().to(admin::assign_manager)))
                    .service(web::resource("/end-management").route(web::post().to(admin::end_management)))
                    .service(
                        web::resource("/reports/company-summary")
                            .route(web::get().to(admin::company_summary)),
                    )
                    .service(
                        web::resource("/reports/department-usage")
                            .route(web::get().to(admin::department_usage)),
                    ),
            ),
    );
}

// LOGIN
//  └─ access_token (ACCESS_TOKEN_TTL)

// API REQUEST
//  └─ Authorization: Bearer access_token
