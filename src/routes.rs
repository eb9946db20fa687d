use crate::{
    api::{audit_log, department, leave_request, navigation, profile, user},
    auth::{
        handlers,
        middleware::{auth_middleware, route_guard},
    },
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{
    HttpResponse,
    error::InternalError,
    middleware::from_fn,
    web,
};
use serde_json::json;
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let burst = requests_per_min.max(1);
    let per_ms = (60_000 / burst as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(burst)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(GovernorConfig::default);
    Governor::new(&cfg)
}

/// Malformed bodies, queries and paths answer 400 with the same `{"error": ..}`
/// shape as service errors.
fn bad_request(err: impl std::fmt::Display + std::fmt::Debug + 'static) -> actix_web::Error {
    let message = err.to_string();
    InternalError::from_response(err, HttpResponse::BadRequest().json(json!({ "error": message })))
        .into()
}

pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _| bad_request(err)));
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    extractor_config(cfg);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter)
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter)
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leaves")
                    // /leaves
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::list_leaves))
                            .route(web::post().to(leave_request::create_leave)),
                    )
                    // /leaves/stats, ahead of /{id}
                    .service(
                        web::resource("/stats").route(web::get().to(leave_request::leave_stats)),
                    )
                    // /leaves/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave_request::get_leave))
                            .route(web::patch().to(leave_request::update_leave_status))
                            .route(web::delete().to(leave_request::delete_leave)),
                    ),
            )
            .service(
                web::scope("/profile")
                    .service(web::resource("").route(web::get().to(profile::get_profile)))
                    .service(
                        web::resource("/update").route(web::post().to(profile::update_profile)),
                    ),
            )
            .service(
                web::scope("/users")
                    .service(
                        web::resource("")
                            .route(web::get().to(user::list_users))
                            .route(web::post().to(user::create_user)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::patch().to(user::update_user))
                            .route(web::put().to(user::update_user))
                            .route(web::delete().to(user::delete_user)),
                    ),
            )
            .service(
                web::scope("/departments")
                    .service(
                        web::resource("")
                            .route(web::get().to(department::list_departments))
                            .route(web::post().to(department::create_department)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(department::get_department))
                            .route(web::patch().to(department::update_department))
                            .route(web::put().to(department::update_department))
                            .route(web::delete().to(department::delete_department)),
                    ),
            )
            .service(
                web::resource("/audit-logs").route(web::get().to(audit_log::list_audit_logs)),
            ),
    );

    // Navigation: every remaining path passes the role gate, which redirects
    // instead of answering 401/403. Must stay last so it only sees what the
    // scopes above did not match.
    cfg.service(
        web::scope("")
            .wrap(from_fn(route_guard))
            .service(web::resource("/login").route(web::get().to(navigation::login_page)))
            .service(web::resource("/dashboard").route(web::get().to(navigation::dashboard)))
            .service(web::resource("/admin").route(web::get().to(navigation::admin_overview)))
            .service(
                web::resource("/admin/{section:.*}")
                    .route(web::get().to(navigation::admin_overview)),
            )
            .default_service(web::to(navigation::page_not_found)),
    );
}

// LOGIN
//  ├─ access_token (15 min), also set as the `session` cookie
//  └─ refresh_token (7 days), jti stored server-side

// API REQUEST
//  └─ Authorization: Bearer access_token (or session cookie)

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ old jti revoked, new pair returned
