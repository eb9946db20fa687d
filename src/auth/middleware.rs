use crate::auth::access::{RouteDecision, route_decision};
use crate::auth::auth::authenticate;
use crate::config::Config;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    web::Data,
};
use serde_json::json;

/// Protects the JSON API: unauthenticated requests get a 401 body.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let auth_user = match authenticate(req.request(), &config.jwt_secret) {
        Ok(user) => user,
        Err(reason) => {
            let resp = HttpResponse::Unauthorized().json(json!({"error": reason}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}

/// Navigation boundary: redirects to the login page without a session, and to
/// the landing page when the role may not enter the requested section.
pub async fn route_guard(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;

    let session = authenticate(req.request(), &config.jwt_secret).ok();
    let path = req.path().to_string();

    match route_decision(&path, session.as_ref().map(|s| s.role)) {
        RouteDecision::Allow => {
            if let Some(user) = session {
                req.extensions_mut().insert(user);
            }
            next.call(req).await
        }
        RouteDecision::Redirect(target) => {
            tracing::debug!(path = %path, location = target, "Navigation redirected");
            let resp = HttpResponse::TemporaryRedirect()
                .insert_header((header::LOCATION, target))
                .finish();
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
    }
}
