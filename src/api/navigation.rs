//! Landing data for the dashboard sections. These routes sit behind the
//! navigation guard rather than the API auth middleware.

use crate::auth::access::{Capability, authorize};
use crate::auth::auth::AuthUser;
use crate::error::ServiceError;
use crate::model::leave_request::LeaveStats;
use crate::model::role::Role;
use crate::service::leave;
use crate::store::Store;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
pub struct SessionInfo {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

#[derive(Serialize, ToSchema)]
pub struct Dashboard {
    pub user: SessionInfo,
    pub leaves: LeaveStats,
}

#[derive(Serialize, ToSchema)]
pub struct AdminOverview {
    pub users: u64,
    pub departments: u64,
}

#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Signed-in landing page data", body = Dashboard),
        (status = 307, description = "No session; redirected to /login")
    ),
    tag = "Navigation"
)]
pub async fn dashboard(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    let leaves = leave::stats(&store).await?;
    Ok(HttpResponse::Ok().json(Dashboard {
        user: SessionInfo {
            id: auth.user_id,
            email: auth.email,
            role: auth.role,
        },
        leaves,
    }))
}

#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Administration overview", body = AdminOverview),
        (status = 307, description = "Not a SuperAdmin; redirected to /dashboard")
    ),
    tag = "Navigation"
)]
pub async fn admin_overview(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    authorize(&auth.actor(), Capability::AccessAdminArea)?;
    let users = store.users.count().await.map_err(ServiceError::from)?;
    let departments = store.departments.count().await.map_err(ServiceError::from)?;
    Ok(HttpResponse::Ok().json(AdminOverview { users, departments }))
}

#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Sign-in entry point", body = Object, example = json!({
            "message": "Sign in with POST /auth/login"
        }))
    ),
    tag = "Navigation"
)]
pub async fn login_page() -> impl Responder {
    HttpResponse::Ok().json(json!({ "message": "Sign in with POST /auth/login" }))
}

/// Fallback for navigation paths the gate allowed but nothing serves.
pub async fn page_not_found() -> impl Responder {
    HttpResponse::NotFound().json(json!({ "error": "Page not found" }))
}
