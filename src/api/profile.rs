use crate::auth::auth::AuthUser;
use crate::service::{
    audit::AuditRecorder,
    profile::{self, ProfileSummary, ProfileUpdate},
};
use crate::store::Store;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ProfileUpdated {
    #[schema(example = "Profile updated successfully")]
    pub message: String,
    pub user: ProfileSummary,
}

#[utoipa::path(
    get,
    path = "/api/profile",
    responses(
        (status = 200, description = "The caller's account", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn get_profile(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    let user = profile::get_profile(&store, &auth.actor()).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Change display name and/or password
#[utoipa::path(
    post,
    path = "/api/profile/update",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Profile updated", body = ProfileUpdated),
        (status = 400, description = "No changes, wrong current password, or new password too short", body = Object, example = json!({
            "error": "Current password is incorrect"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Profile"
)]
pub async fn update_profile(
    auth: AuthUser,
    store: web::Data<Store>,
    audit: web::Data<AuditRecorder>,
    payload: web::Json<ProfileUpdate>,
) -> actix_web::Result<impl Responder> {
    let user = profile::update_profile(&store, &audit, &auth.actor(), payload.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ProfileUpdated {
        message: "Profile updated successfully".to_string(),
        user,
    }))
}
