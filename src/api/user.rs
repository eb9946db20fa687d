use crate::auth::auth::AuthUser;
use crate::service::{
    audit::AuditRecorder,
    users::{self, CreateUser, UpdateUser},
};
use crate::store::Store;
use crate::utils::email_registry::EmailRegistry;
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users with their department", body = [UserResponse]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "SuperAdmin only")
    ),
    tag = "User",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_users(
    auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    let data = users::list(&store, &auth.actor()).await?;
    Ok(HttpResponse::Ok().json(data))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "SuperAdmin only"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Email already registered", body = Object, example = json!({
            "error": "Email already registered"
        }))
    ),
    tag = "User",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_user(
    auth: AuthUser,
    store: web::Data<Store>,
    audit: web::Data<AuditRecorder>,
    emails: web::Data<EmailRegistry>,
    payload: web::Json<CreateUser>,
) -> actix_web::Result<impl Responder> {
    let user = users::create(&store, &audit, &emails, &auth.actor(), payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    patch,
    path = "/api/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation failed or no changes"),
        (status = 403, description = "SuperAdmin only"),
        (status = 404, description = "User or department not found"),
        (status = 409, description = "Email already registered")
    ),
    tag = "User",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_user(
    auth: AuthUser,
    store: web::Data<Store>,
    audit: web::Data<AuditRecorder>,
    emails: web::Data<EmailRegistry>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateUser>,
) -> actix_web::Result<impl Responder> {
    let user = users::update(
        &store,
        &audit,
        &emails,
        &auth.actor(),
        path.into_inner(),
        payload.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(user))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User deleted", body = Object, example = json!({
            "message": "User deleted"
        })),
        (status = 400, description = "Cannot delete own account"),
        (status = 403, description = "SuperAdmin only"),
        (status = 404, description = "User not found")
    ),
    tag = "User",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_user(
    auth: AuthUser,
    store: web::Data<Store>,
    audit: web::Data<AuditRecorder>,
    emails: web::Data<EmailRegistry>,
    path: web::Path<Uuid>,
) -> actix_web::Result<impl Responder> {
    users::delete(&store, &audit, &emails, &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "User deleted"
    })))
}
