use crate::auth::auth::AuthUser;
use crate::service::{
    audit::AuditRecorder,
    departments::{self, CreateDepartment, UpdateDepartment},
};
use crate::store::Store;
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "Departments with member counts", body = [DepartmentSummary]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Department",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_departments(
    _auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    let data = departments::list(&store).await?;
    Ok(HttpResponse::Ok().json(data))
}

#[utoipa::path(
    get,
    path = "/api/departments/{id}",
    params(
        ("id" = String, Path, description = "Department id")
    ),
    responses(
        (status = 200, description = "Department with members", body = DepartmentDetail),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_department(
    _auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<Uuid>,
) -> actix_web::Result<impl Responder> {
    let data = departments::get(&store, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(data))
}

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created", body = DepartmentSummary),
        (status = 400, description = "Name is required"),
        (status = 403, description = "SuperAdmin only")
    ),
    tag = "Department",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_department(
    auth: AuthUser,
    store: web::Data<Store>,
    audit: web::Data<AuditRecorder>,
    payload: web::Json<CreateDepartment>,
) -> actix_web::Result<impl Responder> {
    let data = departments::create(&store, &audit, &auth.actor(), payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(data))
}

#[utoipa::path(
    patch,
    path = "/api/departments/{id}",
    params(
        ("id" = String, Path, description = "Department id")
    ),
    request_body = UpdateDepartment,
    responses(
        (status = 200, description = "Department updated", body = DepartmentDetail),
        (status = 400, description = "Validation failed or no changes"),
        (status = 403, description = "SuperAdmin only"),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_department(
    auth: AuthUser,
    store: web::Data<Store>,
    audit: web::Data<AuditRecorder>,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateDepartment>,
) -> actix_web::Result<impl Responder> {
    let data = departments::update(
        &store,
        &audit,
        &auth.actor(),
        path.into_inner(),
        payload.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(data))
}

#[utoipa::path(
    delete,
    path = "/api/departments/{id}",
    params(
        ("id" = String, Path, description = "Department id")
    ),
    responses(
        (status = 200, description = "Department deleted; members detached", body = Object, example = json!({
            "message": "Department deleted"
        })),
        (status = 403, description = "SuperAdmin only"),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_department(
    auth: AuthUser,
    store: web::Data<Store>,
    audit: web::Data<AuditRecorder>,
    path: web::Path<Uuid>,
) -> actix_web::Result<impl Responder> {
    departments::delete(&store, &audit, &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Department deleted"
    })))
}
