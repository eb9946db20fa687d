use crate::auth::auth::AuthUser;
use crate::model::leave_request::{Decision, LeaveStatus, NewLeave};
use crate::service::{audit::AuditRecorder, leave};
use crate::store::Store;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Deserialize, ToSchema, IntoParams)]
pub struct LeaveFilter {
    #[schema(example = "Pending")]
    #[param(value_type = Option<String>, example = "Pending")]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
}

#[derive(Deserialize, ToSchema)]
#[schema(example = json!({"status": "Approved"}))]
pub struct StatusUpdate {
    /// `Approved` or `Rejected`
    pub status: Decision,
}

/* =========================
List leave requests
========================= */
#[utoipa::path(
    get,
    path = "/api/leaves",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave requests, newest first. HR and SuperAdmin see all, others their own", body = [LeaveResponse]),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn list_leaves(
    auth: AuthUser,
    store: web::Data<Store>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    let leaves = leave::list(&store, &auth.actor(), query.status).await?;
    let data = leave::populate(&store, leaves).await?;
    Ok(HttpResponse::Ok().json(data))
}

#[utoipa::path(
    get,
    path = "/api/leaves/stats",
    responses(
        (status = 200, description = "Counts over all leave requests", body = LeaveStats),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_stats(
    _auth: AuthUser,
    store: web::Data<Store>,
) -> actix_web::Result<impl Responder> {
    let stats = leave::stats(&store).await?;
    Ok(HttpResponse::Ok().json(stats))
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leaves",
    request_body(
        content = NewLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveResponse),
        (status = 400, description = "Bad request", body = Object, example = json!({
            "error": "startDate cannot be after endDate"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    audit: web::Data<AuditRecorder>,
    payload: web::Json<NewLeave>,
) -> actix_web::Result<impl Responder> {
    let created = leave::create(&store, &audit, &auth.actor(), payload.into_inner()).await?;
    let body = leave::populate_one(&store, created).await?;
    Ok(HttpResponse::Created().json(body))
}

#[utoipa::path(
    get,
    path = "/api/leaves/{leave_id}",
    params(
        ("leave_id" = String, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "error": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    path: web::Path<Uuid>,
) -> actix_web::Result<impl Responder> {
    let found = leave::get(&store, &auth.actor(), path.into_inner()).await?;
    let body = leave::populate_one(&store, found).await?;
    Ok(HttpResponse::Ok().json(body))
}

/* =========================
Approve / reject (HR, SuperAdmin)
========================= */
#[utoipa::path(
    patch,
    path = "/api/leaves/{leave_id}",
    params(
        ("leave_id" = String, Path, description = "ID of the leave request to review")
    ),
    request_body = StatusUpdate,
    responses(
        (status = 200, description = "Leave request reviewed", body = LeaveResponse),
        (status = 400, description = "Status must be Approved or Rejected"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed", body = Object, example = json!({
            "error": "Leave request is already Approved"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn update_leave_status(
    auth: AuthUser,
    store: web::Data<Store>,
    audit: web::Data<AuditRecorder>,
    path: web::Path<Uuid>,
    payload: web::Json<StatusUpdate>,
) -> actix_web::Result<impl Responder> {
    let reviewed = leave::transition(
        &store,
        &audit,
        &auth.actor(),
        path.into_inner(),
        payload.status,
    )
    .await?;
    let body = leave::populate_one(&store, reviewed).await?;
    Ok(HttpResponse::Ok().json(body))
}

#[utoipa::path(
    delete,
    path = "/api/leaves/{leave_id}",
    params(
        ("leave_id" = String, Path, description = "ID of the leave request to delete")
    ),
    responses(
        (status = 200, description = "Leave request deleted", body = Object, example = json!({
            "message": "Leave request deleted"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request is no longer pending")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    store: web::Data<Store>,
    audit: web::Data<AuditRecorder>,
    path: web::Path<Uuid>,
) -> actix_web::Result<impl Responder> {
    leave::delete(&store, &audit, &auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Leave request deleted"
    })))
}
