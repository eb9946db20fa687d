use crate::auth::auth::AuthUser;
use crate::service::audit::{self, AuditQuery};
use crate::store::Store;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(rename_all = "camelCase")]
pub struct AuditLogFilter {
    /// Exact action label, e.g. `leave.approved`
    pub action: Option<String>,
    /// Acting user id
    #[param(value_type = Option<String>)]
    pub performed_by: Option<Uuid>,
    /// Max entries (default 50, at most 200)
    pub limit: Option<usize>,
}

#[utoipa::path(
    get,
    path = "/api/audit-logs",
    params(AuditLogFilter),
    responses(
        (status = 200, description = "Audit entries, newest first", body = [AuditLogEntry]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "SuperAdmin only")
    ),
    tag = "Audit",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_audit_logs(
    auth: AuthUser,
    store: web::Data<Store>,
    query: web::Query<AuditLogFilter>,
) -> actix_web::Result<impl Responder> {
    let query = query.into_inner();
    let entries = audit::query(
        store.audit.as_ref(),
        &auth.actor(),
        AuditQuery {
            action: query.action,
            performed_by: query.performed_by,
            limit: query.limit,
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(entries))
}
