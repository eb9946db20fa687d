use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::access::{Actor, Capability, authorize};
use crate::error::ServiceError;
use crate::model::audit_log::{AuditFilter, AuditLogEntry};
use crate::store::AuditStore;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 200;

/// Best-effort audit trail writer. Failures are logged and never reach the caller.
#[derive(Clone)]
pub struct AuditRecorder {
    store: Arc<dyn AuditStore>,
}

impl AuditRecorder {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, action: &str, performed_by: Uuid, metadata: Option<Value>) {
        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            action: action.to_string(),
            performed_by,
            metadata,
            timestamp: Utc::now(),
        };

        info!(target: "audit", action = %action, user_id = %performed_by, "recording audit event");

        if let Err(err) = self.store.append(&entry).await {
            warn!(target: "audit", error = %err, action = %action, user_id = %performed_by, "failed to persist audit entry");
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AuditQuery {
    pub action: Option<String>,
    pub performed_by: Option<Uuid>,
    pub limit: Option<usize>,
}

pub async fn query(
    store: &dyn AuditStore,
    actor: &Actor,
    query: AuditQuery,
) -> Result<Vec<AuditLogEntry>, ServiceError> {
    authorize(actor, Capability::ViewAuditLog)?;

    let filter = AuditFilter {
        action: query
            .action
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty()),
        performed_by: query.performed_by,
        limit: query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
    };

    Ok(store.query(&filter).await?)
}
