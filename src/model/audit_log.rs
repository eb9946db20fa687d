use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

/// Append-only record of a mutating action.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    #[schema(value_type = String)]
    pub id: Uuid,
    #[schema(example = "leave.approved")]
    pub action: String,
    #[schema(value_type = String)]
    pub performed_by: Uuid,
    #[schema(value_type = Object)]
    pub metadata: Option<Value>,
    #[schema(format = "date-time", value_type = String)]
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub action: Option<String>,
    pub performed_by: Option<Uuid>,
    pub limit: usize,
}
