use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::access::Actor;
use crate::auth::password::{hash_password, validate_new_password, verify_password};
use crate::error::ServiceError;
use crate::model::department::DepartmentRef;
use crate::model::role::Role;
use crate::model::user::{UserChanges, UserResponse};
use crate::service::audit::AuditRecorder;
use crate::store::Store;

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[schema(example = "Jane Q. Doe")]
    pub name: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileSummary {
    #[schema(value_type = String)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

const NOT_FOUND: ServiceError = ServiceError::NotFound("User");

pub async fn get_profile(store: &Store, actor: &Actor) -> Result<UserResponse, ServiceError> {
    let user = store.users.find_by_id(actor.id).await?.ok_or(NOT_FOUND)?;
    let department = match user.department_id {
        Some(id) => store
            .departments
            .find_by_id(id)
            .await?
            .map(|d| DepartmentRef::from(&d)),
        None => None,
    };
    Ok(UserResponse::new(&user, department))
}

/// Renames and/or changes the password of the actor's own account.
///
/// The password is only touched when both `current_password` and
/// `new_password` are present. All changes land in a single store write.
pub async fn update_profile(
    store: &Store,
    audit: &AuditRecorder,
    actor: &Actor,
    update: ProfileUpdate,
) -> Result<ProfileSummary, ServiceError> {
    let mut user = store.users.find_by_id(actor.id).await?.ok_or(NOT_FOUND)?;
    let mut changes = UserChanges::default();

    if let Some(name) = update.name.as_deref().map(str::trim) {
        if !name.is_empty() && name != user.name {
            changes.name = Some(name.to_string());
        }
    }

    if let (Some(current), Some(new)) = (
        update.current_password.as_deref().filter(|p| !p.is_empty()),
        update.new_password.as_deref().filter(|p| !p.is_empty()),
    ) {
        if !verify_password(current, &user.password_hash)? {
            return Err(ServiceError::InvalidCredentials);
        }
        validate_new_password(new)?;
        changes.password_hash = Some(hash_password(new)?);
    }

    if changes.is_empty() {
        return Err(ServiceError::NoOp);
    }

    if !store.users.update(actor.id, &changes).await? {
        return Err(NOT_FOUND);
    }
    changes.apply(&mut user);

    info!(user_id = %actor.id, "Profile updated");
    audit
        .record(
            "profile.updated",
            actor.id,
            Some(json!({ "fields": changes.field_names() })),
        )
        .await;

    Ok(ProfileSummary {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
    })
}
