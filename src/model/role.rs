use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Account role. Governs which capabilities an actor holds, see `auth::access`.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
pub enum Role {
    User,
    #[serde(rename = "HR")]
    #[strum(serialize = "HR")]
    Hr,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn wire_names_match_storage_names() {
        for role in [Role::User, Role::Hr, Role::SuperAdmin] {
            let json = serde_json::to_string(&role).unwrap();
            assert_eq!(json, format!("\"{}\"", role.as_str()));
            assert_eq!(Role::from_str(role.as_str()).unwrap(), role);
        }
        assert_eq!(Role::Hr.to_string(), "HR");
    }

    #[test]
    fn unknown_role_is_rejected() {
        assert!(Role::from_str("Admin").is_err());
        assert!(serde_json::from_str::<Role>("\"hr\"").is_err());
    }
}
