//! Authorization rules in one place: which role holds which capability, and
//! where a navigation request may go.

use crate::error::ServiceError;
use crate::model::role::Role;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Capability {
    /// Approve or reject pending leave requests, see every request.
    ReviewLeave,
    ManageUsers,
    ManageDepartments,
    ViewAuditLog,
    AccessAdminArea,
}

pub fn role_has(role: Role, capability: Capability) -> bool {
    match capability {
        Capability::ReviewLeave => matches!(role, Role::Hr | Role::SuperAdmin),
        Capability::ManageUsers
        | Capability::ManageDepartments
        | Capability::ViewAuditLog
        | Capability::AccessAdminArea => role == Role::SuperAdmin,
    }
}

pub fn authorize(actor: &Actor, capability: Capability) -> Result<(), ServiceError> {
    if role_has(actor.role, capability) {
        Ok(())
    } else {
        Err(ServiceError::NotAuthorized)
    }
}

/// Identity every service call runs as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: uuid::Uuid,
    pub role: Role,
}

impl Actor {
    pub fn can(&self, capability: Capability) -> bool {
        role_has(self.role, capability)
    }
}

pub const LOGIN_PATH: &str = "/login";
pub const LANDING_PATH: &str = "/dashboard";
const ADMIN_PREFIX: &str = "/admin";

/// Paths outside the navigation surface; the gate never redirects them.
const UNGATED: [&str; 5] = ["/api", "/auth", "/swagger-ui", "/api-doc", LOGIN_PATH];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(&'static str),
}

fn under(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Decides a navigation request. `role` is `None` when there is no session.
pub fn route_decision(path: &str, role: Option<Role>) -> RouteDecision {
    if UNGATED.iter().any(|prefix| under(path, prefix)) {
        return RouteDecision::Allow;
    }
    let Some(role) = role else {
        return RouteDecision::Redirect(LOGIN_PATH);
    };
    if under(path, ADMIN_PREFIX) && !role_has(role, Capability::AccessAdminArea) {
        return RouteDecision::Redirect(LANDING_PATH);
    }
    RouteDecision::Allow
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_reviewers_review() {
        assert!(!role_has(Role::User, Capability::ReviewLeave));
        assert!(role_has(Role::Hr, Capability::ReviewLeave));
        assert!(role_has(Role::SuperAdmin, Capability::ReviewLeave));
    }

    #[test]
    fn admin_capabilities_are_superadmin_only() {
        for cap in [
            Capability::ManageUsers,
            Capability::ManageDepartments,
            Capability::ViewAuditLog,
            Capability::AccessAdminArea,
        ] {
            assert!(!role_has(Role::User, cap));
            assert!(!role_has(Role::Hr, cap));
            assert!(role_has(Role::SuperAdmin, cap));
        }
    }

    #[test]
    fn authorize_reports_not_authorized() {
        let actor = Actor {
            id: uuid::Uuid::new_v4(),
            role: Role::User,
        };
        assert!(matches!(
            authorize(&actor, Capability::ReviewLeave),
            Err(ServiceError::NotAuthorized)
        ));
    }

    #[test]
    fn admin_area_redirects_non_superadmins() {
        assert_eq!(
            route_decision("/admin/users", Some(Role::Hr)),
            RouteDecision::Redirect(LANDING_PATH)
        );
        assert_eq!(
            route_decision("/admin", Some(Role::User)),
            RouteDecision::Redirect(LANDING_PATH)
        );
        assert_eq!(
            route_decision("/admin/departments", Some(Role::SuperAdmin)),
            RouteDecision::Allow
        );
    }

    #[test]
    fn prefix_match_is_by_segment() {
        assert_eq!(
            route_decision("/administration", Some(Role::User)),
            RouteDecision::Allow
        );
    }

    #[test]
    fn no_session_goes_to_login() {
        assert_eq!(
            route_decision("/dashboard", None),
            RouteDecision::Redirect(LOGIN_PATH)
        );
        assert_eq!(route_decision("/login", None), RouteDecision::Allow);
    }

    #[test]
    fn hr_has_no_extra_gating() {
        assert_eq!(route_decision("/leaves", Some(Role::User)), RouteDecision::Allow);
    }

    #[test]
    fn api_and_docs_are_never_redirected() {
        for path in ["/api/leaves", "/auth/login", "/swagger-ui/index.html", "/api-doc/openapi.json"] {
            assert_eq!(route_decision(path, None), RouteDecision::Allow);
        }
        assert_eq!(
            route_decision("/apis", None),
            RouteDecision::Redirect(LOGIN_PATH)
        );
    }
}
