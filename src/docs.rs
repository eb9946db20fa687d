use crate::api::leave_request::{LeaveFilter, StatusUpdate};
use crate::api::navigation::{AdminOverview, Dashboard, SessionInfo};
use crate::api::profile::ProfileUpdated;
use crate::auth::handlers::LoginResponse;
use crate::model::audit_log::AuditLogEntry;
use crate::model::department::{DepartmentDetail, DepartmentMember, DepartmentRef, DepartmentSummary};
use crate::model::leave_request::{
    Decision, LeaveResponse, LeaveStats, LeaveStatus, LeaveType, NewLeave,
};
use crate::model::role::Role;
use crate::model::user::{UserRef, UserResponse};
use crate::models::{LoginReqDto, RegisterReq};
use crate::service::departments::{CreateDepartment, UpdateDepartment};
use crate::service::profile::{ProfileSummary, ProfileUpdate};
use crate::service::users::{CreateUser, UpdateUser};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Leave Portal API",
        version = "1.0.0",
        description = r#"
## HR Leave & Administration Portal

Employees submit leave requests, HR reviews them, and SuperAdmins manage
accounts and departments.

### 🔹 Key Features
- **Leave Management**
  - Submit, list and withdraw leave requests; HR approves or rejects pending ones
  - A request is decided exactly once: `Pending → Approved | Rejected`
- **Profile**
  - View the signed-in account, change name or password
- **Users & Departments**
  - SuperAdmin-only account and department administration
- **Audit Log**
  - Every business action is recorded (best effort) and queryable by SuperAdmins

### 🔐 Security
API endpoints require a JWT access token, sent as `Authorization: Bearer <token>`
or through the `session` cookie set at login. Navigation paths outside `/api`
and `/auth` (`/dashboard`, `/admin/*`, ...) redirect instead of returning 401/403.

### 📦 Response Format
- JSON bodies; errors are `{"error": "<message>"}`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::leave_request::list_leaves,
        crate::api::leave_request::leave_stats,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::update_leave_status,
        crate::api::leave_request::delete_leave,

        crate::api::profile::get_profile,
        crate::api::profile::update_profile,

        crate::api::user::list_users,
        crate::api::user::create_user,
        crate::api::user::update_user,
        crate::api::user::delete_user,

        crate::api::department::list_departments,
        crate::api::department::get_department,
        crate::api::department::create_department,
        crate::api::department::update_department,
        crate::api::department::delete_department,

        crate::api::audit_log::list_audit_logs,

        crate::api::navigation::login_page,
        crate::api::navigation::dashboard,
        crate::api::navigation::admin_overview
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            Role,
            LeaveType,
            LeaveStatus,
            Decision,
            NewLeave,
            LeaveFilter,
            StatusUpdate,
            LeaveResponse,
            LeaveStats,
            UserRef,
            UserResponse,
            CreateUser,
            UpdateUser,
            ProfileUpdate,
            ProfileSummary,
            ProfileUpdated,
            DepartmentRef,
            DepartmentSummary,
            DepartmentMember,
            DepartmentDetail,
            CreateDepartment,
            UpdateDepartment,
            AuditLogEntry,
            SessionInfo,
            Dashboard,
            AdminOverview
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token rotation"),
        (name = "Leave", description = "Leave request lifecycle"),
        (name = "Profile", description = "The signed-in account"),
        (name = "User", description = "Account administration (SuperAdmin)"),
        (name = "Department", description = "Department administration"),
        (name = "Audit", description = "Audit trail (SuperAdmin)"),
        (name = "Navigation", description = "Guarded landing pages"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_leave_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/leaves/{leave_id}"));
        assert!(doc.paths.paths.contains_key("/auth/login"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
