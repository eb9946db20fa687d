pub mod audit_log;
pub mod department;
pub mod leave_request;
pub mod navigation;
pub mod profile;
pub mod user;
