//! Business operations. Every call takes the acting identity explicitly and
//! reports rejections as [`ServiceError`](crate::error::ServiceError).

pub mod audit;
pub mod departments;
pub mod leave;
pub mod profile;
pub mod users;
