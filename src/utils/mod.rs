pub mod email_cache;
pub mod email_filter;
pub mod email_registry;
