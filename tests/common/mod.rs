#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::test::TestRequest;
use actix_web::web::Data;
use actix_web::{App, Error};
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use hrm_portal::auth::jwt::generate_access_token;
use hrm_portal::auth::password::hash_password;
use hrm_portal::config::{Config, StoreBackend};
use hrm_portal::error::StoreError;
use hrm_portal::model::audit_log::{AuditFilter, AuditLogEntry};
use hrm_portal::model::role::Role;
use hrm_portal::model::user::User;
use hrm_portal::routes;
use hrm_portal::service::audit::AuditRecorder;
use hrm_portal::store::{AuditStore, MemoryStore, Store, StoreResult};
use hrm_portal::utils::email_registry::EmailRegistry;

pub const SECRET: &str = "test-secret";
pub const PASSWORD: &str = "secret123";

pub fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".into(),
        store_backend: StoreBackend::Memory,
        database_url: None,
        jwt_secret: SECRET.into(),
        access_token_ttl: 900,
        refresh_token_ttl: 3600,
        rate_login_per_min: 1000,
        rate_register_per_min: 1000,
        rate_refresh_per_min: 1000,
        rate_protected_per_min: 1000,
        api_prefix: "/api".into(),
        log_dir: "logs".into(),
        bootstrap_admin_email: None,
        bootstrap_admin_password: None,
    }
}

/// Audit backend that always fails, for checking audit failures stay silent.
pub struct BrokenAudit;

#[async_trait]
impl AuditStore for BrokenAudit {
    async fn append(&self, _entry: &AuditLogEntry) -> StoreResult<()> {
        Err(StoreError::Unavailable("audit sink down".into()))
    }

    async fn query(&self, _filter: &AuditFilter) -> StoreResult<Vec<AuditLogEntry>> {
        Err(StoreError::Unavailable("audit sink down".into()))
    }
}

pub struct Ctx {
    pub backend: Arc<MemoryStore>,
    pub store: Store,
    pub audit: AuditRecorder,
    pub emails: Data<EmailRegistry>,
    pub config: Config,
}

impl Ctx {
    pub fn new() -> Self {
        let backend = Arc::new(MemoryStore::default());
        let store = Store::from_backend(backend.clone());
        let audit = AuditRecorder::new(store.audit.clone());
        Self {
            backend,
            store,
            audit,
            emails: Data::new(EmailRegistry::default()),
            config: test_config(),
        }
    }

    /// Same store, but every audit append fails.
    pub fn with_broken_audit() -> Self {
        let mut ctx = Self::new();
        let broken: Arc<dyn AuditStore> = Arc::new(BrokenAudit);
        ctx.store.audit = broken.clone();
        ctx.audit = AuditRecorder::new(broken);
        ctx
    }

    pub async fn seed(&self, name: &str, email: &str, role: Role) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: hash_password(PASSWORD).unwrap(),
            role,
            department_id: None,
            created_at: now,
            updated_at: now,
        };
        self.store.users.insert(&user).await.unwrap();
        self.emails.register(&user.email).await;
        user
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse<impl MessageBody + use<>>,
            Error = Error,
            InitError = (),
        > + use<>,
    > {
        let config = self.config.clone();
        App::new()
            .app_data(Data::new(self.store.clone()))
            .app_data(Data::new(self.audit.clone()))
            .app_data(self.emails.clone())
            .app_data(Data::new(self.config.clone()))
            .configure(move |cfg| routes::configure(cfg, config))
    }
}

pub fn token_for(user: &User) -> String {
    generate_access_token(user.id, user.email.clone(), user.role, SECRET, 900).unwrap()
}

pub fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

pub fn get(uri: &str) -> TestRequest {
    TestRequest::get().uri(uri).peer_addr(peer())
}

pub fn post(uri: &str) -> TestRequest {
    TestRequest::post().uri(uri).peer_addr(peer())
}

pub fn put(uri: &str) -> TestRequest {
    TestRequest::put().uri(uri).peer_addr(peer())
}

pub fn patch(uri: &str) -> TestRequest {
    TestRequest::patch().uri(uri).peer_addr(peer())
}

pub fn delete(uri: &str) -> TestRequest {
    TestRequest::delete().uri(uri).peer_addr(peer())
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}
