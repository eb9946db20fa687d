use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use dotenvy::dotenv;
use std::io;

use hrm_portal::config::Config;
use hrm_portal::db::init_store;
use hrm_portal::docs::ApiDoc;
use hrm_portal::routes;
use hrm_portal::service::{audit::AuditRecorder, users};
use hrm_portal::utils::email_registry::EmailRegistry;

use tracing::{error, info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();

    let config = Config::from_env().map_err(|e| io::Error::other(format!("{e:#}")))?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let store = init_store(&config).await.map_err(|e| {
        error!(error = %format!("{e:#}"), "Store initialisation failed");
        io::Error::other(format!("{e:#}"))
    })?;

    let audit = Data::new(AuditRecorder::new(store.audit.clone()));
    let emails = Data::new(EmailRegistry::default());

    if let (Some(email), Some(password)) = (
        config.bootstrap_admin_email.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) {
        match users::ensure_superadmin(&store, &emails, email, password).await {
            Ok(true) => info!("Bootstrap SuperAdmin seeded"),
            Ok(false) => info!("Bootstrap SuperAdmin already present"),
            Err(e) => warn!(error = %e, "Failed to seed bootstrap SuperAdmin"),
        }
    }

    let warmup_store = store.clone();
    let warmup_emails = emails.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = warmup_emails.warmup(warmup_store.users.as_ref(), 250).await {
            warn!(error = %e, "Failed to warm up email registry");
        }
    });

    let server_addr = config.server_addr.clone();
    let store = Data::new(store);
    let config_data = Data::new(config.clone());

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(store.clone())
            .app_data(audit.clone())
            .app_data(emails.clone())
            .app_data(config_data.clone())
            // Configure auth + protected routes with rate limiting
            .configure(|cfg| routes::configure(cfg, config.clone()))
    })
    .bind(server_addr)?
    .run()
    .await
}
