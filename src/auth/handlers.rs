use crate::{
    auth::{
        auth::SESSION_COOKIE,
        jwt::{generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    model::user::{User, normalize_email},
    models::{LoginReqDto, RefreshToken, RegisterReq, TokenType},
    service::{audit::AuditRecorder, users},
    store::Store,
    utils::email_registry::EmailRegistry,
};
use actix_web::{
    HttpRequest, HttpResponse, Responder,
    cookie::{Cookie, SameSite, time::Duration as CookieDuration},
    web,
};
use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
}

fn session_cookie(token: &str, ttl: usize) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(ttl as i64))
        .finish()
}

fn cleared_session_cookie() -> Cookie<'static> {
    let mut cookie = session_cookie("", 0);
    cookie.make_removal();
    cookie
}

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Signs a fresh access/refresh pair and records the refresh `jti`.
async fn issue_tokens(
    user: &User,
    store: &Store,
    config: &Config,
) -> Result<LoginResponse, HttpResponse> {
    let access_token = generate_access_token(
        user.id,
        user.email.clone(),
        user.role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign access token");
        HttpResponse::InternalServerError().finish()
    })?;

    let (refresh_token, refresh_claims) = generate_refresh_token(
        user.id,
        user.email.clone(),
        user.role,
        &config.jwt_secret,
        config.refresh_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign refresh token");
        HttpResponse::InternalServerError().finish()
    })?;

    debug!(user_id = %user.id, jti = %refresh_claims.jti, "Storing refresh token");

    let record = RefreshToken {
        jti: refresh_claims.jti.clone(),
        user_id: user.id,
        expires_at: Utc
            .timestamp_opt(refresh_claims.exp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now),
        revoked: false,
    };
    if let Err(e) = store.tokens.insert(&record).await {
        error!(error = %e, "Failed to store refresh token");
        return Err(HttpResponse::InternalServerError().finish());
    }

    Ok(LoginResponse {
        access_token,
        refresh_token,
    })
}

/// User registration handler
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
pub async fn register(
    user: web::Json<RegisterReq>,
    store: web::Data<Store>,
    audit: web::Data<AuditRecorder>,
    emails: web::Data<EmailRegistry>,
) -> actix_web::Result<impl Responder> {
    let created = users::register(
        &store,
        &audit,
        &emails,
        &user.name,
        &user.email,
        &user.password,
    )
    .await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Tokens issued; session cookie set", body = LoginResponse),
        (status = 400, description = "Email or password missing"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(store, config, user),
    fields(email = %user.email)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    store: web::Data<Store>,
    config: web::Data<Config>,
) -> impl Responder {
    info!("Login request received");

    // 1️⃣ Basic validation
    if user.email.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty email or password");
        return HttpResponse::BadRequest().json(json!({"error": "Email and password are required"}));
    }

    debug!("Fetching user from store");

    // 2️⃣ Fetch user
    let db_user = match store.users.find_by_email(&normalize_email(&user.email)).await {
        Ok(Some(found)) => {
            debug!(user_id = %found.id, "User found");
            found
        }
        Ok(None) => {
            info!("Invalid credentials: user not found");
            return HttpResponse::Unauthorized().json(json!({"error": "Invalid credentials"}));
        }
        Err(e) => {
            error!(error = %e, "Store error while fetching user");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 3️⃣ Verify password
    match verify_password(&user.password, &db_user.password_hash) {
        Ok(true) => debug!("Password verified"),
        Ok(false) => {
            info!("Invalid credentials: password mismatch");
            return HttpResponse::Unauthorized().json(json!({"error": "Invalid credentials"}));
        }
        Err(e) => {
            error!(error = %e, "Stored password hash is unusable");
            return HttpResponse::InternalServerError().finish();
        }
    }

    // 4️⃣ Issue tokens
    let tokens = match issue_tokens(&db_user, &store, &config).await {
        Ok(t) => t,
        Err(resp) => return resp,
    };

    info!("Login successful");

    HttpResponse::Ok()
        .cookie(session_cookie(&tokens.access_token, config.access_token_ttl))
        .json(tokens)
}

/// Rotates a refresh token: the presented one is revoked, a new pair is issued.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = LoginResponse),
        (status = 401, description = "Missing, invalid, revoked or non-refresh token")
    ),
    tag = "Auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn refresh_token(
    req: HttpRequest,
    store: web::Data<Store>,
    config: web::Data<Config>,
) -> impl Responder {
    let token = match bearer(&req) {
        Some(t) => t,
        None => return HttpResponse::Unauthorized().json(json!({"error": "No token"})),
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return HttpResponse::Unauthorized().finish(),
    };

    if claims.token_type != TokenType::Refresh {
        return HttpResponse::Unauthorized().finish();
    }

    // 🔍 find refresh token in store
    match store.tokens.find(&claims.jti).await {
        Ok(Some(record)) if !record.revoked && record.user_id == claims.user_id => {}
        Ok(_) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            error!(error = %e, "Failed to look up refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    }

    // 🔥 revoke old refresh token; losing this race means it was already used
    match store.tokens.revoke(&claims.jti).await {
        Ok(true) => {}
        Ok(false) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            error!(error = %e, "Failed to revoke refresh token");
            return HttpResponse::InternalServerError().finish();
        }
    }

    // Role may have changed since the token was issued
    let user = match store.users.find_by_id(claims.user_id).await {
        Ok(Some(u)) => u,
        Ok(None) => return HttpResponse::Unauthorized().finish(),
        Err(e) => {
            error!(error = %e, "Failed to load user for refresh");
            return HttpResponse::InternalServerError().finish();
        }
    };

    // 🔄 issue new pair
    match issue_tokens(&user, &store, &config).await {
        Ok(tokens) => HttpResponse::Ok()
            .cookie(session_cookie(&tokens.access_token, config.access_token_ttl))
            .json(tokens),
        Err(resp) => resp,
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Refresh token revoked (if it existed); session cookie cleared")
    ),
    tag = "Auth",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(
    req: HttpRequest,
    store: web::Data<Store>,
    config: web::Data<Config>,
) -> impl Responder {
    let done = || {
        HttpResponse::NoContent()
            .cookie(cleared_session_cookie())
            .finish()
    };

    // 1️⃣ extract Authorization header
    let token = match bearer(&req) {
        Some(t) => t,
        None => return done(),
    };

    // 2️⃣ verify JWT
    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) => c,
        Err(_) => return done(),
    };

    // 3️⃣ only refresh tokens can logout
    if claims.token_type != TokenType::Refresh {
        return done();
    }

    // 4️⃣ revoke refresh token (idempotent)
    if let Err(e) = store.tokens.revoke(&claims.jti).await {
        error!(error = %e, "Failed to revoke refresh token on logout");
    }

    // 5️⃣ success (even if token didn't exist)
    done()
}
