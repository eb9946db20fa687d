use crate::auth::access::Actor;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use crate::models::TokenType;
use actix_web::{
    FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized, web::Data,
};
use futures::future::{Ready, ready};
use uuid::Uuid;

/// Cookie carrying the access token for browser navigation.
pub const SESSION_COOKIE: &str = "session";

/// Authenticated session, resolved from a bearer header or the session cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn actor(&self) -> Actor {
        Actor {
            id: self.user_id,
            role: self.role,
        }
    }
}

/// Bearer token if present, otherwise the session cookie.
pub fn session_token(req: &HttpRequest) -> Option<String> {
    if let Some(token) = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        return Some(token.to_string());
    }
    req.cookie(SESSION_COOKIE).map(|c| c.value().to_string())
}

/// Resolves the session of a request. The error is a client-safe reason.
pub fn authenticate(req: &HttpRequest, secret: &str) -> Result<AuthUser, &'static str> {
    let token = session_token(req).ok_or("Missing token")?;
    let claims = verify_token(&token, secret).map_err(|_| "Invalid or expired token")?;
    if claims.token_type != TokenType::Access {
        return Err("Access token required");
    }

    Ok(AuthUser {
        user_id: claims.user_id,
        email: claims.sub,
        role: claims.role,
    })
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already resolved by the auth middleware
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                return ready(Err(
                    actix_web::error::ErrorInternalServerError("Config missing"),
                ))
            }
        };

        ready(authenticate(req, &config.jwt_secret).map_err(ErrorUnauthorized))
    }
}
