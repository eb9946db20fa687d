mod common;

use actix_web::http::{StatusCode, header};
use actix_web::test;
use serde_json::{Value, json};

use common::{Ctx, PASSWORD, bearer, get, post, token_for};
use hrm_portal::auth::auth::SESSION_COOKIE;
use hrm_portal::model::role::Role;

#[actix_web::test]
async fn register_then_login_sets_session_cookie() {
    let ctx = Ctx::new();
    let app = test::init_service(ctx.app()).await;

    let req = post("/auth/register")
        .set_json(json!({"name": "Alice", "email": " Alice@Company.com ", "password": PASSWORD}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], "alice@company.com");
    assert_eq!(body["role"], "User");

    let req = post("/auth/register")
        .set_json(json!({"name": "Other", "email": "alice@company.com", "password": PASSWORD}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = post("/auth/login")
        .set_json(json!({"email": "alice@company.com", "password": PASSWORD}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let session = resp
        .response()
        .cookies()
        .find(|c| c.name() == SESSION_COOKIE)
        .map(|c| c.into_owned())
        .expect("session cookie");
    assert_eq!(session.http_only(), Some(true));

    let req = get("/dashboard").cookie(session).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["email"], "alice@company.com");
}

#[actix_web::test]
async fn bad_credentials_look_the_same() {
    let ctx = Ctx::new();
    ctx.seed("Alice", "alice@company.com", Role::User).await;
    let app = test::init_service(ctx.app()).await;

    for (email, password) in [("alice@company.com", "wrong-pass"), ("nobody@company.com", PASSWORD)] {
        let req = post("/auth/login")
            .set_json(json!({"email": email, "password": password}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Invalid credentials");
    }
}

#[actix_web::test]
async fn refresh_rotates_and_logout_revokes() {
    let ctx = Ctx::new();
    ctx.seed("Alice", "alice@company.com", Role::User).await;
    let app = test::init_service(ctx.app()).await;

    let req = post("/auth/login")
        .set_json(json!({"email": "alice@company.com", "password": PASSWORD}))
        .to_request();
    let tokens: Value = test::call_and_read_body_json(&app, req).await;
    let first = tokens["refresh_token"].as_str().unwrap().to_string();

    // access tokens cannot refresh
    let req = post("/auth/refresh")
        .insert_header(bearer(tokens["access_token"].as_str().unwrap()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = post("/auth/refresh").insert_header(bearer(&first)).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let rotated: Value = test::read_body_json(resp).await;
    let second = rotated["refresh_token"].as_str().unwrap().to_string();

    // the first one was spent
    let req = post("/auth/refresh").insert_header(bearer(&first)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    let req = post("/auth/logout").insert_header(bearer(&second)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = post("/auth/refresh").insert_header(bearer(&second)).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

    // logout never fails
    let req = post("/auth/logout").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn refresh_picks_up_role_changes() {
    let ctx = Ctx::new();
    let alice = ctx.seed("Alice", "alice@company.com", Role::User).await;
    let app = test::init_service(ctx.app()).await;

    let req = post("/auth/login")
        .set_json(json!({"email": "alice@company.com", "password": PASSWORD}))
        .to_request();
    let tokens: Value = test::call_and_read_body_json(&app, req).await;

    let promoted = hrm_portal::model::user::UserChanges {
        role: Some(Role::Hr),
        ..Default::default()
    };
    assert!(ctx.store.users.update(alice.id, &promoted).await.unwrap());

    let req = post("/auth/refresh")
        .insert_header(bearer(tokens["refresh_token"].as_str().unwrap()))
        .to_request();
    let rotated: Value = test::call_and_read_body_json(&app, req).await;
    let claims = hrm_portal::auth::jwt::verify_token(
        rotated["access_token"].as_str().unwrap(),
        common::SECRET,
    )
    .unwrap();
    assert_eq!(claims.role, Role::Hr);
}

#[actix_web::test]
async fn navigation_redirects() {
    let ctx = Ctx::new();
    let alice = ctx.seed("Alice", "alice@company.com", Role::User).await;
    let hr = ctx.seed("Hana", "hr@company.com", Role::Hr).await;
    let root = ctx.seed("Root", "root@company.com", Role::SuperAdmin).await;
    let app = test::init_service(ctx.app()).await;

    let req = get("/dashboard").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");

    let req = get("/admin").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login");

    for user in [&alice, &hr] {
        let req = get("/admin").insert_header(bearer(&token_for(user))).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/dashboard");
    }

    let req = get("/admin").insert_header(bearer(&token_for(&root))).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["users"], 3);
}

#[actix_web::test]
async fn admin_subpages_and_unknown_pages_pass_the_gate() {
    let ctx = Ctx::new();
    let alice = ctx.seed("Alice", "alice@company.com", Role::User).await;
    let hr = ctx.seed("Hana", "hr@company.com", Role::Hr).await;
    let root = ctx.seed("Root", "root@company.com", Role::SuperAdmin).await;
    let app = test::init_service(ctx.app()).await;

    for path in ["/admin/users", "/leaves", "/profile"] {
        let req = get(path).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/login", "{path}");
    }

    for user in [&alice, &hr] {
        let req = get("/admin/users").insert_header(bearer(&token_for(user))).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/dashboard");
    }

    let req = get("/admin/users").insert_header(bearer(&token_for(&root))).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["users"], 3);

    let req = get("/leaves").insert_header(bearer(&token_for(&alice))).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Page not found");

    let req = get("/login").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = get("/api/nowhere").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn api_rejects_missing_or_refresh_tokens() {
    let ctx = Ctx::new();
    let app = test::init_service(ctx.app()).await;

    let req = get("/api/profile").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Missing token");

    let req = get("/api/profile").insert_header(bearer("garbage")).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
}
