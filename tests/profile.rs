mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};

use common::{Ctx, PASSWORD, bearer, get, post, token_for};
use hrm_portal::auth::access::Actor;
use hrm_portal::auth::password::verify_password;
use hrm_portal::error::ServiceError;
use hrm_portal::model::role::Role;
use hrm_portal::service::profile::{self, ProfileUpdate};

#[actix_web::test]
async fn short_new_password_leaves_hash_unchanged() {
    let ctx = Ctx::new();
    let alice = ctx.seed("Alice", "alice@company.com", Role::User).await;
    let app = test::init_service(ctx.app()).await;

    let req = post("/api/profile/update")
        .insert_header(bearer(&token_for(&alice)))
        .set_json(json!({"currentPassword": PASSWORD, "newPassword": "abc"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let stored = ctx.store.users.find_by_id(alice.id).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, alice.password_hash);
}

#[actix_web::test]
async fn password_change_replaces_the_old_one() {
    let ctx = Ctx::new();
    let alice = ctx.seed("Alice", "alice@company.com", Role::User).await;
    let app = test::init_service(ctx.app()).await;

    let req = post("/api/profile/update")
        .insert_header(bearer(&token_for(&alice)))
        .set_json(json!({"currentPassword": PASSWORD, "newPassword": "n3w-secret"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Profile updated successfully");
    assert_eq!(body["user"]["email"], "alice@company.com");
    assert!(body["user"].get("password_hash").is_none());

    let stored = ctx.store.users.find_by_id(alice.id).await.unwrap().unwrap();
    assert!(verify_password("n3w-secret", &stored.password_hash).unwrap());
    assert!(!verify_password(PASSWORD, &stored.password_hash).unwrap());
}

#[actix_web::test]
async fn wrong_current_password_is_rejected() {
    let ctx = Ctx::new();
    let alice = ctx.seed("Alice", "alice@company.com", Role::User).await;
    let actor = Actor { id: alice.id, role: alice.role };

    let err = profile::update_profile(
        &ctx.store,
        &ctx.audit,
        &actor,
        ProfileUpdate {
            name: Some("Alicia".into()),
            current_password: Some("not-it".into()),
            new_password: Some("n3w-secret".into()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidCredentials));

    // nothing applied, not even the name
    let stored = ctx.store.users.find_by_id(alice.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Alice");
}

#[actix_web::test]
async fn unchanged_fields_are_a_no_op() {
    let ctx = Ctx::new();
    let alice = ctx.seed("Alice", "alice@company.com", Role::User).await;
    let actor = Actor { id: alice.id, role: alice.role };

    for update in [
        ProfileUpdate::default(),
        ProfileUpdate { name: Some("  Alice ".into()), ..Default::default() },
        // a lone new password is ignored without the current one
        ProfileUpdate { new_password: Some("n3w-secret".into()), ..Default::default() },
    ] {
        let err = profile::update_profile(&ctx.store, &ctx.audit, &actor, update)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoOp));
    }
}

#[actix_web::test]
async fn name_and_password_land_in_one_write() {
    let ctx = Ctx::new();
    let alice = ctx.seed("Alice", "alice@company.com", Role::User).await;
    let actor = Actor { id: alice.id, role: alice.role };
    let before = ctx.backend.write_count();

    let summary = profile::update_profile(
        &ctx.store,
        &ctx.audit,
        &actor,
        ProfileUpdate {
            name: Some("Alicia".into()),
            current_password: Some(PASSWORD.into()),
            new_password: Some("n3w-secret".into()),
        },
    )
    .await
    .unwrap();
    assert_eq!(summary.name, "Alicia");

    // one user write plus one audit append
    assert_eq!(ctx.backend.write_count() - before, 2);
    let stored = ctx.store.users.find_by_id(alice.id).await.unwrap().unwrap();
    assert_eq!(stored.name, "Alicia");
    assert!(verify_password("n3w-secret", &stored.password_hash).unwrap());
}

#[actix_web::test]
async fn profile_reads_the_session_account() {
    let ctx = Ctx::new();
    let alice = ctx.seed("Alice", "alice@company.com", Role::Hr).await;
    let app = test::init_service(ctx.app()).await;

    let req = get("/api/profile").insert_header(bearer(&token_for(&alice))).to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["name"], "Alice");
    assert_eq!(body["role"], "HR");
    assert!(body["department"].is_null());
}
