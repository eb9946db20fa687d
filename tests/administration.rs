mod common;

use actix_web::http::StatusCode;
use actix_web::test;
use serde_json::{Value, json};

use common::{Ctx, PASSWORD, bearer, delete, get, patch, post, put, token_for};
use hrm_portal::model::role::Role;

#[actix_web::test]
async fn superadmin_manages_users() {
    let ctx = Ctx::new();
    let root = ctx.seed("Root", "root@company.com", Role::SuperAdmin).await;
    ctx.seed("Alice", "alice@company.com", Role::User).await;
    let app = test::init_service(ctx.app()).await;
    let auth = bearer(&token_for(&root));

    let req = post("/api/users")
        .insert_header(auth.clone())
        .set_json(json!({"name": "Hana", "email": "hana@company.com", "password": PASSWORD, "role": "HR"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let hana: Value = test::read_body_json(resp).await;
    assert_eq!(hana["role"], "HR");
    let hana_id = hana["id"].as_str().unwrap().to_string();

    let req = post("/api/users")
        .insert_header(auth.clone())
        .set_json(json!({"name": "Dup", "email": "ALICE@company.com", "password": PASSWORD}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = put(&format!("/api/users/{}", hana_id))
        .insert_header(auth.clone())
        .set_json(json!({"email": "alice@company.com"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

    let req = put(&format!("/api/users/{}", hana_id))
        .insert_header(auth.clone())
        .set_json(json!({"name": "Hana Lee", "role": "User"}))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["name"], "Hana Lee");
    assert_eq!(updated["role"], "User");

    let req = patch(&format!("/api/users/{}", hana_id))
        .insert_header(auth.clone())
        .set_json(json!({"name": "Hana Park"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let patched: Value = test::read_body_json(resp).await;
    assert_eq!(patched["name"], "Hana Park");
    assert_eq!(patched["role"], "User");

    let req = put(&format!("/api/users/{}", hana_id))
        .insert_header(auth.clone())
        .set_json(json!({}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = get("/api/users").insert_header(auth.clone()).to_request();
    let users: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(users.len(), 3);

    let req = delete(&format!("/api/users/{}", root.id))
        .insert_header(auth.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = delete(&format!("/api/users/{}", hana_id))
        .insert_header(auth.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    // the released address can be registered again
    let req = post("/auth/register")
        .set_json(json!({"name": "Hana", "email": "hana@company.com", "password": PASSWORD}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
}

#[actix_web::test]
async fn user_administration_is_superadmin_only() {
    let ctx = Ctx::new();
    let hr = ctx.seed("Hana", "hr@company.com", Role::Hr).await;
    let app = test::init_service(ctx.app()).await;

    let req = get("/api/users").insert_header(bearer(&token_for(&hr))).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = get("/api/audit-logs").insert_header(bearer(&token_for(&hr))).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = post("/api/departments")
        .insert_header(bearer(&token_for(&hr)))
        .set_json(json!({"name": "Ops"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn departments_track_members() {
    let ctx = Ctx::new();
    let root = ctx.seed("Root", "root@company.com", Role::SuperAdmin).await;
    let alice = ctx.seed("Alice", "alice@company.com", Role::User).await;
    let app = test::init_service(ctx.app()).await;
    let auth = bearer(&token_for(&root));

    let req = post("/api/departments")
        .insert_header(auth.clone())
        .set_json(json!({"name": "Engineering", "description": "Platform"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let dept: Value = test::read_body_json(resp).await;
    let dept_id = dept["id"].as_str().unwrap().to_string();

    let req = put(&format!("/api/users/{}", alice.id))
        .insert_header(auth.clone())
        .set_json(json!({"department": dept_id}))
        .to_request();
    let updated: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(updated["department"]["name"], "Engineering");

    let req = put(&format!("/api/users/{}", alice.id))
        .insert_header(auth.clone())
        .set_json(json!({"department": "not-a-uuid"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = get("/api/departments").insert_header(auth.clone()).to_request();
    let list: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(list[0]["memberCount"], 1);

    let req = get(&format!("/api/departments/{}", dept_id))
        .insert_header(bearer(&token_for(&alice)))
        .to_request();
    let detail: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(detail["members"][0]["email"], "alice@company.com");

    let req = put(&format!("/api/departments/{}", dept_id))
        .insert_header(auth.clone())
        .set_json(json!({"name": "Engineering"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = patch(&format!("/api/departments/{}", dept_id))
        .insert_header(auth.clone())
        .set_json(json!({"name": "Platform"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let renamed: Value = test::read_body_json(resp).await;
    assert_eq!(renamed["name"], "Platform");

    let req = delete(&format!("/api/departments/{}", dept_id))
        .insert_header(auth.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let stored = ctx.store.users.find_by_id(alice.id).await.unwrap().unwrap();
    assert_eq!(stored.department_id, None);

    let req = get(&format!("/api/departments/{}", dept_id))
        .insert_header(auth.clone())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn audit_log_is_filterable() {
    let ctx = Ctx::new();
    let root = ctx.seed("Root", "root@company.com", Role::SuperAdmin).await;
    let app = test::init_service(ctx.app()).await;
    let auth = bearer(&token_for(&root));

    for name in ["Ops", "Sales"] {
        let req = post("/api/departments")
            .insert_header(auth.clone())
            .set_json(json!({"name": name}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);
    }

    let req = get("/api/audit-logs?action=department.created&limit=1")
        .insert_header(auth.clone())
        .to_request();
    let entries: Vec<Value> = test::call_and_read_body_json(&app, req).await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["metadata"]["name"], "Sales");
    assert_eq!(entries[0]["performedBy"], root.id.to_string());
}
