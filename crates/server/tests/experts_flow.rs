use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use migration::MigratorTrait;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection, EntityTrait, IntoActiveModel};
use serde_json::{json, Value};
use tower::Service;
use uuid::Uuid;

use server::routes::{self, ServerState};

fn cors() -> tower_http::cors::CorsLayer {
    tower_http::cors::CorsLayer::very_permissive()
}

async fn build_app() -> anyhow::Result<(Router, DatabaseConnection)> {
    let db = models::db::connect().await?;
    // Run migrations to ensure schema; tolerate an already-migrated database
    if let Err(e) = migration::Migrator::up(&db, None).await {
        let msg = format!("{}", e);
        if msg.contains("duplicate key value violates unique constraint") {
            eprintln!("migrations already applied, continue: {}", msg);
        } else {
            return Err(e.into());
        }
    }
    let state = ServerState::new(db.clone());
    Ok((routes::build_router(cors(), state), db))
}

async fn body_json(resp: axum::response::Response) -> anyhow::Result<Value> {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn post_json(uri: &str, body: &Value) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body)?))?)
}

fn get(uri: &str) -> anyhow::Result<Request<Body>> {
    Ok(Request::builder().method("GET").uri(uri).body(Body::empty())?)
}

/// Flip a registered account to `active` status so it surfaces in expert
/// queries. The HTTP surface only flips the enabled flag via verification;
/// status promotion is an out-of-band moderation step.
async fn activate(db: &DatabaseConnection, user_id: Uuid) -> anyhow::Result<()> {
    let user = models::user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .expect("registered user exists");
    let mut active = user.into_active_model();
    active.status = Set(models::user::STATUS_ACTIVE.to_string());
    active.update(db).await?;
    Ok(())
}

#[tokio::test]
async fn test_register_verify_and_search_flow() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let (app, db) = build_app().await?;
    let mut app = app;

    let suffix = Uuid::new_v4().simple().to_string();
    let first = format!("Flow{}", &suffix[..8]);
    let email = format!("flow_{}@example.com", suffix);

    // Register
    let req = post_json(
        "/auth/register",
        &json!({"name": format!("{} Expert", first), "email": email, "password": "S3curePass!"}),
    )?;
    let resp = app.call(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let out = body_json(resp).await?;
    let user_id: Uuid = out["user_id"].as_str().unwrap().parse()?;
    let token = out["verification_token"].as_str().unwrap().to_string();

    // A fresh account is not an expert yet
    let resp = app.call(get(&format!("/experts?name={}", first))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await?;
    assert_eq!(page["total"], 0);

    // Verify enables the account; moderation activates it
    let resp = app.call(post_json("/auth/verify", &json!({"token": token}))?).await?;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    // The token was consumed; replaying it fails
    let resp = app.call(post_json("/auth/verify", &json!({"token": token}))?).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    activate(&db, user_id).await?;

    // One-term name search now finds the profile
    let resp = app.call(get(&format!("/experts?name={}", first))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await?;
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"].as_str().unwrap(), user_id.to_string());

    // Two-term search hits the first/last variant
    let resp = app
        .call(get(&format!("/experts?name={}%20Expert", first))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let page = body_json(resp).await?;
    assert_eq!(page["total"], 1);

    // Profile lookup by id
    let resp = app.call(get(&format!("/experts/{}", user_id))?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let profile = body_json(resp).await?;
    assert_eq!(profile["first_name"].as_str().unwrap(), first);

    // cleanup
    models::user::hard_delete(&db, user_id).await?;
    Ok(())
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let (mut app, db) = build_app().await?;

    let email = format!("dup_{}@example.com", Uuid::new_v4().simple());
    let body = json!({"name": "Dup Tester", "email": email, "password": "S3curePass!"});

    let resp = app.call(post_json("/auth/register", &body)?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let out = body_json(resp).await?;
    let user_id: Uuid = out["user_id"].as_str().unwrap().parse()?;

    let resp = app.call(post_json("/auth/register", &body)?).await?;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    models::user::hard_delete(&db, user_id).await?;
    Ok(())
}

#[tokio::test]
async fn test_verify_unknown_token_is_not_found() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let (mut app, _db) = build_app().await?;

    let resp = app
        .call(post_json("/auth/verify", &json!({"token": Uuid::new_v4().to_string()}))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn test_search_rejects_name_combined_with_tags() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let (mut app, _db) = build_app().await?;

    let resp = app
        .call(get(&format!("/experts?name=Ada&directions={}", Uuid::new_v4()))?)
        .await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await?;
    assert!(body["error"].as_str().unwrap().contains("wrong search parameters"));
    Ok(())
}

#[tokio::test]
async fn test_search_rejects_malformed_tag_id() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let (mut app, _db) = build_app().await?;

    let resp = app.call(get("/experts?directions=not-a-uuid")?).await?;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn test_health_endpoint() -> anyhow::Result<()> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return Ok(());
    }
    let (mut app, _db) = build_app().await?;

    let resp = app.call(get("/health")?).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await?;
    assert_eq!(body["status"], "ok");
    Ok(())
}
