use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::{build_router, AppState};
use crate::cache::create_cache;
use crate::config::CacheConfig;
use crate::db::repositories::test_support::migrated_pool;

async fn app() -> Router {
    let pool = migrated_pool().await;
    let cache = create_cache(&CacheConfig::default());
    build_router(AppState::new(pool, cache, 7), "*")
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &Router, name: &str, email: &str) -> (String, Value) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let token = body["data"]["accessToken"].as_str().unwrap().to_string();
    (token, body["data"]["user"].clone())
}

#[tokio::test]
async fn test_health() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_unknown_route_uses_envelope() {
    let app = app().await;
    let (status, body) = send(&app, Method::GET, "/api/v1/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["errorMessages"].is_array());
}

#[tokio::test]
async fn test_register_login_and_roles() {
    let app = app().await;

    let (admin_token, admin) = register(&app, "Admin", "admin@example.com").await;
    assert_eq!(admin["role"], "admin");
    assert!(admin.get("passwordHash").is_none());

    let (_, learner) = register(&app, "Learner", "learner@example.com").await;
    assert_eq!(learner["role"], "user");

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": "Again", "email": "admin@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["success"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "learner@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", body);

    let (status, body) = send(&app, Method::GET, "/api/v1/auth/me", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "admin@example.com");

    let (status, body) = send(&app, Method::GET, "/api/v1/users?limit=1", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["meta"]["totalPages"], 2);
}

#[tokio::test]
async fn test_register_reports_every_invalid_field() {
    let app = app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/auth/register",
        None,
        Some(json!({ "name": "", "email": "not-an-email", "password": "123" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let paths: Vec<&str> = body["errorMessages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert!(paths.contains(&"name"));
    assert!(paths.contains(&"email"));
    assert!(paths.contains(&"password"));
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let app = app().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_role_guards() {
    let app = app().await;
    let (admin_token, _) = register(&app, "Admin", "admin@example.com").await;
    let (user_token, learner) = register(&app, "Learner", "learner@example.com").await;

    let course = json!({ "title": "Rust Basics", "price": 20.0 });

    let (status, _) = send(&app, Method::POST, "/api/v1/courses", None, Some(course.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, "/api/v1/courses", Some(&user_token), Some(course.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/api/v1/users", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let uri = format!("/api/v1/users/{}/role", learner["id"]);
    let (status, body) = send(&app, Method::PATCH, &uri, Some(&admin_token), Some(json!({ "role": "mentor" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "mentor");

    let (status, body) = send(&app, Method::POST, "/api/v1/courses", Some(&user_token), Some(course)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["mentorId"], learner["id"]);
}

#[tokio::test]
async fn test_blocked_user_loses_session() {
    let app = app().await;
    let (admin_token, _) = register(&app, "Admin", "admin@example.com").await;
    let (user_token, learner) = register(&app, "Learner", "learner@example.com").await;

    let uri = format!("/api/v1/users/{}/status", learner["id"]);
    let (status, _) = send(&app, Method::PATCH, &uri, Some(&admin_token), Some(json!({ "status": "blocked" }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/api/v1/auth/me", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "email": "learner@example.com", "password": "secret123" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_course_content_and_progress() {
    let app = app().await;
    let (admin_token, _) = register(&app, "Admin", "admin@example.com").await;
    let (user_token, _) = register(&app, "Learner", "learner@example.com").await;

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v1/courses",
        Some(&admin_token),
        Some(json!({ "title": "Rust Basics", "status": "published" })),
    )
    .await;
    let course_id = body["data"]["id"].as_i64().unwrap();

    let mut lesson_ids = Vec::new();
    for module_order in [2, 1] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/modules",
            Some(&admin_token),
            Some(json!({ "courseId": course_id, "title": format!("Module {}", module_order), "order": module_order })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        let module_id = body["data"]["id"].as_i64().unwrap();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/lessons",
            Some(&admin_token),
            Some(json!({ "courseId": course_id, "module": module_id, "title": "Intro", "order": 1 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        lesson_ids.push(body["data"]["id"].as_i64().unwrap());
    }

    let content_uri = format!("/api/v1/courses/{}/content", course_id);
    let (status, body) = send(&app, Method::GET, &content_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let sections = body["data"]["curriculum"].as_array().unwrap();
    assert_eq!(sections.len(), 2);
    assert_eq!(sections[0]["module"]["title"], "Module 1");
    assert_eq!(body["data"]["completedLessons"], json!([]));

    let progress_uri = format!("/api/v1/courses/{}/progress", course_id);
    let (status, body) = send(
        &app,
        Method::POST,
        &progress_uri,
        Some(&user_token),
        Some(json!({ "lessonId": lesson_ids[0] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["data"]["percent"], 50);

    let (_, body) = send(&app, Method::GET, &content_uri, Some(&user_token), None).await;
    assert_eq!(body["data"]["completedLessons"], json!([lesson_ids[0]]));

    let (status, body) = send(&app, Method::GET, &progress_uri, Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalLessons"], 2);
}

#[tokio::test]
async fn test_reviews_and_favorites_routes() {
    let app = app().await;
    let (admin_token, _) = register(&app, "Admin", "admin@example.com").await;
    let (user_token, _) = register(&app, "Learner", "learner@example.com").await;

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/v1/softwares",
        Some(&admin_token),
        Some(json!({ "title": "Editor", "price": 15.0, "status": "published" })),
    )
    .await;
    let software_id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/reviews",
        Some(&user_token),
        Some(json!({ "productType": "software", "productId": software_id, "rating": 5, "comment": "Great" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let review_id = body["data"]["id"].as_i64().unwrap();

    let status_uri = format!("/api/v1/reviews/{}/status", review_id);
    let (status, _) = send(&app, Method::PATCH, &status_uri, Some(&admin_token), Some(json!({ "status": "approved" }))).await;
    assert_eq!(status, StatusCode::OK);

    let public_uri = format!("/api/v1/reviews/software/{}", software_id);
    let (status, body) = send(&app, Method::GET, &public_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["averageRating"], 5.0);

    let toggle = json!({ "productType": "software", "productId": software_id });
    let (_, body) = send(&app, Method::POST, "/api/v1/favorites", Some(&user_token), Some(toggle)).await;
    assert_eq!(body["data"]["favorited"], true);

    let (status, body) = send(&app, Method::GET, "/api/v1/favorites/all", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/api/v1/websites", None, None).await;
    assert_eq!(status, StatusCode::OK);
}
