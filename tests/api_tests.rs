//! API 集成测试
//!
//! 通过完整路由栈测试 HTTP 端点

mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use common::{create_test_app_state, create_user, unique};
use greenmine::routes;
use http_body_util::BodyExt;
use serial_test::serial;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

// ==================== 健康检查 ====================

#[tokio::test]
#[serial]
async fn test_health_check_endpoint() {
    let state = create_test_app_state().await;
    let app = routes::create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
#[serial]
async fn test_readiness_check_endpoint() {
    let state = create_test_app_state().await;
    let app = routes::create_router(state);

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ready");
}

#[tokio::test]
#[serial]
async fn test_cross_origin_requests_get_cors_headers() {
    let state = create_test_app_state().await;
    let app = routes::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("origin", "https://example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("access-control-allow-origin"));
}

// ==================== 认证 ====================

#[tokio::test]
#[serial]
async fn test_login_and_me_round_trip() {
    let state = create_test_app_state().await;
    let user = create_user(&state.db, None, "Password1").await;
    let app = routes::create_router(state);

    let login_body = serde_json::json!({
        "username": user.username,
        "password": "Password1",
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/auth/login")
                .header("content-type", "application/json")
                .body(Body::from(login_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let token = json["access_token"].as_str().unwrap().to_string();
    assert_eq!(json["user"]["username"], user.username.as_str());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/auth/me")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["username"], user.username.as_str());
    assert_eq!(json["is_administrator"], false);
}

#[tokio::test]
#[serial]
async fn test_login_with_wrong_password_is_unauthorized() {
    let state = create_test_app_state().await;
    let user = create_user(&state.db, None, "Password1").await;
    let app = routes::create_router(state);

    for (username, password) in [
        (user.username.as_str(), "WrongPassword1"),
        ("no_such_user", "Password1"),
    ] {
        let body = serde_json::json!({ "username": username, "password": password });
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/v1/auth/login")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        // 账号不存在和密码错误同样返回 401
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], 401);
    }
}

#[tokio::test]
#[serial]
async fn test_protected_route_requires_token() {
    let state = create_test_app_state().await;
    let app = routes::create_router(state);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/v1/projects")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/projects")
                .header("authorization", "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ==================== 管理后台 ====================

#[tokio::test]
#[serial]
async fn test_admin_routes_reject_non_administrators() {
    let state = create_test_app_state().await;
    let pentester = create_user(&state.db, Some("Pentester"), "Password1").await;
    let token = state
        .jwt_service
        .generate_access_token(&pentester.id, &pentester.username)
        .unwrap();
    let app = routes::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/roles")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], 403);
}

#[tokio::test]
#[serial]
async fn test_admin_can_list_roles() {
    let state = create_test_app_state().await;
    let admin = create_user(&state.db, Some("Administrator"), "Password1").await;
    let token = state
        .jwt_service
        .generate_access_token(&admin.id, &admin.username)
        .unwrap();
    let app = routes::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/admin/roles")
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    // 种子数据里至少有匿名角色
    let roles = json["roles"].as_array().unwrap();
    assert!(roles.iter().any(|r| r["string_slug"] == "anonymous"));
}

// ==================== 表格端点 ====================

#[tokio::test]
#[serial]
async fn test_invalid_sort_order_is_rejected_with_400() {
    let state = create_test_app_state().await;
    let leader = create_user(&state.db, None, "Password1").await;
    let token = state
        .jwt_service
        .generate_access_token(&leader.id, &leader.username)
        .unwrap();

    let project_id = common::create_project(&state.db, leader.id).await;
    let app = routes::create_router(state);

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/v1/projects/{project_id}/issues?sort=status&order=sideways"
                ))
                .header("authorization", format!("Bearer {token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], 400);
}
