//! Integration tests for the Writify API.
//!
//! Router-level tests that never reach the store run everywhere; tests
//! marked `#[ignore]` need a live PostgreSQL:
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/writify_test cargo test -p writify-api -- --ignored
//! ```

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{body_json, TestContext};
use serde_json::json;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_v1_requires_a_session() {
    let mut ctx = TestContext::lazy();

    let response = ctx.call(get("/v1/profile")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_garbage_session_rejected() {
    let mut ctx = TestContext::lazy();

    let request = Request::builder()
        .uri("/v1/requests")
        .header(header::COOKIE, "writify_session=not-a-real-token")
        .body(Body::empty())
        .unwrap();

    let response = ctx.call(request).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_google_login_redirects_with_state_cookie() {
    let mut ctx = TestContext::lazy();

    let response = ctx.call(get("/auth/google")).await;
    assert!(response.status().is_redirection());

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(location.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
    assert!(location.contains("client_id=test-client-id"));

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(set_cookie.starts_with("writify_oauth_state="));
    assert!(set_cookie.contains("HttpOnly"));
}

#[tokio::test]
async fn test_callback_without_state_redirects_to_login_error() {
    let mut ctx = TestContext::lazy();

    // A forged callback with a code but no state cookie must bounce.
    let response = ctx.call(get("/auth/google/callback?code=abc&state=xyz")).await;
    assert!(response.status().is_redirection());

    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(location, "http://localhost:3000/login?error=unauthorized");
}

#[tokio::test]
async fn test_logout_clears_session_cookie() {
    let mut ctx = TestContext::lazy();

    let response = ctx.call(get("/auth/logout")).await;
    assert!(response.status().is_redirection());

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(set_cookie.starts_with("writify_session=;"));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_auth_status_without_session() {
    let mut ctx = TestContext::lazy();

    let response = ctx.call(get("/auth/status")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["is_authenticated"], false);
}

#[tokio::test]
async fn test_security_headers_present() {
    let mut ctx = TestContext::lazy();

    let response = ctx.call(get("/auth/status")).await;
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_request_flow_over_http() {
    let mut ctx = TestContext::connected().await;

    let client = ctx.create_user(Some("9876543210")).await;
    let writer = ctx.create_user(Some("1234509876")).await;

    // Client posts a request; the cost normalizes to 250.
    let request = Request::builder()
        .method("POST")
        .uri("/v1/requests")
        .header(header::AUTHORIZATION, ctx.auth_header(client.id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "course_name": "Distributed Systems",
                "course_code": "CS402",
                "assignment_type": "Essay",
                "num_pages": 5,
                "deadline": "2026-09-01T00:00:00Z",
                "estimated_cost": 237.0
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.call(request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["estimated_cost"], 250);
    assert_eq!(created["status"], "open");
    let request_id = created["id"].as_str().unwrap().to_string();

    // Writer accepts and receives the client's contact number.
    let accept = Request::builder()
        .method("POST")
        .uri(format!("/v1/requests/{request_id}/accept"))
        .header(header::AUTHORIZATION, ctx.auth_header(writer.id))
        .body(Body::empty())
        .unwrap();

    let response = ctx.call(accept).await;
    assert_eq!(response.status(), StatusCode::OK);
    let accepted = body_json(response).await;
    assert_eq!(accepted["status"], "assigned");
    assert_eq!(accepted["client_whatsapp"], "9876543210");

    // A second accept of the same request loses the race shape: 404.
    let latecomer = ctx.create_user(None).await;
    let accept_again = Request::builder()
        .method("POST")
        .uri(format!("/v1/requests/{request_id}/accept"))
        .header(header::AUTHORIZATION, ctx.auth_header(latecomer.id))
        .body(Body::empty())
        .unwrap();

    let response = ctx.call(accept_again).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Client rates the writer; the assignment completes in the same
    // operation.
    let rate = Request::builder()
        .method("POST")
        .uri("/v1/ratings")
        .header(header::AUTHORIZATION, ctx.auth_header(client.id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "rated_id": writer.id,
                "assignment_request_id": request_id,
                "score": 5,
                "comment": "great work"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.call(rate).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let rated = body_json(response).await;
    assert_eq!(rated["assignment_completed"], true);

    // The writer's aggregate reflects the single judgment.
    let ratings = Request::builder()
        .uri("/v1/ratings/mine")
        .header(header::AUTHORIZATION, ctx.auth_header(writer.id))
        .body(Body::empty())
        .unwrap();

    let response = ctx.call(ratings).await;
    let body = body_json(response).await;
    assert_eq!(body["average_rating"], 5.0);
    assert_eq!(body["total_ratings"], 1);
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL (set DATABASE_URL)"]
async fn test_profile_and_portfolio_over_http() {
    let mut ctx = TestContext::connected().await;
    let user = ctx.create_user(None).await;

    // Save a portfolio, then read it back embedded in the profile.
    let save = Request::builder()
        .method("POST")
        .uri("/v1/profile/portfolio")
        .header(header::AUTHORIZATION, ctx.auth_header(user.id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({
                "sample_work_image": "https://example.com/sample.png",
                "description": "essays and lab reports"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.call(save).await;
    assert_eq!(response.status(), StatusCode::OK);

    let profile = Request::builder()
        .uri("/v1/profile")
        .header(header::AUTHORIZATION, ctx.auth_header(user.id))
        .body(Body::empty())
        .unwrap();

    let response = ctx.call(profile).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], user.email);
    assert_eq!(body["portfolio"]["description"], "essays and lab reports");

    // Flip availability to active.
    let update = Request::builder()
        .method("PUT")
        .uri("/v1/profile/writer")
        .header(header::AUTHORIZATION, ctx.auth_header(user.id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "writer_status": "active", "whatsapp_number": "555" }).to_string(),
        ))
        .unwrap();

    let response = ctx.call(update).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["writer_status"], "active");
    assert_eq!(body["whatsapp_number"], "555");
}
