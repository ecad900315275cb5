mod common;

use actix_web::dev::Service;
use actix_web::{http::StatusCode, test};
use serde_json::{json, Value};

use navigator::api::models::LoginResponse;

macro_rules! post_json {
    ($app:expr, $uri:expr, $body:expr) => {{
        let req = test::TestRequest::post().uri($uri).set_json($body).to_request();
        test::call_service(&$app, req).await
    }};
}

#[actix_web::test]
async fn signup_then_login_returns_user_and_token() {
    let state = common::test_state(common::test_config());
    let app = init_app!(state);

    let resp = post_json!(
        app,
        "/api/signup",
        json!({ "username": "ana", "email": "ana@example.com", "password": "s3cret" })
    );
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User registered successfully");

    let stored = state.pool.find_user("ana").await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "s3cret");

    let resp = post_json!(app, "/api/login", json!({ "username": "ana", "password": "s3cret" }));
    assert_eq!(resp.status(), StatusCode::OK);
    let login: LoginResponse = test::read_body_json(resp).await;
    assert_eq!(login.message, "Login successful");
    assert_eq!(login.user_id, stored.id);
    assert_eq!(state.signer.verify(&login.token).unwrap(), stored.id);
}

#[actix_web::test]
async fn login_identifies_the_matching_user_among_several() {
    let state = common::test_state(common::test_config());
    let app = init_app!(state);

    for (username, email, password) in [
        ("ana", "ana@example.com", "first-pw"),
        ("bob", "bob@example.com", "second-pw"),
    ] {
        let resp = post_json!(
            app,
            "/api/signup",
            json!({ "username": username, "email": email, "password": password })
        );
        assert_eq!(resp.status(), StatusCode::CREATED);
    }
    let ana = state.pool.find_user("ana").await.unwrap().unwrap();
    let bob = state.pool.find_user("bob").await.unwrap().unwrap();
    assert_ne!(ana.id, bob.id);

    let resp = post_json!(app, "/api/login", json!({ "username": "bob", "password": "second-pw" }));
    assert_eq!(resp.status(), StatusCode::OK);
    let login: LoginResponse = test::read_body_json(resp).await;
    assert_eq!(login.user_id, bob.id);
    assert_ne!(login.user_id, ana.id);
    assert_eq!(state.signer.verify(&login.token).unwrap(), bob.id);

    // Another user's password does not unlock this account.
    let resp = post_json!(app, "/api/login", json!({ "username": "bob", "password": "first-pw" }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn duplicate_username_or_email_conflicts_and_keeps_original() {
    let state = common::test_state(common::test_config());
    let app = init_app!(state);

    post_json!(
        app,
        "/api/signup",
        json!({ "username": "ana", "email": "ana@example.com", "password": "first" })
    );
    let original = state.pool.find_user("ana").await.unwrap().unwrap();

    for body in [
        json!({ "username": "ana", "email": "other@example.com", "password": "second" }),
        json!({ "username": "bob", "email": "ana@example.com", "password": "second" }),
    ] {
        let resp = post_json!(app, "/api/signup", body);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "User already exists");
    }

    let after = state.pool.find_user("ana").await.unwrap().unwrap();
    assert_eq!(after.id, original.id);
    assert_eq!(after.email, original.email);
    assert_eq!(after.password_hash, original.password_hash);
    assert!(state.pool.find_user("bob").await.unwrap().is_none());

    let resp = post_json!(app, "/api/login", json!({ "username": "ana", "password": "first" }));
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn signup_requires_every_field() {
    let state = common::test_state(common::test_config());
    let app = init_app!(state);

    for body in [
        json!({ "email": "a@example.com", "password": "pw" }),
        json!({ "username": "a", "password": "pw" }),
        json!({ "username": "a", "email": "a@example.com" }),
        json!({ "username": " ", "email": "a@example.com", "password": "pw" }),
        json!({ "username": "a", "email": "a@example.com", "password": "" }),
    ] {
        let resp = post_json!(app, "/api/signup", body);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "All fields are required");
    }
}

#[actix_web::test]
async fn wrong_password_or_unknown_user_leaks_nothing() {
    let state = common::test_state(common::test_config());
    let app = init_app!(state);

    post_json!(
        app,
        "/api/signup",
        json!({ "username": "ana", "email": "ana@example.com", "password": "right" })
    );

    for body in [
        json!({ "username": "ana", "password": "wrong" }),
        json!({ "username": "nobody", "password": "right" }),
    ] {
        let resp = post_json!(app, "/api/login", body);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "message": "Invalid credentials" }));
    }

    let resp = post_json!(app, "/api/login", json!({ "username": "ana" }));
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Username and password required");
}

#[actix_web::test]
async fn session_is_enforced_when_required() {
    let mut config = common::test_config();
    config.auth.require_token = true;
    config.auth.api_keys = vec!["service-key".to_string()];
    let state = common::test_state(config);
    let app = init_app!(state);

    // Open routes
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    post_json!(
        app,
        "/api/signup",
        json!({ "username": "ana", "email": "ana@example.com", "password": "pw" })
    );
    let resp = post_json!(app, "/api/login", json!({ "username": "ana", "password": "pw" }));
    let login: LoginResponse = test::read_body_json(resp).await;

    // No token
    let req = test::TestRequest::get().uri("/api/chat-list").to_request();
    let err = app.call(req).await.err().unwrap();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

    // Forged token
    let req = test::TestRequest::get()
        .uri("/api/chat-list")
        .insert_header(("Authorization", format!("Bearer {}x", login.token)))
        .to_request();
    let err = app.call(req).await.err().unwrap();
    assert_eq!(err.as_response_error().status_code(), StatusCode::UNAUTHORIZED);

    // Issued token, as header and as query parameter
    let req = test::TestRequest::get()
        .uri("/api/chat-list")
        .insert_header(("Authorization", format!("Bearer {}", login.token)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/pdf?name=missing&token={}", login.token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    // Configured API key
    let req = test::TestRequest::get()
        .uri("/api/chat-list")
        .insert_header(("Authorization", "Bearer service-key"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn session_is_optional_by_default() {
    let state = common::test_state(common::test_config());
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/chat-list").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}
