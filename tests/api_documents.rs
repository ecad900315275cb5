mod common;

use actix_web::{http::header, http::StatusCode, test, web, App, HttpResponse, HttpServer};
use serde_json::{json, Value};
use std::net::SocketAddr;

const PAGE: &str = r#"<html><head>
    <title>GDPR overview</title>
    <link rel="shortcut icon" href="/favicon.ico">
</head><body>hello</body></html>"#;

/// Serves `PAGE` at `/page` and the same page wrapped in an allorigins-style
/// `{"contents": ...}` envelope at `/get`.
fn spawn_site() -> SocketAddr {
    let server = HttpServer::new(|| {
        App::new()
            .route(
                "/page",
                web::get().to(|| async { HttpResponse::Ok().content_type("text/html").body(PAGE) }),
            )
            .route(
                "/get",
                web::get().to(|| async { HttpResponse::Ok().json(json!({ "contents": PAGE })) }),
            )
    })
    .workers(1)
    .bind(("127.0.0.1", 0))
    .unwrap();
    let addr = server.addrs()[0];
    actix_web::rt::spawn(server.run());
    addr
}

#[actix_web::test]
async fn stored_pdf_is_returned_byte_for_byte() {
    let state = common::test_state(common::test_config());
    let app = init_app!(state);

    let contents = b"%PDF-1.4\n\x00\x01\x02binary\xff".to_vec();
    state.pool.put_pdf("gdpr", &contents).await.unwrap();

    let req = test::TestRequest::get().uri("/api/pdf?name=gdpr").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "application/pdf");
    let disposition = resp.headers().get(header::CONTENT_DISPOSITION).unwrap();
    assert!(disposition.to_str().unwrap().starts_with("inline"));

    let body = test::read_body(resp).await;
    assert_eq!(body.as_ref(), contents.as_slice());
}

#[actix_web::test]
async fn reimported_pdf_replaces_contents() {
    let state = common::test_state(common::test_config());
    let app = init_app!(state);

    state.pool.put_pdf("hipaa", b"old").await.unwrap();
    state.pool.put_pdf("hipaa", b"new").await.unwrap();

    let req = test::TestRequest::get().uri("/api/pdf?name=hipaa").to_request();
    let body = test::call_and_read_body(&app, req).await;
    assert_eq!(body.as_ref(), b"new");
}

#[actix_web::test]
async fn unknown_or_missing_pdf_name() {
    let state = common::test_state(common::test_config());
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/pdf?name=nothing").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "PDF not found");

    let req = test::TestRequest::get().uri("/api/pdf").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "PDF name is required");
}

#[actix_web::test]
async fn metadata_requires_url() {
    let state = common::test_state(common::test_config());
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/metadata")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "URL is required");
}

#[actix_web::test]
async fn metadata_failure_degrades_to_placeholder() {
    let state = common::test_state(common::test_config());
    let app = init_app!(state);

    for url in ["not a url", "http://127.0.0.1:1/unreachable"] {
        let req = test::TestRequest::post()
            .uri("/api/metadata")
            .set_json(json!({ "url": url }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({ "title": "Unknown", "icon": "" }));
    }
}

#[actix_web::test]
async fn metadata_is_scraped_directly() {
    let addr = spawn_site();
    let state = common::test_state(common::test_config());
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/metadata")
        .set_json(json!({ "url": format!("http://{}/page", addr) }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["title"], "GDPR overview");
    assert_eq!(body["icon"], format!("http://{}/favicon.ico", addr));
}

#[actix_web::test]
async fn metadata_is_scraped_through_proxy() {
    let addr = spawn_site();
    let mut config = common::test_config();
    config.metadata.proxy_url = format!("http://{}/get", addr);
    let state = common::test_state(config);
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/metadata")
        .set_json(json!({ "url": "https://gdpr.eu/overview" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["title"], "GDPR overview");
    assert_eq!(body["icon"], "https://gdpr.eu/favicon.ico");
}
