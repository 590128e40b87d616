mod common;

use axum::http::StatusCode;
use axum::http::header::{COOKIE, LOCATION};
use serde_json::json;

#[tokio::test]
async fn test_redirect_to_original_url() {
    let app = common::spawn_app();

    let short_url = app
        .server
        .post("/")
        .text("https://example.com/target?x=1&y=2")
        .await
        .text();

    let response = app
        .server
        .get(&format!("/{}", common::key_of(&short_url)))
        .await;

    response.assert_status(StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "https://example.com/target?x=1&y=2"
    );
}

#[tokio::test]
async fn test_redirect_unknown_key() {
    let app = common::spawn_app();

    let response = app.server.get("/NOSUCHKEY2").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(
        response.json::<serde_json::Value>()["error"]["code"],
        "not_found"
    );
}

#[tokio::test]
async fn test_redirect_deleted_key_is_gone() {
    let mut app = common::spawn_app();
    let cookie = common::identity_cookie("u1");

    let short_url = app
        .server
        .post("/")
        .add_header(COOKIE, cookie.clone())
        .text("https://example.com/doomed")
        .await
        .text();
    let key = common::key_of(&short_url).to_string();

    app.server
        .delete("/api/user/urls")
        .add_header(COOKIE, cookie)
        .json(&json!([key]))
        .await
        .assert_status(StatusCode::ACCEPTED);

    app.pool.stop().await.unwrap();

    let response = app.server.get(&format!("/{key}")).await;

    response.assert_status(StatusCode::GONE);
}
