//! End-to-end tests of the movie service over HTTP.

use reqwest::StatusCode;
use serde_json::{json, Value};

mod common;

#[tokio::test]
async fn test_create_list_and_get() {
    let server = common::start_movie_service().await;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/movies"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!([]));

    for (title, year) in [("Alien", 1979), ("Brazil", 1985)] {
        let res = client
            .post(server.url("/movies"))
            .json(&json!({ "id": 42, "title": title, "year": year }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    let res = client.get(server.url("/movies")).send().await.unwrap();
    let movies: Value = res.json().await.unwrap();
    assert_eq!(
        movies,
        json!([
            { "id": 0, "title": "Alien", "year": 1979 },
            { "id": 1, "title": "Brazil", "year": 1985 }
        ])
    );

    let res = client.get(server.url("/movies/1")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let movie: Value = res.json().await.unwrap();
    assert_eq!(movie["title"], "Brazil");
}

#[tokio::test]
async fn test_error_envelopes() {
    let server = common::start_movie_service().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/movies/7")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "movie not found");
    assert_eq!(body["code"], 404);

    let res = client.get(server.url("/movies/abc")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "movie id must be an int");

    let res = client
        .post(server.url("/movies"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "failed to parse request");
    assert_eq!(body["code"], 400);
}

#[tokio::test]
async fn test_unknown_path_and_method() {
    let server = common::start_movie_service().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/films")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.delete(server.url("/movies/0")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_request_id_is_returned() {
    let server = common::start_movie_service().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/movies")).send().await.unwrap();
    assert!(res.headers().contains_key("x-request-id"));

    let res = client
        .get(server.url("/movies"))
        .header("x-request-id", "abc-123")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["x-request-id"], "abc-123");
}
