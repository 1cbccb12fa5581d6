use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn memory_app() -> pix_axum::AxumApp {
    let mut config = pix_server::config::defaults();
    config.set("storage.backend", "memory");
    config.set("diagnostics.probe", "false");
    pix_server::build(&config.snapshot()).unwrap()
}

#[tokio::test]
async fn memory_backend_serves_uploads() {
    let res = memory_app()
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("content-length", 5)
                .header("x-filename", "note.txt")
                .body(Body::from("hello"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 200);
    assert!(res.headers().get("x-request-id").is_some());

    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(
        body,
        json!({
            "message": "File received successfully.",
            "fileName": "note.txt",
            "fileSize": "5 bytes"
        })
    );
}

#[tokio::test]
async fn body_limit_is_read_from_config() {
    let mut config = pix_server::config::defaults();
    config.set("storage.backend", "memory");
    config.set("diagnostics.enabled", "false");
    config.set("http.max_body_bytes", "16");
    let app = pix_server::build(&config.snapshot()).unwrap();

    let res = app
        .router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/upload")
                .header("content-length", 32)
                .body(Body::from(vec![b'x'; 32]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status().as_u16(), 500);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Internal Server Error");
    assert!(body["error"].as_str().unwrap().contains("request body"));
}
