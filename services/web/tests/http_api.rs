//! HTTP dispatch through the assembled filter.

use futures_util::FutureExt;
use paneld_web::{
    build_filter, ApiHandler, ApiRequest, ApiResponse, Method, RouteTable, SocketHandler,
    WebMessage,
};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use warp::{Filter, Rejection, Reply};

fn fixture(
    doc_root: &Path,
) -> (
    impl Filter<Extract = impl Reply, Error = Rejection> + Clone,
    device_actors::MailboxReceiver<WebMessage>,
) {
    let routes = Arc::new(RwLock::new(RouteTable::new()));
    {
        let mut table = routes.write();
        let ping: ApiHandler = Arc::new(|_req| {
            async { ApiResponse::json(serde_json::json!({"pong": true})) }.boxed()
        });
        table.register(Method::GET, "ping", ping);
        let echo: ApiHandler = Arc::new(|req: ApiRequest| {
            async move {
                let mut response = ApiResponse::empty();
                response.body = req.body.to_vec();
                response
            }
            .boxed()
        });
        table.register(Method::POST, "echo", echo);
    }

    let (mailbox, receiver) = device_actors::mailbox::<WebMessage>("web", 8);
    let socket_handler: SocketHandler = Arc::new(|_| None);
    (
        build_filter(routes, doc_root.to_path_buf(), socket_handler, mailbox),
        receiver,
    )
}

#[tokio::test]
async fn api_route_dispatches_on_exact_match() {
    let dir = tempfile::tempdir().unwrap();
    let (filter, _rx) = fixture(dir.path());

    let response = warp::test::request()
        .method("GET")
        .path("/API/ping")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.body().as_ref(), br#"{"pong":true}"#);
}

#[tokio::test]
async fn query_suffix_is_stripped_before_matching() {
    let dir = tempfile::tempdir().unwrap();
    let (filter, _rx) = fixture(dir.path());

    let response = warp::test::request()
        .method("GET")
        .path("/API/ping?unit=c")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn unknown_api_path_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let (filter, _rx) = fixture(dir.path());

    let response = warp::test::request()
        .method("GET")
        .path("/API/unknown")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), 404);

    // Not found regardless of method.
    let response = warp::test::request()
        .method("POST")
        .path("/API/ping")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn post_body_round_trips_through_handler() {
    let dir = tempfile::tempdir().unwrap();
    let (filter, _rx) = fixture(dir.path());

    let response = warp::test::request()
        .method("POST")
        .path("/API/echo")
        .body(r#"{"memo":"hello"}"#)
        .reply(&filter)
        .await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.body().as_ref(), br#"{"memo":"hello"}"#);
}

#[tokio::test]
async fn oversized_body_is_a_client_error() {
    let dir = tempfile::tempdir().unwrap();
    let (filter, _rx) = fixture(dir.path());

    let response = warp::test::request()
        .method("POST")
        .path("/API/echo")
        .body(vec![b'x'; 4096])
        .reply(&filter)
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn unmatched_get_falls_back_to_static_content() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
    std::fs::write(dir.path().join("style.css"), "body{}").unwrap();
    let (filter, _rx) = fixture(dir.path());

    let response = warp::test::request().method("GET").path("/").reply(&filter).await;
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["content-type"], "text/html");
    assert_eq!(response.body().as_ref(), b"<h1>home</h1>");

    let response = warp::test::request()
        .method("GET")
        .path("/style.css")
        .reply(&filter)
        .await;
    assert_eq!(response.headers()["content-type"], "text/css");

    let response = warp::test::request()
        .method("GET")
        .path("/missing.html")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn non_get_outside_api_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>home</h1>").unwrap();
    let (filter, _rx) = fixture(dir.path());

    let response = warp::test::request()
        .method("POST")
        .path("/index.html")
        .reply(&filter)
        .await;
    assert_eq!(response.status(), 404);
}
