//! End-to-end tests: a real server on an ephemeral port, a real HTTP client,
//! and an in-memory SQLite database behind the gateway.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use reqwest::StatusCode;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::{JoinHandle, JoinSet};

use users_api::{Error, Method, Request, Response, Router, Server, app, pool};

const DDL: &str = "CREATE TABLE users (
    id         TEXT PRIMARY KEY,
    name       TEXT NOT NULL,
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

struct TestServer {
    base: String,
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), Error>>,
}

impl TestServer {
    async fn start() -> Self {
        let pool = pool::create_pool_with_options("sqlite::memory:", 1).await.unwrap();
        sqlx::query(DDL).execute(&pool).await.unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();
        let (shutdown, rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(
            Server::from_listener(listener)
                .grace_period(Duration::from_secs(1))
                .serve_with_shutdown(app(pool), async {
                    let _ = rx.await;
                }),
        );

        Self { base: format!("http://{addr}"), shutdown, handle }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    async fn stop(self) {
        self.shutdown.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop within the grace period")
            .unwrap()
            .unwrap();
    }
}

#[tokio::test]
async fn user_lifecycle() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // create
    let res = client.post(server.url("/users")).json(&json!({"name": "alice"})).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let id = body["user"]["id"].as_str().unwrap().to_owned();
    assert!(!id.is_empty());
    assert_eq!(body["user"]["name"], "alice");

    // read
    let res = client.get(server.url(&format!("/users/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"user": {"id": id, "name": "alice"}}));

    // update
    let res = client
        .put(server.url(&format!("/users/{id}")))
        .json(&json!({"name": "bob"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "");

    let res = client.get(server.url(&format!("/users/{id}"))).send().await.unwrap();
    assert_eq!(res.json::<Value>().await.unwrap(), json!({"user": {"id": id, "name": "bob"}}));

    // delete
    let res = client.delete(server.url(&format!("/users/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(server.url(&format!("/users/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn bad_json_is_rejected_with_plain_text() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let res = client.post(server.url("/users")).body("{\"name\":").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.headers()["content-type"].to_str().unwrap(),
        "text/plain; charset=utf-8"
    );
    assert!(!res.text().await.unwrap().is_empty());

    let res = client.put(server.url("/users/some-id")).body("[]").send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    server.stop().await;
}

#[tokio::test]
async fn writes_to_unknown_user_are_not_found() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let res = client
        .put(server.url("/users/does-not-exist"))
        .json(&json!({"name": "bob"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "user not found: does-not-exist");

    let res = client.delete(server.url("/users/does-not-exist")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    server.stop().await;
}

#[tokio::test]
async fn concurrent_creates_get_distinct_ids() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let mut requests = JoinSet::new();
    for i in 0..16 {
        let client = client.clone();
        let url = server.url("/users");
        requests.spawn(async move {
            let res = client.post(url).json(&json!({"name": format!("user-{i}")})).send().await.unwrap();
            assert_eq!(res.status(), StatusCode::OK);
            let body: Value = res.json().await.unwrap();
            body["user"]["id"].as_str().unwrap().to_owned()
        });
    }

    let mut ids = requests.join_all().await;
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);

    server.stop().await;
}

#[tokio::test]
async fn routing_misses() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/accounts")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.patch(server.url("/users/abc")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    let res = client.get(server.url("/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    server.stop().await;
}

#[tokio::test]
async fn health_probes() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/healthz")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ok");

    let res = client.get(server.url("/readyz")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "ready");

    server.stop().await;
}

#[tokio::test]
async fn head_mirrors_get_without_a_body() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let res = client.post(server.url("/users")).json(&json!({"name": "alice"})).send().await.unwrap();
    let body: Value = res.json().await.unwrap();
    let id = body["user"]["id"].as_str().unwrap().to_owned();

    let res = client.head(server.url(&format!("/users/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.bytes().await.unwrap().is_empty());

    let res = client.head(server.url("/users/does-not-exist")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client.head(server.url("/users")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);

    server.stop().await;
}

async fn quick(_req: Request) -> Response {
    tokio::time::sleep(Duration::from_millis(300)).await;
    Response::text("done")
}

async fn slow(_req: Request) -> Response {
    tokio::time::sleep(Duration::from_secs(10)).await;
    Response::text("too late")
}

#[tokio::test]
async fn shutdown_drains_quick_requests_and_cuts_off_slow_ones() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (shutdown, rx) = oneshot::channel::<()>();

    let router = Router::new()
        .on(Method::Get, "/quick", quick)
        .on(Method::Get, "/slow", slow);
    let handle = tokio::spawn(
        Server::from_listener(listener)
            .grace_period(Duration::from_millis(800))
            .serve_with_shutdown(router, async {
                let _ = rx.await;
            }),
    );

    let client = reqwest::Client::new();
    let quick_res = tokio::spawn(client.get(format!("{base}/quick")).send());
    let slow_res = tokio::spawn(client.get(format!("{base}/slow")).send());

    // Both requests are in flight before the signal arrives.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let signalled = Instant::now();
    shutdown.send(()).unwrap();

    tokio::time::timeout(Duration::from_secs(3), handle)
        .await
        .expect("server outlived its grace period")
        .unwrap()
        .unwrap();
    let elapsed = signalled.elapsed();
    assert!(elapsed >= Duration::from_millis(700), "returned after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(2), "returned after {elapsed:?}");

    let res = quick_res.await.unwrap().unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "done");

    assert!(slow_res.await.unwrap().is_err());
}
