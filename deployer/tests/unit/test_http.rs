//! HTTP client tests against a local fake components API

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use hyper::ext::ReasonPhrase;
use serde_json::json;

use tooldeploy::deploy::clock::TokioClock;
use tooldeploy::deploy::controller::{DeploymentController, PollSettings};
use tooldeploy::http::client::HttpClient;
use tooldeploy::http::deployments::DeploymentApi;
use tooldeploy::models::deployment::{DeployId, DeploymentFlags, DeploymentOutcome, DeploymentStatus};

use crate::common::{token, tool};

type Recorded = Vec<(String, HashMap<String, String>)>;

#[derive(Clone)]
struct FakeServer {
    start_status: u16,
    start_reason: Option<&'static [u8]>,
    statuses: Arc<Mutex<VecDeque<&'static str>>>,
    requests: Arc<Mutex<Recorded>>,
}

impl FakeServer {
    fn new(start_status: u16, statuses: Vec<&'static str>) -> Self {
        Self {
            start_status,
            start_reason: None,
            statuses: Arc::new(Mutex::new(statuses.into())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn with_reason(mut self, reason: &'static [u8]) -> Self {
        self.start_reason = Some(reason);
        self
    }

    fn requests(&self) -> Recorded {
        self.requests.lock().unwrap().clone()
    }
}

async fn start(
    State(server): State<FakeServer>,
    Path(tool): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    server
        .requests
        .lock()
        .unwrap()
        .push((format!("POST {}", tool), query));

    match server.start_status {
        200 => Json(json!({"data": {"deploy_id": format!("{}-1", tool)}, "messages": {}}))
            .into_response(),
        code => {
            let mut response = (
                StatusCode::from_u16(code).unwrap(),
                Json(json!({"messages": {"error": ["rejected"]}})),
            )
                .into_response();
            if let Some(reason) = server.start_reason {
                response
                    .extensions_mut()
                    .insert(ReasonPhrase::from_static(reason));
            }
            response
        }
    }
}

async fn status(
    State(server): State<FakeServer>,
    Path((tool, deploy_id)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    server
        .requests
        .lock()
        .unwrap()
        .push((format!("GET {} {}", tool, deploy_id), query));

    let next = server.statuses.lock().unwrap().pop_front();
    match next {
        Some("409") => StatusCode::CONFLICT.into_response(),
        Some("500") => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        Some(status) => Json(json!({"data": {"status": status}})).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Serve the fake API on a random local port, returning its base URL
async fn serve(server: FakeServer) -> String {
    let app = Router::new()
        .route("/components/v1/tool/{tool}/deployment", post(start))
        .route("/components/v1/tool/{tool}/deployment/{deploy_id}", get(status))
        .with_state(server);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(base_url: &str) -> HttpClient {
    HttpClient::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_start_sends_token_without_flags() {
    let server = FakeServer::new(200, vec![]);
    let base_url = serve(server.clone()).await;

    let deploy_id = client(&base_url)
        .start_deployment(&tool("demo"), &token(), DeploymentFlags::default())
        .await
        .unwrap();

    assert_eq!(deploy_id, DeployId::new("demo-1"));
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "POST demo");
    assert_eq!(
        requests[0].1,
        HashMap::from([("token".to_string(), "test-token".to_string())])
    );
}

#[tokio::test]
async fn test_start_sends_force_flags() {
    let server = FakeServer::new(200, vec![]);
    let base_url = serve(server.clone()).await;
    let flags = DeploymentFlags {
        force_run: true,
        force_build: true,
    };

    client(&base_url)
        .start_deployment(&tool("demo"), &token(), flags)
        .await
        .unwrap();

    let query = &server.requests()[0].1;
    assert_eq!(query.get("force_run").map(String::as_str), Some("true"));
    assert_eq!(query.get("force_build").map(String::as_str), Some("true"));
}

#[tokio::test]
async fn test_start_conflict() {
    let server = FakeServer::new(409, vec![]);
    let base_url = serve(server).await;

    let err = client(&base_url)
        .start_deployment(&tool("demo"), &token(), DeploymentFlags::default())
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(err.to_string(), "409 Client Error: Conflict");
}

#[tokio::test]
async fn test_start_error_uses_server_reason() {
    let server = FakeServer::new(409, vec![]).with_reason(b"Deployment Already Running");
    let base_url = serve(server).await;

    let err = client(&base_url)
        .start_deployment(&tool("demo"), &token(), DeploymentFlags::default())
        .await
        .unwrap_err();

    assert!(err.is_conflict());
    assert_eq!(err.to_string(), "409 Client Error: Deployment Already Running");
}

#[tokio::test]
async fn test_start_server_error() {
    let server = FakeServer::new(500, vec![]);
    let base_url = serve(server).await;

    let err = client(&base_url)
        .start_deployment(&tool("demo"), &token(), DeploymentFlags::default())
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "500 Server Error: Internal Server Error");
}

#[tokio::test]
async fn test_status_is_decoded() {
    let server = FakeServer::new(200, vec!["running", "exploded"]);
    let base_url = serve(server.clone()).await;
    let client = client(&base_url);
    let deploy_id = DeployId::new("abc");

    let first = client
        .deployment_status(&tool("demo"), &token(), &deploy_id)
        .await
        .unwrap();
    let second = client
        .deployment_status(&tool("demo"), &token(), &deploy_id)
        .await
        .unwrap();

    assert_eq!(first, DeploymentStatus::Running);
    assert_eq!(second, DeploymentStatus::Failed("exploded".to_string()));
    assert_eq!(server.requests()[0].0, "GET demo abc");
}

#[tokio::test]
async fn test_controller_over_http() {
    let server = FakeServer::new(200, vec!["pending", "running", "successful"]);
    let base_url = serve(server.clone()).await;
    let api = client(&base_url);
    let clock = TokioClock;
    let controller = DeploymentController::new(&api, &clock, PollSettings::unbounded(Duration::from_millis(5)));

    let outcome = controller
        .run_deployment(&tool("demo"), &token(), DeploymentFlags::default())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        DeploymentOutcome::Success {
            deploy_id: DeployId::new("demo-1"),
            polls: 3
        }
    );
    assert_eq!(server.requests().len(), 4);
}

#[tokio::test]
async fn test_controller_poll_conflict_over_http() {
    let server = FakeServer::new(200, vec!["running", "409", "successful"]);
    let base_url = serve(server.clone()).await;
    let api = client(&base_url);
    let clock = TokioClock;
    let controller = DeploymentController::new(&api, &clock, PollSettings::unbounded(Duration::from_millis(5)));

    let outcome = controller
        .run_deployment(&tool("demo"), &token(), DeploymentFlags::default())
        .await
        .unwrap();

    assert!(matches!(outcome, DeploymentOutcome::Rejected { deploy_id: Some(_), .. }));
    assert_eq!(server.requests().len(), 3);
}
