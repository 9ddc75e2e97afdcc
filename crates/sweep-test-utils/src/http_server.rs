//! HTTP test server for the registry REST paths.
//!
//! Serves a [`MemoryRegistry`] on `127.0.0.1:0` using the same paths, query
//! parameters and status codes as the real registry, so the HTTP client can
//! be exercised end to end. Every request's method, path and headers are
//! recorded.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use sweep_core::api::{ApiResult, RegistryApi};
use sweep_core::package::{OwnerScope, PackageRef};

use crate::registry::MemoryRegistry;

/// A request received by the test server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: String,
    /// Path and query.
    pub uri: String,
    /// Request headers.
    pub headers: HeaderMap,
}

impl RecordedRequest {
    /// Returns a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

#[derive(Debug, Clone, Copy)]
enum ScopeKind {
    User,
    Org,
}

#[derive(Clone)]
struct ServerState {
    registry: MemoryRegistry,
    scope: ScopeKind,
}

impl ServerState {
    fn package(&self, owner: String, name: String) -> Option<PackageRef> {
        let owner = match self.scope {
            ScopeKind::User => OwnerScope::User(owner),
            ScopeKind::Org => OwnerScope::Org(owner),
        };
        PackageRef::new(owner, name).ok()
    }
}

#[derive(Debug, Deserialize)]
struct PageQuery {
    #[serde(default = "default_page")]
    page: u32,
    #[serde(default = "default_per_page")]
    per_page: u32,
}

#[derive(Debug, Deserialize)]
struct PullsQuery {
    #[serde(default = "default_per_page")]
    per_page: u32,
    #[serde(default)]
    state: Option<String>,
}

const fn default_page() -> u32 {
    1
}

const fn default_per_page() -> u32 {
    30
}

/// HTTP server backed by a [`MemoryRegistry`].
pub struct MockRegistryServer {
    registry: MemoryRegistry,
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    _task: tokio::task::JoinHandle<()>,
}

impl std::fmt::Debug for MockRegistryServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockRegistryServer")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl MockRegistryServer {
    /// Starts a server on `127.0.0.1:0` serving `registry`.
    pub async fn start(registry: MemoryRegistry) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .nest("/users", package_routes(registry.clone(), ScopeKind::User))
            .nest("/orgs", package_routes(registry.clone(), ScopeKind::Org))
            .route(
                "/repos/:owner/:repo/pulls",
                get(list_pulls).with_state(registry.clone()),
            )
            .layer(middleware::from_fn_with_state(
                requests.clone(),
                record_request,
            ));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock registry listener");
        let addr: SocketAddr = listener.local_addr().expect("listener addr");

        let base_url = format!("http://{addr}");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = server.await;
        });

        Self {
            registry,
            base_url,
            requests,
            shutdown_tx: Some(shutdown_tx),
            _task: task,
        }
    }

    /// Returns the server base URL (e.g., `http://127.0.0.1:12345`).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the registry behind the server.
    pub fn registry(&self) -> &MemoryRegistry {
        &self.registry
    }

    /// Returns all requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

impl Drop for MockRegistryServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

fn package_routes(registry: MemoryRegistry, scope: ScopeKind) -> Router {
    Router::new()
        .route("/:owner/packages/container/:package", get(get_package))
        .route(
            "/:owner/packages/container/:package/versions",
            get(list_versions),
        )
        .route(
            "/:owner/packages/container/:package/versions/:id",
            delete(delete_version),
        )
        .with_state(ServerState { registry, scope })
}

async fn record_request(
    State(requests): State<Arc<Mutex<Vec<RecordedRequest>>>>,
    request: Request,
    next: Next,
) -> Response {
    let recorded = RecordedRequest {
        method: request.method().to_string(),
        uri: request.uri().to_string(),
        headers: request.headers().clone(),
    };
    requests.lock().expect("lock").push(recorded);
    next.run(request).await
}

async fn get_package(
    State(state): State<ServerState>,
    Path((owner, package)): Path<(String, String)>,
) -> Response {
    let Some(package) = state.package(owner, package) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    json_response(state.registry.get_package(&package).await)
}

async fn list_versions(
    State(state): State<ServerState>,
    Path((owner, package)): Path<(String, String)>,
    Query(query): Query<PageQuery>,
) -> Response {
    let Some(package) = state.package(owner, package) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    json_response(
        state
            .registry
            .list_versions(&package, query.page, query.per_page)
            .await,
    )
}

async fn delete_version(
    State(state): State<ServerState>,
    Path((owner, package, id)): Path<(String, String, u64)>,
) -> Response {
    let Some(package) = state.package(owner, package) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    match state.registry.delete_version(&package, id).await {
        ApiResult::Ok { status, .. } | ApiResult::ParseError { status, .. } => {
            status_code(status).into_response()
        }
        ApiResult::TransportError { .. } => StatusCode::BAD_GATEWAY.into_response(),
    }
}

async fn list_pulls(
    State(registry): State<MemoryRegistry>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<PullsQuery>,
) -> Response {
    if query.state.as_deref() != Some("open") {
        return (StatusCode::BAD_REQUEST, "only open pull requests are served").into_response();
    }
    json_response(
        registry
            .list_open_pull_requests(&format!("{owner}/{repo}"), query.per_page)
            .await,
    )
}

fn json_response<T: Serialize>(result: ApiResult<T>) -> Response {
    match result {
        ApiResult::Ok { status, payload } => {
            (status_code(status), axum::Json(payload)).into_response()
        }
        // Undecodable body, like an HTML error page from a proxy.
        ApiResult::ParseError { status, .. } => {
            (status_code(status), "<html>unavailable</html>").into_response()
        }
        ApiResult::TransportError { .. } => StatusCode::BAD_GATEWAY.into_response(),
    }
}

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
