use axum::{
    extract::{Path, Query, State},
    http::{header, Method, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post, put},
    Json, Router,
};
use futures_util::stream::{self, Stream};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, convert::Infallible, path::PathBuf, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    app::ContextManager,
    kubeconfig::ContextError,
    subscription::{Channel, ChannelHub, SubscriptionHandle, SubscriptionRegistry},
    types::{ConflictResolution, ContextEdit, ContextSummary, ImportCandidate},
    utils::logging::Logger,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        list_contexts_handler,
        set_current_handler,
        delete_context_handler,
        duplicate_context_handler,
        edit_context_handler,
        import_preview_handler,
        import_handler
    ),
    components(schemas(
        ContextSummary,
        ImportCandidate,
        ContextEdit,
        ConflictResolution,
        SwitchRequest,
        ImportPreviewRequest,
        ImportRequest,
        OperationResult
    ))
)]
struct ApiDoc;

#[derive(Deserialize, ToSchema)]
pub struct SwitchRequest {
    #[schema(example = "production")]
    name: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ImportPreviewRequest {
    #[schema(example = "/home/me/Downloads/cluster.yaml")]
    path: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ImportRequest {
    path: String,
    selected: Vec<String>,
    #[serde(default)]
    resolutions: HashMap<String, ConflictResolution>,
}

#[derive(Serialize, ToSchema)]
pub struct OperationResult {
    applied: bool,
}

#[derive(Clone)]
pub struct WebServerState {
    pub port: u16,
    pub manager: Arc<ContextManager>,
    pub registry: Arc<SubscriptionRegistry>,
    pub hub: Arc<ChannelHub>,
    pub logger: Arc<dyn Logger>,
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

fn applied(applied: bool) -> Response {
    (StatusCode::OK, Json(OperationResult { applied })).into_response()
}

fn error_response(status: StatusCode, message: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(serde_json::json!({ "error": message })),
    )
        .into_response()
}

async fn health_check() -> &'static str {
    "OK"
}

#[utoipa::path(
    get,
    path = "/api/contexts",
    responses(
        (status = 200, description = "All contexts in document order", body = Vec<ContextSummary>)
    )
)]
async fn list_contexts_handler(State(state): State<WebServerState>) -> Response {
    Json(state.manager.available_contexts().await).into_response()
}

#[utoipa::path(
    put,
    path = "/api/contexts/current",
    request_body = SwitchRequest,
    responses((status = 200, body = OperationResult))
)]
async fn set_current_handler(
    State(state): State<WebServerState>,
    Json(request): Json<SwitchRequest>,
) -> Response {
    applied(state.manager.set_current_context(&request.name).await)
}

#[utoipa::path(
    delete,
    path = "/api/contexts/{name}",
    params(("name" = String, Path, description = "Context name")),
    responses((status = 200, body = OperationResult))
)]
async fn delete_context_handler(
    State(state): State<WebServerState>,
    Path(name): Path<String>,
) -> Response {
    applied(state.manager.delete_context(&name).await)
}

#[utoipa::path(
    post,
    path = "/api/contexts/{name}/duplicate",
    params(("name" = String, Path, description = "Context name")),
    responses((status = 200, body = OperationResult))
)]
async fn duplicate_context_handler(
    State(state): State<WebServerState>,
    Path(name): Path<String>,
) -> Response {
    applied(state.manager.duplicate_context(&name).await)
}

#[utoipa::path(
    put,
    path = "/api/contexts/{name}",
    params(("name" = String, Path, description = "Context name")),
    request_body = ContextEdit,
    responses((status = 200, body = OperationResult))
)]
async fn edit_context_handler(
    State(state): State<WebServerState>,
    Path(name): Path<String>,
    Json(edit): Json<ContextEdit>,
) -> Response {
    applied(state.manager.edit_context(&name, edit).await)
}

#[utoipa::path(
    post,
    path = "/api/import/preview",
    request_body = ImportPreviewRequest,
    responses((status = 200, body = Vec<ImportCandidate>))
)]
async fn import_preview_handler(
    State(state): State<WebServerState>,
    Json(request): Json<ImportPreviewRequest>,
) -> Response {
    Json(
        state
            .manager
            .get_import_contexts(&expand(&request.path))
            .await,
    )
    .into_response()
}

#[utoipa::path(
    post,
    path = "/api/import",
    request_body = ImportRequest,
    responses(
        (status = 200, body = OperationResult),
        (status = 422, description = "Import file references a missing cluster or user")
    )
)]
async fn import_handler(
    State(state): State<WebServerState>,
    Json(request): Json<ImportRequest>,
) -> Response {
    match state
        .manager
        .import_contexts_from_file(
            &expand(&request.path),
            &request.selected,
            &request.resolutions,
        )
        .await
    {
        Ok(done) => applied(done),
        Err(e @ ContextError::MissingReference { .. }) => {
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// Removes the subscription once the event stream is dropped.
struct SubscriptionGuard {
    handle: SubscriptionHandle,
    registry: Arc<SubscriptionRegistry>,
    hub: Arc<ChannelHub>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        self.registry.unsubscribe(&self.handle);
        self.hub.close(&self.handle);
    }
}

fn query_params(query: HashMap<String, String>) -> serde_json::Value {
    if query.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::to_value(query).unwrap_or(serde_json::Value::Null)
    }
}

async fn subscribe_handler(
    State(state): State<WebServerState>,
    Path(channel): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let channel: Channel = match channel.parse() {
        Ok(channel) => channel,
        Err(e) => return error_response(StatusCode::NOT_FOUND, e),
    };

    let handle = SubscriptionHandle::generate();
    let receiver = state.hub.open(handle);
    state
        .registry
        .subscribe_as(handle, channel, query_params(query));
    state
        .logger
        .debug_log(&format!("Subscriber {} joined '{}'", handle, channel));

    let guard = SubscriptionGuard {
        handle,
        registry: Arc::clone(&state.registry),
        hub: Arc::clone(&state.hub),
    };
    Sse::new(delivery_stream(receiver, guard))
        .keep_alive(KeepAlive::default())
        .into_response()
}

fn delivery_stream(
    receiver: tokio::sync::mpsc::UnboundedReceiver<crate::subscription::Delivery>,
    guard: SubscriptionGuard,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold((receiver, guard), |(mut receiver, guard)| async move {
        let delivery = receiver.recv().await?;
        let event = Event::default()
            .event(delivery.channel.as_str())
            .json_data(&delivery.payload)
            .unwrap_or_else(|_| Event::default().event(delivery.channel.as_str()));
        Some((Ok(event), (receiver, guard)))
    })
}

pub fn router(state: WebServerState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/contexts", get(list_contexts_handler))
        .route("/api/contexts/current", put(set_current_handler))
        .route(
            "/api/contexts/:name",
            put(edit_context_handler).delete(delete_context_handler),
        )
        .route(
            "/api/contexts/:name/duplicate",
            post(duplicate_context_handler),
        )
        .route("/api/import/preview", post(import_preview_handler))
        .route("/api/import", post(import_handler))
        .route("/api/subscribe/:channel", get(subscribe_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE]),
        )
        .with_state(state)
}

pub async fn start_web_server(
    state: WebServerState,
    shutdown: tokio::sync::oneshot::Receiver<()>,
) -> std::io::Result<()> {
    let logger = Arc::clone(&state.logger);
    let addr = format!("0.0.0.0:{}", state.port);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    logger.log(&format!("Web server listening on {}", addr));

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            shutdown.await.ok();
        })
        .await
        .map_err(|e| {
            logger.log(&format!("Server error: {}", e));
            e
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_means_no_params() {
        assert_eq!(query_params(HashMap::new()), serde_json::Value::Null);

        let mut query = HashMap::new();
        query.insert("search".to_string(), "prod".to_string());
        assert_eq!(
            query_params(query),
            serde_json::json!({ "search": "prod" })
        );
    }

    #[test]
    fn import_request_defaults_resolutions() {
        let request: ImportRequest =
            serde_json::from_str(r#"{ "path": "a.yaml", "selected": ["x"] }"#).unwrap();
        assert!(request.resolutions.is_empty());

        let request: ImportRequest = serde_json::from_str(
            r#"{ "path": "a.yaml", "selected": ["x"], "resolutions": { "x": "replace" } }"#,
        )
        .unwrap();
        assert_eq!(request.resolutions["x"], ConflictResolution::Replace);
    }
}
