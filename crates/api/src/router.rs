//! Route table and server entry point.

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use crate::handlers::{self, AppState};

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::check))
        // Flows
        .route("/api/v1/flows", get(handlers::flows::list).post(handlers::flows::create))
        .route(
            "/api/v1/flows/:id",
            get(handlers::flows::get)
                .put(handlers::flows::update)
                .delete(handlers::flows::delete),
        )
        .route("/api/v1/flows/:id/run", post(handlers::runs::run))
        .route("/api/v1/flows/:id/runs", get(handlers::runs::list))
        // Chat commands
        .route("/api/v1/commands", get(handlers::commands::list))
        .route("/api/v1/commands/:name", post(handlers::commands::fire))
        // Editor palette
        .route("/api/v1/components", get(handlers::components::list))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use engine::RegistryCatalog;
    use serde_json::{json, Value};
    use store::FlowStore;
    use tower::ServiceExt;

    use super::*;
    use crate::ServerConfig;

    fn state_with(config: ServerConfig) -> AppState {
        AppState::new(FlowStore::new(), RegistryCatalog::new(), config)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    fn adder_graph() -> Value {
        json!({
            "nodes": [
                { "id": "sum", "code_id": "add", "label": "Add",
                  "inputs": [{ "name": "a" }, { "name": "b" }],
                  "outputs": [{ "name": "output" }] }
            ],
            "edges": [],
            "constants": { "sum.a": 2 }
        })
    }

    fn greeter_graph() -> Value {
        json!({
            "nodes": [
                { "id": "slash-1", "code_id": "__slash__", "command": "greet",
                  "options": [{ "name": "who", "type": "string" }],
                  "outputs": [{ "name": "who" }, { "name": "ctx" }] },
                { "id": "fmt", "code_id": "format_text",
                  "inputs": [{ "name": "template" }, { "name": "value" }],
                  "outputs": [{ "name": "output" }] },
                { "id": "say", "code_id": "reply",
                  "inputs": [{ "name": "text" }],
                  "outputs": [{ "name": "sent" }] }
            ],
            "edges": [
                { "sourceComponentId": "slash-1", "sourcePort": "who",
                  "targetComponentId": "fmt", "targetPort": "value" },
                { "sourceComponentId": "fmt", "sourcePort": "output",
                  "targetComponentId": "say", "targetPort": "text" }
            ],
            "constants": { "fmt.template": "hi {}" }
        })
    }

    #[tokio::test]
    async fn health_reports_modules() {
        let app = router(state_with(ServerConfig::default()));
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["modules"], json!(["builtin"]));
    }

    #[tokio::test]
    async fn flow_crud_and_run() {
        let app = router(state_with(ServerConfig::default()));

        let (status, created) = send(
            &app,
            Method::POST,
            "/api/v1/flows",
            Some(json!({ "name": "adder", "graph": adder_graph() })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        assert_eq!(created["version"], 1);

        let (status, run) = send(
            &app,
            Method::POST,
            "/api/v1/flows/1/run",
            Some(json!({ "constants": { "sum.b": 40 } })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(run["cache"]["sum.output"], 42);
        assert_eq!(run["executed"], json!(["sum"]));
        assert_eq!(run["flow_version"], 1);

        let (_, runs) = send(&app, Method::GET, "/api/v1/flows/1/runs", None).await;
        assert_eq!(runs[0]["status"], "succeeded");
        assert_eq!(runs[0]["id"], run["run_id"]);

        let (status, updated) = send(
            &app,
            Method::PUT,
            "/api/v1/flows/1",
            Some(json!({ "graph": adder_graph() })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["version"], 2);
        assert_eq!(updated["name"], "adder");

        let (status, _) = send(&app, Method::DELETE, "/api/v1/flows/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, Method::GET, "/api/v1/flows/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not found");
    }

    #[tokio::test]
    async fn failed_run_is_unprocessable_and_recorded() {
        let app = router(state_with(ServerConfig::default()));
        send(
            &app,
            Method::POST,
            "/api/v1/flows",
            Some(json!({ "name": "adder", "graph": adder_graph() })),
        )
        .await;

        // sum.b is never bound
        let (status, body) = send(&app, Method::POST, "/api/v1/flows/1/run", Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("input port 'b'"));

        let (_, runs) = send(&app, Method::GET, "/api/v1/flows/1/runs", None).await;
        assert_eq!(runs[0]["status"], "failed");
    }

    #[tokio::test]
    async fn invalid_graphs_are_rejected_on_save() {
        let app = router(state_with(ServerConfig::default()));
        let duplicate = json!({
            "nodes": [{ "id": "a", "code_id": "add" }, { "id": "a", "code_id": "add" }]
        });
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/v1/flows",
            Some(json!({ "name": "dup", "graph": duplicate })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("duplicate"));

        let strict = router(state_with(ServerConfig {
            strict: true,
            ..ServerConfig::default()
        }));
        let dangling = json!({
            "nodes": [{ "id": "a", "code_id": "add" }],
            "edges": [{ "sourceComponentId": "ghost", "sourcePort": "out",
                        "targetComponentId": "a", "targetPort": "a" }]
        });
        let (status, _) = send(
            &strict,
            Method::POST,
            "/api/v1/flows",
            Some(json!({ "name": "dangling", "graph": dangling })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn command_run_returns_its_replies() {
        let state = state_with(ServerConfig::default());
        let app = router(state.clone());
        send(
            &app,
            Method::POST,
            "/api/v1/flows",
            Some(json!({ "name": "greeter", "graph": greeter_graph() })),
        )
        .await;

        let (status, commands) = send(&app, Method::GET, "/api/v1/commands", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(commands[0]["command"], "greet");
        assert_eq!(commands[0]["flow_name"], "greeter");
        assert_eq!(commands[0]["description"], "Auto-generated /greet");

        let event = json!({ "user": "u1" });
        let (status, run) = send(
            &app,
            Method::POST,
            "/api/v1/commands/greet",
            Some(json!({ "options": { "who": "ana" }, "event": event })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(run["replies"][0]["text"], "hi ana");
        assert_eq!(run["replies"][0]["event"], event);
        assert_eq!(run["skipped"], json!(["slash-1"]));
        // drained from the shared variables once returned
        assert_eq!(state.variables.get("replies"), Some(json!([])));

        let (_, runs) = send(&app, Method::GET, "/api/v1/flows/1/runs", None).await;
        assert_eq!(runs[0]["command"], "greet");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/v1/commands/greet",
            Some(json!({ "options": { "who": 5 } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, Method::POST, "/api/v1/commands/nope", Some(json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn components_follow_the_requested_module() {
        let app = router(state_with(ServerConfig::default()));

        let (status, components) = send(&app, Method::GET, "/api/v1/components", None).await;
        assert_eq!(status, StatusCode::OK);
        let divmod = components
            .as_array()
            .unwrap()
            .iter()
            .find(|c| c["code_id"] == "divmod")
            .unwrap();
        assert_eq!(divmod["outputs"].as_array().unwrap().len(), 2);

        let (status, _) = send(&app, Method::GET, "/api/v1/components?module=missing", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_runs_time_out() {
        let app = router(state_with(ServerConfig {
            run_timeout: Duration::from_millis(50),
            ..ServerConfig::default()
        }));
        let slow = json!({
            "nodes": [{ "id": "wait", "code_id": "sleep",
                        "inputs": [{ "name": "ms" }], "outputs": [{ "name": "output" }] }],
            "constants": { "wait.ms": 10_000 }
        });
        send(
            &app,
            Method::POST,
            "/api/v1/flows",
            Some(json!({ "name": "slow", "graph": slow })),
        )
        .await;

        let (status, _) = send(&app, Method::POST, "/api/v1/flows/1/run", Some(json!({}))).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);

        let (_, runs) = send(&app, Method::GET, "/api/v1/flows/1/runs", None).await;
        assert_eq!(runs[0]["status"], "timed_out");
    }
}
