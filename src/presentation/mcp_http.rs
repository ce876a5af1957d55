// HTTP transport for the agent-tool server
use crate::application::mcp_server::SERVER_NAME;
use crate::application::tools::ToolName;
use crate::application::prompts::PromptName;
use crate::presentation::app_state::McpState;
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{
        IntoResponse, Response,
        sse::{Event, Sse},
    },
};
use futures::stream::Stream;
use serde_json::{Value, json};
use std::convert::Infallible;

/// Path clients post JSON-RPC messages to
pub const MESSAGE_PATH: &str = "/mcp";

/// JSON-RPC over a plain POST. Notifications are acknowledged with 202.
pub async fn rpc(State(state): State<McpState>, body: String) -> Response {
    match state.server.handle_message(&body).await {
        Some(reply) => ([(header::CONTENT_TYPE, "application/json")], reply).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// Event stream: announces the message endpoint, then pings on every
/// keep-alive period until the client goes away
pub async fn sse(State(state): State<McpState>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::info!("SSE client connected");
    let period = state.keep_alive;

    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>(Event::default().event("endpoint").data(MESSAGE_PATH));

        let mut ticker = tokio::time::interval(period);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            yield Ok(Event::default().event("ping").data(r#"{"type":"ping"}"#));
        }
    };

    Sse::new(stream)
}

pub async fn health(State(state): State<McpState>) -> Response {
    let endpoints = json!({
        "sse": format!("{}/sse", state.public_url),
        "health": format!("{}/health", state.public_url),
    });

    match state.server.arm().status().await {
        Ok(status) => Json(json!({
            "status": "healthy",
            "transport": "http",
            "mcp_server": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
            "robot_connected": true,
            "robot_moving": status.is_moving,
            "endpoints": endpoints,
            "capabilities": ["search", "fetch", "robot_control"],
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            let body = json!({
                "status": "degraded",
                "transport": "http",
                "mcp_server": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
                "robot_connected": false,
                "error": e.to_string(),
                "endpoints": endpoints,
            });
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

/// Discovery document for remote tool clients
pub async fn discovery(State(state): State<McpState>) -> Json<Value> {
    let additional: Vec<&str> = ToolName::ALL
        .into_iter()
        .filter(|t| !matches!(t, ToolName::Search | ToolName::Fetch))
        .map(ToolName::as_str)
        .collect();
    let prompts: Vec<&str> = PromptName::ALL.into_iter().map(PromptName::as_str).collect();

    Json(json!({
        "server_name": SERVER_NAME,
        "server_version": env!("CARGO_PKG_VERSION"),
        "description": "MyCobot robot control server",
        "endpoints": {
            "sse": format!("{}/sse", state.public_url),
            "messages": format!("{}{}", state.public_url, MESSAGE_PATH),
        },
        "required_tools": [ToolName::Search.as_str(), ToolName::Fetch.as_str()],
        "additional_tools": additional,
        "prompts": prompts,
        "capabilities": {
            "search": "Search through robot resources and capabilities",
            "fetch": "Fetch detailed information about specific robot components",
            "robot_control": "Full 6-DOF robot arm control",
            "real_time_status": "Live robot position and status information"
        }
    }))
}

pub async fn index(State(state): State<McpState>) -> Json<Value> {
    Json(json!({
        "message": "MyCobot MCP Server",
        "version": env!("CARGO_PKG_VERSION"),
        "mcp_endpoint": format!("{}/sse", state.public_url),
        "health_check": format!("{}/health", state.public_url),
        "specification": format!("{}/mcp", state.public_url),
    }))
}
