// Router construction for both HTTP roles
use crate::presentation::app_state::{ApiState, McpState};
use crate::presentation::{handlers, mcp_http};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// REST API over one arm
pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/joints/:joint/angle",
            get(handlers::get_joint_angle).put(handlers::set_joint_angle),
        )
        .route(
            "/joints/angles",
            get(handlers::get_all_angles).put(handlers::set_all_angles),
        )
        .route("/joints/:joint/jog", post(handlers::jog_joint))
        .route("/joints/:joint/stop", post(handlers::stop_joint))
        .route("/robot/home", post(handlers::home))
        .route("/robot/stop", post(handlers::stop_all))
        .route("/robot/status", get(handlers::robot_status))
        .route("/robot/wait", post(handlers::wait_for_completion))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Agent-tool server over HTTP
pub fn mcp_router(state: McpState) -> Router {
    Router::new()
        .route("/", get(mcp_http::index).post(mcp_http::index))
        .route(mcp_http::MESSAGE_PATH, get(mcp_http::discovery).post(mcp_http::rpc))
        .route("/.well-known/mcp", get(mcp_http::discovery))
        .route("/sse", get(mcp_http::sse).post(mcp_http::rpc))
        .route("/health", get(mcp_http::health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::arm_control::{ArmControl, OfflineArm};
    use crate::application::arm_controller::{ArmController, DEFAULT_POLL_INTERVAL};
    use crate::application::mcp_server::McpServer;
    use crate::domain::joint::JointBounds;
    use crate::infrastructure::simulated_driver::SimulatedDriver;
    use axum::body::{Body, to_bytes};
    use axum::http::{Method, Request, StatusCode, header};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn simulated_arm() -> Arc<dyn ArmControl> {
        let bounds = JointBounds::mycobot_280();
        Arc::new(ArmController::spawn(
            Box::new(SimulatedDriver::new(bounds.clone())),
            bounds,
            DEFAULT_POLL_INTERVAL,
        ))
    }

    fn api() -> Router {
        api_router(ApiState::new(simulated_arm()))
    }

    fn mcp(arm: Arc<dyn ArmControl>) -> Router {
        mcp_router(McpState {
            server: McpServer::new(arm, JointBounds::mycobot_280()),
            keep_alive: Duration::from_secs(30),
            public_url: "http://localhost:8081".to_string(),
        })
    }

    async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let response = router.clone().oneshot(request.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health_reports_connection() {
        let (status, body) = send(&api(), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["robot_connected"], true);
        assert!(body["timestamp"].is_string());

        let offline = api_router(ApiState::new(Arc::new(OfflineArm)));
        let (_, body) = send(&offline, Method::GET, "/health", None).await;
        assert_eq!(body["status"], "degraded");
    }

    #[tokio::test]
    async fn test_move_and_read_joint() {
        let router = api();
        let (status, body) = send(
            &router,
            Method::PUT,
            "/joints/4/angle",
            Some(json!({"angle": -30.0, "speed": 100})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Joint 4 moving to -30 degrees at speed 100");

        let (_, waited) = send(&router, Method::POST, "/robot/wait", None).await;
        assert_eq!(waited["completed"], true);

        let (status, body) = send(&router, Method::GET, "/joints/4/angle", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["joint_num"], 4);
        assert_eq!(body["angle"], -30.0);

        let (_, body) = send(&router, Method::GET, "/joints/angles", None).await;
        assert_eq!(body["angles"], json!([0.0, 0.0, 0.0, -30.0, 0.0, 0.0]));
    }

    #[tokio::test]
    async fn test_error_statuses() {
        let router = api();

        let (status, body) = send(
            &router,
            Method::PUT,
            "/joints/1/angle",
            Some(json!({"angle": 166.0})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "out_of_range");
        assert!(body["message"].as_str().unwrap().contains("valid range: -165 to 165"));
        assert!(body["timestamp"].is_string());

        let (status, body) = send(&router, Method::PUT, "/joints/1/angle", Some(json!({"speed": 10}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
        let message = body["message"].as_str().unwrap();
        assert!(message.starts_with("set_angle: "));
        assert!(message.contains("angle"));

        let (status, body) = send(&router, Method::GET, "/joints/abc/angle", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("get_angle: "));

        let (status, _) = send(
            &router,
            Method::POST,
            "/joints/2/jog",
            Some(json!({"direction": 0})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let offline = api_router(ApiState::new(Arc::new(OfflineArm)));
        let (status, body) = send(&offline, Method::POST, "/robot/stop", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "not_ready");
    }

    #[tokio::test]
    async fn test_optional_bodies() {
        let router = api();

        let (status, body) = send(&router, Method::POST, "/robot/home", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Moving to home position at speed 50");

        let (status, _) = send(&router, Method::POST, "/robot/home", Some(json!({"speed": 0}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/robot/wait")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{oops"))
            .unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["message"].as_str().unwrap().starts_with("wait_until_idle: "));

        let (status, _) = send(&router, Method::POST, "/robot/wait", Some(json!({"timeout": 61.0}))).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_whole_number_floats_accepted() {
        let router = api();
        let (status, body) = send(
            &router,
            Method::PUT,
            "/joints/1/angle",
            Some(json!({"angle": 10, "speed": 50.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Joint 1 moving to 10 degrees at speed 50");

        let (status, _) = send(
            &router,
            Method::POST,
            "/joints/2/jog",
            Some(json!({"direction": -1.0})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&router, Method::POST, "/robot/home", Some(json!({"speed": 50.5}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().starts_with("home_all: "));
    }

    #[tokio::test]
    async fn test_status_and_stops() {
        let router = api();
        let (status, body) = send(&router, Method::GET, "/robot/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_moving"], false);
        assert_eq!(body["joint_angles"].as_array().unwrap().len(), 6);

        let (status, _) = send(&router, Method::POST, "/joints/9/stop", None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &router,
            Method::PUT,
            "/joints/angles",
            Some(json!({"angles": [0.0, 0.0, 0.0]})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["message"].as_str().unwrap().contains("exactly 6 angles required, got 3"));
    }

    #[tokio::test]
    async fn test_mcp_rpc_over_http() {
        let router = mcp(simulated_arm());

        let (status, body) = send(
            &router,
            Method::POST,
            "/mcp",
            Some(json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["tools"].as_array().unwrap().len(), 11);

        let (status, body) = send(
            &router,
            Method::POST,
            "/sse",
            Some(json!({"jsonrpc": "2.0", "method": "notifications/initialized"})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_mcp_health_and_discovery() {
        let (status, body) = send(&mcp(simulated_arm()), Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["endpoints"]["sse"], "http://localhost:8081/sse");

        let offline = mcp(Arc::new(OfflineArm));
        let (status, body) = send(&offline, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["status"], "degraded");

        let (_, body) = send(&offline, Method::GET, "/.well-known/mcp", None).await;
        assert_eq!(body["required_tools"], json!(["search", "fetch"]));
        assert_eq!(body["additional_tools"].as_array().unwrap().len(), 9);

        let (status, body) = send(&offline, Method::POST, "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["specification"], "http://localhost:8081/mcp");
    }

    #[tokio::test]
    async fn test_sse_announces_endpoint() {
        let request = Request::builder().uri("/sse").body(Body::empty()).unwrap();
        let response = mcp(Arc::new(OfflineArm)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/event-stream"
        );

        let mut body = response.into_body().into_data_stream();
        let first = futures::StreamExt::next(&mut body).await.unwrap().unwrap();
        let text = String::from_utf8(first.to_vec()).unwrap();
        assert!(text.contains("event: endpoint"));
        assert!(text.contains("data: /mcp"));
    }
}
