// REST client for a gateway API running in another process
use crate::application::arm_control::ArmControl;
use crate::domain::error::{ArmError, ArmResult, ErrorKind, Operation};
use crate::domain::joint::JointAngles;
use crate::domain::motion::{MAX_WAIT_SECS, RobotStatus, WaitOutcome};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    message: String,
}

#[derive(Deserialize)]
struct HealthBody {
    robot_connected: bool,
}

#[derive(Deserialize)]
struct AngleBody {
    angle: f64,
}

#[derive(Deserialize)]
struct AnglesBody {
    angles: JointAngles,
}

#[derive(Deserialize)]
struct StatusBody {
    joint_angles: JointAngles,
    is_moving: bool,
}

#[derive(Deserialize)]
struct WaitBody {
    completed: bool,
    elapsed_time: f64,
}

/// Relays every operation to the REST API. Arguments are passed through
/// untouched; the API's controller validates them.
pub struct RemoteArm {
    client: Client,
    base_url: String,
}

impl RemoteArm {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}{}", self.base_url, path))
            .timeout(REQUEST_TIMEOUT)
    }

    async fn send<T: DeserializeOwned>(&self, operation: Operation, request: RequestBuilder) -> ArmResult<T> {
        let response = request.send().await.map_err(|e| ArmError::Upstream {
            operation,
            kind: ErrorKind::NotReady,
            message: format!("{}: robot API unreachable: {}", operation, e),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upstream_error(operation, status.as_u16(), &body));
        }

        response.json::<T>().await.map_err(|e| ArmError::Upstream {
            operation,
            kind: ErrorKind::DriverError,
            message: format!("{}: unreadable response from robot API: {}", operation, e),
        })
    }

    async fn command(&self, operation: Operation, method: Method, path: &str, body: Value) -> ArmResult<()> {
        self.send::<Value>(operation, self.request(method, path).json(&body))
            .await
            .map(|_| ())
    }
}

fn upstream_error(operation: Operation, status: u16, body: &str) -> ArmError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(body) => ArmError::Upstream {
            operation,
            kind: ErrorKind::from_wire(&body.error).unwrap_or(ErrorKind::DriverError),
            message: body.message,
        },
        Err(_) => ArmError::Upstream {
            operation,
            kind: ErrorKind::DriverError,
            message: format!("{}: robot API returned status {}: {}", operation, status, body),
        },
    }
}

#[async_trait]
impl ArmControl for RemoteArm {
    async fn is_connected(&self) -> bool {
        let response = match self.request(Method::GET, "/health").send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!("Health check failed: {}", e);
                return false;
            }
        };
        response
            .json::<HealthBody>()
            .await
            .map(|health| health.robot_connected)
            .unwrap_or(false)
    }

    async fn set_angle(&self, joint: i64, angle: f64, speed: i64) -> ArmResult<()> {
        let path = format!("/joints/{}/angle", joint);
        self.command(Operation::SetAngle, Method::PUT, &path, json!({"angle": angle, "speed": speed}))
            .await
    }

    async fn set_all_angles(&self, angles: &[f64], speed: i64) -> ArmResult<()> {
        self.command(
            Operation::SetAllAngles,
            Method::PUT,
            "/joints/angles",
            json!({"angles": angles, "speed": speed}),
        )
        .await
    }

    async fn get_angle(&self, joint: i64) -> ArmResult<f64> {
        let path = format!("/joints/{}/angle", joint);
        let body: AngleBody = self
            .send(Operation::GetAngle, self.request(Method::GET, &path))
            .await?;
        Ok(body.angle)
    }

    async fn get_all_angles(&self) -> ArmResult<JointAngles> {
        let body: AnglesBody = self
            .send(Operation::GetAllAngles, self.request(Method::GET, "/joints/angles"))
            .await?;
        Ok(body.angles)
    }

    async fn jog(&self, joint: i64, direction: i64, speed: i64) -> ArmResult<()> {
        let path = format!("/joints/{}/jog", joint);
        self.command(
            Operation::Jog,
            Method::POST,
            &path,
            json!({"direction": direction, "speed": speed}),
        )
        .await
    }

    async fn stop(&self, joint: Option<i64>) -> ArmResult<()> {
        let path = match joint {
            Some(joint) => format!("/joints/{}/stop", joint),
            None => "/robot/stop".to_string(),
        };
        self.command(Operation::Stop, Method::POST, &path, json!({})).await
    }

    async fn home_all(&self, speed: i64) -> ArmResult<()> {
        self.command(Operation::HomeAll, Method::POST, "/robot/home", json!({"speed": speed}))
            .await
    }

    async fn wait_until_idle(&self, timeout_secs: f64) -> ArmResult<WaitOutcome> {
        // The API holds the request open for up to the wait itself
        let wait = Duration::try_from_secs_f64(timeout_secs.clamp(0.0, MAX_WAIT_SECS)).unwrap_or_default();
        let request = self
            .request(Method::POST, "/robot/wait")
            .json(&json!({"timeout": timeout_secs}))
            .timeout(wait + REQUEST_TIMEOUT);

        let body: WaitBody = self.send(Operation::WaitUntilIdle, request).await?;
        Ok(WaitOutcome {
            completed: body.completed,
            elapsed: Duration::try_from_secs_f64(body.elapsed_time).unwrap_or_default(),
        })
    }

    async fn status(&self) -> ArmResult<RobotStatus> {
        let body: StatusBody = self
            .send(Operation::Status, self.request(Method::GET, "/robot/status"))
            .await?;
        Ok(RobotStatus {
            joint_angles: body.joint_angles,
            is_moving: body.is_moving,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::arm_controller::{ArmController, DEFAULT_POLL_INTERVAL};
    use crate::domain::joint::JointBounds;
    use crate::infrastructure::simulated_driver::SimulatedDriver;
    use crate::presentation::app_state::ApiState;
    use crate::presentation::routes::api_router;
    use std::sync::Arc;

    async fn serve_api() -> RemoteArm {
        let bounds = JointBounds::mycobot_280();
        let controller = Arc::new(ArmController::spawn(
            Box::new(SimulatedDriver::new(bounds.clone())),
            bounds,
            DEFAULT_POLL_INTERVAL,
        ));
        let router = api_router(ApiState::new(controller));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        RemoteArm::new(&format!("http://{}/", addr))
    }

    #[test]
    fn test_upstream_error_keeps_kind() {
        let err = upstream_error(
            Operation::Jog,
            422,
            r#"{"error":"out_of_range","message":"jog: direction must be 1 or -1, got 0","timestamp":"x"}"#,
        );
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert_eq!(err.to_string(), "jog: direction must be 1 or -1, got 0");

        let err = upstream_error(Operation::Jog, 502, "Bad Gateway");
        assert_eq!(err.kind(), ErrorKind::DriverError);
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_round_trip_through_api() {
        let arm = serve_api().await;
        assert!(!arm.base_url().ends_with('/'));
        assert!(arm.is_connected().await);

        arm.set_angle(2, 20.0, 100).await.unwrap();
        let outcome = arm.wait_until_idle(5.0).await.unwrap();
        assert!(outcome.completed);
        assert_eq!(arm.get_angle(2).await.unwrap(), 20.0);

        let status = arm.status().await.unwrap();
        assert!(!status.is_moving);
        assert_eq!(status.joint_angles[1], 20.0);
        arm.stop(None).await.unwrap();
        arm.stop(Some(3)).await.unwrap();
    }

    #[tokio::test]
    async fn test_validation_errors_are_relayed() {
        let arm = serve_api().await;

        let err = arm.set_angle(7, 0.0, 50).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
        assert!(err.to_string().contains("joint number must be between 1-6, got 7"));

        let err = arm.set_all_angles(&[0.0; 5], 50).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);

        let err = arm.wait_until_idle(0.0).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_not_ready() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let arm = RemoteArm::new(&format!("http://{}", addr));
        assert!(!arm.is_connected().await);
        let err = arm.get_all_angles().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotReady);
        assert_eq!(err.operation(), Operation::GetAllAngles);

        let err = arm.status().await.unwrap_err();
        assert_eq!(err.operation(), Operation::Status);
    }
}
