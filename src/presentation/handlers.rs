// HTTP request handlers for the REST API
use crate::domain::error::Operation;
use crate::domain::joint::DEFAULT_SPEED;
use crate::domain::motion::DEFAULT_WAIT_SECS;
use crate::infrastructure::http_response::{ApiError, with_timestamp};
use crate::infrastructure::whole_number;
use crate::presentation::app_state::ApiState;
use crate::presentation::extractors::{ApiJson, ApiPath, OptionalJson, ShapeRejection};
use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

type ApiResult = Result<Json<Value>, ApiError>;

/// Extractor output that still needs the operation attached to its rejection
type Shaped<T> = Result<T, ShapeRejection>;

fn default_speed() -> i64 {
    DEFAULT_SPEED
}

#[derive(Deserialize)]
pub struct SetAngleRequest {
    pub angle: f64,
    #[serde(default = "default_speed", deserialize_with = "whole_number::deserialize")]
    pub speed: i64,
}

#[derive(Deserialize)]
pub struct SetAnglesRequest {
    pub angles: Vec<f64>,
    #[serde(default = "default_speed", deserialize_with = "whole_number::deserialize")]
    pub speed: i64,
}

#[derive(Deserialize)]
pub struct JogRequest {
    #[serde(deserialize_with = "whole_number::deserialize")]
    pub direction: i64,
    #[serde(default = "default_speed", deserialize_with = "whole_number::deserialize")]
    pub speed: i64,
}

#[derive(Deserialize)]
pub struct HomeRequest {
    #[serde(default = "default_speed", deserialize_with = "whole_number::deserialize")]
    pub speed: i64,
}

impl Default for HomeRequest {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED,
        }
    }
}

#[derive(Deserialize)]
pub struct WaitRequest {
    #[serde(default = "default_wait")]
    pub timeout: f64,
}

fn default_wait() -> f64 {
    DEFAULT_WAIT_SECS
}

impl Default for WaitRequest {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_WAIT_SECS,
        }
    }
}

fn success(message: String) -> Json<Value> {
    with_timestamp(json!({ "success": true, "message": message }))
}

/// Health check endpoint
pub async fn health(State(state): State<ApiState>) -> Json<Value> {
    let connected = state.arm.is_connected().await;
    with_timestamp(json!({
        "status": if connected { "healthy" } else { "degraded" },
        "robot_connected": connected,
        "api_version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn get_joint_angle(State(state): State<ApiState>, path: Shaped<ApiPath<i64>>) -> ApiResult {
    let ApiPath(joint) = path.map_err(|e| e.during(Operation::GetAngle))?;
    let angle = state.arm.get_angle(joint).await?;
    Ok(with_timestamp(json!({ "joint_num": joint, "angle": angle })))
}

pub async fn set_joint_angle(
    State(state): State<ApiState>,
    path: Shaped<ApiPath<i64>>,
    body: Shaped<ApiJson<SetAngleRequest>>,
) -> ApiResult {
    let operation = Operation::SetAngle;
    let ApiPath(joint) = path.map_err(|e| e.during(operation))?;
    let ApiJson(request) = body.map_err(|e| e.during(operation))?;
    state.arm.set_angle(joint, request.angle, request.speed).await?;
    Ok(success(format!(
        "Joint {} moving to {} degrees at speed {}",
        joint, request.angle, request.speed
    )))
}

pub async fn get_all_angles(State(state): State<ApiState>) -> ApiResult {
    let angles = state.arm.get_all_angles().await?;
    Ok(with_timestamp(json!({ "angles": angles })))
}

pub async fn set_all_angles(
    State(state): State<ApiState>,
    body: Shaped<ApiJson<SetAnglesRequest>>,
) -> ApiResult {
    let ApiJson(request) = body.map_err(|e| e.during(Operation::SetAllAngles))?;
    state.arm.set_all_angles(&request.angles, request.speed).await?;
    Ok(success(format!(
        "All joints moving to {:?} at speed {}",
        request.angles, request.speed
    )))
}

pub async fn jog_joint(
    State(state): State<ApiState>,
    path: Shaped<ApiPath<i64>>,
    body: Shaped<ApiJson<JogRequest>>,
) -> ApiResult {
    let operation = Operation::Jog;
    let ApiPath(joint) = path.map_err(|e| e.during(operation))?;
    let ApiJson(request) = body.map_err(|e| e.during(operation))?;
    state.arm.jog(joint, request.direction, request.speed).await?;
    let label = if request.direction == 1 { "positive" } else { "negative" };
    Ok(success(format!(
        "Joint {} jogging in {} direction at speed {}",
        joint, label, request.speed
    )))
}

pub async fn stop_joint(State(state): State<ApiState>, path: Shaped<ApiPath<i64>>) -> ApiResult {
    let ApiPath(joint) = path.map_err(|e| e.during(Operation::Stop))?;
    state.arm.stop(Some(joint)).await?;
    Ok(success(format!("Stop requested for joint {}, all joints stopped", joint)))
}

pub async fn home(State(state): State<ApiState>, body: Shaped<OptionalJson<HomeRequest>>) -> ApiResult {
    let OptionalJson(request) = body.map_err(|e| e.during(Operation::HomeAll))?;
    state.arm.home_all(request.speed).await?;
    Ok(success(format!("Moving to home position at speed {}", request.speed)))
}

pub async fn stop_all(State(state): State<ApiState>) -> ApiResult {
    state.arm.stop(None).await?;
    Ok(success("All joints stopped".to_string()))
}

pub async fn robot_status(State(state): State<ApiState>) -> ApiResult {
    let status = state.arm.status().await?;
    Ok(with_timestamp(status))
}

pub async fn wait_for_completion(
    State(state): State<ApiState>,
    body: Shaped<OptionalJson<WaitRequest>>,
) -> ApiResult {
    let OptionalJson(request) = body.map_err(|e| e.during(Operation::WaitUntilIdle))?;
    let outcome = state.arm.wait_until_idle(request.timeout).await?;
    Ok(with_timestamp(json!({
        "completed": outcome.completed,
        "elapsed_time": outcome.elapsed_secs(),
    })))
}
