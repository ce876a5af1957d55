// Agent tools - Closed set of tool calls mapped onto arm operations
use crate::application::arm_control::ArmControl;
use crate::application::prompts::TextContent;
use crate::application::resources::ResourceCatalog;
use crate::domain::error::{ArmError, ErrorKind};
use crate::domain::joint::{DEFAULT_SPEED, JointAngles, JointId};
use crate::domain::motion::{DEFAULT_WAIT_SECS, HOME_ANGLES};
use crate::infrastructure::whole_number;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    Search,
    Fetch,
    GetJointAngle,
    MoveJoint,
    GetAllJointAngles,
    MoveAllJoints,
    HomePosition,
    StopRobot,
    JogJoint,
    WaitForCompletion,
    GetRobotStatus,
}

impl ToolName {
    pub const ALL: [ToolName; 11] = [
        ToolName::Search,
        ToolName::Fetch,
        ToolName::GetJointAngle,
        ToolName::MoveJoint,
        ToolName::GetAllJointAngles,
        ToolName::MoveAllJoints,
        ToolName::HomePosition,
        ToolName::StopRobot,
        ToolName::JogJoint,
        ToolName::WaitForCompletion,
        ToolName::GetRobotStatus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ToolName::Search => "search",
            ToolName::Fetch => "fetch",
            ToolName::GetJointAngle => "get_joint_angle",
            ToolName::MoveJoint => "move_joint",
            ToolName::GetAllJointAngles => "get_all_joint_angles",
            ToolName::MoveAllJoints => "move_all_joints",
            ToolName::HomePosition => "home_position",
            ToolName::StopRobot => "stop_robot",
            ToolName::JogJoint => "jog_joint",
            ToolName::WaitForCompletion => "wait_for_completion",
            ToolName::GetRobotStatus => "get_robot_status",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            ToolName::Search => {
                "Search through MyCobot robot resources, capabilities, and status information. \
                 Query can be about joint names, robot status, movement types, or any robot-related topics."
            }
            ToolName::Fetch => {
                "Fetch detailed information about a specific robot resource by ID. \
                 Use the IDs returned by the search tool."
            }
            ToolName::GetJointAngle => "Get current angle of a specific joint (1-6)",
            ToolName::MoveJoint => "Move a specific joint to target angle",
            ToolName::GetAllJointAngles => "Get current angles of all joints",
            ToolName::MoveAllJoints => "Move all joints to specified angles simultaneously",
            ToolName::HomePosition => "Move all joints to home position (0 degrees)",
            ToolName::StopRobot => "Emergency stop for all joint movements",
            ToolName::JogJoint => "Jog a joint in specified direction",
            ToolName::WaitForCompletion => "Wait for robot to complete current movement",
            ToolName::GetRobotStatus => {
                "Get current robot status including joint angles and movement state"
            }
        }
    }

    pub fn input_schema(self) -> Value {
        let joint_num = json!({
            "type": "integer", "minimum": 1, "maximum": 6,
            "description": "Joint number (1-6)"
        });
        let speed = json!({
            "type": "integer", "minimum": 1, "maximum": 100, "default": DEFAULT_SPEED,
            "description": "Movement speed (1-100)"
        });
        let angle = json!({
            "type": "number", "minimum": -175, "maximum": 175,
            "description": "Target angle in degrees (joints 1-5: -165 to 165, joint 6: -175 to 175)"
        });

        let (properties, required) = match self {
            ToolName::Search => (
                json!({"query": {
                    "type": "string",
                    "description": "Search query for robot resources (e.g., 'joint 1', 'status', 'movements')"
                }}),
                vec!["query"],
            ),
            ToolName::Fetch => (
                json!({"id": {
                    "type": "string",
                    "description": "Resource ID to fetch (e.g., 'robot_status', 'joint_1', 'movements')"
                }}),
                vec!["id"],
            ),
            ToolName::GetJointAngle => (json!({"joint_num": joint_num}), vec!["joint_num"]),
            ToolName::MoveJoint => (
                json!({"joint_num": joint_num, "angle": angle, "speed": speed}),
                vec!["joint_num", "angle"],
            ),
            ToolName::MoveAllJoints => (
                json!({
                    "angles": {
                        "type": "array",
                        "items": {"type": "number", "minimum": -175, "maximum": 175},
                        "minItems": 6,
                        "maxItems": 6,
                        "description": "6 joint angles in degrees [J1, J2, J3, J4, J5, J6]"
                    },
                    "speed": speed
                }),
                vec!["angles"],
            ),
            ToolName::HomePosition => (json!({"speed": speed}), vec![]),
            ToolName::JogJoint => (
                json!({
                    "joint_num": joint_num,
                    "direction": {
                        "type": "integer", "enum": [-1, 1],
                        "description": "1 for positive direction, -1 for negative"
                    },
                    "speed": speed
                }),
                vec!["joint_num", "direction"],
            ),
            ToolName::WaitForCompletion => (
                json!({"timeout": {
                    "type": "number", "minimum": 0.1, "maximum": 60.0, "default": DEFAULT_WAIT_SECS,
                    "description": "Maximum time to wait in seconds"
                }}),
                vec![],
            ),
            ToolName::GetAllJointAngles | ToolName::StopRobot | ToolName::GetRobotStatus => {
                (json!({}), vec![])
            }
        };

        json!({"type": "object", "properties": properties, "required": required})
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

pub fn list_tools() -> Vec<ToolInfo> {
    ToolName::ALL
        .into_iter()
        .map(|t| ToolInfo {
            name: t.as_str(),
            description: t.description(),
            input_schema: t.input_schema(),
        })
        .collect()
}

fn default_speed() -> i64 {
    DEFAULT_SPEED
}

fn default_timeout() -> f64 {
    DEFAULT_WAIT_SECS
}

/// A decoded tool invocation. Numbers stay raw so range checks happen in
/// the controller, not here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    Search {
        query: String,
    },
    Fetch {
        id: String,
    },
    GetJointAngle {
        #[serde(deserialize_with = "whole_number::deserialize")]
        joint_num: i64,
    },
    MoveJoint {
        #[serde(deserialize_with = "whole_number::deserialize")]
        joint_num: i64,
        angle: f64,
        #[serde(default = "default_speed", deserialize_with = "whole_number::deserialize")]
        speed: i64,
    },
    GetAllJointAngles {},
    MoveAllJoints {
        angles: Vec<f64>,
        #[serde(default = "default_speed", deserialize_with = "whole_number::deserialize")]
        speed: i64,
    },
    HomePosition {
        #[serde(default = "default_speed", deserialize_with = "whole_number::deserialize")]
        speed: i64,
    },
    StopRobot {},
    JogJoint {
        #[serde(deserialize_with = "whole_number::deserialize")]
        joint_num: i64,
        #[serde(deserialize_with = "whole_number::deserialize")]
        direction: i64,
        #[serde(default = "default_speed", deserialize_with = "whole_number::deserialize")]
        speed: i64,
    },
    WaitForCompletion {
        #[serde(default = "default_timeout")]
        timeout: f64,
    },
    GetRobotStatus {},
}

impl ToolCall {
    pub fn decode(name: &str, arguments: Value) -> Result<Self, ToolError> {
        if ToolName::parse(name).is_none() {
            return Err(ToolError::UnknownTool(name.to_string()));
        }
        let arguments = if arguments.is_null() { json!({}) } else { arguments };

        serde_json::from_value(json!({ "name": name, "arguments": arguments }))
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
    #[error(transparent)]
    Arm(#[from] ArmError),
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::UnknownTool(_)
            | ToolError::InvalidArguments(_)
            | ToolError::ResourceNotFound(_) => ErrorKind::BadRequest,
            ToolError::Arm(e) => e.kind(),
        }
    }
}

/// Result envelope returned to the tool client
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    pub content: Vec<TextContent>,
    pub is_error: bool,
}

impl ToolResult {
    fn json(value: &Value, is_error: bool) -> Self {
        let text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
        Self {
            content: vec![TextContent::new(text)],
            is_error,
        }
    }
}

fn joints_detail(angles: &JointAngles) -> Vec<Value> {
    JointId::all()
        .map(|j| json!({"joint": j.number(), "angle": angles[j.index()], "name": j.name()}))
        .collect()
}

/// Runs tool calls against an arm. Shared by the STDIO and HTTP transports.
#[derive(Clone)]
pub struct ToolDispatcher {
    arm: Arc<dyn ArmControl>,
    catalog: Arc<ResourceCatalog>,
}

impl ToolDispatcher {
    pub fn new(arm: Arc<dyn ArmControl>, catalog: Arc<ResourceCatalog>) -> Self {
        Self { arm, catalog }
    }

    /// Decode and run one call, always producing an envelope
    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolResult {
        let outcome = match ToolCall::decode(name, arguments.clone()) {
            Ok(call) => self.call(call).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(value) => ToolResult::json(&value, false),
            Err(ToolError::UnknownTool(name)) => {
                tracing::warn!("Unknown tool requested: {}", name);
                ToolResult {
                    content: vec![TextContent::new(format!("Unknown tool: {}", name))],
                    is_error: true,
                }
            }
            Err(e) => {
                tracing::warn!("Tool {} failed: {}", name, e);
                let body = json!({
                    "error": e.to_string(),
                    "kind": e.kind().as_str(),
                    "tool": name,
                    "arguments": arguments,
                });
                ToolResult::json(&body, true)
            }
        }
    }

    pub async fn call(&self, call: ToolCall) -> Result<Value, ToolError> {
        let arm = self.arm.as_ref();
        let value = match call {
            ToolCall::Search { query } => serde_json::to_value(self.catalog.search(&query))
                .map_err(|e| ToolError::InvalidArguments(e.to_string()))?,
            ToolCall::Fetch { id } => self
                .catalog
                .fetch(&id, arm)
                .await
                .ok_or(ToolError::ResourceNotFound(id))?,
            ToolCall::GetJointAngle { joint_num } => {
                let angle = arm.get_angle(joint_num).await?;
                json!({"joint_num": joint_num, "angle": angle, "unit": "degrees"})
            }
            ToolCall::MoveJoint {
                joint_num,
                angle,
                speed,
            } => {
                arm.set_angle(joint_num, angle, speed).await?;
                json!({
                    "success": true,
                    "message": format!("Joint {} moving to {} degrees at speed {}", joint_num, angle, speed),
                    "joint_num": joint_num,
                    "target_angle": angle,
                    "speed": speed,
                })
            }
            ToolCall::GetAllJointAngles {} => {
                let angles = arm.get_all_angles().await?;
                json!({
                    "joint_angles": angles,
                    "joints": joints_detail(&angles),
                    "unit": "degrees",
                })
            }
            ToolCall::MoveAllJoints { angles, speed } => {
                arm.set_all_angles(&angles, speed).await?;
                json!({
                    "success": true,
                    "message": format!("All joints moving to {:?} at speed {}", angles, speed),
                    "target_angles": angles,
                    "speed": speed,
                })
            }
            ToolCall::HomePosition { speed } => {
                arm.home_all(speed).await?;
                json!({
                    "success": true,
                    "message": format!("Moving to home position at speed {}", speed),
                    "target_angles": HOME_ANGLES,
                    "speed": speed,
                })
            }
            ToolCall::StopRobot {} => {
                arm.stop(None).await?;
                json!({"success": true, "message": "All joints stopped"})
            }
            ToolCall::JogJoint {
                joint_num,
                direction,
                speed,
            } => {
                arm.jog(joint_num, direction, speed).await?;
                let label = if direction == 1 { "positive" } else { "negative" };
                json!({
                    "success": true,
                    "message": format!("Joint {} jogging in {} direction at speed {}", joint_num, label, speed),
                    "joint_num": joint_num,
                    "direction": direction,
                    "speed": speed,
                })
            }
            ToolCall::WaitForCompletion { timeout } => {
                let outcome = arm.wait_until_idle(timeout).await?;
                json!({
                    "completed": outcome.completed,
                    "elapsed_time": outcome.elapsed_secs(),
                    "timeout": timeout,
                })
            }
            ToolCall::GetRobotStatus {} => {
                let status = arm.status().await?;
                json!({
                    "joint_angles": status.joint_angles,
                    "is_moving": status.is_moving,
                    "joints": joints_detail(&status.joint_angles),
                    "unit": "degrees",
                })
            }
        };
        Ok(value)
    }
}
