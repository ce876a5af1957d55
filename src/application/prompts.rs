// Prompt templates offered to tool clients
use crate::application::arm_control::ArmControl;
use crate::domain::joint::{JointBounds, JointId, MAX_SPEED, MIN_SPEED};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

const BASIC_MOVEMENTS: &str = "\
MyCobot Basic Movement Examples:

1. Move to Home Position:
   - Use: home_position tool with speed parameter

2. Move Single Joint:
   - Use: move_joint tool with joint_num (1-6), angle (within the joint's limits), speed (1-100)

3. Move All Joints:
   - Use: move_all_joints tool with array of 6 angles and speed

4. Get Current Position:
   - Use: get_all_joint_angles or get_joint_angle tools

5. Jog Joint:
   - Use: jog_joint tool with joint_num, direction (1 or -1), speed

6. Emergency Stop:
   - Use: stop_robot tool

7. Wait for Movement:
   - Use: wait_for_completion tool with timeout

Always check robot status before and after movements for safety.
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptName {
    RobotStatus,
    JointInfo,
    BasicMovements,
}

impl PromptName {
    pub const ALL: [PromptName; 3] = [
        PromptName::RobotStatus,
        PromptName::JointInfo,
        PromptName::BasicMovements,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PromptName::RobotStatus => "robot_status",
            PromptName::JointInfo => "joint_info",
            PromptName::BasicMovements => "basic_movements",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            PromptName::RobotStatus => "Get comprehensive robot status information",
            PromptName::JointInfo => "Get information about robot joints and their limits",
            PromptName::BasicMovements => "Examples of basic robot movements",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: Vec<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptResult {
    pub description: &'static str,
    pub messages: Vec<PromptMessage>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptMessage {
    pub role: &'static str,
    pub content: TextContent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl TextContent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            kind: "text",
            text: text.into(),
        }
    }
}

pub fn list_prompts() -> Vec<PromptInfo> {
    PromptName::ALL
        .into_iter()
        .map(|p| PromptInfo {
            name: p.as_str(),
            description: p.description(),
            arguments: Vec::new(),
        })
        .collect()
}

pub async fn render_prompt(name: PromptName, bounds: &JointBounds, arm: &dyn ArmControl) -> PromptResult {
    let (description, text) = match name {
        PromptName::RobotStatus => ("Current robot status", robot_status_text(arm).await),
        PromptName::JointInfo => ("Robot joint information and limits", joint_info_text(bounds)),
        PromptName::BasicMovements => (
            "Basic robot movement examples and usage",
            BASIC_MOVEMENTS.to_string(),
        ),
    };

    PromptResult {
        description,
        messages: vec![PromptMessage {
            role: "user",
            content: TextContent::new(text),
        }],
    }
}

async fn robot_status_text(arm: &dyn ArmControl) -> String {
    let status = match arm.status().await {
        Ok(status) => status,
        Err(e) => return format!("Error getting robot status: {}", e),
    };

    let mut text = String::from("MyCobot Robot Status:\n\nCurrent Joint Angles:\n");
    for joint in JointId::all() {
        let _ = writeln!(
            text,
            "- Joint {} ({}): {:.1}°",
            joint.number(),
            joint.name(),
            status.joint_angles[joint.index()]
        );
    }
    let state = if status.is_moving { "Moving" } else { "Stationary" };
    let _ = write!(text, "\nRobot Movement State: {}\n", state);
    text
}

fn joint_info_text(bounds: &JointBounds) -> String {
    let mut text = String::from("MyCobot 280 Joint Information:\n\nJoint Limits (degrees):\n");
    for joint in JointId::all() {
        let range = bounds.range(joint);
        let _ = writeln!(
            text,
            "- Joint {} ({}): {}° to +{}°",
            joint.number(),
            joint.name(),
            range.min,
            range.max
        );
    }
    let _ = write!(
        text,
        "\nMovement Speed Range: {}-{} ({}=slowest, {}=fastest)\nHome Position: All joints at 0°\n",
        MIN_SPEED, MAX_SPEED, MIN_SPEED, MAX_SPEED
    );
    text
}
