// Resource catalog behind the search and fetch tools
use crate::application::arm_control::ArmControl;
use crate::domain::joint::{AngleRange, JointBounds, JointId};
use serde::Serialize;
use serde_json::{Value, json};

pub const STATUS_ID: &str = "robot_status";
pub const MOVEMENTS_ID: &str = "movements";
pub const HOME_ID: &str = "home_position";

const JOINT_DESCRIPTIONS: [&str; 6] = [
    "Base rotation joint (Joint 1)",
    "Shoulder joint (Joint 2)",
    "Elbow joint (Joint 3)",
    "First wrist rotation joint (Joint 4)",
    "Second wrist rotation joint (Joint 5)",
    "Third wrist rotation joint (Joint 6)",
];

#[derive(Debug, Clone, Serialize)]
pub struct ResourceEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limits: Option<AngleRange>,
    #[serde(skip)]
    joint: Option<JointId>,
}

impl ResourceEntry {
    fn new(id: &str, kind: &'static str, description: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            name: None,
            description: description.to_string(),
            limits: None,
            joint: None,
        }
    }

    fn searchable_text(&self) -> String {
        [
            self.id.as_str(),
            self.name.as_deref().unwrap_or(""),
            self.description.as_str(),
            self.kind,
        ]
        .join(" ")
        .to_lowercase()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub query: String,
    pub matching_ids: Vec<String>,
    pub total_matches: usize,
    pub available_resources: Vec<String>,
}

/// Static description of the arm, searchable by keyword
#[derive(Debug, Clone)]
pub struct ResourceCatalog {
    entries: Vec<ResourceEntry>,
}

impl ResourceCatalog {
    pub fn new(bounds: &JointBounds) -> Self {
        let mut entries = vec![ResourceEntry::new(
            STATUS_ID,
            "status",
            "Current robot status including joint angles and movement state",
        )];

        for joint in JointId::all() {
            entries.push(ResourceEntry {
                name: Some(format!("{} Joint", joint.name())),
                limits: Some(bounds.range(joint)),
                joint: Some(joint),
                ..ResourceEntry::new(
                    &format!("joint_{}", joint.number()),
                    "joint",
                    JOINT_DESCRIPTIONS[joint.index()],
                )
            });
        }

        entries.push(ResourceEntry::new(
            MOVEMENTS_ID,
            "capability",
            "Available robot movement capabilities and control methods",
        ));
        entries.push(ResourceEntry::new(
            HOME_ID,
            "position",
            "Robot home position (all joints at 0 degrees)",
        ));

        Self { entries }
    }

    /// Case-insensitive substring match over id, name, description and type
    pub fn search(&self, query: &str) -> SearchResult {
        let needle = query.to_lowercase();
        let matching_ids: Vec<String> = self
            .entries
            .iter()
            .filter(|e| e.searchable_text().contains(&needle))
            .map(|e| e.id.clone())
            .collect();

        SearchResult {
            query: query.to_string(),
            total_matches: matching_ids.len(),
            matching_ids,
            available_resources: self.entries.iter().map(|e| e.id.clone()).collect(),
        }
    }

    /// Entry with live data merged in. `None` if the id is unknown. A failed
    /// live read is reported inside the entry rather than failing the fetch.
    pub async fn fetch(&self, id: &str, arm: &dyn ArmControl) -> Option<Value> {
        let entry = self.entries.iter().find(|e| e.id == id)?;
        let mut resource = serde_json::to_value(entry).ok()?;

        let live = match (entry.id.as_str(), entry.joint) {
            (STATUS_ID, _) => match arm.status().await {
                Ok(status) => json!({ "current_data": status, "timestamp": "real-time" }),
                Err(e) => json!({ "error": format!("Could not fetch real-time status: {}", e) }),
            },
            (_, Some(joint)) => match arm.get_angle(joint.number() as i64).await {
                Ok(angle) => json!({ "current_angle": angle, "timestamp": "real-time" }),
                Err(e) => json!({ "error": format!("Could not fetch real-time angle: {}", e) }),
            },
            (MOVEMENTS_ID, _) => json!({
                "available_tools": [
                    "move_joint", "move_all_joints", "home_position",
                    "jog_joint", "stop_robot", "wait_for_completion"
                ],
                "capabilities": {
                    "individual_joint_control": true,
                    "simultaneous_movement": true,
                    "position_feedback": true,
                    "emergency_stop": true,
                    "speed_control": true
                }
            }),
            _ => Value::Null,
        };

        if let (Some(target), Value::Object(extra)) = (resource.as_object_mut(), live) {
            target.extend(extra);
        }
        Some(resource)
    }
}
