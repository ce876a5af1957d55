// Application state for HTTP handlers
use crate::application::arm_control::ArmControl;
use crate::application::mcp_server::McpServer;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct ApiState {
    pub arm: Arc<dyn ArmControl>,
}

impl ApiState {
    pub fn new(arm: Arc<dyn ArmControl>) -> Self {
        Self { arm }
    }
}

#[derive(Clone)]
pub struct McpState {
    pub server: McpServer,
    pub keep_alive: Duration,
    /// Base URL advertised in discovery documents
    pub public_url: String,
}
