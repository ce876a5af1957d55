// Application layer - Arm façade, ports and agent-tool services
pub mod arm_control;
pub mod arm_controller;
pub mod arm_driver;
pub mod mcp_server;
pub mod prompts;
pub mod resources;
pub mod tools;
