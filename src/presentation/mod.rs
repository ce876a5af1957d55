// Presentation layer - REST API and agent-tool transports
pub mod app_state;
pub mod extractors;
pub mod handlers;
pub mod mcp_http;
pub mod mcp_stdio;
pub mod routes;
