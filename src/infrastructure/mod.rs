// Infrastructure layer - Hardware links, remote clients and wire formats
pub mod config;
pub mod http_response;
pub mod jsonrpc;
pub mod mycobot_protocol;
pub mod remote_arm;
pub mod serial_driver;
pub mod simulated_driver;
pub mod whole_number;
