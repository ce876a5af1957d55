// Agent-tool server - JSON-RPC method routing shared by both transports
use crate::application::arm_control::ArmControl;
use crate::application::prompts::{PromptName, list_prompts, render_prompt};
use crate::application::resources::ResourceCatalog;
use crate::application::tools::{ToolDispatcher, list_tools};
use crate::domain::joint::JointBounds;
use crate::infrastructure::jsonrpc::{
    INTERNAL_ERROR, JsonRpcError, JsonRpcRequest, JsonRpcResponse, METHOD_NOT_FOUND, parse_request,
};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "mycobot-controller";

#[derive(Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Deserialize)]
struct PromptParams {
    name: String,
}

#[derive(Clone)]
pub struct McpServer {
    arm: Arc<dyn ArmControl>,
    bounds: JointBounds,
    tools: ToolDispatcher,
}

impl McpServer {
    pub fn new(arm: Arc<dyn ArmControl>, bounds: JointBounds) -> Self {
        let catalog = Arc::new(ResourceCatalog::new(&bounds));
        Self {
            tools: ToolDispatcher::new(arm.clone(), catalog),
            arm,
            bounds,
        }
    }

    pub fn arm(&self) -> &Arc<dyn ArmControl> {
        &self.arm
    }

    /// Handle one raw frame. `None` means nothing should be written back.
    pub async fn handle_message(&self, raw: &str) -> Option<String> {
        let response = match parse_request(raw) {
            Ok(request) => self.handle(request).await?,
            Err(response) => response,
        };
        match serde_json::to_string(&response) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::error!("Failed to encode response: {}", e);
                None
            }
        }
    }

    pub async fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        tracing::debug!("Handling method {}", request.method);

        if request.is_notification() {
            if request.method != "notifications/initialized" {
                tracing::debug!("Ignoring notification {}", request.method);
            }
            return None;
        }

        let id = request.id.clone().unwrap_or(Value::Null);
        let outcome = self.dispatch(&request.method, request.params).await;
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, JsonRpcError> {
        match method {
            "initialize" => Ok(initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": list_tools() })),
            "tools/call" => {
                let params: CallParams = decode_params(params)?;
                let result = self.tools.invoke(&params.name, params.arguments).await;
                to_value(result)
            }
            "prompts/list" => Ok(json!({ "prompts": list_prompts() })),
            "prompts/get" => {
                let params: PromptParams = decode_params(params)?;
                let name = PromptName::parse(&params.name).ok_or_else(|| {
                    JsonRpcError::invalid_params(format!("Unknown prompt: {}", params.name))
                })?;
                let result = render_prompt(name, &self.bounds, self.arm.as_ref()).await;
                to_value(result)
            }
            other => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", other),
            )),
        }
    }
}

pub fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false },
            "prompts": { "listChanged": false }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

fn decode_params<T: serde::de::DeserializeOwned>(params: Value) -> Result<T, JsonRpcError> {
    serde_json::from_value(params).map_err(|e| JsonRpcError::invalid_params(format!("Invalid params: {}", e)))
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, e.to_string()))
}
