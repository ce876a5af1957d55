// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod infrastructure;
mod presentation;

use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::arm_control::{ArmControl, OfflineArm};
use crate::application::arm_controller::ArmController;
use crate::application::arm_driver::ArmDriver;
use crate::application::mcp_server::McpServer;
use crate::domain::joint::JointBounds;
use crate::infrastructure::config::{
    ConfigOverrides, DriverKind, DriverSettings, GatewayConfig, ToolBackend, load_config,
};
use crate::infrastructure::remote_arm::RemoteArm;
use crate::infrastructure::serial_driver::SerialDriver;
use crate::infrastructure::simulated_driver::SimulatedDriver;
use crate::presentation::app_state::{ApiState, McpState};
use crate::presentation::mcp_stdio::serve_stdio;
use crate::presentation::routes::{api_router, mcp_router};

#[derive(Parser)]
#[command(name = "mycobot-gateway", version)]
#[command(about = "Control gateway for the MyCobot 280 arm", long_about = None)]
struct Cli {
    /// Config file, without extension (default: config/gateway, optional)
    #[arg(short, long, global = true, env = "MYCOBOT_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the REST API over a locally attached arm
    Api {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
        #[command(flatten)]
        driver: DriverArgs,
    },
    /// Serve agent tools over newline-delimited JSON-RPC on stdin/stdout
    McpStdio {
        #[command(flatten)]
        tools: ToolArgs,
        #[command(flatten)]
        driver: DriverArgs,
    },
    /// Serve agent tools over HTTP and server-sent events
    McpHttp {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
        #[command(flatten)]
        tools: ToolArgs,
        #[command(flatten)]
        driver: DriverArgs,
    },
}

#[derive(Args)]
struct DriverArgs {
    /// serial or simulated
    #[arg(long)]
    driver: Option<String>,
    #[arg(long)]
    serial_port: Option<String>,
    #[arg(long)]
    baudrate: Option<u32>,
}

#[derive(Args)]
struct ToolArgs {
    /// remote (proxy the REST API) or local (drive the arm directly)
    #[arg(long)]
    backend: Option<String>,
    /// Base URL of the REST API for the remote backend
    #[arg(long)]
    api_url: Option<String>,
}

impl Command {
    fn overrides(&self) -> ConfigOverrides {
        let driver_overrides = |driver: &DriverArgs| ConfigOverrides {
            driver_kind: driver.driver.clone(),
            driver_port: driver.serial_port.clone(),
            baudrate: driver.baudrate,
            ..Default::default()
        };

        match self {
            Command::Api { host, port, driver } => ConfigOverrides {
                server_host: host.clone(),
                server_port: *port,
                ..driver_overrides(driver)
            },
            Command::McpStdio { tools, driver } => ConfigOverrides {
                tools_backend: tools.backend.clone(),
                api_base_url: tools.api_url.clone(),
                ..driver_overrides(driver)
            },
            Command::McpHttp {
                host,
                port,
                tools,
                driver,
            } => ConfigOverrides {
                tools_host: host.clone(),
                tools_port: *port,
                tools_backend: tools.backend.clone(),
                api_base_url: tools.api_url.clone(),
                ..driver_overrides(driver)
            },
        }
    }
}

/// The arm as seen by the servers, plus the controller to close on shutdown
struct ArmHandle {
    control: Arc<dyn ArmControl>,
    controller: Option<Arc<ArmController>>,
}

impl ArmHandle {
    async fn shutdown(&self) {
        if let Some(controller) = &self.controller {
            controller.close().await;
        }
    }
}

async fn open_driver(settings: &DriverSettings, bounds: &JointBounds) -> anyhow::Result<Box<dyn ArmDriver>> {
    match settings.kind {
        DriverKind::Serial => Ok(Box::new(SerialDriver::open(settings).await?)),
        DriverKind::Simulated => {
            tracing::info!("Using simulated arm");
            Ok(Box::new(SimulatedDriver::new(bounds.clone())))
        }
    }
}

/// Connect to the locally attached arm. If the link cannot be opened the
/// server still starts and every operation reports not ready.
async fn local_arm(settings: &GatewayConfig) -> ArmHandle {
    let bounds = JointBounds::mycobot_280();
    match open_driver(&settings.driver, &bounds).await {
        Ok(driver) => {
            let controller = Arc::new(ArmController::spawn(
                driver,
                bounds,
                settings.motion.poll_interval(),
            ));
            ArmHandle {
                control: controller.clone(),
                controller: Some(controller),
            }
        }
        Err(e) => {
            tracing::error!("Failed to connect to robot: {:#}", e);
            ArmHandle {
                control: Arc::new(OfflineArm),
                controller: None,
            }
        }
    }
}

async fn tool_arm(settings: &GatewayConfig) -> ArmHandle {
    match settings.tools.backend {
        ToolBackend::Local => local_arm(settings).await,
        ToolBackend::Remote => {
            let remote = RemoteArm::new(&settings.tools.api_base_url);
            if remote.is_connected().await {
                tracing::info!("Connected to robot API at {}", remote.base_url());
            } else {
                tracing::warn!(
                    "Robot API at {} is not reachable or has no robot, starting degraded",
                    remote.base_url()
                );
            }
            ArmHandle {
                control: Arc::new(remote),
                controller: None,
            }
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

async fn serve(router: axum::Router, host: &str, port: u16) -> anyhow::Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries protocol frames in STDIO mode
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = load_config(cli.config.as_deref(), &cli.command.overrides())?;

    match cli.command {
        Command::Api { .. } => {
            let arm = local_arm(&settings).await;
            let router = api_router(ApiState::new(arm.control.clone()));

            tracing::info!("Starting MyCobot REST API");
            let result = serve(router, &settings.server.host, settings.server.port).await;
            arm.shutdown().await;
            result
        }
        Command::McpStdio { .. } => {
            let arm = tool_arm(&settings).await;
            let server = McpServer::new(arm.control.clone(), JointBounds::mycobot_280());

            tracing::info!("Starting MyCobot MCP server on STDIO");
            let result = tokio::select! {
                result = serve_stdio(server) => result,
                _ = shutdown_signal() => Ok(()),
            };
            arm.shutdown().await;
            result
        }
        Command::McpHttp { .. } => {
            let arm = tool_arm(&settings).await;
            let state = McpState {
                server: McpServer::new(arm.control.clone(), JointBounds::mycobot_280()),
                keep_alive: settings.tools.keep_alive(),
                public_url: format!("http://{}:{}", settings.tools.host, settings.tools.port),
            };

            tracing::info!("Starting MyCobot MCP server over HTTP");
            let result = serve(mcp_router(state), &settings.tools.host, settings.tools.port).await;
            arm.shutdown().await;
            result
        }
    }
}
