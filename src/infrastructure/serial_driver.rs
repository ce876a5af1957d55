// Serial-port driver for the MyCobot 280
use crate::application::arm_driver::ArmDriver;
use crate::domain::joint::{Direction, JointAngles, JointId, Speed};
use crate::infrastructure::config::DriverSettings;
use crate::infrastructure::mycobot_protocol as protocol;
use anyhow::{Context, anyhow};
use async_trait::async_trait;
use bytes::Bytes;
use serialport::{ClearBuffer, SerialPort};
use std::sync::{Arc, Mutex};

pub struct SerialDriver {
    port_name: String,
    port: Arc<Mutex<Box<dyn SerialPort>>>,
}

impl SerialDriver {
    /// Open the port and give the controller time to come up
    pub async fn open(settings: &DriverSettings) -> anyhow::Result<Self> {
        let port = serialport::new(&settings.port, settings.baudrate)
            .timeout(settings.response_timeout())
            .open()
            .with_context(|| format!("opening serial port {}", settings.port))?;

        tracing::info!(
            "Opened serial port {} at {} baud",
            settings.port,
            settings.baudrate
        );
        tokio::time::sleep(settings.settle()).await;

        Ok(Self {
            port_name: settings.port.clone(),
            port: Arc::new(Mutex::new(port)),
        })
    }

    /// Run blocking port I/O off the async runtime
    async fn with_port<T, F>(&self, io: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn SerialPort) -> anyhow::Result<T> + Send + 'static,
    {
        let port = self.port.clone();
        tokio::task::spawn_blocking(move || {
            let mut port = port.lock().map_err(|_| anyhow!("serial port lock poisoned"))?;
            io(&mut **port)
        })
        .await?
    }

    async fn send(&self, frame: Bytes) -> anyhow::Result<()> {
        self.with_port(move |port| {
            port.write_all(&frame).context("writing command")?;
            port.flush().context("flushing command")
        })
        .await
    }

    async fn request(&self, command: u8) -> anyhow::Result<Bytes> {
        self.with_port(move |port| {
            // Drop stale replies from earlier commands
            port.clear(ClearBuffer::Input).context("clearing input buffer")?;
            port.write_all(&protocol::query(command)).context("writing query")?;
            port.flush().context("flushing query")?;
            protocol::read_reply(port, command)
        })
        .await
    }
}

#[async_trait]
impl ArmDriver for SerialDriver {
    async fn send_angle(&mut self, joint: JointId, angle: f64, speed: Speed) -> anyhow::Result<()> {
        self.send(protocol::send_angle(joint, angle, speed)).await
    }

    async fn send_angles(&mut self, angles: JointAngles, speed: Speed) -> anyhow::Result<()> {
        self.send(protocol::send_angles(&angles, speed)).await
    }

    async fn jog_angle(
        &mut self,
        joint: JointId,
        direction: Direction,
        speed: Speed,
    ) -> anyhow::Result<()> {
        self.send(protocol::jog_angle(joint, direction, speed)).await
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.send(protocol::query(protocol::STOP)).await
    }

    async fn get_angles(&mut self) -> anyhow::Result<JointAngles> {
        let data = self.request(protocol::GET_ANGLES).await?;
        protocol::decode_angles(&data)
    }

    async fn is_moving(&mut self) -> anyhow::Result<bool> {
        let data = self.request(protocol::IS_MOVING).await?;
        protocol::decode_flag(&data)
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        self.with_port(|port| port.flush().context("flushing on close")).await?;
        tracing::info!("Closed serial port {}", self.port_name);
        Ok(())
    }
}
