// Arm controller - Validating façade over a single driver worker
use crate::application::arm_control::ArmControl;
use crate::application::arm_driver::ArmDriver;
use crate::domain::error::{ArmError, ArmResult, Operation};
use crate::domain::joint::{Direction, JointAngles, JointBounds, JointId, Speed};
use crate::domain::motion::{self, HOME_ANGLES, MotionCommand, RobotStatus, WaitOutcome};
use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

const QUEUE_DEPTH: usize = 32;

type Reply<T> = oneshot::Sender<anyhow::Result<T>>;

/// Work item for the driver task
enum DriverRequest {
    Execute {
        command: MotionCommand,
        reply: Reply<()>,
    },
    ReadAngles {
        reply: Reply<JointAngles>,
    },
    ReadAngle {
        joint: JointId,
        reply: Reply<f64>,
    },
    IsMoving {
        reply: Reply<bool>,
    },
    Close {
        reply: Reply<()>,
    },
}

/// The only way to reach the driver. Commands are validated here and then
/// queued to a single task that owns the driver, so the serial link sees one
/// command at a time, in arrival order.
pub struct ArmController {
    bounds: JointBounds,
    poll_interval: Duration,
    // None once closed
    requests: Mutex<Option<mpsc::Sender<DriverRequest>>>,
}

/// Handle on the driver queue for the duration of one operation
struct DriverLink {
    operation: Operation,
    requests: mpsc::Sender<DriverRequest>,
}

impl DriverLink {
    async fn call<T>(&self, make: impl FnOnce(Reply<T>) -> DriverRequest) -> ArmResult<T> {
        let (reply, response) = oneshot::channel();
        let not_ready = || ArmError::NotReady {
            operation: self.operation,
        };

        self.requests.send(make(reply)).await.map_err(|_| not_ready())?;
        response
            .await
            .map_err(|_| not_ready())?
            .map_err(|e| ArmError::driver(self.operation, e))
    }

    async fn execute(&self, command: MotionCommand) -> ArmResult<()> {
        self.call(|reply| DriverRequest::Execute { command, reply }).await
    }

    async fn is_moving(&self) -> ArmResult<bool> {
        self.call(|reply| DriverRequest::IsMoving { reply }).await
    }
}

impl ArmController {
    /// Start the driver task and return a connected controller.
    /// Must be called from within a Tokio runtime.
    pub fn spawn(driver: Box<dyn ArmDriver>, bounds: JointBounds, poll_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
        tokio::spawn(run_driver(driver, rx));

        Self {
            bounds,
            poll_interval,
            requests: Mutex::new(Some(tx)),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    fn link(&self, operation: Operation) -> ArmResult<DriverLink> {
        let requests = self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ArmError::NotReady { operation })?;
        Ok(DriverLink {
            operation,
            requests,
        })
    }

    pub fn validate_joint(&self, operation: Operation, joint: i64) -> ArmResult<JointId> {
        JointId::new(joint).map_err(|v| ArmError::out_of_range(operation, v))
    }

    pub fn validate_angle(&self, operation: Operation, joint: i64, angle: f64) -> ArmResult<JointId> {
        let joint = self.validate_joint(operation, joint)?;
        self.bounds
            .validate_angle(joint, angle)
            .map_err(|v| ArmError::out_of_range(operation, v))?;
        Ok(joint)
    }

    pub fn validate_speed(&self, operation: Operation, speed: i64) -> ArmResult<Speed> {
        Speed::new(speed).map_err(|v| ArmError::out_of_range(operation, v))
    }

    /// Start moving one joint. Returns as soon as the driver accepted the
    /// command, without waiting for the motion to finish.
    pub async fn set_angle(&self, joint: i64, angle: f64, speed: i64) -> ArmResult<()> {
        let operation = Operation::SetAngle;
        let link = self.link(operation)?;
        let joint = self.validate_angle(operation, joint, angle)?;
        let speed = self.validate_speed(operation, speed)?;
        link.execute(MotionCommand::SetAngle {
            joint,
            angle,
            speed,
        })
        .await
    }

    /// Start moving all six joints. Nothing is sent unless every angle is valid.
    pub async fn set_all_angles(&self, angles: &[f64], speed: i64) -> ArmResult<()> {
        self.move_all(Operation::SetAllAngles, angles, speed).await
    }

    pub async fn home_all(&self, speed: i64) -> ArmResult<()> {
        self.move_all(Operation::HomeAll, &HOME_ANGLES, speed).await
    }

    async fn move_all(&self, operation: Operation, angles: &[f64], speed: i64) -> ArmResult<()> {
        let link = self.link(operation)?;
        let command = MotionCommand::set_all_angles(&self.bounds, angles, speed)
            .map_err(|v| ArmError::out_of_range(operation, v))?;
        link.execute(command).await
    }

    pub async fn get_angle(&self, joint: i64) -> ArmResult<f64> {
        let operation = Operation::GetAngle;
        let link = self.link(operation)?;
        let joint = self.validate_joint(operation, joint)?;
        link.call(|reply| DriverRequest::ReadAngle { joint, reply })
            .await
    }

    pub async fn get_all_angles(&self) -> ArmResult<JointAngles> {
        self.link(Operation::GetAllAngles)?
            .call(|reply| DriverRequest::ReadAngles { reply })
            .await
    }

    pub async fn is_moving(&self) -> ArmResult<bool> {
        self.link(Operation::IsMoving)?.is_moving().await
    }

    pub async fn jog(&self, joint: i64, direction: i64, speed: i64) -> ArmResult<()> {
        let operation = Operation::Jog;
        let link = self.link(operation)?;
        let joint = self.validate_joint(operation, joint)?;
        let direction =
            Direction::new(direction).map_err(|v| ArmError::out_of_range(operation, v))?;
        let speed = self.validate_speed(operation, speed)?;
        link.execute(MotionCommand::Jog {
            joint,
            direction,
            speed,
        })
        .await
    }

    /// Stop motion. The driver can only stop every joint at once, so a
    /// per-joint stop halts the whole arm. A stop is never refused on
    /// validation grounds.
    pub async fn stop(&self, joint: Option<i64>) -> ArmResult<()> {
        let link = self.link(Operation::Stop)?;
        if let Some(raw) = joint {
            if let Err(violation) = JointId::new(raw) {
                tracing::warn!("Stop for invalid joint ({}), stopping all joints", violation);
            }
        }
        link.execute(MotionCommand::Stop).await
    }

    /// Poll the moving flag until the arm is idle or `timeout_secs` elapses.
    /// Timing out is reported through `completed`, not as an error.
    pub async fn wait_until_idle(&self, timeout_secs: f64) -> ArmResult<WaitOutcome> {
        let operation = Operation::WaitUntilIdle;
        let link = self.link(operation)?;
        let timeout =
            motion::wait_timeout(timeout_secs).map_err(|v| ArmError::out_of_range(operation, v))?;

        let started = Instant::now();
        let completed = match time::timeout(timeout, self.poll_until_idle(&link)).await {
            Ok(result) => {
                result?;
                true
            }
            Err(_) => false,
        };
        let outcome = WaitOutcome {
            completed,
            elapsed: started.elapsed(),
        };

        tracing::debug!(
            "wait finished: completed={} after {:.2}s",
            outcome.completed,
            outcome.elapsed_secs()
        );
        Ok(outcome)
    }

    async fn poll_until_idle(&self, link: &DriverLink) -> ArmResult<()> {
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if !link.is_moving().await? {
                return Ok(());
            }
        }
    }

    pub async fn status(&self) -> ArmResult<RobotStatus> {
        let link = self.link(Operation::Status)?;
        let joint_angles = link.call(|reply| DriverRequest::ReadAngles { reply }).await?;
        let is_moving = link.is_moving().await?;
        Ok(RobotStatus {
            joint_angles,
            is_moving,
        })
    }

    /// Release the driver. Safe to call any number of times.
    pub async fn close(&self) {
        let requests = self
            .requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(requests) = requests else {
            tracing::debug!("Controller already closed");
            return;
        };

        let link = DriverLink {
            operation: Operation::Close,
            requests,
        };
        match link.call(|reply| DriverRequest::Close { reply }).await {
            Ok(()) => tracing::info!("Driver connection closed"),
            Err(ArmError::NotReady { .. }) => tracing::debug!("Driver task already stopped"),
            Err(e) => tracing::warn!("Error closing driver connection: {}", e),
        }
    }
}

/// Owns the driver and serves queued requests one at a time
async fn run_driver(mut driver: Box<dyn ArmDriver>, mut requests: mpsc::Receiver<DriverRequest>) {
    while let Some(request) = requests.recv().await {
        match request {
            DriverRequest::Execute { command, reply } => {
                tracing::debug!("Dispatching: {}", command);
                let _ = reply.send(execute(driver.as_mut(), command).await);
            }
            DriverRequest::ReadAngles { reply } => {
                let _ = reply.send(driver.get_angles().await);
            }
            DriverRequest::ReadAngle { joint, reply } => {
                let _ = reply.send(driver.get_angle(joint).await);
            }
            DriverRequest::IsMoving { reply } => {
                let _ = reply.send(driver.is_moving().await);
            }
            DriverRequest::Close { reply } => {
                let _ = reply.send(driver.close().await);
                return;
            }
        }
    }

    // Every controller handle went away without an explicit close
    if let Err(e) = driver.close().await {
        tracing::warn!("Error closing driver connection: {:#}", e);
    }
}

async fn execute(driver: &mut dyn ArmDriver, command: MotionCommand) -> anyhow::Result<()> {
    match command {
        MotionCommand::SetAngle {
            joint,
            angle,
            speed,
        } => driver.send_angle(joint, angle, speed).await,
        MotionCommand::SetAllAngles { angles, speed } => driver.send_angles(angles, speed).await,
        MotionCommand::Jog {
            joint,
            direction,
            speed,
        } => driver.jog_angle(joint, direction, speed).await,
        MotionCommand::Stop => driver.stop().await,
    }
}

#[async_trait]
impl ArmControl for ArmController {
    async fn is_connected(&self) -> bool {
        ArmController::is_connected(self)
    }

    async fn set_angle(&self, joint: i64, angle: f64, speed: i64) -> ArmResult<()> {
        ArmController::set_angle(self, joint, angle, speed).await
    }

    async fn set_all_angles(&self, angles: &[f64], speed: i64) -> ArmResult<()> {
        ArmController::set_all_angles(self, angles, speed).await
    }

    async fn get_angle(&self, joint: i64) -> ArmResult<f64> {
        ArmController::get_angle(self, joint).await
    }

    async fn get_all_angles(&self) -> ArmResult<JointAngles> {
        ArmController::get_all_angles(self).await
    }

    async fn jog(&self, joint: i64, direction: i64, speed: i64) -> ArmResult<()> {
        ArmController::jog(self, joint, direction, speed).await
    }

    async fn stop(&self, joint: Option<i64>) -> ArmResult<()> {
        ArmController::stop(self, joint).await
    }

    async fn home_all(&self, speed: i64) -> ArmResult<()> {
        ArmController::home_all(self, speed).await
    }

    async fn wait_until_idle(&self, timeout_secs: f64) -> ArmResult<WaitOutcome> {
        ArmController::wait_until_idle(self, timeout_secs).await
    }

    async fn status(&self) -> ArmResult<RobotStatus> {
        ArmController::status(self).await
    }
}
