// Gateway-facing port over the arm, shared by the REST and tool transports
use crate::domain::error::{ArmError, ArmResult, Operation};
use crate::domain::joint::JointAngles;
use crate::domain::motion::{RobotStatus, WaitOutcome};
use async_trait::async_trait;

/// Arm operations as the transports see them. Arguments arrive unvalidated;
/// implementations either validate them (the local controller) or relay them
/// to something that does (the REST client).
#[async_trait]
pub trait ArmControl: Send + Sync {
    async fn is_connected(&self) -> bool;

    async fn set_angle(&self, joint: i64, angle: f64, speed: i64) -> ArmResult<()>;

    async fn set_all_angles(&self, angles: &[f64], speed: i64) -> ArmResult<()>;

    async fn get_angle(&self, joint: i64) -> ArmResult<f64>;

    async fn get_all_angles(&self) -> ArmResult<JointAngles>;

    async fn jog(&self, joint: i64, direction: i64, speed: i64) -> ArmResult<()>;

    /// Stop one joint or, with `None`, all of them
    async fn stop(&self, joint: Option<i64>) -> ArmResult<()>;

    async fn home_all(&self, speed: i64) -> ArmResult<()>;

    async fn wait_until_idle(&self, timeout_secs: f64) -> ArmResult<WaitOutcome>;

    async fn status(&self) -> ArmResult<RobotStatus>;
}

/// Stand-in used when the driver could not be connected at startup. Every
/// operation reports the controller as not ready.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineArm;

fn not_ready<T>(operation: Operation) -> ArmResult<T> {
    Err(ArmError::NotReady { operation })
}

#[async_trait]
impl ArmControl for OfflineArm {
    async fn is_connected(&self) -> bool {
        false
    }

    async fn set_angle(&self, _joint: i64, _angle: f64, _speed: i64) -> ArmResult<()> {
        not_ready(Operation::SetAngle)
    }

    async fn set_all_angles(&self, _angles: &[f64], _speed: i64) -> ArmResult<()> {
        not_ready(Operation::SetAllAngles)
    }

    async fn get_angle(&self, _joint: i64) -> ArmResult<f64> {
        not_ready(Operation::GetAngle)
    }

    async fn get_all_angles(&self) -> ArmResult<JointAngles> {
        not_ready(Operation::GetAllAngles)
    }

    async fn jog(&self, _joint: i64, _direction: i64, _speed: i64) -> ArmResult<()> {
        not_ready(Operation::Jog)
    }

    async fn stop(&self, _joint: Option<i64>) -> ArmResult<()> {
        not_ready(Operation::Stop)
    }

    async fn home_all(&self, _speed: i64) -> ArmResult<()> {
        not_ready(Operation::HomeAll)
    }

    async fn wait_until_idle(&self, _timeout_secs: f64) -> ArmResult<WaitOutcome> {
        not_ready(Operation::WaitUntilIdle)
    }

    async fn status(&self) -> ArmResult<RobotStatus> {
        not_ready(Operation::Status)
    }
}
