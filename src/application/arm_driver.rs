// Driver trait for the arm's hardware link
use crate::domain::joint::{Direction, JointAngles, JointId, Speed};
use async_trait::async_trait;

/// Low-level primitives of the arm. Implementations talk to hardware (or a
/// simulation) and are only ever driven by one task at a time, so they take
/// `&mut self` and need not be `Sync`.
#[async_trait]
pub trait ArmDriver: Send {
    /// Start moving one joint to an absolute angle
    async fn send_angle(&mut self, joint: JointId, angle: f64, speed: Speed) -> anyhow::Result<()>;

    /// Start moving all joints together
    async fn send_angles(&mut self, angles: JointAngles, speed: Speed) -> anyhow::Result<()>;

    /// Move one joint continuously until stopped or at its limit
    async fn jog_angle(
        &mut self,
        joint: JointId,
        direction: Direction,
        speed: Speed,
    ) -> anyhow::Result<()>;

    /// Stop every joint
    async fn stop(&mut self) -> anyhow::Result<()>;

    async fn get_angles(&mut self) -> anyhow::Result<JointAngles>;

    async fn get_angle(&mut self, joint: JointId) -> anyhow::Result<f64> {
        Ok(self.get_angles().await?[joint.index()])
    }

    async fn is_moving(&mut self) -> anyhow::Result<bool>;

    /// Release the connection. Called once, after which the driver is dropped.
    async fn close(&mut self) -> anyhow::Result<()>;
}
