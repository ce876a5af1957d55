// In-process arm model for running without hardware
use crate::application::arm_driver::ArmDriver;
use crate::domain::joint::{Direction, JOINT_COUNT, JointAngles, JointBounds, JointId, Speed};
use async_trait::async_trait;
use tokio::time::Instant;

/// Joint travel per second for each unit of speed
const DEG_PER_SPEED_UNIT: f64 = 2.0;

#[derive(Debug, Clone, Copy)]
struct JointMotion {
    from: f64,
    to: f64,
    rate: f64,
    started: Instant,
}

impl JointMotion {
    fn at_rest(angle: f64) -> Self {
        Self {
            from: angle,
            to: angle,
            rate: 0.0,
            started: Instant::now(),
        }
    }

    fn position(&self, now: Instant) -> f64 {
        let distance = self.to - self.from;
        let travelled = self.rate * now.saturating_duration_since(self.started).as_secs_f64();
        if travelled >= distance.abs() {
            self.to
        } else {
            self.from + travelled.copysign(distance)
        }
    }

    fn is_moving(&self, now: Instant) -> bool {
        self.position(now) != self.to
    }
}

/// Moves every joint linearly toward its target at a rate set by the speed
pub struct SimulatedDriver {
    bounds: JointBounds,
    joints: [JointMotion; JOINT_COUNT],
}

impl SimulatedDriver {
    pub fn new(bounds: JointBounds) -> Self {
        Self {
            bounds,
            joints: [JointMotion::at_rest(0.0); JOINT_COUNT],
        }
    }

    fn start(&mut self, joint: JointId, target: f64, speed: Speed) {
        let now = Instant::now();
        let motion = &mut self.joints[joint.index()];
        *motion = JointMotion {
            from: motion.position(now),
            to: target,
            rate: f64::from(speed.value()) * DEG_PER_SPEED_UNIT,
            started: now,
        };
    }
}

#[async_trait]
impl ArmDriver for SimulatedDriver {
    async fn send_angle(&mut self, joint: JointId, angle: f64, speed: Speed) -> anyhow::Result<()> {
        self.start(joint, angle, speed);
        Ok(())
    }

    async fn send_angles(&mut self, angles: JointAngles, speed: Speed) -> anyhow::Result<()> {
        for joint in JointId::all() {
            self.start(joint, angles[joint.index()], speed);
        }
        Ok(())
    }

    async fn jog_angle(
        &mut self,
        joint: JointId,
        direction: Direction,
        speed: Speed,
    ) -> anyhow::Result<()> {
        let range = self.bounds.range(joint);
        let limit = match direction {
            Direction::Positive => range.max,
            Direction::Negative => range.min,
        };
        self.start(joint, limit, speed);
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        let now = Instant::now();
        for motion in &mut self.joints {
            *motion = JointMotion::at_rest(motion.position(now));
        }
        Ok(())
    }

    async fn get_angles(&mut self) -> anyhow::Result<JointAngles> {
        let now = Instant::now();
        Ok(self.joints.map(|m| m.position(now)))
    }

    async fn is_moving(&mut self) -> anyhow::Result<bool> {
        let now = Instant::now();
        Ok(self.joints.iter().any(|m| m.is_moving(now)))
    }

    async fn close(&mut self) -> anyhow::Result<()> {
        tracing::info!("Simulated arm shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn driver() -> SimulatedDriver {
        SimulatedDriver::new(JointBounds::mycobot_280())
    }

    fn joint(n: i64) -> JointId {
        JointId::new(n).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_moves_linearly_to_target() {
        let mut arm = driver();
        // speed 50 travels 100 degrees per second
        arm.send_angle(joint(1), 10.0, Speed::new(50).unwrap()).await.unwrap();
        assert!(arm.is_moving().await.unwrap());

        tokio::time::advance(Duration::from_millis(50)).await;
        let halfway = arm.get_angle(joint(1)).await.unwrap();
        assert!((halfway - 5.0).abs() < 1e-6, "got {}", halfway);

        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(arm.get_angle(joint(1)).await.unwrap(), 10.0);
        assert!(!arm.is_moving().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_jog_runs_to_limit_and_stop_freezes() {
        let mut arm = driver();
        arm.jog_angle(joint(6), Direction::Negative, Speed::new(100).unwrap())
            .await
            .unwrap();

        tokio::time::advance(Duration::from_millis(250)).await;
        arm.stop().await.unwrap();
        let frozen = arm.get_angle(joint(6)).await.unwrap();
        assert!((frozen + 50.0).abs() < 1e-6, "got {}", frozen);
        assert!(!arm.is_moving().await.unwrap());

        arm.jog_angle(joint(6), Direction::Negative, Speed::new(100).unwrap())
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(arm.get_angle(joint(6)).await.unwrap(), -175.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_angles_moves_every_joint() {
        let mut arm = driver();
        let target = [1.0, -2.0, 3.0, -4.0, 5.0, -6.0];
        arm.send_angles(target, Speed::new(10).unwrap()).await.unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(arm.get_angles().await.unwrap(), target);
    }
}
