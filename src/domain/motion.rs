// Motion commands and readback values
use crate::domain::error::RangeViolation;
use crate::domain::joint::{Direction, JOINT_COUNT, JointAngles, JointBounds, JointId, Speed};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

pub const HOME_ANGLES: JointAngles = [0.0; JOINT_COUNT];

/// Longest wait a caller may request
pub const MAX_WAIT_SECS: f64 = 60.0;
pub const DEFAULT_WAIT_SECS: f64 = 10.0;

/// A validated request for the hardware. Field types only admit in-range
/// joints, speeds and directions; angles are checked against the bounds
/// before a command is built.
#[derive(Debug, Clone, PartialEq)]
pub enum MotionCommand {
    SetAngle {
        joint: JointId,
        angle: f64,
        speed: Speed,
    },
    SetAllAngles {
        angles: JointAngles,
        speed: Speed,
    },
    Jog {
        joint: JointId,
        direction: Direction,
        speed: Speed,
    },
    Stop,
}

impl MotionCommand {
    /// Every angle is validated before anything is built.
    pub fn set_all_angles(
        bounds: &JointBounds,
        angles: &[f64],
        speed: i64,
    ) -> Result<Self, RangeViolation> {
        let angles: JointAngles = angles
            .try_into()
            .map_err(|_| RangeViolation::AngleCount(angles.len()))?;
        for joint in JointId::all() {
            bounds.validate_angle(joint, angles[joint.index()])?;
        }
        let speed = Speed::new(speed)?;
        Ok(MotionCommand::SetAllAngles { angles, speed })
    }
}

impl fmt::Display for MotionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MotionCommand::SetAngle {
                joint,
                angle,
                speed,
            } => write!(
                f,
                "Joint {} moving to {} degrees at speed {}",
                joint.number(),
                angle,
                speed.value()
            ),
            MotionCommand::SetAllAngles { angles, speed } => {
                write!(f, "All joints moving to {:?} at speed {}", angles, speed.value())
            }
            MotionCommand::Jog {
                joint,
                direction,
                speed,
            } => write!(
                f,
                "Joint {} jogging in {} direction at speed {}",
                joint.number(),
                direction.label(),
                speed.value()
            ),
            MotionCommand::Stop => f.write_str("All joints stopped"),
        }
    }
}

/// Validate a wait timeout in seconds, which must lie in (0, 60].
pub fn wait_timeout(seconds: f64) -> Result<Duration, RangeViolation> {
    if seconds > 0.0 && seconds <= MAX_WAIT_SECS {
        Ok(Duration::from_secs_f64(seconds))
    } else {
        Err(RangeViolation::Timeout(seconds))
    }
}

/// Result of waiting for motion to finish. Running out of time is a normal
/// outcome reported through `completed`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaitOutcome {
    pub completed: bool,
    pub elapsed: Duration,
}

impl WaitOutcome {
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotStatus {
    pub joint_angles: JointAngles,
    pub is_moving: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_all_angles_checks_count_then_each_joint() {
        let bounds = JointBounds::mycobot_280();
        assert_eq!(
            MotionCommand::set_all_angles(&bounds, &[0.0; 5], 50),
            Err(RangeViolation::AngleCount(5))
        );
        assert_eq!(
            MotionCommand::set_all_angles(&bounds, &[0.0; 7], 50),
            Err(RangeViolation::AngleCount(7))
        );

        let err = MotionCommand::set_all_angles(&bounds, &[0.0, 0.0, 0.0, 170.0, 0.0, 0.0], 50)
            .unwrap_err();
        assert!(matches!(err, RangeViolation::Angle { joint: 4, .. }));

        // 170 is fine on the last joint only
        assert!(MotionCommand::set_all_angles(&bounds, &[0.0, 0.0, 0.0, 0.0, 0.0, 170.0], 50).is_ok());
    }

    #[test]
    fn test_display_messages() {
        let cmd = MotionCommand::SetAngle {
            joint: JointId::new(2).unwrap(),
            angle: -30.0,
            speed: Speed::new(40).unwrap(),
        };
        assert_eq!(cmd.to_string(), "Joint 2 moving to -30 degrees at speed 40");

        let cmd = MotionCommand::Jog {
            joint: JointId::new(3).unwrap(),
            direction: Direction::Negative,
            speed: Speed::new(20).unwrap(),
        };
        assert_eq!(cmd.to_string(), "Joint 3 jogging in negative direction at speed 20");
    }

    #[test]
    fn test_wait_timeout_range() {
        assert!(wait_timeout(0.0).is_err());
        assert!(wait_timeout(-1.0).is_err());
        assert!(wait_timeout(60.5).is_err());
        assert!(wait_timeout(f64::NAN).is_err());
        assert_eq!(wait_timeout(60.0).unwrap(), Duration::from_secs(60));
        assert_eq!(wait_timeout(0.1).unwrap().as_millis(), 100);
    }
}
