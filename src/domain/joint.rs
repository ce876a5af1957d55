// Joint identifiers, bounds and command parameters for the myCobot 280
use crate::domain::error::RangeViolation;
use serde::Serialize;

pub const JOINT_COUNT: usize = 6;

pub const MIN_SPEED: i64 = 1;
pub const MAX_SPEED: i64 = 100;
pub const DEFAULT_SPEED: i64 = 50;

/// Angles in degrees, index 0 = joint 1 ... index 5 = joint 6
pub type JointAngles = [f64; JOINT_COUNT];

const JOINT_NAMES: [&str; JOINT_COUNT] = ["Base", "Shoulder", "Elbow", "Wrist 1", "Wrist 2", "Wrist 3"];

/// One of the six rotational axes, numbered 1-6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct JointId(u8);

impl JointId {
    pub fn new(raw: i64) -> Result<Self, RangeViolation> {
        if (1..=JOINT_COUNT as i64).contains(&raw) {
            Ok(Self(raw as u8))
        } else {
            Err(RangeViolation::Joint(raw))
        }
    }

    /// Joint for a zero-based array index. Panics on an index past the last joint.
    pub fn from_index(index: usize) -> Self {
        assert!(index < JOINT_COUNT, "joint index {} out of bounds", index);
        Self(index as u8 + 1)
    }

    pub fn all() -> impl Iterator<Item = JointId> {
        (0..JOINT_COUNT).map(Self::from_index)
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize - 1
    }

    pub fn name(self) -> &'static str {
        JOINT_NAMES[self.index()]
    }
}

/// Inclusive angle range in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngleRange {
    pub min: f64,
    pub max: f64,
}

impl AngleRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, angle: f64) -> bool {
        // NaN compares false on both sides and is rejected here
        angle >= self.min && angle <= self.max
    }
}

/// Per-joint angle limits, fixed once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct JointBounds {
    ranges: [AngleRange; JOINT_COUNT],
}

impl JointBounds {
    /// Limits of the myCobot 280. The last wrist joint rotates further than the rest.
    pub fn mycobot_280() -> Self {
        let standard = AngleRange::new(-165.0, 165.0);
        Self {
            ranges: [
                standard,
                standard,
                standard,
                standard,
                standard,
                AngleRange::new(-175.0, 175.0),
            ],
        }
    }

    pub fn range(&self, joint: JointId) -> AngleRange {
        self.ranges[joint.index()]
    }

    pub fn validate_angle(&self, joint: JointId, angle: f64) -> Result<(), RangeViolation> {
        let range = self.range(joint);
        if range.contains(angle) {
            Ok(())
        } else {
            Err(RangeViolation::Angle {
                joint: joint.number(),
                angle,
                min: range.min,
                max: range.max,
            })
        }
    }
}

impl Default for JointBounds {
    fn default() -> Self {
        Self::mycobot_280()
    }
}

/// Unitless movement rate in [1, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Speed(u8);

impl Speed {
    pub fn new(raw: i64) -> Result<Self, RangeViolation> {
        if (MIN_SPEED..=MAX_SPEED).contains(&raw) {
            Ok(Self(raw as u8))
        } else {
            Err(RangeViolation::Speed(raw))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn new(raw: i64) -> Result<Self, RangeViolation> {
        match raw {
            1 => Ok(Direction::Positive),
            -1 => Ok(Direction::Negative),
            other => Err(RangeViolation::Direction(other)),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Positive => "positive",
            Direction::Negative => "negative",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joint_ids() {
        for raw in [0, 7, -1] {
            assert_eq!(JointId::new(raw), Err(RangeViolation::Joint(raw)));
        }
        let wrist = JointId::new(6).unwrap();
        assert_eq!(wrist.index(), 5);
        assert_eq!(wrist.name(), "Wrist 3");
        assert_eq!(JointId::all().map(JointId::number).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_bounds_are_inclusive_with_wider_last_joint() {
        let bounds = JointBounds::mycobot_280();
        let base = JointId::new(1).unwrap();
        let wrist = JointId::new(6).unwrap();

        assert!(bounds.validate_angle(base, 165.0).is_ok());
        assert!(bounds.validate_angle(base, -165.0).is_ok());
        assert!(bounds.validate_angle(base, 166.0).is_err());
        assert!(bounds.validate_angle(wrist, 175.0).is_ok());
        assert!(bounds.validate_angle(wrist, 176.0).is_err());
        assert!(bounds.validate_angle(base, f64::NAN).is_err());
        assert!(bounds.validate_angle(base, f64::INFINITY).is_err());

        for joint in JointId::all() {
            let range = bounds.range(joint);
            assert!(range.min < range.max);
        }
    }

    #[test]
    fn test_speed_limits() {
        assert!(Speed::new(0).is_err());
        assert!(Speed::new(101).is_err());
        assert_eq!(Speed::new(1).unwrap().value(), 1);
        assert_eq!(Speed::new(100).unwrap().value(), 100);
    }

    #[test]
    fn test_direction() {
        assert_eq!(Direction::new(1), Ok(Direction::Positive));
        assert_eq!(Direction::new(-1), Ok(Direction::Negative));
        assert_eq!(Direction::new(0), Err(RangeViolation::Direction(0)));
        assert_eq!(Direction::new(2), Err(RangeViolation::Direction(2)));
    }
}
