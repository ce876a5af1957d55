// Error taxonomy shared by the façade and every transport
use std::fmt;

/// Façade operation that produced an error. Used in every error message so a
/// caller can tell which request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SetAngle,
    SetAllAngles,
    GetAngle,
    GetAllAngles,
    Jog,
    Stop,
    HomeAll,
    WaitUntilIdle,
    IsMoving,
    Status,
    Close,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::SetAngle => "set_angle",
            Operation::SetAllAngles => "set_all_angles",
            Operation::GetAngle => "get_angle",
            Operation::GetAllAngles => "get_all_angles",
            Operation::Jog => "jog",
            Operation::Stop => "stop",
            Operation::HomeAll => "home_all",
            Operation::WaitUntilIdle => "wait_until_idle",
            Operation::IsMoving => "is_moving",
            Operation::Status => "status",
            Operation::Close => "close",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain value outside its valid range. Each variant carries the offending
/// value and renders the valid bound.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RangeViolation {
    #[error("joint number must be between 1-6, got {0}")]
    Joint(i64),
    #[error("angle {angle} out of range for joint {joint}, valid range: {min} to {max} degrees")]
    Angle { joint: u8, angle: f64, min: f64, max: f64 },
    #[error("speed must be between 1-100, got {0}")]
    Speed(i64),
    #[error("direction must be 1 or -1, got {0}")]
    Direction(i64),
    #[error("exactly 6 angles required, got {0}")]
    AngleCount(usize),
    #[error("timeout must be greater than 0 and at most 60 seconds, got {0}")]
    Timeout(f64),
}

/// Stable, transport-independent classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself was malformed (wrong types, missing fields).
    BadRequest,
    OutOfRange,
    NotReady,
    DriverError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::OutOfRange => "out_of_range",
            ErrorKind::NotReady => "not_ready",
            ErrorKind::DriverError => "driver_error",
        }
    }

    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "bad_request" => Some(ErrorKind::BadRequest),
            "out_of_range" => Some(ErrorKind::OutOfRange),
            "not_ready" => Some(ErrorKind::NotReady),
            "driver_error" => Some(ErrorKind::DriverError),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ArmError {
    #[error("{operation}: {violation}")]
    OutOfRange {
        operation: Operation,
        violation: RangeViolation,
    },

    /// The controller was never connected or has been closed.
    #[error("{operation}: robot controller not ready")]
    NotReady { operation: Operation },

    #[error("{operation}: driver error: {message}")]
    Driver { operation: Operation, message: String },

    /// A failure reported by a remote controller, relayed with its kind
    /// intact. The message already names the operation.
    #[error("{message}")]
    Upstream {
        operation: Operation,
        kind: ErrorKind,
        message: String,
    },
}

impl ArmError {
    pub fn out_of_range(operation: Operation, violation: RangeViolation) -> Self {
        ArmError::OutOfRange {
            operation,
            violation,
        }
    }

    pub fn driver(operation: Operation, error: anyhow::Error) -> Self {
        ArmError::Driver {
            operation,
            message: format!("{:#}", error),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ArmError::OutOfRange { .. } => ErrorKind::OutOfRange,
            ArmError::NotReady { .. } => ErrorKind::NotReady,
            ArmError::Driver { .. } => ErrorKind::DriverError,
            ArmError::Upstream { kind, .. } => *kind,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            ArmError::OutOfRange { operation, .. }
            | ArmError::NotReady { operation }
            | ArmError::Driver { operation, .. }
            | ArmError::Upstream { operation, .. } => *operation,
        }
    }
}

pub type ArmResult<T> = Result<T, ArmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_operation_and_bound() {
        let err = ArmError::out_of_range(
            Operation::SetAngle,
            RangeViolation::Angle {
                joint: 6,
                angle: 176.0,
                min: -175.0,
                max: 175.0,
            },
        );
        assert_eq!(
            err.to_string(),
            "set_angle: angle 176 out of range for joint 6, valid range: -175 to 175 degrees"
        );
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_driver_error_keeps_context_chain() {
        let cause = anyhow::anyhow!("port closed").context("reading angles");
        let err = ArmError::driver(Operation::GetAllAngles, cause);
        assert_eq!(err.to_string(), "get_all_angles: driver error: reading angles: port closed");
        assert_eq!(err.kind(), ErrorKind::DriverError);
    }

    #[test]
    fn test_wire_kind_round_trip() {
        for kind in [
            ErrorKind::BadRequest,
            ErrorKind::OutOfRange,
            ErrorKind::NotReady,
            ErrorKind::DriverError,
        ] {
            assert_eq!(ErrorKind::from_wire(kind.as_str()), Some(kind));
        }
        assert_eq!(ErrorKind::from_wire("teapot"), None);
    }
}
