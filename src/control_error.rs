//! Conditions the controller recovers from. None of them stops the loop.

use std::fmt;
use std::time::Duration;

/// The transform between two frames could not be obtained within the wait window.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupFailure {
    /// Nothing was ever broadcast that connects the frames.
    Unavailable { reference: String, frame: String },
    /// The transform is known but its newest sample is too old.
    Stale {
        reference: String,
        frame: String,
        age: Duration,
    },
}

impl fmt::Display for LookupFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LookupFailure::Unavailable { reference, frame } => {
                write!(f, "No transform from {} to {}", reference, frame)
            }
            LookupFailure::Stale { reference, frame, age } => write!(
                f,
                "Transform from {} to {} is stale ({} ms old)",
                reference,
                frame,
                age.as_millis()
            ),
        }
    }
}

impl std::error::Error for LookupFailure {}

/// Degraded outcomes of a single tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlError {
    Lookup(LookupFailure),
    /// The solver has no joint configuration for the goal pose.
    UnreachablePose,
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ControlError::Lookup(ref failure) => write!(f, "Lookup failure: {}", failure),
            ControlError::UnreachablePose => write!(f, "Unreachable pose: no inverse kinematics solution"),
        }
    }
}

impl std::error::Error for ControlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ControlError::Lookup(failure) => Some(failure),
            ControlError::UnreachablePose => None,
        }
    }
}

impl From<LookupFailure> for ControlError {
    fn from(failure: LookupFailure) -> Self {
        ControlError::Lookup(failure)
    }
}
