//! Hand-off of a pre-assembled joint trajectory to a goal-oriented executor ("go" trigger).
//!
//! This path does not take part in the per-tick control. The trajectory is assembled
//! elsewhere in a [`TrajectoryBuffer`]; a `true` go message sends whatever has been
//! assembled so far and starts a new, empty trajectory.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info};

use crate::kinematic_traits::Joints;
use crate::utils::format_joints;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    pub positions: Joints,
    pub time_from_start: Duration,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JointTrajectory {
    pub points: Vec<TrajectoryPoint>,
}

/// Executes whole trajectories, like an action server following joint trajectories.
pub trait TrajectoryClient: Send {
    fn send_goal(&mut self, trajectory: JointTrajectory);
}

/// Logs the goals instead of executing them, for running without an executor.
#[derive(Debug, Default)]
pub struct LoggingClient {
    sent: usize,
}

impl LoggingClient {
    pub fn sent(&self) -> usize {
        self.sent
    }
}

impl TrajectoryClient for LoggingClient {
    fn send_goal(&mut self, trajectory: JointTrajectory) {
        self.sent += 1;
        for point in &trajectory.points {
            info!("Goal {} at {:?}: {}", self.sent, point.time_from_start, format_joints(&point.positions));
        }
    }
}

/// Shared, growable trajectory. Clones refer to the same trajectory.
#[derive(Clone, Default)]
pub struct TrajectoryBuffer {
    trajectory: Arc<Mutex<JointTrajectory>>,
}

impl TrajectoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, JointTrajectory> {
        self.trajectory.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push(&self, positions: Joints, time_from_start: Duration) {
        self.lock().points.push(TrajectoryPoint { positions, time_from_start });
    }

    pub fn clear(&self) {
        self.lock().points.clear();
    }

    pub fn len(&self) -> usize {
        self.lock().points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().points.is_empty()
    }

    /// Takes the assembled trajectory out, leaving an empty one.
    pub fn take(&self) -> JointTrajectory {
        std::mem::take(&mut *self.lock())
    }
}

/// Reacts on go messages.
pub struct GoTrigger {
    buffer: TrajectoryBuffer,
    client: Box<dyn TrajectoryClient>,
}

impl GoTrigger {
    pub fn new(buffer: TrajectoryBuffer, client: Box<dyn TrajectoryClient>) -> Self {
        GoTrigger { buffer, client }
    }

    /// On `true` sends the assembled trajectory (even if empty) and clears it.
    /// Returns whether a goal was sent.
    pub fn on_go(&mut self, go: bool) -> bool {
        if !go {
            debug!("Go message is false, nothing sent");
            return false;
        }
        let trajectory = self.buffer.take();
        info!("Sending trajectory goal with {} points", trajectory.points.len());
        self.client.send_goal(trajectory);
        true
    }
}
