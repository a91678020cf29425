//! Fixed-rate Cartesian servo loop.
//!
//! Every tick the controller reads the live end-effector pose, takes at most one new
//! target from the [`PoseQueue`], and if the remaining position error is above the
//! threshold solves the target, picks the candidate closest to the previous joints and
//! publishes it. Once the error falls below the threshold it publishes the joint feedback
//! instead, holding the arm where it is.
//!
//! ```text
//!            dequeue                    gate closed              no dequeue
//!   Idle ─────────────▶ Tracking ─────────────────▶ Converged ─────────────▶ Idle
//!    ▲                   │  ▲ gate open                 │ dequeue
//!    └── no dequeue ─────┘  └───────────────────────────┘
//! ```
//! Nothing here is fatal: lookup failures reuse the last known pose, unreachable targets
//! hold the previous command.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::adapter::KinematicsAdapter;
use crate::config::ControllerConfig;
use crate::control_error::ControlError;
use crate::kinematic_traits::{Joints, Pose, JOINTS_AT_ZERO};
use crate::motion_gate::MotionGate;
use crate::parameter_error::ParameterError;
use crate::pose_queue::PoseQueue;
use crate::pose_tracker::{PoseTracker, TransformLookup};
use crate::selector::select;
use crate::trajectory::TrajectoryBuffer;
use crate::utils::{format_joints, format_pose};

/// Joint positions to move to, stamped when produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointCommand {
    pub positions: Joints,
    pub stamp: Instant,
}

/// Receives the commands of the loop, one per tick at most.
pub trait JointCommandSink {
    fn publish(&mut self, command: JointCommand);
}

impl JointCommandSink for Sender<JointCommand> {
    fn publish(&mut self, command: JointCommand) {
        if self.send(command).is_err() {
            warn!("Joint command receiver is gone, command {} dropped",
                format_joints(&command.positions));
        }
    }
}

/// Records everything, used mostly in tests.
impl JointCommandSink for Vec<JointCommand> {
    fn publish(&mut self, command: JointCommand) {
        self.push(command);
    }
}

/// Latest joint positions reported by the arm. Clones share the same value.
#[derive(Clone, Default)]
pub struct JointFeedback {
    latest: Arc<Mutex<Option<Joints>>>,
}

impl JointFeedback {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Joints>> {
        self.latest.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn update(&self, joints: Joints) {
        *self.lock() = Some(joints);
    }

    pub fn latest(&self) -> Option<Joints> {
        *self.lock()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPhase {
    Idle,
    Tracking,
    Converged,
}

/// Where the arm is going and where it was when it started going there.
/// While not tracking, `goal` and `reference` are both the current pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionState {
    pub phase: MotionPhase,
    pub goal: Pose,
    pub reference: Pose,
}

impl MotionState {
    fn at_rest(pose: Pose) -> Self {
        MotionState { phase: MotionPhase::Idle, goal: pose, reference: pose }
    }

    pub fn is_moving(&self) -> bool {
        self.phase == MotionPhase::Tracking
    }
}

pub struct Controller {
    config: ControllerConfig,
    tracker: PoseTracker,
    queue: PoseQueue,
    adapter: KinematicsAdapter,
    gate: MotionGate,
    feedback: JointFeedback,
    /// Cleared on every new target, if attached.
    trajectory: Option<TrajectoryBuffer>,
    /// None until the first pose is known.
    motion: Option<MotionState>,
    /// Last published configuration, also the seed for candidate selection.
    previous: Option<Joints>,
    last_error: Option<ControlError>,
}

impl Controller {
    /// Fails if the configuration does not pass [`ControllerConfig::validate`].
    pub fn new(
        config: ControllerConfig,
        lookup: Arc<dyn TransformLookup>,
        queue: PoseQueue,
        adapter: KinematicsAdapter,
        feedback: JointFeedback,
    ) -> Result<Self, ParameterError> {
        config.validate()?;
        let tracker = PoseTracker::new(
            lookup,
            config.base_frame.clone(),
            config.ee_frame.clone(),
            config.lookup_wait,
        );
        debug!("Servoing {} in {} at {} Hz", tracker.ee_frame(), tracker.base_frame(), config.rate_hz);
        Ok(Controller {
            gate: MotionGate::new(config.min_increment),
            config,
            tracker,
            queue,
            adapter,
            feedback,
            trajectory: None,
            motion: None,
            previous: None,
            last_error: None,
        })
    }

    /// Attaches the trajectory assembled for the go trigger, so that new targets discard it.
    pub fn with_trajectory_buffer(mut self, buffer: TrajectoryBuffer) -> Self {
        self.trajectory = Some(buffer);
        self
    }

    /// One control step. Returns the command to publish, None if no joint configuration
    /// is known yet.
    pub fn tick(&mut self) -> Option<JointCommand> {
        self.last_error = None;
        let current = match self.tracker.current_pose() {
            Ok(pose) => Some(pose),
            Err(failure) => {
                warn!("{}, using the last known pose", failure);
                self.last_error = Some(failure.into());
                self.tracker.last_known()
            }
        };

        // Without any pose there is nothing to measure the error against, targets wait.
        let Some(current) = current else {
            return self.command(self.feedback.latest().or(self.previous));
        };

        let motion = self.motion.get_or_insert_with(|| {
            info!("Initial pose {}", format_pose(&current));
            MotionState::at_rest(current)
        });

        if let Some(target) = self.queue.try_dequeue() {
            info!("New target {}", format_pose(&target));
            motion.phase = MotionPhase::Tracking;
            motion.goal = target;
            motion.reference = current;
            if let Some(trajectory) = &self.trajectory {
                trajectory.clear();
            }
        }

        let goal = motion.goal;
        let positions = if motion.is_moving() && self.gate.should_advance(&current, &goal) {
            self.advance(&goal)
        } else {
            self.settle(current)
        };
        self.command(positions)
    }

    fn command(&self, positions: Option<Joints>) -> Option<JointCommand> {
        positions.map(|positions| JointCommand { positions, stamp: Instant::now() })
    }

    /// Solves the goal and picks the candidate nearest to what was commanded before.
    fn advance(&mut self, goal: &Pose) -> Option<Joints> {
        let seed = self
            .previous
            .or_else(|| self.feedback.latest())
            .unwrap_or(JOINTS_AT_ZERO);
        let candidates = self.adapter.solve(goal);
        trace!("{} candidates for {}", candidates.len(), format_pose(goal));

        match select(&candidates, &seed) {
            Some(joints) => {
                debug!("Commanding {}", format_joints(&joints));
                self.previous = Some(joints);
                Some(joints)
            }
            None => {
                let error = ControlError::UnreachablePose;
                warn!("{}, holding the previous command", error);
                self.last_error = Some(error);
                self.previous.or_else(|| self.feedback.latest())
            }
        }
    }

    /// Below the threshold: stop at the current pose and hold the reported joints.
    fn settle(&mut self, current: Pose) -> Option<Joints> {
        if let Some(motion) = self.motion.as_mut() {
            motion.phase = match motion.phase {
                MotionPhase::Tracking => {
                    info!("Target reached at {}", format_pose(&current));
                    MotionPhase::Converged
                }
                MotionPhase::Converged | MotionPhase::Idle => MotionPhase::Idle,
            };
            motion.goal = current;
            motion.reference = current;
        }
        if let Some(joints) = self.feedback.latest() {
            self.previous = Some(joints);
        }
        self.previous
    }

    /// Ticks at the configured rate until `stop` is set.
    pub fn run(&mut self, sink: &mut dyn JointCommandSink, stop: &AtomicBool) {
        let period = self.config.period();
        info!("Controller running at {} Hz, {} in {}",
            self.config.rate_hz, self.config.ee_frame, self.config.base_frame);
        let mut next = Instant::now();
        while !stop.load(Ordering::Relaxed) {
            if let Some(command) = self.tick() {
                sink.publish(command);
            }
            next += period;
            let now = Instant::now();
            if next > now {
                thread::sleep(next - now);
            } else {
                // No burst of catch-up ticks after an overrun.
                debug!("Tick overran by {:?}", now - next);
                next = now;
            }
        }
        info!("Controller stopped");
    }

    pub fn motion_state(&self) -> Option<&MotionState> {
        self.motion.as_ref()
    }

    pub fn phase(&self) -> MotionPhase {
        self.motion.map_or(MotionPhase::Idle, |motion| motion.phase)
    }

    pub fn previous(&self) -> Option<Joints> {
        self.previous
    }

    /// What went wrong during the last tick, if anything.
    pub fn last_error(&self) -> Option<&ControlError> {
        self.last_error.as_ref()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn queue(&self) -> &PoseQueue {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kinematic_traits::{Kinematics, Solutions, TransformMatrix};
    use crate::transform_buffer::TransformBuffer;
    use nalgebra::{Translation3, UnitQuaternion};
    use std::sync::mpsc;
    use std::time::Duration;

    /// Always offers the same two candidates.
    struct TwoWay;

    impl Kinematics for TwoWay {
        fn inverse(&self, _pose: &TransformMatrix) -> Solutions {
            [[1.0; 6], [0.1; 6]].into_iter().collect()
        }

        fn forward(&self, _joints: &Joints) -> TransformMatrix {
            TransformMatrix::identity()
        }
    }

    fn at(x: f64) -> Pose {
        Pose::from_parts(Translation3::new(x, 0.0, 0.0), UnitQuaternion::identity())
    }

    fn config() -> ControllerConfig {
        ControllerConfig {
            lookup_wait: Duration::from_millis(1),
            max_transform_age: Duration::from_secs(60),
            ..ControllerConfig::default()
        }
    }

    fn controller(buffer: Arc<TransformBuffer>, feedback: JointFeedback) -> Controller {
        Controller::new(config(), buffer, PoseQueue::new(),
                        KinematicsAdapter::new(Arc::new(TwoWay)), feedback)
            .expect("valid configuration")
    }

    #[test]
    fn test_invalid_rate_rejected() {
        for rate_hz in [0.0, -10.0, f64::NAN, f64::INFINITY, 1E-300] {
            let buffer = Arc::new(TransformBuffer::new(Duration::from_secs(60)));
            let result = Controller::new(ControllerConfig { rate_hz, ..config() }, buffer,
                                         PoseQueue::new(), KinematicsAdapter::new(Arc::new(TwoWay)),
                                         JointFeedback::new());
            assert!(matches!(result, Err(ParameterError::InvalidValue(_))), "rate {}", rate_hz);
        }
    }

    #[test]
    fn test_nothing_known_nothing_published() {
        let buffer = Arc::new(TransformBuffer::new(Duration::from_secs(60)));
        let mut controller = controller(buffer, JointFeedback::new());
        controller.queue().enqueue(at(1.0));
        assert_eq!(controller.tick(), None);
        assert!(controller.last_error().is_some());
        // Target is kept until a pose is known.
        assert_eq!(controller.queue().len(), 1);
        assert_eq!(controller.phase(), MotionPhase::Idle);
    }

    #[test]
    fn test_feedback_held_before_first_pose() {
        let buffer = Arc::new(TransformBuffer::new(Duration::from_secs(60)));
        let feedback = JointFeedback::new();
        feedback.update([0.2; 6]);
        let mut controller = controller(buffer, feedback);
        let command = controller.tick().expect("feedback is known");
        assert_eq!(command.positions, [0.2; 6]);
        assert!(controller.motion_state().is_none());
    }

    #[test]
    fn test_tracks_then_converges_then_idles() {
        let buffer = Arc::new(TransformBuffer::new(Duration::from_secs(60)));
        buffer.set_transform("base_link", "ee_link", at(0.0));
        let feedback = JointFeedback::new();
        feedback.update([0.0; 6]);
        let trajectory = TrajectoryBuffer::new();
        trajectory.push([0.5; 6], Duration::ZERO);
        let mut controller = controller(buffer.clone(), feedback.clone())
            .with_trajectory_buffer(trajectory.clone());

        controller.queue().enqueue(at(0.5));
        let command = controller.tick().expect("command");
        assert_eq!(command.positions, [0.1; 6]);
        assert_eq!(controller.phase(), MotionPhase::Tracking);
        assert!(trajectory.is_empty());

        buffer.set_transform("base_link", "ee_link", at(0.5));
        feedback.update([0.11; 6]);
        assert_eq!(controller.tick().map(|c| c.positions), Some([0.11; 6]));
        assert_eq!(controller.phase(), MotionPhase::Converged);
        let motion = controller.motion_state().unwrap();
        assert_eq!(motion.goal, at(0.5));
        assert_eq!(motion.goal, motion.reference);

        controller.tick();
        assert_eq!(controller.phase(), MotionPhase::Idle);
    }

    #[test]
    fn test_sender_sink() {
        let (mut sender, receiver) = mpsc::channel();
        let command = JointCommand { positions: [0.3; 6], stamp: Instant::now() };
        JointCommandSink::publish(&mut sender, command);
        assert_eq!(receiver.recv().unwrap(), command);
        drop(receiver);
        // Receiver gone, must not panic.
        JointCommandSink::publish(&mut sender, command);
    }

    #[test]
    fn test_run_stops() {
        let buffer = Arc::new(TransformBuffer::new(Duration::from_secs(60)));
        buffer.set_transform("base_link", "ee_link", at(0.0));
        let feedback = JointFeedback::new();
        feedback.update([0.0; 6]);
        let mut controller = controller(buffer, feedback);
        let stop = Arc::new(AtomicBool::new(false));
        let stopper = stop.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            stopper.store(true, Ordering::Relaxed);
        });
        let mut published: Vec<JointCommand> = Vec::new();
        controller.run(&mut published, &stop);
        handle.join().unwrap();
        // 100 Hz for about 100 ms
        assert!(published.len() >= 3, "only {} commands", published.len());
        assert!(published.windows(2).all(|w| w[0].stamp <= w[1].stamp));
    }
}
