//! Simulated arm that closes the control loop without hardware.
//!
//! The arm moves its joints a fraction (`gain`) of the way toward each command it gets,
//! reports them as joint feedback and broadcasts its forward-kinematic end-effector pose
//! into the [`TransformBuffer`]. With a non-zero `dropout` some broadcasts are skipped so
//! that lookups go stale, as they do with a lossy transform stream.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::adapter::KinematicsAdapter;
use crate::controller::{JointCommand, JointCommandSink, JointFeedback};
use crate::kinematic_traits::{Joints, Pose};
use crate::transform_buffer::TransformBuffer;

pub struct SimulatedArm {
    adapter: KinematicsAdapter,
    transforms: Arc<TransformBuffer>,
    feedback: JointFeedback,
    joints: Joints,
    /// Fraction of the commanded step done per command, in (0, 1].
    gain: f64,
    /// Probability to skip a broadcast.
    dropout: f64,
    rng: StdRng,
    base_frame: String,
    ee_frame: String,
}

impl SimulatedArm {
    pub fn new(
        adapter: KinematicsAdapter,
        transforms: Arc<TransformBuffer>,
        feedback: JointFeedback,
        start: Joints,
    ) -> Self {
        SimulatedArm {
            adapter,
            transforms,
            feedback,
            joints: start,
            gain: 1.0,
            dropout: 0.0,
            rng: StdRng::seed_from_u64(0),
            base_frame: "base_link".to_string(),
            ee_frame: "ee_link".to_string(),
        }
    }

    pub fn with_gain(mut self, gain: f64) -> Self {
        self.gain = gain.clamp(f64::EPSILON, 1.0);
        self
    }

    pub fn with_dropout(mut self, dropout: f64, seed: u64) -> Self {
        self.dropout = dropout.clamp(0.0, 1.0);
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_frames(mut self, base_frame: &str, ee_frame: &str) -> Self {
        self.base_frame = base_frame.to_string();
        self.ee_frame = ee_frame.to_string();
        self
    }

    pub fn joints(&self) -> Joints {
        self.joints
    }

    pub fn pose(&self) -> Pose {
        self.adapter.forward(&self.joints)
    }

    /// Moves toward the command, then reports and broadcasts.
    pub fn apply(&mut self, command: &JointCommand) {
        for (joint, target) in self.joints.iter_mut().zip(command.positions.iter()) {
            *joint += self.gain * (target - *joint);
        }
        self.broadcast();
    }

    /// Reports the joints and, unless dropped, broadcasts the end-effector pose.
    pub fn broadcast(&mut self) {
        self.feedback.update(self.joints);
        if self.dropout > 0.0 && self.rng.gen_bool(self.dropout) {
            trace!("Broadcast dropped");
            return;
        }
        self.transforms.set_transform(&self.base_frame, &self.ee_frame, self.pose());
    }
}

impl JointCommandSink for SimulatedArm {
    fn publish(&mut self, command: JointCommand) {
        self.apply(&command);
    }
}
