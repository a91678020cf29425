//! Cartesian servo controller for six-axis arms of the Universal Robots family.
//!
//! The controller takes a stream of target end-effector poses and turns it into a fixed-rate
//! stream of joint commands. Each tick it reads the live end-effector pose through a
//! frame-transform lookup, solves the current target with closed-form inverse kinematics
//! (up to 8 candidates), and commands the candidate closest in joint space to the previous
//! command, until the remaining position error drops below a threshold.
//!
//! # Features
//!
//! - Closed-form forward and inverse kinematics for UR3, UR5, UR10 and UR5e, all solutions
//!   normalized and cross-checked with forward kinematics.
//! - Solutions in a fixed-capacity `heapless::Vec`, no allocation per tick.
//! - Continuity of motion: the candidate nearest to the previous joints is taken, ties go
//!   to the first candidate.
//! - Transform lookups that fail or go stale do not stop the loop, the last known pose is used.
//! - In-process transform buffer, pose queue and joint feedback handles, usable from
//!   other threads.
//! - Simulated arm to run the whole loop without hardware.
//! - Configuration and robot parameters from YAML files (feature `allow_filesystem`).
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use rs_cartesian_servo::adapter::KinematicsAdapter;
//! use rs_cartesian_servo::config::ControllerConfig;
//! use rs_cartesian_servo::controller::{Controller, JointFeedback};
//! use rs_cartesian_servo::kinematics_impl::URKinematics;
//! use rs_cartesian_servo::parameters::ur_kinematics::Parameters;
//! use rs_cartesian_servo::pose_queue::PoseQueue;
//! use rs_cartesian_servo::simulation::SimulatedArm;
//! use rs_cartesian_servo::transform_buffer::TransformBuffer;
//!
//! let adapter = KinematicsAdapter::new(Arc::new(URKinematics::new(Parameters::ur5())));
//! let transforms = Arc::new(TransformBuffer::new(Duration::from_secs(1)));
//! let feedback = JointFeedback::new();
//! let mut arm = SimulatedArm::new(adapter.clone(), transforms.clone(), feedback.clone(),
//!     [0.3, -1.2, 1.4, -0.8, 1.1, 0.5]);
//! arm.broadcast();
//!
//! let queue = PoseQueue::new();
//! let mut target = arm.pose();
//! target.translation.vector.z += 0.05;
//! queue.enqueue(target);
//!
//! let mut controller = Controller::new(ControllerConfig::default(), transforms, queue,
//!     adapter, feedback).expect("default configuration is valid");
//! for _ in 0..5 {
//!     if let Some(command) = controller.tick() {
//!         arm.apply(&command);
//!     }
//! }
//! assert!((arm.pose().translation.vector - target.translation.vector).norm() < 1E-6);
//! ```

pub mod parameters;
pub mod parameters_robots;

#[cfg(feature = "allow_filesystem")]
pub mod parameters_from_file;
pub mod parameter_error;

#[path = "utils/utils.rs"]
pub mod utils;
pub mod kinematic_traits;
pub mod kinematics_impl;

pub mod adapter;
pub mod selector;
pub mod motion_gate;

pub mod control_error;
pub mod pose_queue;
pub mod pose_tracker;
pub mod transform_buffer;

pub mod config;
pub mod controller;
pub mod trajectory;
pub mod simulation;

#[cfg(test)]
#[cfg(feature = "allow_filesystem")]
mod tests;
