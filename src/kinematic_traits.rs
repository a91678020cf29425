//! Core types shared by the solver, the adapter and the controller.

extern crate nalgebra as na;

use na::{Isometry3, Matrix4};

/// Pose is used a pose of the robot end-effector. It contains both Cartesian position and
/// rotation quaternion
/// ```
/// extern crate nalgebra as na;
/// use na::{Isometry3, Translation3, UnitQuaternion, Vector3};
///
/// type Pose = Isometry3<f64>;
///
/// let translation = Translation3::new(0.4, 0.1, 0.3);
/// // The quaternion should be normalized to represent a valid rotation.
/// let rotation = UnitQuaternion::from_quaternion(na::Quaternion::new(1.0, 0.0, 0.0, 1.0).normalize());
/// let transform = Pose::from_parts(translation, rotation);
/// ```
pub type Pose = Isometry3<f64>;

/// Six joint angles in radians, index 0 is the base joint.
pub type Joints = [f64; 6];

/// Homogeneous 4x4 transform, the interchange format with the closed-form solver.
pub type TransformMatrix = Matrix4<f64>;

/// For providing the seed when nothing better is known.
pub const JOINTS_AT_ZERO: Joints = [0.0; 6];

/// Maximal number of closed-form solutions for a 6 axis arm (shoulder, elbow and wrist
/// each contribute a binary choice).
pub const MAX_SOLUTIONS: usize = 8;

/// Up to 8 joint configurations returned by one inverse kinematics call. The storage
/// is inline; the collection is returned by value and never allocates.
pub type Solutions = heapless::Vec<Joints, MAX_SOLUTIONS>;

/// Closed-form kinematics of the arm, expressed in the solver's own (DH) frame convention.
pub trait Kinematics: Send + Sync {
    /// All joint configurations that put the flange at the given transform. Empty if the
    /// transform is not reachable.
    fn inverse(&self, target: &TransformMatrix) -> Solutions;

    /// Flange transform for the given joint configuration.
    fn forward(&self, qs: &Joints) -> TransformMatrix;
}
