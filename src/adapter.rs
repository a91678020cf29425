//! Bridges the frame convention of the published poses and the convention of the solver.
//!
//! Poses arrive as `ee_link` in `base_link`, as the arm's description publishes them. The
//! closed-form solver works with the DH base and the DH flange frames instead. Both
//! differences are pure rotations fixed by how the arm is described and how the flange is
//! mounted, so they are applied as constant matrices, one on each side:
//!
//! ```text
//! solver_target = BASE_CORRECTION * pose * TOOL_CORRECTION
//! ```
//!
//! The adapter takes any implementation of [`Kinematics`], so a different solver only
//! needs its own pair of corrections:
//! ```
//! use std::sync::Arc;
//! use rs_cartesian_servo::adapter::KinematicsAdapter;
//! use rs_cartesian_servo::kinematic_traits::Joints;
//! use rs_cartesian_servo::kinematics_impl::URKinematics;
//! use rs_cartesian_servo::parameters::ur_kinematics::Parameters;
//!
//! let adapter = KinematicsAdapter::new(Arc::new(URKinematics::new(Parameters::ur5())));
//! let joints: Joints = [0.3, -1.2, 1.4, -0.8, 1.1, 0.5];
//! let pose = adapter.forward(&joints);
//! let candidates = adapter.solve(&pose);
//! assert!(!candidates.is_empty());
//! ```

use std::sync::Arc;

use crate::kinematic_traits::{Joints, Kinematics, Pose, Solutions, TransformMatrix};
use crate::utils::{pose_from_matrix, rigid_inverse};

/// Rotation by π about Z: the published `base_link` frame faces opposite to the DH base
/// frame of the arm (X and Y flipped, Z shared). Pre-multiplied. Row-major.
pub const BASE_CORRECTION: [[f64; 4]; 4] = [
    [-1.0, 0.0, 0.0, 0.0],
    [0.0, -1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// The published `ee_link` points its X axis along the tool approach direction while the
/// DH flange uses Z for it. Columns are the flange axes in `ee_link` coordinates:
/// flange X = -Y, flange Y = -Z, flange Z = X. Post-multiplied. Row-major.
pub const TOOL_CORRECTION: [[f64; 4]; 4] = [
    [0.0, 0.0, 1.0, 0.0],
    [-1.0, 0.0, 0.0, 0.0],
    [0.0, -1.0, 0.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

fn matrix(rows: &[[f64; 4]; 4]) -> TransformMatrix {
    TransformMatrix::from_fn(|r, c| rows[r][c])
}

/// Solver wrapped with the two basis corrections.
#[derive(Clone)]
pub struct KinematicsAdapter {
    pub solver: Arc<dyn Kinematics>,

    /// Pre-multiplied correction (published base to solver base).
    base: TransformMatrix,

    /// Post-multiplied correction (published end-effector to solver flange).
    tool: TransformMatrix,
}

impl KinematicsAdapter {
    /// Adapter with the corrections of the standard arm description, see
    /// [`BASE_CORRECTION`] and [`TOOL_CORRECTION`].
    pub fn new(solver: Arc<dyn Kinematics>) -> Self {
        Self::with_corrections(solver, &BASE_CORRECTION, &TOOL_CORRECTION)
    }

    /// Adapter for a different mounting. Both corrections must be rigid transforms.
    pub fn with_corrections(
        solver: Arc<dyn Kinematics>,
        base: &[[f64; 4]; 4],
        tool: &[[f64; 4]; 4],
    ) -> Self {
        KinematicsAdapter {
            solver,
            base: matrix(base),
            tool: matrix(tool),
        }
    }

    /// Target pose in the convention the solver expects.
    pub fn to_solver_frame(&self, pose: &Pose) -> TransformMatrix {
        self.base * pose.to_homogeneous() * self.tool
    }

    /// All candidate joint configurations for the target, unranked, in solver order.
    /// Empty if the pose is unreachable.
    pub fn solve(&self, target: &Pose) -> Solutions {
        self.solver.inverse(&self.to_solver_frame(target))
    }

    /// End-effector pose in the published convention for the given joints.
    pub fn forward(&self, joints: &Joints) -> Pose {
        let flange = self.solver.forward(joints);
        pose_from_matrix(&(rigid_inverse(&self.base) * flange * rigid_inverse(&self.tool)))
    }
}
