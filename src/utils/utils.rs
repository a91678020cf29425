//! Helper functions

use crate::kinematic_traits::{Joints, Pose, Solutions, TransformMatrix};
use nalgebra::{Matrix4, Quaternion, Rotation3, Translation3, UnitQuaternion};
use std::f64::consts::PI;

/// Checks the solution for validity. This is only internally needed as all returned
/// solutions are already checked.
pub(crate) mod ur_kinematics {
    use crate::kinematic_traits::Joints;

    /// Checks if all elements in the array are finite
    pub fn is_valid(qs: &Joints) -> bool {
        qs.iter().all(|&q| q.is_finite())
    }
}

/// Builds the pose from position and the [x, y, z, w] quaternion as they arrive in messages.
/// The quaternion is taken as is (not normalized), unit length is the sender's business.
pub fn pose_from_parts(position: [f64; 3], quaternion: [f64; 4]) -> Pose {
    let rotation = UnitQuaternion::new_unchecked(Quaternion::new(
        quaternion[3], // w
        quaternion[0], // x
        quaternion[1], // y
        quaternion[2], // z
    ));
    Pose::from_parts(Translation3::new(position[0], position[1], position[2]), rotation)
}

/// Inverse of a rigid (rotation + translation) homogeneous transform.
pub fn rigid_inverse(m: &TransformMatrix) -> TransformMatrix {
    let rotation_t = m.fixed_view::<3, 3>(0, 0).transpose();
    let translation = -(rotation_t * m.fixed_view::<3, 1>(0, 3));
    let mut inverse = Matrix4::identity();
    inverse.fixed_view_mut::<3, 3>(0, 0).copy_from(&rotation_t);
    inverse.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
    inverse
}

/// Pose from the homogeneous transform. The rotation block is assumed orthonormal.
pub fn pose_from_matrix(m: &TransformMatrix) -> Pose {
    let rotation = Rotation3::from_matrix_unchecked(m.fixed_view::<3, 3>(0, 0).into_owned());
    Pose::from_parts(
        Translation3::new(m[(0, 3)], m[(1, 3)], m[(2, 3)]),
        UnitQuaternion::from_rotation_matrix(&rotation),
    )
}

/// Wraps the angle into (-π, π]
pub fn normalize_angle(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(2.0 * PI);
    if wrapped > PI {
        wrapped - 2.0 * PI
    } else {
        wrapped
    }
}

/// Distance between the positions of two poses (orientation is ignored).
pub fn translation_distance(a: &Pose, b: &Pose) -> f64 {
    (a.translation.vector - b.translation.vector).norm()
}

/// Joint values in degrees, as one line for logging.
pub fn format_joints(joints: &Joints) -> String {
    let row: Vec<String> = joints
        .iter()
        .map(|q| format!("{:5.2}", q.to_degrees()))
        .collect();
    format!("[{}]", row.join(" "))
}

/// Pose as one line for logging.
pub fn format_pose(pose: &Pose) -> String {
    let translation = pose.translation.vector;
    let rotation = pose.rotation;
    format!(
        "x: {:.5}, y: {:.5}, z: {:.5},  quat: {:.5},{:.5},{:.5},{:.5}",
        translation.x, translation.y, translation.z, rotation.i, rotation.j, rotation.k, rotation.w
    )
}

/// Print joint values for all solutions, converting radianst to degrees.
pub fn dump_solutions(solutions: &Solutions) {
    if solutions.is_empty() {
        println!("No solutions");
    }
    for solution in solutions {
        println!("{}", format_joints(solution));
    }
}

/// Print joint values, converting radianst to degrees.
pub fn dump_joints(joints: &Joints) {
    println!("{}", format_joints(joints));
}

/// Allows to specify joint values in degrees (converts to radians)
#[allow(dead_code)]
pub fn as_radians(degrees: [i32; 6]) -> Joints {
    std::array::from_fn(|i| (degrees[i] as f64).to_radians())
}

/// formatting for YAML output
pub(crate) fn deg(x: &f64) -> String {
    if *x == 0.0 {
        return "0".to_string();
    }
    format!("deg({:.4})", x.to_degrees())
}

pub fn assert_pose_eq(ta: &Pose, tb: &Pose, distance_tolerance: f64, angular_tolerance: f64) -> bool {
    let distance = translation_distance(ta, tb);
    let angular_distance = ta.rotation.angle_to(&tb.rotation);

    if distance.abs() > distance_tolerance {
        panic!("Poses have too different translations:\n{}\n{}", format_pose(ta), format_pose(tb));
    }

    if angular_distance.abs() > angular_tolerance {
        panic!("Poses have too different angles:\n{}\n{}", format_pose(ta), format_pose(tb));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::ur_kinematics::*;
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_is_valid_with_all_finite() {
        let qs = [0.0, 1.0, -1.0, 0.5, -0.5, PI];
        assert!(is_valid(&qs));
    }

    #[test]
    fn test_is_valid_with_nan() {
        let qs = [0.0, f64::NAN, 1.0, -1.0, 0.5, -0.5];
        assert!(!is_valid(&qs));
    }

    #[test]
    fn test_is_valid_with_infinity() {
        let qs = [0.0, f64::INFINITY, 1.0, -1.0, 0.5, -0.5];
        assert!(!is_valid(&qs));
    }

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(3.0 * PI) - PI).abs() < 1E-12);
        assert!((normalize_angle(-PI) - PI).abs() < 1E-12);
        assert!((normalize_angle(-0.5) + 0.5).abs() < 1E-12);
        assert!((normalize_angle(2.0 * PI + 0.25) - 0.25).abs() < 1E-12);
    }

    #[test]
    fn test_rigid_inverse() {
        let pose = Pose::from_parts(
            Translation3::new(0.3, -0.2, 0.5),
            UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.7),
        );
        let m = pose.to_homogeneous();
        let product = m * rigid_inverse(&m);
        assert!((product - Matrix4::identity()).norm() < 1E-12);
        assert_pose_eq(&pose_from_matrix(&rigid_inverse(&m)), &pose.inverse(), 1E-12, 1E-6);
    }

    #[test]
    fn test_pose_from_parts_xyzw() {
        let half = std::f64::consts::FRAC_1_SQRT_2;
        let pose = pose_from_parts([1.0, 2.0, 3.0], [0.0, 0.0, half, half]);
        assert_eq!(pose.translation.vector, Vector3::new(1.0, 2.0, 3.0));
        assert!((pose.rotation.angle() - PI / 2.0).abs() < 1E-12);
        let axis = pose.rotation.axis().expect("rotation has an axis");
        assert!((axis.z - 1.0).abs() < 1E-12);
    }
}
