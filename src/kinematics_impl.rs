//! Analytic inverse and forward kinematics of the UR family arms.

use crate::kinematic_traits::{Joints, Kinematics, Solutions, TransformMatrix};
use crate::parameters::ur_kinematics::Parameters;
use crate::utils::ur_kinematics::is_valid;
use crate::utils::{normalize_angle, rigid_inverse};
use nalgebra::{Matrix4, Vector4};
use std::f64::consts::PI;
use tracing::trace;

/// Twist angles of the six DH links, common to all UR models.
const ALPHA: [f64; 6] = [PI / 2.0, 0.0, 0.0, PI / 2.0, -PI / 2.0, 0.0];

/// Below this |sin(θ5)| the wrist axes 4 and 6 are collinear.
const SINGULARITY_THRESHOLD: f64 = 1E-9;

/// Acos / asin arguments outside [-1, 1] by no more than this are clamped rather than rejected.
const DOMAIN_TOLERANCE: f64 = 1E-10;

/// Every solution is checked with forward kinematics against the target.
const DISTANCE_TOLERANCE: f64 = 1E-6;
const ANGULAR_TOLERANCE: f64 = 1E-6;

#[derive(Debug, Clone, Copy)]
pub struct URKinematics {
    parameters: Parameters,
}

impl URKinematics {
    /// Creates a new `URKinematics` instance with the given parameters.
    pub fn new(parameters: Parameters) -> Self {
        URKinematics { parameters }
    }

    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    fn d(&self) -> [f64; 6] {
        let p = &self.parameters;
        [p.d1, 0.0, 0.0, p.d4, p.d5, p.d6]
    }

    fn a(&self) -> [f64; 6] {
        let p = &self.parameters;
        [0.0, p.a2, p.a3, 0.0, 0.0, 0.0]
    }

    /// Transform of the DH link `i` for the given solver angle.
    fn link(&self, i: usize, theta: f64) -> TransformMatrix {
        dh(theta, self.d()[i], self.a()[i], ALPHA[i])
    }

    /// Converts solver angles into normalized joint values and keeps them if they
    /// really reach the target.
    fn accept(&self, thetas: &[f64; 6], target: &TransformMatrix, solutions: &mut Solutions) {
        let joints: Joints = std::array::from_fn(|i| {
            normalize_angle(self.parameters.from_theta(i, thetas[i]))
        });
        if !is_valid(&joints) {
            return;
        }
        if !same_transform(&self.forward(&joints), target) {
            trace!("Discarding inexact solution {:?}", joints);
            return;
        }
        // At most one solution per branch, 8 branches.
        let _ = solutions.push(joints);
    }
}

/// Standard Denavit-Hartenberg link transform Rz(θ) Tz(d) Tx(a) Rx(α).
fn dh(theta: f64, d: f64, a: f64, alpha: f64) -> TransformMatrix {
    let (st, ct) = theta.sin_cos();
    let (sa, ca) = alpha.sin_cos();
    Matrix4::new(
        ct, -st * ca, st * sa, a * ct,
        st, ct * ca, -ct * sa, a * st,
        0.0, sa, ca, d,
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Clamps values marginally outside [-1, 1], None if well outside.
fn unit_domain(x: f64) -> Option<f64> {
    if x.abs() > 1.0 + DOMAIN_TOLERANCE || !x.is_finite() {
        None
    } else {
        Some(x.clamp(-1.0, 1.0))
    }
}

// Compare two transforms with the fixed tolerance.
fn same_transform(ta: &TransformMatrix, tb: &TransformMatrix) -> bool {
    let translation_distance = (ta.fixed_view::<3, 1>(0, 3) - tb.fixed_view::<3, 1>(0, 3)).norm();
    if translation_distance > DISTANCE_TOLERANCE {
        return false;
    }
    // Frobenius norm of the rotation difference is ~ the rotation angle for small errors
    let rotation_distance = (ta.fixed_view::<3, 3>(0, 0) - tb.fixed_view::<3, 3>(0, 0)).norm();
    rotation_distance <= ANGULAR_TOLERANCE * std::f64::consts::SQRT_2
}

impl Kinematics for URKinematics {
    fn inverse(&self, t: &TransformMatrix) -> Solutions {
        let mut solutions = Solutions::new();
        let p = &self.parameters;

        // Origin of frame 5 (wrist 2), flange pulled back along its approach axis.
        let p05 = t * Vector4::new(0.0, 0.0, -p.d6, 1.0);
        let radius = p05.x.hypot(p05.y);
        if radius < f64::EPSILON {
            // Wrist 2 on the base axis, shoulder angle undefined.
            return solutions;
        }
        let Some(sin_phi) = unit_domain(p.d4 / radius) else {
            return solutions;
        };
        let psi = p05.y.atan2(p05.x);
        let phi = sin_phi.asin();

        // Shoulder left / right
        for theta1 in [psi + phi, psi + PI - phi] {
            let (s1, c1) = theta1.sin_cos();

            let Some(c5) = unit_domain((t[(0, 3)] * s1 - t[(1, 3)] * c1 - p.d4) / p.d6) else {
                continue;
            };
            let acos5 = c5.acos();

            // Wrist up / down
            for theta5 in [acos5, -acos5] {
                let s5 = theta5.sin();
                let theta6 = if s5.abs() < SINGULARITY_THRESHOLD {
                    0.0
                } else {
                    ((-t[(0, 1)] * s1 + t[(1, 1)] * c1) / s5)
                        .atan2((t[(0, 0)] * s1 - t[(1, 0)] * c1) / s5)
                };

                let t01 = self.link(0, theta1);
                let t46 = self.link(4, theta5) * self.link(5, theta6);
                let t14 = rigid_inverse(&t01) * t * rigid_inverse(&t46);

                // Origin of frame 3 as seen from frame 1, the planar elbow problem.
                let p13 = t14 * Vector4::new(0.0, -p.d4, 0.0, 1.0);
                let reach2 = p13.x * p13.x + p13.y * p13.y;
                let Some(c3) = unit_domain(
                    (reach2 - p.a2 * p.a2 - p.a3 * p.a3) / (2.0 * p.a2 * p.a3),
                ) else {
                    continue;
                };
                let acos3 = c3.acos();

                // Elbow up / down
                for theta3 in [acos3, -acos3] {
                    let s3 = theta3.sin();
                    let theta2 =
                        p13.y.atan2(p13.x) - (p.a3 * s3).atan2(p.a2 + p.a3 * c3);
                    let theta234 = t14[(1, 0)].atan2(t14[(0, 0)]);
                    let theta4 = theta234 - theta2 - theta3;

                    self.accept(
                        &[theta1, theta2, theta3, theta4, theta5, theta6],
                        t,
                        &mut solutions,
                    );
                }
            }
        }
        solutions
    }

    fn forward(&self, joints: &Joints) -> TransformMatrix {
        (0..6).fold(Matrix4::identity(), |transform, i| {
            transform * self.link(i, self.parameters.to_theta(i, joints[i]))
        })
    }
}
