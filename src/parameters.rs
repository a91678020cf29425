//! Defines the UR (Denavit-Hartenberg) parameter data structure

pub mod ur_kinematics {
    use crate::utils::deg;

    /// Parameters for the robot. See [parameters_robots.rs](parameters_robots.rs) for examples of
    /// concrete robot models.
    ///
    /// The arm follows the usual UR layout: shoulder, elbow and wrist 1 axes are parallel,
    /// wrist 2 and wrist 3 are offset (not a spherical wrist). Twist angles are fixed at
    /// `[π/2, 0, 0, π/2, -π/2, 0]`, only lengths vary between models.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Parameters {
        /// Height of the shoulder axis above the base mounting plane.
        pub d1: f64,

        /// Upper arm length (shoulder to elbow). Negative for the UR convention.
        pub a2: f64,

        /// Forearm length (elbow to wrist 1). Negative for the UR convention.
        pub a3: f64,

        /// Lateral offset between the shoulder plane and wrist 1.
        pub d4: f64,

        /// Offset between wrist 1 and wrist 2 axes.
        pub d5: f64,

        /// Distance from wrist 2 axis to the tool flange.
        pub d6: f64,

        /// Offsets applied to each joint angle to adjust the reference zero position.
        pub offsets: [f64; 6],

        /// Specifies the direction of positive rotation from the zero angle for each joint.
        /// A value of `-1` reverses the default rotation direction for that joint.
        pub sign_corrections: [i8; 6],
    }

    impl Parameters {
        /// Convert to string yaml representation (quick viewing, etc).
        pub fn to_yaml(&self) -> String {
            format!(
                "ur_kinematics_dh_parameters:\n  \
              d1: {}\n  \
              a2: {}\n  \
              a3: {}\n  \
              d4: {}\n  \
              d5: {}\n  \
              d6: {}\n\
            ur_kinematics_joint_offsets: [{}]\n\
            ur_kinematics_joint_sign_corrections: [{}]\n",
                self.d1,
                self.a2,
                self.a3,
                self.d4,
                self.d5,
                self.d6,
                self.offsets.iter().map(deg)
                    .collect::<Vec<_>>().join(","),
                self.sign_corrections.iter().map(|x| x.to_string())
                    .collect::<Vec<_>>().join(",")
            )
        }

        /// Solver angle (DH theta) from the joint value reported by the robot.
        pub(crate) fn to_theta(&self, joint: usize, value: f64) -> f64 {
            value * self.sign_corrections[joint] as f64 - self.offsets[joint]
        }

        /// Joint value as the robot reports it from the solver angle (DH theta).
        pub(crate) fn from_theta(&self, joint: usize, theta: f64) -> f64 {
            (theta + self.offsets[joint]) * self.sign_corrections[joint] as f64
        }
    }
}
