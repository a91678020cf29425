//! Hardcoded DH parameters for the UR family

pub mod ur_kinematics {
    use crate::parameters::ur_kinematics::Parameters;

    #[allow(dead_code)]
    impl Parameters {
        // Provides default values
        pub fn new() -> Self {
            Parameters {
                d1: 0.0,
                a2: 0.0,
                a3: 0.0,
                d4: 0.0,
                d5: 0.0,
                d6: 0.0,
                offsets: [0.0; 6],
                sign_corrections: [1; 6],
            }
        }

        pub fn ur3() -> Self {
            Parameters {
                d1: 0.1519,
                a2: -0.24365,
                a3: -0.21325,
                d4: 0.11235,
                d5: 0.08535,
                d6: 0.0819,
                ..Self::new()
            }
        }

        pub fn ur5() -> Self {
            Parameters {
                d1: 0.089159,
                a2: -0.425,
                a3: -0.39225,
                d4: 0.10915,
                d5: 0.09465,
                d6: 0.0823,
                ..Self::new()
            }
        }

        pub fn ur10() -> Self {
            Parameters {
                d1: 0.1273,
                a2: -0.612,
                a3: -0.5723,
                d4: 0.163941,
                d5: 0.1157,
                d6: 0.0922,
                ..Self::new()
            }
        }

        // e-Series: same topology, slightly different lengths than the CB3 UR5.
        pub fn ur5e() -> Self {
            Parameters {
                d1: 0.1625,
                a2: -0.425,
                a3: -0.3922,
                d4: 0.1333,
                d5: 0.0997,
                d6: 0.0996,
                ..Self::new()
            }
        }

        /// Looks up the preset by its lowercase model name ("ur3", "ur5", "ur10", "ur5e").
        pub fn by_name(name: &str) -> Option<Self> {
            match name.trim().to_lowercase().as_str() {
                "ur3" => Some(Self::ur3()),
                "ur5" => Some(Self::ur5()),
                "ur10" => Some(Self::ur10()),
                "ur5e" => Some(Self::ur5e()),
                _ => None,
            }
        }
    }

    impl Default for Parameters {
        fn default() -> Self {
            Self::ur5()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parameters::ur_kinematics::Parameters;

    #[test]
    fn test_by_name() {
        assert_eq!(Parameters::by_name("UR10"), Some(Parameters::ur10()));
        assert_eq!(Parameters::by_name(" ur5e "), Some(Parameters::ur5e()));
        assert_eq!(Parameters::by_name("irb2400"), None);
    }
}
