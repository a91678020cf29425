#[cfg(test)]
mod tests {
    use crate::kinematic_traits::{Joints, Kinematics, Solutions};
    use crate::kinematics_impl::URKinematics;
    use crate::tests::test_utils::load_yaml;
    use crate::utils::{assert_pose_eq, dump_solutions, normalize_angle, pose_from_matrix};

    const CASES: &str = "src/tests/data/cases.yaml";

    fn found_joints_approx_equal(solutions: &Solutions, expected: &Joints, tolerance: f64) -> Option<usize> {
        solutions.iter().position(|solution| {
            solution.iter().zip(expected.iter())
                .all(|(s, e)| normalize_angle(s - e).abs() < tolerance)
        })
    }

    #[test]
    fn test_load_yaml() {
        let cases = load_yaml(CASES).expect("Failed to load cases");
        assert_eq!(cases.len(), 6);
        assert_eq!(cases[0].robot, "ur5");
        assert_eq!(cases[2].joints, [30.0, -60.0, -75.0, 15.0, 100.0, -10.0]);
    }

    #[test]
    fn test_inverse_finds_original_joints() {
        let cases = load_yaml(CASES).expect("Failed to load cases");
        for case in cases {
            let robot = URKinematics::new(case.parameters().expect("known robot"));
            let joints = case.joints_in_radians();
            let target = robot.forward(&joints);
            let solutions = robot.inverse(&target);

            if found_joints_approx_equal(&solutions, &joints, 1E-6).is_none() {
                println!("Case {} ({}): original joints not among the solutions", case.id, case.robot);
                dump_solutions(&solutions);
                panic!("Inverse kinematics failed for case {}", case.id);
            }
            for solution in &solutions {
                assert_pose_eq(&pose_from_matrix(&robot.forward(solution)),
                               &pose_from_matrix(&target), 1E-6, 1E-6);
            }
        }
    }
}
