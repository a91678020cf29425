//! Picks one configuration out of the closed-form candidates.
//!
//! Consecutive ticks solve for poses that are close to each other, so the candidate
//! nearest to the previously commanded joints is the one that continues the motion
//! without jumping into another configuration family (elbow, wrist or shoulder flip).

use crate::kinematic_traits::{Joints, MAX_SOLUTIONS, Solutions};

/// Euclidean distance in joint space.
pub fn joint_distance(a: &Joints, b: &Joints) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(qa, qb)| (qa - qb) * (qa - qb))
        .sum::<f64>()
        .sqrt()
}

/// Returns the candidate nearest to `previous`. On equal distance the candidate that
/// comes first (in solver order) wins. None only if there are no candidates.
pub fn select(candidates: &Solutions, previous: &Joints) -> Option<Joints> {
    let mut best: Option<(f64, &Joints)> = None;
    for candidate in candidates {
        // NaN (from NaN joints) ranks as infinitely far.
        let distance = match joint_distance(candidate, previous) {
            d if d.is_nan() => f64::INFINITY,
            d => d,
        };
        match best {
            // Strict comparison keeps the earlier candidate on ties.
            Some((best_distance, _)) if distance >= best_distance => {}
            _ => best = Some((distance, candidate)),
        }
    }
    best.map(|(_, joints)| *joints)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn solutions(joints: &[Joints]) -> Solutions {
        joints.iter().copied().take(MAX_SOLUTIONS).collect()
    }

    #[test]
    fn test_joint_distance() {
        let a = [1.0, 2.0, 0.0, 0.0, 0.0, 0.0];
        let b = [4.0, 6.0, 0.0, 0.0, 0.0, 0.0];
        assert!((joint_distance(&a, &b) - 5.0).abs() < 1E-12);
        assert_eq!(joint_distance(&a, &a), 0.0);
    }

    #[test]
    fn test_nearest_wins() {
        let candidates = solutions(&[[1.0; 6], [0.1; 6], [-0.5; 6]]);
        assert_eq!(select(&candidates, &[0.0; 6]), Some([0.1; 6]));
        assert_eq!(select(&candidates, &[-1.0; 6]), Some([-0.5; 6]));
    }

    #[test]
    fn test_tie_goes_to_first() {
        let first = [0.5, 0.0, 0.0, 0.0, 0.0, 0.0];
        let second = [-0.5, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(select(&solutions(&[first, second]), &[0.0; 6]), Some(first));
        assert_eq!(select(&solutions(&[second, first]), &[0.0; 6]), Some(second));
    }

    #[test]
    fn test_nan_previous_keeps_first() {
        let candidates = solutions(&[[1.0; 6], [0.1; 6], [-0.5; 6]]);
        let previous = [f64::NAN, 0.0, 0.0, 0.0, 0.0, 0.0];
        assert_eq!(select(&candidates, &previous), Some([1.0; 6]));
    }

    #[test]
    fn test_nan_candidate_loses() {
        let broken = [f64::NAN; 6];
        let candidates = solutions(&[broken, [2.0; 6]]);
        assert_eq!(select(&candidates, &[0.0; 6]), Some([2.0; 6]));
    }

    #[test]
    fn test_empty() {
        assert_eq!(select(&Solutions::new(), &[0.0; 6]), None);
    }

    #[test]
    fn test_member_and_deterministic() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let count = rng.gen_range(1..=8);
            let candidates: Solutions = (0..count)
                .map(|_| std::array::from_fn(|_| rng.gen_range(-3.0..3.0)))
                .collect();
            let previous: Joints = std::array::from_fn(|_| rng.gen_range(-3.0..3.0));

            let chosen = select(&candidates, &previous).expect("candidates are not empty");
            assert!(candidates.contains(&chosen));
            assert_eq!(select(&candidates, &previous), Some(chosen));

            let best = joint_distance(&chosen, &previous);
            assert!(candidates.iter().all(|c| joint_distance(c, &previous) >= best));
        }
    }
}
