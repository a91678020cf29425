//! In-process frame-transform service.
//!
//! Broadcasters store stamped parent-to-child transforms; lookups answer either
//! direction of a stored edge and wait (bounded) for a fresh enough sample. Chains of
//! more than one edge are not resolved.

use std::collections::HashMap;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::control_error::LookupFailure;
use crate::kinematic_traits::Pose;
use crate::pose_tracker::{LookupTime, TransformLookup};

#[derive(Debug, Clone, Copy)]
struct Stamped {
    pose: Pose,
    stamp: Instant,
}

pub struct TransformBuffer {
    /// (parent, child) -> newest sample
    transforms: Mutex<HashMap<(String, String), Stamped>>,
    updated: Condvar,
    /// Samples older than this do not satisfy a [`LookupTime::Latest`] request.
    max_age: Duration,
}

enum Found {
    Pose(Pose),
    Stale(Duration),
    Missing,
}

impl TransformBuffer {
    pub fn new(max_age: Duration) -> Self {
        TransformBuffer {
            transforms: Mutex::new(HashMap::new()),
            updated: Condvar::new(),
            max_age,
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<(String, String), Stamped>> {
        self.transforms.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores the pose of `child` in `parent`, stamped now.
    pub fn set_transform(&self, parent: &str, child: &str, pose: Pose) {
        self.set_transform_stamped(parent, child, pose, Instant::now());
    }

    pub fn set_transform_stamped(&self, parent: &str, child: &str, pose: Pose, stamp: Instant) {
        self.lock().insert((parent.to_string(), child.to_string()), Stamped { pose, stamp });
        self.updated.notify_all();
    }

    /// Forgets everything, as if nothing was ever broadcast.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn find(
        &self,
        transforms: &HashMap<(String, String), Stamped>,
        reference: &str,
        frame: &str,
        time: LookupTime,
    ) -> Found {
        if reference == frame {
            return Found::Pose(Pose::identity());
        }
        let direct = transforms
            .get(&(reference.to_string(), frame.to_string()))
            .map(|s| (s.pose, s.stamp));
        let inverse = transforms
            .get(&(frame.to_string(), reference.to_string()))
            .map(|s| (s.pose.inverse(), s.stamp));

        let Some((pose, stamp)) = direct.or(inverse) else {
            return Found::Missing;
        };
        let fresh = match time {
            LookupTime::Latest => stamp.elapsed() <= self.max_age,
            LookupTime::At(instant) => stamp >= instant,
        };
        if fresh {
            Found::Pose(pose)
        } else {
            Found::Stale(stamp.elapsed())
        }
    }
}

impl TransformLookup for TransformBuffer {
    fn lookup_transform(
        &self,
        reference: &str,
        frame: &str,
        time: LookupTime,
        timeout: Duration,
    ) -> Result<Pose, LookupFailure> {
        let deadline = Instant::now() + timeout;
        let mut transforms = self.lock();
        loop {
            let found = self.find(&transforms, reference, frame, time);
            if let Found::Pose(pose) = found {
                return Ok(pose);
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(match found {
                    Found::Stale(age) => LookupFailure::Stale {
                        reference: reference.to_string(),
                        frame: frame.to_string(),
                        age,
                    },
                    _ => LookupFailure::Unavailable {
                        reference: reference.to_string(),
                        frame: frame.to_string(),
                    },
                });
            }
            transforms = match self.updated.wait_timeout(transforms, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Translation3, UnitQuaternion, Vector3};
    use std::sync::Arc;
    use std::thread;

    fn pose() -> Pose {
        Pose::from_parts(
            Translation3::new(0.4, 0.1, 0.3),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.5),
        )
    }

    #[test]
    fn test_direct_and_inverse() {
        let buffer = TransformBuffer::new(Duration::from_secs(1));
        buffer.set_transform("base_link", "ee_link", pose());
        let wait = Duration::from_millis(10);

        let direct = buffer.lookup_transform("base_link", "ee_link", LookupTime::Latest, wait);
        assert_eq!(direct, Ok(pose()));
        let inverse = buffer
            .lookup_transform("ee_link", "base_link", LookupTime::Latest, wait)
            .expect("inverse edge is known");
        assert!(((inverse * pose()).translation.vector).norm() < 1E-12);
        assert_eq!(buffer.lookup_transform("world", "world", LookupTime::Latest, wait),
                   Ok(Pose::identity()));
    }

    #[test]
    fn test_clear_forgets_transforms() {
        let buffer = TransformBuffer::new(Duration::from_secs(1));
        buffer.set_transform("base_link", "ee_link", pose());
        buffer.clear();
        let result = buffer.lookup_transform("base_link", "ee_link", LookupTime::Latest,
                                             Duration::from_millis(5));
        assert!(matches!(result, Err(LookupFailure::Unavailable { .. })));
    }

    #[test]
    fn test_missing_fails_after_wait() {
        let buffer = TransformBuffer::new(Duration::from_secs(1));
        let started = Instant::now();
        let result = buffer.lookup_transform("base_link", "ee_link", LookupTime::Latest,
                                             Duration::from_millis(30));
        assert!(started.elapsed() >= Duration::from_millis(30));
        assert!(matches!(result, Err(LookupFailure::Unavailable { .. })));
    }

    #[test]
    fn test_stale() {
        let buffer = TransformBuffer::new(Duration::from_millis(50));
        let old = Instant::now() - Duration::from_millis(500);
        buffer.set_transform_stamped("base_link", "ee_link", pose(), old);
        let result = buffer.lookup_transform("base_link", "ee_link", LookupTime::Latest,
                                             Duration::from_millis(5));
        match result {
            Err(LookupFailure::Stale { age, .. }) => assert!(age >= Duration::from_millis(500)),
            other => panic!("Expected stale, got {:?}", other),
        }
    }

    #[test]
    fn test_waits_for_broadcast() {
        let buffer = Arc::new(TransformBuffer::new(Duration::from_secs(1)));
        let broadcaster = buffer.clone();
        let requested = Instant::now();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            broadcaster.set_transform("base_link", "ee_link", pose());
        });
        let result = buffer.lookup_transform("base_link", "ee_link", LookupTime::At(requested),
                                             Duration::from_secs(2));
        handle.join().expect("broadcaster finished");
        assert_eq!(result, Ok(pose()));
    }
}
