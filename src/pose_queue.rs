//! FIFO of target poses, shared between the producer that receives them and the
//! controller that consumes them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::kinematic_traits::Pose;

/// Thread safe FIFO of poses. Clones share the same queue, so one clone goes to the
/// producer and one to the controller. The queue is not bounded.
#[derive(Clone, Default)]
pub struct PoseQueue {
    poses: Arc<Mutex<VecDeque<Pose>>>,
}

impl PoseQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Pose>> {
        // A producer that panicked mid-push cannot leave the deque half written.
        self.poses.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Appends the pose to the tail.
    pub fn enqueue(&self, pose: Pose) {
        self.lock().push_back(pose);
    }

    /// Removes and returns the head, None if there is nothing pending.
    pub fn try_dequeue(&self) -> Option<Pose> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Translation3;
    use std::thread;

    fn at(x: f64) -> Pose {
        Pose::from_parts(Translation3::new(x, 0.0, 0.0), nalgebra::UnitQuaternion::identity())
    }

    #[test]
    fn test_fifo() {
        let queue = PoseQueue::new();
        assert!(queue.try_dequeue().is_none());
        queue.enqueue(at(1.0));
        queue.enqueue(at(2.0));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.try_dequeue(), Some(at(1.0)));
        assert_eq!(queue.try_dequeue(), Some(at(2.0)));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_producer_thread() {
        let queue = PoseQueue::new();
        let producer = queue.clone();
        let handle = thread::spawn(move || {
            for i in 0..1000 {
                producer.enqueue(at(i as f64));
            }
        });

        let mut received = Vec::new();
        while received.len() < 1000 {
            match queue.try_dequeue() {
                Some(pose) => received.push(pose.translation.x),
                None => thread::yield_now(),
            }
        }
        handle.join().expect("producer finished");
        assert!(received.iter().enumerate().all(|(i, x)| *x == i as f64));
    }
}
