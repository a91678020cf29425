//! Live end-effector pose, read through the frame-transform service once per tick.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::control_error::LookupFailure;
use crate::kinematic_traits::Pose;

/// Which sample of the transform is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTime {
    /// The newest sample, provided it is still recent.
    Latest,
    /// The first sample stamped at or after the given instant.
    At(Instant),
}

/// Answers "where is `frame` in `reference`". Must not block longer than `timeout`.
pub trait TransformLookup: Send + Sync {
    fn lookup_transform(
        &self,
        reference: &str,
        frame: &str,
        time: LookupTime,
        timeout: Duration,
    ) -> Result<Pose, LookupFailure>;
}

/// Reads the pose of the end-effector frame in the base frame and remembers the last
/// one that could be read.
pub struct PoseTracker {
    lookup: Arc<dyn TransformLookup>,
    base_frame: String,
    ee_frame: String,
    wait: Duration,
    last_good: Option<Pose>,
}

impl PoseTracker {
    pub fn new(
        lookup: Arc<dyn TransformLookup>,
        base_frame: impl Into<String>,
        ee_frame: impl Into<String>,
        wait: Duration,
    ) -> Self {
        PoseTracker {
            lookup,
            base_frame: base_frame.into(),
            ee_frame: ee_frame.into(),
            wait,
            last_good: None,
        }
    }

    /// Fresh pose of the end-effector. On failure the last good pose stays as it was,
    /// see [`PoseTracker::last_known`].
    pub fn current_pose(&mut self) -> Result<Pose, LookupFailure> {
        let pose = self.lookup.lookup_transform(
            &self.base_frame,
            &self.ee_frame,
            LookupTime::Latest,
            self.wait,
        )?;
        if self.last_good.is_none() {
            debug!("First pose of {} in {} received", self.ee_frame, self.base_frame);
        }
        self.last_good = Some(pose);
        Ok(pose)
    }

    /// The last pose successfully read, None before the first success.
    pub fn last_known(&self) -> Option<Pose> {
        self.last_good
    }

    pub fn base_frame(&self) -> &str {
        &self.base_frame
    }

    pub fn ee_frame(&self) -> &str {
        &self.ee_frame
    }
}
