//! Per-tick consumer that moves frames from the channel into the skeleton

use handlink_core::SkeletonModel;
use std::time::{Duration, Instant};
use tracing::trace;

use crate::channel::FrameChannel;

/// Sole consumer of a [`FrameChannel`], owning the skeleton it updates
///
/// Call [`tick`](Self::tick) once per rendered frame. When no new frame is
/// waiting the skeleton keeps its last pose.
pub struct UpdateDriver {
    channel: FrameChannel,
    model: SkeletonModel,
    last_frame_at: Option<Instant>,
}

impl UpdateDriver {
    pub fn new(channel: FrameChannel, model: SkeletonModel) -> Self {
        Self {
            channel,
            model,
            last_frame_at: None,
        }
    }

    /// Apply the pending frame, if any
    ///
    /// Returns `true` when the skeleton was updated.
    pub fn tick(&mut self) -> bool {
        match self.channel.take() {
            Some(frame) => {
                self.model.apply_frame(&frame);
                self.last_frame_at = Some(Instant::now());
                trace!(frames = self.model.frames_applied(), "Applied landmark frame");
                true
            }
            None => false,
        }
    }

    pub fn model(&self) -> &SkeletonModel {
        &self.model
    }

    /// When the last frame was applied
    pub fn last_frame_at(&self) -> Option<Instant> {
        self.last_frame_at
    }

    /// Time since the last applied frame, `None` before the first one
    pub fn since_last_frame(&self, now: Instant) -> Option<Duration> {
        self.last_frame_at
            .map(|at| now.saturating_duration_since(at))
    }

    /// Release the skeleton, e.g. for teardown
    pub fn into_model(self) -> SkeletonModel {
        self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use handlink_core::{LandmarkFrame, ScalingFactor, LANDMARK_COUNT};

    fn frame(x: f32) -> LandmarkFrame {
        LandmarkFrame::from_points(&[Vec3::new(x, 0.5, 0.0); LANDMARK_COUNT])
    }

    fn driver() -> (FrameChannel, UpdateDriver) {
        let channel = FrameChannel::new();
        let driver = UpdateDriver::new(channel.clone(), SkeletonModel::new(ScalingFactor::default()));
        (channel, driver)
    }

    #[test]
    fn test_tick_applies_pending_frame() {
        let (channel, mut driver) = driver();
        channel.publish(frame(0.75));

        assert!(driver.tick());
        assert_eq!(driver.model().joint_position(0), Some(Vec3::new(0.25, 0.0, 0.0)));
        assert!(driver.last_frame_at().is_some());
        assert!(!channel.has_pending());
    }

    #[test]
    fn test_empty_tick_keeps_pose() {
        let (channel, mut driver) = driver();
        channel.publish(frame(1.0));
        driver.tick();
        let joints = *driver.model().joints();

        assert!(!driver.tick());
        assert!(!driver.tick());
        assert_eq!(*driver.model().joints(), joints);
        assert_eq!(driver.model().frames_applied(), 1);
    }

    #[test]
    fn test_empty_tick_before_first_frame() {
        let (_channel, mut driver) = driver();
        assert!(!driver.tick());
        assert_eq!(driver.model().frames_applied(), 0);
        assert!(driver.since_last_frame(Instant::now()).is_none());
    }

    #[test]
    fn test_tick_sees_only_latest() {
        let (channel, mut driver) = driver();
        channel.publish(frame(0.0));
        channel.publish(frame(1.0));

        assert!(driver.tick());
        assert_eq!(driver.model().joint_position(5), Some(Vec3::new(0.5, 0.0, 0.0)));
        assert_eq!(driver.model().frames_applied(), 1);
        assert!(!driver.tick());
    }

    #[test]
    fn test_closed_channel_stops_updates() {
        let (channel, mut driver) = driver();
        channel.publish(frame(0.25));
        channel.close();

        assert!(!driver.tick());
        assert_eq!(driver.model().frames_applied(), 0);
        assert_eq!(driver.into_model().joint_position(0), Some(Vec3::ZERO));
    }
}
