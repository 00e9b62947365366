//! Daemon runtime: receiver, tick loop and shutdown

use anyhow::Result;
use glam::Vec3;
use handlink_core::SkeletonModel;
use handlink_net::{FrameChannel, LandmarkReceiver, UpdateDriver};
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::Config;
use crate::pet::{Affection, ContactTarget, ContactTracker};

/// Whether frames are currently arriving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tracking {
    /// No frame yet since startup
    Waiting,
    Active,
    Lost,
}

/// Consumer-side state advanced once per tick
pub struct Runtime {
    driver: UpdateDriver,
    pet: Option<(ContactTracker, Affection)>,
    stale_after: Duration,
    tracking: Tracking,
}

impl Runtime {
    pub fn new(config: &Config, channel: FrameChannel) -> Self {
        let model = SkeletonModel::new(config.skeleton.scaling_factor);
        let pet = config.pet.enabled.then(|| {
            let target = ContactTarget {
                center: Vec3::from_array(config.pet.center),
                radius: config.pet.radius,
            };
            (ContactTracker::new(target), Affection::new(&config.pet))
        });

        Self {
            driver: UpdateDriver::new(channel, model),
            pet,
            stale_after: Duration::try_from_secs_f64(config.daemon.stale_after_secs)
                .unwrap_or(Duration::MAX),
            tracking: Tracking::Waiting,
        }
    }

    /// Run one consumer tick covering `dt` of wall time
    pub fn tick(&mut self, now: Instant, dt: Duration) {
        let updated = self.driver.tick();
        self.update_tracking(updated, now);

        if let Some((tracker, affection)) = &mut self.pet {
            // A lost hand must not keep the pet petted
            if self.tracking == Tracking::Active {
                tracker.update(self.driver.model(), affection);
            } else {
                tracker.release_all(affection);
            }
            affection.advance(dt.as_secs_f32());
        }
    }

    fn update_tracking(&mut self, updated: bool, now: Instant) {
        if updated {
            if self.tracking != Tracking::Active {
                info!("Hand tracking acquired");
                self.tracking = Tracking::Active;
            }
            return;
        }

        if self.tracking == Tracking::Active {
            let stale = self
                .driver
                .since_last_frame(now)
                .is_some_and(|elapsed| elapsed >= self.stale_after);
            if stale {
                warn!(
                    after_secs = self.stale_after.as_secs_f64(),
                    "Hand tracking lost"
                );
                self.tracking = Tracking::Lost;
            }
        }
    }

    pub fn model(&self) -> &SkeletonModel {
        self.driver.model()
    }

    pub fn affection(&self) -> Option<f32> {
        self.pet.as_ref().map(|(_, affection)| affection.value())
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking == Tracking::Active
    }
}

/// Run the daemon until `shutdown` resolves
pub async fn run(config: Config, shutdown: impl Future<Output = ()>) -> Result<()> {
    config.validate()?;
    let channel = FrameChannel::new();
    let receiver = LandmarkReceiver::bind(&config.to_receiver_config(), channel.clone()).await?;
    let mut runtime = Runtime::new(&config, channel.clone());

    let tick_period = Duration::from_secs_f64(1.0 / config.daemon.tick_hz);
    let mut ticks = interval(tick_period);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let status_period = Duration::from_secs(config.daemon.status_interval_secs);
    let mut last_status = Instant::now();
    let mut last_tick = Instant::now();

    info!(
        tick_hz = config.daemon.tick_hz,
        scale = config.skeleton.scaling_factor.get(),
        "Skeleton driver running"
    );

    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
            _ = ticks.tick() => {
                let now = Instant::now();
                runtime.tick(now, now - last_tick);
                last_tick = now;

                if !status_period.is_zero() && now - last_status >= status_period {
                    last_status = now;
                    let stats = receiver.stats();
                    let channel_stats = channel.stats();
                    info!(
                        datagrams = stats.datagrams,
                        frames = stats.frames,
                        rejected = stats.rejected,
                        overwritten = channel_stats.overwritten,
                        applied = runtime.model().frames_applied(),
                        tracking = runtime.is_tracking(),
                        love = runtime.affection().map(f32::round),
                        "Status"
                    );
                }

                if receiver.is_finished() {
                    warn!("Landmark receiver exited unexpectedly");
                    break;
                }
            }
        }
    }

    receiver.shutdown().await?;
    info!(
        frames = runtime.model().frames_applied(),
        "Skeleton driver stopped"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use handlink_core::{LandmarkFrame, LANDMARK_COUNT};

    fn touching_frame() -> LandmarkFrame {
        // Everything on the scene origin, inside the default pet target
        LandmarkFrame::from_points(&[Vec3::new(0.5, 0.5, 0.0); LANDMARK_COUNT])
    }

    #[test]
    fn test_tick_drives_pet() {
        let channel = FrameChannel::new();
        let mut runtime = Runtime::new(&Config::default(), channel.clone());
        let start = Instant::now();

        channel.publish(touching_frame());
        runtime.tick(start, Duration::from_secs(1));
        assert!(runtime.is_tracking());
        assert_eq!(runtime.affection(), Some(1.0));

        runtime.tick(start + Duration::from_secs(1), Duration::from_secs(1));
        assert_eq!(runtime.affection(), Some(2.0));
    }

    #[test]
    fn test_stale_tracking_releases_pet() {
        let channel = FrameChannel::new();
        let mut runtime = Runtime::new(&Config::default(), channel.clone());

        channel.publish(touching_frame());
        runtime.tick(Instant::now(), Duration::from_secs(4));
        assert_eq!(runtime.affection(), Some(4.0));

        // Default staleness is two seconds
        let later = Instant::now() + Duration::from_secs(3);
        runtime.tick(later, Duration::from_secs(2));
        assert!(!runtime.is_tracking());
        assert_eq!(runtime.affection(), Some(3.0));
        assert_eq!(runtime.model().frames_applied(), 1);
    }

    #[test]
    fn test_pet_disabled() {
        let mut config = Config::default();
        config.pet.enabled = false;
        let runtime = Runtime::new(&config, FrameChannel::new());
        assert_eq!(runtime.affection(), None);
    }

    #[test]
    fn test_unrepresentable_staleness_never_expires() {
        let mut config = Config::default();
        config.daemon.stale_after_secs = 1e30;
        let channel = FrameChannel::new();
        let mut runtime = Runtime::new(&config, channel.clone());

        channel.publish(touching_frame());
        runtime.tick(Instant::now(), Duration::from_secs(1));
        runtime.tick(
            Instant::now() + Duration::from_secs(3600),
            Duration::from_secs(1),
        );
        assert!(runtime.is_tracking());
    }

    #[tokio::test]
    async fn test_run_rejects_bad_timing() {
        let mut config = Config::default();
        config.receiver.bind = std::net::Ipv4Addr::LOCALHOST.into();
        config.receiver.port = 0;
        config.daemon.tick_hz = 1e12;
        assert!(run(config, std::future::pending()).await.is_err());

        let mut config = Config::default();
        config.receiver.bind = std::net::Ipv4Addr::LOCALHOST.into();
        config.receiver.port = 0;
        config.daemon.stale_after_secs = 1e30;
        assert!(run(config, std::future::pending()).await.is_err());
    }

    #[tokio::test]
    async fn test_run_at_max_tick_rate() {
        let mut config = Config::default();
        config.receiver.bind = std::net::Ipv4Addr::LOCALHOST.into();
        config.receiver.port = 0;
        config.daemon.tick_hz = crate::config::MAX_TICK_HZ;

        run(config, tokio::time::sleep(Duration::from_millis(20)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let mut config = Config::default();
        config.receiver.bind = std::net::Ipv4Addr::LOCALHOST.into();
        config.receiver.port = 0;

        run(config, tokio::time::sleep(Duration::from_millis(50)))
            .await
            .unwrap();
    }
}
