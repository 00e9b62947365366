//! Touch interaction with a virtual pet
//!
//! [`ContactTracker`] turns fingertip positions into enter/exit events
//! against a spherical target. [`Affection`] listens to those events and
//! keeps the pet's love value, which grows while any fingertip touches the
//! pet and decays otherwise.

use glam::Vec3;
use handlink_core::{ProximityListener, SkeletonModel, FINGERTIPS};
use tracing::{debug, info};

use crate::config::PetConfig;

/// Spherical contact volume in scene space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactTarget {
    pub center: Vec3,
    pub radius: f32,
}

/// Detects fingertip contact transitions against one target
pub struct ContactTracker {
    target: ContactTarget,
    touching: [bool; FINGERTIPS.len()],
}

impl ContactTracker {
    pub fn new(target: ContactTarget) -> Self {
        Self {
            target,
            touching: [false; FINGERTIPS.len()],
        }
    }

    /// Compare fingertips against the target and report transitions
    ///
    /// A fingertip's collider is its joint sphere, so contact starts once
    /// the spheres overlap.
    pub fn update(&mut self, model: &SkeletonModel, listener: &mut impl ProximityListener) {
        let reach = self.target.radius + model.joint_diameter() / 2.0;

        for (slot, &joint) in FINGERTIPS.iter().enumerate() {
            let Some(position) = model.joint_position(joint) else {
                continue;
            };
            let inside = position.distance(self.target.center) <= reach;

            match (self.touching[slot], inside) {
                (false, true) => listener.on_contact_enter(joint),
                (true, false) => listener.on_contact_exit(joint),
                _ => {}
            }
            self.touching[slot] = inside;
        }
    }

    /// Report every current contact as ended
    pub fn release_all(&mut self, listener: &mut impl ProximityListener) {
        for (slot, &joint) in FINGERTIPS.iter().enumerate() {
            if std::mem::take(&mut self.touching[slot]) {
                listener.on_contact_exit(joint);
            }
        }
    }

    /// Number of fingertips currently in contact
    pub fn contacts(&self) -> usize {
        self.touching.iter().filter(|&&t| t).count()
    }
}

/// The pet's love value and petting state
pub struct Affection {
    value: f32,
    touch_count: u32,
    increase_rate: f32,
    decrease_rate: f32,
    min_value: f32,
    max_value: f32,
}

impl Affection {
    pub fn new(config: &PetConfig) -> Self {
        Self {
            value: config.min_value,
            touch_count: 0,
            increase_rate: config.increase_rate,
            decrease_rate: config.decrease_rate,
            min_value: config.min_value,
            max_value: config.max_value,
        }
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_being_petted(&self) -> bool {
        self.touch_count > 0
    }

    /// Advance the love value by `dt` seconds
    pub fn advance(&mut self, dt: f32) {
        let delta = if self.is_being_petted() {
            self.increase_rate * dt
        } else {
            -self.decrease_rate * dt
        };
        self.value = (self.value + delta).clamp(self.min_value, self.max_value);
    }
}

impl ProximityListener for Affection {
    fn on_contact_enter(&mut self, joint: usize) {
        self.touch_count += 1;
        debug!(joint = joint, touches = self.touch_count, "Fingertip touched pet");
        if self.touch_count == 1 {
            info!("Pet is being petted");
        }
    }

    fn on_contact_exit(&mut self, joint: usize) {
        self.touch_count = self.touch_count.saturating_sub(1);
        debug!(joint = joint, touches = self.touch_count, "Fingertip left pet");
        if self.touch_count == 0 {
            info!(love = self.value.round(), "Pet is no longer being petted");
        }
    }
}
