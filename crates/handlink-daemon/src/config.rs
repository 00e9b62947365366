//! Configuration loading and validation

use anyhow::{bail, Result};
use handlink_core::ScalingFactor;
use handlink_net::{ReceiverConfig, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Highest supported skeleton update rate
pub const MAX_TICK_HZ: f64 = 1000.0;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub receiver: ReceiverSection,
    #[serde(default)]
    pub skeleton: SkeletonConfig,
    #[serde(default)]
    pub pet: PetConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Skeleton update rate in ticks per second
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,
    /// Seconds without a frame before tracking counts as lost
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: f64,
    /// Status log interval in seconds (0 to disable)
    #[serde(default = "default_status_interval")]
    pub status_interval_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            stale_after_secs: default_stale_after(),
            status_interval_secs: default_status_interval(),
        }
    }
}

fn default_tick_hz() -> f64 {
    60.0
}

fn default_stale_after() -> f64 {
    2.0
}

fn default_status_interval() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverSection {
    /// Local address to listen on
    #[serde(default = "default_bind")]
    pub bind: IpAddr,
    /// UDP port the tracker sends to
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ReceiverSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
        }
    }
}

fn default_bind() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkeletonConfig {
    /// Uniform scale for joint positions and bone thickness
    #[serde(default, alias = "scalingFactor")]
    pub scaling_factor: ScalingFactor,
}

/// Touch target and affection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PetConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Target center in scene space
    #[serde(default)]
    pub center: [f32; 3],
    /// Target radius in scene units
    #[serde(default = "default_pet_radius")]
    pub radius: f32,
    /// Affection gained per second while touched
    #[serde(default = "default_increase_rate")]
    pub increase_rate: f32,
    /// Affection lost per second while untouched
    #[serde(default = "default_decrease_rate")]
    pub decrease_rate: f32,
    #[serde(default)]
    pub min_value: f32,
    #[serde(default = "default_max_value")]
    pub max_value: f32,
}

impl Default for PetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            center: [0.0; 3],
            radius: default_pet_radius(),
            increase_rate: default_increase_rate(),
            decrease_rate: default_decrease_rate(),
            min_value: 0.0,
            max_value: default_max_value(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_pet_radius() -> f32 {
    0.1
}

fn default_increase_rate() -> f32 {
    1.0
}

fn default_decrease_rate() -> f32 {
    0.5
}

fn default_max_value() -> f32 {
    100.0
}

impl Config {
    /// Convert to the receiver's own configuration
    pub fn to_receiver_config(&self) -> ReceiverConfig {
        ReceiverConfig {
            bind: self.receiver.bind,
            port: self.receiver.port,
        }
    }

    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> Result<()> {
        let daemon = &self.daemon;
        if !(daemon.tick_hz > 0.0 && daemon.tick_hz <= MAX_TICK_HZ) {
            bail!(
                "daemon.tick_hz must be in (0, {}], got {}",
                MAX_TICK_HZ,
                daemon.tick_hz
            );
        }
        if Duration::try_from_secs_f64(daemon.stale_after_secs).is_err() {
            bail!(
                "daemon.stale_after_secs must be a representable non-negative duration, got {}",
                daemon.stale_after_secs
            );
        }

        let pet = &self.pet;
        if !(pet.radius.is_finite() && pet.radius >= 0.0) {
            bail!("pet.radius must be zero or positive, got {}", pet.radius);
        }
        if pet.center.iter().any(|c| !c.is_finite()) {
            bail!("pet.center must be finite, got {:?}", pet.center);
        }
        if pet.increase_rate < 0.0 || pet.decrease_rate < 0.0 {
            bail!(
                "pet rates must not be negative, got increase {} decrease {}",
                pet.increase_rate,
                pet.decrease_rate
            );
        }
        if !(pet.min_value <= pet.max_value) {
            bail!(
                "pet.min_value ({}) must not exceed pet.max_value ({})",
                pet.min_value,
                pet.max_value
            );
        }
        Ok(())
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        config
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    Ok(())
}
