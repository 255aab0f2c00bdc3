use std::path::Path;
use std::time::Duration;
use std::{fs, io};

use ahash::AHashSet;
use serde::Deserialize;
use thiserror::Error;

use joylist_registry::{DeviceId, RegistryConfig, DISCOVERY_INTERVAL};

use crate::inventory::VirtualDevice;
use crate::script::{InputAction, InputStep};

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "joylist.yaml";

const DEFAULT_TICK_MS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("yaml deserialize error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Validated daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub registry: RegistryConfig,
    pub tick: Duration,
    pub motion: [f32; 3],
    pub devices: Vec<VirtualDevice>,
    pub script: Vec<InputStep>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            motion: [0.0; 3],
            devices: Vec::new(),
            script: Vec::new(),
        }
    }
}

impl Config {
    /// Time after which neither the inventory nor the script change anymore.
    pub fn horizon(&self) -> Duration {
        let devices = self
            .devices
            .iter()
            .map(|d| d.disconnect_at.unwrap_or(d.connect_at));
        let steps = self.script.iter().map(|s| s.at);
        devices.chain(steps).max().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct VersionedConfig {
    version: u8,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigV1 {
    #[allow(dead_code)]
    version: u8,
    #[serde(default)]
    registry: RegistrySection,
    #[serde(default)]
    motion: Option<[f32; 3]>,
    #[serde(default)]
    devices: Vec<DeviceEntry>,
    #[serde(default)]
    script: Vec<StepEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RegistrySection {
    discovery_interval_ms: u64,
    accelerometer_as_joystick: bool,
    tick_ms: u64,
}

impl Default for RegistrySection {
    fn default() -> Self {
        Self {
            discovery_interval_ms: DISCOVERY_INTERVAL.as_millis() as u64,
            accelerometer_as_joystick: true,
            tick_ms: DEFAULT_TICK_MS,
        }
    }
}

fn unspecified_buttons() -> i32 {
    -1
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeviceEntry {
    id: DeviceId,
    name: String,
    #[serde(default = "unspecified_buttons")]
    buttons: i32,
    #[serde(default)]
    axes: i32,
    #[serde(default)]
    hats: i32,
    #[serde(default)]
    balls: i32,
    #[serde(default)]
    connect_ms: u64,
    #[serde(default)]
    disconnect_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct StepEntry {
    at_ms: u64,
    device: DeviceId,
    #[serde(default)]
    key: Option<i32>,
    #[serde(default)]
    pressed: Option<bool>,
    #[serde(default)]
    axis: Option<usize>,
    #[serde(default)]
    value: Option<f32>,
}

impl ConfigV1 {
    fn into_config(self) -> Result<Config, ConfigError> {
        if self.registry.tick_ms == 0 {
            return Err(ConfigError::Invalid("tick_ms must be positive".into()));
        }

        let mut seen = AHashSet::new();
        let mut devices = Vec::with_capacity(self.devices.len());
        for entry in self.devices {
            if entry.name.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "device {} has an empty name",
                    entry.id
                )));
            }
            if !seen.insert(entry.id) {
                return Err(ConfigError::Invalid(format!(
                    "device id {} is declared twice",
                    entry.id
                )));
            }
            if let Some(disconnect_ms) = entry.disconnect_ms {
                if disconnect_ms <= entry.connect_ms {
                    return Err(ConfigError::Invalid(format!(
                        "device {} disconnects before it connects",
                        entry.id
                    )));
                }
            }
            devices.push(VirtualDevice {
                id: entry.id,
                name: entry.name,
                buttons: entry.buttons,
                axes: entry.axes,
                hats: entry.hats,
                balls: entry.balls,
                connect_at: Duration::from_millis(entry.connect_ms),
                disconnect_at: entry.disconnect_ms.map(Duration::from_millis),
            });
        }

        let script = self
            .script
            .into_iter()
            .map(StepEntry::into_step)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Config {
            registry: RegistryConfig {
                discovery_interval: Duration::from_millis(self.registry.discovery_interval_ms),
                accelerometer_as_joystick: self.registry.accelerometer_as_joystick,
            },
            tick: Duration::from_millis(self.registry.tick_ms),
            motion: self.motion.unwrap_or_default(),
            devices,
            script,
        })
    }
}

impl StepEntry {
    fn into_step(self) -> Result<InputStep, ConfigError> {
        let action = match (self.key, self.axis) {
            (Some(keycode), None) if self.value.is_none() => InputAction::Key {
                keycode,
                pressed: self.pressed.unwrap_or(true),
            },
            (None, Some(axis)) if self.pressed.is_none() => {
                let Some(value) = self.value else {
                    return Err(ConfigError::Invalid(format!(
                        "axis step at {}ms has no value",
                        self.at_ms
                    )));
                };
                InputAction::Axis { axis, value }
            }
            (Some(_), None) => {
                return Err(ConfigError::Invalid(format!(
                    "key step at {}ms sets value",
                    self.at_ms
                )))
            }
            (None, Some(_)) => {
                return Err(ConfigError::Invalid(format!(
                    "axis step at {}ms sets pressed",
                    self.at_ms
                )))
            }
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "step at {}ms must set exactly one of key or axis",
                    self.at_ms
                )))
            }
        };
        Ok(InputStep {
            at: Duration::from_millis(self.at_ms),
            device_id: self.device,
            action,
        })
    }
}

/// Parse yaml config.
pub fn parse_config(input: &str) -> Result<Config, ConfigError> {
    let version = parse_version(input)?;
    match version {
        1 => {
            let config: ConfigV1 = serde_yaml::from_str(input)?;
            config.into_config()
        }
        _ => Err(ConfigError::UnsupportedVersion(version)),
    }
}

/// Parse the version of yaml config.
fn parse_version(input: &str) -> Result<u8, ConfigError> {
    let raw: VersionedConfig = serde_yaml::from_str(input)?;
    Ok(raw.version)
}

/// Read and parse a config file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}
