use std::time::Duration;

use crate::platform::DISCOVERY_INTERVAL;

/// Registry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Minimum time between two platform enumeration passes.
    pub discovery_interval: Duration,
    /// Expose the built-in accelerometer as a three-axis joystick on init.
    pub accelerometer_as_joystick: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            discovery_interval: DISCOVERY_INTERVAL,
            accelerometer_as_joystick: true,
        }
    }
}
