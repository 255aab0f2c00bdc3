use std::fmt;

/// Platform-assigned device identifier. Stable only while the device stays
/// connected and may be negative.
pub type DeviceId = i32;

/// Session-scoped identifier handed out when a device is added.
pub type InstanceId = u32;

/// Compact zero-based button index produced by the keycode mapper.
pub type ButtonIndex = u8;

/// Button count used when the platform does not report one.
pub const MAX_BUTTONS: u32 = 36;

/// Reserved device id of the built-in accelerometer.
pub const ACCELEROMETER_DEVICE_ID: DeviceId = i32::MIN;

/// Display name of the built-in accelerometer.
pub const ACCELEROMETER_NAME: &str = "Android Accelerometer";

/// Opaque 16-byte device identifier derived from the device name.
///
/// Two devices with the same leading name bytes share a guid, so it is only
/// good enough for matching saved mappings, not for telling devices apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Guid(pub [u8; 16]);

impl Guid {
    /// Builds a guid from the first 16 bytes of `name`, zero padded.
    pub fn from_name(name: &str) -> Self {
        let mut data = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(data.len());
        data[..len].copy_from_slice(&bytes[..len]);
        Self(data)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Input capabilities reported for a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub buttons: u32,
    pub axes: u32,
    pub hats: u32,
    pub balls: u32,
}

impl Capabilities {
    /// Normalizes raw platform counts. A negative button count means the
    /// platform does not know, so [`MAX_BUTTONS`] is assumed.
    pub fn from_raw(buttons: i32, axes: i32, hats: i32, balls: i32) -> Self {
        let buttons = if buttons > -1 {
            buttons as u32
        } else {
            MAX_BUTTONS
        };
        Self {
            buttons,
            axes: axes.max(0) as u32,
            hats: hats.max(0) as u32,
            balls: balls.max(0) as u32,
        }
    }
}
