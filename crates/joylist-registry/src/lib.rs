//! Registry of hot-pluggable joystick-like input devices.
//!
//! Devices are discovered by polling a platform [`Enumerator`], kept in
//! insertion order and identified both by their platform [`DeviceId`] and by a
//! session-scoped [`InstanceId`]. Opened devices forward translated key and
//! axis input to a [`Joystick`] handle.

mod config;
mod device;
mod error;
mod events;
mod handle;
pub mod keycode;
mod platform;
mod registry;
mod types;

pub use crate::config::RegistryConfig;
pub use crate::device::{DeviceList, DeviceRecord};
pub use crate::error::{Error, Lookup, Result};
pub use crate::events::{ChannelSink, DeviceEvent, EventKind, EventReceiver, EventSink, NullSink};
pub use crate::handle::Joystick;
pub use crate::keycode::map_keycode;
pub use crate::platform::{Enumerator, MotionSensor, NoEnumerator, DISCOVERY_INTERVAL};
pub use crate::registry::{scale_axis, Registry};
pub use crate::types::{
    ButtonIndex, Capabilities, DeviceId, Guid, InstanceId, ACCELEROMETER_DEVICE_ID,
    ACCELEROMETER_NAME, MAX_BUTTONS,
};
