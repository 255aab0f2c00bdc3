use std::fmt;

use thiserror::Error;

use crate::types::{DeviceId, InstanceId};

/// What a failed lookup was looking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    DeviceId(DeviceId),
    Index(usize),
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::DeviceId(id) => write!(f, "device_id={id}"),
            Lookup::Index(index) => write!(f, "index={index}"),
        }
    }
}

/// Error type for device registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// A required argument was missing or empty.
    #[error("Invalid argument: {0}")]
    InvalidArgument(&'static str),
    /// A live device already uses this device id.
    #[error("Device already registered: {0}")]
    DuplicateDevice(DeviceId),
    /// No live device matches the lookup.
    #[error("No such device: {0}")]
    NotFound(Lookup),
    /// The device is already bound to a joystick handle.
    #[error("Joystick already opened: instance {0}")]
    AlreadyOpen(InstanceId),
    /// Owned copy of the device name could not be allocated.
    #[error("Out of memory while copying device name")]
    AllocationFailure,
}

/// Convenient result alias for registry operations.
pub type Result<T> = std::result::Result<T, Error>;
