use std::time::{Duration, Instant};

use crate::device::DeviceList;

/// Default interval between two platform enumeration passes.
pub const DISCOVERY_INTERVAL: Duration = Duration::from_secs(3);

/// Platform side of device discovery.
///
/// Called at most once per discovery interval. Implementations report what
/// they see by calling [`DeviceList::add`] and [`DeviceList::remove`].
pub trait Enumerator {
    fn enumerate(&mut self, devices: &mut DeviceList);
}

/// Enumerator that never reports anything.
#[derive(Debug, Default)]
pub struct NoEnumerator;

impl Enumerator for NoEnumerator {
    fn enumerate(&mut self, _devices: &mut DeviceList) {}
}

impl<F> Enumerator for F
where
    F: FnMut(&mut DeviceList),
{
    fn enumerate(&mut self, devices: &mut DeviceList) {
        self(devices);
    }
}

/// Source of three-axis motion readings, each in `[-1.0, 1.0]`.
pub trait MotionSensor {
    fn read(&mut self) -> [f32; 3];
}

impl<F> MotionSensor for F
where
    F: FnMut() -> [f32; 3],
{
    fn read(&mut self) -> [f32; 3] {
        self()
    }
}

/// Wall-clock rate limiter for enumeration passes.
#[derive(Debug, Clone)]
pub(crate) struct Discovery {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Discovery {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    /// Returns `true` and schedules the next pass if one is due at `now`.
    /// The first call is always due.
    pub(crate) fn poll(&mut self, now: Instant) -> bool {
        if let Some(due) = self.next_due {
            if now < due {
                return false;
            }
        }
        self.next_due = Some(now + self.interval);
        true
    }

    pub(crate) fn reset(&mut self) {
        self.next_due = None;
    }
}
