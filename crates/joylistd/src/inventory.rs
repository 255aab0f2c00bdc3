use std::rc::Rc;
use std::time::{Duration, Instant};

use ahash::AHashSet;
use colored::Colorize;

use joylist_registry::{DeviceId, DeviceList, Enumerator, Error, MotionSensor};

use crate::{print_debug, print_warning};

/// Time since the session started.
pub type Clock = Rc<dyn Fn() -> Duration>;

/// Returns a clock that measures from now.
pub fn wall_clock() -> Clock {
    let started = Instant::now();
    Rc::new(move || started.elapsed())
}

/// A device the virtual platform reports during a time window.
#[derive(Debug, Clone, PartialEq)]
pub struct VirtualDevice {
    pub id: DeviceId,
    pub name: String,
    pub buttons: i32,
    pub axes: i32,
    pub hats: i32,
    pub balls: i32,
    pub connect_at: Duration,
    pub disconnect_at: Option<Duration>,
}

impl VirtualDevice {
    pub fn is_connected(&self, elapsed: Duration) -> bool {
        elapsed >= self.connect_at && self.disconnect_at.map_or(true, |at| elapsed < at)
    }
}

/// Enumerator backed by a static device inventory with connect and
/// disconnect times.
///
/// Only devices it reported itself are ever removed, so devices added through
/// other paths (like the built-in accelerometer) are left alone.
pub struct VirtualPlatform {
    devices: Vec<VirtualDevice>,
    reported: AHashSet<DeviceId>,
    clock: Clock,
}

impl VirtualPlatform {
    pub fn new(devices: Vec<VirtualDevice>, clock: Clock) -> Self {
        Self {
            devices,
            reported: AHashSet::new(),
            clock,
        }
    }
}

impl Enumerator for VirtualPlatform {
    fn enumerate(&mut self, list: &mut DeviceList) {
        let elapsed = (self.clock)();
        for device in &self.devices {
            let connected = device.is_connected(elapsed);
            let reported = self.reported.contains(&device.id);
            if connected && !reported {
                match list.add(
                    device.id,
                    &device.name,
                    false,
                    device.buttons,
                    device.axes,
                    device.hats,
                    device.balls,
                ) {
                    Ok(count) => {
                        print_debug!("platform reported {} ({count} live)", device.name);
                        self.reported.insert(device.id);
                    }
                    Err(Error::DuplicateDevice(id)) => {
                        print_warning!("device_id {id} is already taken, skipping {}", device.name);
                    }
                    Err(e) => {
                        print_warning!("platform device {} rejected: {e}", device.id);
                    }
                }
            } else if !connected && reported {
                self.reported.remove(&device.id);
                if let Err(e) = list.remove(device.id) {
                    print_warning!("platform device {} vanished early: {e}", device.id);
                }
            }
        }
    }
}

/// Motion sensor that always reports the same reading.
#[derive(Debug, Clone, Copy)]
pub struct FixedMotion(pub [f32; 3]);

impl MotionSensor for FixedMotion {
    fn read(&mut self) -> [f32; 3] {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use joylist_registry::{Registry, RegistryConfig};

    use super::*;

    fn device(id: DeviceId, connect_ms: u64, disconnect_ms: Option<u64>) -> VirtualDevice {
        VirtualDevice {
            id,
            name: format!("Virtual {id}"),
            buttons: -1,
            axes: 2,
            hats: 0,
            balls: 0,
            connect_at: Duration::from_millis(connect_ms),
            disconnect_at: disconnect_ms.map(Duration::from_millis),
        }
    }

    fn setup(devices: Vec<VirtualDevice>) -> (Registry, Rc<Cell<Duration>>) {
        let now = Rc::new(Cell::new(Duration::ZERO));
        let time = now.clone();
        let clock: Clock = Rc::new(move || time.get());
        let registry = Registry::new(RegistryConfig {
            discovery_interval: Duration::ZERO,
            accelerometer_as_joystick: false,
        })
        .with_enumerator(VirtualPlatform::new(devices, clock));
        (registry, now)
    }

    fn ids(registry: &Registry) -> Vec<DeviceId> {
        registry.devices().iter().map(|r| r.device_id()).collect()
    }

    #[test]
    fn connection_window_is_half_open() {
        let d = device(1, 100, Some(200));
        assert!(!d.is_connected(Duration::from_millis(99)));
        assert!(d.is_connected(Duration::from_millis(100)));
        assert!(d.is_connected(Duration::from_millis(199)));
        assert!(!d.is_connected(Duration::from_millis(200)));
        assert!(device(2, 0, None).is_connected(Duration::from_secs(3600)));
    }

    #[test]
    fn devices_follow_their_windows() {
        let (mut registry, now) = setup(vec![device(1, 0, Some(300)), device(2, 100, None)]);

        registry.discover();
        assert_eq!(ids(&registry), vec![1]);

        now.set(Duration::from_millis(150));
        registry.discover();
        assert_eq!(ids(&registry), vec![1, 2]);

        now.set(Duration::from_millis(300));
        registry.discover();
        assert_eq!(ids(&registry), vec![2]);
    }

    #[test]
    fn foreign_devices_are_not_removed() {
        let (mut registry, now) = setup(vec![device(1, 0, Some(100))]);
        registry.add(50, "Manual", false, 4, 2, 0, 0).unwrap();
        registry.discover();
        now.set(Duration::from_millis(100));
        registry.discover();
        assert_eq!(ids(&registry), vec![50]);
    }

    #[test]
    fn taken_id_is_retried_later() {
        let (mut registry, _now) = setup(vec![device(1, 0, None)]);
        registry.add(1, "Squatter", false, 4, 2, 0, 0).unwrap();
        registry.discover();
        assert_eq!(registry.devices().find(1).map(|r| r.name()), Some("Squatter"));

        registry.remove(1).unwrap();
        registry.discover();
        assert_eq!(registry.devices().find(1).map(|r| r.name()), Some("Virtual 1"));
    }

    #[test]
    fn fixed_motion_repeats_reading() {
        let mut sensor = FixedMotion([0.1, 0.2, 0.3]);
        assert_eq!(sensor.read(), [0.1, 0.2, 0.3]);
        assert_eq!(sensor.read(), [0.1, 0.2, 0.3]);
    }
}
