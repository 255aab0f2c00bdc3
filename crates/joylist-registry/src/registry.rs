use std::time::Instant;

use crate::config::RegistryConfig;
use crate::device::{DeviceList, DeviceRecord};
use crate::error::{Error, Lookup, Result};
use crate::events::{EventSink, NullSink};
use crate::handle::Joystick;
use crate::keycode::map_keycode;
use crate::platform::{Discovery, Enumerator, MotionSensor, NoEnumerator};
use crate::types::{
    ButtonIndex, DeviceId, Guid, InstanceId, ACCELEROMETER_DEVICE_ID, ACCELEROMETER_NAME,
};

/// Scales a normalized axis reading to the signed 16-bit joystick range.
///
/// Values are expected in `[-1.0, 1.0]` or `[0.0, 1.0]`; anything outside
/// saturates at the `i16` bounds.
#[inline]
pub fn scale_axis(value: f32) -> i16 {
    (value * 32767.0).round() as i16
}

/// Registry of hot-pluggable input devices.
///
/// Owns the device list and the platform collaborators. All calls are
/// expected from a single polling thread.
pub struct Registry {
    config: RegistryConfig,
    devices: DeviceList,
    enumerator: Box<dyn Enumerator>,
    sensor: Option<Box<dyn MotionSensor>>,
    discovery: Discovery,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl Registry {
    /// Creates an empty registry without collaborators attached.
    pub fn new(config: RegistryConfig) -> Self {
        let discovery = Discovery::new(config.discovery_interval);
        Self {
            config,
            devices: DeviceList::new(Box::new(NullSink)),
            enumerator: Box::new(NoEnumerator),
            sensor: None,
            discovery,
        }
    }

    pub fn with_sink<S: EventSink + 'static>(mut self, sink: S) -> Self {
        self.devices = DeviceList::new(Box::new(sink));
        self
    }

    pub fn with_enumerator<E: Enumerator + 'static>(mut self, enumerator: E) -> Self {
        self.enumerator = Box::new(enumerator);
        self
    }

    pub fn with_motion_sensor<M: MotionSensor + 'static>(mut self, sensor: M) -> Self {
        self.sensor = Some(Box::new(sensor));
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Runs the first discovery pass and registers the built-in accelerometer
    /// when enabled. Returns the number of live devices.
    pub fn init(&mut self) -> usize {
        self.discover();
        if self.config.accelerometer_as_joystick {
            if let Err(e) =
                self.devices
                    .add(ACCELEROMETER_DEVICE_ID, ACCELEROMETER_NAME, true, 0, 3, 0, 0)
            {
                log::warn!("accelerometer not registered: {e}");
            }
        }
        self.devices.len()
    }

    /// Discovery is poll based, so callers have to tick it.
    pub fn needs_polling(&self) -> bool {
        true
    }

    /// Asks the platform enumerator for changes if the discovery interval
    /// has elapsed. Returns `true` if the enumerator ran.
    pub fn discover(&mut self) -> bool {
        self.discover_at(Instant::now())
    }

    /// Same as [`Registry::discover`] with an explicit clock reading.
    pub fn discover_at(&mut self, now: Instant) -> bool {
        if !self.discovery.poll(now) {
            return false;
        }
        log::debug!("polling platform for input devices");
        self.enumerator.enumerate(&mut self.devices);
        true
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Read-only view of the live devices.
    pub fn devices(&self) -> &DeviceList {
        &self.devices
    }

    /// See [`DeviceList::add`].
    #[allow(clippy::too_many_arguments)]
    pub fn add(
        &mut self,
        device_id: DeviceId,
        name: &str,
        is_motion_sensor: bool,
        buttons: i32,
        axes: i32,
        hats: i32,
        balls: i32,
    ) -> Result<usize> {
        self.devices
            .add(device_id, name, is_motion_sensor, buttons, axes, hats, balls)
    }

    /// See [`DeviceList::remove`]. Never triggers discovery.
    pub fn remove(&mut self, device_id: DeviceId) -> Result<InstanceId> {
        self.devices.remove(device_id)
    }

    pub fn device_at(&self, index: usize) -> Option<&DeviceRecord> {
        self.devices.get(index)
    }

    /// Looks a device up by platform id. On a miss one discovery pass is
    /// attempted before giving up, since the device may have just appeared.
    pub fn device_by_id(&mut self, device_id: DeviceId) -> Option<&DeviceRecord> {
        if !self.devices.contains(device_id) {
            self.discover();
        }
        self.devices.find(device_id)
    }

    pub fn name_at(&self, index: usize) -> Option<&str> {
        self.device_at(index).map(DeviceRecord::name)
    }

    pub fn instance_id_at(&self, index: usize) -> Option<InstanceId> {
        self.device_at(index).map(DeviceRecord::instance_id)
    }

    pub fn guid_at(&self, index: usize) -> Option<Guid> {
        self.device_at(index).map(DeviceRecord::guid)
    }

    /// Binds `joystick` to the device at `index` and copies the device
    /// capabilities into it.
    pub fn open(&mut self, index: usize, joystick: &Joystick) -> Result<()> {
        let record = self
            .devices
            .get_mut(index)
            .ok_or(Error::NotFound(Lookup::Index(index)))?;
        if record.is_open() {
            return Err(Error::AlreadyOpen(record.instance_id()));
        }
        if joystick.is_attached() {
            let instance_id = joystick.instance_id().unwrap_or(record.instance_id());
            return Err(Error::AlreadyOpen(instance_id));
        }
        record.bind(joystick);
        log::debug!(
            "opened joystick {} instance={}",
            record.name(),
            record.instance_id()
        );
        Ok(())
    }

    /// Releases the device bound to `joystick`. Closing twice is a no-op.
    pub fn close(&mut self, joystick: &Joystick) {
        if let Some(device_id) = joystick.device_id() {
            if let Some(record) = self.devices.find_mut(device_id) {
                record.unbind(joystick);
            }
        }
        joystick.mark_closed();
    }

    /// Whether `joystick` is still bound to a connected device.
    pub fn is_attached(&self, joystick: &Joystick) -> bool {
        joystick.is_attached()
            && joystick
                .device_id()
                .and_then(|id| self.devices.find(id))
                .and_then(DeviceRecord::joystick)
                .is_some_and(|bound| joystick.is_same(&bound.downgrade()))
    }

    fn bound_joystick(&mut self, device_id: DeviceId) -> Option<Joystick> {
        self.device_by_id(device_id).and_then(DeviceRecord::joystick)
    }

    /// Translates a platform key event into a button update.
    ///
    /// Returns the mapped button, or `None` for keycodes that are not
    /// gamepad keys. Events for devices that are unknown or not opened are
    /// dropped.
    pub fn dispatch_button(
        &mut self,
        device_id: DeviceId,
        keycode: i32,
        pressed: bool,
    ) -> Option<ButtonIndex> {
        let Some(button) = map_keycode(keycode) else {
            log::debug!("unmapped keycode {keycode} from device_id {device_id}");
            return None;
        };
        if let Some(joystick) = self.bound_joystick(device_id) {
            joystick.set_button(button, pressed);
        }
        Some(button)
    }

    /// Forwards a normalized axis reading to the bound handle. Returns `true`
    /// if a handle received it.
    pub fn dispatch_axis(&mut self, device_id: DeviceId, axis: usize, value: f32) -> bool {
        let Some(joystick) = self.bound_joystick(device_id) else {
            return false;
        };
        joystick.set_axis(axis, scale_axis(value));
        true
    }

    /// Feeds motion sensor readings into the opened motion-sensor device as
    /// axes 0, 1 and 2.
    pub fn update_motion_sensors(&mut self) {
        let Some(sensor) = self.sensor.as_mut() else {
            return;
        };
        let Some(joystick) = self
            .devices
            .iter()
            .find(|r| r.is_motion_sensor())
            .and_then(DeviceRecord::joystick)
        else {
            return;
        };
        for (axis, value) in sensor.read().into_iter().enumerate() {
            joystick.set_axis(axis, scale_axis(value));
        }
    }

    /// Drops every device, detaching open handles, and restarts instance
    /// numbering.
    pub fn reset(&mut self) {
        self.devices.reset();
        self.discovery.reset();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;
    use std::time::Duration;

    use super::*;
    use crate::keycode::{KEYCODE_BUTTON_1, KEYCODE_BUTTON_A, KEYCODE_DPAD_UP};
    use crate::types::MAX_BUTTONS;

    fn eager() -> RegistryConfig {
        RegistryConfig {
            discovery_interval: Duration::ZERO,
            accelerometer_as_joystick: false,
        }
    }

    fn counting(registry: Registry) -> (Registry, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let registry = registry.with_enumerator(move |_: &mut DeviceList| {
            counter.set(counter.get() + 1);
        });
        (registry, calls)
    }

    #[test]
    fn scale_axis_covers_full_range() {
        assert_eq!(scale_axis(1.0), 32767);
        assert_eq!(scale_axis(-1.0), -32767);
        assert_eq!(scale_axis(0.0), 0);
        assert_eq!(scale_axis(0.5), 16384);
        assert_eq!(scale_axis(2.0), i16::MAX);
    }

    #[test]
    fn init_registers_accelerometer() {
        let mut registry = Registry::default();
        assert_eq!(registry.init(), 1);
        let record = registry.device_at(0).unwrap();
        assert_eq!(record.device_id(), ACCELEROMETER_DEVICE_ID);
        assert_eq!(record.name(), ACCELEROMETER_NAME);
        assert!(record.is_motion_sensor());
        assert_eq!(record.capabilities().axes, 3);
        assert_eq!(record.capabilities().buttons, 0);
    }

    #[test]
    fn init_without_accelerometer_runs_discovery() {
        let (mut registry, calls) = counting(Registry::new(eager()));
        assert_eq!(registry.init(), 0);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn discovery_is_rate_limited() {
        let (mut registry, calls) = counting(Registry::default());
        let now = Instant::now();
        assert!(registry.discover_at(now));
        assert!(!registry.discover_at(now + Duration::from_secs(1)));
        assert!(registry.discover_at(now + Duration::from_secs(3)));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn enumerator_can_add_devices() {
        let mut registry = Registry::new(eager()).with_enumerator(|devices: &mut DeviceList| {
            let _ = devices.add(4, "Late Pad", false, 12, 2, 0, 0);
        });
        assert!(registry.device_by_id(4).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn index_accessors() {
        let mut registry = Registry::new(eager());
        registry.add(1, "Pad", false, -1, 4, 1, 0).unwrap();
        assert_eq!(registry.name_at(0), Some("Pad"));
        assert_eq!(registry.instance_id_at(0), Some(0));
        assert_eq!(registry.guid_at(0), Some(Guid::from_name("Pad")));
        assert_eq!(registry.name_at(1), None);
        assert!(registry.needs_polling());
    }

    #[test]
    fn open_copies_capabilities() {
        let mut registry = Registry::new(eager());
        registry.add(1, "Pad", false, -1, 4, 1, 0).unwrap();
        let js = Joystick::new();
        registry.open(0, &js).unwrap();
        assert_eq!(js.instance_id(), Some(0));
        assert_eq!(js.capabilities().buttons, MAX_BUTTONS);
        assert_eq!(js.capabilities().hats, 1);
        assert_eq!(js.guid(), Some(Guid::from_name("Pad")));
        assert!(registry.is_attached(&js));
    }

    #[test]
    fn open_rejects_bad_index_and_second_handle() {
        let mut registry = Registry::new(eager());
        registry.add(1, "Pad", false, 4, 2, 0, 0).unwrap();
        assert_eq!(
            registry.open(1, &Joystick::new()),
            Err(Error::NotFound(Lookup::Index(1)))
        );
        let js = Joystick::new();
        registry.open(0, &js).unwrap();
        assert_eq!(registry.open(0, &Joystick::new()), Err(Error::AlreadyOpen(0)));
    }

    #[test]
    fn open_rejects_handle_bound_elsewhere() {
        let mut registry = Registry::new(eager());
        registry.add(1, "Pad", false, 4, 2, 0, 0).unwrap();
        registry.add(2, "Pad", false, 4, 2, 0, 0).unwrap();
        let js = Joystick::new();
        registry.open(0, &js).unwrap();
        assert_eq!(registry.open(1, &js), Err(Error::AlreadyOpen(0)));
        assert!(!registry.device_at(1).unwrap().is_open());
    }

    #[test]
    fn close_is_idempotent_and_allows_reopen() {
        let mut registry = Registry::new(eager());
        registry.add(1, "Pad", false, 4, 2, 0, 0).unwrap();
        let js = Joystick::new();
        registry.open(0, &js).unwrap();
        registry.close(&js);
        registry.close(&js);
        assert!(js.is_closed());
        assert!(!registry.is_attached(&js));
        assert!(!registry.device_at(0).unwrap().is_open());

        let again = Joystick::new();
        registry.open(0, &again).unwrap();
        assert!(registry.is_attached(&again));
    }

    #[test]
    fn dispatch_button_maps_and_forwards() {
        let mut registry = Registry::new(eager());
        registry.add(1, "Pad", false, -1, 4, 1, 0).unwrap();
        let js = Joystick::new();
        registry.open(0, &js).unwrap();

        assert_eq!(registry.dispatch_button(1, KEYCODE_BUTTON_A, true), Some(5));
        assert_eq!(registry.dispatch_button(1, KEYCODE_DPAD_UP, true), Some(0));
        assert_eq!(js.pressed_buttons(), vec![0, 5]);
        registry.dispatch_button(1, KEYCODE_BUTTON_A, false);
        assert_eq!(js.pressed_buttons(), vec![0]);
    }

    #[test]
    fn dispatch_button_unmapped_is_noop() {
        let mut registry = Registry::new(eager());
        registry.add(1, "Pad", false, -1, 4, 1, 0).unwrap();
        let js = Joystick::new();
        registry.open(0, &js).unwrap();
        assert_eq!(registry.dispatch_button(1, 4, true), None);
        assert!(js.pressed_buttons().is_empty());
    }

    #[test]
    fn dispatch_to_closed_device_is_dropped() {
        let mut registry = Registry::new(eager());
        registry.add(1, "Pad", false, -1, 4, 1, 0).unwrap();
        assert_eq!(registry.dispatch_button(1, KEYCODE_BUTTON_1, true), Some(20));
        assert!(!registry.dispatch_axis(1, 0, 1.0));
        assert!(!registry.dispatch_axis(9, 0, 1.0));
    }

    #[test]
    fn dispatch_axis_scales_values() {
        let mut registry = Registry::new(eager());
        registry.add(1, "Pad", false, -1, 4, 1, 0).unwrap();
        let js = Joystick::new();
        registry.open(0, &js).unwrap();
        assert!(registry.dispatch_axis(1, 0, 1.0));
        assert!(registry.dispatch_axis(1, 1, -1.0));
        assert_eq!(js.axis(0), Some(32767));
        assert_eq!(js.axis(1), Some(-32767));
    }

    #[test]
    fn motion_sensor_feeds_first_three_axes() {
        let mut registry = Registry::default().with_motion_sensor(|| [0.5f32, -0.25, 1.0]);
        registry.init();
        let js = Joystick::new();

        registry.update_motion_sensors();
        registry.open(0, &js).unwrap();
        assert_eq!(js.axis(0), Some(0));

        registry.update_motion_sensors();
        assert_eq!(js.axis(0), Some(16384));
        assert_eq!(js.axis(1), Some(-8192));
        assert_eq!(js.axis(2), Some(32767));
    }

    #[test]
    fn reset_detaches_handles() {
        let mut registry = Registry::new(eager());
        registry.add(1, "Pad", false, 4, 2, 0, 0).unwrap();
        let js = Joystick::new();
        registry.open(0, &js).unwrap();
        registry.reset();
        assert!(registry.is_empty());
        assert!(!js.is_attached());
        assert!(!registry.is_attached(&js));
    }

    #[test]
    fn dropping_registry_detaches_handles() {
        let js = Joystick::new();
        {
            let mut registry = Registry::new(eager());
            registry.add(1, "Pad", false, 4, 2, 0, 0).unwrap();
            registry.open(0, &js).unwrap();
        }
        assert!(!js.is_attached());
    }
}
