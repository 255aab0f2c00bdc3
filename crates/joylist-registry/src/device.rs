use std::sync::{Mutex, Weak};

use crate::error::{Error, Lookup, Result};
use crate::events::{post, DeviceEvent, EventSink};
use crate::handle::{Joystick, JoystickState};
use crate::types::{Capabilities, DeviceId, Guid, InstanceId};

/// A connected device known to the registry.
#[derive(Debug)]
pub struct DeviceRecord {
    device_id: DeviceId,
    instance_id: InstanceId,
    name: Box<str>,
    guid: Guid,
    caps: Capabilities,
    is_motion_sensor: bool,
    joystick: Option<Weak<Mutex<JoystickState>>>,
}

impl DeviceRecord {
    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    pub fn instance_id(&self) -> InstanceId {
        self.instance_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn guid(&self) -> Guid {
        self.guid
    }

    pub fn capabilities(&self) -> Capabilities {
        self.caps
    }

    pub fn is_motion_sensor(&self) -> bool {
        self.is_motion_sensor
    }

    /// Whether a live handle is bound to this device.
    pub fn is_open(&self) -> bool {
        self.joystick().is_some()
    }

    /// Bound handle, if it is still alive.
    pub(crate) fn joystick(&self) -> Option<Joystick> {
        self.joystick.as_ref().and_then(Joystick::upgrade)
    }

    pub(crate) fn bind(&mut self, joystick: &Joystick) {
        joystick.bind(self.device_id, self.instance_id, self.caps, self.guid);
        self.joystick = Some(joystick.downgrade());
    }

    /// Clears the binding if `joystick` is the bound handle.
    pub(crate) fn unbind(&mut self, joystick: &Joystick) -> bool {
        let bound = self
            .joystick
            .as_ref()
            .is_some_and(|link| joystick.is_same(link));
        if bound {
            self.joystick = None;
        }
        bound
    }

    fn detach(&mut self) {
        if let Some(joystick) = self.joystick.take().as_ref().and_then(Joystick::upgrade) {
            joystick.detach();
        }
    }
}

/// Ordered list of live devices. Index order is insertion order.
pub struct DeviceList {
    records: Vec<DeviceRecord>,
    next_instance: InstanceId,
    sink: Box<dyn EventSink>,
}

impl DeviceList {
    pub(crate) fn new(sink: Box<dyn EventSink>) -> Self {
        Self {
            records: Vec::new(),
            next_instance: 0,
            sink,
        }
    }

    /// Number of live devices.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Device at `index` in insertion order.
    pub fn get(&self, index: usize) -> Option<&DeviceRecord> {
        self.records.get(index)
    }

    /// Device with the given platform id. Never triggers discovery.
    pub fn find(&self, device_id: DeviceId) -> Option<&DeviceRecord> {
        self.records.iter().find(|r| r.device_id == device_id)
    }

    pub fn contains(&self, device_id: DeviceId) -> bool {
        self.find(device_id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.records.iter()
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut DeviceRecord> {
        self.records.get_mut(index)
    }

    pub(crate) fn find_mut(&mut self, device_id: DeviceId) -> Option<&mut DeviceRecord> {
        self.records.iter_mut().find(|r| r.device_id == device_id)
    }

    /// Registers a new device and returns the new number of live devices.
    ///
    /// Negative `buttons` means the platform did not report a count. Posts
    /// [`DeviceEvent::Added`] carrying the index of the new device.
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
        if self.contains(device_id) {
            log::warn!("rejected duplicate device_id {device_id}");
            return Err(Error::DuplicateDevice(device_id));
        }
        if name.is_empty() {
            return Err(Error::InvalidArgument("device name is empty"));
        }

        let mut owned = String::new();
        owned
            .try_reserve_exact(name.len())
            .map_err(|_| Error::AllocationFailure)?;
        owned.push_str(name);

        let instance_id = self.next_instance;
        self.next_instance += 1;
        self.records.push(DeviceRecord {
            device_id,
            instance_id,
            name: owned.into_boxed_str(),
            guid: Guid::from_name(name),
            caps: Capabilities::from_raw(buttons, axes, hats, balls),
            is_motion_sensor,
            joystick: None,
        });

        let count = self.records.len();
        post(self.sink.as_mut(), DeviceEvent::Added { index: count - 1 });
        log::info!("added joystick {name} with device_id {device_id}");

        Ok(count)
    }

    /// Unregisters a device and returns its instance id.
    ///
    /// Posts [`DeviceEvent::Removed`]. A handle bound to the device is
    /// detached but stays usable for reading its last state.
    pub fn remove(&mut self, device_id: DeviceId) -> Result<InstanceId> {
        let position = self
            .records
            .iter()
            .position(|r| r.device_id == device_id)
            .ok_or(Error::NotFound(Lookup::DeviceId(device_id)))?;
        let mut record = self.records.remove(position);
        let instance_id = record.instance_id;

        post(self.sink.as_mut(), DeviceEvent::Removed { instance_id });
        log::info!("removed joystick with device_id {device_id}");

        record.detach();
        Ok(instance_id)
    }

    /// Drops every device and restarts instance numbering.
    pub(crate) fn reset(&mut self) {
        for record in &mut self.records {
            record.detach();
        }
        self.records.clear();
        self.next_instance = 0;
    }
}

impl Drop for DeviceList {
    fn drop(&mut self) {
        self.reset();
    }
}
