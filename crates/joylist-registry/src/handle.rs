use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::types::{ButtonIndex, Capabilities, DeviceId, Guid, InstanceId};

/// State behind a [`Joystick`] handle.
#[derive(Debug, Default)]
pub(crate) struct JoystickState {
    instance_id: Option<InstanceId>,
    caps: Capabilities,
    guid: Guid,
    axes: Vec<i16>,
    buttons: Vec<bool>,
    device_id: Option<DeviceId>,
    closed: bool,
}

/// A handle to an opened device that receives translated input.
///
/// Clones share the same state. The registry keeps only a weak link to the
/// handle, so dropping every clone implicitly releases the device.
#[derive(Debug, Clone, Default)]
pub struct Joystick {
    inner: Arc<Mutex<JoystickState>>,
}

impl Joystick {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, JoystickState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Instance id of the device this handle was opened on.
    pub fn instance_id(&self) -> Option<InstanceId> {
        self.state().instance_id
    }

    /// Device id of the device this handle is currently bound to.
    pub fn device_id(&self) -> Option<DeviceId> {
        self.state().device_id
    }

    pub fn capabilities(&self) -> Capabilities {
        self.state().caps
    }

    /// Guid of the device this handle was opened on.
    pub fn guid(&self) -> Option<Guid> {
        let state = self.state();
        state.instance_id.map(|_| state.guid)
    }

    /// Whether the handle is bound to a live device and not closed.
    pub fn is_attached(&self) -> bool {
        let state = self.state();
        !state.closed && state.device_id.is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    pub fn axis(&self, axis: usize) -> Option<i16> {
        self.state().axes.get(axis).copied()
    }

    pub fn button(&self, button: ButtonIndex) -> Option<bool> {
        self.state().buttons.get(usize::from(button)).copied()
    }

    /// Indices of the buttons currently held down.
    pub fn pressed_buttons(&self) -> Vec<ButtonIndex> {
        self.state()
            .buttons
            .iter()
            .enumerate()
            .filter(|(_, pressed)| **pressed)
            .map(|(i, _)| i as ButtonIndex)
            .collect()
    }

    /// Updates an axis value. Returns `true` if the stored value changed.
    /// Axes beyond the device capabilities are ignored.
    pub fn set_axis(&self, axis: usize, value: i16) -> bool {
        let mut state = self.state();
        let Some(slot) = state.axes.get_mut(axis) else {
            return false;
        };
        let changed = *slot != value;
        *slot = value;
        changed
    }

    /// Updates a button state. Returns `true` if the stored state changed.
    /// Buttons beyond the device capabilities are ignored.
    pub fn set_button(&self, button: ButtonIndex, pressed: bool) -> bool {
        let mut state = self.state();
        let Some(slot) = state.buttons.get_mut(usize::from(button)) else {
            return false;
        };
        let changed = *slot != pressed;
        *slot = pressed;
        changed
    }

    pub(crate) fn bind(
        &self,
        device_id: DeviceId,
        instance_id: InstanceId,
        caps: Capabilities,
        guid: Guid,
    ) {
        let mut state = self.state();
        state.instance_id = Some(instance_id);
        state.device_id = Some(device_id);
        state.caps = caps;
        state.guid = guid;
        state.axes = vec![0; caps.axes as usize];
        state.buttons = vec![false; caps.buttons as usize];
        state.closed = false;
    }

    /// Drops the link to the device, leaving the last known state readable.
    pub(crate) fn detach(&self) {
        self.state().device_id = None;
    }

    pub(crate) fn mark_closed(&self) {
        let mut state = self.state();
        state.device_id = None;
        state.closed = true;
    }

    pub(crate) fn downgrade(&self) -> Weak<Mutex<JoystickState>> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn is_same(&self, link: &Weak<Mutex<JoystickState>>) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.inner), link.as_ptr())
    }

    pub(crate) fn upgrade(link: &Weak<Mutex<JoystickState>>) -> Option<Joystick> {
        link.upgrade().map(|inner| Joystick { inner })
    }
}
