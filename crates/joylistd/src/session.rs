use std::time::Duration;

use ahash::AHashMap;
use colored::Colorize;

use joylist_registry::{
    ChannelSink, DeviceEvent, EventReceiver, InstanceId, Joystick, Registry,
};

use crate::config::Config;
use crate::inventory::{Clock, FixedMotion, VirtualPlatform};
use crate::script::{InputAction, InputStep, Script};
use crate::{print_debug, print_error, print_info, print_warning};

/// A running registry together with the handles the daemon opened.
///
/// Every connected device is opened once an `Added` event is drained and
/// closed when its `Removed` event arrives.
pub struct Session {
    registry: Registry,
    events: EventReceiver,
    handles: AHashMap<InstanceId, Joystick>,
    script: Script,
    clock: Clock,
    horizon: Duration,
}

impl Session {
    pub fn new(config: Config, clock: Clock) -> Self {
        let (sink, events) = ChannelSink::new();
        let horizon = config.horizon() + config.registry.discovery_interval;
        let registry = Registry::new(config.registry)
            .with_sink(sink)
            .with_enumerator(VirtualPlatform::new(config.devices, clock.clone()))
            .with_motion_sensor(FixedMotion(config.motion));
        Self {
            registry,
            events,
            handles: AHashMap::new(),
            script: Script::new(config.script),
            clock,
            horizon,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Handle opened for the device with the given instance id.
    pub fn joystick(&self, instance_id: InstanceId) -> Option<&Joystick> {
        self.handles.get(&instance_id)
    }

    pub fn open_count(&self) -> usize {
        self.handles.len()
    }

    /// Initializes the registry and opens everything it found.
    pub fn start(&mut self) -> usize {
        let count = self.registry.init();
        self.drain_events();
        count
    }

    /// One iteration of the polling loop.
    pub fn tick(&mut self) {
        self.registry.discover();
        self.drain_events();

        let elapsed = (self.clock)();
        for step in self.script.due(elapsed) {
            apply_step(&mut self.registry, &self.handles, step);
        }

        self.registry.update_motion_sensors();
        self.drain_events();
    }

    /// Whether the inventory and the script can no longer change anything.
    pub fn is_done(&self) -> bool {
        self.script.is_finished() && (self.clock)() > self.horizon
    }

    /// Closes every handle and empties the registry.
    pub fn shutdown(&mut self) {
        for (_, joystick) in self.handles.drain() {
            self.registry.close(&joystick);
        }
        self.registry.reset();
        // Removal events are not posted on reset, nothing left to drain.
        print_info!("registry shut down");
    }

    fn drain_events(&mut self) {
        let mut added = false;
        while let Ok(event) = self.events.try_recv() {
            match event {
                DeviceEvent::Added { .. } => added = true,
                DeviceEvent::Removed { instance_id } => self.on_removed(instance_id),
            }
        }
        // Indices in drained `Added` events may be stale after removals in
        // the same pass, so open by scanning the live list instead.
        if added {
            self.open_new_devices();
        }
    }

    fn open_new_devices(&mut self) {
        let pending: Vec<usize> = self
            .registry
            .devices()
            .iter()
            .enumerate()
            .filter(|(_, record)| !record.is_open())
            .map(|(index, _)| index)
            .collect();
        for index in pending {
            self.open_at(index);
        }
    }

    fn open_at(&mut self, index: usize) {
        let joystick = Joystick::new();
        if let Err(e) = self.registry.open(index, &joystick) {
            print_error!("failed to open device at index {index}: {e}");
            return;
        }
        let Some(record) = self.registry.device_at(index) else {
            return;
        };
        let caps = record.capabilities();
        print_info!(
            "connected - {0} index={1} instance={2} device_id={3} \
             buttons={4} axes={5} hats={6} balls={7}",
            record.name(),
            index,
            record.instance_id(),
            record.device_id(),
            caps.buttons,
            caps.axes,
            caps.hats,
            caps.balls
        );
        self.handles.insert(record.instance_id(), joystick);
    }

    fn on_removed(&mut self, instance_id: InstanceId) {
        match self.handles.remove(&instance_id) {
            Some(joystick) => {
                self.registry.close(&joystick);
                print_info!(
                    "disconnected - instance={instance_id} pressed={:?}",
                    joystick.pressed_buttons()
                );
            }
            None => {
                print_debug!("disconnected - instance={instance_id} (never opened)");
            }
        }
    }
}

fn apply_step(registry: &mut Registry, handles: &AHashMap<InstanceId, Joystick>, step: &InputStep) {
    let device_id = step.device_id;
    let handle = registry
        .devices()
        .find(device_id)
        .and_then(|r| handles.get(&r.instance_id()))
        .cloned();
    match step.action {
        InputAction::Key { keycode, pressed } => {
            match registry.dispatch_button(device_id, keycode, pressed) {
                Some(button) => {
                    let state = if pressed { "down" } else { "up" };
                    match handle {
                        Some(js) => {
                            print_info!(
                                "button {button} {state} - device_id={device_id} pressed={:?}",
                                js.pressed_buttons()
                            );
                        }
                        None => {
                            print_debug!(
                                "button {button} {state} dropped - device_id={device_id} not open"
                            );
                        }
                    }
                }
                None => {
                    print_warning!("unmapped keycode {keycode} - device_id={device_id}");
                }
            }
        }
        InputAction::Axis { axis, value } => {
            if registry.dispatch_axis(device_id, axis, value) {
                let raw = handle.and_then(|js| js.axis(axis));
                print_debug!("axis {axis} = {value} ({raw:?}) - device_id={device_id}");
            } else {
                print_debug!("axis {axis} dropped - device_id={device_id} not open");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use joylist_registry::keycode::{KEYCODE_BUTTON_1, KEYCODE_BUTTON_A};
    use joylist_registry::{RegistryConfig, ACCELEROMETER_DEVICE_ID};

    use super::*;
    use crate::inventory::VirtualDevice;

    fn config(accelerometer: bool) -> Config {
        Config {
            registry: RegistryConfig {
                discovery_interval: Duration::ZERO,
                accelerometer_as_joystick: accelerometer,
            },
            tick: Duration::from_millis(10),
            motion: [0.0, 0.0, 1.0],
            devices: vec![VirtualDevice {
                id: 7,
                name: "Gamepad".into(),
                buttons: -1,
                axes: 4,
                hats: 1,
                balls: 0,
                connect_at: Duration::ZERO,
                disconnect_at: Some(Duration::from_millis(500)),
            }],
            script: vec![
                InputStep {
                    at: Duration::from_millis(100),
                    device_id: 7,
                    action: InputAction::Key {
                        keycode: KEYCODE_BUTTON_A,
                        pressed: true,
                    },
                },
                InputStep {
                    at: Duration::from_millis(100),
                    device_id: 7,
                    action: InputAction::Key {
                        keycode: KEYCODE_BUTTON_1,
                        pressed: true,
                    },
                },
                InputStep {
                    at: Duration::from_millis(200),
                    device_id: 7,
                    action: InputAction::Axis {
                        axis: 2,
                        value: -1.0,
                    },
                },
            ],
        }
    }

    fn session(accelerometer: bool) -> (Session, Rc<Cell<Duration>>) {
        let now = Rc::new(Cell::new(Duration::ZERO));
        let time = now.clone();
        let clock: Clock = Rc::new(move || time.get());
        (Session::new(config(accelerometer), clock), now)
    }

    #[test]
    fn start_opens_discovered_devices() {
        let (mut session, _now) = session(true);
        assert_eq!(session.start(), 2);
        assert_eq!(session.open_count(), 2);
        let pad = session.joystick(0).unwrap();
        assert_eq!(pad.device_id(), Some(7));
        let accel = session.joystick(1).unwrap();
        assert_eq!(accel.device_id(), Some(ACCELEROMETER_DEVICE_ID));
    }

    #[test]
    fn tick_replays_script_into_handles() {
        let (mut session, now) = session(false);
        session.start();

        now.set(Duration::from_millis(100));
        session.tick();
        let pad = session.joystick(0).unwrap();
        assert_eq!(pad.pressed_buttons(), vec![5, 20]);

        now.set(Duration::from_millis(200));
        session.tick();
        assert_eq!(session.joystick(0).unwrap().axis(2), Some(-32767));
    }

    #[test]
    fn tick_feeds_motion_sensor() {
        let (mut session, _now) = session(true);
        session.start();
        session.tick();
        let accel = session.joystick(1).unwrap();
        assert_eq!(accel.axis(2), Some(32767));
    }

    #[test]
    fn disconnect_closes_handle() {
        let (mut session, now) = session(false);
        session.start();
        let pad = session.joystick(0).cloned().unwrap();

        now.set(Duration::from_millis(500));
        session.tick();
        assert_eq!(session.open_count(), 0);
        assert!(pad.is_closed());
        assert!(session.registry().is_empty());
    }

    #[test]
    fn is_done_after_horizon() {
        let (mut session, now) = session(false);
        session.start();
        assert!(!session.is_done());

        now.set(Duration::from_millis(501));
        session.tick();
        assert!(session.is_done());
    }

    fn device(id: i32, connect_ms: u64, disconnect_ms: Option<u64>) -> VirtualDevice {
        VirtualDevice {
            id,
            name: format!("Pad {id}"),
            buttons: -1,
            axes: 2,
            hats: 0,
            balls: 0,
            connect_at: Duration::from_millis(connect_ms),
            disconnect_at: disconnect_ms.map(Duration::from_millis),
        }
    }

    #[test]
    fn same_pass_add_and_remove_opens_survivor() {
        let mut config = config(false);
        // Device 2 connects in the same pass that drops device 1, which
        // shifts device 2 down to index 0.
        config.devices = vec![device(2, 100, None), device(1, 0, Some(100))];
        config.script = vec![InputStep {
            at: Duration::from_millis(100),
            device_id: 2,
            action: InputAction::Key {
                keycode: KEYCODE_BUTTON_A,
                pressed: true,
            },
        }];
        let now = Rc::new(Cell::new(Duration::ZERO));
        let time = now.clone();
        let mut session = Session::new(config, Rc::new(move || time.get()));
        session.start();
        assert_eq!(session.open_count(), 1);

        now.set(Duration::from_millis(100));
        session.tick();
        let live: Vec<_> = session
            .registry()
            .devices()
            .iter()
            .map(|r| (r.device_id(), r.is_open()))
            .collect();
        assert_eq!(live, vec![(2, true)]);
        assert_eq!(session.open_count(), 1);
        let late = session.joystick(1).unwrap();
        assert_eq!(late.device_id(), Some(2));
        assert_eq!(late.pressed_buttons(), vec![5]);
    }

    #[test]
    fn shutdown_releases_everything() {
        let (mut session, _now) = session(true);
        session.start();
        let pad = session.joystick(0).cloned().unwrap();
        session.shutdown();
        assert_eq!(session.open_count(), 0);
        assert!(session.registry().is_empty());
        assert!(!pad.is_attached());
    }
}
