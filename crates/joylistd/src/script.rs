use std::time::Duration;

use joylist_registry::DeviceId;

/// Platform input replayed by the daemon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputAction {
    Key { keycode: i32, pressed: bool },
    Axis { axis: usize, value: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputStep {
    pub at: Duration,
    pub device_id: DeviceId,
    pub action: InputAction,
}

/// Time-ordered queue of input steps.
#[derive(Debug, Default)]
pub struct Script {
    steps: Vec<InputStep>,
    next: usize,
}

impl Script {
    pub fn new(mut steps: Vec<InputStep>) -> Self {
        // Stable, so steps sharing a timestamp keep their declared order.
        steps.sort_by_key(|s| s.at);
        Self { steps, next: 0 }
    }

    /// Steps that became due since the previous call.
    pub fn due(&mut self, elapsed: Duration) -> &[InputStep] {
        let start = self.next;
        while self.next < self.steps.len() && self.steps[self.next].at <= elapsed {
            self.next += 1;
        }
        &self.steps[start..self.next]
    }

    pub fn is_finished(&self) -> bool {
        self.next >= self.steps.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(at_ms: u64, keycode: i32) -> InputStep {
        InputStep {
            at: Duration::from_millis(at_ms),
            device_id: 1,
            action: InputAction::Key {
                keycode,
                pressed: true,
            },
        }
    }

    #[test]
    fn due_returns_each_step_once() {
        let mut script = Script::new(vec![key(10, 1), key(20, 2), key(30, 3)]);
        assert!(script.due(Duration::from_millis(5)).is_empty());
        assert_eq!(script.due(Duration::from_millis(20)), &[key(10, 1), key(20, 2)]);
        assert!(script.due(Duration::from_millis(20)).is_empty());
        assert!(!script.is_finished());
        assert_eq!(script.due(Duration::from_secs(1)), &[key(30, 3)]);
        assert!(script.is_finished());
    }

    #[test]
    fn steps_are_sorted_stably() {
        let mut script = Script::new(vec![key(20, 1), key(10, 2), key(20, 3)]);
        let due = script.due(Duration::from_millis(20));
        let codes: Vec<_> = due
            .iter()
            .map(|s| match s.action {
                InputAction::Key { keycode, .. } => keycode,
                InputAction::Axis { .. } => -1,
            })
            .collect();
        assert_eq!(codes, vec![2, 1, 3]);
    }

    #[test]
    fn empty_script_is_finished() {
        assert!(Script::default().is_finished());
    }
}
