use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::Error;
use crate::errors::HardwareError::InvalidHandle;
use crate::hardware::ActuatorBackend;

/// Mock [`ActuatorBackend`] for testing purposes.
///
/// Clones share the same recorded state: keep one to inspect what the servo wrote.
#[derive(Clone, Debug)]
pub struct MockBackend {
    name: String,
    state: Arc<Mutex<MockBackendState>>,
}

#[derive(Debug)]
struct MockBackendState {
    present: bool,
    fail_attach: bool,
    attached: bool,
    writes: Vec<u16>,
}

impl MockBackend {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockBackendState {
                present: true,
                fail_attach: false,
                attached: false,
                writes: vec![],
            })),
        }
    }

    /// Sets whether the probe finds the output.
    pub fn set_present(self, present: bool) -> Self {
        self.state.lock().present = present;
        self
    }

    /// Sets whether attaching fails with an `InvalidHandle` error.
    pub fn set_attach_failure(self, fail_attach: bool) -> Self {
        self.state.lock().fail_attach = fail_attach;
        self
    }

    /// Returns every pulse written so far (the attach pulse included).
    pub fn get_writes(&self) -> Vec<u16> {
        self.state.lock().writes.clone()
    }

    /// Returns the last pulse written.
    pub fn get_last_pulse(&self) -> Option<u16> {
        self.state.lock().writes.last().copied()
    }

    /// Forgets the recorded writes.
    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    pub fn is_attached(&self) -> bool {
        self.state.lock().attached
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new("mock")
    }
}

impl ActuatorBackend for MockBackend {
    fn get_name(&self) -> String {
        self.name.clone()
    }

    fn probe(&mut self) -> bool {
        self.state.lock().present
    }

    fn attach(&mut self, pulse: u16) -> Result<(), Error> {
        let mut state = self.state.lock();
        if state.fail_attach {
            return Err(InvalidHandle {
                device: self.name.clone(),
                channel: 0,
            }
            .into());
        }
        state.attached = true;
        state.writes.push(pulse);
        Ok(())
    }

    fn write_pulse(&mut self, pulse: u16) {
        self.state.lock().writes.push(pulse);
    }

    fn detach(&mut self) {
        self.state.lock().attached = false;
    }
}
