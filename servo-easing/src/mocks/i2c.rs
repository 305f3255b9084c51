use std::collections::HashMap;
use std::sync::Arc;

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};
use parking_lot::Mutex;

/// Mock I2C bus for testing purposes.
///
/// Write-only transactions are recorded as `(address, bytes)`; a two bytes write also stores the
/// value in a register map that reads return. Clones share the same bus.
#[derive(Clone, Debug, Default)]
pub struct MockI2c {
    state: Arc<Mutex<MockI2cState>>,
}

#[derive(Debug, Default)]
struct MockI2cState {
    absent: bool,
    registers: HashMap<u8, u8>,
    writes: Vec<(u8, Vec<u8>)>,
}

impl MockI2c {
    /// Sets whether no device answers (every transaction is not acknowledged).
    pub fn set_absent(self, absent: bool) -> Self {
        self.state.lock().absent = absent;
        self
    }

    /// Sets the value read back from a register.
    pub fn set_register(&self, register: u8, value: u8) {
        self.state.lock().registers.insert(register, value);
    }

    /// Returns every write-only transaction so far.
    pub fn get_writes(&self) -> Vec<(u8, Vec<u8>)> {
        self.state.lock().writes.clone()
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.lock();
        if state.absent {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        let reads = operations
            .iter()
            .any(|operation| matches!(operation, Operation::Read(_)));
        let mut pointer = 0u8;
        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    if let Some(register) = bytes.first() {
                        pointer = *register;
                    }
                    if bytes.len() == 2 {
                        state.registers.insert(bytes[0], bytes[1]);
                    }
                    if !reads {
                        state.writes.push((address, bytes.to_vec()));
                    }
                }
                Operation::Read(buffer) => {
                    for (offset, byte) in buffer.iter_mut().enumerate() {
                        let register = pointer.wrapping_add(offset as u8);
                        *byte = state.registers.get(&register).copied().unwrap_or(0);
                    }
                }
            }
        }
        Ok(())
    }
}
