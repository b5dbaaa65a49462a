/*
 *  display/drivers/mock.rs
 *
 *  LyMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Mock bus transport for testing without hardware
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::display::bus::{Address, Transport};
use crate::display::drivers::ssd1306::{CONTROL_COMMAND, CONTROL_DATA};
use crate::display::error::TransportError;

/// Mock transport for testing
///
/// Simulates a bus with a configurable set of responding devices. Writes to
/// a responding device are recorded; writes to anything else are refused
/// the way a real bus NACKs. Clones share state, so a test can hand one
/// clone to a driver and inspect the traffic through another.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockTransportState>>,
}

/// Internal state for the mock transport (shared for inspection in tests)
#[derive(Debug, Default)]
pub struct MockTransportState {
    /// Addresses that acknowledge probes and writes
    pub devices: BTreeSet<u8>,

    /// Every accepted write, in order
    pub writes: Vec<(Address, Vec<u8>)>,

    /// Number of write calls, accepted or not
    pub write_attempts: usize,

    /// Number of probe calls
    pub probe_count: usize,

    /// Refuse the write with this zero based attempt index
    pub fail_at_write: Option<usize>,

    /// Refuse every write
    pub simulate_write_failure: bool,
}

impl MockTransportState {
    /// Forget recorded traffic (useful between phases of a test)
    pub fn clear_writes(&mut self) {
        self.writes.clear();
        self.write_attempts = 0;
    }

    /// The recorded stream with SSD1306 control bytes removed: command
    /// bytes and data bytes, in the order they were sent
    pub fn decoded(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for (_, bytes) in &self.writes {
            match bytes.first() {
                Some(&CONTROL_COMMAND) => {
                    out.extend(bytes.chunks(2).filter_map(|pair| pair.get(1)));
                }
                Some(&CONTROL_DATA) => out.extend_from_slice(&bytes[1..]),
                _ => out.extend_from_slice(bytes),
            }
        }
        out
    }
}

impl MockTransport {
    /// An empty bus, nothing answers
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus with devices answering at the given raw addresses
    pub fn with_devices(addresses: &[u8]) -> Self {
        let bus = Self::new();
        bus.lock().devices.extend(addresses.iter().copied());
        bus
    }

    /// Get reference to state for inspection in tests
    pub fn state(&self) -> Arc<Mutex<MockTransportState>> {
        Arc::clone(&self.state)
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MockTransport {
    fn write(&mut self, address: Address, bytes: &[u8]) -> Result<(), TransportError> {
        let mut state = self.lock();
        let attempt = state.write_attempts;
        state.write_attempts += 1;

        if state.simulate_write_failure || state.fail_at_write == Some(attempt) {
            return Err(TransportError::new(address, "simulated write failure"));
        }
        if !state.devices.contains(&address.get()) {
            return Err(TransportError::new(address, "no acknowledge"));
        }

        state.writes.push((address, bytes.to_vec()));
        Ok(())
    }

    fn probe(&mut self, address: Address) -> bool {
        let mut state = self.lock();
        state.probe_count += 1;
        state.devices.contains(&address.get())
    }
}
