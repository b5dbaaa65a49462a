/*
 *  display/bus.rs
 *
 *  LyMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Addressed byte bus abstraction and device discovery
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

use std::fmt;
use std::iter::FusedIterator;

use embedded_hal::i2c::{Error as _, I2c};
use linux_embedded_hal::I2cdev;
use log::{debug, info};

use crate::display::error::{DisplayError, TransportError};

/// 7-bit bus address of a device (0x00..=0x7F)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u8);

impl Address {
    /// Highest valid 7-bit address
    pub const MAX: u8 = 0x7F;

    /// Usual SSD1306 address (SA0 low)
    pub const SSD1306_PRIMARY: Address = Address(0x3C);

    /// Alternate SSD1306 address (SA0 high)
    pub const SSD1306_SECONDARY: Address = Address(0x3D);

    pub fn new(raw: u8) -> Result<Self, DisplayError> {
        if raw > Self::MAX {
            return Err(DisplayError::InvalidConfiguration(format!(
                "I2C address 0x{:02X} is outside the 7-bit range",
                raw
            )));
        }
        Ok(Address(raw))
    }

    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Address {
    type Error = DisplayError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Address::new(raw)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02X}", self.0)
    }
}

/// Byte oriented, addressed bus used to reach the display controller
///
/// Implementations own whatever blocking or timeout behaviour the bus has;
/// the driver never retries a failed write.
pub trait Transport {
    /// Write `bytes` to the device at `address` as one transaction
    fn write(&mut self, address: Address, bytes: &[u8]) -> Result<(), TransportError>;

    /// Returns true when a device acknowledges `address`
    fn probe(&mut self, address: Address) -> bool;

    /// Enumerate responding devices in ascending address order.
    ///
    /// The returned iterator probes lazily, one address per `next()` call.
    /// Calling `scan()` again starts a fresh pass. An empty result is a
    /// normal outcome, not an error.
    fn scan(&mut self) -> Scan<'_, Self>
    where
        Self: Sized,
    {
        Scan::new(self)
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write(&mut self, address: Address, bytes: &[u8]) -> Result<(), TransportError> {
        (**self).write(address, bytes)
    }

    fn probe(&mut self, address: Address) -> bool {
        (**self).probe(address)
    }
}

/// Lazy address scan over a transport
///
/// Covers 0x08..=0x77; the addresses below and above are reserved by the
/// I2C specification and are never probed.
pub struct Scan<'a, T: Transport> {
    transport: &'a mut T,
    next: u8,
}

impl<'a, T: Transport> Scan<'a, T> {
    pub const FIRST: u8 = 0x08;
    pub const LAST: u8 = 0x77;

    fn new(transport: &'a mut T) -> Self {
        Self { transport, next: Self::FIRST }
    }
}

impl<T: Transport> Iterator for Scan<'_, T> {
    type Item = Address;

    fn next(&mut self) -> Option<Address> {
        while self.next <= Self::LAST {
            let candidate = Address(self.next);
            self.next += 1;
            if self.transport.probe(candidate) {
                debug!("device acknowledged at {}", candidate);
                return Some(candidate);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (Self::LAST + 1).saturating_sub(self.next) as usize;
        (0, Some(remaining))
    }
}

impl<T: Transport> FusedIterator for Scan<'_, T> {}

/// [`Transport`] over any embedded-hal 1.0 I2C bus
pub struct I2cTransport<I> {
    i2c: I,
}

impl<I: I2c> I2cTransport<I> {
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Give the bus back to the caller
    pub fn release(self) -> I {
        self.i2c
    }
}

impl I2cTransport<I2cdev> {
    /// Open a Linux I2C character device, e.g. "/dev/i2c-1"
    pub fn open(path: &str) -> Result<Self, DisplayError> {
        let i2c = I2cdev::new(path).map_err(|e| {
            DisplayError::InvalidConfiguration(format!("Failed to open {}: {}", path, e))
        })?;
        info!("Opened I2C bus {}", path);
        Ok(Self::new(i2c))
    }
}

impl<I: I2c> Transport for I2cTransport<I> {
    fn write(&mut self, address: Address, bytes: &[u8]) -> Result<(), TransportError> {
        self.i2c
            .write(address.get(), bytes)
            .map_err(|e| TransportError::new(address, format!("{:?}", e.kind())))
    }

    fn probe(&mut self, address: Address) -> bool {
        // zero length write, only the address phase is acknowledged
        self.i2c.write(address.get(), &[]).is_ok()
    }
}
