/*
 *  lib.rs
 *
 *  LyMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Buffered SSD1306 OLED driver: page framebuffer, drawing primitives and
 *  the I2C command/data framing used to push frames to the panel.
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

//! # SSD1306 framebuffer driver
//!
//! Draw into memory, then push the whole frame with one `show()`:
//!
//! ```
//! use embedded_graphics::pixelcolor::BinaryColor;
//! use lymons_oledfb::display::{Address, MockTransport, Ssd1306Driver, Transport};
//!
//! let mut bus = MockTransport::with_devices(&[0x3C]);
//! let address = bus.scan().next().unwrap_or(Address::SSD1306_PRIMARY);
//!
//! let mut oled = Ssd1306Driver::new(bus, address, 128, 64)?;
//! oled.clear();
//! oled.draw_text("Hello,", 0, 0, BinaryColor::On);
//! oled.draw_text("World!", 0, 10, BinaryColor::On);
//! oled.show()?;
//! # Ok::<(), lymons_oledfb::display::DisplayError>(())
//! ```
//!
//! On Linux hardware use [`display::I2cTransport::open`] with the bus
//! device path (e.g. "/dev/i2c-1") in place of the mock.

pub mod config;
pub mod display;
pub mod draw;
