/*
 *  display/mod.rs
 *
 *  LyMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display subsystem - buffered SSD1306 driver over an addressed bus
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

// Core trait definitions
pub mod traits;
pub mod error;
pub mod bus;
pub mod framebuffer;

// Display drivers
pub mod drivers;

// Show-after-every-draw wrapper
pub mod immediate;

// Re-exports for convenience
pub use traits::{ColorDepth, DisplayCapabilities, DisplayDriver};
pub use error::{DisplayError, TransportError};
pub use bus::{Address, I2cTransport, Scan, Transport};
pub use framebuffer::{FrameBuffer, PanelGeometry};
pub use drivers::mock::MockTransport;
pub use drivers::ssd1306::{Ssd1306Driver, Ssd1306Options};
pub use immediate::ImmediateDisplay;
