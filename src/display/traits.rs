/*
 *  display/traits.rs
 *
 *  LyMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Core trait definitions for display driver abstraction
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

use crate::display::error::DisplayError;
use crate::display::framebuffer::PanelGeometry;

/// Pixel format the controller stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    /// 1 bit per pixel, 8 vertical pixels per byte
    Monochrome,
}

/// Display capabilities and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCapabilities {
    /// Display width in pixels
    pub width: u32,

    /// Display height in pixels
    pub height: u32,

    /// Number of 8 pixel tall pages
    pub pages: u32,

    pub color_depth: ColorDepth,
}

impl From<PanelGeometry> for DisplayCapabilities {
    fn from(geometry: PanelGeometry) -> Self {
        Self {
            width: geometry.width(),
            height: geometry.height(),
            pages: geometry.pages(),
            color_depth: ColorDepth::Monochrome,
        }
    }
}

/// Minimal hardware abstraction for buffered displays
///
/// Drawing happens in memory; nothing reaches the panel until
/// [`flush`](DisplayDriver::flush) is called.
pub trait DisplayDriver {
    /// Panel geometry fixed at construction
    fn geometry(&self) -> PanelGeometry;

    /// Size and pixel format of the attached panel
    fn capabilities(&self) -> DisplayCapabilities {
        DisplayCapabilities::from(self.geometry())
    }

    /// Returns the display dimensions as (width, height)
    fn dimensions(&self) -> (u32, u32) {
        let caps = self.capabilities();
        (caps.width, caps.height)
    }

    /// Re-send the controller initialization sequence.
    ///
    /// Construction already does this once; call again only after the
    /// panel lost power or was reset behind the driver's back.
    fn init(&mut self) -> Result<(), DisplayError>;

    /// Transfer the whole framebuffer to the controller
    fn flush(&mut self) -> Result<(), DisplayError>;

    /// The packed framebuffer, in controller page order
    fn buffer(&self) -> &[u8];
}
