/*
 *  display/immediate.rs
 *
 *  LyMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Auto-flushing convenience wrapper
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

use core::convert::Infallible;

use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;

use crate::display::error::DisplayError;
use crate::display::traits::DisplayDriver;
use crate::draw;

/// Wraps a buffered driver so that every primitive is followed by a flush.
///
/// Handy for demos and step-by-step animations where each call should be
/// visible at once. Batching draws on the bare driver and flushing once is
/// far cheaper on the bus.
pub struct ImmediateDisplay<D> {
    inner: D,
}

impl<D> ImmediateDisplay<D>
where
    D: DisplayDriver + DrawTarget<Color = BinaryColor, Error = Infallible>,
{
    pub fn new(inner: D) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }

    /// Access the driver for batched drawing; nothing is flushed
    pub fn inner_mut(&mut self) -> &mut D {
        &mut self.inner
    }

    pub fn into_inner(self) -> D {
        self.inner
    }

    fn flushed(&mut self, drawn: Result<(), Infallible>) -> Result<(), DisplayError> {
        if let Err(never) = drawn {
            match never {}
        }
        self.inner.flush()
    }

    /// Blank the panel
    pub fn clear(&mut self) -> Result<(), DisplayError> {
        self.fill(BinaryColor::Off)
    }

    pub fn fill(&mut self, color: BinaryColor) -> Result<(), DisplayError> {
        let drawn = DrawTarget::clear(&mut self.inner, color);
        self.flushed(drawn)
    }

    pub fn write_text(&mut self, text: &str, x: i32, y: i32, color: BinaryColor) -> Result<(), DisplayError> {
        let drawn = draw::draw_text(&mut self.inner, text, x, y, color);
        self.flushed(drawn)
    }

    pub fn draw_pixel(&mut self, x: i32, y: i32, color: BinaryColor) -> Result<(), DisplayError> {
        let drawn = draw::draw_pixel(&mut self.inner, x, y, color);
        self.flushed(drawn)
    }

    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: BinaryColor) -> Result<(), DisplayError> {
        let drawn = draw::draw_line(&mut self.inner, Point::new(x1, y1), Point::new(x2, y2), color);
        self.flushed(drawn)
    }

    pub fn draw_rectangle(
        &mut self,
        x: i32,
        y: i32,
        w: u32,
        h: u32,
        color: BinaryColor,
        filled: bool,
    ) -> Result<(), DisplayError> {
        let drawn = draw::draw_rectangle(&mut self.inner, x, y, w, h, color, filled);
        self.flushed(drawn)
    }
}
