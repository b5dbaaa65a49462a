/*
 *  display/framebuffer.rs
 *
 *  LyMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  Page organised monochrome framebuffer
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
use std::fmt::Write as _;

use embedded_graphics::geometry::{OriginDimensions, Size};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PointsIter, Rectangle};

use crate::display::error::DisplayError;
use crate::draw;

/// Pixels per controller page
pub const PAGE_HEIGHT: u32 = 8;

/// Largest panel the SSD1306 can address
pub const MAX_WIDTH: u32 = 128;
pub const MAX_HEIGHT: u32 = 64;

/// Panel size in pixels, validated against the controller's page layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelGeometry {
    width: u32,
    height: u32,
}

impl PanelGeometry {
    pub fn new(width: u32, height: u32) -> Result<Self, DisplayError> {
        if width == 0 || width > MAX_WIDTH {
            return Err(DisplayError::InvalidConfiguration(format!(
                "width {} must be in 1..={}",
                width, MAX_WIDTH
            )));
        }
        if height == 0 || height > MAX_HEIGHT || height % PAGE_HEIGHT != 0 {
            return Err(DisplayError::InvalidConfiguration(format!(
                "height {} must be a multiple of {} in {}..={}",
                height, PAGE_HEIGHT, PAGE_HEIGHT, MAX_HEIGHT
            )));
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 { self.width }
    pub fn height(&self) -> u32 { self.height }

    /// Number of 8 pixel tall pages
    pub fn pages(&self) -> u32 {
        self.height / PAGE_HEIGHT
    }

    /// Framebuffer size in bytes
    pub fn buffer_len(&self) -> usize {
        (self.width * self.height / PAGE_HEIGHT) as usize
    }

    /// Byte index and bit mask for an in-bounds pixel
    #[inline]
    fn locate(&self, x: i32, y: i32) -> Option<(usize, u8)> {
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y / PAGE_HEIGHT * self.width + x) as usize;
        Some((index, 1 << (y % PAGE_HEIGHT)))
    }
}

/// Monochrome framebuffer in the controller's native layout.
///
/// `height / 8` pages of `width` bytes each; bit `b` of the byte at
/// (page, column) is pixel (column, page * 8 + b). Allocated zeroed, never
/// reallocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    geometry: PanelGeometry,
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(geometry: PanelGeometry) -> Self {
        Self {
            geometry,
            buf: vec![0; geometry.buffer_len()],
        }
    }

    pub fn geometry(&self) -> PanelGeometry { self.geometry }
    pub fn width(&self) -> u32 { self.geometry.width }
    pub fn height(&self) -> u32 { self.geometry.height }

    /// Immutable raw access, pages in ascending order
    pub fn as_bytes(&self) -> &[u8] { &self.buf }

    /// The `width` bytes of one page
    pub fn page(&self, page: u32) -> &[u8] {
        let w = self.geometry.width as usize;
        let start = page as usize * w;
        &self.buf[start..start + w]
    }

    /// Set every pixel to `color`
    pub fn fill(&mut self, color: BinaryColor) {
        self.buf.fill(if color.is_on() { 0xFF } else { 0x00 });
    }

    /// Set or clear one pixel; out of bounds is a no-op
    #[inline]
    pub fn set_pixel(&mut self, x: i32, y: i32, color: BinaryColor) {
        if let Some((index, mask)) = self.geometry.locate(x, y) {
            match color {
                BinaryColor::On => self.buf[index] |= mask,
                BinaryColor::Off => self.buf[index] &= !mask,
            }
        }
    }

    /// Read one pixel; None when out of bounds
    pub fn get_pixel(&self, x: i32, y: i32) -> Option<BinaryColor> {
        self.geometry
            .locate(x, y)
            .map(|(index, mask)| {
                if self.buf[index] & mask != 0 { BinaryColor::On } else { BinaryColor::Off }
            })
    }

    /// Count of pixels that are on
    pub fn count_on(&self) -> usize {
        self.buf.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Render as a plain PBM (P1) image, 1 = lit pixel
    pub fn to_pbm(&self) -> String {
        let (w, h) = (self.geometry.width as i32, self.geometry.height as i32);
        let mut out = String::with_capacity((w * h * 2) as usize + 16);
        let _ = writeln!(out, "P1");
        let _ = writeln!(out, "{} {}", w, h);
        for y in 0..h {
            for x in 0..w {
                let lit = self.get_pixel(x, y) == Some(BinaryColor::On);
                out.push(if lit { '1' } else { '0' });
                out.push(if x + 1 == w { '\n' } else { ' ' });
            }
        }
        out
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        Size::new(self.geometry.width, self.geometry.height)
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(p, c) in pixels {
            self.set_pixel(p.x, p.y, c);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        // clip first so huge rectangles cost only what is visible
        let visible = draw::clip_rect(
            &self.bounding_box(),
            area.top_left.x.into(),
            area.top_left.y.into(),
            area.size.width.into(),
            area.size.height.into(),
        );
        if let Some(visible) = visible {
            for p in visible.points() {
                self.set_pixel(p.x, p.y, color);
            }
        }
        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(color);
        Ok(())
    }
}
