/*
 *  display/drivers/ssd1306.rs
 *
 *  LyMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  SSD1306 OLED display driver implementation
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

use embedded_graphics::geometry::Size;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::Rectangle;

use log::{debug, info, trace};

use crate::display::bus::{Address, Transport};
use crate::display::error::DisplayError;
use crate::display::framebuffer::{FrameBuffer, PanelGeometry};
use crate::display::traits::DisplayDriver;
use crate::draw;

/// Control byte preceding a single command byte
pub const CONTROL_COMMAND: u8 = 0x80;

/// Control byte preceding a run of display data
pub const CONTROL_DATA: u8 = 0x40;

/// SSD1306 command opcodes
pub mod cmd {
    pub const DISPLAY_OFF: u8 = 0xAE;
    pub const DISPLAY_ON: u8 = 0xAF;
    pub const SET_CLOCK_DIV: u8 = 0xD5;
    pub const SET_MUX_RATIO: u8 = 0xA8;
    pub const SET_DISPLAY_OFFSET: u8 = 0xD3;
    pub const SET_START_LINE: u8 = 0x40;
    pub const SET_MEMORY_MODE: u8 = 0x20;
    pub const CHARGE_PUMP: u8 = 0x8D;
    pub const SEGMENT_REMAP: u8 = 0xA1;
    pub const COM_SCAN_DEC: u8 = 0xC8;
    pub const SET_COM_PINS: u8 = 0xDA;
    pub const SET_CONTRAST: u8 = 0x81;
    pub const SET_PRECHARGE: u8 = 0xD9;
    pub const SET_VCOM_DESELECT: u8 = 0xDB;
    pub const ENTIRE_DISPLAY_RAM: u8 = 0xA4;
    pub const NORMAL_DISPLAY: u8 = 0xA6;
    pub const SET_PAGE_ADDRESS: u8 = 0xB0;
    pub const SET_LOW_COLUMN: u8 = 0x00;
    pub const SET_HIGH_COLUMN: u8 = 0x10;

    /// Argument of SET_MEMORY_MODE selecting page addressing
    pub const PAGE_ADDRESSING: u8 = 0x02;
}

/// Power supply options affecting the init sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ssd1306Options {
    /// Panel is driven from an external VCC rail instead of the
    /// internal charge pump
    pub external_vcc: bool,
}

/// Initialization command bytes for a panel, in transmission order
pub fn init_sequence(geometry: PanelGeometry, options: Ssd1306Options) -> Vec<u8> {
    let (width, height) = (geometry.width(), geometry.height());
    let com_pins = if width > 2 * height { 0x02 } else { 0x12 };
    let (charge_pump, precharge) = if options.external_vcc { (0x10, 0x22) } else { (0x14, 0xF1) };

    vec![
        cmd::DISPLAY_OFF,
        cmd::SET_CLOCK_DIV, 0x80,
        cmd::SET_MUX_RATIO, (height - 1) as u8,
        cmd::SET_DISPLAY_OFFSET, 0x00,
        cmd::SET_START_LINE,
        cmd::SET_MEMORY_MODE, cmd::PAGE_ADDRESSING,
        cmd::CHARGE_PUMP, charge_pump,
        cmd::SEGMENT_REMAP,
        cmd::COM_SCAN_DEC,
        cmd::SET_COM_PINS, com_pins,
        cmd::SET_CONTRAST, 0xFF,
        cmd::SET_PRECHARGE, precharge,
        cmd::SET_VCOM_DESELECT, 0x30,
        cmd::ENTIRE_DISPLAY_RAM,
        cmd::NORMAL_DISPLAY,
        cmd::DISPLAY_ON,
    ]
}

/// SSD1306 driver owning a transport and a page organised framebuffer
///
/// Drawing calls only touch memory; [`show`](Ssd1306Driver::show) is the
/// single point where the framebuffer goes out on the bus.
pub struct Ssd1306Driver<T: Transport> {
    transport: T,
    address: Address,
    options: Ssd1306Options,
    framebuffer: FrameBuffer,

    /// Reused `[CONTROL_DATA, page bytes..]` buffer for flushes
    scratch: Vec<u8>,
}

#[inline]
fn infallible(result: Result<(), Infallible>) {
    if let Err(never) = result {
        match never {}
    }
}

impl<T: Transport> Ssd1306Driver<T> {
    /// Create a new SSD1306 driver and bring the panel up
    ///
    /// # Arguments
    ///
    /// * `transport` - Bus the controller is attached to
    /// * `address` - 7-bit device address (typically 0x3C or 0x3D)
    /// * `width`, `height` - Panel size; height must be a multiple of 8
    ///
    /// # Returns
    ///
    /// A driver with an all-dark framebuffer, or a configuration error when
    /// the geometry is invalid or the controller rejected initialization
    pub fn new(transport: T, address: Address, width: u32, height: u32) -> Result<Self, DisplayError> {
        Self::with_options(transport, address, width, height, Ssd1306Options::default())
    }

    pub fn with_options(
        mut transport: T,
        address: Address,
        width: u32,
        height: u32,
        options: Ssd1306Options,
    ) -> Result<Self, DisplayError> {
        let geometry = PanelGeometry::new(width, height)?;
        info!("Initializing SSD1306 {}x{} at address {}", width, height, address);

        send_init(&mut transport, address, geometry, options)?;

        let driver = Self {
            transport,
            address,
            options,
            framebuffer: FrameBuffer::new(geometry),
            scratch: Vec::with_capacity(width as usize + 1),
        };

        info!("SSD1306 initialized successfully ({}x{})", width, height);
        Ok(driver)
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// Consume the driver, handing the transport back
    pub fn release(self) -> T {
        self.transport
    }

    /// Turn every pixel off
    pub fn clear(&mut self) {
        self.framebuffer.fill(BinaryColor::Off);
    }

    pub fn fill(&mut self, color: BinaryColor) {
        self.framebuffer.fill(color);
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: BinaryColor) {
        self.framebuffer.set_pixel(x, y, color);
    }

    pub fn get_pixel(&self, x: i32, y: i32) -> Option<BinaryColor> {
        self.framebuffer.get_pixel(x, y)
    }

    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, color: BinaryColor) {
        infallible(draw::draw_line(
            &mut self.framebuffer,
            Point::new(x1, y1),
            Point::new(x2, y2),
            color,
        ));
    }

    pub fn hline(&mut self, x: i32, y: i32, w: u32, color: BinaryColor) {
        infallible(draw::draw_hline(&mut self.framebuffer, x, y, w, color));
    }

    pub fn vline(&mut self, x: i32, y: i32, h: u32, color: BinaryColor) {
        infallible(draw::draw_vline(&mut self.framebuffer, x, y, h, color));
    }

    pub fn draw_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: BinaryColor, filled: bool) {
        infallible(draw::draw_rectangle(&mut self.framebuffer, x, y, w, h, color, filled));
    }

    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, color: BinaryColor) {
        infallible(draw::draw_text(&mut self.framebuffer, text, x, y, color));
    }

    /// Send the framebuffer to the controller, page by page in ascending
    /// order. Each page is addressed (page, low column, high column) before
    /// its data block. A failed write aborts the flush and is returned as
    /// is; the framebuffer is never modified here.
    pub fn show(&mut self) -> Result<(), DisplayError> {
        let geometry = self.framebuffer.geometry();
        trace!("flushing {} pages to {}", geometry.pages(), self.address);

        for page in 0..geometry.pages() {
            for command in [
                cmd::SET_PAGE_ADDRESS | page as u8,
                cmd::SET_LOW_COLUMN,
                cmd::SET_HIGH_COLUMN,
            ] {
                self.transport.write(self.address, &[CONTROL_COMMAND, command])?;
            }

            self.scratch.clear();
            self.scratch.push(CONTROL_DATA);
            self.scratch.extend_from_slice(self.framebuffer.page(page));
            self.transport.write(self.address, &self.scratch)?;
        }
        Ok(())
    }
}

fn send_init<T: Transport>(
    transport: &mut T,
    address: Address,
    geometry: PanelGeometry,
    options: Ssd1306Options,
) -> Result<(), DisplayError> {
    for command in init_sequence(geometry, options) {
        transport
            .write(address, &[CONTROL_COMMAND, command])
            .map_err(DisplayError::InitializationFailed)?;
    }
    debug!("init sequence accepted by {}", address);
    Ok(())
}

impl<T: Transport> DisplayDriver for Ssd1306Driver<T> {
    fn geometry(&self) -> PanelGeometry {
        self.framebuffer.geometry()
    }

    fn init(&mut self) -> Result<(), DisplayError> {
        let geometry = self.framebuffer.geometry();
        send_init(&mut self.transport, self.address, geometry, self.options)
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.show()
    }

    fn buffer(&self) -> &[u8] {
        self.framebuffer.as_bytes()
    }
}

// Provide direct DrawTarget access on the driver itself
impl<T: Transport> DrawTarget for Ssd1306Driver<T> {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.framebuffer.draw_iter(pixels)
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuffer.fill_solid(area, color)
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.framebuffer.fill(color);
        Ok(())
    }
}

impl<T: Transport> OriginDimensions for Ssd1306Driver<T> {
    fn size(&self) -> Size {
        self.framebuffer.size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::drivers::mock::MockTransport;
    use crate::display::traits::ColorDepth;
    use embedded_graphics::primitives::{Circle, PrimitiveStyle};
    use proptest::prelude::*;

    const OLED: Address = Address::SSD1306_PRIMARY;

    fn driver(width: u32, height: u32) -> (Ssd1306Driver<MockTransport>, MockTransport) {
        let bus = MockTransport::with_devices(&[OLED.get()]);
        let driver = Ssd1306Driver::new(bus.clone(), OLED, width, height).unwrap();
        bus.state().lock().unwrap().clear_writes();
        (driver, bus)
    }

    #[test]
    fn test_init_sequence_128x64() {
        let geometry = PanelGeometry::new(128, 64).unwrap();
        let seq = init_sequence(geometry, Ssd1306Options::default());

        assert_eq!(seq.first(), Some(&cmd::DISPLAY_OFF));
        assert_eq!(seq.last(), Some(&cmd::DISPLAY_ON));
        assert_eq!(
            seq,
            vec![
                0xAE, 0xD5, 0x80, 0xA8, 0x3F, 0xD3, 0x00, 0x40, 0x20, 0x02, 0x8D, 0x14,
                0xA1, 0xC8, 0xDA, 0x12, 0x81, 0xFF, 0xD9, 0xF1, 0xDB, 0x30, 0xA4, 0xA6, 0xAF,
            ]
        );
    }

    #[test]
    fn test_init_sequence_wide_panel_and_external_vcc() {
        let geometry = PanelGeometry::new(128, 32).unwrap();
        let seq = init_sequence(geometry, Ssd1306Options { external_vcc: true });

        let after = |op: u8| seq[seq.iter().position(|&b| b == op).unwrap() + 1];
        assert_eq!(after(cmd::SET_MUX_RATIO), 31);
        assert_eq!(after(cmd::SET_COM_PINS), 0x02);
        assert_eq!(after(cmd::CHARGE_PUMP), 0x10);
        assert_eq!(after(cmd::SET_PRECHARGE), 0x22);
    }

    #[test]
    fn test_construction_sends_init_as_single_commands() {
        let bus = MockTransport::with_devices(&[OLED.get()]);
        let _driver = Ssd1306Driver::new(bus.clone(), OLED, 128, 64).unwrap();

        let state = bus.state();
        let state = state.lock().unwrap();
        let expected = init_sequence(PanelGeometry::new(128, 64).unwrap(), Ssd1306Options::default());

        assert_eq!(state.writes.len(), expected.len());
        for ((addr, bytes), command) in state.writes.iter().zip(expected) {
            assert_eq!(*addr, OLED);
            assert_eq!(bytes.as_slice(), &[CONTROL_COMMAND, command]);
        }
    }

    #[test]
    fn test_new_driver_is_dark() {
        for (w, h) in [(128, 64), (128, 32), (96, 16), (64, 48), (1, 8)] {
            let (driver, _) = driver(w, h);
            assert_eq!(driver.buffer().len(), (w * h / 8) as usize);
            assert!(driver.buffer().iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_bad_height_is_config_error_without_bus_traffic() {
        let bus = MockTransport::with_devices(&[OLED.get()]);
        let err = Ssd1306Driver::new(bus.clone(), OLED, 128, 63).err().unwrap();

        assert!(err.is_config_error());
        assert!(matches!(err, DisplayError::InvalidConfiguration(_)));
        assert_eq!(bus.state().lock().unwrap().write_attempts, 0);
    }

    #[test]
    fn test_absent_device_fails_initialization() {
        let bus = MockTransport::new();
        let err = Ssd1306Driver::new(bus, OLED, 128, 64).err().unwrap();

        assert!(err.is_config_error());
        assert!(matches!(err, DisplayError::InitializationFailed(_)));
    }

    #[test]
    fn test_init_failure_midway_stops_sequence() {
        let bus = MockTransport::with_devices(&[OLED.get()]);
        bus.state().lock().unwrap().fail_at_write = Some(4);

        let err = Ssd1306Driver::new(bus.clone(), OLED, 128, 64).err().unwrap();

        assert!(matches!(err, DisplayError::InitializationFailed(_)));
        let state = bus.state();
        let state = state.lock().unwrap();
        assert_eq!(state.write_attempts, 5);
        assert_eq!(state.writes.len(), 4);
    }

    #[test]
    fn test_set_pixel_example() {
        let (mut driver, _) = driver(128, 64);
        driver.set_pixel(10, 5, BinaryColor::On);

        for (i, &byte) in driver.buffer().iter().enumerate() {
            if i == 10 {
                assert_eq!(byte, 1 << 5);
            } else {
                assert_eq!(byte, 0, "byte {} should be zero", i);
            }
        }
    }

    #[test]
    fn test_show_on_dark_buffer() {
        let (mut driver, bus) = driver(128, 64);
        driver.show().unwrap();

        let state = bus.state();
        let state = state.lock().unwrap();
        let mut expected = Vec::new();
        for page in 0..8u8 {
            expected.extend_from_slice(&[0xB0 | page, 0x00, 0x10]);
            expected.extend(std::iter::repeat_n(0u8, 128));
        }
        assert_eq!(state.decoded(), expected);
    }

    #[test]
    fn test_show_framing() {
        let (mut driver, bus) = driver(32, 16);
        driver.fill(BinaryColor::On);
        driver.show().unwrap();

        let state = bus.state();
        let state = state.lock().unwrap();
        assert_eq!(state.writes.len(), 2 * 4);
        assert_eq!(state.writes[0].1, vec![0x80, 0xB0]);
        assert_eq!(state.writes[1].1, vec![0x80, 0x00]);
        assert_eq!(state.writes[2].1, vec![0x80, 0x10]);
        assert_eq!(state.writes[3].1.len(), 33);
        assert_eq!(state.writes[3].1[0], 0x40);
        assert!(state.writes[3].1[1..].iter().all(|&b| b == 0xFF));
        assert_eq!(state.writes[4].1, vec![0x80, 0xB1]);
    }

    #[test]
    fn test_show_failure_is_transport_error_and_keeps_buffer() {
        let (mut driver, bus) = driver(128, 64);
        driver.draw_rect(0, 0, 20, 20, BinaryColor::On, true);
        let before = driver.buffer().to_vec();

        {
            let state = bus.state();
            let mut state = state.lock().unwrap();
            state.fail_at_write = Some(state.write_attempts + 6);
        }

        let err = driver.show().unwrap_err();
        assert!(matches!(err, DisplayError::Transport(_)));
        assert!(!err.is_config_error());
        assert_eq!(driver.buffer(), before.as_slice());
        // page 0 went out completely, page 1 failed on its high column command
        assert_eq!(bus.state().lock().unwrap().writes.len(), 6);
    }

    #[test]
    fn test_show_does_not_mutate_buffer() {
        let (mut driver, _) = driver(128, 64);
        driver.draw_text("Hola", 0, 0, BinaryColor::On);
        let before = driver.buffer().to_vec();
        driver.show().unwrap();
        assert_eq!(driver.buffer(), before.as_slice());
    }

    #[test]
    fn test_clear_after_drawing() {
        let (mut driver, _) = driver(128, 64);
        driver.draw_line(0, 0, 127, 63, BinaryColor::On);
        driver.clear();
        assert!(driver.buffer().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_draw_rect_outline_example() {
        let (mut driver, _) = driver(128, 64);
        driver.draw_rect(0, 0, 4, 4, BinaryColor::On, false);
        assert_eq!(driver.framebuffer().count_on(), 12);
        assert_eq!(driver.get_pixel(1, 1), Some(BinaryColor::Off));
    }

    #[test]
    fn test_embedded_graphics_interop() {
        let (mut driver, _) = driver(128, 64);
        Circle::new(Point::new(54, 22), 20)
            .into_styled(PrimitiveStyle::with_stroke(BinaryColor::On, 1))
            .draw(&mut driver)
            .unwrap();
        assert!(driver.framebuffer().count_on() > 0);
        assert_eq!(driver.size(), Size::new(128, 64));
    }

    #[test]
    fn test_reinit_and_release() {
        let (mut driver, bus) = driver(128, 32);
        driver.init().unwrap();
        let expected = init_sequence(driver.geometry(), Ssd1306Options::default());
        assert_eq!(bus.state().lock().unwrap().decoded(), expected);

        assert_eq!(driver.dimensions(), (128, 32));
        let released = driver.release();
        assert_eq!(released.state().lock().unwrap().writes.len(), expected.len());
    }

    #[test]
    fn test_capabilities_follow_geometry() {
        let (driver, _) = driver(128, 32);
        let caps = driver.capabilities();
        assert_eq!(caps.width, 128);
        assert_eq!(caps.height, 32);
        assert_eq!(caps.pages, 4);
        assert_eq!(caps.color_depth, ColorDepth::Monochrome);
        assert_eq!(driver.dimensions(), (caps.width, caps.height));
    }

    #[test]
    fn test_extreme_coordinates_are_noops() {
        let (mut driver, _) = driver(128, 64);
        driver.draw_text("A", 0, i32::MAX, BinaryColor::On);
        driver.draw_text("A", i32::MAX, 0, BinaryColor::On);
        driver.draw_text("A", 0, i32::MIN, BinaryColor::On);
        driver.draw_rect(i32::MAX, i32::MAX, 5, 5, BinaryColor::On, false);
        driver.draw_rect(i32::MIN, i32::MIN, 5, 5, BinaryColor::On, true);
        driver.hline(i32::MAX, 0, 10, BinaryColor::On);
        driver.vline(0, i32::MAX, 10, BinaryColor::On);
        driver.draw_line(i32::MIN, i32::MIN, i32::MIN, i32::MAX, BinaryColor::On);
        assert_eq!(driver.framebuffer().count_on(), 0);
    }

    #[test]
    fn test_huge_sizes_clip_to_panel() {
        let (mut driver, _) = driver(128, 64);
        driver.draw_rect(0, 0, u32::MAX, 4, BinaryColor::On, true);
        assert_eq!(driver.framebuffer().count_on(), 128 * 4);

        driver.clear();
        driver.draw_rect(100, 0, i32::MAX as u32, 4, BinaryColor::On, true);
        assert_eq!(driver.framebuffer().count_on(), 28 * 4);

        driver.clear();
        driver.hline(i32::MIN, 7, u32::MAX, BinaryColor::On);
        driver.vline(i32::MAX, i32::MIN, u32::MAX, BinaryColor::On);
        assert_eq!(driver.framebuffer().count_on(), 0);
        driver.hline(-5, 7, u32::MAX, BinaryColor::On);
        assert_eq!(driver.framebuffer().count_on(), 128);
    }

    proptest! {
        #[test]
        fn prop_pixel_round_trip(x in 0i32..128, y in 0i32..64, lit in any::<bool>()) {
            let (mut driver, _) = driver(128, 64);
            if lit {
                driver.fill(BinaryColor::On);
            }
            let before = driver.buffer().to_vec();
            let original = driver.get_pixel(x, y).unwrap();

            driver.set_pixel(x, y, BinaryColor::On);
            driver.set_pixel(x, y, BinaryColor::Off);
            driver.set_pixel(x, y, original);

            prop_assert_eq!(driver.buffer(), before.as_slice());
        }

        #[test]
        fn prop_out_of_bounds_pixel_is_noop(x in any::<i32>(), y in any::<i32>()) {
            prop_assume!(!(0..128).contains(&x) || !(0..64).contains(&y));
            let (mut driver, _) = driver(128, 64);
            driver.draw_text("x", 3, 3, BinaryColor::On);
            let before = driver.buffer().to_vec();

            driver.set_pixel(x, y, BinaryColor::On);
            prop_assert_eq!(driver.buffer(), before.as_slice());
        }

        #[test]
        fn prop_any_primitive_anywhere_stays_in_bounds(
            x in any::<i32>(),
            y in any::<i32>(),
            w in any::<u32>(),
            h in any::<u32>(),
            filled in any::<bool>(),
        ) {
            let (mut driver, _) = driver(128, 64);
            driver.draw_rect(x, y, w, h, BinaryColor::On, filled);
            driver.hline(x, y, w, BinaryColor::On);
            driver.vline(x, y, h, BinaryColor::On);
            driver.draw_text("Hi!", x, y, BinaryColor::On);
            driver.draw_line(x, y, y, x, BinaryColor::On);
            prop_assert_eq!(driver.buffer().len(), 1024);
        }
    }
}
