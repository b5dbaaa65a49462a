/*
 *  main.rs
 *
 *  LyMonS - worth the squeeze
 *  (c) 2020-26 Stuart Hunter
 *
 *  SSD1306 demo: find the panel on the bus, then walk through text,
 *  shapes and a pixel sweep.
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

use std::{fs, thread, time::Duration};

use anyhow::{bail, Context};
use clap::Parser;
use embedded_graphics::pixelcolor::BinaryColor;
use env_logger::Env;
use log::{error, info};

use lymons_oledfb::config::{self, BusConfig, Cli, DisplayConfig};
use lymons_oledfb::display::{
    Address, DisplayDriver, I2cTransport, ImmediateDisplay, MockTransport, Ssd1306Driver,
    Ssd1306Options, Transport,
};

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

struct Pacer {
    fast: bool,
}

impl Pacer {
    fn pause(&self, millis: u64) {
        if !self.fast {
            thread::sleep(Duration::from_millis(millis));
        }
    }
}

/// Pick the panel address: configured one, else the first device that
/// answers the scan. An empty bus is reported here, the driver never sees it.
fn resolve_address<T: Transport>(transport: &mut T, configured: Option<u8>) -> anyhow::Result<Address> {
    if let Some(raw) = configured {
        return Ok(Address::new(raw)?);
    }
    match transport.scan().next() {
        Some(address) => {
            info!("I2C device found at {}", address);
            Ok(address)
        }
        None => bail!("No I2C devices found. Check the wiring."),
    }
}

fn run_demo<T: Transport>(
    mut transport: T,
    display_cfg: &DisplayConfig,
    configured_address: Option<u8>,
    cli: &Cli,
) -> anyhow::Result<()> {
    let address = resolve_address(&mut transport, configured_address)?;
    let (width, height) = (display_cfg.width_or_default(), display_cfg.height_or_default());
    let options = Ssd1306Options {
        external_vcc: display_cfg.external_vcc.unwrap_or(false),
    };

    let driver = Ssd1306Driver::with_options(transport, address, width, height, options)
        .with_context(|| format!("bringing up SSD1306 at {}", address))?;
    let mut oled = ImmediateDisplay::new(driver);
    let pacer = Pacer { fast: cli.fast };
    let on = BinaryColor::On;

    oled.clear()?;
    pacer.pause(1000);

    info!("Writing text...");
    oled.write_text("Hola ESP32!", 0, 0, on)?;
    oled.write_text("MicroPython", 0, 10, on)?;
    oled.write_text("OLED I2C", 0, 20, on)?;
    pacer.pause(2000);

    info!("Drawing shapes...");
    oled.clear()?;
    oled.draw_line(0, 0, width as i32 - 1, height as i32 - 1, on)?;
    oled.draw_rectangle(10, 30, 50, 20, on, false)?;
    oled.draw_rectangle(70, 40, 30, 15, on, true)?;
    pacer.pause(3000);

    info!("Pixel by pixel...");
    oled.clear()?;
    for i in 0..width as i32 {
        oled.draw_pixel(i, i % height as i32, on)?;
        pacer.pause(10);
    }
    pacer.pause(2000);

    oled.clear()?;
    oled.write_text("Demo Completa!", 0, 0, on)?;
    info!("Demo complete.");

    if let Some(path) = cli.pbm.as_ref() {
        let driver = oled.into_inner();
        fs::write(path, driver.framebuffer().to_pbm())
            .with_context(|| format!("writing {}", path.display()))?;
        info!("Final frame ({}x{}) saved to {}", driver.dimensions().0, driver.dimensions().1, path.display());
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        print!("{}", serde_yaml::to_string(&cfg)?);
        return Ok(());
    }

    let level = cfg.log_level.clone().unwrap_or_else(|| "info".to_string());
    env_logger::Builder::from_env(Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();

    info!("This {} worth the Squeeze", env!("CARGO_PKG_NAME"));
    info!("v.{} built {} ({})", env!("CARGO_PKG_VERSION"), BUILD_DATE, BUILD_PROFILE);

    let display_cfg = cfg.display.clone().unwrap_or_default();
    let bus = display_cfg.bus_or_default();
    let result = match &bus {
        BusConfig::I2c { bus: path, address } => {
            let transport = I2cTransport::open(path)?;
            run_demo(transport, &display_cfg, *address, &cli)
        }
        BusConfig::Mock { address } => {
            let simulated = address.unwrap_or(Address::SSD1306_PRIMARY.get());
            info!("Headless mode, simulated panel at 0x{:02X}", simulated);
            run_demo(MockTransport::with_devices(&[simulated]), &display_cfg, *address, &cli)
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}
