use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

pub const DEFAULT_WIDTH: u32 = 128;
pub const DEFAULT_HEIGHT: u32 = 64;
pub const DEFAULT_I2C_BUS: &str = "/dev/i2c-1";

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    pub display: Option<DisplayConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DisplayConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub external_vcc: Option<bool>,
    pub bus: Option<BusConfig>,     // <- i2c or in-memory
}

impl DisplayConfig {
    pub fn width_or_default(&self) -> u32 {
        self.width.unwrap_or(DEFAULT_WIDTH)
    }

    pub fn height_or_default(&self) -> u32 {
        self.height.unwrap_or(DEFAULT_HEIGHT)
    }

    pub fn bus_or_default(&self) -> BusConfig {
        self.bus.clone().unwrap_or(BusConfig::I2c {
            bus: DEFAULT_I2C_BUS.to_string(),
            address: None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BusConfig {
    I2c {
        bus: String,             // e.g. "/dev/i2c-1"
        address: Option<u8>,     // 7-bit; None = first device the scan finds
    },
    /// In-memory bus with one simulated panel, for running without hardware
    Mock {
        address: Option<u8>,
    },
}

impl BusConfig {
    pub fn address(&self) -> Option<u8> {
        match self {
            BusConfig::I2c { address, .. } | BusConfig::Mock { address } => *address,
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "oled-demo", about = "SSD1306 OLED demo", version)]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// enable debug logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub display_width: Option<u32>,
    #[arg(long)]
    pub display_height: Option<u32>,
    #[arg(long, action = ArgAction::Set)]
    pub external_vcc: Option<bool>,
    /// I2C character device, e.g. /dev/i2c-1
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub i2c_bus: Option<String>,
    /// 7-bit device address, decimal or 0x-prefixed hex (default: scan)
    #[arg(long, value_parser = parse_address)]
    pub address: Option<u8>,
    /// run against an in-memory panel instead of real hardware
    #[arg(long, action = ArgAction::SetTrue)]
    pub headless: bool,
    /// skip the pauses between demo steps
    #[arg(long, action = ArgAction::SetTrue)]
    pub fast: bool,
    /// write the final frame as a PBM image
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub pbm: Option<PathBuf>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Accepts "60", "0x3C" or "0X3c"; rejects anything above 0x7F.
pub fn parse_address(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    }
    .map_err(|e| format!("invalid address '{}': {}", s, e))?;
    if value > 0x7F {
        return Err(format!("address 0x{:02X} is not a 7-bit address", value));
    }
    Ok(value)
}

/// Read YAML, merge, apply CLI overrides, validate.
pub fn load(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    if let Some(home) = home_dir() {
        let p = home.join(".config/lymons/oled.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/lymons-oled.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["oled.yaml", "config/oled.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    parse_yaml(&s)
}

pub fn parse_yaml(s: &str) -> Result<Config, ConfigError> {
    let cfg: Config = serde_yaml::from_str(s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()      { dst.log_level = src.log_level; }
    match (&mut dst.display, src.display) {
        (None, Some(c)) => dst.display = Some(c),
        (Some(d), Some(s)) => merge_display(d, s),
        _ => {}
    }
}

fn merge_display(dst: &mut DisplayConfig, src: DisplayConfig) {
    if src.width.is_some()         { dst.width = src.width; }
    if src.height.is_some()        { dst.height = src.height; }
    if src.external_vcc.is_some()  { dst.external_vcc = src.external_vcc; }
    if src.bus.is_some()           { dst.bus = src.bus; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()       { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                     { cfg.log_level = Some("debug".into()); }

    let any_display = cli.display_width.is_some()
        || cli.display_height.is_some()
        || cli.external_vcc.is_some()
        || cli.i2c_bus.is_some()
        || cli.address.is_some()
        || cli.headless;

    if any_display && cfg.display.is_none() {
        cfg.display = Some(DisplayConfig::default());
    }
    let Some(display) = cfg.display.as_mut() else {
        return;
    };
    if cli.display_width.is_some()   { display.width = cli.display_width; }
    if cli.display_height.is_some()  { display.height = cli.display_height; }
    if cli.external_vcc.is_some()    { display.external_vcc = cli.external_vcc; }

    // headless wins over any configured hardware bus
    let current = display.bus_or_default();
    let address = cli.address.or(current.address());
    display.bus = Some(if cli.headless {
        BusConfig::Mock { address }
    } else {
        match current {
            BusConfig::I2c { bus, .. } => BusConfig::I2c {
                bus: cli.i2c_bus.clone().unwrap_or(bus),
                address,
            },
            BusConfig::Mock { .. } => BusConfig::Mock { address },
        }
    });
}

/// Put any invariants here (required fields, ranges, etc.)
pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(display) = cfg.display.as_ref() {
        let (w, h) = (display.width_or_default(), display.height_or_default());
        if w == 0 || h == 0 {
            return Err(ConfigError::Validation("display width/height must be > 0".into()));
        }
        if h % 8 != 0 {
            return Err(ConfigError::Validation(format!(
                "display height {} must be a multiple of 8", h
            )));
        }
        if let Some(address) = display.bus.as_ref().and_then(BusConfig::address) {
            if address > 0x7F {
                return Err(ConfigError::Validation(format!(
                    "bus address 0x{:02X} is not a 7-bit address", address
                )));
            }
        }
        if let Some(BusConfig::I2c { bus, .. }) = display.bus.as_ref() {
            if bus.is_empty() {
                return Err(ConfigError::Validation("i2c bus path must not be empty".into()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("0x3C"), Ok(0x3C));
        assert_eq!(parse_address("0X3d"), Ok(0x3D));
        assert_eq!(parse_address("60"), Ok(60));
        assert!(parse_address("0x80").is_err());
        assert!(parse_address("oled").is_err());
    }

    #[test]
    fn test_yaml_i2c_bus() {
        let cfg = parse_yaml(
            "log_level: debug\n\
             display:\n  width: 128\n  height: 32\n  bus:\n    type: i2c\n    bus: /dev/i2c-0\n    address: 61\n",
        )
        .unwrap();

        let display = cfg.display.unwrap();
        assert_eq!(display.height_or_default(), 32);
        assert_eq!(
            display.bus,
            Some(BusConfig::I2c { bus: "/dev/i2c-0".into(), address: Some(0x3D) })
        );
    }

    #[test]
    fn test_defaults() {
        let display = DisplayConfig::default();
        assert_eq!((display.width_or_default(), display.height_or_default()), (128, 64));
        assert_eq!(
            display.bus_or_default(),
            BusConfig::I2c { bus: DEFAULT_I2C_BUS.into(), address: None }
        );
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut base = parse_yaml("display:\n  width: 96\n  height: 16\n").unwrap();
        merge(&mut base, parse_yaml("display:\n  height: 32\n").unwrap());

        let display = base.display.unwrap();
        assert_eq!(display.width, Some(96));
        assert_eq!(display.height, Some(32));
    }

    #[test]
    fn test_cli_overrides_yaml() {
        let mut cfg = parse_yaml(
            "display:\n  bus:\n    type: i2c\n    bus: /dev/i2c-3\n",
        )
        .unwrap();
        let cli = Cli { address: Some(0x3D), display_height: Some(32), ..Default::default() };
        apply_cli_overrides(&mut cfg, &cli);

        let display = cfg.display.unwrap();
        assert_eq!(display.height, Some(32));
        assert_eq!(
            display.bus,
            Some(BusConfig::I2c { bus: "/dev/i2c-3".into(), address: Some(0x3D) })
        );
    }

    #[test]
    fn test_headless_switches_to_mock_bus() {
        let mut cfg = Config::default();
        let cli = Cli { headless: true, debug: true, ..Default::default() };
        apply_cli_overrides(&mut cfg, &cli);

        assert_eq!(cfg.log_level.as_deref(), Some("debug"));
        assert_eq!(cfg.display.unwrap().bus, Some(BusConfig::Mock { address: None }));
    }

    #[test]
    fn test_validate_rejects_partial_page() {
        let cfg = parse_yaml("display:\n  height: 63\n").unwrap();
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_wide_address() {
        let cfg = parse_yaml("display:\n  bus:\n    type: mock\n    address: 200\n").unwrap();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let cli = Cli { config: Some(PathBuf::from("/nonexistent/oled.yaml")), ..Default::default() };
        assert!(matches!(load(&cli), Err(ConfigError::Validation(_))));
    }
}
