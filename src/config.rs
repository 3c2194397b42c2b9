use std::path::Path;

use anyhow::{Context, Error};
use clap::ValueEnum;
use log::{debug, info};
use pi_pinout::{GpioPin, PhysicalPin, WiringPiPin};
use serde::{Deserialize, Serialize};

use crate::{
    color::BrightnessSetting,
    controller::MAX_LEDS,
    error::ConfigError,
};

pub const DEFAULT_CONFIG_FILE: &str = "config.ron";
pub const DEFAULT_LED_COUNT: usize = 3;

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct Config {
    pub led_count: usize,
    pub brightness: BrightnessSetting,
    pub transport: TransportKind,
    /// One of rgb, rbg, grb, gbr, brg, bgr. Only used by APA102
    pub channel_order: String,
    /// Where the Wyoming service listens, `unix://...` or `tcp://...`
    pub uri: Option<String>,
    pub apa102: Apa102Config,
    pub ws2812: Ws2812Config,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct Apa102Config {
    pub bus: u8,
    pub slave_select: u8,
    pub clock_hz: u32,
    /// Active low LED power line, as found on the ReSpeaker HATs
    pub power_pin: Option<Pin>,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
#[serde(default)]
pub struct Ws2812Config {
    /// Data pin for the PWM/DMA driver
    pub data_pin: Pin,
    pub dma: i32,
    /// SPI device for the SPI driver
    pub bus: u8,
    pub slave_select: u8,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Clone, Copy)]
pub enum Pin {
    Physical(PhysicalPin),
    Gpio(GpioPin),
    WiringPi(WiringPiPin),
}

impl From<Pin> for GpioPin {
    fn from(pin: Pin) -> Self {
        match pin {
            Pin::Physical(pin) => pin.into(),
            Pin::Gpio(pin) => pin,
            Pin::WiringPi(pin) => pin.into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq, Clone, Copy, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Pick the WS2812 driver that fits this board
    Auto,
    /// APA102 over SPI (ReSpeaker HATs)
    Apa102,
    /// WS2812 bit timing emulated over SPI (Raspberry Pi 5)
    #[value(name = "ws2812-spi")]
    Ws2812Spi,
    /// WS2812 through the PWM/DMA driver
    Pwm,
}

impl TransportKind {
    /// Resolve `Auto` into a concrete transport by probing the board
    pub fn resolve(self) -> TransportKind {
        if self != TransportKind::Auto {
            return self;
        }

        let model = std::fs::read_to_string("/proc/device-tree/model").unwrap_or_default();
        let spi_enabled = Path::new("/dev/spidev0.0").exists();
        debug!("Board model: {:?}, SPI enabled: {}", model.trim_end_matches('\0'), spi_enabled);

        Self::resolve_with(&model, spi_enabled)
    }

    pub fn resolve_with(model: &str, spi_enabled: bool) -> TransportKind {
        if model.contains("Raspberry Pi 5") && spi_enabled {
            info!("Detected Raspberry Pi 5 with SPI enabled");
            TransportKind::Ws2812Spi
        } else {
            TransportKind::Pwm
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            led_count: DEFAULT_LED_COUNT,
            brightness: BrightnessSetting::default(),
            transport: TransportKind::Auto,
            channel_order: "rgb".to_string(),
            uri: None,
            apa102: Apa102Config::default(),
            ws2812: Ws2812Config::default(),
        }
    }
}

impl Default for Apa102Config {
    fn default() -> Self {
        Self {
            bus: 0,
            slave_select: 1,
            clock_hz: 8_000_000,
            power_pin: Some(Pin::Gpio(GpioPin(12))),
        }
    }
}

impl Default for Ws2812Config {
    fn default() -> Self {
        Self {
            data_pin: Pin::Gpio(GpioPin(18)),
            dma: 10,
            bus: 0,
            slave_select: 0,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, Error> {
        let config = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config: Config = ron::from_str(&config)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Load the given file, or `config.ron` from the working directory if it
    /// exists, or fall back to the defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Config, Error> {
        match path {
            Some(path) => Config::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Config::load(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Config::default()),
        }
    }

    /// Catch configuration mistakes before any hardware is touched
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.led_count == 0 || self.led_count > MAX_LEDS {
            return Err(ConfigError::LedCount(self.led_count));
        }

        if let BrightnessSetting::Fraction(fraction) = self.brightness {
            if !(0.0..=1.0).contains(&fraction) {
                return Err(ConfigError::Invalid(format!(
                    "brightness fraction {fraction} is outside 0.0-1.0"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load() {
        let path = std::env::temp_dir().join("satellite-leds-test-config.ron");
        std::fs::write(
            &path,
            r#"(
    led_count: 10,
    brightness: 20,
    transport: apa102,
    channel_order: "grb",
    uri: Some("unix:///tmp/leds.sock"),
    apa102: (
        power_pin: Some(Physical(PhysicalPin(32))),
    ),
)"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(
            config,
            Config {
                led_count: 10,
                brightness: BrightnessSetting::Level(20),
                transport: TransportKind::Apa102,
                channel_order: "grb".to_string(),
                uri: Some("unix:///tmp/leds.sock".to_string()),
                apa102: Apa102Config {
                    power_pin: Some(Pin::Physical(PhysicalPin(32))),
                    ..Apa102Config::default()
                },
                ws2812: Ws2812Config::default(),
            }
        );
    }

    #[test]
    fn fractional_brightness_parses() {
        let config: Config = ron::from_str("(brightness: 0.5, transport: ws2812_spi)").unwrap();
        assert_eq!(config.brightness, BrightnessSetting::Fraction(0.5));
        assert_eq!(config.transport, TransportKind::Ws2812Spi);
        assert_eq!(config.led_count, DEFAULT_LED_COUNT);
    }

    #[test]
    fn validate_rejects_bad_led_counts() {
        for led_count in [0, 11, 1000] {
            let config = Config {
                led_count,
                ..Config::default()
            };
            assert_eq!(config.validate(), Err(ConfigError::LedCount(led_count)));
        }

        let config = Config {
            led_count: 10,
            ..Config::default()
        };
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn transport_names_on_the_command_line() {
        assert_eq!(
            TransportKind::from_str("ws2812-spi", false),
            Ok(TransportKind::Ws2812Spi)
        );
        assert_eq!(TransportKind::from_str("apa102", false), Ok(TransportKind::Apa102));
        assert!(ron::from_str::<Config>("(transport: ws2812-spi)").is_err());
    }

    #[test]
    fn auto_transport_prefers_spi_on_pi5() {
        assert_eq!(
            TransportKind::resolve_with("Raspberry Pi 5 Model B Rev 1.0\0", true),
            TransportKind::Ws2812Spi
        );
        assert_eq!(
            TransportKind::resolve_with("Raspberry Pi 5 Model B Rev 1.0\0", false),
            TransportKind::Pwm
        );
        assert_eq!(
            TransportKind::resolve_with("Raspberry Pi 4 Model B Rev 1.4\0", true),
            TransportKind::Pwm
        );
        assert_eq!(TransportKind::Apa102.resolve(), TransportKind::Apa102);
    }

    #[test]
    fn gpio_numbers_pass_through() {
        let pin: GpioPin = Pin::Gpio(GpioPin(12)).into();
        assert_eq!(pin.0, 12);
    }
}
