use log::info;

use crate::{
    apa102::{pack::ChannelOrder, Apa102Sink},
    color::ColorFrame,
    config::{Config, TransportKind},
    error::TransportError,
    ws2812::{PwmSink, Ws2812SpiSink},
};

/// Something that can put a full frame on the LEDs
pub trait PixelSink {
    /// Send every pixel of `frame`. Errors are not retried.
    fn transmit(&mut self, frame: &ColorFrame) -> Result<(), TransportError>;

    /// Release the hardware. Safe to call more than once, and never fails.
    /// Whatever the LEDs show stays up as long as they keep power.
    fn close(&mut self);

    /// Cut power to the LEDs, for transports that control it
    fn power_off(&mut self) {}

    fn name(&self) -> &'static str;
}

/// Every transport the service knows how to drive. Chosen once at startup.
pub enum Transport {
    Pwm(PwmSink),
    Ws2812Spi(Ws2812SpiSink),
    Apa102(Apa102Sink),
}

impl Transport {
    pub fn open(config: &Config) -> Result<Self, TransportError> {
        let brightness = config.brightness.normalize();

        let transport = match config.transport.resolve() {
            TransportKind::Apa102 => Transport::Apa102(Apa102Sink::open(
                &config.apa102,
                brightness,
                ChannelOrder::parse_or_default(&config.channel_order),
            )?),
            TransportKind::Ws2812Spi => {
                Transport::Ws2812Spi(Ws2812SpiSink::open(&config.ws2812, brightness)?)
            }
            // Auto never survives resolve()
            TransportKind::Pwm | TransportKind::Auto => Transport::Pwm(PwmSink::open(
                &config.ws2812,
                config.led_count,
                brightness,
            )?),
        };

        info!("Driving {} LEDs with {}", config.led_count, transport.name());
        Ok(transport)
    }
}

impl PixelSink for Transport {
    fn transmit(&mut self, frame: &ColorFrame) -> Result<(), TransportError> {
        match self {
            Transport::Pwm(sink) => sink.transmit(frame),
            Transport::Ws2812Spi(sink) => sink.transmit(frame),
            Transport::Apa102(sink) => sink.transmit(frame),
        }
    }

    fn close(&mut self) {
        match self {
            Transport::Pwm(sink) => sink.close(),
            Transport::Ws2812Spi(sink) => sink.close(),
            Transport::Apa102(sink) => sink.close(),
        }
    }

    fn power_off(&mut self) {
        match self {
            Transport::Pwm(sink) => sink.power_off(),
            Transport::Ws2812Spi(sink) => sink.power_off(),
            Transport::Apa102(sink) => sink.power_off(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Transport::Pwm(sink) => sink.name(),
            Transport::Ws2812Spi(sink) => sink.name(),
            Transport::Apa102(sink) => sink.name(),
        }
    }
}
