//! Flags shared by the service and the one-shot CLI

use std::path::PathBuf;

use anyhow::Error;
use clap::Args;
use env_logger::Env;
use log::{error, info};
use pi_pinout::GpioPin;

use crate::{
    color::BrightnessSetting,
    config::{Config, Pin, TransportKind},
};

#[derive(Args, Debug, Clone, Default)]
pub struct HardwareArgs {
    /// RON config file, `config.ron` is used if present
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of LEDs, 1 - 10
    #[arg(long)]
    pub led_count: Option<usize>,

    /// 1 - 31, or a fraction like 0.5
    #[arg(long)]
    pub led_brightness: Option<BrightnessSetting>,

    /// GPIO data pin for the WS2812 PWM driver
    #[arg(long)]
    pub led_pin: Option<u8>,

    /// Drive the APA102 LEDs of a ReSpeaker HAT
    #[arg(long)]
    pub respeaker: bool,

    /// GPIO that powers the ReSpeaker LEDs
    #[arg(long)]
    pub respeaker_pin: Option<u8>,

    #[arg(long, value_enum)]
    pub transport: Option<TransportKind>,

    /// APA102 channel order, e.g. rgb or grb
    #[arg(long)]
    pub channel_order: Option<String>,

    /// Log at debug level
    #[arg(long)]
    pub debug: bool,
}

impl HardwareArgs {
    /// Load the config file and lay the flags over it
    pub fn load_config(&self) -> Result<Config, Error> {
        let mut config = Config::load_or_default(self.config.as_deref())?;
        self.apply(&mut config);
        Ok(config)
    }

    pub fn apply(&self, config: &mut Config) {
        if let Some(led_count) = self.led_count {
            config.led_count = led_count;
        }
        if let Some(brightness) = self.led_brightness {
            config.brightness = brightness;
        }
        if let Some(pin) = self.led_pin {
            config.ws2812.data_pin = Pin::Gpio(GpioPin(pin));
        }
        if let Some(pin) = self.respeaker_pin {
            config.apa102.power_pin = Some(Pin::Gpio(GpioPin(pin)));
        }
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        // --respeaker wins over everything else
        if self.respeaker {
            config.transport = TransportKind::Apa102;
        }
        if let Some(order) = &self.channel_order {
            config.channel_order = order.clone();
        }
    }

    pub fn init_logging(&self) {
        let filter = if self.debug { "debug" } else { "info" };
        env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

        if self.debug {
            info!("Debug logging enabled");
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await.ok();
}
