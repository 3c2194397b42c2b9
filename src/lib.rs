pub mod animation;
pub mod apa102;
pub mod cli;
pub mod color;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod link;
pub mod power;
pub mod sink;
pub mod ws2812;
pub mod wyoming;

pub mod prelude {
    pub use crate::{
        animation::{AnimationEngine, LightState},
        apa102::{pack::ChannelOrder, Apa102Encoder, Apa102Sink},
        cli::HardwareArgs,
        color::{Brightness, BrightnessSetting, Color, ColorFrame},
        config::{Config, TransportKind},
        controller::{LedController, MAX_LEDS},
        error::{ConfigError, LedError, TransportError},
        event::LifecycleEvent,
        sink::{PixelSink, Transport},
        ws2812::{PwmSink, Ws2812SpiSink},
    };
}
