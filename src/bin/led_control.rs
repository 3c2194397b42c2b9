use anyhow::Error;
use clap::{Parser, Subcommand};
use log::{error, info};
use satellite_leds::{cli::shutdown_signal, prelude::*};

/// Set the satellite LEDs by hand
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    hardware: HardwareArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set one LED
    Set { index: usize, r: u8, g: u8, b: u8 },
    /// Set every LED to the same color
    All { r: u8, g: u8, b: u8 },
    /// Set every LED from `r g b` triplets, one per LED
    Pattern {
        #[arg(required = true, num_args = 1..)]
        values: Vec<u8>,
    },
    /// Turn every LED off
    Clear,
    /// Play the presentation of a satellite state
    Show {
        #[arg(value_enum)]
        state: LightState,
    },
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    args.hardware.init_logging();

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Error> {
    let config = args.hardware.load_config()?;
    config.validate()?;

    let transport = Transport::open(&config)?;
    let controller = LedController::new(config.led_count, transport)?;
    let mut engine = AnimationEngine::new(controller);

    match execute(&args.command, &mut engine).await {
        Ok(true) => {
            // Keep the colors up after we exit
            engine.into_controller().release();
            Ok(())
        }
        Ok(false) => {
            info!("Interrupted, turning the LEDs off");
            engine.shutdown();
            Ok(())
        }
        Err(e) => {
            engine.shutdown();
            Err(e.into())
        }
    }
}

/// `false` when a signal cut the command short
async fn execute(command: &Command, engine: &mut AnimationEngine) -> Result<bool, LedError> {
    let finished = match *command {
        Command::Set { index, r, g, b } => {
            info!("Setting LED {} to ({}, {}, {})", index, r, g, b);
            engine.controller_mut().set_pixel(index, Color::new(r, g, b))?;
            true
        }
        Command::All { r, g, b } => {
            info!("Setting all LEDs to ({}, {}, {})", r, g, b);
            engine.controller_mut().set_all(Color::new(r, g, b))?;
            true
        }
        Command::Pattern { ref values } => {
            info!("Setting pattern {:?}", values);
            engine.controller_mut().set_pattern(values)?;
            true
        }
        Command::Clear => {
            info!("Clearing LEDs");
            engine.controller_mut().clear()?;
            true
        }
        Command::Show { state } => {
            info!("Showing {:?}", state);
            return engine.present_until(state, shutdown_signal()).await;
        }
    };

    Ok(finished)
}
