use anyhow::{anyhow, Error};
use clap::Parser;
use log::{error, info};
use satellite_leds::{
    cli::shutdown_signal,
    prelude::*,
    wyoming::{self, ServerUri},
};
use tokio::sync::mpsc;

/// Show the state of a Wyoming satellite on its LEDs
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// unix:// or tcp:// address to listen on
    #[arg(long)]
    uri: Option<String>,

    #[command(flatten)]
    hardware: HardwareArgs,
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

    let uri: ServerUri = args
        .uri
        .or_else(|| config.uri.clone())
        .ok_or_else(|| anyhow!("no --uri given and none in the config"))?
        .parse()?;

    info!(
        "Starting with {} LEDs at brightness {}",
        config.led_count,
        config.brightness.normalize().level()
    );
    let transport = Transport::open(&config)?;
    let controller = LedController::new(config.led_count, transport)?;
    let mut engine = AnimationEngine::new(controller);

    // Message queue
    let (events_tx, mut events_rx) = mpsc::channel(100);
    let mut server = tokio::spawn(wyoming::serve(uri, events_tx));

    info!("LED service ready");

    let result = tokio::select! {
        result = engine.run(&mut events_rx) => result.map_err(Error::from),
        joined = &mut server => match joined {
            Ok(result) => result,
            Err(e) => Err(e.into()),
        },
        _ = shutdown_signal() => {
            info!("Shutting down");
            Ok(())
        }
    };

    server.abort();
    engine.shutdown();
    result
}
