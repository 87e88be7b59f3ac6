mod framework;

use clap::Parser;
use log::{error, info};

use framework::channel::CdpChannel;
use framework::core::{TapConfig, DEFAULT_DATA_PREFIX, DEFAULT_PATH_PREFIX};
use framework::registry::{ApiEvent, HandlerRegistry};
use framework::tap::GameTap;

/// Tap a game's API traffic through a browser's DevTools endpoint.
#[derive(Parser, Debug)]
#[command(name = "apitap", version, about)]
struct Args {
    /// DevTools WebSocket endpoint of the browser view,
    /// e.g. ws://127.0.0.1:9222/devtools/page/<id>
    endpoint: String,

    /// URL prefix selecting the game's API surface
    #[arg(long, default_value = DEFAULT_PATH_PREFIX)]
    path_prefix: String,

    /// Prefix stripped from response bodies before JSON parsing
    #[arg(long, default_value = DEFAULT_DATA_PREFIX)]
    data_prefix: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = TapConfig::new()
        .path_prefix(args.path_prefix)
        .data_prefix(args.data_prefix);

    let channel = match CdpChannel::connect(&args.endpoint).await {
        Ok(channel) => channel,
        Err(e) => {
            error!("failed to attach debugger at {}: {}", args.endpoint, e);
            return Err(Box::new(e) as Box<dyn std::error::Error>);
        }
    };
    info!("attached to {} as channel {}", args.endpoint, channel.id());

    // Log every known API event as it is observed.
    let mut handlers = HandlerRegistry::new();
    for &event in ApiEvent::ALL {
        handlers.on(event, move |payload| match &payload.body {
            Ok(body) => info!("{:?}: {}", event, body),
            Err(e) => info!("{:?}: body not decoded ({})", event, e),
        });
    }

    let mut tap = GameTap::new(channel, config, handlers);
    tap.run().await?;
    Ok(())
}
