use clap::Parser;
use client::app::{App, LogNavigator};
use client::config::{ClientConfig, Endpoint};
use client::identity::FileIdentityStore;
use client::input::InputManager;
use client::network::WebSocketConnector;
use client::rendering::LogSurface;
use client::timer::{Clock, SystemClock};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Origin the client is served from; the socket host is derived from it
    #[arg(short = 'o', long, default_value = "http://localhost")]
    origin: String,

    /// Override the socket port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Override the socket path
    #[arg(long)]
    path: Option<String>,

    /// Input capture period in milliseconds
    #[arg(short = 'c', long, default_value = "20")]
    capture_ms: u64,

    /// Render ticks per capture tick
    #[arg(short = 'l', long, default_value = "5")]
    lerp_steps: u32,

    /// Start with the debug overlay on
    #[arg(short = 'd', long)]
    debug: bool,

    /// Where the assigned player id is kept between runs
    #[arg(long, default_value = ".airhockey-identity.json")]
    identity_file: PathBuf,
}

impl Args {
    fn config(&self) -> ClientConfig {
        let mut endpoint = Endpoint::from_origin(&self.origin);
        if let Some(port) = self.port {
            endpoint.port = port;
        }
        if let Some(path) = &self.path {
            endpoint.path = path.clone();
        }

        ClientConfig {
            endpoint,
            capture_period: Duration::from_millis(self.capture_ms.max(1)),
            lerp_steps: self.lerp_steps.max(1),
            debug_overlay: self.debug,
            ..ClientConfig::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let config = args.config();

    info!("Starting client...");
    info!("Connecting to: {}", config.endpoint.url());
    info!("Commands: find, leave, debug, move <x> <y>, quit");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let identity = FileIdentityStore::new(&args.identity_file, Arc::clone(&clock));

    let mut app = App::new(
        config,
        Box::new(WebSocketConnector),
        clock,
        LogSurface,
        Box::new(identity),
        Box::new(LogNavigator),
    )?;

    let (inputs_tx, mut inputs) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match InputManager::parse_command(&line) {
                Some(event) => {
                    if inputs_tx.send(event).is_err() {
                        break;
                    }
                }
                None => warn!("Unknown command: {}", line.trim()),
            }
        }
    });

    app.run(&mut inputs).await?;

    Ok(())
}
