use clap::Parser;
use hubspot_connect::{Config, Server};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "hubspot-connect")]
#[command(about = "OAuth2 connector for HubSpot CRM contacts")]
struct Cli {
    #[arg(short, long, help = "Path to configuration file")]
    config: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::load_from_file(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.logging.level))
        .init();

    info!("Starting HubSpot connector");

    let server = match Server::new(config).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to initialize server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
