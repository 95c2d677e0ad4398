use anyhow::Result;
use clap::Parser;
use std::fs;
use std::path::Path;

use kale_pix::{services, settings};

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Overrides the port from the config file.
    #[arg(short, long)]
    port: Option<u16>,
    #[arg(long, default_value = "log4rs.yaml")]
    log4rs: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = settings::Settings::load(&args.config).expect("Failed to load settings.");
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    init_logging(&args.log4rs).expect("Failed to initialize logging.");
    log::info!("Starting KALE PIX service.");

    services::start_services(settings).await
}

fn init_logging(path: &str) -> Result<(), anyhow::Error> {
    if !Path::new("logs").exists() {
        fs::create_dir("logs")?;
    }

    match log4rs::init_file(path, Default::default()) {
        Ok(_) => {
            println!("[*] Logging initialized successfully.");
            Ok(())
        }
        Err(e) => {
            println!("[ERROR] Failed to initialize logging: {}", e);
            Err(anyhow::anyhow!("Could not initialize logging: {}", e))
        }
    }
}
