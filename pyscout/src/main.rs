use pyscout::{command_argument_builder, handle_mode, settings_from_matches};
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Scraper started");
    let matches = command_argument_builder().get_matches();
    debug!(?matches, "Command line arguments");

    let result = match settings_from_matches(&matches) {
        Ok(settings) => handle_mode(&settings).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("Scraper failed: {:#}", e);
        std::process::exit(1);
    }
    info!("Scraper finished");
}
