use clap::Parser;
use clap::error::ErrorKind;

use fileserve::config::{Cli, ServerConfig};
use fileserve::server::Server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = match ServerConfig::load(&cli) {
        Ok(cfg) => cfg,
        Err(e) => {
            use clap::CommandFactory;
            Cli::command().error(ErrorKind::InvalidValue, format!("{e:#}")).exit();
        }
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .init();

    let server = Server::bind(&cfg).await?;

    tokio::select! {
        () = server.run() => {}

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    server.shutdown();
    Ok(())
}
