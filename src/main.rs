//! diagram-sync binary entry point.

use std::process::ExitCode;

use diagram_sync::{cli, logging, Config, SyncServer};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!("run with --help for usage");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(Some(config.log_filter()));
    info!("diagram-sync v{}", env!("CARGO_PKG_VERSION"));

    match run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config) -> diagram_sync::Result<()> {
    let server_config = config.to_server_config()?;
    let public_host = server_config.page.public_host.clone();

    let mut server = SyncServer::new(server_config);
    let port = server.start().await?;
    info!("editor page: http://{}:{}/?mcp=<session-id>", public_host, port);

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");

    server.stop().await
}
