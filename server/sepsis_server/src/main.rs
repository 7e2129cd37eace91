use clap::Parser;
use std::sync::Arc;

use sepsis_server::{create_router, AppState, Cli, ServerConfig};
use sepsis_triage::ClinicalContext;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    let config = match ServerConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            std::process::exit(2);
        }
    };

    let state = Arc::new(AppState::loading());
    let loader = Arc::clone(&state);
    let paths = config.artifacts.clone();
    let profile = config.guardrail_profile;
    tokio::task::spawn_blocking(move || {
        loader.publish(ClinicalContext::load(&paths, profile));
    });

    let app = create_router(state);
    let addr = config.bind_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("cannot bind {addr}: {e}");
            std::process::exit(1);
        }
    };
    log::info!("sepsis_server listening on http://{addr}");
    if let Err(e) = axum::serve(listener, app).await {
        log::error!("server error: {e}");
        std::process::exit(1);
    }
}
