use std::{net::SocketAddr, sync::Arc, time::Duration};

use melodeck::{
    common::{
        banner::{BannerInfo, print_banner},
        logger,
        types::AnyResult,
    },
    configs::Config,
    notify::MessageBoard,
    player::ControlSurface,
    server::AppState,
    sources::SourceManager,
    transport,
    voice::NullVoiceGateway,
};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> AnyResult<()> {
    let config = Config::load()?;
    logger::init(&config);

    let address: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    print_banner(&BannerInfo::default(), &address.to_string());

    let source_manager = Arc::new(SourceManager::new(&config.sources));
    info!("Enabled sources: {}", source_manager.source_names().join(", "));

    let board = Arc::new(MessageBoard::new());
    let control = Arc::new(ControlSurface::new(
        config.player.clone(),
        source_manager,
        Arc::new(NullVoiceGateway),
        board.clone(),
    ));

    let pruning = control.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let pruned = pruning.prune_selections();
            if pruned > 0 {
                debug!("Pruned {} expired search prompts", pruned);
            }
        }
    });

    let state = Arc::new(AppState {
        control,
        board,
        config,
    });
    let app = transport::http_server::router(state);

    info!("Melodeck listening on {}", address);
    let listener = tokio::net::TcpListener::bind(address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Melodeck stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
