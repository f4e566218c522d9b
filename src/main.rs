// src/main.rs

use anyhow::Result;
use lane_service::server;
use lane_service::types::Config;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(format!("lane_service={},ort=warn", config.logging.level))
        .init();

    info!("Lane detection service starting");
    info!(
        "ROI: LT {:?} RT {:?} LB {:?} RB {:?}, dst offset {}",
        config.roi.left_top,
        config.roi.right_top,
        config.roi.left_bottom,
        config.roi.right_bottom,
        config.roi.dst_offset
    );
    info!(
        "Smoothing over {} frames per stream",
        config.smoothing.history_frames
    );

    let bind_addr = config.server.bind_addr.clone();
    let app = server::router(config);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{bind_addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
