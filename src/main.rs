use std::sync::Arc;

use subshot::adapters::http::router;
use subshot::adapters::{
    FfmpegOptimizer, FfprobeProber, MpvRenderer, PixhostClient, ProcessRunner, SubtitleFont,
};
use subshot::{ScreenshotService, ScreenshotSettings, ServiceConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServiceConfig::from_env();
    let tools = &config.tools;

    let prober = FfprobeProber::new(ProcessRunner, tools.ffprobe.clone());
    let renderer = MpvRenderer::new(
        ProcessRunner,
        tools.mpv.clone(),
        SubtitleFont {
            family: tools.subtitle_font.clone(),
            size: tools.subtitle_font_size,
        },
    );
    let optimizer = FfmpegOptimizer::new(ProcessRunner, tools.ffmpeg.clone(), tools.ffprobe.clone());
    let host = PixhostClient::new(&config.pixhost).expect("Failed to build image host client");

    let service = ScreenshotService::new(
        prober,
        renderer,
        optimizer,
        host,
        ScreenshotSettings {
            count: config.screenshot_count,
            scratch_dir: config.scratch_dir.clone(),
        },
    );

    let app = router(Arc::new(service));
    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .expect("Failed to bind TCP listener");
    tracing::info!(address = %config.bind_address(), "listening");
    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}
