use anyhow::Context;
use price_predictor::{
    config::{resolve_artifact, ServerConfig},
    logging,
    model::TorchRegressor,
    server::{self, AppState},
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();

    let cfg = ServerConfig::from_env()?;
    let model_path = resolve_artifact(&cfg.model_path);
    let meta_path = resolve_artifact(&cfg.meta_path);

    let mdl = TorchRegressor::load(&model_path, &meta_path)
        .with_context(|| format!("failed to load model from {}", model_path.display()))?;
    tracing::info!(
        "loaded model from {}; {} input columns, {} known locations",
        model_path.display(),
        mdl.layout().len(),
        mdl.layout().locations().count()
    );

    let state = AppState {
        model: Arc::new(mdl),
        log_rows: cfg.log_rows,
    };

    let addr = cfg.bind_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("listening on {}", addr);
    server::serve(listener, state, server::shutdown_signal()).await?;
    Ok(())
}
