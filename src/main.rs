// src/main.rs
use pdfchat::api::{start_api_server, AppState};
use pdfchat::config::ApiConfig;
use pdfchat::llm::create_llm_provider;
use pdfchat::logging::init_tracing;
use std::io::{Error, ErrorKind};
use tracing::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = ApiConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        Error::new(ErrorKind::InvalidInput, e.to_string())
    })?;

    // Keep the guard alive so file logs get flushed
    let _log_guard = init_tracing(&config.log)?;

    info!(
        upload_dir = %config.upload_dir.display(),
        max_upload_bytes = config.max_upload_bytes,
        chunk_size = config.chunker.chunk_size,
        chunk_overlap = config.chunker.overlap,
        "Configuration loaded"
    );

    let llm = create_llm_provider(config.llm.clone()).await.map_err(|e| {
        error!(error = %e, "Failed to initialize LLM provider");
        Error::new(ErrorKind::Other, e.to_string())
    })?;
    info!(model = llm.model_name(), "LLM provider ready");

    let state = AppState::from_config(&config, llm)
        .map_err(|e| Error::new(ErrorKind::InvalidInput, e.to_string()))?;
    state
        .store
        .ensure_dir()
        .map_err(|e| Error::new(ErrorKind::Other, e.to_string()))?;

    info!("Starting API server on http://{} ...", config.bind_addr());
    start_api_server(&config, state)?.await
}
