// src/main.rs
use std::path::Path;
use std::sync::Arc;

use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use anyhow::Context;
use log::info;

use breedlens::config::AppConfig;
use breedlens::format::{format_file_size, render_result};
use breedlens::models::{RequestState, UploadFile};
use breedlens::services::{BackendClient, HttpPredictApi};
use breedlens::widget::UploadWidget;
use breedlens::{AppState, configure};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = AppConfig::from_env();

    // With an image path argument the binary acts as the demo client;
    // without one it serves the proxy.
    if let Some(path) = std::env::args().nth(1) {
        return predict_from_cli(&config, Path::new(&path)).await;
    }
    run_server(config).await
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    info!("Starting BreedLens proxy on {}", config.bind_addr);
    info!("Forwarding predictions to {}", config.backend_api_url);

    let state = AppState {
        backend: Arc::new(BackendClient::new(
            config.backend_api_url.clone(),
            config.mock_delay,
        )),
    };

    let static_dir = config.static_dir.clone();
    let bind_addr = config.bind_addr.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(middleware::Logger::default())
            .configure(configure)
            .service(Files::new("/", static_dir.clone()).index_file("index.html"))
    })
    .bind(&bind_addr)
    .with_context(|| format!("failed to bind {bind_addr}"))?
    .run()
    .await?;

    Ok(())
}

/// One-shot widget flow: select the file, submit it to the configured proxy
/// endpoint, print the result card, reset.
async fn predict_from_cli(config: &AppConfig, path: &Path) -> anyhow::Result<()> {
    let api = Arc::new(HttpPredictApi::new(config.predict_api_url.clone()));
    let mut widget = UploadWidget::with_max_upload(api, config.max_upload_bytes);

    let upload = UploadFile::from_path(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    println!("Selected {} ({})", upload.filename, format_file_size(upload.size()));

    widget.select_file(upload);
    if let Some(message) = widget.validation_error() {
        anyhow::bail!("{message}");
    }
    if let Some(preview) = widget.preview() {
        info!("preview written to {}", preview.path().display());
    }

    println!("Analyzing...");
    widget.submit().await;

    let outcome = match widget.state() {
        RequestState::Succeeded(result) => Ok(render_result(result)),
        RequestState::Failed(message) => Err(anyhow::anyhow!("{message}")),
        _ => Err(anyhow::anyhow!("prediction did not complete")),
    };
    widget.reset();

    let card = outcome?;
    print!("{card}");
    Ok(())
}
