use anyhow::{Context, Result};
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::Credentials;
use axum::Router;
use std::{io::ErrorKind, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod handlers;
mod models;
mod routes;
mod services;

use services::{
    dynamo::DynamoMetadataTable, image_service::ImageService, s3::S3ObjectStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting image-gateway with config: {:?}", cfg);

    // --- Shared AWS clients, built once ---
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(cfg.aws_region.clone()));
    if let Some((access_key_id, secret_access_key)) = cfg.static_credentials() {
        loader = loader.credentials_provider(Credentials::new(
            access_key_id,
            secret_access_key,
            None,
            None,
            "image-gateway-config",
        ));
    }
    if let Some(endpoint) = &cfg.endpoint_url {
        tracing::info!("Using custom AWS endpoint {}", endpoint);
        loader = loader.endpoint_url(endpoint);
    }
    let sdk_config = loader.load().await;

    let objects = S3ObjectStore::new(
        &sdk_config,
        cfg.bucket_name.clone(),
        cfg.aws_region.clone(),
        cfg.endpoint_url.as_deref(),
    )
    .context("building S3 client")?;
    let metadata = DynamoMetadataTable::new(&sdk_config, cfg.table_name.clone());

    // --- Initialize core service ---
    let images = ImageService::new(Arc::new(objects), Arc::new(metadata), cfg.public_url_base());

    // --- Build router ---
    let app: Router = routes::routes::app(images, cfg.allowed_origin())?;

    if cfg.serverless {
        tracing::info!("Serverless mode: application built, listener not started");
        return Ok(());
    }

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
