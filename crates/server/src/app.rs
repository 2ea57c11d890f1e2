//! Pipeline wiring and lifecycle

use std::sync::Arc;

use anyhow::{Context, Result};
use en_config::Config;
use en_destinations::Service;
use en_events::{BasicUaResolver, ClientPreprocessor, NoopGeoResolver, ServerPreprocessor};
use en_ingest::{HttpSource, IngestConfig, TokenStore};
use en_logfiles::{PeriodicUploader, UploaderConfig};
use en_logwriter::{AsyncLogger, LogWriterConfig, SystemClock};
use en_metrics::MetricsRegistry;
use en_supervisor::{RestartPolicy, run_with_restart};
use tokio_util::sync::CancellationToken;

/// Build the pipeline from configuration and run until ctrl-c
pub async fn run(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();

    // durable buffer
    let writer_config = LogWriterConfig {
        dir: config.log.path.clone(),
        rotation_period: config.log.rotation_period(),
        flush_interval: config.log.flush_interval(),
        queue_size: config.log.queue_max,
        max_file_bytes: config.log.max_file_bytes(),
    };
    let logger = Arc::new(
        AsyncLogger::new(writer_config, Arc::new(SystemClock))
            .context("initializing log writer")?,
    );

    // destination registry; drivers register through the Service handle
    let destinations = Arc::new(Service::new());
    if config.server.tokens.is_empty() {
        tracing::warn!("no tokens configured, every request will be rejected");
    }
    let metrics = Arc::new(MetricsRegistry::new());

    // supervised uploader loop
    let uploader_config = UploaderConfig {
        log_path: config.log.path.clone(),
        upload_every: config.uploader.upload_every(),
    };
    let uploader_handle = {
        let destinations = Arc::clone(&destinations);
        let metrics = Arc::clone(&metrics);
        let cancel = cancel.clone();
        run_with_restart(
            "uploader",
            cancel.clone(),
            RestartPolicy::default(),
            move || {
                let uploader_config = uploader_config.clone();
                let destinations = Arc::clone(&destinations);
                let metrics = Arc::clone(&metrics);
                let cancel = cancel.clone();
                async move {
                    let uploader = PeriodicUploader::new(uploader_config, destinations, metrics)?;
                    uploader.run(cancel).await
                }
            },
        )
    };

    // HTTP ingestion
    let token_store = Arc::new(TokenStore::new(&config.server.tokens));
    let geo_resolver = Arc::new(NoopGeoResolver);
    let ua_resolver = Arc::new(BasicUaResolver);
    let client_preprocessor = Arc::new(ClientPreprocessor::new(
        geo_resolver.clone(),
        ua_resolver.clone(),
    ));
    let server_preprocessor = Arc::new(ServerPreprocessor::new(geo_resolver, ua_resolver));

    let ingest_config = IngestConfig {
        address: config.server.address.clone(),
        port: config.server.port,
        max_payload_bytes: config.server.max_payload_bytes,
    };
    let source = HttpSource::new(
        ingest_config,
        token_store,
        Arc::clone(&logger),
        client_preprocessor,
        server_preprocessor,
    );

    let mut server = Box::pin(source.run(cancel.clone()));
    let server_result = tokio::select! {
        result = &mut server => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            cancel.cancel();
            // let in-flight requests finish
            server.await
        }
    };

    // drain: stop the uploader, then flush and close every open file
    cancel.cancel();
    if let Err(err) = uploader_handle.await {
        tracing::error!(error = %err, "uploader shutdown failed");
    }
    logger.close().await;

    server_result.context("HTTP source failed")
}
