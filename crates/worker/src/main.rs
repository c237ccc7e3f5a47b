use std::sync::Arc;

use anyhow::Context;
use framesmith_db::PgJobStore;
use framesmith_llm::{LlmConfig, OpenAiClient};
use framesmith_pipeline::{PipelineConfig, SelfHealingPipeline};
use framesmith_render::{RenderApi, RendererConfig};
use framesmith_worker::{JobRunner, WorkerConfig};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "framesmith_worker=info,framesmith_pipeline=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let worker_config = WorkerConfig::from_env()?;
    let llm_config = LlmConfig::from_env()?;
    let renderer_config = RendererConfig::from_env()?;
    let pipeline_config = PipelineConfig::from_env()?;

    tracing::info!(
        model = %llm_config.model,
        renderer = %renderer_config.url,
        max_retries = pipeline_config.max_retries,
        "Loaded configuration",
    );

    let pool = framesmith_db::create_pool(&worker_config.database_url)
        .await
        .context("Failed to connect to database")?;
    framesmith_db::health_check(&pool)
        .await
        .context("Database health check failed")?;
    framesmith_db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database ready");

    let text = Arc::new(OpenAiClient::new(&llm_config)?);
    let renderer = Arc::new(RenderApi::new(&renderer_config)?);
    let store = Arc::new(PgJobStore::new(pool.clone()));
    let pipeline = Arc::new(SelfHealingPipeline::new(
        text,
        renderer,
        store,
        pipeline_config,
    ));

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            return;
        }
        tracing::info!("Shutdown signal received");
        shutdown.cancel();
    });

    let runner = JobRunner::new(
        pool.clone(),
        pipeline,
        worker_config.poll_interval(),
        worker_config.concurrency,
    );
    runner.run(cancel).await;

    pool.close().await;
    Ok(())
}
