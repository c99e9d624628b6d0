use anyhow::{Context, Result};
use classifier_client::ClassifierClient;
use job_pipeline::{JobStore, JsonFileSource, MemoryJobStore, Pipeline, PipelineConfig, Stage};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,job_pipeline=debug,classifier_client=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_line_number(true),
        )
        .init();

    let config = PipelineConfig::from_env().context("Failed to load configuration")?;
    let raw_path = config
        .raw_postings_path
        .clone()
        .context("RAW_POSTINGS_PATH must be set")?;

    tracing::info!(
        variant = %config.variant,
        classifier = %config.classifier_base_url,
        source = %raw_path.display(),
        "Starting job pipeline"
    );

    let client = ClassifierClient::new(config.classifier_config())
        .context("Failed to build classifier client")?;
    let source = JsonFileSource::new(raw_path);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current stage");
            on_signal.cancel();
        }
    });

    #[cfg(feature = "postgres")]
    if let Some(database_url) = config.database_url.as_deref() {
        let store = job_pipeline::PostgresJobStore::new(database_url)
            .await
            .context("Failed to connect to database")?;
        return execute(Pipeline::from_config(source, store, client, &config), &cancel).await;
    }

    if config.database_url.is_some() {
        tracing::warn!("DATABASE_URL is set but the postgres feature is off; using memory store");
    }
    execute(
        Pipeline::from_config(source, MemoryJobStore::new(), client, &config),
        &cancel,
    )
    .await
}

async fn execute<St: JobStore>(
    pipeline: Pipeline<JsonFileSource, St, ClassifierClient>,
    cancel: &CancellationToken,
) -> Result<()> {
    let run = pipeline.run(cancel).await.context("Pipeline run failed")?;

    let recovered: usize = run.reports.iter().map(|r| r.errors.len()).sum();
    let persisted = run.report(Stage::Persist).map(|r| r.output).unwrap_or(0);
    tracing::info!(records = run.records.len(), persisted, recovered, "Done");
    Ok(())
}
