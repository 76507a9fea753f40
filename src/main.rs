use std::sync::Arc;
use std::time::Duration;

use concurso_prep::adapters::content::InMemoryQuestionCatalog;
use concurso_prep::adapters::http::{app_router, AppState, HttpSettings};
use concurso_prep::adapters::random::ThreadRandom;
use concurso_prep::adapters::storage::{FileKeyValueStore, InMemoryKeyValueStore};
use concurso_prep::application::{CoreServices, PlanRequestWorkflow};
use concurso_prep::config::{AppConfig, StorageBackend};
use concurso_prep::ports::{KeyValueStore, QuestionCatalog};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let store: Arc<dyn KeyValueStore> = match config.storage.backend {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; state is lost on restart");
            Arc::new(InMemoryKeyValueStore::new())
        }
        StorageBackend::File => {
            let dir = config
                .storage
                .data_dir
                .clone()
                .ok_or("storage.data_dir is required for the file backend")?;
            tracing::info!(dir = %dir.display(), "using file storage");
            Arc::new(FileKeyValueStore::new(dir))
        }
    };

    let questions: Arc<dyn QuestionCatalog> = match &config.storage.questions_file {
        Some(path) => {
            let catalog = InMemoryQuestionCatalog::from_yaml_file(path).await?;
            tracing::info!(path = %path.display(), questions = catalog.len().await, "question bank loaded");
            Arc::new(catalog)
        }
        None => {
            tracing::warn!("no question bank configured; catalog is empty");
            Arc::new(InMemoryQuestionCatalog::new())
        }
    };

    let services = CoreServices::build(
        store,
        questions,
        Arc::new(ThreadRandom),
        config.core_settings(),
    );

    if config.payment.sweep_interval_secs > 0 {
        spawn_abandon_sweeper(
            services.plan_requests.clone(),
            Duration::from_secs(config.payment.sweep_interval_secs),
            config.payment.abandon_after_hours,
        );
    }
    if !config.payment.webhooks_enabled() {
        tracing::warn!("payment webhook secret not set; /api/webhooks/payment is disabled");
    }

    let state = AppState::new(
        services,
        config.payment.webhook_secret.clone(),
        config.payment.abandon_after_hours,
    );
    let app = app_router(
        state,
        &HttpSettings {
            request_timeout: Duration::from_secs(config.server.request_timeout_secs),
            cors_origins: config.server.cors_origins_list(),
        },
    );

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, environment = ?config.server.environment, "starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.server.log_level.clone().into());

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.is_production() {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Periodically moves unpaid plan requests to abandoned.
fn spawn_abandon_sweeper(workflow: Arc<PlanRequestWorkflow>, every: Duration, after_hours: u32) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match workflow.abandon_stale(i64::from(after_hours)).await {
                Ok(ids) if !ids.is_empty() => {
                    tracing::info!(abandoned = ids.len(), "abandonment sweep finished");
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "abandonment sweep failed");
                }
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
