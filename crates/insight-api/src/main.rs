use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use insight_api::{
    build_router,
    config::{Config, StorageBackend},
    state::AppState,
};
use insight_llm::ClientFactory;
use insight_persist::{DatasetStore, InMemoryStore, QuotaStore};
use insight_relay::RelayBuilder;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    init_logging(&config);

    tracing::info!("Starting Insight API server");
    tracing::info!("Config loaded: {}:{}", config.server.host, config.server.port);

    tracing::info!(model = %config.llm.model, "Initializing chat client");
    let chat_client = ClientFactory::create_chat_client(config.provider_config())?;

    let (quota_store, dataset_store) = connect_storage(&config).await?;

    let relay = RelayBuilder::new()
        .chat_client(chat_client)
        .quota_store(quota_store)
        .dataset_store(dataset_store)
        .config(config.relay_config())
        .build()?;

    let state = Arc::new(AppState::new(config.clone(), relay));
    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("API docs: http://{}/api/docs", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect_storage(
    config: &Config,
) -> anyhow::Result<(Arc<dyn QuotaStore>, Arc<dyn DatasetStore>)> {
    match config.storage.backend {
        StorageBackend::Memory => {
            let store = match &config.storage.fixtures_dir {
                Some(dir) => {
                    tracing::info!(dir = %dir, "Loading dataset fixtures");
                    InMemoryStore::from_fixture_dir(dir)
                        .with_context(|| format!("Failed to load fixtures from {}", dir))?
                }
                None => InMemoryStore::new(),
            };
            let store = Arc::new(store);
            tracing::info!("Using in-memory storage");
            let quotas: Arc<dyn QuotaStore> = store.clone();
            let datasets: Arc<dyn DatasetStore> = store;
            Ok((quotas, datasets))
        }
        #[cfg(feature = "mongodb")]
        StorageBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            let client = insight_persist::MongoPersistenceClient::connect(
                &config.mongodb_uri,
                &config.storage.database,
            )
            .await
            .context("Failed to connect to MongoDB")?;
            let client = Arc::new(client);
            tracing::info!("MongoDB connected");
            let quotas: Arc<dyn QuotaStore> = client.clone();
            let datasets: Arc<dyn DatasetStore> = client;
            Ok((quotas, datasets))
        }
        #[cfg(not(feature = "mongodb"))]
        StorageBackend::Mongodb => {
            anyhow::bail!("Built without the mongodb feature; set storage.backend = \"memory\"")
        }
    }
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}
