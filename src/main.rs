use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    gateway::TossClient,
    routes::create_app,
    staging::{InMemoryStagingStore, PreOrderStaging, RedisStagingStore, StagingStore},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    run_migrations(&orm).await?;

    let store = staging_store(config.redis_url.as_deref()).await;
    let staging = PreOrderStaging::new(store, config.preorder_ttl);
    let gateway = TossClient::new(&config.toss)?;

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    let state = AppState {
        orm,
        config: Arc::new(config),
        staging,
        gateway: Arc::new(gateway),
    };
    let app = create_app(state);

    tracing::info!("listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;

    Ok(())
}

async fn staging_store(redis_url: Option<&str>) -> Arc<dyn StagingStore> {
    let Some(url) = redis_url else {
        tracing::warn!("REDIS_URL not set; pre-orders are kept in process memory");
        return Arc::new(InMemoryStagingStore::new());
    };

    match RedisStagingStore::connect(url).await {
        Ok(store) => {
            tracing::info!("pre-order staging backed by redis");
            Arc::new(store)
        }
        Err(err) => {
            tracing::warn!(error = %err, "redis unavailable; pre-orders are kept in process memory");
            Arc::new(InMemoryStagingStore::new())
        }
    }
}
