use pinhole_api::server::{self, ServerState};
use pinhole_common::snowflake::{ProcessId, WorkerId};
use pinhole_core::{Services, media::LocalMediaStore};
use pinhole_db::{DbClient, DbError, SharedStore};
use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    sync::Arc,
};
use thiserror::Error;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Worker id {0} does not fit into five bits")]
    WorkerId(u8),
    #[error("Process id {0} does not fit into five bits")]
    ProcessId(u8),
    #[error("Error connecting to the database: {0}")]
    DbConnect(sqlx::Error),
    #[error("Error migrating the database: {0}")]
    DbMigrate(DbError),
    #[error("Error binding tcp listener: {0}")]
    TcpBind(std::io::Error),
    #[error("Error serving server: {0}")]
    TcpServe(std::io::Error),
}

fn default_max_connections() -> u32 {
    10
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_media_base_url() -> String {
    "/uploads".to_owned()
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    server_address: IpAddr,
    server_port: u16,
    database_url: String,
    #[serde(default = "default_max_connections")]
    database_max_connections: u32,
    #[serde(default)]
    worker_id: u8,
    #[serde(default)]
    process_id: u8,
    #[serde(default = "default_media_dir")]
    media_dir: PathBuf,
    #[serde(default = "default_media_base_url")]
    media_base_url: String,
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pinhole_api=debug,\
                pinhole_core=debug,\
                pinhole_db=debug,\
                tower_http=debug,axum::rejection=trace,sqlx=warn"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;

    let worker_id = WorkerId::new(env.worker_id).ok_or(InitError::WorkerId(env.worker_id))?;
    let process_id =
        ProcessId::new(env.process_id).ok_or(InitError::ProcessId(env.process_id))?;

    let pool = PgPoolOptions::new()
        .max_connections(env.database_max_connections)
        .connect(&env.database_url)
        .await
        .map_err(InitError::DbConnect)?;
    let db_client = DbClient::new(pool, worker_id, process_id);
    db_client.migrate().await.map_err(InitError::DbMigrate)?;
    info!("Database migrated");

    let store: SharedStore = Arc::new(db_client);
    let media = Arc::new(LocalMediaStore::new(
        env.media_dir.clone(),
        &env.media_base_url,
        worker_id,
        process_id,
    ));
    let services = Services::new(store.clone(), media);

    let media_route = format!("/{}", env.media_base_url.trim_matches('/'));
    let app = server::routes()
        .nest_service(&media_route, ServeDir::new(&env.media_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(ServerState::new(store, services));

    let server_address = SocketAddr::new(env.server_address, env.server_port);
    let listener = tokio::net::TcpListener::bind(server_address)
        .await
        .map_err(InitError::TcpBind)?;
    info!(%server_address, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(InitError::TcpServe)?;

    Ok(())
}
