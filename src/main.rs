use std::net::SocketAddr;
use std::sync::Arc;

use sea_orm::Database;
use tracing_subscriber::EnvFilter;

use migration::{Migrator, MigratorTrait};
use presong::config::get_config;
use presong::routes::create_routes;
use presong::services::audio::{HttpAnalysisProvider, HttpTranscoder};
use presong::services::dispatcher::QueueDispatcher;
use presong::services::refunds::RefundService;
use presong::services::storage::S3Store;
use presong::services::stripe::StripeGateway;
use presong::services::worker::Worker;
use presong::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = get_config();

    let db = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    let store = Arc::new(S3Store::new().await);
    let dispatcher = Arc::new(QueueDispatcher::new(db.clone()));
    let gateway = Arc::new(StripeGateway::new(config.stripe_secret_key.clone()));
    let refunds = Arc::new(RefundService::new(db.clone(), gateway));

    let transcoder = Arc::new(HttpTranscoder::new(config.transcoder_url.clone()));
    let analyzer = Arc::new(HttpAnalysisProvider::new(config.analysis_url.clone()));
    let worker = Worker::new(db.clone(), store.clone(), transcoder, analyzer);
    tokio::spawn(async move { worker.run().await });

    let state = AppState {
        db,
        store,
        dispatcher,
        refunds,
    };

    let app = create_routes(state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    tracing::info!("Listening on {}", listener.local_addr().unwrap());
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
