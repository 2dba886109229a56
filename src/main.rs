use playportal::config::{environment::Config, init_db};
use playportal::services::email::{EmailSender, TracingMailer};
use playportal::services::scheduler::start_scheduler;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playportal=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env().expect("Failed to load environment configuration"));

    let db = init_db(&config.database_url).await;
    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Connected to SQLite");

    // Daily inactivity sweep
    let _scheduler = start_scheduler(db.clone(), config.inactivity_threshold_days)
        .await
        .expect("Failed to start scheduler");

    let mailer: Arc<dyn EmailSender> = Arc::new(TracingMailer);
    let app = playportal::create_app(db, config, mailer).await;

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    tracing::info!("Server running on http://localhost:3000");
    axum::serve(listener, app).await.unwrap();
}
