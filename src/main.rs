use anyhow::Context;
use palaver::{AppState, Config, auth::Hasher};
use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "palaver=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url =
        dotenv::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_owned());
    let db_pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect(&database_url)
        .await
        .context("connecting to database")?;

    sqlx::migrate!()
        .run(&db_pool)
        .await
        .context("applying migrations")?;
    tracing::info!("database ready");

    let state = AppState {
        db_pool,
        config: Config::from_env(),
        hasher: Hasher,
    };
    let app = palaver::app(state);

    let addr = format!(
        "{}:{}",
        dotenv::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_owned()),
        dotenv::var("PORT").unwrap_or_else(|_| "8080".to_owned()),
    );
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
