use dotenv::dotenv;
use std::sync::Arc;
use tracing::info;

use text_insight::{api, Settings, TextAnalyzer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let settings = Settings::from_env();
    let analyzer = Arc::new(TextAnalyzer::from_settings(&settings));
    let app = api::router(analyzer);

    let listener = tokio::net::TcpListener::bind(settings.bind_addr()).await?;
    info!("Listening on {}", listener.local_addr()?);
    info!("API docs at http://{}/docs", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
