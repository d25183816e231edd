mod error;
mod handlers;
mod models;
mod server;
mod services;

use anyhow::Result;
use dotenv::dotenv;
use std::env;
use std::sync::Arc;

use handlers::AnalyzeHandler;
use server::create_router;
use services::{AnalysisCache, CacheSweeper, MemoryCache, OpenAiService};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger
    env_logger::init();

    // Load environment variables
    dotenv().ok();

    log::info!("🚀 Starting Ingredient Label Analyzer...");

    // Load configuration
    let api_key = env::var("OPENAI_API_KEY")
        .expect("OPENAI_API_KEY must be set in .env file");

    let vision_model = env::var("OPENAI_VISION_MODEL")
        .unwrap_or_else(|_| "gpt-4-vision-preview".to_string());
    let analysis_model = env::var("OPENAI_ANALYSIS_MODEL")
        .unwrap_or_else(|_| "gpt-4-turbo".to_string());

    let model = Arc::new(OpenAiService::new(
        api_key,
        vision_model.clone(),
        analysis_model.clone(),
    ));
    log::info!(
        "✅ OpenAI service initialized (vision: {}, analysis: {})",
        vision_model,
        analysis_model
    );

    // Analysis cache with expiry sweeper; CACHE_DISABLED=1 runs without one
    let mut sweeper = None;
    let cache: Option<Arc<dyn AnalysisCache>> = if env::var("CACHE_DISABLED").is_ok() {
        log::warn!("⚠️ Analysis cache disabled, every request will hit the model provider");
        None
    } else {
        let memory = Arc::new(MemoryCache::new());

        let mut cache_sweeper = CacheSweeper::new(memory.clone()).await?;
        cache_sweeper.start().await?;
        sweeper = Some(cache_sweeper);

        log::info!("✅ In-memory analysis cache initialized (7-day TTL)");
        Some(memory as Arc<dyn AnalysisCache>)
    };

    let analyzer = Arc::new(AnalyzeHandler::new(model, cache));
    log::info!("✅ Analyze handler initialized");

    let app = create_router(analyzer);

    let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    log::info!("🌐 Server starting on {}", bind_addr);

    tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .expect("Failed to bind server address");
        axum::serve(listener, app)
            .await
            .expect("Failed to start server");
    });

    log::info!("🎉 Ready to analyze labels!");

    // Keep running
    tokio::signal::ctrl_c().await?;

    log::info!("🛑 Shutting down...");
    if let Some(mut cache_sweeper) = sweeper {
        cache_sweeper.stop().await?;
    }

    Ok(())
}
