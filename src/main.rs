use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use service_on_call::catalog::Catalog;
use service_on_call::config::{AppConfig, GatewayKind};
use service_on_call::gateway::memory::InMemoryGateway;
use service_on_call::gateway::rest::RestGateway;
use service_on_call::gateway::sqlite::SqliteGateway;
use service_on_call::gateway::PersistenceGateway;
use service_on_call::handlers;
use service_on_call::services::ai::gemini::GeminiProvider;
use service_on_call::services::ai::groq::GroqProvider;
use service_on_call::services::ai::ollama::OllamaProvider;
use service_on_call::services::ai::LlmProvider;
use service_on_call::services::recommendation::LlmRecommender;
use service_on_call::services::workflow::BookingWorkflow;
use service_on_call::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env()?;

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)?,
        None => Catalog::builtin()?,
    };
    tracing::info!(
        services = catalog.services.len(),
        providers = catalog.providers.len(),
        "catalog loaded"
    );

    let gateway: Arc<dyn PersistenceGateway> = match config.gateway {
        GatewayKind::Memory => {
            tracing::info!("using in-memory store with demo data");
            Arc::new(InMemoryGateway::seeded())
        }
        GatewayKind::Sqlite => {
            tracing::info!("using SQLite store ({})", config.database_url);
            Arc::new(SqliteGateway::open(
                &config.database_url,
                config.store_numeric_ids,
            )?)
        }
        GatewayKind::Rest => {
            anyhow::ensure!(
                !config.supabase_url.is_empty() && !config.supabase_anon_key.is_empty(),
                "SUPABASE_URL and SUPABASE_ANON_KEY must be set when GATEWAY=rest"
            );
            tracing::info!("using REST store ({})", config.supabase_url);
            Arc::new(RestGateway::new(
                config.supabase_url.clone(),
                config.supabase_anon_key.clone(),
                config.store_numeric_ids,
                config.http_timeout,
            )?)
        }
    };

    let llm: Box<dyn LlmProvider> = match config.llm_provider.as_str() {
        "gemini" => {
            anyhow::ensure!(!config.gemini_api_key.is_empty(), "GEMINI_API_KEY must be set when LLM_PROVIDER=gemini");
            tracing::info!("using Gemini LLM provider (model: {})", config.gemini_model);
            Box::new(GeminiProvider::new(
                config.gemini_api_key.clone(),
                config.gemini_model.clone(),
                config.http_timeout,
            )?)
        }
        "groq" => {
            anyhow::ensure!(!config.groq_api_key.is_empty(), "GROQ_API_KEY must be set when LLM_PROVIDER=groq");
            tracing::info!("using Groq LLM provider (model: {})", config.groq_model);
            Box::new(GroqProvider::new(
                config.groq_api_key.clone(),
                config.groq_model.clone(),
                config.http_timeout,
            )?)
        }
        _ => {
            tracing::info!("using Ollama LLM provider (url: {})", config.ollama_url);
            Box::new(OllamaProvider::new(
                config.ollama_url.clone(),
                config.ollama_model.clone(),
                config.http_timeout,
            )?)
        }
    };

    if config.admin_token.is_empty() {
        tracing::warn!("ADMIN_TOKEN not set, admin routes rely on X-Acting-User only");
    }

    let workflow = BookingWorkflow::new(gateway);
    if let Err(e) = workflow.refresh().await {
        tracing::warn!(error = %format!("{e:#}"), "initial refresh failed, starting with an empty view");
    }

    let state = Arc::new(AppState {
        config: config.clone(),
        catalog,
        workflow,
        recommender: Box::new(LlmRecommender::new(llm)),
    });

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
