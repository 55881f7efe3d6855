use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Which persistence backend the workflow talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GatewayKind {
    Memory,
    Sqlite,
    Rest,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub gateway: GatewayKind,
    pub database_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub store_numeric_ids: bool,
    pub llm_provider: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub groq_api_key: String,
    pub groq_model: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub http_timeout: Duration,
    /// Empty disables the admin bearer check.
    pub admin_token: String,
    pub catalog_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let gateway = match env::var("GATEWAY").unwrap_or_default().to_lowercase().as_str() {
            "" | "memory" => GatewayKind::Memory,
            "sqlite" => GatewayKind::Sqlite,
            "rest" | "supabase" => GatewayKind::Rest,
            other => anyhow::bail!("unknown GATEWAY: {other} (expected memory, sqlite or rest)"),
        };

        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            gateway,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "service_on_call.db".to_string()),
            supabase_url: env::var("SUPABASE_URL").unwrap_or_default(),
            supabase_anon_key: env::var("SUPABASE_ANON_KEY").unwrap_or_default(),
            store_numeric_ids: env::var("STORE_NUMERIC_IDS")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            llm_provider: env::var("LLM_PROVIDER")
                .unwrap_or_else(|_| "ollama".to_string())
                .to_lowercase(),
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            groq_api_key: env::var("GROQ_API_KEY").unwrap_or_default(),
            groq_model: env::var("GROQ_MODEL")
                .unwrap_or_else(|_| "llama-3.3-70b-versatile".to_string()),
            ollama_url: env::var("OLLAMA_URL")
                .unwrap_or_else(|_| "http://localhost:11434".to_string()),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama3.2".to_string()),
            http_timeout: Duration::from_secs(
                env::var("HTTP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_default(),
            catalog_path: env::var("CATALOG_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}
