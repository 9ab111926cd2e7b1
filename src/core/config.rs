use std::env;

/// Runtime configuration, environment-derived with the same defaults the
/// docker-compose setup assumes.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    pub collection: String,
    /// Dense embedding model id, resolved by the embeddings endpoint.
    pub embedding_model: String,
    pub embedding_dim: u64,
    /// OpenAI-compatible base URL, `/chat/completions` and `/embeddings`
    /// are appended to it.
    pub llm_base_url: String,
    pub llm_api_key: String,
    pub llm_model: String,
    pub database_url: String,
    /// Documents handed to the prompt builder per query.
    pub top_k: usize,
    /// Upper bound for each external call (Qdrant query, LLM request).
    pub request_timeout_secs: u64,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Self {
        let qdrant_host = env_or("QDRANT_HOST", "localhost");
        let qdrant_port = env_or("QDRANT_PORT", "6334");

        Self {
            qdrant_url: format!("http://{}:{}", qdrant_host, qdrant_port),
            collection: env_or("QDRANT_COLLECTION", "squad_v2"),
            embedding_model: env_or("EMBEDDING_MODEL", "jinaai/jina-embeddings-v2-small-en"),
            embedding_dim: env_or("EMBEDDING_DIM", "512").parse().unwrap_or(512),
            llm_base_url: env_or("LLM_BASE_URL", "https://api.groq.com/openai/v1"),
            llm_api_key: env_or("GROQ_API_KEY", ""),
            llm_model: env_or("LLM_MODEL", "openai/gpt-oss-20b"),
            database_url: database_url_from_env(),
            top_k: env_or("RAG_TOP_K", "2").parse().unwrap_or(2),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", "30").parse().unwrap_or(30),
            port: env_or("PORT", "8080").parse().unwrap_or(8080),
        }
    }
}

/// `DATABASE_URL` wins; otherwise the URL is assembled from the individual
/// `POSTGRES_*` variables the original compose file exports.
fn database_url_from_env() -> String {
    if let Ok(url) = env::var("DATABASE_URL") {
        return url;
    }

    let host = env_or("POSTGRES_HOST", "localhost");
    let port = env_or("POSTGRES_PORT", "5432");
    let db = env_or("POSTGRES_DB", "llm_project");
    let user = env_or("POSTGRES_USER", "postgres");
    let password = env_or("POSTGRES_PASSWORD", "postgres");

    format!("postgresql://{user}:{password}@{host}:{port}/{db}")
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
