use std::env;

/// Runtime settings, sourced from environment variables with defaults.
///
/// Missing or malformed overrides never abort startup; the default wins and
/// genuinely invalid combinations (e.g. overlap >= chunk size) surface later
/// as configuration errors when the affected component is built.
#[derive(Debug, Clone)]
pub struct Settings {
    pub index_backend: String,
    pub chroma_host: String,
    pub chroma_port: u16,
    pub chroma_collection: String,
    pub local_index_path: String,
    pub ollama_endpoint: String,
    pub embedding_model: String,
    pub embed_dimensions: usize,
    pub llm_model: String,
    pub bind: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub feedback_path: String,
    pub http_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_backend: "chroma".to_string(),
            chroma_host: "localhost".to_string(),
            chroma_port: 8000,
            chroma_collection: "documents".to_string(),
            local_index_path: ".doclens/index.json".to_string(),
            ollama_endpoint: "http://localhost:11434".to_string(),
            embedding_model: "nomic-embed-text".to_string(),
            embed_dimensions: 768,
            llm_model: "llama3.1".to_string(),
            bind: "0.0.0.0:3000".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            feedback_path: "feedback.csv".to_string(),
            http_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        let defaults = Settings::default();
        Self {
            index_backend: env_or("DOCLENS_INDEX_BACKEND", defaults.index_backend),
            chroma_host: env_or("CHROMA_HOST", defaults.chroma_host),
            chroma_port: env_parse_or("CHROMA_PORT", defaults.chroma_port),
            chroma_collection: env_or("CHROMA_COLLECTION", defaults.chroma_collection),
            local_index_path: env_or("DOCLENS_LOCAL_INDEX_PATH", defaults.local_index_path),
            ollama_endpoint: env_or("OLLAMA_ENDPOINT", defaults.ollama_endpoint),
            embedding_model: env_or("EMBEDDING_MODEL", defaults.embedding_model),
            embed_dimensions: env_parse_or("DOCLENS_EMBED_DIMENSIONS", defaults.embed_dimensions),
            llm_model: env_or("LLM_MODEL", defaults.llm_model),
            bind: env_or("DOCLENS_BIND", defaults.bind),
            chunk_size: env_parse_or("DOCLENS_CHUNK_SIZE", defaults.chunk_size),
            chunk_overlap: env_parse_or("DOCLENS_CHUNK_OVERLAP", defaults.chunk_overlap),
            feedback_path: env_or("DOCLENS_FEEDBACK_PATH", defaults.feedback_path),
            http_timeout_secs: env_parse_or("DOCLENS_HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
        }
    }

    pub fn chroma_url(&self) -> String {
        format!("http://{}:{}", self.chroma_host, self.chroma_port)
    }
}

fn env_or(key: &str, default: String) -> String {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => value,
        _ => default,
    }
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
