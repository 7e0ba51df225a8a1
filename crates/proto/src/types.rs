use serde::{Deserialize, Serialize};

/// One retrieved evidence snippet returned alongside an answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    /// Label or question text of the evidence.
    pub instruction: String,
    /// The underlying text.
    pub output: String,
    /// Relevance score between 0.0 and 1.0.
    pub similarity: f64,
    /// Provenance, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_username: Option<String>,
    /// Provenance, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    /// Provenance, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Body of `POST /query`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The user's question.
    pub question: String,
    /// Maximum number of evidence snippets to retrieve.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
}

/// Successful response of `POST /query`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The generated answer, in markdown.
    pub answer: String,
    /// Evidence used to ground the answer, most relevant first.
    #[serde(default)]
    pub context: Vec<ContextItem>,
    /// The question as understood by the backend.
    pub question: String,
}

/// Response of `GET /health`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Free-form status string, e.g. `"healthy"`.
    pub status: String,
    /// Whether the backend has finished loading its models.
    pub chatbot_ready: bool,
    /// Backend version.
    pub version: String,
}

/// Response of `GET /stats`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Number of indexed documents.
    pub total_documents: u64,
    /// Generation model identifier.
    pub model: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Generation token limit.
    pub max_tokens: u32,
    /// Default number of retrieved snippets.
    pub default_top_k: u32,
}

/// Response of `GET /config`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Default number of retrieved snippets.
    pub top_k: u32,
    /// Generation token limit.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
    /// Minimum similarity for a snippet to be returned.
    pub similarity_threshold: f64,
    /// Name of the generation provider.
    pub llm_provider: String,
    /// Generation model identifier.
    pub model: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Name of the vector collection.
    pub collection_name: String,
}
