//! The generation capability and the adapters that turn its output into
//! typed records.
//!
//! [`Generator`] is the seam to the language model. Each concrete backend
//! (currently [`openai::OpenAiGenerator`]) is configured with one profile and
//! shared as `Arc<dyn Generator>`. [`adapter::StructuredAdapter`] pairs a
//! prompt template with an output schema and owns the single coercion step
//! from raw output to a validated record.

pub mod adapter;
pub mod openai;
pub mod template;

use async_trait::async_trait;
use serde_json::Value;

pub use adapter::{GenerationSchema, MalformedOutput, StructuredAdapter, TextAdapter, coerce};
pub use openai::{GenerationProfile, OpenAiGenerator};
pub use template::{PromptTemplate, TemplateError, Variables};

/// JSON Schema describing the record a structured request expects.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    /// Short identifier, e.g. `place_features`.
    pub name: &'static str,
    pub schema: Value,
}

/// One rendered prompt, optionally constrained to an output schema.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    /// `None` for free-text generation.
    pub schema: Option<OutputSchema>,
}

/// Raw result of a generation call.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutput {
    /// The backend already returned parsed JSON.
    Structured(Value),
    /// The backend returned text, which may hold a JSON mapping.
    Text(String),
}

/// Failure of the generation backend itself.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Black-box structured text generation.
///
/// Implementations hold no per-call state and are safe to share across
/// concurrent requests.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Name of the configured profile, for logging.
    fn profile(&self) -> &str;

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput, GenerationError>;
}

// Compile-time assertion: Generator must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Generator) {}
};
