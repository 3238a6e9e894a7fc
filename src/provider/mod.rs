//! Text-generation provider abstraction.
//!
//! Schedule generation needs one thing from a language model: send a prompt,
//! get the completion text back. The [`TextGenerator`] trait captures exactly
//! that, so the generation service can be tested against a stub and the HTTP
//! layer never knows which provider is wired in.
//!
//! [`groq::GroqClient`] is the production implementation, speaking the
//! OpenAI-compatible chat completions API that Groq exposes.

use async_trait::async_trait;
use thiserror::Error;

pub mod groq;

pub use groq::{GroqClient, GroqConfig};

/// Errors returned by a text-generation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The `GROQ_API_KEY` environment variable is missing or empty.
    #[error("GROQ_API_KEY environment variable is not set")]
    MissingApiKey,

    /// The HTTP request itself failed (connect, TLS, timeout, decode).
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status code.
    #[error("provider returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The provider answered 200 but the body carried no completion.
    #[error("provider response contained no choices")]
    EmptyResponse,

    /// The call exceeded the caller's time budget.
    #[error("provider call timed out after {0} seconds")]
    Timeout(u64),
}

/// A provider that turns a prompt into completion text.
///
/// Implementations must be cheap to share behind an `Arc` across request
/// handlers.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Send `prompt` and return the raw completion text.
    ///
    /// # Arguments
    /// * `prompt` - Full prompt text, sent as a single user message
    ///
    /// # Returns
    /// * `Ok(String)` - The completion content, untrimmed
    /// * `Err(ProviderError)` - Transport, API, or decode failure
    async fn complete(&self, prompt: &str) -> Result<String, ProviderError>;
}
