//! Infrastructure traits, used for DI on higher levels

use crate::infrastructure::pdf::ExtractError;
use async_trait::async_trait;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generates a reply for `prompt`.
    ///
    /// Upstream failures are reported as the returned text, never as an error.
    async fn generate(&self, prompt: &str) -> String;
}

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extracts the text of every page, in page order, concatenated.
    async fn extract(&self, document: Vec<u8>) -> Result<String, ExtractError>;
}
