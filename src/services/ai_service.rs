use anyhow::Result;

/// Trait for label-reading model providers (OpenAI, OpenRouter, etc.)
///
/// Both methods return the provider's raw message content; parsing the
/// analysis into a typed result is the pipeline's job so that a malformed
/// response is distinguishable from a provider failure.
#[async_trait::async_trait]
pub trait LabelModel: Send + Sync {
    /// Transcribe the visible label text from a base64-encoded JPEG.
    async fn extract_label_text(&self, image_base64: &str) -> Result<String>;

    /// Produce the nutrition assessment (a JSON object string) for the
    /// extracted label text.
    async fn analyze_ingredients(&self, label_text: &str) -> Result<String>;
}
