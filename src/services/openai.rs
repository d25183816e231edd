use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::services::ai_service::LabelModel;

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Output cap for both model calls.
const MAX_TOKENS: u32 = 1000;

const EXTRACTION_PROMPT: &str =
    "Extract all text from this ingredient label exactly as it appears. \
     Do not interpret, summarize, or translate. \
     Preserve all formatting, symbols, and numbers.";

const ANALYST_SYSTEM_PROMPT: &str = r#"You're a professional nutritionist analyzing food ingredients. Provide:
1. Health status (one of: "Generally Healthy", "Exercise Caution", "Potentially Harmful")
2. Summary analysis (1-2 sentences)
3. Key ingredients analysis (5-7 most important ingredients with explanations)
4. Potential concerns (if any)
5. Recommendation (practical advice)

Format as JSON: {
  "status": "",
  "summary": "",
  "keyIngredients": [{"name": "", "analysis": ""}],
  "concerns": "",
  "recommendation": ""
}"#;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: MessageContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ContentPart {
    Text {
        #[serde(rename = "type")]
        content_type: String,
        text: String,
    },
    ImageUrl {
        #[serde(rename = "type")]
        content_type: String,
        image_url: ImageData,
    },
}

#[derive(Debug, Serialize)]
struct ImageData {
    url: String,
    detail: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// OpenAI chat-completions client for the two label-analysis calls.
pub struct OpenAiService {
    api_key: String,
    vision_model: String,
    analysis_model: String,
    client: reqwest::Client,
}

impl OpenAiService {
    pub fn new(api_key: String, vision_model: String, analysis_model: String) -> Self {
        Self {
            api_key,
            vision_model,
            analysis_model,
            client: reqwest::Client::new(),
        }
    }

    /// Send one chat request and return the first choice's content.
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        log::info!("🤖 Sending request to OpenAI with model: {}", request.model);
        log::debug!(
            "📤 Request payload size: {} bytes",
            serde_json::to_string(request)?.len()
        );

        let response = self
            .client
            .post(API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        log::debug!("📥 OpenAI response status: {}", status);

        if !status.is_success() {
            let error_text = response.text().await?;
            log::error!("❌ OpenAI API error response: {}", error_text);
            anyhow::bail!("OpenAI API error ({}): {}", status, error_text);
        }

        let chat_response: ChatResponse = response.json().await?;
        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("OpenAI returned no choices"))?;

        Ok(choice.message.content)
    }
}

#[async_trait::async_trait]
impl LabelModel for OpenAiService {
    async fn extract_label_text(&self, image_base64: &str) -> Result<String> {
        log::debug!("📸 Base64 payload size: {} chars", image_base64.len());

        // Low detail keeps the per-image token cost flat.
        let data_url = format!("data:image/jpeg;base64,{}", image_base64);

        let request = ChatRequest {
            model: self.vision_model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: MessageContent::Parts(vec![
                    ContentPart::Text {
                        content_type: "text".to_string(),
                        text: EXTRACTION_PROMPT.to_string(),
                    },
                    ContentPart::ImageUrl {
                        content_type: "image_url".to_string(),
                        image_url: ImageData {
                            url: data_url,
                            detail: "low".to_string(),
                        },
                    },
                ]),
            }],
            max_tokens: MAX_TOKENS,
            response_format: None,
        };

        let content = self.chat(&request).await?;
        log::info!("📄 Extracted {} chars of label text", content.len());

        Ok(content)
    }

    async fn analyze_ingredients(&self, label_text: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.analysis_model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: MessageContent::Text(ANALYST_SYSTEM_PROMPT.to_string()),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: MessageContent::Text(format!("INGREDIENTS:\n{}", label_text)),
                },
            ],
            max_tokens: MAX_TOKENS,
            response_format: Some(ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let content = self.chat(&request).await?;
        log::debug!("💬 Analysis model content: {}", content);

        Ok(content)
    }
}
