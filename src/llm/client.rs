use crate::error::{Result, TallyError};
use crate::llm::types::*;
use reqwest::Client;
use std::time::Duration;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// Reads `GEMINI_API_KEY` (or `GOOGLE_API_KEY`), loading `.env` first.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        let api_key = std::env::var("GEMINI_API_KEY")
            .or_else(|_| std::env::var("GOOGLE_API_KEY"))
            .map_err(|_| TallyError::Config("GEMINI_API_KEY is not set".to_string()))?;
        Self::new(api_key)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        }
    }

    /// Returns the first text part of the first candidate. With a schema the
    /// model is asked for JSON matching it.
    pub async fn generate_content(
        &self,
        model: &str,
        system_prompt: &str,
        messages: Vec<Content>,
        response_schema: Option<serde_json::Value>,
    ) -> Result<String> {
        let url = format!(
            "{}/{}:generateContent?key={}",
            self.base_url,
            Self::model_path(model),
            self.api_key
        );

        let system_content = Some(Content {
            role: "user".to_string(),
            parts: vec![Part::text(system_prompt)],
        });

        let payload = GenerateContentRequest {
            contents: messages,
            system_instruction: system_content,
            generation_config: GenerationConfig {
                response_mime_type: response_schema
                    .as_ref()
                    .map(|_| "application/json".to_string()),
                response_schema,
            },
        };

        let res = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TallyError::Generation(e.to_string()))?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await.unwrap_or_default();
            return Err(TallyError::Generation(format!(
                "Gemini API error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res
            .json()
            .await
            .map_err(|e| TallyError::Generation(e.to_string()))?;

        let part = body
            .candidates
            .ok_or_else(|| TallyError::Generation("No candidates returned".to_string()))?
            .first()
            .ok_or_else(|| TallyError::Generation("Empty candidates list".to_string()))?
            .content
            .parts
            .first()
            .ok_or_else(|| TallyError::Generation("No parts in content".to_string()))?
            .clone();

        match part {
            Part::Text { text } => Ok(text),
            Part::InlineData { .. } => Err(TallyError::Generation(
                "Model returned non-text content".to_string(),
            )),
        }
    }

    pub async fn embed_content(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let model_path = Self::model_path(model);
        let url = format!(
            "{}/{}:embedContent?key={}",
            self.base_url, model_path, self.api_key
        );
        let payload = EmbedContentRequest {
            model: model_path,
            content: Content::user_text(text),
        };

        let res = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| TallyError::Generation(e.to_string()))?;
        let status = res.status();
        if !status.is_success() {
            let err_text = res.text().await.unwrap_or_default();
            return Err(TallyError::Generation(format!(
                "Gemini embedding error (status {}): {}",
                status, err_text
            )));
        }

        let body: EmbedContentResponse = res
            .json()
            .await
            .map_err(|e| TallyError::Generation(e.to_string()))?;
        if body.embedding.values.is_empty() {
            return Err(TallyError::Generation("Empty embedding returned".to_string()));
        }
        Ok(body.embedding.values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_path() {
        assert_eq!(GeminiClient::model_path("gemini-2.0-flash"), "models/gemini-2.0-flash");
        assert_eq!(GeminiClient::model_path("models/text-embedding-004"), "models/text-embedding-004");
    }

    #[tokio::test]
    async fn test_unreachable_service_is_a_generation_error() {
        let client = GeminiClient::new("test-key".to_string())
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let result = client
            .generate_content("gemini-2.0-flash", "system", vec![Content::user_text("hi")], None)
            .await;
        assert!(matches!(result, Err(TallyError::Generation(_))));
    }
}
