use crate::error::Result;
use crate::llm::client::GeminiClient;
use crate::resolver::Embedder;
use async_trait::async_trait;

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// Embeddings from the Gemini `embedContent` endpoint.
pub struct GeminiEmbedder {
    client: GeminiClient,
    model: String,
}

impl GeminiEmbedder {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn with_default_model(client: GeminiClient) -> Self {
        Self::new(client, DEFAULT_EMBEDDING_MODEL)
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.client.embed_content(&self.model, text).await
    }

    fn model_id(&self) -> String {
        format!("gemini:{}", self.model)
    }
}
