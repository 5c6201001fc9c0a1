use crate::llm::client::GeminiClient;
use crate::llm::prompts::{narrator_prompt, SYSTEM_PROMPT_NARRATOR};
use crate::llm::types::{Content, Part};
use crate::llm::utils::inline_image;
use crate::pipeline::Analysis;
use log::warn;
use std::path::PathBuf;

/// Turns report data, and any rendered images, into a written answer.
pub struct Narrator {
    client: GeminiClient,
    model: String,
}

impl Narrator {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Never fails: any problem becomes an `Analysis failed: ...` answer.
    pub async fn narrate(
        &self,
        query: &str,
        data_excerpt: &str,
        images: &[PathBuf],
        rationale: &str,
    ) -> String {
        let mut parts = vec![Part::text(narrator_prompt(query, rationale, data_excerpt))];
        for path in images {
            match inline_image(path) {
                Ok(part) => parts.push(part),
                Err(e) => warn!("Skipping image {}: {}", path.display(), e),
            }
        }

        match self
            .client
            .generate_content(&self.model, SYSTEM_PROMPT_NARRATOR, vec![Content::user(parts)], None)
            .await
        {
            Ok(text) => text,
            Err(e) => failure_text(&e),
        }
    }

    pub async fn narrate_analysis(&self, query: &str, analysis: &Analysis) -> String {
        self.narrate(query, &analysis.data_excerpt, &analysis.images, &analysis.rationale)
            .await
    }
}

pub fn failure_text(error: &impl std::fmt::Display) -> String {
    format!("Analysis failed: {}", error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failures_become_text() {
        let client = GeminiClient::new("test-key".to_string())
            .unwrap()
            .with_base_url("http://127.0.0.1:9");
        let narrator = Narrator::new(client, "gemini-2.0-flash");
        let answer = narrator
            .narrate("cash balance", "{}", &[PathBuf::from("/missing.png")], "No charts needed.")
            .await;
        assert!(answer.starts_with("Analysis failed: "));
    }
}
