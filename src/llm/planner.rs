use crate::error::{Result, TallyError};
use crate::llm::client::GeminiClient;
use crate::llm::prompts::{chart_planner_prompt, SYSTEM_PROMPT_CHART_PLANNER};
use crate::llm::types::Content;
use crate::llm::utils::{response_schema, strip_code_fence};
use crate::payload::Payload;
use crate::render::ChartSpec;
use log::{info, warn};

/// Characters of report data shown to the model when planning a chart.
pub const PLANNER_EXCERPT_CHARS: usize = 1500;

/// Asks the model for a declarative [`ChartSpec`]. The answer is parsed and
/// validated as data; nothing the model returns is executed.
pub struct ChartPlanner {
    client: GeminiClient,
    model: String,
}

impl ChartPlanner {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub async fn plan(&self, query: &str, report_name: &str, payload: &Payload) -> Result<ChartSpec> {
        let prompt = chart_planner_prompt(query, report_name, &payload.excerpt(PLANNER_EXCERPT_CHARS));
        let raw = self
            .client
            .generate_content(
                &self.model,
                SYSTEM_PROMPT_CHART_PLANNER,
                vec![Content::user_text(prompt)],
                Some(response_schema::<ChartSpec>()?),
            )
            .await?;

        let spec = parse_chart_spec(&raw)?;
        info!("Planned {:?} chart '{}' with {} points", spec.kind, spec.title, spec.points.len());
        Ok(spec)
    }
}

/// Parses and validates a model answer into a chart spec.
pub fn parse_chart_spec(raw: &str) -> Result<ChartSpec> {
    let spec: ChartSpec = serde_json::from_str(strip_code_fence(raw)).map_err(|e| {
        warn!("Chart plan is not valid JSON: {}", e);
        TallyError::Generation(format!("chart plan did not match the expected shape: {}", e))
    })?;
    spec.validate()?;
    Ok(spec)
}
