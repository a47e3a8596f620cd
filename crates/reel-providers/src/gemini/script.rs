//! Script writing with Gemini structured output.

use async_trait::async_trait;
use reel_models::ScriptDraft;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{GeminiClient, GenerateContentRequest, GenerationConfig, PROVIDER};
use crate::error::{ProviderError, ProviderResult};
use crate::traits::ScriptGenerator;

/// Gemini-backed [`ScriptGenerator`].
pub struct GeminiScriptWriter {
    client: GeminiClient,
    model: String,
}

impl GeminiScriptWriter {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn request(query: &str) -> GenerateContentRequest {
        GenerateContentRequest::text(
            format!("Create a 30-second video script about: {}", query),
            GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(json!({
                    "type": "OBJECT",
                    "properties": {
                        "narration": { "type": "STRING" },
                        "visual_prompt": {
                            "type": "ARRAY",
                            "items": { "type": "STRING" }
                        }
                    },
                    "propertyOrdering": ["narration", "visual_prompt"]
                })),
                ..Default::default()
            },
        )
    }
}

#[async_trait]
impl ScriptGenerator for GeminiScriptWriter {
    async fn generate(&self, query: &str) -> ProviderResult<ScriptDraft> {
        let response = self
            .client
            .generate_content(&self.model, &Self::request(query))
            .await?;
        let text = response
            .text()
            .ok_or_else(|| ProviderError::empty_response(PROVIDER, "script text"))?;

        let draft = parse_script_response(&text)?;
        info!(
            model = %self.model,
            scenes = draft.scene_prompts.len(),
            "Generated script"
        );
        Ok(draft)
    }
}

/// Scene entry: a bare prompt or an object holding one.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScene {
    Prompt(String),
    Object {
        #[serde(alias = "visualPrompt", alias = "prompt")]
        visual_prompt: String,
    },
}

/// Script JSON as emitted by the models we have seen.
#[derive(Debug, Deserialize)]
struct RawScript {
    #[serde(default)]
    narration: String,
    #[serde(default, alias = "visual_prompt", alias = "scenePrompts", alias = "scene_prompts")]
    scenes: Vec<RawScene>,
}

/// Parse a model response into a [`ScriptDraft`].
///
/// Accepts `{narration, visual_prompt: [..]}` and
/// `{narration, scenes: [{visual_prompt}]}`, with or without a markdown code
/// fence around the JSON. Content checks are left to [`ScriptDraft::validate`].
pub fn parse_script_response(text: &str) -> ProviderResult<ScriptDraft> {
    let json = strip_code_fence(text);
    let raw: RawScript = serde_json::from_str(json)
        .map_err(|e| ProviderError::invalid_response(PROVIDER, format!("script is not valid JSON: {}", e)))?;

    let scene_prompts = raw
        .scenes
        .into_iter()
        .map(|scene| match scene {
            RawScene::Prompt(prompt) => prompt,
            RawScene::Object { visual_prompt } => visual_prompt,
        })
        .collect();

    Ok(ScriptDraft::new(raw.narration, scene_prompts))
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string (```json)
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().trim_end_matches("```").trim()
}
