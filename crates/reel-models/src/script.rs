//! Video scripts.
//!
//! Script writers return a loosely-checked [`ScriptDraft`]; the pipeline only
//! ever works with a validated [`Script`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Script validation failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("malformed script: narration is empty")]
    EmptyNarration,

    #[error("malformed script: no scene prompts")]
    NoScenes,

    #[error("malformed script: scene prompt {0} is empty")]
    BlankScenePrompt(usize),
}

/// Unvalidated script as returned by a script writer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptDraft {
    pub narration: String,
    pub scene_prompts: Vec<String>,
}

impl ScriptDraft {
    pub fn new(narration: impl Into<String>, scene_prompts: Vec<String>) -> Self {
        Self {
            narration: narration.into(),
            scene_prompts,
        }
    }

    /// Validate the draft into a [`Script`].
    ///
    /// Narration and every scene prompt must contain non-whitespace text and
    /// there must be at least one scene. Surrounding whitespace is trimmed.
    pub fn validate(self) -> Result<Script, ScriptError> {
        let narration = self.narration.trim();
        if narration.is_empty() {
            return Err(ScriptError::EmptyNarration);
        }
        if self.scene_prompts.is_empty() {
            return Err(ScriptError::NoScenes);
        }

        let mut scene_prompts = Vec::with_capacity(self.scene_prompts.len());
        for (index, prompt) in self.scene_prompts.iter().enumerate() {
            let prompt = prompt.trim();
            if prompt.is_empty() {
                return Err(ScriptError::BlankScenePrompt(index));
            }
            scene_prompts.push(prompt.to_string());
        }

        Ok(Script {
            narration: narration.to_string(),
            scene_prompts,
        })
    }
}

/// A validated script: non-empty narration and at least one scene prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    narration: String,
    scene_prompts: Vec<String>,
}

impl Script {
    /// Narration text for speech synthesis.
    pub fn narration(&self) -> &str {
        &self.narration
    }

    /// Scene prompts in scene order.
    pub fn scene_prompts(&self) -> &[String] {
        &self.scene_prompts
    }

    /// Number of scenes (always at least one).
    pub fn scene_count(&self) -> usize {
        self.scene_prompts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(narration: &str, prompts: &[&str]) -> ScriptDraft {
        ScriptDraft::new(narration, prompts.iter().map(|p| p.to_string()).collect())
    }

    #[test]
    fn test_valid_draft() {
        let script = draft("  Brewing coffee, step by step. ", &["beans", " grinder "])
            .validate()
            .unwrap();
        assert_eq!(script.narration(), "Brewing coffee, step by step.");
        assert_eq!(script.scene_prompts(), &["beans", "grinder"]);
        assert_eq!(script.scene_count(), 2);
    }

    #[test]
    fn test_empty_narration_rejected() {
        assert_eq!(draft("   ", &["a"]).validate(), Err(ScriptError::EmptyNarration));
    }

    #[test]
    fn test_zero_scenes_rejected() {
        assert_eq!(draft("text", &[]).validate(), Err(ScriptError::NoScenes));
    }

    #[test]
    fn test_blank_prompt_rejected() {
        assert_eq!(
            draft("text", &["a", "  "]).validate(),
            Err(ScriptError::BlankScenePrompt(1))
        );
    }

    #[test]
    fn test_error_messages_mention_malformed() {
        assert!(ScriptError::NoScenes.to_string().starts_with("malformed script"));
    }

    #[test]
    fn test_script_serializes_camel_case() {
        let script = draft("n", &["p"]).validate().unwrap();
        let value = serde_json::to_value(&script).unwrap();
        assert_eq!(value["narration"], "n");
        assert_eq!(value["scenePrompts"][0], "p");
    }
}
