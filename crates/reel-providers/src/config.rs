//! Provider configuration and selection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use reel_storage::AssetStore;
use tracing::{info, warn};

use crate::elevenlabs::{self, ElevenLabsSpeech};
use crate::error::ProviderError;
use crate::gemini::{self, GeminiClient, GeminiImageGenerator, GeminiScriptWriter, GeminiSpeech};
use crate::placeholder::{PlaceholderImageGenerator, PlaceholderScriptWriter, SilentAudioGenerator};
use crate::traits::{AudioGenerator, ImageGenerator, ScriptGenerator};

pub const DEFAULT_SCRIPT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-preview-image-generation";
pub const DEFAULT_TTS_MODEL: &str = "gemini-2.5-flash-preview-tts";
pub const DEFAULT_TTS_VOICE: &str = "Charon";

/// Which service narrates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioProviderKind {
    #[default]
    Gemini,
    ElevenLabs,
}

impl FromStr for AudioProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "elevenlabs" | "eleven_labs" => Ok(Self::ElevenLabs),
            other => Err(ProviderError::config_error(format!(
                "unknown AUDIO_PROVIDER '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for AudioProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioProviderKind::Gemini => f.write_str("gemini"),
            AudioProviderKind::ElevenLabs => f.write_str("elevenlabs"),
        }
    }
}

/// Backend actually used for narration after credential checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioBackend {
    Gemini,
    ElevenLabs,
    Silent,
}

/// Provider settings.
#[derive(Clone)]
pub struct ProviderConfig {
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: String,
    pub script_model: String,
    pub image_model: String,
    pub tts_model: String,
    pub tts_voice: String,
    pub audio_provider: AudioProviderKind,
    pub elevenlabs_api_key: Option<String>,
    pub elevenlabs_base_url: String,
    pub elevenlabs_voice_id: String,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_base_url", &self.gemini_base_url)
            .field("script_model", &self.script_model)
            .field("image_model", &self.image_model)
            .field("tts_model", &self.tts_model)
            .field("tts_voice", &self.tts_voice)
            .field("audio_provider", &self.audio_provider)
            .field("elevenlabs_api_key", &self.elevenlabs_api_key.as_ref().map(|_| "<redacted>"))
            .field("elevenlabs_base_url", &self.elevenlabs_base_url)
            .field("elevenlabs_voice_id", &self.elevenlabs_voice_id)
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl ProviderConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| non_empty(key).unwrap_or_else(|| default.to_string());

        let audio_provider = match non_empty("AUDIO_PROVIDER").map(|v| v.parse::<AudioProviderKind>()) {
            Some(Ok(kind)) => kind,
            Some(Err(e)) => {
                warn!("{}, using gemini", e);
                AudioProviderKind::Gemini
            }
            None => AudioProviderKind::default(),
        };

        Self {
            gemini_api_key: non_empty("GEMINI_API_KEY"),
            gemini_base_url: or_default("GEMINI_BASE_URL", gemini::DEFAULT_BASE_URL),
            script_model: or_default("GEMINI_SCRIPT_MODEL", DEFAULT_SCRIPT_MODEL),
            image_model: or_default("GEMINI_IMAGE_MODEL", DEFAULT_IMAGE_MODEL),
            tts_model: or_default("GEMINI_TTS_MODEL", DEFAULT_TTS_MODEL),
            tts_voice: or_default("GEMINI_TTS_VOICE", DEFAULT_TTS_VOICE),
            audio_provider,
            elevenlabs_api_key: non_empty("ELEVENLABS_API_KEY"),
            elevenlabs_base_url: or_default("ELEVENLABS_BASE_URL", elevenlabs::DEFAULT_BASE_URL),
            elevenlabs_voice_id: or_default("ELEVENLABS_VOICE_ID", elevenlabs::DEFAULT_VOICE_ID),
        }
    }

    /// Narration backend given the configured provider and available keys.
    pub fn audio_backend(&self) -> AudioBackend {
        match self.audio_provider {
            AudioProviderKind::ElevenLabs if self.elevenlabs_api_key.is_some() => AudioBackend::ElevenLabs,
            AudioProviderKind::Gemini if self.gemini_api_key.is_some() => AudioBackend::Gemini,
            _ => AudioBackend::Silent,
        }
    }
}

/// The three collaborators the pipeline needs.
#[derive(Clone)]
pub struct Providers {
    pub script: Arc<dyn ScriptGenerator>,
    pub image: Arc<dyn ImageGenerator>,
    pub audio: Arc<dyn AudioGenerator>,
}

/// Build providers, substituting offline placeholders for services without
/// credentials.
pub fn build_providers(config: &ProviderConfig, store: AssetStore) -> Providers {
    let gemini = config
        .gemini_api_key
        .as_ref()
        .map(|key| GeminiClient::with_base_url(key.clone(), config.gemini_base_url.clone()));

    let (script, image): (Arc<dyn ScriptGenerator>, Arc<dyn ImageGenerator>) = match &gemini {
        Some(client) => {
            info!(
                script_model = %config.script_model,
                image_model = %config.image_model,
                "Using Gemini for scripts and images"
            );
            (
                Arc::new(GeminiScriptWriter::new(client.clone(), config.script_model.clone())),
                Arc::new(GeminiImageGenerator::new(
                    client.clone(),
                    config.image_model.clone(),
                    store.clone(),
                )),
            )
        }
        None => {
            warn!("GEMINI_API_KEY not set, using placeholder scripts and images");
            (
                Arc::new(PlaceholderScriptWriter),
                Arc::new(PlaceholderImageGenerator::new(store.clone())),
            )
        }
    };

    let audio: Arc<dyn AudioGenerator> = match (config.audio_backend(), &gemini, &config.elevenlabs_api_key) {
        (AudioBackend::Gemini, Some(client), _) => {
            info!(model = %config.tts_model, voice = %config.tts_voice, "Using Gemini narration");
            Arc::new(GeminiSpeech::new(
                client.clone(),
                config.tts_model.clone(),
                config.tts_voice.clone(),
                store,
            ))
        }
        (AudioBackend::ElevenLabs, _, Some(key)) => {
            info!(voice = %config.elevenlabs_voice_id, "Using ElevenLabs narration");
            Arc::new(
                ElevenLabsSpeech::new(key.clone(), store)
                    .with_base_url(config.elevenlabs_base_url.clone())
                    .with_voice(config.elevenlabs_voice_id.clone()),
            )
        }
        _ => {
            warn!(provider = %config.audio_provider, "No narration credentials, using silent audio");
            Arc::new(SilentAudioGenerator::new(store))
        }
    };

    Providers { script, image, audio }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ProviderConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProviderConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::default();
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.script_model, "gemini-2.5-flash");
        assert_eq!(config.tts_voice, "Charon");
        assert_eq!(config.elevenlabs_voice_id, "21m00Tcm4TlvDq8ikWAM");
        assert_eq!(config.audio_backend(), AudioBackend::Silent);
    }

    #[test]
    fn test_audio_backend_selection() {
        assert_eq!(
            config(&[("GEMINI_API_KEY", "g")]).audio_backend(),
            AudioBackend::Gemini
        );
        assert_eq!(
            config(&[("AUDIO_PROVIDER", "elevenlabs"), ("ELEVENLABS_API_KEY", "e")]).audio_backend(),
            AudioBackend::ElevenLabs
        );
        assert_eq!(
            config(&[("AUDIO_PROVIDER", "ElevenLabs"), ("GEMINI_API_KEY", "g")]).audio_backend(),
            AudioBackend::Silent
        );
    }

    #[test]
    fn test_blank_values_ignored_and_unknown_provider_defaults() {
        let config = config(&[("GEMINI_API_KEY", "  "), ("AUDIO_PROVIDER", "polly")]);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.audio_provider, AudioProviderKind::Gemini);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let rendered = format!("{:?}", config(&[("GEMINI_API_KEY", "secret-key")]));
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
