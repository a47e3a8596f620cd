//! ElevenLabs text-to-speech.

use std::path::PathBuf;

use async_trait::async_trait;
use reel_models::JobId;
use reel_storage::AssetStore;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::error::{ensure_success, ProviderError, ProviderResult};
use crate::traits::AudioGenerator;

/// Public ElevenLabs API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";
/// "Rachel", the stock narration voice.
pub const DEFAULT_VOICE_ID: &str = "21m00Tcm4TlvDq8ikWAM";
pub const DEFAULT_MODEL_ID: &str = "eleven_monolingual_v1";

const PROVIDER: &str = "elevenlabs";

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.5,
        }
    }
}

/// ElevenLabs-backed [`AudioGenerator`] producing MP3 narration.
pub struct ElevenLabsSpeech {
    api_key: String,
    base_url: String,
    voice_id: String,
    model_id: String,
    client: Client,
    store: AssetStore,
}

impl ElevenLabsSpeech {
    pub fn new(api_key: impl Into<String>, store: AssetStore) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            voice_id: DEFAULT_VOICE_ID.to_string(),
            model_id: DEFAULT_MODEL_ID.to_string(),
            client: Client::new(),
            store,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = voice_id.into();
        self
    }
}

#[async_trait]
impl AudioGenerator for ElevenLabsSpeech {
    async fn generate(&self, narration: &str, job_id: &JobId) -> ProviderResult<PathBuf> {
        let url = format!("{}/text-to-speech/{}", self.base_url, self.voice_id);
        let request = SpeechRequest {
            text: narration,
            model_id: &self.model_id,
            voice_settings: VoiceSettings::default(),
        };

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&request)
            .send()
            .await?;
        let bytes = ensure_success(PROVIDER, response).await?.bytes().await?;
        if bytes.is_empty() {
            return Err(ProviderError::empty_response(PROVIDER, "audio"));
        }

        let asset = self.store.write_audio(job_id, "mp3", &bytes).await?;
        info!(
            job_id = %job_id,
            bytes = bytes.len(),
            path = %asset.path.display(),
            "Generated narration"
        );
        Ok(asset.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_writes_mp3_to_store() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/text-to-speech/{}", DEFAULT_VOICE_ID)))
            .and(header("xi-api-key", "el-key"))
            .and(header("accept", "audio/mpeg"))
            .and(body_json(serde_json::json!({
                "text": "Brew slowly.",
                "model_id": "eleven_monolingual_v1",
                "voice_settings": {"stability": 0.5, "similarity_boost": 0.5}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3mp3".to_vec()))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path());
        let speech = ElevenLabsSpeech::new("el-key", store.clone()).with_base_url(server.uri());
        let job = JobId::from_string("job-el");

        let path = speech.generate("Brew slowly.", &job).await.unwrap();
        assert_eq!(path, store.audio_path(&job, "mp3"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"ID3mp3");
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let speech = ElevenLabsSpeech::new("bad", AssetStore::new(dir.path())).with_base_url(server.uri());
        let err = speech.generate("x", &JobId::new()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 401, .. }));
    }
}
