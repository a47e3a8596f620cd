//! Narration with Gemini text-to-speech.

use std::path::PathBuf;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reel_media::synth::{encode_pcm_wav, PcmFormat};
use reel_media::FfmpegRunner;
use reel_models::JobId;
use reel_storage::fs_utils::{discard_file, write_atomic};
use reel_storage::AssetStore;
use tracing::info;

use super::{
    GeminiClient, GenerateContentRequest, GenerationConfig, PrebuiltVoiceConfig, SpeechConfig,
    VoiceConfig, PROVIDER,
};
use crate::error::{ProviderError, ProviderResult};
use crate::traits::AudioGenerator;

const STYLE_PREFIX: &str =
    "Narrate this with an engaging and excited tone, like a top YouTube creator unveiling a new product: ";

/// Gemini-backed [`AudioGenerator`] producing WAV narration.
pub struct GeminiSpeech {
    client: GeminiClient,
    model: String,
    voice: String,
    store: AssetStore,
    runner: FfmpegRunner,
}

impl GeminiSpeech {
    pub fn new(
        client: GeminiClient,
        model: impl Into<String>,
        voice: impl Into<String>,
        store: AssetStore,
    ) -> Self {
        Self {
            client,
            model: model.into(),
            voice: voice.into(),
            store,
            runner: FfmpegRunner::new(),
        }
    }

    /// Request speech and return the raw PCM samples with their layout.
    pub async fn synthesize_pcm(&self, narration: &str) -> ProviderResult<(Vec<u8>, PcmFormat)> {
        let request = GenerateContentRequest::text(
            format!("{}{}", STYLE_PREFIX, narration),
            GenerationConfig {
                response_modalities: vec!["AUDIO".to_string()],
                speech_config: Some(SpeechConfig {
                    voice_config: VoiceConfig {
                        prebuilt_voice_config: PrebuiltVoiceConfig {
                            voice_name: self.voice.clone(),
                        },
                    },
                }),
                ..Default::default()
            },
        );
        let response = self.client.generate_content(&self.model, &request).await?;

        let inline = response
            .inline_data("audio/")
            .ok_or_else(|| ProviderError::empty_response(PROVIDER, "audio"))?;
        let pcm = STANDARD
            .decode(inline.data.trim())
            .map_err(|e| ProviderError::invalid_response(PROVIDER, format!("audio payload is not base64: {}", e)))?;
        if pcm.is_empty() {
            return Err(ProviderError::empty_response(PROVIDER, "audio"));
        }

        Ok((pcm, pcm_format(&inline.mime_type)))
    }
}

#[async_trait]
impl AudioGenerator for GeminiSpeech {
    async fn generate(&self, narration: &str, job_id: &JobId) -> ProviderResult<PathBuf> {
        let (pcm, format) = self.synthesize_pcm(narration).await?;

        self.store.ensure().await?;
        let raw_path = self.store.scratch_path(job_id, "speech.pcm")?;
        let output = self.store.audio_path(job_id, "wav");
        write_atomic(&raw_path, &pcm).await?;

        let encoded = encode_pcm_wav(&self.runner, &raw_path, format, &output).await;
        discard_file(&raw_path).await;
        encoded?;

        info!(
            job_id = %job_id,
            sample_rate = format.sample_rate,
            bytes = pcm.len(),
            path = %output.display(),
            "Generated narration"
        );
        Ok(output)
    }
}

/// Read `rate=` from a MIME type like `audio/L16;codec=pcm;rate=24000`.
fn pcm_format(mime_type: &str) -> PcmFormat {
    let mut format = PcmFormat::default();
    for param in mime_type.split(';').skip(1) {
        if let Some(rate) = param.trim().strip_prefix("rate=") {
            if let Ok(rate) = rate.parse() {
                format.sample_rate = rate;
            }
        }
    }
    format
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_pcm_format_from_mime() {
        assert_eq!(pcm_format("audio/L16;codec=pcm;rate=16000").sample_rate, 16000);
        assert_eq!(pcm_format("audio/L16").sample_rate, 24000);
        assert_eq!(pcm_format("audio/L16").channels, 1);
    }

    #[tokio::test]
    async fn test_synthesize_pcm_sends_voice_and_style() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"parts": [{"text": format!("{}Fresh coffee.", STYLE_PREFIX)}]}],
                "generationConfig": {
                    "responseModalities": ["AUDIO"],
                    "speechConfig": {"voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Charon"}}}
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": [{
                    "inlineData": {"mimeType": "audio/L16;codec=pcm;rate=24000", "data": STANDARD.encode([0u8, 1, 2, 3])}
                }]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let speech = GeminiSpeech::new(
            GeminiClient::with_base_url("k", server.uri()),
            "gemini-2.5-flash-preview-tts",
            "Charon",
            AssetStore::new(dir.path()),
        );

        let (pcm, format) = speech.synthesize_pcm("Fresh coffee.").await.unwrap();
        assert_eq!(pcm, vec![0, 1, 2, 3]);
        assert_eq!(format.sample_rate, 24000);
    }

    #[tokio::test]
    async fn test_missing_audio_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let speech = GeminiSpeech::new(
            GeminiClient::with_base_url("k", server.uri()),
            "tts",
            "Charon",
            AssetStore::new(dir.path()),
        );
        let err = speech.generate("hi", &JobId::new()).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse { expected: "audio", .. }));
    }
}
