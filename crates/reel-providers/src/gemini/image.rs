//! Scene images from Gemini's image-capable models.

use std::path::PathBuf;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reel_models::JobId;
use reel_storage::AssetStore;
use tracing::{debug, info};

use super::{GeminiClient, GenerateContentRequest, GenerationConfig, PROVIDER};
use crate::error::{ProviderError, ProviderResult};
use crate::traits::ImageGenerator;

/// Gemini-backed [`ImageGenerator`].
pub struct GeminiImageGenerator {
    client: GeminiClient,
    model: String,
    store: AssetStore,
}

impl GeminiImageGenerator {
    pub fn new(client: GeminiClient, model: impl Into<String>, store: AssetStore) -> Self {
        Self {
            client,
            model: model.into(),
            store,
        }
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageGenerator {
    async fn generate(&self, prompt: &str, job_id: &JobId, scene_index: usize) -> ProviderResult<PathBuf> {
        let request = GenerateContentRequest::text(
            prompt,
            GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
                ..Default::default()
            },
        );
        let response = self.client.generate_content(&self.model, &request).await?;

        if let Some(text) = response.text() {
            debug!(job_id = %job_id, scene_index, "Image model commentary: {}", text);
        }
        let inline = response
            .inline_data("image/")
            .ok_or_else(|| ProviderError::empty_response(PROVIDER, "image"))?;
        let bytes = STANDARD
            .decode(inline.data.trim())
            .map_err(|e| ProviderError::invalid_response(PROVIDER, format!("image payload is not base64: {}", e)))?;
        if bytes.is_empty() {
            return Err(ProviderError::empty_response(PROVIDER, "image"));
        }

        let asset = self
            .store
            .write_image(job_id, scene_index, extension_for(&inline.mime_type), &bytes)
            .await?;
        info!(
            job_id = %job_id,
            scene_index,
            bytes = bytes.len(),
            path = %asset.path.display(),
            "Generated scene image"
        );
        Ok(asset.path)
    }
}

fn extension_for(mime_type: &str) -> &'static str {
    match mime_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "png",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-2.0-flash-preview-image-generation";

    async fn server_returning(body: serde_json::Value) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", MODEL)))
            .and(body_partial_json(serde_json::json!({
                "generationConfig": {"responseModalities": ["TEXT", "IMAGE"]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_writes_decoded_image_to_store() {
        let server = server_returning(serde_json::json!({
            "candidates": [{"content": {"parts": [
                {"text": "A steaming cup."},
                {"inlineData": {"mimeType": "image/png", "data": STANDARD.encode(b"\x89PNG fake")}}
            ]}}]
        }))
        .await;
        let dir = TempDir::new().unwrap();
        let store = AssetStore::new(dir.path());
        let generator = GeminiImageGenerator::new(
            GeminiClient::with_base_url("k", server.uri()),
            MODEL,
            store.clone(),
        );
        let job = JobId::from_string("job-img");

        let path = generator.generate("a cup", &job, 2).await.unwrap();

        assert_eq!(path, store.image_path(&job, 2, "png"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"\x89PNG fake");
    }

    #[tokio::test]
    async fn test_text_only_response_fails_closed() {
        let server = server_returning(serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "I cannot draw that."}]}}]
        }))
        .await;
        let dir = TempDir::new().unwrap();
        let generator = GeminiImageGenerator::new(
            GeminiClient::with_base_url("k", server.uri()),
            MODEL,
            AssetStore::new(dir.path()),
        );

        let err = generator.generate("x", &JobId::new(), 0).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyResponse { expected: "image", .. }));
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/png"), "png");
        assert_eq!(extension_for("image/unknown"), "png");
    }
}
