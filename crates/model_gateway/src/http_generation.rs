//! JSON-over-HTTP image generation backend.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use verdant_core::{
    config::GenerationConfig,
    traits::{GenerationBackend, GenerationOutput, GenerationRequest},
    Error, Result,
};

use crate::openai::transport_error;

/// MIME type assumed when neither the service nor the bytes say otherwise.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

/// Posts `{prompt, images, language, image_count}` and reads back
/// `{text, images, mime_types}`, images base64-encoded both ways.
pub struct HttpGenerationBackend {
    id: String,
    endpoint: String,
    client: reqwest::Client,
    api_key: Option<Secret<String>>,
}

impl HttpGenerationBackend {
    pub fn new(id: impl Into<String>, endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            id: id.into(),
            endpoint: endpoint.into(),
            client,
            api_key: None,
        })
    }

    /// Build from configuration; `None` when no endpoint is configured.
    pub fn from_config(config: &GenerationConfig) -> Result<Option<Self>> {
        let Some(endpoint) = config.endpoint.as_deref().filter(|e| !e.trim().is_empty()) else {
            return Ok(None);
        };
        let mut backend = Self::new(
            config.backend_id.clone(),
            endpoint,
            Duration::from_secs(config.timeout_secs),
        )?;
        backend.api_key = config.api_key.clone();
        Ok(Some(backend))
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = &self.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key.expose_secret()))
                    .map_err(|e| Error::config(format!("Invalid API key header: {}", e)))?,
            );
        }
        Ok(headers)
    }
}

#[derive(Debug, Serialize)]
struct WireRequest<'a> {
    prompt: &'a str,
    images: Vec<String>,
    language: &'a str,
    image_count: u32,
}

#[derive(Debug, Default, Deserialize)]
struct WireResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    mime_types: Vec<String>,
}

fn decode_output(wire: WireResponse) -> Result<GenerationOutput> {
    let images = wire
        .images
        .iter()
        .map(|encoded| {
            STANDARD
                .decode(encoded.trim())
                .map(Bytes::from)
                .map_err(|e| Error::generation_backend(format!("Invalid image payload: {}", e)))
        })
        .collect::<Result<Vec<_>>>()?;

    let mime_types = images
        .iter()
        .enumerate()
        .map(|(i, data)| {
            wire.mime_types
                .get(i)
                .filter(|m| !m.trim().is_empty())
                .cloned()
                .unwrap_or_else(|| sniff_mime(data).to_string())
        })
        .collect();

    Ok(GenerationOutput {
        text: wire.text.filter(|t| !t.trim().is_empty()),
        images,
        mime_types,
    })
}

/// MIME type guessed from magic bytes.
pub fn sniff_mime(data: &[u8]) -> &'static str {
    image::guess_format(data)
        .map(|format| format.to_mime_type())
        .unwrap_or(DEFAULT_IMAGE_MIME)
}

#[async_trait]
impl GenerationBackend for HttpGenerationBackend {
    fn id(&self) -> &str {
        &self.id
    }

    async fn generate(&self, request: GenerationRequest) -> Result<GenerationOutput> {
        let body = WireRequest {
            prompt: &request.prompt,
            images: request.images.iter().map(|b| STANDARD.encode(b)).collect(),
            language: &request.language,
            image_count: request.image_count,
        };

        tracing::debug!(
            backend = %self.id,
            images = body.images.len(),
            image_count = request.image_count,
            "Calling generation backend"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, |msg| Error::generation_backend(msg)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::generation_backend(format!("HTTP {}: {}", status, text)));
        }

        let wire: WireResponse = response
            .json()
            .await
            .map_err(|e| Error::generation_backend(format!("Malformed generation response: {}", e)))?;
        decode_output(wire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
    const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10];

    #[test]
    fn test_mime_sniffing() {
        assert_eq!(sniff_mime(PNG_MAGIC), "image/png");
        assert_eq!(sniff_mime(JPEG_MAGIC), "image/jpeg");
        assert_eq!(sniff_mime(b"not an image"), DEFAULT_IMAGE_MIME);
    }

    #[test]
    fn test_decode_fills_missing_mime_types() {
        let wire = WireResponse {
            text: Some("  ".to_string()),
            images: vec![STANDARD.encode(JPEG_MAGIC), STANDARD.encode(PNG_MAGIC)],
            mime_types: vec!["image/webp".to_string()],
        };
        let output = decode_output(wire).unwrap();
        assert_eq!(output.images.len(), 2);
        assert_eq!(output.mime_types, ["image/webp", "image/png"]);
        assert!(output.text.is_none());
    }

    #[test]
    fn test_decode_rejects_bad_base64() {
        let wire = WireResponse {
            images: vec!["***".to_string()],
            ..WireResponse::default()
        };
        assert_eq!(decode_output(wire).unwrap_err().category(), "generation_backend");
    }

    #[test]
    fn test_from_config_requires_endpoint() {
        assert!(HttpGenerationBackend::from_config(&GenerationConfig::default())
            .unwrap()
            .is_none());

        let config = GenerationConfig {
            endpoint: Some("http://localhost:9000/generate".to_string()),
            ..GenerationConfig::default()
        };
        let backend = HttpGenerationBackend::from_config(&config).unwrap().unwrap();
        assert_eq!(backend.id(), config.backend_id);
    }
}
