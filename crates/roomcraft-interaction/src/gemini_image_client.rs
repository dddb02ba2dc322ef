//! GeminiImageClient - Direct REST API implementation of image editing via Gemini.
//!
//! Sends one `generateContent` request per call with the room photo as an
//! inline image part and the instruction as a text part, and returns the
//! first image part of the response.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::HeaderValue};
use roomcraft_core::config::ProviderConfig;
use roomcraft_core::transform::{ProgressPhase, ProgressSink, TransformFailure, TransformResult};
use roomcraft_core::{Credential, EncodedImage, ImageTransformer, SelectedItem};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::prompts;

/// [`ImageTransformer`] that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiImageClient {
    client: Client,
    model: String,
    base_url: String,
}

impl GeminiImageClient {
    /// Creates a client for the given model with the default endpoint.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            model: model.into(),
            base_url: roomcraft_core::config::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Creates a client from provider configuration, applying its timeout.
    pub fn from_config(config: &ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout()).build()?;
        Ok(Self {
            client,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        credential: &Credential,
        image: &EncodedImage,
        instruction: String,
        progress: &dyn ProgressSink,
    ) -> TransformResult {
        progress.report(ProgressPhase::Uploading);
        let body = build_request(image, instruction);

        let url = format!("{}/{model}:generateContent", self.base_url, model = self.model);
        tracing::info!(model = %self.model, image_bytes = image.len(), "Sending Gemini image request");

        progress.report(ProgressPhase::AwaitingGeneration);
        let response = self
            .client
            .post(url)
            .query(&[("key", credential.expose())])
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                let is_retryable = err.is_connect() || err.is_timeout();
                // The URL carries the credential; never echo it
                TransformFailure::new(format!("Gemini API request failed: {}", err.without_url()))
                    .retryable(is_retryable)
            })?;

        progress.report(ProgressPhase::Downloading);
        let status = response.status();
        if !status.is_success() {
            let retry_after = parse_retry_after(response.headers().get("retry-after"));
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            tracing::warn!(status = status.as_u16(), "Gemini image request failed");
            return Err(map_http_error(status, &body_text, retry_after));
        }

        let body_text = response.text().await.map_err(|err| {
            let is_retryable = err.is_timeout();
            TransformFailure::new(format!("Failed to read Gemini response: {}", err.without_url()))
                .retryable(is_retryable)
        })?;
        let image = decode_success_body(&body_text)?;
        tracing::info!(mime_type = image.mime_type(), image_bytes = image.len(), "Received Gemini image");
        Ok(image)
    }
}

#[async_trait]
impl ImageTransformer for GeminiImageClient {
    async fn clean_room(
        &self,
        credential: &Credential,
        image: &EncodedImage,
        progress: &dyn ProgressSink,
    ) -> TransformResult {
        self.generate(credential, image, prompts::clean_room_instruction(), progress)
            .await
    }

    async fn furnish_room(
        &self,
        credential: &Credential,
        image: &EncodedImage,
        items: &[SelectedItem],
        progress: &dyn ProgressSink,
    ) -> TransformResult {
        self.generate(credential, image, prompts::furnish_room_instruction(items), progress)
            .await
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartResponse {
    text: Option<String>,
    inline_data: Option<InlineDataPayload>,
}

fn build_request(image: &EncodedImage, instruction: String) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content {
            role: "user".to_string(),
            parts: vec![
                Part::InlineData {
                    inline_data: InlineDataPayload {
                        mime_type: image.mime_type().to_string(),
                        data: image.to_base64(),
                    },
                },
                Part::Text { text: instruction },
            ],
        }],
        generation_config: GenerationConfig {
            response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
        },
    }
}

/// Extracts the generated image from a successful response body.
///
/// A response with no image part is a failure; any text the model returned
/// instead (typically a refusal) is included in the message.
pub fn decode_success_body(body: &str) -> TransformResult {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|err| TransformFailure::new(format!("Failed to parse Gemini response: {err}")))?;

    let parts: Vec<PartResponse> = parsed
        .candidates
        .unwrap_or_default()
        .into_iter()
        .filter_map(|candidate| candidate.content)
        .flat_map(|content| content.parts)
        .collect();

    let mut texts = Vec::new();
    for part in parts {
        if let Some(inline) = part.inline_data {
            return EncodedImage::from_base64(inline.mime_type, &inline.data)
                .map_err(|err| TransformFailure::new(format!("Gemini returned an unreadable image: {err}")));
        }
        if let Some(text) = part.text {
            if !text.trim().is_empty() {
                texts.push(text);
            }
        }
    }

    if texts.is_empty() {
        Err(TransformFailure::new("Gemini API returned no image in the response candidates"))
    } else {
        Err(TransformFailure::new(format!(
            "Gemini API returned no image: {}",
            texts.join(" ")
        )))
    }
}

fn map_http_error(status: StatusCode, body: &str, retry_after: Option<Duration>) -> TransformFailure {
    TransformFailure::from_response(status.as_u16(), body).with_retry_after(retry_after)
}

fn parse_retry_after(header: Option<&HeaderValue>) -> Option<Duration> {
    let value = header?.to_str().ok()?;
    // Retry-After HTTP-date form is not used by this provider
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn png() -> EncodedImage {
        EncodedImage::new("image/png", b"\x89PNG-room".to_vec()).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let request = build_request(&png(), "remove everything".to_string());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(
            value,
            json!({
                "contents": [{
                    "role": "user",
                    "parts": [
                        {"inlineData": {"mimeType": "image/png", "data": png().to_base64()}},
                        {"text": "remove everything"}
                    ]
                }],
                "generationConfig": {"responseModalities": ["IMAGE", "TEXT"]}
            })
        );
    }

    #[test]
    fn test_decode_image_response() {
        let body = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "Here is your room"},
                        {"inlineData": {"mimeType": "image/jpeg", "data": "aGVsbG8="}}
                    ]
                }
            }]
        })
        .to_string();

        let image = decode_success_body(&body).unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.bytes(), b"hello");
    }

    #[test]
    fn test_decode_text_only_response() {
        let body = json!({
            "candidates": [{"content": {"parts": [{"text": "I cannot edit this image."}]}}]
        })
        .to_string();

        let failure = decode_success_body(&body).unwrap_err();
        assert_eq!(failure.message, "Gemini API returned no image: I cannot edit this image.");
        assert!(!failure.is_retryable);
    }

    #[test]
    fn test_decode_empty_and_malformed_responses() {
        assert!(decode_success_body(r#"{"candidates": []}"#).is_err());
        assert!(decode_success_body(r#"{}"#).is_err());
        assert!(decode_success_body(r#"{"candidates": [{}]}"#).is_err());

        let failure = decode_success_body("not json").unwrap_err();
        assert!(failure.message.starts_with("Failed to parse Gemini response"));
    }

    #[test]
    fn test_map_http_error_two_tier() {
        let structured = map_http_error(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"message":"quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
            Some(Duration::from_secs(7)),
        );
        assert_eq!(structured.message, "quota exceeded");
        assert_eq!(structured.status_code, Some(429));
        assert!(structured.is_retryable);
        assert_eq!(structured.retry_after, Some(Duration::from_secs(7)));

        let raw = map_http_error(StatusCode::BAD_REQUEST, "Bad Request: <oops>", None);
        assert_eq!(raw.message, "Bad Request: <oops>");
        assert!(!raw.is_retryable);
    }

    #[test]
    fn test_parse_retry_after() {
        let header = HeaderValue::from_static("12");
        assert_eq!(parse_retry_after(Some(&header)), Some(Duration::from_secs(12)));

        let date = HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT");
        assert_eq!(parse_retry_after(Some(&date)), None);
        assert_eq!(parse_retry_after(None), None);
    }

    #[test]
    fn test_from_config_trims_base_url() {
        let config = ProviderConfig {
            model: "image-model".to_string(),
            base_url: "http://localhost:9999/models/".to_string(),
            request_timeout_secs: 5,
        };
        let client = GeminiImageClient::from_config(&config).unwrap();
        assert_eq!(client.model(), "image-model");
        assert_eq!(client.base_url, "http://localhost:9999/models");

        let renamed = client.with_model("other");
        assert_eq!(renamed.model(), "other");
    }

    #[test]
    fn test_new_uses_default_endpoint() {
        let client = GeminiImageClient::new("image-model");
        assert_eq!(client.base_url, roomcraft_core::config::DEFAULT_BASE_URL);
    }

    #[test]
    fn test_request_serializes_without_nulls() {
        let value: Value = serde_json::to_value(build_request(&png(), "x".into())).unwrap();
        assert!(!value.to_string().contains("null"));
    }
}
