//! Gemini LLM provider with native generateContent API format.

use async_trait::async_trait;
use reqwest::Client;

use super::error::LLMError;
use super::provider::{GenerateRequest, LLMProvider};

/// Gemini provider with native API format.
pub struct GeminiProvider {
    client: Client,
    base_url: String,
}

impl GeminiProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com";

    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, Self::DEFAULT_BASE_URL.to_string())
    }

    #[must_use]
    pub fn with_base_url(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate(&self, request: GenerateRequest) -> Result<String, LLMError> {
        if request.api_key.is_empty() {
            return Err(LLMError::NoApiKey);
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, request.model
        );
        let gemini_request = to_request(&request);

        let response = self
            .client
            .post(&url)
            .query(&[("key", request.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&gemini_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = match response.json::<ErrorEnvelope>().await {
                Ok(envelope) => envelope.error.message,
                Err(_) => "unknown error".to_string(),
            };
            return Err(LLMError::Api { status, message });
        }

        let gemini_response: Response = response.json().await?;
        from_response(gemini_response)
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

const TEMPERATURE: f32 = 0.7;
const TOP_K: u32 = 40;
const TOP_P: f32 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 2048;

#[derive(serde::Serialize)]
struct Request {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct Part {
    text: String,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(serde::Deserialize)]
struct Response {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(serde::Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
}

// ============================================================================
// Conversions
// ============================================================================

fn to_request(request: &GenerateRequest) -> Request {
    Request {
        contents: vec![Content {
            parts: vec![Part {
                text: request.prompt.clone(),
            }],
        }],
        generation_config: GenerationConfig {
            temperature: TEMPERATURE,
            top_k: TOP_K,
            top_p: TOP_P,
            max_output_tokens: MAX_OUTPUT_TOKENS,
            response_mime_type: request.want_json.then_some("application/json"),
        },
    }
}

fn from_response(response: Response) -> Result<String, LLMError> {
    let text = response
        .candidates
        .into_iter()
        .next()
        .map(|c| {
            c.content
                .parts
                .into_iter()
                .map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        return Err(LLMError::EmptyResponse);
    }
    Ok(text)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_request(want_json: bool) -> GenerateRequest {
        GenerateRequest {
            prompt: "Summarize this.".to_string(),
            api_key: "sk-test".to_string(),
            model: "gemini-2.5-flash-lite".to_string(),
            want_json,
        }
    }

    #[test]
    fn test_request_serialization() {
        let request = to_request(&generate_request(false));
        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains("\"contents\""));
        assert!(json.contains("\"text\":\"Summarize this.\""));
        assert!(json.contains("\"generationConfig\""));
        assert!(json.contains("\"temperature\":0.7"));
        assert!(json.contains("\"topK\":40"));
        assert!(json.contains("\"maxOutputTokens\":2048"));
        assert!(!json.contains("responseMimeType"));
    }

    #[test]
    fn test_request_serialization_with_json_response() {
        let request = to_request(&generate_request(true));
        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains("\"responseMimeType\":\"application/json\""));
    }

    #[test]
    fn test_response_extraction() {
        let json = r#"{
            "candidates": [
                {
                    "content": {
                        "parts": [
                            {"text": "Part one. "},
                            {"text": "Part two."}
                        ]
                    }
                }
            ]
        }"#;

        let response: Response = serde_json::from_str(json).unwrap();
        assert_eq!(from_response(response).unwrap(), "Part one. Part two.");
    }

    #[test]
    fn test_empty_response_is_error() {
        let response: Response = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(matches!(
            from_response(response),
            Err(LLMError::EmptyResponse)
        ));
    }

    #[test]
    fn test_error_envelope_parsing() {
        let json = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.error.message, "API key not valid");
    }

    #[tokio::test]
    async fn test_missing_api_key_is_rejected_before_sending() {
        let provider = GeminiProvider::new(Client::new());
        let mut request = generate_request(false);
        request.api_key = String::new();

        let result = provider.generate(request).await;
        assert!(matches!(result, Err(LLMError::NoApiKey)));
    }
}
