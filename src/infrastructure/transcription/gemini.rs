//! Gemini API transcriber adapter

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ApiKeySource, Transcriber, TranscriptionError};
use crate::domain::transcription::{AudioData, Instruction};

/// Gemini API model to use
const DEFAULT_MODEL: &str = "gemini-1.5-flash-latest";

/// Gemini API base URL
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// API error statuses that are certain to recur; exact-matched
const FATAL_STATUSES: &[&str] = &[
    "INVALID_ARGUMENT",
    "PERMISSION_DENIED",
    "UNAUTHENTICATED",
    "FAILED_PRECONDITION",
];

// Request types for Gemini API

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

// Response types for Gemini API

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
    status: Option<String>,
}

/// Gemini API transcriber.
///
/// The API key is re-read from its source on every call, so a credential
/// changed mid-recording takes effect immediately.
pub struct GeminiTranscriber {
    keys: Arc<dyn ApiKeySource>,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiTranscriber {
    /// Create a new Gemini transcriber reading its key from the given source
    pub fn new(keys: Arc<dyn ApiKeySource>) -> Self {
        Self {
            keys,
            model: DEFAULT_MODEL.to_string(),
            base_url: API_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Use a custom model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a custom API base URL (tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Build the API URL
    fn api_url(&self, api_key: &str) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        )
    }

    /// Build the request body: the instruction text plus the inline payload
    fn build_request(audio: &AudioData, instruction: &Instruction) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part {
                        text: Some(instruction.content().to_string()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: audio.mime_type().to_string(),
                            data: audio.to_base64(),
                        }),
                    },
                ],
            }],
        }
    }

    /// Extract text from response
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let parts: Vec<&str> = response
            .candidates
            .as_ref()?
            .first()?
            .content
            .as_ref()?
            .parts
            .as_ref()?
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if parts.is_empty() {
            None
        } else {
            Some(parts.join(""))
        }
    }

    /// Classify a non-success response.
    ///
    /// HTTP 400/401/403 and the exact-matched fatal API statuses never
    /// recover on retry; everything else (5xx, 429, unknown statuses) is
    /// worth retrying.
    fn classify_failure(
        http_status: reqwest::StatusCode,
        error: Option<ApiError>,
    ) -> TranscriptionError {
        let api_status = error
            .as_ref()
            .and_then(|e| e.status.as_deref())
            .unwrap_or("")
            .to_ascii_uppercase();
        let message = error
            .map(|e| e.message)
            .unwrap_or_else(|| format!("HTTP {}", http_status));

        if http_status == reqwest::StatusCode::UNAUTHORIZED || api_status == "UNAUTHENTICATED" {
            return TranscriptionError::InvalidApiKey;
        }
        if http_status == reqwest::StatusCode::BAD_REQUEST
            || http_status == reqwest::StatusCode::FORBIDDEN
            || FATAL_STATUSES.contains(&api_status.as_str())
        {
            return TranscriptionError::InvalidRequest(message);
        }
        if http_status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return TranscriptionError::RateLimited;
        }
        TranscriptionError::ApiError(format!("HTTP {}: {}", http_status, message))
    }
}

#[async_trait]
impl Transcriber for GeminiTranscriber {
    async fn transcribe(
        &self,
        audio: &AudioData,
        instruction: &Instruction,
    ) -> Result<String, TranscriptionError> {
        let api_key = self
            .keys
            .current()
            .await
            .ok_or(TranscriptionError::MissingApiKey)?;
        let url = self.api_url(&api_key);
        let body = Self::build_request(audio, instruction);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TranscriptionError::RequestFailed(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            let error = response
                .json::<GenerateContentResponse>()
                .await
                .ok()
                .and_then(|r| r.error);
            return Err(Self::classify_failure(status, error));
        }

        let response: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::ParseError(e.to_string()))?;

        // Some API failures come back in a 200 body
        if let Some(error) = response.error {
            return Err(Self::classify_failure(status, Some(error)));
        }

        let text = Self::extract_text(&response).ok_or(TranscriptionError::EmptyResponse)?;

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(TranscriptionError::EmptyResponse);
        }

        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::StaticKey;
    use crate::domain::transcription::AudioMimeType;

    fn transcriber() -> GeminiTranscriber {
        GeminiTranscriber::new(Arc::new(StaticKey::new("test-key")))
    }

    #[test]
    fn build_request_carries_instruction_then_audio() {
        let audio = AudioData::new(vec![1, 2, 3], AudioMimeType::Flac);
        let request = GeminiTranscriber::build_request(&audio, &Instruction::default());

        assert_eq!(request.contents.len(), 1);
        let parts = &request.contents[0].parts;
        assert_eq!(parts.len(), 2);
        assert!(parts[0].text.as_deref().unwrap().contains("Transcribe"));
        assert!(parts[0].inline_data.is_none());

        let inline = parts[1].inline_data.as_ref().unwrap();
        assert_eq!(inline.mime_type, "audio/flac");
        assert_eq!(inline.data, audio.to_base64());
    }

    #[test]
    fn api_url_contains_model_and_key() {
        let url = transcriber().api_url("test-key");

        assert!(url.contains("gemini-1.5-flash-latest"));
        assert!(url.contains("test-key"));
        assert!(url.contains("generateContent"));
    }

    #[test]
    fn custom_model() {
        let transcriber = transcriber().with_model("gemini-1.5-pro");
        assert!(transcriber.api_url("k").contains("gemini-1.5-pro"));
    }

    #[test]
    fn extract_text_from_response() {
        let response = GenerateContentResponse {
            candidates: Some(vec![Candidate {
                content: Some(CandidateContent {
                    parts: Some(vec![ResponsePart {
                        text: Some("Hello world".to_string()),
                    }]),
                }),
            }]),
            error: None,
        };

        let text = GeminiTranscriber::extract_text(&response);
        assert_eq!(text, Some("Hello world".to_string()));
    }

    #[test]
    fn extract_text_empty_response() {
        let response = GenerateContentResponse {
            candidates: None,
            error: None,
        };

        assert!(GeminiTranscriber::extract_text(&response).is_none());
    }

    fn api_error(status: &str) -> Option<ApiError> {
        Some(ApiError {
            message: "boom".to_string(),
            status: Some(status.to_string()),
        })
    }

    #[test]
    fn classify_bad_credentials_as_invalid_key() {
        let err = GeminiTranscriber::classify_failure(
            reqwest::StatusCode::UNAUTHORIZED,
            api_error("UNAUTHENTICATED"),
        );
        assert!(matches!(err, TranscriptionError::InvalidApiKey));
        assert!(err.is_fatal());
    }

    #[test]
    fn classify_http_400_and_403_as_fatal() {
        for code in [reqwest::StatusCode::BAD_REQUEST, reqwest::StatusCode::FORBIDDEN] {
            let err = GeminiTranscriber::classify_failure(code, None);
            assert!(matches!(err, TranscriptionError::InvalidRequest(_)));
            assert!(err.is_fatal());
        }
    }

    #[test]
    fn classify_fatal_statuses_regardless_of_http_code() {
        // FAILED_PRECONDITION often arrives as HTTP 429 on free-tier keys
        let err = GeminiTranscriber::classify_failure(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            api_error("FAILED_PRECONDITION"),
        );
        assert!(matches!(err, TranscriptionError::InvalidRequest(_)));
    }

    #[test]
    fn classify_rate_limit_as_transient() {
        let err = GeminiTranscriber::classify_failure(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            api_error("RESOURCE_EXHAUSTED"),
        );
        assert!(matches!(err, TranscriptionError::RateLimited));
        assert!(err.is_transient());
    }

    #[test]
    fn classify_server_errors_as_transient() {
        let err = GeminiTranscriber::classify_failure(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            None,
        );
        assert!(matches!(err, TranscriptionError::ApiError(_)));
        assert!(err.is_transient());
    }
}
