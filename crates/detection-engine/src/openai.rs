//! Chat-completions client implementing the Reasoning Provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use shared_types::{InferenceRequest, ProviderError, ReasoningProvider};

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f64,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: String,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// OpenAI-compatible chat client. One request shape serves every
/// reasoning stage: the instruction and expected schema go into the
/// system message, the payload is the user message, and JSON mode plus
/// temperature 0 keep the output parseable and stable.
#[derive(Debug, Clone)]
pub struct ChatClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

#[async_trait]
impl ReasoningProvider for ChatClient {
    async fn infer(&self, request: InferenceRequest) -> Result<serde_json::Value, ProviderError> {
        let system = format!(
            "{}\n\nRespond with a single JSON object matching this schema:\n{}",
            request.instruction, request.schema
        );
        let chat_request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message { role: "system".to_string(), content: system },
                Message { role: "user".to_string(), content: request.payload },
            ],
            temperature: 0.0,
            response_format: ResponseFormat { r#type: "json_object".to_string() },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&chat_request)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status { status: status.as_u16(), message });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;

        let content = chat_response
            .choices
            .first()
            .map(|choice| choice.message.content.as_str())
            .ok_or_else(|| ProviderError::MalformedResponse("no choices in response".to_string()))?;

        let json = extract_json(content);
        serde_json::from_str(&json).map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }
}

/// Pull the JSON object out of a completion, stripping markdown fences
/// some models wrap around it even in JSON mode.
fn extract_json(text: &str) -> String {
    let text = text.trim();

    if text.starts_with("```") {
        if let Some(start) = text.find('\n') {
            let after_first_line = &text[start + 1..];
            if let Some(end) = after_first_line.rfind("```") {
                return after_first_line[..end].trim().to_string();
            }
        }
    }

    if let Some(start) = text.find('{') {
        if let Some(end) = text.rfind('}') {
            return text[start..=end].to_string();
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_json_plain() {
        assert_eq!(extract_json(r#"{"a": 1}"#), r#"{"a": 1}"#);
    }

    #[test]
    fn test_extract_json_fenced() {
        let fenced = "```json\n{\"items\": []}\n```";
        assert_eq!(extract_json(fenced), r#"{"items": []}"#);
    }

    #[test]
    fn test_extract_json_with_prose() {
        let noisy = "Here is the result:\n{\"issues_found\": false} hope that helps";
        assert_eq!(extract_json(noisy), r#"{"issues_found": false}"#);
    }

    #[test]
    fn test_extract_json_fence_without_newline_falls_through() {
        assert_eq!(extract_json("```{\"a\":1}```"), r#"{"a":1}"#);
    }
}
