use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::llm::types::{ChatMessage, Completion, ContentBlock, LlmError};
use crate::tools::ToolDefinition;

#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    headers: header::HeaderMap,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<&'a ToolDefinition>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

impl AnthropicClient {
    pub fn new(
        api_key: &str,
        endpoint: &str,
        model: &str,
        max_tokens: u32,
    ) -> Result<Self, String> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        headers.insert(
            "anthropic-version",
            header::HeaderValue::from_static("2023-06-01"),
        );
        let key_value = header::HeaderValue::from_str(api_key)
            .map_err(|e| format!("Invalid API key format: {}", e))?;
        headers.insert("x-api-key", key_value);

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(AnthropicClient {
            client,
            headers,
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            max_tokens,
        })
    }

    /// One request to the messages API, with bounded retry on transient
    /// failures (network errors, 429, 502, 503, 504).
    pub async fn complete(
        &self,
        system: &str,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<Completion, LlmError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: if system.is_empty() { None } else { Some(system) },
            messages,
            tools: tools.iter().collect(),
        };

        log::info!(
            "[LLM] Request to {} (model: {}, messages: {}, tools: {})",
            self.endpoint,
            self.model,
            messages.len(),
            tools.len()
        );
        log::debug!(
            "[LLM] Full request:\n{}",
            serde_json::to_string_pretty(&request).unwrap_or_default()
        );

        const MAX_RETRIES: u32 = 3;
        const BASE_DELAY_MS: u64 = 2000;

        let mut last_error: Option<LlmError> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 2s, 4s, 8s
                let delay_ms = BASE_DELAY_MS * (1 << (attempt - 1));
                log::warn!(
                    "[LLM] Retry attempt {}/{} after {}ms delay",
                    attempt,
                    MAX_RETRIES,
                    delay_ms
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let response = match self
                .client
                .post(&self.endpoint)
                .headers(self.headers.clone())
                .json(&request)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    let message = format!("Request failed: {}", e);
                    if attempt < MAX_RETRIES {
                        log::warn!("[LLM] {} (attempt {}), will retry", message, attempt + 1);
                        last_error = Some(LlmError::new(message));
                        continue;
                    }
                    return Err(LlmError::new(message));
                }
            };

            let status = response.status();
            let status_code = status.as_u16();

            if !status.is_success() {
                let error_text = response.text().await.unwrap_or_default();
                let is_retryable = matches!(status_code, 429 | 502 | 503 | 504);

                if is_retryable && attempt < MAX_RETRIES {
                    log::warn!(
                        "[LLM] Received retryable status {} (attempt {}), will retry: {}",
                        status,
                        attempt + 1,
                        error_preview(&error_text)
                    );
                    last_error = Some(LlmError::with_status(error_text, status_code));
                    continue;
                }

                let message =
                    if let Ok(parsed) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                        parsed.error.message
                    } else {
                        format!("HTTP {}: {}", status, error_preview(&error_text))
                    };
                return Err(LlmError::with_status(message, status_code));
            }

            let body = response
                .text()
                .await
                .map_err(|e| LlmError::new(format!("Failed to read response body: {}", e)))?;

            let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
                LlmError::new(format!("Failed to parse messages response: {}", e))
            })?;

            log::info!(
                "[LLM] Completion received (blocks: {}, stop_reason: {:?})",
                parsed.content.len(),
                parsed.stop_reason
            );

            return Ok(Completion {
                content: parsed.content,
                stop_reason: parsed.stop_reason,
            });
        }

        Err(last_error.unwrap_or_else(|| LlmError::new("Retries exhausted")))
    }
}

/// First 200 chars of an upstream error body, cut on a char boundary so a
/// multibyte payload can't panic the error path.
fn error_preview(body: &str) -> String {
    if body.chars().count() > 200 {
        format!("{}...", body.chars().take(200).collect::<String>())
    } else {
        body.to_string()
    }
}
