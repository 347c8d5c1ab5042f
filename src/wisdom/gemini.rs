use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::GeminiConfig;
use crate::core::GenerationError;

/// Something that turns a prompt into raw generated text.
#[async_trait]
pub trait TipGenerator: Send + Sync {
    /// Issue one generation request
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Whether a credential is configured at all
    fn has_credential(&self) -> bool;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub candidate_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];
const SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateRequest {
    pub fn new(prompt: &str, config: &GeminiConfig) -> Self {
        GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: config.temperature,
                top_k: config.top_k,
                top_p: config.top_p,
                max_output_tokens: config.max_output_tokens,
                candidate_count: 1,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: category.to_string(),
                    threshold: SAFETY_THRESHOLD.to_string(),
                })
                .collect(),
        }
    }
}

impl GenerateResponse {
    /// Text at `candidates[0].content.parts[0].text`, or why there is none.
    pub fn into_text(self) -> Result<String, GenerationError> {
        let first = self.candidates.into_iter().next();

        if let Some(candidate) = first {
            let text = candidate
                .content
                .and_then(|c| c.parts.into_iter().next())
                .and_then(|p| p.text);
            if let Some(text) = text {
                return Ok(text);
            }
            if let Some(reason) = candidate.finish_reason {
                return Err(GenerationError::ContentFiltered(reason));
            }
        }

        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(GenerationError::ContentFiltered(reason));
        }

        Err(GenerationError::MalformedResponse(
            "expected candidates[0].content.parts[0].text".to_string(),
        ))
    }
}

/// Gemini `generateContent` client
pub struct GeminiClient {
    config: GeminiConfig,
    http_client: Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, GenerationError> {
        let http_client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Ok(GeminiClient {
            config,
            http_client,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout()
    }

    fn transport_error(&self, e: reqwest::Error) -> GenerationError {
        if e.is_timeout() {
            GenerationError::Timeout(self.timeout())
        } else {
            GenerationError::Transport(e.to_string())
        }
    }

    async fn send(&self, api_key: &str, prompt: &str) -> Result<String, GenerationError> {
        let request_body = GenerateRequest::new(prompt, &self.config);

        let response = self
            .http_client
            .post(&self.config.endpoint)
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let response_json: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        response_json.into_text()
    }
}

#[async_trait]
impl TipGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or(GenerationError::MissingCredential)?;

        let timeout = self.timeout();
        debug!("🤖 Calling Gemini ({}s timeout)", timeout.as_secs());

        // Dropping the send future on expiry aborts the connection
        match tokio::time::timeout(timeout, self.send(api_key, prompt)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout(timeout)),
        }
    }

    fn has_credential(&self) -> bool {
        self.config
            .api_key
            .as_deref()
            .map_or(false, |key| !key.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn parse(value: serde_json::Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let config = GeminiConfig::default();
        let body = serde_json::to_value(GenerateRequest::new("hello", &config)).unwrap();

        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 800);
        assert_eq!(body["generationConfig"]["candidateCount"], 1);

        let settings = body["safetySettings"].as_array().unwrap();
        assert_eq!(settings.len(), 4);
        assert!(settings
            .iter()
            .all(|s| s["threshold"] == "BLOCK_MEDIUM_AND_ABOVE"));
        assert_eq!(settings[1]["category"], "HARM_CATEGORY_HATE_SPEECH");
    }

    #[test]
    fn test_response_text_extracted() {
        let response = parse(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "🌱 tip one" }], "role": "model" },
                "finishReason": "STOP"
            }]
        }));

        assert_eq!(response.into_text().unwrap(), "🌱 tip one");
    }

    #[test]
    fn test_response_blocked_by_finish_reason() {
        let response = parse(json!({
            "candidates": [{ "finishReason": "SAFETY" }]
        }));

        assert_eq!(
            response.into_text(),
            Err(GenerationError::ContentFiltered("SAFETY".to_string()))
        );
    }

    #[test]
    fn test_response_blocked_by_prompt_feedback() {
        let response = parse(json!({
            "promptFeedback": { "blockReason": "OTHER" }
        }));

        assert_eq!(
            response.into_text(),
            Err(GenerationError::ContentFiltered("OTHER".to_string()))
        );
    }

    #[test]
    fn test_response_malformed() {
        let response = parse(json!({ "candidates": [] }));
        assert!(matches!(
            response.into_text(),
            Err(GenerationError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_without_request() {
        let config = GeminiConfig {
            api_key: None,
            // unroutable; never contacted
            endpoint: "http://127.0.0.1:9/generate".to_string(),
            ..GeminiConfig::default()
        };
        let client = GeminiClient::new(config).unwrap();

        assert!(!client.has_credential());
        assert_eq!(
            client.generate("prompt").await,
            Err(GenerationError::MissingCredential)
        );
    }

    fn local_client(addr: std::net::SocketAddr, timeout_secs: u64) -> GeminiClient {
        GeminiClient::new(GeminiConfig {
            endpoint: format!("http://{}/generate", addr),
            api_key: Some("test-key".to_string()),
            timeout_secs,
            ..GeminiConfig::default()
        })
        .unwrap()
    }

    /// Read one HTTP request (headers plus Content-Length body).
    async fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    #[tokio::test]
    async fn test_unresponsive_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            // hold the connection open without answering
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(stream);
        });

        let client = local_client(addr, 1);
        let started = std::time::Instant::now();

        let result = client.generate("prompt").await;

        assert_eq!(result, Err(GenerationError::Timeout(Duration::from_secs(1))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let request = read_request(&mut stream).await;
            let body = "overloaded";
            let response = format!(
                "HTTP/1.1 503 Service Unavailable\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
            request
        });

        let result = local_client(addr, 5).generate("prompt").await;

        assert_eq!(
            result,
            Err(GenerationError::Status {
                status: 503,
                body: "overloaded".to_string()
            })
        );
        let request = server.await.unwrap();
        assert!(request.starts_with("POST /generate?key=test-key "));
        assert!(request.contains("HARM_CATEGORY_DANGEROUS_CONTENT"));
    }

    #[test]
    fn test_empty_key_is_no_credential() {
        let config = GeminiConfig {
            api_key: Some(String::new()),
            ..GeminiConfig::default()
        };
        assert!(!GeminiClient::new(config).unwrap().has_credential());
    }
}
