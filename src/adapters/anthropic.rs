use crate::domain::ports::ExtractionOracle;
use crate::utils::error::{Result, ScoutError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API 上的萃取模型
pub struct AnthropicOracle {
    api_key: String,
    model: String,
    endpoint: String,
    client: Client,
}

impl AnthropicOracle {
    /// 請求不設逾時，回覆長度只受 `max_tokens` 限制
    pub fn new(api_key: &str, model: &str, base_url: &str) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            api_key: api_key.trim().to_string(),
            model: model.to_string(),
            endpoint: format!("{}/v1/messages", base_url.trim_end_matches('/')),
            client,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.api_key).map_err(|_| ScoutError::ConfigError {
                message: "invalid Anthropic API key".to_string(),
            })?,
        );
        headers.insert("anthropic-version", HeaderValue::from_static(ANTHROPIC_VERSION));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl ExtractionOracle for AnthropicOracle {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages: vec![Message {
                role: "user",
                content: vec![ContentBlock {
                    kind: "text",
                    text: prompt,
                }],
            }],
        };

        tracing::debug!("🤖 Sending extraction prompt ({} chars) to {}", prompt.len(), self.model);

        let response = self
            .client
            .post(&self.endpoint)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ScoutError::ExtractionError {
                message: format!("Anthropic returned {}: {}", status, text),
            });
        }

        let parsed: MessagesResponse = response.json().await?;
        let answer = parsed
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(text),
                ResponseBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n");

        if answer.is_empty() {
            return Err(ScoutError::ExtractionError {
                message: "Anthropic response missing text content".to_string(),
            });
        }

        Ok(answer)
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: Vec<ContentBlock<'a>>,
}

#[derive(Serialize)]
struct ContentBlock<'a> {
    #[serde(rename = "type")]
    kind: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    #[serde(other)]
    Other,
}
