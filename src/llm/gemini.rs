//! Google Gemini provider implementation

use super::types::{ContentBlock, LlmRequest, LlmResponse, MessageRole, Usage};
use super::{LlmError, LlmService};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DIRECT_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    api_key: String,
    url: String,
    model_id: String,
}

impl GeminiService {
    pub fn new(
        api_key: String,
        model: &str,
        gateway: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let url = match gateway {
            Some(gw) => format!(
                "{}/gemini/v1beta/models/{model}:generateContent",
                gw.trim_end_matches('/')
            ),
            None => format!("{DIRECT_BASE}/{model}:generateContent"),
        };

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            url,
            model_id: model.to_string(),
        })
    }

    fn translate_request(request: &LlmRequest) -> GeminiRequest {
        let system_instruction = if request.system.is_empty() {
            None
        } else {
            Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart::Text {
                    text: request
                        .system
                        .iter()
                        .map(|s| s.text.as_str())
                        .collect::<Vec<_>>()
                        .join("\n\n"),
                }],
            })
        };

        let mut contents = Vec::new();
        for msg in &request.messages {
            let role = match msg.role {
                MessageRole::User => "user",
                MessageRole::Assistant => "model",
            };

            let parts: Vec<GeminiPart> = msg
                .content
                .iter()
                .map(|block| match block {
                    ContentBlock::Text { text } => GeminiPart::Text { text: text.clone() },
                    ContentBlock::ToolUse { name, input, .. } => GeminiPart::FunctionCall {
                        function_call: GeminiFunctionCall {
                            name: name.clone(),
                            args: input.clone(),
                        },
                    },
                })
                .collect();

            if !parts.is_empty() {
                contents.push(GeminiContent {
                    role: Some(role.to_string()),
                    parts,
                });
            }
        }

        let tools = if request.tools.is_empty() {
            None
        } else {
            Some(vec![GeminiTool {
                function_declarations: request
                    .tools
                    .iter()
                    .map(|t| GeminiFunctionDeclaration {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        parameters: t.input_schema.clone(),
                    })
                    .collect(),
            }])
        };

        GeminiRequest {
            contents,
            system_instruction,
            tools,
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            }),
        }
    }

    fn normalize_response(resp: GeminiResponse) -> Result<LlmResponse, LlmError> {
        let candidate = resp
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::unknown("No candidates in response"))?;

        let mut content = Vec::new();
        let parts = candidate.content.map(|c| c.parts).unwrap_or_default();

        for (index, part) in parts.into_iter().enumerate() {
            match part {
                GeminiPart::Text { text } => {
                    if !text.is_empty() {
                        content.push(ContentBlock::Text { text });
                    }
                }
                GeminiPart::FunctionCall { function_call } => {
                    // Gemini doesn't assign call IDs
                    content.push(ContentBlock::ToolUse {
                        id: format!("call_{index}_{}", function_call.name),
                        name: function_call.name,
                        input: function_call.args,
                    });
                }
            }
        }

        let end_turn = candidate.finish_reason.is_some_and(|r| r == "STOP");
        let usage = resp.usage_metadata.unwrap_or_default();

        Ok(LlmResponse {
            content,
            end_turn,
            usage: Usage {
                input_tokens: u64::from(usage.prompt_token_count),
                output_tokens: u64::from(usage.candidates_token_count),
            },
        })
    }
}

#[async_trait]
impl LlmService for GeminiService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let gemini_request = Self::translate_request(request);

        let mut builder = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&gemini_request);
        if self.api_key != "implicit" {
            builder = builder.header("x-goog-api-key", &self.api_key);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                LlmError::network(format!("Connection failed: {e}"))
            } else {
                LlmError::unknown(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LlmError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            if let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(&body) {
                let message = error_resp.error.message;
                return Err(match status.as_u16() {
                    400 => LlmError::invalid_request(format!("Invalid request: {message}")),
                    401 | 403 => LlmError::auth(format!("Authentication failed: {message}")),
                    429 => LlmError::rate_limit(format!("Rate limit exceeded: {message}")),
                    500..=599 => LlmError::server_error(format!("Server error: {message}")),
                    _ => LlmError::unknown(format!("HTTP {status}: {message}")),
                });
            }
            return Err(LlmError::unknown(format!("HTTP {status} error: {body}")));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Self::normalize_response(gemini_response)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
