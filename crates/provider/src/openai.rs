//! OpenAI-compatible chat completions
//!
//! Serves OpenAI, OpenRouter and a local Ollama server; they differ only in
//! base URL and whether a bearer token is sent.

use crate::*;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, trace, warn};

pub struct OpenAiProvider {
    client: Client,
    api_key: Option<String>,
    api_base: String,
    default_model: String,
    key_optional: bool,
}

impl OpenAiProvider {
    pub fn new(
        api_key: Option<String>,
        api_base: impl Into<String>,
        default_model: impl Into<String>,
    ) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
            api_base,
            default_model: default_model.into(),
            key_optional: false,
        }
    }

    /// Treat the provider as usable without a key (self-hosted servers)
    pub fn allow_missing_key(mut self) -> Self {
        self.key_optional = true;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Local servers (Ollama) accept requests without a key
    fn is_local(&self) -> bool {
        self.api_base.contains("://localhost") || self.api_base.contains("://127.0.0.1")
    }

    fn build_request(&self, params: &ChatParams) -> serde_json::Value {
        let model = if params.model.is_empty() {
            self.default_model.clone()
        } else {
            params.model.clone()
        };

        let messages: Vec<serde_json::Value> = params
            .messages
            .iter()
            .map(|m| {
                let mut obj = json!({ "role": &m.role });
                if let Some(content) = &m.content {
                    obj["content"] = json!(content);
                }
                if let Some(tool_calls) = &m.tool_calls {
                    // The API expects arguments as a JSON-encoded string
                    let calls: Vec<serde_json::Value> = tool_calls
                        .iter()
                        .map(|c| {
                            json!({
                                "id": &c.id,
                                "type": &c.call_type,
                                "function": {
                                    "name": &c.function.name,
                                    "arguments": c.function.arguments.to_string(),
                                }
                            })
                        })
                        .collect();
                    obj["tool_calls"] = json!(calls);
                }
                if let Some(tool_call_id) = &m.tool_call_id {
                    obj["tool_call_id"] = json!(tool_call_id);
                }
                if let Some(name) = &m.name {
                    obj["name"] = json!(name);
                }
                obj
            })
            .collect();

        let mut body = json!({
            "model": model,
            "messages": messages,
            "max_tokens": params.max_tokens,
            "temperature": params.temperature,
        });

        if !params.tools.is_empty() {
            body["tools"] = json!(params.tools);
            body["tool_choice"] = json!("auto");
        }

        body
    }

    fn parse_response(&self, json: serde_json::Value) -> Result<ChatResponse> {
        let choice = json["choices"]
            .get(0)
            .ok_or(ProviderError::InvalidResponse)?;
        let message = &choice["message"];
        let content = message["content"].as_str().map(|s| s.to_string());
        let finish_reason = choice["finish_reason"]
            .as_str()
            .unwrap_or("stop")
            .to_string();

        let mut tool_calls = Vec::new();
        if let Some(calls) = message["tool_calls"].as_array() {
            for call in calls {
                let function = &call["function"];
                // Arguments usually arrive as a JSON string; some servers send an object
                let args = match &function["arguments"] {
                    serde_json::Value::String(s) => serde_json::from_str(s)
                        .unwrap_or_else(|_| serde_json::Value::String(s.clone())),
                    other => other.clone(),
                };

                tool_calls.push(ToolCall {
                    id: call["id"].as_str().unwrap_or("").to_string(),
                    name: function["name"].as_str().unwrap_or("").to_string(),
                    arguments: args,
                });
            }
        }

        Ok(ChatResponse {
            content,
            tool_calls,
            finish_reason,
        })
    }
}

#[async_trait::async_trait]
impl Provider for OpenAiProvider {
    async fn chat(&self, params: ChatParams) -> Result<ChatResponse> {
        if !self.is_configured() {
            return Err(ProviderError::NoApiKey);
        }

        let url = format!("{}/chat/completions", self.api_base);
        trace!("POST {}", url);
        let body = self.build_request(&params);

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {}", key));
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            if status.as_u16() == 429 {
                return Err(ProviderError::RateLimited);
            }
            let error = serde_json::from_str::<serde_json::Value>(&text)
                .ok()
                .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
                .unwrap_or_else(|| format!("HTTP {}", status));
            warn!("Provider returned {}: {}", status, error);
            return Err(ProviderError::Api(error));
        }

        let json: serde_json::Value = serde_json::from_str(&text)?;
        let response = self.parse_response(json)?;
        debug!(
            "Provider response: {} tool calls, finish_reason={}",
            response.tool_calls.len(),
            response.finish_reason
        );
        Ok(response)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some() || self.key_optional || self.is_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> OpenAiProvider {
        OpenAiProvider::new(
            Some("sk-test".to_string()),
            "https://api.openai.com/v1",
            "gpt-4o",
        )
    }

    #[test]
    fn test_new_trims_trailing_slash() {
        let provider = OpenAiProvider::new(None, "http://localhost:11434/v1/", "llama3.1");
        assert_eq!(provider.api_base(), "http://localhost:11434/v1");
    }

    #[test]
    fn test_is_configured() {
        assert!(provider().is_configured());
        assert!(!OpenAiProvider::new(None, "https://api.openai.com/v1", "gpt-4o").is_configured());
        assert!(
            !OpenAiProvider::new(Some(String::new()), "https://openrouter.ai/api/v1", "x")
                .is_configured()
        );
        assert!(OpenAiProvider::new(None, "http://localhost:11434/v1", "llama3.1").is_configured());
    }

    #[test]
    fn test_allow_missing_key() {
        let provider = OpenAiProvider::new(None, "http://gpu-box:11434/v1", "llama3.1");
        assert!(!provider.is_configured());
        assert!(provider.allow_missing_key().is_configured());
    }

    #[test]
    fn test_default_model() {
        assert_eq!(provider().default_model(), "gpt-4o");
    }

    #[test]
    fn test_build_request_basic() {
        let params = ChatParams {
            model: "gpt-4o-mini".to_string(),
            messages: vec![Message::user("Hello")],
            tools: vec![],
            max_tokens: 1024,
            temperature: 0.5,
        };

        let request = provider().build_request(&params);
        assert_eq!(request["model"], "gpt-4o-mini");
        assert_eq!(request["max_tokens"], 1024);
        assert_eq!(request["temperature"], 0.5);
        assert!(request.get("tools").is_none());
        assert!(request.get("tool_choice").is_none());

        let messages = request["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["content"], "Hello");
    }

    #[test]
    fn test_build_request_falls_back_to_default_model() {
        let request = provider().build_request(&ChatParams::default());
        assert_eq!(request["model"], "gpt-4o");
    }

    #[test]
    fn test_build_request_with_tools() {
        let params = ChatParams {
            model: "gpt-4o".to_string(),
            messages: vec![Message::user("Tell me about Eevee")],
            tools: vec![Tool::new(
                "fetch_pokemon_info",
                "Fetch and return key information about a Pokémon.",
                json!({"type": "object", "properties": {"pokemon_name": {"type": "string"}}}),
            )],
            ..Default::default()
        };

        let request = provider().build_request(&params);
        let tools = request["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["type"], "function");
        assert_eq!(tools[0]["function"]["name"], "fetch_pokemon_info");
        assert_eq!(request["tool_choice"], "auto");
    }

    #[test]
    fn test_build_request_encodes_tool_call_arguments_as_string() {
        let mut msg = Message::assistant("");
        msg.tool_calls = Some(vec![ToolCallDef::new(
            "call_1",
            "fetch_pokemon_info",
            json!({"pokemon_name": "Pikachu"}),
        )]);
        let params = ChatParams {
            messages: vec![msg, Message::tool("call_1", "fetch_pokemon_info", "{}")],
            ..Default::default()
        };

        let request = provider().build_request(&params);
        let messages = request["messages"].as_array().unwrap();
        let args = messages[0]["tool_calls"][0]["function"]["arguments"]
            .as_str()
            .unwrap();
        let decoded: serde_json::Value = serde_json::from_str(args).unwrap();
        assert_eq!(decoded["pokemon_name"], "Pikachu");
        assert_eq!(messages[1]["tool_call_id"], "call_1");
        assert_eq!(messages[1]["name"], "fetch_pokemon_info");
    }

    #[test]
    fn test_parse_response_text() {
        let response = provider()
            .parse_response(json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "Pikachu weighs 6.0 kg."},
                    "finish_reason": "stop"
                }],
                "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
            }))
            .unwrap();

        assert_eq!(response.content.as_deref(), Some("Pikachu weighs 6.0 kg."));
        assert!(!response.has_tool_calls());
        assert_eq!(response.finish_reason, "stop");
    }

    #[test]
    fn test_parse_response_tool_calls() {
        let response = provider()
            .parse_response(json!({
                "choices": [{
                    "message": {
                        "content": null,
                        "tool_calls": [
                            {"id": "call_1", "type": "function",
                             "function": {"name": "fetch_pokemon_info", "arguments": "{\"pokemon_name\": \"Pikachu\"}"}},
                            {"id": "call_2", "type": "function",
                             "function": {"name": "fetch_pokemon_info", "arguments": {"pokemon_name": "Jigglypuff"}}}
                        ]
                    },
                    "finish_reason": "tool_calls"
                }]
            }))
            .unwrap();

        assert!(response.content.is_none());
        assert_eq!(response.tool_calls.len(), 2);
        assert_eq!(response.tool_calls[0].arguments["pokemon_name"], "Pikachu");
        assert_eq!(response.tool_calls[1].arguments["pokemon_name"], "Jigglypuff");
        assert_eq!(response.finish_reason, "tool_calls");
    }

    #[test]
    fn test_parse_response_invalid_arguments_kept_as_string() {
        let response = provider()
            .parse_response(json!({
                "choices": [{
                    "message": {"tool_calls": [{"id": "c", "function": {"name": "fetch_pokemon_info", "arguments": "Pikachu"}}]}
                }]
            }))
            .unwrap();
        assert_eq!(response.tool_calls[0].arguments, json!("Pikachu"));
        assert_eq!(response.finish_reason, "stop");
    }

    #[test]
    fn test_parse_response_empty_choices() {
        let result = provider().parse_response(json!({"choices": []}));
        assert!(matches!(result, Err(ProviderError::InvalidResponse)));

        let result = provider().parse_response(json!({}));
        assert!(matches!(result, Err(ProviderError::InvalidResponse)));
    }
}
