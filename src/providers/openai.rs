//! Prompt synthesis against an OpenAI-compatible chat-completions endpoint.

use super::PromptSynthesizer;
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-5.1";
const PROMPT_TEMPERATURE: f64 = 0.7;

const SYSTEM_PROMPT: &str = r#"You generate JSON prompts for photorealistic renderings of inventions.
Return ONLY valid JSON. No commentary. No markdown.

JSON structure:

{
  "scene": string,
  "subjects": [
    {
      "description": string,
      "pose": string,
      "position": string,
      "color_palette": string[]
    }
  ],
  "style": string,
  "color_palette": string[],
  "lighting": string,
  "mood": string,
  "background": string,
  "composition": string,
  "camera": {
    "angle": string,
    "distance": string,
    "focus": string,
    "lens-mm": number,
    "f-number": string,
    "ISO": number
  }
}"#;

/// Chat-completions prompt synthesizer. Credentials and endpoints are
/// constructor-injected; nothing is read from the process environment.
pub struct OpenAiPromptSynthesizer {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiPromptSynthesizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: super::http_client(super::DEFAULT_TIMEOUT),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = super::http_client(timeout);
        self
    }

    fn user_prompt(metadata: &Value) -> String {
        let field = |key: &str| metadata.get(key).and_then(Value::as_str).unwrap_or_default();
        format!(
            "Patent URL: {}\nPatent ID: {}\n\nTitle:\n{}\n\nAbstract:\n{}\n\n\
             Generate a JSON prompt that renders this invention as a photorealistic \
             product image based on the patent.",
            field("patent_url"),
            field("patent_id"),
            field("title"),
            field("abstract"),
        )
    }
}

#[async_trait]
impl PromptSynthesizer for OpenAiPromptSynthesizer {
    async fn synthesize(&self, metadata: &Value) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": Self::user_prompt(metadata) },
            ],
            "temperature": PROMPT_TEMPERATURE,
        });
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::transport("prompt-synthesis", e))?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::transport("prompt-synthesis", e))?;
        // A missing content field degrades to an empty JSON document rather
        // than an error; the orchestrator treats prompt text as untrusted.
        Ok(payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("{}")
            .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_prompt_carries_the_metadata_fields() {
        let meta = json!({
            "patent_id": "US1234567",
            "patent_url": "https://patents.example.com/US1234567",
            "title": "Earphone cover",
            "abstract": "A cover for an earphone.",
        });
        let prompt = OpenAiPromptSynthesizer::user_prompt(&meta);
        assert!(prompt.contains("US1234567"));
        assert!(prompt.contains("Earphone cover"));
        assert!(prompt.contains("A cover for an earphone."));
    }

    #[test]
    fn user_prompt_tolerates_missing_fields() {
        let prompt = OpenAiPromptSynthesizer::user_prompt(&json!({ "title": "Earphone cover" }));
        assert!(prompt.contains("Patent ID: \n"));
        assert!(prompt.contains("Earphone cover"));
    }
}
