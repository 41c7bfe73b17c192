//! Minimal OpenAI-compatible chat client that implements `QuestionProvider`.
//!
//! One chat.completions call per game. The reply text goes through the shared
//! parser in `provider`, so fenced or chatty replies are tolerated.
//! Calls are instrumented and log model name, latency, token usage and reply size (not contents).
//!
//! NOTE: We never log the API key.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

use crate::config::Prompts;
use crate::domain::{GenerationRequest, Question};
use crate::error::{GenerationError, StartupError};
use crate::provider::{parse_questions, QuestionProvider};
use crate::util::{env_flag, fill_template, trunc_for_log};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub json_mode: bool,
  pub prompts: Prompts,
}

impl OpenAI {
  /// Construct the client from OPENAI_* variables. A missing or blank key is an error.
  pub fn from_env(prompts: Prompts) -> Result<Self, StartupError> {
    let api_key = std::env::var("OPENAI_API_KEY")
      .ok()
      .filter(|k| !k.trim().is_empty())
      .ok_or(StartupError::MissingApiKey)?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    let timeout = std::env::var("OPENAI_TIMEOUT_SECS")
      .ok()
      .and_then(|s| s.parse::<u64>().ok())
      .unwrap_or(DEFAULT_TIMEOUT_SECS);

    Self::new(api_key, base_url, model, Duration::from_secs(timeout), prompts)
      .map(|oa| oa.with_json_mode(env_flag("OPENAI_JSON_MODE")))
  }

  pub fn new(
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
    prompts: Prompts,
  ) -> Result<Self, StartupError> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      api_key,
      base_url: base_url.trim_end_matches('/').to_string(),
      model,
      json_mode: false,
      prompts,
    })
  }

  /// Ask for `response_format: json_object` (not every compatible endpoint supports it).
  pub fn with_json_mode(mut self, json_mode: bool) -> Self {
    self.json_mode = json_mode;
    self
  }

  /// The user prompt for one game.
  pub fn build_prompt(&self, request: &GenerationRequest) -> String {
    let count = request.count.to_string();
    let categories = request.categories.join(", ");
    fill_template(
      &self.prompts.quiz_user_template,
      &[
        ("count", count.as_str()),
        ("categories", categories.as_str()),
        ("difficulty", request.difficulty.label()),
      ],
    )
  }

  /// Plain chat completion returning the trimmed reply text.
  #[instrument(level = "info", skip(self, system, user), fields(model = %self.model))]
  async fn chat(&self, system: &str, user: &str) -> Result<String, GenerationError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: self.model.clone(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: system.into() },
        ChatMessageReq { role: "user".into(), content: user.into() },
      ],
      temperature: self.prompts.temperature,
      response_format: self.json_mode.then(|| ResponseFormat { r#type: "json_object".into() }),
    };

    let res = self.client.post(&url)
      .header(USER_AGENT, "quiz-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await
      .map_err(|e| GenerationError::Transport(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      return Err(GenerationError::Http { status: status.as_u16(), message });
    }

    let body: ChatCompletionResponse = res
      .json()
      .await
      .map_err(|e| GenerationError::Transport(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .map(|t| t.trim().to_string())
      .unwrap_or_default();

    if text.is_empty() {
      return Err(GenerationError::EmptyReply);
    }
    Ok(text)
  }
}

#[async_trait]
impl QuestionProvider for OpenAI {
  #[instrument(
    level = "info",
    skip(self, request),
    fields(count = request.count, difficulty = %request.difficulty, model = %self.model)
  )]
  async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>, GenerationError> {
    let user = self.build_prompt(request);
    let start = Instant::now();
    let result = self.chat(&self.prompts.quiz_system, &user).await;
    let elapsed = start.elapsed();

    let text = match result {
      Ok(text) => {
        info!(target: "provider", ?elapsed, reply_bytes = text.len(), "Model response received");
        text
      }
      Err(e) => {
        error!(target: "provider", ?elapsed, error = %e, "Model call failed during question generation");
        return Err(e);
      }
    };

    let questions = parse_questions(&text, request).map_err(|e| {
      error!(target: "provider", error = %e, reply_preview = %trunc_for_log(&text, 120), "Model reply rejected");
      e
    })?;
    info!(
      target: "provider",
      count = questions.len(),
      first_preview = %questions.first().map(|q| trunc_for_log(&q.text, 40)).unwrap_or_default(),
      "Questions generated"
    );
    Ok(questions)
  }

  fn name(&self) -> &'static str {
    "openai"
  }
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from an OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Difficulty;

  fn client() -> OpenAI {
    OpenAI::new(
      "test-key".into(),
      "http://localhost:9/v1/".into(),
      "test-model".into(),
      Duration::from_secs(1),
      Prompts::default(),
    )
    .unwrap()
  }

  #[test]
  fn prompt_carries_count_categories_and_difficulty() {
    let request = GenerationRequest {
      categories: vec!["Science".into(), "Space".into()],
      difficulty: Difficulty::Hard,
      count: 10,
    };
    let prompt = client().build_prompt(&request);
    assert!(prompt.contains("Generate exactly 10 quiz questions"));
    assert!(prompt.contains("Categories: Science, Space"));
    assert!(prompt.contains("Difficulty: hard"));
    assert!(!prompt.contains("{count}"));
  }

  #[test]
  fn base_url_trailing_slash_is_trimmed() {
    assert_eq!(client().base_url, "http://localhost:9/v1");
  }

  #[test]
  fn openai_error_body_is_extracted() {
    let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
    assert_eq!(extract_openai_error(body).as_deref(), Some("Incorrect API key provided"));
    assert_eq!(extract_openai_error("<html>bad gateway</html>"), None);
  }

  #[test]
  fn json_mode_adds_response_format() {
    let req = ChatCompletionRequest {
      model: "m".into(),
      messages: vec![],
      temperature: 0.5,
      response_format: Some(ResponseFormat { r#type: "json_object".into() }),
    };
    let v = serde_json::to_value(&req).unwrap();
    assert_eq!(v["response_format"]["type"], "json_object");

    let req = ChatCompletionRequest { response_format: None, ..req };
    let v = serde_json::to_value(&req).unwrap();
    assert!(v.get("response_format").is_none());
  }

  #[tokio::test]
  async fn unreachable_endpoint_is_a_transport_error() {
    let request = GenerationRequest { categories: vec!["Art".into()], difficulty: Difficulty::Easy, count: 3 };
    let err = client().generate(&request).await.unwrap_err();
    assert!(matches!(err, GenerationError::Transport(_)));
  }
}
