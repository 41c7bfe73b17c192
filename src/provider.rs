//! Question provider boundary: the trait the session calls once per game, and the
//! parser that turns a provider's raw text reply into validated `Question`s.
//!
//! Replies are expected as `{ "questions": [ { "question", "options", "correctAnswer", "category" } ] }`,
//! optionally wrapped in a ```json fence.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{GenerationRequest, Question, OPTION_COUNT};
use crate::error::GenerationError;

#[async_trait]
pub trait QuestionProvider: Send + Sync {
  /// Produce exactly `request.count` questions, or a typed failure.
  async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>, GenerationError>;

  /// Short name for logs.
  fn name(&self) -> &'static str;
}

#[derive(Deserialize)]
struct RawReply {
  questions: Option<Vec<RawQuestion>>,
}

#[derive(Deserialize)]
struct RawQuestion {
  #[serde(default)]
  question: Option<String>,
  #[serde(default)]
  options: Option<Vec<serde_json::Value>>,
  #[serde(default, rename = "correctAnswer")]
  correct_answer: Option<serde_json::Value>,
  #[serde(default)]
  category: Option<String>,
}

/// Remove a surrounding triple-backtick fence (optionally tagged `json`) and any
/// prose around the top-level object.
pub fn strip_code_fence(raw: &str) -> &str {
  let mut text = raw.trim();
  if let Some(rest) = text.strip_prefix("```") {
    let body = match rest.find("```") {
      Some(end) => &rest[..end],
      None => rest,
    };
    let body = body.trim_start();
    let body = match body.get(..4) {
      Some(tag) if tag.eq_ignore_ascii_case("json") => &body[4..],
      _ => body,
    };
    text = body.trim();
  }
  if !text.starts_with('{') {
    if let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) {
      if start < end {
        return &text[start..=end];
      }
    }
  }
  text
}

/// Parse and validate a raw provider reply against `request`.
///
/// Extra questions are dropped; too few is an error, so a successful result
/// always holds exactly `request.count` questions.
pub fn parse_questions(raw: &str, request: &GenerationRequest) -> Result<Vec<Question>, GenerationError> {
  let body = strip_code_fence(raw);
  if body.is_empty() {
    return Err(GenerationError::EmptyReply);
  }

  let value: serde_json::Value =
    serde_json::from_str(body).map_err(|e| GenerationError::Parse(e.to_string()))?;
  if !value.is_object() {
    return Err(GenerationError::Schema("top-level value is not an object".into()));
  }
  let reply: RawReply =
    serde_json::from_value(value).map_err(|e| GenerationError::Schema(e.to_string()))?;
  let raw_questions = reply
    .questions
    .ok_or_else(|| GenerationError::Schema("missing `questions` list".into()))?;

  let fallback_category = request.categories.first().map(String::as_str).unwrap_or_default();
  let mut questions = raw_questions
    .into_iter()
    .enumerate()
    .map(|(i, q)| validate_question(i + 1, q, fallback_category))
    .collect::<Result<Vec<_>, _>>()?;

  if questions.len() < request.count {
    return Err(GenerationError::Count { expected: request.count, got: questions.len() });
  }
  if questions.len() > request.count {
    warn!(target: "provider", expected = request.count, got = questions.len(), "Provider returned extra questions; truncating");
    questions.truncate(request.count);
  }

  for q in &questions {
    if !request.categories.iter().any(|c| c.eq_ignore_ascii_case(&q.category)) {
      debug!(target: "provider", category = %q.category, "Question category outside the requested set");
    }
  }
  Ok(questions)
}

fn validate_question(number: usize, q: RawQuestion, fallback_category: &str) -> Result<Question, GenerationError> {
  let schema = |what: &str| GenerationError::Schema(format!("question {number}: {what}"));

  let text = q.question.map(|t| t.trim().to_string()).unwrap_or_default();
  if text.is_empty() {
    return Err(schema("missing or empty `question` text"));
  }

  let raw_options = q.options.ok_or_else(|| schema("missing `options`"))?;
  if raw_options.len() != OPTION_COUNT {
    return Err(schema(&format!("expected {OPTION_COUNT} options, got {}", raw_options.len())));
  }
  let mut options: [String; OPTION_COUNT] = Default::default();
  for (slot, value) in options.iter_mut().zip(raw_options) {
    match value {
      serde_json::Value::String(s) => *slot = s.trim().to_string(),
      _ => return Err(schema("every option must be a string")),
    }
  }

  let correct_index = q
    .correct_answer
    .as_ref()
    .and_then(serde_json::Value::as_u64)
    .ok_or_else(|| schema("missing or non-integer `correctAnswer`"))?;
  if correct_index >= OPTION_COUNT as u64 {
    return Err(schema(&format!("`correctAnswer` {correct_index} is outside 0-3")));
  }

  let category = q
    .category
    .map(|c| c.trim().to_string())
    .filter(|c| !c.is_empty())
    .unwrap_or_else(|| fallback_category.to_string());

  Ok(Question { text, options, correct_index: correct_index as usize, category })
}

/// Provider that replays a canned raw reply through the real parser.
#[cfg(test)]
pub mod testing {
  use std::sync::atomic::{AtomicUsize, Ordering};

  use super::*;

  pub struct ScriptedProvider {
    reply: Result<String, GenerationError>,
    pub calls: AtomicUsize,
  }

  impl ScriptedProvider {
    pub fn replying(raw: impl Into<String>) -> Self {
      Self { reply: Ok(raw.into()), calls: AtomicUsize::new(0) }
    }

    pub fn failing(err: GenerationError) -> Self {
      Self { reply: Err(err), calls: AtomicUsize::new(0) }
    }

    pub fn call_count(&self) -> usize {
      self.calls.load(Ordering::SeqCst)
    }
  }

  #[async_trait]
  impl QuestionProvider for ScriptedProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>, GenerationError> {
      self.calls.fetch_add(1, Ordering::SeqCst);
      match &self.reply {
        Ok(raw) => parse_questions(raw, request),
        Err(e) => Err(e.clone()),
      }
    }

    fn name(&self) -> &'static str {
      "scripted"
    }
  }

  /// `n` well-formed questions; question `i` has `correctAnswer = correct[i]`.
  pub fn reply_json(category: &str, correct: &[usize]) -> String {
    let questions: Vec<serde_json::Value> = correct
      .iter()
      .enumerate()
      .map(|(i, c)| {
        serde_json::json!({
          "question": format!("Question number {}?", i + 1),
          "options": ["first", "second", "third", "fourth"],
          "correctAnswer": c,
          "category": category,
        })
      })
      .collect();
    serde_json::json!({ "questions": questions }).to_string()
  }
}
