//! Loading quiz configuration (prompts + game settings) from TOML.
//!
//! See `QuizConfig`, `Prompts` and `GameSettings` for the expected schema:
//!
//! ```toml
//! [prompts]
//! temperature = 0.7
//! quiz_user_template = "Generate exactly {count} quiz questions ..."
//!
//! [game]
//! retain_preferences = true
//! offline = false
//! ```

use serde::Deserialize;
use tracing::info;

use crate::error::StartupError;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub prompts: Prompts,
  #[serde(default)]
  pub game: GameSettings,
}

/// Prompts used by the chat-completions provider.
/// `quiz_user_template` understands `{count}`, `{categories}` and `{difficulty}`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub quiz_system: String,
  pub quiz_user_template: String,
  pub temperature: f32,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      quiz_system: "You are a trivia quiz author. Respond ONLY with strict JSON.".into(),
      quiz_user_template: r#"Generate exactly {count} quiz questions with these specifications:
- Categories: {categories}
- Difficulty: {difficulty}
- Format: Multiple choice with 4 options

Respond ONLY with a valid JSON object in this exact format:
{
  "questions": [
    {
      "question": "What is the chemical symbol for gold?",
      "options": ["Au", "Ag", "Go", "Gd"],
      "correctAnswer": 0,
      "category": "Science"
    }
  ]
}

Make sure each question has exactly 4 plausible options and correctAnswer is the index (0-3) of the correct option.
DO NOT include any text before or after the JSON."#.into(),
      temperature: 0.7,
    }
  }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct GameSettings {
  /// Keep categories, difficulty and question count when playing again.
  pub retain_preferences: bool,
  /// Serve questions from the built-in bank instead of calling the provider.
  pub offline: bool,
}

/// Load `QuizConfig` from QUIZ_CONFIG_PATH. Missing variable means defaults;
/// a path that cannot be read or parsed is a startup error.
pub fn load_quiz_config_from_env() -> Result<QuizConfig, StartupError> {
  match std::env::var("QUIZ_CONFIG_PATH") {
    Ok(path) => load_quiz_config(&path),
    Err(_) => Ok(QuizConfig::default()),
  }
}

pub fn load_quiz_config(path: &str) -> Result<QuizConfig, StartupError> {
  let raw = std::fs::read_to_string(path)
    .map_err(|source| StartupError::ConfigRead { path: path.to_string(), source })?;
  let cfg = parse_quiz_config(&raw)
    .map_err(|source| StartupError::ConfigParse { path: path.to_string(), source })?;
  info!(target: "quiz_backend", %path, retain_preferences = cfg.game.retain_preferences, offline = cfg.game.offline, "Loaded quiz config (TOML)");
  Ok(cfg)
}

fn parse_quiz_config(raw: &str) -> Result<QuizConfig, toml::de::Error> {
  toml::from_str::<QuizConfig>(raw)
}
