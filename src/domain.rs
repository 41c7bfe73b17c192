//! Domain models: category catalog, difficulty, questions and answer records.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::QuizError;

/// Fixed category catalog offered on the setup screen.
pub const CATEGORIES: [&str; 12] = [
  "Science", "History", "Geography", "Sports", "Movies", "Music",
  "Literature", "Art", "Technology", "Food", "Animals", "Space",
];

/// Allowed values for the number of questions in a game.
pub const QUESTION_COUNTS: [usize; 5] = [3, 5, 10, 15, 20];

pub const DEFAULT_QUESTION_COUNT: usize = 3;

/// Every question carries exactly this many options.
pub const OPTION_COUNT: usize = 4;

/// Canonical catalog spelling for `name`, matched case-insensitively.
pub fn canonical_category(name: &str) -> Option<&'static str> {
  let name = name.trim();
  CATEGORIES.iter().copied().find(|c| c.eq_ignore_ascii_case(name))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Easy,
  #[default]
  Medium,
  Hard,
}

impl Difficulty {
  /// Lowercase label used in prompts and on the wire.
  pub fn label(self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl FromStr for Difficulty {
  type Err = QuizError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "easy" => Ok(Difficulty::Easy),
      "medium" => Ok(Difficulty::Medium),
      "hard" => Ok(Difficulty::Hard),
      other => Err(QuizError::InvalidConfig(format!("unknown difficulty '{other}'"))),
    }
  }
}

/// Coarse stage of a game round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  #[default]
  Setup,
  Loading,
  Playing,
  Results,
}

impl fmt::Display for Phase {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Phase::Setup => "setup",
      Phase::Loading => "loading",
      Phase::Playing => "playing",
      Phase::Results => "results",
    })
  }
}

/// A validated multiple-choice question. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Question {
  pub text: String,
  pub options: [String; OPTION_COUNT],
  pub correct_index: usize,
  pub category: String,
}

impl Question {
  pub fn correct_option(&self) -> &str {
    &self.options[self.correct_index]
  }
}

/// One completed question in the answer log.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
  pub question_index: usize,
  pub selected_index: usize,
  pub is_correct: bool,
}

/// What the question provider is asked to produce for one game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
  pub categories: Vec<String>,
  pub difficulty: Difficulty,
  pub count: usize,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn difficulty_parses_case_insensitively() {
    assert_eq!("Hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
    assert_eq!(" easy ".parse::<Difficulty>().unwrap(), Difficulty::Easy);
    let err = "extreme".parse::<Difficulty>().unwrap_err();
    assert!(matches!(err, QuizError::InvalidConfig(_)));
  }

  #[test]
  fn canonical_category_matches_catalog_spelling() {
    assert_eq!(canonical_category("science"), Some("Science"));
    assert_eq!(canonical_category("SPACE"), Some("Space"));
    assert_eq!(canonical_category("Cooking"), None);
  }
}
