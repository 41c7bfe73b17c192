//! Render model: everything the UI layer needs to draw the current screen,
//! computed from a session snapshot.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Difficulty, Phase, CATEGORIES, QUESTION_COUNTS};
use crate::session::Session;

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
  pub version: u64,
  pub phase: Phase,
  #[serde(rename = "gameId")]
  pub game_id: Option<Uuid>,
  pub setup: SetupView,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub playing: Option<PlayingView>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub results: Option<ResultsView>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupView {
  pub available_categories: Vec<&'static str>,
  pub categories: Vec<String>,
  pub difficulty: Difficulty,
  pub question_count: usize,
  pub allowed_counts: Vec<usize>,
  pub can_start: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayingView {
  /// 1-based.
  pub number: usize,
  pub total: usize,
  pub progress: f32,
  pub score: usize,
  pub category: String,
  pub question: String,
  pub options: Vec<OptionView>,
  pub selected: Option<usize>,
  pub revealed: bool,
  pub action: ActionLabel,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
  pub label: String,
  pub text: String,
  pub state: OptionState,
}

/// How a single option is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionState {
  Idle,
  Selected,
  CorrectSelected,
  CorrectMissed,
  Wrong,
  Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionLabel {
  #[serde(rename = "Check Answer")]
  CheckAnswer,
  #[serde(rename = "Next Question")]
  NextQuestion,
  #[serde(rename = "Finish Game")]
  FinishGame,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsView {
  pub score: usize,
  pub total: usize,
  pub percentage: u32,
  pub performance: Performance,
  pub message: &'static str,
  pub review: Vec<ReviewItem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Performance {
  Excellent,
  Good,
  Fair,
  KeepStudying,
}

impl Performance {
  pub fn from_percentage(pct: u32) -> Self {
    match pct {
      80.. => Performance::Excellent,
      60..=79 => Performance::Good,
      40..=59 => Performance::Fair,
      _ => Performance::KeepStudying,
    }
  }

  pub fn message(self) -> &'static str {
    match self {
      Performance::Excellent => "Excellent! You're a quiz master!",
      Performance::Good => "Good job! Well done!",
      Performance::Fair => "Not bad! Keep practicing!",
      Performance::KeepStudying => "Keep studying! You'll do better next time!",
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
  pub number: usize,
  pub question: String,
  pub your_answer: String,
  pub correct_answer: String,
  pub is_correct: bool,
}

pub fn option_label(idx: usize) -> String {
  let letter = char::from(b'A' + idx as u8);
  format!("{letter}.")
}

fn option_state(idx: usize, correct: usize, selected: Option<usize>, revealed: bool) -> OptionState {
  let is_selected = selected == Some(idx);
  match (revealed, idx == correct, is_selected) {
    (false, _, true) => OptionState::Selected,
    (false, _, false) => OptionState::Idle,
    (true, true, true) => OptionState::CorrectSelected,
    (true, true, false) => OptionState::CorrectMissed,
    (true, false, true) => OptionState::Wrong,
    (true, false, false) => OptionState::Neutral,
  }
}

/// Snapshot the session into its render model.
pub fn to_view(s: &Session) -> SessionView {
  let setup = SetupView {
    available_categories: CATEGORIES.to_vec(),
    categories: s.categories().to_vec(),
    difficulty: s.difficulty(),
    question_count: s.question_count(),
    allowed_counts: QUESTION_COUNTS.to_vec(),
    can_start: s.phase() == Phase::Setup && !s.categories().is_empty(),
  };

  let playing = s.current_question().map(|q| {
    let total = s.questions().len();
    let number = s.current_index() + 1;
    let action = if !s.revealed() {
      ActionLabel::CheckAnswer
    } else if number == total {
      ActionLabel::FinishGame
    } else {
      ActionLabel::NextQuestion
    };
    PlayingView {
      number,
      total,
      progress: number as f32 / total as f32,
      score: s.score(),
      category: q.category.clone(),
      question: q.text.clone(),
      options: q
        .options
        .iter()
        .enumerate()
        .map(|(i, text)| OptionView {
          label: option_label(i),
          text: text.clone(),
          state: option_state(i, q.correct_index, s.selected_answer(), s.revealed()),
        })
        .collect(),
      selected: s.selected_answer(),
      revealed: s.revealed(),
      action,
    }
  });

  let results = s.percentage().map(|percentage| {
    let performance = Performance::from_percentage(percentage);
    let review = s
      .answer_log()
      .iter()
      .filter_map(|r| {
        let q = s.questions().get(r.question_index)?;
        Some(ReviewItem {
          number: r.question_index + 1,
          question: q.text.clone(),
          your_answer: q.options[r.selected_index].clone(),
          correct_answer: q.correct_option().to_string(),
          is_correct: r.is_correct,
        })
      })
      .collect();
    ResultsView {
      score: s.score(),
      total: s.questions().len(),
      percentage,
      performance,
      message: performance.message(),
      review,
    }
  });

  SessionView {
    version: s.version(),
    phase: s.phase(),
    game_id: s.game_id(),
    setup,
    playing,
    results,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::provider::testing::{reply_json, ScriptedProvider};

  async fn playing_session(correct: &[usize]) -> Session {
    let mut s = Session::default();
    s.toggle_category("Science").unwrap();
    s.set_question_count(correct.len()).unwrap();
    s.start_game(&ScriptedProvider::replying(reply_json("Science", correct))).await.unwrap();
    s
  }

  #[test]
  fn setup_view_reflects_choices() {
    let mut s = Session::default();
    let v = to_view(&s);
    assert_eq!(v.phase, Phase::Setup);
    assert!(!v.setup.can_start);
    assert!(v.playing.is_none() && v.results.is_none());
    assert_eq!(v.setup.available_categories.len(), 12);

    s.toggle_category("Music").unwrap();
    let v = to_view(&s);
    assert!(v.setup.can_start);
    assert_eq!(v.setup.categories, ["Music"]);
  }

  #[tokio::test]
  async fn option_states_follow_selection_and_reveal() {
    let mut s = playing_session(&[0, 1, 2]).await;
    let v = to_view(&s);
    let p = v.playing.unwrap();
    assert_eq!((p.number, p.total), (1, 3));
    assert!((p.progress - 1.0 / 3.0).abs() < 1e-6);
    assert_eq!(p.action, ActionLabel::CheckAnswer);
    assert!(p.options.iter().all(|o| o.state == OptionState::Idle));
    assert_eq!(p.options[2].label, "C.");

    s.select_option(2).unwrap();
    let p = to_view(&s).playing.unwrap();
    assert_eq!(p.options[2].state, OptionState::Selected);

    s.confirm_or_advance().unwrap();
    let p = to_view(&s).playing.unwrap();
    assert_eq!(p.action, ActionLabel::NextQuestion);
    let states: Vec<_> = p.options.iter().map(|o| o.state).collect();
    assert_eq!(
      states,
      [OptionState::CorrectMissed, OptionState::Neutral, OptionState::Wrong, OptionState::Neutral]
    );
  }

  #[tokio::test]
  async fn last_question_offers_finish() {
    let mut s = playing_session(&[1, 1, 1]).await;
    for _ in 0..2 {
      s.select_option(1).unwrap();
      s.confirm_or_advance().unwrap();
      s.confirm_or_advance().unwrap();
    }
    s.select_option(1).unwrap();
    s.confirm_or_advance().unwrap();
    let p = to_view(&s).playing.unwrap();
    assert_eq!(p.action, ActionLabel::FinishGame);
    assert_eq!(p.options[1].state, OptionState::CorrectSelected);
    assert_eq!(p.score, 2);
  }

  #[tokio::test]
  async fn results_view_scores_and_reviews() {
    let mut s = playing_session(&[0, 1, 2]).await;
    for pick in [0, 3, 2] {
      s.select_option(pick).unwrap();
      s.confirm_or_advance().unwrap();
      s.confirm_or_advance().unwrap();
    }
    let v = to_view(&s);
    assert!(v.playing.is_none());
    let r = v.results.unwrap();
    assert_eq!((r.score, r.total, r.percentage), (2, 3, 67));
    assert_eq!(r.performance, Performance::Good);
    assert_eq!(r.review.len(), 3);
    assert!(!r.review[1].is_correct);
    assert_eq!(r.review[1].your_answer, "fourth");
    assert_eq!(r.review[1].correct_answer, "second");
  }

  #[test]
  fn performance_tiers() {
    assert_eq!(Performance::from_percentage(100), Performance::Excellent);
    assert_eq!(Performance::from_percentage(80), Performance::Excellent);
    assert_eq!(Performance::from_percentage(67), Performance::Good);
    assert_eq!(Performance::from_percentage(40), Performance::Fair);
    assert_eq!(Performance::from_percentage(33), Performance::KeepStudying);
  }

  #[test]
  fn view_serializes_with_wire_names() {
    let v = serde_json::to_value(to_view(&Session::default())).unwrap();
    assert_eq!(v["phase"], "setup");
    assert_eq!(v["setup"]["questionCount"], 3);
    assert_eq!(v["setup"]["difficulty"], "medium");
    assert!(v.get("playing").is_none());
  }
}
