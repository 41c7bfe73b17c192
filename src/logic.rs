//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! Both surfaces decode their input into a `Command`, which runs exactly one
//! session operation and yields the new render model.

use tracing::{debug, info, instrument, warn};

use crate::domain::Difficulty;
use crate::error::QuizError;
use crate::session::Step;
use crate::state::AppState;
use crate::view::SessionView;

/// One UI event.
#[derive(Debug, Clone)]
pub enum Command {
  ToggleCategory(String),
  SetDifficulty(String),
  SetQuestionCount(usize),
  StartGame,
  SelectOption(usize),
  ConfirmOrAdvance,
  Restart,
}

impl Command {
  pub fn name(&self) -> &'static str {
    match self {
      Command::ToggleCategory(_) => "toggle_category",
      Command::SetDifficulty(_) => "set_difficulty",
      Command::SetQuestionCount(_) => "set_question_count",
      Command::StartGame => "start_game",
      Command::SelectOption(_) => "select_option",
      Command::ConfirmOrAdvance => "confirm_or_advance",
      Command::Restart => "restart",
    }
  }
}

/// Apply a command. `StartGame` goes through the lock-releasing path in `AppState`.
#[instrument(level = "info", skip(state), fields(command = cmd.name()))]
pub async fn apply(state: &AppState, cmd: Command) -> Result<SessionView, QuizError> {
  let result = match cmd {
    Command::ToggleCategory(name) => state.mutate(|s| s.toggle_category(&name)).await,
    Command::SetDifficulty(label) => {
      let level: Difficulty = label.parse()?;
      state.mutate(|s| s.set_difficulty(level)).await
    }
    Command::SetQuestionCount(n) => state.mutate(|s| s.set_question_count(n)).await,
    Command::StartGame => state.start_game().await,
    Command::SelectOption(idx) => state.mutate(|s| s.select_option(idx)).await,
    Command::ConfirmOrAdvance => state.mutate(|s| s.confirm_or_advance().map(log_step)).await,
    Command::Restart => state.mutate(|s| s.restart()).await,
  };

  if let Err(e) = &result {
    warn!(target: "game", kind = e.kind(), error = %e, "Command rejected");
  }
  result
}

fn log_step(step: Step) -> Step {
  match step {
    Step::Revealed { correct } => debug!(target: "game", correct, "Revealed"),
    Step::Advanced(r) => debug!(target: "game", question = r.question_index, correct = r.is_correct, "Scored"),
    Step::Finished(r) => info!(target: "game", question = r.question_index, correct = r.is_correct, "Scored final question"),
  }
  step
}
