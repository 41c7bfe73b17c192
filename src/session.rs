//! The quiz session: all mutable game data plus the legal transitions between
//! Setup, Loading, Playing and Results.
//!
//! A `Session` is a plain owned value. Every operation takes `&mut self`, checks
//! its phase and inputs first, and only then mutates, so a failed call leaves the
//! session (including `version`) untouched. The one exception is a failed
//! generation, which by contract returns the session to Setup.
//!
//! Starting a game is split into `begin_game` / `finish_game` so a caller that
//! shares the session behind a lock can release it while the provider call is in
//! flight. Anything that tries to mutate the session in between sees `Busy`.

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{
    canonical_category, AnswerRecord, Difficulty, GenerationRequest, Phase, Question,
    DEFAULT_QUESTION_COUNT, OPTION_COUNT, QUESTION_COUNTS,
};
use crate::error::{GenerationError, QuizError};
use crate::provider::QuestionProvider;

/// Outcome of one `confirm_or_advance` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// First press: correctness is now visible, nothing was scored.
    Revealed { correct: bool },
    /// Second press: answer recorded, moved on to the next question.
    Advanced(AnswerRecord),
    /// Second press on the last question: answer recorded, game over.
    Finished(AnswerRecord),
}

#[derive(Clone, Debug)]
pub struct Session {
    version: u64,
    phase: Phase,
    game_id: Option<Uuid>,
    categories: Vec<String>,
    difficulty: Difficulty,
    question_count: usize,
    questions: Vec<Question>,
    current_index: usize,
    selected_answer: Option<usize>,
    revealed: bool,
    score: usize,
    answer_log: Vec<AnswerRecord>,
    retain_preferences: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Session {
    /// Fresh session in Setup. `retain_preferences` decides whether `restart`
    /// keeps categories, difficulty and question count.
    pub fn new(retain_preferences: bool) -> Self {
        Self {
            version: 0,
            phase: Phase::Setup,
            game_id: None,
            categories: Vec::new(),
            difficulty: Difficulty::default(),
            question_count: DEFAULT_QUESTION_COUNT,
            questions: Vec::new(),
            current_index: 0,
            selected_answer: None,
            revealed: false,
            score: 0,
            answer_log: Vec::new(),
            retain_preferences,
        }
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn game_id(&self) -> Option<Uuid> {
        self.game_id
    }

    /// Selected categories in selection order.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn selected_answer(&self) -> Option<usize> {
        self.selected_answer
    }

    pub fn revealed(&self) -> bool {
        self.revealed
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn answer_log(&self) -> &[AnswerRecord] {
        &self.answer_log
    }

    /// The question on screen, only while Playing.
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Playing => self.questions.get(self.current_index),
            _ => None,
        }
    }

    /// Final percentage, only in Results.
    pub fn percentage(&self) -> Option<u32> {
        match self.phase {
            Phase::Results => Some(score_percentage(self.score, self.questions.len())),
            _ => None,
        }
    }

    // --- Setup ---

    /// Flip membership of a catalog category. Returns whether it is now selected.
    #[instrument(level = "debug", skip(self), fields(version = self.version))]
    pub fn toggle_category(&mut self, name: &str) -> Result<bool, QuizError> {
        self.guard("toggle_category", Phase::Setup)?;
        let canonical = canonical_category(name)
            .ok_or_else(|| QuizError::InvalidConfig(format!("unknown category '{}'", name.trim())))?;

        let selected = match self.categories.iter().position(|c| c == canonical) {
            Some(pos) => {
                self.categories.remove(pos);
                false
            }
            None => {
                self.categories.push(canonical.to_string());
                true
            }
        };
        self.bump();
        debug!(target: "game", category = canonical, selected, total = self.categories.len(), "Category toggled");
        Ok(selected)
    }

    pub fn set_difficulty(&mut self, level: Difficulty) -> Result<(), QuizError> {
        self.guard("set_difficulty", Phase::Setup)?;
        self.difficulty = level;
        self.bump();
        debug!(target: "game", difficulty = %level, "Difficulty set");
        Ok(())
    }

    pub fn set_question_count(&mut self, n: usize) -> Result<(), QuizError> {
        self.guard("set_question_count", Phase::Setup)?;
        if !QUESTION_COUNTS.contains(&n) {
            return Err(QuizError::InvalidConfig(format!(
                "question count must be one of {QUESTION_COUNTS:?}, got {n}"
            )));
        }
        self.question_count = n;
        self.bump();
        debug!(target: "game", count = n, "Question count set");
        Ok(())
    }

    // --- Start ---

    /// Run a whole start: Setup -> Loading -> Playing (or back to Setup on failure).
    /// For callers that own the session outright; `AppState` uses the split halves.
    #[allow(dead_code)]
    pub async fn start_game(&mut self, provider: &dyn QuestionProvider) -> Result<(), QuizError> {
        let request = self.begin_game()?;
        let outcome = provider.generate(&request).await;
        self.finish_game(outcome)
    }

    /// Setup -> Loading. Returns what the provider must be asked for.
    pub fn begin_game(&mut self) -> Result<GenerationRequest, QuizError> {
        self.guard("start_game", Phase::Setup)?;
        if self.categories.is_empty() {
            return Err(QuizError::EmptySelection);
        }

        self.clear_round();
        let game_id = Uuid::new_v4();
        self.game_id = Some(game_id);
        self.phase = Phase::Loading;
        self.bump();
        info!(
            target: "game",
            %game_id,
            categories = %self.categories.join(", "),
            difficulty = %self.difficulty,
            count = self.question_count,
            "Generating questions"
        );

        Ok(GenerationRequest {
            categories: self.categories.clone(),
            difficulty: self.difficulty,
            count: self.question_count,
        })
    }

    /// Loading -> Playing on success, Loading -> Setup on failure.
    pub fn finish_game(
        &mut self,
        outcome: Result<Vec<Question>, GenerationError>,
    ) -> Result<(), QuizError> {
        if self.phase != Phase::Loading {
            return Err(QuizError::InvalidTransition { op: "finish_game", phase: self.phase });
        }

        let expected = self.question_count;
        let outcome = outcome.and_then(|questions| {
            if questions.len() == expected {
                Ok(questions)
            } else {
                Err(GenerationError::Count { expected, got: questions.len() })
            }
        });

        match outcome {
            Ok(questions) => {
                self.clear_round();
                self.questions = questions;
                self.phase = Phase::Playing;
                self.bump();
                info!(target: "game", game_id = ?self.game_id, count = self.questions.len(), "Game started");
                Ok(())
            }
            Err(e) => {
                warn!(target: "game", game_id = ?self.game_id, error = %e, "Question generation failed; back to setup");
                self.clear_round();
                self.game_id = None;
                self.phase = Phase::Setup;
                self.bump();
                Err(e.into())
            }
        }
    }

    // --- Playing ---

    /// Pick an option for the current question. Last write wins until the reveal.
    pub fn select_option(&mut self, idx: usize) -> Result<(), QuizError> {
        self.guard("select_option", Phase::Playing)?;
        if self.revealed {
            warn!(target: "game", question = self.current_index, idx, "Selection ignored: answer already revealed");
            return Err(QuizError::AlreadyRevealed);
        }
        if idx >= OPTION_COUNT {
            return Err(QuizError::OptionOutOfRange(idx));
        }
        self.selected_answer = Some(idx);
        self.bump();
        Ok(())
    }

    /// The two-stage answer button: first press reveals, second press scores and moves on.
    pub fn confirm_or_advance(&mut self) -> Result<Step, QuizError> {
        self.guard("confirm_or_advance", Phase::Playing)?;
        let selected = self.selected_answer.ok_or(QuizError::NoSelection)?;
        let is_correct = selected == self.questions[self.current_index].correct_index;

        if !self.revealed {
            self.revealed = true;
            self.bump();
            debug!(target: "game", question = self.current_index, selected, is_correct, "Answer revealed");
            return Ok(Step::Revealed { correct: is_correct });
        }

        let record = AnswerRecord {
            question_index: self.current_index,
            selected_index: selected,
            is_correct,
        };
        self.answer_log.push(record);
        if is_correct {
            self.score += 1;
        }

        if self.current_index + 1 < self.questions.len() {
            self.current_index += 1;
            self.selected_answer = None;
            self.revealed = false;
            self.bump();
            debug!(target: "game", next = self.current_index, score = self.score, "Advanced to next question");
            Ok(Step::Advanced(record))
        } else {
            self.phase = Phase::Results;
            self.bump();
            info!(
                target: "game",
                game_id = ?self.game_id,
                score = self.score,
                total = self.questions.len(),
                percentage = score_percentage(self.score, self.questions.len()),
                "Game finished"
            );
            Ok(Step::Finished(record))
        }
    }

    // --- Results ---

    /// Results -> Setup. Round data is always cleared; preferences only when
    /// `retain_preferences` is off.
    pub fn restart(&mut self) -> Result<(), QuizError> {
        self.guard("restart", Phase::Results)?;
        self.clear_round();
        self.game_id = None;
        if !self.retain_preferences {
            self.categories.clear();
            self.difficulty = Difficulty::default();
            self.question_count = DEFAULT_QUESTION_COUNT;
        }
        self.phase = Phase::Setup;
        self.bump();
        info!(target: "game", retain_preferences = self.retain_preferences, "Session reset to setup");
        Ok(())
    }

    fn guard(&self, op: &'static str, required: Phase) -> Result<(), QuizError> {
        if self.phase == required {
            Ok(())
        } else if self.phase == Phase::Loading {
            Err(QuizError::Busy)
        } else {
            Err(QuizError::InvalidTransition { op, phase: self.phase })
        }
    }

    fn clear_round(&mut self) {
        self.questions.clear();
        self.current_index = 0;
        self.selected_answer = None;
        self.revealed = false;
        self.score = 0;
        self.answer_log.clear();
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}

/// `round(score / total * 100)`; 0 for an empty game.
pub fn score_percentage(score: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((score as f64 / total as f64) * 100.0).round() as u32
}
