//! Built-in question bank, served by `SeedProvider` when the app runs offline
//! (QUIZ_OFFLINE=1 or `[game] offline = true`).

use async_trait::async_trait;
use rand::seq::SliceRandom;
use tracing::{debug, instrument};

use crate::domain::{GenerationRequest, Question};
use crate::error::GenerationError;
use crate::provider::QuestionProvider;

// (category, question, options, correct index)
type SeedRow = (&'static str, &'static str, [&'static str; 4], usize);

const BANK: &[SeedRow] = &[
  ("Science", "What is the chemical symbol for gold?", ["Au", "Ag", "Go", "Gd"], 0),
  ("Science", "Which gas do plants absorb from the air for photosynthesis?", ["Oxygen", "Nitrogen", "Carbon dioxide", "Helium"], 2),
  ("History", "In which year did the Berlin Wall fall?", ["1985", "1989", "1991", "1993"], 1),
  ("History", "Who was the first emperor of Rome?", ["Julius Caesar", "Nero", "Augustus", "Trajan"], 2),
  ("Geography", "What is the longest river in South America?", ["Paraná", "Orinoco", "Amazon", "Magdalena"], 2),
  ("Geography", "Which country has the most natural lakes?", ["Canada", "Russia", "Finland", "United States"], 0),
  ("Sports", "How many players does a football (soccer) team field at once?", ["9", "10", "11", "12"], 2),
  ("Sports", "In which sport would you perform a slam dunk?", ["Volleyball", "Basketball", "Tennis", "Handball"], 1),
  ("Movies", "Who directed the film 'Jaws' (1975)?", ["Steven Spielberg", "George Lucas", "Martin Scorsese", "Ridley Scott"], 0),
  ("Movies", "Which film features the line 'I'll be back'?", ["Predator", "Robocop", "The Terminator", "Total Recall"], 2),
  ("Music", "How many strings does a standard violin have?", ["Four", "Five", "Six", "Seven"], 0),
  ("Music", "Which composer wrote 'The Four Seasons'?", ["Bach", "Vivaldi", "Handel", "Haydn"], 1),
  ("Literature", "Who wrote 'Pride and Prejudice'?", ["Charlotte Brontë", "Mary Shelley", "Jane Austen", "George Eliot"], 2),
  ("Literature", "What is the name of the whale in Herman Melville's novel?", ["Moby Dick", "Willy", "Leviathan", "Queequeg"], 0),
  ("Art", "Who painted the ceiling of the Sistine Chapel?", ["Raphael", "Michelangelo", "Leonardo da Vinci", "Donatello"], 1),
  ("Art", "Which art movement is Salvador Dalí most associated with?", ["Cubism", "Impressionism", "Surrealism", "Baroque"], 2),
  ("Technology", "What does 'CPU' stand for?", ["Central Processing Unit", "Computer Power Unit", "Core Program Utility", "Central Peripheral Unit"], 0),
  ("Technology", "Which company created the Rust programming language?", ["Google", "Microsoft", "Mozilla", "Apple"], 2),
  ("Food", "Which country is the origin of the dish paella?", ["Italy", "Spain", "Portugal", "Mexico"], 1),
  ("Food", "What is the main ingredient of guacamole?", ["Tomato", "Avocado", "Pepper", "Onion"], 1),
  ("Animals", "What is the largest land mammal?", ["Giraffe", "White rhinoceros", "African elephant", "Hippopotamus"], 2),
  ("Animals", "How many hearts does an octopus have?", ["One", "Two", "Three", "Four"], 2),
  ("Space", "Which planet is known as the Red Planet?", ["Venus", "Mars", "Jupiter", "Mercury"], 1),
  ("Space", "What is the name of the galaxy that contains our solar system?", ["Andromeda", "Milky Way", "Triangulum", "Whirlpool"], 1),
];

fn to_question(row: &SeedRow) -> Question {
  let (category, text, options, correct_index) = row;
  Question {
    text: (*text).to_string(),
    options: options.map(str::to_string),
    correct_index: *correct_index,
    category: (*category).to_string(),
  }
}

/// Offline provider: shuffled bank questions from the requested categories,
/// topped up from the rest of the bank when those run out.
#[derive(Clone, Default)]
pub struct SeedProvider;

impl SeedProvider {
  pub fn bank_size() -> usize {
    BANK.len()
  }

  fn pick(&self, request: &GenerationRequest) -> Result<Vec<Question>, GenerationError> {
    if request.count > BANK.len() {
      return Err(GenerationError::Count { expected: request.count, got: BANK.len() });
    }

    let wanted = |row: &&SeedRow| request.categories.iter().any(|c| c.eq_ignore_ascii_case(row.0));
    let mut rng = rand::thread_rng();

    let mut primary: Vec<&SeedRow> = BANK.iter().filter(wanted).collect();
    let mut rest: Vec<&SeedRow> = BANK.iter().filter(|row| !wanted(row)).collect();
    primary.shuffle(&mut rng);
    rest.shuffle(&mut rng);

    let questions: Vec<Question> = primary
      .into_iter()
      .chain(rest)
      .take(request.count)
      .map(to_question)
      .collect();
    Ok(questions)
  }
}

#[async_trait]
impl QuestionProvider for SeedProvider {
  #[instrument(level = "info", skip(self, request), fields(count = request.count, difficulty = %request.difficulty))]
  async fn generate(&self, request: &GenerationRequest) -> Result<Vec<Question>, GenerationError> {
    let questions = self.pick(request)?;
    debug!(target: "provider", served = questions.len(), "Served questions from the built-in bank");
    Ok(questions)
  }

  fn name(&self) -> &'static str {
    "seed_bank"
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{canonical_category, Difficulty, OPTION_COUNT};

  fn request(categories: &[&str], count: usize) -> GenerationRequest {
    GenerationRequest {
      categories: categories.iter().map(|c| c.to_string()).collect(),
      difficulty: Difficulty::Easy,
      count,
    }
  }

  #[test]
  fn bank_rows_are_well_formed() {
    for row in BANK {
      assert!(canonical_category(row.0).is_some(), "unknown category {}", row.0);
      assert!(row.3 < OPTION_COUNT);
    }
  }

  #[tokio::test]
  async fn requested_categories_come_first() {
    let qs = SeedProvider.generate(&request(&["Space"], 3)).await.unwrap();
    assert_eq!(qs.len(), 3);
    assert_eq!(qs[0].category, "Space");
    assert_eq!(qs[1].category, "Space");
    assert_ne!(qs[2].category, "Space");
  }

  #[tokio::test]
  async fn largest_allowed_game_fits_the_bank() {
    let qs = SeedProvider.generate(&request(&["Art", "Food"], 20)).await.unwrap();
    assert_eq!(qs.len(), 20);
    let mut texts: Vec<&str> = qs.iter().map(|q| q.text.as_str()).collect();
    texts.sort_unstable();
    texts.dedup();
    assert_eq!(texts.len(), 20);
  }

  #[tokio::test]
  async fn oversized_request_is_a_count_error() {
    let err = SeedProvider.generate(&request(&["Art"], SeedProvider::bank_size() + 1)).await.unwrap_err();
    assert!(matches!(err, GenerationError::Count { .. }));
  }
}
