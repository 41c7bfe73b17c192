//! Application state: the single quiz session and the question provider.
//!
//! The session lives behind a tokio mutex. Every transition holds the lock for
//! its whole (synchronous) duration, except starting a game: the lock is
//! released while the provider call is in flight, and the session sits in
//! Loading so concurrent mutations are answered with `Busy`.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, instrument};

use crate::config::{load_quiz_config_from_env, QuizConfig};
use crate::domain::GenerationRequest;
use crate::error::{QuizError, StartupError};
use crate::openai::OpenAI;
use crate::provider::QuestionProvider;
use crate::seeds::SeedProvider;
use crate::session::Session;
use crate::util::env_flag;
use crate::view::{to_view, SessionView};

#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub provider: Arc<dyn QuestionProvider>,
}

impl AppState {
    /// Build state from env: load config, pick the provider, create the session.
    #[instrument(level = "info", skip_all)]
    pub fn from_env() -> Result<Self, StartupError> {
        let cfg = load_quiz_config_from_env()?;
        let provider = select_provider(&cfg)?;
        info!(
            target: "quiz_backend",
            provider = provider.name(),
            retain_preferences = cfg.game.retain_preferences,
            "Quiz session ready"
        );
        Ok(Self::new(provider, cfg.game.retain_preferences))
    }

    pub fn new(provider: Arc<dyn QuestionProvider>, retain_preferences: bool) -> Self {
        Self {
            session: Arc::new(Mutex::new(Session::new(retain_preferences))),
            provider,
        }
    }

    /// Current render model. Always allowed, including while Loading.
    pub async fn snapshot(&self) -> SessionView {
        to_view(&*self.session.lock().await)
    }

    /// Run a synchronous transition under the lock and return the new render model.
    pub async fn mutate<T>(
        &self,
        op: impl FnOnce(&mut Session) -> Result<T, QuizError>,
    ) -> Result<SessionView, QuizError> {
        let mut session = self.session.lock().await;
        op(&mut *session)?;
        Ok(to_view(&session))
    }

    /// Setup -> Loading under the lock. Returns the request for `finish_game`
    /// along with the Loading snapshot.
    pub async fn begin_game(&self) -> Result<(GenerationRequest, SessionView), QuizError> {
        let mut session = self.session.lock().await;
        let request = session.begin_game()?;
        Ok((request, to_view(&session)))
    }

    /// Call the provider without holding the lock, then Loading -> Playing/Setup.
    #[instrument(level = "info", skip_all, fields(provider = self.provider.name(), count = request.count))]
    pub async fn finish_game(&self, request: GenerationRequest) -> Result<SessionView, QuizError> {
        let outcome = self.provider.generate(&request).await;
        let mut session = self.session.lock().await;
        session.finish_game(outcome)?;
        Ok(to_view(&session))
    }

    pub async fn start_game(&self) -> Result<SessionView, QuizError> {
        let (request, _loading) = self.begin_game().await?;
        self.finish_game(request).await
    }
}

/// Offline bank when asked for (env or config), otherwise the OpenAI client,
/// which requires an API key.
fn select_provider(cfg: &QuizConfig) -> Result<Arc<dyn QuestionProvider>, StartupError> {
    if cfg.game.offline || env_flag("QUIZ_OFFLINE") {
        info!(target: "quiz_backend", bank_size = SeedProvider::bank_size(), "Offline mode: serving the built-in question bank");
        return Ok(Arc::new(SeedProvider));
    }
    let oa = OpenAI::from_env(cfg.prompts.clone())?;
    info!(target: "quiz_backend", base_url = %oa.base_url, model = %oa.model, json_mode = oa.json_mode, "OpenAI question provider enabled");
    Ok(Arc::new(oa))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Phase;
    use crate::error::GenerationError;
    use crate::provider::testing::{reply_json, ScriptedProvider};

    #[tokio::test]
    async fn start_game_passes_through_loading() {
        let state = AppState::new(Arc::new(ScriptedProvider::replying(reply_json("Art", &[0, 1, 2]))), false);
        state.mutate(|s| s.toggle_category("Art")).await.unwrap();

        let (request, loading) = state.begin_game().await.unwrap();
        assert_eq!(loading.phase, Phase::Loading);
        assert_eq!(request.count, 3);
        let view = state.finish_game(request).await.unwrap();
        assert_eq!(view.phase, Phase::Playing);
        assert_eq!(state.snapshot().await.playing.unwrap().total, 3);
    }

    #[tokio::test]
    async fn failed_start_leaves_setup_snapshot() {
        let state = AppState::new(Arc::new(ScriptedProvider::failing(GenerationError::EmptyReply)), false);
        state.mutate(|s| s.toggle_category("Art")).await.unwrap();

        let err = state.start_game().await.unwrap_err();
        assert!(matches!(err, QuizError::Generation(GenerationError::EmptyReply)));
        assert_eq!(state.snapshot().await.phase, Phase::Setup);
    }

    #[tokio::test]
    async fn mutations_during_loading_are_busy() {
        let state = AppState::new(Arc::new(SeedProvider), false);
        {
            let mut s = state.session.lock().await;
            s.toggle_category("Art").unwrap();
            s.begin_game().unwrap();
        }
        let err = state.mutate(|s| s.toggle_category("Food")).await.unwrap_err();
        assert!(matches!(err, QuizError::Busy));
        let err = state.start_game().await.unwrap_err();
        assert!(matches!(err, QuizError::Busy));
        assert_eq!(state.snapshot().await.phase, Phase::Loading);
    }
}
