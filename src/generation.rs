use regex::Regex;
use std::sync::{LazyLock, Mutex, MutexGuard};

use crate::errors::QuizError;
use crate::interest::{Interest, RequestOutcome, Ticket};
use crate::models::Quiz;
use crate::service_client::QuizService;
use crate::{log_rejected, log_request_error, log_stale_discard, log_transition};

pub const MIN_QUESTIONS: u32 = 5;
pub const MAX_QUESTIONS: u32 = 10;
pub const DEFAULT_QUESTIONS: u32 = MIN_QUESTIONS;

const MACHINE: &str = "generation";

static WIKIPEDIA_ARTICLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(https?://)?([a-z0-9-]+\.)*wikipedia\.org/wiki/[^\s/?#][^\s]*$")
        .expect("article pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Default)]
pub enum GenerationState {
    #[default]
    Idle,
    Requesting {
        wikipedia_url: String,
        num_questions: u32,
    },
    Succeeded(Quiz),
    Failed(QuizError),
}

impl GenerationState {
    fn name(&self) -> &'static str {
        match self {
            GenerationState::Idle => "idle",
            GenerationState::Requesting { .. } => "requesting",
            GenerationState::Succeeded(_) => "succeeded",
            GenerationState::Failed(_) => "failed",
        }
    }
}

/// Check a generate request locally; returns the trimmed URL to send
pub fn validate_request(wikipedia_url: &str, num_questions: u32) -> Result<String, QuizError> {
    let url = wikipedia_url.trim();
    if url.is_empty() || !WIKIPEDIA_ARTICLE.is_match(url) {
        return Err(QuizError::invalid_input(
            "Please enter a valid Wikipedia article URL",
        ));
    }
    if !(MIN_QUESTIONS..=MAX_QUESTIONS).contains(&num_questions) {
        return Err(QuizError::invalid_input(format!(
            "Number of questions must be between {} and {}",
            MIN_QUESTIONS, MAX_QUESTIONS
        )));
    }
    Ok(url.to_string())
}

#[derive(Debug, Default)]
struct Inner {
    state: GenerationState,
    interest: Interest,
    in_flight: bool,
}

/// Drives one quiz generation at a time and decides which results may still be shown.
pub struct GenerationOrchestrator<S> {
    service: S,
    inner: Mutex<Inner>,
}

/// Releases the in-flight slot when a submit finishes or its future is dropped
struct InFlightGuard<'a> {
    inner: &'a Mutex<Inner>,
    ticket: Ticket,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut inner = lock(self.inner);
        inner.in_flight = false;
        // Submit abandoned mid-request: nothing will ever complete this state
        if inner.interest.is_current(self.ticket)
            && matches!(inner.state, GenerationState::Requesting { .. })
        {
            inner.interest.withdraw();
            inner.state = GenerationState::Idle;
            log_transition!(MACHINE, from = "requesting", to = "idle");
        }
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<S: QuizService> GenerationOrchestrator<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Validate and request a new quiz.
    ///
    /// Invalid input fails immediately without touching the network. While a previous generate
    /// call of this orchestrator is outstanding the submit is rejected and the state is kept.
    pub async fn submit(&self, wikipedia_url: &str, num_questions: u32) -> RequestOutcome {
        let (url, ticket) = {
            let mut inner = lock(&self.inner);
            if inner.in_flight {
                log_rejected!(MACHINE, "a generate request is already in flight");
                return RequestOutcome::Rejected;
            }

            let from = inner.state.name();
            let url = match validate_request(wikipedia_url, num_questions) {
                Ok(url) => url,
                Err(error) => {
                    inner.interest.withdraw();
                    inner.state = GenerationState::Failed(error);
                    log_transition!(MACHINE, from = from, to = "failed");
                    return RequestOutcome::Applied;
                }
            };

            let ticket = inner.interest.register();
            inner.in_flight = true;
            inner.state = GenerationState::Requesting {
                wikipedia_url: url.clone(),
                num_questions,
            };
            log_transition!(MACHINE, from = from, to = "requesting", epoch = ticket.epoch());
            (url, ticket)
        };

        let _guard = InFlightGuard {
            inner: &self.inner,
            ticket,
        };

        let result = self.service.generate_quiz(&url, num_questions).await;

        let mut inner = lock(&self.inner);
        if !inner.interest.is_current(ticket) {
            log_stale_discard!(MACHINE, ticket = ticket.epoch(), current = inner.interest.epoch());
            return RequestOutcome::Discarded;
        }

        inner.state = match result {
            Ok(quiz) => GenerationState::Succeeded(quiz),
            Err(error) => {
                log_request_error!("generate_quiz", error = error);
                GenerationState::Failed(error)
            }
        };
        log_transition!(MACHINE, from = "requesting", to = inner.state.name());
        RequestOutcome::Applied
    }

    /// Return to `Idle`, dropping any held quiz or error and any interest in a pending result
    pub fn reset(&self) {
        let mut inner = lock(&self.inner);
        let from = inner.state.name();
        inner.interest.withdraw();
        inner.state = GenerationState::Idle;
        log_transition!(MACHINE, from = from, to = "idle", epoch = inner.interest.epoch());
    }

    pub fn state(&self) -> GenerationState {
        lock(&self.inner).state.clone()
    }

    pub fn is_loading(&self) -> bool {
        matches!(lock(&self.inner).state, GenerationState::Requesting { .. })
    }

    /// A generate call is outstanding, even if its result will be discarded
    pub fn is_busy(&self) -> bool {
        lock(&self.inner).in_flight
    }

    pub fn quiz(&self) -> Option<Quiz> {
        match &lock(&self.inner).state {
            GenerationState::Succeeded(quiz) => Some(quiz.clone()),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<QuizError> {
        match &lock(&self.inner).state {
            GenerationState::Failed(error) => Some(error.clone()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn test_accepts_wikipedia_article_urls() {
        let urls = vec![
            "https://en.wikipedia.org/wiki/Turing_Award",
            "http://de.wikipedia.org/wiki/Alan_Turing",
            "https://en.m.wikipedia.org/wiki/Rust_(programming_language)",
            "en.wikipedia.org/wiki/Paris",
            "  https://en.wikipedia.org/wiki/Paris  ",
        ];

        for url in urls {
            assert!(validate_request(url, 5).is_ok(), "'{}' should be accepted", url);
        }
    }

    #[test]
    fn test_rejects_non_article_urls() {
        let urls = vec![
            "",
            "https://example.com/not-wikipedia",
            "https://en.wikipedia.org/",
            "https://en.wikipedia.org/wiki/",
            "https://wikipedia.org.evil.com/wiki/Paris",
            "not a url at all",
        ];

        for url in urls {
            let error = validate_request(url, 5).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidInput, "'{}' should be rejected", url);
        }
    }

    #[test]
    fn test_question_count_bounds() {
        let url = "https://en.wikipedia.org/wiki/Paris";
        assert!(validate_request(url, 4).is_err());
        assert!(validate_request(url, 5).is_ok());
        assert!(validate_request(url, 10).is_ok());
        assert!(validate_request(url, 11).is_err());
    }

    #[test]
    fn test_validated_url_is_trimmed() {
        let url = validate_request(" https://en.wikipedia.org/wiki/Paris\n", 7).unwrap();
        assert_eq!(url, "https://en.wikipedia.org/wiki/Paris");
    }
}
