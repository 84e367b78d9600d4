use std::sync::{Mutex, MutexGuard};

use crate::errors::QuizError;
use crate::interest::{Interest, RequestOutcome};
use crate::models::{DeleteConfirmation, Quiz, QuizId, QuizSummary};
use crate::service_client::QuizService;
use crate::{log_request_error, log_stale_discard, log_transition};

const LIST: &str = "history_list";
const MODAL: &str = "history_modal";

#[derive(Debug, Clone, PartialEq)]
pub enum ListState {
    Loading,
    Loaded(Vec<QuizSummary>),
    Failed(QuizError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Closed,
    Opening(QuizId),
    Showing(Quiz),
    /// The details fetch failed; the modal is closed and the error is shown instead
    ClosedWithError(QuizError),
}

impl ListState {
    fn name(&self) -> &'static str {
        match self {
            ListState::Loading => "loading",
            ListState::Loaded(_) => "loaded",
            ListState::Failed(_) => "failed",
        }
    }
}

impl ModalState {
    fn name(&self) -> &'static str {
        match self {
            ModalState::Closed => "closed",
            ModalState::Opening(_) => "opening",
            ModalState::Showing(_) => "showing",
            ModalState::ClosedWithError(_) => "closed_with_error",
        }
    }

    fn concerns(&self, id: QuizId) -> bool {
        match self {
            ModalState::Opening(opening) => *opening == id,
            ModalState::Showing(quiz) => quiz.id == id,
            _ => false,
        }
    }
}

#[derive(Debug)]
struct Inner {
    list: ListState,
    list_interest: Interest,
    modal: ModalState,
    modal_interest: Interest,
}

/// History list plus the details modal.
///
/// The list and the modal move independently; each has its own epoch, so closing the modal
/// never affects a pending refresh and vice versa.
pub struct HistoryOrchestrator<S> {
    service: S,
    inner: Mutex<Inner>,
}

impl<S: QuizService> HistoryOrchestrator<S> {
    /// Starts in `Loading`; the view triggers the first `refresh` when it is shown
    pub fn new(service: S) -> Self {
        Self {
            service,
            inner: Mutex::new(Inner {
                list: ListState::Loading,
                list_interest: Interest::default(),
                modal: ModalState::Closed,
                modal_interest: Interest::default(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Reload the quiz list. A failure replaces the previous list with the error.
    pub async fn refresh(&self) -> RequestOutcome {
        let ticket = {
            let mut inner = self.lock();
            let from = inner.list.name();
            let ticket = inner.list_interest.register();
            inner.list = ListState::Loading;
            log_transition!(LIST, from = from, to = "loading", epoch = ticket.epoch());
            ticket
        };

        let result = self.service.list_history().await;

        let mut inner = self.lock();
        if !inner.list_interest.is_current(ticket) {
            log_stale_discard!(LIST, ticket = ticket.epoch(), current = inner.list_interest.epoch());
            return RequestOutcome::Discarded;
        }

        inner.list = match result {
            Ok(quizzes) => ListState::Loaded(quizzes),
            Err(error) => {
                log_request_error!("list_history", error = error);
                ListState::Failed(error)
            }
        };
        log_transition!(LIST, from = "loading", to = inner.list.name());
        RequestOutcome::Applied
    }

    /// Open the details modal for `id`, replacing whatever it showed before
    pub async fn open_details(&self, id: QuizId) -> RequestOutcome {
        let ticket = {
            let mut inner = self.lock();
            let from = inner.modal.name();
            let ticket = inner.modal_interest.register();
            inner.modal = ModalState::Opening(id);
            log_transition!(MODAL, from = from, to = "opening", epoch = ticket.epoch());
            ticket
        };

        let result = self.service.get_quiz(id).await;

        let mut inner = self.lock();
        if !inner.modal_interest.is_current(ticket) {
            log_stale_discard!(MODAL, ticket = ticket.epoch(), current = inner.modal_interest.epoch());
            return RequestOutcome::Discarded;
        }

        inner.modal = match result {
            Ok(quiz) => ModalState::Showing(quiz),
            Err(error) => {
                log_request_error!("get_quiz", quiz_id = id, error = error);
                ModalState::ClosedWithError(error)
            }
        };
        log_transition!(MODAL, from = "opening", to = inner.modal.name());
        RequestOutcome::Applied
    }

    /// Close the modal from any state; a fetch still in flight will be ignored
    pub fn close(&self) {
        let mut inner = self.lock();
        let from = inner.modal.name();
        inner.modal_interest.withdraw();
        inner.modal = ModalState::Closed;
        log_transition!(MODAL, from = from, to = "closed", epoch = inner.modal_interest.epoch());
    }

    /// Delete a quiz. On success its row leaves the loaded list and a modal showing it closes;
    /// on failure nothing changes and the error is returned.
    pub async fn delete(&self, id: QuizId) -> Result<DeleteConfirmation, QuizError> {
        let confirmation = match self.service.delete_quiz(id).await {
            Ok(confirmation) => confirmation,
            Err(error) => {
                log_request_error!("delete_quiz", quiz_id = id, error = error);
                return Err(error);
            }
        };

        let mut inner = self.lock();
        if let ListState::Loaded(quizzes) = &mut inner.list {
            quizzes.retain(|quiz| quiz.id != id);
        }
        if inner.modal.concerns(id) {
            let from = inner.modal.name();
            inner.modal_interest.withdraw();
            inner.modal = ModalState::Closed;
            log_transition!(MODAL, from = from, to = "closed");
        }

        Ok(confirmation)
    }

    pub fn list_state(&self) -> ListState {
        self.lock().list.clone()
    }

    pub fn modal_state(&self) -> ModalState {
        self.lock().modal.clone()
    }

    pub fn is_modal_open(&self) -> bool {
        matches!(
            self.lock().modal,
            ModalState::Opening(_) | ModalState::Showing(_)
        )
    }

    /// The loaded rows, if the list is currently loaded
    pub fn quizzes(&self) -> Option<Vec<QuizSummary>> {
        match &self.lock().list {
            ListState::Loaded(quizzes) => Some(quizzes.clone()),
            _ => None,
        }
    }
}
