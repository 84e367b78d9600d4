use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::config::ServiceConfig;
use crate::errors::{ErrorContext, QuizError};
use crate::models::{
    DeleteConfirmation, ErrorPayload, GenerateQuizRequest, Quiz, QuizId, QuizSummary,
};
use crate::{log_request_start, log_request_success, log_validation};

/// The four logical operations of the remote quiz service.
///
/// Implementations issue exactly one outbound request per call and never retry.
#[async_trait]
pub trait QuizService: Send + Sync {
    async fn generate_quiz(&self, wikipedia_url: &str, num_questions: u32) -> Result<Quiz, QuizError>;

    async fn list_history(&self) -> Result<Vec<QuizSummary>, QuizError>;

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, QuizError>;

    async fn delete_quiz(&self, id: QuizId) -> Result<DeleteConfirmation, QuizError>;
}

/// HTTP implementation of [`QuizService`]. Stateless apart from the pooled connection.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: Client,
    base_url: String,
}

impl ServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::new(config.base_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Decode a success body, or turn a non-success status into a `ServiceError`.
    /// With `use_detail` the service's `{detail}` message replaces the fallback.
    async fn read_json<T: DeserializeOwned>(
        response: Response,
        context: &ErrorContext,
        use_detail: bool,
    ) -> Result<T, QuizError> {
        let status = response.status();
        if !status.is_success() {
            let detail = if use_detail {
                response
                    .json::<ErrorPayload>()
                    .await
                    .ok()
                    .and_then(|payload| payload.detail_message().map(str::to_string))
            } else {
                None
            };
            return Err(context.rejected(status.as_u16(), detail.as_deref()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| context.transport(e))
    }

    fn check_answer_keys(quiz: &Quiz) {
        let violations = quiz.answer_key_violations();
        if violations.is_empty() {
            log_validation!(success, "quiz", "answer keys consistent");
        } else {
            let error = format!(
                "quiz {} has inconsistent answer keys at questions {:?}",
                quiz.id, violations
            );
            log_validation!(failure, "quiz", error = error);
        }
    }
}

#[async_trait]
impl QuizService for ServiceClient {
    async fn generate_quiz(&self, wikipedia_url: &str, num_questions: u32) -> Result<Quiz, QuizError> {
        let context = ErrorContext::new("generate_quiz", "Failed to generate quiz");
        log_request_start!("generate_quiz", url = wikipedia_url, num_questions = num_questions);

        let body = GenerateQuizRequest {
            wikipedia_url: wikipedia_url.to_string(),
            num_questions,
        };

        let response = self
            .client
            .post(self.endpoint("/generate_quiz"))
            .json(&body)
            .send()
            .await
            .map_err(|e| context.transport(e))?;

        let quiz: Quiz = Self::read_json(response, &context, true).await?;
        Self::check_answer_keys(&quiz);
        if quiz.questions.len() != num_questions as usize {
            warn!(
                requested = num_questions,
                received = quiz.questions.len(),
                "Service returned a different number of questions than requested"
            );
        }

        log_request_success!("generate_quiz", quiz_id = quiz.id, "quiz generated");
        Ok(quiz)
    }

    async fn list_history(&self) -> Result<Vec<QuizSummary>, QuizError> {
        let context = ErrorContext::new("list_history", "Failed to fetch quiz history");
        log_request_start!("list_history");

        let response = self
            .client
            .get(self.endpoint("/history"))
            .send()
            .await
            .map_err(|e| context.transport(e))?;

        let history: Vec<QuizSummary> = Self::read_json(response, &context, false).await?;

        log_request_success!("list_history", count = history.len(), "history fetched");
        Ok(history)
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, QuizError> {
        let context = ErrorContext::new("get_quiz", "Failed to fetch quiz").with_id(id);
        log_request_start!("get_quiz", quiz_id = id);

        let response = self
            .client
            .get(self.endpoint(&format!("/quiz/{}", id)))
            .send()
            .await
            .map_err(|e| context.transport(e))?;

        let quiz: Quiz = Self::read_json(response, &context, false).await?;
        Self::check_answer_keys(&quiz);

        log_request_success!("get_quiz", quiz_id = id, "quiz fetched");
        Ok(quiz)
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<DeleteConfirmation, QuizError> {
        let context = ErrorContext::new("delete_quiz", "Failed to delete quiz").with_id(id);
        log_request_start!("delete_quiz", quiz_id = id);

        let response = self
            .client
            .delete(self.endpoint(&format!("/quiz/{}", id)))
            .send()
            .await
            .map_err(|e| context.transport(e))?;

        let confirmation: DeleteConfirmation = Self::read_json(response, &context, false).await?;

        log_request_success!("delete_quiz", quiz_id = id, "quiz deleted");
        Ok(confirmation)
    }
}
