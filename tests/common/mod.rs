#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use wiki_quiz_client::{
    DeleteConfirmation, Question, Quiz, QuizError, QuizId, QuizService, QuizSummary,
};

type Reply = oneshot::Sender<Result<Value, QuizError>>;

#[derive(Default)]
struct Calls {
    log: Vec<String>,
    scripted: HashMap<String, Result<Value, QuizError>>,
    pending: HashMap<String, Reply>,
}

/// In-memory `QuizService` whose responses are controlled by the test.
///
/// Calls are keyed `generate`, `history`, `quiz/<id>` and `delete/<id>`. A scripted response
/// answers immediately; otherwise the call parks until the test resolves it, which lets tests
/// decide the order in which concurrent results arrive.
#[derive(Clone, Default)]
pub struct FakeQuizService {
    calls: Arc<Mutex<Calls>>,
}

impl FakeQuizService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer the next call for `key` immediately with `value`
    pub fn respond<T: serde::Serialize>(&self, key: &str, value: &T) {
        let value = serde_json::to_value(value).expect("fake response serializes");
        self.calls.lock().unwrap().scripted.insert(key.to_string(), Ok(value));
    }

    /// Fail the next call for `key` immediately with `error`
    pub fn fail(&self, key: &str, error: QuizError) {
        self.calls.lock().unwrap().scripted.insert(key.to_string(), Err(error));
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().log.clone()
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.calls.lock().unwrap().pending.contains_key(key)
    }

    /// Yield until a call for `key` is parked
    pub async fn wait_for(&self, key: &str) {
        while !self.is_pending(key) {
            tokio::task::yield_now().await;
        }
    }

    /// Complete the parked call for `key` successfully
    pub fn resolve<T: serde::Serialize>(&self, key: &str, value: &T) {
        let value = serde_json::to_value(value).expect("fake response serializes");
        self.complete(key, Ok(value));
    }

    /// Complete the parked call for `key` with an error
    pub fn reject(&self, key: &str, error: QuizError) {
        self.complete(key, Err(error));
    }

    fn complete(&self, key: &str, result: Result<Value, QuizError>) {
        let reply = self
            .calls
            .lock()
            .unwrap()
            .pending
            .remove(key)
            .unwrap_or_else(|| panic!("no pending call for '{}'", key));
        // The caller may already be gone; that is exactly what some tests check
        let _ = reply.send(result);
    }

    async fn call<T: DeserializeOwned>(&self, key: String) -> Result<T, QuizError> {
        let receiver = {
            let mut calls = self.calls.lock().unwrap();
            calls.log.push(key.clone());
            if let Some(scripted) = calls.scripted.remove(&key) {
                return scripted.map(decode);
            }
            let (sender, receiver) = oneshot::channel();
            let previous = calls.pending.insert(key.clone(), sender);
            assert!(previous.is_none(), "'{}' is already pending", key);
            receiver
        };

        match receiver.await {
            Ok(result) => result.map(decode),
            Err(_) => Err(QuizError::service(format!("'{}' was never answered", key))),
        }
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> T {
    serde_json::from_value(value).expect("fake response decodes")
}

#[async_trait]
impl QuizService for FakeQuizService {
    async fn generate_quiz(&self, _wikipedia_url: &str, _num_questions: u32) -> Result<Quiz, QuizError> {
        self.call("generate".to_string()).await
    }

    async fn list_history(&self) -> Result<Vec<QuizSummary>, QuizError> {
        self.call("history".to_string()).await
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Quiz, QuizError> {
        self.call(format!("quiz/{}", id)).await
    }

    async fn delete_quiz(&self, id: QuizId) -> Result<DeleteConfirmation, QuizError> {
        self.call(format!("delete/{}", id)).await
    }
}

pub const ARTICLE_URL: &str = "https://en.wikipedia.org/wiki/Alan_Turing";

pub fn question(text: &str, options: &[&str], correct_answer: &str) -> Question {
    Question {
        text: text.to_string(),
        options: options.iter().map(|option| option.to_string()).collect(),
        correct_answer: correct_answer.to_string(),
        explanation: Some(format!("Because the answer is {}", correct_answer)),
        difficulty: None,
    }
}

/// A quiz with `num_questions` questions; the correct answer of each is its first option
pub fn sample_quiz(id: QuizId, num_questions: usize) -> Quiz {
    let questions = (0..num_questions)
        .map(|index| {
            let options: Vec<String> = ["A", "B", "C", "D"]
                .iter()
                .map(|label| format!("Option {}{}", label, index))
                .collect();
            let refs: Vec<&str> = options.iter().map(String::as_str).collect();
            question(&format!("Question {}?", index + 1), &refs, &options[0])
        })
        .collect();

    Quiz {
        id,
        title: format!("Quiz {}", id),
        summary: "A short summary of the article.".to_string(),
        wikipedia_url: ARTICLE_URL.to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
        questions,
        related_topics: Some(vec!["Enigma".to_string(), "Bletchley Park".to_string()]),
    }
}

pub fn summary(id: QuizId) -> QuizSummary {
    sample_quiz(id, 0).summary_row()
}
