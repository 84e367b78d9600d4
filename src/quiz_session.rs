use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{Question, Quiz};

/// Selected option per question index. A key, once inserted, is never overwritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerState {
    selections: BTreeMap<usize, String>,
}

impl AnswerState {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.selections.get(&index).map(String::as_str)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.selections.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.selections
            .iter()
            .map(|(index, option)| (*index, option.as_str()))
    }

    /// Inserts only when `index` has no selection yet; returns whether it did
    fn record_once(&mut self, index: usize, option: &str) -> bool {
        if self.selections.contains_key(&index) {
            return false;
        }
        self.selections.insert(index, option.to_string());
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionMode {
    /// Freshly generated quiz the user answers
    Interactive,
    /// Quiz opened from history with every answer revealed
    ReadOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderHint {
    Neutral,
    SelectedCorrect,
    SelectedWrong,
    RevealedCorrectUnselected,
    Dimmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectOutcome {
    Recorded { correct: bool },
    AlreadyAnswered,
    ReadOnly,
    UnknownQuestion,
    UnknownOption,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    Incorrect { correct_answer: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub answered: usize,
    pub correct: usize,
    pub total: usize,
}

/// Grading state machine over one displayed quiz.
///
/// Each question moves from unanswered to answered exactly once. Everything the view shows
/// (hints, feedback, explanations, progress) is derived from the quiz and the `AnswerState`.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz: Quiz,
    mode: SessionMode,
    answers: AnswerState,
}

impl QuizSession {
    pub fn new(quiz: Quiz) -> Self {
        Self {
            quiz,
            mode: SessionMode::Interactive,
            answers: AnswerState::default(),
        }
    }

    pub fn read_only(quiz: Quiz) -> Self {
        Self {
            quiz,
            mode: SessionMode::ReadOnly,
            answers: AnswerState::default(),
        }
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    pub fn answers(&self) -> &AnswerState {
        &self.answers
    }

    pub fn question(&self, index: usize) -> Option<&Question> {
        self.quiz.questions.get(index)
    }

    pub fn question_count(&self) -> usize {
        self.quiz.questions.len()
    }

    /// Record `option` as the answer to question `index`. Only the first selection counts.
    pub fn select(&mut self, index: usize, option: &str) -> SelectOutcome {
        if self.mode == SessionMode::ReadOnly {
            return SelectOutcome::ReadOnly;
        }
        let Some(question) = self.quiz.questions.get(index) else {
            return SelectOutcome::UnknownQuestion;
        };
        if !question.has_option(option) {
            return SelectOutcome::UnknownOption;
        }
        let correct = question.is_correct_option(option);

        if !self.answers.record_once(index, option) {
            debug!(question = index, "Question already answered, ignoring selection");
            return SelectOutcome::AlreadyAnswered;
        }

        debug!(question = index, correct = correct, "Answer recorded");
        SelectOutcome::Recorded { correct }
    }

    pub fn is_answered(&self, index: usize) -> bool {
        self.answers.contains(index)
    }

    pub fn selected(&self, index: usize) -> Option<&str> {
        self.answers.get(index)
    }

    /// `None` while the question is unanswered
    pub fn is_correct(&self, index: usize) -> Option<bool> {
        let question = self.quiz.questions.get(index)?;
        self.answers
            .get(index)
            .map(|selected| question.is_correct_option(selected))
    }

    pub fn render_hint(&self, index: usize, option: &str) -> RenderHint {
        let Some(question) = self.quiz.questions.get(index) else {
            return RenderHint::Neutral;
        };

        if self.mode == SessionMode::ReadOnly {
            return if question.is_correct_option(option) {
                RenderHint::RevealedCorrectUnselected
            } else {
                RenderHint::Neutral
            };
        }

        match self.answers.get(index) {
            None => RenderHint::Neutral,
            Some(_) if question.is_correct_option(option) => RenderHint::SelectedCorrect,
            Some(selected) if selected == option => RenderHint::SelectedWrong,
            Some(_) => RenderHint::Dimmed,
        }
    }

    /// Explanations stay hidden until the question is answered, except in read-only mode
    pub fn explanation(&self, index: usize) -> Option<&str> {
        if self.mode == SessionMode::Interactive && !self.is_answered(index) {
            return None;
        }
        self.quiz.questions.get(index)?.explanation.as_deref()
    }

    pub fn feedback(&self, index: usize) -> Option<Feedback> {
        let question = self.quiz.questions.get(index)?;
        let selected = self.answers.get(index)?;
        if question.is_correct_option(selected) {
            Some(Feedback::Correct)
        } else {
            Some(Feedback::Incorrect {
                correct_answer: question.correct_answer.clone(),
            })
        }
    }

    pub fn progress(&self) -> Progress {
        let correct = self
            .answers
            .iter()
            .filter(|(index, selected)| {
                self.quiz
                    .questions
                    .get(*index)
                    .is_some_and(|question| question.is_correct_option(selected))
            })
            .count();

        Progress {
            answered: self.answers.len(),
            correct,
            total: self.quiz.questions.len(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.answers.len() == self.quiz.questions.len()
    }
}

/// Display label for the option at `position`: A, B, C, ...
pub fn option_label(position: usize) -> char {
    u8::try_from(position)
        .ok()
        .filter(|offset| *offset < 26)
        .map(|offset| char::from(b'A' + offset))
        .unwrap_or('?')
}
