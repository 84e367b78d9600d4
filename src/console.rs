use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinSet;
use tracing::warn;

use crate::generation::{GenerationOrchestrator, GenerationState, MAX_QUESTIONS, MIN_QUESTIONS};
use crate::history::{HistoryOrchestrator, ListState, ModalState};
use crate::interest::RequestOutcome;
use crate::models::QuizId;
use crate::quiz_session::{
    option_label, Feedback, QuizSession, RenderHint, SelectOutcome, SessionMode,
};
use crate::service_client::QuizService;

pub const HELP: &str = "\
Commands:
  generate <wikipedia-url> [count]   generate a quiz (count 5-10)
  answer <question> <letter>         answer a question of the current quiz, e.g. `answer 2 B`
  show                               show the current quiz again
  reset                              discard the current quiz
  history                            list previously generated quizzes
  view <id>                          show a stored quiz with its answers
  close                              close the stored quiz
  delete <id>                        delete a stored quiz
  help                               show this help
  quit                               exit";

/// Terminal front end: renders orchestrator state and forwards commands to it.
///
/// Commands that reach the service run as background tasks, so `reset` and `close` are read and
/// applied while a request is still pending. A task prints only when its result was applied.
pub struct Console<S> {
    generation: Arc<GenerationOrchestrator<S>>,
    history: Arc<HistoryOrchestrator<S>>,
    session: Arc<Mutex<Option<QuizSession>>>,
    default_num_questions: u32,
    tasks: JoinSet<()>,
}

fn lock_session(session: &Mutex<Option<QuizSession>>) -> MutexGuard<'_, Option<QuizSession>> {
    session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<S: QuizService + 'static> Console<S> {
    pub fn new(service: S, default_num_questions: u32) -> Self
    where
        S: Clone,
    {
        Self {
            generation: Arc::new(GenerationOrchestrator::new(service.clone())),
            history: Arc::new(HistoryOrchestrator::new(service)),
            session: Arc::new(Mutex::new(None)),
            default_num_questions,
            tasks: JoinSet::new(),
        }
    }

    pub fn generation(&self) -> &GenerationOrchestrator<S> {
        &self.generation
    }

    pub fn history(&self) -> &HistoryOrchestrator<S> {
        &self.history
    }

    /// The quiz currently being taken, if any
    pub fn session(&self) -> Option<QuizSession> {
        lock_session(&self.session).clone()
    }

    /// Wait for every background request to finish
    pub async fn settle(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            if let Err(error) = result {
                warn!(error = %error, "Console task failed");
            }
        }
    }

    /// Handle one input line. Returns false when the user asked to quit.
    pub fn handle(&mut self, line: &str) -> bool {
        // Reap finished tasks so the set does not grow over a long session
        while self.tasks.try_join_next().is_some() {}

        let mut parts = line.split_whitespace();
        let Some(command) = parts.next() else {
            return true;
        };
        let args: Vec<&str> = parts.collect();

        match command {
            "generate" => self.generate(&args),
            "answer" => self.answer(&args),
            "show" => match lock_session(&self.session).as_ref() {
                Some(session) => render_session(session),
                None => println!("No quiz yet. Use `generate <url>`."),
            },
            "reset" => {
                let mut current = lock_session(&self.session);
                self.generation.reset();
                *current = None;
                println!("Ready for a new quiz.");
            }
            "history" | "refresh" => self.refresh(),
            "view" => match parse_id(&args) {
                Some(id) => self.view(id),
                None => println!("Usage: view <id>"),
            },
            "close" => {
                self.history.close();
                println!("Closed.");
            }
            "delete" => match parse_id(&args) {
                Some(id) => self.delete(id),
                None => println!("Usage: delete <id>"),
            },
            "help" => println!("{}", HELP),
            "quit" | "exit" => return false,
            other => println!("Unknown command `{}`. Type `help`.", other),
        }
        true
    }

    fn generate(&mut self, args: &[&str]) {
        let Some(url) = args.first().map(|url| url.to_string()) else {
            println!("Usage: generate <wikipedia-url> [count]");
            return;
        };
        let count = match args.get(1) {
            Some(raw) => match raw.parse::<u32>() {
                Ok(count) => count,
                Err(_) => {
                    println!("Count must be a number between {} and {}", MIN_QUESTIONS, MAX_QUESTIONS);
                    return;
                }
            },
            None => self.default_num_questions,
        };

        if self.generation.is_busy() {
            println!("A quiz is already being generated.");
            return;
        }

        // A new request replaces the quiz on screen
        *lock_session(&self.session) = None;
        println!("Generating your quiz... please wait a moment.");

        let generation = Arc::clone(&self.generation);
        let session = Arc::clone(&self.session);
        self.tasks.spawn(async move {
            match generation.submit(&url, count).await {
                RequestOutcome::Rejected => println!("A quiz is already being generated."),
                RequestOutcome::Discarded => {}
                RequestOutcome::Applied => {
                    // Same lock order as `reset`, so a reset never races the session update
                    let mut current = lock_session(&session);
                    match generation.state() {
                        GenerationState::Succeeded(quiz) => {
                            let fresh = QuizSession::new(quiz);
                            render_session(&fresh);
                            *current = Some(fresh);
                        }
                        GenerationState::Failed(error) => {
                            *current = None;
                            println!("Error: {}", error);
                        }
                        GenerationState::Idle | GenerationState::Requesting { .. } => {
                            *current = None;
                        }
                    }
                }
            }
        });
    }

    fn answer(&mut self, args: &[&str]) {
        let mut guard = lock_session(&self.session);
        let Some(session) = guard.as_mut() else {
            println!("No quiz yet. Use `generate <url>`.");
            return;
        };
        let (Some(number), Some(letter)) = (
            args.first().and_then(|raw| raw.parse::<usize>().ok()),
            args.get(1).and_then(|raw| raw.chars().next()),
        ) else {
            println!("Usage: answer <question> <letter>");
            return;
        };

        let index = number.saturating_sub(1);
        let option = session.question(index).and_then(|question| {
            question
                .options
                .iter()
                .enumerate()
                .find(|(position, _)| option_label(*position) == letter.to_ascii_uppercase())
                .map(|(_, option)| option.clone())
        });
        let Some(option) = option else {
            println!("No option {} for question {}.", letter, number);
            return;
        };

        match session.select(index, &option) {
            SelectOutcome::Recorded { .. } => render_question(session, index),
            SelectOutcome::AlreadyAnswered => println!("Question {} is already answered.", number),
            SelectOutcome::ReadOnly => println!("This quiz is read-only."),
            SelectOutcome::UnknownQuestion | SelectOutcome::UnknownOption => {
                println!("No option {} for question {}.", letter, number)
            }
        }

        if session.is_complete() {
            let progress = session.progress();
            println!("Quiz complete: {}/{} correct.", progress.correct, progress.total);
        }
    }

    fn refresh(&mut self) {
        println!("Loading history...");
        let history = Arc::clone(&self.history);
        self.tasks.spawn(async move {
            if history.refresh().await == RequestOutcome::Applied {
                render_history(&history.list_state());
            }
        });
    }

    fn view(&mut self, id: QuizId) {
        println!("Loading quiz details...");
        let history = Arc::clone(&self.history);
        self.tasks.spawn(async move {
            if history.open_details(id).await != RequestOutcome::Applied {
                return;
            }
            match history.modal_state() {
                ModalState::Showing(quiz) => render_session(&QuizSession::read_only(quiz)),
                ModalState::ClosedWithError(error) => println!("Error: {}", error),
                ModalState::Closed | ModalState::Opening(_) => {}
            }
        });
    }

    fn delete(&mut self, id: QuizId) {
        let history = Arc::clone(&self.history);
        self.tasks.spawn(async move {
            match history.delete(id).await {
                Ok(confirmation) => println!("{}", confirmation.message),
                Err(error) => println!("Error: {}", error),
            }
        });
    }
}

fn parse_id(args: &[&str]) -> Option<QuizId> {
    args.first().and_then(|raw| raw.parse().ok())
}

fn render_history(state: &ListState) {
    match state {
        ListState::Loading => println!("Loading history..."),
        ListState::Failed(error) => println!("Error: {}", error),
        ListState::Loaded(quizzes) if quizzes.is_empty() => {
            println!("No quizzes yet. Generate your first quiz!")
        }
        ListState::Loaded(quizzes) => {
            for quiz in quizzes {
                println!(
                    "#{:<4} {:<40} {}  {}",
                    quiz.id,
                    quiz.title,
                    quiz.created_at.format("%Y-%m-%d %H:%M"),
                    shorten(&quiz.wikipedia_url, 40)
                );
            }
        }
    }
}

fn render_session(session: &QuizSession) {
    let quiz = session.quiz();
    println!("\n{}", quiz.title);
    println!("Created: {}", quiz.created_at.format("%Y-%m-%d %H:%M:%S"));
    println!("\n{}\n", quiz.summary);
    println!("Questions ({})", session.question_count());
    for index in 0..session.question_count() {
        render_question(session, index);
    }
    if let Some(topics) = quiz.related_topics.as_ref().filter(|topics| !topics.is_empty()) {
        println!("\nRelated topics: {}", topics.join(", "));
    }
}

fn render_question(session: &QuizSession, index: usize) {
    let Some(question) = session.question(index) else {
        return;
    };

    let difficulty = question
        .difficulty
        .map(|difficulty| format!(" [{:?}]", difficulty).to_uppercase())
        .unwrap_or_default();
    println!("\nQuestion {}{}: {}", index + 1, difficulty, question.text);

    for (position, option) in question.options.iter().enumerate() {
        let marker = match session.render_hint(index, option) {
            RenderHint::Neutral => "  ",
            RenderHint::SelectedCorrect | RenderHint::RevealedCorrectUnselected => "✔ ",
            RenderHint::SelectedWrong => "✘ ",
            RenderHint::Dimmed => "· ",
        };
        println!("  {}{}. {}", marker, option_label(position), option);
    }

    if session.mode() == SessionMode::Interactive {
        match session.feedback(index) {
            Some(Feedback::Correct) => println!("  Correct!"),
            Some(Feedback::Incorrect { correct_answer }) => {
                println!("  Incorrect! The correct answer is: {}", correct_answer)
            }
            None => {}
        }
    }
    if let Some(explanation) = session.explanation(index) {
        println!("  Explanation: {}", explanation);
    }
}

fn shorten(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
