pub mod config;
pub mod console;
pub mod errors;
pub mod generation;
pub mod history;
pub mod interest;
pub mod logging;
pub mod models;
pub mod quiz_session;
pub mod service_client;

pub use config::Config;
pub use console::Console;
pub use errors::*;
pub use generation::{GenerationOrchestrator, GenerationState};
pub use history::{HistoryOrchestrator, ListState, ModalState};
pub use interest::RequestOutcome;
pub use models::*;
pub use quiz_session::{QuizSession, RenderHint, SelectOutcome};
pub use service_client::{QuizService, ServiceClient};
