use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wiki_quiz_client::config::LoggingConfig;
use wiki_quiz_client::{log_system_event, Config, Console, ServiceClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let _guard = setup_logging(&config.logging)?;
    log_system_event!(config, "Client configuration loaded from environment variables");
    config.log_configuration_summary();
    config.validate()?;

    log_system_event!(startup, component = "console", "Wiki quiz client starting");

    let client = ServiceClient::from_config(&config.service);
    let mut console = Console::new(client, config.quiz.default_num_questions);

    println!("Wiki Quiz - turn Wikipedia articles into quizzes. Type `help` for commands.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut quit = false;
    while let Some(line) = lines.next_line().await? {
        if !console.handle(line.trim()) {
            quit = true;
            break;
        }
    }

    // Input ran out (e.g. a piped script): let pending requests print their results
    if !quit {
        console.settle().await;
    }

    log_system_event!(shutdown, component = "console", "Wiki quiz client stopped");
    Ok(())
}

fn setup_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    use std::fs;
    use tracing_subscriber::fmt;

    // Configure log level from environment variable
    let env_filter = EnvFilter::try_new(&config.level)
        .unwrap_or_else(|_| EnvFilter::new("info,wiki_quiz_client=debug"));

    // Console output goes to stderr so it does not interleave with quiz rendering
    let console_layer = config.console_enabled.then(|| {
        fmt::layer()
            .with_target(true)
            .with_ansi(true)
            .with_writer(std::io::stderr)
    });

    // File output with daily rotation (no ANSI colors for files)
    let (file_layer, guard) = if config.file_enabled {
        fs::create_dir_all(&config.log_directory).unwrap_or_else(|e| {
            eprintln!("Warning: Could not create log directory: {}", e);
        });
        let file_appender =
            tracing_appender::rolling::daily(&config.log_directory, "wiki-quiz-client.log");
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
        let layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .with_writer(non_blocking_file);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()?;

    info!(
        log_directory = %config.log_directory,
        file_enabled = config.file_enabled,
        "Logging initialized"
    );

    Ok(guard)
}
