// src/main.rs

use std::io::BufRead;

use dotenvy::dotenv;
use quiz_portal::{
    api::HttpExamApi, command::parse_command, config::Config, event::Event,
    machine::SessionMachine, store::FileStore, ui::ConsoleUi,
};
use tokio::sync::mpsc::UnboundedSender;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "quiz-portal.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    // Stdout belongs to the exam screen, so console logs go to stderr.
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    let api = match HttpExamApi::new(&config.api_base_url) {
        Ok(api) => api,
        Err(e) => {
            tracing::error!("Cannot start client: {}", e);
            std::process::exit(1);
        }
    };
    let store = FileStore::new(config.store_path.clone());
    tracing::info!(
        "Using API at {}, attempt record at {}",
        config.api_base_url,
        store.path().display()
    );

    let (mut machine, events) = SessionMachine::new(config, api, store, ConsoleUi::stdout());

    let input = machine.sender();
    // Plain thread: a blocked stdin read must not hold up runtime shutdown.
    std::thread::spawn(move || read_commands(input));

    let interrupt = machine.sender();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = interrupt.send(Event::Shutdown);
        }
    });

    machine.run(events).await;
}

/// Forwards typed commands to the session machine until stdin closes.
fn read_commands(tx: UnboundedSender<Event>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(event) => {
                let quit = matches!(event, Event::Shutdown);
                if tx.send(event).is_err() || quit {
                    return;
                }
            }
            Err(msg) => eprintln!("{}", msg),
        }
    }
    let _ = tx.send(Event::Shutdown);
}
