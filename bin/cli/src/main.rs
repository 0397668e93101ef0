//! Terminal host for the palaver chat widget.
//!
//! Reads lines from stdin: plain text is sent, slash commands drive host
//! signals and session verbs (see `/help`). Replies are printed word by word
//! as they reveal; a fully printed message counts as fully visible.

mod command;
mod config;

use command::{Command, HELP};
use config::CliConfig;
use palaver_ai::{BackendSlot, CannedBackend, OpenAiBackend, OpenAiConfig};
use palaver_conversation::{FileStorage, Message, Storage};
use palaver_core::MessageId;
use palaver_widget::{
    ChatView, Identity, JitterDelay, Rejection, SessionController, SessionHooks, SubmitOutcome,
    ViewUpdate,
};
use std::collections::{HashMap, HashSet};
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,palaver=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = match CliConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Err(report) = config.widget.validate() {
        error!(error = %report, "invalid widget configuration");
        return ExitCode::FAILURE;
    }
    info!(data_dir = %config.data_dir.display(), "Loaded configuration");

    let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(&config.data_dir));
    let hooks = SessionHooks::new()
        .on_login_required(|| println!("* Sign in with /login <id> to chat."));
    let controller = SessionController::builder(storage, build_backend(&config))
        .config(config.widget.clone())
        .hooks(hooks)
        .online(config.start_online)
        .build();
    let delay = Arc::new(JitterDelay::from(config.widget.reveal));
    let mut view = ChatView::new(controller.clone(), delay);

    if let Some(reason) = controller.status().config_error {
        println!("* Chat is unavailable: {reason}");
    }
    println!("* Type a message, or /help for commands.");

    run(&controller, &mut view).await;

    view.teardown();
    controller.dispose();
    ExitCode::SUCCESS
}

fn build_backend(config: &CliConfig) -> BackendSlot {
    match config.api_key() {
        Some(key) => {
            let openai = OpenAiConfig {
                model: config.model.clone(),
                base_url: config.base_url.clone(),
                ..OpenAiConfig::new(key)
            };
            BackendSlot::from_init(OpenAiBackend::new(openai))
        }
        None => {
            info!("No API key configured, answering with canned replies");
            BackendSlot::ready(
                CannedBackend::new().latency(Duration::from_millis(config.canned_latency_ms)),
            )
        }
    }
}

async fn run(controller: &SessionController, view: &mut ChatView) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<SubmitOutcome>();
    let mut transcript = Transcript::default();

    let log = view.sync();
    transcript.print_new(view, &log);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, "failed to read input");
                        break;
                    }
                };
                match Command::parse(&line) {
                    Command::Say(text) if text.is_empty() => {}
                    Command::Say(text) => {
                        controller.set_input(text.clone());
                        let controller = controller.clone();
                        let done = done_tx.clone();
                        tokio::spawn(async move {
                            let outcome = controller.submit(&text).await;
                            // The receiver only goes away at shutdown.
                            let _ = done.send(outcome);
                        });
                    }
                    Command::Signal(signal) => {
                        controller.handle_signal(signal);
                        print_maintenance(controller);
                    }
                    Command::Login(id) => {
                        controller.sign_in(Identity::new(id));
                        let log = view.sync();
                        transcript.print_new(view, &log);
                    }
                    Command::Logout => {
                        controller.sign_out();
                        let log = view.sync();
                        transcript.print_new(view, &log);
                    }
                    Command::Reset => {
                        controller.reset();
                        println!("* History cleared.");
                        let log = view.sync();
                        transcript.print_new(view, &log);
                    }
                    Command::Status => print_status(controller),
                    Command::Help => println!("{HELP}"),
                    Command::Quit => break,
                    Command::Unknown(line) => println!("* Unknown command: {line}"),
                }
            }
            Some(outcome) = done_rx.recv() => {
                match outcome {
                    SubmitOutcome::Rejected(Rejection::LoginRequired) => {}
                    SubmitOutcome::Rejected(rejection) => println!("* Not sent: {rejection}"),
                    SubmitOutcome::Completed { failure, .. } => {
                        if let Some(kind) = failure {
                            debug!(kind = %kind, "reply is an error message");
                        }
                    }
                    SubmitOutcome::Discarded { .. } => {}
                }
                let log = view.sync();
                transcript.print_new(view, &log);
            }
            Some(update) = view.next_update() => transcript.apply(view, update),
        }
    }
}

fn print_maintenance(controller: &SessionController) {
    let status = controller.status();
    match status.maintenance {
        Some(m) if m.active => match m.estimated_end {
            Some(end) => println!("* {} (until about {} UTC)", m.message, end.format("%H:%M")),
            None => println!("* {}", m.message),
        },
        Some(m) => println!("* {}", m.message),
        None => {}
    }
    println!("* {}", if status.online { "Online" } else { "Offline" });
}

fn print_status(controller: &SessionController) {
    let status = controller.status();
    let identity = status
        .identity
        .as_ref()
        .map_or("anonymous", |identity| identity.id.as_str());
    let maintenance = match &status.maintenance {
        Some(m) if m.active => m.message.as_str(),
        _ => "none",
    };

    println!("* identity:    {identity}");
    println!("* online:      {}", status.online);
    println!("* busy:        {}", status.busy);
    println!("* maintenance: {maintenance}");
    if let Some(reason) = &status.config_error {
        println!("* backend:     unavailable ({reason})");
    }
    if let Some(reason) = controller.storage_error() {
        println!("* storage:     {reason}");
    }
}

/// Tracks what has been printed so far.
#[derive(Debug, Default)]
struct Transcript {
    printed: HashSet<MessageId>,
    /// Bytes of each revealing message already printed.
    revealing: HashMap<MessageId, usize>,
}

impl Transcript {
    fn print_new(&mut self, view: &mut ChatView, log: &[Message]) {
        for message in log {
            if !self.printed.insert(message.id) {
                continue;
            }
            let speaker = if message.is_user() { "you" } else { "assistant" };
            if view.is_revealing(message.id) {
                print!("{speaker}: ");
                flush();
                self.revealing.insert(message.id, 0);
            } else {
                println!("{speaker}: {}", message.content);
                view.report_visibility(message.id, 1.0);
            }
        }
    }

    fn apply(&mut self, view: &mut ChatView, update: ViewUpdate) {
        match update {
            ViewUpdate::Frame { id, text } => {
                let shown = self.revealing.entry(id).or_insert(0);
                print!("{}", text.get(*shown..).unwrap_or_default());
                flush();
                *shown = text.len();
            }
            ViewUpdate::Revealed { id } => {
                self.revealing.remove(&id);
                println!();
                view.report_visibility(id, 1.0);
            }
        }
    }
}

fn flush() {
    // A failed flush only delays output.
    let _ = std::io::stdout().flush();
}
