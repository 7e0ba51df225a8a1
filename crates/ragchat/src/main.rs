//! Terminal chat client for a retrieval-augmented question answering backend.

#[macro_use]
extern crate tracing;

mod input;

use std::collections::HashSet;
use std::env;
use std::io::Write as _;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use ragchat::core::transcript::MessageId;
use ragchat::core::{Notice, Snapshot, Status};
use ragchat::http::{ApiConfigBuilder, HttpBackend};
use ragchat::render::{BAR_CHAR, render_message, render_notice, sanitize};
use ragchat::shell::Theme;
use ragchat::{Session, SessionBuilder};
use tokio::io::{self, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::input::{HELP, Input};

const SUGGESTED_QUESTIONS: [&str; 4] = [
    "What is the evidence for God?",
    "Explain the burden of proof",
    "Is Jesus God in Islam?",
    "What are the prophecies of Muhammad(pbuh)?",
];

enum SessionEvent {
    Snapshot(Snapshot),
    Notice(Notice),
}

/// What has been printed so far.
#[derive(Default)]
struct View {
    shown: HashSet<MessageId>,
}

impl View {
    fn show(&mut self, snapshot: &Snapshot, theme: Theme) {
        let mut printed = false;
        for (idx, message) in snapshot.messages.iter().enumerate() {
            if self.shown.insert(message.id) {
                let expanded = snapshot.sources_visible == Some(message.id);
                println!("{}\n", render_message(idx + 1, message, expanded, theme));
                printed = true;
            }
        }
        if printed && snapshot.is_fresh() {
            print_suggestions();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config_builder = ApiConfigBuilder::new();
    if let Ok(base_url) = env::var("RAGCHAT_API_URL") {
        config_builder = config_builder.with_base_url(base_url);
    }
    let top_k = match env::var("RAGCHAT_TOP_K") {
        Ok(top_k) => match top_k.parse::<u32>() {
            Ok(top_k) if top_k > 0 => Some(top_k),
            _ => {
                eprintln!("RAGCHAT_TOP_K must be a positive integer");
                return;
            }
        },
        Err(_) => None,
    };
    let backend = HttpBackend::new(config_builder.build());

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    let mut session_builder = SessionBuilder::with_backend(backend)
        .on_notice({
            let event_tx = event_tx.clone();
            move |notice| {
                event_tx.send(SessionEvent::Notice(notice)).ok();
            }
        })
        .on_snapshot({
            let event_tx = event_tx.clone();
            move |snapshot| {
                event_tx
                    .send(SessionEvent::Snapshot(snapshot.clone()))
                    .ok();
            }
        });
    if let Some(top_k) = top_k {
        session_builder = session_builder.with_top_k(top_k);
    }
    #[cfg(feature = "clipboard")]
    {
        session_builder = session_builder.with_clipboard(ragchat::SystemClipboard);
    }
    let mut session = session_builder.build();

    println!(
        "{} {}",
        "RAG Chat".bright_white().bold(),
        format!("· {}", session.backend().config().base_url()).bright_black()
    );
    println!("{}\n", "Type /help for commands.".bright_black());

    let mut view = View::default();
    if let Some(snapshot) = settle(&session, &mut event_rx).await {
        view.show(&snapshot, session.theme());
    }

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line().await else {
            break;
        };
        let input = match input::parse(&line) {
            Ok(input) => input,
            Err(err) => {
                println!("{}\n", err.bright_red());
                continue;
            }
        };
        trace!("input: {input:?}");

        match input {
            Input::Empty => {}
            Input::Question(question) => {
                ask(&session, &mut event_rx, &mut view, &question).await;
            }
            Input::Ask(n) => match SUGGESTED_QUESTIONS.get(n - 1) {
                Some(question) => {
                    ask(&session, &mut event_rx, &mut view, question).await;
                }
                None => println!("{}\n", "No such suggestion.".bright_red()),
            },
            Input::NewChat => {
                session.controller().new_chat();
                if let Some(snapshot) = settle(&session, &mut event_rx).await {
                    let conversations = snapshot.conversations.join(" · ");
                    println!("{}\n", conversations.bright_black());
                    view.show(&snapshot, session.theme());
                }
            }
            Input::Clear => {
                session.controller().clear_chat();
                if let Some(snapshot) = settle(&session, &mut event_rx).await {
                    view.show(&snapshot, session.theme());
                }
            }
            Input::Copy(n) => {
                with_message(&session, &mut event_rx, n, |session, id| {
                    session.controller().copy_message(id)
                })
                .await;
            }
            Input::React(n, reaction) => {
                with_message(&session, &mut event_rx, n, |session, id| {
                    session.controller().toggle_reaction(id, reaction)
                })
                .await;
            }
            Input::Sources(n) => {
                with_message(&session, &mut event_rx, n, |session, id| {
                    session.controller().toggle_sources(id)
                })
                .await;
            }
            Input::Theme => {
                let theme = session.toggle_theme();
                println!("{}\n", format!("Switched to {theme} theme.").bright_black());
            }
            Input::Health => match session.backend().check_health().await {
                Ok(health) => println!(
                    "Status: {}\nChatbot ready: {}\nVersion: {}\n",
                    sanitize(&health.status),
                    if health.chatbot_ready { "yes" } else { "no" },
                    sanitize(&health.version)
                ),
                Err(err) => print_error(&err),
            },
            Input::Stats => match session.backend().get_stats().await {
                Ok(stats) => println!(
                    "Documents: {}\nModel: {}\nEmbedding model: {}\nMax tokens: {}\nDefault top_k: {}\n",
                    stats.total_documents,
                    sanitize(&stats.model),
                    sanitize(&stats.embedding_model),
                    stats.max_tokens,
                    stats.default_top_k
                ),
                Err(err) => print_error(&err),
            },
            Input::Config => match session.backend().get_config().await {
                Ok(config) => println!(
                    "top_k: {}\nmax_tokens: {}\ntemperature: {}\nsimilarity_threshold: {}\nllm_provider: {}\nmodel: {}\nembedding_model: {}\ncollection_name: {}\n",
                    config.top_k,
                    config.max_tokens,
                    config.temperature,
                    config.similarity_threshold,
                    sanitize(&config.llm_provider),
                    sanitize(&config.model),
                    sanitize(&config.embedding_model),
                    sanitize(&config.collection_name)
                ),
                Err(err) => print_error(&err),
            },
            Input::Links => {
                for link in session.nav_links() {
                    println!("{} {}", link.label.bold(), link.href.bright_black());
                }
                println!();
            }
            Input::Api => {
                println!("{}\n", session.backend().config().base_url());
            }
            Input::Help => println!("{HELP}\n"),
            Input::Quit => break,
        }
    }
}

/// Submits a question and waits for the answer with a spinner.
async fn ask(
    session: &Session,
    event_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    view: &mut View,
    question: &str,
) {
    session.send_message(question);
    // Queued events are left alone; the final snapshot may already be
    // among them.
    let Some(pending) = session.controller().snapshot().await else {
        error!("controller has stopped");
        return;
    };
    view.show(&pending, session.theme());
    if pending.status == Status::Idle {
        // The submission was ignored.
        drain(event_rx, session.theme());
        return;
    }

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .map(|style| style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"))
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let progress_bar = ProgressBar::new_spinner();
    progress_bar.set_style(progress_style);
    progress_bar.set_message("🤔 Thinking...");

    let answered = wait_for_answer(
        event_rx,
        &pending,
        || progress_bar.inc(1),
        |notice| progress_bar.suspend(|| print_notice(notice, session.theme())),
    )
    .await;
    progress_bar.finish_and_clear();
    if let Some(snapshot) = answered {
        view.show(&snapshot, session.theme());
    }

    // A failure notice is emitted right after the final snapshot.
    drain(event_rx, session.theme());
}

/// Waits for the first idle snapshot that has more messages than `pending`.
///
/// `on_tick` runs every 100 ms while waiting. Returns `None` if the
/// controller goes away.
async fn wait_for_answer(
    event_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    pending: &Snapshot,
    mut on_tick: impl FnMut(),
    mut on_notice: impl FnMut(Notice),
) -> Option<Snapshot> {
    loop {
        on_tick();

        let sleep = sleep(Duration::from_millis(100));
        let event = select! {
            event = event_rx.recv() => event?,
            _ = sleep => {
                continue;
            }
        };

        match event {
            SessionEvent::Snapshot(snapshot) => {
                if snapshot.status == Status::Idle
                    && snapshot.messages.len() > pending.messages.len()
                {
                    return Some(snapshot);
                }
            }
            SessionEvent::Notice(notice) => on_notice(notice),
        }
    }
}

/// Runs an action on message `n` and prints the message again.
async fn with_message(
    session: &Session,
    event_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    n: usize,
    action: impl FnOnce(&Session, MessageId),
) {
    let Some(snapshot) = settle(session, event_rx).await else {
        return;
    };
    let Some(message) = snapshot.messages.get(n - 1) else {
        println!("{}\n", format!("No message [{n}].").bright_red());
        return;
    };
    let id = message.id;
    action(session, id);

    let Some(snapshot) = settle(session, event_rx).await else {
        return;
    };
    if let Some(message) = snapshot.message(id) {
        let expanded = snapshot.sources_visible == Some(id);
        println!(
            "{}\n",
            render_message(n, message, expanded, session.theme())
        );
    }
}

/// Waits until every command sent so far is applied, prints pending
/// notices, and returns the resulting state.
async fn settle(
    session: &Session,
    event_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
) -> Option<Snapshot> {
    let snapshot = session.controller().snapshot().await;
    if snapshot.is_none() {
        error!("controller has stopped");
    }
    drain(event_rx, session.theme());
    snapshot
}

/// Prints queued notices. Queued snapshots are stale by now.
fn drain(event_rx: &mut mpsc::UnboundedReceiver<SessionEvent>, theme: Theme) {
    while let Ok(event) = event_rx.try_recv() {
        if let SessionEvent::Notice(notice) = event {
            print_notice(notice, theme);
        }
    }
}

fn print_notice(notice: Notice, theme: Theme) {
    println!("{}{}\n", BAR_CHAR.bright_yellow(), render_notice(notice, theme));
}

fn print_error(err: &dyn std::error::Error) {
    let message = err.to_string();
    println!("{} {}\n", "Error:".bright_red().bold(), sanitize(&message));
}

fn print_suggestions() {
    println!("{}", "Try asking:".bright_black());
    for (idx, question) in SUGGESTED_QUESTIONS.iter().enumerate() {
        println!("  {} {question}", format!("/ask {}", idx + 1).bright_black());
    }
    println!();
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(0) => None,
        Ok(_) => Some(line),
        Err(err) => {
            error!("error reading input: {err}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ragchat::core::ControllerBuilder;
    use ragchat_test_backend::TestBackend;

    use super::*;

    #[tokio::test]
    async fn test_answer_settled_before_waiting_is_seen() {
        let backend = TestBackend::default().with_delay(Duration::ZERO);
        backend.add_answer("Answer", vec![]);
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();
        let controller = ControllerBuilder::with_backend(backend)
            .on_notice({
                let event_tx = event_tx.clone();
                move |notice| {
                    event_tx.send(SessionEvent::Notice(notice)).ok();
                }
            })
            .build();
        controller.subscribe(move |snapshot| {
            event_tx.send(SessionEvent::Snapshot(snapshot.clone())).ok();
        });

        controller.send_message("Question");
        let pending = controller.snapshot().await.unwrap();
        assert_eq!(pending.status, Status::AwaitingResponse);

        // Let the answer land before anyone waits for it.
        sleep(Duration::from_millis(50)).await;
        assert_eq!(controller.snapshot().await.unwrap().messages.len(), 3);

        let mut ticks = 0;
        let answered = tokio::time::timeout(
            Duration::from_secs(5),
            wait_for_answer(&mut event_rx, &pending, || ticks += 1, |_| {}),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(answered.messages.len(), 3);
        assert_eq!(answered.messages[2].content, "Answer");
        assert!(ticks >= 1);
    }
}
