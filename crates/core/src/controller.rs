mod builder;
mod mailbox;
mod state;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::Instrument;

use crate::transcript::{Message, MessageId, Reaction, Role};
pub use builder::ControllerBuilder;
use mailbox::{Command, Mailbox, MailboxParts};
use state::ControllerState;

/// How long a message stays marked as copied.
pub const COPY_RESET_DELAY: Duration = Duration::from_millis(2000);

/// The assistant greeting a transcript starts with.
pub const DEFAULT_GREETING: &str =
    "👋 Hello! Ask me a question and I'll answer it with sources.";

/// Whether a query is in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Status {
    /// Ready for the next question.
    #[default]
    Idle,
    /// A question was sent and the answer hasn't arrived yet.
    AwaitingResponse,
}

/// A transient notification for the user, e.g. a toast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Notice {
    /// A query failed.
    ConnectionError,
    /// A message was copied.
    Copied,
}

impl Notice {
    /// Short title of the notice.
    pub fn title(&self) -> &'static str {
        match self {
            Notice::ConnectionError => "Connection Error",
            Notice::Copied => "✓ Copied!",
        }
    }

    /// One-line description of the notice.
    pub fn description(&self) -> &'static str {
        match self {
            Notice::ConnectionError => {
                "Failed to reach the AI backend. Please check your connection."
            }
            Notice::Copied => "Message copied to clipboard",
        }
    }
}

/// Everything a front end needs to draw the chat.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    /// The transcript, oldest first.
    pub messages: Vec<Message>,
    /// Whether a query is in flight.
    pub status: Status,
    /// The pending input text.
    pub input: String,
    /// Conversation labels, most recent first.
    pub conversations: Vec<String>,
    /// The message whose sources are expanded, if any.
    pub sources_visible: Option<MessageId>,
}

impl Snapshot {
    /// Looks up a message by id.
    #[inline]
    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Returns `true` if the transcript holds nothing but the greeting.
    #[inline]
    pub fn is_fresh(&self) -> bool {
        matches!(self.messages.as_slice(), [m] if m.role == Role::Assistant)
    }
}

/// Owner of the chat transcript.
///
/// The transcript lives in a background task; this type is a cheap handle
/// to it. Commands are applied in the order they are sent, so a
/// [`Controller::snapshot`] always reflects every command sent before it.
///
/// Only one question can be in flight. Submitting while a query is pending,
/// or submitting blank input, is ignored rather than queued. Failed queries
/// turn into an assistant message describing the error.
///
/// Dropping every handle stops the task; answers that arrive afterwards are
/// discarded.
#[derive(Clone)]
pub struct Controller {
    mailbox: Arc<Mailbox>,
}

impl Controller {
    /// Replaces the input buffer.
    #[inline]
    pub fn set_input<S: Into<String>>(&self, text: S) {
        self.send(Command::SetInput(text.into()));
    }

    /// Submits the input buffer as a question.
    #[inline]
    pub fn submit(&self) {
        self.send(Command::Submit);
    }

    /// Replaces the input buffer with `text` and submits it.
    #[inline]
    pub fn send_message<S: Into<String>>(&self, text: S) {
        self.set_input(text);
        self.submit();
    }

    /// Copies a message to the clipboard and marks it as copied for
    /// [`COPY_RESET_DELAY`].
    #[inline]
    pub fn copy_message(&self, id: MessageId) {
        self.send(Command::Copy(id));
    }

    /// Toggles a reaction on a message.
    #[inline]
    pub fn toggle_reaction(&self, id: MessageId, reaction: Reaction) {
        self.send(Command::ToggleReaction(id, reaction));
    }

    /// Expands the sources of a message, or collapses them if they are
    /// already expanded.
    #[inline]
    pub fn toggle_sources(&self, id: MessageId) {
        self.send(Command::ToggleSources(id));
    }

    /// Resets the transcript to the greeting.
    #[inline]
    pub fn clear_chat(&self) {
        self.send(Command::Clear);
    }

    /// Adds a conversation label and resets the transcript.
    ///
    /// The label is for display only, no backend session is involved.
    #[inline]
    pub fn new_chat(&self) {
        self.send(Command::NewChat);
    }

    /// Registers an observer.
    ///
    /// The callback is invoked with the current state right away, and
    /// again after every change. It runs on the controller task and should
    /// return quickly.
    #[inline]
    pub fn subscribe(
        &self,
        callback: impl Fn(&Snapshot) + Send + Sync + 'static,
    ) {
        self.send(Command::Subscribe(Box::new(callback)));
    }

    /// Returns the current state, or `None` if the controller has stopped.
    pub async fn snapshot(&self) -> Option<Snapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx));
        rx.await.ok()
    }

    /// Stops the controller task.
    ///
    /// Pending commands may be dropped. Queries already in flight run to
    /// completion but their results are discarded.
    #[inline]
    pub fn shutdown(&self) {
        self.mailbox.kill();
    }

    fn spawn_from_builder(builder: ControllerBuilder) -> Self {
        let MailboxParts {
            mailbox,
            cmd_rx,
            kill_rx,
        } = Mailbox::new();
        let mailbox = Arc::new(mailbox);
        let state = ControllerState::from_builder(builder);
        tokio::spawn(
            mailbox::run(Arc::downgrade(&mailbox), state, cmd_rx, kill_rx)
                .instrument(trace_span!("controller")),
        );
        Self { mailbox }
    }

    #[inline]
    fn send(&self, cmd: Command) {
        if self.mailbox.send(cmd).is_err() {
            warn!("controller has stopped, command dropped");
        }
    }
}
