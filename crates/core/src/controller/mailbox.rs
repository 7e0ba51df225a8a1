use std::fmt::{self, Debug};
use std::sync::Weak;

use tokio::select;
use tokio::sync::{mpsc, oneshot, watch};

use super::Snapshot;
use super::state::ControllerState;
use crate::query_client::QueryResult;
use crate::transcript::{MessageId, Reaction};

pub(crate) type Subscriber = Box<dyn Fn(&Snapshot) + Send + Sync>;

pub(crate) enum Command {
    SetInput(String),
    Submit,
    Copy(MessageId),
    ToggleReaction(MessageId, Reaction),
    ToggleSources(MessageId),
    Clear,
    NewChat,
    Subscribe(Subscriber),
    Snapshot(oneshot::Sender<Snapshot>),
    // Sent by the controller's own tasks.
    QuerySettled(QueryResult),
    CopyExpired { id: MessageId, generation: u64 },
}

impl Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetInput(input) => {
                f.debug_tuple("SetInput").field(input).finish()
            }
            Command::Submit => f.write_str("Submit"),
            Command::Copy(id) => f.debug_tuple("Copy").field(id).finish(),
            Command::ToggleReaction(id, reaction) => f
                .debug_tuple("ToggleReaction")
                .field(id)
                .field(reaction)
                .finish(),
            Command::ToggleSources(id) => {
                f.debug_tuple("ToggleSources").field(id).finish()
            }
            Command::Clear => f.write_str("Clear"),
            Command::NewChat => f.write_str("NewChat"),
            Command::Subscribe(_) => f.write_str("Subscribe"),
            Command::Snapshot(_) => f.write_str("Snapshot"),
            Command::QuerySettled(result) => f
                .debug_tuple("QuerySettled")
                .field(&result.as_ref().map(|resp| &resp.answer))
                .finish(),
            Command::CopyExpired { id, generation } => f
                .debug_struct("CopyExpired")
                .field("id", id)
                .field("generation", generation)
                .finish(),
        }
    }
}

pub(crate) struct MailboxParts {
    pub mailbox: Mailbox,
    pub cmd_rx: mpsc::UnboundedReceiver<Command>,
    pub kill_rx: watch::Receiver<bool>,
}

pub(crate) struct Mailbox {
    cmd_tx: mpsc::UnboundedSender<Command>,
    kill_tx: watch::Sender<bool>,
}

/// The mailbox has no receiver anymore.
#[derive(Debug)]
pub(crate) struct Closed;

impl Mailbox {
    #[inline]
    pub fn new() -> MailboxParts {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (kill_tx, kill_rx) = watch::channel(false);
        MailboxParts {
            mailbox: Mailbox { cmd_tx, kill_tx },
            cmd_rx,
            kill_rx,
        }
    }

    #[inline]
    pub fn send(&self, cmd: Command) -> Result<(), Closed> {
        self.cmd_tx.send(cmd).map_err(|_| Closed)
    }

    #[inline]
    pub fn kill(&self) {
        self.kill_tx.send(true).ok();
    }
}

/// Sends a command through a weak mailbox reference, dropping it if every
/// controller handle is gone.
#[inline]
pub(crate) fn send_weak(mailbox: &Weak<Mailbox>, cmd: Command) {
    match mailbox.upgrade() {
        Some(mailbox) => {
            mailbox.send(cmd).ok();
        }
        None => trace!("controller is gone, discarding {cmd:?}"),
    }
}

pub(crate) async fn run(
    mailbox: Weak<Mailbox>,
    mut state: ControllerState,
    mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    mut kill_rx: watch::Receiver<bool>,
) {
    debug!("started");
    loop {
        let cmd = select! {
            biased;

            _ = kill_rx.changed() => {
                break;
            }
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    break;
                };
                cmd
            }
        };
        trace!("received command: {cmd:?}");

        let proc_span = trace_span!("proc cmd");
        proc_span.in_scope(|| state.handle(cmd, &mailbox));
    }
    state.cancel_timers();
    debug!("will terminate");
}
