use std::collections::HashMap;
use std::sync::Weak;

use chrono::Local;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::builder::{ControllerBuilder, NoticeHandler};
use super::mailbox::{Command, Mailbox, Subscriber, send_weak};
use super::{COPY_RESET_DELAY, DEFAULT_GREETING, Notice, Snapshot, Status};
use crate::clipboard::Clipboard;
use crate::query_client::{QueryClient, QueryResult};
use crate::transcript::{MessageId, Reaction, Role, Transcript};

struct CopyTimer {
    generation: u64,
    task: JoinHandle<()>,
}

pub(crate) struct ControllerState {
    client: QueryClient,
    top_k: Option<u32>,
    greeting: String,
    clipboard: Option<Box<dyn Clipboard>>,
    notice_handlers: Vec<NoticeHandler>,
    subscribers: Vec<Subscriber>,

    transcript: Transcript,
    status: Status,
    input: String,
    conversations: Vec<String>,
    sources_visible: Option<MessageId>,
    copy_timers: HashMap<MessageId, CopyTimer>,
    next_timer_generation: u64,
}

impl ControllerState {
    pub fn from_builder(builder: ControllerBuilder) -> Self {
        let ControllerBuilder {
            client,
            top_k,
            greeting,
            clipboard,
            notice_handlers,
        } = builder;
        let greeting = greeting.unwrap_or_else(|| DEFAULT_GREETING.to_owned());

        Self {
            client,
            top_k,
            transcript: Transcript::with_greeting(&greeting),
            greeting,
            clipboard,
            notice_handlers,
            subscribers: vec![],
            status: Status::Idle,
            input: String::new(),
            conversations: vec!["Current Chat".to_owned()],
            sources_visible: None,
            copy_timers: HashMap::new(),
            next_timer_generation: 1,
        }
    }

    pub fn handle(&mut self, cmd: Command, mailbox: &Weak<Mailbox>) {
        match cmd {
            Command::SetInput(input) => {
                self.input = input;
                self.notify();
            }
            Command::Submit => self.submit(mailbox),
            Command::Copy(id) => self.copy(id, mailbox),
            Command::ToggleReaction(id, reaction) => {
                self.toggle_reaction(id, reaction)
            }
            Command::ToggleSources(id) => self.toggle_sources(id),
            Command::Clear => self.clear(),
            Command::NewChat => {
                let label = format!("Chat {}", Local::now().format("%H:%M:%S"));
                self.conversations.insert(0, label);
                self.clear();
            }
            Command::Subscribe(subscriber) => {
                subscriber(&self.snapshot());
                self.subscribers.push(subscriber);
            }
            Command::Snapshot(tx) => {
                tx.send(self.snapshot()).ok();
            }
            Command::QuerySettled(result) => self.query_settled(result),
            Command::CopyExpired { id, generation } => {
                self.copy_expired(id, generation)
            }
        }
    }

    fn submit(&mut self, mailbox: &Weak<Mailbox>) {
        let question = self.input.trim();
        if question.is_empty() {
            debug!("ignoring blank submission");
            return;
        }
        if self.status == Status::AwaitingResponse {
            debug!("ignoring submission while awaiting a response");
            return;
        }

        let question = question.to_owned();
        self.transcript
            .push(Role::User, question.clone(), vec![]);
        self.input.clear();
        self.status = Status::AwaitingResponse;
        self.notify();

        let client = self.client.clone();
        let top_k = self.top_k;
        let mailbox = mailbox.clone();
        tokio::spawn(async move {
            let result = client.query(question, top_k).await;
            send_weak(&mailbox, Command::QuerySettled(result));
        });
    }

    fn query_settled(&mut self, result: QueryResult) {
        self.status = Status::Idle;
        let failed = match result {
            Ok(resp) => {
                self.transcript
                    .push(Role::Assistant, resp.answer, resp.context);
                false
            }
            Err(err) => {
                let content = format!(
                    "⚠️ I encountered an error: {err}. Please ensure the backend server is running."
                );
                self.transcript.push(Role::Assistant, content, vec![]);
                true
            }
        };
        self.notify();
        if failed {
            self.emit_notice(Notice::ConnectionError);
        }
    }

    fn copy(&mut self, id: MessageId, mailbox: &Weak<Mailbox>) {
        let Some(message) = self.transcript.get_mut(id) else {
            debug!("no message {id} to copy");
            return;
        };
        if let Some(clipboard) = &self.clipboard {
            if let Err(err) = clipboard.write_text(&message.content) {
                warn!("failed to write to clipboard: {err}");
            }
        }
        message.copied = true;

        // Re-arm the reset timer. A stale timer that already fired is
        // recognized by its generation and ignored.
        let generation = self.next_timer_generation;
        self.next_timer_generation += 1;
        let mailbox = mailbox.clone();
        let task = tokio::spawn(async move {
            sleep(COPY_RESET_DELAY).await;
            send_weak(&mailbox, Command::CopyExpired { id, generation });
        });
        if let Some(stale) =
            self.copy_timers.insert(id, CopyTimer { generation, task })
        {
            stale.task.abort();
        }

        self.notify();
        self.emit_notice(Notice::Copied);
    }

    fn copy_expired(&mut self, id: MessageId, generation: u64) {
        match self.copy_timers.get(&id) {
            Some(timer) if timer.generation == generation => {
                self.copy_timers.remove(&id);
            }
            _ => return,
        }
        if let Some(message) = self.transcript.get_mut(id) {
            message.copied = false;
            self.notify();
        }
    }

    fn toggle_reaction(&mut self, id: MessageId, reaction: Reaction) {
        let Some(message) = self.transcript.get_mut(id) else {
            debug!("no message {id} to react to");
            return;
        };
        message.toggle_reaction(reaction);
        self.notify();
    }

    fn toggle_sources(&mut self, id: MessageId) {
        if self.sources_visible == Some(id) {
            self.sources_visible = None;
        } else if self.transcript.get(id).is_some() {
            self.sources_visible = Some(id);
        } else {
            debug!("no message {id} to show sources for");
            return;
        }
        self.notify();
    }

    fn clear(&mut self) {
        self.cancel_timers();
        self.sources_visible = None;
        self.transcript.reset(&self.greeting);
        self.notify();
    }

    pub fn cancel_timers(&mut self) {
        for (_, timer) in self.copy_timers.drain() {
            timer.task.abort();
        }
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            messages: self.transcript.messages().to_vec(),
            status: self.status,
            input: self.input.clone(),
            conversations: self.conversations.clone(),
            sources_visible: self.sources_visible,
        }
    }

    fn notify(&self) {
        if self.subscribers.is_empty() {
            return;
        }
        let snapshot = self.snapshot();
        for subscriber in &self.subscribers {
            subscriber(&snapshot);
        }
    }

    fn emit_notice(&self, notice: Notice) {
        trace!("notice: {notice:?}");
        for handler in &self.notice_handlers {
            handler(notice);
        }
    }
}
