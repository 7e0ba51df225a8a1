//! A local fake chat backend for testing purpose.

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use ragchat_proto::{
    BackendError, ChatBackend, ContextItem, ErrorKind, QueryResponse,
};
use tokio::time::sleep;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Error {}

impl BackendError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

#[derive(Clone, Debug)]
enum Reply {
    Answer {
        answer: String,
        context: Vec<ContextItem>,
    },
    Failure {
        message: String,
        kind: ErrorKind,
    },
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Reply>,
    received: Vec<(String, Option<u32>)>,
}

/// A local fake backend for testing purpose.
///
/// Replies are consumed in order, one per query. A query that finds the
/// script empty fails with a network error. Clones share the same script,
/// so a test can keep one clone to inspect what the code under test sent.
#[derive(Clone, Default)]
pub struct TestBackend {
    script: Arc<Mutex<Script>>,
    delay: Option<Duration>,
}

impl TestBackend {
    /// Delays every reply by `delay`.
    #[inline]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Appends a successful reply.
    pub fn add_answer<S: Into<String>>(
        &self,
        answer: S,
        context: Vec<ContextItem>,
    ) {
        self.with_script(|script| {
            script.replies.push_back(Reply::Answer {
                answer: answer.into(),
                context,
            })
        });
    }

    /// Appends a failed reply.
    pub fn add_failure<S: Into<String>>(&self, message: S, kind: ErrorKind) {
        self.with_script(|script| {
            script.replies.push_back(Reply::Failure {
                message: message.into(),
                kind,
            })
        });
    }

    /// Returns the `(question, top_k)` pairs received so far.
    pub fn received(&self) -> Vec<(String, Option<u32>)> {
        self.with_script(|script| script.received.clone())
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut script =
            self.script.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut script)
    }
}

impl ChatBackend for TestBackend {
    type Error = Error;

    fn query(
        &self,
        question: &str,
        top_k: Option<u32>,
    ) -> impl Future<Output = Result<QueryResponse, Self::Error>> + Send + 'static
    {
        let reply = self.with_script(|script| {
            script.received.push((question.to_owned(), top_k));
            script.replies.pop_front()
        });
        let question = question.to_owned();
        let delay = self.delay.unwrap_or(Duration::from_millis(1));

        async move {
            sleep(delay).await;
            match reply {
                Some(Reply::Answer { answer, context }) => Ok(QueryResponse {
                    answer,
                    context,
                    question,
                }),
                Some(Reply::Failure { message, kind }) => {
                    Err(Error { message, kind })
                }
                None => Err(Error {
                    message: "no more scripted replies".to_owned(),
                    kind: ErrorKind::Network,
                }),
            }
        }
    }
}

/// Shorthand for building a [`ContextItem`] without provenance.
pub fn context_item(
    instruction: &str,
    output: &str,
    similarity: f64,
) -> ContextItem {
    ContextItem {
        instruction: instruction.to_owned(),
        output: output.to_owned(),
        similarity,
        channel_username: None,
        video_id: None,
        source: None,
    }
}
