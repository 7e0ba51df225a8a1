use ragchat_proto::ChatBackend;

use super::{Controller, Notice};
use crate::clipboard::Clipboard;
use crate::query_client::QueryClient;

pub(crate) type NoticeHandler = Box<dyn Fn(Notice) + Send + Sync>;

/// [`Controller`] builder.
pub struct ControllerBuilder {
    pub(crate) client: QueryClient,
    pub(crate) top_k: Option<u32>,
    pub(crate) greeting: Option<String>,
    pub(crate) clipboard: Option<Box<dyn Clipboard>>,
    pub(crate) notice_handlers: Vec<NoticeHandler>,
}

impl ControllerBuilder {
    /// Creates a new builder with the specified backend.
    #[inline]
    pub fn with_backend<B: ChatBackend + 'static>(backend: B) -> Self {
        Self {
            client: QueryClient::new(backend),
            top_k: None,
            greeting: None,
            clipboard: None,
            notice_handlers: vec![],
        }
    }

    /// Sends every question with a fixed `top_k` instead of letting the
    /// backend decide.
    #[inline]
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = Some(top_k);
        self
    }

    /// Sets the assistant greeting that starts every transcript.
    #[inline]
    pub fn with_greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Sets the clipboard that copied messages are written to.
    ///
    /// Without one, copying only marks the message.
    #[inline]
    pub fn with_clipboard<C: Clipboard>(mut self, clipboard: C) -> Self {
        self.clipboard = Some(Box::new(clipboard));
        self
    }

    /// Attaches a callback to be invoked for every [`Notice`].
    #[inline]
    pub fn on_notice(
        mut self,
        on_notice: impl Fn(Notice) + Send + Sync + 'static,
    ) -> Self {
        self.notice_handlers.push(Box::new(on_notice));
        self
    }

    /// Builds the controller and starts its task.
    ///
    /// Must be called within a tokio runtime.
    #[inline]
    pub fn build(self) -> Controller {
        Controller::spawn_from_builder(self)
    }
}
