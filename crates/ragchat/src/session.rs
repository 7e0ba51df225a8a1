use ragchat_core::{Clipboard, Controller, ControllerBuilder, Notice, Snapshot};
use ragchat_http::HttpBackend;

use crate::shell::{NavLink, Theme, ThemeStore, nav_links};

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    backend: HttpBackend,
    controller_builder: ControllerBuilder,
    theme_store: Option<ThemeStore>,
    observers: Vec<Box<dyn Fn(&Snapshot) + Send + Sync>>,
}

impl SessionBuilder {
    /// Creates a session builder talking to `backend`.
    pub fn with_backend(backend: HttpBackend) -> Self {
        let controller_builder = ControllerBuilder::with_backend(backend.clone());
        Self {
            backend,
            controller_builder,
            theme_store: None,
            observers: vec![],
        }
    }

    /// Sends every question with a fixed `top_k`.
    #[inline]
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.controller_builder = self.controller_builder.with_top_k(top_k);
        self
    }

    /// Sets the greeting that starts every transcript.
    #[inline]
    pub fn with_greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.controller_builder = self.controller_builder.with_greeting(greeting);
        self
    }

    /// Sets the clipboard that copied messages are written to.
    #[inline]
    pub fn with_clipboard<C: Clipboard>(mut self, clipboard: C) -> Self {
        self.controller_builder = self.controller_builder.with_clipboard(clipboard);
        self
    }

    /// Sets where the theme is persisted.
    ///
    /// Defaults to [`ThemeStore::user_default`].
    #[inline]
    pub fn with_theme_store(mut self, store: ThemeStore) -> Self {
        self.theme_store = Some(store);
        self
    }

    /// Attaches a callback to be invoked for every notice.
    #[inline]
    pub fn on_notice(
        mut self,
        on_notice: impl Fn(Notice) + Send + Sync + 'static,
    ) -> Self {
        self.controller_builder = self.controller_builder.on_notice(on_notice);
        self
    }

    /// Attaches a callback to be invoked with every state change.
    ///
    /// It is called once with the initial state as soon as the session is
    /// built.
    #[inline]
    pub fn on_snapshot(
        mut self,
        on_snapshot: impl Fn(&Snapshot) + Send + Sync + 'static,
    ) -> Self {
        self.observers.push(Box::new(on_snapshot));
        self
    }

    /// Builds a new session. The stored theme is loaded once here.
    ///
    /// Must be called within a tokio runtime.
    pub fn build(self) -> Session {
        let theme_store = self.theme_store.unwrap_or_else(ThemeStore::user_default);
        let theme = theme_store.load();
        debug!("loaded theme: {theme}");

        let controller = self.controller_builder.build();
        for observer in self.observers {
            controller.subscribe(observer);
        }

        Session {
            backend: self.backend,
            controller,
            theme,
            theme_store,
        }
    }
}

/// A chat session, like a window with a navigation bar, a transcript and an
/// input box.
///
/// It is basically a wrapper around [`Controller`] plus the bits of state
/// that live outside the transcript.
pub struct Session {
    backend: HttpBackend,
    controller: Controller,
    theme: Theme,
    theme_store: ThemeStore,
}

impl Session {
    /// Sends a question.
    #[inline]
    pub fn send_message(&self, message: &str) {
        self.controller.send_message(message);
    }

    /// The transcript controller.
    #[inline]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// The backend, for the calls that bypass the transcript.
    #[inline]
    pub fn backend(&self) -> &HttpBackend {
        &self.backend
    }

    /// The current theme.
    #[inline]
    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Switches to the other theme and persists the choice.
    ///
    /// Failing to persist is logged but the switch still happens.
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        if let Err(err) = self.theme_store.save(self.theme) {
            warn!("failed to save theme: {err}");
        }
        self.theme
    }

    /// The navigation links for this session's backend.
    #[inline]
    pub fn nav_links(&self) -> Vec<NavLink> {
        nav_links(self.backend.config().base_url())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.controller.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use ragchat_http::{ApiConfigBuilder, HttpBackend};

    use super::*;

    fn backend() -> HttpBackend {
        let config = ApiConfigBuilder::new()
            .with_base_url("http://127.0.0.1:1/")
            .build();
        HttpBackend::new(config)
    }

    #[tokio::test]
    async fn test_theme_is_loaded_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = ThemeStore::at(dir.path().join("theme"));
        store.save(Theme::Dark).unwrap();

        let mut session = SessionBuilder::with_backend(backend())
            .with_theme_store(store.clone())
            .build();
        assert_eq!(session.theme(), Theme::Dark);

        assert_eq!(session.toggle_theme(), Theme::Light);
        assert_eq!(store.load(), Theme::Light);
    }

    #[tokio::test]
    async fn test_toggle_survives_unwritable_store() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let mut session = SessionBuilder::with_backend(backend())
            .with_theme_store(ThemeStore::at(blocker.join("theme")))
            .build();
        assert_eq!(session.theme(), Theme::Light);
        assert_eq!(session.toggle_theme(), Theme::Dark);
        assert_eq!(session.theme(), Theme::Dark);
    }

    #[tokio::test]
    async fn test_nav_links_use_backend_url() {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionBuilder::with_backend(backend())
            .with_theme_store(ThemeStore::at(dir.path().join("theme")))
            .build();
        let links = session.nav_links();
        assert_eq!(links.last().unwrap().href, "http://127.0.0.1:1/docs");
    }

    #[tokio::test]
    async fn test_observer_sees_greeting() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let session = SessionBuilder::with_backend(backend())
            .with_greeting("Hi!")
            .with_theme_store(ThemeStore::at(dir.path().join("theme")))
            .on_snapshot(move |snapshot| {
                tx.send(snapshot.messages[0].content.clone()).ok();
            })
            .build();

        // The snapshot round trip runs after the subscription.
        session.controller().snapshot().await.unwrap();
        assert_eq!(rx.try_recv().unwrap(), "Hi!");
    }
}
