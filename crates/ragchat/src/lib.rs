//! A terminal client for a retrieval-augmented chat backend.
//!
//! The crate includes a CLI tool for using in the terminal. And you can also
//! use it as a library to assemble a chat session and render its transcript
//! in your own front end.

#![deny(missing_docs)]

#[allow(unused_imports)]
#[macro_use]
extern crate tracing;

#[cfg(feature = "clipboard")]
mod clipboard;
pub mod render;
mod session;
pub mod shell;

#[cfg(feature = "clipboard")]
pub use clipboard::SystemClipboard;
pub use session::{Session, SessionBuilder};

/// Re-exports of [`ragchat_core`] crate.
pub mod core {
    pub use ragchat_core::*;
}

/// Re-exports of [`ragchat_http`] crate.
pub mod http {
    pub use ragchat_http::*;
}
