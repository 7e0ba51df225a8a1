//! Wire types and backend abstractions shared by the chat client crates.
//!
//! The types in this crate mirror the JSON contract of the question-answering
//! backend. They carry no behavior of their own; the HTTP client and the
//! transcript controller build on top of them.
//!
//! [`ChatBackend`] is the seam between the controller and whatever answers
//! the questions, so the controller can be driven by a real HTTP backend or a
//! scripted fake without changes.

#![deny(missing_docs)]

mod backend;
mod error;
mod types;

pub use backend::*;
pub use error::*;
pub use types::*;
