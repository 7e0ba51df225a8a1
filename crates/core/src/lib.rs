//! Chat transcript state and the controller that drives it.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod clipboard;
mod controller;
mod query_client;
pub mod transcript;

pub use clipboard::Clipboard;
pub use controller::{
    COPY_RESET_DELAY, Controller, ControllerBuilder, DEFAULT_GREETING, Notice,
    Snapshot, Status,
};
