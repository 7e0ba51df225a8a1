//! Markdown to structured rich content.
//!
//! [`render`] turns the markdown produced by the backend into a
//! [`Document`], a small tree of [`Block`]s and [`Inline`]s. Every node
//! has a fixed [`Style`]; front ends decide how a style looks, but not
//! which construct gets which style.
//!
//! Raw HTML is never passed through. Both HTML blocks and inline tags
//! end up as literal text, so backend-sourced content can't smuggle
//! markup into the surface that displays it.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod builder;
mod document;
mod style;

pub use document::*;
pub use pulldown_cmark::Alignment;
pub use style::{Style, Tone};

use pulldown_cmark::{Options, Parser};

/// Renders markdown text into a [`Document`].
///
/// GitHub-flavored tables, strikethrough and task lists are enabled.
pub fn render(markdown: &str) -> Document {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(markdown, options);
    builder::build(parser)
}

#[cfg(test)]
mod tests;
