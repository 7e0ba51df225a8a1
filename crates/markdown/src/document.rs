use pulldown_cmark::Alignment;

use crate::style::{Style, Tone};

/// A rendered markdown document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    /// Top-level blocks in source order.
    pub blocks: Vec<Block>,
}

impl Document {
    /// Returns the text content without any markup, blocks separated by
    /// blank lines.
    pub fn plain_text(&self) -> String {
        join_blocks(&self.blocks)
    }
}

/// A block-level node.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// A heading, `level` is 1 to 6.
    Heading {
        /// Heading level.
        level: u8,
        /// Heading text.
        content: Vec<Inline>,
    },
    /// A paragraph.
    Paragraph(Vec<Inline>),
    /// A bullet list (`start` is `None`) or an ordered list.
    List {
        /// Number of the first item for ordered lists.
        start: Option<u64>,
        /// Items, each a sequence of blocks.
        items: Vec<Vec<Block>>,
    },
    /// A fenced or indented code block.
    CodeBlock {
        /// The language tag of a fenced block, if any.
        language: Option<String>,
        /// The code, verbatim.
        code: String,
    },
    /// A block quote.
    BlockQuote(Vec<Block>),
    /// A table.
    Table {
        /// Column alignments.
        alignments: Vec<Alignment>,
        /// Header cells.
        header: Vec<Vec<Inline>>,
        /// Body rows.
        rows: Vec<Vec<Vec<Inline>>>,
    },
    /// A horizontal rule.
    Rule,
}

impl Block {
    /// Returns the fixed style of this block.
    pub fn style(&self) -> Style {
        match self {
            Block::Heading { level: 1 | 2, .. } => {
                Style::PLAIN.bold().underline().with_tone(Tone::Heading)
            }
            Block::Heading { .. } => Style::PLAIN.bold().with_tone(Tone::Heading),
            Block::Paragraph(_) | Block::List { .. } | Block::Table { .. } => {
                Style::PLAIN
            }
            Block::CodeBlock { .. } => Style::PLAIN.with_tone(Tone::Code),
            Block::BlockQuote(_) => Style::PLAIN.italic().with_tone(Tone::Muted),
            Block::Rule => Style::PLAIN.with_tone(Tone::Muted),
        }
    }

    /// Returns the text content without any markup.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Heading { content, .. } | Block::Paragraph(content) => {
                join_inlines(content)
            }
            Block::List { items, .. } => items
                .iter()
                .map(|item| join_blocks(item))
                .collect::<Vec<_>>()
                .join("\n"),
            Block::CodeBlock { code, .. } => code.clone(),
            Block::BlockQuote(blocks) => join_blocks(blocks),
            Block::Table { header, rows, .. } => std::iter::once(header)
                .chain(rows)
                .map(|row| {
                    row.iter()
                        .map(|cell| join_inlines(cell))
                        .collect::<Vec<_>>()
                        .join("\t")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Block::Rule => String::new(),
        }
    }
}

/// A link destination.
///
/// Links always open in a new browsing context and never leak the
/// referrer; the flags exist so front ends don't have to remember that.
/// Destinations with a scheme other than http, https or mailto are
/// replaced by an empty `href`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    /// Destination URL, as written.
    pub href: String,
    /// Link title, may be empty.
    pub title: String,
    /// Open in a new context (tab, window, external browser).
    pub new_context: bool,
    /// Don't send referrer or opener information.
    pub no_referrer: bool,
}

/// Schemes a link may use. Relative URLs and fragments are always kept.
const SAFE_SCHEMES: [&str; 3] = ["http", "https", "mailto"];

impl Link {
    /// Any other scheme (`javascript:`, `data:`, ...) leaves `href` empty.
    pub(crate) fn new(href: String, title: String) -> Self {
        Self {
            href: safe_href(href),
            title,
            new_context: true,
            no_referrer: true,
        }
    }
}

fn safe_href(href: String) -> String {
    let Some(colon) = href.find(':') else {
        return href;
    };
    // A colon after a path, query or fragment delimiter isn't a scheme.
    if href.find(['/', '?', '#']).is_some_and(|delim| delim < colon) {
        return href;
    }
    let scheme = &href[..colon];
    if SAFE_SCHEMES.iter().any(|safe| scheme.eq_ignore_ascii_case(safe)) {
        href
    } else {
        debug!("dropping link with unsafe scheme `{scheme}`");
        String::new()
    }
}

/// An inline node.
#[derive(Clone, Debug, PartialEq)]
pub enum Inline {
    /// Literal text. Raw HTML from the source also ends up here.
    Text(String),
    /// A code span.
    Code(String),
    /// Strong emphasis.
    Strong(Vec<Inline>),
    /// Emphasis.
    Emphasis(Vec<Inline>),
    /// Struck-through text.
    Strikethrough(Vec<Inline>),
    /// A hyperlink.
    Link {
        /// Where the link points to.
        target: Link,
        /// Link text.
        content: Vec<Inline>,
    },
    /// A soft line break, usually rendered as a space.
    SoftBreak,
    /// A hard line break.
    LineBreak,
}

impl Inline {
    /// Returns the fixed style of this inline.
    pub fn style(&self) -> Style {
        match self {
            Inline::Text(_) | Inline::SoftBreak | Inline::LineBreak => {
                Style::PLAIN
            }
            Inline::Code(_) => Style::PLAIN.with_tone(Tone::Code),
            Inline::Strong(_) => Style::PLAIN.bold(),
            Inline::Emphasis(_) => Style::PLAIN.italic(),
            Inline::Strikethrough(_) => {
                Style::PLAIN.strikethrough().with_tone(Tone::Muted)
            }
            Inline::Link { .. } => Style::PLAIN.underline().with_tone(Tone::Accent),
        }
    }

    /// Returns the text content without any markup.
    pub fn plain_text(&self) -> String {
        match self {
            Inline::Text(text) | Inline::Code(text) => text.clone(),
            Inline::Strong(content)
            | Inline::Emphasis(content)
            | Inline::Strikethrough(content)
            | Inline::Link { content, .. } => join_inlines(content),
            Inline::SoftBreak => " ".to_owned(),
            Inline::LineBreak => "\n".to_owned(),
        }
    }
}

fn join_inlines(inlines: &[Inline]) -> String {
    inlines.iter().map(Inline::plain_text).collect()
}

fn join_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::plain_text)
        .collect::<Vec<_>>()
        .join("\n\n")
}
