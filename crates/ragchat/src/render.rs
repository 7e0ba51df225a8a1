//! Terminal rendering of messages and markdown documents.

use std::borrow::Cow;
use std::fmt::Write as _;

use chrono::Local;
use owo_colors::{AnsiColors, OwoColorize, Style as AnsiStyle};
use ragchat_core::Notice;
use ragchat_core::transcript::{Message, Role};
use ragchat_markdown::{Alignment, Block, Document, Inline, Style, Tone};
use ragchat_proto::ContextItem;

use crate::shell::Theme;

/// The gutter drawn in front of every message line.
pub const BAR_CHAR: &str = "▎";

const RULE_WIDTH: usize = 40;
const SIMILARITY_BAR_WIDTH: usize = 10;

/// Replaces control characters other than newline and tab with visible
/// stand-ins, so text from the backend can't emit terminal escape
/// sequences.
///
/// C0 controls and DEL become their Unicode control pictures (`␛` for
/// ESC), C1 controls become `�`.
pub fn sanitize(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_unsafe_control) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| if is_unsafe_control(c) { control_picture(c) } else { c })
            .collect(),
    )
}

#[inline]
fn is_unsafe_control(c: char) -> bool {
    c.is_control() && c != '\n' && c != '\t'
}

fn control_picture(c: char) -> char {
    match c as u32 {
        code @ 0x00..=0x1f => {
            char::from_u32(0x2400 + code).unwrap_or(char::REPLACEMENT_CHARACTER)
        }
        0x7f => '\u{2421}',
        _ => char::REPLACEMENT_CHARACTER,
    }
}

struct Palette {
    heading: AnsiColors,
    muted: AnsiColors,
    accent: AnsiColors,
    code: AnsiColors,
    user: AnsiColors,
    assistant: AnsiColors,
}

impl Palette {
    fn of(theme: Theme) -> Self {
        match theme {
            Theme::Light => Palette {
                heading: AnsiColors::Blue,
                muted: AnsiColors::BrightBlack,
                accent: AnsiColors::Magenta,
                code: AnsiColors::Red,
                user: AnsiColors::Green,
                assistant: AnsiColors::Blue,
            },
            Theme::Dark => Palette {
                heading: AnsiColors::BrightCyan,
                muted: AnsiColors::BrightBlack,
                accent: AnsiColors::BrightMagenta,
                code: AnsiColors::BrightYellow,
                user: AnsiColors::BrightGreen,
                assistant: AnsiColors::BrightCyan,
            },
        }
    }

    fn tone(&self, tone: Tone) -> Option<AnsiColors> {
        match tone {
            Tone::Normal => None,
            Tone::Heading => Some(self.heading),
            Tone::Muted => Some(self.muted),
            Tone::Accent => Some(self.accent),
            Tone::Code => Some(self.code),
        }
    }

    fn ansi(&self, style: Style) -> AnsiStyle {
        let mut ansi = AnsiStyle::new();
        if style.bold {
            ansi = ansi.bold();
        }
        if style.italic {
            ansi = ansi.italic();
        }
        if style.underline {
            ansi = ansi.underline();
        }
        if style.strikethrough {
            ansi = ansi.strikethrough();
        }
        if let Some(color) = self.tone(style.tone) {
            ansi = ansi.color(color);
        }
        ansi
    }
}

/// Nested nodes keep the attributes of their parents; the innermost tone
/// wins.
fn merge(outer: Style, inner: Style) -> Style {
    Style {
        bold: outer.bold || inner.bold,
        italic: outer.italic || inner.italic,
        underline: outer.underline || inner.underline,
        strikethrough: outer.strikethrough || inner.strikethrough,
        tone: if inner.tone == Tone::Normal {
            outer.tone
        } else {
            inner.tone
        },
    }
}

struct Renderer {
    palette: Palette,
}

impl Renderer {
    fn paint(&self, out: &mut String, text: &str, style: Style) {
        let text = sanitize(text);
        if style == Style::PLAIN {
            out.push_str(&text);
        } else {
            write!(out, "{}", text.style(self.palette.ansi(style))).ok();
        }
    }

    fn blocks(&self, blocks: &[Block], outer: Style) -> String {
        blocks
            .iter()
            .map(|block| self.block(block, outer))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn block(&self, block: &Block, outer: Style) -> String {
        let style = merge(outer, block.style());
        let mut out = String::new();
        match block {
            Block::Heading { content, .. } | Block::Paragraph(content) => {
                self.inlines(&mut out, content, style);
            }
            Block::List { start, items } => {
                for (idx, item) in items.iter().enumerate() {
                    let marker = match start {
                        Some(start) => format!("{}. ", start + idx as u64),
                        None => "• ".to_owned(),
                    };
                    let indent = " ".repeat(marker.chars().count());
                    if idx > 0 {
                        out.push('\n');
                    }
                    self.paint(&mut out, &marker, merge(style, Style::LIST_MARKER));
                    let body = self.blocks(item, style);
                    for (line_idx, line) in body.lines().enumerate() {
                        if line_idx > 0 {
                            out.push('\n');
                            if !line.is_empty() {
                                out.push_str(&indent);
                            }
                        }
                        out.push_str(line);
                    }
                }
            }
            Block::CodeBlock { language, code } => {
                let gutter = Style {
                    tone: Tone::Muted,
                    ..outer
                };
                if let Some(language) = language {
                    self.paint(&mut out, &format!("  {language}"), gutter);
                    out.push('\n');
                }
                for (idx, line) in code.lines().enumerate() {
                    if idx > 0 {
                        out.push('\n');
                    }
                    self.paint(&mut out, "  │ ", gutter);
                    self.paint(&mut out, line, style);
                }
            }
            Block::BlockQuote(blocks) => {
                let body = self.blocks(blocks, style);
                for (idx, line) in body.lines().enumerate() {
                    if idx > 0 {
                        out.push('\n');
                    }
                    self.paint(&mut out, "│ ", style);
                    out.push_str(line);
                }
            }
            Block::Table {
                alignments,
                header,
                rows,
            } => self.table(&mut out, alignments, header, rows, style),
            Block::Rule => {
                self.paint(&mut out, &"─".repeat(RULE_WIDTH), style);
            }
        }
        out
    }

    fn table(
        &self,
        out: &mut String,
        alignments: &[Alignment],
        header: &[Vec<Inline>],
        rows: &[Vec<Vec<Inline>>],
        style: Style,
    ) {
        let columns = std::iter::once(header.len())
            .chain(rows.iter().map(Vec::len))
            .max()
            .unwrap_or(0);
        let mut widths = vec![0; columns];
        for row in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
            for (col, cell) in row.iter().enumerate() {
                let width = plain_width(cell);
                widths[col] = widths[col].max(width);
            }
        }

        let separator = Style {
            tone: Tone::Muted,
            ..Style::PLAIN
        };
        let line = |out: &mut String, row: &[Vec<Inline>], cell_style: Style| {
            for (col, width) in widths.iter().enumerate() {
                if col > 0 {
                    self.paint(out, " │ ", separator);
                }
                let cell = row.get(col).map(Vec::as_slice).unwrap_or_default();
                let pad = width - plain_width(cell);
                let (left, right) = match alignments.get(col) {
                    Some(Alignment::Right) => (pad, 0),
                    Some(Alignment::Center) => (pad / 2, pad - pad / 2),
                    _ => (0, pad),
                };
                out.push_str(&" ".repeat(left));
                self.inlines(out, cell, cell_style);
                out.push_str(&" ".repeat(right));
            }
        };

        line(out, header, merge(style, Style::TABLE_HEADER));
        out.push('\n');
        let total = widths.iter().sum::<usize>() + 3 * columns.saturating_sub(1);
        self.paint(out, &"─".repeat(total), separator);
        for row in rows {
            out.push('\n');
            line(out, row, style);
        }
    }

    fn inlines(&self, out: &mut String, inlines: &[Inline], outer: Style) {
        for inline in inlines {
            self.inline(out, inline, outer);
        }
    }

    fn inline(&self, out: &mut String, inline: &Inline, outer: Style) {
        let style = merge(outer, inline.style());
        match inline {
            Inline::Text(text) | Inline::Code(text) => self.paint(out, text, style),
            Inline::Strong(content)
            | Inline::Emphasis(content)
            | Inline::Strikethrough(content) => self.inlines(out, content, style),
            Inline::Link { target, content } => {
                self.inlines(out, content, style);
                let label: String = content.iter().map(Inline::plain_text).collect();
                if label != target.href {
                    let muted = Style {
                        tone: Tone::Muted,
                        ..Style::PLAIN
                    };
                    self.paint(out, &format!(" ({})", target.href), muted);
                }
            }
            Inline::SoftBreak => out.push(' '),
            Inline::LineBreak => out.push('\n'),
        }
    }
}

fn plain_width(cell: &[Inline]) -> usize {
    cell.iter()
        .map(|inline| inline.plain_text().chars().count())
        .sum()
}

/// Renders a markdown document as ANSI-styled text.
pub fn render_document(document: &Document, theme: Theme) -> String {
    let renderer = Renderer {
        palette: Palette::of(theme),
    };
    renderer.blocks(&document.blocks, Style::PLAIN)
}

/// Formats a similarity score as a percentage with one decimal.
#[inline]
pub fn format_similarity(similarity: f64) -> String {
    format!("{:.1}%", similarity * 100.0)
}

fn similarity_bar(similarity: f64) -> String {
    let filled = (similarity.clamp(0.0, 1.0) * SIMILARITY_BAR_WIDTH as f64).round()
        as usize;
    format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(SIMILARITY_BAR_WIDTH - filled)
    )
}

/// Renders the numbered source list of an answer.
pub fn render_sources(sources: &[ContextItem], theme: Theme) -> String {
    let palette = Palette::of(theme);
    let mut out = String::new();
    for (idx, source) in sources.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        writeln!(
            out,
            "{} {}",
            format!("{}.", idx + 1).color(palette.accent),
            sanitize(&source.instruction).bold()
        )
        .ok();
        writeln!(out, "   {}", sanitize(&source.output)).ok();
        write!(
            out,
            "   {} {}",
            similarity_bar(source.similarity).color(palette.accent),
            format_similarity(source.similarity)
        )
        .ok();

        let provenance: Vec<String> = [
            source.channel_username.as_ref().map(|name| format!("@{name}")),
            source.video_id.clone(),
            source.source.clone(),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !provenance.is_empty() {
            write!(
                out,
                "\n   {}",
                sanitize(&provenance.join(" · ")).color(palette.muted)
            )
            .ok();
        }
    }
    out
}

/// Renders one transcript entry.
///
/// `number` is what the user types to refer to the message in commands.
/// Assistant content is rendered as markdown, user content verbatim apart
/// from control characters.
pub fn render_message(
    number: usize,
    message: &Message,
    sources_expanded: bool,
    theme: Theme,
) -> String {
    let palette = Palette::of(theme);
    let (who, color) = match message.role {
        Role::User => ("🧑 You", palette.user),
        Role::Assistant => ("🤖 Assistant", palette.assistant),
    };
    let time = message.timestamp.with_timezone(&Local).format("%H:%M");

    let mut header = format!(
        "{} {} {}",
        format!("[{number}]").color(palette.muted),
        who.color(color).bold(),
        time.color(palette.muted)
    );
    if message.liked {
        header.push_str(" 👍");
    }
    if message.disliked {
        header.push_str(" 👎");
    }
    if message.copied {
        write!(header, " {}", "✓ copied".color(palette.accent)).ok();
    }
    if !message.sources.is_empty() {
        let count = message.sources.len();
        let noun = if count == 1 { "source" } else { "sources" };
        write!(header, " {}", format!("📚 {count} {noun}").color(palette.muted))
            .ok();
    }

    let body = match message.role {
        Role::User => sanitize(&message.content).into_owned(),
        Role::Assistant => {
            render_document(&ragchat_markdown::render(&message.content), theme)
        }
    };

    let bar = BAR_CHAR.color(color).to_string();
    let mut out = header;
    for line in body.lines() {
        write!(out, "\n{bar}{line}").ok();
    }
    if sources_expanded && !message.sources.is_empty() {
        write!(out, "\n{bar}").ok();
        for line in render_sources(&message.sources, theme).lines() {
            write!(out, "\n{bar}{line}").ok();
        }
    }
    out
}

/// Renders a notice as a single toast-like line.
pub fn render_notice(notice: Notice, theme: Theme) -> String {
    let palette = Palette::of(theme);
    let color = match notice {
        Notice::ConnectionError => AnsiColors::Red,
        Notice::Copied => palette.accent,
    };
    format!(
        "{} {}",
        notice.title().color(color).bold(),
        notice.description().color(palette.muted)
    )
}
