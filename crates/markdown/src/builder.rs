use std::mem;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Tag};

use crate::document::{Block, Document, Inline, Link};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Container {
    Root,
    BlockQuote,
    Item,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Span {
    Paragraph,
    Heading(u8),
    // Raw HTML block, kept as literal text.
    Literal,
    TableCell,
    Strong,
    Emphasis,
    Strikethrough,
    Link(Link),
    // Anything we don't model; its inlines are spliced into the parent.
    Passthrough,
}

// Partially built nodes. `Start` events push a frame, `End` events pop one
// and attach the finished node to the frame below it.
#[derive(Debug)]
enum Frame {
    Blocks {
        container: Container,
        blocks: Vec<Block>,
        // Inlines that arrived without a paragraph, e.g. in tight list items.
        loose: Vec<Inline>,
    },
    Inlines {
        span: Span,
        inlines: Vec<Inline>,
    },
    List {
        start: Option<u64>,
        items: Vec<Vec<Block>>,
    },
    Table {
        alignments: Vec<Alignment>,
        header: Vec<Vec<Inline>>,
        rows: Vec<Vec<Vec<Inline>>>,
    },
    TableRow {
        is_header: bool,
        cells: Vec<Vec<Inline>>,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
}

impl Frame {
    #[inline]
    fn blocks(container: Container) -> Self {
        Frame::Blocks {
            container,
            blocks: vec![],
            loose: vec![],
        }
    }

    #[inline]
    fn inlines(span: Span) -> Self {
        Frame::Inlines {
            span,
            inlines: vec![],
        }
    }
}

struct Builder {
    stack: Vec<Frame>,
}

pub fn build<'a>(events: impl Iterator<Item = Event<'a>>) -> Document {
    let mut builder = Builder {
        stack: vec![Frame::blocks(Container::Root)],
    };
    for event in events {
        builder.handle(event);
    }
    builder.finish()
}

impl Builder {
    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) => self.push_inline(Inline::Text(text.into_string())),
            Event::Code(code) => self.push_inline(Inline::Code(code.into_string())),
            // Raw HTML is shown as-is, never interpreted.
            Event::Html(html) | Event::InlineHtml(html) => {
                self.push_inline(Inline::Text(html.into_string()))
            }
            Event::SoftBreak => self.push_inline(Inline::SoftBreak),
            Event::HardBreak => self.push_inline(Inline::LineBreak),
            Event::Rule => self.push_block(Block::Rule),
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.push_inline(Inline::Text(marker.to_owned()));
            }
            Event::FootnoteReference(label) => {
                self.push_inline(Inline::Text(format!("[^{}]", &*label)));
            }
            other => trace!("ignored markdown event: {other:?}"),
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::inlines(Span::Paragraph),
            Tag::Heading { level, .. } => {
                Frame::inlines(Span::Heading(heading_level(level)))
            }
            Tag::BlockQuote(_) => Frame::blocks(Container::BlockQuote),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(ToOwned::to_owned),
                    CodeBlockKind::Indented => None,
                };
                Frame::CodeBlock {
                    language,
                    code: String::new(),
                }
            }
            Tag::HtmlBlock => Frame::inlines(Span::Literal),
            Tag::List(start) => Frame::List {
                start,
                items: vec![],
            },
            Tag::Item => Frame::blocks(Container::Item),
            Tag::Table(alignments) => Frame::Table {
                alignments,
                header: vec![],
                rows: vec![],
            },
            Tag::TableHead => Frame::TableRow {
                is_header: true,
                cells: vec![],
            },
            Tag::TableRow => Frame::TableRow {
                is_header: false,
                cells: vec![],
            },
            Tag::TableCell => Frame::inlines(Span::TableCell),
            Tag::Emphasis => Frame::inlines(Span::Emphasis),
            Tag::Strong => Frame::inlines(Span::Strong),
            Tag::Strikethrough => Frame::inlines(Span::Strikethrough),
            // Images degrade to a link labelled with the alt text.
            Tag::Link {
                dest_url, title, ..
            }
            | Tag::Image {
                dest_url, title, ..
            } => Frame::inlines(Span::Link(Link::new(
                dest_url.into_string(),
                title.into_string(),
            ))),
            other => {
                trace!("unsupported markdown tag: {other:?}");
                Frame::inlines(Span::Passthrough)
            }
        };
        self.stack.push(frame);
    }

    fn end(&mut self) {
        // The root frame is only popped by `finish`.
        if self.stack.len() <= 1 {
            return;
        }
        let Some(frame) = self.stack.pop() else {
            return;
        };

        match frame {
            Frame::Blocks {
                container,
                mut blocks,
                loose,
            } => {
                flush_loose(&mut blocks, loose);
                match container {
                    Container::BlockQuote => {
                        self.push_block(Block::BlockQuote(blocks))
                    }
                    Container::Item => {
                        if let Some(Frame::List { items, .. }) =
                            self.stack.last_mut()
                        {
                            items.push(blocks);
                        }
                    }
                    Container::Root => {}
                }
            }
            Frame::Inlines { span, inlines } => match span {
                Span::Paragraph | Span::Literal => {
                    self.push_block(Block::Paragraph(inlines))
                }
                Span::Heading(level) => self.push_block(Block::Heading {
                    level,
                    content: inlines,
                }),
                Span::TableCell => {
                    if let Some(Frame::TableRow { cells, .. }) =
                        self.stack.last_mut()
                    {
                        cells.push(inlines);
                    }
                }
                Span::Strong => self.push_inline(Inline::Strong(inlines)),
                Span::Emphasis => self.push_inline(Inline::Emphasis(inlines)),
                Span::Strikethrough => {
                    self.push_inline(Inline::Strikethrough(inlines))
                }
                Span::Link(target) => self.push_inline(Inline::Link {
                    target,
                    content: inlines,
                }),
                Span::Passthrough => {
                    for inline in inlines {
                        self.push_inline(inline);
                    }
                }
            },
            Frame::List { start, items } => {
                self.push_block(Block::List { start, items })
            }
            Frame::Table {
                alignments,
                header,
                rows,
            } => self.push_block(Block::Table {
                alignments,
                header,
                rows,
            }),
            Frame::TableRow { is_header, cells } => {
                if let Some(Frame::Table { header, rows, .. }) =
                    self.stack.last_mut()
                {
                    if is_header {
                        *header = cells;
                    } else {
                        rows.push(cells);
                    }
                }
            }
            Frame::CodeBlock { language, code } => {
                self.push_block(Block::CodeBlock { language, code })
            }
        }
    }

    fn push_inline(&mut self, inline: Inline) {
        match self.stack.last_mut() {
            Some(Frame::Inlines { inlines, .. }) => append_inline(inlines, inline),
            Some(Frame::Blocks { loose, .. }) => append_inline(loose, inline),
            Some(Frame::CodeBlock { code, .. }) => {
                code.push_str(&inline.plain_text())
            }
            _ => trace!("dropped stray inline: {inline:?}"),
        }
    }

    fn push_block(&mut self, block: Block) {
        match self.stack.last_mut() {
            Some(Frame::Blocks { blocks, loose, .. }) => {
                flush_loose(blocks, mem::take(loose));
                blocks.push(block);
            }
            Some(Frame::Inlines { inlines, .. }) => {
                append_inline(inlines, Inline::Text(block.plain_text()))
            }
            _ => trace!("dropped stray block: {block:?}"),
        }
    }

    fn finish(mut self) -> Document {
        // Close anything left open by malformed input.
        while self.stack.len() > 1 {
            self.end();
        }
        let blocks = match self.stack.pop() {
            Some(Frame::Blocks {
                mut blocks, loose, ..
            }) => {
                flush_loose(&mut blocks, loose);
                blocks
            }
            _ => vec![],
        };
        Document { blocks }
    }
}

// Adjacent text runs are merged, the parser splits them on entities and
// inline HTML.
fn append_inline(inlines: &mut Vec<Inline>, inline: Inline) {
    if let (Some(Inline::Text(last)), Inline::Text(text)) =
        (inlines.last_mut(), &inline)
    {
        last.push_str(text);
        return;
    }
    inlines.push(inline);
}

fn flush_loose(blocks: &mut Vec<Block>, loose: Vec<Inline>) {
    if !loose.is_empty() {
        blocks.push(Block::Paragraph(loose));
    }
}

#[inline]
fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
