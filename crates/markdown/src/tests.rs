use crate::*;

fn text(s: &str) -> Inline {
    Inline::Text(s.to_owned())
}

#[test]
fn test_headings_and_paragraphs() {
    let doc = render("# Title\n\nSome *soft* text.\n\n### Minor");
    assert_eq!(
        doc.blocks,
        vec![
            Block::Heading {
                level: 1,
                content: vec![text("Title")],
            },
            Block::Paragraph(vec![
                text("Some "),
                Inline::Emphasis(vec![text("soft")]),
                text(" text."),
            ]),
            Block::Heading {
                level: 3,
                content: vec![text("Minor")],
            },
        ]
    );
    assert!(doc.blocks[0].style().underline);
    assert!(!doc.blocks[2].style().underline);
    assert_eq!(doc.blocks[2].style().tone, Tone::Heading);
}

#[test]
fn test_code_span_vs_code_block() {
    let doc = render("Use `cargo` here.\n\n```rust extra\nfn main() {}\n```\n");
    let Block::Paragraph(inlines) = &doc.blocks[0] else {
        panic!("expected a paragraph");
    };
    assert_eq!(inlines[1], Inline::Code("cargo".to_owned()));
    assert_eq!(inlines[1].style().tone, Tone::Code);
    assert_eq!(
        doc.blocks[1],
        Block::CodeBlock {
            language: Some("rust".to_owned()),
            code: "fn main() {}\n".to_owned(),
        }
    );
}

#[test]
fn test_lists() {
    let doc = render("- one\n- **two**\n\n3. three\n4. four\n");
    assert_eq!(
        doc.blocks[0],
        Block::List {
            start: None,
            items: vec![
                vec![Block::Paragraph(vec![text("one")])],
                vec![Block::Paragraph(vec![Inline::Strong(vec![text("two")])])],
            ],
        }
    );
    let Block::List { start, items } = &doc.blocks[1] else {
        panic!("expected a list");
    };
    assert_eq!(*start, Some(3));
    assert_eq!(items.len(), 2);
}

#[test]
fn test_nested_blocks_in_quote() {
    let doc = render("> quoted\n>\n> - item\n");
    let Block::BlockQuote(blocks) = &doc.blocks[0] else {
        panic!("expected a block quote");
    };
    assert_eq!(blocks[0], Block::Paragraph(vec![text("quoted")]));
    assert!(matches!(blocks[1], Block::List { .. }));
    assert!(doc.blocks[0].style().italic);
}

#[test]
fn test_links_open_in_new_context() {
    let doc = render("See [docs](https://example.com \"Docs\").");
    let Block::Paragraph(inlines) = &doc.blocks[0] else {
        panic!("expected a paragraph");
    };
    let Inline::Link { target, content } = &inlines[1] else {
        panic!("expected a link");
    };
    assert_eq!(target.href, "https://example.com");
    assert_eq!(target.title, "Docs");
    assert!(target.new_context);
    assert!(target.no_referrer);
    assert_eq!(content, &vec![text("docs")]);
}

fn first_link(markdown: &str) -> Link {
    let doc = render(markdown);
    let Block::Paragraph(inlines) = &doc.blocks[0] else {
        panic!("expected a paragraph");
    };
    inlines
        .iter()
        .find_map(|inline| match inline {
            Inline::Link { target, .. } => Some(target.clone()),
            _ => None,
        })
        .expect("expected a link")
}

#[test]
fn test_unsafe_link_schemes_are_dropped() {
    assert_eq!(first_link("[x](javascript:alert(1))").href, "");
    assert_eq!(first_link("[x](JavaScript:alert(1))").href, "");
    assert_eq!(first_link("[x](vbscript:msgbox)").href, "");
    assert_eq!(first_link("[x](data:text/html,hi)").href, "");
    assert_eq!(first_link("![x](javascript:alert(1))").href, "");

    let link = first_link("[x](javascript:alert(1))");
    assert!(link.new_context && link.no_referrer);
}

#[test]
fn test_safe_link_schemes_are_kept() {
    assert_eq!(first_link("[x](HTTPS://example.com)").href, "HTTPS://example.com");
    assert_eq!(first_link("[x](mailto:a@example.com)").href, "mailto:a@example.com");
    assert_eq!(first_link("[x](/docs/a:b)").href, "/docs/a:b");
    assert_eq!(first_link("[x](#top)").href, "#top");
    assert_eq!(first_link("[x](page?at=1:2)").href, "page?at=1:2");
    assert_eq!(first_link("[x](notes.md)").href, "notes.md");
}

#[test]
fn test_table() {
    let doc = render("| a | b |\n|:--|--:|\n| 1 | 2 |\n| 3 | 4 |\n");
    let Block::Table {
        alignments,
        header,
        rows,
    } = &doc.blocks[0]
    else {
        panic!("expected a table");
    };
    assert_eq!(alignments, &vec![Alignment::Left, Alignment::Right]);
    assert_eq!(header, &vec![vec![text("a")], vec![text("b")]]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1][0], vec![text("3")]);
}

#[test]
fn test_rule_and_strikethrough() {
    let doc = render("~~old~~ new\n\n---\n");
    let Block::Paragraph(inlines) = &doc.blocks[0] else {
        panic!("expected a paragraph");
    };
    assert_eq!(inlines[0], Inline::Strikethrough(vec![text("old")]));
    assert!(inlines[0].style().strikethrough);
    assert_eq!(doc.blocks[1], Block::Rule);
}

#[test]
fn test_html_block_is_literal_text() {
    let doc = render("<script>alert('x')</script>\n\nafter");
    let Block::Paragraph(inlines) = &doc.blocks[0] else {
        panic!("expected the HTML block as a paragraph");
    };
    let [Inline::Text(raw)] = inlines.as_slice() else {
        panic!("expected a single text run");
    };
    assert!(raw.contains("<script>alert('x')</script>"));
    assert_eq!(doc.blocks[1], Block::Paragraph(vec![text("after")]));
}

#[test]
fn test_inline_html_is_literal_text() {
    let doc = render("Hello <b onclick=\"x()\">bold</b> world");
    assert_eq!(
        doc.blocks[0],
        Block::Paragraph(vec![text("Hello <b onclick=\"x()\">bold</b> world")])
    );
}

#[test]
fn test_task_list() {
    let doc = render("- [x] done\n- [ ] todo\n");
    assert_eq!(doc.plain_text(), "[x] done\n[ ] todo");
}

#[test]
fn test_empty_input() {
    assert_eq!(render(""), Document::default());
}
