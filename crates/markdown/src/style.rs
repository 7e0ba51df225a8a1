/// The color role of a styled node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Tone {
    /// Regular foreground text.
    #[default]
    Normal,
    /// Headings.
    Heading,
    /// De-emphasized text such as quotes and rules.
    Muted,
    /// Interactive or highlighted text such as links and list markers.
    Accent,
    /// Code spans and blocks.
    Code,
}

/// Text attributes for a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Style {
    /// Bold weight.
    pub bold: bool,
    /// Italic slant.
    pub italic: bool,
    /// Underlined.
    pub underline: bool,
    /// Struck through.
    pub strikethrough: bool,
    /// Color role.
    pub tone: Tone,
}

impl Style {
    /// A style without any attributes.
    pub const PLAIN: Style = Style {
        bold: false,
        italic: false,
        underline: false,
        strikethrough: false,
        tone: Tone::Normal,
    };

    /// Style of list item markers (`•`, `1.`).
    pub const LIST_MARKER: Style = Style::PLAIN.with_tone(Tone::Accent);

    /// Style of table header cells.
    pub const TABLE_HEADER: Style = Style::PLAIN.bold();

    pub(crate) const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub(crate) const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub(crate) const fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    pub(crate) const fn strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    pub(crate) const fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }
}
