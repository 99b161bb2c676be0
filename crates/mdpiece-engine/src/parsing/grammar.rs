use super::{blocks::BlockRule, inline::InlineRule};

/// Immutable rule table driving the parser.
///
/// Block rules are tried in order at each line; the first match wins.
#[derive(Debug)]
pub struct Grammar {
    blocks: &'static [BlockRule],
    tables: bool,
}

static MARKDOWN: Grammar = Grammar {
    blocks: &[
        BlockRule::Header,
        BlockRule::CodeBlock,
        BlockRule::CheckboxList,
        BlockRule::UnorderedList,
        BlockRule::OrderedList,
        BlockRule::QuoteBlock,
        BlockRule::Table,
        BlockRule::LatexBlock,
        BlockRule::Paragraph,
    ],
    tables: false,
};

static READ_ONLY: Grammar = Grammar {
    blocks: &[
        BlockRule::Header,
        BlockRule::CodeBlock,
        BlockRule::CheckboxList,
        BlockRule::UnorderedList,
        BlockRule::OrderedList,
        BlockRule::QuoteBlock,
        BlockRule::Table,
        BlockRule::Hr,
        BlockRule::LatexBlock,
        BlockRule::Paragraph,
    ],
    tables: true,
};

/// Inline rules for paragraphs.
pub const PARAGRAPH_INLINE: &[InlineRule] = &[
    InlineRule::Image,
    InlineRule::Link,
    InlineRule::InlineCode,
    InlineRule::InlineLatex,
    InlineRule::SemanticText,
];

/// Inline rules for headers.
pub const HEADER_INLINE: &[InlineRule] = &[
    InlineRule::Link,
    InlineRule::InlineCode,
    InlineRule::InlineLatex,
];

/// Inline rules for list, checkbox and table items.
pub const LIST_INLINE: &[InlineRule] = &[
    InlineRule::Link,
    InlineRule::InlineLatex,
    InlineRule::InlineCode,
    InlineRule::SemanticText,
];

impl Grammar {
    /// The editing grammar. Its table rule never matches.
    pub fn markdown() -> &'static Grammar {
        &MARKDOWN
    }

    /// Grammar for read-only consumers: tables and horizontal rules enabled.
    pub fn read_only() -> &'static Grammar {
        &READ_ONLY
    }

    pub fn blocks(&self) -> &[BlockRule] {
        self.blocks
    }

    pub fn tables_enabled(&self) -> bool {
        self.tables
    }
}
