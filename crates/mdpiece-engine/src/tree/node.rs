use crate::storage::TextSpan;

/// Emphasis flavours produced by the `*`/`~` inline rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Italic,
    Bold,
    ItalicBold,
    Strikeout,
}

impl Emphasis {
    /// Delimiter written on both sides of the emphasised text.
    pub fn delimiter(self) -> &'static str {
        match self {
            Emphasis::Italic => "*",
            Emphasis::Bold => "**",
            Emphasis::ItalicBold => "***",
            Emphasis::Strikeout => "~~",
        }
    }
}

/// Closed set of node kinds.
///
/// Container kinds own an ordered child list in the [`super::Tree`]; the
/// variant itself only carries per-kind data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Document root.
    Container,
    Header { level: u8 },
    Paragraph,
    UnorderedList,
    UnorderedItem,
    OrderedList,
    OrderedItem,
    CheckboxList,
    CheckboxItem { checked: bool },
    /// Children are one [`Node::Text`] per code line.
    CodeBlock { name: TextSpan },
    /// Children are one [`Node::Text`] per quoted line.
    QuoteBlock,
    /// Text lines separated by [`Node::Lf`].
    LatexBlock,
    Table,
    TableRow { header: bool },
    TableCell,
    Hr,
    Text(TextSpan),
    Emphasis(Emphasis),
    /// Child is the link text.
    Link { href: TextSpan },
    Image { alt: TextSpan, src: TextSpan },
    InlineCode,
    InlineLatex,
    /// Line break inside a paragraph or latex block.
    Lf,
}

impl Node {
    /// Wrapper nodes hold exactly one text child and vanish with it.
    pub fn is_inline_wrapper(&self) -> bool {
        matches!(
            self,
            Node::Emphasis(_) | Node::Link { .. } | Node::InlineCode | Node::InlineLatex
        )
    }

    pub fn is_list(&self) -> bool {
        matches!(
            self,
            Node::UnorderedList | Node::OrderedList | Node::CheckboxList
        )
    }

    pub fn is_list_item(&self) -> bool {
        matches!(
            self,
            Node::UnorderedItem | Node::OrderedItem | Node::CheckboxItem { .. }
        )
    }

    /// Blocks that only the read path produces.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Node::Table | Node::Hr)
    }

    /// Short label used in tree outlines and log lines.
    pub fn label(&self) -> String {
        match self {
            Node::Container => "Container".into(),
            Node::Header { level } => format!("Header({level})"),
            Node::Paragraph => "Paragraph".into(),
            Node::UnorderedList => "UnorderedList".into(),
            Node::UnorderedItem => "UnorderedItem".into(),
            Node::OrderedList => "OrderedList".into(),
            Node::OrderedItem => "OrderedItem".into(),
            Node::CheckboxList => "CheckboxList".into(),
            Node::CheckboxItem { checked } => format!("CheckboxItem({checked})"),
            Node::CodeBlock { .. } => "CodeBlock".into(),
            Node::QuoteBlock => "QuoteBlock".into(),
            Node::LatexBlock => "LatexBlock".into(),
            Node::Table => "Table".into(),
            Node::TableRow { header: true } => "TableHeader".into(),
            Node::TableRow { header: false } => "TableRow".into(),
            Node::TableCell => "TableCell".into(),
            Node::Hr => "Hr".into(),
            Node::Text(_) => "Text".into(),
            Node::Emphasis(e) => format!("{e:?}"),
            Node::Link { .. } => "Link".into(),
            Node::Image { .. } => "Image".into(),
            Node::InlineCode => "InlineCode".into(),
            Node::InlineLatex => "InlineLatex".into(),
            Node::Lf => "Lf".into(),
        }
    }
}
