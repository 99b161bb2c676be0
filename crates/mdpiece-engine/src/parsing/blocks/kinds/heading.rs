use crate::{
    parsing::{
        blocks::{BlockCtx, Parsed},
        grammar::HEADER_INLINE,
        inline::parse_line,
        lines::LineView,
    },
    tree::{Node, Tree},
};

pub struct Heading;

impl Heading {
    pub const MARK: u8 = b'#';
    pub const MAX_LEVEL: usize = 6;

    /// Level of a line opening with 1 to 6 `#` and a space. Leading spaces
    /// are ignored.
    pub fn level(line: LineView<'_>) -> Option<usize> {
        let line = line.trim_start();
        let n = line.leading(Self::MARK);
        ((1..=Self::MAX_LEVEL).contains(&n) && line.get(n) == Some(u16::from(b' '))).then_some(n)
    }

    pub fn parse(ctx: &BlockCtx<'_>, tree: &mut Tree, at: usize) -> Option<Parsed> {
        let line = ctx.line(at)?;
        let level = Self::level(line)?;
        let header = tree.alloc(Node::Header {
            level: u8::try_from(level).ok()?,
        });
        parse_line(tree, header, line.trim_start().mid(level + 1), HEADER_INLINE);
        Some(Parsed {
            node: header,
            lines: 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::lines::Line;
    use rstest::rstest;

    #[rstest]
    #[case("# a", Some(1))]
    #[case("###### a", Some(6))]
    #[case("  ## a", Some(2))]
    #[case("# ", Some(1))]
    #[case("####### a", None)]
    #[case("#a", None)]
    #[case("#", None)]
    #[case("a # b", None)]
    fn test_heading_level(#[case] input: &str, #[case] expected: Option<usize>) {
        let units: Vec<u16> = input.encode_utf16().collect();
        let line = LineView::new(&units, Line { offset: 0, len: units.len() });
        assert_eq!(Heading::level(line), expected);
    }
}
