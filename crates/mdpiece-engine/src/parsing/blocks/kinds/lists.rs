use crate::{
    parsing::{
        blocks::{BlockCtx, Parsed},
        grammar::LIST_INLINE,
        inline::parse_line,
        lines::LineView,
    },
    tree::{Node, Tree},
};

pub struct CheckboxMarker;

impl CheckboxMarker {
    pub const UNCHECKED: &'static str = "[ ]";
    pub const CHECKED: &'static str = "[x]";
    const LINE_UNCHECKED: &'static str = "- [ ] ";
    const LINE_CHECKED: &'static str = "- [x] ";

    /// Checked state of a checkbox line, `None` for any other line.
    pub fn checked(line: LineView<'_>) -> Option<bool> {
        if line.starts_with(Self::LINE_UNCHECKED) {
            Some(false)
        } else if line.starts_with(Self::LINE_CHECKED) {
            Some(true)
        } else {
            None
        }
    }

    pub fn parse(ctx: &BlockCtx<'_>, tree: &mut Tree, at: usize) -> Option<Parsed> {
        Self::checked(ctx.line(at)?)?;

        let list = tree.alloc(Node::CheckboxList);
        let mut i = at;
        while let Some(line) = ctx.line(i) {
            let Some(checked) = Self::checked(line) else {
                break;
            };
            let item = tree.alloc(Node::CheckboxItem { checked });
            parse_line(tree, item, line.mid(Self::LINE_UNCHECKED.len()), LIST_INLINE);
            tree.append_child(list, item);
            i += 1;
        }
        Some(Parsed {
            node: list,
            lines: i - at,
        })
    }
}

pub struct BulletMarker;

impl BulletMarker {
    pub const PREFIX: &'static str = "- ";

    /// Item content of a bullet line, leading spaces ignored.
    pub fn content(line: LineView<'_>) -> Option<LineView<'_>> {
        let line = line.trim_start();
        line.starts_with(Self::PREFIX)
            .then(|| line.mid(Self::PREFIX.len()))
    }

    /// Consecutive bullet lines. A checkbox line ends the list.
    pub fn parse(ctx: &BlockCtx<'_>, tree: &mut Tree, at: usize) -> Option<Parsed> {
        Self::content(ctx.line(at)?)?;

        let list = tree.alloc(Node::UnorderedList);
        let mut i = at;
        while let Some(line) = ctx.line(i) {
            if CheckboxMarker::checked(line).is_some() {
                break;
            }
            let Some(content) = Self::content(line) else {
                break;
            };
            let item = tree.alloc(Node::UnorderedItem);
            parse_line(tree, item, content, LIST_INLINE);
            tree.append_child(list, item);
            i += 1;
        }
        Some(Parsed {
            node: list,
            lines: i - at,
        })
    }
}

pub struct OrderedMarker;

impl OrderedMarker {
    /// Marker a new ordered list has to start with.
    pub const FIRST: &'static str = "1.";

    /// Item content of a `<digits>. ` line.
    pub fn content(line: LineView<'_>) -> Option<LineView<'_>> {
        let digits = line
            .units()
            .iter()
            .take_while(|&&u| (u16::from(b'0')..=u16::from(b'9')).contains(&u))
            .count();
        let marked = digits > 0
            && line.get(digits) == Some(u16::from(b'.'))
            && line.get(digits + 1) == Some(u16::from(b' '));
        marked.then(|| line.mid(digits + 2))
    }

    pub fn parse(ctx: &BlockCtx<'_>, tree: &mut Tree, at: usize) -> Option<Parsed> {
        let first = ctx.line(at)?;
        if !first.starts_with(Self::FIRST) {
            return None;
        }
        Self::content(first)?;

        let list = tree.alloc(Node::OrderedList);
        let mut i = at;
        while let Some(content) = ctx.line(i).and_then(Self::content) {
            let item = tree.alloc(Node::OrderedItem);
            parse_line(tree, item, content, LIST_INLINE);
            tree.append_child(list, item);
            i += 1;
        }
        Some(Parsed {
            node: list,
            lines: i - at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::lines::Line;
    use rstest::rstest;

    fn with_view<R>(s: &str, f: impl FnOnce(LineView<'_>) -> R) -> R {
        let units: Vec<u16> = s.encode_utf16().collect();
        f(LineView::new(&units, Line { offset: 0, len: units.len() }))
    }

    #[rstest]
    #[case("- [ ] a", Some(false))]
    #[case("- [x] a", Some(true))]
    #[case("- [ ]", None)]
    #[case("- a", None)]
    fn test_checkbox_state(#[case] input: &str, #[case] expected: Option<bool>) {
        assert_eq!(with_view(input, CheckboxMarker::checked), expected);
    }

    #[rstest]
    #[case("- a", Some(2))]
    #[case("   - a", Some(5))]
    #[case("-a", None)]
    fn test_bullet_content_offset(#[case] input: &str, #[case] offset: Option<usize>) {
        assert_eq!(
            with_view(input, |v| BulletMarker::content(v).map(|c| c.offset())),
            offset
        );
    }

    #[rstest]
    #[case("1. a", Some(3))]
    #[case("12. a", Some(4))]
    #[case("1.a", None)]
    #[case(". a", None)]
    fn test_ordered_content_offset(#[case] input: &str, #[case] offset: Option<usize>) {
        assert_eq!(
            with_view(input, |v| OrderedMarker::content(v).map(|c| c.offset())),
            offset
        );
    }
}
