use crate::storage::{PieceRun, TextSpan};

/// A source line as an `(offset, len)` view, terminator excluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub offset: usize,
    pub len: usize,
}

/// Splits `units` at `\r\n`, `\r` and `\n`.
///
/// A final line without terminator is kept only when it is non-empty, so
/// `"a\n"` yields one line and `"a\n\nb"` yields three.
pub fn split_lines(units: &[u16]) -> Vec<Line> {
    const CR: u16 = b'\r' as u16;
    const LF: u16 = b'\n' as u16;

    let mut lines = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i < units.len() {
        match units[i] {
            CR => {
                lines.push(Line {
                    offset: start,
                    len: i - start,
                });
                i += if units.get(i + 1) == Some(&LF) { 2 } else { 1 };
                start = i;
            }
            LF => {
                lines.push(Line {
                    offset: start,
                    len: i - start,
                });
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    if start < units.len() {
        lines.push(Line {
            offset: start,
            len: units.len() - start,
        });
    }
    lines
}

/// Borrowed view over part of a line that keeps absolute offsets.
#[derive(Debug, Clone, Copy)]
pub struct LineView<'a> {
    units: &'a [u16],
    offset: usize,
}

impl<'a> LineView<'a> {
    pub fn new(source: &'a [u16], line: Line) -> Self {
        Self {
            units: source.get(line.offset..line.offset + line.len).unwrap_or(&[]),
            offset: line.offset,
        }
    }

    /// Absolute offset of the view's first unit.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn units(&self) -> &'a [u16] {
        self.units
    }

    pub fn get(&self, i: usize) -> Option<u16> {
        self.units.get(i).copied()
    }

    /// ASCII prefix test.
    pub fn starts_with(&self, pat: &str) -> bool {
        pat.len() <= self.units.len()
            && pat
                .bytes()
                .zip(self.units)
                .all(|(b, &u)| u16::from(b) == u)
    }

    /// Number of leading `ch` units.
    pub fn leading(&self, ch: u8) -> usize {
        self.units
            .iter()
            .take_while(|&&u| u == u16::from(ch))
            .count()
    }

    /// Drops leading spaces.
    pub fn trim_start(self) -> Self {
        self.mid(self.leading(b' '))
    }

    /// Drops leading and trailing spaces.
    pub fn trim(self) -> Self {
        let view = self.trim_start();
        let trailing = view
            .units
            .iter()
            .rev()
            .take_while(|&&u| u == u16::from(b' '))
            .count();
        view.take(view.len() - trailing)
    }

    /// The view from `from` on, clamped to the end.
    pub fn mid(self, from: usize) -> Self {
        let from = from.min(self.units.len());
        Self {
            units: &self.units[from..],
            offset: self.offset + from,
        }
    }

    /// Text span over the view in the original buffer.
    pub fn span(&self) -> TextSpan {
        TextSpan::from_run(PieceRun::original(self.offset, self.units.len()))
    }

    /// The first `len` units, clamped to the end.
    pub fn take(self, len: usize) -> Self {
        let len = len.min(self.units.len());
        Self {
            units: &self.units[..len],
            offset: self.offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn utf16(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    fn line_strings(s: &str) -> Vec<String> {
        let units = utf16(s);
        split_lines(&units)
            .into_iter()
            .map(|l| String::from_utf16_lossy(LineView::new(&units, l).units()))
            .collect()
    }

    #[test]
    fn test_split_recognises_all_terminators() {
        assert_eq!(line_strings("a\r\nb\rc\nd"), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_split_keeps_blank_lines_and_drops_empty_tail() {
        assert_eq!(line_strings("a\n\nb\n"), vec!["a", "", "b"]);
        assert!(line_strings("").is_empty());
    }

    #[test]
    fn test_split_offsets_skip_terminators() {
        let units = utf16("ab\r\ncd");
        assert_eq!(
            split_lines(&units),
            vec![Line { offset: 0, len: 2 }, Line { offset: 4, len: 2 }]
        );
    }

    #[test]
    fn test_view_prefix_helpers() {
        let units = utf16("  ## title  ");
        let view = LineView::new(&units, Line { offset: 0, len: units.len() });

        let trimmed = view.trim_start();
        assert_eq!(trimmed.offset(), 2);
        assert_eq!(trimmed.leading(b'#'), 2);
        assert!(trimmed.starts_with("## "));
        assert!(!trimmed.starts_with("###"));
        assert_eq!(view.trim().len(), 8);
        assert_eq!(view.mid(100).len(), 0);
    }
}
