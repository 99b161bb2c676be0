use thiserror::Error;

use super::buffers::Buffers;

/// Buffer a run points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    Original,
    Added,
}

/// A `(buffer, offset, length)` reference into [`Buffers`].
///
/// Invariant: `offset + length` never exceeds the referenced buffer's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceRun {
    pub source: Source,
    pub offset: usize,
    pub length: usize,
}

impl PieceRun {
    pub fn original(offset: usize, length: usize) -> Self {
        Self {
            source: Source::Original,
            offset,
            length,
        }
    }

    #[must_use]
    pub fn end(self) -> usize {
        self.offset + self.length
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.length == 0
    }

    /// True when `next` continues this run in the same buffer without a gap.
    fn continued_by(self, next: PieceRun) -> bool {
        self.source == next.source && self.end() == next.offset
    }

    fn head(self, len: usize) -> Self {
        Self {
            length: len,
            ..self
        }
    }

    fn tail(self, from: usize) -> Self {
        Self {
            offset: self.offset + from,
            length: self.length - from,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SpanError {
    #[error("offset {offset} is out of range for a span of length {len}")]
    OutOfRange { offset: usize, len: usize },
}

/// Leaf text of the document tree: an ordered list of [`PieceRun`]s.
///
/// Mutations never leave zero-length runs behind. A span with no runs is a
/// legal transient state; callers usually detach such a node from the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextSpan {
    runs: Vec<PieceRun>,
}

impl TextSpan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_run(run: PieceRun) -> Self {
        let mut span = Self::new();
        if !run.is_empty() {
            span.runs.push(run);
        }
        span
    }

    pub fn runs(&self) -> &[PieceRun] {
        &self.runs
    }

    /// Logical length in UTF-16 code units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.iter().map(|r| r.length).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Inserts `run` so that it starts at `offset`.
    ///
    /// A run landing at the tail of a run it continues in the same buffer
    /// extends that run instead of adding a new one, which keeps typing in
    /// the added buffer at one run per uninterrupted burst.
    pub fn insert(&mut self, offset: usize, run: PieceRun) -> Result<(), SpanError> {
        let len = self.len();
        if offset > len {
            return Err(SpanError::OutOfRange { offset, len });
        }
        if run.is_empty() {
            return Ok(());
        }

        let mut acc = 0;
        for i in 0..self.runs.len() {
            let cur = self.runs[i];
            if offset == acc {
                self.runs.insert(i, run);
                return Ok(());
            }
            if offset < acc + cur.length {
                let local = offset - acc;
                self.runs
                    .splice(i..=i, [cur.head(local), run, cur.tail(local)]);
                return Ok(());
            }
            if offset == acc + cur.length {
                if cur.continued_by(run) {
                    self.runs[i].length += run.length;
                } else {
                    self.runs.insert(i + 1, run);
                }
                return Ok(());
            }
            acc += cur.length;
        }

        self.runs.push(run);
        Ok(())
    }

    /// Removes `length` units starting at `offset`.
    ///
    /// Runs entirely inside the range are dropped, boundary runs shrink (a
    /// head removal shifts the run's offset), and a run containing the whole
    /// range is split in two.
    pub fn remove(&mut self, offset: usize, length: usize) -> Result<(), SpanError> {
        let len = self.len();
        if offset + length > len {
            return Err(SpanError::OutOfRange {
                offset: offset + length,
                len,
            });
        }
        if length == 0 {
            return Ok(());
        }

        let (start, end) = (offset, offset + length);
        let mut kept = Vec::with_capacity(self.runs.len() + 1);
        let mut acc = 0;
        for run in self.runs.drain(..) {
            let (rs, re) = (acc, acc + run.length);
            acc = re;
            if re <= start || rs >= end {
                kept.push(run);
                continue;
            }
            if rs < start {
                kept.push(run.head(start - rs));
            }
            if re > end {
                kept.push(run.tail(end - rs));
            }
        }
        self.runs = kept;
        Ok(())
    }

    /// Partitions the span at `offset` into left and right halves.
    pub fn split(&self, offset: usize) -> Result<(TextSpan, TextSpan), SpanError> {
        let len = self.len();
        if offset > len {
            return Err(SpanError::OutOfRange { offset, len });
        }

        let mut left = TextSpan::new();
        let mut right = TextSpan::new();
        let mut acc = 0;
        for &run in &self.runs {
            let (rs, re) = (acc, acc + run.length);
            acc = re;
            if re <= offset {
                left.runs.push(run);
            } else if rs >= offset {
                right.runs.push(run);
            } else {
                left.runs.push(run.head(offset - rs));
                right.runs.push(run.tail(offset - rs));
            }
        }
        Ok((left, right))
    }

    /// Appends `other`'s runs, joining the seam when the runs are contiguous.
    pub fn append(&mut self, other: TextSpan) {
        for run in other.runs {
            match self.runs.last_mut() {
                Some(last) if last.continued_by(run) => last.length += run.length,
                _ => self.runs.push(run),
            }
        }
    }

    /// Collects the span's code units.
    pub fn units(&self, buffers: &Buffers) -> Vec<u16> {
        let mut out = Vec::with_capacity(self.len());
        for run in &self.runs {
            out.extend_from_slice(buffers.units(run));
        }
        out
    }

    /// Returns the code unit at `offset`, if any.
    pub fn unit_at(&self, buffers: &Buffers, offset: usize) -> Option<u16> {
        let mut acc = 0;
        for run in &self.runs {
            if offset < acc + run.length {
                return buffers.units(run).get(offset - acc).copied();
            }
            acc += run.length;
        }
        None
    }

    pub fn materialize(&self, buffers: &Buffers) -> String {
        String::from_utf16_lossy(&self.units(buffers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn span_over(buffers: &Buffers) -> TextSpan {
        TextSpan::from_run(PieceRun::original(0, buffers.original().len()))
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(3)]
    #[case(5)]
    fn test_insert_splices_text_at_every_offset(#[case] offset: usize) {
        // Given a span over "hello"
        let mut buffers = Buffers::new("hello");
        let mut span = span_over(&buffers);

        // When "XY" is inserted at the offset
        let run = buffers.append("XY");
        span.insert(offset, run).unwrap();

        // Then the text is spliced in
        let mut expected = String::from("hello");
        expected.insert_str(offset, "XY");
        assert_eq!(span.materialize(&buffers), expected);
        assert_eq!(span.len(), 7);
    }

    #[test]
    fn test_insert_mid_run_splits_into_three() {
        let mut buffers = Buffers::new("abcd");
        let mut span = span_over(&buffers);

        let run = buffers.append("-");
        span.insert(2, run).unwrap();

        assert_eq!(
            span.runs(),
            &[
                PieceRun::original(0, 2),
                PieceRun { source: Source::Added, offset: 0, length: 1 },
                PieceRun::original(2, 2),
            ]
        );
    }

    #[test]
    fn test_consecutive_typing_extends_one_run() {
        let mut buffers = Buffers::new("");
        let mut span = TextSpan::new();

        for (i, ch) in ["a", "b", "c"].into_iter().enumerate() {
            let run = buffers.append(ch);
            span.insert(i, run).unwrap();
        }

        assert_eq!(span.runs().len(), 1);
        assert_eq!(span.materialize(&buffers), "abc");
    }

    #[test]
    fn test_insert_at_run_boundary_creates_no_empty_run() {
        let mut buffers = Buffers::new("abcd");
        let mut span = TextSpan::from_run(PieceRun::original(0, 2));
        span.append(TextSpan::from_run(PieceRun::original(3, 1)));

        let run = buffers.append("X");
        span.insert(2, run).unwrap();

        assert_eq!(span.materialize(&buffers), "abXd");
        assert!(span.runs().iter().all(|r| r.length > 0));
    }

    #[test]
    fn test_insert_past_end_is_out_of_range() {
        let mut buffers = Buffers::new("ab");
        let mut span = span_over(&buffers);
        let run = buffers.append("x");

        assert_eq!(
            span.insert(3, run),
            Err(SpanError::OutOfRange { offset: 3, len: 2 })
        );
    }

    #[test]
    fn test_remove_first_char_shifts_offset() {
        let buffers = Buffers::new("hello");
        let mut span = span_over(&buffers);

        span.remove(0, 1).unwrap();

        assert_eq!(span.runs(), &[PieceRun::original(1, 4)]);
        assert_eq!(span.materialize(&buffers), "ello");
    }

    #[test]
    fn test_remove_inside_run_splits_it() {
        let buffers = Buffers::new("hello");
        let mut span = span_over(&buffers);

        span.remove(1, 3).unwrap();

        assert_eq!(span.runs(), &[PieceRun::original(0, 1), PieceRun::original(4, 1)]);
        assert_eq!(span.materialize(&buffers), "ho");
    }

    #[test]
    fn test_remove_across_runs() {
        let mut buffers = Buffers::new("abc");
        let mut span = span_over(&buffers);
        let run = buffers.append("XYZ");
        span.insert(3, run).unwrap();

        span.remove(2, 2).unwrap();

        assert_eq!(span.materialize(&buffers), "abYZ");
    }

    #[test]
    fn test_removing_whole_run_leaves_no_empty_runs() {
        let mut buffers = Buffers::new("ab");
        let mut span = span_over(&buffers);
        let run = buffers.append("XY");
        span.insert(1, run).unwrap();

        span.remove(1, 2).unwrap();

        assert_eq!(span.runs(), &[PieceRun::original(0, 1), PieceRun::original(1, 1)]);
        assert!(span.runs().iter().all(|r| !r.is_empty()));

        span.remove(0, 2).unwrap();
        assert!(span.is_empty());
    }

    #[test]
    fn test_remove_past_end_is_out_of_range() {
        let buffers = Buffers::new("ab");
        let mut span = span_over(&buffers);

        assert!(matches!(span.remove(1, 2), Err(SpanError::OutOfRange { .. })));
        assert_eq!(span.materialize(&buffers), "ab");
    }

    #[rstest]
    #[case(0)]
    #[case(2)]
    #[case(4)]
    #[case(6)]
    fn test_split_halves_recombine(#[case] at: usize) {
        let mut buffers = Buffers::new("abcd");
        let mut span = span_over(&buffers);
        let run = buffers.append("ef");
        span.insert(4, run).unwrap();

        let (left, right) = span.split(at).unwrap();

        assert_eq!(left.len() + right.len(), span.len());
        assert_eq!(
            left.materialize(&buffers) + &right.materialize(&buffers),
            span.materialize(&buffers)
        );
        assert!(left.runs().iter().chain(right.runs()).all(|r| r.length > 0));
    }

    #[test]
    fn test_append_joins_contiguous_seam() {
        let buffers = Buffers::new("abcd");
        let span = span_over(&buffers);
        let (mut left, right) = span.split(1).unwrap();

        left.append(right);

        assert_eq!(left.runs(), &[PieceRun::original(0, 4)]);
    }

    #[test]
    fn test_unit_at_walks_runs() {
        let mut buffers = Buffers::new("a😊");
        let mut span = span_over(&buffers);
        let run = buffers.append("b");
        span.insert(3, run).unwrap();

        assert_eq!(span.unit_at(&buffers, 0), Some(u16::from(b'a')));
        assert_eq!(span.unit_at(&buffers, 3), Some(u16::from(b'b')));
        assert_eq!(span.unit_at(&buffers, 4), None);
    }
}
