use super::span::{PieceRun, Source};

/// The original and added buffers backing every [`super::TextSpan`].
///
/// Both are stored as UTF-16 code units. Neither buffer is ever modified in
/// place, so a run handed out once stays valid for the document's lifetime.
#[derive(Debug, Clone, Default)]
pub struct Buffers {
    original: Vec<u16>,
    added: Vec<u16>,
}

impl Buffers {
    /// Creates buffers whose original content is `text`.
    pub fn new(text: &str) -> Self {
        Self {
            original: text.encode_utf16().collect(),
            added: Vec::new(),
        }
    }

    /// The loaded document text.
    pub fn original(&self) -> &[u16] {
        &self.original
    }

    /// Everything appended since loading.
    pub fn added(&self) -> &[u16] {
        &self.added
    }

    /// Appends `text` to the added buffer and returns the run covering it.
    pub fn append(&mut self, text: &str) -> PieceRun {
        let offset = self.added.len();
        self.added.extend(text.encode_utf16());
        PieceRun {
            source: Source::Added,
            offset,
            length: self.added.len() - offset,
        }
    }

    /// Returns the code units a run refers to.
    ///
    /// A run that overruns its buffer yields an empty slice; runs are only
    /// produced by this type and the parser, so that never happens in practice.
    pub fn units(&self, run: &PieceRun) -> &[u16] {
        let buffer = match run.source {
            Source::Original => &self.original,
            Source::Added => &self.added,
        };
        debug_assert!(run.offset + run.length <= buffer.len(), "run {run:?} overruns buffer");
        buffer.get(run.offset..run.offset + run.length).unwrap_or(&[])
    }

    pub fn to_string(&self, run: &PieceRun) -> String {
        String::from_utf16_lossy(self.units(run))
    }
}

pub fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

pub fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}
