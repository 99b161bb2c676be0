use crate::storage::{PieceRun, TextSpan};

use super::lines::LineView;

/// Inline token kinds. Every markup character is its own one-unit token;
/// everything between them is a single [`TokenKind::Text`] token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    Sharp,
    Gt,
    Exclamation,
    Star,
    Tilde,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    Backquote,
    Dollar,
}

impl TokenKind {
    fn markup(unit: u16) -> Option<Self> {
        let ch = u8::try_from(unit).ok()?;
        Some(match ch {
            b'#' => TokenKind::Sharp,
            b'>' => TokenKind::Gt,
            b'!' => TokenKind::Exclamation,
            b'*' => TokenKind::Star,
            b'~' => TokenKind::Tilde,
            b'[' => TokenKind::LeftBracket,
            b']' => TokenKind::RightBracket,
            b'(' => TokenKind::LeftParen,
            b')' => TokenKind::RightParen,
            b'`' => TokenKind::Backquote,
            b'$' => TokenKind::Dollar,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Absolute offset in the original buffer.
    pub offset: usize,
    pub len: usize,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

pub fn tokenize(line: LineView<'_>) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut text_start = 0;
    for (i, &unit) in line.units().iter().enumerate() {
        if let Some(kind) = TokenKind::markup(unit) {
            if text_start < i {
                tokens.push(Token {
                    kind: TokenKind::Text,
                    offset: line.offset() + text_start,
                    len: i - text_start,
                });
            }
            tokens.push(Token {
                kind,
                offset: line.offset() + i,
                len: 1,
            });
            text_start = i + 1;
        }
    }
    if text_start < line.len() {
        tokens.push(Token {
            kind: TokenKind::Text,
            offset: line.offset() + text_start,
            len: line.len() - text_start,
        });
    }
    tokens
}

/// Coalesces tokens into text spans over the original buffer, one span per
/// run of adjacent offsets.
pub fn merge_to_spans(tokens: &[Token]) -> Vec<TextSpan> {
    let mut spans = Vec::new();
    let mut current: Option<PieceRun> = None;
    for token in tokens {
        current = match current {
            Some(run) if run.end() == token.offset => {
                Some(PieceRun::original(run.offset, run.length + token.len))
            }
            Some(run) => {
                spans.push(TextSpan::from_run(run));
                Some(PieceRun::original(token.offset, token.len))
            }
            None => Some(PieceRun::original(token.offset, token.len)),
        };
    }
    if let Some(run) = current {
        spans.push(TextSpan::from_run(run));
    }
    spans
}

/// Like [`merge_to_spans`] but always yields exactly one span.
pub fn merge_to_span(tokens: &[Token]) -> TextSpan {
    let mut merged = TextSpan::new();
    for span in merge_to_spans(tokens) {
        merged.append(span);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::lines::Line;

    fn tokens_of(s: &str) -> Vec<Token> {
        let units: Vec<u16> = s.encode_utf16().collect();
        tokenize(LineView::new(&units, Line { offset: 0, len: units.len() }))
    }

    #[test]
    fn test_markup_characters_are_single_tokens() {
        let kinds: Vec<_> = tokens_of("a **b** [c](d)").iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Text,
                TokenKind::Star,
                TokenKind::Star,
                TokenKind::Text,
                TokenKind::Star,
                TokenKind::Star,
                TokenKind::Text,
                TokenKind::LeftBracket,
                TokenKind::Text,
                TokenKind::RightBracket,
                TokenKind::LeftParen,
                TokenKind::Text,
                TokenKind::RightParen,
            ]
        );
    }

    #[test]
    fn test_text_tokens_cover_gaps() {
        let tokens = tokens_of("ab$cd");
        assert_eq!(tokens[0], Token { kind: TokenKind::Text, offset: 0, len: 2 });
        assert_eq!(tokens[1], Token { kind: TokenKind::Dollar, offset: 2, len: 1 });
        assert_eq!(tokens[2], Token { kind: TokenKind::Text, offset: 3, len: 2 });
    }

    #[test]
    fn test_non_ascii_is_text() {
        let tokens = tokens_of("😊#");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], Token { kind: TokenKind::Text, offset: 0, len: 2 });
        assert!(tokens[1].is(TokenKind::Sharp));
    }

    #[test]
    fn test_merge_coalesces_adjacent_tokens() {
        let tokens = tokens_of("a*b(c");
        let spans = merge_to_spans(&tokens);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].runs(), &[PieceRun::original(0, 5)]);
    }

    #[test]
    fn test_merge_splits_on_gaps() {
        let tokens = tokens_of("ab*cd");
        let spans = merge_to_spans(&[tokens[0], tokens[2]]);
        assert_eq!(spans.len(), 2);
        assert!(merge_to_spans(&[]).is_empty());
        assert!(merge_to_span(&[]).is_empty());
    }
}
