use crate::{
    parsing::tokens::{Token, TokenKind, merge_to_span},
    storage::TextSpan,
    tree::{Emphasis, Node, NodeId, Tree},
};

/// Inline rules, matched over a token slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineRule {
    /// `![alt](src)`, alt optional, src required.
    Image,
    /// `[text](href)`, text required, href optional.
    Link,
    /// `` `code` ``
    InlineCode,
    /// `$text$` where `text` is a single text token.
    InlineLatex,
    /// `***x***`, `**x**`, `*x*`, `~~x~~`, longest first.
    SemanticText,
}

/// A successful inline match, not yet placed in a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InlineMatch {
    Image { alt: TextSpan, src: TextSpan },
    Link { content: TextSpan, href: TextSpan },
    Code(TextSpan),
    Latex(TextSpan),
    Emphasis(Emphasis, TextSpan),
}

impl InlineRule {
    /// Tries the rule at `tokens[at]`, returning the match and the number of
    /// tokens it consumed.
    pub fn try_match(self, tokens: &[Token], at: usize) -> Option<(InlineMatch, usize)> {
        match self {
            InlineRule::Image => match_image(tokens, at),
            InlineRule::Link => match_link(tokens, at),
            InlineRule::InlineCode => match_inline_code(tokens, at),
            InlineRule::InlineLatex => match_inline_latex(tokens, at),
            InlineRule::SemanticText => match_semantic(tokens, at),
        }
    }
}

impl InlineMatch {
    pub fn build(self, tree: &mut Tree) -> NodeId {
        match self {
            InlineMatch::Image { alt, src } => tree.alloc(Node::Image { alt, src }),
            InlineMatch::Link { content, href } => {
                let text = tree.alloc_text(content);
                tree.alloc_with(Node::Link { href }, [text])
            }
            InlineMatch::Code(code) => {
                let text = tree.alloc_text(code);
                tree.alloc_with(Node::InlineCode, [text])
            }
            InlineMatch::Latex(code) => {
                let text = tree.alloc_text(code);
                tree.alloc_with(Node::InlineLatex, [text])
            }
            InlineMatch::Emphasis(kind, inner) => {
                let text = tree.alloc_text(inner);
                tree.alloc_with(Node::Emphasis(kind), [text])
            }
        }
    }
}

fn is(tokens: &[Token], i: usize, kind: TokenKind) -> bool {
    tokens.get(i).is_some_and(|t| t.is(kind))
}

fn find(tokens: &[Token], from: usize, kind: TokenKind) -> Option<usize> {
    tokens
        .get(from..)?
        .iter()
        .position(|t| t.is(kind))
        .map(|p| from + p)
}

fn match_image(tokens: &[Token], at: usize) -> Option<(InlineMatch, usize)> {
    if !is(tokens, at, TokenKind::Exclamation) || !is(tokens, at + 1, TokenKind::LeftBracket) {
        return None;
    }
    let close = find(tokens, at + 2, TokenKind::RightBracket)?;
    if !is(tokens, close + 1, TokenKind::LeftParen) {
        return None;
    }
    let end = find(tokens, close + 2, TokenKind::RightParen)?;
    if end == close + 2 {
        return None;
    }
    let matched = InlineMatch::Image {
        alt: merge_to_span(&tokens[at + 2..close]),
        src: merge_to_span(&tokens[close + 2..end]),
    };
    Some((matched, end + 1 - at))
}

fn match_link(tokens: &[Token], at: usize) -> Option<(InlineMatch, usize)> {
    if !is(tokens, at, TokenKind::LeftBracket) {
        return None;
    }
    let close = find(tokens, at + 1, TokenKind::RightBracket)?;
    if close == at + 1 || !is(tokens, close + 1, TokenKind::LeftParen) {
        return None;
    }
    let end = find(tokens, close + 2, TokenKind::RightParen)?;
    let matched = InlineMatch::Link {
        content: merge_to_span(&tokens[at + 1..close]),
        href: merge_to_span(&tokens[close + 2..end]),
    };
    Some((matched, end + 1 - at))
}

fn match_inline_code(tokens: &[Token], at: usize) -> Option<(InlineMatch, usize)> {
    if !is(tokens, at, TokenKind::Backquote) {
        return None;
    }
    let close = find(tokens, at + 1, TokenKind::Backquote)?;
    if close == at + 1 {
        return None;
    }
    let code = merge_to_span(&tokens[at + 1..close]);
    Some((InlineMatch::Code(code), close + 1 - at))
}

fn match_inline_latex(tokens: &[Token], at: usize) -> Option<(InlineMatch, usize)> {
    if !is(tokens, at, TokenKind::Dollar)
        || !is(tokens, at + 1, TokenKind::Text)
        || !is(tokens, at + 2, TokenKind::Dollar)
    {
        return None;
    }
    let code = merge_to_span(&tokens[at + 1..at + 2]);
    Some((InlineMatch::Latex(code), 3))
}

/// `delim` repeated `n` times, one text token, `delim` repeated `n` times.
fn delimited(tokens: &[Token], at: usize, delim: TokenKind, n: usize) -> bool {
    (0..n).all(|k| is(tokens, at + k, delim))
        && is(tokens, at + n, TokenKind::Text)
        && (0..n).all(|k| is(tokens, at + n + 1 + k, delim))
}

fn match_semantic(tokens: &[Token], at: usize) -> Option<(InlineMatch, usize)> {
    const PATTERNS: [(Emphasis, TokenKind, usize); 4] = [
        (Emphasis::ItalicBold, TokenKind::Star, 3),
        (Emphasis::Bold, TokenKind::Star, 2),
        (Emphasis::Italic, TokenKind::Star, 1),
        (Emphasis::Strikeout, TokenKind::Tilde, 2),
    ];
    PATTERNS.iter().find_map(|&(kind, delim, n)| {
        delimited(tokens, at, delim, n).then(|| {
            let inner = merge_to_span(&tokens[at + n..at + n + 1]);
            (InlineMatch::Emphasis(kind, inner), 2 * n + 1)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        parsing::{
            lines::{Line, LineView},
            tokens::tokenize,
        },
        storage::{Buffers, PieceRun},
    };
    use rstest::rstest;

    fn tokens_of(s: &str) -> (Buffers, Vec<Token>) {
        let buffers = Buffers::new(s);
        let tokens = tokenize(LineView::new(
            buffers.original(),
            Line { offset: 0, len: buffers.original().len() },
        ));
        (buffers, tokens)
    }

    #[test]
    fn test_image_requires_src() {
        let (_, tokens) = tokens_of("![alt]()");
        assert!(InlineRule::Image.try_match(&tokens, 0).is_none());

        let (buffers, tokens) = tokens_of("![](pic.png)");
        let (matched, consumed) = InlineRule::Image.try_match(&tokens, 0).unwrap();
        assert_eq!(consumed, tokens.len());
        match matched {
            InlineMatch::Image { alt, src } => {
                assert!(alt.is_empty());
                assert_eq!(src.materialize(&buffers), "pic.png");
            }
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn test_link_href_is_optional() {
        let (buffers, tokens) = tokens_of("[site]()");
        let (matched, consumed) = InlineRule::Link.try_match(&tokens, 0).unwrap();
        assert_eq!(consumed, 5);
        match matched {
            InlineMatch::Link { content, href } => {
                assert_eq!(content.materialize(&buffers), "site");
                assert!(href.is_empty());
            }
            other => panic!("expected link, got {other:?}"),
        }
    }

    #[test]
    fn test_link_requires_text() {
        let (_, tokens) = tokens_of("[](x)");
        assert!(InlineRule::Link.try_match(&tokens, 0).is_none());
    }

    #[test]
    fn test_inline_code_spans_markup_tokens() {
        let (buffers, tokens) = tokens_of("`a*b`");
        let (matched, consumed) = InlineRule::InlineCode.try_match(&tokens, 0).unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(
            matched,
            InlineMatch::Code(TextSpan::from_run(PieceRun::original(1, 3)))
        );
        assert_eq!(buffers.original().len(), 5);
    }

    #[rstest]
    #[case("$x$", true)]
    #[case("$a*b$", false)]
    #[case("$$", false)]
    fn test_inline_latex_is_exactly_three_tokens(#[case] input: &str, #[case] matches: bool) {
        let (_, tokens) = tokens_of(input);
        assert_eq!(InlineRule::InlineLatex.try_match(&tokens, 0).is_some(), matches);
    }

    #[rstest]
    #[case("***x***", Emphasis::ItalicBold, 7)]
    #[case("**x**", Emphasis::Bold, 5)]
    #[case("*x*", Emphasis::Italic, 3)]
    #[case("~~x~~", Emphasis::Strikeout, 5)]
    fn test_semantic_prefers_longest_pattern(
        #[case] input: &str,
        #[case] kind: Emphasis,
        #[case] consumed: usize,
    ) {
        let (buffers, tokens) = tokens_of(input);
        let (matched, n) = InlineRule::SemanticText.try_match(&tokens, 0).unwrap();
        assert_eq!(n, consumed);
        match matched {
            InlineMatch::Emphasis(k, inner) => {
                assert_eq!(k, kind);
                assert_eq!(inner.materialize(&buffers), "x");
            }
            other => panic!("expected emphasis, got {other:?}"),
        }
    }

    #[test]
    fn test_unbalanced_emphasis_does_not_match() {
        let (_, tokens) = tokens_of("**x*");
        assert!(InlineRule::SemanticText.try_match(&tokens, 0).is_none());
    }
}
