use super::{reject_nul, Lexer, Token, TokenKind};
use crate::error::{Result, RunlogError};

/// Line-oriented tokenizer for block-style YAML as produced by `serde_yaml`.
///
/// Recognizes mapping keys, sequence dashes, plain/quoted scalars, comments
/// and literal/folded block scalars. Flow collections are kept as one scalar.
#[derive(Debug, Default, Clone, Copy)]
pub struct YamlLexer;

impl Lexer for YamlLexer {
    fn name(&self) -> &'static str {
        "yaml"
    }

    fn tokenize<'a>(&self, text: &'a str) -> Result<Vec<Token<'a>>> {
        reject_nul(self.name(), text)?;

        let mut tokens = Vec::new();
        // Indentation of the line that opened the current block scalar.
        let mut block_owner: Option<usize> = None;

        for (number, raw) in text.split_inclusive('\n').enumerate() {
            let line = raw.strip_suffix('\n').unwrap_or(raw);
            let line = line.strip_suffix('\r').unwrap_or(line);
            let ending = &raw[line.len()..];

            let indent = line.len() - line.trim_start_matches(' ').len();

            if let Some(owner) = block_owner {
                if line.trim().is_empty() || indent > owner {
                    push(&mut tokens, TokenKind::Literal, line);
                    push(&mut tokens, TokenKind::Whitespace, ending);
                    continue;
                }
                block_owner = None;
            }

            if line[indent..].starts_with('\t') {
                return Err(RunlogError::lex(
                    "yaml",
                    format!("tab character in indentation on line {}", number + 1),
                ));
            }

            if tokenize_line(&mut tokens, line, indent) {
                block_owner = Some(indent);
            }
            push(&mut tokens, TokenKind::Whitespace, ending);
        }

        Ok(tokens)
    }
}

fn push<'a>(tokens: &mut Vec<Token<'a>>, kind: TokenKind, text: &'a str) {
    if !text.is_empty() {
        tokens.push(Token::new(kind, text));
    }
}

/// Tokenizes one line without its line ending. Returns `true` when the line
/// opens a block scalar.
fn tokenize_line<'a>(tokens: &mut Vec<Token<'a>>, line: &'a str, indent: usize) -> bool {
    push(tokens, TokenKind::Whitespace, &line[..indent]);
    let mut rest = &line[indent..];

    if rest == "---" || rest == "..." {
        push(tokens, TokenKind::Delimiter, rest);
        return false;
    }

    while rest == "-" || rest.starts_with("- ") {
        push(tokens, TokenKind::Delimiter, &rest[..1]);
        let after = &rest[1..];
        let value = after.trim_start_matches(' ');
        push(tokens, TokenKind::Whitespace, &after[..after.len() - value.len()]);
        rest = value;
    }

    if rest.starts_with('#') {
        push(tokens, TokenKind::Comment, rest);
        return false;
    }

    if let Some(colon) = find_key_end(rest) {
        push(tokens, TokenKind::Key, &rest[..colon]);
        push(tokens, TokenKind::Delimiter, &rest[colon..=colon]);
        let after = &rest[colon + 1..];
        let value = after.trim_start_matches(' ');
        push(tokens, TokenKind::Whitespace, &after[..after.len() - value.len()]);
        rest = value;
    }

    value(tokens, rest)
}

fn value<'a>(tokens: &mut Vec<Token<'a>>, text: &'a str) -> bool {
    if text.starts_with('#') {
        push(tokens, TokenKind::Comment, text);
        return false;
    }

    let (indicator, comment) = match text.find(" #") {
        Some(at) => (text[..at].trim_end(), Some(at)),
        None => (text, None),
    };
    if is_block_indicator(indicator) {
        push(tokens, TokenKind::Delimiter, indicator);
        if let Some(at) = comment {
            push(tokens, TokenKind::Whitespace, &text[indicator.len()..=at]);
            push(tokens, TokenKind::Comment, &text[at + 1..]);
        }
        return true;
    }

    push(tokens, TokenKind::Scalar, text);
    false
}

/// `|`, `>`, optionally followed by an indentation digit and a chomping
/// indicator in either order.
fn is_block_indicator(text: &str) -> bool {
    let mut chars = text.chars();
    if !matches!(chars.next(), Some('|' | '>')) {
        return false;
    }
    let rest: Vec<char> = chars.collect();
    match *rest.as_slice() {
        [] => true,
        [a] => matches!(a, '+' | '-' | '1'..='9'),
        [a, b] => {
            (matches!(a, '+' | '-') && matches!(b, '1'..='9'))
                || (matches!(a, '1'..='9') && matches!(b, '+' | '-'))
        }
        _ => false,
    }
}

/// Byte offset of the `:` ending a mapping key, if the line starts one.
fn find_key_end(text: &str) -> Option<usize> {
    if text.starts_with(['{', '[', '|', '>']) {
        return None;
    }

    let bytes = text.as_bytes();
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(b'"') if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'#' if i > 0 && bytes[i - 1] == b' ' => return None,
                b':' if bytes.get(i + 1).is_none_or(|next| *next == b' ') => return Some(i),
                _ => {}
            },
        }
        i += 1;
    }
    None
}
