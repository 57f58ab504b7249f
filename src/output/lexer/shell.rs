use super::{reject_nul, Lexer, Token, TokenKind};
use crate::error::Result;

const KEYWORDS: &[&str] = &[
    "if", "then", "else", "elif", "fi", "for", "while", "until", "do", "done", "case", "esac",
    "function", "select", "time", "!", "{", "}", "[[", "]]",
];

// Keywords after which the next word is again in command position.
const COMMAND_PREFIXES: &[&str] = &["if", "then", "else", "elif", "while", "until", "do", "time", "!", "{"];

// Keywords whose header may contain a later `in`.
const HEADER_KEYWORDS: &[&str] = &["for", "case", "select"];

const TWO_CHAR_OPERATORS: &[&[u8; 2]] = &[b"||", b"&&", b";;", b">>", b"<<", b"|&", b">&", b"<&", b"&>"];

/// Single-line POSIX shell tokenizer.
///
/// Good enough to tell commands from their arguments; it does not track
/// quoting or heredocs across lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellLexer;

impl Lexer for ShellLexer {
    fn name(&self) -> &'static str {
        "shell"
    }

    fn tokenize<'a>(&self, text: &'a str) -> Result<Vec<Token<'a>>> {
        reject_nul(self.name(), text)?;
        Ok(Scanner::new(text).run())
    }
}

struct Scanner<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    tokens: Vec<Token<'a>>,
    command_position: bool,
    redirect_target: bool,
    in_header: bool,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            text,
            bytes: text.as_bytes(),
            pos: 0,
            tokens: Vec::new(),
            command_position: true,
            redirect_target: false,
            in_header: false,
        }
    }

    fn run(mut self) -> Vec<Token<'a>> {
        while self.pos < self.bytes.len() {
            match self.bytes[self.pos] {
                b if is_space(b) => self.whitespace(),
                b'#' => self.comment(),
                b if is_operator(b) => self.operator(),
                _ => self.word(),
            }
        }
        self.tokens
    }

    fn push(&mut self, kind: TokenKind, start: usize, end: usize) {
        if start < end {
            self.tokens.push(Token::new(kind, &self.text[start..end]));
        }
    }

    /// Byte length of the char starting at `at`, zero at end of input.
    fn char_len(&self, at: usize) -> usize {
        self.text[at..].chars().next().map_or(0, char::len_utf8)
    }

    fn whitespace(&mut self) {
        let start = self.pos;
        while self.pos < self.bytes.len() && is_space(self.bytes[self.pos]) {
            self.pos += 1;
        }
        if self.text[start..self.pos].contains('\n') {
            self.command_position = true;
            self.in_header = false;
        }
        self.push(TokenKind::Whitespace, start, self.pos);
    }

    fn comment(&mut self) {
        let start = self.pos;
        self.pos = self.text[start..]
            .find('\n')
            .map_or(self.bytes.len(), |offset| start + offset);
        self.push(TokenKind::Comment, start, self.pos);
    }

    fn operator(&mut self) {
        let start = self.pos;
        let len = match self.bytes.get(start..start + 2) {
            Some(pair) if TWO_CHAR_OPERATORS.iter().any(|op| op.as_slice() == pair) => 2,
            _ => 1,
        };
        self.pos += len;

        let op = &self.text[start..self.pos];
        if op.starts_with(['<', '>']) || op == "&>" {
            self.redirect_target = true;
        } else if op == ")" {
            self.command_position = false;
        } else {
            self.command_position = true;
            self.in_header = false;
        }
        self.push(TokenKind::Operator, start, self.pos);
    }

    fn word(&mut self) {
        let start = self.pos;
        // `None` marks an unquoted run whose kind depends on the whole word.
        let mut segments: Vec<(Option<TokenKind>, usize, usize)> = Vec::new();
        let mut plain_start = start;

        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if is_space(b) || is_operator(b) {
                break;
            }
            match b {
                b'\'' | b'"' | b'$' => {
                    if plain_start < self.pos {
                        segments.push((None, plain_start, self.pos));
                    }
                    let segment_start = self.pos;
                    let kind = if b == b'$' {
                        self.variable();
                        TokenKind::Variable
                    } else {
                        self.quoted(b);
                        TokenKind::String
                    };
                    segments.push((Some(kind), segment_start, self.pos));
                    plain_start = self.pos;
                }
                b'\\' => {
                    self.pos += 1;
                    if self.pos < self.bytes.len() {
                        self.pos += self.char_len(self.pos);
                    }
                }
                _ => self.pos += 1,
            }
        }
        if plain_start < self.pos {
            segments.push((None, plain_start, self.pos));
        }

        let word = &self.text[start..self.pos];
        if std::mem::take(&mut self.redirect_target) {
            self.push_segments(&segments, TokenKind::Argument, TokenKind::Argument);
            return;
        }

        if !self.command_position {
            let kind = if self.in_header && word == "in" {
                self.in_header = false;
                TokenKind::Keyword
            } else {
                TokenKind::Argument
            };
            self.push_segments(&segments, kind, kind);
            return;
        }

        if is_assignment(word) {
            self.push_segments(&segments, TokenKind::Variable, TokenKind::Variable);
        } else if segments.len() == 1 && KEYWORDS.contains(&word) {
            self.push(TokenKind::Keyword, start, self.pos);
            self.command_position = COMMAND_PREFIXES.contains(&word);
            self.in_header = HEADER_KEYWORDS.contains(&word);
        } else {
            self.push_segments(&segments, TokenKind::Command, TokenKind::Argument);
            self.command_position = false;
        }
    }

    /// Emits a word's segments. The first unquoted run gets `first`, later
    /// unquoted runs get `rest`.
    fn push_segments(
        &mut self,
        segments: &[(Option<TokenKind>, usize, usize)],
        first: TokenKind,
        rest: TokenKind,
    ) {
        for (index, &(kind, start, end)) in segments.iter().enumerate() {
            let kind = kind.unwrap_or(if index == 0 { first } else { rest });
            self.push(kind, start, end);
        }
    }

    fn quoted(&mut self, quote: u8) {
        self.pos += 1;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            if b == quote {
                self.pos += 1;
                return;
            }
            if b == b'\\' && quote == b'"' {
                self.pos += 1;
                if self.pos < self.bytes.len() {
                    self.pos += self.char_len(self.pos);
                }
                continue;
            }
            self.pos += 1;
        }
    }

    fn variable(&mut self) {
        self.pos += 1;
        let Some(&next) = self.bytes.get(self.pos) else {
            return;
        };
        match next {
            b'{' => self.until_closing(b'{', b'}'),
            b'(' => self.until_closing(b'(', b')'),
            b if b.is_ascii_alphabetic() || b == b'_' => {
                while self
                    .bytes
                    .get(self.pos)
                    .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'_')
                {
                    self.pos += 1;
                }
            }
            b if b.is_ascii_digit() || b"@*#?$!-".contains(&b) => self.pos += 1,
            _ => {}
        }
    }

    fn until_closing(&mut self, open: u8, close: u8) {
        let mut depth = 0usize;
        while self.pos < self.bytes.len() {
            let b = self.bytes[self.pos];
            self.pos += 1;
            if b == open {
                depth += 1;
            } else if b == close {
                depth -= 1;
                if depth == 0 {
                    return;
                }
            }
        }
    }
}

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_operator(b: u8) -> bool {
    matches!(b, b'|' | b'&' | b';' | b'(' | b')' | b'<' | b'>')
}

fn is_assignment(word: &str) -> bool {
    let Some((name, _)) = word.split_once('=') else {
        return false;
    };
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
