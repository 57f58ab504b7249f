mod shell;
mod yaml;

pub use shell::ShellLexer;
pub use yaml::YamlLexer;

use crate::error::Result;

/// Classification of a span of source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Whitespace,
    Comment,
    // shell
    Command,
    Keyword,
    Argument,
    String,
    Variable,
    Operator,
    // key/value text
    Key,
    Delimiter,
    Scalar,
    Literal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
}

impl<'a> Token<'a> {
    pub fn new(kind: TokenKind, text: &'a str) -> Self {
        Self { kind, text }
    }
}

/// A highlighting backend.
///
/// Concatenating the `text` of every returned token must reproduce the
/// input exactly. Printers treat any error as "render this text plain".
pub trait Lexer {
    fn name(&self) -> &'static str;

    fn tokenize<'a>(&self, text: &'a str) -> Result<Vec<Token<'a>>>;
}

pub(crate) fn reject_nul(lexer: &'static str, text: &str) -> Result<()> {
    match text.find('\0') {
        Some(offset) => Err(crate::error::RunlogError::lex(
            lexer,
            format!("unexpected NUL byte at offset {offset}"),
        )),
        None => Ok(()),
    }
}
