use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunlogError {
    #[error("{lexer} lexer failed: {message}")]
    Lex {
        lexer: &'static str,
        message: String,
    },

    #[error("failed to marshal builtin: {0}")]
    Marshal(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl RunlogError {
    pub(crate) fn lex(lexer: &'static str, message: impl Into<String>) -> Self {
        Self::Lex {
            lexer,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RunlogError>;
