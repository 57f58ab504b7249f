use clap::ValueEnum;
use console::Style;
use serde::{Deserialize, Serialize};

use super::lexer::{Token, TokenKind};
use super::sink::Severity;
use crate::ci::Detectors;

/// 256-color indices approximating tokyonight-moon, for dark backgrounds.
pub mod dark {
    pub const COMMAND: u8 = 150;
    pub const TEXT: u8 = 189;
    pub const KEY: u8 = 141;
    pub const DELIMITER: u8 = 110;
    pub const LITERAL: u8 = 240;
    pub const COMMENT: u8 = 243;

    pub const DEBUG: u8 = 111;
    pub const INFO: u8 = 117;
    pub const WARN: u8 = 179;
    pub const ERROR: u8 = 210;
    pub const FATAL: u8 = 183;
}

/// 256-color indices approximating tokyonight-day, for light backgrounds.
pub mod light {
    pub const COMMAND: u8 = 64;
    pub const TEXT: u8 = 60;
    pub const KEY: u8 = 98;
    pub const DELIMITER: u8 = 31;
    pub const LITERAL: u8 = 247;
    pub const COMMENT: u8 = 245;

    pub const DEBUG: u8 = 32;
    pub const INFO: u8 = 31;
    pub const WARN: u8 = 94;
    pub const ERROR: u8 = 197;
    pub const FATAL: u8 = 98;
}

/// Background the colors are picked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn detect(detectors: &Detectors) -> Self {
        if (detectors.dark_background)() {
            Self::Dark
        } else {
            Self::Light
        }
    }

    /// Foreground for a severity label.
    pub fn severity_color(self, severity: Severity) -> u8 {
        match (self, severity) {
            (Self::Dark, Severity::Debug) => dark::DEBUG,
            (Self::Dark, Severity::Info) => dark::INFO,
            (Self::Dark, Severity::Warn) => dark::WARN,
            (Self::Dark, Severity::Error) => dark::ERROR,
            (Self::Dark, Severity::Fatal) => dark::FATAL,
            (Self::Light, Severity::Debug) => light::DEBUG,
            (Self::Light, Severity::Info) => light::INFO,
            (Self::Light, Severity::Warn) => light::WARN,
            (Self::Light, Severity::Error) => light::ERROR,
            (Self::Light, Severity::Fatal) => light::FATAL,
        }
    }
}

/// Configured theme; `Auto` asks the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ThemeChoice {
    #[default]
    Auto,
    Light,
    Dark,
}

/// Requested color behavior before environment signals are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    /// Color when the terminal supports it
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    /// Resolves whether output should be colored right now.
    ///
    /// `NO_COLOR` wins over every choice, including `Always`.
    pub fn enabled(self, detectors: &Detectors) -> bool {
        if (detectors.no_color)() {
            return false;
        }
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::colors_enabled(),
        }
    }
}

/// Token-category to color mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// Two-tone: commands and keywords stand out, everything else shares one hue.
    Shell,
    KeyValue,
}

impl Palette {
    pub fn color(self, kind: TokenKind, theme: Theme) -> Option<u8> {
        if kind == TokenKind::Whitespace {
            return None;
        }
        let color = match (self, theme) {
            (Self::Shell, Theme::Dark) => match kind {
                TokenKind::Command | TokenKind::Keyword => dark::COMMAND,
                _ => dark::TEXT,
            },
            (Self::Shell, Theme::Light) => match kind {
                TokenKind::Command | TokenKind::Keyword => light::COMMAND,
                _ => light::TEXT,
            },
            (Self::KeyValue, Theme::Dark) => match kind {
                TokenKind::Key => dark::KEY,
                TokenKind::Delimiter => dark::DELIMITER,
                TokenKind::Literal => dark::LITERAL,
                TokenKind::Comment => dark::COMMENT,
                _ => dark::TEXT,
            },
            (Self::KeyValue, Theme::Light) => match kind {
                TokenKind::Key => light::KEY,
                TokenKind::Delimiter => light::DELIMITER,
                TokenKind::Literal => light::LITERAL,
                TokenKind::Comment => light::COMMENT,
                _ => light::TEXT,
            },
        };
        Some(color)
    }
}

/// Renders tokens with ANSI 256-color foregrounds.
///
/// Styling never spans a newline: every line segment of a token is wrapped
/// and reset separately so line-oriented log viewers keep colors intact.
pub fn paint(tokens: &[Token<'_>], palette: Palette, theme: Theme) -> String {
    let mut out = String::new();
    for token in tokens {
        let Some(color) = palette.color(token.kind, theme) else {
            out.push_str(token.text);
            continue;
        };
        let style = Style::new().color256(color).force_styling(true);
        for (index, segment) in token.text.split('\n').enumerate() {
            if index > 0 {
                out.push('\n');
            }
            if !segment.is_empty() {
                out.push_str(&style.apply_to(segment).to_string());
            }
        }
    }
    out
}

/// Four-letter severity label, colored for `theme` when `color` is set.
pub fn severity_label(severity: Severity, theme: Theme, color: bool) -> String {
    if !color {
        return severity.label().to_string();
    }
    Style::new()
        .color256(theme.severity_color(severity))
        .force_styling(true)
        .apply_to(severity.label())
        .to_string()
}
