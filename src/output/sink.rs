use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::RunlogError;

/// Ordered severities, least severe first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    #[serde(alias = "warning")]
    #[value(alias = "warning")]
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    /// Prefix used for diagnostic lines written to a sink.
    pub fn label(self) -> &'static str {
        match self {
            Self::Debug => "DEBU",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERRO",
            Self::Fatal => "FATA",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = RunlogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "fatal" => Ok(Self::Fatal),
            other => Err(RunlogError::Config(format!("unknown log level '{other}'"))),
        }
    }
}

/// A writer gated by a minimum severity.
///
/// Printers ask [`LogSink::enabled`] before doing any rendering work and write
/// through [`LogSink::write_at`]. CI group markup bypasses the gate via
/// [`LogSink::write_raw`] so that an open marker is never emitted without its
/// close marker.
pub trait LogSink {
    /// Minimum severity that will be written.
    fn level(&self) -> Severity;

    /// Writes `text` unconditionally.
    fn write_raw(&mut self, text: &str) -> io::Result<()>;

    fn enabled(&self, severity: Severity) -> bool {
        severity >= self.level()
    }

    /// Writes `text` if `severity` passes the gate, otherwise does nothing.
    fn write_at(&mut self, severity: Severity, text: &str) -> io::Result<()> {
        if self.enabled(severity) {
            self.write_raw(text)
        } else {
            Ok(())
        }
    }
}

/// [`LogSink`] over any [`io::Write`].
#[derive(Debug)]
pub struct LevelWriter<W> {
    inner: W,
    level: Severity,
}

impl<W: Write> LevelWriter<W> {
    pub fn new(inner: W, level: Severity) -> Self {
        Self { inner, level }
    }

    pub fn set_level(&mut self, level: Severity) {
        self.level = level;
    }
}

impl LevelWriter<Vec<u8>> {
    /// Captured output as text, lossily decoded.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.inner).into_owned()
    }
}

impl<W: Write> LogSink for LevelWriter<W> {
    fn level(&self) -> Severity {
        self.level
    }

    fn write_raw(&mut self, text: &str) -> io::Result<()> {
        self.inner.write_all(text.as_bytes())?;
        self.inner.flush()
    }
}
