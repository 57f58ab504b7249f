mod builtin;
mod group;
pub mod lexer;
mod script;
pub mod sink;
mod styling;

pub use builtin::{marshal_builtin, With};
pub use group::Group;
pub use sink::{LevelWriter, LogSink, Severity};
pub use styling::{paint, severity_label, ColorChoice, Palette, Theme, ThemeChoice};

use log::debug;
use serde::Serialize;

use crate::ci::Detectors;
use crate::config::Config;
use lexer::{Lexer, ShellLexer, YamlLexer};

/// Renders scripts, builtin parameters and CI groups onto a [`LogSink`].
///
/// Every operation is best effort: rendering problems degrade to plain text
/// or to nothing, and are never reported back to the caller.
pub struct Printer {
    color: ColorChoice,
    detectors: Detectors,
    shell_lexer: Box<dyn Lexer>,
    yaml_lexer: Box<dyn Lexer>,
}

impl Default for Printer {
    fn default() -> Self {
        Self::new(ColorChoice::Auto, Detectors::default())
    }
}

impl Printer {
    pub fn new(color: ColorChoice, detectors: Detectors) -> Self {
        Self {
            color,
            detectors,
            shell_lexer: Box::new(ShellLexer),
            yaml_lexer: Box::new(YamlLexer),
        }
    }

    /// Builds a printer honoring the configured color, theme and CI provider.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.output.color,
            Detectors::default()
                .with_provider(config.ci.provider)
                .with_theme(config.output.theme),
        )
    }

    #[must_use]
    pub fn with_shell_lexer(mut self, lexer: impl Lexer + 'static) -> Self {
        self.shell_lexer = Box::new(lexer);
        self
    }

    #[must_use]
    pub fn with_yaml_lexer(mut self, lexer: impl Lexer + 'static) -> Self {
        self.yaml_lexer = Box::new(lexer);
        self
    }

    pub fn detectors(&self) -> &Detectors {
        &self.detectors
    }

    /// Light or dark colors, resolved fresh on every call.
    pub fn theme(&self) -> Theme {
        Theme::detect(&self.detectors)
    }

    /// Whether output is colored, resolved fresh on every call.
    pub fn color_enabled(&self) -> bool {
        self.color.enabled(&self.detectors)
    }
}

/// Prints a script with a default [`Printer`].
pub fn print_script(sink: Option<&mut dyn LogSink>, label: &str, script: &str) {
    Printer::default().print_script(sink, label, script);
}

/// Prints builtin parameters with a default [`Printer`].
pub fn print_builtin<V: Serialize>(sink: Option<&mut dyn LogSink>, with: &With<V>) {
    Printer::default().print_builtin(sink, with);
}

/// Opens a CI group with a default [`Printer`].
pub fn print_group<'a>(
    sink: Option<&'a mut dyn LogSink>,
    name: &str,
    description: &str,
) -> Group<'a> {
    Printer::default().print_group(sink, name, description)
}

fn emit(sink: &mut dyn LogSink, severity: Severity, text: &str) {
    if let Err(err) = sink.write_at(severity, text) {
        debug!("failed to write to log sink: {err}");
    }
}
