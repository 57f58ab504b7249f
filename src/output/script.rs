use log::debug;

use super::sink::{LogSink, Severity};
use super::styling::{paint, Palette};
use super::{emit, Printer};

impl Printer {
    /// Prints `script` line by line with a two-space indent.
    ///
    /// Nothing is printed unless the sink accepts [`Severity::Info`]. With
    /// color enabled each line is highlighted on its own; a line the lexer
    /// rejects is printed plain. `label` names the shell and only shows up
    /// in diagnostics.
    pub fn print_script(&self, sink: Option<&mut dyn LogSink>, label: &str, script: &str) {
        let Some(sink) = sink else {
            return;
        };
        if !sink.enabled(Severity::Info) {
            return;
        }

        let shell = if label.is_empty() { "shell" } else { label };
        let color = self.color_enabled();
        debug!("Printing {shell} script (color: {color})");

        for line in script.lines() {
            let rendered = if color {
                self.highlight_line(shell, line)
            } else {
                line.to_string()
            };
            emit(sink, Severity::Info, &format!("  {rendered}\n"));
        }
    }

    fn highlight_line(&self, shell: &str, line: &str) -> String {
        match self.shell_lexer.tokenize(line) {
            Ok(tokens) => paint(&tokens, Palette::Shell, self.theme()),
            Err(err) => {
                debug!("failed to highlight {shell} line: {err}");
                line.to_string()
            }
        }
    }
}
