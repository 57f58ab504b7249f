use indexmap::IndexMap;
use log::debug;
use serde::Serialize;
use serde_yaml::{Mapping, Value};

use super::sink::{LogSink, Severity};
use super::styling::{paint, severity_label, Palette};
use super::{emit, Printer};
use crate::error::Result;

/// Parameters passed to a builtin step, in declaration order.
pub type With<V = serde_yaml::Value> = IndexMap<String, V>;

/// Serializes parameters as a YAML document rooted at `with:`.
///
/// String values containing a newline are always written as `|-` literal
/// blocks, one line per source line, whatever characters they hold. Every
/// other value goes through `serde_yaml`.
///
/// # Errors
///
/// Returns [`RunlogError::Marshal`](crate::error::RunlogError::Marshal) if a
/// value cannot be represented.
pub fn marshal_builtin<V: Serialize>(with: &With<V>) -> Result<String> {
    if with.is_empty() {
        return Ok("with: {}\n".to_string());
    }

    let mut out = String::from("with:\n");
    for (key, value) in with {
        let value = serde_yaml::to_value(value)?;
        match value {
            Value::String(text) if text.contains('\n') => {
                let key = serde_yaml::to_string(key)?;
                literal_block(&mut out, key.trim_end(), &text);
            }
            value => {
                let mut entry = Mapping::new();
                entry.insert(Value::String(key.clone()), value);
                for line in serde_yaml::to_string(&entry)?.lines() {
                    out.push_str("  ");
                    out.push_str(line);
                    out.push('\n');
                }
            }
        }
    }
    Ok(out)
}

fn literal_block(out: &mut String, key: &str, text: &str) {
    // Leading spaces on the first line would be read as indentation.
    let header = if text.starts_with(' ') { "|2-" } else { "|-" };
    out.push_str(&format!("  {key}: {header}\n"));
    for line in text.lines() {
        if !line.is_empty() {
            out.push_str("    ");
            out.push_str(line);
        }
        out.push('\n');
    }
}

impl Printer {
    /// Prints builtin parameters as highlighted YAML.
    ///
    /// A value that fails to serialize produces a single warning line and no
    /// parameter output.
    pub fn print_builtin<V: Serialize>(&self, sink: Option<&mut dyn LogSink>, with: &With<V>) {
        let Some(sink) = sink else {
            return;
        };
        if !sink.enabled(Severity::Info) {
            return;
        }

        let yaml = match marshal_builtin(with) {
            Ok(yaml) => yaml,
            Err(err) => {
                debug!("{err}");
                let label = severity_label(Severity::Warn, self.theme(), self.color_enabled());
                emit(sink, Severity::Warn, &format!("{label} {err}\n"));
                return;
            }
        };

        let mut rendered = if self.color_enabled() {
            self.highlight(yaml)
        } else {
            yaml
        };
        if !rendered.ends_with('\n') {
            rendered.push('\n');
        }
        emit(sink, Severity::Info, &rendered);
    }

    fn highlight(&self, yaml: String) -> String {
        match self.yaml_lexer.tokenize(&yaml) {
            Ok(tokens) => paint(&tokens, Palette::KeyValue, self.theme()),
            Err(err) => {
                debug!("failed to highlight builtin: {err}");
                yaml
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ci::Detectors;
    use crate::error::RunlogError;
    use crate::output::lexer::{Lexer, Token};
    use crate::output::{ColorChoice, LevelWriter};
    use serde::ser::Error as _;

    struct FailingLexer;

    impl Lexer for FailingLexer {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn tokenize<'a>(&self, _text: &'a str) -> Result<Vec<Token<'a>>> {
            Err(RunlogError::lex("failing", "not implemented"))
        }
    }

    /// A parameter that may hold something YAML cannot express.
    enum Param {
        Text(&'static str),
        Callback,
    }

    impl Serialize for Param {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
            match self {
                Self::Text(text) => serializer.serialize_str(text),
                Self::Callback => Err(S::Error::custom("callbacks cannot be represented")),
            }
        }
    }

    fn printer(color: bool) -> Printer {
        let choice = if color {
            ColorChoice::Always
        } else {
            ColorChoice::Never
        };
        Printer::new(choice, Detectors::plain())
    }

    fn with(entries: &[(&str, &'static str)]) -> With<&'static str> {
        entries.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    fn render<V: Serialize>(printer: &Printer, level: Severity, with: &With<V>) -> String {
        let mut sink = LevelWriter::new(Vec::new(), level);
        printer.print_builtin(Some(&mut sink), with);
        sink.contents()
    }

    #[cfg(test)]
    mod plain {
        use super::*;

        #[test]
        fn single_scalar() {
            assert_eq!(
                render(&printer(false), Severity::Info, &with(&[("text", "hello")])),
                "with:\n  text: hello\n"
            );
        }

        #[test]
        fn keeps_insertion_order() {
            let params = with(&[("zeta", "last"), ("alpha", "first"), ("mid", "echo hello")]);
            assert_eq!(
                render(&printer(false), Severity::Info, &params),
                "with:\n  zeta: last\n  alpha: first\n  mid: echo hello\n"
            );
        }

        #[test]
        fn multiline_uses_literal_block() {
            assert_eq!(
                render(&printer(false), Severity::Info, &with(&[("text", "hello\nworld\n!")])),
                "with:\n  text: |-\n    hello\n    world\n    !\n"
            );
        }

        #[test]
        fn tab_indented_body_uses_literal_block() {
            assert_eq!(
                render(&printer(false), Severity::Info, &with(&[("text", "make\n\tcc a.c")])),
                "with:\n  text: |-\n    make\n    \tcc a.c\n"
            );
        }

        #[test]
        fn trailing_space_uses_literal_block() {
            assert_eq!(
                render(&printer(false), Severity::Info, &with(&[("text", "hello \nworld")])),
                "with:\n  text: |-\n    hello \n    world\n"
            );
        }

        #[test]
        fn crlf_uses_literal_block() {
            assert_eq!(
                render(&printer(false), Severity::Info, &with(&[("text", "a\r\nb")])),
                "with:\n  text: |-\n    a\n    b\n"
            );
        }

        #[test]
        fn leading_space_gets_indentation_indicator() {
            assert_eq!(
                render(&printer(false), Severity::Info, &with(&[("text", "  lead\nx")])),
                "with:\n  text: |2-\n      lead\n    x\n"
            );
        }

        #[test]
        fn blank_lines_stay_empty() {
            assert_eq!(
                render(&printer(false), Severity::Info, &with(&[("text", "a\n\nb")])),
                "with:\n  text: |-\n    a\n\n    b\n"
            );
        }

        #[test]
        fn empty_parameters() {
            assert_eq!(
                render(&printer(false), Severity::Info, &With::<&str>::new()),
                "with: {}\n"
            );
        }

        #[test]
        fn yaml_values() {
            let mut params: With = With::new();
            params.insert("text".to_string(), serde_yaml::Value::from("echo hello"));
            assert_eq!(
                render(&printer(false), Severity::Info, &params),
                "with:\n  text: echo hello\n"
            );
        }
    }

    #[cfg(test)]
    mod colored {
        use super::*;

        #[test]
        fn single_scalar() {
            assert_eq!(
                render(&printer(true), Severity::Info, &with(&[("text", "hello")])),
                "\x1b[38;5;141mwith\x1b[0m\x1b[38;5;110m:\x1b[0m\n  \
                 \x1b[38;5;141mtext\x1b[0m\x1b[38;5;110m:\x1b[0m \x1b[38;5;189mhello\x1b[0m\n"
            );
        }

        #[test]
        fn multiline_body_is_dimmed() {
            assert_eq!(
                render(&printer(true), Severity::Info, &with(&[("text", "hello\nworld\n!")])),
                "\x1b[38;5;141mwith\x1b[0m\x1b[38;5;110m:\x1b[0m\n  \
                 \x1b[38;5;141mtext\x1b[0m\x1b[38;5;110m:\x1b[0m \x1b[38;5;110m|-\x1b[0m\n\
                 \x1b[38;5;240m    hello\x1b[0m\n\
                 \x1b[38;5;240m    world\x1b[0m\n\
                 \x1b[38;5;240m    !\x1b[0m\n"
            );
        }

        #[test]
        fn light_background() {
            fn light() -> bool {
                false
            }
            let printer = Printer::new(
                ColorChoice::Always,
                Detectors {
                    dark_background: light,
                    ..Detectors::plain()
                },
            );
            assert_eq!(
                render(&printer, Severity::Info, &with(&[("text", "hello")])),
                "\x1b[38;5;98mwith\x1b[0m\x1b[38;5;31m:\x1b[0m\n  \
                 \x1b[38;5;98mtext\x1b[0m\x1b[38;5;31m:\x1b[0m \x1b[38;5;60mhello\x1b[0m\n"
            );
        }

        #[test]
        fn tab_indented_body_is_highlighted_as_block() {
            assert_eq!(
                render(&printer(true), Severity::Info, &with(&[("text", "make\n\tcc a.c")])),
                "\x1b[38;5;141mwith\x1b[0m\x1b[38;5;110m:\x1b[0m\n  \
                 \x1b[38;5;141mtext\x1b[0m\x1b[38;5;110m:\x1b[0m \x1b[38;5;110m|-\x1b[0m\n\
                 \x1b[38;5;240m    make\x1b[0m\n\
                 \x1b[38;5;240m    \tcc a.c\x1b[0m\n"
            );
        }

        #[test]
        fn failing_lexer_falls_back_to_plain() {
            let printer = printer(true).with_yaml_lexer(FailingLexer);
            assert_eq!(
                render(&printer, Severity::Info, &with(&[("text", "echo hello")])),
                "with:\n  text: echo hello\n"
            );
        }

        #[test]
        fn failing_lexer_keeps_block_layout() {
            let printer = printer(true).with_yaml_lexer(FailingLexer);
            let params = with(&[
                ("script", "make\n\tcc a.c\n\nmake install"),
                ("dir", "build"),
                ("note", "done"),
            ]);
            assert_eq!(
                render(&printer, Severity::Info, &params),
                "with:\n  script: |-\n    make\n    \tcc a.c\n\n    make install\n  dir: build\n  note: done\n"
            );
        }
    }

    #[cfg(test)]
    mod levels {
        use super::*;

        #[test]
        fn info_and_debug_print() {
            for level in [Severity::Debug, Severity::Info] {
                assert_eq!(
                    render(&printer(false), level, &with(&[("text", "hello")])),
                    "with:\n  text: hello\n"
                );
            }
        }

        #[test]
        fn warn_and_above_are_silent() {
            for level in [Severity::Warn, Severity::Error, Severity::Fatal] {
                assert_eq!(render(&printer(false), level, &with(&[("text", "hello")])), "");
            }
        }

        #[test]
        fn absent_sink_is_a_no_op() {
            printer(true).print_builtin(None, &with(&[("text", "hello")]));
        }
    }

    #[cfg(test)]
    mod marshal_errors {
        use super::*;

        #[test]
        fn reports_and_prints_nothing_else() {
            let mut params: With<Param> = With::new();
            params.insert("text".to_string(), Param::Text("hello"));
            params.insert("callback".to_string(), Param::Callback);

            for (color, label) in [(false, "WARN "), (true, "\x1b[38;5;179mWARN\x1b[0m ")] {
                let output = render(&printer(color), Severity::Debug, &params);
                assert!(output.contains("failed to marshal builtin"), "{output}");
                assert!(output.starts_with(label), "{output}");
                assert!(!output.contains("with:"));
                assert!(!output.contains("text"));
                assert_eq!(output.lines().count(), 1);
            }
        }

        #[test]
        fn marshal_builtin_returns_error() {
            let mut params: With<Param> = With::new();
            params.insert("callback".to_string(), Param::Callback);

            let err = marshal_builtin(&params).unwrap_err();
            assert!(matches!(err, RunlogError::Marshal(_)));
            assert!(err.to_string().contains("callbacks cannot be represented"));
        }
    }
}
