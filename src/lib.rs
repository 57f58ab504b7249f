//! Console output for task runners.
//!
//! `runlog` prints the shell scripts and builtin parameters of a step with
//! syntax highlighting, and wraps steps in collapsible groups understood by
//! GitHub Actions and GitLab CI. Output is written to a caller-owned
//! [`LogSink`](output::LogSink) and gated by its severity level.
//!
//! ```no_run
//! use runlog::output::{LevelWriter, Printer, Severity, With};
//!
//! let printer = Printer::default();
//! let mut sink = LevelWriter::new(std::io::stdout(), Severity::Info);
//!
//! let mut group = printer.print_group(Some(&mut sink), "build", "compile the project");
//! printer.print_script(group.sink(), "sh", "cargo build --release");
//!
//! let mut with: With<&str> = With::new();
//! with.insert("text".to_string(), "done");
//! printer.print_builtin(group.sink(), &with);
//! group.close();
//! ```

pub mod ci;
pub mod config;
pub mod error;
pub mod output;

pub use ci::{CiEnvironment, CiProvider, Detectors};
pub use config::Config;
pub use error::{Result, RunlogError};
pub use output::{Group, LevelWriter, LogSink, Printer, Severity, With};
