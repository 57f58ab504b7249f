use chrono::Utc;
use log::debug;

use super::sink::LogSink;
use super::Printer;
use crate::ci::CiEnvironment;

/// An open, collapsible section in a CI log.
///
/// The close marker is written exactly once: by [`Group::close`], or when
/// the handle is dropped. Groups on a plain terminal, without a sink or
/// without a name are inert and write nothing.
pub struct Group<'a> {
    sink: Option<&'a mut dyn LogSink>,
    close: Option<CloseMarker>,
}

enum CloseMarker {
    GitHub,
    GitLab { name: String },
}

impl CloseMarker {
    fn render(&self) -> String {
        match self {
            // https://docs.github.com/en/actions/reference/workflows-and-actions/workflow-commands#grouping-log-lines
            Self::GitHub => "::endgroup::\n".to_string(),
            // https://docs.gitlab.com/ci/jobs/job_logs/#expand-and-collapse-job-log-sections
            Self::GitLab { name } => gitlab_section_end(name, Utc::now().timestamp()),
        }
    }
}

impl<'a> Group<'a> {
    fn inert(sink: Option<&'a mut dyn LogSink>) -> Self {
        Self { sink, close: None }
    }

    /// Whether a close marker is still owed.
    pub fn is_open(&self) -> bool {
        self.close.is_some()
    }

    /// The sink this group writes to, for printing inside the group.
    pub fn sink(&mut self) -> Option<&mut dyn LogSink> {
        match self.sink.as_mut() {
            Some(sink) => Some(&mut **sink),
            None => None,
        }
    }

    /// Writes the close marker.
    pub fn close(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        let Some(marker) = self.close.take() else {
            return;
        };
        if let Some(sink) = self.sink.as_mut() {
            if let Err(err) = sink.write_raw(&marker.render()) {
                debug!("failed to close CI group: {err}");
            }
        }
    }
}

impl Drop for Group<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

impl Printer {
    /// Opens a CI log group named `name`.
    ///
    /// The CI environment is detected before anything else, even when there
    /// is no sink. Markup bypasses the sink's level so open and close always
    /// pair up.
    pub fn print_group<'a>(
        &self,
        sink: Option<&'a mut dyn LogSink>,
        name: &str,
        description: &str,
    ) -> Group<'a> {
        let environment = self.detectors().ci_environment();

        let Some(sink) = sink else {
            return Group::inert(None);
        };
        if name.is_empty() {
            return Group::inert(Some(sink));
        }

        let (open, close) = match environment {
            CiEnvironment::None => return Group::inert(Some(sink)),
            CiEnvironment::GitHubActions => {
                (github_group(name, description), CloseMarker::GitHub)
            }
            CiEnvironment::GitLabCi => {
                let header = if description.is_empty() {
                    name
                } else {
                    description
                };
                (
                    gitlab_section_start(name, header, Utc::now().timestamp()),
                    CloseMarker::GitLab {
                        name: name.to_string(),
                    },
                )
            }
        };

        debug!("Opening {environment:?} group {name}");
        if let Err(err) = sink.write_raw(&open) {
            debug!("failed to open CI group: {err}");
        }

        Group {
            sink: Some(sink),
            close: Some(close),
        }
    }
}

fn github_group(name: &str, description: &str) -> String {
    if description.is_empty() {
        format!("::group::{name}\n")
    } else {
        format!("::group::{name}: {description}\n")
    }
}

fn gitlab_section_start(name: &str, header: &str, timestamp: i64) -> String {
    format!("\x1b[0Ksection_start:{timestamp}:{name}[collapsed=true]\r\x1b[0K{header}")
}

fn gitlab_section_end(name: &str, timestamp: i64) -> String {
    format!("\x1b[0Ksection_end:{timestamp}:{name}\r\x1b[0K")
}
