//! Issue reporting for `roadmap check`
//!
//! Whole-table problems are errors; problems confined to one row are
//! warnings, since the rest of the table still renders. `--strict` turns
//! warnings into errors.
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success: no errors (row warnings allowed) |
//! | 1 | Failure: one or more errors reported |

use std::io::Write;
use std::path::Path;
use std::process;

use roadmap_parser::{ParseReport, TableIssue};
use serde::Serialize;

// ============================================================================
// Exit Code
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl ExitCode {
    pub fn from_error_count(count: usize) -> Self {
        if count > 0 {
            ExitCode::Failure
        } else {
            ExitCode::Success
        }
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}

// ============================================================================
// Severity
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn of(issue: &TableIssue, strict: bool) -> Self {
        if strict || issue.issue.is_structural() {
            Severity::Error
        } else {
            Severity::Warning
        }
    }

    fn label(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

// ============================================================================
// Emitters
// ============================================================================

/// Writes a parse report and counts the errors in it
pub trait IssueEmitter {
    fn emit(&mut self, file: &Path, report: &ParseReport) -> std::io::Result<usize>;
}

/// Human readable report, one line per issue plus a summary
pub struct TerminalEmitter<W: Write> {
    writer: W,
    strict: bool,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, strict: bool) -> Self {
        Self { writer, strict }
    }
}

impl<W: Write> IssueEmitter for TerminalEmitter<W> {
    fn emit(&mut self, file: &Path, report: &ParseReport) -> std::io::Result<usize> {
        let mut errors = 0;
        for issue in &report.issues {
            let severity = Severity::of(issue, self.strict);
            if severity == Severity::Error {
                errors += 1;
            }
            writeln!(self.writer, "{}: {}: {}", severity.label(), file.display(), issue)?;
        }
        writeln!(
            self.writer,
            "{}: {} swimlane(s), {} event(s), {} issue(s)",
            file.display(),
            report.swimlanes.len(),
            report.event_count(),
            report.issues.len()
        )?;
        Ok(errors)
    }
}

#[derive(Serialize)]
struct JsonIssue<'a> {
    severity: Severity,
    table: usize,
    row: Option<usize>,
    message: &'a str,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    file: String,
    swimlanes: Vec<&'a str>,
    events: usize,
    issues: Vec<JsonIssue<'a>>,
}

/// Machine readable report
pub struct JsonEmitter<W: Write> {
    writer: W,
    strict: bool,
}

impl<W: Write> JsonEmitter<W> {
    pub fn new(writer: W, strict: bool) -> Self {
        Self { writer, strict }
    }
}

impl<W: Write> IssueEmitter for JsonEmitter<W> {
    fn emit(&mut self, file: &Path, report: &ParseReport) -> std::io::Result<usize> {
        let issues: Vec<JsonIssue> = report
            .issues
            .iter()
            .map(|i| JsonIssue {
                severity: Severity::of(i, self.strict),
                table: i.table,
                row: i.issue.row,
                message: &i.issue.title,
            })
            .collect();
        let errors = issues.iter().filter(|i| i.severity == Severity::Error).count();

        let json = JsonReport {
            file: file.display().to_string(),
            swimlanes: report.swimlanes.iter().map(|s| s.name.as_str()).collect(),
            events: report.event_count(),
            issues,
        };
        serde_json::to_writer_pretty(&mut self.writer, &json)?;
        writeln!(self.writer)?;
        Ok(errors)
    }
}
