//! Diagnostics collected while parsing and translating configs, and the
//! strict/lenient policy that decides whether they abort the pipeline.
//!
//! Stages only collect entries; the pass/fail decision is taken once per
//! stage by [`Policy::check`].

use std::fmt;

use ariadne::{Color, Label, ReportKind, Source};

use crate::dialect::layout::column;
use crate::error::{DialectError, Span};

/// Severity of a diagnostic entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Deprecated or non-ideal construct; aborts only under strict policy
    Warning,
    /// Syntax or semantic error; always aborts
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// Location of an entry in the text it was produced from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// 1-based line
    pub line: usize,
    /// 1-based column
    pub column: usize,
    pub span: Span,
}

impl Marker {
    pub fn locate(source: &str, span: Span) -> Self {
        let offset = span.start.min(source.len());
        let line = source[..offset].matches('\n').count() + 1;
        Self {
            line,
            column: column(source, offset) + 1,
            span,
        }
    }
}

/// A single diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub severity: Severity,
    pub message: String,
    pub marker: Option<Marker>,
}

impl Entry {
    /// Format the entry with source context using ariadne. `source` must be
    /// the text the entry was produced from.
    pub fn format(&self, source: &str, filename: &str) -> String {
        let Some(marker) = &self.marker else {
            return self.to_string();
        };
        let (kind, color) = match self.severity {
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
            Severity::Error => (ReportKind::Error, Color::Red),
        };
        let mut buf = Vec::new();
        let written = ariadne::Report::build(kind, filename, marker.span.start)
            .with_message(&self.message)
            .with_label(
                Label::new((filename, marker.span.clone()))
                    .with_message(&self.message)
                    .with_color(color),
            )
            .finish()
            .write((filename, Source::from(source)), &mut buf);

        match written {
            Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
            Err(_) => self.to_string(),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.marker {
            Some(m) => writeln!(
                f,
                "{} at line {}, column {}\n{}",
                self.severity, m.line, m.column, self.message
            ),
            None => writeln!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Ordered list of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    entries: Vec<Entry>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Add a warning located at `span` in `source`
    pub fn warn(&mut self, source: &str, span: Span, message: impl Into<String>) {
        self.push(Entry {
            severity: Severity::Warning,
            message: message.into(),
            marker: Some(Marker::locate(source, span)),
        });
    }

    /// Add an error located at `span` in `source`
    pub fn error(&mut self, source: &str, span: Span, message: impl Into<String>) {
        self.push(Entry {
            severity: Severity::Error,
            message: message.into(),
            marker: Some(Marker::locate(source, span)),
        });
    }

    /// Append `other` after this report's entries
    pub fn merge(&mut self, other: Report) {
        self.entries.extend(other.entries);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True if any entry is an error
    pub fn is_fatal(&self) -> bool {
        self.entries.iter().any(|e| e.severity == Severity::Error)
    }

    /// Build a report from parser errors
    pub fn from_dialect_errors(source: &str, errors: &[DialectError]) -> Self {
        let mut report = Self::new();
        for err in errors {
            report.error(source, err.span().clone(), err.message());
        }
        report
    }

    /// Format every entry with source context
    pub fn format(&self, source: &str, filename: &str) -> String {
        self.entries
            .iter()
            .map(|e| e.format(source, filename))
            .collect()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// Decides whether a report lets the pipeline continue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    /// Any entry aborts
    Strict,
    /// Only errors abort
    #[default]
    Lenient,
}

impl Policy {
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            Policy::Strict
        } else {
            Policy::Lenient
        }
    }

    pub fn rejects(self, report: &Report) -> bool {
        report.is_fatal() || (self == Policy::Strict && !report.is_empty())
    }

    /// Pass the report through, or hand it back as the failure
    pub fn check(self, report: Report) -> Result<Report, Report> {
        if self.rejects(&report) {
            Err(report)
        } else {
            Ok(report)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(severities: &[Severity]) -> Report {
        let mut report = Report::new();
        for (i, severity) in severities.iter().enumerate() {
            report.push(Entry {
                severity: *severity,
                message: format!("entry {}", i),
                marker: None,
            });
        }
        report
    }

    #[test]
    fn test_lenient_passes_warnings() {
        let r = report(&[Severity::Warning]);
        assert!(Policy::Lenient.check(r).is_ok());
    }

    #[test]
    fn test_strict_rejects_warnings() {
        let r = report(&[Severity::Warning]);
        assert!(Policy::Strict.check(r).is_err());
    }

    #[test]
    fn test_errors_always_rejected() {
        let r = report(&[Severity::Error]);
        assert!(Policy::Lenient.rejects(&r));
        assert!(Policy::Strict.rejects(&r));
    }

    #[test]
    fn test_empty_report_passes_both() {
        let r = Report::new();
        assert!(!Policy::Strict.rejects(&r));
        assert!(!Policy::Lenient.rejects(&r));
    }

    #[test]
    fn test_merge_keeps_order() {
        let mut first = report(&[Severity::Warning]);
        let mut second = Report::new();
        second.push(Entry {
            severity: Severity::Error,
            message: "later".into(),
            marker: None,
        });
        first.merge(second);
        let messages: Vec<_> = first.entries().iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["entry 0", "later"]);
        assert!(first.is_fatal());
    }

    #[test]
    fn test_marker_is_one_based() {
        let source = "a: 1\n  bad: 2\n";
        let marker = Marker::locate(source, 7..10);
        assert_eq!(marker.line, 2);
        assert_eq!(marker.column, 3);
    }

    #[test]
    fn test_display_matches_transpiler_format() {
        let mut r = Report::new();
        r.warn("a:\n  b: 1\n", 5..6, "permissions unset, defaulting to 0644");
        r.push(Entry {
            severity: Severity::Error,
            message: "no marker".into(),
            marker: None,
        });
        insta::assert_snapshot!(r.to_string(), @r###"
        warning at line 2, column 3
        permissions unset, defaulting to 0644
        error: no marker
        "###);
    }
}
