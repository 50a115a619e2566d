//! Console and JSON reporting
//!
//! Per-file rows under a bold path line: dimmed stdlib/local rows when
//! verbose, a cyan dependency row, and a colored outcome row, with a
//! one-line batch summary at the end. `--json` swaps all of it for a
//! machine-readable array.

use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::error::Error;
use crate::process::{FileReport, Outcome};

/// Writes per-file rows and the batch summary to stdout.
pub struct Reporter {
    use_color: bool,
    verbose: bool,
}

impl Reporter {
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    fn stream(&self) -> StandardStream {
        let choice = if self.use_color {
            ColorChoice::Auto
        } else {
            ColorChoice::Never
        };
        StandardStream::stdout(choice)
    }

    fn row(
        &self,
        out: &mut StandardStream,
        color: Option<Color>,
        dim: bool,
        label: &str,
        value: &str,
    ) -> io::Result<()> {
        let mut spec = ColorSpec::new();
        spec.set_fg(color).set_dimmed(dim);
        write!(out, "  ")?;
        out.set_color(&spec)?;
        write!(out, "{label:<8}")?;
        out.reset()?;
        if dim {
            let mut value_spec = ColorSpec::new();
            value_spec.set_dimmed(true);
            out.set_color(&value_spec)?;
            writeln!(out, " {value}")?;
            out.reset()
        } else {
            writeln!(out, " {value}")
        }
    }

    /// Bold header line naming the file being processed.
    pub fn file_header(&self, path: &Path) -> io::Result<()> {
        let mut out = self.stream();
        let mut bold = ColorSpec::new();
        bold.set_bold(true);
        out.set_color(&bold)?;
        writeln!(out, "{}", path.display())?;
        out.reset()
    }

    /// Rows for one successfully processed file.
    pub fn report(&self, report: &FileReport) -> io::Result<()> {
        let mut out = self.stream();

        if self.verbose {
            if !report.modules.stdlib.is_empty() {
                self.row(
                    &mut out,
                    None,
                    true,
                    "stdlib",
                    &report.modules.stdlib.join(", "),
                )?;
            }
            if !report.modules.local.is_empty() {
                self.row(
                    &mut out,
                    None,
                    true,
                    "local",
                    &report.modules.local.join(", "),
                )?;
            }
        }

        if report.modules.third_party.is_empty() {
            self.row(&mut out, Some(Color::Cyan), false, "deps", "none")?;
        } else {
            self.row(
                &mut out,
                Some(Color::Cyan),
                false,
                "deps",
                &report.modules.third_party.join(", "),
            )?;
        }

        match report.outcome {
            Outcome::Written => self.row(
                &mut out,
                Some(Color::Green),
                false,
                "updated",
                "metadata block written",
            ),
            Outcome::Unchanged => self.row(&mut out, None, true, "skip", "already up-to-date"),
            Outcome::Reported => self.row(
                &mut out,
                Some(Color::Yellow),
                false,
                "dry-run",
                "would update metadata block",
            ),
        }
    }

    /// Row for a skipped path (missing, not a script).
    pub fn warn(&self, reason: &str) -> io::Result<()> {
        let mut out = self.stream();
        self.row(
            &mut out,
            Some(Color::Yellow),
            false,
            "warn",
            &format!("{reason}, skipping"),
        )
    }

    /// Row for a failed file.
    pub fn failure(&self, err: &Error) -> io::Result<()> {
        let mut out = self.stream();
        self.row(
            &mut out,
            Some(Color::Red),
            false,
            err.kind(),
            &err.to_string(),
        )
    }

    /// Batch summary: `done  2 updated · 1 unchanged · 1 failed`.
    pub fn summary(&self, tally: &Tally) -> io::Result<()> {
        let mut out = self.stream();
        let mut bold = ColorSpec::new();
        bold.set_bold(true);
        writeln!(out)?;
        out.set_color(&bold)?;
        write!(out, "done")?;
        out.reset()?;
        writeln!(out, "  {}", tally.describe())
    }
}

/// Batch counters for the summary line and the exit status.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Tally {
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            // A dry run that would write counts as updated in the summary.
            Outcome::Written | Outcome::Reported => self.updated += 1,
            Outcome::Unchanged => self.unchanged += 1,
        }
    }

    fn describe(&self) -> String {
        let mut parts = vec![format!("{} updated", self.updated)];
        if self.unchanged > 0 {
            parts.push(format!("{} unchanged", self.unchanged));
        }
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        parts.join(" · ")
    }
}

/// One element of the `--json` report.
#[derive(Debug, Serialize)]
pub struct JsonEntry {
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stdlib: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub local: Vec<String>,
    pub dependencies: Vec<String>,
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JsonEntry {
    pub fn from_report(report: &FileReport) -> Self {
        Self {
            path: report.path.display().to_string(),
            stdlib: report.modules.stdlib.clone(),
            local: report.modules.local.clone(),
            dependencies: report.modules.third_party.clone(),
            outcome: report.outcome.as_str(),
            error: None,
        }
    }

    pub fn from_error(path: &Path, err: &Error) -> Self {
        Self {
            path: path.display().to_string(),
            stdlib: Vec::new(),
            local: Vec::new(),
            dependencies: Vec::new(),
            outcome: "failed",
            error: Some(format!("{}: {err}", err.kind())),
        }
    }

    pub fn skipped(path: &Path, reason: &str) -> Self {
        Self {
            path: path.display().to_string(),
            stdlib: Vec::new(),
            local: Vec::new(),
            dependencies: Vec::new(),
            outcome: "skipped",
            error: Some(reason.to_string()),
        }
    }
}

/// Print the whole batch as a pretty JSON array.
pub fn print_json(entries: &[JsonEntry]) -> io::Result<()> {
    let json = serde_json::to_string_pretty(entries).map_err(io::Error::other)?;
    println!("{json}");
    Ok(())
}
