//! Match roster entries against the directory and report each student's latest submission.

use crate::client_api::SubmissionSource;
use crate::links::LinkBuilder;
use crate::timestamps::parse_timestamp;
use crate::{RemoteUser, StudentRecord, Submission};
use anyhow::{Result, bail};
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use log::{debug, error, warn};
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::thread;
use std::time::Duration;

/// Options for a single report run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Pause after each per-student submission fetch.
    pub delay: Duration,
    /// Only submissions created at or before this instant count.
    pub cutoff: Option<DateTime<Utc>>,
    /// Reference time printed in "no submissions" notices.
    pub as_of: NaiveDateTime,
}

/// The outcome for one roster entry. `Display` renders the output line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    Submission {
        user_id: u64,
        submission_id: u64,
        url: String,
    },
    MissingEmail {
        url: String,
    },
    NoSubmissions {
        as_of: NaiveDateTime,
    },
    Late,
}

impl fmt::Display for ReportLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportLine::Submission { url, .. } | ReportLine::MissingEmail { url } => {
                write!(f, "{url}")
            }
            ReportLine::NoSubmissions { as_of } => {
                // Microseconds are shown only when non-zero
                let layout = if as_of.nanosecond() == 0 {
                    "%Y-%m-%d %H:%M:%S"
                } else {
                    "%Y-%m-%d %H:%M:%S%.6f"
                };
                write!(f, "No submissions found, as of {}", as_of.format(layout))
            }
            ReportLine::Late => write!(f, "LATE - No valid submissions before cutoff datetime"),
        }
    }
}

/// Counts of each outcome over a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub submissions: usize,
    pub missing_email: usize,
    pub no_submissions: usize,
    pub late: usize,
}

impl ReportSummary {
    fn record(&mut self, line: &ReportLine) {
        match line {
            ReportLine::Submission { .. } => self.submissions += 1,
            ReportLine::MissingEmail { .. } => self.missing_email += 1,
            ReportLine::NoSubmissions { .. } => self.no_submissions += 1,
            ReportLine::Late => self.late += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.submissions + self.missing_email + self.no_submissions + self.late
    }
}

/// Map each directory email to its user id. Later duplicates win.
#[must_use]
pub fn build_directory(users: &[RemoteUser]) -> HashMap<String, u64> {
    users
        .iter()
        .filter(|user| !user.email.is_empty())
        .map(|user| (user.email.clone(), user.id))
        .collect()
}

/// Select the submission with the latest `created_at`, ignoring any after the cutoff.
/// Submissions with unparseable timestamps are skipped.
/// Ties go to the one appearing last.
#[must_use]
pub fn select_latest_submission<'a>(
    submissions: &'a [Submission],
    cutoff: Option<DateTime<Utc>>,
) -> Option<&'a Submission> {
    submissions
        .iter()
        .filter_map(|sub| match parse_timestamp(&sub.created_at) {
            Ok(created_at) => Some((created_at, sub)),
            Err(e) => {
                warn!("Ignoring submission #{}: {e}", sub.id);
                None
            }
        })
        .filter(|(created_at, _)| cutoff.is_none_or(|cutoff| *created_at <= cutoff))
        .max_by_key(|(created_at, _)| *created_at)
        .map(|(_, sub)| sub)
}

/// Resolve one roster entry, fetching submissions if the student is in the directory.
pub fn resolve_student<S: SubmissionSource>(
    source: &S,
    links: &LinkBuilder,
    directory: &HashMap<String, u64>,
    student: &StudentRecord,
    config: &RunConfig,
) -> ReportLine {
    let Some(&user_id) = directory.get(&student.email) else {
        debug!(
            "{} not in directory, falling back to name search",
            student.email
        );
        return ReportLine::MissingEmail {
            url: links.missing_email_link(&student.first_name, &student.last_name),
        };
    };

    let submissions = source.fetch_submissions(user_id).unwrap_or_else(|e| {
        error!("{e:#}");
        Vec::new()
    });
    if !config.delay.is_zero() {
        thread::sleep(config.delay);
    }

    if submissions.is_empty() {
        return ReportLine::NoSubmissions {
            as_of: config.as_of,
        };
    }

    match select_latest_submission(&submissions, config.cutoff) {
        Some(latest) => ReportLine::Submission {
            user_id,
            submission_id: latest.id,
            url: links.submission_link(user_id, latest.id),
        },
        None => ReportLine::Late,
    }
}

/// Fetch the directory, then write one line per student to `out` in roster order.
///
/// # Errors
/// Returns an error if the roster is empty, if no users could be fetched,
/// or if writing to `out` fails.
pub fn generate_report<S: SubmissionSource, W: Write>(
    source: &S,
    links: &LinkBuilder,
    students: &[StudentRecord],
    config: &RunConfig,
    out: &mut W,
) -> Result<ReportSummary> {
    if students.is_empty() {
        bail!("No student data found. Exiting.");
    }

    let users = source.fetch_users().unwrap_or_else(|e| {
        error!("{e:#}");
        Vec::new()
    });
    if users.is_empty() {
        bail!("No users fetched from API. Exiting.");
    }
    let directory = build_directory(&users);
    debug!(
        "Directory has {} users, roster has {} students",
        directory.len(),
        students.len()
    );

    let mut summary = ReportSummary::default();
    for student in students {
        let line = resolve_student(source, links, &directory, student, config);
        writeln!(out, "{line}")?;
        summary.record(&line);
    }
    out.flush()?;

    Ok(summary)
}
