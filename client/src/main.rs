//! A simple CLI that prints review links for each student's latest Ed challenge submission.

#![warn(clippy::all, clippy::pedantic)]

use edlinks_common::client_api::EdApiClient;
use edlinks_common::links::LinkBuilder;
use edlinks_common::report::{RunConfig, generate_report};
use edlinks_common::roster::read_roster_file;
use edlinks_common::timestamps::parse_timestamp;
use edlinks_common::{
    CLIENT_REQUEST_TIMEOUT_SECS, CLIENT_VERSION, CourseLocation, DEFAULT_API_BASE,
    DEFAULT_CHALLENGE_ID, DEFAULT_COURSE_ID, DEFAULT_DELAY_MS, DEFAULT_LESSON_ID,
    DEFAULT_ROSTER_FILE, DEFAULT_SLIDE_ID, DEFAULT_WEB_BASE,
};

use anyhow::Result;
use chrono::{DateTime, Local, Utc};
use clap::Parser;
use log::{debug, info};
use std::io;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Bearer token for the Ed API
    #[arg(long, env = "AUTH_TOKEN", hide_env_values = true)]
    auth_token: String,

    /// Tab-separated roster: first name, last name, placeholder, email
    #[arg(short, long, default_value = DEFAULT_ROSTER_FILE, env = "EDLINKS_ROSTER")]
    roster: PathBuf,

    /// The base API URL to connect to
    #[arg(long, default_value = DEFAULT_API_BASE, env = "EDLINKS_API_BASE")]
    api_base: String,

    /// The base URL used for printed review links
    #[arg(long, default_value = DEFAULT_WEB_BASE, env = "EDLINKS_WEB_BASE")]
    web_base: String,

    /// The challenge to look up users and submissions for
    #[arg(long, default_value_t = DEFAULT_CHALLENGE_ID, env = "EDLINKS_CHALLENGE_ID")]
    challenge_id: u64,

    /// The course containing the challenge slide
    #[arg(long, default_value_t = DEFAULT_COURSE_ID, env = "EDLINKS_COURSE_ID")]
    course_id: u64,

    /// The lesson containing the challenge slide
    #[arg(long, default_value_t = DEFAULT_LESSON_ID, env = "EDLINKS_LESSON_ID")]
    lesson_id: u64,

    /// The challenge slide
    #[arg(long, default_value_t = DEFAULT_SLIDE_ID, env = "EDLINKS_SLIDE_ID")]
    slide_id: u64,

    /// Pause between per-student submission requests, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DELAY_MS, env = "EDLINKS_DELAY_MS")]
    delay_ms: u64,

    /// Ignore submissions created after this ISO-8601 time
    #[arg(long, value_parser = parse_cutoff, env = "EDLINKS_CUTOFF")]
    cutoff: Option<DateTime<Utc>>,

    /// Attempts per request, including the first
    #[arg(long, default_value_t = 1, env = "EDLINKS_MAX_RETRIES")]
    max_retries: u32,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = CLIENT_REQUEST_TIMEOUT_SECS, env = "EDLINKS_TIMEOUT_SECS")]
    timeout_secs: u64,

    /// Show additional output
    #[arg(short, long, env = "EDLINKS_VERBOSE")]
    verbose: bool,
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("auth_token", &"<redacted>")
            .field("roster", &self.roster)
            .field("api_base", &self.api_base)
            .field("web_base", &self.web_base)
            .field("challenge_id", &self.challenge_id)
            .field("course_id", &self.course_id)
            .field("lesson_id", &self.lesson_id)
            .field("slide_id", &self.slide_id)
            .field("delay_ms", &self.delay_ms)
            .field("cutoff", &self.cutoff)
            .field("max_retries", &self.max_retries)
            .field("timeout_secs", &self.timeout_secs)
            .field("verbose", &self.verbose)
            .finish()
    }
}

fn parse_cutoff(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw).map_err(|e| e.to_string())
}

fn run(cli: &Cli) -> Result<()> {
    // Captured before any work so every notice shares the same reference time
    let as_of = Local::now().naive_local();

    let students = read_roster_file(&cli.roster)?;
    info!("Read {} students from {}", students.len(), cli.roster.display());

    let location = CourseLocation {
        challenge_id: cli.challenge_id,
        course_id: cli.course_id,
        lesson_id: cli.lesson_id,
        slide_id: cli.slide_id,
    };
    let links = LinkBuilder::new(&cli.api_base, &cli.web_base, location);
    let client = EdApiClient::with_options(
        &cli.auth_token,
        links,
        Duration::from_secs(cli.timeout_secs),
        cli.max_retries,
    )?;

    let config = RunConfig {
        delay: Duration::from_millis(cli.delay_ms),
        cutoff: cli.cutoff,
        as_of,
    };
    if let Some(cutoff) = config.cutoff {
        info!("Only counting submissions made at or before {cutoff}");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = generate_report(&client, client.links(), &students, &config, &mut out)?;

    info!(
        "Done: {} submission links, {} missing emails, {} without submissions, {} late.",
        summary.submissions, summary.missing_email, summary.no_submissions, summary.late
    );
    Ok(())
}

fn main() {
    // Pick up AUTH_TOKEN and friends from a local .env, if present
    dotenvy::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    // Set up logger, defaulting to debug output with --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    debug!("edlinks v{CLIENT_VERSION}");
    debug!("CLI Inputs: {cli:?}");

    if let Err(e) = run(&cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["edlinks", "--auth-token", "abc"]).unwrap();
        assert_eq!(cli.roster, PathBuf::from("students.txt"));
        assert_eq!(cli.challenge_id, 134_120);
        assert_eq!(cli.slide_id, 414_786);
        assert_eq!(cli.delay_ms, 200);
        assert_eq!(cli.max_retries, 1);
        assert!(cli.cutoff.is_none());
    }

    #[test]
    fn test_cli_cutoff() {
        let cli = Cli::try_parse_from([
            "edlinks",
            "--auth-token",
            "abc",
            "--cutoff",
            "2024-03-01T23:59:00Z",
        ])
        .unwrap();
        assert_eq!(
            cli.cutoff.unwrap().to_rfc3339(),
            "2024-03-01T23:59:00+00:00"
        );
        assert!(
            Cli::try_parse_from(["edlinks", "--auth-token", "abc", "--cutoff", "soon"]).is_err()
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let cli = Cli::try_parse_from(["edlinks", "--auth-token", "very-secret"]).unwrap();
        assert!(!format!("{cli:?}").contains("very-secret"));
    }
}
