//! A library for matching a course roster against Ed challenge submissions.

pub mod client_api;
pub mod links;
pub mod report;
pub mod roster;
pub mod timestamps;

use client_api::deserialize_null_to_default;
use serde::Deserialize;

pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CLIENT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_API_BASE: &str = "https://edstem.org/api";
pub const DEFAULT_WEB_BASE: &str = "https://edstem.org/au";
pub const DEFAULT_ROSTER_FILE: &str = "students.txt";
pub const DEFAULT_CHALLENGE_ID: u64 = 134_120;
pub const DEFAULT_COURSE_ID: u64 = 18_651;
pub const DEFAULT_LESSON_ID: u64 = 61_238;
pub const DEFAULT_SLIDE_ID: u64 = 414_786;
pub const DEFAULT_DELAY_MS: u64 = 200;

/// One line of the roster file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub first_name: String,
    pub last_name: String,
    /// Trimmed and lower-cased, used as the join key against the directory.
    pub email: String,
}

/// A user in the challenge directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteUser {
    #[serde(default, deserialize_with = "deserialize_null_to_default")]
    pub email: String,
    pub id: u64,
}

/// A single submission for a challenge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Submission {
    pub id: u64,
    /// Raw ISO-8601 string as returned by the API. Parsed during selection.
    /// A missing or `null` value decodes as empty and is skipped there.
    #[serde(default, deserialize_with = "deserialize_null_to_default")]
    pub created_at: String,
}

/// Body of the users-by-challenge endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<RemoteUser>,
}

/// Body of the submissions-by-user-and-challenge endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SubmissionsResponse {
    #[serde(default)]
    pub submissions: Vec<Submission>,
}

/// Fixed identifiers locating the challenge slide on the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseLocation {
    pub challenge_id: u64,
    pub course_id: u64,
    pub lesson_id: u64,
    pub slide_id: u64,
}

impl Default for CourseLocation {
    fn default() -> Self {
        Self {
            challenge_id: DEFAULT_CHALLENGE_ID,
            course_id: DEFAULT_COURSE_ID,
            lesson_id: DEFAULT_LESSON_ID,
            slide_id: DEFAULT_SLIDE_ID,
        }
    }
}
