//! Synchronous Ed API connection utilities with proper error handling.

use crate::links::LinkBuilder;
use crate::{
    CLIENT_REQUEST_TIMEOUT_SECS, CLIENT_VERSION, RemoteUser, Submission, SubmissionsResponse,
    UsersResponse,
};
use anyhow::{Context, Result, anyhow};
use log::{debug, warn};
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Deserializer};
use std::{thread, time::Duration};

/// The two lookups the report needs from the platform.
pub trait SubmissionSource {
    /// Fetch the challenge directory.
    ///
    /// # Errors
    /// Returns an error if the directory could not be retrieved.
    fn fetch_users(&self) -> Result<Vec<RemoteUser>>;

    /// Fetch every submission a user has made to the challenge.
    ///
    /// # Errors
    /// Returns an error if the submissions could not be retrieved.
    fn fetch_submissions(&self, user_id: u64) -> Result<Vec<Submission>>;
}

/// Deserialize a JSON `null` as the type's default value.
///
/// # Errors
/// Returns an error if the value is neither `null` nor a valid `T`.
pub fn deserialize_null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Helper function to determine if an error is retry-able
/// - `is_timeout()` catches typical network timeouts
/// - `is_connect()` catches typical connection failures
fn is_retryable_error(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}

/// Helper function to classify reqwest error types
fn error_type_str(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection"
    } else if e.is_request() {
        "request/DNS"
    } else if e.is_body() {
        "body"
    } else if e.is_decode() {
        "decode"
    } else {
        "unknown"
    }
}

/// Generic retry logic for HTTP requests with exponential backoff.
/// Handles both network errors and 5xx server errors.
/// A `max_retries` of 1 means a single attempt.
fn retry_request<F, P, T>(request_fn: F, process_response: P, max_retries: u32) -> Result<T>
where
    F: Fn() -> Result<Response, reqwest::Error>,
    P: Fn(Response) -> Result<T>,
{
    let max_retries = max_retries.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;

        match request_fn() {
            Ok(response) => {
                if response.status().is_server_error() && attempts < max_retries {
                    let sleep_secs = 2_u64.pow(attempts.saturating_sub(1));
                    let status = response.status();
                    warn!(
                        "Server error ({status}), retrying in {sleep_secs} seconds... (attempt {attempts}/{max_retries})"
                    );
                    thread::sleep(Duration::from_secs(sleep_secs));
                    continue;
                }

                return process_response(response);
            }
            Err(e) => {
                if is_retryable_error(&e) && attempts < max_retries {
                    let sleep_secs = 2_u64.pow(attempts.saturating_sub(1));
                    warn!(
                        "Network error ({}), retrying in {} seconds... (attempt {}/{}): {}",
                        error_type_str(&e),
                        sleep_secs,
                        attempts,
                        max_retries,
                        e
                    );
                    thread::sleep(Duration::from_secs(sleep_secs));
                    continue;
                }
                return Err(anyhow!(
                    "Network error ({}) after {attempts} attempts: {e}",
                    error_type_str(&e)
                ));
            }
        }
    }
}

/// Blocking client for the Ed challenge API, authenticated with a bearer token.
#[derive(Clone)]
pub struct EdApiClient {
    client: Client,
    auth_token: String,
    links: LinkBuilder,
    max_retries: u32,
}

impl EdApiClient {
    /// Build a client with the default request timeout and a single attempt per request.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(auth_token: &str, links: LinkBuilder) -> Result<Self> {
        Self::with_options(
            auth_token,
            links,
            Duration::from_secs(CLIENT_REQUEST_TIMEOUT_SECS),
            1,
        )
    }

    /// Build a client with an explicit timeout and retry budget.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_options(
        auth_token: &str,
        links: LinkBuilder,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("edlinks/{CLIENT_VERSION}"))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            auth_token: auth_token.to_string(),
            links,
            max_retries,
        })
    }

    #[must_use]
    pub fn links(&self) -> &LinkBuilder {
        &self.links
    }

    fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        debug!("GET {url}");
        self.client
            .get(url)
            .bearer_auth(&self.auth_token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
    }
}

/// Turn a non-success status into an error carrying the status code.
fn check_status(response: Response, what: &str) -> Result<Response> {
    if !response.status().is_success() {
        let status = response.status();
        return Err(anyhow!(
            "Failed to fetch {what}. Status code: {}",
            status.as_u16()
        ));
    }
    Ok(response)
}

impl SubmissionSource for EdApiClient {
    fn fetch_users(&self) -> Result<Vec<RemoteUser>> {
        let url = self.links.users_url();

        retry_request(
            || self.get(&url),
            |response| {
                check_status(response, "users")?
                    .json::<UsersResponse>()
                    .map(|body| body.users)
                    .context("Failed to deserialize users response")
            },
            self.max_retries,
        )
    }

    fn fetch_submissions(&self, user_id: u64) -> Result<Vec<Submission>> {
        let url = self.links.submissions_url(user_id);
        let what = format!("submissions for student ID {user_id}");

        retry_request(
            || self.get(&url),
            |response| {
                check_status(response, &what)?
                    .json::<SubmissionsResponse>()
                    .map(|body| body.submissions)
                    .with_context(|| format!("Failed to deserialize {what}"))
            },
            self.max_retries,
        )
    }
}
