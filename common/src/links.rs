//! Build API endpoints and review links for a challenge slide.

use crate::CourseLocation;

/// Endpoint and link templates for one challenge slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkBuilder {
    api_base: String,
    web_base: String,
    location: CourseLocation,
}

impl LinkBuilder {
    #[must_use]
    pub fn new(api_base: &str, web_base: &str, location: CourseLocation) -> Self {
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            web_base: web_base.trim_end_matches('/').to_string(),
            location,
        }
    }

    #[must_use]
    pub fn users_url(&self) -> String {
        format!(
            "{}/challenges/{}/users",
            self.api_base, self.location.challenge_id
        )
    }

    #[must_use]
    pub fn submissions_url(&self, user_id: u64) -> String {
        format!(
            "{}/users/{user_id}/challenges/{}/submissions",
            self.api_base, self.location.challenge_id
        )
    }

    fn slide_submissions_base(&self) -> String {
        let CourseLocation {
            course_id,
            lesson_id,
            slide_id,
            ..
        } = self.location;
        format!(
            "{}/courses/{course_id}/lessons/{lesson_id}/slides/{slide_id}/submissions",
            self.web_base
        )
    }

    /// Link to a specific submission in the review view.
    #[must_use]
    pub fn submission_link(&self, user_id: u64, submission_id: u64) -> String {
        format!(
            "{}?u={user_id}&s={submission_id}",
            self.slide_submissions_base()
        )
    }

    /// Search link used when a roster email has no directory entry.
    #[must_use]
    pub fn missing_email_link(&self, first_name: &str, last_name: &str) -> String {
        let query = urlencoding::encode(&format!("{first_name} {last_name}")).into_owned();
        format!("{}?q={query}", self.slide_submissions_base())
    }
}

impl Default for LinkBuilder {
    fn default() -> Self {
        Self::new(
            crate::DEFAULT_API_BASE,
            crate::DEFAULT_WEB_BASE,
            CourseLocation::default(),
        )
    }
}
