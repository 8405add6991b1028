use std::time::SystemTime;

use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::format_system_time;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether a question bank is loaded.
    pub questions_loaded: bool,
    /// RFC 3339 time of the check.
    pub checked_at: String,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(questions_loaded: bool) -> Self {
        Self::with_status("ok", questions_loaded)
    }

    /// Create a health response indicating the store is unreachable.
    pub fn degraded(questions_loaded: bool) -> Self {
        Self::with_status("degraded", questions_loaded)
    }

    fn with_status(status: &str, questions_loaded: bool) -> Self {
        Self {
            status: status.to_string(),
            questions_loaded,
            checked_at: format_system_time(SystemTime::now()),
        }
    }
}
