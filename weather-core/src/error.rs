use reqwest::StatusCode;
use thiserror::Error;

/// The one failure kind for calls to a third-party service.
///
/// Callers are not expected to branch on the variant: the views treat every
/// `UpstreamError` the same way (log it, show no data). The variants exist so
/// the log line says what went wrong.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} request failed with status {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("{service} returned malformed data: {reason}")]
    Malformed {
        service: &'static str,
        reason: String,
    },
}

impl UpstreamError {
    pub(crate) fn malformed(service: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            service,
            reason: reason.into(),
        }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
