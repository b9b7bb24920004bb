use thiserror::Error;

/// Errors returned when validating control-plane requests.
///
/// # Examples
/// ```
/// use tapdump_core::job::JobError;
///
/// let err = JobError::MissingField("nic");
/// assert_eq!(err.to_string(), "payload missing nic");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("malformed payload")]
    MalformedPayload,
    #[error("payload missing {0}")]
    MissingField(&'static str),
}
