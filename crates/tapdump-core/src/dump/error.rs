use thiserror::Error;

/// Errors returned by dump line parsing.
///
/// # Examples
/// ```
/// use tapdump_core::DumpError;
///
/// let err = DumpError::MalformedHeaderLine {
///     line: "2015-05-20 12:41:45.812393 ARP, Request".to_string(),
/// };
/// assert!(err.to_string().contains("malformed header line"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DumpError {
    #[error("malformed header line: {line:?}")]
    MalformedHeaderLine { line: String },
}
