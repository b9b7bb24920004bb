mod text;
mod tool;

pub use text::TextLineSource;
pub use tool::{ToolConfig, ToolLineSource};

use thiserror::Error;

/// Ordered producer of raw dump lines.
pub trait LineSource {
    fn next_line(&mut self) -> Result<Option<String>, SourceError>;
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to run {program}: {reason}")]
    ToolInvocationFailed { program: String, reason: String },
}

/// Strip the line terminator (`\n` or `\r\n`) and decode lossily.
pub(crate) fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}
