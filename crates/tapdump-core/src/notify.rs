//! Completion message announced downstream once a capture has been written.
//!
//! Only the envelope lives here; delivering it to a queue is the job of
//! whatever publishes it.

use serde::{Deserialize, Serialize};

use crate::source::ToolConfig;

/// Message type used for capture completion.
pub const METADATA_TYPE: &str = "metadata";
/// File type announced for stripped capture files.
pub const DEFAULT_FILE_TYPE: &str = "pcap_strip";

/// Envelope published when a capture file is complete.
///
/// # Examples
/// ```
/// use tapdump_core::ToolConfig;
/// use tapdump_core::notify::{CompletionMessage, ToolResults};
///
/// let message = CompletionMessage::metadata(
///     "job-1",
///     "/files/trace.pcap",
///     "pcap_strip",
///     ToolResults::from(&ToolConfig::default()),
/// );
/// let value = serde_json::to_value(&message)?;
/// assert_eq!(value["type"], "metadata");
/// assert_eq!(value["data"], "");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub message_type: String,
    pub file_path: String,
    pub data: String,
    pub file_type: String,
    pub results: ToolResults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResults {
    pub tool: String,
    pub version: String,
}

impl From<&ToolConfig> for ToolResults {
    fn from(config: &ToolConfig) -> Self {
        Self {
            tool: config.program_name().to_string(),
            version: config.version.clone(),
        }
    }
}

impl CompletionMessage {
    /// Metadata envelope with an empty payload.
    pub fn metadata(
        id: impl Into<String>,
        file_path: impl Into<String>,
        file_type: impl Into<String>,
        results: ToolResults,
    ) -> Self {
        Self {
            id: id.into(),
            message_type: METADATA_TYPE.to_string(),
            file_path: file_path.into(),
            data: String::new(),
            file_type: file_type.into(),
            results,
        }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{CompletionMessage, DEFAULT_FILE_TYPE, ToolResults};
    use crate::source::ToolConfig;

    fn message() -> CompletionMessage {
        CompletionMessage::metadata(
            "abc",
            "/files/trace_abc.pcap",
            DEFAULT_FILE_TYPE,
            ToolResults {
                tool: "ncapture".to_string(),
                version: "0.11.0".to_string(),
            },
        )
    }

    #[test]
    fn serializes_wire_field_names() {
        let value = serde_json::to_value(message()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "id": "abc",
                "type": "metadata",
                "file_path": "/files/trace_abc.pcap",
                "data": "",
                "file_type": "pcap_strip",
                "results": {"tool": "ncapture", "version": "0.11.0"},
            })
        );
    }

    #[test]
    fn with_data_replaces_payload() {
        let message = message().with_data("[]");
        assert_eq!(message.data, "[]");
        assert_eq!(message.message_type, "metadata");
    }

    #[test]
    fn results_from_tool_config() {
        let config = ToolConfig {
            program: "/usr/bin/tcpdump".to_string(),
            args: Vec::new(),
            version: "4.9.3".to_string(),
        };
        let results = ToolResults::from(&config);
        assert_eq!(results.tool, "tcpdump");
        assert_eq!(results.version, "4.9.3");
    }

    #[test]
    fn parses_published_message() {
        let json = serde_json::to_string(&message()).unwrap();
        let parsed: CompletionMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, message());
    }
}
