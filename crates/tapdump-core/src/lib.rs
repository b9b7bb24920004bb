//! tapdump core library for turning packet-dump text into packet records.
//!
//! This crate implements the parsing pipeline used by the CLI: line sources
//! (the dump tool run against a capture file, or saved dump text) feed the
//! assembly layer, which classifies every line, decodes headers and hex
//! payload lines (layout/reader/parser) and stitches them into ordered
//! packet records. Parsing is line-oriented and side-effect free; all I/O is
//! isolated in `source` modules.
//!
//! Invariants:
//! - Records are emitted in the order their header lines appear.
//! - A record's `data` is the in-order concatenation of the hex fragments
//!   between its header and the next one; nothing crosses packets.
//! - At most one record is open at any time and it is only exposed once
//!   finalized.
//!
//! # Examples
//! ```no_run
//! use std::path::Path;
//!
//! use tapdump_core::{ToolConfig, parse_capture_file};
//!
//! let packets = parse_capture_file(Path::new("capture.pcap"), &ToolConfig::default())?;
//! println!("packets: {}", packets.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use serde::{Deserialize, Serialize};

mod assembly;
mod dump;
pub mod job;
pub mod notify;
mod source;

pub use assembly::{
    MalformedHeaderPolicy, PacketAssembler, ParseOptions, PipelineError, assemble_lines,
    build_report, parse_capture_file, parse_source, resolve_path,
};
pub use dump::{DumpError, LineKind, classify_line, parse_data, parse_header, split_address};
pub use source::{LineSource, SourceError, TextLineSource, ToolConfig, ToolLineSource};

/// Current report schema version.
pub const REPORT_VERSION: u32 = 1;
/// Name the library reports itself under.
pub const TOOL_NAME: &str = "tapdump";

/// Metadata extracted from a single header line.
///
/// `src_port`/`dest_port` are present only when the corresponding address
/// token carried a trailing port segment; `length` is 0 when the header has
/// no `length N` clause.
///
/// # Examples
/// ```
/// use tapdump_core::parse_header;
///
/// let header = parse_header("2015-05-20 12:41:45.812393 IP 10.0.0.1.80 > 10.0.0.2.5000: UDP, length 48")?;
/// assert_eq!(header.src_ip, "10.0.0.1");
/// assert_eq!(header.src_port.as_deref(), Some("80"));
/// assert_eq!(header.length, 48);
/// # Ok::<(), tapdump_core::DumpError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderFields {
    /// Capture date (`YYYY-MM-DD`).
    pub date: String,
    /// Capture time of day with fractional seconds.
    pub time: String,
    /// The full original header line.
    pub raw_header: String,
    /// Link/network type word (e.g. `IP`, `IP6`).
    pub ethernet_type: String,
    /// Source address with any port segment removed.
    pub src_ip: String,
    /// Destination address with any port segment removed.
    pub dest_ip: String,
    /// Source port, when the source token carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_port: Option<String>,
    /// Destination port, when the destination token carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest_port: Option<String>,
    /// Protocol text between the addresses and the length clause, verbatim.
    pub protocol: String,
    /// Value of the `length N` clause, 0 when absent.
    #[serde(default)]
    pub length: u64,
}

/// A header plus the concatenated hex payload of its data lines.
///
/// Serializes as one flat object: the header fields and `data` side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketRecord {
    #[serde(flatten)]
    pub header: HeaderFields,
    /// Lower-case hex digits without separators (possibly empty).
    pub data: String,
}

impl PacketRecord {
    /// Open a record for `header` with no payload yet.
    pub fn new(header: HeaderFields) -> Self {
        Self {
            header,
            data: String::new(),
        }
    }
}

/// Parse report wrapping the records with tool and input metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Report schema version (not the binary version).
    pub report_version: u32,
    /// Tool identification metadata.
    pub tool: ToolInfo,
    /// Input capture metadata.
    pub input: InputInfo,
    /// Capture summary derived from the parsed records.
    pub capture_summary: CaptureSummary,
    /// Packet records in header order.
    pub packets: Vec<PacketRecord>,
}

/// Tool metadata embedded in reports.
///
/// # Examples
/// ```
/// use tapdump_core::ToolInfo;
///
/// let tool = ToolInfo {
///     name: "tapdump".to_string(),
///     version: "0.1.0".to_string(),
///     dump_tool: "tcpdump".to_string(),
/// };
/// assert_eq!(tool.name, "tapdump");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name (e.g., "tapdump").
    pub name: String,
    /// Tool version (semver).
    pub version: String,
    /// Program that produced the dump text.
    pub dump_tool: String,
}

/// Input metadata embedded in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputInfo {
    /// Input path as provided to the parser.
    pub path: String,
}

/// Capture summary (timestamps may be absent).
///
/// # Examples
/// ```
/// use tapdump_core::CaptureSummary;
///
/// let summary = CaptureSummary {
///     packets_total: 10,
///     time_start: None,
///     time_end: None,
/// };
/// assert_eq!(summary.packets_total, 10);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSummary {
    /// Number of packet records.
    pub packets_total: u64,
    /// RFC3339 timestamp of the first packet (if parseable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC3339 timestamp of the last packet (if parseable).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
}
