use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

use crate::dump::DumpError;
use crate::source::{LineSource, SourceError, ToolConfig, ToolLineSource};
use crate::{InputInfo, PacketRecord, REPORT_VERSION, Report, TOOL_NAME, ToolInfo};

mod packets;
mod summary;

pub use packets::{MalformedHeaderPolicy, PacketAssembler, ParseOptions, assemble_lines};

use summary::build_capture_summary;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no path provided")]
    NoPathProvided,
    #[error("source error: {0}")]
    Source(#[from] SourceError),
    #[error("dump error: {0}")]
    Dump(#[from] DumpError),
}

/// Pick the capture path out of the positional arguments (the first one).
///
/// # Examples
/// ```
/// use tapdump_core::{PipelineError, resolve_path};
///
/// let path = resolve_path(&["capture.pcap", "ignored.pcap"])?;
/// assert_eq!(path.to_str(), Some("capture.pcap"));
/// assert!(matches!(resolve_path::<&str>(&[]), Err(PipelineError::NoPathProvided)));
/// # Ok::<(), PipelineError>(())
/// ```
pub fn resolve_path<S: AsRef<Path>>(args: &[S]) -> Result<PathBuf, PipelineError> {
    args.first()
        .map(|arg| arg.as_ref().to_path_buf())
        .ok_or(PipelineError::NoPathProvided)
}

/// Run the dump tool on a capture file and assemble its packet records.
pub fn parse_capture_file(path: &Path, tool: &ToolConfig) -> Result<Vec<PacketRecord>, PipelineError> {
    let source = ToolLineSource::run(tool, path)?;
    parse_source(source, &ParseOptions::default())
}

/// Assemble packet records from any line source.
///
/// Either every record is returned or a single error; records assembled
/// before a failure are dropped.
pub fn parse_source<S: LineSource>(
    mut source: S,
    options: &ParseOptions,
) -> Result<Vec<PacketRecord>, PipelineError> {
    let mut assembler = PacketAssembler::new(options.malformed_headers);
    let mut packets = Vec::new();
    let mut lines = 0u64;

    while let Some(line) = source.next_line()? {
        lines += 1;
        if let Some(record) = assembler.push_line(&line)? {
            packets.push(record);
        }
    }
    packets.extend(assembler.finish());

    debug!("{lines} lines read");
    info!("assembled {} packets", packets.len());
    Ok(packets)
}

/// Wrap parsed records with tool/input metadata and a capture summary.
pub fn build_report(input_path: &str, tool: &ToolConfig, packets: Vec<PacketRecord>) -> Report {
    Report {
        report_version: REPORT_VERSION,
        tool: ToolInfo {
            name: TOOL_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            dump_tool: tool.program_name().to_string(),
        },
        input: InputInfo {
            path: input_path.to_string(),
        },
        capture_summary: build_capture_summary(&packets),
        packets,
    }
}
