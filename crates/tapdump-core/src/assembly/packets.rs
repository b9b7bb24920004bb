use log::{debug, trace, warn};

use crate::PacketRecord;
use crate::dump::reader::looks_like_header;
use crate::dump::{DumpError, LineKind, classify_line, parse_data, parse_header};

/// What to do with a line that starts like a header but does not parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedHeaderPolicy {
    /// Log the line and keep going. The open packet is finalized and the
    /// data lines that follow the skipped line are discarded, so they never
    /// end up in the payload of an unrelated packet.
    #[default]
    Skip,
    /// Fail the whole run with `DumpError::MalformedHeaderLine`.
    Abort,
}

/// Knobs for a single parse run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub malformed_headers: MalformedHeaderPolicy,
}

/// Stateful assembly of header and data lines into packet records.
///
/// Holds at most one open record. A header line finalizes the open record
/// (returned from [`push_line`](Self::push_line)) and opens a new one; data
/// lines append to the open record or are dropped when none is open; a
/// skipped malformed header finalizes the open record; anything else is
/// ignored. [`finish`](Self::finish) hands out the last
/// record.
///
/// # Examples
/// ```
/// use tapdump_core::{MalformedHeaderPolicy, PacketAssembler};
///
/// let mut assembler = PacketAssembler::new(MalformedHeaderPolicy::Skip);
/// let header = "2015-05-20 12:41:45.812393 IP 0.0.0.0 > 0.0.0.0: ESP(spi=0x1,seq=0x2), length 0";
/// assert!(assembler.push_line(header)?.is_none());
/// assert!(assembler.push_line("\t0x0000:  e04b 2935")?.is_none());
/// let record = assembler.finish().expect("open record");
/// assert_eq!(record.data, "e04b2935");
/// # Ok::<(), tapdump_core::DumpError>(())
/// ```
#[derive(Debug, Default)]
pub struct PacketAssembler {
    policy: MalformedHeaderPolicy,
    open: Option<PacketRecord>,
}

impl PacketAssembler {
    pub fn new(policy: MalformedHeaderPolicy) -> Self {
        Self { policy, open: None }
    }

    /// Feed the next line; returns the record it finalized, if any.
    ///
    /// # Errors
    /// Returns `DumpError::MalformedHeaderLine` only under
    /// `MalformedHeaderPolicy::Abort`.
    pub fn push_line(&mut self, line: &str) -> Result<Option<PacketRecord>, DumpError> {
        match classify_line(line) {
            LineKind::Header(line) => match parse_header(line) {
                Ok(header) => Ok(self.open.replace(PacketRecord::new(header))),
                Err(err) => self.malformed_header(err),
            },
            LineKind::Data(line) => {
                match self.open.as_mut() {
                    Some(record) => record.data.push_str(&parse_data(line)),
                    None => debug!("data line outside a packet discarded: {line:?}"),
                }
                Ok(None)
            }
            LineKind::Unrecognized(line) => {
                if looks_like_header(line) {
                    return self.malformed_header(DumpError::MalformedHeaderLine {
                        line: line.to_string(),
                    });
                }
                trace!("ignoring line {line:?}");
                Ok(None)
            }
        }
    }

    /// Whether a record is currently open.
    pub fn in_packet(&self) -> bool {
        self.open.is_some()
    }

    /// End of input: hand out the open record, if any.
    pub fn finish(self) -> Option<PacketRecord> {
        self.open
    }

    fn malformed_header(&mut self, err: DumpError) -> Result<Option<PacketRecord>, DumpError> {
        match self.policy {
            MalformedHeaderPolicy::Skip => {
                if self.in_packet() {
                    warn!("skipping {err}, closing the open packet");
                } else {
                    warn!("skipping {err}");
                }
                Ok(self.open.take())
            }
            MalformedHeaderPolicy::Abort => Err(err),
        }
    }
}

/// Assemble every record from an in-memory line sequence.
///
/// # Examples
/// ```
/// use tapdump_core::{ParseOptions, assemble_lines};
///
/// let lines = ["\t0x0000:  dead", "not a packet"];
/// let packets = assemble_lines(lines, &ParseOptions::default())?;
/// assert!(packets.is_empty());
/// # Ok::<(), tapdump_core::DumpError>(())
/// ```
pub fn assemble_lines<I, S>(lines: I, options: &ParseOptions) -> Result<Vec<PacketRecord>, DumpError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut assembler = PacketAssembler::new(options.malformed_headers);
    let mut packets = Vec::new();
    for line in lines {
        if let Some(record) = assembler.push_line(line.as_ref())? {
            packets.push(record);
        }
    }
    packets.extend(assembler.finish());
    Ok(packets)
}
