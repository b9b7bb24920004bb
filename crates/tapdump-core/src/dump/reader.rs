use std::ops::Range;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::layout;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(layout::HEADER_PATTERN).expect("header pattern compiles"));
static DATA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(layout::DATA_PATTERN).expect("data pattern compiles"));
static LENGTH_CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(layout::LENGTH_CLAUSE_PATTERN).expect("length clause pattern compiles")
});
static TIMESTAMP_PREFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(layout::TIMESTAMP_PREFIX_PATTERN).expect("timestamp pattern compiles")
});

/// Classification of a single dump line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Per-packet summary line.
    Header(&'a str),
    /// Hex payload line belonging to the most recent header.
    Data(&'a str),
    /// Anything else (tool banners, continuation lines, ARP summaries...).
    Unrecognized(&'a str),
}

/// Classify one line without look-ahead.
///
/// # Examples
/// ```
/// use tapdump_core::{LineKind, classify_line};
///
/// let line = "\t0x0080:  e04b 2935";
/// assert_eq!(classify_line(line), LineKind::Data(line));
/// assert!(matches!(classify_line("reading from file x.pcap"), LineKind::Unrecognized(_)));
/// ```
pub fn classify_line(line: &str) -> LineKind<'_> {
    if DATA_RE.is_match(line) {
        LineKind::Data(line)
    } else if HEADER_RE.is_match(line) {
        LineKind::Header(line)
    } else {
        LineKind::Unrecognized(line)
    }
}

/// Header grammar captures, `None` when the line is not a header.
pub(crate) fn header_captures(line: &str) -> Option<Captures<'_>> {
    HEADER_RE.captures(line)
}

/// Payload portion of a data line (after the offset label and two spaces).
pub(crate) fn data_payload(line: &str) -> Option<&str> {
    DATA_RE
        .captures(line)
        .and_then(|caps| caps.name("payload"))
        .map(|m| m.as_str())
}

/// Byte range and value of the last `length N` clause in `text`.
pub(crate) fn length_clause(text: &str) -> Option<(Range<usize>, u64)> {
    LENGTH_CLAUSE_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let clause = caps.get(0)?;
            let value = caps.name("value")?.as_str().parse::<u64>().ok()?;
            Some((clause.range(), value))
        })
        .last()
}

/// Whether a line starts like a header (timestamp) regardless of the rest.
pub(crate) fn looks_like_header(line: &str) -> bool {
    TIMESTAMP_PREFIX_RE.is_match(line)
}
