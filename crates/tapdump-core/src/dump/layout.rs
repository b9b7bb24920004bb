//! Grammar of the dump tool's text output.
//!
//! Header lines (`-tttt`, numeric addresses):
//! `2015-05-20 12:41:45.812393 IP 10.0.0.1.80 > 10.0.0.2.5000: UDP, length 48`
//!
//! Data lines (`-x`, optionally `-X` with an ASCII column):
//! `\t0x0010:  e04b 2935 564f 91db 5344 5460 9189 33d0`

/// Full header line: date, time, ethertype, two addresses and the rest.
pub const HEADER_PATTERN: &str = r"^(?P<date>\d{4}-\d{2}-\d{2}) (?P<time>\d{2}:\d{2}:\d{2}\.\d+) (?P<ethertype>[A-Za-z0-9_-]+) (?P<src>\S+) > (?P<dst>\S+?): (?P<rest>.*)$";

/// Leading timestamp only; identifies lines that were meant to be headers.
pub const TIMESTAMP_PREFIX_PATTERN: &str = r"^\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}\.\d+ ";

/// Tab, offset label, two spaces, at least one 2-4 digit hex group.
pub const DATA_PATTERN: &str =
    r"^\t0x(?P<offset>[0-9A-Fa-f]+):  (?P<payload>[0-9A-Fa-f]{2,4}(?:\s.*)?)$";

/// `length N` clause inside the text after the second address. The last
/// match wins; tcpdump may print annotations after it.
pub const LENGTH_CLAUSE_PATTERN: &str = r"\blength\s+(?P<value>\d+)\b";

/// Separator between the hex column and the ASCII rendering column.
pub const ASCII_COLUMN_SEPARATOR: &str = "  ";

/// Accepted hex group width in a data line.
pub const HEX_GROUP_LEN: std::ops::RangeInclusive<usize> = 2..=4;
