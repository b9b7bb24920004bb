//! Packet-dump text decoding.
//!
//! Follows the same layering as a byte-level protocol decoder:
//! - `layout`: line grammar (patterns and literal tokens, source of truth)
//! - `reader`: line classification into header / data / unrecognized
//! - `parser`: field extraction for classified lines (no pattern knowledge)
//! - `error`: explicit, actionable errors
//!
//! Everything here is pure; lines come from `source` and state lives in
//! `assembly`.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use error::DumpError;
pub use parser::{parse_data, parse_header, split_address};
pub use reader::{LineKind, classify_line};
