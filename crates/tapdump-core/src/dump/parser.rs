use std::net::IpAddr;

use log::debug;

use super::error::DumpError;
use super::layout;
use super::reader::{data_payload, header_captures, length_clause};
use crate::HeaderFields;

/// Parse a header line into its fields.
///
/// # Errors
/// Returns `DumpError::MalformedHeaderLine` when the line does not follow the
/// header grammar (e.g. no `>` separator or no `:` after the second address).
///
/// # Examples
/// ```
/// use tapdump_core::parse_header;
///
/// let header = parse_header(
///     "2015-05-20 12:41:45.812393 IP 0.0.0.0 > 0.0.0.0: ESP(spi=0xb1ced15c,seq=0x30), length 184",
/// )?;
/// assert_eq!(header.protocol, "ESP(spi=0xb1ced15c,seq=0x30),");
/// assert_eq!(header.length, 184);
/// assert!(header.src_port.is_none());
/// # Ok::<(), tapdump_core::DumpError>(())
/// ```
pub fn parse_header(line: &str) -> Result<HeaderFields, DumpError> {
    let caps = header_captures(line).ok_or_else(|| DumpError::MalformedHeaderLine {
        line: line.to_string(),
    })?;
    let field = |name: &str| caps.name(name).map(|m| m.as_str()).unwrap_or_default();

    let (src_ip, src_port) = split_address(field("src"));
    let (dest_ip, dest_port) = split_address(field("dst"));
    let (protocol, length) = split_length_clause(field("rest"));

    Ok(HeaderFields {
        date: field("date").to_string(),
        time: field("time").to_string(),
        raw_header: line.to_string(),
        ethernet_type: field("ethertype").to_string(),
        src_ip: src_ip.to_string(),
        dest_ip: dest_ip.to_string(),
        src_port: src_port.map(str::to_string),
        dest_port: dest_port.map(str::to_string),
        protocol,
        length,
    })
}

/// Split an address token into address and optional port.
///
/// The last dot-separated segment is a port when it is a decimal `u16` and
/// what is left in front of it is still an address: an IPv4/IPv6 literal, or
/// a host name (dotted, with at least one letter). Otherwise the whole token
/// is the address. The rule is lossy by nature; notable cases:
///
/// | token                | address            | port   |
/// |----------------------|--------------------|--------|
/// | `0.0.0.0`            | `0.0.0.0`          | none   |
/// | `10.0.0.1.80`        | `10.0.0.1`         | `80`   |
/// | `fe80::1.546`        | `fe80::1`          | `546`  |
/// | `fe80::1`            | `fe80::1`          | none   |
/// | `host.example.1234`  | `host.example`     | `1234` |
/// | `host.example.com`   | `host.example.com` | none   |
/// | `10.0.0.1.99999`     | `10.0.0.1.99999`   | none   |
///
/// # Examples
/// ```
/// use tapdump_core::split_address;
///
/// assert_eq!(split_address("10.0.0.1.80"), ("10.0.0.1", Some("80")));
/// assert_eq!(split_address("0.0.0.0"), ("0.0.0.0", None));
/// ```
pub fn split_address(token: &str) -> (&str, Option<&str>) {
    let Some((prefix, suffix)) = token.rsplit_once('.') else {
        return (token, None);
    };
    let numeric_port =
        !suffix.is_empty() && suffix.bytes().all(|b| b.is_ascii_digit()) && suffix.parse::<u16>().is_ok();
    if numeric_port && is_address(prefix) {
        (prefix, Some(suffix))
    } else {
        (token, None)
    }
}

fn is_address(candidate: &str) -> bool {
    candidate.parse::<IpAddr>().is_ok() || is_host_name(candidate)
}

fn is_host_name(candidate: &str) -> bool {
    candidate.contains('.')
        && candidate.bytes().any(|b| b.is_ascii_alphabetic())
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'-' || b == b'_')
}

/// Split the text after the second address into protocol text and length.
///
/// The protocol is the text in front of the last `length N` clause, verbatim
/// (including the comma before the clause). Annotations printed after the
/// clause are kept in the protocol, joined with a single space.
fn split_length_clause(rest: &str) -> (String, u64) {
    let Some((clause, length)) = length_clause(rest) else {
        return (rest.trim_end().to_string(), 0);
    };
    let head = rest[..clause.start].trim_end();
    let tail = rest[clause.end..].trim();

    let protocol = match (head.is_empty(), tail.is_empty()) {
        (_, true) => head.to_string(),
        (true, false) => tail.to_string(),
        (false, false) => format!("{head} {tail}"),
    };
    (protocol, length)
}

/// Extract the hex payload of a data line as lower-case digits.
///
/// The offset label and any ASCII rendering column are dropped; hex groups
/// are collected up to the first token that is not a 2-4 digit hex group. A
/// line without hex groups yields an empty string.
///
/// # Examples
/// ```
/// use tapdump_core::parse_data;
///
/// let hex = parse_data("\t0x0080:  e04b 2935 564f 91db 5344 5460 9189 33d0");
/// assert_eq!(hex, "e04b2935564f91db53445460918933d0");
/// assert_eq!(parse_data("not a data line"), "");
/// ```
pub fn parse_data(line: &str) -> String {
    let Some(payload) = data_payload(line) else {
        debug!("no hex groups in data line {line:?}");
        return String::new();
    };
    let hex_column = payload
        .split(layout::ASCII_COLUMN_SEPARATOR)
        .next()
        .unwrap_or_default();

    hex_column
        .split_whitespace()
        .take_while(|group| is_hex_group(group))
        .flat_map(|group| group.chars())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn is_hex_group(group: &str) -> bool {
    layout::HEX_GROUP_LEN.contains(&group.len()) && group.bytes().all(|b| b.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::{parse_data, parse_header, split_address, split_length_clause};
    use crate::dump::error::DumpError;

    const ESP: &str = "ESP(spi=0xb1ced15c,seq=0x30)";

    #[test]
    fn parse_header_without_ports() {
        let line = format!("2015-05-20 12:41:45.812393 IP 0.0.0.0 > 0.0.0.0: {ESP}, length 184");
        let header = parse_header(&line).unwrap();
        assert_eq!(header.date, "2015-05-20");
        assert_eq!(header.time, "12:41:45.812393");
        assert_eq!(header.raw_header, line);
        assert_eq!(header.ethernet_type, "IP");
        assert_eq!(header.src_ip, "0.0.0.0");
        assert_eq!(header.dest_ip, "0.0.0.0");
        assert_eq!(header.src_port, None);
        assert_eq!(header.dest_port, None);
        assert_eq!(header.protocol, "ESP(spi=0xb1ced15c,seq=0x30),");
        assert_eq!(header.length, 184);
    }

    #[test]
    fn parse_header_with_ports() {
        let line = format!("2015-05-20 12:41:45.812393 IP 0.0.0.0.80 > 0.0.0.0.80: {ESP}, length 184");
        let header = parse_header(&line).unwrap();
        assert_eq!(header.src_ip, "0.0.0.0");
        assert_eq!(header.dest_ip, "0.0.0.0");
        assert_eq!(header.src_port.as_deref(), Some("80"));
        assert_eq!(header.dest_port.as_deref(), Some("80"));
    }

    #[test]
    fn parse_header_without_length_defaults_to_zero() {
        let line = format!("2015-05-20 12:41:45.812393 IP 0.0.0.0.80 > 0.0.0.0.80: {ESP}");
        let header = parse_header(&line).unwrap();
        assert_eq!(header.src_port.as_deref(), Some("80"));
        assert_eq!(header.dest_port.as_deref(), Some("80"));
        assert_eq!(header.protocol, ESP);
        assert_eq!(header.length, 0);
    }

    #[test]
    fn parse_header_mixed_ports_are_independent() {
        let line = "2015-05-20 12:41:45.812393 IP 10.0.0.1.443 > 10.0.0.2: UDP, length 9";
        let header = parse_header(line).unwrap();
        assert_eq!(header.src_ip, "10.0.0.1");
        assert_eq!(header.src_port.as_deref(), Some("443"));
        assert_eq!(header.dest_ip, "10.0.0.2");
        assert_eq!(header.dest_port, None);
    }

    #[test]
    fn parse_tcp_header_uses_last_length_clause() {
        let line = "2016-06-13 10:00:00.000001 IP 192.168.1.10.51234 > 93.184.216.34.80: \
                    Flags [P.], seq 1:78, ack 1, win 229, length 77";
        let header = parse_header(line).unwrap();
        assert_eq!(header.protocol, "Flags [P.], seq 1:78, ack 1, win 229,");
        assert_eq!(header.length, 77);
        assert_eq!(header.dest_port.as_deref(), Some("80"));
    }

    #[test]
    fn parse_ipv6_header() {
        let line = "2016-06-13 08:00:01.000001 IP6 fe80::1.546 > ff02::1:2.547: dhcp6 solicit";
        let header = parse_header(line).unwrap();
        assert_eq!(header.ethernet_type, "IP6");
        assert_eq!(header.src_ip, "fe80::1");
        assert_eq!(header.src_port.as_deref(), Some("546"));
        assert_eq!(header.dest_ip, "ff02::1:2");
        assert_eq!(header.dest_port.as_deref(), Some("547"));
        assert_eq!(header.protocol, "dhcp6 solicit");
        assert_eq!(header.length, 0);
    }

    #[test]
    fn parse_header_rejects_malformed_lines() {
        for line in [
            "2015-05-20 12:41:45.812393 IP 0.0.0.0 0.0.0.0: UDP, length 1",
            "2015-05-20 12:41:45.812393 IP 0.0.0.0 > 0.0.0.0 UDP, length 1",
            "\t0x0080:  e04b 2935",
        ] {
            let err = parse_header(line).unwrap_err();
            assert_eq!(
                err,
                DumpError::MalformedHeaderLine {
                    line: line.to_string()
                }
            );
        }
    }

    #[test]
    fn split_address_edge_cases() {
        assert_eq!(split_address("0.0.0.0"), ("0.0.0.0", None));
        assert_eq!(split_address("10.0.0.1.80"), ("10.0.0.1", Some("80")));
        assert_eq!(split_address("fe80::1.546"), ("fe80::1", Some("546")));
        assert_eq!(split_address("fe80::1"), ("fe80::1", None));
        assert_eq!(split_address("host.example.1234"), ("host.example", Some("1234")));
        assert_eq!(split_address("host.example.com"), ("host.example.com", None));
        assert_eq!(split_address("10.0.0.1.99999"), ("10.0.0.1.99999", None));
        assert_eq!(split_address("10.0.0.1."), ("10.0.0.1.", None));
        assert_eq!(split_address("localhost"), ("localhost", None));
        assert_eq!(split_address("host.80"), ("host.80", None));
    }

    #[test]
    fn length_clause_requires_integer() {
        assert_eq!(split_length_clause("UDP, length 48"), ("UDP,".to_string(), 48));
        assert_eq!(
            split_length_clause("weird length field"),
            ("weird length field".to_string(), 0)
        );
        assert_eq!(split_length_clause(""), (String::new(), 0));
    }

    #[test]
    fn protocol_keeps_text_after_length_clause() {
        let line = "2016-06-13 10:00:00.000001 IP 1.2.3.4.53 > 5.6.7.8.2: \
                    UDP, length 48 [bad udp cksum 0x1]";
        let header = parse_header(line).unwrap();
        assert_eq!(header.protocol, "UDP, [bad udp cksum 0x1]");
        assert_eq!(header.length, 48);
        assert_eq!(header.src_port.as_deref(), Some("53"));
    }

    #[test]
    fn protocol_spacing_is_verbatim() {
        let line = "2016-06-13 10:00:00.000001 IP 1.2.3.4 > 5.6.7.8: foo  bar, length 3";
        let header = parse_header(line).unwrap();
        assert_eq!(header.protocol, "foo  bar,");
        assert_eq!(header.length, 3);
        assert_eq!(split_length_clause("length 7 trailer"), ("trailer".to_string(), 7));
    }

    #[test]
    fn parse_data_full_line() {
        let hex = parse_data("\t0x0080:  e04b 2935 564f 91db 5344 5460 9189 33d0");
        assert_eq!(hex, "e04b2935564f91db53445460918933d0");
    }

    #[test]
    fn parse_data_lowercases_and_keeps_odd_group() {
        assert_eq!(parse_data("\t0x0030:  E04B 29"), "e04b29");
    }

    #[test]
    fn parse_data_drops_ascii_column() {
        let line = "\t0x0000:  4500 0054 beef  E..T..@.@.<..... cafe";
        assert_eq!(parse_data(line), "45000054beef");
    }

    #[test]
    fn parse_data_stops_at_non_hex_token() {
        assert_eq!(parse_data("\t0x0000:  4500 0054 xyz 1234"), "45000054");
    }

    #[test]
    fn parse_data_without_hex_is_empty() {
        assert_eq!(parse_data("\t0x0000:"), "");
        assert_eq!(parse_data(""), "");
    }
}
