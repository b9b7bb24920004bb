use std::sync::LazyLock;

use time::format_description::well_known::Rfc3339;
use time::format_description::{self, OwnedFormatItem};
use time::PrimitiveDateTime;

use crate::{CaptureSummary, PacketRecord};

static HEADER_TIMESTAMP: LazyLock<Option<OwnedFormatItem>> = LazyLock::new(|| {
    format_description::parse_owned::<2>(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]",
    )
    .ok()
});

pub(crate) fn build_capture_summary(packets: &[PacketRecord]) -> CaptureSummary {
    CaptureSummary {
        packets_total: packets.len() as u64,
        time_start: packets.first().and_then(record_to_rfc3339),
        time_end: packets.last().and_then(record_to_rfc3339),
    }
}

/// Header date and time as RFC3339, assuming the dump was printed in UTC.
fn record_to_rfc3339(record: &PacketRecord) -> Option<String> {
    let format = HEADER_TIMESTAMP.as_ref()?;
    let text = format!("{} {}", record.header.date, record.header.time);
    PrimitiveDateTime::parse(&text, format)
        .ok()?
        .assume_utc()
        .format(&Rfc3339)
        .ok()
}

#[cfg(test)]
mod tests {
    use super::build_capture_summary;
    use crate::{PacketRecord, parse_header};

    fn record(date: &str, time: &str) -> PacketRecord {
        let line = format!("{date} {time} IP 10.0.0.1 > 10.0.0.2: UDP, length 1");
        PacketRecord::new(parse_header(&line).unwrap())
    }

    #[test]
    fn summary_uses_first_and_last_packet() {
        let packets = [
            record("2015-05-20", "12:41:45.812393"),
            record("2015-05-20", "12:41:47.000001"),
        ];
        let summary = build_capture_summary(&packets);
        assert_eq!(summary.packets_total, 2);
        assert_eq!(summary.time_start.as_deref(), Some("2015-05-20T12:41:45.812393Z"));
        assert_eq!(summary.time_end.as_deref(), Some("2015-05-20T12:41:47.000001Z"));
    }

    #[test]
    fn summary_of_nothing() {
        let summary = build_capture_summary(&[]);
        assert_eq!(summary.packets_total, 0);
        assert!(summary.time_start.is_none());
        assert!(summary.time_end.is_none());
    }

    #[test]
    fn impossible_dates_are_omitted() {
        let summary = build_capture_summary(&[record("2015-13-40", "12:41:45.812393")]);
        assert_eq!(summary.packets_total, 1);
        assert!(summary.time_start.is_none());
    }
}
