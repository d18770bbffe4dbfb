//! Splits one directory's usetime records into the evening segment (closed by
//! a boundary record at the device's midnight rollover) and the morning
//! segment that continues the previous directory's night.

use crate::config::MIN_SESSION_SECS;
use crate::records::UsetimeRecord;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UsetimeLog {
    records: Vec<UsetimeRecord>,
}

impl UsetimeLog {
    pub fn new(records: Vec<UsetimeRecord>) -> Self {
        UsetimeLog { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn boundary_records(&self) -> impl Iterator<Item = &UsetimeRecord> {
        self.records.iter().filter(|r| r.boundary)
    }

    pub fn non_boundary_records(&self) -> impl Iterator<Item = &UsetimeRecord> {
        self.records.iter().filter(|r| !r.boundary)
    }

    pub fn has_boundary(&self) -> bool {
        self.boundary_records().next().is_some()
    }

    /// Seconds of the last boundary record; earlier ones are superseded.
    pub fn evening_seconds(&self) -> u64 {
        self.boundary_records()
            .last()
            .map(|r| r.seconds as u64)
            .unwrap_or(0)
    }

    /// Morning usage counted towards the night's hours.
    ///
    /// With a boundary present, short non-boundary records (under
    /// [`MIN_SESSION_SECS`]) are standalone naps and are left out. Without
    /// one the directory comes from early firmware that logs the whole
    /// session as a single set, so only the longest record is kept.
    pub fn morning_seconds(&self) -> u64 {
        if self.has_boundary() {
            self.non_boundary_records()
                .filter(|r| r.seconds >= MIN_SESSION_SECS)
                .map(|r| r.seconds as u64)
                .sum()
        } else {
            self.non_boundary_records()
                .map(|r| r.seconds as u64)
                .max()
                .unwrap_or(0)
        }
    }

    /// Sum of every non-boundary record, unfiltered. Used to apportion
    /// continuous streams, which is not the same figure as [`Self::morning_seconds`].
    pub fn non_boundary_seconds(&self) -> u64 {
        self.non_boundary_records().map(|r| r.seconds as u64).sum()
    }

    pub fn total_seconds(&self) -> u64 {
        self.records.iter().map(|r| r.seconds as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::decode_payload;
    use crate::test_support::*;

    fn log(records: &[Vec<u8>]) -> UsetimeLog {
        UsetimeLog::new(decode_payload(&records.concat()))
    }

    #[test]
    fn test_empty_log() {
        let empty = UsetimeLog::default();
        assert_eq!(empty.evening_seconds(), 0);
        assert_eq!(empty.morning_seconds(), 0);
        assert_eq!(empty.total_seconds(), 0);
        assert!(!empty.has_boundary());
    }

    #[test]
    fn test_partition_keeps_order() {
        let log = log(&[
            plain_usetime(100),
            boundary_usetime(200),
            plain_usetime(300),
            boundary_usetime(400),
        ]);
        let boundary: Vec<u32> = log.boundary_records().map(|r| r.seconds).collect();
        let other: Vec<u32> = log.non_boundary_records().map(|r| r.seconds).collect();
        assert_eq!(boundary, vec![200, 400]);
        assert_eq!(other, vec![100, 300]);
    }

    #[test]
    fn test_evening_uses_last_boundary_record() {
        let log = log(&[boundary_usetime(7200), plain_usetime(3000), boundary_usetime(18000)]);
        assert_eq!(log.evening_seconds(), 18000);
    }

    #[test]
    fn test_morning_with_boundary_drops_short_sessions() {
        let log = log(&[
            plain_usetime(10800),
            plain_usetime(1499),
            plain_usetime(1500),
            boundary_usetime(5000),
        ]);
        assert_eq!(log.morning_seconds(), 10800 + 1500);
        assert_eq!(log.non_boundary_seconds(), 10800 + 1499 + 1500);
    }

    #[test]
    fn test_morning_without_boundary_takes_longest_record() {
        let log = log(&[plain_usetime(600), plain_usetime(10800), plain_usetime(900)]);
        assert_eq!(log.morning_seconds(), 10800);
        assert_eq!(log.evening_seconds(), 0);
    }

    #[test]
    fn test_short_lone_record_still_counts_without_boundary() {
        let log = log(&[plain_usetime(1200)]);
        assert_eq!(log.morning_seconds(), 1200);
    }

    #[test]
    fn test_evening_plus_non_boundary_equals_total_with_single_boundary() {
        let log = log(&[plain_usetime(9000), plain_usetime(400), boundary_usetime(18000)]);
        assert_eq!(
            log.evening_seconds() + log.non_boundary_seconds(),
            log.total_seconds()
        );
    }
}
