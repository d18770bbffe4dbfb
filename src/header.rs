//! The fixed 512-byte preamble shared by every `.edf` file the device writes.
//!
//! Despite the extension this is not standard EDF: all fields live at fixed
//! offsets and the payload after the header is a flat array of records.

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;
use std::ops::Range;

use crate::error::DecodeError;

pub const HEADER_SIZE: usize = 512;

/// 8-byte device timestamp: `u16 year (LE), month, day, hour, minute, second, subsecond`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub subsecond: u8,
}

impl Timestamp {
    pub const SIZE: usize = 8;

    /// Substituted for any byte pattern that is not a real calendar date/time.
    pub const EPOCH: Timestamp = Timestamp {
        year: 1970,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
        subsecond: 0,
    };

    /// Decodes the first 8 bytes of `bytes`. Never fails: short input and
    /// impossible dates (month 13, Feb 30, hour 25, ...) yield [`Timestamp::EPOCH`].
    pub fn decode(bytes: &[u8]) -> Timestamp {
        if bytes.len() < Self::SIZE {
            return Self::EPOCH;
        }
        let candidate = Timestamp {
            year: u16::from_le_bytes([bytes[0], bytes[1]]),
            month: bytes[2],
            day: bytes[3],
            hour: bytes[4],
            minute: bytes[5],
            second: bytes[6],
            subsecond: bytes[7],
        };
        if candidate.checked_datetime().is_some() {
            candidate
        } else {
            Self::EPOCH
        }
    }

    fn checked_datetime(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?.and_hms_opt(
            self.hour as u32,
            self.minute as u32,
            self.second as u32,
        )
    }

    /// Second-resolution datetime; the subsecond byte is dropped.
    pub fn to_datetime(&self) -> NaiveDateTime {
        self.checked_datetime().unwrap_or_default()
    }

    pub fn is_epoch(&self) -> bool {
        *self == Self::EPOCH
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_datetime().format("%Y-%m-%d %H:%M:%S"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub version: String,
    pub device_id: String,
    pub patient_id: String,
    pub model_code: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub header_size: String,
    pub firmware: String,
    pub unit_and_params: String,
    pub signal_name: String,
    pub digital_min: String,
    pub digital_max: String,
    pub physical_min: String,
    pub physical_max: String,
    pub samples_per_record: String,
}

impl FileHeader {
    /// Decodes the header from the start of `data`, which may include the payload.
    pub fn decode(data: &[u8]) -> Result<FileHeader, DecodeError> {
        if data.len() < HEADER_SIZE {
            return Err(DecodeError::TruncatedHeader { len: data.len() });
        }

        Ok(FileHeader {
            version: ascii_field(data, 0x00..0x08),
            device_id: ascii_field(data, 0x08..0x20),
            patient_id: ascii_field(data, 0x20..0x58),
            model_code: ascii_field(data, 0x58..0xA8),
            start_time: Timestamp::decode(&data[0xA8..0xB0]),
            end_time: Timestamp::decode(&data[0xB0..0xB8]),
            header_size: ascii_field(data, 0xB8..0xC0),
            firmware: ascii_field(data, 0xC0..0xD8),
            unit_and_params: ascii_field(data, 0xD8..0x100),
            signal_name: ascii_field(data, 0x100..0x160),
            digital_min: ascii_field(data, 0x160..0x170),
            digital_max: ascii_field(data, 0x170..0x178),
            physical_min: ascii_field(data, 0x178..0x180),
            physical_max: ascii_field(data, 0x180..0x188),
            samples_per_record: ascii_field(data, 0x1D0..0x1E0),
        })
    }
}

/// Non-ASCII bytes become U+FFFD; padding (whitespace and NUL) is trimmed.
fn ascii_field(data: &[u8], range: Range<usize>) -> String {
    let text: String = data[range]
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { char::REPLACEMENT_CHARACTER })
        .collect();
    text.trim_matches(|c: char| c.is_whitespace() || c == '\0')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{header_bytes, timestamp_bytes};

    #[test]
    fn test_short_input_is_truncated_header() {
        let err = FileHeader::decode(&[0u8; 511]).unwrap_err();
        assert_eq!(err, DecodeError::TruncatedHeader { len: 511 });
    }

    #[test]
    fn test_fields_are_read_from_fixed_offsets() {
        let mut data = header_bytes();
        data[0x00..0x04].copy_from_slice(b"V1.0");
        data[0x08..0x10].copy_from_slice(b"CA820M  ");
        data[0xC0..0xC6].copy_from_slice(b"FW2.13");
        data[0x100..0x108].copy_from_slice(b"Pressure");
        data[0x1D0..0x1D2].copy_from_slice(b"25");
        data[0xA8..0xB0].copy_from_slice(&timestamp_bytes(2022, 5, 27, 22, 15, 3));

        let header = FileHeader::decode(&data).unwrap();
        assert_eq!(header.version, "V1.0");
        assert_eq!(header.device_id, "CA820M");
        assert_eq!(header.firmware, "FW2.13");
        assert_eq!(header.signal_name, "Pressure");
        assert_eq!(header.samples_per_record, "25");
        assert_eq!(header.patient_id, "");
        assert_eq!(header.start_time.to_string(), "2022-05-27 22:15:03");
        assert!(header.end_time.is_epoch());
    }

    #[test]
    fn test_non_ascii_bytes_are_replaced() {
        let mut data = header_bytes();
        data[0x20..0x23].copy_from_slice(&[b'A', 0xFF, b'B']);
        let header = FileHeader::decode(&data).unwrap();
        assert_eq!(header.patient_id, "A\u{FFFD}B");
    }

    #[test]
    fn test_valid_timestamp_keeps_fields() {
        let ts = Timestamp::decode(&timestamp_bytes(2022, 5, 28, 6, 30, 0));
        assert_eq!(ts.year, 2022);
        assert_eq!(ts.month, 5);
        assert_eq!(ts.day, 28);
        assert_eq!(ts.hour, 6);
        assert_eq!(ts.minute, 30);
        assert_eq!(ts.second, 0);
    }

    #[test]
    fn test_month_13_decodes_to_epoch() {
        let ts = Timestamp::decode(&timestamp_bytes(2022, 13, 1, 0, 0, 0));
        assert_eq!(ts, Timestamp::EPOCH);
        assert_eq!(ts.to_string(), "1970-01-01 00:00:00");
    }

    #[test]
    fn test_impossible_day_and_hour_decode_to_epoch() {
        assert!(Timestamp::decode(&timestamp_bytes(2022, 2, 30, 0, 0, 0)).is_epoch());
        assert!(Timestamp::decode(&timestamp_bytes(2022, 2, 1, 25, 0, 0)).is_epoch());
        assert!(Timestamp::decode(&[0u8; 8]).is_epoch());
        assert!(Timestamp::decode(&[0xE6, 0x07]).is_epoch());
    }
}
