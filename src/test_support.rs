//! Byte-level builders for synthetic device files.

use crate::header::HEADER_SIZE;

pub fn header_bytes() -> Vec<u8> {
    vec![0u8; HEADER_SIZE]
}

pub fn timestamp_bytes(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> [u8; 8] {
    let y = year.to_le_bytes();
    [y[0], y[1], month, day, hour, minute, second, 0]
}

pub fn file_with_payload(payload: &[u8]) -> Vec<u8> {
    let mut data = header_bytes();
    data.extend_from_slice(payload);
    data
}

pub fn event_record(event_type: u32, value: u32, ts: [u8; 8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(16);
    out.extend_from_slice(&event_type.to_le_bytes());
    out.extend_from_slice(&value.to_le_bytes());
    out.extend_from_slice(&ts);
    out
}

/// Usetime record stamped at `23:minute:second` on 2022-05-27.
pub fn usetime_record(seconds: u32, minute: u8, second: u8) -> Vec<u8> {
    event_record(seconds, 0x0000_0A05, timestamp_bytes(2022, 5, 27, 23, minute, second))
}

pub fn boundary_usetime(seconds: u32) -> Vec<u8> {
    usetime_record(seconds, 0, 0)
}

pub fn plain_usetime(seconds: u32) -> Vec<u8> {
    usetime_record(seconds, 41, 7)
}

pub fn usetime_file(records: &[Vec<u8>]) -> Vec<u8> {
    file_with_payload(&records.concat())
}

pub fn breathing_record(tidal_volume: u16, breath_rate: u16, field3: u16) -> Vec<u8> {
    let mut out = Vec::with_capacity(6);
    out.extend_from_slice(&tidal_volume.to_le_bytes());
    out.extend_from_slice(&breath_rate.to_le_bytes());
    out.extend_from_slice(&field3.to_le_bytes());
    out
}

pub fn apcp_record(pressure: u32) -> Vec<u8> {
    event_record(pressure, 0, timestamp_bytes(2022, 5, 28, 1, 2, 3))
}

pub fn event_file(count: usize, value: u32) -> Vec<u8> {
    let records: Vec<Vec<u8>> = (0..count)
        .map(|i| event_record(1, value, timestamp_bytes(2022, 5, 28, 2, i as u8, 0)))
        .collect();
    file_with_payload(&records.concat())
}
