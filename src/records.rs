//! Per-file-type record layouts following the 512-byte header.
//!
//! Every payload is a flat little-endian array with a fixed stride. A trailing
//! partial record is dropped, so `num_records == payload_len / stride`.

use std::fmt;
use std::str::FromStr;

use crate::error::DecodeError;
use crate::header::{FileHeader, Timestamp, HEADER_SIZE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FileType {
    Flow,
    Pressure,
    RealPresData,
    SnoreData,
    Ai,
    Hi,
    Snore,
    Csa,
    Leak,
    Apcp,
    Usetime,
    Mvtvbr,
    Config,
    Spo2Bpm,
    Difleak,
}

impl FileType {
    pub const ALL: [FileType; 15] = [
        FileType::Flow,
        FileType::Pressure,
        FileType::RealPresData,
        FileType::SnoreData,
        FileType::Ai,
        FileType::Hi,
        FileType::Snore,
        FileType::Csa,
        FileType::Leak,
        FileType::Apcp,
        FileType::Usetime,
        FileType::Mvtvbr,
        FileType::Config,
        FileType::Spo2Bpm,
        FileType::Difleak,
    ];

    pub fn suffix(&self) -> &'static str {
        match self {
            FileType::Flow => "flow",
            FileType::Pressure => "pressure",
            FileType::RealPresData => "realpresdata",
            FileType::SnoreData => "snoredata",
            FileType::Ai => "ai",
            FileType::Hi => "hi",
            FileType::Snore => "snore",
            FileType::Csa => "csa",
            FileType::Leak => "leak",
            FileType::Apcp => "apcp",
            FileType::Usetime => "usetime",
            FileType::Mvtvbr => "mvtvbr",
            FileType::Config => "config",
            FileType::Spo2Bpm => "spo2bpm",
            FileType::Difleak => "difleak",
        }
    }

    /// `<date>_<suffix>.edf`, where `date` is the directory name (`YYYYMMDD`).
    pub fn file_name(&self, date: &str) -> String {
        format!("{}_{}.edf", date, self.suffix())
    }

    pub fn stride(&self) -> usize {
        match self {
            FileType::Flow | FileType::Difleak => 1,
            FileType::Pressure | FileType::RealPresData | FileType::SnoreData => 2,
            FileType::Spo2Bpm => 2,
            FileType::Ai
            | FileType::Hi
            | FileType::Snore
            | FileType::Csa
            | FileType::Leak
            | FileType::Apcp
            | FileType::Usetime => 16,
            FileType::Mvtvbr => BreathingRecord::STRIDE,
            FileType::Config => ConfigRecord::STRIDE,
        }
    }

    /// Only the continuous waveforms have a known rate.
    pub fn sample_rate_hz(&self) -> Option<u32> {
        match self {
            FileType::Flow | FileType::Pressure | FileType::RealPresData | FileType::SnoreData => {
                Some(crate::config::SAMPLE_RATE_HZ)
            }
            _ => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for FileType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileType::ALL
            .iter()
            .copied()
            .find(|t| t.suffix() == s)
            .ok_or_else(|| format!("Unknown file type: {}", s))
    }
}

/// A fixed-stride record that can be read from exactly `STRIDE` bytes.
pub trait Record: Sized {
    const STRIDE: usize;

    /// `chunk.len()` is always `STRIDE`.
    fn decode(chunk: &[u8]) -> Self;
}

impl Record for u8 {
    const STRIDE: usize = 1;

    fn decode(chunk: &[u8]) -> Self {
        chunk[0]
    }
}

impl Record for u16 {
    const STRIDE: usize = 2;

    fn decode(chunk: &[u8]) -> Self {
        u16::from_le_bytes([chunk[0], chunk[1]])
    }
}

fn read_u32(chunk: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        chunk[offset],
        chunk[offset + 1],
        chunk[offset + 2],
        chunk[offset + 3],
    ])
}

fn read_u16(chunk: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([chunk[offset], chunk[offset + 1]])
}

/// AI / HI / CSA / snore / leak events. `value` is the duration in seconds
/// for apnea and hypopnea events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventRecord {
    pub event_type: u32,
    pub value: u32,
    pub timestamp: Timestamp,
}

impl Record for EventRecord {
    const STRIDE: usize = 16;

    fn decode(chunk: &[u8]) -> Self {
        EventRecord {
            event_type: read_u32(chunk, 0),
            value: read_u32(chunk, 4),
            timestamp: Timestamp::decode(&chunk[8..16]),
        }
    }
}

/// One automatic pressure adjustment. `pressure` is in 0.1 cmH2O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApcpRecord {
    pub pressure: u32,
    pub flags: u32,
    pub timestamp: Timestamp,
}

impl ApcpRecord {
    pub fn cmh2o(&self) -> f64 {
        self.pressure as f64 * crate::config::PRESSURE_SCALE
    }
}

impl Record for ApcpRecord {
    const STRIDE: usize = 16;

    fn decode(chunk: &[u8]) -> Self {
        ApcpRecord {
            pressure: read_u32(chunk, 0),
            flags: read_u32(chunk, 4),
            timestamp: Timestamp::decode(&chunk[8..16]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsetimeRecord {
    pub seconds: u32,
    pub param_raw: u32,
    pub timestamp: Timestamp,
    /// Stamped exactly on `hh:00:00`: the device closed the evening segment here.
    pub boundary: bool,
}

impl UsetimeRecord {
    pub fn param_bytes(&self) -> [u8; 4] {
        self.param_raw.to_le_bytes()
    }
}

impl Record for UsetimeRecord {
    const STRIDE: usize = 16;

    fn decode(chunk: &[u8]) -> Self {
        // Read from the raw minute/second bytes so an out-of-range date
        // elsewhere in the stamp does not turn into the epoch's 00:00.
        let boundary = chunk[13] == 0 && chunk[14] == 0;
        UsetimeRecord {
            seconds: read_u32(chunk, 0),
            param_raw: read_u32(chunk, 4),
            timestamp: Timestamp::decode(&chunk[8..16]),
            boundary,
        }
    }
}

/// One `mvtvbr` sample: tidal volume (mL), breath rate (/min), unknown third field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreathingRecord {
    pub tidal_volume: u16,
    pub breath_rate: u16,
    pub field3: u16,
}

impl BreathingRecord {
    pub fn is_valid(&self) -> bool {
        self.breath_rate > 0
    }
}

impl Record for BreathingRecord {
    const STRIDE: usize = 6;

    fn decode(chunk: &[u8]) -> Self {
        BreathingRecord {
            tidal_volume: read_u16(chunk, 0),
            breath_rate: read_u16(chunk, 2),
            field3: read_u16(chunk, 4),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigRecord {
    pub timestamp: Timestamp,
    /// float32 settings at 0x70..0xB0.
    pub values: Vec<f32>,
    /// The full 200-byte record, kept verbatim.
    pub raw: Vec<u8>,
}

impl ConfigRecord {
    const TIMESTAMP_OFFSET: usize = 192;
    const VALUES: std::ops::Range<usize> = 0x70..0xB0;

    pub fn raw_hex(&self) -> String {
        hex::encode(&self.raw)
    }
}

impl Record for ConfigRecord {
    const STRIDE: usize = 200;

    fn decode(chunk: &[u8]) -> Self {
        let values = chunk[Self::VALUES]
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        ConfigRecord {
            timestamp: Timestamp::decode(&chunk[Self::TIMESTAMP_OFFSET..]),
            values,
            raw: chunk.to_vec(),
        }
    }
}

/// Decodes every whole record in `payload`; leftover bytes are ignored.
pub fn decode_payload<T: Record>(payload: &[u8]) -> Vec<T> {
    payload.chunks_exact(T::STRIDE).map(T::decode).collect()
}

pub fn payload(data: &[u8]) -> &[u8] {
    data.get(HEADER_SIZE..).unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct DecodedFile<T> {
    pub header: FileHeader,
    pub records: Vec<T>,
}

impl<T: Record> DecodedFile<T> {
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let header = FileHeader::decode(data)?;
        let records = decode_payload(payload(data));
        Ok(DecodedFile { header, records })
    }

    pub fn num_records(&self) -> usize {
        self.records.len()
    }
}

/// Header and record count for any file type, without keeping the records.
#[derive(Debug, Clone)]
pub struct FileSummary {
    pub file_type: FileType,
    pub header: FileHeader,
    pub num_records: usize,
    pub payload_bytes: usize,
}

impl FileSummary {
    pub fn decode(file_type: FileType, data: &[u8]) -> Result<Self, DecodeError> {
        let header = FileHeader::decode(data)?;
        let payload_bytes = payload(data).len();
        Ok(FileSummary {
            file_type,
            header,
            num_records: payload_bytes / file_type.stride(),
            payload_bytes,
        })
    }

    pub fn duration_secs(&self) -> Option<f64> {
        self.file_type
            .sample_rate_hz()
            .map(|hz| self.num_records as f64 / hz as f64)
    }
}

/// Min and max over the non-zero samples, `None` if every sample is zero.
pub fn nonzero_range<T: Copy + Ord + Default>(samples: &[T]) -> Option<(T, T)> {
    let mut nonzero = samples.iter().copied().filter(|s| *s != T::default());
    let first = nonzero.next()?;
    Some(nonzero.fold((first, first), |(lo, hi), s| (lo.min(s), hi.max(s))))
}

pub fn nonzero_count<T: Copy + PartialEq + Default>(samples: &[T]) -> usize {
    samples.iter().filter(|s| **s != T::default()).count()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Min, max and mean over every sample, zeros included. `None` when empty.
pub fn sample_stats<T: Copy + Into<f64>>(samples: &[T]) -> Option<SampleStats> {
    let (first, rest) = samples.split_first()?;
    let first: f64 = (*first).into();
    let (min, max, sum) = rest.iter().fold((first, first, first), |(lo, hi, sum), s| {
        let v: f64 = (*s).into();
        (lo.min(v), hi.max(v), sum + v)
    });
    Some(SampleStats {
        min,
        max,
        mean: sum / samples.len() as f64,
    })
}
