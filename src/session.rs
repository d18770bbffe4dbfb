//! Night reconstruction.
//!
//! A clinical night X spans the evening segment recorded in directory X-1
//! and the morning segment recorded in directory X. Streams that carry no
//! timestamps of their own (breathing, difleak) are split between the two
//! segments in proportion to their share of the directory's usetime.

use chrono::NaiveDate;
use log::{debug, info};

use crate::data_loading::DirectoryData;
use crate::metrics::Night;
use crate::records::{BreathingRecord, EventRecord};

/// Everything that feeds one night's statistics, already stitched together.
#[derive(Debug, Clone, PartialEq)]
pub struct NightStreams {
    pub date: NaiveDate,
    pub usage_hours: f64,
    pub ai: Vec<EventRecord>,
    pub hi: Vec<EventRecord>,
    pub csa: Vec<EventRecord>,
    pub snore: Vec<EventRecord>,
    /// Previous directory's APCP pressures followed by the current one's.
    pub pressure: Vec<u32>,
    pub breathing: Vec<BreathingRecord>,
    pub leak: Vec<u8>,
}

/// `floor(segment / total * len)`, or 0 when either the total or the stream is empty.
pub fn apportioned_len(segment_secs: u64, total_secs: u64, len: usize) -> usize {
    if total_secs == 0 || len == 0 {
        return 0;
    }
    let ratio = segment_secs as f64 / total_secs as f64;
    ((ratio * len as f64).floor() as usize).min(len)
}

/// The tail of `stream` belonging to the evening segment of `dir`.
pub fn evening_slice<'a, T>(dir: &DirectoryData, stream: &'a [T]) -> &'a [T] {
    let n = apportioned_len(
        dir.usetime.evening_seconds(),
        dir.usetime.total_seconds(),
        stream.len(),
    );
    &stream[stream.len() - n..]
}

/// The head of `stream` belonging to the morning segment of `dir`.
///
/// The ratio uses every non-boundary record, including the short sessions
/// that [`crate::usetime::UsetimeLog::morning_seconds`] leaves out of the
/// usage hours.
pub fn morning_slice<'a, T>(dir: &DirectoryData, stream: &'a [T]) -> &'a [T] {
    let n = apportioned_len(
        dir.usetime.non_boundary_seconds(),
        dir.usetime.total_seconds(),
        stream.len(),
    );
    &stream[..n]
}

pub fn usage_hours(prev: Option<&DirectoryData>, curr: &DirectoryData) -> f64 {
    let evening = prev.map(|d| d.usetime.evening_seconds()).unwrap_or(0);
    let morning = curr.usetime.morning_seconds();
    (evening + morning) as f64 / 3600.0
}

fn evening_then_morning<T: Clone>(
    prev: Option<&DirectoryData>,
    curr: &DirectoryData,
    stream: impl Fn(&DirectoryData) -> &[T],
) -> Vec<T> {
    let mut combined = Vec::new();
    if let Some(prev) = prev {
        combined.extend_from_slice(evening_slice(prev, stream(prev)));
    }
    combined.extend_from_slice(morning_slice(curr, stream(curr)));
    combined
}

/// Joins the evening of `prev` with the morning of `curr`. `None` when
/// `curr` has no usetime records or the night has no usage.
pub fn stitch(prev: Option<&DirectoryData>, curr: &DirectoryData) -> Option<NightStreams> {
    if curr.usetime.is_empty() {
        debug!("{}: no usetime records, skipping", curr.date);
        return None;
    }

    let usage_hours = usage_hours(prev, curr);
    if usage_hours <= 0.0 {
        debug!("{}: zero usage, skipping", curr.date);
        return None;
    }

    let mut pressure = prev.map(|d| d.pressure()).unwrap_or_default();
    pressure.extend(curr.pressure());

    Some(NightStreams {
        date: curr.date,
        usage_hours,
        ai: curr.ai.clone(),
        hi: curr.hi.clone(),
        csa: curr.csa.clone(),
        snore: curr.snore.clone(),
        pressure,
        breathing: evening_then_morning(prev, curr, |d| d.breathing.as_slice()),
        leak: evening_then_morning(prev, curr, |d| d.difleak.as_slice()),
    })
}

pub fn reconstruct(prev: Option<&DirectoryData>, curr: &DirectoryData) -> Option<Night> {
    stitch(prev, curr).map(|streams| Night::from_streams(&streams))
}

/// Pairs each directory with its predecessor in `dirs` (ascending by date).
pub fn night_windows(
    dirs: &[DirectoryData],
) -> impl Iterator<Item = (Option<&DirectoryData>, &DirectoryData)> {
    std::iter::once(None)
        .chain(dirs.iter().map(Some))
        .zip(dirs.iter())
}

/// Every night that can be reconstructed from `dirs`, oldest first.
pub fn reconstruct_history(dirs: &[DirectoryData]) -> Vec<Night> {
    collect_nights(night_windows(dirs))
}

/// Nights for the last `days` directories. The first of them still takes
/// its evening from the directory before it, if there is one.
pub fn reconstruct_recent(dirs: &[DirectoryData], days: usize) -> Vec<Night> {
    let skip = dirs.len().saturating_sub(days);
    collect_nights(night_windows(dirs).skip(skip))
}

fn collect_nights<'a>(
    windows: impl Iterator<Item = (Option<&'a DirectoryData>, &'a DirectoryData)>,
) -> Vec<Night> {
    let mut nights = Vec::new();
    for (prev, curr) in windows {
        if let Some(night) = reconstruct(prev, curr) {
            nights.push(night);
            if nights.len() % 100 == 0 {
                info!("{} nights reconstructed ({})", nights.len(), curr.date);
            }
        }
    }
    nights
}
