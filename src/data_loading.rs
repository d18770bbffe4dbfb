use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::records::{
    ApcpRecord, BreathingRecord, DecodedFile, EventRecord, FileType, Record, UsetimeRecord,
};
use crate::usetime::UsetimeLog;

/// Everything night reconstruction needs from one `YYYYMMDD` directory.
#[derive(Debug, Clone)]
pub struct DirectoryData {
    pub date: NaiveDate,
    pub usetime: UsetimeLog,
    pub ai: Vec<EventRecord>,
    pub hi: Vec<EventRecord>,
    pub csa: Vec<EventRecord>,
    pub snore: Vec<EventRecord>,
    pub apcp: Vec<ApcpRecord>,
    /// Only records with a non-zero breath rate.
    pub breathing: Vec<BreathingRecord>,
    pub difleak: Vec<u8>,
}

impl DirectoryData {
    /// File types read from disk; the waveform files are never needed here.
    pub const FILE_TYPES: [FileType; 8] = [
        FileType::Usetime,
        FileType::Ai,
        FileType::Hi,
        FileType::Csa,
        FileType::Snore,
        FileType::Apcp,
        FileType::Mvtvbr,
        FileType::Difleak,
    ];

    /// Builds directory data from whole-file buffers. Absent or truncated
    /// files contribute empty streams.
    pub fn from_buffers(date: NaiveDate, files: &HashMap<FileType, Vec<u8>>) -> DirectoryData {
        let usetime: Vec<UsetimeRecord> = decode_or_empty(date, files, FileType::Usetime);
        let breathing: Vec<BreathingRecord> = decode_or_empty(date, files, FileType::Mvtvbr);
        let breathing: Vec<BreathingRecord> = breathing.into_iter().filter(|r| r.is_valid()).collect();

        DirectoryData {
            date,
            usetime: UsetimeLog::new(usetime),
            ai: decode_or_empty(date, files, FileType::Ai),
            hi: decode_or_empty(date, files, FileType::Hi),
            csa: decode_or_empty(date, files, FileType::Csa),
            snore: decode_or_empty(date, files, FileType::Snore),
            apcp: decode_or_empty(date, files, FileType::Apcp),
            breathing,
            difleak: decode_or_empty(date, files, FileType::Difleak),
        }
    }

    /// Reads the directory for `date`. Never fails: unreadable files are
    /// logged and treated as absent.
    pub fn load(date: NaiveDate, dir: &Path) -> DirectoryData {
        let files = read_day_files(dir, &date_stem(date), &Self::FILE_TYPES);
        Self::from_buffers(date, &files)
    }

    /// APCP pressures in device units (0.1 cmH2O).
    pub fn pressure(&self) -> Vec<u32> {
        self.apcp.iter().map(|r| r.pressure).collect()
    }
}

fn decode_or_empty<T: Record>(
    date: NaiveDate,
    files: &HashMap<FileType, Vec<u8>>,
    file_type: FileType,
) -> Vec<T> {
    let Some(data) = files.get(&file_type) else {
        debug!("{}: no {} file", date, file_type);
        return Vec::new();
    };

    match DecodedFile::<T>::decode(data) {
        Ok(decoded) => decoded.records,
        Err(e) => {
            warn!("{}: ignoring {} file: {}", date, file_type, e);
            Vec::new()
        }
    }
}

/// `YYYYMMDD`, the directory and file-name prefix for a date.
pub fn date_stem(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Accepts exactly eight ASCII digits forming a real calendar date.
pub fn parse_date_dir_name(name: &str) -> Option<NaiveDate> {
    if name.len() != 8 || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(name, "%Y%m%d").ok()
}

/// Reads `<stem>_<type>.edf` for each requested type that exists in `dir`.
pub fn read_day_files(dir: &Path, stem: &str, file_types: &[FileType]) -> HashMap<FileType, Vec<u8>> {
    let mut files = HashMap::new();

    for &file_type in file_types {
        let path = dir.join(file_type.file_name(stem));
        match std::fs::read(&path) {
            Ok(data) => {
                files.insert(file_type, data);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to read {}: {}", path.display(), e),
        }
    }

    files
}

/// Date sub-directories of `base_dir` in ascending date order.
pub fn find_date_dirs(base_dir: &Path) -> Result<Vec<(NaiveDate, PathBuf)>> {
    let metadata = std::fs::metadata(base_dir)
        .with_context(|| format!("Failed to read base directory: {}", base_dir.display()))?;
    if !metadata.is_dir() {
        bail!("Not a directory: {}", base_dir.display());
    }

    let mut dirs = Vec::new();
    for entry in WalkDir::new(base_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.with_context(|| format!("Failed to list {}", base_dir.display()))?;
        if !entry.file_type().is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        match parse_date_dir_name(&name) {
            Some(date) => dirs.push((date, entry.path().to_path_buf())),
            None => debug!("Skipping non-date directory: {}", entry.path().display()),
        }
    }

    dirs.sort_by_key(|(date, _)| *date);
    Ok(dirs)
}

/// Loads every date directory under `base_dir`, oldest first.
pub fn load_history(base_dir: &Path) -> Result<Vec<DirectoryData>> {
    let dirs = find_date_dirs(base_dir)?;
    info!("Found {} date directories in {}", dirs.len(), base_dir.display());

    Ok(dirs
        .iter()
        .map(|(date, path)| DirectoryData::load(*date, path))
        .collect())
}
