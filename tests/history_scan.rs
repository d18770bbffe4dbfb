use std::fs;
use std::path::Path;

use cpap_decoder::data_loading::load_history;
use cpap_decoder::output::write_nights_csv;
use cpap_decoder::session::{reconstruct_history, reconstruct_recent};
use cpap_decoder::summary::HistorySummary;

const HEADER_SIZE: usize = 512;

fn timestamp(minute: u8, second: u8) -> [u8; 8] {
    let y = 2022u16.to_le_bytes();
    [y[0], y[1], 5, 27, 23, minute, second, 0]
}

fn record16(first: u32, second: u32, ts: [u8; 8]) -> Vec<u8> {
    let mut out = first.to_le_bytes().to_vec();
    out.extend_from_slice(&second.to_le_bytes());
    out.extend_from_slice(&ts);
    out
}

fn write_file(dir: &Path, stem: &str, kind: &str, payload: &[u8]) {
    let mut data = vec![b' '; HEADER_SIZE];
    data[..8].copy_from_slice(b"V1.0\0\0\0\0");
    data.extend_from_slice(payload);
    fs::write(dir.join(format!("{}_{}.edf", stem, kind)), data).unwrap();
}

fn day(base: &Path, stem: &str) -> std::path::PathBuf {
    let dir = base.join(stem);
    fs::create_dir_all(&dir).unwrap();
    dir
}

/// Evening 5 h in 20220527, morning 3 h in 20220528.
fn build_history(base: &Path) {
    let prev = day(base, "20220527");
    write_file(&prev, "20220527", "usetime", &record16(18000, 0, timestamp(0, 0)));
    write_file(&prev, "20220527", "difleak", &vec![10u8; 7200]);
    write_file(
        &prev,
        "20220527",
        "apcp",
        &[record16(80, 0, timestamp(1, 0)), record16(100, 0, timestamp(2, 0))].concat(),
    );

    let curr = day(base, "20220528");
    write_file(&curr, "20220528", "usetime", &record16(10800, 0, timestamp(12, 34)));
    write_file(&curr, "20220528", "difleak", &vec![22u8; 4320]);
    let ai: Vec<u8> = (0..3).flat_map(|i| record16(1, 12, timestamp(i, 5))).collect();
    let hi: Vec<u8> = (0..2).flat_map(|i| record16(2, 20, timestamp(i, 5))).collect();
    write_file(&curr, "20220528", "ai", &ai);
    write_file(&curr, "20220528", "hi", &hi);
    // A truncated file must not take the night down with it.
    fs::write(curr.join("20220528_csa.edf"), [0u8; 100]).unwrap();

    fs::create_dir_all(base.join("misc")).unwrap();
}

#[test]
fn test_two_directory_night_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    build_history(tmp.path());

    let dirs = load_history(tmp.path()).unwrap();
    assert_eq!(dirs.len(), 2);

    let nights = reconstruct_history(&dirs);
    // 20220527 has only a boundary record and no predecessor: no usage.
    assert_eq!(nights.len(), 1);
    let night = &nights[0];
    assert_eq!(night.date.to_string(), "2022-05-28");
    assert_eq!(night.usage_hours, 8.0);
    assert_eq!(night.ai_count, 3);
    assert_eq!(night.hi_count, 2);
    assert_eq!(night.csa_count, 0);
    assert!((night.ahi - 0.625).abs() < 1e-12);
    assert_eq!(night.ai_total_duration_sec, 36);
    assert_eq!(night.hi_total_duration_sec, 40);
    // 7200 evening bytes of 10 plus 4320 morning bytes of 22.
    let expected_leak = (7200.0 * 10.0 + 4320.0 * 22.0) / 11520.0;
    assert!((night.leak_avg - expected_leak).abs() < 1e-9);
    assert_eq!(night.pressure_min, 80.0);
    assert_eq!(night.pressure_max, 100.0);
    assert_eq!(night.br_mean, 0.0);
}

#[test]
fn test_recent_window_keeps_predecessor_evening() {
    let tmp = tempfile::tempdir().unwrap();
    build_history(tmp.path());

    let dirs = load_history(tmp.path()).unwrap();
    let nights = reconstruct_recent(&dirs, 1);
    assert_eq!(nights.len(), 1);
    assert_eq!(nights[0].usage_hours, 8.0);

    let summary = HistorySummary::from_nights(&nights).unwrap();
    assert_eq!(summary.compliant_nights, 1);
    assert_eq!(summary.total_ai + summary.total_hi, 5);

    let mut csv = Vec::new();
    write_nights_csv(&mut csv, &nights).unwrap();
    let text = String::from_utf8(csv).unwrap();
    assert!(text.lines().nth(1).unwrap().starts_with("2022-05-28,8.0,0.63,3,2,0,0,36,40"));
}

#[test]
fn test_unreadable_base_directory_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("not_a_dir");
    fs::write(&file, b"x").unwrap();
    assert!(load_history(&file).is_err());
    assert!(load_history(&tmp.path().join("missing")).is_err());
}
