//! Synthetic data streams for the hapi-stream decoder benchmarks.

use hapi_lib::{HapiParam, HapiType, seconds_to_iso};

/// Start of the generated time axis, 2020-01-01T00:00:00Z.
const EPOCH: f64 = 1_577_836_800.0;

/// Width of the generated timestamps.
const TIME_LENGTH: usize = 20;

/// Parameters of the generated dataset: time, a counter, a fill-bearing
/// scalar and a three-element vector.
#[must_use]
pub fn parameters() -> Vec<HapiParam> {
    vec![
        HapiParam::new("Time", HapiType::IsoTime).with_length(TIME_LENGTH),
        HapiParam::new("count", HapiType::Integer).with_fill("-1"),
        HapiParam::new("density", HapiType::Double).with_fill("-1e31"),
        HapiParam::new("B_GSE", HapiType::Double)
            .with_size(vec![3])
            .with_fill("-1e31"),
    ]
}

fn timestamp(row: usize) -> String {
    seconds_to_iso(EPOCH + row as f64).unwrap_or_default()
}

/// Generates `rows` one-second records as CSV, with every tenth density
/// set to fill.
#[must_use]
pub fn csv_payload(rows: usize) -> Vec<u8> {
    let mut out = String::with_capacity(rows * 64);
    for row in 0..rows {
        let density = if row % 10 == 0 { -1e31 } else { row as f64 * 0.25 };
        out.push_str(&format!(
            "{},{},{:e},{},{},\"{}\"\n",
            timestamp(row),
            row,
            density,
            row as f64 * 0.5,
            -(row as f64),
            row % 7,
        ));
    }
    out.into_bytes()
}

/// Generates the same records as [`csv_payload`] in binary form.
#[must_use]
pub fn binary_payload(rows: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(rows * (TIME_LENGTH + 4 + 8 * 4));
    for row in 0..rows {
        let mut time = timestamp(row).into_bytes();
        time.resize(TIME_LENGTH, 0);
        out.extend_from_slice(&time);
        out.extend_from_slice(&(row as i32).to_le_bytes());
        let density = if row % 10 == 0 { -1e31 } else { row as f64 * 0.25 };
        for v in [density, row as f64 * 0.5, -(row as f64), (row % 7) as f64] {
            out.extend_from_slice(&v.to_le_bytes());
        }
    }
    out
}
