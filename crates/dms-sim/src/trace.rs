//! Landmark trace files
//!
//! One JSON object per line: `{"t": <ms>, "landmarks": [[x, y], ...] | null}`.
//! Blank lines are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use dms::source::DetectorResult;
use dms::{LandmarkFrame, Point};
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Trace errors
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to open trace {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read trace: {0}")]
    Read(#[from] std::io::Error),

    #[error("Malformed trace line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },

    #[error("Timestamp went backwards on line {line}: {ts}ms after {previous}ms")]
    NonMonotonic { line: usize, ts: u64, previous: u64 },
}

#[derive(Debug, Deserialize)]
struct TraceLine {
    t: u64,
    landmarks: Option<Vec<[f64; 2]>>,
}

impl From<TraceLine> for DetectorResult {
    fn from(line: TraceLine) -> Self {
        DetectorResult {
            timestamp_ms: line.t,
            landmarks: line.landmarks.map(|points| {
                LandmarkFrame::new(points.into_iter().map(|[x, y]| Point::new(x, y)).collect())
            }),
        }
    }
}

/// Parse a whole trace. Timestamps must not decrease.
pub fn parse_trace<R: BufRead>(reader: R) -> Result<Vec<DetectorResult>, TraceError> {
    let mut results = Vec::new();
    let mut previous: Option<u64> = None;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let number = index + 1;
        let parsed: TraceLine = serde_json::from_str(&line).map_err(|source| TraceError::Parse {
            line: number,
            source,
        })?;

        if let Some(previous) = previous.filter(|&p| parsed.t < p) {
            return Err(TraceError::NonMonotonic {
                line: number,
                ts: parsed.t,
                previous,
            });
        }
        previous = Some(parsed.t);
        results.push(parsed.into());
    }

    Ok(results)
}

/// Read and parse a trace file
pub fn read_trace(path: &Path) -> Result<Vec<DetectorResult>, TraceError> {
    let file = File::open(path).map_err(|source| TraceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let results = parse_trace(BufReader::new(file))?;
    info!("Loaded {} frames from {}", results.len(), path.display());
    Ok(results)
}
