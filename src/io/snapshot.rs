//! Read/write bootstrap snapshot files.
//!
//! A snapshot is the "portable" representation of an expensive bootstrap:
//! the raw all-iterations arrays keyed by region, plus the model and
//! contrast levels they were produced under. Re-aggregating (different
//! percentile bounds, different peak smoothing) only needs this file, not a
//! re-run of ten thousand fits.
//!
//! The schema is defined by `domain::SnapshotFile`.

use std::fs::File;
use std::path::Path;

use chrono::Local;

use crate::domain::{BootRun, ModelKind, SnapshotFile};
use crate::error::AppError;

/// Write a snapshot JSON file.
pub fn write_snapshot(
    path: &Path,
    model: ModelKind,
    contrasts: &[f64],
    runs: &[BootRun],
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::io(format!("Failed to create snapshot '{}': {e}", path.display()))
    })?;

    let snapshot = SnapshotFile {
        tool: "crfd".to_string(),
        created: Local::now().date_naive(),
        model,
        contrasts: contrasts.to_vec(),
        runs: runs.to_vec(),
    };

    serde_json::to_writer(file, &snapshot)
        .map_err(|e| AppError::io(format!("Failed to write snapshot: {e}")))?;

    Ok(())
}

/// Read a snapshot JSON file.
pub fn read_snapshot(path: &Path) -> Result<SnapshotFile, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::io(format!("Failed to open snapshot '{}': {e}", path.display()))
    })?;
    let snapshot: SnapshotFile = serde_json::from_reader(file)
        .map_err(|e| AppError::io(format!("Invalid snapshot '{}': {e}", path.display())))?;

    for run in &snapshot.runs {
        validate_run_shape(run)?;
    }
    Ok(snapshot)
}

/// A snapshot edited or truncated by hand should fail loudly, not corrupt
/// percentiles.
fn validate_run_shape(run: &BootRun) -> Result<(), AppError> {
    let ok = run.half_max.iters == run.iterations
        && run.half_max.cols == run.depths
        && run.semi.iters == run.iterations
        && run.semi.cols == run.depths
        && run.curves.iters == run.iterations
        && run.curves.cols == run.depths * run.num_x
        && run.residuals.iters == run.iterations
        && run.residuals.cols == run.conditions * run.depths;
    if !ok {
        return Err(AppError::io(format!(
            "Snapshot region '{}' has inconsistent array shapes.",
            run.region
        )));
    }
    Ok(())
}
