//! Export per-depth summaries to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream
//! plotting scripts: one row per (region, depth level), wide columns for the
//! three summarized quantities.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::AppError;
use crate::stats::RegionSummary;

/// Write per-depth summaries for every region to a CSV file.
pub fn write_summary_csv(path: &Path, regions: &[RegionSummary]) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::io(format!("Failed to create export CSV '{}': {e}", path.display()))
    })?;

    writeln!(
        file,
        "region,depth,rel_depth,half_max_median,half_max_lower,half_max_upper,\
         semi_median,semi_lower,semi_upper,residual_median,residual_lower,residual_upper,samples"
    )
    .map_err(|e| AppError::io(format!("Failed to write export CSV header: {e}")))?;

    for summary in regions {
        let span = (summary.depths - 1).max(1) as f64;
        for depth in 0..summary.depths {
            writeln!(
                file,
                "{},{},{:.6},{},{},{},{},{},{},{},{},{},{}",
                summary.region,
                depth,
                depth as f64 / span,
                csv_value(summary.half_max.median[depth]),
                csv_value(summary.half_max.lower[depth]),
                csv_value(summary.half_max.upper[depth]),
                csv_value(summary.semi.median[depth]),
                csv_value(summary.semi.lower[depth]),
                csv_value(summary.semi.upper[depth]),
                csv_value(summary.residual.median[depth]),
                csv_value(summary.residual.lower[depth]),
                csv_value(summary.residual.upper[depth]),
                summary.half_max.samples[depth],
            )
            .map_err(|e| AppError::io(format!("Failed to write export CSV row: {e}")))?;
        }
    }

    Ok(())
}

/// NaN summaries (columns with no successful iterations) export as empty
/// cells rather than the string "NaN".
fn csv_value(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.10}")
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{PeakSummary, ScalarSummary, Summary};

    fn region_summary() -> RegionSummary {
        let per_depth = Summary {
            median: vec![0.2, 0.25],
            lower: vec![0.1, 0.2],
            upper: vec![0.3, 0.3],
            samples: vec![10, 9],
        };
        let scalar = ScalarSummary {
            median: 0.5,
            lower: 0.4,
            upper: 0.6,
            samples: 10,
        };
        RegionSummary {
            region: "v1".to_string(),
            iterations: 10,
            depths: 2,
            num_x: 3,
            failed_fits: 1,
            attempted_fits: 20,
            half_max: per_depth.clone(),
            semi: per_depth.clone(),
            residual: per_depth.clone(),
            residual_grand: scalar,
            curves: Summary {
                median: vec![0.0; 6],
                lower: vec![0.0; 6],
                upper: vec![0.0; 6],
                samples: vec![10; 6],
            },
            peak_half_max: PeakSummary {
                stats: scalar,
                excluded: 1,
            },
            peak_semi: PeakSummary {
                stats: scalar,
                excluded: 0,
            },
        }
    }

    #[test]
    fn csv_has_header_and_one_row_per_depth() {
        let path = std::env::temp_dir().join(format!("crfd-export-{}.csv", std::process::id()));
        write_summary_csv(&path, &[region_summary()]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("region,depth,rel_depth"));
        assert!(lines[1].starts_with("v1,0,0.000000"));
        assert!(lines[2].starts_with("v1,1,1.000000"));
    }

    #[test]
    fn nan_cells_export_empty() {
        assert_eq!(csv_value(f64::NAN), "");
        assert_eq!(csv_value(0.25), "0.2500000000");
    }
}
