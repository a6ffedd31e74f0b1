//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/bootstrap code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::domain::ModelKind;
use crate::stats::{PeakSummary, RegionSummary, ScalarSummary};

/// Above this failure fraction the report carries a warning: percentile
/// intervals from a thinned iteration set are still valid but weaker, and
/// the reader should know.
pub const FAILURE_WARN_FRACTION: f64 = 0.05;

/// Format the full run summary (per-region tables + peak positions).
pub fn format_run_summary(
    regions: &[RegionSummary],
    model: ModelKind,
    ci_lower: f64,
    ci_upper: f64,
) -> String {
    let mut out = String::new();

    out.push_str("=== crfd - bootstrapped contrast response fitting ===\n");
    out.push_str(&format!("Model: {}\n", model.display_name()));
    out.push_str(&format!("Percentile interval: {ci_lower}%..{ci_upper}%\n"));

    for summary in regions {
        out.push('\n');
        out.push_str(&format_region(summary));
    }

    out
}

fn format_region(summary: &RegionSummary) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "-- {} ({} depth levels, {} iterations) --\n",
        summary.region, summary.depths, summary.iterations
    ));
    out.push_str(&format!(
        "fits: {}/{} ok\n",
        summary.attempted_fits - summary.failed_fits,
        summary.attempted_fits
    ));

    out.push_str("depth  rel    half-max [lo, up]          semisat [lo, up]           residual [lo, up]\n");
    let span = (summary.depths - 1).max(1) as f64;
    for depth in 0..summary.depths {
        out.push_str(&format!(
            "{:<6} {:<6.2} {} {} {}\n",
            depth,
            depth as f64 / span,
            interval(
                summary.half_max.median[depth],
                summary.half_max.lower[depth],
                summary.half_max.upper[depth]
            ),
            interval(
                summary.semi.median[depth],
                summary.semi.lower[depth],
                summary.semi.upper[depth]
            ),
            interval(
                summary.residual.median[depth],
                summary.residual.lower[depth],
                summary.residual.upper[depth]
            ),
        ));
    }

    out.push_str(&format!(
        "peak (half-max): {}\n",
        peak_line(&summary.peak_half_max)
    ));
    out.push_str(&format!(
        "peak (semisat):  {}\n",
        peak_line(&summary.peak_semi)
    ));
    out.push_str(&format!(
        "mean residual variance: {}\n",
        scalar_line(&summary.residual_grand)
    ));

    if summary.failure_rate() > FAILURE_WARN_FRACTION {
        out.push_str(&format!(
            "WARNING: {:.1}% of fits failed; summaries cover successful iterations only.\n",
            100.0 * summary.failure_rate()
        ));
    }

    out
}

fn interval(median: f64, lower: f64, upper: f64) -> String {
    if median.is_finite() {
        format!("{median:.4} [{lower:.4}, {upper:.4}]")
    } else {
        "n/a".to_string()
    }
}

fn scalar_line(s: &ScalarSummary) -> String {
    if s.samples == 0 {
        "n/a (no successful iterations)".to_string()
    } else {
        format!("{:.4} [{:.4}, {:.4}] (n={})", s.median, s.lower, s.upper, s.samples)
    }
}

fn peak_line(p: &PeakSummary) -> String {
    if p.excluded > 0 {
        format!("{} (excluded {})", scalar_line(&p.stats), p.excluded)
    } else {
        scalar_line(&p.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{PeakSummary, ScalarSummary, Summary};

    fn summary_with_failures(failed: usize, attempted: usize) -> RegionSummary {
        let per_depth = Summary {
            median: vec![0.25, 0.3],
            lower: vec![0.2, 0.25],
            upper: vec![0.3, 0.35],
            samples: vec![attempted / 2; 2],
        };
        let scalar = ScalarSummary {
            median: 0.5,
            lower: 0.4,
            upper: 0.6,
            samples: attempted / 2,
        };
        RegionSummary {
            region: "v1".to_string(),
            iterations: attempted / 2,
            depths: 2,
            num_x: 2,
            failed_fits: failed,
            attempted_fits: attempted,
            half_max: per_depth.clone(),
            semi: per_depth.clone(),
            residual: per_depth,
            residual_grand: scalar,
            curves: Summary {
                median: vec![0.0; 4],
                lower: vec![0.0; 4],
                upper: vec![0.0; 4],
                samples: vec![attempted / 2; 4],
            },
            peak_half_max: PeakSummary {
                stats: scalar,
                excluded: 0,
            },
            peak_semi: PeakSummary {
                stats: scalar,
                excluded: 2,
            },
        }
    }

    #[test]
    fn report_names_the_region_and_counts() {
        let text = format_run_summary(
            &[summary_with_failures(0, 100)],
            ModelKind::Power,
            2.5,
            97.5,
        );
        assert!(text.contains("-- v1 (2 depth levels"));
        assert!(text.contains("fits: 100/100 ok"));
        assert!(text.contains("Model: power"));
        assert!(text.contains("excluded 2"));
        assert!(!text.contains("WARNING"));
    }

    #[test]
    fn high_failure_rate_triggers_warning() {
        let text = format_run_summary(
            &[summary_with_failures(10, 100)],
            ModelKind::Hyper,
            2.5,
            97.5,
        );
        assert!(text.contains("fits: 90/100 ok"));
        assert!(text.contains("WARNING: 10.0% of fits failed"));
    }
}
