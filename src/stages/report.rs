use crate::analysis::fit::fit_models;
use crate::models::improvement::{CompiledDataset, CompiledImprovement};
use crate::models::metrics::{DataSummary, DateRange, RegressionMetrics, TimeRange};
use crate::stages::config::Config;
use crate::stages::{plots, read_json, write_json};

/// Report stage: fit both decay models to `improvements.json`, write
/// `metrics.json`, and render the diagnostic charts.
pub fn run(config: &Config) -> Result<(), String> {
    let dataset: CompiledDataset = read_json(&config.improvements_path())?;
    let improvements = &dataset.improvements;

    let fittable: Vec<&CompiledImprovement> = improvements
        .iter()
        .filter(|i| i.days_since_start.is_some())
        .collect();

    if fittable.len() < 2 {
        return Err(format!(
            "Need at least 2 dated improvements to fit, got {}",
            fittable.len()
        ));
    }

    let days: Vec<f64> = fittable.iter().filter_map(|i| i.days_since_start).collect();
    let times: Vec<f64> = fittable.iter().map(|i| i.record_time_minutes).collect();

    let fits = fit_models(&days, &times)?;

    log::info!("Power law: {} (R² = {:.4})", fits.power_law.formula, fits.power_law.r_squared);
    log::info!(
        "Exponential: {} (R² = {:.4})",
        fits.exponential.formula,
        fits.exponential.r_squared
    );
    if let Some(half_life) = fits.exponential.half_life_days {
        log::info!("Exponential half-life: {half_life:.1} days");
    }

    note_anomalies(&fittable);

    let metrics = RegressionMetrics {
        data_summary: build_summary(improvements, &days, &times),
        power_law: fits.power_law.clone(),
        exponential: fits.exponential.clone(),
    };
    write_json(&config.metrics_path(), &metrics)?;
    log::info!("Saved metrics to {}", config.metrics_path().display());

    plots::render_all(config, improvements, &fits)?;

    Ok(())
}

/// Large single-step jumps and any time regressions, surfaced for a human
/// reading the log next to the charts.
fn note_anomalies(fittable: &[&CompiledImprovement]) {
    for pair in fittable.windows(2) {
        let (previous, current) = (pair[0], pair[1]);

        if previous.record_time_minutes / current.record_time_minutes > 2.0 {
            log::info!(
                "Record #{}: large jump from {:.2} to {:.2} min ({:.1}x improvement)",
                current.sequence_index,
                previous.record_time_minutes,
                current.record_time_minutes,
                previous.record_time_minutes / current.record_time_minutes
            );
        }

        if current.record_time_minutes > previous.record_time_minutes {
            log::warn!(
                "Record #{}: time increased from {:.3} to {:.3} min",
                current.sequence_index,
                previous.record_time_minutes,
                current.record_time_minutes
            );
        }
    }
}

fn build_summary(
    improvements: &[CompiledImprovement],
    days: &[f64],
    times: &[f64],
) -> DataSummary {
    let records_with_loc = improvements
        .iter()
        .filter(|i| i.cumulative_loc.is_some())
        .count();
    let records_with_stars = improvements.iter().filter(|i| i.stars.is_some()).count();

    let dated: Vec<&CompiledImprovement> = improvements
        .iter()
        .filter(|i| i.date.is_some())
        .collect();

    let initial_minutes = times.first().copied().unwrap_or(0.0);
    let final_minutes = times.last().copied().unwrap_or(0.0);

    DataSummary {
        total_records: improvements.len(),
        records_with_loc,
        records_with_stars,
        date_range: DateRange {
            start: dated.first().and_then(|i| i.date.clone()),
            end: dated.last().and_then(|i| i.date.clone()),
            total_days: days.last().copied().unwrap_or(0.0),
        },
        time_range: TimeRange {
            initial_minutes,
            final_minutes,
            improvement_factor: if final_minutes > 0.0 {
                initial_minutes / final_minutes
            } else {
                0.0
            },
        },
    }
}
