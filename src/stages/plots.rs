use crate::analysis::fit::FitResults;
use crate::models::improvement::CompiledImprovement;
use crate::stages::config::Config;
use plotters::prelude::*;
use std::fs;
use std::path::Path;

const FIT_SAMPLES: usize = 100;

/// Render the fixed set of diagnostic charts into the plots directory.
pub fn render_all(
    config: &Config,
    improvements: &[CompiledImprovement],
    fits: &FitResults,
) -> Result<(), String> {
    fs::create_dir_all(&config.plots_dir)
        .map_err(|e| format!("Failed to create {}: {e}", config.plots_dir))?;

    let plots_dir = Path::new(&config.plots_dir);

    speed_over_time(&plots_dir.join("speed_over_time.png"), improvements, fits)
        .map_err(|e| format!("Failed to render speed_over_time.png: {e}"))?;
    log::info!("Saved speed_over_time.png");

    if improvements.iter().any(|i| i.cumulative_loc.is_some()) {
        speed_vs_loc(&plots_dir.join("speed_vs_loc.png"), improvements)
            .map_err(|e| format!("Failed to render speed_vs_loc.png: {e}"))?;
        log::info!("Saved speed_vs_loc.png");

        loc_over_time(&plots_dir.join("loc_over_time.png"), improvements)
            .map_err(|e| format!("Failed to render loc_over_time.png: {e}"))?;
        log::info!("Saved loc_over_time.png");
    } else {
        log::info!("No code-size data available, skipping LoC charts");
    }

    if improvements.iter().any(|i| i.stars.is_some()) {
        speed_vs_stars(&plots_dir.join("speed_vs_stars.png"), improvements)
            .map_err(|e| format!("Failed to render speed_vs_stars.png: {e}"))?;
        log::info!("Saved speed_vs_stars.png");
    } else {
        log::info!("No star data available, skipping speed_vs_stars.png");
    }

    Ok(())
}

/// 2x2 progression grid: linear, semi-log with the exponential fit, log-log
/// with the power-law fit, and time against record number.
fn speed_over_time(
    path: &Path,
    improvements: &[CompiledImprovement],
    fits: &FitResults,
) -> Result<(), Box<dyn std::error::Error>> {
    let points: Vec<(f64, f64)> = improvements
        .iter()
        .filter_map(|i| i.days_since_start.map(|d| (d, i.record_time_minutes)))
        .collect();

    if points.is_empty() {
        return Ok(());
    }

    let max_days = points.iter().map(|(d, _)| *d).fold(0.0_f64, f64::max).max(1.0);
    let max_time = points.iter().map(|(_, t)| *t).fold(0.0_f64, f64::max);
    let min_time = points
        .iter()
        .map(|(_, t)| *t)
        .fold(f64::INFINITY, f64::min)
        .max(1e-3);

    let root = BitMapBackend::new(path, (1200, 900)).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((2, 2));

    // 1. Linear scale
    {
        let mut chart = ChartBuilder::on(&areas[0])
            .caption("Training Time vs Calendar Time", ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..max_days * 1.05, 0.0..max_time * 1.1)?;

        chart
            .configure_mesh()
            .x_desc("Days since first record")
            .y_desc("Training time (minutes)")
            .draw()?;

        chart.draw_series(points.iter().map(|(d, t)| Circle::new((*d, *t), 4, BLUE.filled())))?;
    }

    // 2. Semi-log with the exponential fit
    {
        let mut chart = ChartBuilder::on(&areas[1])
            .caption("Training Time vs Days (Semi-log)", ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d(
                0.0..max_days * 1.05,
                (min_time * 0.8..max_time * 1.2).log_scale(),
            )?;

        chart
            .configure_mesh()
            .x_desc("Days since first record")
            .y_desc("Training time (minutes, log scale)")
            .draw()?;

        chart.draw_series(points.iter().map(|(d, t)| Circle::new((*d, *t), 4, BLUE.filled())))?;

        let curve: Vec<(f64, f64)> = sample_range(0.0, max_days)
            .map(|d| {
                (
                    d,
                    fits.exponential.initial_value * (fits.exponential.decay_rate * d).exp(),
                )
            })
            .collect();
        chart
            .draw_series(LineSeries::new(curve, &RED))?
            .label(format!(
                "Exponential fit (R²={:.3})",
                fits.exponential.r_squared
            ))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &RED));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }

    // 3. Log-log with the power-law fit; day 0 cannot sit on a log axis
    {
        let positive: Vec<(f64, f64)> = points.iter().copied().filter(|(d, _)| *d > 0.0).collect();

        let mut chart = ChartBuilder::on(&areas[2])
            .caption("Training Time vs Days (Log-log)", ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d(
                (1.0..max_days * 1.05).log_scale(),
                (min_time * 0.8..max_time * 1.2).log_scale(),
            )?;

        chart
            .configure_mesh()
            .x_desc("Days since first record (log scale)")
            .y_desc("Training time (minutes, log scale)")
            .draw()?;

        chart.draw_series(
            positive
                .iter()
                .map(|(d, t)| Circle::new((*d, *t), 4, BLUE.filled())),
        )?;

        let curve: Vec<(f64, f64)> = sample_range(1.0, max_days)
            .map(|d| {
                (
                    d,
                    fits.power_law.coefficient * (d + 1.0).powf(fits.power_law.exponent),
                )
            })
            .collect();
        chart
            .draw_series(LineSeries::new(curve, &GREEN))?
            .label(format!("Power law fit (R²={:.3})", fits.power_law.r_squared))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &GREEN));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;
    }

    // 4. Time against record number
    {
        let by_index: Vec<(f64, f64)> = improvements
            .iter()
            .map(|i| (i.sequence_index as f64, i.record_time_minutes))
            .collect();
        let max_index = by_index.iter().map(|(n, _)| *n).fold(0.0_f64, f64::max).max(1.0);

        let mut chart = ChartBuilder::on(&areas[3])
            .caption("Training Time vs Record Number", ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..max_index * 1.05, 0.0..max_time * 1.1)?;

        chart
            .configure_mesh()
            .x_desc("Record number")
            .y_desc("Training time (minutes)")
            .draw()?;

        chart.draw_series(
            by_index
                .iter()
                .map(|(n, t)| Circle::new((*n, *t), 4, BLUE.filled())),
        )?;
    }

    root.present()?;
    Ok(())
}

/// Time against cumulative LoC, linear and semi-log side by side.
fn speed_vs_loc(
    path: &Path,
    improvements: &[CompiledImprovement],
) -> Result<(), Box<dyn std::error::Error>> {
    let points: Vec<(f64, f64)> = improvements
        .iter()
        .filter_map(|i| i.cumulative_loc.map(|loc| (loc as f64, i.record_time_minutes)))
        .collect();

    scatter_pair(
        path,
        &points,
        "Training Time vs Lines of Code",
        "Cumulative lines of code",
    )
}

/// Time against interpolated stars, linear and semi-log side by side.
fn speed_vs_stars(
    path: &Path,
    improvements: &[CompiledImprovement],
) -> Result<(), Box<dyn std::error::Error>> {
    let points: Vec<(f64, f64)> = improvements
        .iter()
        .filter_map(|i| i.stars.map(|stars| (stars, i.record_time_minutes)))
        .collect();

    scatter_pair(
        path,
        &points,
        "Training Time vs Stars",
        "Repository stars (interpolated)",
    )
}

/// Shared layout for the two-panel linear / semi-log scatter charts.
fn scatter_pair(
    path: &Path,
    points: &[(f64, f64)],
    title: &str,
    x_desc: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    if points.is_empty() {
        return Ok(());
    }

    let max_x = points.iter().map(|(x, _)| *x).fold(0.0_f64, f64::max).max(1.0);
    let max_y = points.iter().map(|(_, y)| *y).fold(0.0_f64, f64::max);
    let min_y = points
        .iter()
        .map(|(_, y)| *y)
        .fold(f64::INFINITY, f64::min)
        .max(1e-3);

    let root = BitMapBackend::new(path, (1200, 500)).into_drawing_area();
    root.fill(&WHITE)?;
    let areas = root.split_evenly((1, 2));

    {
        let mut chart = ChartBuilder::on(&areas[0])
            .caption(title, ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..max_x * 1.05, 0.0..max_y * 1.1)?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc("Training time (minutes)")
            .draw()?;

        chart.draw_series(points.iter().map(|(x, y)| Circle::new((*x, *y), 4, BLUE.filled())))?;
    }

    {
        let mut chart = ChartBuilder::on(&areas[1])
            .caption(format!("{title} (Semi-log)"), ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..max_x * 1.05, (min_y * 0.8..max_y * 1.2).log_scale())?;

        chart
            .configure_mesh()
            .x_desc(x_desc)
            .y_desc("Training time (minutes, log scale)")
            .draw()?;

        chart.draw_series(points.iter().map(|(x, y)| Circle::new((*x, *y), 4, BLUE.filled())))?;
    }

    root.present()?;
    Ok(())
}

/// Code growth over calendar time.
fn loc_over_time(
    path: &Path,
    improvements: &[CompiledImprovement],
) -> Result<(), Box<dyn std::error::Error>> {
    let points: Vec<(f64, f64)> = improvements
        .iter()
        .filter_map(|i| match (i.days_since_start, i.cumulative_loc) {
            (Some(days), Some(loc)) => Some((days, loc as f64)),
            _ => None,
        })
        .collect();

    if points.is_empty() {
        return Ok(());
    }

    let max_days = points.iter().map(|(d, _)| *d).fold(0.0_f64, f64::max).max(1.0);
    let max_loc = points.iter().map(|(_, l)| *l).fold(0.0_f64, f64::max).max(1.0);

    let root = BitMapBackend::new(path, (1000, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Code Growth Over Time", ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(35)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..max_days * 1.05, 0.0..max_loc * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Days since first record")
        .y_desc("Cumulative lines of code")
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|(d, l)| Circle::new((*d, *l), 4, MAGENTA.filled())),
    )?;

    root.present()?;
    Ok(())
}

fn sample_range(start: f64, end: f64) -> impl Iterator<Item = f64> {
    let step = (end - start) / (FIT_SAMPLES.saturating_sub(1).max(1)) as f64;
    (0..FIT_SAMPLES).map(move |i| start + step * i as f64)
}
