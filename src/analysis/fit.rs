use crate::models::metrics::{ExponentialFit, PowerLawFit};

/// Both decay models fitted to the same (days, minutes) series.
#[derive(Debug, Clone)]
pub struct FitResults {
    pub power_law: PowerLawFit,
    pub exponential: ExponentialFit,
}

#[derive(Debug, Clone, Copy)]
struct LinearFit {
    slope: f64,
    intercept: f64,
    r_squared: f64,
}

/// Fit the power law `time = a * (days + 1)^b` and the exponential decay
/// `time = a * exp(b * days)` to the series.
///
/// Both models are linearized via logarithms and fitted by ordinary least
/// squares on ln(time), so the two R² values are directly comparable. A fit
/// that cannot proceed (too few points, non-positive times, degenerate x)
/// reports the failing model explicitly instead of degrading silently.
pub fn fit_models(days: &[f64], times: &[f64]) -> Result<FitResults, String> {
    if days.len() != times.len() {
        return Err(format!(
            "Mismatched series: {} day values vs {} time values",
            days.len(),
            times.len()
        ));
    }

    if let Some(bad) = times.iter().find(|t| **t <= 0.0 || !t.is_finite()) {
        return Err(format!(
            "Cannot fit decay models: non-positive record time {bad}"
        ));
    }

    let log_times: Vec<f64> = times.iter().map(|t| t.ln()).collect();

    // Shift by one so the first record (day 0) survives the log transform.
    let log_days: Vec<f64> = days.iter().map(|d| (d + 1.0).ln()).collect();
    let power = linear_regression(&log_days, &log_times)
        .map_err(|e| format!("Power law fit failed: {e}"))?;

    let exponential = linear_regression(days, &log_times)
        .map_err(|e| format!("Exponential fit failed: {e}"))?;

    let power_coefficient = power.intercept.exp();
    let initial_value = exponential.intercept.exp();

    Ok(FitResults {
        power_law: PowerLawFit {
            coefficient: power_coefficient,
            exponent: power.slope,
            r_squared: power.r_squared,
            formula: format!(
                "time = {power_coefficient:.4} * (days+1)^{:.4}",
                power.slope
            ),
        },
        exponential: ExponentialFit {
            initial_value,
            decay_rate: exponential.slope,
            r_squared: exponential.r_squared,
            half_life_days: (exponential.slope < 0.0)
                .then(|| -std::f64::consts::LN_2 / exponential.slope),
            formula: format!(
                "time = {initial_value:.4} * exp({:.6} * days)",
                exponential.slope
            ),
        },
    })
}

/// Ordinary least squares y = intercept + slope * x.
fn linear_regression(x: &[f64], y: &[f64]) -> Result<LinearFit, String> {
    if x.len() < 2 {
        return Err(format!("need at least 2 points, got {}", x.len()));
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut ss_xx = 0.0;
    let mut ss_yy = 0.0;
    let mut ss_xy = 0.0;
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        ss_xx += dx * dx;
        ss_yy += dy * dy;
        ss_xy += dx * dy;
    }

    if ss_xx == 0.0 {
        return Err("zero variance in x".to_string());
    }

    let slope = ss_xy / ss_xx;
    let intercept = mean_y - slope * mean_x;
    let r_squared = if ss_yy == 0.0 {
        1.0
    } else {
        (ss_xy * ss_xy) / (ss_xx * ss_yy)
    };

    Ok(LinearFit {
        slope,
        intercept,
        r_squared,
    })
}
