use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerLawFit {
    pub coefficient: f64,
    pub exponent: f64,
    pub r_squared: f64,
    pub formula: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExponentialFit {
    pub initial_value: f64,
    pub decay_rate: f64,
    pub r_squared: f64,
    /// -ln(2) / decay_rate, present only when the fitted rate is negative.
    pub half_life_days: Option<f64>,
    pub formula: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
    pub total_days: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeRange {
    pub initial_minutes: f64,
    pub final_minutes: f64,
    pub improvement_factor: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSummary {
    pub total_records: usize,
    pub records_with_loc: usize,
    pub records_with_stars: usize,
    pub date_range: DateRange,
    pub time_range: TimeRange,
}

/// The regression-metrics artifact: both fits side by side, no winner picked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub data_summary: DataSummary,
    pub power_law: PowerLawFit,
    pub exponential: ExponentialFit,
}
