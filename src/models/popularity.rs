use serde::{Deserialize, Serialize};

/// Interpolated popularity count at one record's date.
///
/// Null when the external series is unavailable, the record has no date, or
/// the date falls outside the observed range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularitySample {
    pub record_sequence_index: u32,
    pub interpolated_count: Option<f64>,
}
