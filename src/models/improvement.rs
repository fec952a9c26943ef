use serde::{Deserialize, Serialize};

/// One fully joined improvement row: record, code size, and popularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledImprovement {
    pub sequence_index: u32,
    pub date: Option<String>,
    /// Real-valued days between this record's date and the first record's.
    pub days_since_start: Option<f64>,
    pub record_time_minutes: f64,
    pub cumulative_loc: Option<usize>,
    pub stars: Option<f64>,
    pub description: String,
    pub pr_number: Option<u32>,
}

/// The canonical joined table plus any invariant violations found while
/// building it. Warnings are recorded, never corrected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledDataset {
    pub improvements: Vec<CompiledImprovement>,
    pub warnings: Vec<String>,
}
