use serde::{Deserialize, Serialize};

/// One row extracted from the changelog record table.
///
/// Retimings are kept in the extracted artifact for audit but are excluded
/// from every downstream computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImprovementRecord {
    /// 1-based rank from the table's leading column.
    pub sequence_index: u32,
    /// Wall-clock training duration in minutes.
    pub record_time_minutes: f64,
    /// Description with markdown links stripped.
    pub description: String,
    /// ISO date (YYYY-MM-DD); absent when the table cell was empty or "-".
    pub date: Option<String>,
    /// Link or text from the log column, carried for provenance.
    pub log_link: Option<String>,
    /// Contributor cell, kept verbatim.
    pub contributors: String,
    /// Pull-request number extracted from an embedded link, when present.
    pub pr_number: Option<u32>,
    /// True when the row re-measures an existing configuration.
    pub is_retiming: bool,
}
