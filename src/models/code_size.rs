use serde::{Deserialize, Serialize};

/// Point-in-time size of the designated training file for one record.
///
/// All resolution fields are null when no history exists at or before the
/// record date (the earliest records predate the tracked project).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeSizeSample {
    pub record_sequence_index: u32,
    pub date: Option<String>,
    /// Abbreviated commit id used for the lookup, for traceability.
    pub commit: Option<String>,
    /// Filename the count came from (primary or legacy name).
    pub file: Option<String>,
    pub line_count: Option<usize>,
}
