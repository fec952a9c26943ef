use crate::analysis::extract::extract_records;
use crate::stages::config::Config;
use crate::stages::write_json;
use std::fs;

/// Extract stage: changelog markdown in, `records.json` out.
pub fn run(config: &Config) -> Result<(), String> {
    let changelog = fs::read_to_string(&config.changelog)
        .map_err(|e| format!("Failed to read changelog {}: {e}", config.changelog))?;

    let extraction = extract_records(&changelog)?;

    for row in &extraction.skipped_rows {
        log::warn!("Skipped malformed row: {row}");
    }
    if !extraction.skipped_rows.is_empty() {
        log::warn!("Skipped {} malformed row(s)", extraction.skipped_rows.len());
    }

    let retimings = extraction.records.iter().filter(|r| r.is_retiming).count();
    let improvements = extraction.records.len() - retimings;
    if improvements == 0 {
        return Err("Changelog contains no improvement records, only retimings".to_string());
    }

    write_json(&config.records_path(), &extraction.records)?;

    log::info!(
        "Extracted {} records ({} improvements, {} retimings) to {}",
        extraction.records.len(),
        improvements,
        retimings,
        config.records_path().display()
    );

    if let (Some(first), Some(last)) = (extraction.records.first(), extraction.records.last()) {
        log::info!(
            "First record: #{} at {:.2} min, latest: #{} at {:.3} min",
            first.sequence_index,
            first.record_time_minutes,
            last.sequence_index,
            last.record_time_minutes
        );
    }

    Ok(())
}
