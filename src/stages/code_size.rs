use crate::analysis::code_size::resolve_file_at_date;
use crate::models::code_size::CodeSizeSample;
use crate::models::record::ImprovementRecord;
use crate::stages::config::Config;
use crate::stages::{read_json, write_json};
use chrono::NaiveDate;
use git2::Repository;

/// Code-size stage: `records.json` plus the history clone in,
/// `code_size.json` out. Records the resolver cannot serve keep a row of
/// nulls so the gap stays visible downstream.
pub fn run(config: &Config) -> Result<(), String> {
    let records: Vec<ImprovementRecord> = read_json(&config.records_path())?;

    let repo = Repository::open(&config.history_repo).map_err(|e| {
        format!(
            "NOT_GIT_REPO: failed to open history clone {}: {e}",
            config.history_repo
        )
    })?;

    let mut samples = Vec::new();

    for record in records.iter().filter(|record| !record.is_retiming) {
        let sample = resolve_record(&repo, config, record)?;
        samples.push(sample);
    }

    let resolved = samples.iter().filter(|s| s.line_count.is_some()).count();
    write_json(&config.code_size_path(), &samples)?;

    log::info!(
        "Resolved code size for {}/{} records to {}",
        resolved,
        samples.len(),
        config.code_size_path().display()
    );

    Ok(())
}

fn resolve_record(
    repo: &Repository,
    config: &Config,
    record: &ImprovementRecord,
) -> Result<CodeSizeSample, String> {
    let Some(date_text) = record.date.as_deref() else {
        log::warn!("Record #{}: no date available", record.sequence_index);
        return Ok(null_sample(record));
    };

    let date = NaiveDate::parse_from_str(date_text, "%Y-%m-%d").map_err(|e| {
        format!(
            "Record #{}: bad date '{date_text}' in records artifact: {e}",
            record.sequence_index
        )
    })?;

    match resolve_file_at_date(
        repo,
        &config.training_file,
        &config.legacy_training_file,
        date,
    )? {
        Some(resolved) => {
            log::info!(
                "Record #{} ({date_text}): {} lines @ {} ({})",
                record.sequence_index,
                resolved.line_count,
                resolved.commit,
                resolved.file
            );
            Ok(CodeSizeSample {
                record_sequence_index: record.sequence_index,
                date: record.date.clone(),
                commit: Some(resolved.commit),
                file: Some(resolved.file),
                line_count: Some(resolved.line_count),
            })
        }
        None => {
            log::warn!(
                "Record #{} ({date_text}): no history at or before this date",
                record.sequence_index
            );
            Ok(null_sample(record))
        }
    }
}

fn null_sample(record: &ImprovementRecord) -> CodeSizeSample {
    CodeSizeSample {
        record_sequence_index: record.sequence_index,
        date: record.date.clone(),
        commit: None,
        file: None,
        line_count: None,
    }
}
