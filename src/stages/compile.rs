use crate::analysis::compile::compile_improvements;
use crate::analysis::popularity::StarHistory;
use crate::models::code_size::CodeSizeSample;
use crate::models::record::ImprovementRecord;
use crate::stages::config::Config;
use crate::stages::{read_json, write_json};
use std::path::Path;

/// Compile stage: join the extracted records, code sizes, and the optional
/// star history into `improvements.json`. A missing or unreadable star
/// export degrades this component to nulls; it never fails the pipeline.
pub fn run(config: &Config) -> Result<(), String> {
    let records: Vec<ImprovementRecord> = read_json(&config.records_path())?;
    let sizes: Vec<CodeSizeSample> = read_json(&config.code_size_path())?;

    let stars = match StarHistory::load(Path::new(&config.star_history)) {
        Ok(history) => {
            log::info!("Loaded star history: {} data points", history.len());
            Some(history)
        }
        Err(e) => {
            log::warn!("No star history available ({e}); stars column will be empty");
            None
        }
    };

    let dataset = compile_improvements(&records, &sizes, stars.as_ref());

    for warning in &dataset.warnings {
        log::warn!("{warning}");
    }

    let with_loc = dataset
        .improvements
        .iter()
        .filter(|i| i.cumulative_loc.is_some())
        .count();
    let with_stars = dataset
        .improvements
        .iter()
        .filter(|i| i.stars.is_some())
        .count();

    write_json(&config.improvements_path(), &dataset)?;

    log::info!(
        "Compiled {} improvements to {} ({} with LoC, {} with stars)",
        dataset.improvements.len(),
        config.improvements_path().display(),
        with_loc,
        with_stars
    );

    Ok(())
}
