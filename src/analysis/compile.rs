use crate::analysis::popularity::{sample_popularity, StarHistory};
use crate::models::code_size::CodeSizeSample;
use crate::models::improvement::{CompiledDataset, CompiledImprovement};
use crate::models::record::ImprovementRecord;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Join records, code sizes, and popularity samples into the canonical
/// improvements table. Retimings are dropped; records missing a code-size
/// sample keep a null rather than being dropped. The non-increasing
/// record-time invariant is re-checked here and violations are recorded as
/// warnings in the output.
pub fn compile_improvements(
    records: &[ImprovementRecord],
    sizes: &[CodeSizeSample],
    stars: Option<&StarHistory>,
) -> CompiledDataset {
    let size_by_index: HashMap<u32, &CodeSizeSample> = sizes
        .iter()
        .map(|sample| (sample.record_sequence_index, sample))
        .collect();

    let star_samples = sample_popularity(stars, records);
    let stars_by_index: HashMap<u32, Option<f64>> = star_samples
        .iter()
        .map(|sample| (sample.record_sequence_index, sample.interpolated_count))
        .collect();

    let start_date = records
        .iter()
        .filter(|record| !record.is_retiming)
        .find_map(|record| parse_iso_date(record.date.as_deref()));

    let mut improvements: Vec<CompiledImprovement> = Vec::new();
    let mut warnings = Vec::new();

    for record in records.iter().filter(|record| !record.is_retiming) {
        let record_date = parse_iso_date(record.date.as_deref());
        let days_since_start = match (record_date, start_date) {
            (Some(date), Some(start)) => Some((date - start).num_days() as f64),
            _ => None,
        };

        if let Some(previous) = improvements.last() {
            if record.record_time_minutes > previous.record_time_minutes {
                warnings.push(format!(
                    "Record #{} time {:.3} min exceeds previous record #{} at {:.3} min",
                    record.sequence_index,
                    record.record_time_minutes,
                    previous.sequence_index,
                    previous.record_time_minutes,
                ));
            }
        }

        improvements.push(CompiledImprovement {
            sequence_index: record.sequence_index,
            date: record.date.clone(),
            days_since_start,
            record_time_minutes: record.record_time_minutes,
            cumulative_loc: size_by_index
                .get(&record.sequence_index)
                .and_then(|sample| sample.line_count),
            stars: stars_by_index
                .get(&record.sequence_index)
                .copied()
                .flatten(),
            description: record.description.clone(),
            pr_number: record.pr_number,
        });
    }

    CompiledDataset {
        improvements,
        warnings,
    }
}

fn parse_iso_date(date: Option<&str>) -> Option<NaiveDate> {
    date.and_then(|text| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(index: u32, time: f64, date: &str, retiming: bool) -> ImprovementRecord {
        ImprovementRecord {
            sequence_index: index,
            record_time_minutes: time,
            description: format!("change {index}"),
            date: Some(date.to_string()),
            log_link: None,
            contributors: "@dev".to_string(),
            pr_number: None,
            is_retiming: retiming,
        }
    }

    #[test]
    fn drops_retimings_and_computes_day_offsets() {
        let records = vec![
            record(1, 45.0, "2024-01-01", false),
            record(2, 30.0, "2024-01-10", false),
            record(3, 20.0, "2024-01-20", true),
            record(4, 15.0, "2024-01-30", false),
            record(5, 10.0, "2024-02-10", false),
        ];

        let dataset = compile_improvements(&records, &[], None);

        assert_eq!(dataset.improvements.len(), 4);
        let days: Vec<f64> = dataset
            .improvements
            .iter()
            .map(|i| i.days_since_start.expect("days"))
            .collect();
        assert_eq!(days, vec![0.0, 9.0, 29.0, 40.0]);
        assert!(dataset.warnings.is_empty());
    }

    #[test]
    fn monotonicity_violations_are_flagged_not_dropped() {
        let records = vec![
            record(1, 45.0, "2024-01-01", false),
            record(2, 50.0, "2024-01-10", false),
        ];

        let dataset = compile_improvements(&records, &[], None);

        assert_eq!(dataset.improvements.len(), 2);
        assert_eq!(dataset.warnings.len(), 1);
        assert!(dataset.warnings[0].contains("Record #2"));
    }

    #[test]
    fn records_without_code_size_keep_a_null() {
        let records = vec![
            record(1, 45.0, "2024-01-01", false),
            record(2, 30.0, "2024-01-10", false),
        ];
        let sizes = vec![CodeSizeSample {
            record_sequence_index: 2,
            date: Some("2024-01-10".to_string()),
            commit: Some("abc1234".to_string()),
            file: Some("train_gpt.py".to_string()),
            line_count: Some(420),
        }];

        let dataset = compile_improvements(&records, &sizes, None);

        assert_eq!(dataset.improvements[0].cumulative_loc, None);
        assert_eq!(dataset.improvements[1].cumulative_loc, Some(420));
    }
}
