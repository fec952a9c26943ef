use crate::models::popularity::PopularitySample;
use crate::models::record::ImprovementRecord;
use chrono::NaiveDate;
use std::path::Path;

/// Externally exported (date, stars) series, sorted by date.
///
/// Expected format, per star-history.com exports: first column an ISO date,
/// second column a star count. Header rows are handled by the reader.
#[derive(Debug, Clone)]
pub struct StarHistory {
    points: Vec<(NaiveDate, f64)>,
}

impl StarHistory {
    pub fn load(path: &Path) -> Result<StarHistory, String> {
        if !path.exists() {
            return Err(format!("Star history file not found: {}", path.display()));
        }

        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| format!("Failed to read star history {}: {e}", path.display()))?;

        let mut points = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|e| format!("Malformed star history row: {e}"))?;
            let date_cell = row.get(0).unwrap_or("").trim();
            let stars_cell = row.get(1).unwrap_or("").trim();

            let date = NaiveDate::parse_from_str(date_cell, "%Y-%m-%d")
                .map_err(|e| format!("Bad star history date '{date_cell}': {e}"))?;
            let stars = stars_cell
                .parse::<f64>()
                .map_err(|e| format!("Bad star count '{stars_cell}': {e}"))?;

            points.push((date, stars));
        }

        if points.is_empty() {
            return Err(format!("Star history {} has no data rows", path.display()));
        }

        points.sort_by_key(|(date, _)| *date);
        Ok(StarHistory { points })
    }

    pub fn from_points(mut points: Vec<(NaiveDate, f64)>) -> StarHistory {
        points.sort_by_key(|(date, _)| *date);
        StarHistory { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Linear interpolation between the bracketing samples; exact at sample
    /// points. Dates before the first or after the last observation yield
    /// None, never an extrapolated number.
    pub fn interpolate_at(&self, date: NaiveDate) -> Option<f64> {
        let idx = self.points.partition_point(|(d, _)| *d <= date);
        if idx == 0 {
            return None;
        }

        let (before_date, before_stars) = self.points[idx - 1];
        if before_date == date {
            return Some(before_stars);
        }

        if idx == self.points.len() {
            return None;
        }

        let (after_date, after_stars) = self.points[idx];
        let span = (after_date - before_date).num_days() as f64;
        if span == 0.0 {
            return Some(before_stars);
        }

        let offset = (date - before_date).num_days() as f64;
        Some(before_stars + (after_stars - before_stars) * offset / span)
    }
}

/// One PopularitySample per non-retiming record; uniformly null when the
/// external series is absent.
pub fn sample_popularity(
    history: Option<&StarHistory>,
    records: &[ImprovementRecord],
) -> Vec<PopularitySample> {
    records
        .iter()
        .filter(|record| !record.is_retiming)
        .map(|record| PopularitySample {
            record_sequence_index: record.sequence_index,
            interpolated_count: history.and_then(|h| {
                record
                    .date
                    .as_deref()
                    .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
                    .and_then(|date| h.interpolate_at(date))
            }),
        })
        .collect()
}
