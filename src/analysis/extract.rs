use crate::models::record::ImprovementRecord;
use chrono::NaiveDate;

/// Extraction result: parsed records plus the data-looking rows that had to
/// be skipped (wrong column count, unparsable time).
#[derive(Debug, Default)]
pub struct Extraction {
    pub records: Vec<ImprovementRecord>,
    pub skipped_rows: Vec<String>,
}

/// Parse every record table in the changelog text.
///
/// Tables are located by their structural separator rows, never by the prose
/// around them. Header and separator rows are ignored silently; rows that
/// carry a record number but fail to parse are reported back via
/// `skipped_rows`. A present but unparsable date aborts extraction naming
/// the offending row.
pub fn extract_records(changelog: &str) -> Result<Extraction, String> {
    let blocks = table_blocks(changelog);
    if blocks.is_empty() {
        return Err("No record table found in changelog".to_string());
    }

    let mut extraction = Extraction::default();

    for block in blocks {
        for row in block {
            match parse_row(&row)? {
                RowParse::Record(record) => extraction.records.push(record),
                RowParse::Skipped => extraction.skipped_rows.push(row),
                RowParse::NotData => {}
            }
        }
    }

    if extraction.records.is_empty() {
        return Err("Zero valid records extracted from changelog".to_string());
    }

    Ok(extraction)
}

/// Classify a row as a retiming of an existing configuration.
///
/// Phrase heuristic over the contributor and description cells; false
/// negatives are possible if the changelog words a re-measurement some
/// other way.
pub fn is_retiming(contributors: &str, description: &str) -> bool {
    let text = format!("{} {}", contributors, description).to_lowercase();
    ["not a new record", "just re-timing", "just retiming"]
        .iter()
        .any(|phrase| text.contains(phrase))
}

enum RowParse {
    Record(ImprovementRecord),
    Skipped,
    NotData,
}

/// Collect the data rows of every markdown table, one Vec per table block.
/// A block is a header line followed by a dashes-only separator row.
fn table_blocks(changelog: &str) -> Vec<Vec<String>> {
    let lines: Vec<&str> = changelog.lines().collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        if is_separator_row(lines[i]) && i > 0 && lines[i - 1].contains('|') {
            let mut rows = Vec::new();
            let mut j = i + 1;
            while j < lines.len() && lines[j].contains('|') {
                if !is_separator_row(lines[j]) {
                    rows.push(lines[j].trim().to_string());
                }
                j += 1;
            }
            blocks.push(rows);
            i = j;
        } else {
            i += 1;
        }
    }

    blocks
}

/// A separator row's cells contain nothing but dashes and alignment colons.
fn is_separator_row(line: &str) -> bool {
    let trimmed = line.trim();
    if !trimmed.contains('|') {
        return false;
    }

    let mut saw_dashes = false;
    for cell in trimmed.split('|') {
        let cell = cell.trim();
        if cell.is_empty() {
            continue;
        }
        if !cell.chars().all(|c| c == '-' || c == ':') {
            return false;
        }
        saw_dashes = true;
    }
    saw_dashes
}

/// Parse one table row: # | time | description | date | log | contributors.
fn parse_row(row: &str) -> Result<RowParse, String> {
    let cells: Vec<&str> = row
        .split('|')
        .map(str::trim)
        .filter(|cell| !cell.is_empty())
        .collect();

    // Header rows and stray fragments never start with a record number.
    let Some(sequence_index) = cells.first().and_then(|cell| cell.parse::<u32>().ok()) else {
        return Ok(RowParse::NotData);
    };

    if cells.len() < 6 {
        return Ok(RowParse::Skipped);
    }

    let (time_cell, description_cell, date_cell, log_cell, contributors_cell) =
        (cells[1], cells[2], cells[3], cells[4], cells[5]);

    let Some(record_time_minutes) = parse_time_to_minutes(time_cell) else {
        return Ok(RowParse::Skipped);
    };

    let date = parse_date(date_cell).map_err(|e| format!("Row {sequence_index}: {e}"))?;

    Ok(RowParse::Record(ImprovementRecord {
        sequence_index,
        record_time_minutes,
        description: strip_links(description_cell),
        date,
        log_link: parse_link_cell(log_cell),
        contributors: contributors_cell.to_string(),
        pr_number: extract_pr_number(row),
        is_retiming: is_retiming(contributors_cell, description_cell),
    }))
}

/// Convert a time cell to minutes. Accepts "X hours", "X minutes", and bare
/// numbers (assumed minutes).
fn parse_time_to_minutes(cell: &str) -> Option<f64> {
    let text = cell.trim().to_lowercase();

    if let Some(pos) = text.find("hour") {
        return trailing_number(&text[..pos]).map(|hours| hours * 60.0);
    }

    if let Some(pos) = text.find("minute") {
        return trailing_number(&text[..pos]);
    }

    text.parse::<f64>().ok()
}

/// The numeric token immediately preceding a unit, e.g. "3.2" in "3.2 hours".
fn trailing_number(text: &str) -> Option<f64> {
    let trimmed = text.trim_end();
    let start = trimmed
        .rfind(|c: char| !c.is_ascii_digit() && c != '.')
        .map(|pos| pos + 1)
        .unwrap_or(0);
    trimmed[start..].parse::<f64>().ok()
}

/// Parse the fixed MM/DD/YY short form into ISO YYYY-MM-DD.
/// Empty cells and "-" mean the date was never published for that row.
fn parse_date(cell: &str) -> Result<Option<String>, String> {
    let text = cell.trim();
    if text.is_empty() || text == "-" {
        return Ok(None);
    }

    NaiveDate::parse_from_str(text, "%m/%d/%y")
        .map(|date| Some(date.format("%Y-%m-%d").to_string()))
        .map_err(|e| format!("Unparsable date '{text}': {e}"))
}

/// Replace every `[text](url)` markdown link with its text.
fn strip_links(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('[') {
        let after_bracket = &rest[start..];
        if let Some(close) = after_bracket.find("](") {
            let close = start + close;
            if let Some(paren) = rest[close..].find(')') {
                out.push_str(&rest[..start]);
                out.push_str(&rest[start + 1..close]);
                rest = &rest[close + paren + 1..];
                continue;
            }
        }
        // Unmatched bracket; keep it literally.
        out.push_str(&rest[..=start]);
        rest = &rest[start + 1..];
    }

    out.push_str(rest);
    out
}

/// Take the URL out of a `[text](url)` cell, or keep the raw text; "-" and
/// empty cells mean no log was linked.
fn parse_link_cell(cell: &str) -> Option<String> {
    let text = cell.trim();
    if text.is_empty() || text == "-" {
        return None;
    }

    if let Some(open) = text.find("](") {
        if let Some(close) = text[open..].find(')') {
            return Some(text[open + 2..open + close].to_string());
        }
    }

    Some(text.to_string())
}

/// Pull-request number from the first `pull/NNN` link fragment in the row.
fn extract_pr_number(row: &str) -> Option<u32> {
    let mut rest = row;
    while let Some(pos) = rest.find("pull/") {
        let digits: String = rest[pos + 5..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if !digits.is_empty() {
            return digits.parse().ok();
        }
        rest = &rest[pos + 5..];
    }
    None
}
