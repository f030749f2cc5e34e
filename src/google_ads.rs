use csv::{ReaderBuilder, StringRecord};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;

use crate::error::AppError;

pub const GOOGLE_ADS_CSV: &str = "data.csv";
pub const CAMPAIGN_CSV: &str = "campaign.csv";

/// Report title and date-range lines that Google Ads puts above the header.
pub const PREAMBLE_ROWS: usize = 2;

pub type CsvRow = Map<String, Value>;

/// Reads a Google Ads export into one JSON object per row, all cells as strings.
///
/// Columns with neither a header nor any value are dropped.
pub fn load_report(path: &Path) -> Result<Vec<CsvRow>, AppError> {
    if !path.exists() {
        return Err(AppError::NotFound(format!("File {} not found", path.display())));
    }

    let content = fs::read_to_string(path)
        .map_err(|e| AppError::Internal(format!("Failed to read {}: {}", path.display(), e)))?;
    let rows = parse_report(&content)?;

    tracing::debug!(path = %path.display(), rows = rows.len(), "google ads report loaded");
    Ok(rows)
}

pub fn parse_report(content: &str) -> Result<Vec<CsvRow>, AppError> {
    let body = content.splitn(PREAMBLE_ROWS + 1, '\n').nth(PREAMBLE_ROWS).unwrap_or("");

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let records = reader
        .records()
        .collect::<Result<Vec<StringRecord>, _>>()
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let Some((header, data)) = records.split_first() else {
        return Ok(Vec::new());
    };

    let headers: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();
    let width = records.iter().map(StringRecord::len).max().unwrap_or(0);

    let kept: Vec<(usize, String)> = (0..width)
        .filter(|&col| {
            let named = headers.get(col).is_some_and(|h| !h.is_empty());
            named || data.iter().any(|row| row.get(col).is_some_and(|cell| !cell.is_empty()))
        })
        .map(|col| (col, column_name(&headers, col)))
        .collect();

    let rows: Vec<CsvRow> = data
        .iter()
        .map(|row| {
            kept.iter()
                .map(|(col, key)| {
                    let cell = row.get(*col).unwrap_or_default().to_string();
                    (key.clone(), Value::String(cell))
                })
                .collect::<CsvRow>()
        })
        .collect();

    Ok(rows)
}

/// Blank headers become `Unnamed: <index>`; a repeated header gets a `.<n>` suffix.
fn column_name(headers: &[String], col: usize) -> String {
    let name = |index: usize| match headers.get(index).map(String::as_str) {
        Some(header) if !header.is_empty() => header.to_string(),
        _ => format!("Unnamed: {}", index),
    };

    let base = name(col);
    let earlier = (0..col).filter(|&index| name(index) == base).count();
    if earlier == 0 {
        base
    } else {
        format!("{}.{}", base, earlier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const EXPORT: &str = "Campaign report\n\
        \"January 1, 2024 - January 31, 2024\"\n\
        Campaign , Clicks,,Cost\n\
        Brand,120,,45.10\n\
        Generic,\"1,024\",,99.00\n";

    #[test]
    fn skips_preamble_and_drops_empty_columns() {
        let rows = parse_report(EXPORT).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({ "Campaign": "Brand", "Clicks": "120", "Cost": "45.10" })
        );
        assert_eq!(rows[1]["Clicks"], "1,024");
    }

    #[test]
    fn blank_and_repeated_headers_keep_every_column() {
        let rows = parse_report("t\nd\nCampaign,,,Clicks,Clicks\nBrand,x,y,1,2\n").unwrap();

        assert_eq!(
            Value::Object(rows[0].clone()),
            json!({
                "Campaign": "Brand",
                "Unnamed: 1": "x",
                "Unnamed: 2": "y",
                "Clicks": "1",
                "Clicks.1": "2"
            })
        );
    }

    #[test]
    fn short_rows_fill_with_empty_strings() {
        let rows = parse_report("t\nd\nA,B\n1\n").unwrap();
        assert_eq!(Value::Object(rows[0].clone()), json!({ "A": "1", "B": "" }));
    }

    #[test]
    fn preamble_only_is_empty() {
        assert!(parse_report("title\nrange\n").unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(GOOGLE_ADS_CSV);

        match load_report(&path) {
            Err(AppError::NotFound(message)) => assert!(message.contains("data.csv")),
            other => panic!("expected NotFound, got {:?}", other),
        }
    }
}
