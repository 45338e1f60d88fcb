//! `record`: predictions for stored movie records
//!
//! A record file holds one movie document, or an array of them, in the
//! shape the movie database stores (`title`, `director`, `actors`, `genre`,
//! `budget`, `release_year`, `imdb_score`, ...). Keys the model has no use
//! for are ignored.

use anyhow::{bail, Context, Result};
use predictor_lib::{RawAttributes, RawValue};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tabled::Tabled;

use super::predict::print_prediction;
use super::Backend;
use crate::output::{format_currency, print_error, print_json, print_table, OutputFormat};

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Many(Vec<RawAttributes>),
    One(RawAttributes),
}

/// One line of the record results table
#[derive(Debug, Serialize, Tabled)]
struct RecordRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Predicted Box Office")]
    revenue: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// Read the records in `path`
pub fn read_records(path: &Path) -> Result<Vec<RawAttributes>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read record file {}", path.display()))?;
    let parsed: RecordFile = serde_json::from_str(&content)
        .with_context(|| format!("{} is not a JSON movie record", path.display()))?;

    Ok(match parsed {
        RecordFile::Many(records) => records,
        RecordFile::One(record) => vec![record],
    })
}

fn title_of(record: &RawAttributes, index: usize) -> String {
    match record.get("title") {
        Some(RawValue::Text(title)) => title.clone(),
        _ => format!("#{}", index + 1),
    }
}

/// Run the `record` command
pub async fn run(backend: &Backend, path: &Path, format: OutputFormat) -> Result<()> {
    let records = read_records(path)?;
    if records.is_empty() {
        bail!("{} contains no records", path.display());
    }

    if let [record] = records.as_slice() {
        let prediction = backend.predict(record).await?;
        return print_prediction(&prediction, format);
    }

    let mut predictions = Vec::with_capacity(records.len());
    let mut rows = Vec::with_capacity(records.len());
    let mut failed = 0usize;

    for (index, record) in records.iter().enumerate() {
        let title = title_of(record, index);
        match backend.predict(record).await {
            Ok(prediction) => {
                rows.push(RecordRow {
                    title,
                    revenue: format_currency(prediction.revenue),
                    status: "ok".to_string(),
                });
                predictions.push(prediction);
            }
            Err(err) => {
                failed += 1;
                if format == OutputFormat::Json {
                    print_error(&format!("{}: {:#}", title, err));
                }
                rows.push(RecordRow {
                    title,
                    revenue: "-".to_string(),
                    status: format!("{:#}", err),
                });
            }
        }
    }

    match format {
        OutputFormat::Json => print_json(&predictions)?,
        OutputFormat::Table => print_table(&rows, format)?,
    }

    if failed > 0 {
        bail!("{} of {} records could not be predicted", failed, records.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_single_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("movie.json");
        std::fs::write(
            &path,
            r#"{"_id": {"$oid": "65a1"}, "title": "Example", "director": "Jane Doe",
                "actors": ["A", "B"], "genre": "Drama", "budget": 20000000,
                "release_year": 2019, "imdb_score": 7.4, "description": "N/A"}"#,
        )
        .unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(title_of(&records[0], 0), "Example");
        assert_eq!(records[0].get("budget"), Some(&RawValue::Number(20_000_000.0)));
    }

    #[test]
    fn test_read_record_array() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("movies.json");
        std::fs::write(&path, r#"[{"budget": 1000}, {"title": "Second", "budget": 2000}]"#)
            .unwrap();

        let records = read_records(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(title_of(&records[0], 0), "#1");
        assert_eq!(title_of(&records[1], 1), "Second");
    }

    #[test]
    fn test_non_object_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        std::fs::write(&path, "42").unwrap();

        assert!(read_records(&path).is_err());
    }
}
