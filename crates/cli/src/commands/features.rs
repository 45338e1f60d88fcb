//! `features`: list the feature columns in force

use anyhow::Result;
use predictor_lib::FeatureListing;
use serde::Serialize;
use tabled::Tabled;

use super::Backend;
use crate::output::{print_info, print_json, print_table, short_fingerprint, OutputFormat};

#[derive(Debug, Serialize, Tabled)]
struct ColumnRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Column")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: &'static str,
}

fn column_kind(name: &str) -> &'static str {
    if name == predictor_lib::features::LOG_BUDGET {
        "derived"
    } else if [
        predictor_lib::features::DIRECTOR_PREFIX,
        predictor_lib::features::ACTOR_PREFIX,
        predictor_lib::features::GENRE_PREFIX,
    ]
    .iter()
    .any(|prefix| name.starts_with(&format!("{}_", prefix)))
    {
        "indicator"
    } else {
        "numeric"
    }
}

fn rows(listing: &FeatureListing) -> Vec<ColumnRow> {
    listing
        .columns
        .iter()
        .enumerate()
        .map(|(position, name)| ColumnRow {
            position,
            name: name.clone(),
            kind: column_kind(name),
        })
        .collect()
}

/// Run the `features` command
pub async fn run(backend: &Backend, format: OutputFormat) -> Result<()> {
    let listing = backend.features().await?;

    match format {
        OutputFormat::Json => print_json(&listing)?,
        OutputFormat::Table => {
            print_table(&rows(&listing), format)?;
            print_info(&format!(
                "{} columns, {} inputs, artifacts {}",
                listing.columns.len(),
                listing.scheme,
                short_fingerprint(&listing.model_fingerprint)
            ));
        }
    }

    Ok(())
}
