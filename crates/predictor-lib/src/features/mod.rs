//! Feature alignment for ML inference
//!
//! Turns a raw attribute bag into a numeric row whose columns match the
//! training-time feature column list exactly, in name and in order:
//! derived features first, then categorical expansion, then zero-fill of
//! every missing column, then projection onto the column list.

mod columns;
mod schema;

pub use columns::FeatureColumns;
pub use schema::{
    indicator_name, FieldKind, InputScheme, RawField, ACTORS_BOX_OFFICE_PCT, ACTOR_PREFIX,
    DIRECTOR_BOX_OFFICE_PCT, DIRECTOR_PREFIX, GENRE_PREFIX, LOG_BUDGET,
};

use crate::error::{PredictionError, Result};
use crate::models::{AlignedRow, RawAttributes, RawValue};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Separator for list fields given as a single string (stored records keep
/// actors as "A,B,C")
pub const DEFAULT_LIST_SEPARATOR: char = ',';

/// Aligns raw attributes to a feature column list
#[derive(Debug, Clone)]
pub struct FeatureAligner {
    list_separator: char,
}

impl FeatureAligner {
    pub fn new() -> Self {
        Self {
            list_separator: DEFAULT_LIST_SEPARATOR,
        }
    }

    pub fn with_list_separator(list_separator: char) -> Self {
        Self { list_separator }
    }

    /// Produce the aligned row for `raw` against `columns`
    pub fn align(&self, raw: &RawAttributes, columns: &FeatureColumns) -> Result<AlignedRow> {
        let inputs = self.classify(raw, columns)?;
        let mut working: HashMap<String, f64> = HashMap::new();

        // Numeric and derived features
        for (field, value) in &inputs {
            if let FieldKind::Numeric { column } = field.kind() {
                if !columns.contains(column) {
                    debug!(
                        field = %field.canonical_key(),
                        "Ignoring input outside the trained columns"
                    );
                    continue;
                }
                let number = parse_number(*field, value)?;
                working.insert(column.to_string(), derive(*field, number)?);
            }
        }
        for field in columns.required_fields() {
            if !inputs.contains_key(&field) {
                return Err(PredictionError::malformed(
                    field.canonical_key(),
                    "required input is missing",
                ));
            }
        }

        // Categorical expansion
        for (field, value) in &inputs {
            if let FieldKind::Categorical { prefix, multi } = field.kind() {
                for level in self.levels(*field, value, multi)? {
                    working.insert(indicator_name(prefix, &level), 1.0);
                }
            }
        }

        let unseen: Vec<&String> = working.keys().filter(|k| !columns.contains(k)).collect();
        if !unseen.is_empty() {
            debug!(columns = ?unseen, "Discarding columns not present at training time");
        }

        // Reconcile, then project in training order
        let mut zero_filled = 0usize;
        let values: Vec<f64> = columns
            .names()
            .iter()
            .map(|name| match working.get(name) {
                Some(value) => *value,
                None => {
                    zero_filled += 1;
                    0.0
                }
            })
            .collect();

        debug!(
            width = values.len(),
            zero_filled = zero_filled,
            scheme = %columns.scheme(),
            "Aligned feature row"
        );

        Ok(AlignedRow::new(columns.names().to_vec(), values))
    }

    /// Map raw keys onto schema fields, rejecting duplicates and fields of
    /// the other input scheme
    fn classify<'a>(
        &self,
        raw: &'a RawAttributes,
        columns: &FeatureColumns,
    ) -> Result<BTreeMap<RawField, &'a RawValue>> {
        let mut inputs = BTreeMap::new();
        let mut seen_scheme: Option<InputScheme> = None;

        for (key, value) in raw.iter() {
            let Some(field) = RawField::from_key(key) else {
                debug!(key = %key, "Ignoring unrecognized attribute");
                continue;
            };

            if let Some(field_scheme) = field.scheme() {
                if !columns.accepts(field_scheme) {
                    return Err(PredictionError::malformed(
                        key,
                        format!(
                            "belongs to the {} input scheme but the loaded feature columns use the {} scheme",
                            field_scheme,
                            columns.scheme()
                        ),
                    ));
                }
                match seen_scheme {
                    Some(other) if other != field_scheme => {
                        return Err(PredictionError::malformed(
                            key,
                            format!(
                                "belongs to the {} input scheme but the input also uses {} fields",
                                field_scheme, other
                            ),
                        ));
                    }
                    _ => seen_scheme = Some(field_scheme),
                }
            }

            if inputs.insert(field, value).is_some() {
                return Err(PredictionError::malformed(
                    field.canonical_key(),
                    "given more than once under different keys",
                ));
            }
        }

        Ok(inputs)
    }

    fn levels(&self, field: RawField, value: &RawValue, multi: bool) -> Result<Vec<String>> {
        let members: Vec<String> = match value {
            RawValue::Text(text) if multi => text.split(self.list_separator).map(str::to_string).collect(),
            RawValue::Text(text) => vec![text.clone()],
            RawValue::List(items) => items.clone(),
            other => {
                return Err(PredictionError::malformed(
                    field.canonical_key(),
                    format!("expected text or a list of text, got {}", other.type_name()),
                ))
            }
        };

        Ok(members
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect())
    }
}

impl Default for FeatureAligner {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_number(field: RawField, value: &RawValue) -> Result<f64> {
    let number = match value {
        RawValue::Number(n) => *n,
        RawValue::Text(text) => text.trim().parse::<f64>().map_err(|_| {
            PredictionError::malformed(
                field.canonical_key(),
                format!("expected a number, got `{}`", text),
            )
        })?,
        other => {
            return Err(PredictionError::malformed(
                field.canonical_key(),
                format!("expected a number, got {}", other.type_name()),
            ))
        }
    };

    if !number.is_finite() {
        return Err(PredictionError::malformed(
            field.canonical_key(),
            "value must be finite",
        ));
    }
    Ok(number)
}

/// Training-time derived transforms
fn derive(field: RawField, value: f64) -> Result<f64> {
    match field {
        RawField::Budget => {
            if value < 0.0 {
                return Err(PredictionError::malformed(
                    field.canonical_key(),
                    format!("budget must not be negative, got {}", value),
                ));
            }
            Ok(value.ln_1p())
        }
        _ => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(list: &[&str]) -> FeatureColumns {
        FeatureColumns::new(list.iter().map(|s| s.to_string()).collect()).unwrap()
    }

    fn percentage_columns() -> FeatureColumns {
        columns(&[
            "Running time",
            "log_budget",
            "Actors Box Office %",
            "Director Box Office %",
            "Oscar and Golden Globes nominations",
            "Release year",
            "IMDb score",
        ])
    }

    fn percentage_input() -> RawAttributes {
        RawAttributes::new()
            .with("Running time", 142.0)
            .with("budget", 25_000_000.0)
            .with("Actors Box Office %", 12.5)
            .with("Director Box Office %", 30.0)
            .with("Oscar and Golden Globes nominations", 4.0)
            .with("Release year", 1994.0)
            .with("IMDb score", 9.3)
    }

    fn categorical_columns() -> FeatureColumns {
        columns(&[
            "log_budget",
            "IMDb score",
            "director_Christopher Nolan",
            "actor_A",
            "actor_B",
            "actor_C",
            "genre_Action",
            "genre_Drama",
        ])
    }

    #[test]
    fn test_percentage_row_in_training_order() {
        let row = FeatureAligner::new()
            .align(&percentage_input(), &percentage_columns())
            .unwrap();

        assert_eq!(row.columns(), percentage_columns().names());
        assert_eq!(row.values()[0], 142.0);
        assert_eq!(row.values()[1], 25_000_000f64.ln_1p());
        assert_eq!(row.values()[6], 9.3);
    }

    #[test]
    fn test_column_order_follows_permuted_list() {
        let aligner = FeatureAligner::new();
        let input = percentage_input();
        let base = percentage_columns();
        let base_row = aligner.align(&input, &base).unwrap();

        let mut reversed: Vec<String> = base.names().to_vec();
        reversed.reverse();
        let rotated: Vec<String> = base.names()[3..]
            .iter()
            .chain(base.names()[..3].iter())
            .cloned()
            .collect();

        for permutation in [reversed, rotated] {
            let permuted = FeatureColumns::new(permutation.clone()).unwrap();
            let row = aligner.align(&input, &permuted).unwrap();
            assert_eq!(row.columns(), permutation.as_slice());
            for (i, name) in permutation.iter().enumerate() {
                assert_eq!(row.values()[i], base_row.get(name).unwrap(), "column {}", name);
            }
        }
    }

    #[test]
    fn test_canonical_keys_match_training_names() {
        let input = RawAttributes::new()
            .with("running_time", 142.0)
            .with("budget", 25_000_000.0)
            .with("actors_box_office_pct", 12.5)
            .with("director_box_office_pct", 30.0)
            .with("award_nominations", 4.0)
            .with("release_year", 1994.0)
            .with("imdb_score", 9.3);
        let aligner = FeatureAligner::new();

        assert_eq!(
            aligner.align(&input, &percentage_columns()).unwrap(),
            aligner.align(&percentage_input(), &percentage_columns()).unwrap()
        );
    }

    #[test]
    fn test_database_record_zero_fills_unseen_levels() {
        let record = RawAttributes::new()
            .with("budget", 20_000_000.0)
            .with("imdb_score", 7.5)
            .with("directors", "Jane Doe")
            .with("actors", vec!["A".to_string(), "B".to_string()])
            .with("genre", "Action")
            .with("title", "Unrelated");
        let cols = categorical_columns();

        let row = FeatureAligner::new().align(&record, &cols).unwrap();

        assert_eq!(row.len(), cols.len());
        assert_eq!(row.get("log_budget"), Some(20_000_000f64.ln_1p()));
        assert_eq!(row.get("IMDb score"), Some(7.5));
        assert_eq!(row.get("director_Christopher Nolan"), Some(0.0));
        assert_eq!(row.get("actor_A"), Some(1.0));
        assert_eq!(row.get("actor_B"), Some(1.0));
        assert_eq!(row.get("actor_C"), Some(0.0));
        assert_eq!(row.get("genre_Action"), Some(1.0));
        assert_eq!(row.get("genre_Drama"), Some(0.0));
        assert_eq!(row.get("director_Jane Doe"), None, "unseen level is not a column");
    }

    #[test]
    fn test_comma_separated_actors_expand_per_member() {
        let record = RawAttributes::new()
            .with("budget", 1_000.0)
            .with("imdb_score", 6.0)
            .with("actors", " A, C ,,");

        let row = FeatureAligner::new().align(&record, &categorical_columns()).unwrap();

        assert_eq!(row.get("actor_A"), Some(1.0));
        assert_eq!(row.get("actor_B"), Some(0.0));
        assert_eq!(row.get("actor_C"), Some(1.0));
    }

    #[test]
    fn test_zero_fill_completeness() {
        let cols = categorical_columns();
        let record = RawAttributes::new().with("budget", 0.0).with("imdb_score", 5.0);

        let row = FeatureAligner::new().align(&record, &cols).unwrap();

        assert_eq!(row.len(), cols.len());
        assert_eq!(row.get("log_budget"), Some(0.0), "log1p(0) is exactly zero");
        for name in cols.names().iter().skip(2) {
            assert_eq!(row.get(name), Some(0.0), "{} should be zero-filled", name);
        }
    }

    #[test]
    fn test_non_numeric_budget_is_malformed() {
        let input = percentage_input().with("budget", "lots");
        let err = FeatureAligner::new()
            .align(&input, &percentage_columns())
            .unwrap_err();

        match err {
            PredictionError::MalformedInput { field, reason } => {
                assert_eq!(field, "budget");
                assert!(reason.contains("lots"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_numeric_text_is_parsed() {
        let input = percentage_input().with("budget", " 25000000 ");
        let row = FeatureAligner::new()
            .align(&input, &percentage_columns())
            .unwrap();
        assert_eq!(row.get("log_budget"), Some(25_000_000f64.ln_1p()));
    }

    #[test]
    fn test_negative_budget_is_malformed() {
        let input = percentage_input().with("budget", -1.0);
        let err = FeatureAligner::new()
            .align(&input, &percentage_columns())
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_input");
    }

    #[test]
    fn test_missing_required_numeric_is_malformed() {
        let mut input = RawAttributes::new();
        for (key, value) in percentage_input().iter() {
            if key != "Release year" {
                input.insert(key, value.clone());
            }
        }

        let err = FeatureAligner::new()
            .align(&input, &percentage_columns())
            .unwrap_err();
        match err {
            PredictionError::MalformedInput { field, .. } => assert_eq!(field, "release_year"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_mixed_schemes_rejected() {
        let input = percentage_input().with("genre", "Action");
        let err = FeatureAligner::new()
            .align(&input, &percentage_columns())
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_input");

        let record = RawAttributes::new()
            .with("budget", 1.0)
            .with("imdb_score", 1.0)
            .with("Director Box Office %", 10.0);
        assert!(FeatureAligner::new()
            .align(&record, &categorical_columns())
            .is_err());
    }

    #[test]
    fn test_duplicate_aliases_rejected() {
        let input = percentage_input().with("imdb_score", 9.3);
        let err = FeatureAligner::new()
            .align(&input, &percentage_columns())
            .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_numeric_category_is_malformed() {
        let record = RawAttributes::new()
            .with("budget", 1.0)
            .with("imdb_score", 1.0)
            .with("genre", 3.0);
        let err = FeatureAligner::new()
            .align(&record, &categorical_columns())
            .unwrap_err();
        assert_eq!(err.kind(), "malformed_input");
    }

    #[test]
    fn test_optional_numeric_outside_list_is_dropped() {
        let record = RawAttributes::new()
            .with("budget", 1.0)
            .with("imdb_score", 1.0)
            .with("release_year", 2001.0);
        let row = FeatureAligner::new().align(&record, &categorical_columns()).unwrap();
        assert_eq!(row.len(), categorical_columns().len());
        assert_eq!(row.get("Release year"), None);
    }

    #[test]
    fn test_placeholder_outside_list_is_ignored() {
        let record = RawAttributes::new()
            .with("budget", 1.0)
            .with("imdb_score", 2.0)
            .with("release_year", "N/A");
        let row = FeatureAligner::new().align(&record, &categorical_columns()).unwrap();
        assert_eq!(row.len(), categorical_columns().len());
        assert_eq!(row.get("Release year"), None);

        let err = FeatureAligner::new()
            .align(
                &RawAttributes::new().with("budget", 1.0).with("imdb_score", "N/A"),
                &categorical_columns(),
            )
            .unwrap_err();
        assert!(matches!(err, PredictionError::MalformedInput { .. }));
    }

    #[test]
    fn test_numeric_only_list_takes_categorical_inputs() {
        let numeric = columns(&["log_budget", "IMDb score"]);
        let record = RawAttributes::new()
            .with("budget", 1_000_000.0)
            .with("imdb_score", 7.0)
            .with("directors", "Jane Doe")
            .with("genre", "Drama");

        let row = FeatureAligner::new().align(&record, &numeric).unwrap();
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("IMDb score"), Some(7.0));
    }

    #[test]
    fn test_numeric_only_list_still_rejects_mixed_inputs() {
        let numeric = columns(&["log_budget", "IMDb score"]);
        let record = RawAttributes::new()
            .with("budget", 1_000_000.0)
            .with("imdb_score", 7.0)
            .with("actors_box_office_pct", 40.0)
            .with("genre", "Drama");

        let err = FeatureAligner::new().align(&record, &numeric).unwrap_err();
        assert!(matches!(err, PredictionError::MalformedInput { .. }));
    }
}
