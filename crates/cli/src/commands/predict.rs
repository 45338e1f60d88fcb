//! `predict`: one prediction from command-line flags or interactive answers

use anyhow::{bail, Context, Result};
use clap::Args;
use predictor_lib::{FeatureColumns, FieldKind, InputScheme, Prediction, RawAttributes, RawField};
use std::io::{self, BufRead, Write};

use super::Backend;
use crate::output::{
    format_currency, print_info, print_json, print_success, print_warning, short_fingerprint,
    OutputFormat,
};

/// Attempts per field before an interactive answer is given up on
const MAX_ATTEMPTS: usize = 3;

/// Movie attributes accepted on the command line
#[derive(Debug, Clone, Default, Args)]
pub struct PredictArgs {
    /// Running time in minutes
    #[arg(long)]
    pub running_time: Option<f64>,

    /// Production budget in currency units
    #[arg(long)]
    pub budget: Option<f64>,

    /// Actors' historical box office performance, in percent
    #[arg(long)]
    pub actors_box_office_pct: Option<f64>,

    /// Director's historical box office performance, in percent
    #[arg(long)]
    pub director_box_office_pct: Option<f64>,

    /// Oscar and Golden Globe nominations
    #[arg(long)]
    pub award_nominations: Option<f64>,

    #[arg(long)]
    pub release_year: Option<f64>,

    #[arg(long)]
    pub imdb_score: Option<f64>,

    /// Director name (categorical models)
    #[arg(long)]
    pub director: Option<String>,

    /// Cast member (categorical models, repeatable)
    #[arg(long = "actor")]
    pub actors: Vec<String>,

    /// Genre (categorical models)
    #[arg(long)]
    pub genre: Option<String>,

    /// Prompt for any required attribute not given as a flag
    #[arg(long, short)]
    pub interactive: bool,
}

impl PredictArgs {
    /// Raw attributes for the flags that were given
    pub fn to_attributes(&self) -> RawAttributes {
        let mut attributes = RawAttributes::new();

        let numeric = [
            (RawField::RunningTime, self.running_time),
            (RawField::Budget, self.budget),
            (RawField::ActorsBoxOfficePct, self.actors_box_office_pct),
            (RawField::DirectorBoxOfficePct, self.director_box_office_pct),
            (RawField::AwardNominations, self.award_nominations),
            (RawField::ReleaseYear, self.release_year),
            (RawField::ImdbScore, self.imdb_score),
        ];
        for (field, value) in numeric {
            if let Some(value) = value {
                attributes.insert(field.canonical_key(), value);
            }
        }

        if let Some(director) = &self.director {
            attributes.insert(RawField::Director.canonical_key(), director.as_str());
        }
        if !self.actors.is_empty() {
            attributes.insert(RawField::Actors.canonical_key(), self.actors.clone());
        }
        if let Some(genre) = &self.genre {
            attributes.insert(RawField::Genre.canonical_key(), genre.as_str());
        }

        attributes
    }
}

/// Run the `predict` command
pub async fn run(backend: &Backend, args: PredictArgs, format: OutputFormat) -> Result<()> {
    let mut attributes = args.to_attributes();

    if args.interactive {
        let columns = backend.feature_columns().await?;
        let stdin = io::stdin();
        let stdout = io::stdout();
        prompt_missing(&mut attributes, &columns, &mut stdin.lock(), &mut stdout.lock())?;
    }

    let prediction = backend.predict(&attributes).await?;
    print_prediction(&prediction, format)
}

pub fn print_prediction(prediction: &Prediction, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(prediction)?,
        OutputFormat::Table => {
            print_success(&format!(
                "Predicted final box office: {}",
                format_currency(prediction.revenue)
            ));
            print_info(&format!(
                "log1p revenue {:.4} ({} inputs, artifacts {})",
                prediction.log_revenue,
                prediction.scheme,
                short_fingerprint(&prediction.model_fingerprint)
            ));
            if was_clamped(prediction) {
                print_warning("Model output was below zero and has been clamped");
            }
        }
    }
    Ok(())
}

/// Negative log-space output maps to a revenue of zero
fn was_clamped(prediction: &Prediction) -> bool {
    prediction.log_revenue < 0.0
}

/// Ask for every required attribute that is still missing
///
/// Numeric answers are re-asked until they parse. Categorical attributes
/// are optional and skipped on an empty answer.
pub fn prompt_missing<R: BufRead, W: Write>(
    attributes: &mut RawAttributes,
    columns: &FeatureColumns,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    for field in columns.required_fields() {
        if has_field(attributes, field) {
            continue;
        }
        let value = prompt_number(field, input, output)?;
        attributes.insert(field.canonical_key(), value);
    }

    if columns.scheme() == InputScheme::Categorical {
        for field in [RawField::Director, RawField::Actors, RawField::Genre] {
            let FieldKind::Categorical { prefix, .. } = field.kind() else {
                continue;
            };
            if has_field(attributes, field) || columns.level_count(prefix) == 0 {
                continue;
            }
            let answer = ask(&format!("{} (Enter to skip)", field.label()), input, output)?;
            if !answer.is_empty() {
                attributes.insert(field.canonical_key(), answer);
            }
        }
    }

    Ok(())
}

fn has_field(attributes: &RawAttributes, field: RawField) -> bool {
    field.keys().iter().any(|key| attributes.contains_key(key))
}

fn prompt_number<R: BufRead, W: Write>(field: RawField, input: &mut R, output: &mut W) -> Result<f64> {
    for _ in 0..MAX_ATTEMPTS {
        let answer = ask(field.label(), input, output)?;
        match answer.parse::<f64>() {
            Ok(value) if value.is_finite() => return Ok(value),
            _ => writeln!(output, "  `{}` is not a number, try again", answer)?,
        }
    }
    bail!("No valid value for {} after {} attempts", field.label(), MAX_ATTEMPTS)
}

fn ask<R: BufRead, W: Write>(label: &str, input: &mut R, output: &mut W) -> Result<String> {
    write!(output, "{}: ", label)?;
    output.flush()?;

    let mut line = String::new();
    let read = input.read_line(&mut line).context("Failed to read answer")?;
    if read == 0 {
        bail!("Input ended before {} was answered", label);
    }
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use predictor_lib::RawValue;
    use std::io::Cursor;

    fn percentage_columns() -> FeatureColumns {
        FeatureColumns::new(
            [
                "Running time",
                "log_budget",
                "Actors Box Office %",
                "Director Box Office %",
                "Oscar and Golden Globes nominations",
                "Release year",
                "IMDb score",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        )
        .unwrap()
    }

    fn categorical_columns() -> FeatureColumns {
        FeatureColumns::new(
            ["log_budget", "IMDb score", "director_Jane Doe", "actor_A", "genre_Drama"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_clamp_warning_follows_log_output() {
        let mut prediction = Prediction {
            revenue: 0.0,
            log_revenue: 0.0,
            scheme: InputScheme::Percentages,
            model_fingerprint: "ab".to_string(),
            generated_at: 0,
        };
        assert!(!was_clamped(&prediction));

        prediction.log_revenue = -0.5;
        assert!(was_clamped(&prediction));
    }

    #[test]
    fn test_flags_become_canonical_attributes() {
        let args = PredictArgs {
            budget: Some(5_000_000.0),
            imdb_score: Some(6.8),
            actors: vec!["A".to_string(), "B".to_string()],
            ..Default::default()
        };
        let attributes = args.to_attributes();

        assert_eq!(attributes.len(), 3);
        assert_eq!(attributes.get("budget"), Some(&RawValue::Number(5_000_000.0)));
        assert_eq!(
            attributes.get("actors"),
            Some(&RawValue::List(vec!["A".to_string(), "B".to_string()]))
        );
    }

    #[test]
    fn test_prompts_only_for_missing_fields() {
        let mut attributes = RawAttributes::new()
            .with("running_time", 120.0)
            .with("budget", 1e7);
        let mut input = Cursor::new("55\n60\n2\n2015\n7.2\n");
        let mut output = Vec::new();

        prompt_missing(&mut attributes, &percentage_columns(), &mut input, &mut output).unwrap();

        assert_eq!(attributes.len(), 7);
        assert_eq!(attributes.get("imdb_score"), Some(&RawValue::Number(7.2)));
        let transcript = String::from_utf8(output).unwrap();
        assert!(!transcript.contains("Budget"));
        assert!(transcript.contains("IMDb score"));
    }

    #[test]
    fn test_invalid_number_is_asked_again() {
        let mut attributes = RawAttributes::new()
            .with("running_time", 120.0)
            .with("actors_box_office_pct", 40.0)
            .with("director_box_office_pct", 30.0)
            .with("award_nominations", 0.0)
            .with("release_year", 2010.0)
            .with("imdb_score", 6.0);
        let mut input = Cursor::new("lots\n2000000\n");
        let mut output = Vec::new();

        prompt_missing(&mut attributes, &percentage_columns(), &mut input, &mut output).unwrap();

        assert_eq!(attributes.get("budget"), Some(&RawValue::Number(2_000_000.0)));
        assert!(String::from_utf8(output).unwrap().contains("`lots` is not a number"));
    }

    #[test]
    fn test_gives_up_after_repeated_invalid_answers() {
        let mut attributes = RawAttributes::new();
        let mut input = Cursor::new("x\ny\nz\n");
        let mut output = Vec::new();

        let err = prompt_missing(&mut attributes, &percentage_columns(), &mut input, &mut output)
            .unwrap_err();
        assert!(err.to_string().contains("after 3 attempts"));
    }

    #[test]
    fn test_end_of_input_is_an_error() {
        let mut attributes = RawAttributes::new();
        let mut input = Cursor::new("");
        let mut output = Vec::new();

        assert!(
            prompt_missing(&mut attributes, &percentage_columns(), &mut input, &mut output)
                .is_err()
        );
    }

    #[test]
    fn test_categorical_fields_are_optional() {
        let mut attributes = RawAttributes::new().with("imdb_score", 7.0);
        let mut input = Cursor::new("30000000\nJane Doe\n\nDrama\n");
        let mut output = Vec::new();

        prompt_missing(&mut attributes, &categorical_columns(), &mut input, &mut output).unwrap();

        assert_eq!(attributes.get("budget"), Some(&RawValue::Number(30_000_000.0)));
        assert_eq!(attributes.get("director"), Some(&RawValue::Text("Jane Doe".to_string())));
        assert!(!attributes.contains_key("actors"));
        assert_eq!(attributes.get("genre"), Some(&RawValue::Text("Drama".to_string())));
    }
}
